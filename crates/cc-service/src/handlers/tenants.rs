//! Tenant and user handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::CcError;
use crate::handlers::parse_body;
use crate::models::{
    ApiResponse, CreateTenantRequest, CreateUserRequest, TenantResponse, UpdateTenantRequest,
    UserResponse,
};
use crate::routes::AppState;
use crate::services::tenant_service::TenantService;

/// POST /api/tenants
#[instrument(skip_all, name = "cc.tenant.create")]
pub async fn create_tenant(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, CcError> {
    let request: CreateTenantRequest = parse_body(&body)?;
    request
        .validate()
        .map_err(|msg| CcError::Validation(msg.to_string()))?;

    let tenant = TenantService::create_tenant(&state.pool, &request).await?;

    tracing::info!(
        target: "cc.handlers.tenants",
        tenant_id = %tenant.tenant_id,
        domain = %tenant.domain,
        "Tenant created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(TenantResponse::from(tenant))),
    )
        .into_response())
}

/// GET /api/tenants/{tenant_id}
#[instrument(skip_all, name = "cc.tenant.get", fields(tenant_id = %tenant_id))]
pub async fn get_tenant(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<ApiResponse<TenantResponse>>, CcError> {
    let tenant = TenantService::get_tenant(&state.pool, tenant_id)
        .await?
        .ok_or_else(|| CcError::NotFound("Tenant not found".to_string()))?;

    Ok(Json(ApiResponse::ok(TenantResponse::from(tenant))))
}

/// GET /api/tenants/domain/{domain}
#[instrument(skip_all, name = "cc.tenant.get_by_domain", fields(domain = %domain))]
pub async fn get_tenant_by_domain(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> Result<Json<ApiResponse<TenantResponse>>, CcError> {
    let tenant = TenantService::get_tenant_by_domain(&state.pool, &domain)
        .await?
        .ok_or_else(|| CcError::NotFound("Tenant not found".to_string()))?;

    Ok(Json(ApiResponse::ok(TenantResponse::from(tenant))))
}

/// PUT /api/tenants/{tenant_id}
#[instrument(skip_all, name = "cc.tenant.update", fields(tenant_id = %tenant_id))]
pub async fn update_tenant(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<ApiResponse<TenantResponse>>, CcError> {
    let request: UpdateTenantRequest = parse_body(&body)?;
    request
        .validate()
        .map_err(|msg| CcError::Validation(msg.to_string()))?;

    if !request.has_changes() {
        return Err(CcError::Validation("No changes provided".to_string()));
    }

    let tenant = TenantService::update_tenant(&state.pool, tenant_id, &request).await?;

    tracing::info!(target: "cc.handlers.tenants", tenant_id = %tenant_id, "Tenant updated");

    Ok(Json(ApiResponse::ok(TenantResponse::from(tenant))))
}

/// DELETE /api/tenants/{tenant_id}
#[instrument(skip_all, name = "cc.tenant.delete", fields(tenant_id = %tenant_id))]
pub async fn delete_tenant(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<ApiResponse<serde_json::Value>>, CcError> {
    TenantService::delete_tenant(&state.pool, tenant_id).await?;

    tracing::info!(target: "cc.handlers.tenants", tenant_id = %tenant_id, "Tenant deleted");

    Ok(Json(ApiResponse::ok(serde_json::json!({ "deleted": true }))))
}

/// POST /api/tenants/{tenant_id}/users
#[instrument(skip_all, name = "cc.user.create", fields(tenant_id = %tenant_id))]
pub async fn create_user(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    body: Bytes,
) -> Result<Response, CcError> {
    let request: CreateUserRequest = parse_body(&body)?;
    request
        .validate()
        .map_err(|msg| CcError::Validation(msg.to_string()))?;

    let user = TenantService::create_user(
        &state.pool,
        state.auth_provider.as_ref(),
        tenant_id,
        &request,
    )
    .await?;

    tracing::info!(
        target: "cc.handlers.tenants",
        tenant_id = %tenant_id,
        user_id = %user.user_id,
        "User created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(UserResponse::from(user))),
    )
        .into_response())
}

/// GET /api/tenants/{tenant_id}/users
#[instrument(skip_all, name = "cc.user.list", fields(tenant_id = %tenant_id))]
pub async fn list_users(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, CcError> {
    let users = TenantService::get_tenant_users(&state.pool, tenant_id).await?;

    Ok(Json(ApiResponse::ok(
        users.into_iter().map(UserResponse::from).collect(),
    )))
}

/// GET /api/tenants/{tenant_id}/users/{user_id}
#[instrument(skip_all, name = "cc.user.get", fields(tenant_id = %tenant_id, user_id = %user_id))]
pub async fn get_user(
    State(state): State<AppState>,
    Path((tenant_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<UserResponse>>, CcError> {
    let user = TenantService::get_user(&state.pool, tenant_id, user_id)
        .await?
        .ok_or_else(|| CcError::NotFound("User not found".to_string()))?;

    Ok(Json(ApiResponse::ok(UserResponse::from(user))))
}
