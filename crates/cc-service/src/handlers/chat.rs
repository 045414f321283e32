//! Meeting chat handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::CcError;
use crate::handlers::parse_body;
use crate::models::{ApiResponse, ChatMessageResponse, PostChatMessageRequest};
use crate::routes::AppState;
use crate::services::meeting_service::MeetingService;

/// POST /api/tenants/{tenant_id}/meetings/{meeting_id}/messages
#[instrument(
    skip_all,
    name = "cc.chat.post",
    fields(tenant_id = %tenant_id, meeting_id = %meeting_id)
)]
pub async fn post_message(
    State(state): State<AppState>,
    Path((tenant_id, meeting_id)): Path<(Uuid, Uuid)>,
    body: Bytes,
) -> Result<Response, CcError> {
    let request: PostChatMessageRequest = parse_body(&body)?;
    request
        .validate()
        .map_err(|msg| CcError::Validation(msg.to_string()))?;

    let message =
        MeetingService::post_message(&state.pool, tenant_id, meeting_id, &request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(ChatMessageResponse::from(message))),
    )
        .into_response())
}

/// GET /api/tenants/{tenant_id}/meetings/{meeting_id}/messages
#[instrument(
    skip_all,
    name = "cc.chat.list",
    fields(tenant_id = %tenant_id, meeting_id = %meeting_id)
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Path((tenant_id, meeting_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Vec<ChatMessageResponse>>>, CcError> {
    let messages = MeetingService::get_messages(&state.pool, tenant_id, meeting_id).await?;

    Ok(Json(ApiResponse::ok(
        messages
            .into_iter()
            .map(ChatMessageResponse::from)
            .collect(),
    )))
}
