//! Meeting lifecycle handlers.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::CcError;
use crate::handlers::parse_body;
use crate::models::{
    ApiResponse, CreateMeetingRequest, JoinMeetingData, JoinMeetingRequest, LeaveMeetingRequest,
    MeetingResponse, MeetingStatus, ParticipantResponse,
};
use crate::observability::metrics::record_meeting_operation;
use crate::routes::AppState;
use crate::services::meeting_service::MeetingService;

/// Query parameters for listing meetings.
#[derive(Debug, Deserialize)]
pub struct ListMeetingsQuery {
    pub status: Option<String>,
}

fn record_outcome<T>(operation: &str, result: &Result<T, CcError>) {
    let status = if result.is_ok() { "success" } else { "error" };
    record_meeting_operation(operation, status);
}

/// POST /api/tenants/{tenant_id}/meetings
#[instrument(skip_all, name = "cc.meeting.create", fields(tenant_id = %tenant_id))]
pub async fn create_meeting(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    body: Bytes,
) -> Result<Response, CcError> {
    let request: CreateMeetingRequest = parse_body(&body)?;
    request
        .validate()
        .map_err(|msg| CcError::Validation(msg.to_string()))?;

    let result = MeetingService::create_meeting(
        &state.pool,
        state.video_provider.as_ref(),
        tenant_id,
        &request,
    )
    .await;
    record_outcome("create", &result);
    let meeting = result?;

    tracing::info!(
        target: "cc.handlers.meetings",
        tenant_id = %tenant_id,
        meeting_id = %meeting.meeting_id,
        "Meeting created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(MeetingResponse::from(meeting))),
    )
        .into_response())
}

/// GET /api/tenants/{tenant_id}/meetings
#[instrument(skip_all, name = "cc.meeting.list", fields(tenant_id = %tenant_id))]
pub async fn list_meetings(
    State(state): State<AppState>,
    Path(tenant_id): Path<Uuid>,
    Query(query): Query<ListMeetingsQuery>,
) -> Result<Json<ApiResponse<Vec<MeetingResponse>>>, CcError> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(MeetingStatus::parse(raw).ok_or_else(|| {
            CcError::Validation(format!("Unknown meeting status: {raw}"))
        })?),
        None => None,
    };

    let meetings = MeetingService::list_meetings(&state.pool, tenant_id, status).await?;

    Ok(Json(ApiResponse::ok(
        meetings.into_iter().map(MeetingResponse::from).collect(),
    )))
}

/// GET /api/tenants/{tenant_id}/meetings/{meeting_id}
#[instrument(
    skip_all,
    name = "cc.meeting.get",
    fields(tenant_id = %tenant_id, meeting_id = %meeting_id)
)]
pub async fn get_meeting(
    State(state): State<AppState>,
    Path((tenant_id, meeting_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<MeetingResponse>>, CcError> {
    let meeting = MeetingService::get_meeting(&state.pool, tenant_id, meeting_id)
        .await?
        .ok_or_else(|| CcError::NotFound("Meeting not found".to_string()))?;

    Ok(Json(ApiResponse::ok(MeetingResponse::from(meeting))))
}

/// POST /api/tenants/{tenant_id}/meetings/{meeting_id}/join
#[instrument(
    skip_all,
    name = "cc.meeting.join",
    fields(tenant_id = %tenant_id, meeting_id = %meeting_id)
)]
pub async fn join_meeting(
    State(state): State<AppState>,
    Path((tenant_id, meeting_id)): Path<(Uuid, Uuid)>,
    body: Bytes,
) -> Result<Json<ApiResponse<JoinMeetingData>>, CcError> {
    let request: JoinMeetingRequest = parse_body(&body)?;
    request
        .validate()
        .map_err(|msg| CcError::Validation(msg.to_string()))?;

    let result = MeetingService::join_meeting(
        &state.pool,
        state.video_provider.as_ref(),
        tenant_id,
        meeting_id,
        &request,
    )
    .await;
    record_outcome("join", &result);
    let outcome = result?;

    tracing::info!(
        target: "cc.handlers.meetings",
        meeting_id = %meeting_id,
        user_id = %request.user_id,
        role = %outcome.participant.role,
        "Participant joined"
    );

    Ok(Json(ApiResponse::ok(JoinMeetingData {
        meeting: MeetingResponse::from(outcome.meeting),
        session: outcome.session,
        attendee: outcome.attendee,
    })))
}

/// POST /api/tenants/{tenant_id}/meetings/{meeting_id}/leave
#[instrument(
    skip_all,
    name = "cc.meeting.leave",
    fields(tenant_id = %tenant_id, meeting_id = %meeting_id)
)]
pub async fn leave_meeting(
    State(state): State<AppState>,
    Path((tenant_id, meeting_id)): Path<(Uuid, Uuid)>,
    body: Bytes,
) -> Result<Json<ApiResponse<MeetingResponse>>, CcError> {
    let request: LeaveMeetingRequest = parse_body(&body)?;

    let result = MeetingService::leave_meeting(
        &state.pool,
        state.video_provider.as_ref(),
        tenant_id,
        meeting_id,
        request.user_id,
    )
    .await;
    record_outcome("leave", &result);
    let meeting = result?;

    tracing::info!(
        target: "cc.handlers.meetings",
        meeting_id = %meeting_id,
        user_id = %request.user_id,
        status = %meeting.status,
        "Participant left"
    );

    Ok(Json(ApiResponse::ok(MeetingResponse::from(meeting))))
}

/// POST /api/tenants/{tenant_id}/meetings/{meeting_id}/end
#[instrument(
    skip_all,
    name = "cc.meeting.end",
    fields(tenant_id = %tenant_id, meeting_id = %meeting_id)
)]
pub async fn end_meeting(
    State(state): State<AppState>,
    Path((tenant_id, meeting_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<MeetingResponse>>, CcError> {
    let result = MeetingService::end_meeting(
        &state.pool,
        state.video_provider.as_ref(),
        tenant_id,
        meeting_id,
    )
    .await;
    record_outcome("end", &result);
    let meeting = result?;

    tracing::info!(target: "cc.handlers.meetings", meeting_id = %meeting_id, "Meeting ended");

    Ok(Json(ApiResponse::ok(MeetingResponse::from(meeting))))
}

/// POST /api/tenants/{tenant_id}/meetings/{meeting_id}/cancel
#[instrument(
    skip_all,
    name = "cc.meeting.cancel",
    fields(tenant_id = %tenant_id, meeting_id = %meeting_id)
)]
pub async fn cancel_meeting(
    State(state): State<AppState>,
    Path((tenant_id, meeting_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<MeetingResponse>>, CcError> {
    let result = MeetingService::cancel_meeting(
        &state.pool,
        state.video_provider.as_ref(),
        tenant_id,
        meeting_id,
    )
    .await;
    record_outcome("cancel", &result);
    let meeting = result?;

    tracing::info!(target: "cc.handlers.meetings", meeting_id = %meeting_id, "Meeting cancelled");

    Ok(Json(ApiResponse::ok(MeetingResponse::from(meeting))))
}

/// GET /api/tenants/{tenant_id}/meetings/{meeting_id}/participants
#[instrument(
    skip_all,
    name = "cc.meeting.participants",
    fields(tenant_id = %tenant_id, meeting_id = %meeting_id)
)]
pub async fn list_participants(
    State(state): State<AppState>,
    Path((tenant_id, meeting_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<Vec<ParticipantResponse>>>, CcError> {
    let participants =
        MeetingService::get_participants(&state.pool, tenant_id, meeting_id).await?;

    Ok(Json(ApiResponse::ok(
        participants
            .into_iter()
            .map(ParticipantResponse::from)
            .collect(),
    )))
}
