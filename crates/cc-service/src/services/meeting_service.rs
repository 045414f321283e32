//! Meeting lifecycle orchestration.
//!
//! Every meeting is backed by a provider media session. Provider resources
//! are created before local rows, and a failed local write triggers a
//! compensating provider delete; failed compensations go to the dead-letter
//! log rather than failing the request a second time.

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::CcError;
use crate::models::{
    AttendeeInfo, ChatMessageRow, CreateMeetingRequest, JoinMeetingRequest, MeetingRow,
    MeetingSettings, MeetingStatus, ParticipantRole, ParticipantRow, PostChatMessageRequest,
    SessionInfo,
};
use crate::repositories::chat_messages::ChatMessagesRepository;
use crate::repositories::dead_letters::{RESOURCE_ATTENDEE, RESOURCE_SESSION};
use crate::repositories::meetings::MeetingsRepository;
use crate::repositories::participants::ParticipantsRepository;
use crate::repositories::tenants::TenantsRepository;
use crate::services::record_compensation_failure;
use crate::services::video_provider::VideoProviderClient;

/// Everything a client needs after joining: the (possibly just activated)
/// meeting, the session to attach to, and their attendee credential.
#[derive(Debug)]
pub struct JoinOutcome {
    pub meeting: MeetingRow,
    pub session: SessionInfo,
    pub attendee: AttendeeInfo,
    pub participant: ParticipantRow,
}

pub struct MeetingService;

impl MeetingService {
    /// Create a meeting: provider session first, then the local row.
    pub async fn create_meeting(
        pool: &PgPool,
        video_provider: &dyn VideoProviderClient,
        tenant_id: Uuid,
        request: &CreateMeetingRequest,
    ) -> Result<MeetingRow, CcError> {
        TenantsRepository::find_by_id(pool, tenant_id)
            .await?
            .ok_or_else(|| CcError::NotFound("Tenant not found".to_string()))?;

        let settings = request
            .settings
            .as_ref()
            .map(MeetingSettings::merged)
            .unwrap_or_default();

        let title = request.title.trim();
        let session = video_provider.create_session(tenant_id, title).await?;

        let inserted = MeetingsRepository::insert(
            pool,
            tenant_id,
            title,
            request.description.as_deref(),
            request.host_id,
            &settings,
            request.scheduled_at,
            &session.session_id,
            &session.media_region,
        )
        .await;

        match inserted {
            Ok(meeting) => Ok(meeting),
            Err(e) => {
                if let Err(comp_err) = video_provider.delete_session(&session.session_id).await {
                    record_compensation_failure(
                        pool,
                        RESOURCE_SESSION,
                        &session.session_id,
                        "delete_session",
                        &comp_err,
                    )
                    .await;
                }
                Err(CcError::from(e))
            }
        }
    }

    pub async fn get_meeting(
        pool: &PgPool,
        tenant_id: Uuid,
        meeting_id: Uuid,
    ) -> Result<Option<MeetingRow>, CcError> {
        Ok(MeetingsRepository::find_by_id(pool, tenant_id, meeting_id).await?)
    }

    pub async fn list_meetings(
        pool: &PgPool,
        tenant_id: Uuid,
        status: Option<MeetingStatus>,
    ) -> Result<Vec<MeetingRow>, CcError> {
        Ok(
            MeetingsRepository::list_for_tenant(pool, tenant_id, status.map(|s| s.as_str()))
                .await?,
        )
    }

    /// Join a meeting: attendee registration on the provider session, then a
    /// participant upsert. The first join activates a scheduled meeting.
    pub async fn join_meeting(
        pool: &PgPool,
        video_provider: &dyn VideoProviderClient,
        tenant_id: Uuid,
        meeting_id: Uuid,
        request: &JoinMeetingRequest,
    ) -> Result<JoinOutcome, CcError> {
        let meeting = MeetingsRepository::find_by_id(pool, tenant_id, meeting_id)
            .await?
            .ok_or_else(|| CcError::NotFound("Meeting not found".to_string()))?;

        if let Some(status) = MeetingStatus::parse(&meeting.status) {
            if status.is_terminal() {
                return Err(CcError::InvalidState(format!(
                    "Cannot join a meeting that is {}",
                    status.as_str()
                )));
            }
        }

        let tenant = TenantsRepository::find_by_id(pool, tenant_id)
            .await?
            .ok_or_else(|| CcError::NotFound("Tenant not found".to_string()))?;

        let present = ParticipantsRepository::count_present(pool, meeting_id).await?;
        if present >= i64::from(tenant.max_participants) {
            return Err(CcError::InvalidState("Meeting is full".to_string()));
        }

        let session_id = meeting
            .external_session_id
            .clone()
            .ok_or_else(|| CcError::Internal("Meeting has no media session".to_string()))?;

        let attendee = video_provider
            .create_attendee(&session_id, request.user_id)
            .await?;

        // Host role comes from the meeting record, never from the request.
        let role = if request.user_id == meeting.host_user_id {
            ParticipantRole::Host
        } else {
            ParticipantRole::Attendee
        };

        let upserted = ParticipantsRepository::upsert(
            pool,
            meeting_id,
            request.user_id,
            request.name.trim(),
            &request.email,
            role.as_str(),
            &attendee.attendee_id,
        )
        .await;

        let participant = match upserted {
            Ok(participant) => participant,
            Err(e) => {
                if let Err(comp_err) = video_provider
                    .delete_attendee(&session_id, &attendee.attendee_id)
                    .await
                {
                    record_compensation_failure(
                        pool,
                        RESOURCE_ATTENDEE,
                        &format!("{session_id}/{}", attendee.attendee_id),
                        "delete_attendee",
                        &comp_err,
                    )
                    .await;
                }
                return Err(CcError::from(e));
            }
        };

        // First join flips scheduled -> active; a no-op for later joins.
        MeetingsRepository::activate(pool, meeting_id).await?;

        let meeting = MeetingsRepository::find_by_id(pool, tenant_id, meeting_id)
            .await?
            .ok_or_else(|| CcError::Internal("Meeting disappeared during join".to_string()))?;

        let session = SessionInfo {
            session_id,
            media_region: meeting.media_region.clone(),
        };

        Ok(JoinOutcome {
            meeting,
            session,
            attendee: AttendeeInfo {
                attendee_id: attendee.attendee_id,
                join_token: attendee.join_token,
            },
            participant,
        })
    }

    /// Leave a meeting. The participant row survives with `is_present =
    /// false`; when the last present participant leaves, the meeting ends.
    pub async fn leave_meeting(
        pool: &PgPool,
        video_provider: &dyn VideoProviderClient,
        tenant_id: Uuid,
        meeting_id: Uuid,
        user_id: Uuid,
    ) -> Result<MeetingRow, CcError> {
        let meeting = MeetingsRepository::find_by_id(pool, tenant_id, meeting_id)
            .await?
            .ok_or_else(|| CcError::NotFound("Meeting not found".to_string()))?;

        let participant = ParticipantsRepository::mark_left(pool, meeting_id, user_id)
            .await?
            .ok_or_else(|| CcError::NotFound("Participant not found".to_string()))?;

        // Best-effort attendee teardown; never fails the leave.
        if let (Some(session_id), Some(attendee_id)) = (
            meeting.external_session_id.as_deref(),
            participant.external_attendee_id.as_deref(),
        ) {
            if let Err(e) = video_provider.delete_attendee(session_id, attendee_id).await {
                record_compensation_failure(
                    pool,
                    RESOURCE_ATTENDEE,
                    &format!("{session_id}/{attendee_id}"),
                    "delete_attendee",
                    &e,
                )
                .await;
            }
        }

        let present = ParticipantsRepository::count_present(pool, meeting_id).await?;
        if present == 0 {
            tracing::info!(
                target: "cc.services.meetings",
                meeting_id = %meeting_id,
                "Last participant left, ending meeting"
            );
            return Self::end_meeting(pool, video_provider, tenant_id, meeting_id).await;
        }

        MeetingsRepository::find_by_id(pool, tenant_id, meeting_id)
            .await?
            .ok_or_else(|| CcError::Internal("Meeting disappeared during leave".to_string()))
    }

    /// End a meeting. Idempotent: ending an already-terminal meeting is a
    /// no-op that returns the current row, and the provider session is torn
    /// down at most once.
    pub async fn end_meeting(
        pool: &PgPool,
        video_provider: &dyn VideoProviderClient,
        tenant_id: Uuid,
        meeting_id: Uuid,
    ) -> Result<MeetingRow, CcError> {
        let meeting = MeetingsRepository::find_by_id(pool, tenant_id, meeting_id)
            .await?
            .ok_or_else(|| CcError::NotFound("Meeting not found".to_string()))?;

        let Some(ended) = MeetingsRepository::end(pool, meeting_id).await? else {
            // Already terminal; nothing to tear down.
            return Ok(meeting);
        };

        Self::teardown(pool, video_provider, &ended).await?;
        Ok(ended)
    }

    /// Cancel a meeting. Unlike `end_meeting` this is not idempotent:
    /// cancelling a terminal meeting is an invalid-state error.
    pub async fn cancel_meeting(
        pool: &PgPool,
        video_provider: &dyn VideoProviderClient,
        tenant_id: Uuid,
        meeting_id: Uuid,
    ) -> Result<MeetingRow, CcError> {
        let meeting = MeetingsRepository::find_by_id(pool, tenant_id, meeting_id)
            .await?
            .ok_or_else(|| CcError::NotFound("Meeting not found".to_string()))?;

        let Some(cancelled) = MeetingsRepository::cancel(pool, meeting_id).await? else {
            return Err(CcError::InvalidState(format!(
                "Cannot cancel a meeting that is {}",
                meeting.status
            )));
        };

        Self::teardown(pool, video_provider, &cancelled).await?;
        Ok(cancelled)
    }

    /// Shared terminal-transition cleanup: best-effort provider session
    /// delete plus marking everyone as left.
    async fn teardown(
        pool: &PgPool,
        video_provider: &dyn VideoProviderClient,
        meeting: &MeetingRow,
    ) -> Result<(), CcError> {
        if let Some(session_id) = meeting.external_session_id.as_deref() {
            if let Err(e) = video_provider.delete_session(session_id).await {
                record_compensation_failure(
                    pool,
                    RESOURCE_SESSION,
                    session_id,
                    "delete_session",
                    &e,
                )
                .await;
            }
        }

        ParticipantsRepository::mark_all_left(pool, meeting.meeting_id).await?;
        Ok(())
    }

    pub async fn get_participants(
        pool: &PgPool,
        tenant_id: Uuid,
        meeting_id: Uuid,
    ) -> Result<Vec<ParticipantRow>, CcError> {
        MeetingsRepository::find_by_id(pool, tenant_id, meeting_id)
            .await?
            .ok_or_else(|| CcError::NotFound("Meeting not found".to_string()))?;

        Ok(ParticipantsRepository::list_for_meeting(pool, meeting_id).await?)
    }

    /// Post a chat message. Requires a non-terminal meeting with chat
    /// enabled.
    pub async fn post_message(
        pool: &PgPool,
        tenant_id: Uuid,
        meeting_id: Uuid,
        request: &PostChatMessageRequest,
    ) -> Result<ChatMessageRow, CcError> {
        let meeting = MeetingsRepository::find_by_id(pool, tenant_id, meeting_id)
            .await?
            .ok_or_else(|| CcError::NotFound("Meeting not found".to_string()))?;

        if !meeting.chat_enabled {
            return Err(CcError::InvalidState(
                "Chat is disabled for this meeting".to_string(),
            ));
        }

        if let Some(status) = MeetingStatus::parse(&meeting.status) {
            if status.is_terminal() {
                return Err(CcError::InvalidState(format!(
                    "Cannot post to a meeting that is {}",
                    status.as_str()
                )));
            }
        }

        Ok(ChatMessagesRepository::insert(pool, meeting_id, request.user_id, &request.body).await?)
    }

    pub async fn get_messages(
        pool: &PgPool,
        tenant_id: Uuid,
        meeting_id: Uuid,
    ) -> Result<Vec<ChatMessageRow>, CcError> {
        MeetingsRepository::find_by_id(pool, tenant_id, meeting_id)
            .await?
            .ok_or_else(|| CcError::NotFound("Meeting not found".to_string()))?;

        Ok(ChatMessagesRepository::list_for_meeting(pool, meeting_id).await?)
    }
}
