//! Conference Controller models.
//!
//! Database row types, request/response DTOs, and the standard response
//! envelope used across the HTTP surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum tenant/meeting display name length (bytes, after trimming).
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum domain length (bytes).
pub const MAX_DOMAIN_LENGTH: usize = 253;

/// Minimum domain length (bytes).
pub const MIN_DOMAIN_LENGTH: usize = 3;

/// Maximum email length (bytes).
pub const MAX_EMAIL_LENGTH: usize = 320;

/// Maximum chat message body length (bytes).
pub const MAX_CHAT_BODY_LENGTH: usize = 4000;

/// Default participant cap applied when a tenant does not set one.
pub const DEFAULT_MAX_PARTICIPANTS: i32 = 100;

/// Minimum participant cap a tenant may configure.
pub const MIN_PARTICIPANTS: i32 = 2;

// ============================================================================
// Enumerations
// ============================================================================

/// Meeting status enumeration.
///
/// Lifecycle: `scheduled -> active -> ended`, with `cancelled` reachable
/// from `scheduled` or `active` only. `ended` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    /// Meeting is scheduled but not yet active.
    Scheduled,

    /// Meeting is currently in progress.
    Active,

    /// Meeting has ended normally.
    Ended,

    /// Meeting was cancelled before or while running.
    Cancelled,
}

impl MeetingStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Scheduled => "scheduled",
            MeetingStatus::Active => "active",
            MeetingStatus::Ended => "ended",
            MeetingStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a status string as stored in the database.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(MeetingStatus::Scheduled),
            "active" => Some(MeetingStatus::Active),
            "ended" => Some(MeetingStatus::Ended),
            "cancelled" => Some(MeetingStatus::Cancelled),
            _ => None,
        }
    }

    /// Whether the meeting can still be joined or cancelled.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MeetingStatus::Ended | MeetingStatus::Cancelled)
    }
}

/// Tenant-scoped user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    User,
    Guest,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
            UserRole::Guest => "guest",
        }
    }
}

/// Participant role within a meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Host,
    Attendee,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Host => "host",
            ParticipantRole::Attendee => "attendee",
        }
    }
}

// ============================================================================
// Database rows
// ============================================================================

/// Tenant row (maps to tenants table).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TenantRow {
    pub tenant_id: Uuid,
    pub display_name: String,
    pub domain: String,
    pub max_participants: i32,
    pub chat_enabled: bool,
    pub recording_enabled: bool,
    pub allow_guest_access: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User row (maps to users table).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Meeting row (maps to meetings table).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MeetingRow {
    pub meeting_id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub host_user_id: Uuid,
    pub recording_enabled: bool,
    pub chat_enabled: bool,
    pub screen_share_enabled: bool,
    pub waiting_room_enabled: bool,
    pub status: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub external_session_id: Option<String>,
    pub media_region: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Meeting participant row (maps to meeting_participants table).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ParticipantRow {
    pub participant_id: Uuid,
    pub meeting_id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub email: String,
    pub role: String,
    pub joined_at: DateTime<Utc>,
    pub left_at: Option<DateTime<Utc>>,
    pub is_present: bool,
    pub external_attendee_id: Option<String>,
}

/// Chat message row (maps to chat_messages table).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatMessageRow {
    pub message_id: Uuid,
    pub meeting_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Response envelope
// ============================================================================

/// Standard response envelope: `{success, data?, error?}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a successful payload.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

// ============================================================================
// Tenant API models
// ============================================================================

/// Partial tenant settings supplied by clients.
///
/// Defaults are applied server-side; security-relevant toggles are never
/// trusted from client-supplied defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantSettingsPatch {
    pub max_participants: Option<i32>,
    pub chat_enabled: Option<bool>,
    pub recording_enabled: Option<bool>,
    pub allow_guest_access: Option<bool>,
}

/// Resolved tenant settings with server-side defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantSettings {
    pub max_participants: i32,
    pub chat_enabled: bool,
    pub recording_enabled: bool,
    pub allow_guest_access: bool,
}

impl Default for TenantSettings {
    fn default() -> Self {
        Self {
            max_participants: DEFAULT_MAX_PARTICIPANTS,
            chat_enabled: true,
            recording_enabled: false,
            allow_guest_access: false,
        }
    }
}

impl TenantSettings {
    /// Merge a client patch over the defaults.
    pub fn merged(patch: &TenantSettingsPatch) -> Self {
        let defaults = Self::default();
        Self {
            max_participants: patch.max_participants.unwrap_or(defaults.max_participants),
            chat_enabled: patch.chat_enabled.unwrap_or(defaults.chat_enabled),
            recording_enabled: patch.recording_enabled.unwrap_or(defaults.recording_enabled),
            allow_guest_access: patch
                .allow_guest_access
                .unwrap_or(defaults.allow_guest_access),
        }
    }
}

/// Request to create a tenant.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTenantRequest {
    /// Tenant display name (required, 1-255 bytes after trimming).
    pub name: String,

    /// Globally unique domain (e.g. "acme.example").
    pub domain: String,

    /// Optional settings; server-side defaults fill the gaps.
    #[serde(default)]
    pub settings: Option<TenantSettingsPatch>,
}

impl CreateTenantRequest {
    /// Validate the request fields.
    ///
    /// # Errors
    ///
    /// Returns an error message if validation fails.
    pub fn validate(&self) -> Result<(), &'static str> {
        let name = self.name.trim();

        if name.is_empty() {
            return Err("Tenant name is required");
        }

        if name.len() > MAX_NAME_LENGTH {
            return Err("Tenant name must be at most 255 characters");
        }

        validate_domain(&self.domain)?;

        if let Some(settings) = &self.settings {
            if let Some(max) = settings.max_participants {
                if max < MIN_PARTICIPANTS {
                    return Err("Maximum participants must be at least 2");
                }
            }
        }

        Ok(())
    }
}

/// Request to update a tenant.
///
/// Only mutable fields are representable; `tenant_id` and `created_at`
/// cannot be supplied, so immutable fields are stripped by construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTenantRequest {
    pub name: Option<String>,

    #[serde(default)]
    pub settings: Option<TenantSettingsPatch>,
}

impl UpdateTenantRequest {
    /// Check if the request has any changes.
    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.settings.as_ref().is_some_and(|s| {
                s.max_participants.is_some()
                    || s.chat_enabled.is_some()
                    || s.recording_enabled.is_some()
                    || s.allow_guest_access.is_some()
            })
    }

    /// Validate the request fields.
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(name) = &self.name {
            let name = name.trim();
            if name.is_empty() {
                return Err("Tenant name must not be empty");
            }
            if name.len() > MAX_NAME_LENGTH {
                return Err("Tenant name must be at most 255 characters");
            }
        }

        if let Some(settings) = &self.settings {
            if let Some(max) = settings.max_participants {
                if max < MIN_PARTICIPANTS {
                    return Err("Maximum participants must be at least 2");
                }
            }
        }

        Ok(())
    }
}

/// Tenant payload returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct TenantResponse {
    pub tenant_id: Uuid,
    pub name: String,
    pub domain: String,
    pub max_participants: i32,
    pub chat_enabled: bool,
    pub recording_enabled: bool,
    pub allow_guest_access: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TenantRow> for TenantResponse {
    fn from(row: TenantRow) -> Self {
        Self {
            tenant_id: row.tenant_id,
            name: row.display_name,
            domain: row.domain,
            max_participants: row.max_participants,
            chat_enabled: row.chat_enabled,
            recording_enabled: row.recording_enabled,
            allow_guest_access: row.allow_guest_access,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ============================================================================
// User API models
// ============================================================================

/// Request to provision a user within a tenant.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub role: Option<UserRole>,
    pub avatar_url: Option<String>,
}

impl CreateUserRequest {
    /// Validate the request fields.
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_email(&self.email)?;

        let name = self.name.trim();
        if name.is_empty() {
            return Err("User name is required");
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err("User name must be at most 255 characters");
        }

        Ok(())
    }
}

/// User payload returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserResponse {
    fn from(row: UserRow) -> Self {
        Self {
            user_id: row.user_id,
            tenant_id: row.tenant_id,
            email: row.email,
            name: row.display_name,
            role: row.role,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
        }
    }
}

// ============================================================================
// Meeting API models
// ============================================================================

/// Partial meeting settings supplied by clients.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeetingSettingsPatch {
    pub recording_enabled: Option<bool>,
    pub chat_enabled: Option<bool>,
    pub screen_share_enabled: Option<bool>,
    pub waiting_room_enabled: Option<bool>,
}

/// Resolved meeting settings with server-side defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeetingSettings {
    pub recording_enabled: bool,
    pub chat_enabled: bool,
    pub screen_share_enabled: bool,
    pub waiting_room_enabled: bool,
}

impl Default for MeetingSettings {
    fn default() -> Self {
        Self {
            recording_enabled: false,
            chat_enabled: true,
            screen_share_enabled: true,
            waiting_room_enabled: false,
        }
    }
}

impl MeetingSettings {
    /// Merge a client patch over the defaults.
    pub fn merged(patch: &MeetingSettingsPatch) -> Self {
        let defaults = Self::default();
        Self {
            recording_enabled: patch.recording_enabled.unwrap_or(defaults.recording_enabled),
            chat_enabled: patch.chat_enabled.unwrap_or(defaults.chat_enabled),
            screen_share_enabled: patch
                .screen_share_enabled
                .unwrap_or(defaults.screen_share_enabled),
            waiting_room_enabled: patch
                .waiting_room_enabled
                .unwrap_or(defaults.waiting_room_enabled),
        }
    }
}

/// Request to create a meeting.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMeetingRequest {
    /// Meeting title (required, 1-255 bytes after trimming).
    pub title: String,

    pub description: Option<String>,

    /// User hosting the meeting.
    pub host_id: Uuid,

    /// Optional scheduled start; NULL means ad-hoc.
    pub scheduled_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub settings: Option<MeetingSettingsPatch>,
}

impl CreateMeetingRequest {
    /// Validate the request fields.
    pub fn validate(&self) -> Result<(), &'static str> {
        let title = self.title.trim();

        if title.is_empty() {
            return Err("Meeting title is required");
        }

        if title.len() > MAX_NAME_LENGTH {
            return Err("Meeting title must be at most 255 characters");
        }

        Ok(())
    }
}

/// Request to join a meeting.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinMeetingRequest {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}

impl JoinMeetingRequest {
    /// Validate the request fields.
    pub fn validate(&self) -> Result<(), &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Display name is required");
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err("Display name must be at most 255 characters");
        }

        validate_email(&self.email)?;

        Ok(())
    }
}

/// Request to leave a meeting.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeaveMeetingRequest {
    pub user_id: Uuid,
}

/// Meeting payload returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct MeetingResponse {
    pub meeting_id: Uuid,
    pub tenant_id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub host_id: Uuid,
    pub status: String,
    pub recording_enabled: bool,
    pub chat_enabled: bool,
    pub screen_share_enabled: bool,
    pub waiting_room_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<MeetingRow> for MeetingResponse {
    fn from(row: MeetingRow) -> Self {
        Self {
            meeting_id: row.meeting_id,
            tenant_id: row.tenant_id,
            title: row.title,
            description: row.description,
            host_id: row.host_user_id,
            status: row.status,
            recording_enabled: row.recording_enabled,
            chat_enabled: row.chat_enabled,
            screen_share_enabled: row.screen_share_enabled,
            waiting_room_enabled: row.waiting_room_enabled,
            scheduled_at: row.scheduled_at,
            started_at: row.started_at,
            ended_at: row.ended_at,
            created_at: row.created_at,
        }
    }
}

/// Participant payload returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantResponse {
    pub participant_id: Uuid,
    pub meeting_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_present: bool,
    pub joined_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_at: Option<DateTime<Utc>>,
}

impl From<ParticipantRow> for ParticipantResponse {
    fn from(row: ParticipantRow) -> Self {
        Self {
            participant_id: row.participant_id,
            meeting_id: row.meeting_id,
            user_id: row.user_id,
            name: row.display_name,
            email: row.email,
            role: row.role,
            is_present: row.is_present,
            joined_at: row.joined_at,
            left_at: row.left_at,
        }
    }
}

/// External session info returned to joining clients.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub media_region: String,
}

/// External attendee info returned to joining clients.
#[derive(Debug, Clone, Serialize)]
pub struct AttendeeInfo {
    pub attendee_id: String,
    pub join_token: String,
}

/// Response for joining a meeting: the meeting plus enough external
/// session/attendee data for the client to attach to the live session.
#[derive(Debug, Clone, Serialize)]
pub struct JoinMeetingData {
    pub meeting: MeetingResponse,
    pub session: SessionInfo,
    pub attendee: AttendeeInfo,
}

// ============================================================================
// Chat API models
// ============================================================================

/// Request to post a chat message.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostChatMessageRequest {
    pub user_id: Uuid,
    pub body: String,
}

impl PostChatMessageRequest {
    /// Validate the request fields.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.body.trim().is_empty() {
            return Err("Message body is required");
        }
        if self.body.len() > MAX_CHAT_BODY_LENGTH {
            return Err("Message body must be at most 4000 characters");
        }
        Ok(())
    }
}

/// Chat message payload returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessageResponse {
    pub message_id: Uuid,
    pub meeting_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<ChatMessageRow> for ChatMessageResponse {
    fn from(row: ChatMessageRow) -> Self {
        Self {
            message_id: row.message_id,
            meeting_id: row.meeting_id,
            user_id: row.user_id,
            body: row.body,
            created_at: row.created_at,
        }
    }
}

// ============================================================================
// Health models
// ============================================================================

/// Readiness check response, returned by the `/ready` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    /// Service readiness status ("ready" or "not_ready").
    pub status: &'static str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Validation helpers
// ============================================================================

/// Validate a tenant domain.
///
/// Domains are lowercase DNS-style names: alphanumeric labels separated by
/// dots, hyphens allowed inside labels.
pub fn validate_domain(domain: &str) -> Result<(), &'static str> {
    if domain.len() < MIN_DOMAIN_LENGTH {
        return Err("Domain must be at least 3 characters");
    }
    if domain.len() > MAX_DOMAIN_LENGTH {
        return Err("Domain must be at most 253 characters");
    }
    if !domain.contains('.') {
        return Err("Domain must contain at least one dot");
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err("Domain labels must not be empty");
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err("Domain labels must not start or end with a hyphen");
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err("Domain must contain only lowercase letters, digits, hyphens and dots");
        }
    }

    Ok(())
}

/// Validate an email address. Intentionally minimal: structure only, no
/// attempt at full RFC 5321 conformance.
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err("Email must be at most 320 characters");
    }

    let Some((local, host)) = email.split_once('@') else {
        return Err("Email must contain an @ sign");
    };

    if local.is_empty() || host.is_empty() || !host.contains('.') {
        return Err("Email address is malformed");
    }

    Ok(())
}
