//! Integration tests for the meeting lifecycle endpoints.
//!
//! Covers:
//! - Meeting creation against the video provider
//! - Join (session/attendee payload, first-join activation, capacity cap)
//! - Leave (presence flip, last-leave auto-end)
//! - End (idempotent) and cancel (not idempotent)
//! - Status filtering on the list endpoint

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use anyhow::Result;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use cc_test_utils::TestCcServer;

async fn create_tenant(server: &TestCcServer, domain: &str, settings: serde_json::Value) -> Result<Uuid> {
    let resp = reqwest::Client::new()
        .post(format!("{}/api/tenants", server.url()))
        .json(&json!({"name": "Meetings Tenant", "domain": domain, "settings": settings}))
        .send()
        .await?;
    anyhow::ensure!(resp.status() == 201, "tenant create failed");
    let body: serde_json::Value = resp.json().await?;
    Ok(body["data"]["tenant_id"].as_str().unwrap().parse()?)
}

async fn create_meeting(server: &TestCcServer, tenant_id: Uuid, title: &str) -> Result<(Uuid, Uuid)> {
    let host_id = Uuid::new_v4();
    let resp = reqwest::Client::new()
        .post(format!("{}/api/tenants/{tenant_id}/meetings", server.url()))
        .json(&json!({"title": title, "host_id": host_id}))
        .send()
        .await?;
    anyhow::ensure!(resp.status() == 201, "meeting create failed");
    let body: serde_json::Value = resp.json().await?;
    Ok((body["data"]["meeting_id"].as_str().unwrap().parse()?, host_id))
}

async fn join(
    server: &TestCcServer,
    tenant_id: Uuid,
    meeting_id: Uuid,
    user_id: Uuid,
    name: &str,
) -> Result<reqwest::Response> {
    Ok(reqwest::Client::new()
        .post(format!(
            "{}/api/tenants/{tenant_id}/meetings/{meeting_id}/join",
            server.url()
        ))
        .json(&json!({
            "user_id": user_id,
            "name": name,
            "email": format!("{}@join.example", name.to_lowercase())
        }))
        .send()
        .await?)
}

async fn post_action(
    server: &TestCcServer,
    tenant_id: Uuid,
    meeting_id: Uuid,
    action: &str,
) -> Result<reqwest::Response> {
    Ok(reqwest::Client::new()
        .post(format!(
            "{}/api/tenants/{tenant_id}/meetings/{meeting_id}/{action}",
            server.url()
        ))
        .send()
        .await?)
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_create_meeting_provisions_session(pool: PgPool) -> Result<()> {
    let server = TestCcServer::spawn(pool.clone()).await?;
    let tenant_id = create_tenant(&server, "create.example", json!({})).await?;
    let host_id = Uuid::new_v4();

    let resp = reqwest::Client::new()
        .post(format!("{}/api/tenants/{tenant_id}/meetings", server.url()))
        .json(&json!({"title": "Standup", "host_id": host_id}))
        .send()
        .await?;

    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await?;
    let data = &body["data"];
    assert_eq!(data["title"], "Standup");
    assert_eq!(data["status"], "scheduled");
    assert_eq!(data["host_id"], host_id.to_string());
    // Defaults
    assert_eq!(data["chat_enabled"], true);
    assert_eq!(data["recording_enabled"], false);
    // The provider session handle stays internal
    assert!(data.get("external_session_id").is_none());
    assert!(data.get("media_region").is_none());

    // A session row was written for the reaper to reconcile against
    let meeting_id: Uuid = data["meeting_id"].as_str().unwrap().parse()?;
    let (session_id,): (Option<String>,) =
        sqlx::query_as("SELECT external_session_id FROM meetings WHERE meeting_id = $1")
            .bind(meeting_id)
            .fetch_one(&pool)
            .await?;
    assert_eq!(session_id.as_deref(), Some("mock-session-1"));

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_join_returns_session_and_attendee(pool: PgPool) -> Result<()> {
    let server = TestCcServer::spawn(pool).await?;
    let tenant_id = create_tenant(&server, "join.example", json!({})).await?;
    let (meeting_id, host_id) = create_meeting(&server, tenant_id, "Joinable").await?;

    let resp = join(&server, tenant_id, meeting_id, host_id, "Host").await?;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["success"], true);
    let data = &body["data"];

    // First join activates the meeting
    assert_eq!(data["meeting"]["status"], "active");
    assert!(data["meeting"]["started_at"].is_string());

    assert_eq!(data["session"]["session_id"], "mock-session-1");
    assert!(data["session"]["media_region"].is_string());
    assert!(data["attendee"]["attendee_id"].as_str().unwrap().starts_with("mock-attendee-"));
    assert!(data["attendee"]["join_token"].is_string());

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_first_join_activation_is_stable(pool: PgPool) -> Result<()> {
    let server = TestCcServer::spawn(pool).await?;
    let tenant_id = create_tenant(&server, "stable.example", json!({})).await?;
    let (meeting_id, host_id) = create_meeting(&server, tenant_id, "Stable").await?;

    let resp = join(&server, tenant_id, meeting_id, host_id, "Host").await?;
    let body: serde_json::Value = resp.json().await?;
    let first_started_at = body["data"]["meeting"]["started_at"].clone();

    // A second participant joining does not move started_at
    let resp = join(&server, tenant_id, meeting_id, Uuid::new_v4(), "Alice").await?;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["data"]["meeting"]["started_at"], first_started_at);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_host_role_comes_from_meeting_record(pool: PgPool) -> Result<()> {
    let server = TestCcServer::spawn(pool).await?;
    let tenant_id = create_tenant(&server, "roles.example", json!({})).await?;
    let (meeting_id, host_id) = create_meeting(&server, tenant_id, "Roles").await?;

    join(&server, tenant_id, meeting_id, host_id, "Host").await?;
    join(&server, tenant_id, meeting_id, Uuid::new_v4(), "Alice").await?;

    let resp = reqwest::Client::new()
        .get(format!(
            "{}/api/tenants/{tenant_id}/meetings/{meeting_id}/participants",
            server.url()
        ))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await?;
    let participants = body["data"].as_array().unwrap();
    assert_eq!(participants.len(), 2);
    assert_eq!(participants[0]["role"], "host");
    assert_eq!(participants[1]["role"], "attendee");

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_rejoin_keeps_single_participant_row(pool: PgPool) -> Result<()> {
    let server = TestCcServer::spawn(pool.clone()).await?;
    let tenant_id = create_tenant(&server, "rejoin.example", json!({})).await?;
    let (meeting_id, host_id) = create_meeting(&server, tenant_id, "Rejoin").await?;
    let user_id = Uuid::new_v4();

    join(&server, tenant_id, meeting_id, host_id, "Host").await?;
    join(&server, tenant_id, meeting_id, user_id, "Alice").await?;

    // Leave and come back under the same user id
    let resp = reqwest::Client::new()
        .post(format!(
            "{}/api/tenants/{tenant_id}/meetings/{meeting_id}/leave",
            server.url()
        ))
        .json(&json!({"user_id": user_id}))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);

    let resp = join(&server, tenant_id, meeting_id, user_id, "Alice").await?;
    assert_eq!(resp.status(), 200);

    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM meeting_participants WHERE meeting_id = $1 AND user_id = $2",
    )
    .bind(meeting_id)
    .bind(user_id)
    .fetch_one(&pool)
    .await?;
    assert_eq!(count, 1);

    let (is_present,): (bool,) = sqlx::query_as(
        "SELECT is_present FROM meeting_participants WHERE meeting_id = $1 AND user_id = $2",
    )
    .bind(meeting_id)
    .bind(user_id)
    .fetch_one(&pool)
    .await?;
    assert!(is_present);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_join_capacity_cap(pool: PgPool) -> Result<()> {
    let server = TestCcServer::spawn(pool).await?;
    let tenant_id = create_tenant(&server, "cap.example", json!({"max_participants": 2})).await?;
    let (meeting_id, host_id) = create_meeting(&server, tenant_id, "Tiny Room").await?;

    join(&server, tenant_id, meeting_id, host_id, "Host").await?;
    join(&server, tenant_id, meeting_id, Uuid::new_v4(), "Alice").await?;

    let resp = join(&server, tenant_id, meeting_id, Uuid::new_v4(), "Bob").await?;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["error"], "Meeting is full");

    // A leaver frees a slot
    let resp = reqwest::Client::new()
        .post(format!(
            "{}/api/tenants/{tenant_id}/meetings/{meeting_id}/leave",
            server.url()
        ))
        .json(&json!({"user_id": host_id}))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);

    let resp = join(&server, tenant_id, meeting_id, Uuid::new_v4(), "Bob").await?;
    assert_eq!(resp.status(), 200);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_join_terminal_meeting_rejected(pool: PgPool) -> Result<()> {
    let server = TestCcServer::spawn(pool.clone()).await?;
    let tenant_id = create_tenant(&server, "terminal.example", json!({})).await?;
    let (meeting_id, _) = create_meeting(&server, tenant_id, "Short Lived").await?;

    let resp = post_action(&server, tenant_id, meeting_id, "end").await?;
    assert_eq!(resp.status(), 200);

    let resp = join(&server, tenant_id, meeting_id, Uuid::new_v4(), "Late").await?;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["error"], "Cannot join a meeting that is ended");

    // No participant row was written for the rejected join
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM meeting_participants WHERE meeting_id = $1")
            .bind(meeting_id)
            .fetch_one(&pool)
            .await?;
    assert_eq!(count, 0);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_last_leave_auto_ends_meeting(pool: PgPool) -> Result<()> {
    let server = TestCcServer::spawn(pool).await?;
    let tenant_id = create_tenant(&server, "autoend.example", json!({})).await?;
    let (meeting_id, host_id) = create_meeting(&server, tenant_id, "Auto End").await?;
    let user_id = Uuid::new_v4();

    join(&server, tenant_id, meeting_id, host_id, "Host").await?;
    join(&server, tenant_id, meeting_id, user_id, "Alice").await?;

    let client = reqwest::Client::new();
    let leave_url = format!(
        "{}/api/tenants/{tenant_id}/meetings/{meeting_id}/leave",
        server.url()
    );

    let resp = client.post(&leave_url).json(&json!({"user_id": host_id})).send().await?;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["data"]["status"], "active");

    // Last participant leaving ends the meeting and tears down the session
    let resp = client.post(&leave_url).json(&json!({"user_id": user_id})).send().await?;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["data"]["status"], "ended");
    assert!(body["data"]["ended_at"].is_string());

    assert_eq!(server.video_provider().delete_session_count("mock-session-1"), 1);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_leave_without_join_is_404(pool: PgPool) -> Result<()> {
    let server = TestCcServer::spawn(pool).await?;
    let tenant_id = create_tenant(&server, "noleave.example", json!({})).await?;
    let (meeting_id, _) = create_meeting(&server, tenant_id, "Empty").await?;

    let resp = reqwest::Client::new()
        .post(format!(
            "{}/api/tenants/{tenant_id}/meetings/{meeting_id}/leave",
            server.url()
        ))
        .json(&json!({"user_id": Uuid::new_v4()}))
        .send()
        .await?;

    assert_eq!(resp.status(), 404);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_end_is_idempotent(pool: PgPool) -> Result<()> {
    let server = TestCcServer::spawn(pool).await?;
    let tenant_id = create_tenant(&server, "end.example", json!({})).await?;
    let (meeting_id, host_id) = create_meeting(&server, tenant_id, "Endable").await?;

    join(&server, tenant_id, meeting_id, host_id, "Host").await?;

    let resp = post_action(&server, tenant_id, meeting_id, "end").await?;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["data"]["status"], "ended");
    let first_ended_at = body["data"]["ended_at"].clone();

    // Second end is a no-op success with the same ended_at
    let resp = post_action(&server, tenant_id, meeting_id, "end").await?;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["data"]["status"], "ended");
    assert_eq!(body["data"]["ended_at"], first_ended_at);

    // The session was deleted exactly once
    assert_eq!(server.video_provider().delete_session_count("mock-session-1"), 1);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_end_marks_all_participants_left(pool: PgPool) -> Result<()> {
    let server = TestCcServer::spawn(pool.clone()).await?;
    let tenant_id = create_tenant(&server, "sweep.example", json!({})).await?;
    let (meeting_id, host_id) = create_meeting(&server, tenant_id, "Sweep").await?;

    join(&server, tenant_id, meeting_id, host_id, "Host").await?;
    join(&server, tenant_id, meeting_id, Uuid::new_v4(), "Alice").await?;

    let resp = post_action(&server, tenant_id, meeting_id, "end").await?;
    assert_eq!(resp.status(), 200);

    let (present,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM meeting_participants WHERE meeting_id = $1 AND is_present",
    )
    .bind(meeting_id)
    .fetch_one(&pool)
    .await?;
    assert_eq!(present, 0);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_cancel_flow(pool: PgPool) -> Result<()> {
    let server = TestCcServer::spawn(pool).await?;
    let tenant_id = create_tenant(&server, "cancel.example", json!({})).await?;
    let (meeting_id, _) = create_meeting(&server, tenant_id, "Cancellable").await?;

    let resp = post_action(&server, tenant_id, meeting_id, "cancel").await?;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["data"]["status"], "cancelled");

    // Cancel is not idempotent: a second cancel is an invalid transition
    let resp = post_action(&server, tenant_id, meeting_id, "cancel").await?;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["error"], "Cannot cancel a meeting that is cancelled");

    // Ended meetings cannot be cancelled either
    let (other_meeting, _) = create_meeting(&server, tenant_id, "Ended First").await?;
    post_action(&server, tenant_id, other_meeting, "end").await?;
    let resp = post_action(&server, tenant_id, other_meeting, "cancel").await?;
    assert_eq!(resp.status(), 400);

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_list_meetings_with_status_filter(pool: PgPool) -> Result<()> {
    let server = TestCcServer::spawn(pool).await?;
    let tenant_id = create_tenant(&server, "filter.example", json!({})).await?;

    let (active_id, host_id) = create_meeting(&server, tenant_id, "Running").await?;
    join(&server, tenant_id, active_id, host_id, "Host").await?;
    create_meeting(&server, tenant_id, "Planned").await?;

    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/api/tenants/{tenant_id}/meetings", server.url()))
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let resp = client
        .get(format!(
            "{}/api/tenants/{tenant_id}/meetings?status=active",
            server.url()
        ))
        .send()
        .await?;
    let body: serde_json::Value = resp.json().await?;
    let meetings = body["data"].as_array().unwrap();
    assert_eq!(meetings.len(), 1);
    assert_eq!(meetings[0]["title"], "Running");

    let resp = client
        .get(format!(
            "{}/api/tenants/{tenant_id}/meetings?status=starting",
            server.url()
        ))
        .send()
        .await?;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["error"], "Unknown meeting status: starting");

    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_meeting_is_tenant_scoped(pool: PgPool) -> Result<()> {
    let server = TestCcServer::spawn(pool).await?;
    let tenant_id = create_tenant(&server, "scoped-a.example", json!({})).await?;
    let other_tenant = create_tenant(&server, "scoped-b.example", json!({})).await?;
    let (meeting_id, _) = create_meeting(&server, tenant_id, "Private").await?;

    let resp = reqwest::Client::new()
        .get(format!(
            "{}/api/tenants/{other_tenant}/meetings/{meeting_id}",
            server.url()
        ))
        .send()
        .await?;
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["error"], "Meeting not found");

    Ok(())
}
