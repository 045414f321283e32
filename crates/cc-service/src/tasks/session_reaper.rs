//! Session reaper: periodic reconciliation against the video provider.
//!
//! Two jobs per pass:
//! 1. retry unresolved compensation failures (all provider deletes are
//!    idempotent, so retrying is safe);
//! 2. diff the provider's session list against non-terminal meetings and
//!    delete orphaned sessions the provider still holds.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::errors::CcError;
use crate::observability::metrics::record_reaper_pass;
use crate::repositories::dead_letters::{
    DeadLettersRepository, RESOURCE_ATTENDEE, RESOURCE_IDENTITY, RESOURCE_SESSION,
};
use crate::repositories::meetings::MeetingsRepository;
use crate::services::auth_provider::AuthProviderClient;
use crate::services::video_provider::VideoProviderClient;

/// Dead letters retried per pass.
const RETRY_BATCH_SIZE: i64 = 50;

/// Outcome of one reaper pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReaperStats {
    pub retried: u64,
    pub resolved: u64,
    pub orphans_deleted: u64,
}

/// Run the reaper until the cancellation token fires.
///
/// The first tick of `tokio::time::interval` completes immediately, giving
/// one reconciliation pass at startup.
pub async fn run_session_reaper(
    pool: PgPool,
    video_provider: Arc<dyn VideoProviderClient>,
    auth_provider: Arc<dyn AuthProviderClient>,
    interval_seconds: u64,
    cancellation_token: CancellationToken,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

    tracing::info!(
        target: "cc.tasks.reaper",
        interval_seconds,
        "Session reaper started"
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match reaper_pass(&pool, video_provider.as_ref(), auth_provider.as_ref()).await {
                    Ok(stats) => {
                        record_reaper_pass(stats.retried, stats.resolved, stats.orphans_deleted);
                        if stats.retried > 0 || stats.orphans_deleted > 0 {
                            tracing::info!(
                                target: "cc.tasks.reaper",
                                retried = stats.retried,
                                resolved = stats.resolved,
                                orphans_deleted = stats.orphans_deleted,
                                "Reaper pass complete"
                            );
                        }
                    }
                    Err(e) => {
                        tracing::warn!(target: "cc.tasks.reaper", error = %e, "Reaper pass failed");
                    }
                }
            }
            _ = cancellation_token.cancelled() => {
                tracing::info!(target: "cc.tasks.reaper", "Session reaper stopping");
                break;
            }
        }
    }
}

/// One reconciliation pass.
pub async fn reaper_pass(
    pool: &PgPool,
    video_provider: &dyn VideoProviderClient,
    auth_provider: &dyn AuthProviderClient,
) -> Result<ReaperStats, CcError> {
    let mut stats = ReaperStats::default();

    retry_dead_letters(pool, video_provider, auth_provider, &mut stats).await?;
    reap_orphan_sessions(pool, video_provider, &mut stats).await?;

    Ok(stats)
}

async fn retry_dead_letters(
    pool: &PgPool,
    video_provider: &dyn VideoProviderClient,
    auth_provider: &dyn AuthProviderClient,
    stats: &mut ReaperStats,
) -> Result<(), CcError> {
    let pending = DeadLettersRepository::unresolved(pool, RETRY_BATCH_SIZE).await?;

    for entry in pending {
        stats.retried += 1;

        let result = match entry.resource_type.as_str() {
            RESOURCE_SESSION => video_provider.delete_session(&entry.resource_id).await,
            RESOURCE_ATTENDEE => match entry.resource_id.split_once('/') {
                Some((session_id, attendee_id)) => {
                    video_provider.delete_attendee(session_id, attendee_id).await
                }
                // Unaddressable entry; resolve it so it stops recycling.
                None => Ok(()),
            },
            RESOURCE_IDENTITY => match Uuid::parse_str(&entry.resource_id) {
                Ok(user_id) => auth_provider.delete_identity(user_id).await,
                Err(_) => Ok(()),
            },
            other => {
                tracing::warn!(
                    target: "cc.tasks.reaper",
                    resource_type = other,
                    failure_id = %entry.failure_id,
                    "Unknown dead-letter resource type"
                );
                Ok(())
            }
        };

        match result {
            Ok(()) => {
                DeadLettersRepository::mark_resolved(pool, entry.failure_id).await?;
                stats.resolved += 1;
            }
            Err(e) => {
                tracing::debug!(
                    target: "cc.tasks.reaper",
                    failure_id = %entry.failure_id,
                    error = %e,
                    "Dead-letter retry failed, will retry next pass"
                );
            }
        }
    }

    Ok(())
}

async fn reap_orphan_sessions(
    pool: &PgPool,
    video_provider: &dyn VideoProviderClient,
    stats: &mut ReaperStats,
) -> Result<(), CcError> {
    let provider_sessions = video_provider.list_sessions().await?;
    let live: HashSet<String> = MeetingsRepository::live_external_session_ids(pool)
        .await?
        .into_iter()
        .collect();

    for session_id in provider_sessions {
        if live.contains(&session_id) {
            continue;
        }

        match video_provider.delete_session(&session_id).await {
            Ok(()) => {
                stats.orphans_deleted += 1;
                tracing::info!(
                    target: "cc.tasks.reaper",
                    session_id = %session_id,
                    "Deleted orphaned provider session"
                );
            }
            Err(e) => {
                tracing::warn!(
                    target: "cc.tasks.reaper",
                    session_id = %session_id,
                    error = %e,
                    "Failed to delete orphaned session"
                );
            }
        }
    }

    Ok(())
}
