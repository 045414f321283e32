//! Service layer: external provider clients and domain orchestration.

pub mod auth_provider;
pub mod meeting_service;
pub mod roster;
pub mod tenant_service;
pub mod video_provider;

use sqlx::PgPool;

use crate::errors::CcError;
use crate::repositories::dead_letters::DeadLettersRepository;

/// Record a failed compensating delete in the dead-letter log.
///
/// Compensation failures are never surfaced to the caller: the orphaned
/// resource is logged here and retried by the session reaper. If even the
/// dead-letter insert fails, the failure is only visible in the logs.
pub(crate) async fn record_compensation_failure(
    pool: &PgPool,
    resource_type: &str,
    resource_id: &str,
    action: &str,
    error: &CcError,
) {
    tracing::warn!(
        target: "cc.services.compensation",
        resource_type,
        resource_id,
        action,
        error = %error,
        "Compensating delete failed, dead-lettering"
    );

    if let Err(e) =
        DeadLettersRepository::insert(pool, resource_type, resource_id, action, &error.to_string())
            .await
    {
        tracing::error!(
            target: "cc.services.compensation",
            resource_type,
            resource_id,
            error = %e,
            "Failed to record compensation failure"
        );
    }
}
