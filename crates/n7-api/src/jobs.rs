//! Periodic maintenance tasks.

use std::time::Duration;

use sqlx::PgPool;
use tokio::time::interval;

use n7_db::repositories::token as token_repo;

const TOKEN_CLEANUP_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Start all background jobs
///
/// Returns the join handles so the caller can abort them on shutdown
pub fn start_background_jobs(pool: PgPool) -> Vec<tokio::task::JoinHandle<()>> {
    vec![tokio::spawn(periodic_token_cleanup_job(pool))]
}

/// Delete expired refresh tokens every 6 hours
async fn periodic_token_cleanup_job(pool: PgPool) {
    // Give the server a minute to settle before the first run
    tokio::time::sleep(Duration::from_secs(60)).await;

    let mut interval = interval(TOKEN_CLEANUP_INTERVAL);

    loop {
        interval.tick().await;

        match token_repo::cleanup_expired_refresh_tokens(&pool).await {
            Ok(deleted) if deleted > 0 => {
                tracing::info!(deleted, "Expired refresh tokens cleaned up");
            }
            Ok(_) => {
                tracing::debug!("Token cleanup complete: no expired tokens found");
            }
            Err(e) => {
                tracing::error!("Failed to run periodic token cleanup: {e}");
            }
        }
    }
}
