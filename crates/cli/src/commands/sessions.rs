//! Session store maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Show how many sessions are stored and how many have expired
//! bestdeal-cli sessions stats
//!
//! # Delete expired sessions
//! bestdeal-cli sessions purge-expired
//! ```

use tower_sessions::ExpiredDeletion;

use super::{CommandError, connect_store};

const COUNT_SQL: &str = r"
    SELECT
        count(*) AS total,
        count(*) FILTER (WHERE expiry_date < now()) AS expired
    FROM tower_sessions.session
";

/// Print session counts.
pub async fn stats() -> Result<(), CommandError> {
    let (pool, _store) = connect_store().await?;

    let (total, expired): (i64, i64) = sqlx::query_as(COUNT_SQL).fetch_one(&pool).await?;
    tracing::info!(total, expired, active = total - expired, "Session store");
    Ok(())
}

/// Delete every expired session.
pub async fn purge_expired() -> Result<(), CommandError> {
    let (pool, store) = connect_store().await?;

    let (_, expired): (i64, i64) = sqlx::query_as(COUNT_SQL).fetch_one(&pool).await?;
    store.delete_expired().await?;

    tracing::info!(deleted = expired, "Expired sessions purged");
    Ok(())
}
