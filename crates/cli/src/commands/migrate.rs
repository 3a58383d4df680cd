//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! bestdeal-cli migrate sessions
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! The storefront keeps no business data of its own, so the only schema is
//! the session store's (`tower_sessions.session`). The migration is
//! idempotent.

use super::{CommandError, connect_store};

/// Create the session store schema and table.
pub async fn sessions() -> Result<(), CommandError> {
    let (_pool, store) = connect_store().await?;

    tracing::info!("Running session store migration...");
    store.migrate().await?;

    tracing::info!("Session store migration complete!");
    Ok(())
}
