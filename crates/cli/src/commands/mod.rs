//! CLI command implementations.

pub mod migrate;
pub mod sessions;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tower_sessions_sqlx_store::PostgresStore;

/// Errors from CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Session store error: {0}")]
    SessionStore(#[from] tower_sessions::session_store::Error),
}

/// Session database URL: `STOREFRONT_DATABASE_URL`, else `DATABASE_URL`.
pub fn database_url(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, CommandError> {
    lookup("STOREFRONT_DATABASE_URL")
        .or_else(|| lookup("DATABASE_URL"))
        .filter(|url| !url.trim().is_empty())
        .map(SecretString::from)
        .ok_or(CommandError::MissingEnvVar("STOREFRONT_DATABASE_URL"))
}

/// Connect to the session database using the process environment.
pub async fn connect_store() -> Result<(PgPool, PostgresStore), CommandError> {
    dotenvy::dotenv().ok();
    let url = database_url(|key| std::env::var(key).ok())?;

    tracing::info!("Connecting to session database...");
    let pool = PgPool::connect(url.expose_secret()).await?;
    let store = PostgresStore::new(pool.clone());
    Ok((pool, store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_prefers_storefront_var() {
        let url = database_url(|key| match key {
            "STOREFRONT_DATABASE_URL" => Some("postgres://sf".to_string()),
            "DATABASE_URL" => Some("postgres://generic".to_string()),
            _ => None,
        });
        assert!(matches!(url, Ok(url) if url.expose_secret() == "postgres://sf"));
    }

    #[test]
    fn test_database_url_falls_back_and_rejects_blank() {
        let url = database_url(|key| (key == "DATABASE_URL").then(|| "postgres://generic".to_string()));
        assert!(matches!(url, Ok(url) if url.expose_secret() == "postgres://generic"));

        let missing = database_url(|_| Some("  ".to_string()));
        assert!(matches!(missing, Err(CommandError::MissingEnvVar(_))));
    }
}
