//! Postgres pool factory and the error type shared by every store.

pub mod migrate;

pub use sqlx;

use anyhow::Context;
use shelf_kernel::settings::DatabaseSettings;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use thiserror::Error;

/// Open the connection pool described by `settings`.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<PgPool> {
    let options = connect_options(settings)?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect_with(options)
        .await
        .with_context(|| "failed to connect to Postgres")?;

    tracing::info!(
        target: "shelf-db",
        max_connections = settings.max_connections,
        "database pool ready"
    );
    Ok(pool)
}

/// Build connect options, preferring `url` over the individual parts.
pub fn connect_options(settings: &DatabaseSettings) -> anyhow::Result<PgConnectOptions> {
    match settings.url.as_deref() {
        Some(url) => url
            .parse::<PgConnectOptions>()
            .with_context(|| "invalid database.url"),
        None => Ok(PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.name)),
    }
}

/// Failure reported by a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint or index rejected the write.
    #[error("unique constraint '{constraint}' violated")]
    UniqueViolation { constraint: String },

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    /// Whether this is a unique violation of the named constraint.
    pub fn violates(&self, name: &str) -> bool {
        matches!(self, StoreError::UniqueViolation { constraint } if constraint == name)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or_default().to_string(),
                };
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
