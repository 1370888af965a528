//! Pool handle for the player ledger database.
//!
//! The whole persistent state of the economy is one `users` row per
//! player, so this layer stays deliberately small: a pool sized from
//! the service configuration, migrations applied once at startup, and
//! runtime parameterized queries (nothing is checked against a live
//! schema at build time).

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

use crate::error::DbError;

/// Pool size when the caller supplies none.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// How long an acquire waits for a free connection before failing.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the `PostgreSQL` pool backing the ledger store.
#[derive(Clone)]
pub struct PostgresPool {
    pool: PgPool,
}

impl PostgresPool {
    /// Open a pool of at most `max_connections` against `url`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] when `url` is not a valid
    /// `PostgreSQL` connection string, [`DbError::Postgres`] when the
    /// server cannot be reached.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DbError> {
        let options: PgConnectOptions = url
            .parse()
            .map_err(|e: sqlx::Error| DbError::Config(format!("invalid database URL: {e}")))?;

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;

        tracing::info!(max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// [`connect`](Self::connect) with the default pool size, for tests
    /// and one-off tools that carry no service configuration.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`connect`](Self::connect).
    pub async fn connect_url(url: &str) -> Result<Self, DbError> {
        Self::connect(url, DEFAULT_MAX_CONNECTIONS).await
    }

    /// Apply pending migrations from the `migrations/` directory.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Migration`] when a migration fails.
    pub async fn run_migrations(&self) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations completed");
        Ok(())
    }

    /// The underlying [`PgPool`], for building a
    /// [`UserStore`](crate::UserStore).
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close every pooled connection gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_url_is_rejected_before_any_io() {
        let result = PostgresPool::connect("not-a-connection-string", 1).await;
        assert!(matches!(result, Err(DbError::Config(_))));
    }
}
