//! Shared application state for the Goldtap API server.
//!
//! [`AppState`] holds the database pool, the per-user lock map that
//! serializes mutations to a single ledger row, and the two abuse-guard
//! window families. It is wrapped in [`Arc`] and injected via Axum's
//! `State` extractor.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use goldtap_economy::guard::{
    ADDR_LIMIT, ADDR_WINDOW_SECS, KeyedWindows, TAP_LIMIT, TAP_WINDOW_SECS,
};
use goldtap_types::UserId;
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::error::ApiError;

/// Shared state for the Axum application.
///
/// The lock map guarantees that the load-run-persist sequence for one
/// player never interleaves with another mutation of the same row;
/// different players proceed independently. The abuse guards are
/// process-local and reset on restart; no ledger invariant depends on
/// them.
pub struct AppState {
    /// `PostgreSQL` connection pool.
    pool: PgPool,
    /// Per-user mutation locks, created on first use and evicted once
    /// no request holds them.
    user_locks: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
    /// Per-user tap rate windows.
    tap_guard: Mutex<KeyedWindows<UserId>>,
    /// Per-client-address, per-endpoint request windows.
    addr_guard: Mutex<KeyedWindows<(IpAddr, &'static str)>>,
}

impl AppState {
    /// Create a new application state around a connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            user_locks: Mutex::new(HashMap::new()),
            tap_guard: Mutex::new(KeyedWindows::new(
                TAP_LIMIT,
                Duration::seconds(TAP_WINDOW_SECS),
            )),
            addr_guard: Mutex::new(KeyedWindows::new(
                ADDR_LIMIT,
                Duration::seconds(ADDR_WINDOW_SECS),
            )),
        }
    }

    /// Return a reference to the underlying [`PgPool`].
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Fetch (or create) the mutation lock for a player.
    ///
    /// The returned handle is cloned out of the map so the map lock is
    /// held only for the lookup, never across the ledger mutation.
    /// Each lookup also drops entries no request holds anymore, so the
    /// map tracks players with a mutation in flight rather than every
    /// player ever seen.
    pub async fn user_lock(&self, user_id: UserId) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        let lock = Arc::clone(locks.entry(user_id).or_default());
        // The clone taken above keeps the current entry alive.
        locks.retain(|_, l| Arc::strong_count(l) > 1);
        lock
    }

    /// Admit one tap for `user_id`, or reject with [`ApiError::RateLimited`].
    pub async fn check_tap_limit(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        let mut guard = self.tap_guard.lock().await;
        if guard.check_and_record(user_id, now) {
            Ok(())
        } else {
            tracing::warn!(user_id = %user_id, "Tap rate limit exceeded");
            Err(ApiError::RateLimited(format!(
                "tap limit of {TAP_LIMIT} per {TAP_WINDOW_SECS}s exceeded"
            )))
        }
    }

    /// Admit one request for `(addr, endpoint)`, or reject with
    /// [`ApiError::RateLimited`].
    ///
    /// A request without a resolvable client address (as in router
    /// tests driven through `oneshot`) is admitted unconditionally.
    pub async fn check_addr_limit(
        &self,
        addr: Option<IpAddr>,
        endpoint: &'static str,
        now: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        let Some(addr) = addr else {
            return Ok(());
        };
        let mut guard = self.addr_guard.lock().await;
        if guard.check_and_record((addr, endpoint), now) {
            Ok(())
        } else {
            tracing::warn!(%addr, endpoint, "Address rate limit exceeded");
            Err(ApiError::RateLimited(format!(
                "request limit of {ADDR_LIMIT} per {ADDR_WINDOW_SECS}s exceeded"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_state() -> AppState {
        // A lazy pool performs no I/O until a query runs; the guard
        // paths under test never touch the database.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy_with(sqlx::postgres::PgConnectOptions::new());
        AppState::new(pool)
    }

    #[tokio::test]
    async fn tap_limit_rejects_the_101st_tap() {
        let state = lazy_state();
        let now = Utc::now();
        let user = UserId::new(1);

        for _ in 0..TAP_LIMIT {
            assert!(state.check_tap_limit(user, now).await.is_ok());
        }
        let rejected = state.check_tap_limit(user, now).await;
        assert!(matches!(rejected, Err(ApiError::RateLimited(_))));

        // A different user is unaffected.
        assert!(state.check_tap_limit(UserId::new(2), now).await.is_ok());
    }

    #[tokio::test]
    async fn missing_client_address_is_admitted() {
        let state = lazy_state();
        let result = state.check_addr_limit(None, "tap", Utc::now()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn endpoints_are_limited_independently_per_address() {
        let state = lazy_state();
        let now = Utc::now();
        let addr: IpAddr = "10.0.0.1".parse().unwrap_or(IpAddr::from([127, 0, 0, 1]));

        for _ in 0..ADDR_LIMIT {
            assert!(state.check_addr_limit(Some(addr), "tap", now).await.is_ok());
        }
        let rejected = state.check_addr_limit(Some(addr), "tap", now).await;
        assert!(matches!(rejected, Err(ApiError::RateLimited(_))));

        // The same address still has budget on another endpoint.
        assert!(
            state
                .check_addr_limit(Some(addr), "upgrade", now)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn user_lock_is_shared_per_user() {
        let state = lazy_state();
        let a = state.user_lock(UserId::new(1)).await;
        let b = state.user_lock(UserId::new(1)).await;
        let c = state.user_lock(UserId::new(2)).await;

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn idle_user_locks_are_evicted_on_lookup() {
        let state = lazy_state();

        let held = state.user_lock(UserId::new(1)).await;
        drop(state.user_lock(UserId::new(2)).await);

        // The next lookup sweeps entries with no handle outstanding.
        let _other = state.user_lock(UserId::new(3)).await;
        let locks = state.user_locks.lock().await;
        assert_eq!(locks.len(), 2);
        assert!(locks.contains_key(&UserId::new(1)));
        assert!(!locks.contains_key(&UserId::new(2)));
        drop(held);
    }
}
