//! Persistence for the per-player ledger rows in the `users` table.
//!
//! The store is deliberately whole-row: engines mutate a [`UserLedger`]
//! in memory and the store writes it back in one statement. Referral
//! crediting is the one multi-row operation and runs inside a single
//! transaction with the invitee insert, with the referrer row locked
//! `FOR UPDATE`, so the bonus is applied exactly once.

use chrono::{DateTime, Utc};
use goldtap_economy::referral;
use goldtap_types::{ActiveBoost, RegisterStatus, UserId, UserLedger};
use sqlx::PgPool;

use crate::error::DbError;

/// Operations on the `users` table.
pub struct UserStore<'a> {
    pool: &'a PgPool,
}

impl<'a> UserStore<'a> {
    /// Create a new user store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a player's ledger row, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn get(&self, user_id: UserId) -> Result<Option<UserLedger>, DbError> {
        let row = sqlx::query_as::<_, UserRow>(SELECT_USER)
            .bind(user_id.into_inner())
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(UserRow::into_ledger))
    }

    /// Insert a freshly created ledger row.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the insert fails, including on
    /// a duplicate `user_id`.
    pub async fn insert(&self, ledger: &UserLedger) -> Result<(), DbError> {
        bind_full_row(sqlx::query(INSERT_USER), ledger)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Write back a mutated ledger row.
    ///
    /// `referrer_id` and `created_at` are write-once and deliberately
    /// excluded from the statement.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the update fails.
    pub async fn update(&self, ledger: &UserLedger) -> Result<(), DbError> {
        bind_mutable_fields(sqlx::query(UPDATE_USER), ledger)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Register a player, creating the row if it does not exist.
    ///
    /// Registration is idempotent: an existing row is returned
    /// unchanged with [`RegisterStatus::Exists`]; repeated calls never
    /// re-credit a referrer. On first creation with a valid referrer,
    /// the invitee insert and the referrer credit commit atomically and
    /// the status is [`RegisterStatus::CreatedWithReferral`]. A
    /// referrer id that does not resolve to an existing row, or that
    /// points at the invitee itself, is dropped with a warning and the
    /// row is created without one.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if any statement in the
    /// transaction fails.
    pub async fn register(
        &self,
        user_id: UserId,
        username: Option<String>,
        referrer_id: Option<UserId>,
        now: DateTime<Utc>,
    ) -> Result<(RegisterStatus, UserLedger), DbError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, UserRow>(SELECT_USER)
            .bind(user_id.into_inner())
            .fetch_optional(&mut *tx)
            .await?;
        if let Some(row) = existing {
            tx.commit().await?;
            return Ok((RegisterStatus::Exists, row.into_ledger()));
        }

        // Self-referral is dropped up front so the invitee row never
        // records it.
        let referrer_id = match referrer_id {
            Some(id) if id == user_id => {
                tracing::warn!(user_id = %user_id, "Self-referral ignored");
                None
            }
            other => other,
        };

        let mut referrer_row = match referrer_id {
            Some(id) => {
                let row = sqlx::query_as::<_, UserRow>(SELECT_USER_FOR_UPDATE)
                    .bind(id.into_inner())
                    .fetch_optional(&mut *tx)
                    .await?;
                if row.is_none() {
                    tracing::warn!(
                        user_id = %user_id,
                        referrer_id = %id,
                        "Referrer not found, creating user without referral"
                    );
                }
                row
            }
            None => None,
        };

        let recorded_referrer = referrer_row
            .as_ref()
            .map(|row| UserId::new(row.user_id));
        let ledger = UserLedger::new(user_id, username, recorded_referrer, now);
        bind_full_row(sqlx::query(INSERT_USER), &ledger)
            .execute(&mut *tx)
            .await?;

        let status = if let Some(row) = referrer_row.take() {
            let mut referrer = row.into_ledger();
            let bonus = referral::credit_referrer(&mut referrer, user_id);
            bind_mutable_fields(sqlx::query(UPDATE_USER), &referrer)
                .execute(&mut *tx)
                .await?;
            tracing::debug!(
                referrer_id = %referrer.user_id,
                invitee_id = %user_id,
                bonus,
                "Referrer row persisted with bonus"
            );
            RegisterStatus::CreatedWithReferral
        } else {
            RegisterStatus::Created
        };

        tx.commit().await?;
        Ok((status, ledger))
    }
}

const SELECT_USER: &str = r"SELECT user_id, username, coins, energy, max_energy,
           multitap_level, profit_level, energy_level, luck_level,
           last_passive_income_at, mega_boost_expires_at,
           referrer_id, referral_count, referral_earnings, created_at
      FROM users
     WHERE user_id = $1";

const SELECT_USER_FOR_UPDATE: &str = r"SELECT user_id, username, coins, energy, max_energy,
           multitap_level, profit_level, energy_level, luck_level,
           last_passive_income_at, mega_boost_expires_at,
           referrer_id, referral_count, referral_earnings, created_at
      FROM users
     WHERE user_id = $1
       FOR UPDATE";

const INSERT_USER: &str = r"INSERT INTO users (user_id, username, coins, energy, max_energy,
           multitap_level, profit_level, energy_level, luck_level,
           last_passive_income_at, mega_boost_expires_at,
           referral_count, referral_earnings, referrer_id, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)";

const UPDATE_USER: &str = r"UPDATE users
       SET username = $2,
           coins = $3,
           energy = $4,
           max_energy = $5,
           multitap_level = $6,
           profit_level = $7,
           energy_level = $8,
           luck_level = $9,
           last_passive_income_at = $10,
           mega_boost_expires_at = $11,
           referral_count = $12,
           referral_earnings = $13
     WHERE user_id = $1";

type PgQuery<'q> =
    sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>;

/// Bind the mutable ledger fields in the shared `$1..$13` order.
fn bind_mutable_fields<'q>(query: PgQuery<'q>, ledger: &'q UserLedger) -> PgQuery<'q> {
    query
        .bind(ledger.user_id.into_inner())
        .bind(ledger.username.as_deref())
        .bind(ledger.coins)
        .bind(ledger.energy)
        .bind(ledger.max_energy)
        .bind(level_to_db(ledger.multitap_level))
        .bind(level_to_db(ledger.profit_level))
        .bind(level_to_db(ledger.energy_level))
        .bind(level_to_db(ledger.luck_level))
        .bind(ledger.last_passive_income_at)
        .bind(ledger.active_boost.map(|b| b.expires_at))
        .bind(level_to_db(ledger.referral_count))
        .bind(ledger.referral_earnings)
}

/// Bind a full row for insertion: the mutable fields plus the
/// write-once `referrer_id` and `created_at`.
fn bind_full_row<'q>(query: PgQuery<'q>, ledger: &'q UserLedger) -> PgQuery<'q> {
    bind_mutable_fields(query, ledger)
        .bind(ledger.referrer_id.map(UserId::into_inner))
        .bind(ledger.created_at)
}

/// Convert an in-memory level counter to its `INTEGER` column value.
fn level_to_db(level: u32) -> i32 {
    i32::try_from(level).unwrap_or(i32::MAX)
}

/// Convert an `INTEGER` column value back to a level counter.
///
/// The schema enforces non-negative values; a corrupt negative value
/// degrades to zero rather than panicking.
fn level_from_db(level: i32) -> u32 {
    u32::try_from(level).unwrap_or(0)
}

/// A row from the `users` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    /// External platform identity.
    pub user_id: i64,
    /// Display name, when the platform supplied one.
    pub username: Option<String>,
    /// Spendable coin balance.
    pub coins: i64,
    /// Current energy reserve.
    pub energy: i64,
    /// Energy capacity.
    pub max_energy: i64,
    /// Multitap track level.
    pub multitap_level: i32,
    /// Profit track level.
    pub profit_level: i32,
    /// Energy track level.
    pub energy_level: i32,
    /// Luck track level.
    pub luck_level: i32,
    /// Last passive-income accrual time.
    pub last_passive_income_at: Option<DateTime<Utc>>,
    /// Boost expiry instant; NULL means the slot is idle.
    pub mega_boost_expires_at: Option<DateTime<Utc>>,
    /// Referring player's id, set at creation.
    pub referrer_id: Option<i64>,
    /// Number of credited invitees.
    pub referral_count: i32,
    /// Total coins earned from referral bonuses.
    pub referral_earnings: i64,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    /// Convert the database row into the in-memory ledger shape.
    ///
    /// An expired boost column is carried over verbatim; the engines
    /// sweep it on the next access.
    pub fn into_ledger(self) -> UserLedger {
        UserLedger {
            user_id: UserId::new(self.user_id),
            username: self.username,
            coins: self.coins,
            energy: self.energy,
            max_energy: self.max_energy,
            multitap_level: level_from_db(self.multitap_level),
            profit_level: level_from_db(self.profit_level),
            energy_level: level_from_db(self.energy_level),
            luck_level: level_from_db(self.luck_level),
            last_passive_income_at: self.last_passive_income_at,
            active_boost: self
                .mega_boost_expires_at
                .map(|expires_at| ActiveBoost { expires_at }),
            referrer_id: self.referrer_id.map(UserId::new),
            referral_count: level_from_db(self.referral_count),
            referral_earnings: self.referral_earnings,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_conversion_preserves_boost_and_referrer() {
        let now = Utc::now();
        let row = UserRow {
            user_id: 42,
            username: Some(String::from("alice")),
            coins: 1_234,
            energy: 900,
            max_energy: 1_500,
            multitap_level: 2,
            profit_level: 1,
            energy_level: 1,
            luck_level: 3,
            last_passive_income_at: Some(now),
            mega_boost_expires_at: Some(now),
            referrer_id: Some(7),
            referral_count: 5,
            referral_earnings: 5_000,
            created_at: now,
        };

        let ledger = row.into_ledger();
        assert_eq!(ledger.user_id, UserId::new(42));
        assert_eq!(ledger.multitap_level, 2);
        assert_eq!(ledger.active_boost, Some(ActiveBoost { expires_at: now }));
        assert_eq!(ledger.referrer_id, Some(UserId::new(7)));
        assert_eq!(ledger.referral_count, 5);
    }

    #[test]
    fn corrupt_negative_level_degrades_to_zero() {
        assert_eq!(level_from_db(-3), 0);
        assert_eq!(level_to_db(4), 4);
    }
}
