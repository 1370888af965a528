//! Data layer for the Goldtap economy service (`PostgreSQL`).
//!
//! `PostgreSQL` is the single durable store: one row per player in the
//! `users` table, read into a [`goldtap_types::UserLedger`], mutated in
//! memory by the economy engines, and written back whole. Referral
//! crediting is the only multi-row operation and commits atomically
//! with the invitee insert.
//!
//! # Modules
//!
//! - [`postgres`] -- connection pool and migrations
//! - [`user_store`] -- ledger row persistence and registration
//! - [`error`] -- shared error types

pub mod error;
pub mod postgres;
pub mod user_store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use postgres::PostgresPool;
pub use user_store::{UserRow, UserStore};
