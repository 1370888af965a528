//! HTTP API server for the Goldtap economy service.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **REST endpoints** for every player action: registration, taps,
//!   upgrades, energy recovery, passive-income collection, boost
//!   activation, and the read-only views (ledger, boost status,
//!   referral totals, upgrade prices)
//! - **Minimal HTML status page** (`GET /`) listing the endpoints
//!
//! # Architecture
//!
//! Every mutating request runs load-run-persist against exactly one
//! ledger row, serialized per player by the lock map in [`AppState`].
//! Two abuse-guard window families (per-user taps, per-address
//! requests) admit requests before any database work. All
//! time-dependent behavior (boost expiry, income gating) is evaluated
//! lazily against the request clock; no background scheduler exists.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
