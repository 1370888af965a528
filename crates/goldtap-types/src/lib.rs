//! Shared type definitions for the Goldtap economy service.
//!
//! This crate is the single source of truth for the types shared
//! across the Goldtap workspace: the per-player ledger row, the
//! strongly-typed player identity, and the upgrade-track enumeration.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrapper for the external player identity
//! - [`enums`] -- Upgrade tracks and registration outcomes
//! - [`ledger`] -- The [`UserLedger`] row and its invariant-preserving
//!   mutators

pub mod enums;
pub mod ids;
pub mod ledger;

// Re-export all public types at crate root for convenience.
pub use enums::{RegisterStatus, UnknownTrack, UpgradeTrack};
pub use ids::UserId;
pub use ledger::{ActiveBoost, DEFAULT_MAX_ENERGY, UserLedger};
