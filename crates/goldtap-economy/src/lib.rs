//! Economy engines for the Goldtap idle-clicker service.
//!
//! Every inbound action loads one [`UserLedger`](goldtap_types::UserLedger)
//! row, runs exactly one engine from this crate, and persists the
//! updated row. Engines never call each other; they share only the
//! ledger's fields and the tier tables.
//!
//! # Design
//!
//! - **On-demand time**: there is no scheduler. Boost expiry and income
//!   eligibility are pure functions of `(stored state, now)`, evaluated
//!   at the moment of the next relevant request.
//! - **Typed failures**: every rejection carries a specific
//!   [`EconomyError`] kind so callers can distinguish "try again" from
//!   "this will never succeed".
//! - **Integer discipline**: all balances are integers mutated through
//!   checked or saturating operations; the only fractional value (the
//!   passive-income bonus multiplier) uses [`rust_decimal::Decimal`].
//!
//! # Modules
//!
//! - [`tiers`] -- Static, monotone price and effect tables per track
//! - [`tap`] -- One click: energy debit, crit roll, coin credit
//! - [`upgrade`] -- One level-up: validate, debit, recompute stats
//! - [`boost`] -- The single time-boxed buff slot with lazy expiry
//! - [`income`] -- Lump passive-income accrual from wall-clock deltas
//! - [`referral`] -- One-time referrer bonus arithmetic
//! - [`guard`] -- Sliding-window rate counters for spam protection

pub mod boost;
pub mod guard;
pub mod income;
pub mod referral;
pub mod tap;
pub mod tiers;
pub mod upgrade;

// Re-export primary types at crate root.
pub use boost::{BoostStatus, MEGA_BOOST_DURATION_SECS};
pub use guard::{KeyedWindows, SlidingWindow};
pub use income::{BonusKind, IncomeBonus, IncomeOutcome};
pub use referral::{REFERRAL_BONUS, ReferralStats};
pub use tap::TapOutcome;
pub use upgrade::UpgradeOutcome;

use goldtap_types::UpgradeTrack;

/// Errors produced by the economy engines.
///
/// All variants are terminal for the action that produced them: the
/// ledger row is left untouched and the caller can report the failure
/// without compensating.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EconomyError {
    /// The tap's energy cost exceeds the current reserve.
    #[error("insufficient energy: need {needed}, have {available}")]
    InsufficientEnergy {
        /// Energy required by the action.
        needed: i64,
        /// Energy currently available.
        available: i64,
    },

    /// The upgrade price exceeds the coin balance.
    #[error("insufficient funds: price {price}, balance {balance}")]
    InsufficientFunds {
        /// Price of the attempted purchase.
        price: i64,
        /// Coins currently available.
        balance: i64,
    },

    /// The track has no further levels to purchase.
    #[error("{track} track already at maximum level {level}")]
    MaxLevelReached {
        /// The track that is capped.
        track: UpgradeTrack,
        /// The current (maximum) level.
        level: u32,
    },

    /// A boost activation was attempted while one is already live.
    ///
    /// The live boost's timer is not extended or restarted.
    #[error("boost already active for another {remaining_seconds}s")]
    BoostAlreadyActive {
        /// Whole seconds until the live boost expires.
        remaining_seconds: i64,
    },
}
