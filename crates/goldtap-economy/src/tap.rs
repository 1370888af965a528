//! The tap engine: resolve one click into an energy debit and a coin
//! credit.
//!
//! A multi-click request from the client is treated as one resolved
//! tap; payout is always for a single canonical tap so a modified
//! client cannot inflate its gains by declaring a click count.
//!
//! # Order of operations
//!
//! 1. Compute `base_tap` from the multitap level.
//! 2. Sweep the boost slot (lazy expiry write-back) and note whether
//!    the mega boost is live.
//! 3. Roll the critical-tap multiplier from the luck bands.
//! 4. If boosted: double the multiplier, skip the energy debit.
//!    Otherwise debit the flat tap cost or fail.
//! 5. Credit `base_tap * multiplier` coins.

use chrono::{DateTime, Utc};
use goldtap_types::UserLedger;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::boost;
use crate::tiers::{TAP_ENERGY_COST, coins_per_tap};
use crate::EconomyError;

/// Number of per-mille slots in one crit roll.
const ROLL_SLOTS: u32 = 1_000;

/// Result of one resolved tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapOutcome {
    /// Coin balance after the credit.
    pub coins: i64,
    /// Energy reserve after the debit (unchanged while boosted).
    pub energy: i64,
    /// Coins per tap before any multiplier.
    pub tap_value: i64,
    /// The resolved multiplier, including the boost doubling.
    pub multiplier: i64,
    /// Coins actually credited (`tap_value * multiplier`).
    pub actual_gain: i64,
    /// Whether the crit roll landed in a x2/x3/x5 band.
    pub crit: bool,
    /// Whether the mega boost was live for this tap.
    pub mega_boost_active: bool,
}

/// Cumulative crit band widths, in per-mille of one roll.
///
/// Bands are checked in x5, x3, x2 priority order; the remainder of
/// the roll space is a plain x1 tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CritBands {
    /// Width of the x5 band.
    five: u32,
    /// Width of the x3 band.
    three: u32,
    /// Width of the x2 band.
    two: u32,
}

/// Band widths for a luck level. Every band strictly enlarges with the
/// bucket.
const fn bands_for_luck(luck_level: u32) -> CritBands {
    match luck_level {
        0 => CritBands {
            five: 2,
            three: 10,
            two: 30,
        },
        1..=2 => CritBands {
            five: 5,
            three: 20,
            two: 50,
        },
        3..=4 => CritBands {
            five: 10,
            three: 35,
            two: 80,
        },
        5..=6 => CritBands {
            five: 20,
            three: 55,
            two: 120,
        },
        7..=9 => CritBands {
            five: 35,
            three: 80,
            two: 170,
        },
        _ => CritBands {
            five: 50,
            three: 120,
            two: 250,
        },
    }
}

/// Classify a per-mille roll into its multiplier.
const fn classify_roll(luck_level: u32, roll: u32) -> (i64, bool) {
    let bands = bands_for_luck(luck_level);
    if roll < bands.five {
        return (5, true);
    }
    if roll < bands.five.saturating_add(bands.three) {
        return (3, true);
    }
    if roll < bands.five.saturating_add(bands.three).saturating_add(bands.two) {
        return (2, true);
    }
    (1, false)
}

/// Resolve one tap, drawing the crit roll from `rng`.
///
/// # Errors
///
/// Returns [`EconomyError::InsufficientEnergy`] when no boost is live
/// and the reserve does not cover the flat tap cost.
pub fn resolve_tap<R: Rng + ?Sized>(
    ledger: &mut UserLedger,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<TapOutcome, EconomyError> {
    let roll = rng.random_range(0..ROLL_SLOTS);
    resolve_tap_with_roll(ledger, now, roll)
}

/// Resolve one tap with an explicit per-mille roll in `0..1000`.
///
/// Split out from [`resolve_tap`] so the deterministic part of the
/// engine can be exercised without a seeded generator.
pub fn resolve_tap_with_roll(
    ledger: &mut UserLedger,
    now: DateTime<Utc>,
    roll: u32,
) -> Result<TapOutcome, EconomyError> {
    let tap_value = coins_per_tap(ledger.multitap_level);

    // Lazy expiry: the sweep may remove a stale boost entry, which the
    // caller persists together with the balances.
    let boosted = boost::sweep(ledger, now);

    let (luck_multiplier, crit) = classify_roll(ledger.luck_level, roll);
    let multiplier = if boosted {
        luck_multiplier.saturating_mul(2)
    } else {
        luck_multiplier
    };

    // Boosted taps suspend the energy debit entirely.
    if !boosted && !ledger.try_debit_energy(TAP_ENERGY_COST) {
        return Err(EconomyError::InsufficientEnergy {
            needed: TAP_ENERGY_COST,
            available: ledger.energy,
        });
    }

    let actual_gain = tap_value.saturating_mul(multiplier);
    ledger.credit_coins(actual_gain);

    Ok(TapOutcome {
        coins: ledger.coins,
        energy: ledger.energy,
        tap_value,
        multiplier,
        actual_gain,
        crit,
        mega_boost_active: boosted,
    })
}
