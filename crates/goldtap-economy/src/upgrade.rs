//! The upgrade engine: validate and apply one level-up on a track.
//!
//! Purchasing level `k` costs the `k`th price-table entry. After the
//! debit the level rises by exactly one and derived stats are
//! recomputed from the *new* level. The energy track additionally
//! refills the current reserve to the new capacity; that courtesy
//! refill is part of the upgrade's contract.

use goldtap_types::{UpgradeTrack, UserLedger};
use serde::{Deserialize, Serialize};

use crate::tiers;
use crate::EconomyError;

/// Result of one applied upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeOutcome {
    /// Coin balance after the debit.
    pub coins: i64,
    /// The track that was upgraded.
    pub track: UpgradeTrack,
    /// The level now held on that track.
    pub new_level: u32,
    /// Price of the next level, or 0 at the cap.
    pub next_cost: i64,
    /// Coins per tap recomputed from the new levels.
    pub profit_per_tap: i64,
    /// Passive hourly rate recomputed from the new levels.
    pub profit_per_hour: i64,
    /// Energy capacity after the upgrade.
    pub max_energy: i64,
}

/// Validate and apply one level-up on `track`.
///
/// # Errors
///
/// Returns [`EconomyError::MaxLevelReached`] when the track's price
/// table is exhausted, or [`EconomyError::InsufficientFunds`] when the
/// balance does not cover the price. Either way the ledger row is left
/// untouched.
pub fn apply_upgrade(
    ledger: &mut UserLedger,
    track: UpgradeTrack,
) -> Result<UpgradeOutcome, EconomyError> {
    let current_level = ledger.level(track);
    let price = tiers::next_price(track, current_level).ok_or(EconomyError::MaxLevelReached {
        track,
        level: current_level,
    })?;

    if !ledger.try_debit_coins(price) {
        return Err(EconomyError::InsufficientFunds {
            price,
            balance: ledger.coins,
        });
    }

    ledger.raise_level(track);
    let new_level = ledger.level(track);

    // Derived stats are recomputed from the new level. Multitap and
    // luck only move the counter; the tap engine reads their effect
    // dynamically.
    if track == UpgradeTrack::Energy {
        ledger.raise_max_energy(tiers::max_energy(new_level));
    }

    tracing::debug!(
        user_id = %ledger.user_id,
        track = %track,
        new_level,
        price,
        "upgrade applied"
    );

    Ok(UpgradeOutcome {
        coins: ledger.coins,
        track,
        new_level,
        next_cost: tiers::next_price(track, new_level).unwrap_or(0),
        profit_per_tap: tiers::coins_per_tap(ledger.multitap_level),
        profit_per_hour: tiers::hourly_rate(ledger.profit_level),
        max_energy: ledger.max_energy,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::arithmetic_side_effects)]

    use super::*;
    use crate::tap::resolve_tap_with_roll;
    use chrono::Utc;
    use goldtap_types::{DEFAULT_MAX_ENERGY, UserId};

    fn funded(coins: i64) -> UserLedger {
        let mut ledger = UserLedger::new(UserId::new(1), None, None, Utc::now());
        ledger.credit_coins(coins);
        ledger
    }

    #[test]
    fn upgrade_debits_the_table_price() {
        let mut ledger = funded(1_000);
        let outcome = apply_upgrade(&mut ledger, UpgradeTrack::Multitap);

        assert_eq!(
            outcome,
            Ok(UpgradeOutcome {
                coins: 500,
                track: UpgradeTrack::Multitap,
                new_level: 1,
                next_cost: 2_000,
                profit_per_tap: 2,
                profit_per_hour: 100,
                max_energy: DEFAULT_MAX_ENERGY,
            }),
        );
    }

    #[test]
    fn upgrade_never_succeeds_below_price() {
        let mut ledger = funded(499);
        let outcome = apply_upgrade(&mut ledger, UpgradeTrack::Multitap);

        assert_eq!(
            outcome,
            Err(EconomyError::InsufficientFunds {
                price: 500,
                balance: 499,
            }),
        );
        assert_eq!(ledger.coins, 499);
        assert_eq!(ledger.multitap_level, 0);
    }

    #[test]
    fn capped_track_rejects_further_purchases() {
        let mut ledger = funded(10_000_000);
        ledger.multitap_level = 5;

        let outcome = apply_upgrade(&mut ledger, UpgradeTrack::Multitap);
        assert_eq!(
            outcome,
            Err(EconomyError::MaxLevelReached {
                track: UpgradeTrack::Multitap,
                level: 5,
            }),
        );
    }

    #[test]
    fn last_purchase_reports_zero_next_cost() {
        let mut ledger = funded(100_000_000);
        ledger.multitap_level = 4;

        let outcome = apply_upgrade(&mut ledger, UpgradeTrack::Multitap);
        assert_eq!(outcome.map(|o| (o.new_level, o.next_cost)), Ok((5, 0)));
    }

    #[test]
    fn energy_upgrade_raises_cap_and_refills() {
        let mut ledger = funded(1_000);
        assert!(ledger.try_debit_energy(900));

        let outcome = apply_upgrade(&mut ledger, UpgradeTrack::Energy);
        assert_eq!(outcome.map(|o| o.max_energy), Ok(1_500));
        // Courtesy full refill, not a bug.
        assert_eq!(ledger.energy, 1_500);
    }

    #[test]
    fn profit_upgrade_recomputes_hourly_rate() {
        let mut ledger = funded(1_000);
        let outcome = apply_upgrade(&mut ledger, UpgradeTrack::Profit);
        assert_eq!(outcome.map(|o| o.profit_per_hour), Ok(300));
    }

    #[test]
    fn tap_upgrade_tap_scenario() {
        const NO_CRIT: u32 = 999;
        let now = Utc::now();
        let mut ledger = UserLedger::new(UserId::new(7), None, None, now);

        // Fresh user taps once.
        let first = resolve_tap_with_roll(&mut ledger, now, NO_CRIT);
        assert_eq!(first.map(|o| o.coins), Ok(1));
        assert_eq!(ledger.energy, DEFAULT_MAX_ENERGY - 1);

        // Fund and buy the first multitap level.
        ledger.credit_coins(499);
        let upgrade = apply_upgrade(&mut ledger, UpgradeTrack::Multitap);
        assert_eq!(upgrade.map(|o| o.new_level), Ok(1));

        // The next tap now yields 2 coins.
        let second = resolve_tap_with_roll(&mut ledger, now, NO_CRIT);
        assert_eq!(second.map(|o| o.actual_gain), Ok(2));
    }
}
