//! The per-player ledger row: the authoritative economy record.
//!
//! One [`UserLedger`] exists per player. Every engine (tap, upgrade,
//! boost, passive income, referral) mutates exactly one row per
//! action, through the invariant-preserving mutators defined here.
//!
//! # Invariants
//!
//! - `coins >= 0` and `0 <= energy <= max_energy` after every mutation.
//! - Level counters only increase.
//! - `referrer_id` is set at creation and never modified afterwards;
//!   it doubles as the dedup marker for referral crediting.
//! - At most one boost slot is live at any instant.
//!
//! All arithmetic uses checked or saturating operations. No panics,
//! no silent overflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::UpgradeTrack;
use crate::ids::UserId;

/// Energy capacity of a freshly created ledger row.
pub const DEFAULT_MAX_ENERGY: i64 = 1_000;

/// A live time-boxed buff occupying the single boost slot.
///
/// The slot is strongly typed rather than a string-keyed map: presence
/// of the value means the boost was activated, and expiry is decided
/// lazily by comparing `expires_at` against the current clock reading
/// on every access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveBoost {
    /// Instant at which the buff stops applying.
    pub expires_at: DateTime<Utc>,
}

impl ActiveBoost {
    /// Whether the buff is still live at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Whole seconds until expiry, floored at zero.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        self.expires_at
            .signed_duration_since(now)
            .num_seconds()
            .max(0)
    }
}

/// The authoritative per-player economy record.
///
/// Engines never talk to each other; they share only these fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLedger {
    /// External platform identity of the player.
    pub user_id: UserId,
    /// Display name, when the platform supplied one.
    pub username: Option<String>,
    /// Spendable coin balance. Never negative.
    pub coins: i64,
    /// Current energy. Always within `0..=max_energy`.
    pub energy: i64,
    /// Energy capacity. Raised by the energy upgrade track.
    pub max_energy: i64,
    /// Multitap track level (+1 coins per tap per level).
    pub multitap_level: u32,
    /// Profit track level (passive hourly rate).
    pub profit_level: u32,
    /// Energy track level (energy capacity).
    pub energy_level: u32,
    /// Luck track level (critical-tap bands).
    pub luck_level: u32,
    /// Timestamp of the last passive-income accrual. Absent until the
    /// first payout.
    pub last_passive_income_at: Option<DateTime<Utc>>,
    /// The single boost slot ("mega boost"). `None` means Idle.
    pub active_boost: Option<ActiveBoost>,
    /// Identity of the referring player, set at most once, at creation.
    pub referrer_id: Option<UserId>,
    /// Number of invitees successfully credited to this player.
    pub referral_count: u32,
    /// Total coins earned from referral bonuses.
    pub referral_earnings: i64,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}

impl UserLedger {
    /// Create a fresh ledger row with default values.
    ///
    /// `referrer_id` is immutable after this point; the caller is
    /// responsible for crediting the referrer in the same transaction
    /// that persists this row.
    pub const fn new(
        user_id: UserId,
        username: Option<String>,
        referrer_id: Option<UserId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            username,
            coins: 0,
            energy: DEFAULT_MAX_ENERGY,
            max_energy: DEFAULT_MAX_ENERGY,
            multitap_level: 0,
            profit_level: 0,
            energy_level: 0,
            luck_level: 0,
            last_passive_income_at: None,
            active_boost: None,
            referrer_id,
            referral_count: 0,
            referral_earnings: 0,
            created_at,
        }
    }

    /// Credit coins to the balance. Negative amounts are ignored.
    pub const fn credit_coins(&mut self, amount: i64) {
        if amount > 0 {
            self.coins = self.coins.saturating_add(amount);
        }
    }

    /// Debit coins if the balance covers the amount.
    ///
    /// Returns `true` when the debit was applied. A non-positive
    /// amount or an insufficient balance leaves the row untouched.
    pub const fn try_debit_coins(&mut self, amount: i64) -> bool {
        if amount < 0 || self.coins < amount {
            return false;
        }
        self.coins = self.coins.saturating_sub(amount);
        true
    }

    /// Debit energy if the current reserve covers the amount.
    ///
    /// Returns `true` when the debit was applied.
    pub const fn try_debit_energy(&mut self, amount: i64) -> bool {
        if amount < 0 || self.energy < amount {
            return false;
        }
        self.energy = self.energy.saturating_sub(amount);
        true
    }

    /// Add energy, clamped to the capacity. Returns the new reserve.
    ///
    /// Idempotent no-op when already at capacity.
    pub const fn recover_energy(&mut self, amount: i64) -> i64 {
        if amount > 0 {
            let raised = self.energy.saturating_add(amount);
            self.energy = if raised > self.max_energy {
                self.max_energy
            } else {
                raised
            };
        }
        self.energy
    }

    /// Raise the energy capacity and refill the reserve to the new cap.
    ///
    /// The full refill is part of the energy upgrade's contract, not an
    /// accident. A `new_max` below the current capacity is ignored so
    /// the capacity stays monotone.
    pub const fn raise_max_energy(&mut self, new_max: i64) {
        if new_max > self.max_energy {
            self.max_energy = new_max;
        }
        self.energy = self.max_energy;
    }

    /// Current level of the given track.
    pub const fn level(&self, track: UpgradeTrack) -> u32 {
        match track {
            UpgradeTrack::Multitap => self.multitap_level,
            UpgradeTrack::Profit => self.profit_level,
            UpgradeTrack::Energy => self.energy_level,
            UpgradeTrack::Luck => self.luck_level,
        }
    }

    /// Increment the given track's level by exactly one.
    pub const fn raise_level(&mut self, track: UpgradeTrack) {
        let slot = match track {
            UpgradeTrack::Multitap => &mut self.multitap_level,
            UpgradeTrack::Profit => &mut self.profit_level,
            UpgradeTrack::Energy => &mut self.energy_level,
            UpgradeTrack::Luck => &mut self.luck_level,
        };
        *slot = slot.saturating_add(1);
    }

    /// Record one successfully credited invitee on the referrer's row.
    pub const fn credit_referral(&mut self, bonus: i64) {
        self.credit_coins(bonus);
        self.referral_count = self.referral_count.saturating_add(1);
        if bonus > 0 {
            self.referral_earnings = self.referral_earnings.saturating_add(bonus);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::arithmetic_side_effects)]

    use super::*;

    fn fresh() -> UserLedger {
        UserLedger::new(UserId::new(1), Some(String::from("alice")), None, Utc::now())
    }

    #[test]
    fn new_ledger_has_defaults() {
        let ledger = fresh();
        assert_eq!(ledger.coins, 0);
        assert_eq!(ledger.energy, DEFAULT_MAX_ENERGY);
        assert_eq!(ledger.max_energy, DEFAULT_MAX_ENERGY);
        assert_eq!(ledger.multitap_level, 0);
        assert!(ledger.active_boost.is_none());
        assert!(ledger.last_passive_income_at.is_none());
    }

    #[test]
    fn debit_never_goes_negative() {
        let mut ledger = fresh();
        ledger.credit_coins(100);
        assert!(!ledger.try_debit_coins(101));
        assert_eq!(ledger.coins, 100);
        assert!(ledger.try_debit_coins(100));
        assert_eq!(ledger.coins, 0);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let mut ledger = fresh();
        ledger.credit_coins(-50);
        assert_eq!(ledger.coins, 0);
        assert!(!ledger.try_debit_coins(-1));
        assert!(!ledger.try_debit_energy(-1));
    }

    #[test]
    fn recover_energy_clamps_to_cap() {
        let mut ledger = fresh();
        assert!(ledger.try_debit_energy(5));
        assert_eq!(ledger.recover_energy(3), DEFAULT_MAX_ENERGY - 2);
        // Recovering past the cap is an idempotent no-op.
        assert_eq!(ledger.recover_energy(10), DEFAULT_MAX_ENERGY);
        assert_eq!(ledger.recover_energy(10), DEFAULT_MAX_ENERGY);
    }

    #[test]
    fn raise_max_energy_refills() {
        let mut ledger = fresh();
        assert!(ledger.try_debit_energy(500));
        ledger.raise_max_energy(1_500);
        assert_eq!(ledger.max_energy, 1_500);
        assert_eq!(ledger.energy, 1_500);
        // A lower cap is ignored but the refill contract still holds.
        ledger.raise_max_energy(1_000);
        assert_eq!(ledger.max_energy, 1_500);
    }

    #[test]
    fn levels_only_increase() {
        let mut ledger = fresh();
        for track in UpgradeTrack::ALL {
            assert_eq!(ledger.level(track), 0);
            ledger.raise_level(track);
            assert_eq!(ledger.level(track), 1);
        }
    }

    #[test]
    fn referral_credit_moves_all_three_fields() {
        let mut ledger = fresh();
        ledger.credit_referral(1_000);
        ledger.credit_referral(1_000);
        assert_eq!(ledger.coins, 2_000);
        assert_eq!(ledger.referral_count, 2);
        assert_eq!(ledger.referral_earnings, 2_000);
    }

    #[test]
    fn boost_remaining_seconds_floors_at_zero() {
        let now = Utc::now();
        let boost = ActiveBoost {
            expires_at: now - chrono::Duration::seconds(5),
        };
        assert!(!boost.is_live(now));
        assert_eq!(boost.remaining_seconds(now), 0);
    }

    #[test]
    fn ledger_roundtrip_serde() {
        let ledger = fresh();
        let json = serde_json::to_string(&ledger).ok();
        assert!(json.is_some());
        let restored: Result<UserLedger, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(ledger));
    }
}
