//! Passive income accrual: a lump coin credit computed from elapsed
//! wall-clock time since the last accrual.
//!
//! Income is paid only when the gate is satisfied: the accrual
//! timestamp is unset, or at least one effective interval has elapsed.
//! The payout covers every whole cycle that elapsed (minimum one) so a
//! player who stayed away for an hour collects six 10-minute slices in
//! one call. An unsatisfied gate is a no-op returning zero income, not
//! an error.
//!
//! The caller-supplied bonus descriptor is unauthenticated input and
//! is clamped to a safe range rather than trusted verbatim: the
//! multiplier to `[0, 10]`, the interval to at least
//! [`MIN_INCOME_INTERVAL_SECS`].

use chrono::{DateTime, Utc};
use goldtap_types::UserLedger;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::tiers;

/// Default accrual interval: one 10-minute cycle.
pub const DEFAULT_INCOME_INTERVAL_SECS: i64 = 600;

/// Floor applied to caller-supplied interval overrides.
pub const MIN_INCOME_INTERVAL_SECS: i64 = 60;

/// Number of accrual cycles in one hour of rate.
const CYCLES_PER_HOUR: i64 = 6;

/// Which parts of the bonus descriptor apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusKind {
    /// Scale the payout only.
    Multiplier,
    /// Override the accrual interval only.
    Interval,
    /// Both of the above.
    Both,
}

/// Caller-supplied bonus descriptor for one accrual call.
///
/// Supplied by the front end without server-side derivation; every
/// field is clamped before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeBonus {
    /// Which parts of the descriptor apply.
    pub kind: BonusKind,
    /// Payout multiplier (clamped to `[0, 10]`).
    #[serde(default)]
    pub multiplier: Option<Decimal>,
    /// Accrual interval override in seconds (clamped to at least
    /// [`MIN_INCOME_INTERVAL_SECS`]).
    #[serde(default)]
    pub interval_secs: Option<i64>,
}

impl IncomeBonus {
    /// The payout multiplier after clamping, 1 when not applicable.
    fn effective_multiplier(&self) -> Decimal {
        match self.kind {
            BonusKind::Multiplier | BonusKind::Both => self
                .multiplier
                .unwrap_or(Decimal::ONE)
                .clamp(Decimal::ZERO, Decimal::TEN),
            BonusKind::Interval => Decimal::ONE,
        }
    }

    /// The accrual interval after clamping, the default when not
    /// applicable.
    fn effective_interval_secs(&self) -> i64 {
        match self.kind {
            BonusKind::Interval | BonusKind::Both => self
                .interval_secs
                .unwrap_or(DEFAULT_INCOME_INTERVAL_SECS)
                .max(MIN_INCOME_INTERVAL_SECS),
            BonusKind::Multiplier => DEFAULT_INCOME_INTERVAL_SECS,
        }
    }
}

/// Result of one accrual call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeOutcome {
    /// Coins credited by this call (0 when the gate was not satisfied).
    pub income: i64,
    /// Coin balance after the credit.
    pub coins: i64,
}

/// Collect passive income at `now`.
///
/// On payout the coins are credited and `last_passive_income_at` is
/// reset to `now`; otherwise the row is untouched.
pub fn collect(
    ledger: &mut UserLedger,
    bonus: Option<&IncomeBonus>,
    now: DateTime<Utc>,
) -> IncomeOutcome {
    let interval_secs = bonus.map_or(DEFAULT_INCOME_INTERVAL_SECS, IncomeBonus::effective_interval_secs);
    let multiplier = bonus.map_or(Decimal::ONE, IncomeBonus::effective_multiplier);

    let cycles = match ledger.last_passive_income_at {
        None => 1,
        Some(last) => {
            let elapsed_secs = now.signed_duration_since(last).num_seconds();
            if elapsed_secs < interval_secs {
                // Gate not satisfied: a no-op, not an error.
                return IncomeOutcome {
                    income: 0,
                    coins: ledger.coins,
                };
            }
            elapsed_secs.checked_div(interval_secs).unwrap_or(1).max(1)
        }
    };

    // One cycle pays a 10-minute slice of the hourly rate, floored.
    let per_cycle = tiers::hourly_rate(ledger.profit_level).saturating_div(CYCLES_PER_HOUR);
    let subtotal = per_cycle.saturating_mul(cycles);
    let income = Decimal::from(subtotal)
        .checked_mul(multiplier)
        .unwrap_or(Decimal::MAX)
        .floor()
        .to_i64()
        .unwrap_or(i64::MAX)
        .max(0);

    ledger.credit_coins(income);
    ledger.last_passive_income_at = Some(now);

    tracing::debug!(
        user_id = %ledger.user_id,
        income,
        cycles,
        interval_secs,
        "passive income collected"
    );

    IncomeOutcome {
        income,
        coins: ledger.coins,
    }
}
