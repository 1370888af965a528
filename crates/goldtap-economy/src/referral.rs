//! Referral credit: the one-time bonus paid to a referrer when an
//! invitee registers.
//!
//! The dedup guard is structural: an invitee's `referrer_id` is set at
//! most once, at creation, so the credit runs exactly once as part of
//! the same transaction that creates the invitee's row. Later reads of
//! the invitee never re-trigger it. This module only supplies the
//! arithmetic applied to the referrer's row; the transactional guard
//! lives in the storage layer.

use goldtap_types::{UserId, UserLedger};
use serde::{Deserialize, Serialize};

/// Coins paid to a referrer per successfully credited invitee.
pub const REFERRAL_BONUS: i64 = 1_000;

/// A referrer's lifetime referral totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralStats {
    /// Number of invitees credited.
    pub count: u32,
    /// Total coins earned from referral bonuses.
    pub earnings: i64,
}

/// Apply the one-time bonus for `invitee` to the referrer's row.
///
/// Returns the credited amount. The caller must persist the referrer's
/// row in the same transaction that creates the invitee.
pub fn credit_referrer(referrer: &mut UserLedger, invitee: UserId) -> i64 {
    referrer.credit_referral(REFERRAL_BONUS);
    tracing::info!(
        referrer_id = %referrer.user_id,
        invitee_id = %invitee,
        bonus = REFERRAL_BONUS,
        referral_count = referrer.referral_count,
        "referral bonus credited"
    );
    REFERRAL_BONUS
}

/// Read a player's referral totals.
pub const fn stats(ledger: &UserLedger) -> ReferralStats {
    ReferralStats {
        count: ledger.referral_count,
        earnings: ledger.referral_earnings,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::arithmetic_side_effects)]

    use super::*;
    use chrono::Utc;

    #[test]
    fn two_invitees_credit_twice() {
        let mut referrer = UserLedger::new(UserId::new(10), None, None, Utc::now());

        let first = credit_referrer(&mut referrer, UserId::new(11));
        let second = credit_referrer(&mut referrer, UserId::new(12));

        assert_eq!(first, REFERRAL_BONUS);
        assert_eq!(second, REFERRAL_BONUS);
        assert_eq!(
            stats(&referrer),
            ReferralStats {
                count: 2,
                earnings: 2 * REFERRAL_BONUS,
            },
        );
        assert_eq!(referrer.coins, 2 * REFERRAL_BONUS);
    }
}
