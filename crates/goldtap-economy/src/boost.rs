//! The single time-boxed buff slot ("mega boost") with lazy expiry.
//!
//! The slot moves between two states:
//!
//! ```text
//! Idle (no entry) --activate--> Active (expires_at in the future)
//! Active --sweep on any read--> Idle (entry removed)
//! ```
//!
//! There is no background timer. Every read of boost status, and the
//! tap engine's own check, calls [`sweep`] first: if `expires_at` has
//! passed the entry is removed (a write-back) before anything else is
//! evaluated. Activation from Active fails without touching the timer.

use chrono::{DateTime, Duration, Utc};
use goldtap_types::{ActiveBoost, UserLedger};
use serde::{Deserialize, Serialize};

use crate::EconomyError;

/// Lifetime of one mega-boost activation.
pub const MEGA_BOOST_DURATION_SECS: i64 = 120;

/// Snapshot of the boost slot, taken after a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostStatus {
    /// Whether a boost is live right now.
    pub active: bool,
    /// Expiry instant of the live boost, if any.
    pub expires_at: Option<DateTime<Utc>>,
    /// Whole seconds remaining on the live boost, if any.
    pub remaining_seconds: Option<i64>,
}

/// Remove the boost entry if it has expired. Returns whether a boost
/// is live after the sweep.
///
/// This lazy sweep is the only expiry mechanism; callers that observe
/// a change must persist the row.
pub fn sweep(ledger: &mut UserLedger, now: DateTime<Utc>) -> bool {
    match ledger.active_boost {
        Some(boost) if boost.is_live(now) => true,
        Some(_) => {
            ledger.active_boost = None;
            false
        }
        None => false,
    }
}

/// Activate the mega boost.
///
/// Legal only from Idle (after the sweep). From Active the call fails
/// with [`EconomyError::BoostAlreadyActive`] carrying the remaining
/// seconds; the live timer is neither extended nor restarted.
pub fn activate(ledger: &mut UserLedger, now: DateTime<Utc>) -> Result<ActiveBoost, EconomyError> {
    if sweep(ledger, now)
        && let Some(live) = ledger.active_boost
    {
        return Err(EconomyError::BoostAlreadyActive {
            remaining_seconds: live.remaining_seconds(now),
        });
    }

    let boost = ActiveBoost {
        expires_at: now
            .checked_add_signed(Duration::seconds(MEGA_BOOST_DURATION_SECS))
            .unwrap_or(DateTime::<Utc>::MAX_UTC),
    };
    ledger.active_boost = Some(boost);
    Ok(boost)
}

/// Report the slot's state at `now`, sweeping an expired entry first.
pub fn status(ledger: &mut UserLedger, now: DateTime<Utc>) -> BoostStatus {
    if sweep(ledger, now)
        && let Some(live) = ledger.active_boost
    {
        return BoostStatus {
            active: true,
            expires_at: Some(live.expires_at),
            remaining_seconds: Some(live.remaining_seconds(now)),
        };
    }
    BoostStatus {
        active: false,
        expires_at: None,
        remaining_seconds: None,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::arithmetic_side_effects)]

    use super::*;
    use goldtap_types::UserId;

    fn fresh(now: DateTime<Utc>) -> UserLedger {
        UserLedger::new(UserId::new(1), None, None, now)
    }

    #[test]
    fn activate_from_idle_sets_expiry() {
        let now = Utc::now();
        let mut ledger = fresh(now);

        let boost = activate(&mut ledger, now);
        assert_eq!(
            boost.ok().map(|b| b.expires_at),
            now.checked_add_signed(Duration::seconds(MEGA_BOOST_DURATION_SECS)),
        );
        assert!(ledger.active_boost.is_some());
    }

    #[test]
    fn activate_while_active_reports_remaining_without_extending() {
        let now = Utc::now();
        let mut ledger = fresh(now);
        let _ = activate(&mut ledger, now);
        let original_expiry = ledger.active_boost.map(|b| b.expires_at);

        let later = now + Duration::seconds(30);
        let second = activate(&mut ledger, later);

        assert_eq!(
            second,
            Err(EconomyError::BoostAlreadyActive {
                remaining_seconds: 90,
            }),
        );
        // The timer is unchanged.
        assert_eq!(ledger.active_boost.map(|b| b.expires_at), original_expiry);
    }

    #[test]
    fn expired_boost_is_swept_on_read() {
        let now = Utc::now();
        let mut ledger = fresh(now);
        let _ = activate(&mut ledger, now);

        let after_expiry = now + Duration::seconds(MEGA_BOOST_DURATION_SECS + 1);
        let snapshot = status(&mut ledger, after_expiry);

        assert!(!snapshot.active);
        assert_eq!(snapshot.expires_at, None);
        // The sweep removed the entry (write-back).
        assert!(ledger.active_boost.is_none());
    }

    #[test]
    fn reactivation_succeeds_after_expiry() {
        let now = Utc::now();
        let mut ledger = fresh(now);
        let _ = activate(&mut ledger, now);

        let after_expiry = now + Duration::seconds(MEGA_BOOST_DURATION_SECS + 5);
        let second = activate(&mut ledger, after_expiry);
        assert!(second.is_ok());
        assert_eq!(
            ledger.active_boost.map(|b| b.expires_at),
            after_expiry.checked_add_signed(Duration::seconds(MEGA_BOOST_DURATION_SECS)),
        );
    }

    #[test]
    fn status_reports_live_boost() {
        let now = Utc::now();
        let mut ledger = fresh(now);
        let _ = activate(&mut ledger, now);

        let mid = now + Duration::seconds(45);
        let snapshot = status(&mut ledger, mid);
        assert!(snapshot.active);
        assert_eq!(snapshot.remaining_seconds, Some(75));
    }
}
