//! Enumeration types shared across the Goldtap workspace.

use serde::{Deserialize, Serialize};

/// An independently-leveled upgrade category.
///
/// Each track has its own price table and its own effect: `multitap`
/// raises coins-per-tap, `profit` raises the passive hourly rate,
/// `energy` raises the energy cap, `luck` widens the critical-tap
/// probability bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeTrack {
    /// Flat +1 coins per tap per level.
    Multitap,
    /// Passive hourly income rate.
    Profit,
    /// Maximum energy capacity.
    Energy,
    /// Critical-tap probability.
    Luck,
}

impl UpgradeTrack {
    /// All tracks, in canonical order.
    pub const ALL: [Self; 4] = [Self::Multitap, Self::Profit, Self::Energy, Self::Luck];

    /// The wire name of the track.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Multitap => "multitap",
            Self::Profit => "profit",
            Self::Energy => "energy",
            Self::Luck => "luck",
        }
    }
}

impl core::fmt::Display for UpgradeTrack {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a track name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown upgrade track: {0}")]
pub struct UnknownTrack(pub String);

impl core::str::FromStr for UpgradeTrack {
    type Err = UnknownTrack;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multitap" => Ok(Self::Multitap),
            "profit" => Ok(Self::Profit),
            "energy" => Ok(Self::Energy),
            "luck" => Ok(Self::Luck),
            other => Err(UnknownTrack(other.to_owned())),
        }
    }
}

/// Outcome of a registration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegisterStatus {
    /// The ledger row already existed; nothing was changed.
    Exists,
    /// A fresh ledger row was created.
    Created,
    /// A fresh ledger row was created and the referrer was credited.
    CreatedWithReferral,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_parse_roundtrip() {
        for track in UpgradeTrack::ALL {
            let parsed: Result<UpgradeTrack, _> = track.as_str().parse();
            assert_eq!(parsed.ok(), Some(track));
        }
    }

    #[test]
    fn unknown_track_is_rejected() {
        let parsed: Result<UpgradeTrack, _> = "boost".parse();
        assert_eq!(parsed, Err(UnknownTrack(String::from("boost"))));
    }

    #[test]
    fn track_serde_uses_snake_case() {
        let json = serde_json::to_string(&UpgradeTrack::Multitap).ok();
        assert_eq!(json.as_deref(), Some("\"multitap\""));
    }

    #[test]
    fn register_status_serde() {
        let json = serde_json::to_string(&RegisterStatus::CreatedWithReferral).ok();
        assert_eq!(json.as_deref(), Some("\"created_with_referral\""));
    }
}
