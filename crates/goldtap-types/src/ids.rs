//! Type-safe identifier wrapper for player identities.
//!
//! Players are keyed by the numeric identity assigned by the chat
//! platform that fronts the game. The raw value is an `i64`; wrapping
//! it prevents accidental mixing with coin amounts or other integers
//! at compile time.

use serde::{Deserialize, Serialize};

/// Unique identifier for a player, as assigned by the chat platform.
///
/// This is an external identity: the service never generates one, it
/// only receives them with requests. The wrapper is `Copy` and ordered
/// so it can key lock maps and `BTreeMap` collections directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// Wrap a raw platform identity.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Return the raw `i64` value.
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for UserId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_display_matches_raw() {
        let id = UserId::new(42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = UserId::new(123_456_789);
        let json = serde_json::to_string(&original).ok();
        // Transparent serde: the wrapper serializes as a bare integer.
        assert_eq!(json.as_deref(), Some("123456789"));
        let restored: Result<UserId, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn id_conversions() {
        let id: UserId = 7_i64.into();
        assert_eq!(id.into_inner(), 7);
        assert_eq!(i64::from(id), 7);
    }
}
