//! Static tier tables: level to price and level to effect, per track.
//!
//! Tables are zero-indexed: purchasing level `k` costs `prices[k - 1]`,
//! so a player at level 0 pays the first entry. Prices within a table
//! are strictly increasing (verified by tests). Effect values past the
//! end of their table are extrapolated: hourly profit doubles per extra
//! level, the energy cap grows by x1.5 per extra level.

use goldtap_types::UpgradeTrack;

/// Coins paid per tap before any multiplier, at multitap level 0.
pub const MULTITAP_BASE: i64 = 1;

/// Energy debited per tap, independent of the coin multiplier.
pub const TAP_ENERGY_COST: i64 = 1;

/// Energy granted by one recover-energy call.
pub const ENERGY_RECOVERY_STEP: i64 = 10;

/// Multitap track prices.
pub const MULTITAP_PRICES: [i64; 5] = [500, 2_000, 5_000, 20_000, 50_000];

/// Profit track prices.
pub const PROFIT_PRICES: [i64; 5] = [1_000, 5_000, 15_000, 50_000, 200_000];

/// Energy track prices.
pub const ENERGY_PRICES: [i64; 5] = [1_000, 3_000, 10_000, 30_000, 100_000];

/// Luck track prices.
///
/// Ten entries so every critical-tap bucket, including 7-9 and 10+,
/// is purchasable.
pub const LUCK_PRICES: [i64; 10] = [
    500,
    2_000,
    8_000,
    30_000,
    100_000,
    250_000,
    600_000,
    1_500_000,
    4_000_000,
    10_000_000,
];

/// Passive hourly income rate by profit level.
pub const HOURLY_RATES: [i64; 5] = [100, 300, 800, 2_000, 5_000];

/// Energy capacity by energy level.
pub const MAX_ENERGY_TIERS: [i64; 5] = [1_000, 1_500, 2_200, 3_200, 4_500];

/// The price table for a track.
pub const fn prices(track: UpgradeTrack) -> &'static [i64] {
    match track {
        UpgradeTrack::Multitap => &MULTITAP_PRICES,
        UpgradeTrack::Profit => &PROFIT_PRICES,
        UpgradeTrack::Energy => &ENERGY_PRICES,
        UpgradeTrack::Luck => &LUCK_PRICES,
    }
}

/// Highest purchasable level for a track (the price table length).
pub fn max_level(track: UpgradeTrack) -> u32 {
    u32::try_from(prices(track).len()).unwrap_or(u32::MAX)
}

/// Price of the next level for a track, or `None` at the cap.
///
/// `current_level` is the level held before the purchase; the Nth
/// purchase costs the Nth table entry.
pub fn next_price(track: UpgradeTrack, current_level: u32) -> Option<i64> {
    let idx = usize::try_from(current_level).unwrap_or(usize::MAX);
    prices(track).get(idx).copied()
}

/// Coins paid per tap at the given multitap level.
///
/// Each level adds a flat +1 on top of [`MULTITAP_BASE`].
pub fn coins_per_tap(multitap_level: u32) -> i64 {
    MULTITAP_BASE.saturating_add(i64::from(multitap_level))
}

/// Passive hourly income rate at the given profit level.
///
/// Levels past the table end double the last entry per extra level.
pub fn hourly_rate(profit_level: u32) -> i64 {
    extrapolated(&HOURLY_RATES, profit_level, |v| v.saturating_mul(2))
}

/// Energy capacity at the given energy level.
///
/// Levels past the table end grow the last entry by x1.5 per extra
/// level.
pub fn max_energy(energy_level: u32) -> i64 {
    extrapolated(&MAX_ENERGY_TIERS, energy_level, |v| {
        v.saturating_mul(3).saturating_div(2)
    })
}

/// Look up `table[level]`, extrapolating past the end with `step`.
fn extrapolated(table: &[i64], level: u32, step: impl Fn(i64) -> i64) -> i64 {
    let idx = usize::try_from(level).unwrap_or(usize::MAX);
    if let Some(&value) = table.get(idx) {
        return value;
    }
    let mut value = table.last().copied().unwrap_or(0);
    let beyond = idx.saturating_sub(table.len().saturating_sub(1));
    for _ in 0..beyond {
        value = step(value);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_strictly_increase_within_each_track() {
        for track in UpgradeTrack::ALL {
            let table = prices(track);
            for pair in table.windows(2) {
                assert!(
                    pair.first() < pair.get(1),
                    "{track} prices must strictly increase"
                );
            }
        }
    }

    #[test]
    fn next_price_walks_the_table() {
        assert_eq!(next_price(UpgradeTrack::Multitap, 0), Some(500));
        assert_eq!(next_price(UpgradeTrack::Multitap, 4), Some(50_000));
        assert_eq!(next_price(UpgradeTrack::Multitap, 5), None);
        assert_eq!(next_price(UpgradeTrack::Luck, 9), Some(10_000_000));
        assert_eq!(next_price(UpgradeTrack::Luck, 10), None);
    }

    #[test]
    fn coins_per_tap_adds_flat_one_per_level() {
        assert_eq!(coins_per_tap(0), 1);
        assert_eq!(coins_per_tap(1), 2);
        assert_eq!(coins_per_tap(4), 5);
    }

    #[test]
    fn hourly_rate_doubles_past_table_end() {
        assert_eq!(hourly_rate(0), 100);
        assert_eq!(hourly_rate(4), 5_000);
        assert_eq!(hourly_rate(5), 10_000);
        assert_eq!(hourly_rate(6), 20_000);
    }

    #[test]
    fn max_energy_grows_by_half_past_table_end() {
        assert_eq!(max_energy(0), 1_000);
        assert_eq!(max_energy(4), 4_500);
        assert_eq!(max_energy(5), 6_750);
    }

    #[test]
    fn effect_values_never_decrease_with_level() {
        for level in 0..12_u32 {
            assert!(hourly_rate(level) <= hourly_rate(level.saturating_add(1)));
            assert!(max_energy(level) <= max_energy(level.saturating_add(1)));
        }
    }
}
