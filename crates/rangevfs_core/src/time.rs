//! Conversion between Unix time and the engine's Julian-day clock.

/// Milliseconds from Julian day 0 (noon, 4714-11-24 BC) to the Unix epoch.
///
/// The Unix epoch is Julian day 2440587.5; `24405875 * 8640000` is that
/// day count expressed in milliseconds.
pub const UNIX_EPOCH_JULIAN_MILLIS: i64 = 24_405_875 * 8_640_000;

/// Milliseconds in one day.
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Converts Unix epoch milliseconds to Julian-day milliseconds.
#[must_use]
pub const fn julian_millis(epoch_millis: i64) -> i64 {
    epoch_millis.saturating_add(UNIX_EPOCH_JULIAN_MILLIS)
}

/// Converts Julian-day milliseconds to fractional Julian days.
#[must_use]
pub fn julian_days(julian_millis: i64) -> f64 {
    julian_millis as f64 / MILLIS_PER_DAY as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_constant() {
        assert_eq!(UNIX_EPOCH_JULIAN_MILLIS, 210_866_760_000_000);
    }

    #[test]
    fn unix_epoch_is_julian_day_2440587_5() {
        assert_eq!(julian_days(julian_millis(0)), 2_440_587.5);
    }

    #[test]
    fn adds_offset_to_epoch_millis() {
        let t = 1_700_000_000_123;
        assert_eq!(julian_millis(t), t + UNIX_EPOCH_JULIAN_MILLIS);
    }

    #[test]
    fn one_day_later() {
        let days = julian_days(julian_millis(MILLIS_PER_DAY));
        assert_eq!(days, 2_440_588.5);
    }
}
