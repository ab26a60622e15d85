//! Duration calculation and formatting.
//!
//! This module converts a pair of instants into decimal hours and renders
//! decimal hours as `"{h}h {m}m"` strings. All arithmetic is done in
//! [`Decimal`], so no floating-point residue reaches the results.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Milliseconds in one hour.
pub const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Decimal places kept on computed hours.
pub const HOURS_SCALE: u32 = 2;

/// Calculates the hours between two instants.
///
/// The difference is taken in whole milliseconds, divided by 3,600,000 and
/// rounded to two decimal places with half-away-from-zero rounding
/// ([`RoundingStrategy::MidpointAwayFromZero`]). The result always carries
/// a scale of two, so `8` hours is `8.00`.
///
/// # Arguments
///
/// * `start` - The first instant
/// * `end` - The second instant
///
/// # Returns
///
/// The signed number of hours. If `end` is before `start` the result is
/// negative; ordering is not validated here.
///
/// # Example
///
/// ```
/// use shift_engine::calculation::calculate_duration;
/// use chrono::{TimeZone, Utc};
/// use rust_decimal::Decimal;
///
/// let start = Utc.with_ymd_and_hms(2026, 1, 20, 22, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2026, 1, 21, 6, 0, 0).unwrap();
/// assert_eq!(calculate_duration(start, end), Decimal::new(800, 2));
/// assert_eq!(calculate_duration(end, start), Decimal::new(-800, 2));
/// ```
pub fn calculate_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
    let millis = (end - start).num_milliseconds();
    let mut hours = (Decimal::from(millis) / Decimal::from(MILLIS_PER_HOUR))
        .round_dp_with_strategy(HOURS_SCALE, RoundingStrategy::MidpointAwayFromZero);
    hours.rescale(HOURS_SCALE);
    hours
}

/// Splits decimal hours into whole hours and minutes.
///
/// Minutes are rounded half-away-from-zero; a rounding result of 60 carries
/// into the hours. The split is applied to the absolute value, and the
/// returned flag is true when the input was negative and the split is not
/// zero. Hours beyond `i64::MAX` saturate.
fn split_hours(hours: Decimal) -> (bool, i64, i64) {
    let magnitude = hours.abs();
    let whole = magnitude.floor();
    let minutes = ((magnitude - whole) * Decimal::from(60))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    let mut h = whole.to_i64().unwrap_or(i64::MAX);
    let mut m = minutes.to_i64().unwrap_or_default();
    if m >= 60 {
        h = h.saturating_add(1);
        m = 0;
    }

    let negative = hours.is_sign_negative() && (h != 0 || m != 0);
    (negative, h, m)
}

/// Formats decimal hours as `"{h}h {m}m"`.
///
/// # Example
///
/// ```
/// use shift_engine::calculation::format_duration;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_duration(Decimal::new(8, 0)), "8h 0m");
/// assert_eq!(format_duration(Decimal::new(85, 1)), "8h 30m");
/// assert_eq!(format_duration(Decimal::new(125, 2)), "1h 15m");
/// // Minutes never show as 60
/// assert_eq!(format_duration(Decimal::new(999, 3)), "1h 0m");
/// // Negative durations keep their sign in front
/// assert_eq!(format_duration(Decimal::new(-25, 2)), "-0h 15m");
/// ```
pub fn format_duration(hours: Decimal) -> String {
    let (negative, h, m) = split_hours(hours);
    let sign = if negative { "-" } else { "" };
    format!("{sign}{h}h {m}m")
}

/// Total minutes represented by [`format_duration`] for the same input.
pub fn duration_minutes(hours: Decimal) -> i64 {
    let (negative, h, m) = split_hours(hours);
    let total = h.saturating_mul(60).saturating_add(m);
    if negative { -total } else { total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_standard_eight_hour_shift() {
        let hours = calculate_duration(utc("2026-01-20T09:00:00Z"), utc("2026-01-20T17:00:00Z"));
        assert_eq!(hours, dec("8.00"));
        assert_eq!(hours.to_string(), "8.00");
    }

    #[test]
    fn test_overnight_shift() {
        let hours = calculate_duration(utc("2026-01-20T22:00:00Z"), utc("2026-01-21T06:00:00Z"));
        assert_eq!(hours, dec("8.00"));
    }

    #[test]
    fn test_fifteen_minutes() {
        let hours = calculate_duration(utc("2026-01-20T12:00:00Z"), utc("2026-01-20T12:15:00Z"));
        assert_eq!(hours, dec("0.25"));
    }

    #[test]
    fn test_forty_five_minutes() {
        let hours = calculate_duration(utc("2026-01-20T12:00:00Z"), utc("2026-01-20T12:45:00Z"));
        assert_eq!(hours, dec("0.75"));
    }

    #[test]
    fn test_reversed_pair_is_negative() {
        let hours = calculate_duration(utc("2026-01-20T10:00:00Z"), utc("2026-01-20T09:00:00Z"));
        assert_eq!(hours, dec("-1.00"));
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        // 18 seconds = 0.005 hours exactly
        let start = Utc.with_ymd_and_hms(2026, 1, 20, 9, 0, 0).unwrap();
        let forward = calculate_duration(start, start + chrono::Duration::seconds(18));
        let backward = calculate_duration(start + chrono::Duration::seconds(18), start);

        assert_eq!(forward, dec("0.01"));
        assert_eq!(backward, dec("-0.01"));
    }

    #[test]
    fn test_twenty_minutes_rounds_to_two_places() {
        let hours = calculate_duration(utc("2026-01-20T09:00:00Z"), utc("2026-01-20T09:20:00Z"));
        assert_eq!(hours, dec("0.33"));
    }

    #[test]
    fn test_zero_duration() {
        let t = utc("2026-01-20T09:00:00Z");
        assert_eq!(calculate_duration(t, t), Decimal::ZERO);
    }

    #[test]
    fn test_format_whole_hours() {
        assert_eq!(format_duration(dec("8")), "8h 0m");
    }

    #[test]
    fn test_format_half_hour() {
        assert_eq!(format_duration(dec("8.5")), "8h 30m");
    }

    #[test]
    fn test_format_quarter_hour() {
        assert_eq!(format_duration(dec("1.25")), "1h 15m");
    }

    #[test]
    fn test_format_carries_sixty_minutes_into_hours() {
        assert_eq!(format_duration(dec("1.995")), "2h 0m");
        assert_eq!(format_duration(dec("0.9999")), "1h 0m");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(format_duration(dec("-1.00")), "-1h 0m");
        assert_eq!(format_duration(dec("-0.001")), "0h 0m");
    }

    #[test]
    fn test_duration_minutes_matches_format() {
        assert_eq!(duration_minutes(dec("8.5")), 510);
        assert_eq!(duration_minutes(dec("0.33")), 20);
        assert_eq!(duration_minutes(dec("1.995")), 120);
        assert_eq!(duration_minutes(dec("-1.25")), -75);
    }

    #[test]
    fn test_format_saturates_huge_hours() {
        let huge = Decimal::MAX;
        assert_eq!(format_duration(huge), format!("{}h 0m", i64::MAX));
        assert_eq!(format_duration(-huge), format!("-{}h 0m", i64::MAX));
        assert_eq!(duration_minutes(huge), i64::MAX);
    }
}
