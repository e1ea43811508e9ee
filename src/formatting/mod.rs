//! Formatting utilities for ticket display
//!
//! Wait times follow the familiar "distance to now" wording: coarse buckets
//! ("3 minutes", "about 1 hour", "2 days") rather than exact durations.

use jiff::Timestamp;

const MINUTES_IN_HOUR: f64 = 60.0;
const MINUTES_IN_DAY: f64 = 1440.0;
const MINUTES_IN_ALMOST_TWO_DAYS: f64 = 2520.0;
/// 30 days
const MINUTES_IN_MONTH: f64 = 43200.0;
const MINUTES_IN_TWO_MONTHS: f64 = 86400.0;

/// Round half away from zero on non-negative input.
fn round(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn plural(count: i64, one: &str, many: &str) -> String {
    if count == 1 {
        one.to_string()
    } else {
        many.replace("{}", &count.to_string())
    }
}

/// Format the time elapsed between `since` and `now` as a human-readable label.
///
/// The distance is absolute, so a server-estimated timestamp slightly ahead
/// of the local clock still reads as "less than a minute".
///
/// Months are flat 30-day periods and years are twelve of them, so labels
/// within a few days of a calendar month or year boundary can differ by one
/// from a calendar-aware count. Timestamps carry no time zone, which a
/// calendar count would need.
///
/// # Examples
///
/// ```
/// use helpqueue::formatting::format_wait_time;
/// use jiff::Timestamp;
///
/// let opened = Timestamp::from_second(1_700_000_000).unwrap();
/// let now = Timestamp::from_second(1_700_000_000 + 61 * 60).unwrap();
/// assert_eq!(format_wait_time(opened, now), "about 1 hour");
/// ```
pub fn format_wait_time(since: Timestamp, now: Timestamp) -> String {
    let seconds = (now.as_second() - since.as_second()).unsigned_abs() as f64;
    let minutes = round(seconds / 60.0);
    let exact_minutes = minutes as f64;

    if minutes < 2 {
        return if minutes == 0 {
            "less than a minute".to_string()
        } else {
            "1 minute".to_string()
        };
    }
    if minutes < 45 {
        return format!("{minutes} minutes");
    }
    if minutes < 90 {
        return "about 1 hour".to_string();
    }
    if exact_minutes < MINUTES_IN_DAY {
        let hours = round(exact_minutes / MINUTES_IN_HOUR);
        return plural(hours, "about 1 hour", "about {} hours");
    }
    if exact_minutes < MINUTES_IN_ALMOST_TWO_DAYS {
        return "1 day".to_string();
    }
    if exact_minutes < MINUTES_IN_MONTH {
        let days = round(exact_minutes / MINUTES_IN_DAY);
        return plural(days, "1 day", "{} days");
    }
    if exact_minutes < MINUTES_IN_TWO_MONTHS {
        let months = round(exact_minutes / MINUTES_IN_MONTH);
        return plural(months, "about 1 month", "about {} months");
    }

    let months = (exact_minutes / MINUTES_IN_MONTH).floor() as i64;
    if months < 12 {
        let nearest = round(exact_minutes / MINUTES_IN_MONTH);
        return plural(nearest, "1 month", "{} months");
    }

    let months_into_year = months % 12;
    let years = months / 12;
    if months_into_year < 3 {
        plural(years, "about 1 year", "about {} years")
    } else if months_into_year < 9 {
        plural(years, "over 1 year", "over {} years")
    } else {
        plural(years + 1, "almost 1 year", "almost {} years")
    }
}
