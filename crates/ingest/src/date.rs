use std::str::FromStr;

use chrono::{NaiveDateTime, TimeDelta, Weekday};

/// Twitter `created_at` layout, e.g. `Tue Jul 17 10:12:33 +0000 2018`.
pub const TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S +0000 %Y";

/// Layout of the timestamp once the weekday token is split off.
const DATE_FORMAT_NO_WEEKDAY: &str = "%b %d %H:%M:%S +0000 %Y";

/// Offset applied before taking the calendar day.
const DAY_SHIFT_HOURS: i64 = 5;

/// Computes the `YYYYMMDD` day of a tweet timestamp shifted back five hours.
///
/// The weekday name must be valid but is not checked against the date, so a
/// timestamp with an inconsistent weekday still parses. Returns `None` for
/// anything else that does not match [`TIMESTAMP_FORMAT`].
///
/// ```rust
/// use ingest::derive_date;
///
/// assert_eq!(derive_date("Tue Jul 17 10:12:33 +0000 2018").as_deref(), Some("20180717"));
/// assert_eq!(derive_date("Tue Jul 17 03:59:59 +0000 2018").as_deref(), Some("20180716"));
/// ```
pub fn derive_date(created_at: &str) -> Option<String> {
    let (weekday, rest) = created_at.split_once(' ')?;
    Weekday::from_str(weekday).ok()?;
    let parsed = NaiveDateTime::parse_from_str(rest, DATE_FORMAT_NO_WEEKDAY).ok()?;
    let shifted = parsed.checked_sub_signed(TimeDelta::hours(DAY_SHIFT_HOURS))?;
    Some(shifted.format("%Y%m%d").to_string())
}
