use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;

/// Formats `date` in the given time zone using a `strftime`-style format.
pub fn format_date(date: &DateTime<FixedOffset>, format: &str, timezone: Tz) -> String {
    date.with_timezone(&timezone).format(format).to_string()
}
