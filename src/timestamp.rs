//! ISO-8601 timestamps with millisecond precision (`2024-01-20T14:30:00.000Z`).

use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime, UtcOffset};

/// Current UTC time, formatted.
pub fn now() -> String {
    format(OffsetDateTime::now_utc())
}

pub fn format(at: OffsetDateTime) -> String {
    let at = truncate_to_millis(at.to_offset(UtcOffset::UTC));
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        at.year(),
        u8::from(at.month()),
        at.day(),
        at.hour(),
        at.minute(),
        at.second(),
        at.millisecond()
    )
}

pub fn parse(text: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(text, &Rfc3339).ok()
}

/// A timestamp strictly later than `previous`.
///
/// Normally the current time; when the clock has not moved past `previous`
/// at millisecond resolution, `previous` plus one millisecond.
pub fn refreshed_after(previous: Option<&str>) -> String {
    let now = truncate_to_millis(OffsetDateTime::now_utc());
    match previous.and_then(parse) {
        Some(prev) if now <= truncate_to_millis(prev) => {
            format(truncate_to_millis(prev) + Duration::milliseconds(1))
        }
        _ => format(now),
    }
}

fn truncate_to_millis(at: OffsetDateTime) -> OffsetDateTime {
    at - Duration::nanoseconds(i64::from(at.nanosecond() % 1_000_000))
}
