//! CF-convention time decoding.
//!
//! Time coordinates are stored as offsets from an epoch, described by a
//! units attribute such as `"hours since 2024-01-15 12:00:00"`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Calendars whose dates match the proleptic Gregorian calendar chrono uses.
const GREGORIAN_CALENDARS: [&str; 3] = ["standard", "gregorian", "proleptic_gregorian"];

/// Unit of a CF time offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Some(TimeUnit::Seconds),
            "min" | "mins" | "minute" | "minutes" => Some(TimeUnit::Minutes),
            "h" | "hr" | "hrs" | "hour" | "hours" => Some(TimeUnit::Hours),
            "d" | "day" | "days" => Some(TimeUnit::Days),
            _ => None,
        }
    }

    pub fn seconds(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3600.0,
            TimeUnit::Days => 86400.0,
        }
    }
}

/// Parsed `"<unit> since <epoch>"` units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfTimeUnits {
    pub unit: TimeUnit,
    pub epoch: DateTime<Utc>,
}

impl CfTimeUnits {
    /// Parse a units attribute. Returns `None` for anything that is not a
    /// recognised time unit.
    pub fn parse(units: &str) -> Option<Self> {
        let (unit, epoch) = units.trim().split_once(" since ")?;
        Some(Self {
            unit: TimeUnit::parse(unit.trim())?,
            epoch: parse_epoch(epoch.trim())?,
        })
    }

    /// The instant `value` units after the epoch, to millisecond precision.
    pub fn to_datetime(&self, value: f64) -> Option<DateTime<Utc>> {
        let millis = value * self.unit.seconds() * 1000.0;
        if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
            return None;
        }
        self.epoch
            .checked_add_signed(Duration::try_milliseconds(millis.round() as i64)?)
    }

    /// RFC 3339 text for an offset, e.g. `2024-01-15T12:00:00Z`.
    pub fn format(&self, value: f64) -> Option<String> {
        self.to_datetime(value)
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

/// Whether a calendar attribute names a calendar chrono can represent.
pub fn is_gregorian(calendar: Option<&str>) -> bool {
    calendar.map_or(true, |c| {
        GREGORIAN_CALENDARS.contains(&c.trim().to_ascii_lowercase().as_str())
    })
}

/// Decode time offsets into RFC 3339 strings.
///
/// Returns `None` if the units or calendar cannot be decoded or any value
/// falls outside the representable range.
pub fn decode(values: &[f64], units: &str, calendar: Option<&str>) -> Option<Vec<String>> {
    if !is_gregorian(calendar) {
        return None;
    }
    let units = CfTimeUnits::parse(units)?;
    values.iter().map(|v| units.format(*v)).collect()
}

fn parse_epoch(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Some(t.with_timezone(&Utc));
    }

    let text = text
        .trim_end_matches(" UTC")
        .trim_end_matches('Z')
        .trim();

    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    for format in FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
