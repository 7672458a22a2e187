//! Calendar-date helpers
//!
//! Hike dates carry no time of day. Every instant derived from one is
//! anchored at UTC midnight so local timezones never shift a hike across a
//! day boundary.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime};

pub const MS_PER_DAY: i64 = 86_400_000;

/// Milliseconds since the epoch at UTC midnight of `date`
pub fn utc_midnight_ms(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Floor an instant to UTC midnight of its day. Idempotent.
pub fn normalize_ms(ms: i64) -> i64 {
    ms.div_euclid(MS_PER_DAY) * MS_PER_DAY
}

/// Calendar date (UTC) containing the instant `ms`
pub fn date_from_ms(ms: i64) -> NaiveDate {
    DateTime::from_timestamp_millis(normalize_ms(ms))
        .map(|dt| dt.date_naive())
        .unwrap_or(NaiveDate::MIN)
}

/// Parse a dataset date. Accepts `YYYY-MM-DD`, and also full timestamps,
/// of which only the date part is kept.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// "Jan 1, 2023"
pub fn format_short(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// "January 1, 2023"
pub fn format_long(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Four-way season bucket used for the timeline backdrop
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub const ALL: &'static [Season] = &[
        Season::Winter,
        Season::Spring,
        Season::Summer,
        Season::Autumn,
    ];

    pub fn of(date: NaiveDate) -> Self {
        match date.month() {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Season::Winter => "season-winter",
            Season::Spring => "season-spring",
            Season::Summer => "season-summer",
            Season::Autumn => "season-autumn",
        }
    }
}
