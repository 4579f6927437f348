use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Named time window used to select records by creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Period {
    #[default]
    All,
    Today,
    Week,
    Month,
    Quarter,
    Year,
    Custom,
    /// Any other label. Keeps the caller's text so strict mode can report it.
    Unrecognized(String),
}

impl Period {
    /// Days looked back from "now" for the relative windows.
    pub fn lookback_days(&self) -> Option<i64> {
        match self {
            Period::Today => Some(1),
            Period::Week => Some(7),
            Period::Month => Some(30),
            Period::Quarter => Some(90),
            Period::Year => Some(365),
            _ => None,
        }
    }

    /// Instant a record must be strictly after to fall inside a relative window.
    /// Saturates at the earliest representable instant.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.lookback_days().map(|days| {
            now.checked_sub_signed(Duration::days(days))
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        })
    }
}

impl From<&str> for Period {
    fn from(value: &str) -> Self {
        match value {
            "all" => Period::All,
            "today" => Period::Today,
            "week" => Period::Week,
            "month" => Period::Month,
            "quarter" => Period::Quarter,
            "year" => Period::Year,
            "custom" => Period::Custom,
            _ => Period::Unrecognized(value.to_string()),
        }
    }
}

impl FromStr for Period {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Period::from(value))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Period::All => "all",
            Period::Today => "today",
            Period::Week => "week",
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
            Period::Custom => "custom",
            Period::Unrecognized(raw) => raw.as_str(),
        };
        f.write_str(label)
    }
}

/// Source of "now" for relative periods. Read once per filter call.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses an ISO-8601 timestamp. Values without an offset are read as UTC,
/// a bare date as midnight UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(raw, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(start_of_day)
}

pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Last millisecond of the day. Saturates at the latest representable instant.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date)
        .checked_add_signed(Duration::days(1))
        .and_then(|next| next.checked_sub_signed(Duration::milliseconds(1)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
