//! Chunking units for period aggregation and the conversions accepted as period bounds.

use chrono::{
    DateTime, FixedOffset, Months, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Size of the sub-intervals a long period is split into before fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChunkInterval {
    /// Seven-day chunks.
    #[default]
    Weekly,
    /// Calendar-month chunks (same day of the following month, clamped to month end).
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unrecognized chunk interval '{0}', use 'W' for weekly or 'M' for monthly")]
pub struct InvalidInterval(pub String);

impl ChunkInterval {
    pub(crate) fn code(&self) -> &'static str {
        match self {
            ChunkInterval::Weekly => "W",
            ChunkInterval::Monthly => "M",
        }
    }

    /// The instant one chunk after `from`, or `None` on calendar overflow.
    pub fn advance(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            ChunkInterval::Weekly => from.checked_add_signed(TimeDelta::weeks(1)),
            ChunkInterval::Monthly => from.checked_add_months(Months::new(1)),
        }
    }
}

impl FromStr for ChunkInterval {
    type Err = InvalidInterval;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "w" | "week" | "weekly" => Ok(ChunkInterval::Weekly),
            "m" | "month" | "monthly" => Ok(ChunkInterval::Monthly),
            _ => Err(InvalidInterval(s.to_string())),
        }
    }
}

impl TryFrom<String> for ChunkInterval {
    type Error = InvalidInterval;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChunkInterval> for String {
    fn from(value: ChunkInterval) -> Self {
        value.code().to_string()
    }
}

/// Formats as the single-letter code accepted by [`FromStr`].
impl fmt::Display for ChunkInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Values usable as the start or end of an aggregation period.
///
/// Dates resolve to midnight UTC; naive datetimes are read as UTC.
pub trait PeriodBound {
    fn to_utc_bound(&self) -> Option<DateTime<Utc>>;
}

impl PeriodBound for DateTime<Utc> {
    fn to_utc_bound(&self) -> Option<DateTime<Utc>> {
        Some(*self)
    }
}

impl PeriodBound for DateTime<FixedOffset> {
    fn to_utc_bound(&self) -> Option<DateTime<Utc>> {
        Some(self.with_timezone(&Utc))
    }
}

impl PeriodBound for NaiveDateTime {
    fn to_utc_bound(&self) -> Option<DateTime<Utc>> {
        Some(Utc.from_utc_datetime(self))
    }
}

impl PeriodBound for NaiveDate {
    fn to_utc_bound(&self) -> Option<DateTime<Utc>> {
        self.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt))
    }
}

/// `YYYY-MM-DD` or an RFC 3339 instant.
impl PeriodBound for &str {
    fn to_utc_bound(&self) -> Option<DateTime<Utc>> {
        if let Ok(date) = NaiveDate::parse_from_str(self, "%Y-%m-%d") {
            return date.to_utc_bound();
        }
        DateTime::parse_from_rfc3339(self)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}
