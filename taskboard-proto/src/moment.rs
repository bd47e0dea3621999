//! Timestamps as they appear on the wire.
//!
//! The API is loose about dates: `createdAt` is usually a full RFC 3339
//! instant, while `dueDate` is often a bare `YYYY-MM-DD`. A [`Moment`] keeps
//! whichever form arrived so that a bare date can be anchored to midnight in
//! the *viewer's* time zone rather than UTC.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, SecondsFormat, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::CodecError;

/// Format used for bare calendar dates.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A point in time, or a calendar date with no time-of-day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Moment {
    /// A fully specified instant.
    Instant(DateTime<FixedOffset>),
    /// A calendar date, meaning local midnight wherever it is viewed.
    Date(NaiveDate),
}

impl Moment {
    /// Builds an instant from milliseconds since the Unix epoch.
    #[must_use]
    pub fn from_millis(ms: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(ms).map(|dt| Self::Instant(dt.fixed_offset()))
    }

    /// Resolves this moment to an instant in `tz`.
    ///
    /// Bare dates resolve to the first instant of that date in `tz`.
    pub fn in_zone<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Tz> {
        match self {
            Self::Instant(dt) => dt.with_timezone(tz),
            Self::Date(date) => {
                let midnight = date.and_time(NaiveTime::MIN);
                tz.from_local_datetime(&midnight)
                    .earliest()
                    .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
            }
        }
    }

    /// The calendar date this moment falls on, as seen from `tz`.
    pub fn date_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        match self {
            Self::Instant(dt) => dt.with_timezone(tz).date_naive(),
            Self::Date(date) => *date,
        }
    }

    /// Milliseconds since the Unix epoch, resolving bare dates in `tz`.
    pub fn timestamp_millis_in<Tz: TimeZone>(&self, tz: &Tz) -> i64 {
        self.in_zone(tz).timestamp_millis()
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Moment {
    fn from(dt: DateTime<Tz>) -> Self {
        Self::Instant(dt.fixed_offset())
    }
}

impl From<NaiveDate> for Moment {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl FromStr for Moment {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::Instant(dt));
        }
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Self::Date)
            .map_err(|_| CodecError::InvalidTimestamp(s.to_string()))
    }
}

impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instant(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
        }
    }
}

impl Serialize for Moment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Moment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Whatever a timestamp field happened to contain.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawMoment {
    Text(String),
    Millis(i64),
    Other(serde::de::IgnoredAny),
}

/// Lenient deserializer for optional timestamp fields.
///
/// Accepts RFC 3339 strings, bare dates and epoch milliseconds. Anything
/// else (including `null`, empty strings and unparseable text) becomes
/// `None` instead of rejecting the whole record.
///
/// # Errors
///
/// Only fails if the underlying deserializer itself fails.
pub fn lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Moment>, D::Error> {
    let raw = Option::<RawMoment>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawMoment::Text(s)) => s.parse().ok(),
        Some(RawMoment::Millis(ms)) => Moment::from_millis(ms),
        Some(RawMoment::Other(_)) | None => None,
    })
}
