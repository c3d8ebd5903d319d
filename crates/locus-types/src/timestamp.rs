//! ISO-8601 timestamps that compare as instants.
//!
//! Producers send timestamps as strings in whatever offset and precision
//! their clock library emits. Two such strings are not lexically comparable
//! (`2024-01-01T10:00:00+02:00` precedes `2024-01-01T09:00:00Z`), so a
//! [`Timestamp`] parses once on ingest and orders by the parsed instant,
//! while keeping the producer's original text for re-emission on the wire.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TimestampError;

/// An instant in time together with the text it was parsed from.
///
/// Equality, ordering, and hashing use only the instant, so
/// `2024-05-01T12:00:00Z` and `2024-05-01T14:00:00+02:00` are equal.
#[derive(Debug, Clone)]
pub struct Timestamp {
    raw: String,
    instant: DateTime<Utc>,
}

impl Timestamp {
    /// Parse an ISO-8601 timestamp.
    ///
    /// Accepted forms, tried in order:
    /// - RFC 3339 with any offset and fractional precision
    /// - `YYYY-MM-DDTHH:MM:SS[.fff]` without offset, read as UTC
    /// - `YYYY-MM-DD`, read as UTC midnight
    pub fn parse(input: &str) -> Result<Self, TimestampError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TimestampError::Empty);
        }

        let instant = DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
            .or_else(|| {
                NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            })
            .ok_or_else(|| TimestampError::Unparsable {
                input: trimmed.to_owned(),
            })?;

        Ok(Self {
            raw: trimmed.to_owned(),
            instant,
        })
    }

    /// Build a timestamp from an instant, rendered as RFC 3339 with
    /// millisecond precision and a `Z` suffix.
    pub fn from_datetime(instant: DateTime<Utc>) -> Self {
        Self {
            raw: instant.to_rfc3339_opts(SecondsFormat::Millis, true),
            instant,
        }
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// The parsed instant.
    pub const fn instant(&self) -> DateTime<Utc> {
        self.instant
    }

    /// The original text this timestamp was parsed from.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this instant is strictly later than `other`.
    pub fn is_after(&self, other: &Self) -> bool {
        self.instant > other.instant
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.instant.cmp(&other.instant)
    }
}

impl Hash for Timestamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.instant.hash(state);
    }
}

impl core::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::from_datetime(instant)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
