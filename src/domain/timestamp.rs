use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, SecondsFormat,
    TimeZone, Timelike, Utc,
};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Offset-aware layouts tried after RFC 3339
const ZONED_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Offset-less layouts, read as UTC
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

// ============================================================================
// Timestamp
// ============================================================================

/// A parsed observation instant.
///
/// Equality, ordering and hashing only look at the instant, so
/// `2024-01-01T02:00:00+02:00` and `2024-01-01T00:00:00Z` are the same key.
/// The `zoned` flag remembers whether the input carried an offset, which
/// decides how the value is rendered back (offset-less inputs stay
/// offset-less on output).
#[derive(Debug, Clone, Copy)]
pub struct Timestamp {
    instant: DateTime<FixedOffset>,
    zoned: bool,
}

impl Timestamp {
    /// Parse an ISO-8601 string. Returns `None` for anything unrecognised.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();

        if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self::zoned(instant));
        }
        for fmt in ZONED_FORMATS {
            if let Ok(instant) = DateTime::parse_from_str(raw, fmt) {
                return Some(Self::zoned(instant));
            }
        }
        for fmt in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                return Some(Self::naive(naive));
            }
        }

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(Self::naive)
    }

    pub fn zoned(instant: DateTime<FixedOffset>) -> Self {
        Self {
            instant,
            zoned: true,
        }
    }

    pub fn naive(naive: NaiveDateTime) -> Self {
        Self {
            instant: Utc.fix().from_utc_datetime(&naive),
            zoned: false,
        }
    }

    pub fn instant(&self) -> DateTime<FixedOffset> {
        self.instant
    }

    pub fn is_zoned(&self) -> bool {
        self.zoned
    }

    /// Hour of day (0-23) on the timestamp's own wall clock
    pub fn hour(&self) -> u32 {
        self.instant.hour()
    }

    /// Day of week (0=Monday, 6=Sunday)
    pub fn day_of_week(&self) -> u32 {
        self.instant.weekday().num_days_from_monday()
    }

    /// Shift by whole hours, keeping offset and rendering style.
    pub fn checked_add_hours(&self, hours: i64) -> Option<Self> {
        let delta = Duration::try_hours(hours)?;
        self.instant
            .checked_add_signed(delta)
            .map(|instant| Self {
                instant,
                zoned: self.zoned,
            })
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.instant == other.instant
    }
}

impl Eq for Timestamp {}

impl Hash for Timestamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.instant.hash(state);
    }
}

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

impl fmt::Display for Timestamp {
    /// Whole seconds render without a fraction, anything finer as microseconds
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fractional = (self.instant.nanosecond() % 1_000_000_000) / 1_000 != 0;
        if self.zoned {
            let precision = if fractional {
                SecondsFormat::Micros
            } else {
                SecondsFormat::Secs
            };
            write!(f, "{}", self.instant.to_rfc3339_opts(precision, false))
        } else {
            let layout = if fractional {
                "%Y-%m-%dT%H:%M:%S%.6f"
            } else {
                "%Y-%m-%dT%H:%M:%S"
            };
            write!(f, "{}", self.instant.naive_local().format(layout))
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
