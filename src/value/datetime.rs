use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SqlConnectorError;

const ISO_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats tried, in order, when parsing text into a [`DateTime`].
const PARSE_FORMATS: &[&str] = &[
    ISO_FORMAT,
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Immutable calendar time with second precision.
///
/// A `DateTime` is either invalid (the default, holding nothing) or valid.
/// Copies are plain value copies; equality compares the calendar fields.
/// Times are treated as UTC when projected to epoch seconds.
///
/// ```rust
/// use sql_connector::DateTime;
///
/// let dt = DateTime::from_iso_string("2004-12-31 00:00:00")?;
/// assert_eq!(dt.year()?, 2004);
/// assert_eq!(dt.to_iso_string()?, "2004-12-31 00:00:00");
/// assert!(!DateTime::default().valid());
/// # Ok::<(), sql_connector::SqlConnectorError>(())
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateTime {
    tm: Option<NaiveDateTime>,
}

impl DateTime {
    /// Current wall-clock time (UTC), truncated to whole seconds.
    #[must_use]
    pub fn now() -> Self {
        Self::from_std_time(Utc::now().timestamp()).unwrap_or_default()
    }

    /// Build from seconds since the Unix epoch.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConversionError` if the timestamp is out of range.
    pub fn from_std_time(secs: i64) -> Result<Self, SqlConnectorError> {
        chrono::DateTime::from_timestamp(secs, 0)
            .map(|dt| Self {
                tm: Some(dt.naive_utc()),
            })
            .ok_or_else(|| {
                SqlConnectorError::ConversionError(format!("timestamp {secs} is out of range"))
            })
    }

    /// Parse `YYYY-MM-DD HH:MM:SS` (a `T` separator, fractional seconds and
    /// bare dates are accepted too).
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConversionError` if the text matches none of the
    /// accepted layouts.
    pub fn from_iso_string(text: &str) -> Result<Self, SqlConnectorError> {
        let text = text.trim();
        for format in PARSE_FORMATS {
            if let Ok(tm) = NaiveDateTime::parse_from_str(text, format) {
                return Ok(Self::from(tm.with_nanosecond(0).unwrap_or(tm)));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
            && let Some(tm) = date.and_hms_opt(0, 0, 0)
        {
            return Ok(Self::from(tm));
        }
        Err(SqlConnectorError::ConversionError(format!(
            "'{text}' is not a valid ISO-8601 date/time"
        )))
    }

    #[must_use]
    pub fn valid(&self) -> bool {
        self.tm.is_some()
    }

    /// Canonical `YYYY-MM-DD HH:MM:SS` rendering.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConversionError` on an invalid `DateTime`.
    pub fn to_iso_string(&self) -> Result<String, SqlConnectorError> {
        Ok(self.tm()?.format(ISO_FORMAT).to_string())
    }

    /// Seconds since the Unix epoch.
    ///
    /// # Errors
    /// Returns `SqlConnectorError::ConversionError` on an invalid `DateTime`.
    pub fn to_std_time(&self) -> Result<i64, SqlConnectorError> {
        Ok(self.tm()?.and_utc().timestamp())
    }

    pub fn year(&self) -> Result<i32, SqlConnectorError> {
        Ok(self.tm()?.year())
    }

    pub fn month(&self) -> Result<u32, SqlConnectorError> {
        Ok(self.tm()?.month())
    }

    pub fn day(&self) -> Result<u32, SqlConnectorError> {
        Ok(self.tm()?.day())
    }

    pub fn hours(&self) -> Result<u32, SqlConnectorError> {
        Ok(self.tm()?.hour())
    }

    pub fn minutes(&self) -> Result<u32, SqlConnectorError> {
        Ok(self.tm()?.minute())
    }

    pub fn seconds(&self) -> Result<u32, SqlConnectorError> {
        Ok(self.tm()?.second())
    }

    /// The underlying chrono value, if valid.
    #[must_use]
    pub fn as_naive(&self) -> Option<NaiveDateTime> {
        self.tm
    }

    fn tm(&self) -> Result<&NaiveDateTime, SqlConnectorError> {
        self.tm
            .as_ref()
            .ok_or_else(|| SqlConnectorError::ConversionError("DateTime is invalid".to_string()))
    }
}

impl From<NaiveDateTime> for DateTime {
    fn from(tm: NaiveDateTime) -> Self {
        Self { tm: Some(tm) }
    }
}

impl FromStr for DateTime {
    type Err = SqlConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_iso_string(s)
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tm {
            Some(tm) => write!(f, "{}", tm.format(ISO_FORMAT)),
            None => f.write_str("<invalid>"),
        }
    }
}

impl Serialize for DateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.tm {
            Some(tm) => serializer.collect_str(&tm.format(ISO_FORMAT)),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text: Option<String> = Option::deserialize(deserializer)?;
        match text {
            Some(text) => Self::from_iso_string(&text).map_err(serde::de::Error::custom),
            None => Ok(Self::default()),
        }
    }
}
