//! Hours-and-minutes notation used on aircraft records and flight logs.
//!
//! Counters are entered as `GGG.MM`, where the part after the dot is minutes
//! rather than a decimal fraction: `123.30` is 123 hours 30 minutes. They are
//! printed as `GGG:MM`.

use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A flight-hours counter stored as whole minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlightHours(u32);

impl FlightHours {
    /// Zero hours.
    pub const ZERO: Self = Self(0);

    /// Build from a whole number of minutes.
    #[must_use]
    pub fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    /// Build from hours and minutes.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `minutes >= 60` or the total overflows.
    pub fn from_hours_minutes(hours: u32, minutes: u32) -> Result<Self> {
        if minutes >= 60 {
            return Err(Error::validation(
                "flight_hours",
                format!("minutes part must be below 60, got {minutes}"),
            ));
        }
        hours
            .checked_mul(60)
            .and_then(|m| m.checked_add(minutes))
            .map(Self)
            .ok_or_else(|| Error::validation("flight_hours", "value is too large"))
    }

    /// Total minutes.
    #[must_use]
    pub fn minutes(self) -> u32 {
        self.0
    }

    /// As a chrono duration.
    #[must_use]
    pub fn to_duration(self) -> Duration {
        Duration::minutes(i64::from(self.0))
    }
}

impl std::fmt::Display for FlightHours {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for FlightHours {
    type Err = Error;

    /// Parse `GGG.MM` (`123.30`, `123.3`, `123`). `GGG:MM` is accepted too.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (hours, minutes) = match s.split_once(['.', ':']) {
            Some((h, m)) => (h, m),
            None => (s, ""),
        };

        if hours.is_empty() || !hours.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::validation(
                "flight_hours",
                format!("'{s}' is not in GGG.MM format"),
            ));
        }
        if minutes.len() > 2 || !minutes.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::validation(
                "flight_hours",
                format!("'{s}' must have at most two minute digits"),
            ));
        }

        let hours: u32 = hours
            .parse()
            .map_err(|_| Error::validation("flight_hours", "value is too large"))?;
        // A single digit reads like a decimal: `.3` is 30 minutes.
        let minutes: u32 = match minutes.len() {
            0 => 0,
            1 => minutes.parse::<u32>().unwrap_or(0) * 10,
            _ => minutes.parse().unwrap_or(0),
        };

        Self::from_hours_minutes(hours, minutes)
    }
}

/// Format a duration as `G:MM`, dropping seconds. Negative durations print
/// as `0:00`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    format!("{}:{:02}", total / 3600, (total % 3600) / 60)
}

/// Parse a `G:MM` duration such as `1:30`.
///
/// # Errors
///
/// Returns a validation error if the text is malformed or minutes are 60 or more.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let (hours, minutes) = s.trim().split_once(':').ok_or_else(|| {
        Error::validation("flight_time", format!("'{s}' is not in G:MM format"))
    })?;
    let hours: i64 = hours
        .parse()
        .map_err(|_| Error::validation("flight_time", format!("bad hours in '{s}'")))?;
    let minutes: i64 = minutes
        .parse()
        .map_err(|_| Error::validation("flight_time", format!("bad minutes in '{s}'")))?;
    if hours < 0 || !(0..60).contains(&minutes) {
        return Err(Error::validation(
            "flight_time",
            format!("'{s}' is out of range"),
        ));
    }
    Ok(Duration::minutes(hours * 60 + minutes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minutes_part() {
        assert_eq!("123.30".parse::<FlightHours>().unwrap().minutes(), 123 * 60 + 30);
        assert_eq!("0.05".parse::<FlightHours>().unwrap().minutes(), 5);
        assert_eq!("12".parse::<FlightHours>().unwrap().minutes(), 720);
    }

    #[test]
    fn test_parse_single_digit_fraction() {
        assert_eq!("1.3".parse::<FlightHours>().unwrap().minutes(), 90);
    }

    #[test]
    fn test_parse_colon_form() {
        assert_eq!("500:00".parse::<FlightHours>().unwrap().minutes(), 30_000);
    }

    #[test]
    fn test_parse_rejects_sixty_minutes() {
        let err = "10.60".parse::<FlightHours>().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<FlightHours>().is_err());
        assert!("-1.00".parse::<FlightHours>().is_err());
        assert!("1.234".parse::<FlightHours>().is_err());
        assert!("abc".parse::<FlightHours>().is_err());
        assert!(".30".parse::<FlightHours>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(FlightHours::from_minutes(123 * 60 + 30).to_string(), "123:30");
        assert_eq!(FlightHours::from_minutes(5).to_string(), "0:05");
        assert_eq!(FlightHours::ZERO.to_string(), "0:00");
    }

    #[test]
    fn test_to_duration() {
        assert_eq!(
            FlightHours::from_minutes(90).to_duration(),
            Duration::minutes(90)
        );
    }

    #[test]
    fn test_format_duration_drops_seconds() {
        assert_eq!(format_duration(Duration::seconds(5_459)), "1:30");
        assert_eq!(format_duration(Duration::hours(125)), "125:00");
        assert_eq!(format_duration(Duration::zero()), "0:00");
        assert_eq!(format_duration(Duration::minutes(-5)), "0:00");
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1:30").unwrap(), Duration::minutes(90));
        assert_eq!(parse_duration("0:05").unwrap(), Duration::minutes(5));
        assert!(parse_duration("1.30").is_err());
        assert!(parse_duration("1:75").is_err());
    }

    #[test]
    fn test_serde_is_minutes() {
        let json = serde_json::to_string(&FlightHours::from_minutes(75)).unwrap();
        assert_eq!(json, "75");
    }
}
