//! Urgency banding for certificate, inspection and insurance expiry dates.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// How soon an expiry date needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyBand {
    /// At least `ok_months` away.
    Ok,
    /// Between `warning_months` and `ok_months` away.
    Warning,
    /// Less than `warning_months` away, or already past.
    Critical,
    /// No expiry date is tracked.
    Unknown,
}

impl UrgencyBand {
    /// Rank used to compare bands; higher needs action sooner.
    ///
    /// `Unknown` has no rank.
    #[must_use]
    pub fn urgency(self) -> Option<u8> {
        match self {
            Self::Ok => Some(0),
            Self::Warning => Some(1),
            Self::Critical => Some(2),
            Self::Unknown => None,
        }
    }

    /// Marker used in plain-text listings.
    #[must_use]
    pub fn marker(self) -> &'static str {
        match self {
            Self::Ok | Self::Unknown => "",
            Self::Warning => " (!)",
            Self::Critical => " (!!)",
        }
    }
}

impl std::fmt::Display for UrgencyBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Month offsets separating the bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpiryThresholds {
    /// Expiry this many months out (or later) is `Ok`.
    pub ok_months: u32,
    /// Expiry this many months out (or later) is at least `Warning`.
    pub warning_months: u32,
}

impl Default for ExpiryThresholds {
    fn default() -> Self {
        Self {
            ok_months: 3,
            warning_months: 1,
        }
    }
}

impl ExpiryThresholds {
    /// Classify `expiry` relative to `today`.
    ///
    /// Month addition clamps to the end of the target month, so three months
    /// after January 31 is April 30. Both boundaries are inclusive on the
    /// less urgent side: exactly `ok_months` out is `Ok`.
    #[must_use]
    pub fn classify(&self, expiry: Option<NaiveDate>, today: NaiveDate) -> UrgencyBand {
        let Some(expiry) = expiry else {
            return UrgencyBand::Unknown;
        };

        if expiry >= add_months(today, self.ok_months) {
            UrgencyBand::Ok
        } else if expiry >= add_months(today, self.warning_months) {
            UrgencyBand::Warning
        } else {
            UrgencyBand::Critical
        }
    }
}

/// Classify an expiry date with the default 3 / 1 month thresholds.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use pdtlog::compute::{classify_expiry, UrgencyBand};
///
/// let today = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
/// let arc = NaiveDate::from_ymd_opt(2025, 9, 15);
/// assert_eq!(classify_expiry(arc, today), UrgencyBand::Ok);
/// assert_eq!(classify_expiry(None, today), UrgencyBand::Unknown);
/// ```
#[must_use]
pub fn classify_expiry(expiry: Option<NaiveDate>, today: NaiveDate) -> UrgencyBand {
    ExpiryThresholds::default().classify(expiry, today)
}

/// Civil calendar month addition, saturating at the largest representable date.
fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn today() -> NaiveDate {
        ymd(2025, 6, 15)
    }

    #[test]
    fn test_exactly_three_months_is_ok() {
        assert_eq!(classify_expiry(Some(ymd(2025, 9, 15)), today()), UrgencyBand::Ok);
    }

    #[test]
    fn test_day_before_three_months_is_warning() {
        assert_eq!(
            classify_expiry(Some(ymd(2025, 9, 14)), today()),
            UrgencyBand::Warning
        );
    }

    #[test]
    fn test_exactly_one_month_is_warning() {
        assert_eq!(
            classify_expiry(Some(ymd(2025, 7, 15)), today()),
            UrgencyBand::Warning
        );
    }

    #[test]
    fn test_day_before_one_month_is_critical() {
        assert_eq!(
            classify_expiry(Some(ymd(2025, 7, 14)), today()),
            UrgencyBand::Critical
        );
    }

    #[test]
    fn test_past_date_is_critical() {
        assert_eq!(
            classify_expiry(Some(ymd(2025, 1, 1)), today()),
            UrgencyBand::Critical
        );
    }

    #[test]
    fn test_absent_is_unknown() {
        assert_eq!(classify_expiry(None, today()), UrgencyBand::Unknown);
    }

    #[test]
    fn test_month_end_clamps() {
        // Jan 31 + 3 months lands on Apr 30, not May 1 or a 90 day offset.
        let jan31 = ymd(2025, 1, 31);
        assert_eq!(classify_expiry(Some(ymd(2025, 4, 30)), jan31), UrgencyBand::Ok);
        assert_eq!(
            classify_expiry(Some(ymd(2025, 4, 29)), jan31),
            UrgencyBand::Warning
        );
        // Jan 31 + 1 month is Feb 28 outside leap years.
        assert_eq!(
            classify_expiry(Some(ymd(2025, 2, 28)), jan31),
            UrgencyBand::Warning
        );
        assert_eq!(
            classify_expiry(Some(ymd(2025, 2, 27)), jan31),
            UrgencyBand::Critical
        );
    }

    #[test]
    fn test_leap_year_february() {
        let jan31 = ymd(2024, 1, 31);
        assert_eq!(
            classify_expiry(Some(ymd(2024, 2, 29)), jan31),
            UrgencyBand::Warning
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = ExpiryThresholds {
            ok_months: 6,
            warning_months: 2,
        };
        assert_eq!(
            thresholds.classify(Some(ymd(2025, 9, 15)), today()),
            UrgencyBand::Warning
        );
        assert_eq!(
            thresholds.classify(Some(ymd(2025, 12, 15)), today()),
            UrgencyBand::Ok
        );
        assert_eq!(
            thresholds.classify(Some(ymd(2025, 8, 1)), today()),
            UrgencyBand::Critical
        );
    }

    #[test]
    fn test_far_future_does_not_overflow() {
        assert_eq!(
            classify_expiry(Some(NaiveDate::MAX), NaiveDate::MAX),
            UrgencyBand::Ok
        );
        assert_eq!(
            classify_expiry(Some(ymd(2025, 1, 1)), NaiveDate::MAX),
            UrgencyBand::Critical
        );
    }

    #[test]
    fn test_band_display_and_serde() {
        assert_eq!(UrgencyBand::Warning.to_string(), "warning");
        assert_eq!(
            serde_json::to_string(&UrgencyBand::Critical).unwrap(),
            "\"critical\""
        );
    }

    #[test]
    fn test_urgency_rank() {
        assert!(UrgencyBand::Critical.urgency() > UrgencyBand::Warning.urgency());
        assert!(UrgencyBand::Warning.urgency() > UrgencyBand::Ok.urgency());
        assert!(UrgencyBand::Unknown.urgency().is_none());
    }

    proptest! {
        #[test]
        fn prop_urgency_never_decreases_as_expiry_moves_earlier(
            base in 0i64..20_000,
            a in 0i64..400,
            b in 0i64..400,
        ) {
            let today = ymd(2000, 1, 1) + chrono::Duration::days(base);
            let (near, far) = if a <= b { (a, b) } else { (b, a) };
            let near_band = classify_expiry(Some(today + chrono::Duration::days(near)), today);
            let far_band = classify_expiry(Some(today + chrono::Duration::days(far)), today);
            prop_assert!(near_band.urgency() >= far_band.urgency());
        }

        #[test]
        fn prop_present_expiry_is_never_unknown(base in 0i64..20_000, offset in -400i64..400) {
            let today = ymd(2000, 1, 1) + chrono::Duration::days(base);
            let band = classify_expiry(Some(today + chrono::Duration::days(offset)), today);
            prop_assert_ne!(band, UrgencyBand::Unknown);
        }
    }
}
