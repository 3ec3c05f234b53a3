//! The observation type and its timestamp handling.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone};
use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places kept for a recorded score.
pub const SCORE_DECIMALS: u32 = 2;

/// Length of the `YYYY-MM-DD` date prefix of a timestamp.
const DATE_PREFIX_LEN: usize = 10;

/// One timestamped reading of the indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Either `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`, depending on the policy.
    pub timestamp: String,
    /// Score rounded to [`SCORE_DECIMALS`] places.
    pub value: Decimal,
}

impl Observation {
    pub fn new(timestamp: impl Into<String>, value: Decimal) -> Self {
        Self {
            timestamp: timestamp.into(),
            value,
        }
    }

    /// The part of the timestamp compared by the duplicate guard.
    pub fn period(&self, granularity: Granularity) -> &str {
        match granularity {
            Granularity::Date => self
                .timestamp
                .get(..DATE_PREFIX_LEN)
                .unwrap_or(&self.timestamp),
            Granularity::DateTime => &self.timestamp,
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.timestamp, self.value)
    }
}

/// How precisely two timestamps must match to count as the same period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One row per calendar day.
    Date,
    /// One row per distinct timestamp.
    DateTime,
}

impl Granularity {
    /// Format `now` the way observations at this granularity are stamped.
    pub fn stamp<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> String
    where
        Tz::Offset: fmt::Display,
    {
        match self {
            Granularity::Date => now.format("%Y-%m-%d").to_string(),
            Granularity::DateTime => now.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Round a raw score half away from zero to two decimal places.
///
/// The float is converted through its shortest decimal representation, so
/// `62.345` rounds to `62.35` even though its binary value is slightly below.
pub fn round_score(raw: f64) -> Option<Decimal> {
    if !raw.is_finite() {
        return None;
    }
    let exact = Decimal::from_str(&raw.to_string()).ok()?;
    Some(exact.round_dp_with_strategy(SCORE_DECIMALS, RoundingStrategy::MidpointAwayFromZero))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round_score_half_up() {
        assert_eq!(round_score(62.345), Some(dec("62.35")));
        assert_eq!(round_score(62.344), Some(dec("62.34")));
        assert_eq!(round_score(0.005), Some(dec("0.01")));
        assert_eq!(round_score(100.0), Some(dec("100")));
    }

    #[test]
    fn test_round_score_rejects_non_finite() {
        assert_eq!(round_score(f64::NAN), None);
        assert_eq!(round_score(f64::INFINITY), None);
    }

    #[test]
    fn test_period_by_granularity() {
        let obs = Observation::new("2024-03-01 13:00:00", dec("50"));
        assert_eq!(obs.period(Granularity::Date), "2024-03-01");
        assert_eq!(obs.period(Granularity::DateTime), "2024-03-01 13:00:00");

        let short = Observation::new("2024", dec("50"));
        assert_eq!(short.period(Granularity::Date), "2024");
    }

    #[test]
    fn test_stamp_formats() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let now = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap()
            .and_local_timezone(offset)
            .unwrap();
        assert_eq!(Granularity::Date.stamp(&now), "2024-03-01");
        assert_eq!(Granularity::DateTime.stamp(&now), "2024-03-01 09:05:07");
    }

    #[test]
    fn test_display() {
        let obs = Observation::new("2024-03-01", dec("62.35"));
        assert_eq!(obs.to_string(), "2024-03-01 = 62.35");
    }
}
