//! Duplicate suppression for the record file.

use crate::observation::{Granularity, Observation};

/// Decides whether a new observation belongs to a period not yet recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateGuard {
    granularity: Granularity,
}

impl DuplicateGuard {
    pub fn new(granularity: Granularity) -> Self {
        Self { granularity }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Returns `false` only when `last` covers the same period as `new`.
    pub fn should_write(&self, new: &Observation, last: Option<&Observation>) -> bool {
        match last {
            Some(last) => last.period(self.granularity) != new.period(self.granularity),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn obs(timestamp: &str) -> Observation {
        Observation::new(timestamp, Decimal::new(6235, 2))
    }

    #[test]
    fn test_empty_store_always_writes() {
        for granularity in [Granularity::Date, Granularity::DateTime] {
            let guard = DuplicateGuard::new(granularity);
            assert!(guard.should_write(&obs("2024-03-01"), None));
        }
    }

    #[test]
    fn test_same_day_is_duplicate() {
        let guard = DuplicateGuard::new(Granularity::Date);
        assert!(!guard.should_write(&obs("2024-03-01"), Some(&obs("2024-03-01"))));
        assert!(guard.should_write(&obs("2024-03-02"), Some(&obs("2024-03-01"))));
    }

    #[test]
    fn test_date_granularity_ignores_time_of_day() {
        let guard = DuplicateGuard::new(Granularity::Date);
        let last = obs("2024-03-01 09:00:00");
        assert!(!guard.should_write(&obs("2024-03-01 10:00:00"), Some(&last)));
    }

    #[test]
    fn test_datetime_granularity_compares_full_timestamp() {
        let guard = DuplicateGuard::new(Granularity::DateTime);
        let last = obs("2024-03-01 09:00:00");
        assert!(guard.should_write(&obs("2024-03-01 10:00:00"), Some(&last)));
        assert!(!guard.should_write(&obs("2024-03-01 09:00:00"), Some(&last)));
    }

    #[test]
    fn test_value_does_not_matter() {
        let guard = DuplicateGuard::new(Granularity::Date);
        let last = Observation::new("2024-03-01", Decimal::new(10, 0));
        let new = Observation::new("2024-03-01", Decimal::new(90, 0));
        assert!(!guard.should_write(&new, Some(&last)));
    }
}
