//! Wall clock and office-local calendar

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Office time zone and lateness cutoff; attendance days are local dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfficeCalendar {
    offset: FixedOffset,
    late_after: NaiveTime,
}

impl OfficeCalendar {
    pub fn new(offset: FixedOffset, late_after: NaiveTime) -> Self {
        Self { offset, late_after }
    }

    /// The attendance day `instant` falls on
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    pub fn local_time(&self, instant: DateTime<Utc>) -> NaiveTime {
        instant.with_timezone(&self.offset).time()
    }

    /// Strictly after the cutoff counts as late
    pub fn is_late(&self, check_in: DateTime<Utc>) -> bool {
        self.local_time(check_in) > self.late_after
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bangkok() -> OfficeCalendar {
        OfficeCalendar::new(
            FixedOffset::east_opt(7 * 3600).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        )
    }

    #[test]
    fn local_date_rolls_over_before_utc() {
        let calendar = bangkok();
        let instant = Utc.with_ymd_and_hms(2024, 8, 5, 18, 30, 0).unwrap();
        assert_eq!(
            calendar.date_of(instant),
            NaiveDate::from_ymd_opt(2024, 8, 6).unwrap()
        );
    }

    #[test]
    fn lateness_is_strictly_after_cutoff() {
        let calendar = bangkok();
        let on_time = Utc.with_ymd_and_hms(2024, 8, 5, 2, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 8, 5, 2, 15, 0).unwrap();

        assert!(!calendar.is_late(on_time));
        assert!(calendar.is_late(late));
    }
}
