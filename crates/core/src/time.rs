use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

//
// ─── CALENDAR DAYS ─────────────────────────────────────────────────────────────
//

/// Where one calendar day ends and the next begins.
///
/// Streak bookkeeping compares calendar dates, not 24-hour windows, so a learner
/// practising at 23:50 and again at 00:10 local time has practised on two days.
/// The boundary is either a fixed offset from UTC or the host's local time zone,
/// which follows daylight-saving changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayBoundary {
    zone: Zone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum Zone {
    Fixed { offset_minutes: i32 },
    SystemLocal,
}

impl DayBoundary {
    /// Day boundary at UTC midnight.
    #[must_use]
    pub fn utc() -> Self {
        Self {
            zone: Zone::Fixed { offset_minutes: 0 },
        }
    }

    /// Day boundary at midnight in the host's time zone.
    #[must_use]
    pub fn system_local() -> Self {
        Self {
            zone: Zone::SystemLocal,
        }
    }

    /// Day boundary at local midnight for the given offset east of UTC.
    ///
    /// Returns `None` if the offset is outside ±24h.
    #[must_use]
    pub fn from_offset_minutes(offset_minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(offset_minutes.checked_mul(60)?)?;
        Some(Self {
            zone: Zone::Fixed { offset_minutes },
        })
    }

    /// The fixed offset east of UTC, or `None` for the host's time zone.
    #[must_use]
    pub fn offset_minutes(&self) -> Option<i32> {
        match self.zone {
            Zone::Fixed { offset_minutes } => Some(offset_minutes),
            Zone::SystemLocal => None,
        }
    }

    #[must_use]
    pub fn is_system_local(&self) -> bool {
        matches!(self.zone, Zone::SystemLocal)
    }

    /// Calendar date of `at` on the learner's side of the boundary.
    #[must_use]
    pub fn date_of(&self, at: DateTime<Utc>) -> NaiveDate {
        match self.zone {
            Zone::Fixed { offset_minutes } => {
                // Out-of-range offsets can only arrive through deserialization.
                let offset = offset_minutes
                    .checked_mul(60)
                    .and_then(FixedOffset::east_opt)
                    .unwrap_or_else(|| Utc.fix());
                at.with_timezone(&offset).date_naive()
            }
            Zone::SystemLocal => at.with_timezone(&Local).date_naive(),
        }
    }

    /// True when both instants fall on the same calendar date.
    #[must_use]
    pub fn same_day(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.date_of(a) == self.date_of(b)
    }

    /// True when `earlier` falls on the calendar day immediately before `now`.
    #[must_use]
    pub fn is_day_before(&self, earlier: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.date_of(now).pred_opt() == Some(self.date_of(earlier))
    }
}

impl Default for DayBoundary {
    fn default() -> Self {
        Self::utc()
    }
}

/// The "never happened" sentinel used for fresh records (1970-01-01T00:00:00Z).
#[must_use]
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let mut clock = fixed_clock();
        clock.advance(Duration::hours(2));
        assert_eq!(clock.now(), fixed_now() + Duration::hours(2));
    }

    #[test]
    fn utc_boundary_splits_at_midnight() {
        let boundary = DayBoundary::utc();
        // fixed_now() is 22:13:20 UTC.
        let before_midnight = fixed_now();
        let after_midnight = fixed_now() + Duration::hours(2);
        assert!(!boundary.same_day(before_midnight, after_midnight));
        assert!(boundary.is_day_before(before_midnight, after_midnight));
    }

    #[test]
    fn offset_boundary_moves_the_split() {
        // UTC-05:00: 22:13 UTC is 17:13 local, 00:13 UTC is 19:13 local.
        let boundary = DayBoundary::from_offset_minutes(-300).unwrap();
        let a = fixed_now();
        let b = fixed_now() + Duration::hours(2);
        assert!(boundary.same_day(a, b));
    }

    #[test]
    fn two_days_apart_is_not_day_before() {
        let boundary = DayBoundary::utc();
        assert!(!boundary.is_day_before(fixed_now() - Duration::days(2), fixed_now()));
        assert!(!boundary.is_day_before(fixed_now(), fixed_now()));
    }

    #[test]
    fn system_local_follows_the_host_zone() {
        let boundary = DayBoundary::system_local();
        assert!(boundary.is_system_local());
        assert_eq!(boundary.offset_minutes(), None);
        let at = fixed_now();
        assert_eq!(boundary.date_of(at), at.with_timezone(&Local).date_naive());
        assert_eq!(DayBoundary::utc().offset_minutes(), Some(0));
    }

    #[test]
    fn rejects_out_of_range_offsets() {
        assert!(DayBoundary::from_offset_minutes(24 * 60).is_none());
        assert!(DayBoundary::from_offset_minutes(i32::MAX).is_none());
        assert!(DayBoundary::from_offset_minutes(330).is_some());
    }
}
