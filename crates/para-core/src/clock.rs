//! Day arithmetic anchored to the vault owner's local calendar.
//!
//! Every analytics entry point takes an explicit [`AnalysisClock`] instead of
//! reading the system clock, so results are reproducible in tests.

use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc,
};

use crate::defaults::{MAX_WINDOW_DAYS, MS_PER_DAY};

/// Fractional days from `earlier` to `later` (negative when reversed).
pub fn days_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / MS_PER_DAY
}

/// Fixed offset for `minutes` east of UTC; out-of-range values fall back to UTC.
pub fn local_offset(minutes: i32) -> FixedOffset {
    FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or_else(|| {
        tracing::warn!(minutes, "UTC offset out of range, using UTC");
        Utc.fix()
    })
}

/// A fixed "now" plus the local UTC offset used to cut calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisClock {
    now: DateTime<Utc>,
    offset: FixedOffset,
}

impl AnalysisClock {
    /// Clock at `now` in UTC.
    pub fn utc(now: DateTime<Utc>) -> Self {
        Self {
            now,
            offset: Utc.fix(),
        }
    }

    /// Clock at `now` with local days offset from UTC by `minutes`.
    ///
    /// Offsets outside ±24h fall back to UTC.
    pub fn with_offset_minutes(now: DateTime<Utc>, minutes: i32) -> Self {
        Self {
            now,
            offset: local_offset(minutes),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Today's local calendar date.
    pub fn today(&self) -> NaiveDate {
        self.local_date(self.now)
    }

    /// Local calendar date of an instant.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Instant of local midnight at the start of `date`.
    pub fn local_midnight(&self, date: NaiveDate) -> DateTime<Utc> {
        self.local_instant(date, NaiveTime::MIN)
    }

    /// Instant of local noon on `date`, the census sample point for that day.
    pub fn local_midday(&self, date: NaiveDate) -> DateTime<Utc> {
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN);
        self.local_instant(date, noon)
    }

    /// Monday of the local week containing today.
    pub fn week_start(&self) -> NaiveDate {
        let today = self.today();
        today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
    }

    /// Fractional days elapsed since `instant`.
    pub fn days_since(&self, instant: DateTime<Utc>) -> f64 {
        days_between(instant, self.now)
    }

    /// The `days` local dates ending today, oldest first.
    ///
    /// Capped at [`MAX_WINDOW_DAYS`]; dates before the start of the
    /// representable calendar are left out.
    pub fn trailing_days(&self, days: u32) -> Vec<NaiveDate> {
        let today = self.today();
        (0..u64::from(days.min(MAX_WINDOW_DAYS)))
            .rev()
            .filter_map(|back| today.checked_sub_days(Days::new(back)))
            .collect()
    }

    fn local_instant(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let naive = date.and_time(time);
        // Fixed offsets never produce ambiguous or skipped local times.
        self.offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_days_between_fractional() {
        let a = at("2024-01-01T00:00:00Z");
        let b = at("2024-01-02T12:00:00Z");
        assert_eq!(days_between(a, b), 1.5);
        assert_eq!(days_between(b, a), -1.5);
    }

    #[test]
    fn test_today_respects_offset() {
        let now = at("2024-03-10T23:30:00Z");
        assert_eq!(
            AnalysisClock::utc(now).today(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
        assert_eq!(
            AnalysisClock::with_offset_minutes(now, 60).today(),
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
        );
    }

    #[test]
    fn test_local_midday_with_offset() {
        let clock = AnalysisClock::with_offset_minutes(at("2024-03-10T00:00:00Z"), -300);
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(clock.local_midday(date), at("2024-03-10T17:00:00Z"));
        assert_eq!(clock.local_midnight(date), at("2024-03-10T05:00:00Z"));
    }

    #[test]
    fn test_week_start_is_monday() {
        // 2024-03-14 is a Thursday.
        let clock = AnalysisClock::utc(at("2024-03-14T09:00:00Z"));
        assert_eq!(clock.week_start(), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());

        // A Monday maps to itself.
        let clock = AnalysisClock::utc(at("2024-03-11T09:00:00Z"));
        assert_eq!(clock.week_start(), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
    }

    #[test]
    fn test_trailing_days_oldest_first_ending_today() {
        let clock = AnalysisClock::utc(at("2024-03-14T09:00:00Z"));
        let days = clock.trailing_days(3);
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 13).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
            ]
        );
        assert!(clock.trailing_days(0).is_empty());
    }

    #[test]
    fn test_trailing_days_capped() {
        let clock = AnalysisClock::utc(at("2024-03-14T09:00:00Z"));
        let days = clock.trailing_days(u32::MAX);
        assert_eq!(days.len(), MAX_WINDOW_DAYS as usize);
        assert_eq!(days.last(), Some(&NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()));
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_utc() {
        let now = at("2024-03-14T09:00:00Z");
        let clock = AnalysisClock::with_offset_minutes(now, 100_000);
        assert_eq!(clock, AnalysisClock::utc(now));
    }
}
