//! Progress toward a target age: linear ratios, calendar breakdowns and
//! fixed-divisor totals of the time left.
//!
//! The totals deliberately use an average month (30.44 days) rather than the
//! calendar; the countdown fields come from [`age::breakdown`] instead.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone};

use crate::age::{self, Breakdown};

const SECOND_MS: u64 = 1_000;
const MINUTE_MS: u64 = 60 * SECOND_MS;
const HOUR_MS: u64 = 60 * MINUTE_MS;
const DAY_MS: u64 = 24 * HOUR_MS;
const WEEK_MS: u64 = 7 * DAY_MS;
/// 30.44 days
const MONTH_MS: u64 = 3044 * DAY_MS / 100;
/// 365.25 days
const YEAR_MS: u64 = 36525 * DAY_MS / 100;

/// Target age in whole years, always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TargetAge(u32);

impl TargetAge {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 150;
    pub const DEFAULT: TargetAge = TargetAge(80);

    pub fn new(years: u32) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&years)
            .then_some(Self(years))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TargetAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Remaining time converted to single units, each floored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub months: u64,
    pub weeks: u64,
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl Totals {
    pub fn from_remaining_ms(remaining_ms: u64) -> Self {
        Self {
            months: remaining_ms / MONTH_MS,
            weeks: remaining_ms / WEEK_MS,
            days: remaining_ms / DAY_MS,
            hours: remaining_ms / HOUR_MS,
            minutes: remaining_ms / MINUTE_MS,
            seconds: remaining_ms / SECOND_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// Wall-clock time of the target in the birth's time zone.
    pub target: NaiveDateTime,
    /// Elapsed share of birth → target, clamped to [0, 1].
    pub progress_ratio: f64,
    pub remaining_ratio: f64,
    /// Countdown from now to the target.
    pub remaining: Breakdown,
    /// Current age.
    pub age: Breakdown,
    pub total_ms: i64,
    pub remaining_ms: u64,
    pub totals: Totals,
}

/// Resolves a wall-clock time in `tz`. An ambiguous time takes the earlier
/// offset; a time skipped by a forward transition moves one hour later.
pub fn localize<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&local).earliest().or_else(|| {
        let shifted = local.checked_add_signed(Duration::hours(1))?;
        tz.from_local_datetime(&shifted).earliest()
    })
}

/// The instant `birth` reaches `target_age`, on the same wall-clock time.
pub fn target_instant<Tz: TimeZone>(birth: &DateTime<Tz>, target_age: TargetAge) -> Option<DateTime<Tz>> {
    let local = age::add_years(birth.naive_local(), target_age.get())?;
    localize(&birth.timezone(), local)
}

/// Computes every progress figure for `now`.
///
/// Durations and ratios come from epoch milliseconds, so they keep moving
/// forward across offset changes. The calendar breakdowns use wall-clock
/// fields. Returns `None` only when the target instant falls outside the
/// calendar range chrono can represent.
pub fn progress<Tz: TimeZone>(
    birth: &DateTime<Tz>,
    target_age: TargetAge,
    now: &DateTime<Tz>,
) -> Option<Progress> {
    let target = target_instant(birth, target_age)?;

    // target > birth because the target age is at least one year
    let total_ms = target.timestamp_millis() - birth.timestamp_millis();
    let elapsed_ms = now.timestamp_millis() - birth.timestamp_millis();
    let remaining_ms = u64::try_from(target.timestamp_millis() - now.timestamp_millis()).unwrap_or(0);

    let progress_ratio = (elapsed_ms as f64 / total_ms as f64).clamp(0.0, 1.0);

    let target = target.naive_local();
    let now = now.naive_local();
    Some(Progress {
        target,
        progress_ratio,
        remaining_ratio: 1.0 - progress_ratio,
        remaining: age::breakdown(now, target),
        age: age::breakdown(birth.naive_local(), now),
        total_ms,
        remaining_ms,
        totals: Totals::from_remaining_ms(remaining_ms),
    })
}

/// Quick look at a candidate setting: the target date and roughly how many
/// years are left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preview {
    pub target: NaiveDateTime,
    pub years_left: u64,
}

pub fn preview<Tz: TimeZone>(
    birth: &DateTime<Tz>,
    target_age: TargetAge,
    now: &DateTime<Tz>,
) -> Option<Preview> {
    let target = target_instant(birth, target_age)?;
    let remaining_ms = u64::try_from(target.timestamp_millis() - now.timestamp_millis()).unwrap_or(0);
    Some(Preview {
        target: target.naive_local(),
        years_left: remaining_ms / YEAR_MS,
    })
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Target date: {} · about {} years left",
            self.target.format("%B %-d, %Y"),
            self.years_left
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDate, Utc};
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        date(y, m, d).and_utc()
    }

    fn age(years: u32) -> TargetAge {
        TargetAge::new(years).unwrap()
    }

    #[test]
    fn divisors() {
        assert_eq!(MONTH_MS, 2_630_016_000);
        assert_eq!(YEAR_MS, 31_557_600_000);
    }

    #[test]
    fn target_age_bounds() {
        assert_eq!(TargetAge::new(0), None);
        assert_eq!(TargetAge::new(151), None);
        assert_eq!(TargetAge::new(1).map(TargetAge::get), Some(1));
        assert_eq!(TargetAge::new(150).map(TargetAge::get), Some(150));
    }

    #[test]
    fn halfway_through_an_eighty_year_target() {
        let birth = day(1990, 6, 15);
        let p = progress(&birth, age(80), &day(2024, 6, 15)).unwrap();

        assert_eq!(p.target, date(2070, 6, 15));
        assert_eq!(p.age, Breakdown { years: 34, ..Breakdown::ZERO });
        assert_eq!(p.remaining, Breakdown { years: 46, ..Breakdown::ZERO });
        assert!((p.progress_ratio - 0.425).abs() < 1e-3, "{}", p.progress_ratio);
        assert!((p.progress_ratio + p.remaining_ratio - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ratio_is_zero_at_birth() {
        let birth = day(1990, 6, 15);
        let p = progress(&birth, age(80), &birth).unwrap();
        assert_eq!(p.progress_ratio, 0.0);
        assert_eq!(p.remaining_ratio, 1.0);
        assert_eq!(p.age, Breakdown::ZERO);
        assert_eq!(p.remaining_ms as i64, p.total_ms);
    }

    #[test]
    fn ratio_is_one_at_target() {
        let birth = day(1990, 6, 15);
        let p = progress(&birth, age(80), &day(2070, 6, 15)).unwrap();
        assert_eq!(p.progress_ratio, 1.0);
        assert_eq!(p.remaining, Breakdown::ZERO);
        assert_eq!(p.remaining_ms, 0);
        assert_eq!(p.totals, Totals::default());
    }

    #[test]
    fn ratio_clamps_outside_the_span() {
        let birth = day(1990, 6, 15);
        let before = progress(&birth, age(10), &day(1980, 1, 1)).unwrap();
        let after = progress(&birth, age(10), &day(2030, 1, 1)).unwrap();
        assert_eq!(before.progress_ratio, 0.0);
        assert_eq!(after.progress_ratio, 1.0);
        assert_eq!(after.remaining, Breakdown::ZERO);
        assert_eq!(after.remaining_ms, 0);
    }

    #[test]
    fn ratio_keeps_rising_across_a_fall_back() {
        let summer = FixedOffset::east_opt(2 * 3600).unwrap();
        let winter = FixedOffset::east_opt(3600).unwrap();
        let at = |offset: FixedOffset, local: NaiveDateTime| offset.from_local_datetime(&local).unwrap();

        let birth = at(summer, date(1990, 6, 15));
        let fall_back = date(2024, 10, 27);
        // 02:50 summer time, then 02:20 winter time half an hour later
        let before = at(summer, fall_back + Duration::minutes(170));
        let after = at(winter, fall_back + Duration::minutes(140));
        assert!(after.naive_local() < before.naive_local());
        assert!(after > before);

        let p1 = progress(&birth, age(80), &before).unwrap();
        let p2 = progress(&birth, age(80), &after).unwrap();
        assert!(p2.progress_ratio > p1.progress_ratio);
        assert_eq!(p1.remaining_ms - p2.remaining_ms, 1_800_000);
        assert_eq!(p1.total_ms, p2.total_ms);
    }

    #[test]
    fn localize_keeps_wall_clock_time() {
        let utc = localize(&Utc, date(2024, 3, 31)).unwrap();
        assert_eq!(utc.naive_utc(), date(2024, 3, 31));

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = localize(&plus_two, date(2024, 3, 31)).unwrap();
        assert_eq!(local.naive_local(), date(2024, 3, 31));
        assert_eq!(local.timestamp() - utc.timestamp(), -2 * 3600);
    }

    #[test]
    fn leap_day_birth_targets_first_of_march() {
        let p = progress(&day(2000, 2, 29), age(1), &day(2000, 8, 1)).unwrap();
        assert_eq!(p.target, date(2001, 3, 1));
    }

    #[test]
    fn one_day_left_in_single_units() {
        let t = Totals::from_remaining_ms(86_400_000);
        assert_eq!(t.days, 1);
        assert_eq!(t.hours, 24);
        assert_eq!(t.minutes, 1440);
        assert_eq!(t.seconds, 86_400);
        assert_eq!(t.weeks, 0);
        assert_eq!(t.months, 0);
    }

    #[test]
    fn totals_follow_remaining_time() {
        let birth = day(1990, 6, 15);
        let p = progress(&birth, age(80), &day(2070, 6, 14)).unwrap();
        assert_eq!(p.remaining_ms, 86_400_000);
        assert_eq!(p.totals, Totals::from_remaining_ms(86_400_000));
        assert_eq!(p.remaining, Breakdown { days: 1, ..Breakdown::ZERO });
    }

    #[test]
    fn preview_reads_as_a_sentence() {
        let p = preview(&day(1990, 6, 15), age(80), &day(2024, 6, 15)).unwrap();
        assert_eq!(p.target, date(2070, 6, 15));
        assert_eq!(p.years_left, 45);
        assert_eq!(
            p.to_string(),
            "Target date: June 15, 2070 · about 45 years left"
        );
    }

    /// Birth instants between 1900 and 2100.
    fn birth() -> impl Strategy<Value = DateTime<Utc>> {
        (-2_208_988_800i64..4_102_444_800i64).prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap())
    }

    /// Offsets from birth, in ms, reaching a little past the longest span.
    fn offset_ms() -> impl Strategy<Value = i64> {
        -86_400_000i64..152 * YEAR_MS as i64
    }

    proptest! {
        #[test]
        fn ratio_stays_in_unit_range_and_never_decreases(
            birth in birth(),
            years in TargetAge::MIN..=TargetAge::MAX,
            a in offset_ms(),
            b in offset_ms(),
        ) {
            let target_age = TargetAge::new(years).unwrap();
            let early = birth + Duration::milliseconds(a.min(b));
            let late = birth + Duration::milliseconds(a.max(b));

            let p1 = progress(&birth, target_age, &early).unwrap();
            let p2 = progress(&birth, target_age, &late).unwrap();

            prop_assert!((0.0..=1.0).contains(&p1.progress_ratio));
            prop_assert!((0.0..=1.0).contains(&p2.progress_ratio));
            prop_assert!(p2.progress_ratio >= p1.progress_ratio);
            prop_assert!(p2.remaining_ms <= p1.remaining_ms);
            prop_assert!(p1.total_ms > 0);
        }
    }
}
