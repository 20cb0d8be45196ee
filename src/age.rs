//! age.rs
//!
//! Calendar-aware difference between two instants, in the form
//!     years / months / days / hours / minutes / seconds
//!
//! Chrono does not provide a built-in year/month/day diff (unlike Python’s
//! relativedelta), so we implement the calendar-aware borrowing rules manually.
//!
//! This logic correctly handles:
//!   • seconds → minutes → hours → days → months → years borrowing
//!   • day underflow (borrowing from the month before `to`)
//!   • leap years
//!   • varying month lengths
//!
//! A breakdown always re-adds to its start instant: years and months first
//! (a day the month lacks rolls into the next month), then days, then time
//! of day.

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, SubsecRound, Timelike};

const SECS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Breakdown {
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Breakdown {
    pub const ZERO: Breakdown = Breakdown {
        years: 0,
        months: 0,
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    /// Builds a breakdown from signed fields, `None` if any of them is negative.
    fn from_signed(fields: [i64; 6]) -> Option<Self> {
        let [years, months, days, hours, minutes, seconds] = fields.map(u32::try_from);
        Some(Self {
            years: years.ok()?,
            months: months.ok()?,
            days: days.ok()?,
            hours: hours.ok()?,
            minutes: minutes.ok()?,
            seconds: seconds.ok()?,
        })
    }

    fn total_months(&self) -> Option<u32> {
        self.years.checked_mul(12)?.checked_add(self.months)
    }

    /// Adds the breakdown to `from`: years and months, then days, then time of day.
    pub fn add_to(&self, from: NaiveDateTime) -> Option<NaiveDateTime> {
        let anchor = add_months(from, self.total_months()?)?;
        let rest = Duration::days(i64::from(self.days))
            + Duration::hours(i64::from(self.hours))
            + Duration::minutes(i64::from(self.minutes))
            + Duration::seconds(i64::from(self.seconds));
        anchor.checked_add_signed(rest)
    }
}

/// Calendar difference from `from` to `to`; all zero when `to <= from`.
///
/// Sub-second parts of both instants are ignored.
pub fn breakdown(from: NaiveDateTime, to: NaiveDateTime) -> Breakdown {
    let from = from.trunc_subsecs(0);
    let to = to.trunc_subsecs(0);

    if to <= from {
        return Breakdown::ZERO;
    }

    // The single borrow pass is what a person subtracting by hand gets. It only
    // comes out negative when `from`'s day is past the end of the borrowed
    // month (Jan 31 → Mar 1).
    borrow_fields(from, to).unwrap_or_else(|| settle_from_anchor(from, to))
}

fn borrow_fields(from: NaiveDateTime, to: NaiveDateTime) -> Option<Breakdown> {
    let mut years = i64::from(to.year()) - i64::from(from.year());
    let mut months = i64::from(to.month()) - i64::from(from.month());
    let mut days = i64::from(to.day()) - i64::from(from.day());
    let mut hours = i64::from(to.hour()) - i64::from(from.hour());
    let mut minutes = i64::from(to.minute()) - i64::from(from.minute());
    let mut seconds = i64::from(to.second()) - i64::from(from.second());

    if seconds < 0 {
        seconds += 60;
        minutes -= 1;
    }
    if minutes < 0 {
        minutes += 60;
        hours -= 1;
    }
    if hours < 0 {
        hours += 24;
        days -= 1;
    }

    // Fix day underflow
    if days < 0 {
        months -= 1;

        // Determine the previous month relative to `to`.
        let (prev_year, prev_month) = if to.month() == 1 {
            (to.year() - 1, 12)
        } else {
            (to.year(), to.month() - 1)
        };

        // Add days from the previous month (28–31 depending on month & leap year)
        days += i64::from(days_in_month(prev_year, prev_month));
    }

    // Fix month underflow
    if months < 0 {
        years -= 1;
        months += 12;
    }

    Breakdown::from_signed([years, months, days, hours, minutes, seconds])
}

/// Largest whole-month step from `from` that does not pass `to`, then the
/// remainder as days and time of day.
fn settle_from_anchor(from: NaiveDateTime, to: NaiveDateTime) -> Breakdown {
    let estimate = (i64::from(to.year()) - i64::from(from.year())) * 12
        + (i64::from(to.month()) - i64::from(from.month()));
    let estimate = u32::try_from(estimate).unwrap_or(0);

    let (months, anchor) = (0..=estimate)
        .rev()
        .find_map(|n| {
            add_months(from, n)
                .filter(|anchor| *anchor <= to)
                .map(|anchor| (n, anchor))
        })
        .unwrap_or((0, from));

    let rest = (to - anchor).num_seconds();
    let clock = rest % SECS_PER_DAY;

    Breakdown {
        years: months / 12,
        months: months % 12,
        days: u32::try_from(rest / SECS_PER_DAY).unwrap_or(u32::MAX),
        hours: (clock / 3600) as u32,
        minutes: (clock % 3600 / 60) as u32,
        seconds: (clock % 60) as u32,
    }
}

/// Shifts `instant` by whole months, keeping day and time.
///
/// A day that does not exist in the target month rolls over into the next
/// one (Mar 31 + 1 month → May 1).
pub fn add_months(instant: NaiveDateTime, months: u32) -> Option<NaiveDateTime> {
    let index = i64::from(instant.year()) * 12 + i64::from(instant.month0()) + i64::from(months);
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let date = first.checked_add_days(Days::new(u64::from(instant.day() - 1)))?;
    Some(date.and_time(instant.time()))
}

/// Shifts `instant` by whole calendar years, keeping month, day and time.
///
/// Feb 29 rolls over to Mar 1 in a non-leap year.
pub fn add_years(instant: NaiveDateTime, years: u32) -> Option<NaiveDateTime> {
    add_months(instant, years.checked_mul(12)?)
}

/// Human age, e.g. "34y 0m 12d"
pub fn age_string(age: &Breakdown) -> String {
    format!("{}y {}m {}d", age.years, age.months, age.days)
}

/// Returns number of days in a given year/month (handles leap years)
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30, // should never occur but keeps function total
    }
}

/// Leap-year rule (Gregorian):
///   - divisible by 4 → leap year
///   - except divisible by 100 → not leap year
///   - except divisible by 400 → leap year
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
