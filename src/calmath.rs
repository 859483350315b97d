//! Calendar arithmetic used by the picker's grids and navigation
use std::iter::successors;
use std::ops::RangeInclusive;
use time::{Date, Month, Weekday};

pub(crate) const DAYS_IN_WEEK: usize = 7;

/// Number of years shown at once in the year grid
pub const YEAR_WINDOW_LEN: i32 = 20;

/// Position of the cursor year within the year grid (zero-based)
const YEAR_WINDOW_OFFSET: i32 = 10;

/// Extension methods on [`time::Weekday`]
pub trait WeekdayExt {
    /// Index of the weekday in a Sunday-first week (Sunday = 0, Saturday = 6)
    fn index0(&self) -> u16;
}

impl WeekdayExt for Weekday {
    fn index0(&self) -> u16 {
        self.number_days_from_sunday().into()
    }
}

/// Returns the number of days in the given month of the given year.
pub fn days_in_month(year: i32, month: Month) -> u8 {
    month.length(year)
}

/// Returns the weekday on which the given month begins.
///
/// Years outside the range supported by [`time::Date`] are clamped into it.
pub fn first_weekday_of_month(year: i32, month: Month) -> Weekday {
    first_of_month(year, month).weekday()
}

/// Returns the first day of the given month, clamping `year` into the range
/// supported by [`time::Date`]
pub(crate) fn first_of_month(year: i32, month: Month) -> Date {
    Date::from_calendar_date(clamp_year(year), month, 1).unwrap_or(if year < 0 {
        Date::MIN
    } else {
        Date::MAX
    })
}

/// Returns the last day of the given month, clamping `year` into the range
/// supported by [`time::Date`]
pub(crate) fn last_of_month(year: i32, month: Month) -> Date {
    let year = clamp_year(year);
    Date::from_calendar_date(year, month, days_in_month(year, month)).unwrap_or(Date::MAX)
}

pub(crate) fn clamp_year(year: i32) -> i32 {
    year.clamp(Date::MIN.year(), Date::MAX.year())
}

/// Moves `delta` months away from `year`-`month`, carrying into the year on
/// overflow and underflow.  Steps that would leave the range supported by
/// [`time::Date`] leave the month where it is.
pub fn step_month(year: i32, month: Month, delta: i32) -> (i32, Month) {
    let index = i32::from(u8::from(month)) - 1 + delta;
    let new_year = year.saturating_add(index.div_euclid(12));
    if new_year != clamp_year(new_year) {
        return (clamp_year(year), month);
    }
    let new_month = u8::try_from(index.rem_euclid(12) + 1)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .unwrap_or(month);
    (new_year, new_month)
}

/// Moves `delta` years away from `year`, saturating at the range supported by
/// [`time::Date`]
pub fn step_year(year: i32, delta: i32) -> i32 {
    clamp_year(year.saturating_add(delta))
}

/// Returns the twenty consecutive years displayed in the year grid, arranged
/// so that `year` is the eleventh entry
pub fn year_window(year: i32) -> RangeInclusive<i32> {
    let start = year.saturating_sub(YEAR_WINDOW_OFFSET);
    start..=start.saturating_add(YEAR_WINDOW_LEN - 1)
}

/// One row of a month's day grid.  Cells outside the month are `None`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Week(pub [Option<u8>; DAYS_IN_WEEK]);

impl Week {
    fn empty() -> Week {
        Week([None; DAYS_IN_WEEK])
    }

    /// Iterates over the days present in this week along with their column
    pub fn days(&self) -> impl Iterator<Item = (u16, u8)> + '_ {
        std::iter::zip(0u16.., self.0.iter()).filter_map(|(i, d)| d.map(|d| (i, d)))
    }
}

/// Lays out the days of a month as Sunday-first weeks
pub fn month_weeks(year: i32, month: Month) -> Vec<Week> {
    let first = first_of_month(year, month);
    let mut weeks = Vec::with_capacity(6);
    let mut week = Week::empty();
    for date in successors(Some(first), |d| d.next_day()).take_while(|d| d.month() == month) {
        let col = usize::from(date.weekday().index0());
        if let Some(cell) = week.0.get_mut(col) {
            *cell = Some(date.day());
        }
        if date.weekday() == Weekday::Saturday {
            weeks.push(std::mem::replace(&mut week, Week::empty()));
        }
    }
    if week.0.iter().any(Option::is_some) {
        weeks.push(week);
    }
    weeks
}
