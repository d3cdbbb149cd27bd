use std::collections::HashSet;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;

// ---------------------------------------------------------------------------
// Civil date
// ---------------------------------------------------------------------------

/// A calendar date with no time of day, in the observer's civil calendar.
///
/// Years are restricted to `1..=9999` so the `YYYYMMDD` key always fits a
/// `u32` and round-trips through [`CivilDate::from_key`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CivilDate(NaiveDate);

impl CivilDate {
    pub const MIN_YEAR: i32 = 1;
    pub const MAX_YEAR: i32 = 9999;

    /// Returns `None` for an invalid Gregorian date or a year out of range.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        if !(Self::MIN_YEAR..=Self::MAX_YEAR).contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn from_naive(date: NaiveDate) -> Option<Self> {
        Self::from_ymd(date.year(), date.month(), date.day())
    }

    /// Decode a `YYYYMMDD` key. `0` (the "none" key) and malformed keys
    /// return `None`.
    pub fn from_key(key: u32) -> Option<Self> {
        let year = (key / 10_000) as i32;
        let month = (key / 100) % 100;
        let day = key % 100;
        Self::from_ymd(year, month, day)
    }

    /// `year * 10000 + month * 100 + day`.
    pub fn key(&self) -> u32 {
        self.0.year() as u32 * 10_000 + self.0.month() * 100 + self.0.day()
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn weekday(&self) -> Weekday {
        self.0.weekday()
    }

    /// Previous calendar day. Saturates at 0001-01-01.
    pub fn pred(&self) -> Self {
        self.0
            .pred_opt()
            .and_then(Self::from_naive)
            .unwrap_or(*self)
    }

    /// Next calendar day. Saturates at 9999-12-31.
    pub fn succ(&self) -> Self {
        self.0
            .succ_opt()
            .and_then(Self::from_naive)
            .unwrap_or(*self)
    }

    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.year(), self.month())
    }
}

impl fmt::Display for CivilDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Divisible by 400, or by 4 and not by 100.
pub fn is_leap_year(year: i32) -> bool {
    year % 400 == 0 || (year % 4 == 0 && year % 100 != 0)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        _ => 30,
    }
}

// ---------------------------------------------------------------------------
// Holiday sets
// ---------------------------------------------------------------------------

/// Immutable set of holiday dates, stored as `YYYYMMDD` keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HolidaySet {
    keys: HashSet<u32>,
}

impl HolidaySet {
    pub fn contains(&self, date: CivilDate) -> bool {
        self.keys.contains(&date.key())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl FromIterator<CivilDate> for HolidaySet {
    fn from_iter<I: IntoIterator<Item = CivilDate>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(|d| d.key()).collect(),
        }
    }
}

/// The holiday calendars visible to one evaluation.
///
/// `None` means the calendar was not loaded; whether a loaded calendar is
/// consulted is still governed by [`FixingRules`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Holidays<'a> {
    /// Domestic (JP) calendar.
    pub jp: Option<&'a HolidaySet>,
    /// Foreign (US) calendar.
    pub us: Option<&'a HolidaySet>,
}

impl<'a> Holidays<'a> {
    pub fn new(jp: Option<&'a HolidaySet>, us: Option<&'a HolidaySet>) -> Self {
        Self { jp, us }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Candidate-generation and calendar rules for one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixingRules {
    /// Use day 31 as a base day in 31-day months.
    pub include_day31: bool,
    /// Use the last day of February (28/29) as a base day.
    pub include_feb_last_day: bool,
    /// Treat Dec 31 .. Jan 3 as non-business.
    pub exclude_yearend_closure: bool,
    /// Consult the domestic (JP) holiday set.
    pub enable_holiday_jp: bool,
    /// Consult the foreign (US) holiday set.
    pub enable_holiday_us: bool,
}

impl Default for FixingRules {
    fn default() -> Self {
        Self {
            include_day31: true,
            include_feb_last_day: true,
            exclude_yearend_closure: true,
            enable_holiday_jp: true,
            enable_holiday_us: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of testing a single date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixingResult {
    pub found: bool,
    pub date: Option<CivilDate>,
    /// Nominal base day of the matching candidate; 0 when not found.
    pub base_day: u32,
}

impl FixingResult {
    pub fn not_found() -> Self {
        Self {
            found: false,
            date: None,
            base_day: 0,
        }
    }

    pub fn found(date: CivilDate, base_day: u32) -> Self {
        Self {
            found: true,
            date: Some(date),
            base_day,
        }
    }
}

/// Which of the two evaluated dates was the fixing day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FixingWhen {
    Today,
    Tomorrow,
}

impl FixingWhen {
    pub fn as_str(&self) -> &'static str {
        match self {
            FixingWhen::Today => "today",
            FixingWhen::Tomorrow => "tomorrow",
        }
    }
}

/// The authoritative fixing day for a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixingDecision {
    pub date: CivilDate,
    pub base_day: u32,
    pub when: FixingWhen,
}

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// Notification window: `[prev day @ prev_day_start, fixing day @ fixing_end)`
/// in `tz`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowSpec {
    pub tz: Tz,
    pub prev_day_start: NaiveTime,
    pub fixing_end: NaiveTime,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            tz: chrono_tz::Asia::Tokyo,
            prev_day_start: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default(),
            fixing_end: NaiveTime::from_hms_opt(9, 55, 0).unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leap_year_rule() {
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(1900));
        assert!(!is_leap_year(2026));
    }

    #[test]
    fn february_length_follows_leap_rule() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2026, 2), 28);
        assert_eq!(days_in_month(2100, 2), 28);
        assert_eq!(days_in_month(2026, 4), 30);
        assert_eq!(days_in_month(2026, 12), 31);
    }

    #[test]
    fn key_round_trips() {
        let d = CivilDate::from_ymd(2026, 1, 9).unwrap();
        assert_eq!(d.key(), 20260109);
        assert_eq!(CivilDate::from_key(20260109), Some(d));
    }

    #[test]
    fn zero_and_garbage_keys_decode_to_none() {
        assert_eq!(CivilDate::from_key(0), None);
        assert_eq!(CivilDate::from_key(20260230), None);
        assert_eq!(CivilDate::from_key(20261301), None);
    }

    #[test]
    fn invalid_dates_are_rejected() {
        assert!(CivilDate::from_ymd(2026, 2, 29).is_none());
        assert!(CivilDate::from_ymd(2024, 2, 29).is_some());
        assert!(CivilDate::from_ymd(0, 1, 1).is_none());
    }

    #[test]
    fn pred_and_succ_cross_year_boundary() {
        let jan1 = CivilDate::from_ymd(2026, 1, 1).unwrap();
        assert_eq!(jan1.pred(), CivilDate::from_ymd(2025, 12, 31).unwrap());
        assert_eq!(jan1.pred().succ(), jan1);
    }

    #[test]
    fn holiday_set_collapses_duplicates() {
        let d = CivilDate::from_ymd(2026, 5, 5).unwrap();
        let set: HolidaySet = [d, d, d].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert!(set.contains(d));
        assert!(!set.contains(d.succ()));
    }

    #[test]
    fn display_is_iso() {
        let d = CivilDate::from_ymd(2026, 3, 5).unwrap();
        assert_eq!(d.to_string(), "2026-03-05");
    }
}
