//! Business-day calendar.
//!
//! A date is non-business when any of these holds:
//! - it is a Saturday or Sunday,
//! - it is in an enabled holiday set (JP and US toggle independently),
//! - year-end closure is enabled and the date is Dec 31 or Jan 1..=3.
//!
//! [`normalize_business_day`] rolls a date back to the nearest business day
//! with a hard cap of [`MAX_ROLLBACK_DAYS`] steps.

use chrono::Weekday;

use crate::{CivilDate, FixingRules, Holidays};

/// Upper bound on backward steps during normalization. A holiday
/// configuration that blocks this many consecutive days yields the date
/// reached at the last step instead of looping.
pub const MAX_ROLLBACK_DAYS: u32 = 60;

pub fn is_weekend(date: CivilDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Dec 31 or Jan 1..=3, independent of weekday.
pub fn is_yearend_closure_day(date: CivilDate) -> bool {
    (date.month() == 12 && date.day() == 31) || (date.month() == 1 && date.day() <= 3)
}

fn is_holiday(date: CivilDate, holidays: Holidays<'_>, rules: &FixingRules) -> bool {
    let jp = rules.enable_holiday_jp && holidays.jp.is_some_and(|set| set.contains(date));
    let us = rules.enable_holiday_us && holidays.us.is_some_and(|set| set.contains(date));
    jp || us
}

pub fn is_non_business_day(date: CivilDate, holidays: Holidays<'_>, rules: &FixingRules) -> bool {
    is_weekend(date)
        || is_holiday(date, holidays, rules)
        || (rules.exclude_yearend_closure && is_yearend_closure_day(date))
}

/// Roll `date` back to the nearest business day (`date` itself if it already
/// is one). Never moves forward.
pub fn normalize_business_day(
    date: CivilDate,
    holidays: Holidays<'_>,
    rules: &FixingRules,
) -> CivilDate {
    let mut cur = date;
    for _ in 0..MAX_ROLLBACK_DAYS {
        if !is_non_business_day(cur, holidays, rules) {
            return cur;
        }
        cur = cur.pred();
    }
    cur
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HolidaySet;

    fn d(y: i32, m: u32, day: u32) -> CivilDate {
        CivilDate::from_ymd(y, m, day).unwrap()
    }

    fn set(dates: &[CivilDate]) -> HolidaySet {
        dates.iter().copied().collect()
    }

    #[test]
    fn weekend_is_non_business_under_any_config() {
        let sat = d(2026, 1, 10);
        let sun = d(2026, 1, 11);
        let no_rules = FixingRules {
            include_day31: false,
            include_feb_last_day: false,
            exclude_yearend_closure: false,
            enable_holiday_jp: false,
            enable_holiday_us: false,
        };
        for rules in [FixingRules::default(), no_rules] {
            assert!(is_non_business_day(sat, Holidays::none(), &rules));
            assert!(is_non_business_day(sun, Holidays::none(), &rules));
        }
    }

    #[test]
    fn plain_weekday_is_business() {
        // 2026-01-14 is a Wednesday.
        assert!(!is_non_business_day(
            d(2026, 1, 14),
            Holidays::none(),
            &FixingRules::default()
        ));
    }

    #[test]
    fn disabled_calendar_contributes_nothing() {
        let jp = set(&[d(2026, 1, 12)]);
        let mut rules = FixingRules::default();
        assert!(is_non_business_day(
            d(2026, 1, 12),
            Holidays::new(Some(&jp), None),
            &rules
        ));

        rules.enable_holiday_jp = false;
        assert!(!is_non_business_day(
            d(2026, 1, 12),
            Holidays::new(Some(&jp), None),
            &rules
        ));
    }

    #[test]
    fn us_calendar_is_consulted_independently() {
        let us = set(&[d(2026, 1, 19)]);
        let rules = FixingRules {
            enable_holiday_jp: false,
            ..FixingRules::default()
        };
        assert!(is_non_business_day(
            d(2026, 1, 19),
            Holidays::new(None, Some(&us)),
            &rules
        ));
    }

    #[test]
    fn closure_range_follows_flag() {
        let rules = FixingRules::default();
        // 2025-12-31 Wed, 2026-01-02 Fri: weekdays inside the closure.
        assert!(is_non_business_day(d(2025, 12, 31), Holidays::none(), &rules));
        assert!(is_non_business_day(d(2026, 1, 2), Holidays::none(), &rules));
        // 2025-12-30 Tue, 2026-01-05 Mon: outside.
        assert!(!is_non_business_day(d(2025, 12, 30), Holidays::none(), &rules));
        assert!(!is_non_business_day(d(2026, 1, 5), Holidays::none(), &rules));

        let open = FixingRules {
            exclude_yearend_closure: false,
            ..rules
        };
        assert!(!is_non_business_day(d(2025, 12, 31), Holidays::none(), &open));
    }

    #[test]
    fn normalize_returns_business_day_unchanged() {
        let wed = d(2026, 1, 14);
        assert_eq!(
            normalize_business_day(wed, Holidays::none(), &FixingRules::default()),
            wed
        );
    }

    #[test]
    fn normalize_rolls_weekend_back_to_friday() {
        // 2026-01-10 Sat -> 2026-01-09 Fri
        assert_eq!(
            normalize_business_day(d(2026, 1, 10), Holidays::none(), &FixingRules::default()),
            d(2026, 1, 9)
        );
    }

    #[test]
    fn normalize_is_idempotent_and_never_moves_forward() {
        let jp = set(&[d(2026, 5, 4), d(2026, 5, 5), d(2026, 5, 6)]);
        let holidays = Holidays::new(Some(&jp), None);
        let rules = FixingRules::default();

        let mut cur = d(2025, 12, 1);
        while cur <= d(2027, 1, 31) {
            let once = normalize_business_day(cur, holidays, &rules);
            assert!(once <= cur, "{cur} moved forward to {once}");
            assert_eq!(normalize_business_day(once, holidays, &rules), once);
            cur = cur.succ();
        }
    }

    #[test]
    fn normalize_stops_at_rollback_cap() {
        // Every day for ~100 days is a holiday.
        let mut all = Vec::new();
        let mut cur = d(2026, 3, 31);
        for _ in 0..100 {
            all.push(cur);
            cur = cur.pred();
        }
        let jp = set(&all);
        let start = d(2026, 3, 31);
        let got = normalize_business_day(
            start,
            Holidays::new(Some(&jp), None),
            &FixingRules::default(),
        );

        let mut expected = start;
        for _ in 0..MAX_ROLLBACK_DAYS {
            expected = expected.pred();
        }
        assert_eq!(got, expected);
    }
}
