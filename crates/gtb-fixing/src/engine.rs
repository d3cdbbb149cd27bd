//! Fixing-day engine.
//!
//! A month's base days are 5, 10, 15, 20, 25, 30 (when the month has them),
//! optionally 31 and optionally February's last day. Each base day is rolled
//! back to a business day; a target date is a fixing day when one of those
//! normalized dates equals it. The first matching base day in generation
//! order wins.

use crate::calendar::{is_yearend_closure_day, normalize_business_day};
use crate::{
    days_in_month, CivilDate, FixingDecision, FixingResult, FixingRules, FixingWhen, Holidays,
};

const FIXED_BASE_DAYS: [u32; 6] = [5, 10, 15, 20, 25, 30];

/// Base days for (`year`, `month`) in generation order.
///
/// Day 31 is not generated for December when year-end closure is excluded:
/// Dec 31 is itself a closure day and would never survive.
pub fn build_base_days(year: i32, month: u32, rules: &FixingRules) -> Vec<u32> {
    let dim = days_in_month(year, month);
    let mut days: Vec<u32> = FIXED_BASE_DAYS.iter().copied().filter(|d| *d <= dim).collect();

    if rules.include_day31 && dim >= 31 && !(rules.exclude_yearend_closure && month == 12) {
        days.push(31);
    }

    if rules.include_feb_last_day && month == 2 {
        days.push(dim);
    }

    days
}

/// One base-day candidate and where it lands after normalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub base_day: u32,
    pub base_date: CivilDate,
    pub normalized: CivilDate,
    /// Dropped because the normalized date is inside the year-end closure.
    pub excluded: bool,
}

/// Every candidate for (`year`, `month`), including discarded ones.
pub fn explain_month(
    year: i32,
    month: u32,
    holidays: Holidays<'_>,
    rules: &FixingRules,
) -> Vec<Candidate> {
    build_base_days(year, month, rules)
        .into_iter()
        .filter_map(|base_day| {
            let base_date = CivilDate::from_ymd(year, month, base_day)?;
            let normalized = normalize_business_day(base_date, holidays, rules);
            // Checked again after normalization, independently of the
            // classifier. Do not fold into normalize_business_day.
            let excluded = rules.exclude_yearend_closure && is_yearend_closure_day(normalized);
            Some(Candidate {
                base_day,
                base_date,
                normalized,
                excluded,
            })
        })
        .collect()
}

/// Is `target` a fixing day? Returns the base day of the first candidate that
/// normalizes onto it.
pub fn determine_fixing(
    target: CivilDate,
    holidays: Holidays<'_>,
    rules: &FixingRules,
) -> FixingResult {
    explain_month(target.year(), target.month(), holidays, rules)
        .into_iter()
        .find(|c| !c.excluded && c.normalized == target)
        .map(|c| FixingResult::found(target, c.base_day))
        .unwrap_or_else(FixingResult::not_found)
}

/// Today first, then tomorrow. Never looks further ahead.
pub fn choose_fixing_date(
    today: CivilDate,
    holidays: Holidays<'_>,
    rules: &FixingRules,
) -> Option<FixingDecision> {
    let candidates = [(today, FixingWhen::Today), (today.succ(), FixingWhen::Tomorrow)];
    candidates.into_iter().find_map(|(date, when)| {
        let r = determine_fixing(date, holidays, rules);
        r.found.then_some(FixingDecision {
            date,
            base_day: r.base_day,
            when,
        })
    })
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

    #[test]
    fn thirty_day_month_has_fixed_set_only() {
        assert_eq!(
            build_base_days(2026, 4, &FixingRules::default()),
            vec![5, 10, 15, 20, 25, 30]
        );
    }

    #[test]
    fn thirty_one_day_month_adds_31_when_enabled() {
        let rules = FixingRules::default();
        assert_eq!(
            build_base_days(2026, 1, &rules),
            vec![5, 10, 15, 20, 25, 30, 31]
        );

        let no31 = FixingRules {
            include_day31: false,
            ..rules
        };
        assert_eq!(build_base_days(2026, 1, &no31), vec![5, 10, 15, 20, 25, 30]);
    }

    #[test]
    fn december_drops_31_only_when_closure_excluded() {
        let rules = FixingRules::default();
        assert!(!build_base_days(2026, 12, &rules).contains(&31));

        let open = FixingRules {
            exclude_yearend_closure: false,
            ..rules
        };
        assert!(build_base_days(2026, 12, &open).contains(&31));
    }

    #[test]
    fn february_gets_last_day_and_no_30() {
        let rules = FixingRules::default();
        assert_eq!(build_base_days(2026, 2, &rules), vec![5, 10, 15, 20, 25, 28]);
        assert_eq!(build_base_days(2024, 2, &rules), vec![5, 10, 15, 20, 25, 29]);

        let no_feb = FixingRules {
            include_feb_last_day: false,
            ..rules
        };
        assert_eq!(build_base_days(2024, 2, &no_feb), vec![5, 10, 15, 20, 25]);
    }

    #[test]
    fn base_day_set_is_exact_for_every_month() {
        let rules = FixingRules::default();
        for year in [2024, 2025, 2026, 2100] {
            for month in 1..=12u32 {
                let dim = days_in_month(year, month);
                let mut expected: Vec<u32> =
                    FIXED_BASE_DAYS.iter().copied().filter(|x| *x <= dim).collect();
                if dim == 31 && month != 12 {
                    expected.push(31);
                }
                if month == 2 {
                    expected.push(dim);
                }
                assert_eq!(build_base_days(year, month, &rules), expected, "{year}-{month}");
            }
        }
    }

    #[test]
    fn business_base_day_is_its_own_fixing_day() {
        // 2026-01-15 is a Thursday.
        let r = determine_fixing(d(2026, 1, 15), Holidays::none(), &FixingRules::default());
        assert_eq!(r, FixingResult::found(d(2026, 1, 15), 15));
    }

    #[test]
    fn weekend_base_day_moves_fixing_to_friday() {
        // 2026-01-10 Sat -> fixing on Fri 2026-01-09 with base day 10.
        let rules = FixingRules::default();
        let r = determine_fixing(d(2026, 1, 9), Holidays::none(), &rules);
        assert_eq!(r, FixingResult::found(d(2026, 1, 9), 10));
        assert!(!determine_fixing(d(2026, 1, 10), Holidays::none(), &rules).found);
    }

    #[test]
    fn non_candidate_day_is_not_fixing() {
        let r = determine_fixing(d(2026, 1, 14), Holidays::none(), &FixingRules::default());
        assert_eq!(r, FixingResult::not_found());
    }

    #[test]
    fn first_match_wins_when_two_base_days_collapse() {
        // 2026-05-30 is a Saturday and 2026-05-31 a Sunday: both roll back to
        // Fri 2026-05-29. Base day 30 is generated before 31.
        let r = determine_fixing(d(2026, 5, 29), Holidays::none(), &FixingRules::default());
        assert_eq!(r, FixingResult::found(d(2026, 5, 29), 30));
    }

    #[test]
    fn candidate_normalized_into_closure_is_discarded() {
        // With closure off in the classifier the base day 31 of December
        // survives; with it on, day 31 is never generated.
        let open = FixingRules {
            exclude_yearend_closure: false,
            ..FixingRules::default()
        };
        // 2026-12-31 Thursday is a plain business day when closure is off.
        let r = determine_fixing(d(2026, 12, 31), Holidays::none(), &open);
        assert_eq!(r, FixingResult::found(d(2026, 12, 31), 31));

        let closed = FixingRules::default();
        assert!(!determine_fixing(d(2026, 12, 31), Holidays::none(), &closed).found);
    }

    #[test]
    fn capped_rollback_landing_in_closure_is_excluded() {
        // Block the 70 days up to 2028-02-29 (leap-year February last day).
        // Sixty steps back from Feb 29 land exactly on 2027-12-31, which is
        // inside the closure: the candidate must be dropped.
        let mut block = Vec::new();
        let mut cur = d(2028, 2, 29);
        for _ in 0..70 {
            block.push(cur);
            cur = cur.pred();
        }
        let jp: HolidaySet = block.into_iter().collect();
        let holidays = Holidays::new(Some(&jp), None);
        let rules = FixingRules::default();

        let cands = explain_month(2028, 2, holidays, &rules);
        let last = cands.iter().find(|c| c.base_day == 29).unwrap();
        assert_eq!(last.normalized, d(2027, 12, 31));
        assert!(last.excluded);

        let twenty_five = cands.iter().find(|c| c.base_day == 25).unwrap();
        assert_eq!(twenty_five.normalized, d(2027, 12, 27));
        assert!(!twenty_five.excluded);
    }

    #[test]
    fn choose_prefers_today_over_tomorrow() {
        // 2026-01-14 Wed is not fixing; 2026-01-15 Thu is.
        let rules = FixingRules::default();
        let got = choose_fixing_date(d(2026, 1, 14), Holidays::none(), &rules).unwrap();
        assert_eq!(got.date, d(2026, 1, 15));
        assert_eq!(got.when, FixingWhen::Tomorrow);

        // 2026-05-29 (Fri, base 30) is fixing. Tomorrow is Saturday.
        let got = choose_fixing_date(d(2026, 5, 29), Holidays::none(), &rules).unwrap();
        assert_eq!(got.date, d(2026, 5, 29));
        assert_eq!(got.when, FixingWhen::Today);
    }

    #[test]
    fn choose_reports_today_when_both_qualify() {
        // With closure off, 2026-12-30 (Wed, base 30) and 2026-12-31 (Thu,
        // base 31) are consecutive fixing days.
        let open = FixingRules {
            exclude_yearend_closure: false,
            ..FixingRules::default()
        };
        assert!(determine_fixing(d(2026, 12, 31), Holidays::none(), &open).found);
        let got = choose_fixing_date(d(2026, 12, 30), Holidays::none(), &open).unwrap();
        assert_eq!(got.date, d(2026, 12, 30));
        assert_eq!(got.base_day, 30);
        assert_eq!(got.when, FixingWhen::Today);
    }

    #[test]
    fn choose_returns_none_when_neither_day_qualifies() {
        // 2026-01-12 Mon and 2026-01-13 Tue are not fixing days.
        let rules = FixingRules::default();
        assert!(choose_fixing_date(d(2026, 1, 12), Holidays::none(), &rules).is_none());
    }
}
