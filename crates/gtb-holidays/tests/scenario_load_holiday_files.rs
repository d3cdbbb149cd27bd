//! Holiday files on disk: happy path and the two input errors.

use std::fs;

use gtb_fixing::{normalize_business_day, CivilDate, FixingRules, Holidays};
use gtb_holidays::{load_holiday_set, HolidayLoadError};

fn d(y: i32, m: u32, day: u32) -> CivilDate {
    CivilDate::from_ymd(y, m, day).unwrap()
}

#[test]
fn loaded_set_drives_normalization() {
    let dir = tempfile::tempdir().unwrap();
    let jp_path = dir.path().join("jp_holidays.csv");
    let us_path = dir.path().join("fed_bank_holidays.csv");
    fs::write(&jp_path, "date,name\n2026-05-04,みどりの日\n2026-05-05,こどもの日\n").unwrap();
    fs::write(&us_path, "2026-05-25 # Memorial Day\n").unwrap();

    let jp = load_holiday_set(&jp_path).unwrap();
    let us = load_holiday_set(&us_path).unwrap();
    assert_eq!(jp.len(), 2);
    assert_eq!(us.len(), 1);

    let holidays = Holidays::new(Some(&jp), Some(&us));
    let rules = FixingRules::default();

    // 2026-05-05 Tue (JP holiday) -> Mon 05-04 (JP holiday) -> Sun -> Sat -> Fri 05-01.
    assert_eq!(normalize_business_day(d(2026, 5, 5), holidays, &rules), d(2026, 5, 1));
    // 2026-05-25 Mon (US holiday) -> Fri 05-22.
    assert_eq!(normalize_business_day(d(2026, 5, 25), holidays, &rules), d(2026, 5, 22));
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_holiday_set(&dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(err, HolidayLoadError::NotFound(_)));
}

#[test]
fn file_without_dates_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("empty.csv");
    fs::write(&p, "# placeholder\n\nname,comment\n").unwrap();
    let err = load_holiday_set(&p).unwrap_err();
    assert!(matches!(err, HolidayLoadError::Empty(_)));
}

#[test]
fn stray_quote_does_not_hide_later_holidays() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fed_bank_holidays.csv");
    fs::write(
        &path,
        "2026-11-26,\"Thanksgiving\n2026-12-25,Christmas\n2027-01-01,New Year\n",
    )
    .unwrap();

    let set = load_holiday_set(&path).unwrap();
    assert_eq!(set.len(), 3);
    assert!(set.contains(d(2026, 12, 25)));
    assert!(set.contains(d(2027, 1, 1)));
}
