//! `gotobi check`: read-only fixing-day diagnostics for one date.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use gtb_fixing::{
    choose_fixing_date, determine_fixing, explain_month, CivilDate, HolidaySet, Holidays,
};

use super::load_notifier_config;

pub struct CheckArgs {
    pub date: String,
    pub config_paths: Vec<String>,
    pub jp: Option<PathBuf>,
    pub us: Option<PathBuf>,
}

fn load_if_enabled(enabled: bool, path: &Path) -> Result<Option<HolidaySet>> {
    if !enabled {
        return Ok(None);
    }
    let set = gtb_holidays::load_holiday_set(path)?;
    Ok(Some(set))
}

/// Print the determination for `--date` and the month's candidates.
pub fn check_cmd(args: &CheckArgs) -> Result<()> {
    let naive = NaiveDate::parse_from_str(args.date.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid --date '{}'. expected YYYY-MM-DD", args.date))?;
    let date = CivilDate::from_naive(naive)
        .with_context(|| format!("--date out of range: {}", args.date))?;

    let mut cfg = load_notifier_config(&args.config_paths, false)?;
    if let Some(p) = &args.jp {
        cfg.holidays.jp.path = p.clone();
    }
    if let Some(p) = &args.us {
        cfg.holidays.us.path = p.clone();
    }
    let rules = cfg.fixing_rules();

    let jp = load_if_enabled(cfg.holidays.jp.enabled, &cfg.holidays.jp.path)?;
    let us = load_if_enabled(cfg.holidays.us.enabled, &cfg.holidays.us.path)?;
    let holidays = Holidays::new(jp.as_ref(), us.as_ref());

    let r = determine_fixing(date, holidays, &rules);
    println!(
        "date={} fixing={} base_day={}",
        date,
        r.found,
        if r.found { r.base_day.to_string() } else { "-".to_string() }
    );

    match choose_fixing_date(date, holidays, &rules) {
        Some(d) => println!(
            "next_fixing={} base_day={} when={}",
            d.date,
            d.base_day,
            d.when.as_str()
        ),
        None => println!("next_fixing=none"),
    }

    println!("candidates {:04}-{:02}:", date.year(), date.month());
    for c in explain_month(date.year(), date.month(), holidays, &rules) {
        println!(
            "  base={:<2} base_date={} normalized={} excluded={}",
            c.base_day, c.base_date, c.normalized, c.excluded
        );
    }
    Ok(())
}
