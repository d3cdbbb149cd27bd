//! Alert text.

use chrono::{DateTime, TimeZone};
use gtb_fixing::{local_instant, CivilDate, WindowSpec};

/// Whole minutes from `now` until the fixing-day cutoff, never negative.
pub fn minutes_until_cutoff<Z: TimeZone>(
    now: &DateTime<Z>,
    fixing_date: CivilDate,
    window: &WindowSpec,
) -> i64 {
    let cutoff = local_instant(window.tz, fixing_date.naive(), window.fixing_end);
    let now = now.with_timezone(&window.tz);
    (cutoff - now).num_minutes().max(0)
}

/// One-line alert naming the fixing date, its base day and the time left
/// until the cutoff.
///
/// `[Gotobi fixing] Asia/Tokyo 2026/12/30 (base day 30): 23h 50m left until the 09:55 fixing.`
pub fn build_message<Z: TimeZone>(
    now: &DateTime<Z>,
    fixing_date: CivilDate,
    base_day: u32,
    window: &WindowSpec,
) -> String {
    let remaining = minutes_until_cutoff(now, fixing_date, window);
    let (hours, mins) = (remaining / 60, remaining % 60);
    format!(
        "[Gotobi fixing] {} {} (base day {}): {}h {:02}m left until the {} fixing.",
        window.tz.name(),
        fixing_date.naive().format("%Y/%m/%d"),
        base_day,
        hours,
        mins,
        window.fixing_end.format("%H:%M"),
    )
}
