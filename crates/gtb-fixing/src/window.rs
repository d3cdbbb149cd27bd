//! Notification window.
//!
//! `[fixing_date - 1 @ prev_day_start, fixing_date @ fixing_end)` in the
//! observer time zone. Start inclusive, end exclusive.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, Offset, TimeZone};
use chrono_tz::Tz;

use crate::{CivilDate, WindowSpec};

/// Resolve a wall-clock time in `tz` to an instant.
///
/// Ambiguous times (DST fall-back) take the earliest instant. Non-existent
/// times (DST gap) are read with the offset in effect before the gap, which
/// moves them forward by the gap length (02:30 becomes 03:30 for a one-hour
/// spring-forward), east or west of UTC alike.
pub fn local_instant(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Tz> {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            // A day earlier is before the transition for every UTC offset.
            let before = tz.offset_from_utc_datetime(&(naive - Duration::days(1))).fix();
            tz.from_utc_datetime(&(naive - before))
        }
    }
}

/// `(start, end)` instants of the window for `fixing_date`.
pub fn window_bounds(fixing_date: CivilDate, spec: &WindowSpec) -> (DateTime<Tz>, DateTime<Tz>) {
    let prev = fixing_date.pred();
    let start = local_instant(spec.tz, prev.naive(), spec.prev_day_start);
    let end = local_instant(spec.tz, fixing_date.naive(), spec.fixing_end);
    (start, end)
}

pub fn in_notify_window<Z: TimeZone>(
    now: &DateTime<Z>,
    fixing_date: CivilDate,
    spec: &WindowSpec,
) -> bool {
    let (start, end) = window_bounds(fixing_date, spec);
    let now = now.with_timezone(&spec.tz);
    start <= now && now < end
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
