//! `--now` parsing.
//!
//! Accepted (space and `T` are interchangeable):
//!
//! | Input                         | Meaning                         |
//! |-------------------------------|---------------------------------|
//! | `2026-01-02 12:34`            | observer zone                   |
//! | `2026-01-02T12:34:56`         | observer zone                   |
//! | `2026-01-02T12:34:56+09:00`   | converted into the observer zone|
//! | `2026-01-02T03:34:56Z`        | UTC, converted                  |
//! | `20260102T1234`               | compact                         |
//! | `202601021234`                | compact                         |
//! | `20260109 4:30`               | compact date, 1-digit hour      |
//! | `2026-01-02`                  | midnight, observer zone         |

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use gtb_fixing::local_instant;

/// Parse `raw` into an instant in `tz`.
pub fn parse_now(raw: &str, tz: Tz) -> Result<DateTime<Tz>> {
    let raw = raw.trim();
    if raw.is_empty() {
        bail!("--now is empty");
    }
    if !raw.is_ascii() {
        bail!("invalid --now format: {raw}");
    }

    let t = canonicalize(raw)?;

    if let Some(dt) = parse_with_offset(&t) {
        return Ok(dt.with_timezone(&tz));
    }

    let naive = parse_naive(&t).with_context(|| format!("invalid --now format: {raw}"))?;
    Ok(local_instant(tz, naive.date(), naive.time()))
}

/// Rewrite the compact spellings into `YYYY-MM-DDTHH:MM[:SS][offset]`.
fn canonicalize(raw: &str) -> Result<String> {
    let t = raw.replace(' ', "T");
    let b = t.as_bytes();
    let date8 = t.len() >= 8 && b[..8].iter().all(u8::is_ascii_digit);

    // YYYYMMDDTH:MM[:SS][Z|±HH:MM]
    if date8 && t.len() >= 10 && b[8] == b'T' && t[9..].contains(':') {
        let (date, rest) = (&t[..8], &t[9..]);
        let (time_part, tz_part) = split_offset(rest);

        let parts: Vec<&str> = time_part.split(':').collect();
        if !(2..=3).contains(&parts.len())
            || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|c| c.is_ascii_digit()))
        {
            bail!("invalid --now time part: {raw}");
        }
        let hh: u32 = parts[0].parse()?;
        let mm: u32 = parts[1].parse()?;
        let ss: Option<u32> = parts.get(2).map(|s| s.parse()).transpose()?;
        if hh > 23 || mm > 59 || ss.is_some_and(|s| s > 59) {
            bail!("invalid --now time range: {raw}");
        }

        let mut out = format!("{}-{}-{}T{hh:02}:{mm:02}", &date[..4], &date[4..6], &date[6..8]);
        if let Some(ss) = ss {
            out.push_str(&format!(":{ss:02}"));
        }
        out.push_str(&tz_part);
        return Ok(out);
    }

    // YYYYMMDDTHHMM
    if t.len() == 13 && date8 && b[8] == b'T' && b[9..].iter().all(u8::is_ascii_digit) {
        return Ok(format!(
            "{}-{}-{}T{}:{}",
            &t[..4],
            &t[4..6],
            &t[6..8],
            &t[9..11],
            &t[11..13]
        ));
    }

    // YYYYMMDDHHMM
    if t.len() == 12 && b.iter().all(u8::is_ascii_digit) {
        return Ok(format!(
            "{}-{}-{}T{}:{}",
            &t[..4],
            &t[4..6],
            &t[6..8],
            &t[8..10],
            &t[10..12]
        ));
    }

    Ok(t)
}

/// Split a trailing `Z` or `±HH:MM` off a time string. `Z` becomes `+00:00`.
fn split_offset(rest: &str) -> (&str, String) {
    if let Some(time) = rest.strip_suffix('Z') {
        return (time, "+00:00".to_string());
    }
    let b = rest.as_bytes();
    for i in 1..b.len() {
        if matches!(b[i], b'+' | b'-') && b[i - 1].is_ascii_digit() {
            return (&rest[..i], rest[i..].to_string());
        }
    }
    (rest, String::new())
}

fn parse_with_offset(t: &str) -> Option<DateTime<chrono::FixedOffset>> {
    let t = match t.strip_suffix('Z') {
        Some(head) => format!("{head}+00:00"),
        None => t.to_string(),
    };
    DateTime::parse_from_rfc3339(&t)
        .or_else(|_| DateTime::parse_from_str(&t, "%Y-%m-%dT%H:%M%:z"))
        .ok()
}

fn parse_naive(t: &str) -> Result<NaiveDateTime> {
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(t, fmt) {
            return Ok(dt);
        }
    }
    let date = NaiveDate::parse_from_str(t, "%Y-%m-%d")?;
    Ok(date.and_time(NaiveTime::default()))
}
