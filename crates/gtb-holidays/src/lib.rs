//! Holiday-list ingestion.
//!
//! Reads one loosely formatted CSV file per calendar and produces a
//! [`HolidaySet`]. This crate is the **read** side only; what counts as a
//! business day is decided in `gtb-fixing`.
//!
//! ## File contract
//!
//! | Rule                         | Example                          |
//! |------------------------------|----------------------------------|
//! | Blank lines skipped          |                                  |
//! | Line comments skipped        | `# 2026`, `// US`                |
//! | Inline comments stripped     | `2026-01-01  # New Year's Day`   |
//! | `,` `\t` `;` are delimiters  | `2026-01-01;2026-01-12`          |
//! | Every date-like field counts | `2026-01-01,元日` keeps the date |
//!
//! Accepted date fields: `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY.MM.DD`,
//! `YYYYMMDD`. Year must be after 1900. Anything else on a line (names,
//! headers, malformed dates) is ignored.
//!
//! A missing file, or a file with no valid date at all, is an input error.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use gtb_fixing::{CivilDate, HolidaySet};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced while loading a holiday file.
#[derive(Debug)]
pub enum HolidayLoadError {
    /// The file does not exist.
    NotFound(PathBuf),
    /// The file exists but could not be read or decoded.
    Io { path: PathBuf, message: String },
    /// The file was read but contains no valid date.
    Empty(PathBuf),
}

impl fmt::Display for HolidayLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HolidayLoadError::NotFound(p) => {
                write!(f, "holiday file not found: {}", p.display())
            }
            HolidayLoadError::Io { path, message } => {
                write!(f, "holiday file read failed: {}: {message}", path.display())
            }
            HolidayLoadError::Empty(p) => {
                write!(f, "no valid holiday dates found in: {}", p.display())
            }
        }
    }
}

impl std::error::Error for HolidayLoadError {}

// ---------------------------------------------------------------------------
// Token parsing
// ---------------------------------------------------------------------------

/// Parse one field as a date. Returns `None` for anything that is not a
/// valid date after 1900.
pub fn parse_holiday_token(token: &str) -> Option<CivilDate> {
    let digits: String = token
        .trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '/' | '.'))
        .collect();
    if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let year: i32 = digits[0..4].parse().ok()?;
    let month: u32 = digits[4..6].parse().ok()?;
    let day: u32 = digits[6..8].parse().ok()?;
    if year <= 1900 {
        return None;
    }
    CivilDate::from_ymd(year, month, day)
}

/// Drop comments and fold the alternative delimiters into `,`.
fn clean_line(raw: &str) -> Option<String> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
        return None;
    }
    let line = line.split('#').next().unwrap_or("");
    let line = line.split("//").next().unwrap_or("").trim();
    if line.is_empty() {
        return None;
    }
    Some(line.replace(['\t', ';'], ","))
}

/// Every valid date in `text`, in file order, duplicates included.
///
/// Lines are read independently and quotes are not special, so a stray `"`
/// can only cost its own line. Quotes wrapping a token are dropped.
pub fn parse_holiday_text(text: &str) -> Vec<CivilDate> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut out = Vec::new();
    for line in text.lines().filter_map(clean_line) {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(csv::Trim::All)
            .from_reader(line.as_bytes());

        for record in rdr.records() {
            let Ok(record) = record else { continue };
            out.extend(
                record
                    .iter()
                    .map(|field| field.trim_matches('"'))
                    .filter_map(parse_holiday_token),
            );
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Build a set from in-memory text. `source` is used in the error only.
pub fn load_holiday_set_from_str(
    text: &str,
    source: &Path,
) -> Result<HolidaySet, HolidayLoadError> {
    let set: HolidaySet = parse_holiday_text(text).into_iter().collect();
    if set.is_empty() {
        return Err(HolidayLoadError::Empty(source.to_path_buf()));
    }
    Ok(set)
}

/// Load a holiday file (UTF-8).
pub fn load_holiday_set(path: &Path) -> Result<HolidaySet, HolidayLoadError> {
    if !path.exists() {
        return Err(HolidayLoadError::NotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|e| HolidayLoadError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    load_holiday_set_from_str(&text, path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> CivilDate {
        CivilDate::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn token_formats() {
        assert_eq!(parse_holiday_token("2026-01-12"), Some(d(2026, 1, 12)));
        assert_eq!(parse_holiday_token("2026/01/12"), Some(d(2026, 1, 12)));
        assert_eq!(parse_holiday_token("2026.01.12"), Some(d(2026, 1, 12)));
        assert_eq!(parse_holiday_token(" 20260112 "), Some(d(2026, 1, 12)));
    }

    #[test]
    fn token_rejects_bad_values() {
        assert_eq!(parse_holiday_token("2026-02-29"), None);
        assert_eq!(parse_holiday_token("2026-13-01"), None);
        assert_eq!(parse_holiday_token("1900-01-01"), None);
        assert_eq!(parse_holiday_token("2026-1-12"), None);
        assert_eq!(parse_holiday_token("date"), None);
        assert_eq!(parse_holiday_token(""), None);
    }

    #[test]
    fn comments_and_delimiters() {
        let text = "\
# Japan 2026
// generated
date,name
2026-01-01,元日
2026-01-12\t成人の日  # Coming of Age Day
2026-02-11;2026-02-23 // two on one line

";
        let got = parse_holiday_text(text);
        assert_eq!(
            got,
            vec![d(2026, 1, 1), d(2026, 1, 12), d(2026, 2, 11), d(2026, 2, 23)]
        );
    }

    #[test]
    fn quoted_fields_are_read() {
        let got = parse_holiday_text("\"2026-07-03\",\"Independence Day (observed)\"\n");
        assert_eq!(got, vec![d(2026, 7, 3)]);
    }

    #[test]
    fn unbalanced_quote_only_affects_its_line() {
        let got = parse_holiday_text(
            "2026-11-26,\"Thanksgiving\n2026-12-25,Christmas\n2027-01-01,New Year\n",
        );
        assert_eq!(got, vec![d(2026, 11, 26), d(2026, 12, 25), d(2027, 1, 1)]);
    }

    #[test]
    fn bom_is_ignored() {
        let got = parse_holiday_text("\u{feff}2026-01-01\n");
        assert_eq!(got, vec![d(2026, 1, 1)]);
    }

    #[test]
    fn duplicates_collapse_in_set() {
        let set = load_holiday_set_from_str("2026-01-01\n20260101\n", Path::new("mem")).unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn text_without_dates_is_empty_error() {
        let err = load_holiday_set_from_str("# nothing\nname\n", Path::new("mem")).unwrap_err();
        assert!(matches!(err, HolidayLoadError::Empty(_)));
        assert!(err.to_string().contains("no valid holiday dates"));
    }
}
