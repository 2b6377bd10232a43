//! Document dates.
//!
//! A post's date comes from, in order: its `date` option, a `YYYY-MM-DD-`
//! file name prefix, or the file's modification time.

use chrono::{DateTime, Local, NaiveDate};
use regex::Regex;
use std::{fs, path::Path, sync::LazyLock};

static DATE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})-(.+)$").unwrap());

/// Split `2024-03-01-hello` into its date and the remaining `hello`.
///
/// Stems without a valid date prefix are returned whole.
pub fn split_date_prefix(stem: &str) -> (Option<NaiveDate>, &str) {
    let Some(caps) = DATE_PREFIX.captures(stem) else {
        return (None, stem);
    };

    let parse = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let date = match (caps.get(1), parse(2), parse(3)) {
        (Some(year), Some(month), Some(day)) => year
            .as_str()
            .parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, month, day)),
        _ => None,
    };

    match (date, caps.get(4)) {
        (Some(date), Some(rest)) => (Some(date), rest.as_str()),
        _ => (None, stem),
    }
}

/// Date of the document at `path`.
pub fn derive_date(path: &Path, option: Option<NaiveDate>) -> NaiveDate {
    if let Some(date) = option {
        return date;
    }

    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    if let (Some(date), _) = split_date_prefix(&stem) {
        return date;
    }

    modified_date(path).unwrap_or_else(today)
}

fn modified_date(path: &Path) -> Option<NaiveDate> {
    let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok()?;
    Some(DateTime::<Local>::from(modified).date_naive())
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `YYYY-MM-DD`, the form dates take in templates.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
