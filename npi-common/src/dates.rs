//! Date cell parsing for spreadsheet exports
//!
//! Sheets carry dates typed by hand: `05-Mar`, `05-03`, `5/3/2025`,
//! `2025-03-05 00:00:00`. Parsing is day-first, and a cell without a year
//! takes the year of the reference date. Anything unrecognized is absent,
//! never an error.

use chrono::{Month, NaiveDate};

/// Short display form used in tracker tables (`05-Mar`)
pub const DAY_MONTH_FORMAT: &str = "%d-%b";

/// Long display form used where the year matters (`05-Mar-2025`)
pub const DAY_MONTH_YEAR_FORMAT: &str = "%d-%b-%Y";

/// Parse a date cell
///
/// # Arguments
/// * `cell` - Raw cell text (already trimmed or not)
/// * `placeholder` - Tracker placeholder token; treated as absent
/// * `year` - Calendar year appended when the cell has none
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use npi_common::dates::parse_date_cell;
///
/// // Day-first: 5 March, not May 3
/// assert_eq!(
///     parse_date_cell("05-03", "—", 2025),
///     NaiveDate::from_ymd_opt(2025, 3, 5)
/// );
/// assert_eq!(parse_date_cell("—", "—", 2025), None);
/// ```
pub fn parse_date_cell(cell: &str, placeholder: &str, year: i32) -> Option<NaiveDate> {
    let text = cell.trim();
    if text.is_empty() || text == placeholder {
        return None;
    }

    // Drop a time-of-day suffix: "2025-03-05 00:00:00", "5/3/2025 9:30 AM"
    let date_text = text
        .split_whitespace()
        .filter_map(|token| match token.split_once('T') {
            Some((head, tail)) if tail.contains(':') => Some(head),
            _ if token.contains(':') || is_meridiem(token) => None,
            _ => Some(token),
        })
        .collect::<Vec<_>>()
        .join(" ");

    let parts: Vec<&str> = date_text
        .split(|c: char| c.is_whitespace() || matches!(c, '-' | '/' | '.' | ','))
        .filter(|part| !part.is_empty())
        .collect();

    match parts.as_slice() {
        [first, second] => resolve(first, second, &year.to_string()),
        [first, second, third] => resolve(first, second, third),
        _ => None,
    }
}

/// Format an optional date, falling back to the placeholder
pub fn format_date(date: Option<NaiveDate>, format: &str, placeholder: &str) -> String {
    match date {
        Some(date) => date.format(format).to_string(),
        None => placeholder.to_string(),
    }
}

fn resolve(first: &str, second: &str, third: &str) -> Option<NaiveDate> {
    // ISO order only when the leading part is a four-digit year
    if first.len() == 4 && is_digits(first) {
        let year = first.parse().ok()?;
        let month = month_number(second)?;
        let day = third.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let year = parse_year(third)?;

    if let Some(month) = month_name(first) {
        let day = parse_day(second)?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let day = parse_day(first)?;
    let month = month_number(second)?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_day(text: &str) -> Option<u32> {
    if is_digits(text) && text.len() <= 2 {
        text.parse().ok()
    } else {
        None
    }
}

fn month_number(text: &str) -> Option<u32> {
    if is_digits(text) && text.len() <= 2 {
        text.parse().ok()
    } else {
        month_name(text)
    }
}

fn month_name(text: &str) -> Option<u32> {
    if !text.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    text.parse::<Month>().ok().map(|m| m.number_from_month())
}

fn parse_year(text: &str) -> Option<i32> {
    if !is_digits(text) {
        return None;
    }
    match text.len() {
        2 => text.parse::<i32>().ok().map(|yy| 2000 + yy),
        4 => text.parse().ok(),
        _ => None,
    }
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

fn is_meridiem(token: &str) -> bool {
    token.eq_ignore_ascii_case("am") || token.eq_ignore_ascii_case("pm")
}
