//! Free-text parsers for values scraped out of the portal.

use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;

use crate::vocabulary::StatusKeyword;

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([0-9]{1,2}):([0-9]{2})$").unwrap());
static TIME_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[0-9]{1,2}:[0-9]{2}\b").unwrap());
static DAY_MONTH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]{1,2})/([0-9]{1,2})").unwrap());

/// Parse a strict `H:MM` / `HH:MM` time.
///
/// Placeholders (`--:--`), blanks, NBSP-only text and out-of-range values all
/// yield `None`.
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let caps = TIME_RE.captures(text.trim())?;
    let hour = caps[1].parse().ok()?;
    let minute = caps[2].parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Detect a special-day status keyword anywhere in `text`.
pub fn detect_status(text: &str) -> Option<StatusKeyword> {
    StatusKeyword::detect_in(text)
}

/// Every valid bare time token in free text, in order of appearance.
pub fn time_tokens(text: &str) -> Vec<NaiveTime> {
    TIME_TOKEN_RE
        .find_iter(text)
        .filter_map(|m| parse_time(m.as_str()))
        .collect()
}

/// First `D/M` pair in text, as (day, month).
pub fn parse_day_month(text: &str) -> Option<(u32, u32)> {
    let caps = DAY_MONTH_RE.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    ((1..=31).contains(&day) && (1..=12).contains(&month)).then_some((day, month))
}

/// Parse a whole-text day number ("7", " 21 ").
pub fn parse_day_number(text: &str) -> Option<u32> {
    let text = text.trim();
    if text.is_empty() || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Format a time the way the portal's inputs expect it.
pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}
