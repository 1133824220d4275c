//! Hebrew UI vocabulary of the Hilan portal.
//!
//! All labels the automation matches against live here. They are the vendor's
//! markup contract, not translations, and must be kept byte-exact.

use std::fmt;

/// Button captions (matched against `input[value=...]`).
pub mod buttons {
    pub const CLEAR: &str = "ניקוי";
    pub const SELECTED_DAYS: &str = "ימים נבחרים";
    pub const SAVE: &str = "שמירה";
}

/// Fragments of `aria-label` attributes on detail-form controls.
pub mod aria {
    pub const ENTRY: &str = "כניסה";
    pub const EXIT: &str = "יציאה";
    pub const REPORT_TYPE: &str = "סוג דיווח";
}

/// Texts the portal renders into detail rows and notices.
pub mod notices {
    pub const MISSING_ENTRY: &str = "חסרה כניסה";
    pub const MISSING_EXIT: &str = "חסרה יציאה";
    /// Shown when "selected days" is pressed with an empty selection.
    pub const NO_DAYS_SELECTED: &str = "יש לבחור לפחות יום אחד";
}

/// Hebrew month names, January first.
pub const HEBREW_MONTHS: [&str; 12] = [
    "ינואר", "פברואר", "מרץ", "אפריל", "מאי", "יוני", "יולי", "אוגוסט", "ספטמבר", "אוקטובר", "נובמבר", "דצמבר",
];

/// English month names, January first.
pub const ENGLISH_MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Hebrew name for a month number (1-12).
pub fn hebrew_month(month: u32) -> Option<&'static str> {
    HEBREW_MONTHS.get((month as usize).checked_sub(1)?).copied()
}

/// Month number for a Hebrew month name.
pub fn month_from_hebrew(name: &str) -> Option<u32> {
    HEBREW_MONTHS
        .iter()
        .position(|m| *m == name.trim())
        .map(|i| i as u32 + 1)
}

/// Parse a month given as a number (1-12) or an unambiguous English prefix.
pub fn parse_month(value: &str) -> Result<u32, String> {
    let value = value.trim();
    if let Ok(num) = value.parse::<u32>() {
        return if (1..=12).contains(&num) {
            Ok(num)
        } else {
            Err(format!("Month must be 1-12, got {num}"))
        };
    }

    let lower = value.to_lowercase();
    if lower.is_empty() {
        return Err("Month cannot be empty".to_string());
    }
    let matches: Vec<usize> = ENGLISH_MONTHS
        .iter()
        .enumerate()
        .filter(|(_, name)| name.starts_with(&lower))
        .map(|(i, _)| i)
        .collect();

    match matches.as_slice() {
        [single] => Ok(*single as u32 + 1),
        [] => Err(format!("Unknown month '{value}'")),
        many => {
            let names: Vec<&str> = many.iter().map(|&i| ENGLISH_MONTHS[i]).collect();
            Err(format!("Ambiguous month '{value}' - matches: {}", names.join(", ")))
        }
    }
}

/// Special-day status shown in place of a time in the calendar grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKeyword {
    Sick,
    Vacation,
    HalfVacation,
    Holiday,
    ReserveDuty,
    Training,
    Bereavement,
}

/// Markers in scan order; the first hit wins. "Half vacation" precedes
/// "vacation" because it contains it. Short markers that also occur inside
/// other words only match as a whole word.
const STATUS_MARKERS: &[(&str, StatusKeyword, Match)] = &[
    ("חצי חופשה", StatusKeyword::HalfVacation, Match::Substring),
    ("מחלה", StatusKeyword::Sick, Match::Substring),
    ("חופשה", StatusKeyword::Vacation, Match::Substring),
    ("חופש", StatusKeyword::Vacation, Match::Substring),
    ("חג", StatusKeyword::Holiday, Match::Word),
    ("מילואים", StatusKeyword::ReserveDuty, Match::Substring),
    ("השתלמות", StatusKeyword::Training, Match::Substring),
    ("אבל", StatusKeyword::Bereavement, Match::Word),
];

#[derive(Debug, Clone, Copy)]
enum Match {
    Substring,
    Word,
}

/// `word` occurs in `text` with no letter directly before or after it.
fn contains_word(text: &str, word: &str) -> bool {
    text.match_indices(word).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + word.len()..].chars().next();
        !before.is_some_and(char::is_alphabetic) && !after.is_some_and(char::is_alphabetic)
    })
}

impl StatusKeyword {
    /// Find the first status marker contained in `text`.
    pub fn detect_in(text: &str) -> Option<Self> {
        STATUS_MARKERS
            .iter()
            .find(|(marker, _, mode)| match mode {
                Match::Substring => text.contains(marker),
                Match::Word => contains_word(text, marker),
            })
            .map(|(_, keyword, _)| *keyword)
    }

    /// Canonical Hebrew label.
    pub fn hebrew(&self) -> &'static str {
        match self {
            Self::Sick => "מחלה",
            Self::Vacation => "חופשה",
            Self::HalfVacation => "חצי חופשה",
            Self::Holiday => "חג",
            Self::ReserveDuty => "מילואים",
            Self::Training => "השתלמות",
            Self::Bereavement => "אבל",
        }
    }

    /// English label for display.
    pub fn english(&self) -> &'static str {
        match self {
            Self::Sick => "Sick",
            Self::Vacation => "Vacation",
            Self::HalfVacation => "Half Vacation",
            Self::Holiday => "Holiday",
            Self::ReserveDuty => "Reserve",
            Self::Training => "Training",
            Self::Bereavement => "Bereavement",
        }
    }
}

impl fmt::Display for StatusKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.english())
    }
}
