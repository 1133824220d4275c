//! Attendance days as read from the portal, and planned writes back to it.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::vocabulary::StatusKeyword;

/// Where a work day was spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkType {
    Office,
    Home,
    Abroad,
    /// Non-work day.
    Skip,
}

/// Vendor report-type codes (the `<select>` option values).
pub mod work_code {
    pub const OFFICE: &str = "103";
    pub const HOME: &str = "101";
    pub const ABROAD: &str = "104";
}

impl WorkType {
    /// Portal code written into the report-type selector. `Skip` has none.
    pub fn portal_code(&self) -> Option<&'static str> {
        match self {
            Self::Office => Some(work_code::OFFICE),
            Self::Home => Some(work_code::HOME),
            Self::Abroad => Some(work_code::ABROAD),
            Self::Skip => None,
        }
    }

    /// Map a portal code back to a work type. Unknown codes yield `None`.
    pub fn from_portal_code(code: &str) -> Option<Self> {
        match code.trim() {
            work_code::OFFICE => Some(Self::Office),
            work_code::HOME => Some(Self::Home),
            work_code::ABROAD => Some(Self::Abroad),
            _ => None,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Office => "Office",
            Self::Home => "Home",
            Self::Abroad => "Abroad",
            Self::Skip => "Skip",
        }
    }

    /// Parse a config/CLI name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "office" => Some(Self::Office),
            "home" => Some(Self::Home),
            "abroad" => Some(Self::Abroad),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

impl fmt::Display for WorkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One calendar day of attendance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    date: NaiveDate,
    pub entry_time: Option<NaiveTime>,
    pub exit_time: Option<NaiveTime>,
    pub work_type: Option<WorkType>,
    pub note: Option<StatusKeyword>,
}

impl AttendanceRecord {
    /// Empty record for a date.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            entry_time: None,
            exit_time: None,
            work_type: None,
            note: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn has_entry(&self) -> bool {
        self.entry_time.is_some()
    }

    pub fn has_exit(&self) -> bool {
        self.exit_time.is_some()
    }

    /// Neither entry nor exit recorded.
    pub fn is_empty(&self) -> bool {
        !self.has_entry() && !self.has_exit()
    }

    /// Both entry and exit recorded.
    pub fn is_complete(&self) -> bool {
        self.has_entry() && self.has_exit()
    }

    /// Whether this day is a fill candidate. Days with a status note never are.
    pub fn needs_filling(&self) -> bool {
        !self.is_complete() && self.note.is_none()
    }
}

/// Attendance for one pay period.
///
/// `year`/`month` name the vendor period, so records may fall in the previous
/// calendar month.
#[derive(Debug, Clone, Default)]
pub struct MonthAttendance {
    pub year: i32,
    pub month: u32,
    pub records: Vec<AttendanceRecord>,
}

impl MonthAttendance {
    pub fn new(year: i32, month: u32, records: Vec<AttendanceRecord>) -> Self {
        Self { year, month, records }
    }

    /// Records ordered by date.
    pub fn sorted(&self) -> Vec<&AttendanceRecord> {
        let mut records: Vec<&AttendanceRecord> = self.records.iter().collect();
        records.sort_by_key(|r| r.date());
        records
    }

    /// Record for a specific date, if the period contains it.
    pub fn record_for(&self, date: NaiveDate) -> Option<&AttendanceRecord> {
        self.records.iter().find(|r| r.date() == date)
    }
}

/// One planned write. `None` times mean "keep what the portal already has".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillInstruction {
    pub date: NaiveDate,
    pub work_type: WorkType,
    pub entry_time: Option<NaiveTime>,
    pub exit_time: Option<NaiveTime>,
}
