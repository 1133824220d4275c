//! Data models for attendance days, fill instructions and the weekly pattern.

pub mod attendance;
pub mod pattern;

pub use attendance::{AttendanceRecord, FillInstruction, MonthAttendance, WorkType};
pub use pattern::{AttendancePattern, WeekSchedule};
