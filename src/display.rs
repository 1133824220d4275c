//! Terminal tables for attendance status and fill plans.

use chrono::{Datelike, NaiveDate};
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table};
use tracing::warn;

use crate::flow::{DayStatus, PlanEntry, PlannedAction, RunSummary, StatusSummary, day_status};
use crate::models::{AttendancePattern, AttendanceRecord, MonthAttendance};
use crate::parse::format_time;

const GREEN: Color = Color::Rgb { r: 4, g: 120, b: 87 };
const RED: Color = Color::Rgb { r: 185, g: 28, b: 28 };
const AMBER: Color = Color::Rgb { r: 180, g: 120, b: 0 };
const DIM: Color = Color::DarkGrey;

fn range_title(label: &str, start: NaiveDate, end: NaiveDate) -> String {
    if start == end {
        format!("{label} ({})", start.format("%d/%m/%Y"))
    } else {
        format!("{label} ({} - {})", start.format("%d/%m"), end.format("%d/%m/%Y"))
    }
}

/// "Office (09:00-18:00)", "Home (08:30-?)", a note, or "-".
pub fn current_label(record: &AttendanceRecord) -> String {
    let type_label = record.work_type.map_or("Work", |wt| wt.label());
    match (record.entry_time, record.exit_time) {
        (Some(entry), Some(exit)) => format!("{type_label} ({}-{})", format_time(entry), format_time(exit)),
        (Some(entry), None) => format!("{type_label} ({}-?)", format_time(entry)),
        _ => record.note.map_or_else(|| "-".to_string(), |note| note.to_string()),
    }
}

fn current_cell(record: &AttendanceRecord) -> Cell {
    let cell = Cell::new(current_label(record)).set_alignment(CellAlignment::Center);
    if record.is_complete() {
        cell.fg(GREEN)
    } else if record.has_entry() || record.note.is_some() {
        cell.fg(AMBER)
    } else {
        cell.fg(DIM)
    }
}

fn status_cell(status: DayStatus) -> Cell {
    let (text, color) = match status {
        DayStatus::Filled => ("Filled".to_string(), GREEN),
        DayStatus::Partial => ("Partial".to_string(), AMBER),
        DayStatus::Note(note) => (note.to_string(), AMBER),
        DayStatus::NonWorkDay => ("Weekend".to_string(), DIM),
        DayStatus::Empty => ("Empty".to_string(), RED),
    };
    Cell::new(text).fg(color).set_alignment(CellAlignment::Center)
}

pub fn action_label(action: &PlannedAction) -> String {
    match action {
        PlannedAction::SkipFilled => "Skip (filled)".to_string(),
        PlannedAction::SkipNote(note) => format!("Skip ({note})"),
        PlannedAction::SkipNonWorkDay => "Skip (weekend)".to_string(),
        PlannedAction::AddExit(exit) => format!("Add exit: {}", format_time(*exit)),
        PlannedAction::Fill { work_type, entry, exit } => {
            format!("{} ({}-{})", work_type.label(), format_time(*entry), format_time(*exit))
        }
        PlannedAction::Review => "Review manually".to_string(),
    }
}

fn action_cell(action: &PlannedAction) -> Cell {
    let color = match action {
        PlannedAction::Fill { .. } | PlannedAction::AddExit(_) => GREEN,
        PlannedAction::Review => RED,
        _ => DIM,
    };
    Cell::new(action_label(action)).fg(color).set_alignment(CellAlignment::Center)
}

fn date_cells(date: NaiveDate, work_day: bool) -> [Cell; 2] {
    let date_cell = Cell::new(date.format("%d/%m"));
    let day_cell = Cell::new(date.weekday());
    if work_day {
        [date_cell, day_cell]
    } else {
        [date_cell.fg(DIM), day_cell.fg(DIM)]
    }
}

fn header(columns: [&str; 4]) -> Vec<Cell> {
    columns
        .into_iter()
        .map(|c| Cell::new(c).fg(Color::Cyan).add_attribute(Attribute::Bold))
        .collect()
}

/// Status table and its title, or `None` for an empty period.
pub fn status_table(attendance: &MonthAttendance, pattern: &AttendancePattern) -> Option<(String, Table)> {
    let records = attendance.sorted();
    let (first, last) = (records.first()?, records.last()?);

    let mut table = Table::new();
    table.set_header(header(["Date", "Day", "Current", "Status"]));
    for record in &records {
        let [date, day] = date_cells(record.date(), pattern.is_work_day(record.date()));
        table.add_row(vec![date, day, current_cell(record), status_cell(day_status(record, pattern))]);
    }
    Some((range_title("Attendance", first.date(), last.date()), table))
}

/// Fill plan table and its title, or `None` when no day is in scope.
pub fn plan_table(plan: &[PlanEntry], pattern: &AttendancePattern) -> Option<(String, Table)> {
    let (first, last) = (plan.first()?, plan.last()?);

    let mut table = Table::new();
    table.set_header(header(["Date", "Day", "Current", "Action"]));
    for entry in plan {
        let [date, day] = date_cells(entry.record.date(), pattern.is_work_day(entry.record.date()));
        table.add_row(vec![date, day, current_cell(&entry.record), action_cell(&entry.action)]);
    }
    Some((range_title("Fill Plan", first.record.date(), last.record.date()), table))
}

pub fn print_status(attendance: &MonthAttendance, pattern: &AttendancePattern) {
    match status_table(attendance, pattern) {
        Some((title, table)) => println!("\n{title}\n{table}"),
        None => warn!("No records found."),
    }
}

pub fn print_plan(plan: &[PlanEntry], pattern: &AttendancePattern) {
    if let Some((title, table)) = plan_table(plan, pattern) {
        println!("\n{title}\n{table}");
    }
}

pub fn print_status_summary(summary: &StatusSummary) {
    println!("Summary:");
    println!("  Filled:  {}", summary.complete);
    if summary.partial > 0 {
        println!("  Partial: {}", summary.partial);
    }
    println!("  Empty:   {}", summary.empty);
}

pub fn print_run_summary(summary: &RunSummary) {
    let mut table = Table::new();
    table.set_header(vec![Cell::new("Filled"), Cell::new("Failed"), Cell::new("Planned")]);
    let failed = Cell::new(summary.failed);
    table.add_row(vec![
        Cell::new(summary.filled).fg(GREEN),
        if summary.failed > 0 { failed.fg(RED) } else { failed },
        Cell::new(summary.planned),
    ]);
    println!("\n{table}\n{}", summary.summary());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{FillOptions, fill_plan};
    use crate::models::WorkType;
    use crate::vocabulary::StatusKeyword;
    use chrono::NaiveTime;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, day).unwrap()
    }

    fn hm(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    fn month() -> MonthAttendance {
        let mut complete = AttendanceRecord::new(d(4));
        complete.entry_time = hm(9, 0);
        complete.exit_time = hm(18, 0);
        complete.work_type = Some(WorkType::Home);
        let mut partial = AttendanceRecord::new(d(3));
        partial.entry_time = hm(8, 45);
        let mut sick = AttendanceRecord::new(d(5));
        sick.note = Some(StatusKeyword::Sick);
        MonthAttendance::new(2025, 11, vec![complete, partial, sick, AttendanceRecord::new(d(7))])
    }

    #[test]
    fn test_current_label() {
        let month = month();
        let labels: Vec<String> = month.sorted().into_iter().map(current_label).collect();
        assert_eq!(labels, vec!["Work (08:45-?)", "Home (09:00-18:00)", "Sick", "-"]);
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(action_label(&PlannedAction::SkipNote(StatusKeyword::Vacation)), "Skip (Vacation)");
        assert_eq!(action_label(&PlannedAction::AddExit(hm(18, 0).unwrap())), "Add exit: 18:00");
        let fill = PlannedAction::Fill {
            work_type: WorkType::Office,
            entry: hm(9, 0).unwrap(),
            exit: hm(18, 0).unwrap(),
        };
        assert_eq!(action_label(&fill), "Office (09:00-18:00)");
    }

    #[test]
    fn test_status_table() {
        let (title, table) = status_table(&month(), &AttendancePattern::default()).unwrap();
        assert_eq!(title, "Attendance (03/11 - 07/11/2025)");
        let rendered = table.to_string();
        for text in ["Partial", "Filled", "Sick", "Weekend"] {
            assert!(rendered.contains(text), "missing {text}");
        }
    }

    #[test]
    fn test_plan_table_single_day_title() {
        let pattern = AttendancePattern::default();
        let options = FillOptions {
            today_only: true,
            ..Default::default()
        };
        let plan = fill_plan(&month(), &pattern, options, d(3));
        let (title, table) = plan_table(&plan, &pattern).unwrap();
        assert_eq!(title, "Fill Plan (03/11/2025)");
        assert!(table.to_string().contains("Add exit: 18:00"));

        assert!(plan_table(&[], &pattern).is_none());
        assert!(status_table(&MonthAttendance::new(2025, 11, Vec::new()), &pattern).is_none());
    }
}
