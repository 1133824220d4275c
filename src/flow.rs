//! Attendance flow orchestration: fetch, plan, confirm, fill, report.

use std::time::Instant;

use chrono::{Datelike, NaiveDate, NaiveTime};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::models::{AttendancePattern, AttendanceRecord, FillInstruction, MonthAttendance, WorkType};
use crate::portal::{Browser, FillOutcome, PortalClient};
use crate::vocabulary::StatusKeyword;

/// Which days a fill run may touch.
#[derive(Debug, Clone, Copy, Default)]
pub struct FillOptions {
    pub dry_run: bool,
    /// Only today's date.
    pub today_only: bool,
    /// Every day up to and including today.
    pub up_to_today: bool,
}

impl FillOptions {
    fn in_scope(&self, date: NaiveDate, today: NaiveDate) -> bool {
        if self.today_only {
            date == today
        } else if self.up_to_today {
            date <= today
        } else {
            true
        }
    }

    /// Whether a real write needs the user's go-ahead first.
    pub fn needs_confirmation(&self) -> bool {
        !self.dry_run && !self.today_only
    }
}

/// Work day that still needs entries and carries no status note.
pub fn is_fill_target(record: &AttendanceRecord, pattern: &AttendancePattern) -> bool {
    pattern.is_work_day(record.date()) && record.needs_filling()
}

/// Planned write for one record: pattern times only where the portal has none.
pub fn instruction_for(record: &AttendanceRecord, pattern: &AttendancePattern) -> FillInstruction {
    FillInstruction {
        date: record.date(),
        work_type: pattern.work_type(record.date().weekday()).unwrap_or(WorkType::Office),
        entry_time: (!record.has_entry()).then_some(pattern.entry_time),
        exit_time: (!record.has_exit()).then_some(pattern.exit_time),
    }
}

/// Instructions for every fill target in scope, in date order.
pub fn build_instructions(
    attendance: &MonthAttendance,
    pattern: &AttendancePattern,
    options: FillOptions,
    today: NaiveDate,
) -> Vec<FillInstruction> {
    attendance
        .sorted()
        .into_iter()
        .filter(|record| options.in_scope(record.date(), today))
        .filter(|record| {
            if let Some(note) = record.note {
                debug!("Skipping {} ({note})", record.date().format("%d/%m"));
            }
            is_fill_target(record, pattern)
        })
        .map(|record| instruction_for(record, pattern))
        .collect()
}

/// What the fill run will do with one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    SkipFilled,
    SkipNote(StatusKeyword),
    SkipNonWorkDay,
    AddExit(NaiveTime),
    Fill {
        work_type: WorkType,
        entry: NaiveTime,
        exit: NaiveTime,
    },
    /// Exit present without an entry.
    Review,
}

impl PlannedAction {
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::SkipFilled | Self::SkipNote(_) | Self::SkipNonWorkDay)
    }
}

pub fn plan_action(record: &AttendanceRecord, pattern: &AttendancePattern) -> PlannedAction {
    if record.is_complete() {
        return PlannedAction::SkipFilled;
    }
    if let Some(note) = record.note {
        return PlannedAction::SkipNote(note);
    }
    let Some(work_type) = pattern.work_type(record.date().weekday()) else {
        return PlannedAction::SkipNonWorkDay;
    };
    if record.has_entry() {
        PlannedAction::AddExit(pattern.exit_time)
    } else if record.is_empty() {
        PlannedAction::Fill {
            work_type,
            entry: pattern.entry_time,
            exit: pattern.exit_time,
        }
    } else {
        PlannedAction::Review
    }
}

/// One row of the fill plan.
#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub record: AttendanceRecord,
    pub action: PlannedAction,
}

/// Fill plan for the days in scope, in date order.
pub fn fill_plan(
    attendance: &MonthAttendance,
    pattern: &AttendancePattern,
    options: FillOptions,
    today: NaiveDate,
) -> Vec<PlanEntry> {
    attendance
        .sorted()
        .into_iter()
        .filter(|record| options.in_scope(record.date(), today))
        .map(|record| PlanEntry {
            record: record.clone(),
            action: plan_action(record, pattern),
        })
        .collect()
}

/// Why a today-only run has nothing to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodayStatus {
    NotInPeriod,
    NotWorkDay,
    AlreadyFilled,
    HasNote(StatusKeyword),
    NothingToFill,
}

impl TodayStatus {
    pub fn message(&self) -> String {
        match self {
            Self::NotInPeriod => "Today is not in the current pay period".to_string(),
            Self::NotWorkDay => "Today is not a work day in your pattern".to_string(),
            Self::AlreadyFilled => "Today is already filled".to_string(),
            Self::HasNote(note) => format!("Today has a note: {note}"),
            Self::NothingToFill => "Nothing to fill for today".to_string(),
        }
    }
}

pub fn explain_today(attendance: &MonthAttendance, pattern: &AttendancePattern, today: NaiveDate) -> TodayStatus {
    let Some(record) = attendance.record_for(today) else {
        return TodayStatus::NotInPeriod;
    };
    if !pattern.is_work_day(today) {
        TodayStatus::NotWorkDay
    } else if record.is_complete() {
        TodayStatus::AlreadyFilled
    } else if let Some(note) = record.note {
        TodayStatus::HasNote(note)
    } else {
        TodayStatus::NothingToFill
    }
}

/// Status of one day for the status view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayStatus {
    Filled,
    Partial,
    Note(StatusKeyword),
    NonWorkDay,
    Empty,
}

pub fn day_status(record: &AttendanceRecord, pattern: &AttendancePattern) -> DayStatus {
    if record.is_complete() {
        DayStatus::Filled
    } else if record.has_entry() {
        DayStatus::Partial
    } else if let Some(note) = record.note {
        DayStatus::Note(note)
    } else if !pattern.is_work_day(record.date()) {
        DayStatus::NonWorkDay
    } else {
        DayStatus::Empty
    }
}

/// Counts over the work days of a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    pub complete: usize,
    pub partial: usize,
    pub empty: usize,
}

impl StatusSummary {
    pub fn of(attendance: &MonthAttendance, pattern: &AttendancePattern) -> Self {
        let mut summary = Self::default();
        for record in attendance.records.iter().filter(|r| pattern.is_work_day(r.date())) {
            match day_status(record, pattern) {
                DayStatus::Filled => summary.complete += 1,
                DayStatus::Partial => summary.partial += 1,
                DayStatus::Empty => summary.empty += 1,
                DayStatus::Note(_) | DayStatus::NonWorkDay => {}
            }
        }
        summary
    }
}

/// Result of a fill run that reached the portal.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub planned: usize,
    pub filled: usize,
    pub failed: usize,
    pub dry_run: bool,
    pub duration_secs: f64,
}

impl RunSummary {
    /// Get summary message.
    pub fn summary(&self) -> String {
        let base = format!(
            "Filled: {}, Failed: {} of {} (took {:.1}s)",
            self.filled, self.failed, self.planned, self.duration_secs
        );
        if self.dry_run { format!("{base} - dry run") } else { base }
    }
}

/// How a fill run ended.
#[derive(Debug, Clone)]
pub enum FillReport {
    /// No day needed filling. Today-only runs say why.
    NothingToFill(Option<TodayStatus>),
    /// The user declined the confirmation prompt.
    Cancelled,
    Completed(RunSummary),
}

/// One browser session's worth of work against the portal.
pub struct AttendanceFlow<B: Browser> {
    client: PortalClient<B>,
    pattern: AttendancePattern,
}

impl<B: Browser> AttendanceFlow<B> {
    pub fn new(browser: B, config: &AppConfig) -> Self {
        Self {
            client: PortalClient::new(browser, config),
            pattern: config.pattern.clone(),
        }
    }

    pub fn pattern(&self) -> &AttendancePattern {
        &self.pattern
    }

    pub fn client(&self) -> &PortalClient<B> {
        &self.client
    }

    /// Log in and read the pay period (`year`, `month`).
    pub fn fetch(&mut self, year: i32, month: u32) -> Result<MonthAttendance> {
        self.client.login()?;
        self.client
            .get_attendance(year, month)?
            .ok_or_else(|| AppError::navigation(format!("Could not open the {month}/{year} pay period")))
    }

    /// Fill the days in scope, asking `confirm` first when a real write is
    /// about to happen.
    pub fn fill(
        &self,
        attendance: &MonthAttendance,
        options: FillOptions,
        today: NaiveDate,
        confirm: impl FnOnce(usize) -> bool,
    ) -> FillReport {
        let instructions = build_instructions(attendance, &self.pattern, options, today);
        if instructions.is_empty() {
            let reason = options
                .today_only
                .then(|| explain_today(attendance, &self.pattern, today));
            info!("{}", reason.map_or_else(|| "Nothing to fill".to_string(), |r| r.message()));
            return FillReport::NothingToFill(reason);
        }

        if options.dry_run {
            warn!("DRY RUN: would fill {} days", instructions.len());
        } else if options.needs_confirmation() && !confirm(instructions.len()) {
            info!("Cancelled.");
            return FillReport::Cancelled;
        }

        let start = Instant::now();
        let FillOutcome { filled, failed, .. } = self.client.fill_batch(&instructions, options.dry_run);
        let summary = RunSummary {
            planned: instructions.len(),
            filled,
            failed,
            dry_run: options.dry_run,
            duration_secs: start.elapsed().as_secs_f64(),
        };
        info!("{}", summary.summary());
        FillReport::Completed(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::testing::{BASE_URL, FakeDay, FakePortal, PASSWORD, USERNAME};
    use chrono::Weekday;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn record(date: NaiveDate, entry: Option<NaiveTime>, exit: Option<NaiveTime>) -> AttendanceRecord {
        let mut r = AttendanceRecord::new(date);
        r.entry_time = entry;
        r.exit_time = exit;
        r
    }

    /// November 2025: Sun 2 empty, Mon 3 partial, Tue 4 complete, Wed 5 sick,
    /// Fri 7 empty (weekend), Sun 9 exit only.
    fn november() -> MonthAttendance {
        let mut sick = record(d(11, 5), None, None);
        sick.note = Some(StatusKeyword::Sick);
        MonthAttendance::new(
            2025,
            11,
            vec![
                record(d(11, 9), None, Some(hm(18, 0))),
                record(d(11, 2), None, None),
                record(d(11, 3), Some(hm(8, 45)), None),
                record(d(11, 4), Some(hm(9, 0)), Some(hm(18, 0))),
                sick,
                record(d(11, 7), None, None),
            ],
        )
    }

    fn home_mondays() -> AttendancePattern {
        let mut pattern = AttendancePattern::default();
        pattern.days.set(Weekday::Mon, WorkType::Home);
        pattern
    }

    #[test]
    fn test_build_instructions_respects_existing_values() {
        let pattern = home_mondays();
        let instructions = build_instructions(&november(), &pattern, FillOptions::default(), d(11, 30));
        let dates: Vec<NaiveDate> = instructions.iter().map(|i| i.date).collect();
        assert_eq!(dates, vec![d(11, 2), d(11, 3), d(11, 9)]);

        assert_eq!(instructions[0].entry_time, Some(pattern.entry_time));
        assert_eq!(instructions[0].exit_time, Some(pattern.exit_time));
        assert_eq!(instructions[0].work_type, WorkType::Office);

        // Existing entry is kept, only the exit is written.
        assert_eq!(instructions[1].entry_time, None);
        assert_eq!(instructions[1].exit_time, Some(pattern.exit_time));
        assert_eq!(instructions[1].work_type, WorkType::Home);

        assert_eq!(instructions[2].entry_time, Some(pattern.entry_time));
        assert_eq!(instructions[2].exit_time, None);
    }

    #[test]
    fn test_scope_filters() {
        let pattern = AttendancePattern::default();
        let up_to = FillOptions {
            up_to_today: true,
            ..Default::default()
        };
        let dates: Vec<NaiveDate> = build_instructions(&november(), &pattern, up_to, d(11, 3))
            .iter()
            .map(|i| i.date)
            .collect();
        assert_eq!(dates, vec![d(11, 2), d(11, 3)]);

        let today = FillOptions {
            today_only: true,
            ..Default::default()
        };
        assert_eq!(build_instructions(&november(), &pattern, today, d(11, 3)).len(), 1);
        assert!(build_instructions(&november(), &pattern, today, d(11, 4)).is_empty());
    }

    #[test]
    fn test_explain_today() {
        let pattern = AttendancePattern::default();
        let month = november();
        assert_eq!(explain_today(&month, &pattern, d(12, 1)), TodayStatus::NotInPeriod);
        assert_eq!(explain_today(&month, &pattern, d(11, 7)), TodayStatus::NotWorkDay);
        assert_eq!(explain_today(&month, &pattern, d(11, 4)), TodayStatus::AlreadyFilled);
        assert_eq!(
            explain_today(&month, &pattern, d(11, 5)),
            TodayStatus::HasNote(StatusKeyword::Sick)
        );
    }

    #[test]
    fn test_plan_actions() {
        let pattern = AttendancePattern::default();
        let plan = fill_plan(&november(), &pattern, FillOptions::default(), d(11, 30));
        let actions: Vec<&PlannedAction> = plan.iter().map(|e| &e.action).collect();
        assert_eq!(
            actions,
            vec![
                &PlannedAction::Fill {
                    work_type: WorkType::Office,
                    entry: pattern.entry_time,
                    exit: pattern.exit_time
                },
                &PlannedAction::AddExit(pattern.exit_time),
                &PlannedAction::SkipFilled,
                &PlannedAction::SkipNote(StatusKeyword::Sick),
                &PlannedAction::SkipNonWorkDay,
                &PlannedAction::Review,
            ]
        );
        assert!(plan[2].action.is_skip());
    }

    #[test]
    fn test_status_summary_counts_work_days() {
        let summary = StatusSummary::of(&november(), &AttendancePattern::default());
        assert_eq!(
            summary,
            StatusSummary {
                complete: 1,
                partial: 1,
                empty: 2
            }
        );
    }

    #[test]
    fn test_note_and_complete_are_never_targets() {
        let pattern = AttendancePattern::default();
        let month = november();
        for record in &month.records {
            if record.note.is_some() || record.is_complete() {
                assert!(!is_fill_target(record, &pattern));
            }
        }
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.portal.url = BASE_URL.to_string();
        config.portal.username = USERNAME.to_string();
        config.portal.password = PASSWORD.to_string();
        config
    }

    /// January 2026 period with two empty work days (Mon 5, Tue 6).
    fn flow() -> AttendanceFlow<FakePortal> {
        let portal = FakePortal::new(vec![FakeDay::empty(5, 1), FakeDay::empty(6, 1)]);
        AttendanceFlow::new(portal, &config())
    }

    #[test]
    fn test_fill_asks_before_writing() {
        let mut flow = flow();
        let month = flow.fetch(2026, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();

        let mut asked = None;
        let report = flow.fill(&month, FillOptions::default(), today, |n| {
            asked = Some(n);
            false
        });
        assert_eq!(asked, Some(2));
        assert!(matches!(report, FillReport::Cancelled));
        assert!(!flow.client().session().browser().saved());

        let report = flow.fill(&month, FillOptions::default(), today, |_| true);
        let FillReport::Completed(summary) = report else {
            panic!("expected a completed run");
        };
        assert_eq!((summary.filled, summary.failed), (2, 0));
        assert!(flow.client().session().browser().saved());
    }

    #[test]
    fn test_dry_run_skips_confirmation() {
        let mut flow = flow();
        let month = flow.fetch(2026, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let options = FillOptions {
            dry_run: true,
            ..Default::default()
        };
        let report = flow.fill(&month, options, today, |_| panic!("dry run must not prompt"));
        let FillReport::Completed(summary) = report else {
            panic!("expected a completed run");
        };
        assert_eq!((summary.filled, summary.failed), (2, 0));
        assert!(summary.summary().ends_with("dry run"));
        assert!(flow.client().session().browser().writes().is_empty());
    }

    #[test]
    fn test_today_only_explains_nothing_to_do() {
        let mut flow = flow();
        let month = flow.fetch(2026, 1).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        let options = FillOptions {
            today_only: true,
            ..Default::default()
        };
        let report = flow.fill(&month, options, saturday, |_| true);
        assert!(matches!(report, FillReport::NothingToFill(Some(TodayStatus::NotInPeriod))));
    }

    #[test]
    fn test_fetch_fails_on_unknown_month() {
        let mut portal = FakePortal::new(Vec::new());
        portal.month_label = "מרץ 2026".to_string();
        portal.month_items.clear();
        let mut flow = AttendanceFlow::new(portal, &config());
        let err = flow.fetch(2026, 1).unwrap_err();
        assert!(matches!(err, AppError::Navigation(_)));
        assert!(err.is_fatal());
    }
}
