//! Batch fill: write many days into the detail form and save once.
//!
//! The portal flow is clear -> select days -> "selected days" -> write each
//! revealed row -> save. Selecting is flaky: the portal sometimes rejects the
//! reveal with a "select at least one day" notice, in which case the whole
//! selection is redone once with a stricter visibility scan.

use std::collections::{BTreeSet, HashMap};

use chrono::Datelike;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use super::browser::Browser;
use super::calendar::{CalendarPage, RawCell};
use super::detail::{RawDetailRow, control_labels};
use super::error::Result;
use super::markup::{self, timing};
use super::page::Page;
use super::scripts;
use crate::models::FillInstruction;
use crate::parse::format_time;
use crate::vocabulary::notices;

/// Progress of one batch through the portal choreography.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillState {
    #[default]
    Idle,
    Cleared,
    Selected,
    Revealed,
    Filled,
    Saved,
}

impl FillState {
    fn to(self, next: FillState) -> FillState {
        debug!("Batch fill: {self:?} -> {next:?}");
        next
    }
}

/// Result of a batch fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FillOutcome {
    pub filled: usize,
    pub failed: usize,
    /// Last state reached.
    pub state: FillState,
}

impl FillOutcome {
    fn new(filled: usize, total: usize, state: FillState) -> Self {
        Self {
            filled,
            failed: total.saturating_sub(filled),
            state,
        }
    }

    fn all_failed(total: usize, state: FillState) -> Self {
        Self::new(0, total, state)
    }
}

/// Values destined for one detail row. `None` times keep what the portal has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RowFill {
    pub entry: Option<String>,
    pub exit: Option<String>,
    pub work_code: &'static str,
}

/// Key rows and instructions share: zero-padded `DD/MM`.
pub(crate) fn day_key(day: u32, month: u32) -> String {
    format!("{day:02}/{month:02}")
}

/// Index instructions by day key. Later instructions win; work types without
/// a portal code are left out.
pub(crate) fn fill_map(instructions: &[FillInstruction]) -> HashMap<String, RowFill> {
    let mut fills = HashMap::new();
    for instruction in instructions {
        let Some(work_code) = instruction.work_type.portal_code() else {
            debug!("Nothing to write for {} ({})", instruction.date, instruction.work_type);
            continue;
        };
        fills.insert(
            day_key(instruction.date.day(), instruction.date.month()),
            RowFill {
                entry: instruction.entry_time.map(format_time),
                exit: instruction.exit_time.map(format_time),
                work_code,
            },
        );
    }
    fills
}

/// Choose one grid cell per requested day, preferring cells that do not
/// already carry data. Returns the cell indices and the days with no
/// selectable cell.
pub(crate) fn choose_cells(cells: &[RawCell], days: &BTreeSet<u32>) -> (Vec<usize>, Vec<u32>) {
    let mut indices = Vec::new();
    let mut missed = Vec::new();
    for &day in days {
        let candidates: Vec<&RawCell> = cells
            .iter()
            .filter(|cell| cell.is_selectable() && cell.day() == Some(day))
            .collect();
        let chosen = candidates
            .iter()
            .find(|cell| !cell.filled)
            .or_else(|| candidates.first());
        match chosen {
            Some(cell) => indices.push(cell.index),
            None => missed.push(day),
        }
    }
    (indices, missed)
}

/// Position of the control to write: the last editable one, else the last.
///
/// Time cells render a read-only clock pair before the editable manual pair.
pub(crate) fn pick_editable(controls: &[bool]) -> Option<usize> {
    controls
        .iter()
        .rposition(|&editable| editable)
        .or_else(|| controls.len().checked_sub(1))
}

/// One control write, addressed by field and position within the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ControlWrite {
    pub field: &'static str,
    pub ordinal: usize,
    pub value: String,
}

/// Writes for a matched row. Times are written only when given; the work
/// type always is.
pub(crate) fn plan_row_writes(row: &RawDetailRow, fill: &RowFill) -> Vec<ControlWrite> {
    let targets = [
        ("entry", &row.controls.entry, fill.entry.clone()),
        ("exit", &row.controls.exit, fill.exit.clone()),
        ("workType", &row.controls.work_type, Some(fill.work_code.to_string())),
    ];
    targets
        .into_iter()
        .filter_map(|(field, controls, value)| {
            Some(ControlWrite {
                field,
                ordinal: pick_editable(controls)?,
                value: value?,
            })
        })
        .collect()
}

impl<B: Browser> CalendarPage<'_, B> {
    /// Write `instructions` to the portal and save once.
    ///
    /// Never fails: browser errors are logged and reported as every
    /// instruction failing. A dry run only logs what would be written.
    pub fn fill_batch(&self, instructions: &[FillInstruction], dry_run: bool) -> FillOutcome {
        let total = instructions.len();
        if total == 0 {
            return FillOutcome::default();
        }
        info!("Batch filling {total} days...");

        if dry_run {
            for instruction in instructions {
                let keep = || "(keep existing)".to_string();
                info!(
                    "{}: {} ({}-{}) (dry run)",
                    instruction.date.format("%d/%m/%Y"),
                    instruction.work_type,
                    instruction.entry_time.map(format_time).unwrap_or_else(keep),
                    instruction.exit_time.map(format_time).unwrap_or_else(keep),
                );
            }
            return FillOutcome::new(total, total, FillState::Idle);
        }

        match self.run_batch(instructions) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Batch fill aborted: {e}");
                FillOutcome::all_failed(total, FillState::Idle)
            }
        }
    }

    fn run_batch(&self, instructions: &[FillInstruction]) -> Result<FillOutcome> {
        let total = instructions.len();
        let days: BTreeSet<u32> = instructions.iter().map(|i| i.date.day()).collect();
        let mut state = FillState::Idle;
        let mut retried = false;

        loop {
            self.clear_selection()?;
            state = state.to(FillState::Cleared);

            if self.select_days(&days, retried)? == 0 {
                warn!("Could not select any of the days to fill");
                return Ok(FillOutcome::all_failed(total, state));
            }
            state = state.to(FillState::Selected);

            if !self.reveal_selected()? {
                warn!("Could not find the selected-days button");
                return Ok(FillOutcome::all_failed(total, state));
            }
            if !self.selection_rejected()? {
                break;
            }
            if retried {
                error!("Portal rejected the day selection twice");
                return Ok(FillOutcome::all_failed(total, state));
            }
            warn!("Portal reports no selected days, selecting again");
            retried = true;
        }
        state = state.to(FillState::Revealed);

        let filled = self.write_rows(&fill_map(instructions))?;
        if filled == 0 {
            warn!("No detail row was written");
            return Ok(FillOutcome::all_failed(total, state));
        }
        state = state.to(FillState::Filled);

        if !self.save()? {
            error!("Could not find a save button");
            return Ok(FillOutcome::all_failed(total, state));
        }
        state = state.to(FillState::Saved);

        info!("Saved {filled} of {total} days");
        Ok(FillOutcome::new(filled, total, state))
    }

    /// Click one cell per day. Returns how many cells were clicked.
    fn select_days(&self, days: &BTreeSet<u32>, thorough: bool) -> Result<usize> {
        let cells = self.cells(thorough)?;
        let (indices, missed) = choose_cells(&cells, days);
        if !missed.is_empty() {
            warn!("No clickable cell for days {missed:?}");
        }
        if indices.is_empty() {
            return Ok(0);
        }
        let clicked = self.click_cells(&indices)?;
        self.session().wait(timing::AFTER_CLICK);
        debug!("Selected {} of {} days", clicked.len(), days.len());
        Ok(clicked.len())
    }

    /// Detect and dismiss the "select at least one day" notice.
    fn selection_rejected(&self) -> Result<bool> {
        let notice = json!({ "text": notices::NO_DAYS_SELECTED });
        let shown: bool = self.session().eval(scripts::NOTICE_SHOWN, notice.clone(), "notice check")?;
        if shown {
            let dismissed: bool = self.session().eval(scripts::DISMISS_NOTICE, notice, "notice dismiss")?;
            if !dismissed {
                debug!("Notice had no close control");
            }
            self.session().wait(timing::AFTER_NOTICE);
        }
        Ok(shown)
    }

    /// Write every revealed row that belongs to the batch. Returns the number
    /// of distinct days that received at least one write.
    fn write_rows(&self, fills: &HashMap<String, RowFill>) -> Result<usize> {
        let rows = self.detail_rows()?;
        if rows.is_empty() {
            warn!("Detail form shows no rows");
            return Ok(0);
        }

        let mut written_days = BTreeSet::new();
        for row in &rows {
            let Some((day, month)) = row.date() else {
                continue;
            };
            let key = day_key(day, month);
            let Some(fill) = fills.get(&key) else {
                debug!("Row {key} is not part of this batch");
                continue;
            };

            let writes = plan_row_writes(row, fill);
            if writes.is_empty() {
                warn!("Row {key} has no writable controls");
                continue;
            }
            let mut arg = control_labels();
            arg["rowIndex"] = json!(row.row_index);
            arg["writes"] = json!(writes);
            let results: Vec<bool> = self.session().eval(scripts::WRITE_CONTROLS, arg, "control writes")?;

            if results.iter().any(|&written| written) {
                debug!("Filled {key}");
                written_days.insert(key);
                self.session().wait(timing::AFTER_FILL);
            } else {
                warn!("Could not write any control of row {key}");
            }
        }
        Ok(written_days.len())
    }

    /// Press save, falling back to the id-based lookup.
    fn save(&self) -> Result<bool> {
        let mut saved = self.session().try_click_visible(&markup::save_button())?;
        if !saved {
            debug!("Primary save button unavailable, trying fallback");
            saved = self.session().eval(
                scripts::CLICK_BY_ID_FRAGMENT,
                json!({ "idFragment": markup::SAVE_BUTTON_ID_FRAGMENT }),
                "fallback save",
            )?;
        }
        if saved {
            self.session().wait(timing::AFTER_SAVE);
            self.session().wait_for_load()?;
        }
        Ok(saved)
    }
}
