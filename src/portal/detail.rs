//! Detail-form reconciliation.
//!
//! The grid shows a single marker per day, which cannot carry entry, exit
//! and work type at once. Selecting days and pressing "selected days"
//! reveals a row-based form with the authoritative values; this module reads
//! it back and merges the result into the coarse grid records.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveTime};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::browser::Browser;
use super::calendar::{CalendarPage, RawCell};
use super::error::Result;
use super::markup::{self, timing};
use super::page::Page;
use super::scripts;
use crate::models::{AttendanceRecord, WorkType};
use crate::parse;
use crate::vocabulary::{aria, notices};

/// One input element inside a time cell.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawInput {
    pub value: String,
    pub editable: bool,
}

/// Entry or exit cell of a detail row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawTimeCell {
    pub present: bool,
    /// Server-rendered original value.
    pub ov: String,
    pub text: String,
    pub inputs: Vec<RawInput>,
}

/// Editability of each writable control, in document order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawControls {
    pub entry: Vec<bool>,
    pub exit: Vec<bool>,
    pub work_type: Vec<bool>,
}

/// One detail row as captured in the page, keyed by its id row index.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawDetailRow {
    pub row_index: usize,
    pub date_ov: String,
    pub date_text: String,
    pub special_text: String,
    pub entry: RawTimeCell,
    pub exit: RawTimeCell,
    pub work_type_code: String,
    pub controls: RawControls,
}

type TimeExtractor = fn(&RawTimeCell) -> Option<NaiveTime>;

/// Strategies for reading a time out of a cell, most trusted first.
const TIME_EXTRACTORS: [TimeExtractor; 3] = [time_from_attribute, time_from_editable_input, time_from_any_input];

fn time_from_attribute(cell: &RawTimeCell) -> Option<NaiveTime> {
    parse::parse_time(&cell.ov)
}

fn time_from_editable_input(cell: &RawTimeCell) -> Option<NaiveTime> {
    cell.inputs
        .iter()
        .filter(|input| input.editable)
        .find_map(|input| parse::parse_time(&input.value))
}

fn time_from_any_input(cell: &RawTimeCell) -> Option<NaiveTime> {
    cell.inputs.iter().find_map(|input| parse::parse_time(&input.value))
}

fn extract_time(cell: &RawTimeCell) -> Option<NaiveTime> {
    if !cell.present {
        return None;
    }
    TIME_EXTRACTORS.iter().find_map(|extract| extract(cell))
}

impl RawDetailRow {
    /// (day, month) from the `ov` attribute, else the rendered text.
    pub fn date(&self) -> Option<(u32, u32)> {
        let source = if self.date_ov.trim().is_empty() {
            &self.date_text
        } else {
            &self.date_ov
        };
        parse::parse_day_month(source)
    }

    /// Reduce the raw snapshot to the values the row carries.
    pub fn parse(&self) -> Option<DetailRow> {
        let Some((day, month)) = self.date() else {
            debug!("Detail row {} has no date", self.row_index);
            return None;
        };
        let missing_entry = self.special_text.contains(notices::MISSING_ENTRY);
        let missing_exit = self.special_text.contains(notices::MISSING_EXIT);

        let mut entry = extract_time(&self.entry);
        let mut exit = extract_time(&self.exit);

        // A lone time next to a "missing" marker belongs to the other side.
        if entry.is_none() && exit.is_none() {
            let text = format!("{} {} {}", self.special_text, self.entry.text, self.exit.text);
            if let [token] = parse::time_tokens(&text).as_slice() {
                if missing_entry {
                    exit = Some(*token);
                } else if missing_exit {
                    entry = Some(*token);
                }
            }
        }

        let code = self.work_type_code.trim();
        Some(DetailRow {
            day,
            month,
            entry,
            exit,
            work_type_code: (!code.is_empty()).then(|| code.to_string()),
            missing_entry,
            missing_exit,
        })
    }
}

/// Values of one day recovered from the detail form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DetailRow {
    pub day: u32,
    pub month: u32,
    pub entry: Option<NaiveTime>,
    pub exit: Option<NaiveTime>,
    pub work_type_code: Option<String>,
    pub missing_entry: bool,
    pub missing_exit: bool,
}

impl DetailRow {
    pub fn key(&self) -> (u32, u32) {
        (self.day, self.month)
    }

    /// Fold another row of the same day in: populated fields are kept, gaps
    /// are filled from `other`, missing flags accumulate.
    pub fn merge(&mut self, other: DetailRow) {
        self.entry = self.entry.or(other.entry);
        self.exit = self.exit.or(other.exit);
        if self.work_type_code.is_none() {
            self.work_type_code = other.work_type_code;
        }
        self.missing_entry |= other.missing_entry;
        self.missing_exit |= other.missing_exit;
    }
}

/// Date-keyed row set preserving first-seen order.
#[derive(Debug, Default)]
pub(crate) struct DetailRows {
    rows: Vec<DetailRow>,
    positions: HashMap<(u32, u32), usize>,
}

impl DetailRows {
    pub fn insert(&mut self, row: DetailRow) {
        match self.positions.get(&row.key()) {
            Some(&pos) => self.rows[pos].merge(row),
            None => {
                self.positions.insert(row.key(), self.rows.len());
                self.rows.push(row);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DetailRow> {
        self.rows.iter()
    }
}

impl FromIterator<DetailRow> for DetailRows {
    fn from_iter<I: IntoIterator<Item = DetailRow>>(iter: I) -> Self {
        let mut rows = Self::default();
        for row in iter {
            rows.insert(row);
        }
        rows
    }
}

/// Overwrite coarse records with the detail values, then sort by date.
///
/// Only parsed times and known work-type codes are written; nothing is ever
/// cleared.
pub(crate) fn apply_detail_rows(records: &mut [AttendanceRecord], rows: &DetailRows) {
    let by_key: HashMap<(u32, u32), usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| ((r.date().day(), r.date().month()), i))
        .collect();

    for row in rows.iter() {
        let Some(&i) = by_key.get(&row.key()) else {
            debug!("Detail row {}/{} has no grid record", row.day, row.month);
            continue;
        };
        let record = &mut records[i];
        if let Some(entry) = row.entry {
            record.entry_time = Some(entry);
        }
        if let Some(exit) = row.exit {
            record.exit_time = Some(exit);
        }
        match row.work_type_code.as_deref().map(|code| (code, WorkType::from_portal_code(code))) {
            Some((_, Some(work_type))) => record.work_type = Some(work_type),
            Some((code, None)) => debug!("Ignoring unknown work type code {code}"),
            None => {}
        }
    }

    records.sort_by_key(|r| r.date());
}

/// Cells to stage for the bulk reveal: selectable, showing data, one per
/// distinct `days` token.
pub(crate) fn staging_cells(cells: &[RawCell]) -> Vec<&RawCell> {
    let mut seen = HashSet::new();
    cells
        .iter()
        .filter(|cell| cell.is_selectable() && cell.has_data() && !cell.day_key.is_empty())
        .filter(|cell| seen.insert(cell.day_key.as_str()))
        .collect()
}

/// Pick the row a single-day reveal produced.
///
/// With an echoed day the row must match it; without one the first row is
/// taken.
pub(crate) fn pick_single_day_row(rows: Vec<DetailRow>, clicked_day: Option<u32>) -> Option<DetailRow> {
    match clicked_day {
        Some(day) => rows.into_iter().find(|row| row.day == day),
        None => rows.into_iter().next(),
    }
}

/// Aria-label fragments the scripts use to find a row's controls.
pub(crate) fn control_labels() -> Value {
    json!({
        "entryLabel": aria::ENTRY,
        "exitLabel": aria::EXIT,
        "typeLabel": aria::REPORT_TYPE,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CellClick {
    pub index: usize,
    pub clicked: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DayKeyClick {
    clicked: bool,
    label: String,
}

impl<B: Browser> CalendarPage<'_, B> {
    /// Snapshot the visible detail rows.
    pub(crate) fn detail_rows(&self) -> Result<Vec<RawDetailRow>> {
        self.session().eval(scripts::DETAIL_ROWS, control_labels(), "detail rows")
    }

    /// Press "clear" when it is shown. Returns whether it was pressed.
    pub(crate) fn clear_selection(&self) -> Result<bool> {
        let cleared = self.session().try_click_visible(&markup::clear_button())?;
        if cleared {
            self.session().wait(timing::AFTER_CLEAR);
        }
        Ok(cleared)
    }

    /// Press "selected days" and wait for the detail form.
    pub(crate) fn reveal_selected(&self) -> Result<bool> {
        if !self.session().try_click(&markup::selected_days_button())? {
            return Ok(false);
        }
        self.session().wait(timing::TABLE_LOAD);
        self.session().wait_for_load()?;
        Ok(true)
    }

    /// Click grid cells by snapshot index. Returns the indices clicked.
    pub(crate) fn click_cells(&self, indices: &[usize]) -> Result<Vec<usize>> {
        let clicks: Vec<CellClick> = self
            .session()
            .eval(scripts::CLICK_CELLS, json!({ "indices": indices }), "cell clicks")?;
        Ok(clicks.into_iter().filter(|c| c.clicked).map(|c| c.index).collect())
    }

    /// Select every cell with data. Returns the `days` tokens clicked.
    fn stage_cells_with_data(&self) -> Result<Vec<String>> {
        let cells = self.cells(false)?;
        let staged = staging_cells(&cells);
        let indices: Vec<usize> = staged.iter().map(|c| c.index).collect();
        let clicked = self.click_cells(&indices)?;
        if !clicked.is_empty() {
            self.session().wait(timing::AFTER_CLICK);
        }
        let keys: Vec<String> = staged
            .into_iter()
            .filter(|c| clicked.contains(&c.index))
            .map(|c| c.day_key.clone())
            .collect();
        debug!("Staged {} days with data", keys.len());
        Ok(keys)
    }

    /// Reveal one day on its own and read its row.
    fn read_single_day(&self, day_key: &str) -> Result<Option<DetailRow>> {
        self.clear_selection()?;
        let click: DayKeyClick = self
            .session()
            .eval(scripts::CLICK_DAY_KEY, json!({ "dayKey": day_key }), "day click")?;
        if !click.clicked {
            debug!("Cell {day_key} could not be clicked");
            return Ok(None);
        }
        self.session().wait(timing::AFTER_CLICK);
        if !self.reveal_selected()? {
            return Ok(None);
        }

        let rows: Vec<DetailRow> = self.detail_rows()?.iter().filter_map(RawDetailRow::parse).collect();
        Ok(pick_single_day_row(rows, parse::parse_day_number(&click.label)))
    }

    /// Complete coarse `records` with values from the detail form.
    ///
    /// When the bulk reveal returns fewer rows than days were staged, the
    /// staged days are re-read one at a time.
    pub fn reconcile(&self, records: &mut [AttendanceRecord]) -> Result<()> {
        let staged = self.stage_cells_with_data()?;
        if !self.reveal_selected()? {
            warn!("Could not find the selected-days button; keeping grid values only");
            return Ok(());
        }

        let mut rows: DetailRows = self.detail_rows()?.iter().filter_map(RawDetailRow::parse).collect();
        if staged.len() > rows.len() {
            info!(
                "Detail form returned {} of {} staged days, reading them one by one",
                rows.len(),
                staged.len()
            );
            for day_key in &staged {
                if let Some(row) = self.read_single_day(day_key)? {
                    rows.insert(row);
                }
            }
        }

        apply_detail_rows(records, &rows);
        if let (Some(first), Some(last)) = (records.first(), records.last()) {
            info!(
                "Parsed {} days ({} - {})",
                records.len(),
                first.date().format("%d/%m"),
                last.date().format("%d/%m")
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn time_cell(ov: &str, inputs: &[(&str, bool)]) -> RawTimeCell {
        RawTimeCell {
            present: true,
            ov: ov.to_string(),
            text: String::new(),
            inputs: inputs
                .iter()
                .map(|(value, editable)| RawInput {
                    value: value.to_string(),
                    editable: *editable,
                })
                .collect(),
        }
    }

    fn row(day: u32, month: u32) -> DetailRow {
        DetailRow {
            day,
            month,
            entry: None,
            exit: None,
            work_type_code: None,
            missing_entry: false,
            missing_exit: false,
        }
    }

    #[test]
    fn test_time_extractor_order() {
        assert_eq!(extract_time(&time_cell("08:10", &[("09:00", true)])), Some(hm(8, 10)));
        assert_eq!(
            extract_time(&time_cell("--:--", &[("07:00", false), ("09:00", true)])),
            Some(hm(9, 0))
        );
        assert_eq!(extract_time(&time_cell("", &[("07:00", false), ("", true)])), Some(hm(7, 0)));
        assert_eq!(extract_time(&time_cell("\u{a0}", &[])), None);
    }

    #[test]
    fn test_raw_row_date_prefers_attribute() {
        let raw = RawDetailRow {
            date_ov: "21/12".to_string(),
            date_text: "22/12 ב'".to_string(),
            ..Default::default()
        };
        assert_eq!(raw.date(), Some((21, 12)));

        let raw = RawDetailRow {
            date_text: "03/01 ש'".to_string(),
            ..Default::default()
        };
        assert_eq!(raw.date(), Some((3, 1)));
        assert!(RawDetailRow::default().parse().is_none());
    }

    #[test]
    fn test_lone_token_goes_to_the_present_side() {
        let mut raw = RawDetailRow {
            date_ov: "5/1".to_string(),
            special_text: format!("{} 09:12", notices::MISSING_EXIT),
            work_type_code: " 103 ".to_string(),
            ..Default::default()
        };
        let parsed = raw.parse().unwrap();
        assert_eq!(parsed.entry, Some(hm(9, 12)));
        assert_eq!(parsed.exit, None);
        assert!(parsed.missing_exit);
        assert_eq!(parsed.work_type_code.as_deref(), Some("103"));

        raw.special_text = format!("{} 17:40", notices::MISSING_ENTRY);
        let parsed = raw.parse().unwrap();
        assert_eq!(parsed.exit, Some(hm(17, 40)));
        assert_eq!(parsed.entry, None);

        // Two tokens are ambiguous.
        raw.special_text = format!("{} 08:00 17:40", notices::MISSING_ENTRY);
        let parsed = raw.parse().unwrap();
        assert_eq!((parsed.entry, parsed.exit), (None, None));
    }

    #[test]
    fn test_merge_keeps_first_values() {
        let mut first = row(5, 1);
        first.entry = Some(hm(9, 0));
        let mut second = row(5, 1);
        second.exit = Some(hm(18, 0));
        second.missing_exit = true;
        second.work_type_code = Some("101".to_string());
        let mut third = row(5, 1);
        third.entry = Some(hm(7, 0));

        let rows: DetailRows = [first, second, third, row(6, 1)].into_iter().collect();
        assert_eq!(rows.len(), 2);
        let merged = rows.iter().next().unwrap();
        assert_eq!(merged.entry, Some(hm(9, 0)));
        assert_eq!(merged.exit, Some(hm(18, 0)));
        assert_eq!(merged.work_type_code.as_deref(), Some("101"));
        assert!(merged.missing_exit);

        let mut rows = rows;
        rows.insert(row(5, 1));
        assert_eq!(rows.iter().next().unwrap().entry, Some(hm(9, 0)));
    }

    #[test]
    fn test_apply_detail_rows() {
        let d = |m, day| NaiveDate::from_ymd_opt(2026, m, day).unwrap();
        let mut coarse_late = AttendanceRecord::new(d(1, 6));
        coarse_late.entry_time = Some(hm(8, 0));
        let mut records = vec![coarse_late, AttendanceRecord::new(d(1, 5))];

        let mut full = row(5, 1);
        full.entry = Some(hm(9, 0));
        full.exit = Some(hm(18, 0));
        full.work_type_code = Some("101".to_string());
        let mut unknown = row(6, 1);
        unknown.work_type_code = Some("999".to_string());
        let rows: DetailRows = [full, unknown, row(30, 11)].into_iter().collect();

        apply_detail_rows(&mut records, &rows);
        assert_eq!(records[0].date(), d(1, 5));
        assert!(records[0].is_complete());
        assert_eq!(records[0].work_type, Some(WorkType::Home));
        // Empty detail values never erase grid data.
        assert_eq!(records[1].entry_time, Some(hm(8, 0)));
        assert_eq!(records[1].work_type, None);
    }

    #[test]
    fn test_staging_dedupes_and_filters() {
        let cell = |index, key: &str, filled, visible| RawCell {
            index,
            day_key: key.to_string(),
            filled,
            clickable: true,
            visible,
            ..Default::default()
        };
        let cells = vec![
            cell(0, "a", true, true),
            cell(1, "a", true, true),
            cell(2, "b", false, true),
            cell(3, "c", true, false),
            cell(4, "", true, true),
            cell(5, "d", true, true),
        ];
        let staged: Vec<usize> = staging_cells(&cells).iter().map(|c| c.index).collect();
        assert_eq!(staged, vec![0, 5]);
    }

    #[test]
    fn test_pick_single_day_row() {
        let rows = vec![row(4, 1), row(5, 1)];
        assert_eq!(pick_single_day_row(rows.clone(), Some(5)).map(|r| r.day), Some(5));
        assert_eq!(pick_single_day_row(rows.clone(), Some(9)), None);
        assert_eq!(pick_single_day_row(rows, None).map(|r| r.day), Some(4));
    }
}
