//! Attendance calendar page: month navigation and the coarse grid scan.

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::browser::Browser;
use super::error::Result;
use super::markup::{self, timing};
use super::page::Page;
use super::scripts;
use super::session::PortalSession;
use crate::models::AttendanceRecord;
use crate::parse;
use crate::period;
use crate::vocabulary;

/// Raw facts about one grid cell (`td[days]`) as captured in the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawCell {
    /// Position in document order at snapshot time.
    pub index: usize,
    /// Stable per-cell token (the `days` attribute).
    pub day_key: String,
    pub aria_label: String,
    pub marker_day: String,
    pub title: String,
    pub marker_text: String,
    pub filled: bool,
    pub clickable: bool,
    pub visible: bool,
}

impl RawCell {
    /// Day-of-month label: an all-digit aria label, else the marker element.
    pub fn day(&self) -> Option<u32> {
        parse::parse_day_number(&self.aria_label).or_else(|| parse::parse_day_number(&self.marker_day))
    }

    /// The cell shows reported data of some kind.
    pub fn has_data(&self) -> bool {
        self.filled || !self.title.trim().is_empty() || !self.marker_text.trim().is_empty()
    }

    pub fn is_selectable(&self) -> bool {
        self.clickable && self.visible
    }

    /// Candidate marker texts, title attribute first. NBSP-only text is
    /// dropped by `trim`.
    fn markers(&self) -> impl Iterator<Item = &str> {
        [self.title.trim(), self.marker_text.trim()]
            .into_iter()
            .filter(|text| !text.is_empty())
    }
}

/// An item of the month dropdown.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct MonthOption {
    value: String,
    text: String,
}

/// Turn one grid cell into a coarse record.
///
/// Returns `None` for cells without a usable day number or whose day does
/// not exist in the month it resolves to.
pub(crate) fn parse_cell(cell: &RawCell, year: i32, month: u32, start_day: u32) -> Option<AttendanceRecord> {
    let Some(day) = cell.day() else {
        debug!("Cell {} has no day label", cell.index);
        return None;
    };
    if !(1..=31).contains(&day) {
        debug!("Cell {} has out-of-range day {day}", cell.index);
        return None;
    }
    let Some(date) = period::cell_to_date(day, month, year, start_day) else {
        debug!("Day {day} does not exist in the period {month}/{year}");
        return None;
    };

    let mut record = AttendanceRecord::new(date);
    for marker in cell.markers() {
        if let Some(time) = parse::parse_time(marker) {
            record.entry_time = Some(time);
            break;
        }
        if let Some(status) = parse::detect_status(marker) {
            record.note = Some(status);
            break;
        }
    }
    Some(record)
}

/// Parse the dropdown label (`"<Hebrew month> <year>"`).
pub(crate) fn parse_month_label(label: &str) -> Option<(i32, u32)> {
    let mut month = None;
    let mut year = None;
    for token in label.split_whitespace() {
        if let Some(m) = vocabulary::month_from_hebrew(token) {
            month = Some(m);
        } else if token.len() == 4 {
            year = token.parse::<i32>().ok().or(year);
        }
    }
    Some((year?, month?))
}

/// Dropdown `itemvalue` for a pay period: its start date as `D/MM/YYYY`.
pub(crate) fn period_item_value(year: i32, month: u32, start_day: u32) -> Option<String> {
    period::period_start(year, month, start_day).map(|start| start.format("%-d/%m/%Y").to_string())
}

/// The attendance calendar: a month grid plus the detail form it reveals.
pub struct CalendarPage<'s, B: Browser> {
    session: &'s PortalSession<B>,
}

impl<B: Browser> Page<B> for CalendarPage<'_, B> {
    const PATH: &'static str = markup::CALENDAR_PATH;

    fn session(&self) -> &PortalSession<B> {
        self.session
    }
}

impl<'s, B: Browser> CalendarPage<'s, B> {
    pub fn new(session: &'s PortalSession<B>) -> Self {
        Self { session }
    }

    /// Period currently shown by the month dropdown.
    pub fn current_period(&self) -> Result<Option<(i32, u32)>> {
        let label: String = self.session.eval(
            scripts::MONTH_LABEL,
            json!({ "id": markup::MONTH_DROPDOWN_ID }),
            "month label",
        )?;
        Ok(parse_month_label(&label))
    }

    /// Switch the grid to the pay period (`year`, `month`).
    ///
    /// Returns `false` when no dropdown item for it could be found.
    pub fn navigate_to_month(&self, year: i32, month: u32) -> Result<bool> {
        if self.current_period()? == Some((year, month)) {
            debug!("Calendar already shows {month}/{year}");
            return Ok(true);
        }
        info!("Switching calendar to {month}/{year}");

        self.session.try_click(&format!("span#{}", markup::MONTH_DROPDOWN_ID))?;
        self.session.wait(timing::DROPDOWN_OPEN);
        let _: bool = self.session.eval(scripts::SHOW_MONTH_LIST, json!({}), "month list")?;
        self.session.wait(timing::DROPDOWN_OPEN);

        let by_value = match period_item_value(year, month, self.session.period_start_day()) {
            Some(value) => self.session.try_click(&markup::month_item(&value))?,
            None => false,
        };
        let clicked = by_value || self.click_month_by_text(year, month)?;
        if !clicked {
            let options: Vec<MonthOption> = self.session.eval(scripts::MONTH_OPTIONS, json!({}), "month options")?;
            let available: Vec<String> = options.iter().map(|o| format!("{} ({})", o.text, o.value)).collect();
            warn!("No dropdown item for {month}/{year}; available: {}", available.join(", "));
            return Ok(false);
        }

        self.session.wait_for_load()?;
        self.session.wait(timing::DROPDOWN);
        Ok(true)
    }

    fn click_month_by_text(&self, year: i32, month: u32) -> Result<bool> {
        let Some(name) = vocabulary::hebrew_month(month) else {
            return Ok(false);
        };
        self.session.eval(
            scripts::CLICK_MONTH_BY_TEXT,
            json!({ "text": format!("{name} {year}") }),
            "month click",
        )
    }

    /// Snapshot every grid cell.
    ///
    /// `thorough` walks ancestor styles to decide visibility, which catches
    /// cells hidden by a collapsed container.
    pub(crate) fn cells(&self, thorough: bool) -> Result<Vec<RawCell>> {
        self.session.eval(
            scripts::CALENDAR_CELLS,
            json!({ "thorough": thorough, "filledClass": markup::FILLED_DAY_CLASS }),
            "calendar cells",
        )
    }

    /// Coarse records for every cell of the grid currently shown for the
    /// pay period (`year`, `month`), in grid order.
    pub fn scan(&self, year: i32, month: u32) -> Result<Vec<AttendanceRecord>> {
        let start_day = self.session.period_start_day();
        let records: Vec<AttendanceRecord> = self
            .cells(false)?
            .iter()
            .filter_map(|cell| parse_cell(cell, year, month, start_day))
            .collect();
        debug!("Scanned {} day cells", records.len());
        Ok(records)
    }
}
