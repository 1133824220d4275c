//! Scripted in-memory portal implementing [`Browser`] for tests.
//!
//! Models just enough of Hilan: a login form, a calendar grid of day cells,
//! a selection that "selected days" turns into detail rows, a rejection
//! notice, control writes and a save button. Every trait call is logged.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::time::Duration;

use serde_json::{Value, json};

use super::browser::{Browser, LoadState};
use super::error::{BrowserError, Result};
use super::markup;
use super::scripts;

pub(crate) const BASE_URL: &str = "https://acme.hilan.co.il";
pub(crate) const USERNAME: &str = "123456";
pub(crate) const PASSWORD: &str = "secret";

/// One day of the fake grid and its detail row.
#[derive(Debug, Clone)]
pub(crate) struct FakeDay {
    pub day: u32,
    pub month: u32,
    /// Grid marker (time or status text).
    pub title: String,
    pub filled: bool,
    /// Hidden from the quick visibility check, shown to the thorough one.
    pub needs_thorough: bool,
    pub entry: String,
    pub exit: String,
    pub special: String,
    pub work_code: String,
}

impl FakeDay {
    pub fn empty(day: u32, month: u32) -> Self {
        Self {
            day,
            month,
            title: String::new(),
            filled: false,
            needs_thorough: false,
            entry: String::new(),
            exit: String::new(),
            special: String::new(),
            work_code: String::new(),
        }
    }

    /// A day with data in both grid and detail form.
    pub fn reported(day: u32, month: u32, entry: &str, exit: &str, work_code: &str) -> Self {
        Self {
            title: entry.to_string(),
            filled: true,
            entry: entry.to_string(),
            exit: exit.to_string(),
            work_code: work_code.to_string(),
            ..Self::empty(day, month)
        }
    }

    fn key(&self) -> String {
        format!("{}-{}", self.month, self.day)
    }

    fn cell_json(&self, index: usize, thorough: bool) -> Value {
        json!({
            "index": index,
            "dayKey": self.key(),
            "ariaLabel": self.day.to_string(),
            "markerDay": self.day.to_string(),
            "title": self.title,
            "markerText": "",
            "filled": self.filled,
            "clickable": true,
            "visible": thorough || !self.needs_thorough,
        })
    }

    fn row_json(&self, row_index: usize) -> Value {
        let time_cell = |value: &str| {
            json!({
                "present": true,
                "ov": "",
                "text": "",
                "inputs": [
                    { "value": "", "editable": false },
                    { "value": value, "editable": true },
                ],
            })
        };
        json!({
            "rowIndex": row_index,
            "dateOv": format!("{:02}/{:02}", self.day, self.month),
            "dateText": "",
            "specialText": self.special,
            "entry": time_cell(&self.entry),
            "exit": time_cell(&self.exit),
            "workTypeCode": self.work_code,
            "controls": {
                "entry": [false, true],
                "exit": [false, true],
                "workType": [true],
            },
        })
    }
}

/// A control write the automation performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Write {
    pub date: String,
    pub field: String,
    pub ordinal: usize,
    pub value: String,
}

pub(crate) struct FakePortal {
    pub days: Vec<FakeDay>,
    pub month_label: String,
    /// `itemvalue`s of the month dropdown.
    pub month_items: Vec<String>,
    /// Reveals to answer with the "no days selected" notice.
    pub reject_reveals: Cell<usize>,
    /// Caps how many rows a multi-day reveal returns.
    pub bulk_row_limit: Option<usize>,
    pub has_reveal_button: bool,
    pub save_visible: bool,
    pub has_fallback_save: bool,
    url: RefCell<String>,
    selection: RefCell<BTreeSet<String>>,
    revealed: RefCell<Vec<usize>>,
    notice: Cell<bool>,
    saved: Cell<bool>,
    reveals: Cell<usize>,
    writes: RefCell<Vec<Write>>,
    filled_fields: RefCell<Vec<(String, String)>>,
    calls: RefCell<Vec<String>>,
}

impl FakePortal {
    pub fn new(days: Vec<FakeDay>) -> Self {
        Self {
            days,
            month_label: "ינואר 2026".to_string(),
            month_items: vec!["20/12/2025".to_string()],
            reject_reveals: Cell::new(0),
            bulk_row_limit: None,
            has_reveal_button: true,
            save_visible: true,
            has_fallback_save: true,
            url: RefCell::new("about:blank".to_string()),
            selection: RefCell::new(BTreeSet::new()),
            revealed: RefCell::new(Vec::new()),
            notice: Cell::new(false),
            saved: Cell::new(false),
            reveals: Cell::new(0),
            writes: RefCell::new(Vec::new()),
            filled_fields: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn clicks(&self) -> usize {
        self.calls.borrow().iter().filter(|c| c.starts_with("click")).count()
    }

    pub fn writes(&self) -> Vec<Write> {
        self.writes.borrow().clone()
    }

    pub fn saved(&self) -> bool {
        self.saved.get()
    }

    pub fn reveals(&self) -> usize {
        self.reveals.get()
    }

    pub fn filled_fields(&self) -> Vec<(String, String)> {
        self.filled_fields.borrow().clone()
    }

    fn log(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn reveal(&self) {
        self.reveals.set(self.reveals.get() + 1);
        let selection = self.selection.borrow();
        let pending_rejections = self.reject_reveals.get();
        if selection.is_empty() || pending_rejections > 0 {
            self.reject_reveals.set(pending_rejections.saturating_sub(1));
            self.notice.set(true);
            self.revealed.borrow_mut().clear();
            return;
        }
        let mut rows: Vec<usize> = self
            .days
            .iter()
            .enumerate()
            .filter(|(_, day)| selection.contains(&day.key()))
            .map(|(i, _)| i)
            .collect();
        if let Some(limit) = self.bulk_row_limit.filter(|_| selection.len() > 1) {
            rows.truncate(limit);
        }
        *self.revealed.borrow_mut() = rows;
    }

    fn select(&self, index: usize) -> bool {
        match self.days.get(index) {
            Some(day) => {
                self.selection.borrow_mut().insert(day.key());
                true
            }
            None => false,
        }
    }

    fn write_controls(&self, arg: &Value) -> Value {
        let row_index = arg["rowIndex"].as_u64().unwrap_or_default() as usize;
        let revealed = self.revealed.borrow();
        let Some(day) = revealed.iter().find(|&&i| i == row_index).map(|&i| &self.days[i]) else {
            return json!([]);
        };
        let writes = arg["writes"].as_array().cloned().unwrap_or_default();
        let results: Vec<bool> = writes
            .iter()
            .map(|write| {
                self.writes.borrow_mut().push(Write {
                    date: format!("{:02}/{:02}", day.day, day.month),
                    field: write["field"].as_str().unwrap_or_default().to_string(),
                    ordinal: write["ordinal"].as_u64().unwrap_or_default() as usize,
                    value: write["value"].as_str().unwrap_or_default().to_string(),
                });
                true
            })
            .collect();
        json!(results)
    }
}

impl Browser for FakePortal {
    fn goto(&self, url: &str) -> Result<()> {
        self.log(format!("goto {url}"));
        *self.url.borrow_mut() = url.to_string();
        Ok(())
    }

    fn current_url(&self) -> Result<String> {
        self.log("current_url".to_string());
        Ok(self.url.borrow().clone())
    }

    fn wait_for(&self, state: LoadState) -> Result<()> {
        self.log(format!("wait_for {state:?}"));
        Ok(())
    }

    fn count(&self, selector: &str) -> Result<usize> {
        self.log(format!("count {selector}"));
        let present = match selector {
            markup::USERNAME_INPUT | markup::PASSWORD_INPUT | markup::SUBMIT_BUTTON => {
                self.url.borrow().ends_with(markup::LOGIN_PATH)
            }
            s if s == markup::clear_button() => true,
            s if s == markup::selected_days_button() => self.has_reveal_button,
            s if s == markup::save_button() => true,
            s if s == format!("span#{}", markup::MONTH_DROPDOWN_ID) => true,
            s => self.month_items.iter().any(|item| markup::month_item(item) == s),
        };
        Ok(usize::from(present))
    }

    fn is_visible(&self, selector: &str) -> Result<bool> {
        self.log(format!("is_visible {selector}"));
        if selector == markup::save_button() {
            return Ok(self.save_visible);
        }
        Ok(true)
    }

    fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        self.log(format!("attribute {selector} {name}"));
        Ok(None)
    }

    fn inner_text(&self, selector: &str) -> Result<Option<String>> {
        self.log(format!("inner_text {selector}"));
        Ok(None)
    }

    fn click(&self, selector: &str) -> Result<()> {
        self.log(format!("click {selector}"));
        if selector == markup::SUBMIT_BUTTON {
            let filled = self.filled_fields.borrow();
            let has = |sel: &str, value: &str| filled.iter().any(|(s, v)| s == sel && v == value);
            if has(markup::USERNAME_INPUT, USERNAME) && has(markup::PASSWORD_INPUT, PASSWORD) {
                *self.url.borrow_mut() = format!("{BASE_URL}{}", markup::HOME_PATH);
            }
        } else if selector == markup::clear_button() {
            self.selection.borrow_mut().clear();
            self.revealed.borrow_mut().clear();
        } else if selector == markup::selected_days_button() {
            self.reveal();
        } else if selector == markup::save_button() {
            self.saved.set(true);
        }
        Ok(())
    }

    fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.log(format!("fill {selector}"));
        self.filled_fields
            .borrow_mut()
            .push((selector.to_string(), value.to_string()));
        Ok(())
    }

    fn evaluate(&self, script: &str, arg: Value) -> Result<Value> {
        self.log("evaluate".to_string());
        let value = if script == scripts::CALENDAR_CELLS {
            let thorough = arg["thorough"].as_bool().unwrap_or(false);
            let cells: Vec<Value> = self
                .days
                .iter()
                .enumerate()
                .map(|(i, day)| day.cell_json(i, thorough))
                .collect();
            json!(cells)
        } else if script == scripts::CLICK_CELLS {
            let indices: Vec<usize> = serde_json::from_value(arg["indices"].clone()).unwrap_or_default();
            let clicks: Vec<Value> = indices
                .into_iter()
                .map(|index| json!({ "index": index, "clicked": self.select(index) }))
                .collect();
            json!(clicks)
        } else if script == scripts::CLICK_DAY_KEY {
            let key = arg["dayKey"].as_str().unwrap_or_default();
            match self.days.iter().position(|d| d.key() == key) {
                Some(i) => {
                    self.select(i);
                    json!({ "clicked": true, "label": self.days[i].day.to_string() })
                }
                None => json!({ "clicked": false, "label": "" }),
            }
        } else if script == scripts::DETAIL_ROWS {
            let rows: Vec<Value> = self
                .revealed
                .borrow()
                .iter()
                .map(|&i| self.days[i].row_json(i))
                .collect();
            json!(rows)
        } else if script == scripts::WRITE_CONTROLS {
            self.write_controls(&arg)
        } else if script == scripts::NOTICE_SHOWN {
            json!(self.notice.get())
        } else if script == scripts::DISMISS_NOTICE {
            self.notice.set(false);
            json!(true)
        } else if script == scripts::CLICK_BY_ID_FRAGMENT {
            if self.has_fallback_save {
                self.saved.set(true);
            }
            json!(self.has_fallback_save)
        } else if script == scripts::MONTH_LABEL {
            json!(self.month_label)
        } else if script == scripts::SHOW_MONTH_LIST {
            json!(true)
        } else if script == scripts::CLICK_MONTH_BY_TEXT {
            json!(false)
        } else if script == scripts::MONTH_OPTIONS {
            json!([])
        } else {
            return Err(BrowserError::Script("unknown script".to_string()));
        };
        Ok(value)
    }

    fn pause(&self, duration: Duration) {
        self.log(format!("pause {}ms", duration.as_millis()));
    }
}
