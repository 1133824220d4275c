//! Hilan markup conventions: page paths, selectors, control-id patterns and
//! re-render waits.

use std::time::Duration;

use crate::vocabulary::buttons;

// Page paths, relative to the portal base URL.
pub(crate) const LOGIN_PATH: &str = "/login";
pub(crate) const HOME_PATH: &str = "/Hilannetv2/ng/personal-file/home";
pub(crate) const CALENDAR_PATH: &str = "/Hilannetv2/Attendance/calendarpage.aspx";

// Login form
pub(crate) const USERNAME_INPUT: &str = r#"input[type="text"]"#;
pub(crate) const PASSWORD_INPUT: &str = r#"input[type="password"]"#;
pub(crate) const SUBMIT_BUTTON: &str = r#"button[type="submit"]"#;

// Calendar month dropdown. The id is shared by a span and a ul.
pub(crate) const MONTH_DROPDOWN_ID: &str = "ctl00_mp_calendar_monthChanged";

/// Fallback save control, looked up by generated id.
pub(crate) const SAVE_BUTTON_ID_FRAGMENT: &str = "btnSave";

/// Class on grid cells that already carry reported data.
pub(crate) const FILLED_DAY_CLASS: &str = "cDIES";

/// Selector for an `input` whose value is `caption`.
pub(crate) fn button(caption: &str) -> String {
    format!(r#"input[value="{caption}"]"#)
}

pub(crate) fn clear_button() -> String {
    button(buttons::CLEAR)
}

pub(crate) fn selected_days_button() -> String {
    button(buttons::SELECTED_DAYS)
}

pub(crate) fn save_button() -> String {
    button(buttons::SAVE)
}

/// Dropdown item for a pay period, keyed by its `DD/MM/YYYY` start date.
pub(crate) fn month_item(item_value: &str) -> String {
    format!(r#"li[itemvalue="{item_value}"]"#)
}

/// Waits after UI-mutating actions.
pub(crate) mod timing {
    use super::Duration;

    pub const AFTER_LOGIN: Duration = Duration::from_millis(1000);
    pub const AFTER_CLICK: Duration = Duration::from_millis(300);
    pub const AFTER_CLEAR: Duration = Duration::from_millis(200);
    pub const AFTER_FILL: Duration = Duration::from_millis(100);
    pub const AFTER_NOTICE: Duration = Duration::from_millis(200);
    pub const TABLE_LOAD: Duration = Duration::from_millis(500);
    pub const AFTER_SAVE: Duration = Duration::from_millis(500);
    pub const DROPDOWN: Duration = Duration::from_millis(300);
    pub const DROPDOWN_OPEN: Duration = Duration::from_millis(100);
}
