//! Scripts evaluated inside the portal page.
//!
//! Each script is a function expression taking one JSON argument. Scripts
//! only snapshot raw DOM facts or perform a requested mutation; parsing and
//! every decision about what to click or write happens on the Rust side.
//!
//! Detail-form controls are addressed by the numeric row index embedded in
//! their generated ids (`..._EmployeeReports_row_<N>_0`), never by table
//! shape: one logical day can be split across several `<tr>`s.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

macro_rules! dom_helpers {
    () => {
        r#"
    const norm = (v) => (v || '').replace(/\u00a0/g, ' ').trim();
    const isVisible = (el) => {
        const style = window.getComputedStyle(el);
        const rect = el.getBoundingClientRect();
        return style.display !== 'none' && style.visibility !== 'hidden' && rect.width > 0 && rect.height > 0;
    };
    const isShown = (el, thorough) => {
        if (!thorough) return el.offsetParent !== null || el.getClientRects().length > 0;
        if (!isVisible(el)) return false;
        for (let p = el.parentElement; p; p = p.parentElement) {
            const style = window.getComputedStyle(p);
            if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') return false;
        }
        return true;
    };
    const byRowId = (selector, pattern, rowIndex) => {
        const re = new RegExp(pattern.replace('{row}', String(rowIndex)) + '(?!\\d)');
        return Array.from(document.querySelectorAll(selector)).filter((el) => re.test(el.id || ''));
    };
    const cellOf = (field, rowIndex) =>
        byRowId(`td[id*="_cellOf_${field}_EmployeeReports_row_"]`, `_cellOf_${field}_EmployeeReports_row_{row}_0`, rowIndex)[0] || null;
    const dateCellOf = (rowIndex) =>
        byRowId('td[id*="_cellOf_ReportDate_row_"]', '_cellOf_ReportDate_row_{row}', rowIndex)[0] || null;
    const rowControls = (rowIndex, labels) => {
        const tr = dateCellOf(rowIndex)?.closest('tr') || null;
        const pick = (field, tag, label) => {
            const cell = cellOf(field, rowIndex);
            const labelled = `${tag}[aria-label*="${label}"]`;
            const inCell = cell ? Array.from(cell.querySelectorAll(labelled)) : [];
            if (inCell.length > 0) return inCell;
            const inRow = tr ? Array.from(tr.querySelectorAll(labelled)) : [];
            if (inRow.length > 0) return inRow;
            return cell ? Array.from(cell.querySelectorAll(tag)) : [];
        };
        return {
            entry: pick('ManualEntry', 'input', labels.entryLabel),
            exit: pick('ManualExit', 'input', labels.exitLabel),
            workType: pick('Symbol.SymbolId', 'select', labels.typeLabel),
        };
    };
    const isEditable = (el) => !el.disabled && !el.readOnly;
"#
    };
}

/// Snapshot of every calendar grid cell (`td[days]`).
///
/// Arg: `{ thorough, filledClass }`. `thorough` switches visibility from the
/// cheap layout check to a computed-style walk over all ancestors.
pub(crate) const CALENDAR_CELLS: &str = concat!(
    "(arg) => {",
    dom_helpers!(),
    r#"
    const thorough = Boolean(arg && arg.thorough);
    return Array.from(document.querySelectorAll('td[days]')).map((cell, index) => ({
        index,
        dayKey: cell.getAttribute('days') || '',
        ariaLabel: cell.getAttribute('aria-label') || '',
        markerDay: cell.querySelector('.dTS')?.textContent || '',
        title: cell.getAttribute('title') || '',
        markerText: cell.querySelector('.cDM')?.textContent || '',
        filled: cell.classList.contains(arg.filledClass),
        clickable: Boolean(cell.onclick),
        visible: isShown(cell, thorough),
    }));
}"#
);

/// Click grid cells by snapshot index. Arg: `{ indices }`.
pub(crate) const CLICK_CELLS: &str = r#"(arg) => {
    const cells = document.querySelectorAll('td[days]');
    return (arg.indices || []).map((index) => {
        const cell = cells[index];
        if (!cell) return { index, clicked: false };
        cell.click();
        return { index, clicked: true };
    });
}"#;

/// Click one cell by its stable `days` token and echo its day label.
/// Arg: `{ dayKey }`.
pub(crate) const CLICK_DAY_KEY: &str = concat!(
    "(arg) => {",
    dom_helpers!(),
    r#"
    const cells = Array.from(document.querySelectorAll('td[days]')).filter((c) => c.getAttribute('days') === arg.dayKey);
    const cell = cells.find((c) => c.onclick && isVisible(c)) || cells.find((c) => c.onclick) || cells[0];
    if (!cell) return { clicked: false, label: '' };
    cell.click();
    return {
        clicked: true,
        label: norm(cell.getAttribute('aria-label')) || norm(cell.querySelector('.dTS')?.textContent),
    };
}"#
);

/// Snapshot of every visible detail row. Arg: `{ entryLabel, exitLabel, typeLabel }`.
pub(crate) const DETAIL_ROWS: &str = concat!(
    "(arg) => {",
    dom_helpers!(),
    r#"
    const readCell = (cell) => cell
        ? {
            present: true,
            ov: cell.getAttribute('ov') || '',
            text: cell.innerText || '',
            inputs: Array.from(cell.querySelectorAll('input')).map((input) => ({
                value: input.value || '',
                editable: isEditable(input),
            })),
        }
        : { present: false, ov: '', text: '', inputs: [] };

    const rows = [];
    for (const dateCell of document.querySelectorAll('td[id*="_cellOf_ReportDate_row_"]')) {
        if (!isVisible(dateCell)) continue;
        const match = (dateCell.id || '').match(/_cellOf_ReportDate_row_(\d+)/);
        if (!match) continue;
        const rowIndex = Number.parseInt(match[1], 10);
        const special = byRowId('td[id*="_special_row_"]', '_special_row_{row}', rowIndex)[0];
        const typeCell = cellOf('Symbol.SymbolId', rowIndex);
        const controls = rowControls(rowIndex, arg);
        rows.push({
            rowIndex,
            dateOv: dateCell.getAttribute('ov') || '',
            dateText: dateCell.innerText || '',
            specialText: special?.innerText || '',
            entry: readCell(cellOf('ManualEntry', rowIndex)),
            exit: readCell(cellOf('ManualExit', rowIndex)),
            workTypeCode: typeCell?.querySelector('select')?.value || '',
            controls: {
                entry: controls.entry.map(isEditable),
                exit: controls.exit.map(isEditable),
                workType: controls.workType.map(isEditable),
            },
        });
    }
    return rows;
}"#
);

/// Write values into one detail row's controls.
///
/// Arg: `{ rowIndex, writes: [{ field, ordinal, value }], entryLabel, exitLabel, typeLabel }`.
/// Returns one boolean per write.
pub(crate) const WRITE_CONTROLS: &str = concat!(
    "(arg) => {",
    dom_helpers!(),
    r#"
    const controls = rowControls(arg.rowIndex, arg);
    return (arg.writes || []).map((write) => {
        const el = (controls[write.field] || [])[write.ordinal];
        if (!el) return false;
        el.value = write.value;
        el.dispatchEvent(new Event('change', { bubbles: true }));
        if (el.tagName === 'INPUT') el.dispatchEvent(new Event('blur', { bubbles: true }));
        return true;
    });
}"#
);

/// Whether a visible notice containing `text` is shown. Arg: `{ text }`.
pub(crate) const NOTICE_SHOWN: &str = concat!(
    "(arg) => {",
    dom_helpers!(),
    r#"
    return Array.from(document.querySelectorAll('div, span, p, td, label'))
        .some((el) => isVisible(el) && norm(el.textContent).includes(arg.text));
}"#
);

/// Dismiss the notice containing `text` by clicking the nearest button.
/// Arg: `{ text }`.
pub(crate) const DISMISS_NOTICE: &str = concat!(
    "(arg) => {",
    dom_helpers!(),
    r#"
    const holders = Array.from(document.querySelectorAll('div, span, p, td, label'))
        .filter((el) => isVisible(el) && norm(el.textContent).includes(arg.text));
    for (const holder of holders.reverse()) {
        for (let scope = holder, depth = 0; scope && depth < 6; scope = scope.parentElement, depth++) {
            const button = Array.from(scope.querySelectorAll('button, input[type="button"], input[type="submit"], a'))
                .find(isVisible);
            if (button) {
                button.click();
                return true;
            }
        }
    }
    return false;
}"#
);

/// Click the first element whose id contains `idFragment`. Arg: `{ idFragment }`.
pub(crate) const CLICK_BY_ID_FRAGMENT: &str = r#"(arg) => {
    const el = document.querySelector(`input[id*="${arg.idFragment}"]`);
    if (!el) return false;
    el.click();
    return true;
}"#;

/// Text of the month dropdown label. Arg: `{ id }`.
pub(crate) const MONTH_LABEL: &str = r#"(arg) => {
    const el = document.querySelector(`span#${arg.id}`) || document.getElementById(arg.id);
    return el ? (el.innerText || '').trim() : '';
}"#;

/// Force the month list open (it starts `display:none`).
pub(crate) const SHOW_MONTH_LIST: &str = r#"(arg) => {
    const list = document.querySelector('.BulletedList');
    if (!list) return false;
    list.style.display = 'block';
    return true;
}"#;

/// Click the month item whose text contains `text`. Arg: `{ text }`.
pub(crate) const CLICK_MONTH_BY_TEXT: &str = concat!(
    "(arg) => {",
    dom_helpers!(),
    r#"
    const item = Array.from(document.querySelectorAll('li')).find((li) => norm(li.innerText).includes(arg.text));
    if (!item) return false;
    item.click();
    return true;
}"#
);

/// Available month items, for diagnostics.
pub(crate) const MONTH_OPTIONS: &str = r#"(arg) => Array.from(document.querySelectorAll('li[itemvalue]'))
    .map((li) => ({ value: li.getAttribute('itemvalue') || '', text: (li.innerText || '').trim() }))"#;

/// Decode a script payload, falling back to `T::default()` when it does not
/// have the expected shape.
pub(crate) fn decode<T: DeserializeOwned + Default>(value: Value, what: &str) -> T {
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!("Malformed {what} payload ({e}): {value}");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scripts_share_helpers() {
        for script in [CALENDAR_CELLS, CLICK_DAY_KEY, DETAIL_ROWS, WRITE_CONTROLS, NOTICE_SHOWN] {
            assert!(script.starts_with("(arg) => {"));
            assert!(script.contains("const isVisible"));
            assert!(script.trim_end().ends_with('}'));
        }
    }

    #[test]
    fn test_decode_falls_back_to_default() {
        let rows: Vec<u32> = decode(json!({ "error": "boom" }), "test");
        assert!(rows.is_empty());
        let flag: bool = decode(json!(true), "test");
        assert!(flag);
        let text: String = decode(Value::Null, "test");
        assert_eq!(text, "");
    }
}
