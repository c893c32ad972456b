use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::db::CatalogError;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Cursor position `column` cells right and `row` lines down from the
/// top-left of `inner`, pinned to the last cell of the area when the text runs
/// past its edge.
pub(crate) fn cursor_in(inner: Rect, column: usize, row: usize) -> (u16, u16) {
    let offset = |value: usize| u16::try_from(value).unwrap_or(u16::MAX);
    let x = inner
        .x
        .saturating_add(offset(column))
        .min(inner.right().saturating_sub(1).max(inner.x));
    let y = inner
        .y
        .saturating_add(offset(row))
        .min(inner.bottom().saturating_sub(1).max(inner.y));
    (x, y)
}

/// Footer text for a catalog failure: the action that was attempted and why
/// it failed.
pub(crate) fn failure_message(action: &str, err: &CatalogError) -> String {
    format!("Failed to {action}: {err}")
}
