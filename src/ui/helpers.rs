use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::db::TableBinding;

/// Widest a grid column may grow when fitted to its contents.
const MAX_COLUMN_WIDTH: usize = 32;

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

/// Describe a chained error as "what failed: why". Single-level errors are
/// shown as is.
pub(crate) fn surface_error(err: &Error) -> String {
    let top = err.to_string();
    match err.chain().last() {
        Some(cause) if err.chain().count() > 1 => format!("{top}: {cause}"),
        _ => top,
    }
}

/// Size each column to its widest header or cell, capped so one long value
/// cannot push the rest off screen.
pub(crate) fn column_widths(binding: &TableBinding) -> Vec<Constraint> {
    binding
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let widest = binding
                .rows()
                .iter()
                .filter_map(|row| row.values.get(idx))
                .map(|value| value.chars().count())
                .chain(std::iter::once(column.display_label.chars().count()))
                .max()
                .unwrap_or(0);
            Constraint::Length(widest.clamp(3, MAX_COLUMN_WIDTH) as u16)
        })
        .collect()
}

/// Replace every character with an asterisk.
pub(crate) fn mask(value: &str) -> String {
    "*".repeat(value.chars().count())
}
