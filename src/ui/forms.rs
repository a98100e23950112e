use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::editor::EditorSession;

use super::helpers::mask;

/// Modal add-record form: an editor session plus which input has focus.
pub(crate) struct RecordForm {
    pub(crate) session: EditorSession,
    pub(crate) active: usize,
    pub(crate) error: Option<String>,
}

impl RecordForm {
    pub(crate) fn new(session: EditorSession) -> Self {
        Self {
            session,
            active: 0,
            error: None,
        }
    }

    pub(crate) fn next_field(&mut self) {
        if !self.session.is_empty() {
            self.active = (self.active + 1) % self.session.len();
        }
    }

    pub(crate) fn previous_field(&mut self) {
        if !self.session.is_empty() {
            self.active = (self.active + self.session.len() - 1) % self.session.len();
        }
    }

    /// Append a character to the focused input, ignoring control characters.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.session.input_mut(self.active) {
            Some(input) => {
                input.push(ch);
                true
            }
            None => false,
        }
    }

    pub(crate) fn backspace(&mut self) {
        if let Some(input) = self.session.input_mut(self.active) {
            input.pop();
        }
    }

    /// Width of the longest label, so inputs line up in one column.
    fn label_width(&self) -> usize {
        self.session
            .columns()
            .iter()
            .map(|column| column.display_label.chars().count())
            .max()
            .unwrap_or(0)
    }

    /// One line per column: label, then the input (masked for the checked
    /// password column).
    pub(crate) fn build_lines(&self) -> Vec<Line<'static>> {
        let width = self.label_width();
        let password_slot = self.session.password_slot();

        self.session
            .columns()
            .iter()
            .zip(self.session.inputs())
            .enumerate()
            .map(|(slot, (column, value))| {
                let display = if value.is_empty() {
                    String::new()
                } else if Some(slot) == password_slot {
                    mask(value)
                } else {
                    value.clone()
                };
                let style = if slot == self.active {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::raw(format!("{:>width$}: ", column.display_label)),
                    Span::styled(display, style),
                ])
            })
            .collect()
    }

    /// Cursor position relative to the form body.
    pub(crate) fn cursor_offset(&self) -> (u16, u16) {
        let value_len = self
            .session
            .input(self.active)
            .map(|value| value.chars().count())
            .unwrap_or(0);
        let x = self.label_width() + 2 + value_len;
        (x as u16, self.active as u16)
    }
}

/// Single-cell editor used for staged updates.
pub(crate) struct CellForm {
    pub(crate) row: usize,
    pub(crate) column: usize,
    pub(crate) label: String,
    pub(crate) value: String,
}

impl CellForm {
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            false
        } else {
            self.value.push(ch);
            true
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.value.pop();
    }

    pub(crate) fn prefix(&self) -> String {
        format!("{}: ", self.label)
    }
}

/// Rows awaiting a Y/N before they are deleted.
#[derive(Clone)]
pub(crate) struct ConfirmDelete {
    pub(crate) table: String,
    pub(crate) rows: Vec<usize>,
}

/// Quit requested while some table still has staged edits.
#[derive(Clone)]
pub(crate) struct ConfirmQuit {
    pub(crate) tables: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Store, TableBinding};

    fn form() -> RecordForm {
        let store = Store::open_in_memory().unwrap();
        store
            .conn()
            .execute("CREATE TABLE user (id INTEGER PRIMARY KEY, login TEXT, password TEXT)", [])
            .unwrap();
        let binding = TableBinding::bind(&store, "user").unwrap();
        RecordForm::new(EditorSession::open(&binding, true))
    }

    #[test]
    fn focus_wraps_in_both_directions() {
        let mut form = form();
        form.previous_field();
        assert_eq!(form.active, 2);
        form.next_field();
        assert_eq!(form.active, 0);
    }

    #[test]
    fn typing_goes_to_the_focused_input() {
        let mut form = form();
        form.next_field();
        assert!(form.push_char('a'));
        assert!(form.push_char('b'));
        assert!(!form.push_char('\n'));
        form.backspace();
        assert_eq!(form.session.input(1), Some("a"));
        assert_eq!(form.cursor_offset(), (8 + 2 + 1, 1));
    }

    #[test]
    fn password_input_is_masked() {
        let mut form = form();
        form.active = 2;
        form.push_char('a');
        form.push_char('1');
        let lines = form.build_lines();
        let rendered: String = lines[2].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(rendered, "password: **");
    }
}
