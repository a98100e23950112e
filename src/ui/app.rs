use std::mem;

use anyhow::{Error, Result};
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, TableState, Wrap,
};
use ratatui::Frame;

use crate::models::RowState;
use crate::workspace::{Command, Outcome, Workspace};

use super::forms::{CellForm, ConfirmDelete, ConfirmQuit, RecordForm};
use super::grid::GridView;
use super::helpers::{centered_rect, column_widths, surface_error};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Width of the table selector sidebar.
const SIDEBAR_WIDTH: u16 = 26;
/// Rows skipped by PageUp/PageDown.
const PAGE_ROWS: isize = 10;

/// Fine-grained modes layered over the grid.
enum Mode {
    Normal,
    Adding(RecordForm),
    EditingCell(CellForm),
    ConfirmDelete(ConfirmDelete),
    ConfirmQuit(ConfirmQuit),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    workspace: Workspace,
    views: Vec<GridView>,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(workspace: Workspace) -> Self {
        let views = vec![GridView::default(); workspace.bindings().len()];
        Self {
            workspace,
            views,
            mode: Mode::Normal,
            status: None,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Hand the workspace back so the caller can close the store.
    pub fn into_workspace(self) -> Workspace {
        self.workspace
    }

    /// Process one key press. Returns `true` when the app should exit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Adding(form) => self.handle_add_record(code, form)?,
            Mode::EditingCell(form) => self.handle_edit_cell(code, form)?,
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm)?,
            Mode::ConfirmQuit(confirm) => self.handle_confirm_quit(code, confirm, &mut exit),
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                let tables = self.tables_with_pending_changes();
                if tables.is_empty() {
                    *exit = true;
                } else {
                    return Ok(Mode::ConfirmQuit(ConfirmQuit { tables }));
                }
            }
            KeyCode::Tab => self.select_relative(1),
            KeyCode::BackTab => self.select_relative(-1),
            KeyCode::Char(ch @ '1'..='9') => {
                let index = ch as usize - '1' as usize;
                if index < self.workspace.switcher().len() {
                    self.select_table(index);
                }
            }
            KeyCode::Up => self.move_row(-1),
            KeyCode::Down => self.move_row(1),
            KeyCode::PageUp => self.move_row(-PAGE_ROWS),
            KeyCode::PageDown => self.move_row(PAGE_ROWS),
            KeyCode::Home => {
                if let Some(view) = self.current_view_mut() {
                    view.first_row();
                }
            }
            KeyCode::End => {
                let rows = self.visible_row_count();
                if let Some(view) = self.current_view_mut() {
                    view.last_row(rows);
                }
            }
            KeyCode::Left => self.move_column(-1),
            KeyCode::Right => self.move_column(1),
            KeyCode::Char(' ') => {
                if self.visible_row_count() > 0 {
                    if let Some(view) = self.current_view_mut() {
                        let marked = view.toggle_mark();
                        let row = view.row + 1;
                        let text = if marked {
                            format!("Marked row {row}.")
                        } else {
                            format!("Unmarked row {row}.")
                        };
                        self.set_status(text, StatusKind::Info);
                    }
                }
            }
            KeyCode::Char('a') | KeyCode::Char('A') | KeyCode::Char('+') => {
                match self.workspace.open_editor() {
                    Ok(session) => {
                        self.clear_status();
                        return Ok(Mode::Adding(RecordForm::new(session)));
                    }
                    Err(err) => self.report_error(err.into()),
                }
            }
            KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Char('-') | KeyCode::Delete => {
                if let Some(confirm) = self.delete_confirmation() {
                    self.clear_status();
                    return Ok(Mode::ConfirmDelete(confirm));
                }
            }
            KeyCode::Char('e') | KeyCode::Char('E') | KeyCode::Enter => {
                if let Some(form) = self.cell_form() {
                    self.clear_status();
                    return Ok(Mode::EditingCell(form));
                }
            }
            KeyCode::Char('u') | KeyCode::Char('U') => {
                match self.workspace.dispatch(Command::UpdateRecord) {
                    Ok(Outcome::Updated(written)) => {
                        self.sync_current_view(true);
                        self.set_status(format!("Saved {written} row(s)."), StatusKind::Info);
                    }
                    Ok(_) => {}
                    Err(err) => {
                        self.sync_current_view(false);
                        self.report_error(err.into());
                    }
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                match self.workspace.dispatch(Command::Refresh) {
                    Ok(_) => {
                        self.sync_current_view(true);
                        self.set_status("Reloaded from the database.", StatusKind::Info);
                    }
                    Err(err) => self.report_error(err.into()),
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_add_record(&mut self, code: KeyCode, mut form: RecordForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                form.session.cancel();
                self.set_status("Add record cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.workspace.save(&mut form.session) {
                Ok(committed) => {
                    keep_open = false;
                    self.sync_current_view(true);
                    if let Some(rowid) = committed.rowid {
                        self.focus_rowid(rowid);
                    }
                    self.set_status(
                        format!("Added a record to {}.", committed.table),
                        StatusKind::Info,
                    );
                }
                Err(err) => {
                    let message = surface_error(&err.into());
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::Adding(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_edit_cell(&mut self, code: KeyCode, mut form: CellForm) -> Result<Mode> {
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Backspace => {
                form.backspace();
                Ok(Mode::EditingCell(form))
            }
            KeyCode::Enter => {
                let command = Command::EditCell {
                    row: form.row,
                    column: form.column,
                    value: form.value.clone(),
                };
                match self.workspace.dispatch(command) {
                    Ok(_) => {
                        self.set_status(
                            "Change staged. Press u to save or r to discard.",
                            StatusKind::Info,
                        );
                        Ok(Mode::Normal)
                    }
                    Err(err) => {
                        self.report_error(err.into());
                        Ok(Mode::EditingCell(form))
                    }
                }
            }
            KeyCode::Char(ch) => {
                form.push_char(ch);
                Ok(Mode::EditingCell(form))
            }
            _ => Ok(Mode::EditingCell(form)),
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Result<Mode> {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Ok(Mode::Normal)
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let result = self
                    .workspace
                    .dispatch(Command::DeleteRecord(confirm.rows.clone()));
                self.sync_current_view(true);
                match result {
                    Ok(Outcome::Deleted(removed)) => {
                        self.set_status(
                            format!("Deleted {removed} row(s) from {}.", confirm.table),
                            StatusKind::Info,
                        );
                    }
                    Ok(_) => {}
                    Err(err) => self.report_error(err.into()),
                }
                Ok(Mode::Normal)
            }
            _ => Ok(Mode::ConfirmDelete(confirm)),
        }
    }

    fn handle_confirm_quit(&mut self, code: KeyCode, confirm: ConfirmQuit, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                *exit = true;
                Mode::Normal
            }
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => Mode::Normal,
            _ => Mode::ConfirmQuit(confirm),
        }
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(content_area);

        self.draw_selectors(frame, columns[0]);
        self.draw_grid(frame, columns[1]);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::Adding(form) => self.draw_record_form(frame, area, form),
            Mode::EditingCell(form) => self.draw_cell_form(frame, area, form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::ConfirmQuit(confirm) => self.draw_confirm_quit(frame, area, confirm),
            Mode::Normal => {}
        }
    }

    fn draw_selectors(&self, frame: &mut Frame, area: Rect) {
        let switcher = self.workspace.switcher();
        let items: Vec<ListItem> = switcher
            .names()
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let pending = self
                    .workspace
                    .binding(idx)
                    .is_some_and(|binding| binding.has_pending_changes());
                let marker = if pending { "*" } else { " " };
                let text = format!("{} {name}{marker}", idx + 1);
                if switcher.is_visible(idx) {
                    ListItem::new(Line::from(Span::styled(
                        format!("> {text}"),
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )))
                } else {
                    ListItem::new(Line::from(format!("  {text}")))
                }
            })
            .collect();

        let list = List::new(items).block(Block::default().title("Tables").borders(Borders::ALL));
        frame.render_widget(list, area);
    }

    fn draw_grid(&self, frame: &mut Frame, area: Rect) {
        let (Some(index), Some(binding)) = (
            self.workspace.visible_index(),
            self.workspace.visible_binding(),
        ) else {
            let block = Block::default()
                .title("Database Viewer")
                .borders(Borders::ALL);
            let paragraph = Paragraph::new(vec![
                Line::from(""),
                Line::from("Choose a table on the left (1-9 or Tab) to open it."),
            ])
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        };
        let view = &self.views[index];

        let header_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let header = Row::new(
            binding
                .columns()
                .iter()
                .map(|column| Cell::from(column.display_label.clone())),
        )
        .style(header_style);

        let rows = binding.rows().iter().enumerate().map(|(row_idx, row)| {
            let mut style = match row.state {
                RowState::Clean => Style::default(),
                RowState::Modified => Style::default().fg(Color::Yellow),
                RowState::Inserted => Style::default().fg(Color::Green),
            };
            if view.marked.contains(&row_idx) {
                style = style.bg(Color::DarkGray);
            }
            let cells = row.values.iter().enumerate().map(|(col_idx, value)| {
                let cell = Cell::from(value.clone());
                if row_idx == view.row && col_idx == view.column {
                    cell.style(Style::default().add_modifier(Modifier::REVERSED))
                } else {
                    cell
                }
            });
            Row::new(cells).style(style)
        });

        let title = format!(
            "Database Viewer - {} ({} rows)",
            binding.name(),
            binding.row_count()
        );
        let table = Table::new(rows, column_widths(binding))
            .header(header)
            .block(Block::default().title(title).borders(Borders::ALL))
            .column_spacing(2)
            .row_highlight_style(Style::default().add_modifier(Modifier::BOLD));

        let mut state = TableState::default();
        if binding.row_count() > 0 {
            state.select(Some(view.row));
        }
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hints: &[(&str, &str)] = match &self.mode {
            Mode::Adding(_) => &[
                ("[Tab]", " Next field   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            Mode::EditingCell(_) => &[("[Enter]", " Stage change   "), ("[Esc]", " Cancel")],
            Mode::ConfirmDelete(_) | Mode::ConfirmQuit(_) => {
                &[("[y]", " Confirm   "), ("[n]", " Cancel")]
            }
            Mode::Normal if self.workspace.visible_index().is_none() => &[
                ("[1-9]", " Open table   "),
                ("[Tab]", " Next table   "),
                ("[q]", " Quit"),
            ],
            Mode::Normal => &[
                ("[1-9/Tab]", " Table   "),
                ("[a]", " Add   "),
                ("[Space]", " Mark   "),
                ("[d]", " Delete   "),
                ("[e]", " Edit   "),
                ("[u]", " Save   "),
                ("[r]", " Reload   "),
                ("[q]", " Quit"),
            ],
        };

        Line::from(
            hints
                .iter()
                .flat_map(|(key, label)| {
                    [
                        Span::styled(key.to_string(), key_style),
                        Span::raw(label.to_string()),
                    ]
                })
                .collect::<Vec<_>>(),
        )
    }

    fn draw_record_form(&self, frame: &mut Frame, area: Rect, form: &RecordForm) {
        let popup_area = centered_rect(60, 60, area);
        frame.render_widget(Clear, popup_area);

        let title = format!("Add to {}", form.session.table());
        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = form.build_lines();
        lines.push(Line::from(""));
        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);

        let (dx, dy) = form.cursor_offset();
        frame.set_cursor_position((inner.x + dx, inner.y + dy));
    }

    fn draw_cell_form(&self, frame: &mut Frame, area: Rect, form: &CellForm) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let title = format!("Edit row {}", form.row + 1);
        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let prefix = form.prefix();
        let lines = vec![
            Line::from(vec![
                Span::raw(prefix.clone()),
                Span::styled(form.value.clone(), Style::default().fg(Color::Yellow)),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                "Enter to stage • Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);

        let cursor_x = inner.x + (prefix.chars().count() + form.value.chars().count()) as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Removal")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let listed = confirm
            .rows
            .iter()
            .map(|row| (row + 1).to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let lines = vec![
            Line::from(format!("Delete row(s) {listed} from {}?", confirm.table)),
            Line::from("Stored rows are removed from the database immediately."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_confirm_quit(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmQuit) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Unsaved Changes")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!(
                "Staged edits in {} will be lost.",
                confirm.tables.join(", ")
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to quit anyway or N / Esc to go back.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn report_error(&mut self, err: Error) {
        let message = surface_error(&err);
        self.set_status(message, StatusKind::Error);
    }

    fn select_table(&mut self, index: usize) {
        match self.workspace.dispatch(Command::SelectTable(index)) {
            Ok(Outcome::Selected { table, .. }) => {
                self.sync_current_view(false);
                self.set_status(format!("Showing {table}."), StatusKind::Info);
            }
            Ok(_) => {}
            Err(err) => self.report_error(err.into()),
        }
    }

    fn select_relative(&mut self, offset: isize) {
        if let Some(index) = self.workspace.switcher().relative(offset) {
            self.select_table(index);
        }
    }

    fn current_view_mut(&mut self) -> Option<&mut GridView> {
        let index = self.workspace.visible_index()?;
        self.views.get_mut(index)
    }

    fn visible_row_count(&self) -> usize {
        self.workspace
            .visible_binding()
            .map(|binding| binding.row_count())
            .unwrap_or(0)
    }

    fn visible_column_count(&self) -> usize {
        self.workspace
            .visible_binding()
            .map(|binding| binding.columns().len())
            .unwrap_or(0)
    }

    fn move_row(&mut self, offset: isize) {
        let rows = self.visible_row_count();
        if let Some(view) = self.current_view_mut() {
            view.move_row(offset, rows);
        }
    }

    fn move_column(&mut self, offset: isize) {
        let columns = self.visible_column_count();
        if let Some(view) = self.current_view_mut() {
            view.move_column(offset, columns);
        }
    }

    /// Bring the visible table's cursor back inside its rows, optionally
    /// dropping row marks whose indices no longer mean the same row.
    fn sync_current_view(&mut self, clear_marks: bool) {
        let rows = self.visible_row_count();
        let columns = self.visible_column_count();
        if let Some(view) = self.current_view_mut() {
            if clear_marks {
                view.reset(rows, columns);
            } else {
                view.clamp(rows, columns);
            }
        }
    }

    fn focus_rowid(&mut self, rowid: i64) {
        let position = self
            .workspace
            .visible_binding()
            .and_then(|binding| binding.position_of(rowid));
        if let (Some(row), Some(view)) = (position, self.current_view_mut()) {
            view.row = row;
        }
    }

    fn delete_confirmation(&mut self) -> Option<ConfirmDelete> {
        let Some(index) = self.workspace.visible_index() else {
            self.set_status("No table selected.", StatusKind::Error);
            return None;
        };
        let rows = self.visible_row_count();
        let targets = self.views[index].delete_targets(rows);
        if targets.is_empty() {
            self.set_status("No rows to delete.", StatusKind::Error);
            return None;
        }
        Some(ConfirmDelete {
            table: self.workspace.switcher().names()[index].clone(),
            rows: targets,
        })
    }

    fn cell_form(&mut self) -> Option<CellForm> {
        let form = self.workspace.visible_index().and_then(|index| {
            let binding = self.workspace.binding(index)?;
            let view = &self.views[index];
            let row = binding.row(view.row)?;
            let column = binding.columns().get(view.column)?;
            Some(CellForm {
                row: view.row,
                column: view.column,
                label: column.display_label.clone(),
                value: row.values.get(view.column).cloned().unwrap_or_default(),
            })
        });
        if form.is_none() {
            self.set_status("No cell to edit.", StatusKind::Error);
        }
        form
    }

    fn tables_with_pending_changes(&self) -> Vec<String> {
        self.workspace
            .bindings()
            .iter()
            .filter(|binding| binding.has_pending_changes())
            .map(|binding| binding.name().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;

    fn app() -> App {
        let store = Store::open_in_memory().unwrap();
        store
            .conn()
            .execute_batch(
                "CREATE TABLE flowers (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
                 CREATE TABLE user (id INTEGER PRIMARY KEY, login TEXT, password TEXT);
                 INSERT INTO flowers (name) VALUES ('rose'), ('tulip'), ('lily');",
            )
            .unwrap();
        let tables = vec!["flowers".to_string(), "user".to_string()];
        App::new(Workspace::new(store, &tables, "user").unwrap())
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch)).unwrap();
        }
    }

    #[test]
    fn number_keys_switch_tables() {
        let mut app = app();
        assert_eq!(app.workspace().visible_index(), None);
        app.handle_key(KeyCode::Char('2')).unwrap();
        assert_eq!(app.workspace().visible_index(), Some(1));
        app.handle_key(KeyCode::Char('9')).unwrap();
        assert_eq!(app.workspace().visible_index(), Some(1));
        app.handle_key(KeyCode::Tab).unwrap();
        assert_eq!(app.workspace().visible_index(), Some(0));
    }

    #[test]
    fn add_without_table_reports_error() {
        let mut app = app();
        app.handle_key(KeyCode::Char('a')).unwrap();
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.status.as_ref().unwrap().text, "No table selected.");
    }

    #[test]
    fn weak_password_keeps_form_open() {
        let mut app = app();
        app.handle_key(KeyCode::Char('2')).unwrap();
        app.handle_key(KeyCode::Char('a')).unwrap();
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "guest");
        app.handle_key(KeyCode::Tab).unwrap();
        type_text(&mut app, "password");
        app.handle_key(KeyCode::Enter).unwrap();

        match &app.mode {
            Mode::Adding(form) => assert!(form.error.is_some()),
            _ => panic!("form should stay open"),
        }
        assert_eq!(app.workspace().binding(1).unwrap().row_count(), 0);

        for _ in 0.."password".len() {
            app.handle_key(KeyCode::Backspace).unwrap();
        }
        type_text(&mut app, "pw12");
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(app.workspace().binding(1).unwrap().row_count(), 1);
    }

    #[test]
    fn marked_rows_are_deleted_after_confirmation() {
        let mut app = app();
        app.handle_key(KeyCode::Char('1')).unwrap();
        app.handle_key(KeyCode::Char(' ')).unwrap();
        app.handle_key(KeyCode::Down).unwrap();
        app.handle_key(KeyCode::Down).unwrap();
        app.handle_key(KeyCode::Char(' ')).unwrap();
        app.handle_key(KeyCode::Char('d')).unwrap();
        assert!(matches!(app.mode, Mode::ConfirmDelete(_)));

        app.handle_key(KeyCode::Char('y')).unwrap();
        let binding = app.workspace().binding(0).unwrap();
        assert_eq!(binding.row_count(), 1);
        assert_eq!(binding.row(0).unwrap().values[1], "tulip");
    }

    #[test]
    fn staged_cell_edit_blocks_quick_quit() {
        let mut app = app();
        app.handle_key(KeyCode::Char('1')).unwrap();
        app.handle_key(KeyCode::Right).unwrap();
        app.handle_key(KeyCode::Char('e')).unwrap();
        app.handle_key(KeyCode::Backspace).unwrap();
        type_text(&mut app, "e!");
        app.handle_key(KeyCode::Enter).unwrap();
        assert!(app.workspace().binding(0).unwrap().has_pending_changes());

        assert!(!app.handle_key(KeyCode::Char('q')).unwrap());
        assert!(matches!(app.mode, Mode::ConfirmQuit(_)));
        app.handle_key(KeyCode::Char('n')).unwrap();

        app.handle_key(KeyCode::Char('u')).unwrap();
        let binding = app.workspace().binding(0).unwrap();
        assert!(!binding.has_pending_changes());
        assert_eq!(binding.row(0).unwrap().values[1], "rose!");
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }
}
