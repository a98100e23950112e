use std::collections::BTreeSet;

/// Cursor and row marks for one table surface. Kept per table so switching
/// back restores where the user was.
#[derive(Debug, Default, Clone)]
pub(crate) struct GridView {
    pub(crate) row: usize,
    pub(crate) column: usize,
    pub(crate) marked: BTreeSet<usize>,
}

impl GridView {
    pub(crate) fn move_row(&mut self, offset: isize, rows: usize) {
        if rows == 0 {
            self.row = 0;
            return;
        }
        let next = self.row as isize + offset;
        self.row = next.clamp(0, rows as isize - 1) as usize;
    }

    pub(crate) fn move_column(&mut self, offset: isize, columns: usize) {
        if columns == 0 {
            self.column = 0;
            return;
        }
        let next = self.column as isize + offset;
        self.column = next.clamp(0, columns as isize - 1) as usize;
    }

    pub(crate) fn first_row(&mut self) {
        self.row = 0;
    }

    pub(crate) fn last_row(&mut self, rows: usize) {
        self.row = rows.saturating_sub(1);
    }

    /// Toggle the mark on the cursor row; returns the new mark state.
    pub(crate) fn toggle_mark(&mut self) -> bool {
        if self.marked.remove(&self.row) {
            false
        } else {
            self.marked.insert(self.row);
            true
        }
    }

    /// Rows a delete should act on: the marked ones, else the cursor row.
    pub(crate) fn delete_targets(&self, rows: usize) -> Vec<usize> {
        if self.marked.is_empty() {
            if self.row < rows {
                vec![self.row]
            } else {
                Vec::new()
            }
        } else {
            self.marked.iter().copied().filter(|&row| row < rows).collect()
        }
    }

    /// Drop marks and pull the cursor back inside the grid after the row set
    /// changed underneath it.
    pub(crate) fn reset(&mut self, rows: usize, columns: usize) {
        self.marked.clear();
        self.clamp(rows, columns);
    }

    pub(crate) fn clamp(&mut self, rows: usize, columns: usize) {
        self.row = self.row.min(rows.saturating_sub(1));
        self.column = self.column.min(columns.saturating_sub(1));
        self.marked.retain(|&row| row < rows);
    }
}
