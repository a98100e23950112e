//! Plain data holders shared by the persistence layer, the editor and the TUI.
//! Rows stay "displayable text" on this side of the store; SQLite affinity
//! takes care of turning text back into numbers on write.

use std::fmt;

/// One column of a bound table, fetched once when the binding is created and
/// never changed for the lifetime of that binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name as declared in the store. Used verbatim in SQL.
    pub name: String,
    /// Header text shown above the grid and next to editor inputs.
    pub display_label: String,
    /// Declared type as reported by the store, possibly empty.
    pub declared_type: String,
    /// Set for an `INTEGER PRIMARY KEY` column, which aliases the rowid and
    /// gets a key assigned by SQLite when written as NULL.
    pub rowid_alias: bool,
    normalized_label: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>, rowid_alias: bool) -> Self {
        let name = name.into();
        let display_label = name.clone();
        let normalized_label = display_label.to_lowercase();
        Self {
            name,
            display_label,
            declared_type: declared_type.into(),
            rowid_alias,
            normalized_label,
        }
    }

    /// Case-insensitive label match, done against the label lowered at
    /// construction.
    pub fn label_is(&self, lowercase: &str) -> bool {
        self.normalized_label == lowercase
    }

    pub fn is_password(&self) -> bool {
        self.label_is("password")
    }
}

impl fmt::Display for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_label)
    }
}

/// Where a grid row stands relative to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    /// Mirrors the store.
    Clean,
    /// Stored row with staged value changes.
    Modified,
    /// Staged insert that has never been written.
    Inserted,
}

/// One visible row of a binding, values in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    /// SQLite rowid, `None` until a staged insert is committed.
    pub rowid: Option<i64>,
    pub values: Vec<String>,
    pub state: RowState,
}

impl GridRow {
    pub(crate) fn stored(rowid: i64, values: Vec<String>) -> Self {
        Self {
            rowid: Some(rowid),
            values,
            state: RowState::Clean,
        }
    }

    pub(crate) fn staged(values: Vec<String>) -> Self {
        Self {
            rowid: None,
            values,
            state: RowState::Inserted,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.state != RowState::Clean
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_match_ignores_case() {
        assert!(ColumnDescriptor::new("Password", "TEXT", false).is_password());
        assert!(ColumnDescriptor::new("PASSWORD", "TEXT", false).is_password());
        assert!(!ColumnDescriptor::new("password_hint", "TEXT", false).is_password());
    }

    #[test]
    fn display_label_defaults_to_name() {
        let column = ColumnDescriptor::new("price", "REAL", false);
        assert_eq!(column.display_label, "price");
        assert_eq!(column.to_string(), "price");
    }
}
