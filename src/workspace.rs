//! Explicit command surface over the bound tables. The TUI drives everything
//! through these synchronous calls; so can any other front-end.

use tracing::{debug, info};

use crate::config::Config;
use crate::db::{list_tables, Store, TableBinding};
use crate::editor::{Committed, EditorSession};
use crate::error::{CommandError, SaveError, StoreError, ValidationError};
use crate::switcher::TableSwitcher;

/// User-level actions. Everything except `SelectTable` targets the visible
/// table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SelectTable(usize),
    /// Save a new row, one value per column in column order.
    AddRecord(Vec<String>),
    /// Delete these visible rows.
    DeleteRecord(Vec<usize>),
    /// Commit staged edits and re-read the table.
    UpdateRecord,
    /// Stage a new value for one cell.
    EditCell {
        row: usize,
        column: usize,
        value: String,
    },
    /// Re-read the table, dropping staged edits.
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Selected { index: usize, table: String },
    Added(Committed),
    Deleted(usize),
    Updated(usize),
    Staged,
    Refreshed,
}

/// Owns the store handle, one binding per configured table and the switcher
/// that decides which of them is on screen.
pub struct Workspace {
    store: Store,
    bindings: Vec<TableBinding>,
    switcher: TableSwitcher,
    credentials_table: String,
}

impl Workspace {
    /// Open the configured database and bind every configured table.
    pub fn open(config: &Config) -> Result<Self, StoreError> {
        let store = Store::open(&config.database)?;
        Self::new(store, &config.tables, &config.credentials_table)
    }

    /// Bind `tables` in order against an already open store. A missing table
    /// aborts with `StoreError::Schema` and a repeated one with
    /// `StoreError::DuplicateTable`; the store is dropped with it.
    pub fn new(store: Store, tables: &[String], credentials_table: &str) -> Result<Self, StoreError> {
        let mut bindings: Vec<TableBinding> = Vec::with_capacity(tables.len());
        for table in tables {
            if bindings.iter().any(|bound| bound.name() == table.as_str()) {
                return Err(StoreError::DuplicateTable {
                    table: table.clone(),
                });
            }
            match TableBinding::bind(&store, table) {
                Ok(binding) => bindings.push(binding),
                Err(err) => {
                    if let Ok(available) = list_tables(store.conn()) {
                        info!(table = %table, ?available, "configured table not found");
                    }
                    return Err(err);
                }
            }
        }

        Ok(Self {
            store,
            bindings,
            switcher: TableSwitcher::new(tables.to_vec()),
            credentials_table: credentials_table.to_string(),
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn switcher(&self) -> &TableSwitcher {
        &self.switcher
    }

    pub fn bindings(&self) -> &[TableBinding] {
        &self.bindings
    }

    pub fn binding(&self, index: usize) -> Option<&TableBinding> {
        self.bindings.get(index)
    }

    pub fn visible_index(&self) -> Option<usize> {
        self.switcher.visible()
    }

    pub fn visible_binding(&self) -> Option<&TableBinding> {
        self.switcher.visible().and_then(|index| self.bindings.get(index))
    }

    pub fn is_credentials_table(&self, table: &str) -> bool {
        table == self.credentials_table
    }

    /// Run one command to completion.
    pub fn dispatch(&mut self, command: Command) -> Result<Outcome, CommandError> {
        match command {
            Command::SelectTable(index) => {
                self.switcher.select(index);
                let table = self.switcher.names()[index].clone();
                debug!(index, table = %table, "selected table");
                Ok(Outcome::Selected { index, table })
            }
            Command::AddRecord(values) => {
                let mut session = self.open_editor()?;
                if values.len() != session.len() {
                    let err = ValidationError::ColumnCount {
                        expected: session.len(),
                        actual: values.len(),
                    };
                    return Err(SaveError::from(err).into());
                }
                for (slot, value) in values.into_iter().enumerate() {
                    session.set_input(slot, value);
                }
                let committed = self.save(&mut session)?;
                Ok(Outcome::Added(committed))
            }
            Command::DeleteRecord(rows) => {
                let (store, binding) = self.visible_parts()?;
                let removed = binding.delete_rows(store, rows)?;
                Ok(Outcome::Deleted(removed))
            }
            Command::UpdateRecord => {
                let (store, binding) = self.visible_parts()?;
                let report = binding.commit(store)?;
                Ok(Outcome::Updated(report.written))
            }
            Command::EditCell { row, column, value } => {
                let (_, binding) = self.visible_parts()?;
                binding.set_value(row, column, value)?;
                Ok(Outcome::Staged)
            }
            Command::Refresh => {
                let (store, binding) = self.visible_parts()?;
                binding.refresh(store)?;
                Ok(Outcome::Refreshed)
            }
        }
    }

    /// Start an add-record session on the visible table.
    pub fn open_editor(&self) -> Result<EditorSession, CommandError> {
        let binding = self
            .visible_binding()
            .ok_or(CommandError::NoTableSelected)?;
        let credentials = self.is_credentials_table(binding.name());
        Ok(EditorSession::open(binding, credentials))
    }

    /// Save a session against the binding it was opened on. Table names are
    /// unique within a workspace, so the name identifies the binding.
    pub fn save(&mut self, session: &mut EditorSession) -> Result<Committed, CommandError> {
        let binding = self
            .bindings
            .iter_mut()
            .find(|binding| binding.name() == session.table())
            .ok_or(CommandError::NoTableSelected)?;
        Ok(session.attempt_save(&self.store, binding)?)
    }

    /// Close the database connection.
    pub fn close(self) -> Result<(), StoreError> {
        self.store.close()
    }

    fn visible_parts(&mut self) -> Result<(&Store, &mut TableBinding), CommandError> {
        let index = self
            .switcher
            .visible()
            .ok_or(CommandError::NoTableSelected)?;
        Ok((&self.store, &mut self.bindings[index]))
    }
}
