//! Add-record workflow: one input per column, validated and committed as a
//! single new row.

use tracing::{debug, info, warn};

use crate::db::{Store, TableBinding};
use crate::error::{SaveError, ValidationError};
use crate::models::ColumnDescriptor;
use crate::password::PasswordPolicy;

/// Lifecycle of an editor session. `Open` is also where a rejected save lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Committed,
    Cancelled,
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub table: String,
    /// Rowid the store assigned to the new row.
    pub rowid: Option<i64>,
}

/// A pending row being filled in. The session owns its inputs; nothing
/// reaches the binding until `attempt_save` succeeds.
#[derive(Debug, Clone)]
pub struct EditorSession {
    table: String,
    columns: Vec<ColumnDescriptor>,
    inputs: Vec<String>,
    password_slot: Option<usize>,
    state: SessionState,
}

impl EditorSession {
    /// Start a session with one empty input per column of `binding`. When the
    /// binding is the credentials table, the column labelled "password" is
    /// checked against `PasswordPolicy` on save.
    pub fn open(binding: &TableBinding, credentials: bool) -> Self {
        let columns = binding.columns().to_vec();
        let password_slot = if credentials {
            columns.iter().position(ColumnDescriptor::is_password)
        } else {
            None
        };
        debug!(table = binding.name(), credentials, "opened record editor");
        Self {
            table: binding.name().to_string(),
            inputs: vec![String::new(); columns.len()],
            columns,
            password_slot,
            state: SessionState::Open,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn input(&self, slot: usize) -> Option<&str> {
        self.inputs.get(slot).map(String::as_str)
    }

    pub fn input_mut(&mut self, slot: usize) -> Option<&mut String> {
        self.inputs.get_mut(slot)
    }

    /// Replace an input. Returns false for an unknown slot.
    pub fn set_input(&mut self, slot: usize, value: impl Into<String>) -> bool {
        match self.inputs.get_mut(slot) {
            Some(input) => {
                *input = value.into();
                true
            }
            None => false,
        }
    }

    pub fn password_slot(&self) -> Option<usize> {
        self.password_slot
    }

    /// Run the pre-commit checks without touching any binding.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(slot) = self.password_slot {
            if !PasswordPolicy::is_valid(&self.inputs[slot]) {
                return Err(ValidationError::WeakPassword);
            }
        }
        Ok(())
    }

    /// Validate, stage the inputs as a new row and commit the binding. A
    /// failed check leaves the session open with its inputs intact. A failed
    /// write of this row drops the staged copy and also leaves the session
    /// open.
    pub fn attempt_save(
        &mut self,
        store: &Store,
        binding: &mut TableBinding,
    ) -> Result<Committed, SaveError> {
        debug_assert_eq!(binding.name(), self.table);
        if self.state != SessionState::Open {
            return Err(SaveError::Closed(self.state));
        }

        if let Err(err) = self.validate() {
            info!(table = %self.table, "record rejected: {err}");
            return Err(err.into());
        }

        let staged = binding.insert_row(self.inputs.clone())?;
        let result = binding.commit(store);
        // Nothing is removed during a failed commit, so `staged` still points
        // at this session's row.
        let rowid = match result {
            Ok(report) => report.inserted.last().copied(),
            Err(err) => {
                if binding.discard_staged(staged) {
                    return Err(err.into());
                }
                warn!(table = %self.table, error = %err, "record saved alongside a failed row");
                binding.row(staged).and_then(|row| row.rowid)
            }
        };

        self.state = SessionState::Committed;
        info!(table = %self.table, values = self.inputs.len(), "record saved");
        Ok(Committed {
            table: self.table.clone(),
            rowid,
        })
    }

    /// Abandon the session. The binding never sees its inputs.
    pub fn cancel(&mut self) {
        if self.state == SessionState::Open {
            self.state = SessionState::Cancelled;
            self.inputs.iter_mut().for_each(String::clear);
            debug!(table = %self.table, "record editor cancelled");
        }
    }
}
