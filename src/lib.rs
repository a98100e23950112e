//! Core library surface for the flower-shop table viewer.
//!
//! The binary wires these pieces together: `config` resolves where the
//! database lives, `workspace` binds every configured table and exposes the
//! add/delete/update/select commands, and `ui` drives them from the terminal.
pub mod config;
pub mod db;
pub mod editor;
pub mod error;
pub mod logging;
pub mod models;
pub mod password;
pub mod switcher;
pub mod ui;
pub mod workspace;

/// Persistence layer: the owned store handle and per-table bindings.
pub use db::{CommitReport, Store, TableBinding};

pub use config::{Cli, Config};
pub use editor::{Committed, EditorSession, SessionState};
pub use error::{CommandError, SaveError, StoreError, ValidationError};
pub use models::{ColumnDescriptor, GridRow, RowState};
pub use password::PasswordPolicy;
pub use switcher::TableSwitcher;
pub use workspace::{Command, Outcome, Workspace};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
