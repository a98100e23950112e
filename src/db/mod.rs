//! Persistence module split across logical submodules.

mod binding;
mod connection;
mod schema;

pub use binding::{CommitReport, TableBinding};
pub use connection::Store;
pub use schema::{discover_columns, fetch_rows, list_tables};
