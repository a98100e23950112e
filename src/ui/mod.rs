//! Ratatui front-end: a selector sidebar, the visible table's grid and modal
//! forms for adding rows, editing cells and confirming deletes.

mod app;
mod forms;
mod grid;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
