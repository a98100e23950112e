//! Binary entry point: resolve configuration, open the database and bind the
//! configured tables, then drive the Ratatui event loop until the user exits.
use anyhow::Context;
use clap::Parser;
use flora_table_viewer::logging::init_logging;
use flora_table_viewer::{run_app, App, Cli, Config, Workspace};
use tracing::error;

/// Returning a `Result` turns a database that cannot be opened into a
/// non-zero exit with the cause printed, before the terminal is taken over.
fn main() -> anyhow::Result<()> {
    let config = Config::from_cli(Cli::parse())?;
    init_logging(&config.log_file, config.verbosity)
        .with_context(|| format!("failed to set up logging to {}", config.log_file.display()))?;

    let workspace = Workspace::open(&config).inspect_err(|err| error!("startup failed: {err}"))?;

    let mut app = App::new(workspace);
    let result = run_app(&mut app);
    app.into_workspace()
        .close()
        .context("failed to close the database")?;
    result
}
