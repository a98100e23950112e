//! Command-line options and the resolved runtime configuration.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser};
use directories::BaseDirs;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".flora-table-viewer";
/// SQLite file name looked up inside the data directory.
const DB_FILE_NAME: &str = "flow.db";
/// Log file written inside the data directory; the terminal belongs to the UI.
const LOG_FILE_NAME: &str = "viewer.log";

/// Tables shown when none are given on the command line, in selector order.
pub const DEFAULT_TABLES: [&str; 5] = ["flowers", "composition", "flowers_composition", "user", "orders"];
/// Table whose password column is checked before a new row is saved.
pub const DEFAULT_CREDENTIALS_TABLE: &str = "user";

/// Browse and edit the tables of a local flower-shop database.
#[derive(Debug, Parser)]
#[command(name = "flora-table-viewer", version, about)]
pub struct Cli {
    /// Path to the SQLite database. It must already exist.
    #[arg(short, long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Table to show; repeat to list several, in selector order.
    #[arg(short, long = "table", value_name = "NAME")]
    pub tables: Vec<String>,

    /// Table whose "password" column must pass the password check.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_CREDENTIALS_TABLE)]
    pub credentials_table: String,

    /// Where to write logs.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Fully resolved settings, independent of how they were supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database: PathBuf,
    pub tables: Vec<String>,
    pub credentials_table: String,
    pub log_file: PathBuf,
    pub verbosity: u8,
}

impl Config {
    /// Fill in home-directory defaults for anything the command line left out.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let database = match cli.database {
            Some(path) => path,
            None => data_dir()?.join(DB_FILE_NAME),
        };
        let log_file = match cli.log_file {
            Some(path) => path,
            None => data_dir()?.join(LOG_FILE_NAME),
        };
        let tables = if cli.tables.is_empty() {
            DEFAULT_TABLES.iter().map(|name| name.to_string()).collect()
        } else {
            cli.tables
        };

        Ok(Self {
            database,
            tables,
            credentials_table: cli.credentials_table,
            log_file,
            verbosity: cli.verbose,
        })
    }

    /// Default table set against an explicit database path.
    pub fn with_database(database: impl Into<PathBuf>) -> Self {
        let database = database.into();
        let log_file = database.with_extension("log");
        Self {
            database,
            tables: DEFAULT_TABLES.iter().map(|name| name.to_string()).collect(),
            credentials_table: DEFAULT_CREDENTIALS_TABLE.to_string(),
            log_file,
            verbosity: 0,
        }
    }
}

/// Resolve the application data directory inside the user's home.
fn data_dir() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME))
}
