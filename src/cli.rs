use crate::common::DEFAULT_ROW_LIMIT;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Browsing-data migration tool
#[derive(Parser, Debug)]
#[command(name = "browsermigrate")]
#[command(about = "Migrate bookmarks, history, and credentials from a Chromium profile")]
#[command(version)]
pub struct Cli {
    /// Foreign user-data directory (defaults to the local Chrome installation)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Profile directory name to import from
    #[arg(short, long, default_value = "Default")]
    pub profile: String,

    /// Data categories to import
    #[arg(short, long, value_enum, value_delimiter = ',', default_values = ["all"])]
    pub content: Vec<ContentArg>,

    /// List discovered profiles and exit
    #[arg(short, long)]
    pub list: bool,

    /// Destination directory for the migrated stores
    #[arg(short, long, default_value = "migrated_data")]
    pub output: PathBuf,

    /// Maximum rows read per foreign database
    #[arg(long, default_value_t = DEFAULT_ROW_LIMIT)]
    pub row_limit: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug logging (overrides verbose)
    #[arg(short, long)]
    pub debug: bool,

    /// Trace logging (overrides debug and verbose)
    #[arg(short, long)]
    pub trace: bool,
}

#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum ContentArg {
    Bookmarks,
    History,
    Credentials,
    All,
}

impl Cli {
    pub fn wants(&self, content: ContentArg) -> bool {
        self.content.contains(&ContentArg::All) || self.content.contains(&content)
    }

    pub fn get_log_level(&self) -> tracing::Level {
        if self.trace {
            tracing::Level::TRACE
        } else if self.debug {
            tracing::Level::DEBUG
        } else if self.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}
