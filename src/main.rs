use browsermigrate::chrome::profile::{default_user_data_dir, locate_profiles};
use browsermigrate::cli::{Cli, ContentArg};
use browsermigrate::error::MigrateError;
use browsermigrate::migrate::{BookmarkStore, HistoryStore, Migrator};
use browsermigrate::store::ImportedCredentialStore;
use browsermigrate::types::HistoryRecord;
use chrono::{DateTime, Utc};
use clap::Parser;
use color_eyre::eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// File-backed bookmark store for the command-line harness.
#[derive(Debug, Serialize, Deserialize)]
struct StoredBookmark {
    url: String,
    title: String,
}

struct JsonBookmarkStore {
    path: PathBuf,
    entries: Vec<StoredBookmark>,
}

impl JsonBookmarkStore {
    fn load(path: PathBuf) -> Self {
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        Self { path, entries }
    }

    fn save(&self) -> Result<()> {
        fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}

impl BookmarkStore for JsonBookmarkStore {
    fn is_bookmarked(&self, url: &str) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.url.eq_ignore_ascii_case(url))
    }

    fn add(&mut self, url: &str, title: &str) {
        self.entries.push(StoredBookmark {
            url: url.to_string(),
            title: title.to_string(),
        });
    }
}

/// File-backed history store for the command-line harness.
struct JsonHistoryStore {
    path: PathBuf,
    entries: Vec<HistoryRecord>,
}

impl JsonHistoryStore {
    fn load(path: PathBuf) -> Self {
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        Self { path, entries }
    }

    fn save(&self) -> Result<()> {
        fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}

impl HistoryStore for JsonHistoryStore {
    fn snapshot(&self) -> Vec<HistoryRecord> {
        self.entries.clone()
    }

    fn record(&mut self, title: &str, url: &str, visited_at: DateTime<Utc>) {
        self.entries.push(HistoryRecord {
            title: title.to_string(),
            url: url.to_string(),
            visited_at,
        });
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(cli.get_log_level().into()),
        )
        .init();

    let data_dir = cli
        .data_dir
        .clone()
        .or_else(default_user_data_dir)
        .ok_or_else(|| eyre!("no user-data directory given and none could be derived"))?;

    let profiles = locate_profiles(&data_dir);
    if cli.list {
        if profiles.is_empty() {
            println!("No profiles with migratable data under {}", data_dir.display());
        }
        for profile in &profiles {
            println!(
                "{:<12} {:<20} bookmarks={} history={} credentials={}",
                profile.id,
                profile.display_name,
                profile.has_bookmarks,
                profile.has_history,
                profile.has_credentials
            );
        }
        return Ok(());
    }

    let profile = profiles
        .iter()
        .find(|profile| profile.id == cli.profile)
        .ok_or_else(|| {
            MigrateError::ProfileNotFound(format!(
                "{} under {}",
                cli.profile,
                data_dir.display()
            ))
        })?;

    fs::create_dir_all(&cli.output)?;
    let mut bookmarks = JsonBookmarkStore::load(cli.output.join("bookmarks.json"));
    let mut history = JsonHistoryStore::load(cli.output.join("history.json"));
    let mut credentials =
        ImportedCredentialStore::load(cli.output.join("imported_credentials.json"));

    let mut progress = |fraction: f32| info!("progress: {:.0}%", fraction * 100.0);
    let report = Migrator::with_row_limit(cli.row_limit).import_all(
        profile,
        cli.wants(ContentArg::Bookmarks)
            .then_some(&mut bookmarks as &mut dyn BookmarkStore),
        cli.wants(ContentArg::History)
            .then_some(&mut history as &mut dyn HistoryStore),
        cli.wants(ContentArg::Credentials).then_some(&mut credentials),
        Some(&mut progress),
    );

    bookmarks.save()?;
    history.save()?;

    println!("Migrated profile {} ({})", profile.id, profile.display_name);
    println!(
        "  bookmarks:   {} imported, {} skipped",
        report.bookmarks_imported, report.bookmarks_skipped
    );
    println!(
        "  history:     {} imported, {} skipped",
        report.history_imported, report.history_skipped
    );
    println!(
        "  credentials: {} imported, {} skipped",
        report.credentials_imported, report.credentials_skipped
    );

    match report.failure {
        Some(failure) => Err(eyre!("migration finished with a failure: {failure}")),
        None => Ok(()),
    }
}
