//! Staged migration of a foreign profile into the application's stores.

use crate::chrome::{bookmarks, history, logins, ChromeProfile, MasterKey};
use crate::common::DEFAULT_ROW_LIMIT;
use crate::error::MigrateResult;
use crate::store::ImportedCredentialStore;
use crate::types::{HistoryRecord, MigrationReport};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{info, warn};

/// The application's bookmark store, as seen by the migrator.
///
/// `is_bookmarked` must treat URLs as ASCII case-insensitive.
pub trait BookmarkStore {
    fn is_bookmarked(&self, url: &str) -> bool;
    fn add(&mut self, url: &str, title: &str);
}

/// The application's history store, as seen by the migrator. `snapshot` is
/// read once per migration, not per record.
pub trait HistoryStore {
    fn snapshot(&self) -> Vec<HistoryRecord>;
    fn record(&mut self, title: &str, url: &str, visited_at: DateTime<Utc>);
}

/// Fractional progress sink; receives values in `[0.0, 1.0]`, invoked
/// synchronously from the migration flow.
pub type ProgressFn<'a> = &'a mut dyn FnMut(f32);

#[derive(Debug, Clone, Copy)]
enum Stage {
    Bookmarks,
    History,
    Credentials,
}

/// Sequences extraction and dedup-merge across the requested categories.
#[derive(Debug, Clone)]
pub struct Migrator {
    row_limit: usize,
}

impl Default for Migrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Migrator {
    pub fn new() -> Self {
        Self {
            row_limit: DEFAULT_ROW_LIMIT,
        }
    }

    pub fn with_row_limit(row_limit: usize) -> Self {
        Self { row_limit }
    }

    /// Imports every requested category that is present on the profile, in
    /// order: bookmarks, history, credentials. A category missing from the
    /// profile is silently skipped. Progress is reported as
    /// `stage / stage_count` before each stage and `(stage + 1) / stage_count`
    /// after it.
    ///
    /// Passing a credential store doubles as the request to import
    /// credentials. Nothing escapes this call: an internal failure is
    /// captured into the report's failure message, with the counters left at
    /// whatever had completed.
    pub fn import_all(
        &self,
        profile: &ChromeProfile,
        mut bookmark_store: Option<&mut dyn BookmarkStore>,
        mut history_store: Option<&mut dyn HistoryStore>,
        mut credential_store: Option<&mut ImportedCredentialStore>,
        mut progress: Option<ProgressFn<'_>>,
    ) -> MigrationReport {
        let mut report = MigrationReport::default();

        let mut stages = Vec::new();
        if bookmark_store.is_some() && profile.has_bookmarks {
            stages.push(Stage::Bookmarks);
        }
        if history_store.is_some() && profile.has_history {
            stages.push(Stage::History);
        }
        if credential_store.is_some() && profile.has_credentials {
            stages.push(Stage::Credentials);
        }

        if stages.is_empty() {
            info!("nothing to migrate from profile {}", profile.id);
            return report;
        }

        let outcome = self.run_stages(
            profile,
            &stages,
            &mut bookmark_store,
            &mut history_store,
            &mut credential_store,
            &mut progress,
            &mut report,
        );
        if let Err(e) = outcome {
            warn!("migration of profile {} failed: {}", profile.id, e);
            report.failure = Some(e.to_string());
        }
        report
    }

    #[allow(clippy::too_many_arguments)]
    fn run_stages(
        &self,
        profile: &ChromeProfile,
        stages: &[Stage],
        bookmark_store: &mut Option<&mut dyn BookmarkStore>,
        history_store: &mut Option<&mut dyn HistoryStore>,
        credential_store: &mut Option<&mut ImportedCredentialStore>,
        progress: &mut Option<ProgressFn<'_>>,
        report: &mut MigrationReport,
    ) -> MigrateResult<()> {
        let stage_count = stages.len() as f32;

        for (index, stage) in stages.iter().enumerate() {
            if let Some(progress) = progress.as_mut() {
                progress(index as f32 / stage_count);
            }

            match stage {
                Stage::Bookmarks => {
                    if let Some(store) = bookmark_store.as_mut() {
                        self.merge_bookmarks(profile, &mut **store, report);
                    }
                }
                Stage::History => {
                    if let Some(store) = history_store.as_mut() {
                        self.merge_history(profile, &mut **store, report);
                    }
                }
                Stage::Credentials => {
                    if let Some(store) = credential_store.as_mut() {
                        self.merge_credentials(profile, store, report)?;
                    }
                }
            }

            if let Some(progress) = progress.as_mut() {
                progress((index + 1) as f32 / stage_count);
            }
        }
        Ok(())
    }

    fn merge_bookmarks(
        &self,
        profile: &ChromeProfile,
        store: &mut dyn BookmarkStore,
        report: &mut MigrationReport,
    ) {
        for bookmark in bookmarks::extract_bookmarks(profile) {
            if store.is_bookmarked(&bookmark.url) {
                report.bookmarks_skipped += 1;
            } else {
                store.add(&bookmark.url, &bookmark.title);
                report.bookmarks_imported += 1;
            }
        }
        info!(
            "bookmarks: {} imported, {} skipped",
            report.bookmarks_imported, report.bookmarks_skipped
        );
    }

    fn merge_history(
        &self,
        profile: &ChromeProfile,
        store: &mut dyn HistoryStore,
        report: &mut MigrationReport,
    ) {
        // One snapshot up front keeps the merge linear; newly recorded URLs
        // join the seen-set so a batch cannot self-duplicate.
        let mut seen: HashSet<String> = store
            .snapshot()
            .iter()
            .map(|record| record.url.to_ascii_lowercase())
            .collect();

        for record in history::extract_history(profile, self.row_limit) {
            let dedup_key = record.url.to_ascii_lowercase();
            if seen.contains(&dedup_key) {
                report.history_skipped += 1;
            } else {
                store.record(&record.title, &record.url, record.visited_at);
                seen.insert(dedup_key);
                report.history_imported += 1;
            }
        }
        info!(
            "history: {} imported, {} skipped",
            report.history_imported, report.history_skipped
        );
    }

    fn merge_credentials(
        &self,
        profile: &ChromeProfile,
        store: &mut ImportedCredentialStore,
        report: &mut MigrationReport,
    ) -> MigrateResult<()> {
        let key = profile.path.parent().and_then(MasterKey::resolve);
        for credential in logins::extract_credentials(profile, key.as_ref(), self.row_limit) {
            if store.add(&credential) {
                report.credentials_imported += 1;
            } else {
                report.credentials_skipped += 1;
            }
        }
        store.save()?;
        info!(
            "credentials: {} imported, {} skipped",
            report.credentials_imported, report.credentials_skipped
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::DataFiles;
    use std::fs;
    use std::path::Path;

    #[derive(Default)]
    struct MemBookmarkStore {
        entries: Vec<(String, String)>,
    }

    impl BookmarkStore for MemBookmarkStore {
        fn is_bookmarked(&self, url: &str) -> bool {
            self.entries
                .iter()
                .any(|(stored, _)| stored.eq_ignore_ascii_case(url))
        }

        fn add(&mut self, url: &str, title: &str) {
            self.entries.push((url.to_string(), title.to_string()));
        }
    }

    #[derive(Default)]
    struct MemHistoryStore {
        entries: Vec<HistoryRecord>,
    }

    impl HistoryStore for MemHistoryStore {
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

    fn seed_bookmark_file(dir: &Path) {
        fs::write(
            dir.join(DataFiles::BOOKMARKS),
            r#"{
                "roots": {
                    "bookmark_bar": {"children": [
                        {"type": "url", "name": "Example", "url": "https://example.com"},
                        {"type": "url", "name": "Other", "url": "https://other.example.com"}
                    ]}
                }
            }"#,
        )
        .unwrap();
    }

    fn seed_history_db(dir: &Path) {
        let conn = rusqlite::Connection::open(dir.join(DataFiles::HISTORY_DB)).unwrap();
        conn.execute_batch(
            "CREATE TABLE urls (url TEXT, title TEXT, last_visit_time INTEGER)",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO urls VALUES ('https://example.com', 'Example', 13300000000000000)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO urls VALUES ('HTTPS://EXAMPLE.COM', 'Shouty', 13300000000000001)",
            [],
        )
        .unwrap();
    }

    fn profile_at(dir: &Path) -> ChromeProfile {
        ChromeProfile {
            id: "Default".to_string(),
            display_name: "Default".to_string(),
            path: dir.to_path_buf(),
            has_bookmarks: dir.join(DataFiles::BOOKMARKS).is_file(),
            has_history: dir.join(DataFiles::HISTORY_DB).is_file(),
            has_credentials: dir.join(DataFiles::LOGIN_DATA_DB).is_file(),
        }
    }

    #[test]
    fn absent_categories_are_silently_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let profile = ChromeProfile {
            id: "Default".to_string(),
            display_name: "Default".to_string(),
            path: dir.path().to_path_buf(),
            has_bookmarks: true,
            has_history: true,
            has_credentials: false,
        };

        let store_path = dir.path().join("creds.json");
        let mut creds = ImportedCredentialStore::load(&store_path);
        let report = Migrator::new().import_all(&profile, None, None, Some(&mut creds), None);

        assert!(report.succeeded());
        assert_eq!(report.bookmarks_imported, 0);
        assert_eq!(report.bookmarks_skipped, 0);
        assert_eq!(report.history_imported, 0);
        assert_eq!(report.credentials_imported, 0);
    }

    #[test]
    fn import_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        seed_bookmark_file(dir.path());
        seed_history_db(dir.path());
        let profile = profile_at(dir.path());

        let mut bookmarks = MemBookmarkStore::default();
        let mut history = MemHistoryStore::default();
        let migrator = Migrator::new();

        let first = migrator.import_all(
            &profile,
            Some(&mut bookmarks),
            Some(&mut history),
            None,
            None,
        );
        assert!(first.succeeded());
        assert_eq!(first.bookmarks_imported, 2);
        // second db row only differs by case
        assert_eq!(first.history_imported, 1);
        assert_eq!(first.history_skipped, 1);

        let second = migrator.import_all(
            &profile,
            Some(&mut bookmarks),
            Some(&mut history),
            None,
            None,
        );
        assert!(second.succeeded());
        assert_eq!(second.bookmarks_imported, 0);
        assert_eq!(second.bookmarks_skipped, 2);
        assert_eq!(second.history_imported, 0);
        assert_eq!(second.history_skipped, 2);

        assert_eq!(bookmarks.entries.len(), 2);
        assert_eq!(history.entries.len(), 1);
    }

    #[test]
    fn progress_brackets_every_stage() {
        let dir = tempfile::tempdir().unwrap();
        seed_bookmark_file(dir.path());
        seed_history_db(dir.path());
        let profile = profile_at(dir.path());

        let mut bookmarks = MemBookmarkStore::default();
        let mut history = MemHistoryStore::default();
        let mut reported = Vec::new();
        let mut sink = |fraction: f32| reported.push(fraction);

        Migrator::new().import_all(
            &profile,
            Some(&mut bookmarks),
            Some(&mut history),
            None,
            Some(&mut sink),
        );

        assert_eq!(reported, vec![0.0, 0.5, 0.5, 1.0]);
    }

    #[test]
    fn no_stages_reports_no_progress() {
        let dir = tempfile::tempdir().unwrap();
        let profile = ChromeProfile {
            id: "Default".to_string(),
            display_name: "Default".to_string(),
            path: dir.path().to_path_buf(),
            has_bookmarks: false,
            has_history: false,
            has_credentials: false,
        };

        let mut reported = Vec::new();
        let mut sink = |fraction: f32| reported.push(fraction);
        let report = Migrator::new().import_all(&profile, None, None, None, Some(&mut sink));

        assert!(report.succeeded());
        assert!(reported.is_empty());
    }

    #[test]
    fn credential_store_save_failure_lands_in_the_report() {
        let dir = tempfile::tempdir().unwrap();
        let conn =
            rusqlite::Connection::open(dir.path().join(DataFiles::LOGIN_DATA_DB)).unwrap();
        conn.execute_batch(
            "CREATE TABLE logins (origin_url TEXT, username_value TEXT,
                 password_value BLOB, blacklisted_by_user INTEGER DEFAULT 0,
                 date_created INTEGER DEFAULT 0)",
        )
        .unwrap();
        drop(conn);
        let profile = profile_at(dir.path());

        // A store whose path collides with an existing file's "directory"
        // cannot be saved.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();
        let mut creds = ImportedCredentialStore::load(blocker.join("creds.json"));

        let report = Migrator::new().import_all(&profile, None, None, Some(&mut creds), None);
        assert!(!report.succeeded());
        assert!(report.failure.is_some());
    }
}
