use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bookmark extracted from a foreign profile.
///
/// `folder` is the slash-joined path of the folders the entry was found
/// under, kept for display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmark {
    pub title: String,
    pub url: String,
    pub folder: String,
}

/// A visited-URL record extracted from a foreign history database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub title: String,
    pub url: String,
    pub visited_at: DateTime<Utc>,
}

/// A decrypted login. The password is non-empty by construction; rows whose
/// password cannot be recovered are never turned into a `Credential`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub origin_url: String,
    pub username: String,
    pub password: String,
}

/// Per-category outcome of a migration run.
///
/// A run succeeded iff no failure message was recorded; zero imports in a
/// category is indistinguishable from the category not having been requested.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    pub bookmarks_imported: usize,
    pub bookmarks_skipped: usize,
    pub history_imported: usize,
    pub history_skipped: usize,
    pub credentials_imported: usize,
    pub credentials_skipped: usize,
    pub failure: Option<String>,
}

impl MigrationReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}
