//! Shared Chromium on-disk conventions and locked-database access helpers.

use crate::error::MigrateResult;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags};
use std::fs::File;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Default cap on rows read from a single foreign database.
pub const DEFAULT_ROW_LIMIT: usize = 5_000;

/// File names Chromium keeps inside a profile directory (and, for
/// `LOCAL_STATE_FILE`, one level above it).
pub struct DataFiles;

impl DataFiles {
    pub const BOOKMARKS: &'static str = "Bookmarks";
    pub const HISTORY_DB: &'static str = "History";
    pub const LOGIN_DATA_DB: &'static str = "Login Data";
    pub const PREFERENCES_FILE: &'static str = "Preferences";
    pub const LOCAL_STATE_FILE: &'static str = "Local State";
}

/// Bounded queries run against copies of the foreign databases.
pub struct ChromiumQueries;

impl ChromiumQueries {
    pub const HISTORY: &'static str = r#"
        SELECT url, title, last_visit_time
        FROM urls
        WHERE url LIKE 'http://%' OR url LIKE 'https://%'
        ORDER BY last_visit_time DESC
        LIMIT ?1
    "#;

    pub const LOGINS: &'static str = r#"
        SELECT origin_url, username_value, password_value
        FROM logins
        WHERE blacklisted_by_user = 0
          AND (origin_url LIKE 'http://%' OR origin_url LIKE 'https://%')
        ORDER BY date_created DESC
        LIMIT ?1
    "#;
}

/// Converts a Chromium timestamp (microseconds since 1601-01-01 UTC) to a UTC
/// instant. Values outside the representable range fall back to now.
pub fn chrome_epoch_to_utc(micros: i64) -> DateTime<Utc> {
    const WINDOWS_TO_UNIX_EPOCH_MICROS: i64 = 11_644_473_600_000_000;

    micros
        .checked_sub(WINDOWS_TO_UNIX_EPOCH_MICROS)
        .and_then(DateTime::<Utc>::from_timestamp_micros)
        .unwrap_or_else(Utc::now)
}

/// A scoped copy of a database the foreign browser may hold exclusively
/// locked. The copy lives in a uniquely named temporary file that is deleted
/// when the guard drops, on every exit path.
pub struct TempDbCopy {
    file: NamedTempFile,
}

impl TempDbCopy {
    pub fn create(source: &Path) -> MigrateResult<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("migrate-db-")
            .suffix(".sqlite")
            .tempfile()?;
        let mut src = File::open(source)?;
        std::io::copy(&mut src, file.as_file_mut())?;
        debug!("copied {:?} to {:?}", source, file.path());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Opens a SQLite database read-only.
pub fn open_readonly(path: &Path) -> MigrateResult<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    Ok(Connection::open_with_flags(path, flags)?)
}

/// Whether a URL uses the http or https scheme (case-insensitive). Only such
/// URLs are accepted from foreign data.
pub fn is_http_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Extracts the lowercased host from an http(s) URL. Userinfo and port are
/// stripped. Returns `None` for anything malformed or non-http(s).
pub fn url_host(url: &str) -> Option<String> {
    let lower = url.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))?;

    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host = authority.rsplit('@').next().unwrap_or(authority);
    let host = host.split(':').next().unwrap_or(host);

    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// Whether two (already lowercased) hosts name the same site: equal, or one a
/// dot-suffixed subdomain of the other in either direction.
pub fn hosts_related(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    a.len() > b.len() && a.ends_with(b) && a.as_bytes()[a.len() - b.len() - 1] == b'.'
        || b.len() > a.len() && b.ends_with(a) && b.as_bytes()[b.len() - a.len() - 1] == b'.'
}
