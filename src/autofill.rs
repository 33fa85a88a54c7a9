//! Runtime credential aggregation for autofill lookups.
//!
//! Merges the application's own imported-credential store with a live read
//! of the foreign installation's credential database into one TTL-keyed
//! in-memory cache. Entries from the two sources are de-duplicated on the
//! case-insensitive (origin URL, username) pair.

use crate::chrome::logins::extract_credentials_from_db;
use crate::chrome::MasterKey;
use crate::common::{hosts_related, url_host, DataFiles, DEFAULT_ROW_LIMIT};
use crate::store::ImportedCredentialStore;
use crate::types::Credential;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// How long a rebuilt cache stays valid.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

struct CacheState {
    entries: Vec<Credential>,
    refreshed_at: Instant,
}

/// Answers "credentials for this page" queries against a merged view of all
/// known credentials.
///
/// The rebuild-or-reuse decision sits behind a mutex so the aggregator can
/// be shared across threads. Nothing here is persisted; the cache dies with
/// the instance.
pub struct CredentialAggregator {
    store_path: PathBuf,
    user_data_dir: Option<PathBuf>,
    ttl: Duration,
    row_limit: usize,
    cache: Mutex<Option<CacheState>>,
}

impl CredentialAggregator {
    /// `store_path` is the application's imported-credentials file;
    /// `user_data_dir` the live foreign installation's user-data root, if
    /// its credential database should be merged in.
    pub fn new(store_path: impl Into<PathBuf>, user_data_dir: Option<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            user_data_dir,
            ttl: DEFAULT_CACHE_TTL,
            row_limit: DEFAULT_ROW_LIMIT,
            cache: Mutex::new(None),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_row_limit(mut self, row_limit: usize) -> Self {
        self.row_limit = row_limit;
        self
    }

    /// Returns every cached credential whose origin host matches the page
    /// host: equal, or a dot-suffixed subdomain of the other in either
    /// direction. A malformed page URL or stored origin matches nothing.
    pub fn credentials_for(&self, page_url: &str) -> Vec<Credential> {
        let Some(page_host) = url_host(page_url) else {
            return Vec::new();
        };

        let mut cache = match self.cache.lock() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };

        let stale = match cache.as_ref() {
            Some(state) => state.entries.is_empty() || state.refreshed_at.elapsed() >= self.ttl,
            None => true,
        };
        if stale {
            *cache = Some(CacheState {
                entries: self.rebuild(),
                refreshed_at: Instant::now(),
            });
        }

        let Some(state) = cache.as_ref() else {
            return Vec::new();
        };
        state
            .entries
            .iter()
            .filter(|credential| {
                url_host(&credential.origin_url)
                    .is_some_and(|origin_host| hosts_related(&origin_host, &page_host))
            })
            .cloned()
            .collect()
    }

    /// Drops the cache; the next query rebuilds it.
    pub fn invalidate(&self) {
        let mut cache = match self.cache.lock() {
            Ok(cache) => cache,
            Err(poisoned) => poisoned.into_inner(),
        };
        *cache = None;
    }

    fn rebuild(&self) -> Vec<Credential> {
        let mut entries = ImportedCredentialStore::load(&self.store_path).credentials();

        if let Some(user_data_dir) = &self.user_data_dir {
            match MasterKey::resolve(user_data_dir) {
                Some(key) => {
                    for credential in self.read_live_logins(user_data_dir, &key) {
                        let duplicate = entries.iter().any(|existing| {
                            existing
                                .origin_url
                                .eq_ignore_ascii_case(&credential.origin_url)
                                && existing.username.eq_ignore_ascii_case(&credential.username)
                        });
                        if !duplicate {
                            entries.push(credential);
                        }
                    }
                }
                None => debug!("no master key for live credential read; using store only"),
            }
        }

        info!("credential cache rebuilt with {} entries", entries.len());
        entries
    }

    fn read_live_logins(&self, user_data_dir: &Path, key: &MasterKey) -> Vec<Credential> {
        let live_db = user_data_dir
            .join("Default")
            .join(DataFiles::LOGIN_DATA_DB);
        extract_credentials_from_db(&live_db, Some(key), self.row_limit)
    }
}
