//! The application's own persisted store for migrated credentials.

use crate::error::MigrateResult;
use crate::types::Credential;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// One migrated login as persisted on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedCredential {
    pub origin_url: String,
    pub username: String,
    pub password: String,
    pub date_created: DateTime<Utc>,
}

/// File-backed store of credentials imported from foreign profiles.
///
/// Passwords are stored as plaintext JSON by contract: the file lives inside
/// the application's own user-data directory and is treated as the user's
/// protected local data. The autofill read path depends on this.
///
/// Duplicate key: (origin URL, username), ASCII case-insensitive.
#[derive(Debug)]
pub struct ImportedCredentialStore {
    path: PathBuf,
    records: Vec<ImportedCredential>,
}

impl ImportedCredentialStore {
    /// Loads the store file. A missing file is an empty store; an unreadable
    /// or malformed one is treated the same after a warning.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(records) => records,
                Err(e) => {
                    warn!("imported-credential file {:?} is malformed: {}", path, e);
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        Self { path, records }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Adds a credential unless its (origin, username) pair is already
    /// present. Returns whether the entry was added.
    pub fn add(&mut self, credential: &Credential) -> bool {
        if self.contains(&credential.origin_url, &credential.username) {
            return false;
        }
        self.records.push(ImportedCredential {
            origin_url: credential.origin_url.clone(),
            username: credential.username.clone(),
            password: credential.password.clone(),
            date_created: Utc::now(),
        });
        true
    }

    pub fn contains(&self, origin_url: &str, username: &str) -> bool {
        self.records.iter().any(|record| {
            record.origin_url.eq_ignore_ascii_case(origin_url)
                && record.username.eq_ignore_ascii_case(username)
        })
    }

    /// All stored entries as runtime credentials.
    pub fn credentials(&self) -> Vec<Credential> {
        self.records
            .iter()
            .map(|record| Credential {
                origin_url: record.origin_url.clone(),
                username: record.username.clone(),
                password: record.password.clone(),
            })
            .collect()
    }

    /// Writes the store back to its file, creating parent directories as
    /// needed.
    pub fn save(&self) -> MigrateResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}
