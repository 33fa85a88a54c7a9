//! # browsermigrate
//!
//! Migration of browsing data (bookmarks, history, saved credentials) from a
//! Chromium-family profile into the application's own stores, plus the
//! runtime credential aggregation that backs autofill lookups.
//!
//! ## Example
//!
//! ```no_run
//! use browsermigrate::chrome::profile::{default_user_data_dir, locate_profiles};
//! use browsermigrate::migrate::Migrator;
//! use browsermigrate::store::ImportedCredentialStore;
//!
//! let data_dir = default_user_data_dir().expect("no user-data directory");
//! let profiles = locate_profiles(&data_dir);
//! let mut credentials = ImportedCredentialStore::load("imported_credentials.json");
//!
//! for profile in &profiles {
//!     let report = Migrator::new().import_all(profile, None, None, Some(&mut credentials), None);
//!     println!("{}: {} credentials", profile.display_name, report.credentials_imported);
//! }
//! ```

pub mod autofill;
pub mod chrome;
pub mod cli;
pub mod common;
pub mod error;
pub mod migrate;
pub mod store;
pub mod types;

#[cfg(windows)]
pub mod windows;

// Re-export commonly used types
pub use autofill::CredentialAggregator;
pub use chrome::{ChromeProfile, MasterKey};
pub use error::{MigrateError, MigrateResult};
pub use migrate::{BookmarkStore, HistoryStore, Migrator};
pub use store::{ImportedCredential, ImportedCredentialStore};
pub use types::{Bookmark, Credential, HistoryRecord, MigrationReport};
