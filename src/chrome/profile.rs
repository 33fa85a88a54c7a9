//! Discovery of foreign profile directories and the data they contain.

use crate::common::DataFiles;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A candidate foreign profile and the data categories present in it.
#[derive(Debug, Clone)]
pub struct ChromeProfile {
    /// Directory name, e.g. `Default` or `Profile 2`.
    pub id: String,
    /// Vendor-supplied profile name if the `Preferences` file carries one,
    /// else the directory name.
    pub display_name: String,
    pub path: PathBuf,
    pub has_bookmarks: bool,
    pub has_history: bool,
    pub has_credentials: bool,
}

impl ChromeProfile {
    /// Builds a profile record for a directory, or `None` when the directory
    /// holds none of the three data files.
    fn from_dir(id: String, path: PathBuf) -> Option<Self> {
        let has_bookmarks = path.join(DataFiles::BOOKMARKS).is_file();
        let has_history = path.join(DataFiles::HISTORY_DB).is_file();
        let has_credentials = path.join(DataFiles::LOGIN_DATA_DB).is_file();

        if !has_bookmarks && !has_history && !has_credentials {
            return None;
        }

        let display_name = read_display_name(&path).unwrap_or_else(|| id.clone());

        Some(Self {
            id,
            display_name,
            path,
            has_bookmarks,
            has_history,
            has_credentials,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Preferences {
    #[serde(default)]
    profile: ProfileSection,
}

#[derive(Debug, Default, Deserialize)]
struct ProfileSection {
    name: Option<String>,
}

/// Reads `profile.name` from the Preferences file. Any failure falls back to
/// the directory name at the caller.
fn read_display_name(profile_dir: &Path) -> Option<String> {
    let content = fs::read_to_string(profile_dir.join(DataFiles::PREFERENCES_FILE)).ok()?;
    let prefs: Preferences = serde_json::from_str(&content).ok()?;
    prefs.profile.name.filter(|name| !name.is_empty())
}

/// The local Chrome installation's user-data root, if one can be derived.
pub fn default_user_data_dir() -> Option<PathBuf> {
    directories::BaseDirs::new()
        .map(|dirs| dirs.data_local_dir().join("Google/Chrome/User Data"))
}

/// Scans a user-data root for profiles holding at least one migratable data
/// category. Scan errors yield an empty list, never a fault.
pub fn locate_profiles(user_data_dir: &Path) -> Vec<ChromeProfile> {
    let mut profiles = Vec::new();

    let default_path = user_data_dir.join("Default");
    if default_path.is_dir() {
        if let Some(profile) = ChromeProfile::from_dir("Default".to_string(), default_path) {
            profiles.push(profile);
        }
    }

    // Numbered profiles (Profile 1, Profile 2, etc.)
    let entries = match fs::read_dir(user_data_dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("cannot scan {:?}: {}", user_data_dir, e);
            return profiles;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with("Profile ") {
                if let Some(profile) = ChromeProfile::from_dir(name.to_string(), path) {
                    profiles.push(profile);
                }
            }
        }
    }

    profiles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_profile(root: &Path, id: &str, files: &[&str]) {
        let dir = root.join(id);
        fs::create_dir_all(&dir).unwrap();
        for file in files {
            fs::write(dir.join(file), b"x").unwrap();
        }
    }

    #[test]
    fn skips_directories_without_data_files() {
        let root = tempfile::tempdir().unwrap();
        seed_profile(root.path(), "Default", &[]);
        seed_profile(root.path(), "Profile 1", &[DataFiles::HISTORY_DB]);
        seed_profile(root.path(), "Profile 2", &[]);

        let profiles = locate_profiles(root.path());
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].id, "Profile 1");
        assert!(profiles[0].has_history);
        assert!(!profiles[0].has_bookmarks);
        assert!(!profiles[0].has_credentials);
    }

    #[test]
    fn ignores_unrelated_directories() {
        let root = tempfile::tempdir().unwrap();
        seed_profile(root.path(), "Crashpad", &[DataFiles::HISTORY_DB]);

        assert!(locate_profiles(root.path()).is_empty());
    }

    #[test]
    fn display_name_comes_from_preferences() {
        let root = tempfile::tempdir().unwrap();
        seed_profile(root.path(), "Default", &[DataFiles::BOOKMARKS]);
        fs::write(
            root.path().join("Default").join(DataFiles::PREFERENCES_FILE),
            r#"{"profile": {"name": "Work"}}"#,
        )
        .unwrap();

        let profiles = locate_profiles(root.path());
        assert_eq!(profiles[0].display_name, "Work");
    }

    #[test]
    fn malformed_preferences_fall_back_to_directory_name() {
        let root = tempfile::tempdir().unwrap();
        seed_profile(root.path(), "Default", &[DataFiles::BOOKMARKS]);
        fs::write(
            root.path().join("Default").join(DataFiles::PREFERENCES_FILE),
            b"{not json",
        )
        .unwrap();

        let profiles = locate_profiles(root.path());
        assert_eq!(profiles[0].display_name, "Default");
    }

    #[test]
    fn missing_root_yields_empty_list() {
        let root = tempfile::tempdir().unwrap();
        let gone = root.path().join("nope");
        assert!(locate_profiles(&gone).is_empty());
    }
}
