//! Resolution of the per-installation key protecting versioned blobs.

use crate::common::DataFiles;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct LocalState {
    os_crypt: OsCrypt,
}

#[derive(Debug, Deserialize)]
struct OsCrypt {
    encrypted_key: Option<String>,
}

/// Raw symmetric key bytes unwrapped from the foreign installation's
/// `Local State` file. Held in memory only; the bytes never appear in
/// `Debug` output or logs.
pub struct MasterKey(Vec<u8>);

impl MasterKey {
    /// Wraps already-unwrapped key bytes. The normal path is [`resolve`];
    /// this exists for callers that obtain the key elsewhere and for tests.
    ///
    /// [`resolve`]: MasterKey::resolve
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Reads the `Local State` file under `user_data_dir`, strips the
    /// `DPAPI` marker from the base64-decoded key field, and unwraps the
    /// rest through per-user DPAPI. Returns `None` on any failure; a missing
    /// master key only disables versioned-blob decryption.
    pub fn resolve(user_data_dir: &Path) -> Option<Self> {
        let state_path = user_data_dir.join(DataFiles::LOCAL_STATE_FILE);
        let content = match fs::read_to_string(&state_path) {
            Ok(content) => content,
            Err(e) => {
                debug!("cannot read {:?}: {}", state_path, e);
                return None;
            }
        };

        let state: LocalState = match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                debug!("cannot parse Local State: {}", e);
                return None;
            }
        };

        let encrypted_key = state.os_crypt.encrypted_key?;
        let wrapped = BASE64.decode(encrypted_key).ok()?;
        let wrapped = wrapped.strip_prefix(b"DPAPI").unwrap_or(&wrapped);

        unprotect(wrapped).map(Self)
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MasterKey").field(&"..").finish()
    }
}

#[cfg(windows)]
fn unprotect(wrapped: &[u8]) -> Option<Vec<u8>> {
    match crate::windows::dpapi_unprotect(wrapped) {
        Ok(key) => Some(key),
        Err(e) => {
            debug!("DPAPI unwrap of master key failed: {}", e);
            None
        }
    }
}

#[cfg(not(windows))]
fn unprotect(_wrapped: &[u8]) -> Option<Vec<u8>> {
    debug!("master key unwrap requires Windows DPAPI");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_local_state_resolves_to_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(MasterKey::resolve(dir.path()).is_none());
    }

    #[test]
    fn malformed_local_state_resolves_to_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DataFiles::LOCAL_STATE_FILE), b"{oops").unwrap();
        assert!(MasterKey::resolve(dir.path()).is_none());
    }

    #[test]
    fn absent_key_field_resolves_to_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(DataFiles::LOCAL_STATE_FILE),
            r#"{"os_crypt": {}}"#,
        )
        .unwrap();
        assert!(MasterKey::resolve(dir.path()).is_none());
    }

    #[test]
    fn debug_output_hides_key_bytes() {
        let key = MasterKey::from_bytes(vec![0x41; 32]);
        let rendered = format!("{key:?}");
        assert!(!rendered.contains('A'));
        assert!(rendered.contains("MasterKey"));
    }
}
