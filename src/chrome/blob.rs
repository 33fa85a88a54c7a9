//! Credential blob decryption across the two format generations.
//!
//! A blob is classified into a tagged variant before any decryption is
//! attempted. Versioned blobs (`v10`/`v11`/`v12`) are AES-256-GCM under the
//! installation master key; anything without a recognized tag is a legacy
//! blob protected with per-user DPAPI directly.

use crate::chrome::MasterKey;
use crate::error::{MigrateError, MigrateResult};
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use tracing::debug;

pub const VERSION_TAG_LEN: usize = 3;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Newest version tag; `encrypt` always writes this one.
const CURRENT_VERSION_TAG: &[u8; 3] = b"v10";

/// A credential blob classified by format generation.
#[derive(Debug)]
pub enum EncryptedBlob<'a> {
    /// Versioned AEAD layout: 3-byte tag, 12-byte nonce, ciphertext with the
    /// 16-byte authentication tag appended.
    AeadV1 {
        nonce: &'a [u8],
        ciphertext: &'a [u8],
    },
    /// Pre-versioning layout: the whole blob is a DPAPI-protected value.
    Legacy(&'a [u8]),
}

impl<'a> EncryptedBlob<'a> {
    /// Classifies a raw blob. Returns `None` only for a versioned blob too
    /// short to hold its nonce and authentication tag.
    pub fn classify(blob: &'a [u8]) -> Option<Self> {
        if !has_version_tag(blob) {
            return Some(Self::Legacy(blob));
        }
        if blob.len() < VERSION_TAG_LEN + NONCE_LEN + TAG_LEN {
            return None;
        }
        Some(Self::AeadV1 {
            nonce: &blob[VERSION_TAG_LEN..VERSION_TAG_LEN + NONCE_LEN],
            ciphertext: &blob[VERSION_TAG_LEN + NONCE_LEN..],
        })
    }
}

// `v1` plus a digit covers the three known sub-versions.
fn has_version_tag(blob: &[u8]) -> bool {
    blob.len() >= VERSION_TAG_LEN
        && blob[0] == b'v'
        && blob[1] == b'1'
        && blob[2].is_ascii_digit()
}

/// Decrypts a credential blob to plaintext. Every failure mode — short or
/// tampered blob, missing key, wrong key, non-UTF-8 plaintext — yields
/// `None`; a single bad row must never abort a batch extraction.
pub fn decrypt(blob: &[u8], key: Option<&MasterKey>) -> Option<String> {
    match EncryptedBlob::classify(blob)? {
        EncryptedBlob::AeadV1 { nonce, ciphertext } => {
            let key = key?;
            let cipher = Aes256Gcm::new_from_slice(key.bytes()).ok()?;
            let plaintext = match cipher.decrypt(Nonce::from_slice(nonce), ciphertext) {
                Ok(plaintext) => plaintext,
                Err(_) => {
                    debug!("AEAD authentication failed for a {}-byte blob", blob.len());
                    return None;
                }
            };
            String::from_utf8(plaintext).ok()
        }
        EncryptedBlob::Legacy(wrapped) => legacy_unprotect(wrapped),
    }
}

/// Encrypts plaintext into the newest versioned layout: `v10` tag, a fresh
/// random 12-byte nonce, then the GCM ciphertext with its tag appended.
pub fn encrypt(plaintext: &str, key: &MasterKey) -> MigrateResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.bytes())
        .map_err(|e| MigrateError::InvalidKeyLength(format!("{e:?}")))?;

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|e| MigrateError::EncryptionFailed(format!("AES-GCM: {e}")))?;

    let mut out = Vec::with_capacity(VERSION_TAG_LEN + NONCE_LEN + ciphertext.len());
    out.extend_from_slice(CURRENT_VERSION_TAG);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

#[cfg(windows)]
fn legacy_unprotect(wrapped: &[u8]) -> Option<String> {
    let plaintext = crate::windows::dpapi_unprotect(wrapped).ok()?;
    String::from_utf8(plaintext).ok()
}

#[cfg(not(windows))]
fn legacy_unprotect(_wrapped: &[u8]) -> Option<String> {
    None
}
