//! Login extraction over a scoped copy of the foreign `Login Data` database.

use crate::chrome::{blob, ChromeProfile, MasterKey};
use crate::common::{open_readonly, ChromiumQueries, DataFiles, TempDbCopy};
use crate::error::MigrateResult;
use crate::types::Credential;
use std::path::Path;
use tracing::{debug, info, warn};

/// Reads saved logins from a profile and decrypts each password blob.
/// Rows that fail decryption are dropped, never surfaced with an empty
/// password.
pub fn extract_credentials(
    profile: &ChromeProfile,
    key: Option<&MasterKey>,
    row_limit: usize,
) -> Vec<Credential> {
    extract_credentials_from_db(&profile.path.join(DataFiles::LOGIN_DATA_DB), key, row_limit)
}

/// Same extraction against an explicit database path; the autofill
/// aggregator points this at the live installation's own database.
pub(crate) fn extract_credentials_from_db(
    db_path: &Path,
    key: Option<&MasterKey>,
    row_limit: usize,
) -> Vec<Credential> {
    if !db_path.is_file() {
        return Vec::new();
    }

    let mut credentials = Vec::new();
    match collect_logins(db_path, key, row_limit, &mut credentials) {
        Ok(()) => info!("extracted {} credentials from {:?}", credentials.len(), db_path),
        Err(e) => warn!(
            "credential extraction stopped after {} rows: {}",
            credentials.len(),
            e
        ),
    }
    credentials
}

fn collect_logins(
    db_path: &Path,
    key: Option<&MasterKey>,
    row_limit: usize,
    out: &mut Vec<Credential>,
) -> MigrateResult<()> {
    let copy = TempDbCopy::create(db_path)?;
    let conn = open_readonly(copy.path())?;

    let mut stmt = conn.prepare(ChromiumQueries::LOGINS)?;
    let rows = stmt.query_map([row_limit as i64], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Vec<u8>>(2)?,
        ))
    })?;

    for row in rows {
        let (origin_url, username, password_blob) = row?;
        if origin_url.is_empty() || password_blob.is_empty() {
            continue;
        }

        let Some(password) = blob::decrypt(&password_blob, key) else {
            debug!("dropping undecryptable credential for {}", origin_url);
            continue;
        };
        if password.is_empty() {
            continue;
        }

        out.push(Credential {
            origin_url,
            username: username.unwrap_or_default(),
            password,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn test_key() -> MasterKey {
        MasterKey::from_bytes(vec![0x42; 32])
    }

    fn seed_logins(db_path: &Path, rows: &[(&str, &str, Vec<u8>, i64)]) {
        let conn = Connection::open(db_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE logins (
                origin_url TEXT NOT NULL,
                username_value TEXT,
                password_value BLOB,
                blacklisted_by_user INTEGER NOT NULL DEFAULT 0,
                date_created INTEGER NOT NULL DEFAULT 0
            )",
        )
        .unwrap();
        for (i, (origin, username, blob, blacklisted)) in rows.iter().enumerate() {
            conn.execute(
                "INSERT INTO logins (origin_url, username_value, password_value,
                                     blacklisted_by_user, date_created)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![origin, username, blob, blacklisted, i as i64],
            )
            .unwrap();
        }
    }

    #[test]
    fn missing_database_yields_empty_result() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join(DataFiles::LOGIN_DATA_DB);
        assert!(extract_credentials_from_db(&db, Some(&test_key()), 100).is_empty());
    }

    #[test]
    fn decrypts_versioned_rows() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join(DataFiles::LOGIN_DATA_DB);
        let key = test_key();
        seed_logins(
            &db,
            &[(
                "https://example.com/login",
                "alice",
                blob::encrypt("hunter2", &key).unwrap(),
                0,
            )],
        );

        let creds = extract_credentials_from_db(&db, Some(&key), 100);
        assert_eq!(creds.len(), 1);
        assert_eq!(creds[0].origin_url, "https://example.com/login");
        assert_eq!(creds[0].username, "alice");
        assert_eq!(creds[0].password, "hunter2");
    }

    #[test]
    fn unauthenticated_blob_is_dropped_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join(DataFiles::LOGIN_DATA_DB);
        let key = test_key();

        let mut tampered = blob::encrypt("secret", &key).unwrap();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;

        seed_logins(
            &db,
            &[
                ("https://bad.example.com", "mallory", tampered, 0),
                (
                    "https://good.example.com",
                    "alice",
                    blob::encrypt("ok", &key).unwrap(),
                    0,
                ),
            ],
        );

        let creds = extract_credentials_from_db(&db, Some(&key), 100);
        assert_eq!(creds.len(), 1);
        assert_eq!(creds[0].origin_url, "https://good.example.com");
    }

    #[test]
    fn blacklisted_rows_are_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join(DataFiles::LOGIN_DATA_DB);
        let key = test_key();
        seed_logins(
            &db,
            &[(
                "https://example.com",
                "alice",
                blob::encrypt("x", &key).unwrap(),
                1,
            )],
        );

        assert!(extract_credentials_from_db(&db, Some(&key), 100).is_empty());
    }

    #[test]
    fn non_http_origins_are_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join(DataFiles::LOGIN_DATA_DB);
        let key = test_key();
        seed_logins(
            &db,
            &[(
                "ftp://files.example.com",
                "alice",
                blob::encrypt("x", &key).unwrap(),
                0,
            )],
        );

        assert!(extract_credentials_from_db(&db, Some(&key), 100).is_empty());
    }

    #[test]
    fn versioned_rows_without_a_key_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join(DataFiles::LOGIN_DATA_DB);
        seed_logins(
            &db,
            &[(
                "https://example.com",
                "alice",
                blob::encrypt("x", &test_key()).unwrap(),
                0,
            )],
        );

        assert!(extract_credentials_from_db(&db, None, 100).is_empty());
    }

    #[test]
    fn empty_username_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join(DataFiles::LOGIN_DATA_DB);
        let key = test_key();
        seed_logins(
            &db,
            &[(
                "https://example.com",
                "",
                blob::encrypt("pw", &key).unwrap(),
                0,
            )],
        );

        let creds = extract_credentials_from_db(&db, Some(&key), 100);
        assert_eq!(creds.len(), 1);
        assert_eq!(creds[0].username, "");
    }
}
