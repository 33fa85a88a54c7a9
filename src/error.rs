use thiserror::Error;

pub type MigrateResult<T> = Result<T, MigrateError>;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("I/O error: {0}")]
    StdIo(#[from] std::io::Error),

    #[error("Windows error: {0}")]
    Windows(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Invalid key length: {0}")]
    InvalidKeyLength(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// Helper function to convert Windows errors
#[cfg(windows)]
pub fn convert_windows_error(error: windows::core::Error) -> MigrateError {
    let code = error.code().0;

    match code {
        // File not found
        -2147024894 => MigrateError::Io(format!("File not found: {error}")),
        // Path not found
        -2147024893 => MigrateError::Io(format!("Path not found: {error}")),
        _ => {
            let msg = format!("HRESULT: 0x{:08X} - {}", error.code().0, error);
            MigrateError::Windows(msg)
        }
    }
}
