//! Windows DPAPI wrapper used for the master key and legacy blobs.

use crate::error::{convert_windows_error, MigrateResult};
use tracing::debug;
use windows::Win32::Foundation::{LocalFree, HLOCAL};
use windows::Win32::Security::Cryptography::{CryptUnprotectData, CRYPT_INTEGER_BLOB};

/// Unwraps bytes protected with per-user DPAPI (CurrentUser scope).
pub fn dpapi_unprotect(data: &[u8]) -> MigrateResult<Vec<u8>> {
    unsafe {
        let data_in = CRYPT_INTEGER_BLOB {
            cbData: data.len() as u32,
            pbData: data.as_ptr() as *mut u8,
        };

        let mut data_out = CRYPT_INTEGER_BLOB::default();

        CryptUnprotectData(&data_in, None, None, None, None, 0, &mut data_out)
            .map_err(convert_windows_error)?;

        let result =
            std::slice::from_raw_parts(data_out.pbData, data_out.cbData as usize).to_vec();

        LocalFree(HLOCAL(data_out.pbData as *mut std::ffi::c_void));

        debug!("DPAPI decrypted {} bytes", result.len());
        Ok(result)
    }
}
