//! Foreign-browser side: profile discovery, key handling, and the three
//! format-specific extractors.

pub mod blob;
pub mod bookmarks;
pub mod history;
pub mod logins;
pub mod master_key;
pub mod profile;

pub use master_key::MasterKey;
pub use profile::ChromeProfile;
