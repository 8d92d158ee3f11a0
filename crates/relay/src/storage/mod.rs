//! On-disk image storage: one file per upload under a single root directory.
//!
//! # Security invariants
//!
//! - Names handed to [`ImageStore::resolve`] are treated as untrusted, even
//!   when they came out of an authenticated token. Only a single normal path
//!   component is ever joined onto the root.
//! - Uploads never overwrite an existing file.

pub mod kind;
pub mod store;

pub use kind::ImageKind;
pub use store::{ImageStore, StorageError};
