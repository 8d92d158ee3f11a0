//! Wire types and errors shared by the camera media relay crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
