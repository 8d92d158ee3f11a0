//! Structured logging and optional OpenTelemetry span export.
//!
//! # Telemetry invariants
//!
//! - **No secrets, key material, API keys or token plaintext** may appear in
//!   any span attribute or log field. Unauthenticated attachment requests never
//!   log the decoded filename.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`), overridden by
//!   `RUST_LOG` when set.

pub mod init;

pub use init::init_telemetry;
