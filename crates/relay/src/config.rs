//! Configuration loading and validation for the relay service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use anyhow::{Context, Result};
use serde::Deserialize;

/// A configuration value that must never be printed.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

/// Validated relay service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Shared secret expected in the `X-API-Key` header. **Required.**
    pub api_key: Secret,

    /// Secret from which the attachment token key is derived. **Required.**
    pub token_secret: Secret,

    /// Directory holding uploaded images.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Upper bound on request bodies, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Base URL of the push notification server; topics are appended to it.
    #[serde(default)]
    pub notification_url: Option<String>,

    /// Bearer token for the push notification server.
    #[serde(default)]
    pub notification_token: Option<Secret>,

    /// Externally reachable base URL of this service, used to build the
    /// attachment links handed to the push provider.
    #[serde(default)]
    pub public_base_url: Option<String>,

    /// OTLP endpoint; span export is disabled when unset.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_upload_dir() -> String {
    "uploads".into()
}
fn default_listen_port() -> u16 {
    8000
}
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(self.api_key.expose(), "API_KEY")?;
        ensure_non_empty(self.token_secret.expose(), "TOKEN_SECRET")?;
        ensure_non_empty(&self.upload_dir, "UPLOAD_DIR")?;

        if self.listen_port == 0 {
            anyhow::bail!("LISTEN_PORT must be > 0");
        }
        if self.max_upload_bytes == 0 {
            anyhow::bail!("MAX_UPLOAD_BYTES must be > 0");
        }
        if let Some(url) = &self.notification_url {
            ensure_http_url(url, "NOTIFICATION_URL")?;
        }
        if let Some(url) = &self.public_base_url {
            ensure_http_url(url, "PUBLIC_BASE_URL")?;
        }
        Ok(())
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}

fn ensure_http_url(value: &str, name: &str) -> Result<()> {
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        anyhow::bail!("{name} must be an http:// or https:// URL");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            api_key: "camera-key".into(),
            token_secret: "test-secret".into(),
            upload_dir: default_upload_dir(),
            listen_port: default_listen_port(),
            max_upload_bytes: default_max_upload_bytes(),
            notification_url: Some("https://ntfy.example.com/".into()),
            notification_token: Some("tk_abc".into()),
            public_base_url: None,
            otel_exporter_otlp_endpoint: None,
            log_level: default_log_level(),
        }
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_upload_dir(), "uploads");
        assert_eq!(default_listen_port(), 8000);
        assert_eq!(default_max_upload_bytes(), 10_485_760);
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn validate_accepts_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_token_secret() {
        let cfg = Config {
            token_secret: "  ".into(),
            ..valid()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("TOKEN_SECRET"));
    }

    #[test]
    fn validate_rejects_empty_api_key() {
        let cfg = Config {
            api_key: "".into(),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_body_limit() {
        let cfg = Config {
            max_upload_bytes: 0,
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_http_notification_url() {
        let cfg = Config {
            notification_url: Some("ftp://ntfy".into()),
            ..valid()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let s = format!("{:?}", valid());
        assert!(!s.contains("camera-key"));
        assert!(!s.contains("test-secret"));
        assert!(!s.contains("tk_abc"));
        assert!(s.contains("REDACTED"));
    }
}
