//! Push notification relay to an ntfy-style server.
//!
//! Messages are posted as plain-text bodies to `<NOTIFICATION_URL>/<topic>`.
//! When an attachment token is supplied, the provider is told to fetch the
//! image from the relay's unauthenticated attachment route; it never sees the
//! API key or the stored filename.

use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::config::{Config, Secret};

/// Timeout for a single publish request.
pub const PUBLISH_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest topic name accepted.
const MAX_TOPIC_LEN: usize = 64;

/// Errors produced while relaying a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Topic is empty, too long, or contains characters outside `[A-Za-z0-9_-]`.
    #[error("invalid topic")]
    InvalidTopic,

    /// The provider could not be reached.
    #[error("notification request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("notification provider returned status {0}")]
    Rejected(u16),
}

/// Client for the configured push notification server.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference-counted.
#[derive(Clone, Debug)]
pub struct Notifier {
    client: reqwest::Client,
    base_url: String,
    token: Option<Secret>,
    public_base_url: Option<String>,
}

impl Notifier {
    /// Build a notifier from configuration, or `None` if no push server is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(cfg: &Config) -> Result<Option<Self>, NotifyError> {
        match &cfg.notification_url {
            Some(url) => Ok(Some(Self::new(
                url.clone(),
                cfg.notification_token.clone(),
                cfg.public_base_url.clone(),
            )?)),
            None => Ok(None),
        }
    }

    /// Create a notifier posting to `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        base_url: String,
        token: Option<Secret>,
        public_base_url: Option<String>,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(PUBLISH_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url,
            token,
            public_base_url,
        })
    }

    /// Publish `message` to `topic`.
    ///
    /// `attachment_token` must already have been validated by the caller; it is
    /// only forwarded when a public base URL is configured.
    ///
    /// # Errors
    ///
    /// See [`NotifyError`].
    pub async fn publish(
        &self,
        topic: &str,
        message: &str,
        attachment_token: Option<&str>,
    ) -> Result<(), NotifyError> {
        validate_topic(topic)?;

        let mut req = self
            .client
            .post(join_url(&self.base_url, topic))
            .header("Tags", "loudspeaker")
            .body(message.to_owned());
        if let Some(token) = &self.token {
            req = req.bearer_auth(token.expose());
        }
        if let Some(url) = attachment_token.and_then(|t| self.attachment_url(t)) {
            req = req.header("Attach", url);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status.as_u16()));
        }
        debug!(topic, "notification relayed");
        Ok(())
    }

    /// Public URL at which the provider can fetch the attachment.
    pub fn attachment_url(&self, token: &str) -> Option<String> {
        self.public_base_url
            .as_deref()
            .map(|base| join_url(&join_url(base, "attachment"), token))
    }
}

fn validate_topic(topic: &str) -> Result<(), NotifyError> {
    let ok = !topic.is_empty()
        && topic.len() <= MAX_TOPIC_LEN
        && topic
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if ok {
        Ok(())
    } else {
        Err(NotifyError::InvalidTopic)
    }
}

fn join_url(base: &str, segment: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), segment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::post,
        Router,
    };
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone)]
    struct Captured {
        topic: String,
        body: String,
        auth: Option<String>,
        tags: Option<String>,
        attach: Option<String>,
    }

    type Sink = Arc<Mutex<Vec<Captured>>>;

    async fn capture(
        State(sink): State<Sink>,
        Path(topic): Path<String>,
        headers: HeaderMap,
        body: String,
    ) -> StatusCode {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        sink.lock().unwrap().push(Captured {
            topic,
            body,
            auth: header("authorization"),
            tags: header("tags"),
            attach: header("attach"),
        });
        StatusCode::OK
    }

    async fn spawn_provider() -> (String, Sink) {
        let sink: Sink = Arc::default();
        let app = Router::new()
            .route("/:topic", post(capture))
            .route("/fail/:topic", post(|| async { StatusCode::FORBIDDEN }))
            .with_state(sink.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), sink)
    }

    #[tokio::test]
    async fn publishes_with_auth_and_tags() {
        let (base, sink) = spawn_provider().await;
        let n = Notifier::new(format!("{base}/"), Some("tk_abc".into()), None).unwrap();
        n.publish("frontdoor", "motion detected", None).await.unwrap();

        let got = sink.lock().unwrap().clone();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].topic, "frontdoor");
        assert_eq!(got[0].body, "motion detected");
        assert_eq!(got[0].auth.as_deref(), Some("Bearer tk_abc"));
        assert_eq!(got[0].tags.as_deref(), Some("loudspeaker"));
        assert!(got[0].attach.is_none());
    }

    #[tokio::test]
    async fn attaches_public_link_when_configured() {
        let (base, sink) = spawn_provider().await;
        let n = Notifier::new(base, None, Some("https://relay.example.com/".into())).unwrap();
        n.publish("frontdoor", "motion", Some("AbC-_9")).await.unwrap();

        let got = sink.lock().unwrap().clone();
        assert!(got[0].auth.is_none());
        assert_eq!(
            got[0].attach.as_deref(),
            Some("https://relay.example.com/attachment/AbC-_9")
        );
    }

    #[tokio::test]
    async fn attachment_dropped_without_public_base_url() {
        let (base, sink) = spawn_provider().await;
        let n = Notifier::new(base, None, None).unwrap();
        n.publish("frontdoor", "motion", Some("AbC-_9")).await.unwrap();
        assert!(sink.lock().unwrap()[0].attach.is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let (base, _sink) = spawn_provider().await;
        let n = Notifier::new(format!("{base}/fail"), None, None).unwrap();
        let err = n.publish("frontdoor", "motion", None).await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected(403)));
    }

    #[tokio::test]
    async fn invalid_topic_never_leaves_the_process() {
        let (base, sink) = spawn_provider().await;
        let n = Notifier::new(base, None, None).unwrap();
        let long = "t".repeat(65);
        for bad in ["", "a/b", "../admin", "has space", long.as_str()] {
            let err = n.publish(bad, "motion", None).await.unwrap_err();
            assert!(matches!(err, NotifyError::InvalidTopic), "{bad}");
        }
        assert!(sink.lock().unwrap().is_empty());
    }

    #[test]
    fn join_url_handles_trailing_slash() {
        assert_eq!(join_url("https://n.example/", "t"), "https://n.example/t");
        assert_eq!(join_url("https://n.example", "t"), "https://n.example/t");
    }
}
