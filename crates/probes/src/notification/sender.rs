use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};
use url::Url;

use super::envelope::NotificationEnvelope;
use crate::error::{ConfigError, NotifyError, ProbeError};

/// Path on the hub that accepts raw notifications
pub const NOTIFICATION_PATH: &str = "/rawNotification/simplePost";

/// Default upper bound on one hub request
pub const DEFAULT_HUB_TIMEOUT_SECONDS: u64 = 10;

/// Delivers notification envelopes somewhere
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, envelope: &NotificationEnvelope) -> Result<(), NotifyError>;
}

/// POSTs envelopes as JSON to a notification hub.
///
/// The underlying client pools connections; every request's connection is
/// returned to the pool (or closed) when its response is dropped, whether the
/// call succeeded or not.
#[derive(Debug, Clone)]
pub struct NotificationSender {
    client: reqwest::Client,
    endpoint: String,
}

impl NotificationSender {
    pub fn new(hub_base_url: &str, timeout_seconds: u64) -> Result<Self, ProbeError> {
        validate_hub_url(hub_base_url)?;
        if timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout("hub").into());
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .user_agent(concat!("probes/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let endpoint = format!("{}{}", hub_base_url.trim_end_matches('/'), NOTIFICATION_PATH);
        Ok(Self { client, endpoint })
    }

    /// Full URL notifications are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Notifier for NotificationSender {
    async fn notify(&self, envelope: &NotificationEnvelope) -> Result<(), NotifyError> {
        let body = serde_json::to_vec(envelope)?;

        debug!(url = %self.endpoint, topic = %envelope.topic, "Posting notification");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|source| NotifyError::Transport { url: self.endpoint.clone(), source })?;

        // The hub's answer does not change what the probe does next
        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "Hub accepted notification");
        } else {
            warn!(status = status.as_u16(), url = %self.endpoint, "Hub answered with a non-success status");
        }

        Ok(())
    }
}

/// Hub URLs must be absolute http(s) URLs
fn validate_hub_url(hub_base_url: &str) -> Result<(), ConfigError> {
    let parsed = Url::parse(hub_base_url).map_err(|e| ConfigError::HubUrl {
        url: hub_base_url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::HubUrl {
            url: hub_base_url.to_string(),
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_path() {
        let sender = NotificationSender::new("http://hub.local:8080", 5).unwrap();
        assert_eq!(sender.endpoint(), "http://hub.local:8080/rawNotification/simplePost");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let sender = NotificationSender::new("https://hub.local/", 5).unwrap();
        assert_eq!(sender.endpoint(), "https://hub.local/rawNotification/simplePost");
    }

    #[test]
    fn test_rejects_bad_hub_urls() {
        for url in ["ftp://hub.local", "not-a-url", ""] {
            let result = NotificationSender::new(url, 5);
            assert!(
                matches!(result, Err(ProbeError::Config(ConfigError::HubUrl { .. }))),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let result = NotificationSender::new("http://hub.local:8080", 0);
        assert!(matches!(result, Err(ProbeError::Config(ConfigError::ZeroTimeout("hub")))));
    }
}
