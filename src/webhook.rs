//! Best-effort completion webhook.

use courier_core::config::WebhookConfig;
use serde::Serialize;
use tracing::{debug, warn};

/// One fire-and-forget POST per completed number. Failures are logged
/// and dropped; there is no retry.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    phone: &'a str,
}

impl WebhookNotifier {
    /// Build a notifier when the webhook is enabled and has a URL.
    pub fn from_config(cfg: &WebhookConfig) -> Option<Self> {
        if !cfg.enabled || cfg.url.is_empty() {
            return None;
        }
        Some(Self {
            client: reqwest::Client::new(),
            url: cfg.url.clone(),
        })
    }

    /// Post the digits-only number to the configured URL.
    pub async fn notify(&self, digits: &str) {
        let payload = WebhookPayload { phone: digits };
        match self.client.post(&self.url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => {
                debug!("webhook delivered for {digits}");
            }
            Ok(resp) => warn!("webhook returned {} for {digits}", resp.status()),
            Err(e) => warn!("webhook failed for {digits}: {e}"),
        }
    }
}
