//! Link dispatcher — the side effects of processing one number.

use std::sync::Arc;

use async_trait::async_trait;
use courier_core::phone::digit_core;
use courier_core::traits::Dispatch;
use courier_crm::Reconciler;
use tracing::{info, warn};
use url::Url;

use crate::webhook::WebhookNotifier;

/// Opens the chat link and fires the per-number side effects.
///
/// `dispatch` returns as soon as the link is announced; reconciliation
/// and the webhook run as detached tasks so the session controller is
/// never blocked on the network.
pub struct LinkDispatcher {
    base_url: String,
    message: String,
    reconciler: Option<Arc<Reconciler>>,
    notifier: Option<WebhookNotifier>,
}

impl LinkDispatcher {
    pub fn new(
        base_url: String,
        message: String,
        reconciler: Option<Arc<Reconciler>>,
        notifier: Option<WebhookNotifier>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            message,
            reconciler,
            notifier,
        }
    }

    /// Build the chat link for one number. The text query is omitted
    /// entirely when the message is blank.
    fn chat_link(&self, number: &str) -> Result<Url, url::ParseError> {
        let digits = digit_core(number);
        let mut link = Url::parse(&format!("{}/{digits}", self.base_url))?;
        if !self.message.trim().is_empty() {
            link.query_pairs_mut().append_pair("text", &self.message);
        }
        Ok(link)
    }
}

#[async_trait]
impl Dispatch for LinkDispatcher {
    async fn dispatch(&self, number: &str) {
        match self.chat_link(number) {
            Ok(link) => println!("→ open {link}"),
            Err(e) => warn!("dispatch: bad chat link for {number}: {e}"),
        }

        if let Some(reconciler) = &self.reconciler {
            let reconciler = Arc::clone(reconciler);
            let number = number.to_string();
            tokio::spawn(async move {
                if reconciler.reconcile(&number).await {
                    info!("crm updated for {number}");
                } else {
                    warn!("crm update failed for {number}");
                }
            });
        }

        if let Some(notifier) = &self.notifier {
            let notifier = notifier.clone();
            let digits = digit_core(number);
            tokio::spawn(async move {
                notifier.notify(&digits).await;
            });
        }
    }
}
