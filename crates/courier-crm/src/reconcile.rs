//! Contact reconciliation.
//!
//! After a number is dispatched, find its contact record and mark the
//! outreach flag. Best effort: every failure degrades to `false` plus a
//! log line, never an error to the caller.

use std::sync::Arc;

use courier_core::{
    error::CourierError,
    phone::{digit_core, generate_formats},
    traits::{ContactField, ContactStore, RemoteContact},
};
use tracing::{debug, info, warn};

/// Reconciliation engine over an abstract contact store.
pub struct Reconciler {
    store: Arc<dyn ContactStore>,
    flag_value: String,
}

impl Reconciler {
    pub fn new(store: Arc<dyn ContactStore>, flag_value: impl Into<String>) -> Self {
        Self {
            store,
            flag_value: flag_value.into(),
        }
    }

    /// Mark the contact matching `raw` as contacted.
    ///
    /// Tries every candidate format in confidence order against the
    /// Mobile and Phone fields; the first hit wins and gets exactly one
    /// flag update. Returns whether that update went through.
    pub async fn reconcile(&self, raw: &str) -> bool {
        if digit_core(raw).is_empty() {
            warn!("reconcile: no digits in {raw:?}, skipping lookup");
            return false;
        }

        let formats = generate_formats(raw);
        debug!("reconcile: {} candidate formats for {raw}", formats.len());

        let contact = match self.find_first(&formats).await {
            Ok(Some(contact)) => contact,
            Ok(None) => {
                info!("reconcile: no contact found for {raw}");
                return false;
            }
            Err(CourierError::Unauthorized) => {
                warn!("reconcile: credential rejected, aborting lookup for {raw}");
                return false;
            }
            Err(e) => {
                warn!("reconcile: lookup failed for {raw}: {e}");
                return false;
            }
        };

        match self.store.update_flag(&contact.id, &self.flag_value).await {
            Ok(true) => {
                info!("reconcile: flagged contact {} for {raw}", contact.id);
                true
            }
            Ok(false) => {
                warn!("reconcile: store rejected flag update for contact {}", contact.id);
                false
            }
            Err(CourierError::Unauthorized) => {
                warn!("reconcile: credential rejected during update for {raw}");
                false
            }
            Err(e) => {
                warn!("reconcile: update failed for {raw}: {e}");
                false
            }
        }
    }

    /// First-match-wins lookup across candidates and fields.
    async fn find_first(
        &self,
        formats: &[String],
    ) -> Result<Option<RemoteContact>, CourierError> {
        for candidate in formats {
            for field in ContactField::SEARCH_ORDER {
                let mut hits = self.store.search(field, candidate).await?;
                if !hits.is_empty() {
                    debug!("reconcile: matched {candidate} on {}", field.as_str());
                    return Ok(Some(hits.remove(0)));
                }
            }
        }
        Ok(None)
    }

    /// Union search: the first match of every candidate format,
    /// deduplicated by contact id. Diagnostic helper only; reconciliation
    /// itself stays first-match-wins.
    pub async fn search_all(&self, raw: &str) -> Result<Vec<RemoteContact>, CourierError> {
        let mut contacts: Vec<RemoteContact> = Vec::new();
        for candidate in generate_formats(raw) {
            for field in ContactField::SEARCH_ORDER {
                let mut hits = self.store.search(field, &candidate).await?;
                if hits.is_empty() {
                    continue;
                }
                let hit = hits.remove(0);
                if !contacts.iter().any(|c| c.id == hit.id) {
                    contacts.push(hit);
                }
                break;
            }
        }
        Ok(contacts)
    }
}
