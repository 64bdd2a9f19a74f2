use crate::error::CourierError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A contact record in the remote store.
///
/// The core never creates or deletes these; it only flips the outreach
/// flag on records the store already holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteContact {
    pub id: String,
    /// The phone-like field value the contact was matched on.
    pub phone: String,
    /// Current outreach flag value.
    pub flag: String,
}

/// Phone-like fields searchable in the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Mobile,
    Phone,
}

impl ContactField {
    /// Lookup order tried for each candidate format.
    pub const SEARCH_ORDER: [ContactField; 2] = [ContactField::Mobile, ContactField::Phone];

    /// API name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobile => "Mobile",
            Self::Phone => "Phone",
        }
    }
}

/// Remote contact store capability — search and flag update.
///
/// Implementations surface an auth rejection as
/// [`CourierError::Unauthorized`], distinct from an empty search result.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Exact-match search on one phone-like field. An empty result means
    /// "no match", not an error.
    async fn search(
        &self,
        field: ContactField,
        value: &str,
    ) -> Result<Vec<RemoteContact>, CourierError>;

    /// Set the outreach flag on a contact by id. Returns whether the
    /// store accepted the update.
    async fn update_flag(&self, id: &str, value: &str) -> Result<bool, CourierError>;
}

/// Dispatch capability — everything that happens when a number is
/// processed.
///
/// Implementations must return promptly: slow side effects (opening the
/// chat link, CRM reconciliation, the webhook) are spawned, never awaited
/// by the session controller.
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch(&self, number: &str);
}
