//! # courier-crm
//!
//! Remote contact store client and reconciliation engine for Courier.

pub mod reconcile;
pub mod zoho;

pub use reconcile::Reconciler;
pub use zoho::ZohoClient;
