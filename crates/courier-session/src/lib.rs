//! # courier-session
//!
//! Number queue and session batch controller for Courier.

pub mod queue;
pub mod session;

pub use session::{SessionController, SessionMode, SessionState};
