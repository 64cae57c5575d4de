//! Business logic services for the gateway.
//!
//! # Services
//!
//! - `callback` - Platform OAuth callback state machine

pub mod callback;

pub use callback::{CallbackOrchestrator, CallbackOutcome, CallbackParams};
