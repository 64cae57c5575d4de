//! Gateway-side models.

pub mod session;

pub use session::{
    PlatformSession, SessionError, SessionPersister, SessionReader, clear_platform_session,
    keys as session_keys,
};
