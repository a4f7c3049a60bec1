//! Realtime core components for the gateway runtime.
//!
//! Session registry (the connection directory) and the per-message context
//! shared with services.

mod realtime;
mod session_registry;

pub use realtime::{RealtimeCore, RealtimeCtx};
pub use session_registry::{Connection, ConnectionDirectory, SessionRegistry};
