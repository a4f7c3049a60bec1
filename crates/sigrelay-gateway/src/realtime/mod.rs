//! Realtime runtime for the sigrelay gateway.
//!
//! Connections, the session registry and session lifecycle bookkeeping.

pub mod core;

pub use self::core::{Connection, ConnectionDirectory, RealtimeCore, RealtimeCtx, SessionRegistry};
