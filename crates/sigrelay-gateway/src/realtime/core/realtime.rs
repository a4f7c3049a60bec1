use std::sync::Arc;

use serde::Serialize;

use crate::realtime::core::{Connection, SessionRegistry};
use crate::signaling::ChannelRegistry;

/// RealtimeCore: live sessions and the channels they participate in.
pub struct RealtimeCore {
    pub sessions: Arc<SessionRegistry>,
    pub channels: Arc<ChannelRegistry>,
}

impl RealtimeCore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::new()),
            channels: Arc::new(ChannelRegistry::new()),
        }
    }

    /// Register a freshly bound connection.
    pub fn attach(&self, conn: &Connection) {
        if let Some(user) = conn.bound_user() {
            self.sessions.insert(user.to_string(), conn.clone());
        }
    }

    /// Forget a connection and drop it from any channel it is still a member of.
    pub fn detach(&self, conn: &Connection) {
        let Some(user) = conn.bound_user() else { return };
        self.sessions.remove_session(user, conn.session_id());
        let left = self.channels.remove_connection(user, conn);
        if left > 0 {
            tracing::debug!(%user, session = %conn.session_id(), channels = left, "session left channels");
        }
    }
}

impl Default for RealtimeCore {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-message context passed to services.
#[derive(Clone)]
pub struct RealtimeCtx {
    conn: Connection,
    request_id: u64,
}

impl RealtimeCtx {
    pub fn new(conn: Connection, request_id: u64) -> Self {
        Self { conn, request_id }
    }

    pub fn connection(&self) -> &Connection { &self.conn }
    pub fn request_id(&self) -> u64 { self.request_id }

    /// Send to the connection that issued the current request.
    pub fn reply<T: Serialize>(&self, msg: &T) {
        self.conn.send(msg);
    }
}
