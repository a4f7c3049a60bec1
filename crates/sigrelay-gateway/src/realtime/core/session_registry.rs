use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::{DashMap, DashSet};
use serde::Serialize;
use tokio::sync::mpsc;

/// One session's outbound queue sender plus the identity bound to it.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    session_id: String,
    user: Option<String>,
    tx: mpsc::Sender<Message>,
}

impl Connection {
    /// Connection that completed user association.
    pub fn bound(session_id: impl Into<String>, user: impl Into<String>, tx: mpsc::Sender<Message>) -> Self {
        Self::build(session_id.into(), Some(user.into()), tx)
    }

    /// Connection without a user. Every signaling request on it is rejected.
    pub fn unbound(session_id: impl Into<String>, tx: mpsc::Sender<Message>) -> Self {
        Self::build(session_id.into(), None, tx)
    }

    fn build(session_id: String, user: Option<String>, tx: mpsc::Sender<Message>) -> Self {
        Self {
            inner: Arc::new(ConnectionInner { session_id, user, tx }),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    /// User id this connection is authenticated as, if any.
    pub fn bound_user(&self) -> Option<&str> {
        self.inner.user.as_deref()
    }

    pub fn same_session(&self, other: &Connection) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.session_id == other.inner.session_id
    }

    /// Serialize and enqueue without waiting. A full or closed queue drops the message.
    pub fn send<T: Serialize>(&self, msg: &T) {
        let text = match serde_json::to_string(msg) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(session = %self.session_id(), error = %e, "outbound encode failed");
                return;
            }
        };
        self.send_raw(Message::Text(text));
    }

    pub fn send_raw(&self, msg: Message) {
        if let Err(e) = self.inner.tx.try_send(msg) {
            tracing::debug!(session = %self.session_id(), error = %e, "outbound message dropped");
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("session_id", &self.inner.session_id)
            .field("user", &self.inner.user)
            .finish()
    }
}

/// Lookup of live connections by user, as consumed by the signaling engine.
pub trait ConnectionDirectory: Send + Sync {
    /// All connections of a user, or `None` if the user has none.
    fn lookup_connections_by_user_id(&self, user_id: &str) -> Option<Vec<Connection>>;
}

/// Session registry:
/// - `session_key -> Connection`
/// - `user_key -> {session_key...}`
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Connection>,
    user_index: DashMap<String, DashSet<String>>,
    seq: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            user_index: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    /// Allocate a process-unique session key.
    pub fn next_session_id(&self) -> String {
        format!("s{}", self.seq.fetch_add(1, Ordering::Relaxed))
    }

    pub fn insert(&self, user_key: String, conn: Connection) {
        let session_key = conn.session_id().to_string();
        self.user_index
            .entry(user_key)
            .or_insert_with(DashSet::new)
            .insert(session_key.clone());
        self.sessions.insert(session_key, conn);
    }

    pub fn remove_session(&self, user_key: &str, session_key: &str) -> Option<Connection> {
        if let Some(set) = self.user_index.get(user_key) {
            set.remove(session_key);
            if set.is_empty() {
                drop(set);
                self.user_index.remove_if(user_key, |_, s| s.is_empty());
            }
        }
        self.sessions.remove(session_key).map(|(_, conn)| conn)
    }

    pub fn get_session(&self, session_key: &str) -> Option<Connection> {
        self.sessions.get(session_key).map(|r| r.value().clone())
    }

    pub fn get_user_sessions(&self, user_key: &str) -> Vec<Connection> {
        let keys: Vec<String> = match self.user_index.get(user_key) {
            Some(set) => set.iter().map(|s| s.key().to_string()).collect(),
            None => return vec![],
        };
        keys.iter().filter_map(|sid| self.get_session(sid)).collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl ConnectionDirectory for SessionRegistry {
    fn lookup_connections_by_user_id(&self, user_id: &str) -> Option<Vec<Connection>> {
        let conns = self.get_user_sessions(user_id);
        if conns.is_empty() {
            None
        } else {
            Some(conns)
        }
    }
}
