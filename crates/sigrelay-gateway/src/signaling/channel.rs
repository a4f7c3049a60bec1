//! Signaling channel: the authorization and delivery scope of one call.

use std::sync::Arc;
use std::time::Instant;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use sigrelay_core::error::{Result, SigRelayError};
use sigrelay_core::protocol::webrtc::{ChannelPipeline, Subtype, WebRtcEnvelope};
use sigrelay_core::signaling::HashAuthenticator;

use crate::realtime::Connection;

/// How the channel id was derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelKind {
    /// Named group channel; id derived from the group.
    Group(String),
    /// Ad hoc call channel with a random id.
    Call,
}

/// Membership (`user_id -> Connection`, one per user) plus tag validation.
pub struct Channel {
    id: String,
    kind: ChannelKind,
    created: Instant,
    pipeline: Option<ChannelPipeline>,
    members: DashMap<String, Connection>,
    auth: Arc<HashAuthenticator>,
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Channel {
    pub fn group(
        id: impl Into<String>,
        group: impl Into<String>,
        pipeline: Option<ChannelPipeline>,
        auth: Arc<HashAuthenticator>,
    ) -> Self {
        Self::build(id.into(), ChannelKind::Group(group.into()), pipeline, auth)
    }

    pub fn call(id: impl Into<String>, auth: Arc<HashAuthenticator>) -> Self {
        Self::build(id.into(), ChannelKind::Call, None, auth)
    }

    fn build(id: String, kind: ChannelKind, pipeline: Option<ChannelPipeline>, auth: Arc<HashAuthenticator>) -> Self {
        Self {
            id,
            kind,
            created: Instant::now(),
            pipeline,
            members: DashMap::new(),
            auth,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &ChannelKind {
        &self.kind
    }

    pub fn group_id(&self) -> Option<&str> {
        match &self.kind {
            ChannelKind::Group(g) => Some(g),
            ChannelKind::Call => None,
        }
    }

    pub fn created(&self) -> Instant {
        self.created
    }

    pub fn pipeline(&self) -> Option<&ChannelPipeline> {
        self.pipeline.as_ref()
    }

    /// Add a member. Re-adding the same connection is a no-op. Group channels
    /// let a user move to a new connection; call channels reject it.
    pub fn add(&self, user_id: &str, conn: &Connection) -> Result<()> {
        match self.members.entry(user_id.to_string()) {
            Entry::Vacant(e) => {
                e.insert(conn.clone());
            }
            Entry::Occupied(mut e) => {
                if e.get().same_session(conn) {
                    return Ok(());
                }
                if matches!(self.kind, ChannelKind::Call) {
                    return Err(SigRelayError::bad("user already in channel"));
                }
                tracing::debug!(channel = %self.id, user = %user_id, session = %conn.session_id(), "group member connection replaced");
                e.insert(conn.clone());
            }
        }
        Ok(())
    }

    pub fn remove(&self, user_id: &str) -> Option<Connection> {
        self.members.remove(user_id).map(|(_, c)| c)
    }

    /// Remove `user_id` only while it is still mapped to `conn`.
    pub fn remove_connection(&self, user_id: &str, conn: &Connection) -> bool {
        self.members
            .remove_if(user_id, |_, c| c.same_session(conn))
            .is_some()
    }

    pub fn get(&self, user_id: &str) -> Option<Connection> {
        self.members.get(user_id).map(|c| c.value().clone())
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.members.contains_key(user_id)
    }

    /// Member ids, sorted.
    pub fn members(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.members.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Validate a message sent by `user_id` against this channel.
    ///
    /// In group mode the tag covers the group id, otherwise the target.
    /// Signal messages are only accepted from current members.
    pub fn check_message(&self, user_id: &str, msg: &WebRtcEnvelope) -> Result<()> {
        let peer = if msg.group.is_empty() {
            msg.target.as_str()
        } else {
            if self.group_id() != Some(msg.group.as_str()) {
                return Err(SigRelayError::bad("channel group mismatch"));
            }
            msg.group.as_str()
        };

        if !self
            .auth
            .verify_encoded(&msg.hash, &msg.msg_type, user_id, peer, &self.id)?
        {
            return Err(SigRelayError::bad("invalid channel hash"));
        }

        if msg.subtype == Subtype::Signal && !self.contains(user_id) {
            return Err(SigRelayError::bad("not a channel member"));
        }
        Ok(())
    }

    /// Relay `msg` from `from`: point-to-point when a connection was resolved,
    /// otherwise to every other member when `to` names this channel's group.
    pub fn forward(&self, from: &str, to: &str, conn: Option<&Connection>, mut msg: WebRtcEnvelope) -> Result<()> {
        msg.source = from.to_string();
        msg.id = 0;

        if let Some(c) = conn {
            c.send(&msg);
            return Ok(());
        }

        if self.group_id() == Some(to) {
            // Snapshot first; no shard lock is held while sending.
            let targets: Vec<Connection> = self
                .members
                .iter()
                .filter(|e| e.key() != from)
                .map(|e| e.value().clone())
                .collect();
            tracing::debug!(channel = %self.id, from = %from, n = targets.len(), "group fan-out");
            for c in targets {
                c.send(&msg);
            }
            return Ok(());
        }

        Err(SigRelayError::NoSessionForUser("target not found".into()))
    }
}
