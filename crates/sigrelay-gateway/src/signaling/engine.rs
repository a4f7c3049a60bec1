//! WebRTC signaling engine.
//!
//! Validates inbound envelopes from bound connections, binds them to
//! channels and decides who receives which copy. Nothing in here awaits:
//! every registry and membership operation is in-memory, and sends are
//! enqueued without waiting for delivery.

use std::sync::Arc;

use sigrelay_core::error::{Result, SigRelayError};
use sigrelay_core::protocol::webrtc::{
    ChannelExtra, ChannelGroup, ChannelPipeline, ChannelReply, Subtype, WebRtcEnvelope,
    MIN_PAYLOAD_VERSION, REASON_REJECT_BUSY,
};
use sigrelay_core::signaling::{ChannelResolver, HashAuthenticator};

use crate::realtime::{Connection, ConnectionDirectory};
use crate::signaling::channel::Channel;
use crate::signaling::registry::{ChannelRecord, ChannelRegistry};

/// Engine tunables.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub min_payload_version: u64,
    /// Pipeline attached to newly created group channels.
    pub group_pipeline: Option<ChannelPipeline>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            min_payload_version: MIN_PAYLOAD_VERSION,
            group_pipeline: None,
        }
    }
}

/// Where a Signal/Hangup is headed once resolved against the channel.
enum Route {
    /// `target == group`: the channel decides fan-out.
    Group,
    /// Target has a connection inside the channel.
    Member(Connection),
    /// Target named but not in the channel.
    Absent,
    /// No target at all; treated like an unreachable one.
    Missing,
}

pub struct SignalingEngine {
    channels: Arc<ChannelRegistry>,
    directory: Arc<dyn ConnectionDirectory>,
    auth: Arc<HashAuthenticator>,
    resolver: ChannelResolver,
    settings: EngineSettings,
}

impl SignalingEngine {
    pub fn new(
        channels: Arc<ChannelRegistry>,
        directory: Arc<dyn ConnectionDirectory>,
        auth: Arc<HashAuthenticator>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            channels,
            directory,
            auth,
            resolver: ChannelResolver::new(),
            settings,
        }
    }

    pub fn channels(&self) -> &Arc<ChannelRegistry> {
        &self.channels
    }

    /// Process one envelope received on `conn`.
    ///
    /// `NoSessionForUser` is swallowed here so clients cannot probe whether a
    /// target exists or is online. Every other error is returned for a
    /// correlated error reply.
    pub fn handle(&self, conn: &Connection, msg: WebRtcEnvelope) -> Result<()> {
        let subtype = msg.subtype;
        match self.process(conn, msg) {
            Err(SigRelayError::NoSessionForUser(reason)) => {
                tracing::debug!(subtype = subtype.as_str(), %reason, "no session for target, suppressed");
                Ok(())
            }
            other => other,
        }
    }

    fn process(&self, conn: &Connection, msg: WebRtcEnvelope) -> Result<()> {
        if msg.version < self.settings.min_payload_version {
            return Err(SigRelayError::bad("outdated WebRTC payload version"));
        }
        let user = conn
            .bound_user()
            .ok_or_else(|| SigRelayError::bad("connection has no user"))?;
        if !msg.source.is_empty() {
            return Err(SigRelayError::bad("source must be empty"));
        }
        if msg.state.is_empty() {
            return Err(SigRelayError::bad("state is empty"));
        }

        match msg.subtype {
            Subtype::Group => self.on_group(conn, user, msg),
            Subtype::Call if msg.initiator => self.on_call_offer(conn, user, msg),
            Subtype::Call => self.on_call_response(conn, user, msg),
            Subtype::Hangup | Subtype::Signal => self.on_signal(user, msg),
            Subtype::Channel | Subtype::Unknown => Err(SigRelayError::bad("unknown subtype")),
        }
    }

    fn on_group(&self, conn: &Connection, user: &str, msg: WebRtcEnvelope) -> Result<()> {
        if msg.target.is_empty() {
            return Err(SigRelayError::bad("target is empty"));
        }
        if msg.target != msg.group {
            return Err(SigRelayError::bad("target and group mismatch"));
        }

        let channel_id = self.resolver.name_for_group(&msg.group)?;
        let channel = self.channels.join_or_create(&channel_id, user, conn, || {
            Ok(Channel::group(
                channel_id.clone(),
                msg.group.clone(),
                self.settings.group_pipeline.clone(),
                Arc::clone(&self.auth),
            ))
        })?;

        let hash = self
            .auth
            .compute_encoded(&msg.msg_type, user, &msg.group, channel.id());

        let extra = ChannelExtra {
            group: Some(ChannelGroup {
                group: msg.group.clone(),
                members: channel.members(),
            }),
            pipeline: channel.pipeline().cloned(),
        };
        tracing::debug!(channel = %channel.id(), %user, group = %msg.group, "group joined");
        conn.send(&ChannelReply::new(msg.id, channel.id(), &hash, Some(extra.to_raw()?)));
        Ok(())
    }

    fn on_call_offer(&self, conn: &Connection, user: &str, mut msg: WebRtcEnvelope) -> Result<()> {
        if msg.target.is_empty() {
            return Err(SigRelayError::bad("target is empty"));
        }
        if msg.target == user {
            return Err(SigRelayError::bad("target same as source"));
        }
        if !msg.channel.is_empty() || !msg.hash.is_empty() {
            return Err(SigRelayError::bad("channel and hash must be empty"));
        }
        if msg.data.is_some() {
            return Err(SigRelayError::bad("data must be empty"));
        }

        let channel = Arc::new(Channel::call(self.resolver.name_for_call()?, Arc::clone(&self.auth)));
        channel.add(user, conn)?;
        if !self
            .channels
            .set_if_absent(channel.id(), ChannelRecord::new(Arc::clone(&channel)))
        {
            return Err(SigRelayError::Internal("call channel id collision".into()));
        }

        let data = match channel.pipeline() {
            Some(p) => Some(
                ChannelExtra {
                    group: None,
                    pipeline: Some(p.clone()),
                }
                .to_raw()?,
            ),
            None => None,
        };

        msg.source = user.to_string();
        msg.channel = channel.id().to_string();
        msg.hash = self
            .auth
            .compute_encoded(&msg.msg_type, user, &msg.target, channel.id());
        msg.data = data;

        conn.send(&ChannelReply::new(msg.id, &msg.channel, &msg.hash, msg.data.clone()));

        msg.id = 0;
        let targets = self
            .directory
            .lookup_connections_by_user_id(&msg.target)
            .ok_or_else(|| SigRelayError::NoSessionForUser("target not found".into()))?;
        tracing::debug!(channel = %msg.channel, %user, target = %msg.target, sessions = targets.len(), "call offered");
        for c in &targets {
            c.send(&msg);
        }
        Ok(())
    }

    fn on_call_response(&self, conn: &Connection, user: &str, mut msg: WebRtcEnvelope) -> Result<()> {
        if msg.channel.is_empty() || msg.hash.is_empty() || msg.data.is_none() {
            return Err(SigRelayError::bad("channel, hash or data is empty"));
        }
        let channel = self
            .channels
            .get(&msg.channel)
            .ok_or_else(|| SigRelayError::bad("channel not found"))?;
        channel.check_message(user, &msg)?;

        let decision = msg.accept_data()?;

        if !msg.group.is_empty() {
            if !decision.accept {
                return Err(SigRelayError::bad("accept required for group call"));
            }
            // Incoming tag covers the group; the target needs one for the pair.
            msg.hash = self
                .auth
                .compute_encoded(&msg.msg_type, user, &msg.target, channel.id());
        } else {
            if decision.accept {
                self.channels.join(channel.id(), user, conn)?;
            }

            if let Some(own) = self.directory.lookup_connections_by_user_id(user) {
                if !decision.accept && decision.reason == REASON_REJECT_BUSY && own.len() > 1 {
                    tracing::debug!(channel = %channel.id(), %user, "busy reject suppressed, other sessions remain");
                    return Ok(());
                }

                // Stop the user's other sessions from ringing.
                let mut cleared = WebRtcEnvelope::new(Subtype::Call);
                cleared.initiator = true;
                cleared.channel = msg.channel.clone();
                cleared.source = msg.target.clone();
                for c in own.iter().filter(|c| !c.same_session(conn)) {
                    c.send(&cleared);
                }
            }
        }

        msg.source = user.to_string();
        msg.id = 0;

        let target = channel
            .get(&msg.target)
            .ok_or_else(|| SigRelayError::NoSessionForUser("target not found".into()))?;
        tracing::debug!(channel = %channel.id(), %user, target = %msg.target, accept = decision.accept, "call answered");
        target.send(&msg);
        Ok(())
    }

    /// Signal and Hangup. Hangup additionally leaves the channel first.
    fn on_signal(&self, user: &str, mut msg: WebRtcEnvelope) -> Result<()> {
        if msg.channel.is_empty() || msg.hash.is_empty() || msg.data.is_none() {
            return Err(SigRelayError::bad("channel, hash or data is empty"));
        }
        let channel = self
            .channels
            .get(&msg.channel)
            .ok_or_else(|| SigRelayError::bad("channel not found"))?;
        channel.check_message(user, &msg)?;

        let route = if !msg.group.is_empty() && msg.target == msg.group {
            Route::Group
        } else if !msg.target.is_empty() {
            match channel.get(&msg.target) {
                Some(c) => Route::Member(c),
                None => Route::Absent,
            }
        } else {
            Route::Missing
        };

        if msg.subtype == Subtype::Hangup {
            channel.remove(user);
            tracing::debug!(channel = %channel.id(), %user, "hangup, left channel");

            if let Route::Absent = route {
                // Never answered or already torn down: reach every session of the target.
                msg.source = user.to_string();
                msg.id = 0;
                let targets = self
                    .directory
                    .lookup_connections_by_user_id(&msg.target)
                    .ok_or_else(|| SigRelayError::NoSessionForUser("target not found".into()))?;
                for c in &targets {
                    c.send(&msg);
                }
                return Ok(());
            }
        }

        match route {
            Route::Group => {
                let to = msg.target.clone();
                channel.forward(user, &to, None, msg)
            }
            Route::Member(c) => {
                let to = msg.target.clone();
                channel.forward(user, &to, Some(&c), msg)
            }
            Route::Absent => Err(SigRelayError::NoSessionForUser("target not found".into())),
            Route::Missing => Err(SigRelayError::NoSessionForUser("target is empty".into())),
        }
    }
}
