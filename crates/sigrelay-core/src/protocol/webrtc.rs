//! WebRTC signaling envelope (JSON).
//!
//! `data` is kept as `RawValue`: negotiation payloads are relayed without
//! being parsed, and only the accept decision of a Call response is decoded.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::{Result, SigRelayError};
use crate::protocol::rtm::TYPE_WEBRTC;

/// Oldest payload version accepted from clients.
pub const MIN_PAYLOAD_VERSION: u64 = 0;

/// Payload version stamped on everything the server generates.
pub const CURRENT_PAYLOAD_VERSION: u64 = 20180703;

/// Reject reason that is suppressed while the rejecting user has other sessions.
pub const REASON_REJECT_BUSY: &str = "reject_busy";

/// Signaling subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Subtype {
    #[serde(rename = "webrtc_group")]
    Group,
    #[serde(rename = "webrtc_call")]
    Call,
    #[serde(rename = "webrtc_hangup")]
    Hangup,
    #[serde(rename = "webrtc_signal")]
    Signal,
    /// Server reply carrying channel id and hash.
    #[serde(rename = "webrtc_channel")]
    Channel,
    #[serde(other)]
    Unknown,
}

impl Subtype {
    pub fn as_str(self) -> &'static str {
        match self {
            Subtype::Group => "webrtc_group",
            Subtype::Call => "webrtc_call",
            Subtype::Hangup => "webrtc_hangup",
            Subtype::Signal => "webrtc_signal",
            Subtype::Channel => "webrtc_channel",
            Subtype::Unknown => "unknown",
        }
    }
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// One signaling message, inbound or relayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebRtcEnvelope {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub subtype: Subtype,
    /// Request id; cleared on relayed copies.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: u64,
    #[serde(rename = "v", default)]
    pub version: u64,
    /// Server-assigned sender id. Must be empty inbound.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    /// Opaque client nonce, echoed as-is.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub channel: String,
    /// Base64 channel authentication tag.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Box<RawValue>>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub initiator: bool,
}

impl WebRtcEnvelope {
    /// Empty server-generated envelope of the given subtype.
    pub fn new(subtype: Subtype) -> Self {
        Self {
            msg_type: TYPE_WEBRTC.into(),
            subtype,
            id: 0,
            version: CURRENT_PAYLOAD_VERSION,
            source: String::new(),
            target: String::new(),
            group: String::new(),
            state: String::new(),
            channel: String::new(),
            hash: String::new(),
            data: None,
            initiator: false,
        }
    }

    /// Decode the `data` field of a Call response.
    pub fn accept_data(&self) -> Result<AcceptData> {
        let raw = self
            .data
            .as_ref()
            .ok_or_else(|| SigRelayError::bad("data is empty"))?;
        serde_json::from_str(raw.get())
            .map_err(|e| SigRelayError::bad(format!("invalid accept data: {e}")))
    }
}

/// Decode a WebRTC envelope from a text frame.
pub fn decode_envelope(text: &str) -> Result<WebRtcEnvelope> {
    serde_json::from_str(text).map_err(|e| SigRelayError::bad(format!("invalid webrtc envelope: {e}")))
}

/// Accept/reject decision carried in a Call response.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AcceptData {
    #[serde(default)]
    pub accept: bool,
    #[serde(default)]
    pub reason: String,
}

/// Member list of a group channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelGroup {
    pub group: String,
    pub members: Vec<String>,
}

/// Pipeline attached to a channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelPipeline {
    pub pipeline: String,
    pub mode: String,
}

/// Auxiliary data in a channel reply.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<ChannelGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<ChannelPipeline>,
}

impl ChannelExtra {
    /// Encode as raw JSON for embedding in an envelope.
    pub fn to_raw(&self) -> Result<Box<RawValue>> {
        serde_json::value::to_raw_value(self)
            .map_err(|e| SigRelayError::Internal(format!("failed to encode channel extra: {e}")))
    }
}

/// Reply to the originating connection with channel id and hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelReply {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub subtype: Subtype,
    pub reply_to: u64,
    pub channel: String,
    pub hash: String,
    #[serde(rename = "v")]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Box<RawValue>>,
}

impl ChannelReply {
    pub fn new(reply_to: u64, channel: &str, hash: &str, data: Option<Box<RawValue>>) -> Self {
        Self {
            msg_type: TYPE_WEBRTC.into(),
            subtype: Subtype::Channel,
            reply_to,
            channel: channel.into(),
            hash: hash.into(),
            version: CURRENT_PAYLOAD_VERSION,
            data,
        }
    }
}
