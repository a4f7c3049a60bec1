//! RTM envelope header and the generic replies shared by all message types.
//!
//! Inbound text frames are decoded twice at most: once into [`RtmHeader`] to
//! pick a service, then by the service into its own typed envelope.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SigRelayError};

/// Message type name for WebRTC signaling envelopes.
pub const TYPE_WEBRTC: &str = "webrtc";
/// Message type name for keepalive requests.
pub const TYPE_PING: &str = "ping";
/// Message type name for keepalive replies.
pub const TYPE_PONG: &str = "pong";
/// Message type name for error replies.
pub const TYPE_ERROR: &str = "error";

/// Routing header present on every inbound message.
#[derive(Debug, Deserialize)]
pub struct RtmHeader {
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Client request id (0 when absent).
    #[serde(default)]
    pub id: u64,
}

/// Decode only the routing header of a text frame.
pub fn decode_header(text: &str) -> Result<RtmHeader> {
    serde_json::from_str(text).map_err(|e| SigRelayError::bad(format!("invalid envelope json: {e}")))
}

/// Payload of an error reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorData {
    pub code: String,
    pub msg: String,
}

/// Error reply correlated to the request that caused it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReply {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub reply_to: u64,
    pub error: ErrorData,
}

impl ErrorReply {
    pub fn new(err: &SigRelayError, reply_to: u64) -> Self {
        Self {
            msg_type: TYPE_ERROR.into(),
            reply_to,
            error: ErrorData {
                code: err.client_code().as_str().into(),
                msg: err.client_message(),
            },
        }
    }
}

/// Keepalive reply.
#[derive(Debug, Clone, Serialize)]
pub struct PongReply {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub reply_to: u64,
}

impl PongReply {
    pub fn new(reply_to: u64) -> Self {
        Self {
            msg_type: TYPE_PONG,
            reply_to,
        }
    }
}
