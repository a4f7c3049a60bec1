//! Decode-once codec for the transport layer.
//!
//! - Text frames => RTM header (type + id) plus the untouched text
//! - Binary frames => rejected, the signaling protocol is JSON only
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message;
use sigrelay_core::{
    error::{Result, SigRelayError},
    protocol::rtm::{decode_header, RtmHeader},
};

#[derive(Debug)]
pub enum Inbound {
    Text { header: RtmHeader, text: String },
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

pub fn decode(msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(s) => {
            let header = decode_header(&s)?;
            Ok(Inbound::Text { header, text: s })
        }
        Message::Binary(_) => Err(SigRelayError::bad("binary frames are not supported")),
        Message::Ping(v) => Ok(Inbound::Ping(v)),
        Message::Pong(v) => Ok(Inbound::Pong(v)),
        Message::Close(_) => Ok(Inbound::Close),
    }
}

/// Cheap frame length, checked before any decoding.
pub fn frame_len(msg: &Message) -> usize {
    match msg {
        Message::Text(s) => s.len(),
        Message::Binary(b) => b.len(),
        Message::Ping(v) => v.len(),
        Message::Pong(v) => v.len(),
        Message::Close(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn text_keeps_raw_frame() {
        let raw = r#"{"type":"webrtc","id":3,"subtype":"webrtc_signal"}"#;
        match decode(Message::Text(raw.into())).unwrap() {
            Inbound::Text { header, text } => {
                assert_eq!(header.msg_type, "webrtc");
                assert_eq!(header.id, 3);
                assert_eq!(text, raw);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn binary_is_bad_message() {
        let err = decode(Message::Binary(vec![1, 2, 3])).unwrap_err();
        assert_eq!(err.client_code().as_str(), "bad_message");
    }
}
