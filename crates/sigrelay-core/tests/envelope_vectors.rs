//! WebRTC envelope vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use sigrelay_core::protocol::rtm::{decode_header, ErrorReply};
use sigrelay_core::protocol::webrtc::{
    decode_envelope, ChannelExtra, ChannelGroup, ChannelReply, Subtype, WebRtcEnvelope,
};
use sigrelay_core::SigRelayError;

use vector_loader::load;

#[test]
fn webrtc_vectors() {
    let files = [
        "webrtc_call_offer.json",
        "webrtc_call_accept.json",
        "webrtc_unknown_subtype.json",
        "webrtc_missing_subtype.json",
        "webrtc_not_json.json",
    ];

    for f in files {
        let v = load(f);
        let res = decode_envelope(&v.frame);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.client_code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let env = res.expect("expected ok envelope");
        let ex = v.expect.expect("missing expect block");

        assert_eq!(env.subtype.as_str(), ex["subtype"].as_str().unwrap(), "vector={}", v.description);
        assert_eq!(env.id, ex["id"].as_u64().unwrap(), "vector={}", v.description);
        assert_eq!(env.target, ex["target"].as_str().unwrap(), "vector={}", v.description);
        assert_eq!(env.initiator, ex["initiator"].as_bool().unwrap(), "vector={}", v.description);
        assert_eq!(env.data.is_some(), ex["has_data"].as_bool().unwrap(), "vector={}", v.description);
        assert!(env.source.is_empty(), "vector={}", v.description);
    }
}

#[test]
fn accept_data_decodes_reason() {
    let v = load("webrtc_call_accept.json");
    let env = decode_envelope(&v.frame).unwrap();
    let accept = env.accept_data().unwrap();
    assert!(!accept.accept);
    assert_eq!(accept.reason, "reject_busy");
}

#[test]
fn relayed_copy_omits_empty_fields() {
    let mut env = WebRtcEnvelope::new(Subtype::Call);
    env.initiator = true;
    env.channel = "c-1".into();
    env.source = "alice".into();

    let json: serde_json::Value = serde_json::to_value(&env).unwrap();
    assert_eq!(json["type"], "webrtc");
    assert_eq!(json["subtype"], "webrtc_call");
    assert_eq!(json["source"], "alice");
    assert!(json.get("id").is_none());
    assert!(json.get("hash").is_none());
    assert!(json.get("data").is_none());
}

#[test]
fn channel_reply_shape() {
    let extra = ChannelExtra {
        group: Some(ChannelGroup { group: "g1".into(), members: vec!["alice".into()] }),
        pipeline: None,
    };
    let reply = ChannelReply::new(5, "g-x", "tag", Some(extra.to_raw().unwrap()));
    let json: serde_json::Value = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["subtype"], "webrtc_channel");
    assert_eq!(json["reply_to"], 5);
    assert_eq!(json["data"]["group"]["members"][0], "alice");
    assert!(json["data"].get("pipeline").is_none());
}

#[test]
fn error_reply_hides_internal_detail() {
    let reply = ErrorReply::new(&SigRelayError::Internal("registry poisoned".into()), 3);
    assert_eq!(reply.reply_to, 3);
    assert_eq!(reply.error.code, "internal_error");
    assert!(!reply.error.msg.contains("registry"));
}

#[test]
fn header_defaults_id() {
    let h = decode_header(r#"{"type":"ping"}"#).unwrap();
    assert_eq!(h.msg_type, "ping");
    assert_eq!(h.id, 0);
    assert!(decode_header("[]").is_err());
}
