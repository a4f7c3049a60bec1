//! Channel authentication tag and channel naming properties.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashSet;

use proptest::prelude::*;

use sigrelay_core::signaling::naming::{is_group_channel, CALL_CHANNEL_PREFIX};
use sigrelay_core::signaling::{ChannelResolver, HashAuthenticator};

fn auth() -> HashAuthenticator {
    HashAuthenticator::from_key(&[42u8; 32]).unwrap()
}

proptest! {
    #[test]
    fn tag_is_order_independent(kind in "[a-z_]{1,16}", a in ".{0,24}", b in ".{0,24}", c in ".{0,24}") {
        let h = auth();
        prop_assert_eq!(h.compute(&kind, &a, &b, &c), h.compute(&kind, &b, &a, &c));
        prop_assert_eq!(h.compute_encoded(&kind, &a, &b, &c), h.compute_encoded(&kind, &b, &a, &c));
    }

    #[test]
    fn tag_detects_tampering(a in "[a-z]{1,12}", b in "[a-z]{1,12}", c in "[a-z]{1,12}") {
        let h = auth();
        let tag = h.compute("webrtc", &a, &b, &c);
        prop_assert!(h.verify(&tag, "webrtc", &a, &b, &c));
        prop_assert!(h.verify(&tag, "webrtc", &b, &a, &c));

        let ax = format!("{}x", a);
        let bx = format!("{}x", b);
        let cx = format!("{}x", c);
        prop_assert!(!h.verify(&tag, "webrtc_x", &a, &b, &c));
        prop_assert!(!h.verify(&tag, "webrtc", &ax, &b, &c));
        prop_assert!(!h.verify(&tag, "webrtc", &a, &bx, &c));
        prop_assert!(!h.verify(&tag, "webrtc", &a, &b, &cx));
    }

    #[test]
    fn group_channel_is_pure(group in ".{1,32}") {
        let first = ChannelResolver::new().name_for_group(&group).unwrap();
        let second = ChannelResolver::new().name_for_group(&group).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert!(is_group_channel(&first));
    }
}

#[test]
fn encoded_roundtrip_verifies() {
    let h = auth();
    let tag = h.compute_encoded("webrtc", "alice", "bob", "c-1");
    assert!(h.verify_encoded(&tag, "webrtc", "bob", "alice", "c-1").unwrap());
    assert!(!h.verify_encoded(&tag, "webrtc", "bob", "carol", "c-1").unwrap());
}

#[test]
fn generated_secrets_differ() {
    let a = HashAuthenticator::generate().unwrap();
    let b = HashAuthenticator::generate().unwrap();
    let tag = a.compute("webrtc", "alice", "bob", "c-1");
    assert!(!b.verify(&tag, "webrtc", "alice", "bob", "c-1"));
}

#[test]
fn call_channels_are_unique_and_distinct_from_groups() {
    let r = ChannelResolver::new();
    let mut seen = HashSet::new();
    for _ in 0..1000 {
        let id = r.name_for_call().unwrap();
        assert!(id.starts_with(CALL_CHANNEL_PREFIX));
        assert!(!is_group_channel(&id));
        assert!(seen.insert(id));
    }
    let g = r.name_for_group("c-").unwrap();
    assert!(!seen.contains(&g));
}

#[test]
fn empty_group_is_rejected() {
    let err = ChannelResolver::new().name_for_group("").unwrap_err();
    assert_eq!(err.client_code().as_str(), "bad_message");
}
