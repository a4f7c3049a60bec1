#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use sigrelay_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
gateway:
  listen: "0.0.0.0:8080"
signaling:
  group_pipeline: { id: "mcu", mode: "forward", modez: 1 } # typo should fail
auth:
  tickets: { t1: alice }
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "bad_message");
}

#[test]
fn ok_minimal_config() {
    let ok = r#"
version: 1
auth:
  tickets:
    dev-alice: alice
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.auth.tickets["dev-alice"], "alice");
    assert_eq!(cfg.gateway.max_frame_bytes, 65536);
    assert_eq!(cfg.signaling.min_payload_version, 0);
    assert!(cfg.signaling.group_pipeline().is_none());
}

#[test]
fn unsupported_version() {
    let err = config::load_from_str("version: 2\nauth: { tickets: { t: u } }\n").unwrap_err();
    assert_eq!(err.client_code().as_str(), "unsupported_version");
}

#[test]
fn range_checks() {
    let cases = [
        "version: 1\nauth: { tickets: {} }\n",
        "version: 1\nauth: { tickets: { t: \"\" } }\n",
        "version: 1\ngateway: { max_frame_bytes: 16 }\nauth: { tickets: { t: u } }\n",
        "version: 1\ngateway: { outbound_queue: 0 }\nauth: { tickets: { t: u } }\n",
        "version: 1\ngateway: { ping_interval_ms: 30000, idle_timeout_ms: 20000 }\nauth: { tickets: { t: u } }\n",
        "version: 1\nsignaling: { sweep_interval_ms: 10 }\nauth: { tickets: { t: u } }\n",
        "version: 1\nsignaling: { group_pipeline: { id: \"\", mode: m } }\nauth: { tickets: { t: u } }\n",
    ];
    for c in cases {
        let err = config::load_from_str(c).expect_err(c);
        assert_eq!(err.client_code().as_str(), "bad_message", "case={c}");
    }
}

#[test]
fn group_pipeline_maps_to_wire_type() {
    let cfg = config::load_from_str(
        "version: 1\nsignaling: { group_pipeline: { id: mcu, mode: forward } }\nauth: { tickets: { t: u } }\n",
    )
    .unwrap();
    let p = cfg.signaling.group_pipeline().unwrap();
    assert_eq!(p.pipeline, "mcu");
    assert_eq!(p.mode, "forward");
}

#[test]
fn sample_config_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../sigrelay.yaml");
    let cfg = config::load_from_file(path).expect("sample config must load");
    assert!(!cfg.auth.tickets.is_empty());
}
