//! Protocol modules (RTM header + WebRTC signaling envelopes).
//!
//! All decoding is panic-free: malformed input is reported as
//! `SigRelayError` instead of panicking, so hostile traffic cannot take the
//! gateway down.

pub mod rtm;
pub mod webrtc;
