//! sigrelay gateway library entry.
//!
//! This crate wires the transport, dispatcher, realtime core and signaling
//! engine into a WebSocket signaling relay. It is consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod obs;
pub mod ops;
pub mod realtime;
pub mod router;
pub mod services;
pub mod signaling;
pub mod transport;
