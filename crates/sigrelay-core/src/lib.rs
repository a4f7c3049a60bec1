//! sigrelay core: transport-agnostic signaling primitives and error types.
//!
//! This crate defines the wire envelopes, the channel authentication tag and
//! the channel naming scheme shared by the gateway and by tests. It carries
//! no transport or async runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `SigRelayError`/`Result` so malformed
//! client input never crashes the process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;
pub mod signaling;

/// Shared result type.
pub use error::{Result, SigRelayError};
