//! Signaling: channels, the channel registry and the WebRTC engine.
//!
//! Channel ids and authentication tags come from `sigrelay_core::signaling`;
//! this module owns the shared mutable state (registry + memberships) and the
//! per-subtype transition logic.

pub mod channel;
pub mod engine;
pub mod registry;

pub use channel::{Channel, ChannelKind};
pub use engine::{EngineSettings, SignalingEngine};
pub use registry::{ChannelRecord, ChannelRegistry};
