//! Signaling primitives: channel authentication tags and channel naming.

pub mod hash;
pub mod naming;

pub use hash::HashAuthenticator;
pub use naming::ChannelResolver;
