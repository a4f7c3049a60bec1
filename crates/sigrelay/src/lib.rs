//! Top-level facade crate for sigrelay.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use sigrelay_core::*;
}

pub mod gateway {
    pub use sigrelay_gateway::*;
}
