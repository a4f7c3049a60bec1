//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use sigrelay_core::error::{Result, SigRelayError};

pub use schema::{AuthSection, GatewayConfig, GatewaySection, PipelineConfig, SignalingSection};

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| SigRelayError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| SigRelayError::bad(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
