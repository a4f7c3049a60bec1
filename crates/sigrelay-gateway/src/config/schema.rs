use std::collections::HashMap;

use serde::Deserialize;
use sigrelay_core::error::{Result, SigRelayError};
use sigrelay_core::protocol::webrtc::{ChannelPipeline, MIN_PAYLOAD_VERSION};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub signaling: SignalingSection,

    #[serde(default)]
    pub auth: AuthSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(SigRelayError::UnsupportedVersion);
        }
        self.gateway.validate()?;
        self.signaling.validate()?;
        self.auth.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    /// Per-connection outbound queue capacity.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            max_frame_bytes: default_max_frame_bytes(),
            outbound_queue: default_outbound_queue(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(SigRelayError::bad(
                "gateway.ping_interval_ms must be between 5000 and 120000",
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(SigRelayError::bad(
                "gateway.idle_timeout_ms must be between 10000 and 600000",
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(SigRelayError::bad(
                "gateway.idle_timeout_ms must be greater than ping_interval_ms",
            ));
        }
        if !(256..=1_048_576).contains(&self.max_frame_bytes) {
            return Err(SigRelayError::bad(
                "gateway.max_frame_bytes must be between 256 and 1048576",
            ));
        }
        if self.outbound_queue == 0 {
            return Err(SigRelayError::bad("gateway.outbound_queue must be at least 1"));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_max_frame_bytes() -> usize {
    65536
}
fn default_outbound_queue() -> usize {
    256
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignalingSection {
    #[serde(default = "default_min_payload_version")]
    pub min_payload_version: u64,

    /// Empty channels older than this are forgotten by the sweeper.
    #[serde(default = "default_channel_idle_timeout_ms")]
    pub channel_idle_timeout_ms: u64,

    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    /// Pipeline announced for group channels.
    #[serde(default)]
    pub group_pipeline: Option<PipelineConfig>,
}

impl Default for SignalingSection {
    fn default() -> Self {
        Self {
            min_payload_version: default_min_payload_version(),
            channel_idle_timeout_ms: default_channel_idle_timeout_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
            group_pipeline: None,
        }
    }
}

impl SignalingSection {
    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval_ms < 1000 {
            return Err(SigRelayError::bad("signaling.sweep_interval_ms must be at least 1000"));
        }
        if self.channel_idle_timeout_ms < 1000 {
            return Err(SigRelayError::bad(
                "signaling.channel_idle_timeout_ms must be at least 1000",
            ));
        }
        if let Some(p) = &self.group_pipeline {
            if p.id.is_empty() || p.mode.is_empty() {
                return Err(SigRelayError::bad(
                    "signaling.group_pipeline requires id and mode",
                ));
            }
        }
        Ok(())
    }

    pub fn group_pipeline(&self) -> Option<ChannelPipeline> {
        self.group_pipeline.as_ref().map(|p| ChannelPipeline {
            pipeline: p.id.clone(),
            mode: p.mode.clone(),
        })
    }
}

fn default_min_payload_version() -> u64 {
    MIN_PAYLOAD_VERSION
}
fn default_channel_idle_timeout_ms() -> u64 {
    300000
}
fn default_sweep_interval_ms() -> u64 {
    60000
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub id: String,
    pub mode: String,
}

/// Static ticket table (`ticket -> user_id`).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    #[serde(default)]
    pub tickets: HashMap<String, String>,
}

impl AuthSection {
    pub fn validate(&self) -> Result<()> {
        if self.tickets.is_empty() {
            return Err(SigRelayError::bad("auth.tickets must not be empty"));
        }
        if self.tickets.iter().any(|(t, u)| t.is_empty() || u.is_empty()) {
            return Err(SigRelayError::bad("auth.tickets entries must not be empty"));
        }
        Ok(())
    }
}
