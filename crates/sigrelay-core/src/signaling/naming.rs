//! Channel id derivation.
//!
//! Group channel ids are a pure function of the group id so that clients
//! joining the same group converge without coordination. Call channel ids
//! are random and cannot be guessed by third parties.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{Result, SigRelayError};

/// Prefix of group channel ids.
pub const GROUP_CHANNEL_PREFIX: &str = "g-";
/// Prefix of call channel ids.
pub const CALL_CHANNEL_PREFIX: &str = "c-";

const GROUP_NAMESPACE: &[u8] = b"sigrelay.group\0";
const CALL_ID_BYTES: usize = 32;

/// Stateless channel id resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelResolver;

impl ChannelResolver {
    pub fn new() -> Self {
        Self
    }

    /// Deterministic channel id for a named group.
    pub fn name_for_group(&self, group: &str) -> Result<String> {
        if group.is_empty() {
            return Err(SigRelayError::bad("group is empty"));
        }
        let mut h = Sha256::new();
        h.update(GROUP_NAMESPACE);
        h.update(group.as_bytes());
        Ok(format!("{GROUP_CHANNEL_PREFIX}{}", URL_SAFE_NO_PAD.encode(h.finalize())))
    }

    /// Fresh random channel id for an ad hoc call.
    pub fn name_for_call(&self) -> Result<String> {
        let mut raw = [0u8; CALL_ID_BYTES];
        OsRng
            .try_fill_bytes(&mut raw)
            .map_err(|e| SigRelayError::Internal(format!("rng failed: {e}")))?;
        Ok(format!("{CALL_CHANNEL_PREFIX}{}", URL_SAFE_NO_PAD.encode(raw)))
    }
}

/// True if the id was produced by [`ChannelResolver::name_for_group`].
pub fn is_group_channel(id: &str) -> bool {
    id.starts_with(GROUP_CHANNEL_PREFIX)
}
