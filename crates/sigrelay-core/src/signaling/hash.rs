//! Channel authentication tags.
//!
//! A tag binds `(type, participant pair, channel)` together under a secret
//! that only lives in this process. The pair is sorted first, so both
//! parties of a call derive the same tag independently. Tags from a previous
//! process are useless after a restart.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::error::{Result, SigRelayError};

type HmacSha256 = Hmac<Sha256>;

/// Secret size in bytes.
pub const KEY_LEN: usize = 32;

/// Raw tag bytes.
pub type Tag = [u8; 32];

/// Computes and verifies channel authentication tags.
#[derive(Clone)]
pub struct HashAuthenticator {
    mac: HmacSha256,
}

impl HashAuthenticator {
    /// New authenticator with a fresh random secret.
    pub fn generate() -> Result<Self> {
        let mut key = [0u8; KEY_LEN];
        OsRng
            .try_fill_bytes(&mut key)
            .map_err(|e| SigRelayError::Internal(format!("rng failed: {e}")))?;
        Self::from_key(&key)
    }

    /// Authenticator with a fixed secret.
    pub fn from_key(key: &[u8; KEY_LEN]) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(key)
            .map_err(|e| SigRelayError::Internal(format!("hmac key rejected: {e}")))?;
        Ok(Self { mac })
    }

    fn keyed(&self, kind: &str, a: &str, b: &str, channel: &str) -> HmacSha256 {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let mut mac = self.mac.clone();
        // Length-prefixed so ("ab", "c") and ("a", "bc") differ.
        for field in [kind, lo, hi, channel] {
            mac.update(&(field.len() as u32).to_be_bytes());
            mac.update(field.as_bytes());
        }
        mac
    }

    pub fn compute(&self, kind: &str, a: &str, b: &str, channel: &str) -> Tag {
        self.keyed(kind, a, b, channel).finalize().into_bytes().into()
    }

    /// Tag as transmitted on the wire.
    pub fn compute_encoded(&self, kind: &str, a: &str, b: &str, channel: &str) -> String {
        STANDARD.encode(self.compute(kind, a, b, channel))
    }

    /// Constant-time check of a raw tag.
    pub fn verify(&self, tag: &[u8], kind: &str, a: &str, b: &str, channel: &str) -> bool {
        self.keyed(kind, a, b, channel).verify_slice(tag).is_ok()
    }

    /// Check a base64 tag as received from a client.
    pub fn verify_encoded(&self, tag: &str, kind: &str, a: &str, b: &str, channel: &str) -> Result<bool> {
        let raw = STANDARD
            .decode(tag)
            .map_err(|_| SigRelayError::bad("invalid hash encoding"))?;
        Ok(self.verify(&raw, kind, a, b, channel))
    }
}

impl std::fmt::Debug for HashAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HashAuthenticator(..)")
    }
}
