//! # Work Fingerprints
//!
//! A `WorkHash` is the fixed-size fingerprint of the licensed content. The
//! engine never inspects the content itself; it only stores the fingerprint
//! so both parties agree on what was licensed.
//!
//! Fingerprints produced elsewhere (for example a keccak-256 digest computed
//! by a client) are accepted as hex through [`WorkHash::from_hex`]. Content
//! held locally can be fingerprinted with SHA-256 via [`WorkHash::of_content`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::CoreError;
use crate::identity::decode_hex;

/// A 32-byte content fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkHash([u8; 32]);

impl WorkHash {
    /// Wrap raw fingerprint bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse 64 hex digits, with or without a `0x` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidWorkHash`] on wrong length or non-hex input.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let hex = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        decode_hex(hex, &mut bytes).map_err(|reason| CoreError::InvalidWorkHash {
            input: s.to_string(),
            reason,
        })?;
        Ok(Self(bytes))
    }

    /// SHA-256 fingerprint of locally held content.
    pub fn of_content(content: &[u8]) -> Self {
        let hash = Sha256::digest(content);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        Self(bytes)
    }

    /// Access the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The all-zero fingerprint stands for "no work" and is rejected at
    /// license creation.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Render as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        let hex: String = self.0.iter().map(|b| format!("{b:02x}")).collect();
        format!("0x{hex}")
    }
}

impl std::fmt::Display for WorkHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for WorkHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for WorkHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // keccak-256("test"), as computed by the contract client.
    const KECCAK_TEST: &str = "0x9C22FF5F21F0B81B113E63F7DB6DA94FEDEF11B2119B4088B89664FB9A3CB658";

    #[test]
    fn from_hex_accepts_prefixed_uppercase() {
        let hash = WorkHash::from_hex(KECCAK_TEST).unwrap();
        assert_eq!(hash.to_hex(), KECCAK_TEST.to_lowercase());
        assert!(!hash.is_zero());
    }

    #[test]
    fn from_hex_accepts_bare_digits() {
        let bare = &KECCAK_TEST[2..];
        assert_eq!(
            WorkHash::from_hex(bare).unwrap(),
            WorkHash::from_hex(KECCAK_TEST).unwrap()
        );
    }

    #[test]
    fn from_hex_rejects_short_input() {
        assert!(WorkHash::from_hex("0x9c22").is_err());
    }

    #[test]
    fn of_content_matches_known_sha256() {
        // SHA256("test")
        assert_eq!(
            WorkHash::of_content(b"test").to_hex(),
            "0x9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn zero_hash_detected() {
        assert!(WorkHash::from_bytes([0; 32]).is_zero());
    }
}
