//! # Domain Identity Newtypes
//!
//! `LicenseId` and `Address` are distinct types so a license identifier can
//! never be passed where a party identity is expected.
//!
//! Addresses are 20-byte account identifiers rendered as `0x`-prefixed
//! lowercase hex. Parsing accepts either case.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// Unique identifier of a license agreement.
///
/// Allocated by the registry from a strictly monotonic counter starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LicenseId(pub u64);

impl LicenseId {
    /// The numeric value of the identifier.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for LicenseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "license:{}", self.0)
    }
}

/// Identity of a party: licensor, licensee, arbiter, or sublicensee.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    /// Number of bytes in an address.
    pub const LEN: usize = 20;

    /// Create an address from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse a `0x`-prefixed, 40-digit hex address. Case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidAddress`] on a missing prefix, wrong
    /// length, or non-hex characters.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let hex = s.strip_prefix("0x").ok_or_else(|| CoreError::InvalidAddress {
            input: s.to_string(),
            reason: "missing 0x prefix".to_string(),
        })?;
        let mut bytes = [0u8; 20];
        decode_hex(hex, &mut bytes).map_err(|reason| CoreError::InvalidAddress {
            input: s.to_string(),
            reason,
        })?;
        Ok(Self(bytes))
    }

    /// Access the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Render as `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(2 + 2 * Self::LEN);
        out.push_str("0x");
        for b in &self.0 {
            out.push_str(&format!("{b:02x}"));
        }
        out
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl std::str::FromStr for Address {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Decode a hex string into exactly `out.len()` bytes.
pub(crate) fn decode_hex(hex: &str, out: &mut [u8]) -> Result<(), String> {
    if hex.len() != out.len() * 2 {
        return Err(format!(
            "expected {} hex digits, got {}",
            out.len() * 2,
            hex.len()
        ));
    }
    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        let hi = hex_value(chunk[0])?;
        let lo = hex_value(chunk[1])?;
        out[i] = (hi << 4) | lo;
    }
    Ok(())
}

fn hex_value(c: u8) -> Result<u8, String> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        _ => Err(format!("non-hex character {:?}", c as char)),
    }
}
