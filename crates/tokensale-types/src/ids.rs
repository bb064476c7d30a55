//! Identifiers used throughout the token sale.
//!
//! A [`Principal`] is the raw 20-byte address of a caller. A [`SaleId`]
//! names one sale instance and uses UUIDv7 for time-ordered sorting.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::SaleError;

// ---------------------------------------------------------------------------
// Principal
// ---------------------------------------------------------------------------

/// Opaque address-like identity used as a map key throughout the ledger.
///
/// Equality is exact byte equality; no checksum or case normalization is
/// applied beyond parsing hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Principal(pub [u8; 20]);

impl Principal {
    /// The all-zero address.
    pub const ZERO: Self = Self([0u8; 20]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Principal {
    type Err = SaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| SaleError::Serialization(format!("principal {s}: {e}")))?;
        let bytes: [u8; 20] = bytes.try_into().map_err(|v: Vec<u8>| {
            SaleError::Serialization(format!("principal {s}: expected 20 bytes, got {}", v.len()))
        })?;
        Ok(Self(bytes))
    }
}

impl From<Principal> for String {
    fn from(p: Principal) -> Self {
        p.to_string()
    }
}

impl TryFrom<String> for Principal {
    type Error = SaleError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Random principals for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Principal {
    pub fn random() -> Self {
        Self(rand::random::<[u8; 20]>())
    }

    /// A principal whose every byte is `n`. Handy for readable fixtures.
    pub fn repeat(n: u8) -> Self {
        Self([n; 20])
    }
}

// ---------------------------------------------------------------------------
// SaleId
// ---------------------------------------------------------------------------

/// Unique identifier of a sale instance. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SaleId(pub Uuid);

impl SaleId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for SaleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sale:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_display_is_prefixed_hex() {
        let p = Principal::repeat(0xab);
        let s = p.to_string();
        assert!(s.starts_with("0x"));
        assert_eq!(s.len(), 42);
        assert_eq!(&s[2..6], "abab");
    }

    #[test]
    fn principal_parse_with_and_without_prefix() {
        let p = Principal::random();
        let with: Principal = p.to_string().parse().unwrap();
        let without: Principal = p.to_string()[2..].parse().unwrap();
        assert_eq!(p, with);
        assert_eq!(p, without);
    }

    #[test]
    fn principal_parse_rejects_wrong_length() {
        let err = "0xdeadbeef".parse::<Principal>().unwrap_err();
        assert!(matches!(err, SaleError::Serialization(_)));
    }

    #[test]
    fn principal_parse_rejects_non_hex() {
        assert!("0xzz".parse::<Principal>().is_err());
    }

    #[test]
    fn principal_equality_is_exact() {
        let mut bytes = [7u8; 20];
        let a = Principal(bytes);
        bytes[19] = 8;
        let b = Principal(bytes);
        assert_ne!(a, b);
    }

    #[test]
    fn principal_serializes_as_string() {
        let p = Principal::repeat(1);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, format!("\"{p}\""));
        let back: Principal = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn sale_id_uniqueness_and_ordering() {
        let a = SaleId::new();
        let b = SaleId::new();
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn sale_id_display() {
        let id = SaleId::from_bytes([0; 16]);
        assert!(format!("{id}").starts_with("sale:"));
    }
}
