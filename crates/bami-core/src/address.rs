// crates/bami-core/src/address.rs
//
// Account and asset identifiers.
//
// An `Address` is an opaque 32-byte account key, rendered as 0x-prefixed hex.
// Well-known contract accounts (the chef, the syrup bar) derive theirs from a
// label with SHA-256 so every host agrees on them without coordination.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::FarmError;

/// A 32-byte account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(pub [u8; 32]);

impl Address {
    /// The all-zero address. Never a valid owner.
    pub const ZERO: Address = Address([0u8; 32]);

    /// Derive a deterministic address from a label: `sha256(label)`.
    pub fn derive(label: &str) -> Self {
        let digest = Sha256::digest(label.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Address(bytes)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = FarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(trimmed)
            .map_err(|e| FarmError::InvalidConfig(format!("address {:?}: {}", s, e)))?;
        let bytes: [u8; 32] = raw.try_into().map_err(|v: Vec<u8>| {
            FarmError::InvalidConfig(format!(
                "address {:?}: expected 32 bytes, got {}",
                s,
                v.len()
            ))
        })?;
        Ok(Address(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = FarmError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.to_string()
    }
}

/// Identifier of a stake asset (typically an LP token symbol).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        AssetId(id.into())
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
