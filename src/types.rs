//! Ledger-facing value types shared across the crate.

use std::fmt;
use std::str::FromStr;

use crate::PortalError;

/// A 32-byte ledger address, written in base58.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    /// The system program (all-zero key)
    pub const SYSTEM_PROGRAM: Address = Address([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse from a raw byte slice, checking the length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PortalError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            PortalError::invalid_input(format!("address must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(arr))
    }
}

impl FromStr for Address {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| PortalError::invalid_input(format!("invalid base58 address: {}", e)))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

// Serialized in its base58 text form
impl serde::Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Public identity of a connected wallet.
///
/// Only ever constructed from a successful wallet connect; dropping it is how
/// the session represents "disconnected".
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalletIdentity(Address);

impl WalletIdentity {
    pub fn new(address: Address) -> Self {
        Self(address)
    }

    pub fn address(&self) -> &Address {
        &self.0
    }
}

impl fmt::Display for WalletIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for WalletIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WalletIdentity({})", self.0)
    }
}

/// One submitted link in the shared collection.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Item {
    /// Image URL as submitted
    pub link: String,
    /// Wallet that appended the item
    pub submitted_by: Address,
}

/// Decoded contents of the initialized anchor account.
///
/// Items are in insertion order; the program only ever appends.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct RemoteAccount {
    /// Running counter kept by the program
    pub total_items: u64,
    pub items: Vec<Item>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_program_is_all_ones_in_base58() {
        assert_eq!(
            Address::SYSTEM_PROGRAM.to_string(),
            "11111111111111111111111111111111"
        );
    }

    #[test]
    fn test_address_parse_rejects_wrong_length() {
        let short = bs58::encode([7u8; 16]).into_string();
        let err = short.parse::<Address>().unwrap_err();
        assert!(matches!(err, PortalError::InvalidInput(_)));

        assert!("not-base58-0OIl".parse::<Address>().is_err());
    }

    #[test]
    fn test_item_serializes_address_as_base58() {
        let item = Item {
            link: "https://media.example/a.gif".to_string(),
            submitted_by: Address::SYSTEM_PROGRAM,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["submitted_by"], "11111111111111111111111111111111");
        assert_eq!(json["link"], "https://media.example/a.gif");
    }
}
