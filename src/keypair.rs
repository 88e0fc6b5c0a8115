//! The fixed anchor keypair that owns the shared collection account.

use std::path::Path;

use ed25519_dalek::{Signer, SigningKey};
use serde_json::Value;

use crate::{Address, PortalError};

/// Pre-provisioned keypair for the collection account
///
/// The account is created once with this key as a co-signer; afterwards only
/// its public half is needed.
#[derive(Clone)]
pub struct AnchorKeypair {
    signing_key: SigningKey,
}

impl AnchorKeypair {
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Build from the 64-byte `secret || public` form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PortalError> {
        let bytes: [u8; 64] = bytes.try_into().map_err(|_| {
            PortalError::Config(format!("keypair must be 64 bytes, got {}", bytes.len()))
        })?;
        let signing_key = SigningKey::from_keypair_bytes(&bytes)
            .map_err(|e| PortalError::Config(format!("inconsistent keypair bytes: {}", e)))?;
        Ok(Self { signing_key })
    }

    /// Parse a keypair JSON document.
    ///
    /// Accepts a bare 64-element array, or the wrapped
    /// `{"_keypair": {"secretKey": {"0": .., "1": ..}}}` export where the
    /// secret key is an index-keyed object (or array).
    pub fn from_json(json: &str) -> Result<Self, PortalError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| PortalError::Config(format!("keypair is not valid JSON: {}", e)))?;

        let secret = match &value {
            Value::Array(_) => &value,
            _ => value
                .pointer("/_keypair/secretKey")
                .or_else(|| value.get("secretKey"))
                .ok_or_else(|| PortalError::Config("keypair JSON has no secretKey".to_string()))?,
        };

        let bytes = match secret {
            Value::Array(values) => values.iter().map(json_byte).collect::<Result<Vec<_>, _>>()?,
            Value::Object(map) => {
                // Map iteration is lexicographic ("0", "1", "10", ..), so sort by index
                let mut indexed = map
                    .iter()
                    .map(|(k, v)| {
                        let index = k.parse::<usize>().map_err(|_| {
                            PortalError::Config(format!("secretKey index '{}' is not a number", k))
                        })?;
                        Ok((index, json_byte(v)?))
                    })
                    .collect::<Result<Vec<_>, PortalError>>()?;
                indexed.sort_by_key(|(index, _)| *index);
                indexed.into_iter().map(|(_, byte)| byte).collect()
            }
            _ => {
                return Err(PortalError::Config(
                    "secretKey must be an array or an index-keyed object".to_string(),
                ))
            }
        };

        Self::from_bytes(&bytes)
    }

    pub fn from_file(path: &Path) -> Result<Self, PortalError> {
        log::debug!("🔑 Loading anchor keypair from {:?}", path);
        let json = std::fs::read_to_string(path).map_err(|e| {
            PortalError::Config(format!("cannot read keypair {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn address(&self) -> Address {
        Address::new(self.signing_key.verifying_key().to_bytes())
    }

    /// Ed25519 signature over a serialized transaction message
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for AnchorKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnchorKeypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

fn json_byte(value: &Value) -> Result<u8, PortalError> {
    value
        .as_u64()
        .and_then(|n| u8::try_from(n).ok())
        .ok_or_else(|| PortalError::Config(format!("secretKey entry {} is not a byte", value)))
}
