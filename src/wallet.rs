//! Wallet session over an injected wallet capability.
//!
//! The wallet itself (key storage, approval UI) lives outside this crate; it
//! is reached through the [`WalletProvider`] trait so the session can run
//! against a browser bridge or a test fake alike. The connected identity is
//! handed to the collection state machine, which owns it from then on.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{Address, PortalError, WalletIdentity};

/// Capability exposed by an injected wallet
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Human-readable wallet name, for logs
    fn name(&self) -> &str {
        "wallet"
    }

    /// Request the wallet's public key.
    ///
    /// With `only_if_trusted` the wallet must answer without prompting,
    /// succeeding only if this origin was approved before. Otherwise it shows
    /// an approval prompt and resolves once the user decides.
    async fn connect(&self, only_if_trusted: bool) -> Result<Address, PortalError>;

    /// Sign a serialized transaction message with the connected key
    async fn sign_message(&self, message: &[u8]) -> Result<[u8; 64], PortalError>;

    /// Drop this origin's connection; wallets without the notion accept it
    async fn disconnect(&self) -> Result<(), PortalError> {
        Ok(())
    }
}

/// Handle on whatever wallet the host injected (possibly nothing)
#[derive(Clone)]
pub struct WalletSession {
    capability: Option<Arc<dyn WalletProvider>>,
}

impl WalletSession {
    pub fn new(capability: Option<Arc<dyn WalletProvider>>) -> Self {
        Self { capability }
    }

    /// The injected capability, if any
    ///
    /// Never fails: absence is reported as `None` and left to the caller to
    /// turn into an "install a wallet" notice.
    pub fn detect_capability(&self) -> Option<Arc<dyn WalletProvider>> {
        match &self.capability {
            Some(wallet) => {
                log::debug!("👛 Wallet capability found: {}", wallet.name());
                Some(Arc::clone(wallet))
            }
            None => {
                log::warn!("⚠️  No wallet capability injected");
                None
            }
        }
    }

    /// Connect without prompting
    ///
    /// Rejection, absence and extension errors all yield `None`; nothing is
    /// surfaced to the user.
    pub async fn connect_silently(&self) -> Option<WalletIdentity> {
        let wallet = self.detect_capability()?;
        match wallet.connect(true).await {
            Ok(address) => {
                let identity = WalletIdentity::new(address);
                log::info!("✅ Wallet connected silently: {}", identity);
                Some(identity)
            }
            Err(e) => {
                log::debug!("   Silent connect declined: {}", e);
                None
            }
        }
    }

    /// Connect with a user-facing approval prompt
    pub async fn connect_explicitly(&self) -> Result<WalletIdentity, PortalError> {
        let wallet = self
            .detect_capability()
            .ok_or(PortalError::CapabilityAbsent)?;
        let address = wallet.connect(false).await.map_err(|e| {
            log::warn!("   ❌ Explicit connect failed: {}", e);
            e
        })?;
        let identity = WalletIdentity::new(address);
        log::info!("✅ Wallet connected: {}", identity);
        Ok(identity)
    }

    /// Tell the wallet the user left
    ///
    /// The identity itself is cleared by the state machine; a wallet that
    /// fails to disconnect is only logged.
    pub async fn disconnect(&self) {
        let Some(wallet) = self.capability.as_ref() else {
            return;
        };
        match wallet.disconnect().await {
            Ok(()) => log::info!("👋 Wallet {} disconnected", wallet.name()),
            Err(e) => log::warn!("⚠️  Wallet disconnect failed: {}", e),
        }
    }
}
