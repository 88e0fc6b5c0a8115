//! Process-wide portal context.
//!
//! Built once at startup from [`PortalConfig`] and shared behind an `Arc`;
//! never torn down while the client runs.

use std::sync::Arc;

use crate::config::PortalConfig;
use crate::connection::LedgerConnection;
use crate::keypair::AnchorKeypair;
use crate::{Address, PortalError};

pub struct PortalContext {
    pub config: PortalConfig,
    pub connection: LedgerConnection,
    pub anchor: AnchorKeypair,
    pub program_id: Address,
}

impl PortalContext {
    /// Assemble a context from already-loaded parts
    pub fn new(config: PortalConfig, anchor: AnchorKeypair, program_id: Address) -> Self {
        let connection = LedgerConnection::from_config(&config);
        Self {
            config,
            connection,
            anchor,
            program_id,
        }
    }

    /// Load the anchor keypair and program id named by `config`
    pub fn from_config(config: PortalConfig) -> Result<Arc<Self>, PortalError> {
        let program_id = config
            .program_id
            .ok_or_else(|| PortalError::Config("GIF_PORTAL_PROGRAM_ID is not set".to_string()))?;
        let keypair_path = config
            .anchor_keypair_path
            .clone()
            .ok_or_else(|| PortalError::Config("GIF_PORTAL_KEYPAIR is not set".to_string()))?;
        let anchor = AnchorKeypair::from_file(&keypair_path)?;

        log::info!("🏁 Portal context ready");
        log::info!("   Program: {}", program_id);
        log::info!("   Anchor account: {}", anchor.address());
        log::info!("   Endpoint: {} ({})", config.rpc_url, config.commitment);

        Ok(Arc::new(Self::new(config, anchor, program_id)))
    }

    /// Shorthand for `PortalConfig::from_env` followed by `from_config`
    pub fn from_env() -> Result<Arc<Self>, PortalError> {
        Self::from_config(PortalConfig::from_env()?)
    }

    pub fn anchor_address(&self) -> Address {
        self.anchor.address()
    }
}
