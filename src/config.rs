//! Portal configuration from environment variables
//!
//! Controls which ledger cluster to talk to, the commitment level used for
//! reads and confirmations, the program being called and where the fixed
//! anchor keypair lives. Defaults to devnet with `processed` commitment.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::{Address, PortalError};

/// Ledger commitment level
///
/// Higher levels give stronger durability guarantees at the cost of latency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }

    /// Whether a reported `confirmationStatus` satisfies this level
    pub fn is_satisfied_by(&self, status: &str) -> bool {
        status
            .parse::<Commitment>()
            .map(|reached| reached >= *self)
            .unwrap_or(false)
    }
}

impl FromStr for Commitment {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "processed" => Ok(Self::Processed),
            "confirmed" => Ok(Self::Confirmed),
            "finalized" => Ok(Self::Finalized),
            other => Err(PortalError::Config(format!(
                "unknown commitment level '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Commitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public API URL for a named cluster
pub fn cluster_api_url(cluster: &str) -> Option<&'static str> {
    match cluster {
        "devnet" => Some("https://api.devnet.solana.com"),
        "testnet" => Some("https://api.testnet.solana.com"),
        "mainnet-beta" | "mainnet" => Some("https://api.mainnet-beta.solana.com"),
        "localnet" | "localhost" => Some("http://127.0.0.1:8899"),
        _ => None,
    }
}

#[derive(Clone, Debug)]
pub struct PortalConfig {
    /// JSON-RPC endpoint of the ledger cluster
    pub rpc_url: String,
    /// Commitment for reads, preflight and confirmation polling
    pub commitment: Commitment,
    /// Address of the deployed collection program
    pub program_id: Option<Address>,
    /// Path to the anchor account keypair JSON
    pub anchor_keypair_path: Option<PathBuf>,
    /// Upper bound for any single remote operation
    pub request_timeout: Duration,
    /// Delay between signature status polls
    pub poll_interval: Duration,
}

impl PortalConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `GIF_PORTAL_CLUSTER`: "devnet" (default), "testnet", "mainnet-beta" or "localnet"
    /// - `GIF_PORTAL_RPC_URL`: explicit endpoint, overrides the cluster
    /// - `GIF_PORTAL_COMMITMENT`: "processed" (default), "confirmed" or "finalized"
    /// - `GIF_PORTAL_PROGRAM_ID`: base58 program address
    /// - `GIF_PORTAL_KEYPAIR`: path to the anchor keypair JSON
    /// - `GIF_PORTAL_TIMEOUT_SECS`: per-operation bound (default 60)
    /// - `GIF_PORTAL_POLL_INTERVAL_MS`: confirmation poll interval (default 500)
    ///
    /// # Examples
    ///
    /// ```bash
    /// GIF_PORTAL_CLUSTER=localnet GIF_PORTAL_COMMITMENT=confirmed \
    ///     GIF_PORTAL_PROGRAM_ID=... GIF_PORTAL_KEYPAIR=./keypair.json cargo test
    /// ```
    pub fn from_env() -> Result<Self, PortalError> {
        let defaults = Self::default();

        let rpc_url = match env::var("GIF_PORTAL_RPC_URL") {
            Ok(url) => {
                log::info!("🔗 RPC URL: {}", url);
                url
            }
            Err(_) => {
                let cluster = env::var("GIF_PORTAL_CLUSTER")
                    .unwrap_or_else(|_| "devnet".to_string())
                    .to_lowercase();
                match cluster_api_url(&cluster) {
                    Some(url) => {
                        log::info!("🌐 Using {} cluster: {}", cluster, url);
                        url.to_string()
                    }
                    None => {
                        log::warn!("⚠️  Unknown cluster '{}', defaulting to devnet", cluster);
                        defaults.rpc_url.clone()
                    }
                }
            }
        };

        let commitment = match env::var("GIF_PORTAL_COMMITMENT") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.commitment,
        };
        log::info!("📡 Commitment: {}", commitment);

        let program_id = env::var("GIF_PORTAL_PROGRAM_ID")
            .ok()
            .map(|id| id.parse::<Address>())
            .transpose()
            .map_err(|e| PortalError::Config(format!("GIF_PORTAL_PROGRAM_ID: {}", e)))?;

        let anchor_keypair_path = env::var("GIF_PORTAL_KEYPAIR").ok().map(PathBuf::from);

        let request_timeout = parse_u64_var("GIF_PORTAL_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);
        let poll_interval = parse_u64_var("GIF_PORTAL_POLL_INTERVAL_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.poll_interval);

        Ok(Self {
            rpc_url,
            commitment,
            program_id,
            anchor_keypair_path,
            request_timeout,
            poll_interval,
        })
    }

    /// Number of status polls that fit into the request timeout
    pub fn max_poll_attempts(&self) -> u32 {
        let interval = self.poll_interval.as_millis().max(1);
        let attempts = self.request_timeout.as_millis() / interval;
        attempts.clamp(1, u32::MAX as u128) as u32
    }
}

impl Default for PortalConfig {
    /// Default configuration (devnet, processed)
    fn default() -> Self {
        Self {
            rpc_url: "https://api.devnet.solana.com".to_string(),
            commitment: Commitment::Processed,
            program_id: None,
            anchor_keypair_path: None,
            request_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        }
    }
}

fn parse_u64_var(name: &str) -> Result<Option<u64>, PortalError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| PortalError::Config(format!("{}: {}", name, e))),
        Err(_) => Ok(None),
    }
}
