//! GIF Portal: wallet-connected client for a shared on-chain collection
//!
//! This crate lets a user connect a browser wallet, submit image links to a
//! single shared program account, and render the accumulated collection.
//!
//! # Architecture
//!
//! - **Connection**: JSON-RPC channel to a ledger cluster at a fixed commitment
//! - **Wallet session**: silent and explicit connect over an injected wallet
//! - **Remote account client**: initialize / append / fetch on the anchor account
//! - **State machine**: pure transitions that emit commands, guarded by epoch
//! - **Runner**: executes commands with bounded waits and feeds results back
//! - **View**: render model derived from the machine
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gif_portal::{PortalContext, PortalRunner, RpcAccountClient, WalletSession, Event};
//!
//! let context = PortalContext::from_env()?;
//! let wallet: Arc<dyn WalletProvider> = injected_wallet();
//! let client = Arc::new(RpcAccountClient::new(context.clone(), wallet.clone()));
//! let mut runner = PortalRunner::new(
//!     WalletSession::new(Some(wallet)),
//!     client,
//!     context.config.request_timeout,
//! );
//!
//! runner.mount();
//! runner.run_until_idle().await;
//! runner.send(Event::DraftChanged("https://media.giphy.com/media/x/giphy.gif".into()));
//! runner.send(Event::SubmitRequested);
//! runner.run_until_idle().await;
//! println!("{}", runner.view());
//! ```

// Public modules
pub mod config;
pub mod connection;
pub mod context;
pub mod error;
pub mod keypair;
pub mod machine;
pub mod program;
pub mod runner;
pub mod transaction;
pub mod types;
pub mod view;
pub mod wallet;

// Re-exports for convenience
pub use config::{cluster_api_url, Commitment, PortalConfig};
pub use connection::{LedgerConnection, SignatureStatus};
pub use context::PortalContext;
pub use error::PortalError;
pub use keypair::AnchorKeypair;
pub use machine::{CollectionState, CollectionStateMachine, Command, Event};
pub use program::{
    decode_account, validate_link, BaseAccount, ItemStruct, RemoteAccountClient, RpcAccountClient,
};
pub use runner::PortalRunner;
pub use types::{Address, Item, RemoteAccount, WalletIdentity};
pub use view::{render, Panel, View};
pub use wallet::{WalletProvider, WalletSession};

// Common result type
pub type Result<T> = std::result::Result<T, PortalError>;
