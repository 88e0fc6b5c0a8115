//! Error types for GIF portal operations
//!
//! One taxonomy shared by the wallet session, the remote account client and
//! the collection state machine. Errors are `Clone` so the state machine can
//! keep the latest one around as a user-facing notice.

use std::error::Error as StdError;
use std::fmt;

/// Core error type for GIF portal operations
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PortalError {
    /// No injected wallet capability in the hosting environment
    CapabilityAbsent,

    /// The user declined the wallet approval prompt
    UserRejected(String),

    /// The anchor account has never been initialized
    ///
    /// This is the expected discovery signal for the one-time setup, not a
    /// failure.
    AccountNotFound(String),

    /// The anchor account already exists on-chain
    AlreadyInitialized(String),

    /// Rejected locally before any network call
    InvalidInput(String),

    /// Transport or RPC failure talking to the ledger endpoint
    NetworkFailure(String),

    /// A bounded wait expired
    Timeout(String),

    /// Another mutating or account-checking operation is in flight
    Busy,

    /// Account bytes do not match the program's storage layout
    InvalidAccountData(String),

    /// The transaction landed but the program reported an error
    TransactionFailed { signature: String, reason: String },

    /// Startup configuration is missing or malformed
    Config(String),
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapabilityAbsent => {
                write!(f, "No wallet found. Install a Solana wallet extension such as Phantom")
            }
            Self::UserRejected(msg) => write!(f, "Wallet request rejected: {}", msg),
            Self::AccountNotFound(address) => {
                write!(f, "Account not initialized: {}", address)
            }
            Self::AlreadyInitialized(address) => {
                write!(f, "Account already exists: {}", address)
            }
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Self::NetworkFailure(msg) => write!(f, "Network failure: {}", msg),
            Self::Timeout(msg) => write!(f, "Timed out: {}", msg),
            Self::Busy => write!(f, "Another operation is still in progress"),
            Self::InvalidAccountData(msg) => write!(f, "Invalid account data: {}", msg),
            Self::TransactionFailed { signature, reason } => {
                write!(
                    f,
                    "Transaction failed: signature={}, reason={}",
                    signature, reason
                )
            }
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl StdError for PortalError {}

// Helper functions for common error scenarios
impl PortalError {
    /// Create a network failure error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::NetworkFailure(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a transaction failed error
    pub fn transaction_failed(signature: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TransactionFailed {
            signature: signature.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is the "account missing" discovery signal
    pub fn is_account_not_found(&self) -> bool {
        matches!(self, Self::AccountNotFound(_))
    }
}
