// Remote account client for the collection program
//
// This module wraps the two remote procedures and the one account read the
// client consumes:
// - startStuffOff: one-time creation of the shared anchor account
// - addGif: append a link to the anchor account
// - baseAccount.fetch: read and decode the current item list
//
// Single-in-flight is not enforced here; the state machine owns that.

use std::sync::Arc;

use async_trait::async_trait;
use borsh::{BorshDeserialize, BorshSerialize};

use crate::context::PortalContext;
use crate::transaction::{self, anchor_discriminator, Instruction, Message};
use crate::wallet::WalletProvider;
use crate::{Address, Item, PortalError, RemoteAccount, WalletIdentity};

/// Calls into the on-chain collection program
#[async_trait]
pub trait RemoteAccountClient: Send + Sync {
    /// Address of the fixed storage anchor
    fn anchor(&self) -> Address;

    /// Create the anchor account
    ///
    /// Fails with `AlreadyInitialized` if it already exists.
    async fn initialize_account(&self, owner: WalletIdentity) -> Result<(), PortalError>;

    /// Read the anchor account
    ///
    /// Fails with `AccountNotFound` if it was never initialized.
    async fn fetch_account(&self, anchor: Address) -> Result<RemoteAccount, PortalError>;

    /// Append `link` on behalf of `owner`
    ///
    /// Implementations must call [`validate_link`] before any network work.
    async fn append_item(&self, owner: WalletIdentity, link: &str) -> Result<(), PortalError>;
}

/// Reject empty and whitespace-only links; returns the trimmed link
pub fn validate_link(link: &str) -> Result<&str, PortalError> {
    let trimmed = link.trim();
    if trimmed.is_empty() {
        return Err(PortalError::invalid_input("link must not be empty"));
    }
    Ok(trimmed)
}

/// On-chain layout of one collection entry
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct ItemStruct {
    pub gif_link: String,
    pub user_address: [u8; 32],
}

/// On-chain layout of the anchor account, after its discriminator
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct BaseAccount {
    pub total_gifs: u64,
    pub gif_list: Vec<ItemStruct>,
}

impl From<BaseAccount> for RemoteAccount {
    fn from(account: BaseAccount) -> Self {
        Self {
            total_items: account.total_gifs,
            items: account
                .gif_list
                .into_iter()
                .map(|item| Item {
                    link: item.gif_link,
                    submitted_by: Address::new(item.user_address),
                })
                .collect(),
        }
    }
}

/// Decode the anchor account's bytes
///
/// The account is allocated with spare room, so bytes past the encoded
/// `BaseAccount` are ignored.
pub fn decode_account(data: &[u8]) -> Result<RemoteAccount, PortalError> {
    if data.len() < 8 || data[..8] != anchor_discriminator("account", "BaseAccount") {
        return Err(PortalError::InvalidAccountData(
            "discriminator does not match BaseAccount".to_string(),
        ));
    }

    let account = BaseAccount::deserialize(&mut &data[8..])
        .map_err(|e| PortalError::InvalidAccountData(format!("cannot decode BaseAccount: {}", e)))?;
    Ok(account.into())
}

/// JSON-RPC backed client
///
/// The connected wallet pays fees and signs as `user`; the anchor keypair
/// co-signs the initialization.
pub struct RpcAccountClient {
    context: Arc<PortalContext>,
    wallet: Arc<dyn WalletProvider>,
}

impl RpcAccountClient {
    pub fn new(context: Arc<PortalContext>, wallet: Arc<dyn WalletProvider>) -> Self {
        Self { context, wallet }
    }

    /// Compile, sign, send and confirm a single instruction
    async fn submit(&self, owner: &WalletIdentity, instruction: Instruction) -> Result<String, PortalError> {
        Message::compile(owner.address(), &instruction, [0; 32]).ensure_fits()?;

        let connection = &self.context.connection;
        let blockhash = connection.get_latest_blockhash().await?;
        let message = Message::compile(owner.address(), &instruction, blockhash);
        let message_bytes = message.serialize();
        log::debug!("   📜 Message: {} bytes", message_bytes.len());
        log::debug!("   Instruction data: {}", hex::encode(&instruction.data));

        let anchor_address = self.context.anchor_address();
        let mut signatures = Vec::with_capacity(message.signers().len());
        for signer in message.signers() {
            if signer == owner.address() {
                signatures.push(self.wallet.sign_message(&message_bytes).await?);
            } else if *signer == anchor_address {
                signatures.push(self.context.anchor.sign(&message_bytes));
            } else {
                return Err(PortalError::invalid_input(format!(
                    "no signer available for {}",
                    signer
                )));
            }
        }

        let wire = transaction::assemble(&message_bytes, &signatures);
        let signature = connection.send_transaction(&wire).await?;
        log::info!("   📨 Sent transaction {}", signature);

        let config = &self.context.config;
        connection
            .confirm_transaction(&signature, config.poll_interval, config.max_poll_attempts())
            .await?;
        log::info!("   ✅ Confirmed at '{}'", connection.commitment());
        Ok(signature)
    }
}

#[async_trait]
impl RemoteAccountClient for RpcAccountClient {
    fn anchor(&self) -> Address {
        self.context.anchor_address()
    }

    async fn initialize_account(&self, owner: WalletIdentity) -> Result<(), PortalError> {
        let anchor = self.anchor();
        log::info!("🚀 Initializing anchor account {} for {}", anchor, owner);

        let instruction = transaction::start_stuff_off(self.context.program_id, anchor, *owner.address());
        match self.submit(&owner, instruction).await {
            Ok(_) => {
                log::info!("   ✅ Created anchor account {}", anchor);
                Ok(())
            }
            Err(PortalError::NetworkFailure(msg)) | Err(PortalError::TransactionFailed { reason: msg, .. })
                if msg.contains("already in use") =>
            {
                log::warn!("   ⚠️  Anchor account {} already exists", anchor);
                Err(PortalError::AlreadyInitialized(anchor.to_string()))
            }
            Err(e) => {
                log::error!("   ❌ Account initialization failed: {}", e);
                Err(e)
            }
        }
    }

    async fn fetch_account(&self, anchor: Address) -> Result<RemoteAccount, PortalError> {
        log::info!("🔍 Fetching anchor account {}", anchor);
        let data = self
            .context
            .connection
            .get_account_data(&anchor)
            .await?
            .ok_or_else(|| PortalError::AccountNotFound(anchor.to_string()))?;

        let account = decode_account(&data)?;
        log::info!("   📊 {} items", account.items.len());
        Ok(account)
    }

    async fn append_item(&self, owner: WalletIdentity, link: &str) -> Result<(), PortalError> {
        let link = validate_link(link)?;
        log::info!("📝 Appending link for {}: {}", owner, link);

        let instruction = transaction::add_gif(self.context.program_id, self.anchor(), *owner.address(), link)?;
        self.submit(&owner, instruction).await.map(|signature| {
            log::info!("   ✅ Saved link in {}", signature);
        })
    }
}
