//! Common test utilities for portal integration tests
//!
//! In-memory stand-ins for the injected wallet and the on-chain program:
//! - `FakeWallet`: trusted/approving switches, real ed25519 key
//! - `FakeLedger`: one shared anchor account with call log, pausing and
//!   scripted failures

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use gif_portal::{
    validate_link, Address, Item, PortalError, PortalRunner, RemoteAccount, RemoteAccountClient,
    WalletIdentity, WalletProvider, WalletSession,
};
use tokio::sync::Notify;

/// Initialize logging (only once, subsequent calls are no-ops)
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

pub struct FakeWallet {
    key: SigningKey,
    trusted: AtomicBool,
    approves: AtomicBool,
    disconnects: AtomicUsize,
}

impl FakeWallet {
    pub fn new(trusted: bool, approves: bool) -> Arc<Self> {
        Arc::new(Self {
            key: SigningKey::generate(&mut rand::rngs::OsRng),
            trusted: AtomicBool::new(trusted),
            approves: AtomicBool::new(approves),
            disconnects: AtomicUsize::new(0),
        })
    }

    pub fn identity(&self) -> WalletIdentity {
        WalletIdentity::new(Address::new(self.key.verifying_key().to_bytes()))
    }

    pub fn set_approves(&self, approves: bool) {
        self.approves.store(approves, Ordering::SeqCst);
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    fn name(&self) -> &str {
        "fake-wallet"
    }

    async fn connect(&self, only_if_trusted: bool) -> Result<Address, PortalError> {
        let allowed = if only_if_trusted {
            self.trusted.load(Ordering::SeqCst)
        } else {
            self.approves.load(Ordering::SeqCst)
        };
        if allowed {
            Ok(*self.identity().address())
        } else {
            Err(PortalError::UserRejected("User rejected the request.".to_string()))
        }
    }

    async fn sign_message(&self, message: &[u8]) -> Result<[u8; 64], PortalError> {
        Ok(self.key.sign(message).to_bytes())
    }

    async fn disconnect(&self) -> Result<(), PortalError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Remote call names recorded by `FakeLedger`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Call {
    Initialize,
    Fetch,
    Append,
}

#[derive(Default)]
struct LedgerState {
    account: Option<Vec<Item>>,
    calls: Vec<Call>,
    fail_next_append: Option<PortalError>,
    fail_next_init: Option<PortalError>,
}

/// Shared in-memory anchor account
pub struct FakeLedger {
    anchor: Address,
    state: Mutex<LedgerState>,
    paused: AtomicBool,
    resume: Notify,
    hang_fetch: AtomicBool,
}

impl FakeLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            anchor: Address::new([0xA7; 32]),
            state: Mutex::new(LedgerState::default()),
            paused: AtomicBool::new(false),
            resume: Notify::new(),
            hang_fetch: AtomicBool::new(false),
        })
    }

    pub fn initialized(links: &[&str]) -> Arc<Self> {
        let ledger = Self::new();
        let submitter = Address::new([0x11; 32]);
        ledger.state.lock().unwrap().account = Some(
            links
                .iter()
                .map(|link| Item {
                    link: link.to_string(),
                    submitted_by: submitter,
                })
                .collect(),
        );
        ledger
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    pub fn links(&self) -> Option<Vec<String>> {
        self.state
            .lock()
            .unwrap()
            .account
            .as_ref()
            .map(|items| items.iter().map(|i| i.link.clone()).collect())
    }

    /// Hold every remote call until `resume` is called
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        self.resume.notify_waiters();
        self.resume.notify_one();
    }

    /// Make fetches never complete
    pub fn hang_fetch(&self, hang: bool) {
        self.hang_fetch.store(hang, Ordering::SeqCst);
    }

    pub fn fail_next_append(&self, error: PortalError) {
        self.state.lock().unwrap().fail_next_append = Some(error);
    }

    pub fn fail_next_init(&self, error: PortalError) {
        self.state.lock().unwrap().fail_next_init = Some(error);
    }

    async fn wait_if_paused(&self) {
        while self.paused.load(Ordering::SeqCst) {
            self.resume.notified().await;
        }
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl RemoteAccountClient for FakeLedger {
    fn anchor(&self) -> Address {
        self.anchor
    }

    async fn initialize_account(&self, _owner: WalletIdentity) -> Result<(), PortalError> {
        self.record(Call::Initialize);
        self.wait_if_paused().await;
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.fail_next_init.take() {
            return Err(error);
        }
        if state.account.is_some() {
            return Err(PortalError::AlreadyInitialized(self.anchor.to_string()));
        }
        state.account = Some(Vec::new());
        Ok(())
    }

    async fn fetch_account(&self, anchor: Address) -> Result<RemoteAccount, PortalError> {
        self.record(Call::Fetch);
        if self.hang_fetch.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.wait_if_paused().await;
        let state = self.state.lock().unwrap();
        match &state.account {
            Some(items) => Ok(RemoteAccount {
                total_items: items.len() as u64,
                items: items.clone(),
            }),
            None => Err(PortalError::AccountNotFound(anchor.to_string())),
        }
    }

    async fn append_item(&self, owner: WalletIdentity, link: &str) -> Result<(), PortalError> {
        let link = validate_link(link)?;
        self.record(Call::Append);
        self.wait_if_paused().await;
        let mut state = self.state.lock().unwrap();
        if let Some(error) = state.fail_next_append.take() {
            return Err(error);
        }
        let anchor = self.anchor;
        let items = state
            .account
            .as_mut()
            .ok_or_else(|| PortalError::AccountNotFound(anchor.to_string()))?;
        items.push(Item {
            link: link.to_string(),
            submitted_by: *owner.address(),
        });
        Ok(())
    }
}

/// Runner over the given wallet (or none) and ledger
pub fn runner(wallet: Option<Arc<FakeWallet>>, ledger: &Arc<FakeLedger>) -> PortalRunner {
    runner_with_timeout(wallet, ledger, Duration::from_secs(5))
}

pub fn runner_with_timeout(
    wallet: Option<Arc<FakeWallet>>,
    ledger: &Arc<FakeLedger>,
    timeout: Duration,
) -> PortalRunner {
    let capability = wallet.map(|w| w as Arc<dyn WalletProvider>);
    let client: Arc<dyn RemoteAccountClient> = ledger.clone();
    PortalRunner::new(WalletSession::new(capability), client, timeout)
}
