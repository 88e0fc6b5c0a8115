//! Collection state machine
//!
//! Pure transition logic between wallet connectivity, the remote anchor
//! account and local UI state. Each [`Event`] is applied synchronously and
//! may yield one [`Command`] for the runner to execute; the machine itself
//! never performs I/O.
//!
//! # Ordering
//!
//! At most one account-checking or mutating command is in flight. Requests
//! that would start another one are answered with a `Busy` notice.
//!
//! # Cancellation
//!
//! Every command carries the epoch it was issued under. The epoch moves
//! whenever a connect attempt starts or the wallet identity changes, and
//! results from an older epoch are dropped without touching state.
//!
//! # Notices
//!
//! A notice reports the last failure. It is cleared by the next user intent
//! and by every successful completion.

use crate::{Item, PortalError, RemoteAccount, WalletIdentity};

/// Where the client currently is
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectionState {
    Disconnected,
    /// Waiting on the wallet's approval prompt
    Connecting,
    Connected {
        identity: WalletIdentity,
    },
    /// Reading the anchor account; `previous` is the list shown before the read
    CheckingAccount {
        identity: WalletIdentity,
        previous: Option<Vec<Item>>,
    },
    NeedsInit {
        identity: WalletIdentity,
    },
    Initializing {
        identity: WalletIdentity,
    },
    Ready {
        identity: WalletIdentity,
        items: Vec<Item>,
    },
    Submitting {
        identity: WalletIdentity,
        items: Vec<Item>,
        draft: String,
    },
}

impl CollectionState {
    pub fn identity(&self) -> Option<WalletIdentity> {
        match self {
            Self::Disconnected | Self::Connecting => None,
            Self::Connected { identity }
            | Self::CheckingAccount { identity, .. }
            | Self::NeedsInit { identity }
            | Self::Initializing { identity }
            | Self::Ready { identity, .. }
            | Self::Submitting { identity, .. } => Some(*identity),
        }
    }

    /// Whether a remote operation started by the machine is outstanding
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::CheckingAccount { .. } | Self::Initializing { .. } | Self::Submitting { .. }
        )
    }

    pub fn items(&self) -> Option<&[Item]> {
        match self {
            Self::Ready { items, .. } | Self::Submitting { items, .. } => Some(items),
            Self::CheckingAccount { previous, .. } => previous.as_deref(),
            _ => None,
        }
    }
}

/// Inputs to the machine: user intents and completed remote work
#[derive(Clone, Debug)]
pub enum Event {
    /// Page finished loading; `capability_present` from wallet detection
    Mounted { capability_present: bool },
    SilentConnectFinished {
        epoch: u64,
        identity: Option<WalletIdentity>,
    },
    ConnectRequested,
    ConnectFinished {
        epoch: u64,
        result: Result<WalletIdentity, PortalError>,
    },
    DisconnectRequested,
    RefreshRequested,
    AccountFetched {
        epoch: u64,
        result: Result<RemoteAccount, PortalError>,
    },
    InitializeRequested,
    InitializeFinished {
        epoch: u64,
        result: Result<(), PortalError>,
    },
    DraftChanged(String),
    SubmitRequested,
    SubmitFinished {
        epoch: u64,
        result: Result<(), PortalError>,
    },
}

impl Event {
    /// Whether this event reports the outcome of a command
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            Self::SilentConnectFinished { .. }
                | Self::ConnectFinished { .. }
                | Self::AccountFetched { .. }
                | Self::InitializeFinished { .. }
                | Self::SubmitFinished { .. }
        )
    }

    /// Whether this event is a user action (typing excluded)
    pub fn is_user_intent(&self) -> bool {
        matches!(
            self,
            Self::ConnectRequested
                | Self::DisconnectRequested
                | Self::RefreshRequested
                | Self::InitializeRequested
                | Self::SubmitRequested
        )
    }
}

/// Outbound work for the runner
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    ConnectSilently { epoch: u64 },
    ConnectExplicitly { epoch: u64 },
    FetchAccount { epoch: u64 },
    InitializeAccount { epoch: u64, owner: WalletIdentity },
    AppendItem { epoch: u64, owner: WalletIdentity, link: String },
}

pub struct CollectionStateMachine {
    state: CollectionState,
    epoch: u64,
    draft: String,
    notice: Option<PortalError>,
    capability_present: bool,
}

impl Default for CollectionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionStateMachine {
    pub fn new() -> Self {
        Self {
            state: CollectionState::Disconnected,
            epoch: 0,
            draft: String::new(),
            notice: None,
            capability_present: true,
        }
    }

    pub fn state(&self) -> &CollectionState {
        &self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn notice(&self) -> Option<&PortalError> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<PortalError> {
        self.notice.take()
    }

    pub fn capability_present(&self) -> bool {
        self.capability_present
    }

    /// Submit affordance: identity present and the account known initialized
    pub fn can_submit(&self) -> bool {
        matches!(self.state, CollectionState::Ready { .. })
    }

    /// Apply one event, returning the command it starts (if any)
    pub fn handle(&mut self, event: Event) -> Option<Command> {
        log::debug!("⚙️  {} <- {:?}", state_name(&self.state), event);
        if event.is_user_intent() {
            self.notice = None;
        }
        let command = match event {
            Event::Mounted { capability_present } => self.on_mounted(capability_present),
            Event::SilentConnectFinished { epoch, identity } => self.on_silent_connect(epoch, identity),
            Event::ConnectRequested => self.on_connect_requested(),
            Event::ConnectFinished { epoch, result } => self.on_connect_finished(epoch, result),
            Event::DisconnectRequested => self.on_disconnect(),
            Event::RefreshRequested => self.on_refresh(),
            Event::AccountFetched { epoch, result } => self.on_account_fetched(epoch, result),
            Event::InitializeRequested => self.on_initialize_requested(),
            Event::InitializeFinished { epoch, result } => self.on_initialize_finished(epoch, result),
            Event::DraftChanged(draft) => {
                self.draft = draft;
                None
            }
            Event::SubmitRequested => self.on_submit_requested(),
            Event::SubmitFinished { epoch, result } => self.on_submit_finished(epoch, result),
        };
        if let Some(cmd) = &command {
            log::debug!("   -> {}, command {:?}", state_name(&self.state), cmd);
        }
        command
    }

    fn on_mounted(&mut self, capability_present: bool) -> Option<Command> {
        self.capability_present = capability_present;
        if !capability_present {
            log::warn!("⚠️  No wallet found, staying disconnected");
            self.notice = Some(PortalError::CapabilityAbsent);
            return None;
        }
        match self.state {
            CollectionState::Disconnected => {
                self.epoch += 1;
                Some(Command::ConnectSilently { epoch: self.epoch })
            }
            _ => None,
        }
    }

    fn on_silent_connect(&mut self, epoch: u64, identity: Option<WalletIdentity>) -> Option<Command> {
        if epoch != self.epoch {
            log::debug!("   Discarding stale silent connect result (epoch {} != {})", epoch, self.epoch);
            return None;
        }
        match identity {
            Some(identity) if self.state == CollectionState::Disconnected => self.connected(identity),
            _ => None,
        }
    }

    fn on_connect_requested(&mut self) -> Option<Command> {
        match self.state {
            CollectionState::Disconnected if !self.capability_present => {
                self.notice = Some(PortalError::CapabilityAbsent);
                None
            }
            CollectionState::Disconnected => {
                self.epoch += 1;
                self.state = CollectionState::Connecting;
                Some(Command::ConnectExplicitly { epoch: self.epoch })
            }
            CollectionState::Connecting => {
                self.notice = Some(PortalError::Busy);
                None
            }
            _ => None,
        }
    }

    fn on_connect_finished(
        &mut self,
        epoch: u64,
        result: Result<WalletIdentity, PortalError>,
    ) -> Option<Command> {
        if epoch != self.epoch || self.state != CollectionState::Connecting {
            log::debug!("   Dropping connect result outside Connecting");
            return None;
        }
        match result {
            Ok(identity) => {
                self.state = CollectionState::Disconnected;
                self.connected(identity)
            }
            Err(e) => {
                log::info!("🚫 Connect failed: {}", e);
                self.state = CollectionState::Disconnected;
                self.notice = Some(e);
                None
            }
        }
    }

    /// New identity: bump the epoch and check the account
    fn connected(&mut self, identity: WalletIdentity) -> Option<Command> {
        self.epoch += 1;
        log::info!("🔌 Connected as {} (epoch {})", identity, self.epoch);
        self.state = CollectionState::Connected { identity };
        self.start_fetch(None)
    }

    fn on_disconnect(&mut self) -> Option<Command> {
        if self.state != CollectionState::Disconnected {
            self.epoch += 1;
            log::info!("👋 Disconnected (epoch {})", self.epoch);
        }
        self.state = CollectionState::Disconnected;
        self.draft.clear();
        None
    }

    fn on_refresh(&mut self) -> Option<Command> {
        match &self.state {
            CollectionState::Connected { .. } | CollectionState::NeedsInit { .. } => self.start_fetch(None),
            CollectionState::Ready { items, .. } => {
                let previous = Some(items.clone());
                self.start_fetch(previous)
            }
            state if state.is_busy() => {
                self.notice = Some(PortalError::Busy);
                None
            }
            _ => None,
        }
    }

    fn start_fetch(&mut self, previous: Option<Vec<Item>>) -> Option<Command> {
        let identity = self.state.identity()?;
        self.state = CollectionState::CheckingAccount { identity, previous };
        Some(Command::FetchAccount { epoch: self.epoch })
    }

    fn on_account_fetched(&mut self, epoch: u64, result: Result<RemoteAccount, PortalError>) -> Option<Command> {
        if epoch != self.epoch {
            log::debug!("   Discarding stale fetch result (epoch {} != {})", epoch, self.epoch);
            return None;
        }
        let (identity, previous) = match &mut self.state {
            CollectionState::CheckingAccount { identity, previous } => (*identity, previous.take()),
            _ => return None,
        };

        self.state = match result {
            Ok(account) => {
                log::info!("📚 Account loaded with {} items", account.items.len());
                self.notice = None;
                CollectionState::Ready {
                    identity,
                    items: account.items,
                }
            }
            Err(e) if e.is_account_not_found() => {
                log::info!("🆕 Anchor account not initialized yet");
                CollectionState::NeedsInit { identity }
            }
            Err(e) => {
                log::warn!("⚠️  Account fetch failed: {}", e);
                self.notice = Some(e);
                match previous {
                    Some(items) => CollectionState::Ready { identity, items },
                    None => CollectionState::Connected { identity },
                }
            }
        };
        None
    }

    fn on_initialize_requested(&mut self) -> Option<Command> {
        match self.state {
            CollectionState::NeedsInit { identity } => {
                self.state = CollectionState::Initializing { identity };
                Some(Command::InitializeAccount {
                    epoch: self.epoch,
                    owner: identity,
                })
            }
            ref state if state.is_busy() => {
                self.notice = Some(PortalError::Busy);
                None
            }
            _ => None,
        }
    }

    fn on_initialize_finished(&mut self, epoch: u64, result: Result<(), PortalError>) -> Option<Command> {
        if epoch != self.epoch {
            log::debug!("   Discarding stale initialize result");
            return None;
        }
        let identity = match self.state {
            CollectionState::Initializing { identity } => identity,
            _ => return None,
        };

        match result {
            Ok(()) => {
                log::info!("🎉 Anchor account initialized");
                self.notice = None;
                self.start_fetch(None)
            }
            Err(PortalError::AlreadyInitialized(_)) => {
                log::info!("   Anchor account already exists, refreshing");
                self.notice = None;
                self.start_fetch(None)
            }
            Err(e) => {
                log::warn!("⚠️  Initialization failed: {}", e);
                self.notice = Some(e);
                self.state = CollectionState::NeedsInit { identity };
                None
            }
        }
    }

    fn on_submit_requested(&mut self) -> Option<Command> {
        if self.state.is_busy() {
            self.notice = Some(PortalError::Busy);
            return None;
        }
        let (identity, items) = match &mut self.state {
            CollectionState::Ready { identity, items } => (*identity, std::mem::take(items)),
            _ => return None,
        };

        let link = self.draft.trim().to_string();
        if link.is_empty() {
            self.state = CollectionState::Ready { identity, items };
            self.notice = Some(PortalError::invalid_input("enter a link before submitting"));
            return None;
        }

        self.state = CollectionState::Submitting {
            identity,
            items,
            draft: self.draft.clone(),
        };
        Some(Command::AppendItem {
            epoch: self.epoch,
            owner: identity,
            link,
        })
    }

    fn on_submit_finished(&mut self, epoch: u64, result: Result<(), PortalError>) -> Option<Command> {
        if epoch != self.epoch {
            log::debug!("   Discarding stale submit result");
            return None;
        }
        let (identity, items, submitted) = match &mut self.state {
            CollectionState::Submitting { identity, items, draft } => {
                (*identity, std::mem::take(items), std::mem::take(draft))
            }
            _ => return None,
        };

        match result {
            Ok(()) => {
                log::info!("✅ Link saved, refreshing collection");
                self.notice = None;
                if self.draft == submitted {
                    self.draft.clear();
                }
                self.state = CollectionState::CheckingAccount {
                    identity,
                    previous: Some(items),
                };
                Some(Command::FetchAccount { epoch: self.epoch })
            }
            Err(e) => {
                log::warn!("⚠️  Submit failed: {}", e);
                self.notice = Some(e);
                self.state = CollectionState::Ready { identity, items };
                None
            }
        }
    }
}

fn state_name(state: &CollectionState) -> &'static str {
    match state {
        CollectionState::Disconnected => "Disconnected",
        CollectionState::Connecting => "Connecting",
        CollectionState::Connected { .. } => "Connected",
        CollectionState::CheckingAccount { .. } => "CheckingAccount",
        CollectionState::NeedsInit { .. } => "NeedsInit",
        CollectionState::Initializing { .. } => "Initializing",
        CollectionState::Ready { .. } => "Ready",
        CollectionState::Submitting { .. } => "Submitting",
    }
}
