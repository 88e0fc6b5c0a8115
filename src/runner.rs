//! Effect runner for the collection state machine.
//!
//! Feeds events into [`CollectionStateMachine`] and executes the commands it
//! returns as spawned tasks on the current tokio runtime. Each task reports
//! back through the event queue, so user events and remote results are
//! applied strictly one at a time, in arrival order.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::machine::{CollectionStateMachine, Command, Event};
use crate::program::RemoteAccountClient;
use crate::view::{render, View};
use crate::wallet::WalletSession;
use crate::PortalError;

pub struct PortalRunner {
    machine: CollectionStateMachine,
    wallet: WalletSession,
    client: Arc<dyn RemoteAccountClient>,
    request_timeout: Duration,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    /// Spawned commands whose completion event has not been applied yet
    in_flight: usize,
}

impl PortalRunner {
    /// Create a runner over a wallet session and account client
    ///
    /// `request_timeout` bounds every remote call; the explicit connect prompt
    /// is left unbounded because it waits on the user.
    pub fn new(
        wallet: WalletSession,
        client: Arc<dyn RemoteAccountClient>,
        request_timeout: Duration,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            machine: CollectionStateMachine::new(),
            wallet,
            client,
            request_timeout,
            events_tx,
            events_rx,
            in_flight: 0,
        }
    }

    pub fn machine(&self) -> &CollectionStateMachine {
        &self.machine
    }

    /// Current render model
    pub fn view(&self) -> View {
        render(&self.machine)
    }

    /// Handle for UI code to push events from elsewhere
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.events_tx.clone()
    }

    /// Queue an event; it is applied on the next `process_pending`
    pub fn send(&self, event: Event) {
        // The receiver lives in `self`, so this cannot fail while we exist
        let _ = self.events_tx.send(event);
    }

    /// Detect the wallet and queue the page-load event
    pub fn mount(&self) {
        let capability_present = self.wallet.detect_capability().is_some();
        self.send(Event::Mounted { capability_present });
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Apply every queued event without waiting; returns how many were applied
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Apply events until the queue is empty and nothing is in flight
    pub async fn run_until_idle(&mut self) {
        loop {
            self.process_pending();
            if self.in_flight == 0 {
                break;
            }
            match self.events_rx.recv().await {
                Some(event) => self.apply(event),
                None => break,
            }
        }
    }

    fn apply(&mut self, event: Event) {
        if event.is_completion() {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
        if matches!(event, Event::DisconnectRequested) && self.machine.state().identity().is_some() {
            let wallet = self.wallet.clone();
            tokio::spawn(async move { wallet.disconnect().await });
        }
        if let Some(command) = self.machine.handle(event) {
            self.execute(command);
        }
    }

    fn execute(&mut self, command: Command) {
        log::debug!("🏃 Executing {:?}", command);
        self.in_flight += 1;
        let tx = self.events_tx.clone();
        let timeout = self.request_timeout;

        match command {
            Command::ConnectSilently { epoch } => {
                let wallet = self.wallet.clone();
                tokio::spawn(async move {
                    let identity = bounded(timeout, "silent connect", async {
                        Ok(wallet.connect_silently().await)
                    })
                    .await
                    .unwrap_or_default();
                    let _ = tx.send(Event::SilentConnectFinished { epoch, identity });
                });
            }
            Command::ConnectExplicitly { epoch } => {
                let wallet = self.wallet.clone();
                tokio::spawn(async move {
                    let result = wallet.connect_explicitly().await;
                    let _ = tx.send(Event::ConnectFinished { epoch, result });
                });
            }
            Command::FetchAccount { epoch } => {
                let client = Arc::clone(&self.client);
                tokio::spawn(async move {
                    let anchor = client.anchor();
                    let result = bounded(timeout, "fetch account", client.fetch_account(anchor)).await;
                    let _ = tx.send(Event::AccountFetched { epoch, result });
                });
            }
            Command::InitializeAccount { epoch, owner } => {
                let client = Arc::clone(&self.client);
                tokio::spawn(async move {
                    let result =
                        bounded(timeout, "initialize account", client.initialize_account(owner)).await;
                    let _ = tx.send(Event::InitializeFinished { epoch, result });
                });
            }
            Command::AppendItem { epoch, owner, link } => {
                let client = Arc::clone(&self.client);
                tokio::spawn(async move {
                    let result =
                        bounded(timeout, "append item", client.append_item(owner, &link)).await;
                    let _ = tx.send(Event::SubmitFinished { epoch, result });
                });
            }
        }
    }
}

/// Run `fut` with an upper bound, mapping expiry to `Timeout`
async fn bounded<T, F>(limit: Duration, what: &str, fut: F) -> Result<T, PortalError>
where
    F: Future<Output = Result<T, PortalError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            log::error!("   ⏱️  {} timed out after {:?}", what, limit);
            Err(PortalError::Timeout(format!("{} exceeded {:?}", what, limit)))
        }
    }
}
