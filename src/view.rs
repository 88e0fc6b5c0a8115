//! Render model for the portal page.
//!
//! A pure function of the state machine; whatever front end draws the page
//! only has to map a [`View`] onto widgets.

use std::fmt;

use crate::machine::{CollectionState, CollectionStateMachine};

pub const TITLE: &str = "🖼 GIF Portal";
pub const SUBTITLE: &str = "View your GIF collection in the metaverse ✨";

/// Main panel contents
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Panel {
    /// No wallet injected
    InstallWallet,
    /// "Connect Wallet" button, disabled while the prompt is open
    ConnectWallet { connecting: bool },
    /// Connected, waiting for the first account read
    Loading,
    /// One-time initialization button
    Initialize { in_progress: bool },
    /// Link form plus the gallery
    Gallery {
        links: Vec<String>,
        draft: String,
        /// Submit affordance; only when the account is known initialized
        submit_enabled: bool,
        submitting: bool,
        refreshing: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct View {
    /// Connected wallet address, if any
    pub wallet: Option<String>,
    pub panel: Panel,
    /// Transient message for the latest failure
    pub notice: Option<String>,
}

pub fn render(machine: &CollectionStateMachine) -> View {
    let state = machine.state();
    let panel = match state {
        CollectionState::Disconnected if !machine.capability_present() => Panel::InstallWallet,
        CollectionState::Disconnected => Panel::ConnectWallet { connecting: false },
        CollectionState::Connecting => Panel::ConnectWallet { connecting: true },
        CollectionState::Connected { .. } => Panel::Loading,
        CollectionState::CheckingAccount { previous: None, .. } => Panel::Loading,
        CollectionState::NeedsInit { .. } => Panel::Initialize { in_progress: false },
        CollectionState::Initializing { .. } => Panel::Initialize { in_progress: true },
        CollectionState::CheckingAccount { .. }
        | CollectionState::Ready { .. }
        | CollectionState::Submitting { .. } => Panel::Gallery {
            links: state
                .items()
                .unwrap_or_default()
                .iter()
                .map(|item| item.link.clone())
                .collect(),
            draft: match state {
                CollectionState::Submitting { draft, .. } => draft.clone(),
                _ => machine.draft().to_string(),
            },
            submit_enabled: machine.can_submit(),
            submitting: matches!(state, CollectionState::Submitting { .. }),
            refreshing: matches!(state, CollectionState::CheckingAccount { .. }),
        },
    };

    View {
        wallet: state.identity().map(|identity| identity.to_string()),
        panel,
        notice: machine.notice().map(ToString::to_string),
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", TITLE)?;
        writeln!(f, "{}", SUBTITLE)?;
        if let Some(wallet) = &self.wallet {
            writeln!(f, "Wallet: {}", wallet)?;
        }

        match &self.panel {
            Panel::InstallWallet => writeln!(f, "No Solana wallet found. Get a Phantom wallet")?,
            Panel::ConnectWallet { connecting: false } => writeln!(f, "[Connect Wallet]")?,
            Panel::ConnectWallet { connecting: true } => writeln!(f, "[Connecting...]")?,
            Panel::Loading => writeln!(f, "Loading collection...")?,
            Panel::Initialize { in_progress: false } => {
                writeln!(f, "[Do One-Time Initialization For GIF Program Account]")?
            }
            Panel::Initialize { in_progress: true } => writeln!(f, "Initializing account...")?,
            Panel::Gallery {
                links,
                draft,
                submit_enabled,
                submitting,
                refreshing,
            } => {
                let placeholder = if draft.is_empty() { "Enter gif link!" } else { draft.as_str() };
                let button = if *submitting {
                    "Submitting..."
                } else if *submit_enabled {
                    "Submit"
                } else {
                    "Submit (disabled)"
                };
                writeln!(f, "> {} [{}]", placeholder, button)?;
                if *refreshing {
                    writeln!(f, "(refreshing)")?;
                }
                for (index, link) in links.iter().enumerate() {
                    writeln!(f, "  {}. {}", index + 1, link)?;
                }
            }
        }

        if let Some(notice) = &self.notice {
            writeln!(f, "! {}", notice)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Event;
    use crate::{Address, Item, RemoteAccount, WalletIdentity};

    #[test]
    fn test_install_notice_without_wallet() {
        let mut machine = CollectionStateMachine::new();
        machine.handle(Event::Mounted { capability_present: false });

        let view = render(&machine);
        assert_eq!(view.panel, Panel::InstallWallet);
        assert_eq!(view.wallet, None);
        assert!(view.notice.is_some());
    }

    #[test]
    fn test_gallery_lists_links_in_order() {
        let identity = WalletIdentity::new(Address::new([5; 32]));
        let mut machine = CollectionStateMachine::new();
        machine.handle(Event::Mounted { capability_present: true });
        machine.handle(Event::SilentConnectFinished {
            epoch: machine.epoch(),
            identity: Some(identity),
        });
        let items = ["https://a/1.gif", "https://b/2.gif"]
            .iter()
            .map(|link| Item {
                link: link.to_string(),
                submitted_by: *identity.address(),
            })
            .collect();
        machine.handle(Event::AccountFetched {
            epoch: machine.epoch(),
            result: Ok(RemoteAccount {
                total_items: 2,
                items,
            }),
        });

        let view = render(&machine);
        match &view.panel {
            Panel::Gallery {
                links,
                submit_enabled,
                ..
            } => {
                assert_eq!(links, &vec!["https://a/1.gif".to_string(), "https://b/2.gif".to_string()]);
                assert!(*submit_enabled);
            }
            other => panic!("expected gallery, got {:?}", other),
        }
        assert!(view.to_string().contains("2. https://b/2.gif"));
    }
}
