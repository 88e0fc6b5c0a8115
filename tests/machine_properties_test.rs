//! Randomized event sequences against the collection state machine
//!
//! Feeds seeded random mixes of user intents, wallet results and (possibly
//! stale) remote results straight into the machine and checks the
//! invariants after every step.

use gif_portal::{
    render, Address, CollectionState, CollectionStateMachine, Command, Event, Item, Panel,
    PortalError, RemoteAccount, WalletIdentity,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn identity(n: u8) -> WalletIdentity {
    WalletIdentity::new(Address::new([n; 32]))
}

fn account(len: usize) -> RemoteAccount {
    RemoteAccount {
        total_items: len as u64,
        items: (0..len)
            .map(|i| Item {
                link: format!("https://media.example/{}.gif", i),
                submitted_by: *identity(1).address(),
            })
            .collect(),
    }
}

fn remote_error(rng: &mut StdRng) -> PortalError {
    match rng.gen_range(0..4) {
        0 => PortalError::network("connection refused"),
        1 => PortalError::Timeout("confirmation".to_string()),
        2 => PortalError::AccountNotFound("anchor".to_string()),
        _ => PortalError::AlreadyInitialized("anchor".to_string()),
    }
}

/// Random event; completion epochs are current or one behind
fn random_event(rng: &mut StdRng, machine: &CollectionStateMachine) -> Event {
    let epoch = machine.epoch().saturating_sub(rng.gen_range(0..2));
    match rng.gen_range(0..12) {
        0 => Event::ConnectRequested,
        1 => Event::ConnectFinished {
            epoch,
            result: if rng.gen_bool(0.7) {
                Ok(identity(rng.gen_range(1..4)))
            } else {
                Err(PortalError::UserRejected("User rejected the request.".to_string()))
            },
        },
        2 => Event::SilentConnectFinished {
            epoch,
            identity: rng.gen_bool(0.5).then(|| identity(rng.gen_range(1..4))),
        },
        3 => Event::DisconnectRequested,
        4 => Event::RefreshRequested,
        5 => Event::AccountFetched {
            epoch,
            result: if rng.gen_bool(0.6) {
                Ok(account(rng.gen_range(0..5)))
            } else {
                Err(remote_error(rng))
            },
        },
        6 => Event::InitializeRequested,
        7 => Event::InitializeFinished {
            epoch,
            result: if rng.gen_bool(0.6) { Ok(()) } else { Err(remote_error(rng)) },
        },
        8 => Event::DraftChanged(if rng.gen_bool(0.3) {
            "   ".to_string()
        } else {
            "https://x/y.gif".to_string()
        }),
        9 | 10 => Event::SubmitRequested,
        _ => Event::SubmitFinished {
            epoch,
            result: if rng.gen_bool(0.6) { Ok(()) } else { Err(remote_error(rng)) },
        },
    }
}

fn is_remote(command: &Option<Command>) -> bool {
    matches!(
        command,
        Some(Command::FetchAccount { .. })
            | Some(Command::InitializeAccount { .. })
            | Some(Command::AppendItem { .. })
    )
}

#[test]
fn test_invariants_hold_over_random_sequences() {
    for seed in 0..200u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut machine = CollectionStateMachine::new();
        machine.handle(Event::Mounted {
            capability_present: true,
        });

        for step in 0..200 {
            let event = random_event(&mut rng, &machine);
            let was_busy = machine.state().is_busy();
            let is_completion = event.is_completion();
            let is_disconnect = matches!(event, Event::DisconnectRequested);
            let described = format!("{:?}", event);

            let command = machine.handle(event);
            let state = machine.state();
            let context = format!("seed {} step {} after {}", seed, step, described);

            // Submit affordance only with identity and a known-initialized account
            if machine.can_submit() {
                assert!(matches!(state, CollectionState::Ready { .. }), "{}", context);
                assert!(state.identity().is_some(), "{}", context);
            }
            if matches!(state, CollectionState::Disconnected | CollectionState::Connecting) {
                let view = render(&machine);
                assert_eq!(view.wallet, None, "{}", context);
                assert!(!matches!(view.panel, Panel::Gallery { .. }), "{}", context);
            }
            if is_disconnect {
                assert_eq!(state, &CollectionState::Disconnected, "{}", context);
                assert_eq!(command, None, "{}", context);
            }

            // A user intent never starts a second remote operation
            if was_busy && !is_completion {
                assert!(!is_remote(&command), "{}", context);
            }

            // Remote commands always carry the current epoch and an identity-bearing state
            if is_remote(&command) {
                assert!(state.is_busy(), "{}", context);
                assert!(state.identity().is_some(), "{}", context);
                let epoch = match &command {
                    Some(Command::FetchAccount { epoch })
                    | Some(Command::InitializeAccount { epoch, .. })
                    | Some(Command::AppendItem { epoch, .. }) => *epoch,
                    _ => unreachable!(),
                };
                assert_eq!(epoch, machine.epoch(), "{}", context);
            }
        }
    }
}

#[test]
fn test_stale_results_never_change_state() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut machine = CollectionStateMachine::new();
    machine.handle(Event::Mounted {
        capability_present: true,
    });
    machine.handle(Event::SilentConnectFinished {
        epoch: machine.epoch(),
        identity: Some(identity(1)),
    });
    let stale = machine.epoch();
    machine.handle(Event::DisconnectRequested);
    machine.handle(Event::SilentConnectFinished {
        epoch: machine.epoch(),
        identity: Some(identity(2)),
    });

    let before = machine.state().clone();
    for _ in 0..50 {
        let event = match rng.gen_range(0..3) {
            0 => Event::AccountFetched {
                epoch: stale,
                result: Ok(account(3)),
            },
            1 => Event::InitializeFinished {
                epoch: stale,
                result: Ok(()),
            },
            _ => Event::SubmitFinished {
                epoch: stale,
                result: Ok(()),
            },
        };
        assert_eq!(machine.handle(event), None);
        assert_eq!(machine.state(), &before);
    }
}
