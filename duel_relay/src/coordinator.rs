// Match coordinator: owns the per-match state and drives the state machine.
//
// Phases: WaitingForPlayers → MatchActive → MatchEnded. The transition to
// MatchActive fires exactly once, when the second distinct endpoint
// registers, and broadcasts StartGame to both. MatchEnded is reached on a
// death notification or a game-over signal; ending broadcasts EndGame and
// resets the registry, so the next registration attempt begins a brand-new
// match at role 1.
//
// Locking discipline: ONE mutex guards the registry, the phase, and the
// per-role state snapshots together, so no caller can ever observe "full
// but not started". Every method computes its replies and an endpoint snapshot
// under the lock, releases it, and only then touches the socket through the
// dispatcher. The lock is never held across a blocking receive or a send.
//
// Two threads call in here: the receive loop (`register`) and the match
// worker (`handle_message`). See `server.rs` for how they are scheduled.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use duel_protocol::{ClientMessage, PlayerRole, PlayerState, ServerMessage, encode_server};
use log::{debug, info};

use crate::dispatch::Dispatcher;
use crate::session::{Registration, Registry};

/// Lifecycle phase of the current match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchPhase {
    /// Zero or one endpoints registered.
    WaitingForPlayers,
    /// Both slots filled, StartGame broadcast; in-match messages flow.
    MatchActive,
    /// Terminal: the registry has been reset; the next registration
    /// attempt returns to WaitingForPlayers.
    MatchEnded,
}

/// What a registration attempt produced, from the relay loop's perspective.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The endpoint holds a role; the match is not yet full.
    Waiting,
    /// This registration filled the match; StartGame has been broadcast.
    MatchStarted,
    /// Registry full and the endpoint unknown; no reply was sent.
    Rejected,
}

/// Whether an in-match message ended the match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    Continue,
    Ended,
}

/// Everything mutable about the current match, guarded as one unit.
struct MatchState {
    registry: Registry,
    phase: MatchPhase,
    states: BTreeMap<PlayerRole, PlayerState>,
    /// Set when a client acknowledges the start; duplicates are absorbed
    /// here instead of re-broadcasting.
    start_acked: bool,
}

/// Deferred side effect, computed under the lock and executed after release.
enum Action {
    None,
    Send(SocketAddr, Vec<u8>),
    Broadcast(Vec<u8>, Vec<SocketAddr>),
}

pub struct MatchCoordinator {
    state: Mutex<MatchState>,
    dispatcher: Dispatcher,
}

impl MatchCoordinator {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            state: Mutex::new(MatchState {
                registry: Registry::new(),
                phase: MatchPhase::WaitingForPlayers,
                states: BTreeMap::new(),
                start_acked: false,
            }),
            dispatcher,
        }
    }

    pub fn phase(&self) -> MatchPhase {
        self.lock().phase
    }

    pub fn is_active(&self) -> bool {
        self.phase() == MatchPhase::MatchActive
    }

    /// The last stored snapshot for a role, if any update has arrived.
    pub fn player_state(&self, role: PlayerRole) -> Option<PlayerState> {
        self.lock().states.get(&role).copied()
    }

    /// Registration path, driven by the receive loop. A new endpoint gets
    /// the welcome string and its role as two separate datagrams; a
    /// duplicate registration only gets the role again (the first reply may
    /// have been lost in transit); a third endpoint gets nothing at all.
    pub fn register(&self, endpoint: SocketAddr) -> RegisterOutcome {
        let mut replies: Vec<(SocketAddr, Vec<u8>)> = Vec::new();
        let mut start_endpoints: Option<Vec<SocketAddr>> = None;

        let outcome = {
            let mut state = self.lock();
            if state.phase == MatchPhase::MatchEnded {
                state.phase = MatchPhase::WaitingForPlayers;
            }
            match state.registry.register(endpoint) {
                Registration::New(role) => {
                    info!("registered {endpoint} as player {role}");
                    replies.push((endpoint, encode_server(&ServerMessage::Welcome)));
                    replies.push((endpoint, encode_server(&ServerMessage::RoleAssigned(role))));
                    if state.registry.is_full() && state.phase == MatchPhase::WaitingForPlayers {
                        state.phase = MatchPhase::MatchActive;
                        start_endpoints = Some(state.registry.endpoints());
                        info!("both players registered, match starting");
                        RegisterOutcome::MatchStarted
                    } else {
                        RegisterOutcome::Waiting
                    }
                }
                Registration::Existing(role) => {
                    replies.push((endpoint, encode_server(&ServerMessage::RoleAssigned(role))));
                    RegisterOutcome::Waiting
                }
                Registration::Rejected => {
                    debug!("rejected registration from {endpoint}: match is full");
                    RegisterOutcome::Rejected
                }
            }
        };

        for (target, frame) in replies {
            self.dispatcher.send_to(&frame, target);
        }
        if let Some(endpoints) = start_endpoints {
            self.dispatcher
                .broadcast(&encode_server(&ServerMessage::StartGame), &endpoints);
        }
        outcome
    }

    /// In-match processing, driven by the match worker. Updates are applied
    /// in arrival order and re-broadcast to BOTH endpoints, sender included
    /// (clients key effects off the authoritative echo). Anything that is
    /// not attributable to a registered, live participant is dropped.
    pub fn handle_message(&self, from: SocketAddr, message: ClientMessage) -> MatchOutcome {
        let mut outcome = MatchOutcome::Continue;

        let action = {
            let mut state = self.lock();
            if state.phase != MatchPhase::MatchActive {
                debug!("dropped in-match message from {from}: no active match");
                Action::None
            } else if let Some(sender_role) = state.registry.role_of(from) {
                match message {
                    ClientMessage::Update(update) => {
                        if state.registry.is_live(sender_role) {
                            state.states.insert(sender_role, update);
                            Action::Broadcast(
                                encode_server(&ServerMessage::State(update)),
                                state.registry.endpoints(),
                            )
                        } else {
                            debug!("dropped update for dead player {sender_role}");
                            Action::None
                        }
                    }
                    ClientMessage::Position { role, payload } => {
                        if state.registry.is_live(role) {
                            Action::Broadcast(
                                encode_server(&ServerMessage::Position { role, payload }),
                                state.registry.endpoints(),
                            )
                        } else {
                            debug!("dropped position for unknown or dead player {role}");
                            Action::None
                        }
                    }
                    ClientMessage::Flipped { role } => {
                        if state.registry.is_live(role) {
                            Action::Broadcast(
                                encode_server(&ServerMessage::Flipped { role }),
                                state.registry.endpoints(),
                            )
                        } else {
                            debug!("dropped flip for unknown or dead player {role}");
                            Action::None
                        }
                    }
                    ClientMessage::Dead { role } => {
                        if state.registry.is_live(role) {
                            state.registry.mark_dead(role);
                            info!("player {role} died, match over");
                            outcome = MatchOutcome::Ended;
                            Action::Broadcast(
                                encode_server(&ServerMessage::EndGame),
                                end_match(&mut state),
                            )
                        } else {
                            debug!("dropped death notice for unknown or dead player {role}");
                            Action::None
                        }
                    }
                    ClientMessage::GameOver => {
                        info!("match ended by game-over signal");
                        outcome = MatchOutcome::Ended;
                        Action::Broadcast(
                            encode_server(&ServerMessage::EndGame),
                            end_match(&mut state),
                        )
                    }
                    ClientMessage::GameStarted => {
                        // Duplicate start acks are absorbed, never re-broadcast.
                        state.start_acked = true;
                        Action::None
                    }
                    ClientMessage::Join => Action::Send(
                        from,
                        encode_server(&ServerMessage::RoleAssigned(sender_role)),
                    ),
                }
            } else {
                debug!("dropped message from unregistered endpoint {from}");
                Action::None
            }
        };

        match action {
            Action::None => {}
            Action::Send(target, frame) => self.dispatcher.send_to(&frame, target),
            Action::Broadcast(frame, endpoints) => {
                self.dispatcher.broadcast(&frame, &endpoints);
            }
        }
        outcome
    }

    fn lock(&self) -> MutexGuard<'_, MatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Tear down the match under the lock: snapshot the participants for the
/// EndGame broadcast, then reset everything. The registry reset happens
/// here and nowhere else.
fn end_match(state: &mut MatchState) -> Vec<SocketAddr> {
    let endpoints = state.registry.endpoints();
    state.registry.reset();
    state.states.clear();
    state.start_acked = false;
    state.phase = MatchPhase::MatchEnded;
    endpoints
}
