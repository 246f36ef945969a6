// Protocol messages for client-relay communication.
//
// Two enums define the full protocol vocabulary:
// - `ClientMessage`: sent by game clients to the relay.
// - `ServerMessage`: sent by the relay to game clients.
//
// `PlayerState` is the full per-player snapshot carried by the
// `PlayerUpdate` (inbound) and `PlayerState` (outbound) kinds. Position
// payloads stay opaque `String`s: the relay forwards them verbatim and
// never interprets the coordinates inside, which keeps this crate
// independent of any game-logic types.
//
// Wire encoding/decoding for both enums lives in `codec.rs`.

use crate::types::PlayerRole;

/// Full per-player snapshot. Replaced wholesale on every update; the relay
/// never merges fields or validates ranges (`health` included; that is a
/// client concern).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerState {
    pub x: f32,
    pub y: f32,
    pub attacking: bool,
    pub hit: bool,
    pub health: i32,
    pub rolling: bool,
}

/// Messages sent by a client to the relay.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientMessage {
    /// Registration probe from an endpoint that wants a role.
    Join,
    /// Position update for one role; payload is opaque and forwarded verbatim.
    Position { role: PlayerRole, payload: String },
    /// Sprite-flip event for one role; forwarded verbatim.
    Flipped { role: PlayerRole },
    /// Full-state update attributed to the sending endpoint's role.
    Update(PlayerState),
    /// The named role died; ends the match.
    Dead { role: PlayerRole },
    /// Idempotent acknowledgment that the client saw the match start.
    GameStarted,
    /// Client-driven end-of-match signal (e.g. round timer expiry).
    GameOver,
}

/// Messages sent by the relay to a client.
#[derive(Clone, Debug, PartialEq)]
pub enum ServerMessage {
    /// Plain-text greeting sent to a newly registered endpoint.
    Welcome,
    /// Role assignment, sent as a bare digit.
    RoleAssigned(PlayerRole),
    /// Both slots are filled and the match begins.
    StartGame,
    /// The match is over (death or game-over signal).
    EndGame,
    /// Rebroadcast of a full-state update, to both participants.
    State(PlayerState),
    /// Forwarded position update.
    Position { role: PlayerRole, payload: String },
    /// Forwarded flip event.
    Flipped { role: PlayerRole },
}
