// duel_protocol: wire protocol for the duel match relay.
//
// This crate defines the message types and pipe-delimited text codec used by
// the relay (`duel_relay`) and game clients to communicate over UDP. It is
// shared between both sides and has no I/O of its own.
//
// Module overview:
// - `types.rs`:   `PlayerRole`, the two participant slots.
// - `message.rs`: Client-to-relay and relay-to-client message enums, plus
//                 the `PlayerState` snapshot struct.
// - `codec.rs`:   `|`-delimited ASCII framing: decode/encode for both
//                 directions, `DecodeError`, datagram size cap.
//
// Design decisions:
// - **Delimited text frames.** The deployed game clients speak this format;
//   one datagram is one frame, the first field is the kind.
// - **Purely syntactic decoding.** The codec checks field counts and the
//   required numeric fields, nothing more. Position payloads stay opaque
//   strings so the crate never depends on game-logic types.
// - **No async runtime.** Frames are plain `Vec<u8>`/`&[u8]`, compatible
//   with any transport that moves whole datagrams.

pub mod codec;
pub mod message;
pub mod types;

pub use codec::{
    DecodeError, DELIMITER, MAX_DATAGRAM_SIZE, WELCOME_TEXT, decode_client, decode_server,
    encode_client, encode_server,
};
pub use message::{ClientMessage, PlayerState, ServerMessage};
pub use types::PlayerRole;
