// Pipe-delimited ASCII codec for the duel wire protocol.
//
// Every datagram is a single newline-free text frame: fields separated by
// `|`, with the first field selecting the message kind from a closed set.
// Decoding is purely syntactic: field count and the numeric fields are
// checked, nothing else. The flag fields (`attacking`, `hit`, `rolling`)
// follow the original wire rule: the literal `1` is true, any other token is
// false, so they can never fail to decode. `x`, `y` and `health` are
// required numerics; failing to parse one is `DecodeError::MalformedField`.
//
// Both directions are covered: `decode_client`/`encode_client` for messages
// a game client sends, `decode_server`/`encode_server` for relay replies and
// broadcasts. The relay only decodes client frames and encodes server
// frames; the client half of each pair exists for `NetClient` and tests.
//
// Numeric formatting uses Rust's shortest-round-trip float display, so any
// `f32` value survives encode-then-decode exactly.

use crate::message::{ClientMessage, PlayerState, ServerMessage};
use crate::types::PlayerRole;

/// Field separator for all framed messages.
pub const DELIMITER: char = '|';

/// Largest datagram the relay reads or writes. Matches the receive buffer
/// of the deployed clients; anything longer is truncated by the transport.
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// Greeting sent to a newly registered endpoint.
pub const WELCOME_TEXT: &str = "Welcome to the game server!";

/// Why a datagram failed to decode. All variants are non-fatal: the caller
/// drops the datagram and keeps serving.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("datagram is not UTF-8 text")]
    NotText,
    #[error("empty datagram")]
    Empty,
    #[error("unrecognized message kind")]
    UnknownKind,
    #[error("{kind} expects {expected} fields, found {found}")]
    WrongFieldCount {
        kind: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{kind} field `{field}` does not parse as a number")]
    MalformedField {
        kind: &'static str,
        field: &'static str,
    },
}

/// Decode a datagram sent by a game client.
pub fn decode_client(raw: &[u8]) -> Result<ClientMessage, DecodeError> {
    let fields = split_frame(raw)?;
    match fields[0] {
        "Join" => {
            expect_fields("Join", &fields, 1)?;
            Ok(ClientMessage::Join)
        }
        "Player1Position" => Ok(ClientMessage::Position {
            role: PlayerRole::One,
            payload: position_payload("Player1Position", &fields)?,
        }),
        "Player2Position" => Ok(ClientMessage::Position {
            role: PlayerRole::Two,
            payload: position_payload("Player2Position", &fields)?,
        }),
        "Player1Flipped" => {
            expect_fields("Player1Flipped", &fields, 1)?;
            Ok(ClientMessage::Flipped {
                role: PlayerRole::One,
            })
        }
        "Player2Flipped" => {
            expect_fields("Player2Flipped", &fields, 1)?;
            Ok(ClientMessage::Flipped {
                role: PlayerRole::Two,
            })
        }
        "PlayerUpdate" => {
            expect_fields("PlayerUpdate", &fields, 7)?;
            Ok(ClientMessage::Update(decode_state("PlayerUpdate", &fields)?))
        }
        "Player1Dead" => {
            expect_fields("Player1Dead", &fields, 1)?;
            Ok(ClientMessage::Dead {
                role: PlayerRole::One,
            })
        }
        "Player2Dead" => {
            expect_fields("Player2Dead", &fields, 1)?;
            Ok(ClientMessage::Dead {
                role: PlayerRole::Two,
            })
        }
        "GameStarted" => {
            expect_fields("GameStarted", &fields, 1)?;
            Ok(ClientMessage::GameStarted)
        }
        "GameOver" => {
            expect_fields("GameOver", &fields, 1)?;
            Ok(ClientMessage::GameOver)
        }
        _ => Err(DecodeError::UnknownKind),
    }
}

/// Encode a client message to its wire frame.
pub fn encode_client(msg: &ClientMessage) -> Vec<u8> {
    match msg {
        ClientMessage::Join => "Join".into(),
        ClientMessage::Position { role, payload } => {
            format!("Player{role}Position{DELIMITER}{payload}")
        }
        ClientMessage::Flipped { role } => format!("Player{role}Flipped"),
        ClientMessage::Update(state) => encode_state("PlayerUpdate", state),
        ClientMessage::Dead { role } => format!("Player{role}Dead"),
        ClientMessage::GameStarted => "GameStarted".into(),
        ClientMessage::GameOver => "GameOver".into(),
    }
    .into_bytes()
}

/// Decode a datagram sent by the relay.
pub fn decode_server(raw: &[u8]) -> Result<ServerMessage, DecodeError> {
    let fields = split_frame(raw)?;
    match fields[0] {
        WELCOME_TEXT => Ok(ServerMessage::Welcome),
        "1" => Ok(ServerMessage::RoleAssigned(PlayerRole::One)),
        "2" => Ok(ServerMessage::RoleAssigned(PlayerRole::Two)),
        "StartGame" => Ok(ServerMessage::StartGame),
        "EndGame" => Ok(ServerMessage::EndGame),
        "PlayerState" => {
            expect_fields("PlayerState", &fields, 7)?;
            Ok(ServerMessage::State(decode_state("PlayerState", &fields)?))
        }
        "Player1Position" => Ok(ServerMessage::Position {
            role: PlayerRole::One,
            payload: position_payload("Player1Position", &fields)?,
        }),
        "Player2Position" => Ok(ServerMessage::Position {
            role: PlayerRole::Two,
            payload: position_payload("Player2Position", &fields)?,
        }),
        "Player1Flipped" => {
            expect_fields("Player1Flipped", &fields, 1)?;
            Ok(ServerMessage::Flipped {
                role: PlayerRole::One,
            })
        }
        "Player2Flipped" => {
            expect_fields("Player2Flipped", &fields, 1)?;
            Ok(ServerMessage::Flipped {
                role: PlayerRole::Two,
            })
        }
        _ => Err(DecodeError::UnknownKind),
    }
}

/// Encode a server message to its wire frame.
pub fn encode_server(msg: &ServerMessage) -> Vec<u8> {
    match msg {
        ServerMessage::Welcome => WELCOME_TEXT.into(),
        ServerMessage::RoleAssigned(role) => role.to_string(),
        ServerMessage::StartGame => "StartGame".into(),
        ServerMessage::EndGame => "EndGame".into(),
        ServerMessage::State(state) => encode_state("PlayerState", state),
        ServerMessage::Position { role, payload } => {
            format!("Player{role}Position{DELIMITER}{payload}")
        }
        ServerMessage::Flipped { role } => format!("Player{role}Flipped"),
    }
    .into_bytes()
}

/// Validate the frame as non-empty text and split it on the delimiter.
fn split_frame(raw: &[u8]) -> Result<Vec<&str>, DecodeError> {
    let text = std::str::from_utf8(raw).map_err(|_| DecodeError::NotText)?;
    if text.is_empty() {
        return Err(DecodeError::Empty);
    }
    Ok(text.split(DELIMITER).collect())
}

fn expect_fields(
    kind: &'static str,
    fields: &[&str],
    expected: usize,
) -> Result<(), DecodeError> {
    if fields.len() == expected {
        Ok(())
    } else {
        Err(DecodeError::WrongFieldCount {
            kind,
            expected,
            found: fields.len(),
        })
    }
}

fn position_payload(kind: &'static str, fields: &[&str]) -> Result<String, DecodeError> {
    expect_fields(kind, fields, 2)?;
    Ok(fields[1].to_string())
}

/// Shared field layout of `PlayerUpdate` (inbound) and `PlayerState`
/// (outbound): kind, x, y, attacking, hit, health, rolling.
fn decode_state(kind: &'static str, fields: &[&str]) -> Result<PlayerState, DecodeError> {
    Ok(PlayerState {
        x: parse_f32(kind, "x", fields[1])?,
        y: parse_f32(kind, "y", fields[2])?,
        attacking: fields[3] == "1",
        hit: fields[4] == "1",
        health: parse_i32(kind, "health", fields[5])?,
        rolling: fields[6] == "1",
    })
}

fn encode_state(kind: &str, state: &PlayerState) -> String {
    format!(
        "{kind}{d}{x}{d}{y}{d}{attacking}{d}{hit}{d}{health}{d}{rolling}",
        d = DELIMITER,
        x = state.x,
        y = state.y,
        attacking = flag(state.attacking),
        hit = flag(state.hit),
        health = state.health,
        rolling = flag(state.rolling),
    )
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

fn parse_f32(kind: &'static str, field: &'static str, token: &str) -> Result<f32, DecodeError> {
    token
        .parse()
        .map_err(|_| DecodeError::MalformedField { kind, field })
}

fn parse_i32(kind: &'static str, field: &'static str, token: &str) -> Result<i32, DecodeError> {
    token
        .parse()
        .map_err(|_| DecodeError::MalformedField { kind, field })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_full_update() {
        let msg = decode_client(b"PlayerUpdate|1.5|-2.25|1|0|87|1").unwrap();
        assert_eq!(
            msg,
            ClientMessage::Update(PlayerState {
                x: 1.5,
                y: -2.25,
                attacking: true,
                hit: false,
                health: 87,
                rolling: true,
            })
        );
    }

    #[test]
    fn flag_fields_never_fail_to_decode() {
        // Anything that isn't the literal `1` is false, including garbage.
        let msg = decode_client(b"PlayerUpdate|0|0|yes|2|100|off").unwrap();
        match msg {
            ClientMessage::Update(state) => {
                assert!(!state.attacking);
                assert!(!state.hit);
                assert!(!state.rolling);
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn malformed_required_numeric_field() {
        let err = decode_client(b"PlayerUpdate|abc|2.0|0|0|100|0").unwrap_err();
        assert_eq!(
            err,
            DecodeError::MalformedField {
                kind: "PlayerUpdate",
                field: "x",
            }
        );

        let err = decode_client(b"PlayerUpdate|1.0|2.0|0|0|full|0").unwrap_err();
        assert_eq!(
            err,
            DecodeError::MalformedField {
                kind: "PlayerUpdate",
                field: "health",
            }
        );
    }

    #[test]
    fn wrong_field_count() {
        let err = decode_client(b"PlayerUpdate|1.0|2.0|0|0|100").unwrap_err();
        assert_eq!(
            err,
            DecodeError::WrongFieldCount {
                kind: "PlayerUpdate",
                expected: 7,
                found: 6,
            }
        );

        // A bare position kind with no payload field is also malformed.
        let err = decode_client(b"Player1Position").unwrap_err();
        assert!(matches!(err, DecodeError::WrongFieldCount { .. }));
    }

    #[test]
    fn unknown_kind() {
        assert_eq!(decode_client(b"Teleport|1|2"), Err(DecodeError::UnknownKind));
        assert_eq!(decode_client(b"playerupdate|1|2|0|0|1|0"), Err(DecodeError::UnknownKind));
    }

    #[test]
    fn rejects_non_text_and_empty() {
        assert_eq!(decode_client(&[0xFF, 0xFE, 0x80]), Err(DecodeError::NotText));
        assert_eq!(decode_client(b""), Err(DecodeError::Empty));
    }

    #[test]
    fn position_payload_is_opaque() {
        // The payload is never parsed, so non-numeric content is fine.
        let msg = decode_client(b"Player2Position|x:3.5;y:9.0").unwrap();
        assert_eq!(
            msg,
            ClientMessage::Position {
                role: PlayerRole::Two,
                payload: "x:3.5;y:9.0".into(),
            }
        );
    }

    #[test]
    fn lifecycle_kinds() {
        assert_eq!(decode_client(b"Join").unwrap(), ClientMessage::Join);
        assert_eq!(
            decode_client(b"Player1Dead").unwrap(),
            ClientMessage::Dead {
                role: PlayerRole::One
            }
        );
        assert_eq!(decode_client(b"GameStarted").unwrap(), ClientMessage::GameStarted);
        assert_eq!(decode_client(b"GameOver").unwrap(), ClientMessage::GameOver);
        // Trailing fields on a bare kind are malformed, not silently dropped.
        assert!(matches!(
            decode_client(b"GameOver|now"),
            Err(DecodeError::WrongFieldCount { .. })
        ));
    }

    #[test]
    fn server_frames_decode() {
        assert_eq!(
            decode_server(WELCOME_TEXT.as_bytes()).unwrap(),
            ServerMessage::Welcome
        );
        assert_eq!(
            decode_server(b"2").unwrap(),
            ServerMessage::RoleAssigned(PlayerRole::Two)
        );
        assert_eq!(decode_server(b"StartGame").unwrap(), ServerMessage::StartGame);
        assert_eq!(decode_server(b"EndGame").unwrap(), ServerMessage::EndGame);
    }

    #[test]
    fn state_rebroadcast_uses_player_state_kind() {
        let state = PlayerState {
            x: 1.0,
            y: 2.0,
            attacking: false,
            hit: false,
            health: 100,
            rolling: false,
        };
        let frame = encode_server(&ServerMessage::State(state));
        assert_eq!(frame, b"PlayerState|1|2|0|0|100|0");
        assert_eq!(decode_server(&frame).unwrap(), ServerMessage::State(state));
    }

    #[test]
    fn extreme_floats_survive_the_codec() {
        for value in [f32::MAX, f32::MIN, f32::MIN_POSITIVE, -0.0, 1.0e-40] {
            let state = PlayerState {
                x: value,
                y: -value,
                attacking: true,
                hit: true,
                health: i32::MIN,
                rolling: true,
            };
            let frame = encode_server(&ServerMessage::State(state));
            match decode_server(&frame).unwrap() {
                ServerMessage::State(back) => {
                    assert_eq!(back.x.to_bits(), state.x.to_bits());
                    assert_eq!(back.y.to_bits(), state.y.to_bits());
                    assert_eq!(back.health, state.health);
                }
                other => panic!("expected State, got {other:?}"),
            }
        }
    }

    #[test]
    fn forwarded_frames_roundtrip() {
        let msg = ClientMessage::Position {
            role: PlayerRole::One,
            payload: "3.5|9.0".into(),
        };
        // A position payload containing the delimiter splits into too many
        // fields; the deployed clients send a single opaque token.
        assert!(matches!(
            decode_client(&encode_client(&msg)),
            Err(DecodeError::WrongFieldCount { .. })
        ));

        let msg = ClientMessage::Position {
            role: PlayerRole::One,
            payload: "3.5,9.0".into(),
        };
        assert_eq!(decode_client(&encode_client(&msg)).unwrap(), msg);

        let flip = ClientMessage::Flipped {
            role: PlayerRole::Two,
        };
        assert_eq!(encode_client(&flip), b"Player2Flipped");
    }
}
