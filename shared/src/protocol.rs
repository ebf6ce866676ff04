//! Binary command protocol spoken on both socket routes.
//!
//! Every frame is a one-byte command type followed by a type-specific
//! payload. Multi-byte integers are little-endian.
//!
//! | type | command  | payload                                                   |
//! |------|----------|-----------------------------------------------------------|
//! | 0    | Register | empty, or a 36-byte ASCII client id                       |
//! | 1    | Error    | empty                                                     |
//! | 2    | Update   | `x: u16, y: u16`                                          |
//! | 3    | Start    | empty, or `player_num: u8`                                |
//! | 4    | State    | `puck_x: i16, puck_y: i16`, then 4 × `x: u16, y: u16, score: u8, active: u8, player_num: u8` |

use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub const REGISTER: u8 = 0;
pub const ERROR: u8 = 1;
pub const UPDATE: u8 = 2;
pub const START: u8 = 3;
pub const STATE: u8 = 4;

/// Length of a client identifier on the wire.
pub const CLIENT_ID_LEN: usize = 36;

const UPDATE_LEN: usize = 4;
const PLAYER_STATE_LEN: usize = 7;
const STATE_LEN: usize = 4 + 4 * PLAYER_STATE_LEN;

/// Failure to decode an inbound frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty frame")]
    Empty,
    #[error("command {kind} needs {expected} payload bytes, got {actual}")]
    Truncated {
        kind: u8,
        expected: usize,
        actual: usize,
    },
    #[error("unknown command {kind} with {len} payload bytes")]
    UnknownCommand { kind: u8, len: usize },
    #[error("client id must be {CLIENT_ID_LEN} ASCII bytes")]
    InvalidClientId,
}

/// Identifier handed to a client on registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    /// A fresh hyphenated UUID v4.
    pub fn random() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        Self::from_bytes(raw.as_bytes())
    }

    fn from_bytes(raw: &[u8]) -> Result<Self, ProtocolError> {
        if raw.len() != CLIENT_ID_LEN || !raw.is_ascii() {
            return Err(ProtocolError::InvalidClientId);
        }
        std::str::from_utf8(raw)
            .map(|s| Self(s.to_owned()))
            .map_err(|_| ProtocolError::InvalidClientId)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One player's entry in a state snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerState {
    pub x: u16,
    pub y: u16,
    pub score: u8,
    pub active: u8,
    pub player_num: u8,
}

/// Snapshot of one session as broadcast on state sockets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatePacket {
    pub puck_x: i16,
    pub puck_y: i16,
    pub players: [PlayerState; 4],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Registration request (no id) or response (issued id). State sockets
    /// also open with a Register carrying their id.
    Register { id: Option<ClientId> },
    Error,
    Update { x: u16, y: u16 },
    Start { player_num: Option<u8> },
    State(StatePacket),
    /// An unassigned command type with no payload.
    Unknown(u8),
}

impl Command {
    pub fn kind(&self) -> u8 {
        match self {
            Command::Register { .. } => REGISTER,
            Command::Error => ERROR,
            Command::Update { .. } => UPDATE,
            Command::Start { .. } => START,
            Command::State(_) => STATE,
            Command::Unknown(kind) => *kind,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + STATE_LEN);
        buf.put_u8(self.kind());
        match self {
            Command::Register { id: Some(id) } => buf.put_slice(id.as_str().as_bytes()),
            Command::Register { id: None } | Command::Error | Command::Unknown(_) => {}
            Command::Update { x, y } => {
                buf.put_u16_le(*x);
                buf.put_u16_le(*y);
            }
            Command::Start { player_num } => {
                if let Some(num) = player_num {
                    buf.put_u8(*num);
                }
            }
            Command::State(state) => {
                buf.put_i16_le(state.puck_x);
                buf.put_i16_le(state.puck_y);
                for player in &state.players {
                    buf.put_u16_le(player.x);
                    buf.put_u16_le(player.y);
                    buf.put_u8(player.score);
                    buf.put_u8(player.active);
                    buf.put_u8(player.player_num);
                }
            }
        }
        buf
    }

    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let (&kind, mut payload) = frame.split_first().ok_or(ProtocolError::Empty)?;
        let len = payload.len();
        let require = |expected: usize| {
            if len < expected {
                Err(ProtocolError::Truncated {
                    kind,
                    expected,
                    actual: len,
                })
            } else {
                Ok(())
            }
        };

        match kind {
            REGISTER => {
                if len == 0 {
                    return Ok(Command::Register { id: None });
                }
                require(CLIENT_ID_LEN)?;
                let id = ClientId::from_bytes(&payload[..CLIENT_ID_LEN])?;
                Ok(Command::Register { id: Some(id) })
            }
            ERROR => Ok(Command::Error),
            UPDATE => {
                require(UPDATE_LEN)?;
                Ok(Command::Update {
                    x: payload.get_u16_le(),
                    y: payload.get_u16_le(),
                })
            }
            START => Ok(Command::Start {
                player_num: payload.first().copied(),
            }),
            STATE => {
                require(STATE_LEN)?;
                let puck_x = payload.get_i16_le();
                let puck_y = payload.get_i16_le();
                let mut players = [PlayerState::default(); 4];
                for player in &mut players {
                    *player = PlayerState {
                        x: payload.get_u16_le(),
                        y: payload.get_u16_le(),
                        score: payload.get_u8(),
                        active: payload.get_u8(),
                        player_num: payload.get_u8(),
                    };
                }
                Ok(Command::State(StatePacket {
                    puck_x,
                    puck_y,
                    players,
                }))
            }
            _ if len == 0 => Ok(Command::Unknown(kind)),
            _ => Err(ProtocolError::UnknownCommand { kind, len }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> StatePacket {
        let mut players = [PlayerState::default(); 4];
        for (num, player) in players.iter_mut().enumerate() {
            *player = PlayerState {
                x: 100 * num as u16,
                y: 900 - 10 * num as u16,
                score: num as u8 * 3,
                active: (num % 2) as u8,
                player_num: num as u8,
            };
        }
        StatePacket {
            puck_x: -50,
            puck_y: 1050,
            players,
        }
    }

    #[test]
    fn test_roundtrip_commands() {
        let commands = vec![
            Command::Register { id: None },
            Command::Register {
                id: Some(ClientId::random()),
            },
            Command::Error,
            Command::Update { x: 500, y: 65535 },
            Command::Start { player_num: None },
            Command::Start {
                player_num: Some(2),
            },
            Command::State(sample_state()),
        ];

        for command in commands {
            let decoded = Command::decode(&command.encode()).unwrap();
            assert_eq!(decoded, command);
        }
    }

    #[test]
    fn test_update_layout_is_little_endian() {
        let frame = Command::Update { x: 0x0102, y: 0x0304 }.encode();
        assert_eq!(frame, vec![UPDATE, 0x02, 0x01, 0x04, 0x03]);
    }

    #[test]
    fn test_state_layout() {
        let frame = Command::State(sample_state()).encode();
        assert_eq!(frame.len(), 1 + STATE_LEN);
        assert_eq!(frame[0], STATE);
        assert_eq!(&frame[1..3], &(-50i16).to_le_bytes());
        assert_eq!(&frame[3..5], &1050i16.to_le_bytes());
        // Second player starts after the puck and one player entry.
        assert_eq!(&frame[12..14], &100u16.to_le_bytes());
        assert_eq!(frame[18], 1);
    }

    #[test]
    fn test_register_response_is_fixed_length() {
        let frame = Command::Register {
            id: Some(ClientId::random()),
        }
        .encode();
        assert_eq!(frame.len(), 1 + CLIENT_ID_LEN);
    }

    #[test]
    fn test_register_placeholder_from_browser_client() {
        let mut frame = vec![REGISTER];
        frame.extend_from_slice("_".repeat(CLIENT_ID_LEN).as_bytes());
        match Command::decode(&frame).unwrap() {
            Command::Register { id: Some(id) } => assert_eq!(id.as_str().len(), CLIENT_ID_LEN),
            other => panic!("Unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_decode_empty_frame() {
        assert_eq!(Command::decode(&[]), Err(ProtocolError::Empty));
    }

    #[test]
    fn test_decode_truncated_update() {
        assert_eq!(
            Command::decode(&[UPDATE, 1, 2, 3]),
            Err(ProtocolError::Truncated {
                kind: UPDATE,
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_decode_truncated_state() {
        let frame = Command::State(sample_state()).encode();
        let result = Command::decode(&frame[..frame.len() - 1]);
        assert!(matches!(result, Err(ProtocolError::Truncated { kind: STATE, .. })));
    }

    #[test]
    fn test_decode_short_register_id() {
        let result = Command::decode(&[REGISTER, b'a', b'b']);
        assert!(matches!(result, Err(ProtocolError::Truncated { kind: REGISTER, .. })));
    }

    #[test]
    fn test_decode_non_ascii_register_id() {
        let mut frame = vec![REGISTER];
        frame.extend(std::iter::repeat(0xC3).take(CLIENT_ID_LEN));
        assert_eq!(Command::decode(&frame), Err(ProtocolError::InvalidClientId));
    }

    #[test]
    fn test_decode_unknown_command() {
        assert_eq!(Command::decode(&[9]), Ok(Command::Unknown(9)));
        assert_eq!(
            Command::decode(&[9, 0]),
            Err(ProtocolError::UnknownCommand { kind: 9, len: 1 })
        );
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let decoded = Command::decode(&[UPDATE, 10, 0, 20, 0, 0xFF]).unwrap();
        assert_eq!(decoded, Command::Update { x: 10, y: 20 });
    }

    #[test]
    fn test_client_id_validation() {
        let id = ClientId::random();
        assert_eq!(ClientId::parse(id.as_str()), Ok(id));
        assert_eq!(ClientId::parse("short"), Err(ProtocolError::InvalidClientId));
    }
}
