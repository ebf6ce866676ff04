//! Session model: four player slots, a puck, and the snapshot sent to
//! state sockets.

use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};
use shared::{ClientId, PlayerState, StatePacket, PLAYERS_PER_SESSION, TABLE_SIZE};

/// One of the four fixed positions in a session.
///
/// `player_num` also names the goal the player defends:
/// 0 top, 1 right, 2 bottom, 3 left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSlot {
    pub id: Option<ClientId>,
    pub x: u16,
    pub y: u16,
    pub score: u32,
    pub active: bool,
    pub player_num: u8,
}

impl PlayerSlot {
    pub fn empty(player_num: u8) -> Self {
        Self {
            id: None,
            x: (TABLE_SIZE / 2.0) as u16,
            y: 10,
            score: 0,
            active: false,
            player_num,
        }
    }

    pub fn to_state(&self) -> PlayerState {
        PlayerState {
            x: self.x,
            y: self.y,
            score: u8::try_from(self.score).unwrap_or(u8::MAX),
            active: u8::from(self.active),
            player_num: self.player_num,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Puck {
    pub x: f64,
    pub y: f64,
    /// Direction of travel in `[0, 360)`.
    pub degree: i32,
}

impl Puck {
    /// Re-center with a random cardinal direction.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.x = TABLE_SIZE / 2.0;
        self.y = TABLE_SIZE / 2.0;
        self.degree = rng.gen_range(0..4) * 90;
    }
}

/// A forming or running four-player match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub players: [PlayerSlot; PLAYERS_PER_SESSION],
    pub puck: Puck,
    pub active: bool,
    /// Wall-clock seconds of the last applied tick.
    pub update_time: f64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            players: [0, 1, 2, 3].map(PlayerSlot::empty),
            puck: Puck {
                x: 0.0,
                y: 0.0,
                degree: 0,
            },
            active: false,
            update_time: 0.0,
        }
    }

    pub fn active_players(&self) -> usize {
        active_players(&self.players)
    }

    pub fn is_full(&self) -> bool {
        self.active_players() >= PLAYERS_PER_SESSION
    }

    /// Index of the lowest inactive slot.
    pub fn free_slot(&self) -> Option<usize> {
        self.players.iter().position(|player| !player.active)
    }

    pub fn contains(&self, client_id: &ClientId) -> bool {
        self.players
            .iter()
            .any(|player| player.id.as_ref() == Some(client_id))
    }

    /// Begin play: stamp the clock and serve the puck from the center.
    pub fn start<R: Rng + ?Sized>(&mut self, now: f64, rng: &mut R) {
        self.active = true;
        self.update_time = now;
        self.puck.reset(rng);
    }

    pub fn state_packet(&self) -> StatePacket {
        StatePacket {
            puck_x: self.puck.x as i16,
            puck_y: self.puck.y as i16,
            players: [
                self.players[0].to_state(),
                self.players[1].to_state(),
                self.players[2].to_state(),
                self.players[3].to_state(),
            ],
        }
    }
}

/// Number of occupied slots.
pub fn active_players(players: &[PlayerSlot]) -> usize {
    players.iter().filter(|player| player.active).count()
}

/// Clears `client_id` from whichever slot holds it and drops sessions left
/// without players. Returns true if a slot was cleared.
pub fn remove_client(sessions: &mut Vec<Session>, client_id: &ClientId) -> bool {
    let mut removed = false;
    for session in sessions.iter_mut() {
        for player in session.players.iter_mut() {
            if player.id.as_ref() == Some(client_id) {
                player.id = None;
                player.active = false;
                removed = true;
                info!("Player {} left slot {}", client_id, player.player_num);
            }
        }
    }
    let before = sessions.len();
    sessions.retain(|session| session.active_players() > 0);
    if sessions.len() < before {
        info!("Removed {} empty session(s)", before - sessions.len());
    }
    removed
}

/// Moves the paddle of `client_id`. Returns false if no slot holds it.
pub fn update_position(sessions: &mut [Session], client_id: &ClientId, x: u16, y: u16) -> bool {
    let mut found = false;
    for player in sessions
        .iter_mut()
        .flat_map(|session| session.players.iter_mut())
        .filter(|player| player.id.as_ref() == Some(client_id))
    {
        player.x = x;
        player.y = y;
        found = true;
    }
    found
}
