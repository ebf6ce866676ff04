//! Slot assignment for newly registered clients.

use crate::session::Session;
use log::info;
use rand::Rng;
use shared::ClientId;

/// Result of placing a new client.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub client_id: ClientId,
    /// Index of the session in the list.
    pub session: usize,
    pub slot: usize,
    /// Players to send a Start notification to, with their player_num.
    pub notify: Vec<(ClientId, u8)>,
}

fn id_in_use(sessions: &[Session], id: &ClientId) -> bool {
    sessions.iter().any(|session| session.contains(id))
}

/// A random id that no slot currently holds.
pub fn new_client_id(sessions: &[Session]) -> ClientId {
    loop {
        let id = ClientId::random();
        if !id_in_use(sessions, &id) {
            return id;
        }
    }
}

fn occupied_slots(session: &Session) -> Vec<(ClientId, u8)> {
    session
        .players
        .iter()
        .filter_map(|player| player.id.clone().map(|id| (id, player.player_num)))
        .collect()
}

/// Places a fresh client into the first session with an open slot, or a
/// new session when every session is full.
///
/// A session starts when its fourth slot fills. With `bootstrap` set, a new
/// session starts as soon as it is created.
pub fn register<R: Rng + ?Sized>(
    sessions: &mut Vec<Session>,
    now: f64,
    rng: &mut R,
    bootstrap: bool,
) -> Registration {
    let client_id = new_client_id(sessions);

    let open = sessions
        .iter()
        .enumerate()
        .find_map(|(index, session)| session.free_slot().map(|slot| (index, slot)));

    if let Some((index, slot)) = open {
        let session = &mut sessions[index];
        let player = &mut session.players[slot];
        player.id = Some(client_id.clone());
        player.active = true;
        info!(
            "Client {} joined session {} as player {}",
            client_id, index, slot
        );

        let mut notify = Vec::new();
        if session.is_full() {
            if !session.active {
                session.start(now, rng);
                info!("Session {} is full, starting", index);
            }
            notify = occupied_slots(session);
        }

        return Registration {
            client_id,
            session: index,
            slot,
            notify,
        };
    }

    let mut session = Session::new();
    session.players[0].id = Some(client_id.clone());
    session.players[0].active = true;

    let mut notify = Vec::new();
    if bootstrap {
        session.start(now, rng);
        notify = occupied_slots(&session);
    }

    sessions.push(session);
    let index = sessions.len() - 1;
    info!("Client {} opened session {}", client_id, index);

    Registration {
        client_id,
        session: index,
        slot: 0,
        notify,
    }
}
