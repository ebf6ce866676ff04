//! Connection records and the pool of state sockets
//!
//! This module handles the server-side bookkeeping of connected sockets:
//! - The `Channel` seam over whatever transport carries frames
//! - Sticky dead-peer tracking so a failed socket is never written again
//! - The state-socket pool that receives a snapshot every tick
//!
//! Dead sockets are not evicted when the failure happens. They are reaped by
//! the next tick, which also frees their player slot.

use crate::error::TransportError;
use crate::session::Session;
use log::{debug, info};
use shared::{ClientId, Command};
use std::collections::HashMap;

/// Outbound half of a duplex byte channel.
///
/// Sends must not block: transports queue the frame and deliver it from
/// their own task.
pub trait Channel: Send + Sync {
    fn send(&self, frame: Vec<u8>) -> Result<(), TransportError>;

    fn is_closed(&self) -> bool;

    fn close(&self);
}

/// A socket and the client it belongs to
///
/// Once a send reports the peer as gone the record stays dead, even if the
/// underlying channel later claims to be open.
#[derive(Debug)]
pub struct Connection<C> {
    channel: C,
    dead: bool,
    client_id: Option<ClientId>,
}

impl<C: Channel> Connection<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            dead: false,
            client_id: None,
        }
    }

    pub fn with_client_id(channel: C, client_id: ClientId) -> Self {
        Self {
            channel,
            dead: false,
            client_id: Some(client_id),
        }
    }

    pub fn client_id(&self) -> Option<&ClientId> {
        self.client_id.as_ref()
    }

    pub fn set_client_id(&mut self, client_id: ClientId) {
        self.client_id = Some(client_id);
    }

    pub fn is_closed(&self) -> bool {
        self.dead || self.channel.is_closed()
    }

    /// Encodes and sends `command`, marking the record dead if the peer is
    /// gone. Closed records swallow the send.
    pub fn send(&mut self, command: &Command) {
        if self.is_closed() {
            return;
        }
        if let Err(TransportError::PeerGone) = self.channel.send(command.encode()) {
            debug!("Peer {:?} gone, marking connection dead", self.client_id);
            self.dead = true;
        }
    }

    pub fn close(&mut self) {
        self.channel.close();
    }
}

/// Every registered state socket
///
/// The pool is the fan-out target of the tick: each live socket receives
/// the snapshot of every active session holding its client id.
pub struct ConnectionPool<C> {
    connections: Vec<Connection<C>>,
}

impl<C: Channel> Default for ConnectionPool<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Channel> ConnectionPool<C> {
    pub fn new() -> Self {
        Self {
            connections: Vec::new(),
        }
    }

    pub fn add(&mut self, connection: Connection<C>) {
        info!("State socket registered for {:?}", connection.client_id);
        self.connections.push(connection);
    }

    /// Removes closed connections and returns the client ids they carried.
    pub fn reap_closed(&mut self) -> Vec<ClientId> {
        let mut reaped = Vec::new();
        self.connections.retain(|connection| {
            if !connection.is_closed() {
                return true;
            }
            if let Some(id) = &connection.client_id {
                info!("State socket for {} closed", id);
                reaped.push(id.clone());
            }
            false
        });
        reaped
    }

    /// Sends `command` to every socket registered for `client_id`.
    pub fn send_to(&mut self, client_id: &ClientId, command: &Command) {
        for connection in self
            .connections
            .iter_mut()
            .filter(|connection| connection.client_id.as_ref() == Some(client_id))
        {
            connection.send(command);
        }
    }

    /// Sends each socket the snapshot of the active sessions it plays in.
    pub fn broadcast_states(&mut self, sessions: &[Session]) {
        let mut frames: HashMap<&ClientId, Vec<Command>> = HashMap::new();
        for session in sessions.iter().filter(|session| session.active) {
            let state = Command::State(session.state_packet());
            for id in session.players.iter().filter_map(|player| player.id.as_ref()) {
                frames.entry(id).or_default().push(state.clone());
            }
        }

        for connection in &mut self.connections {
            let Some(commands) = connection.client_id.as_ref().and_then(|id| frames.get(id))
            else {
                continue;
            };
            for command in commands {
                connection.send(command);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
