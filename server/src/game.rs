//! Game coordinator: owns the state-socket pool and drives the tick.

use crate::connection::{Channel, Connection, ConnectionPool};
use crate::error::StoreError;
use crate::matchmaker;
use crate::physics;
use crate::session;
use crate::store::SessionStore;
use crate::utils::now_seconds;
use log::{debug, error, info};
use shared::{ClientId, Command};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{interval, MissedTickBehavior};

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub tick_period: Duration,
    /// Start sessions as soon as their first player registers.
    pub bootstrap: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_millis(50),
            bootstrap: false,
        }
    }
}

pub struct Game<C> {
    store: SessionStore,
    state_sockets: RwLock<ConnectionPool<C>>,
    config: GameConfig,
}

impl<C: Channel> Game<C> {
    pub fn new(store: SessionStore, config: GameConfig) -> Self {
        Self {
            store,
            state_sockets: RwLock::new(ConnectionPool::new()),
            config,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Clears any sessions left in the store by a previous run.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.store.reset()
    }

    pub async fn add_state_socket(&self, channel: C, client_id: ClientId) {
        let mut sockets = self.state_sockets.write().await;
        sockets.add(Connection::with_client_id(channel, client_id));
    }

    pub async fn state_socket_count(&self) -> usize {
        self.state_sockets.read().await.len()
    }

    /// Places a new client in a session and notifies the session's players
    /// if it just started.
    pub async fn register(&self) -> Result<ClientId, StoreError> {
        let now = now_seconds();
        let bootstrap = self.config.bootstrap;
        let registration = self.store.modify(|sessions| {
            matchmaker::register(sessions, now, &mut rand::thread_rng(), bootstrap)
        })?;

        if !registration.notify.is_empty() {
            let mut sockets = self.state_sockets.write().await;
            for (id, player_num) in &registration.notify {
                sockets.send_to(
                    id,
                    &Command::Start {
                        player_num: Some(*player_num),
                    },
                );
            }
        }

        Ok(registration.client_id)
    }

    /// Moves a player's paddle. Without a client id there is nothing to
    /// move and the store is left untouched.
    pub fn update_player_position(
        &self,
        client_id: Option<&ClientId>,
        x: u16,
        y: u16,
    ) -> Result<(), StoreError> {
        let Some(client_id) = client_id else {
            debug!("Ignoring position update from unregistered client");
            return Ok(());
        };
        self.store
            .modify(|sessions| session::update_position(sessions, client_id, x, y))?;
        Ok(())
    }

    /// One simulation step at wall-clock time `now` (seconds).
    ///
    /// Advances every active session, frees the slots of state sockets that
    /// closed since the last tick, writes the list back and sends each live
    /// state socket its session snapshot. A store failure aborts the tick
    /// before anything is written.
    pub async fn tick(&self, now: f64) -> Result<(), StoreError> {
        let mut sockets = self.state_sockets.write().await;
        let departed = sockets.reap_closed();

        let sessions = self.store.modify(|sessions| {
            let goals = physics::update_sessions(sessions, now, &mut rand::thread_rng());
            if goals > 0 {
                debug!("{} goal(s) this tick", goals);
            }
            for id in &departed {
                session::remove_client(sessions, id);
            }
            sessions.clone()
        })?;

        sockets.broadcast_states(&sessions);
        Ok(())
    }

    /// Runs the tick forever. Returns only when the store fails.
    pub async fn run(self: Arc<Self>) -> Result<(), StoreError> {
        let mut tick_interval = interval(self.config.tick_period);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            "Tick loop started ({} ms period)",
            self.config.tick_period.as_millis()
        );

        loop {
            tick_interval.tick().await;
            if let Err(e) = self.tick(now_seconds()).await {
                error!("Tick failed: {}", e);
                return Err(e);
            }
        }
    }
}
