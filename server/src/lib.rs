//! # Air Hockey Server Library
//!
//! This library provides the authoritative server for a four-player air hockey
//! game. It matches clients into sessions, simulates the puck of every running
//! session at a fixed tick, and pushes each client a snapshot of its session
//! after every tick.
//!
//! ## Core Responsibilities
//!
//! ### Matchmaking
//! Each client registers once and is placed in the lowest free slot of the
//! first session that still has room. A session starts when its fourth slot
//! fills; every player in it is then sent a Start command carrying its
//! `player_num`.
//!
//! ### Authoritative Simulation
//! The puck moves at a constant speed along a quantized direction, reflects
//! off the table walls, and is served again from the center after entering a
//! goal. The player defending the entered goal's edge is credited.
//!
//! ### State Broadcasting
//! Once per tick every live state socket receives the snapshot of the running
//! session its client plays in. Sockets that went away are reaped on the
//! following tick and their slot is freed.
//!
//! ## Architecture Design
//!
//! ### Whole-List Session Storage
//! Sessions live in a key-value blob store as a single serialized list. The
//! tick and every connection task load the entire list, change it and write
//! it back. Writers racing between load and save can lose updates; enable the
//! `cas` feature to retry such writes instead.
//!
//! ### Two Sockets Per Client
//! `/request` is bidirectional and carries registration and paddle updates.
//! `/state` sends the client id once and is receive-only afterwards.
//!
//! ## Module Organization
//!
//! - `session` — slots, puck and session model, snapshot conversion
//! - `store` — blob store abstraction and the typed session list on top of it
//! - `matchmaker` — slot assignment and session start
//! - `physics` — puck movement, wall reflection, goal detection
//! - `connection` — channel seam, sticky dead-peer records, state-socket pool
//! - `game` — tick loop, registration, position updates, broadcast
//! - `network` — WebSocket accept loop and per-socket tasks
//! - `config` — command line and environment settings
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::game::{Game, GameConfig};
//! use server::network::NetworkServer;
//! use server::store::SessionStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let game = Arc::new(Game::new(SessionStore::in_memory(), GameConfig::default()));
//!     game.reset()?;
//!
//!     let server = NetworkServer::bind("127.0.0.1:5000").await?;
//!     tokio::spawn(server.serve(Arc::clone(&game)));
//!
//!     // Runs until the session store fails.
//!     game.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod game;
pub mod matchmaker;
pub mod network;
pub mod physics;
pub mod session;
pub mod store;
pub mod utils;
