//! Types shared between the air hockey server and anything that speaks its
//! wire protocol: table dimensions, the binary command codec and the
//! rectangle geometry used for wall and goal detection.

pub mod geometry;
pub mod protocol;

pub use geometry::Rect;
pub use protocol::{ClientId, Command, PlayerState, ProtocolError, StatePacket};

/// Side length of the square table.
pub const TABLE_SIZE: f64 = 1000.0;
/// Side length of the square puck.
pub const PUCK_SIZE: f64 = 50.0;
/// Length of each goal opening along its table edge.
pub const GOAL_SIZE: f64 = 300.0;
/// How far a goal reaches into the table.
pub const GOAL_PROTRUDE: f64 = 20.0;
/// Puck travel speed in table units per second.
pub const PUCK_SPEED: f64 = 500.0;

/// Number of player slots in every session.
pub const PLAYERS_PER_SESSION: usize = 4;
