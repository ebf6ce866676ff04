//! Command line and environment configuration.

use crate::game::GameConfig;
use clap::Parser;
use std::time::Duration;

/// Four-player air hockey server
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about)]
pub struct ServerConfig {
    /// Server IP address to bind to
    #[clap(short = 'H', long, default_value = "0.0.0.0")]
    pub host: String,
    /// Server port to listen on
    #[clap(short, long, env = "PORT", default_value = "5000")]
    pub port: u16,
    /// Simulation tick period in milliseconds
    #[clap(long, default_value = "50", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,
    /// Start a session as soon as its first player joins
    #[clap(long, env = "AIR_HOCKEY_BOOTSTRAP")]
    pub bootstrap: bool,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            tick_period: Duration::from_millis(self.tick_ms),
            bootstrap: self.bootstrap,
        }
    }
}
