use clap::Parser;
use log::{error, info};
use server::config::ServerConfig;
use server::game::Game;
use server::network::NetworkServer;
use server::store::SessionStore;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::parse();

    let game = Arc::new(Game::new(SessionStore::in_memory(), config.game_config()));
    game.reset()?;

    let server = NetworkServer::bind(&config.address()).await?;

    let network_handle = tokio::spawn(server.serve(Arc::clone(&game)));
    let game_handle = tokio::spawn(Arc::clone(&game).run());

    // The tick loop is the only source of simulation progress; if it stops,
    // so does the process.
    tokio::select! {
        result = game_handle => {
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!("Tick loop stopped: {}", e);
                    return Err(e.into());
                }
                Err(e) => {
                    error!("Tick loop panicked: {}", e);
                    return Err(e.into());
                }
            }
        }
        result = network_handle => {
            if let Err(e) = result {
                error!("Network task panicked: {}", e);
                return Err(e.into());
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
