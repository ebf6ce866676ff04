//! WebSocket transport and per-socket relay tasks
//!
//! Clients open two sockets. `/request` carries registration and paddle
//! updates; `/state` announces the client id once and then only receives
//! Start notifications and per-tick snapshots.

use crate::connection::{Channel, Connection};
use crate::error::TransportError;
use crate::game::Game;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::Command;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

pub const STATE_PATH: &str = "/state";
pub const REQUEST_PATH: &str = "/request";

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsStream = SplitStream<WebSocketStream<TcpStream>>;

/// Outbound side of a WebSocket.
///
/// Frames are queued to a writer task; once that task stops (the peer went
/// away or the socket was closed) every send reports `PeerGone`.
#[derive(Clone, Debug)]
pub struct WsChannel {
    tx: mpsc::UnboundedSender<Message>,
}

impl WsChannel {
    fn spawn(mut sink: WsSink) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let closing = matches!(message, Message::Close(_));
                if let Err(e) = sink.send(message).await {
                    debug!("WebSocket write failed: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }
            rx.close();
        });

        Self { tx }
    }
}

impl Channel for WsChannel {
    fn send(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.tx
            .send(Message::Binary(frame.into()))
            .map_err(|_| TransportError::PeerGone)
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn close(&self) {
        let _ = self.tx.send(Message::Close(None));
    }
}

/// Accepts WebSocket clients and hands them to the game.
pub struct NetworkServer {
    listener: TcpListener,
}

impl NetworkServer {
    pub async fn bind(addr: &str) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept loop. Each connection gets its own task.
    pub async fn serve(self, game: Arc<Game<WsChannel>>) {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let game = Arc::clone(&game);
                    tokio::spawn(async move {
                        handle_connection(stream, addr, game).await;
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, addr: SocketAddr, game: Arc<Game<WsChannel>>) {
    let mut path = String::new();
    let route = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        path = request.uri().path().to_string();
        Ok(response)
    };

    let socket = match accept_hdr_async(stream, route).await {
        Ok(socket) => socket,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };

    let (sink, stream) = socket.split();
    let channel = WsChannel::spawn(sink);

    match path.as_str() {
        STATE_PATH => handle_state_socket(&game, stream, channel, addr).await,
        REQUEST_PATH => handle_request_socket(&game, stream, channel, addr).await,
        other => {
            warn!("Closing {} connection on unknown route {}", addr, other);
            channel.close();
        }
    }
}

/// Next binary frame, or None once the peer has gone.
async fn next_frame(stream: &mut WsStream) -> Option<Vec<u8>> {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Binary(data)) => return Some(data.to_vec()),
            Ok(Message::Close(_)) => return None,
            Ok(_) => continue,
            Err(e) => {
                debug!("WebSocket read failed: {}", e);
                return None;
            }
        }
    }
    None
}

async fn handle_state_socket(
    game: &Game<WsChannel>,
    mut stream: WsStream,
    channel: WsChannel,
    addr: SocketAddr,
) {
    let client_id = match next_frame(&mut stream).await.map(|frame| Command::decode(&frame)) {
        Some(Ok(Command::Register { id: Some(id) })) => id,
        Some(Ok(command)) => {
            warn!("State socket {} opened with {:?}, closing", addr, command);
            channel.close();
            return;
        }
        Some(Err(e)) => {
            warn!("Malformed handshake on state socket {}: {}", addr, e);
            channel.close();
            return;
        }
        None => {
            channel.close();
            return;
        }
    };

    info!("State socket {} subscribed as {}", addr, client_id);
    game.add_state_socket(channel.clone(), client_id).await;

    // Receive-only from here on; drain until the peer leaves so the tick can
    // reap the socket.
    while next_frame(&mut stream).await.is_some() {}
    debug!("State socket {} disconnected", addr);
    channel.close();
}

async fn handle_request_socket(
    game: &Game<WsChannel>,
    mut stream: WsStream,
    channel: WsChannel,
    addr: SocketAddr,
) {
    let mut connection = Connection::new(channel);

    while !connection.is_closed() {
        let Some(frame) = next_frame(&mut stream).await else {
            debug!("Request socket {} disconnected", addr);
            connection.close();
            return;
        };

        let command = match Command::decode(&frame) {
            Ok(command) => command,
            Err(e) => {
                warn!("Malformed frame from {}: {}", addr, e);
                connection.close();
                return;
            }
        };

        match command {
            Command::Register { .. } if connection.client_id().is_none() => {
                match game.register().await {
                    Ok(client_id) => {
                        info!("Registered {} as {}", addr, client_id);
                        connection.set_client_id(client_id.clone());
                        connection.send(&Command::Register {
                            id: Some(client_id),
                        });
                    }
                    Err(e) => {
                        error!("Registration for {} failed: {}", addr, e);
                        connection.send(&Command::Error);
                    }
                }
            }
            Command::Update { x, y } => {
                if let Err(e) = game.update_player_position(connection.client_id(), x, y) {
                    error!("Position update from {} failed: {}", addr, e);
                }
            }
            other => debug!("Ignoring {:?} from {}", other, addr),
        }
    }
}
