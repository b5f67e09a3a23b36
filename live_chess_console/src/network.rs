// Improvement potential: Reconnect automatically and call `GameDirectory::reset` + resync.

use std::fmt;
use std::io;
use std::net::TcpStream;

use anyhow::Context;
use live_chess::event::WireFrame;
use live_chess::transport::OutgoingMessage;
use serde_json::json;
use tungstenite::protocol::Role;
use tungstenite::{Message, WebSocket};
use url::Url;


// Pseudo-topic for subscription requests. The payload is the topic to subscribe to.
pub const SUBSCRIBE_TOPIC: &str = "subscribe";

#[derive(Debug)]
pub enum CommunicationError {
    Socket(tungstenite::Error),
    Serde(serde_json::Error),
    Protocol(String),
}

impl fmt::Display for CommunicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommunicationError::Socket(err) => write!(f, "socket error: {err}"),
            CommunicationError::Serde(err) => write!(f, "bad frame: {err}"),
            CommunicationError::Protocol(err) => write!(f, "protocol error: {err}"),
        }
    }
}

impl std::error::Error for CommunicationError {}

pub fn outgoing_frame(message: OutgoingMessage) -> WireFrame {
    match message {
        OutgoingMessage::Subscribe { topic } => WireFrame {
            topic: SUBSCRIBE_TOPIC.to_owned(),
            payload: json!(topic.to_string()),
        },
        OutgoingMessage::Publish { topic, payload } => {
            WireFrame { topic: topic.to_string(), payload }
        }
    }
}

pub fn write_frame<S>(
    socket: &mut WebSocket<S>, frame: &WireFrame,
) -> Result<(), CommunicationError>
where
    S: io::Read + io::Write,
{
    let serialized = serde_json::to_string(frame).map_err(CommunicationError::Serde)?;
    socket.send(Message::text(serialized)).map_err(CommunicationError::Socket)
}

// Skips control frames.
pub fn read_frame<S>(socket: &mut WebSocket<S>) -> Result<WireFrame, CommunicationError>
where
    S: io::Read + io::Write,
{
    loop {
        match socket.read().map_err(CommunicationError::Socket)? {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str()).map_err(CommunicationError::Serde);
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            msg => {
                return Err(CommunicationError::Protocol(format!("Expected text, got {msg:?}")));
            }
        }
    }
}

pub fn connect(server_address: &str) -> anyhow::Result<WebSocket<TcpStream>> {
    let url = Url::parse(server_address)
        .with_context(|| format!("Bad server address '{server_address}'"))?;
    let host = url.host_str().context("Server address has no host")?;
    let port = url.port_or_known_default().context("Server address has no port")?;
    let stream = TcpStream::connect((host, port))
        .with_context(|| format!("Cannot connect to {host}:{port}"))?;
    let (socket, _) = tungstenite::client(server_address, stream)
        .map_err(|err| anyhow::anyhow!("WebSocket handshake failed: {err}"))?;
    Ok(socket)
}

// TODO: Instead of cloning the socket, consider calling TcpStream.set_nonblocking on the
//   underlying stream and doing read/writes in the same thread.
pub fn clone_websocket(
    socket: &WebSocket<TcpStream>, role: Role,
) -> io::Result<WebSocket<TcpStream>> {
    let stream = socket.get_ref().try_clone()?;
    let config = *socket.get_config();
    Ok(WebSocket::from_raw_socket(stream, role, Some(config)))
}
