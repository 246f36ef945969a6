// UDP client for connecting to the match relay.
//
// Provides a non-blocking interface for a game loop to communicate with the
// relay. Architecture:
// - `connect()` sends the `Join` probe and performs the blocking handshake
//   (welcome string, then the role digit) on the calling thread, then
//   spawns a background reader thread.
// - The reader thread calls `recv` in a loop, decodes `ServerMessage`
//   frames, and pushes them into an `mpsc` channel. Undecodable datagrams
//   are skipped; one bad frame is not a broken connection over UDP.
// - `poll()` drains the inbox non-blocking, returning all queued messages.
//
// This separation ensures the caller never blocks on network I/O after the
// handshake. The socket is `connect`ed to the relay, so the OS filters out
// datagrams from other peers.

use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use duel_protocol::{
    ClientMessage, PlayerRole, PlayerState, ServerMessage, codec, decode_server, encode_client,
};

/// UDP client for relay communication.
pub struct NetClient {
    socket: Arc<UdpSocket>,
    inbox: Receiver<ServerMessage>,
    _reader_thread: Option<JoinHandle<()>>,
    /// Role assigned during the handshake, stable for the match.
    pub role: PlayerRole,
}

impl NetClient {
    /// Connect to a relay, register, and await the role assignment. Returns
    /// the client once the handshake completes.
    pub fn connect(server: SocketAddr) -> Result<Self, String> {
        let socket = UdpSocket::bind("0.0.0.0:0").map_err(|e| format!("bind failed: {e}"))?;
        socket
            .connect(server)
            .map_err(|e| format!("connect failed: {e}"))?;

        // Handshake with a read timeout so a dead relay doesn't block forever.
        socket
            .set_read_timeout(Some(Duration::from_secs(5)))
            .map_err(|e| format!("set timeout failed: {e}"))?;

        socket
            .send(&encode_client(&ClientMessage::Join))
            .map_err(|e| format!("send Join failed: {e}"))?;

        match recv_server_message(&socket)? {
            ServerMessage::Welcome => {}
            other => return Err(format!("expected welcome, got {other:?}")),
        }
        let role = match recv_server_message(&socket)? {
            ServerMessage::RoleAssigned(role) => role,
            other => return Err(format!("expected role assignment, got {other:?}")),
        };

        // Clear the timeout for the long-lived reader loop.
        socket
            .set_read_timeout(None)
            .map_err(|e| format!("clear timeout failed: {e}"))?;

        let socket = Arc::new(socket);
        let (tx, rx) = mpsc::channel();
        let reader_socket = socket.clone();
        let reader_thread = thread::spawn(move || {
            reader_loop(&reader_socket, &tx);
        });

        Ok(Self {
            socket,
            inbox: rx,
            _reader_thread: Some(reader_thread),
            role,
        })
    }

    /// Send a full-state update for this client's role.
    pub fn send_update(&self, state: PlayerState) -> Result<(), String> {
        self.send(&ClientMessage::Update(state))
    }

    /// Send an opaque position payload tagged with this client's role.
    pub fn send_position(&self, payload: &str) -> Result<(), String> {
        self.send(&ClientMessage::Position {
            role: self.role,
            payload: payload.into(),
        })
    }

    /// Send a sprite-flip event for this client's role.
    pub fn send_flip(&self) -> Result<(), String> {
        self.send(&ClientMessage::Flipped { role: self.role })
    }

    /// Notify the relay that this client's player died.
    pub fn send_dead(&self) -> Result<(), String> {
        self.send(&ClientMessage::Dead { role: self.role })
    }

    /// Acknowledge the match start.
    pub fn send_game_started(&self) -> Result<(), String> {
        self.send(&ClientMessage::GameStarted)
    }

    /// Signal end-of-match (e.g. the round timer expired).
    pub fn send_game_over(&self) -> Result<(), String> {
        self.send(&ClientMessage::GameOver)
    }

    /// Drain all queued server messages (non-blocking).
    pub fn poll(&self) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.inbox.try_recv() {
            messages.push(message);
        }
        messages
    }

    fn send(&self, message: &ClientMessage) -> Result<(), String> {
        self.socket
            .send(&encode_client(message))
            .map(|_| ())
            .map_err(|e| format!("send failed: {e}"))
    }
}

/// Blocking receive of one decodable server frame (handshake only).
fn recv_server_message(socket: &UdpSocket) -> Result<ServerMessage, String> {
    let mut buf = [0u8; codec::MAX_DATAGRAM_SIZE];
    let len = socket
        .recv(&mut buf)
        .map_err(|e| format!("receive failed: {e}"))?;
    decode_server(&buf[..len]).map_err(|e| format!("bad server frame: {e}"))
}

/// Reader thread: decode datagrams in a loop, push to the channel. Exits on
/// socket error or when the client has been dropped.
fn reader_loop(socket: &UdpSocket, tx: &Sender<ServerMessage>) {
    let mut buf = [0u8; codec::MAX_DATAGRAM_SIZE];
    loop {
        let len = match socket.recv(&mut buf) {
            Ok(len) => len,
            Err(_) => break,
        };
        match decode_server(&buf[..len]) {
            Ok(message) => {
                if tx.send(message).is_err() {
                    break; // Owner dropped the inbox
                }
            }
            Err(_) => {
                // Malformed datagram: skip it, the stream is not corrupt.
            }
        }
    }
}
