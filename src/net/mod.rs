//! Network peer
//!
//! Wraps a text-frame `Transport` in an explicit connection state machine:
//!
//! ```text
//! Connecting --opened--> Live
//!     |                   |
//!     | timeout/closed    | closed/send failure
//!     v                   v
//!  Simulated <------------+
//! ```
//!
//! `Simulated` is mock mode: the peer answers room requests locally so a
//! session can proceed without any real server. Connectivity failures never
//! leave this module as errors, only as state transitions.

pub mod protocol;

use std::collections::VecDeque;

use thiserror::Error;

use crate::consts::NET_CONNECT_TIMEOUT_MS;
use crate::sim::{MapName, RemotePlayer};
pub use protocol::{ClientMessage, PlayerUpdate, ServerMessage};

/// Network failures
#[derive(Debug, Error)]
pub enum NetError {
    #[error("not connected yet")]
    NotConnected,
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("message codec failed: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Low-level events surfaced by a transport
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Opened,
    Frame(String),
    Closed,
}

/// Bidirectional text-frame channel to the room server
pub trait Transport {
    fn send(&mut self, frame: &str) -> Result<(), NetError>;

    /// Next buffered inbound event, never blocks
    fn poll(&mut self) -> Option<TransportEvent>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, frame: &str) -> Result<(), NetError> {
        (**self).send(frame)
    }

    fn poll(&mut self) -> Option<TransportEvent> {
        (**self).poll()
    }
}

/// Transport that never connects, forcing mock mode after the timeout
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn send(&mut self, _frame: &str) -> Result<(), NetError> {
        Err(NetError::NotConnected)
    }

    fn poll(&mut self) -> Option<TransportEvent> {
        None
    }
}

/// How the peer ended up connected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    Online,
    Mock,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectionState {
    /// Waiting for the transport, started at `since` (ms)
    Connecting { since: f64 },
    Live,
    /// Local mock mode
    Simulated,
}

/// Lifecycle events for the session
#[derive(Debug, Clone, PartialEq)]
pub enum NetEvent {
    Connected { mode: ConnectionMode },
    Disconnected,
    RoomJoined {
        code: String,
        is_host: bool,
        theme: Option<String>,
    },
    GameStarted { theme: String },
    PlayerUpdate(RemotePlayer),
    PlayerLeft { id: String },
}

/// Client side of the room protocol
pub struct NetworkPeer<T: Transport> {
    transport: T,
    state: ConnectionState,
    events: VecDeque<NetEvent>,
}

impl<T: Transport> NetworkPeer<T> {
    pub fn new(transport: T, now: f64) -> Self {
        log::info!("Connecting to room server");
        Self {
            transport,
            state: ConnectionState::Connecting { since: now },
            events: VecDeque::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connection mode once resolved
    pub fn mode(&self) -> Option<ConnectionMode> {
        match self.state {
            ConnectionState::Connecting { .. } => None,
            ConnectionState::Live => Some(ConnectionMode::Online),
            ConnectionState::Simulated => Some(ConnectionMode::Mock),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Pump the transport and advance the connection state machine
    pub fn update(&mut self, now: f64) {
        while let Some(event) = self.transport.poll() {
            match (self.state, event) {
                (ConnectionState::Connecting { .. }, TransportEvent::Opened) => {
                    log::info!("Room server connected");
                    self.state = ConnectionState::Live;
                    self.events.push_back(NetEvent::Connected {
                        mode: ConnectionMode::Online,
                    });
                }
                (ConnectionState::Connecting { .. }, TransportEvent::Closed) => {
                    self.fall_back("connection refused");
                }
                (ConnectionState::Live, TransportEvent::Frame(frame)) => self.handle_frame(&frame),
                (ConnectionState::Live, TransportEvent::Closed) => {
                    self.events.push_back(NetEvent::Disconnected);
                    self.fall_back("connection closed");
                }
                (state, event) => {
                    log::debug!("Ignoring transport event {event:?} in state {state:?}");
                }
            }
        }

        if let ConnectionState::Connecting { since } = self.state
            && now - since >= NET_CONNECT_TIMEOUT_MS
        {
            self.fall_back("connection timed out");
        }
    }

    fn fall_back(&mut self, reason: &str) {
        log::warn!("Network unavailable ({reason}), switching to mock mode");
        self.state = ConnectionState::Simulated;
        self.events.push_back(NetEvent::Connected {
            mode: ConnectionMode::Mock,
        });
    }

    fn handle_frame(&mut self, frame: &str) {
        let msg = match ServerMessage::decode(frame) {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("Dropping malformed server frame: {e}");
                return;
            }
        };

        let event = match msg {
            ServerMessage::RoomJoined {
                code,
                is_host,
                theme,
            } => NetEvent::RoomJoined {
                code,
                is_host,
                theme,
            },
            ServerMessage::GameStarted { theme } => NetEvent::GameStarted { theme },
            ServerMessage::PlayerUpdate(remote) => NetEvent::PlayerUpdate(remote),
            ServerMessage::PlayerLeft { id } => NetEvent::PlayerLeft { id },
        };
        self.events.push_back(event);
    }

    fn send(&mut self, msg: &ClientMessage) -> Result<(), NetError> {
        let frame = msg.encode()?;
        if let Err(e) = self.transport.send(&frame) {
            self.events.push_back(NetEvent::Disconnected);
            self.fall_back(&e.to_string());
            return Err(e);
        }
        Ok(())
    }

    /// Create a room; answered locally in mock mode
    pub fn create_room(&mut self, code: &str, map: MapName) -> Result<(), NetError> {
        match self.state {
            ConnectionState::Connecting { .. } => Err(NetError::NotConnected),
            ConnectionState::Live => self.send(&ClientMessage::CreateRoom {
                code: code.to_string(),
                map,
            }),
            ConnectionState::Simulated => {
                self.events.push_back(NetEvent::RoomJoined {
                    code: code.to_string(),
                    is_host: true,
                    theme: Some(map.display_name().to_string()),
                });
                Ok(())
            }
        }
    }

    /// Join a room; answered locally in mock mode
    pub fn join_room(&mut self, code: &str) -> Result<(), NetError> {
        match self.state {
            ConnectionState::Connecting { .. } => Err(NetError::NotConnected),
            ConnectionState::Live => self.send(&ClientMessage::JoinRoom {
                code: code.to_string(),
            }),
            ConnectionState::Simulated => {
                self.events.push_back(NetEvent::RoomJoined {
                    code: code.to_string(),
                    is_host: false,
                    theme: None,
                });
                Ok(())
            }
        }
    }

    /// Host-only: start the match for everyone in the room
    pub fn start_game(&mut self, theme: &str) -> Result<(), NetError> {
        match self.state {
            ConnectionState::Connecting { .. } => Err(NetError::NotConnected),
            ConnectionState::Live => self.send(&ClientMessage::StartGame {
                theme: theme.to_string(),
            }),
            ConnectionState::Simulated => {
                self.events.push_back(NetEvent::GameStarted {
                    theme: theme.to_string(),
                });
                Ok(())
            }
        }
    }

    /// Fire-and-forget position broadcast
    pub fn send_player_update(&mut self, update: PlayerUpdate) {
        if self.state != ConnectionState::Live {
            return;
        }
        if let Err(e) = self.send(&ClientMessage::PlayerUpdate(update)) {
            log::debug!("Player update dropped: {e}");
        }
    }

    /// Take every event received since the last drain
    pub fn drain_events(&mut self) -> Vec<NetEvent> {
        self.events.drain(..).collect()
    }
}
