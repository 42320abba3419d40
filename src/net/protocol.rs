//! Wire messages exchanged with the room server as JSON text frames

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::level::Color;
use crate::sim::{MapName, RemotePlayer};

/// Messages the client sends to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    CreateRoom { code: String, map: MapName },
    JoinRoom { code: String },
    StartGame { theme: String },
    PlayerUpdate(PlayerUpdate),
}

/// Messages the server sends to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    RoomJoined {
        code: String,
        is_host: bool,
        #[serde(default)]
        theme: Option<String>,
    },
    GameStarted { theme: String },
    PlayerUpdate(RemotePlayer),
    PlayerLeft { id: String },
}

/// Local player state broadcast to peers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerUpdate {
    pub pos: Vec2,
    pub color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kills: Option<u32>,
}

impl ClientMessage {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ServerMessage {
    pub fn decode(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }
}
