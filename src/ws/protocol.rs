//! WebSocket protocol message definitions
//! These are the wire types exchanged between peers and the relay.
//!
//! Every frame is `{"event": "<name>", "data": <payload>}`.

use serde::{Deserialize, Serialize};

use crate::game::{GameId, GameStatus};
use crate::input::GyroSample;
use crate::room::Role;

/// Payload of `join-room`: a bare room id or an object with an optional role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JoinPayload {
    Bare(String),
    Detailed {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<Role>,
    },
}

impl JoinPayload {
    pub fn room_id(&self) -> &str {
        match self {
            Self::Bare(id) => id,
            Self::Detailed { room_id, .. } => room_id,
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Bare(_) => None,
            Self::Detailed { role, .. } => *role,
        }
    }
}

/// Payload of `controller-action`: `{roomId, action}` or a bare action string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionPayload {
    Bare(String),
    Scoped {
        #[serde(rename = "roomId", default, skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
        action: String,
    },
}

impl ActionPayload {
    pub fn action(&self) -> &str {
        match self {
            Self::Bare(action) => action,
            Self::Scoped { action, .. } => action,
        }
    }

    pub fn room_id(&self) -> Option<&str> {
        match self {
            Self::Bare(_) => None,
            Self::Scoped { room_id, .. } => room_id.as_deref(),
        }
    }
}

/// Messages sent from a peer to the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMsg {
    /// Attach to a room (created on first join)
    JoinRoom(JoinPayload),

    /// Detach from the current room
    LeaveRoom,

    /// Normalized tilt sample from a controller
    GyroData {
        #[serde(rename = "roomId")]
        room_id: String,
        data: GyroSample,
    },

    /// Discrete button/touch command from a controller
    ControllerAction(ActionPayload),

    /// Switch the active game for everyone in the room
    SelectGame {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "gameId")]
        game_id: GameId,
    },

    /// Host status broadcast to controllers
    SyncGameStatus {
        #[serde(rename = "roomId")]
        room_id: String,
        status: GameStatus,
    },

    /// Controller re-centred its tilt offset
    ResetPosition {
        #[serde(rename = "roomId")]
        room_id: String,
    },
}

impl ClientMsg {
    /// Room id carried by the payload, if any
    pub fn room_id(&self) -> Option<&str> {
        match self {
            Self::JoinRoom(payload) => Some(payload.room_id()),
            Self::LeaveRoom => None,
            Self::GyroData { room_id, .. }
            | Self::SelectGame { room_id, .. }
            | Self::SyncGameStatus { room_id, .. }
            | Self::ResetPosition { room_id } => Some(room_id),
            Self::ControllerAction(payload) => payload.room_id(),
        }
    }

    /// Event name as it appears on the wire (for logging)
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::JoinRoom(_) => "join-room",
            Self::LeaveRoom => "leave-room",
            Self::GyroData { .. } => "gyro-data",
            Self::ControllerAction(_) => "controller-action",
            Self::SelectGame { .. } => "select-game",
            Self::SyncGameStatus { .. } => "sync-game-status",
            Self::ResetPosition { .. } => "reset-position",
        }
    }
}

/// Messages sent from the relay to a peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMsg {
    /// Join acknowledgement with the role the registry assigned
    RoomJoined {
        #[serde(rename = "roomId")]
        room_id: String,
        role: Role,
    },

    /// A controller attached to the host's room
    ControllerConnected,

    /// A controller left or dropped
    ControllerDisconnected,

    /// Relay of `gyro-data`
    UpdateGameState(GyroSample),

    /// Relay of `controller-action` (action string only)
    ControllerAction(String),

    /// Relay of `select-game`
    GameChanged(GameId),

    /// Relay of the host's status
    SyncGameStatus(GameStatus),

    /// Relay of `reset-position`
    ResetGamePosition,
}
