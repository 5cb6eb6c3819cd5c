//! Room membership and scoped fan-out

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use super::{PeerId, Role, RoomId, Scope};
use crate::game::GameId;
use crate::ws::protocol::ServerMsg;

/// Outbound side of a connected peer
#[derive(Debug, Clone)]
pub struct PeerHandle {
    pub id: PeerId,
    pub tx: mpsc::Sender<ServerMsg>,
}

impl PeerHandle {
    pub fn new(id: PeerId, tx: mpsc::Sender<ServerMsg>) -> Self {
        Self { id, tx }
    }

    /// Non-blocking delivery; a full or closed channel drops this message only
    fn deliver(&self, msg: ServerMsg) -> bool {
        match self.tx.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(msg)) => {
                warn!(peer_id = %self.id, event = ?msg, "Outbound channel full, dropping message");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(peer_id = %self.id, "Outbound channel closed");
                false
            }
        }
    }
}

/// Where a peer is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub room_id: RoomId,
    pub role: Role,
}

/// Why a join was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    #[error("Room id must not be empty")]
    EmptyRoomId,

    #[error("Room {0} already has a host")]
    HostTaken(RoomId),

    #[error("Room {0} is full")]
    RoomFull(RoomId),
}

/// Public view of a room for the HTTP surface
#[derive(Debug, Clone, Serialize)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub has_host: bool,
    pub controllers: usize,
    pub last_game: Option<GameId>,
    pub created_at: String,
}

struct Room {
    host: Option<PeerHandle>,
    controllers: Vec<PeerHandle>,
    /// Last relayed `game-changed`, replayed to late controllers
    last_game: Option<GameId>,
    created_at: DateTime<Utc>,
}

impl Room {
    fn new() -> Self {
        Self {
            host: None,
            controllers: Vec::new(),
            last_game: None,
            created_at: Utc::now(),
        }
    }

    fn is_empty(&self) -> bool {
        self.host.is_none() && self.controllers.is_empty()
    }

    fn members(&self) -> impl Iterator<Item = &PeerHandle> {
        self.host.iter().chain(self.controllers.iter())
    }
}

/// Registry of all live rooms
pub struct RoomRegistry {
    rooms: DashMap<RoomId, Room>,
    peers: DashMap<PeerId, Membership>,
    max_controllers: usize,
}

impl RoomRegistry {
    pub fn new(max_controllers: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            peers: DashMap::new(),
            max_controllers: max_controllers.max(1),
        }
    }

    /// Attach `peer` to `room_id`, creating the room on first join.
    ///
    /// Without a requested role the peer becomes host if the seat is free,
    /// otherwise a controller. A peer already in another room is detached
    /// first.
    pub fn join(
        &self,
        peer: PeerHandle,
        room_id: &str,
        requested: Option<Role>,
    ) -> Result<Role, JoinError> {
        if room_id.is_empty() {
            return Err(JoinError::EmptyRoomId);
        }

        if self.peers.contains_key(&peer.id) {
            self.leave(peer.id);
        }

        let mut room = self.rooms.entry(room_id.to_string()).or_insert_with(Room::new);

        let role = match requested {
            Some(role) => role,
            None if room.host.is_none() => Role::Host,
            None => Role::Controller,
        };

        match role {
            Role::Host if room.host.is_some() => {
                return Err(JoinError::HostTaken(room_id.to_string()));
            }
            Role::Controller if room.controllers.len() >= self.max_controllers => {
                return Err(JoinError::RoomFull(room_id.to_string()));
            }
            _ => {}
        }

        peer.deliver(ServerMsg::RoomJoined {
            room_id: room_id.to_string(),
            role,
        });

        match role {
            Role::Host => {
                // Controllers that were waiting count as connected for the new host
                for _ in &room.controllers {
                    peer.deliver(ServerMsg::ControllerConnected);
                }
                room.host = Some(peer.clone());
            }
            Role::Controller => {
                if let Some(game) = room.last_game {
                    peer.deliver(ServerMsg::GameChanged(game));
                }
                if let Some(host) = &room.host {
                    host.deliver(ServerMsg::ControllerConnected);
                }
                room.controllers.push(peer.clone());
            }
        }
        drop(room);

        self.peers.insert(
            peer.id,
            Membership {
                room_id: room_id.to_string(),
                role,
            },
        );

        info!(room_id = %room_id, peer_id = %peer.id, role = ?role, "Peer joined room");
        Ok(role)
    }

    /// Detach a peer. The host learns about departing controllers; an empty
    /// room is dropped.
    pub fn leave(&self, peer_id: PeerId) -> Option<Membership> {
        let (_, membership) = self.peers.remove(&peer_id)?;

        let now_empty = match self.rooms.get_mut(&membership.room_id) {
            Some(mut room) => {
                match membership.role {
                    Role::Host => {
                        if room.host.as_ref().is_some_and(|h| h.id == peer_id) {
                            room.host = None;
                        }
                    }
                    Role::Controller => {
                        room.controllers.retain(|c| c.id != peer_id);
                        if let Some(host) = &room.host {
                            host.deliver(ServerMsg::ControllerDisconnected);
                        }
                    }
                }
                room.is_empty()
            }
            None => false,
        };

        if now_empty && self.rooms.remove_if(&membership.room_id, |_, r| r.is_empty()).is_some() {
            debug!(room_id = %membership.room_id, "Room closed");
        }

        info!(
            room_id = %membership.room_id,
            peer_id = %peer_id,
            role = ?membership.role,
            "Peer left room"
        );
        Some(membership)
    }

    /// Fan `msg` out to the sender's room within `scope`. Returns how many
    /// peers it reached.
    pub fn relay(&self, sender: PeerId, scope: Scope, msg: ServerMsg) -> usize {
        let Some(membership) = self.membership(sender) else {
            debug!(peer_id = %sender, "Relay from unattached peer dropped");
            return 0;
        };

        let Some(mut room) = self.rooms.get_mut(&membership.room_id) else {
            return 0;
        };

        if let ServerMsg::GameChanged(game) = &msg {
            room.last_game = Some(*game);
        }

        let targets: Vec<&PeerHandle> = match scope {
            Scope::Room => room.members().collect(),
            Scope::Host => room.host.iter().collect(),
            Scope::Controllers => room.controllers.iter().collect(),
        };

        targets
            .into_iter()
            .filter(|peer| peer.deliver(msg.clone()))
            .count()
    }

    pub fn membership(&self, peer_id: PeerId) -> Option<Membership> {
        self.peers.get(&peer_id).map(|m| m.value().clone())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn room_info(&self, room_id: &str) -> Option<RoomInfo> {
        self.rooms.get(room_id).map(|room| RoomInfo {
            room_id: room_id.to_string(),
            has_host: room.host.is_some(),
            controllers: room.controllers.len(),
            last_game: room.last_game,
            created_at: room.created_at.to_rfc3339(),
        })
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(4)
    }
}
