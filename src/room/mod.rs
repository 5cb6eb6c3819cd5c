//! Room registry: who is attached to which room, and in what role

pub mod registry;

pub use registry::{JoinError, Membership, PeerHandle, RoomInfo, RoomRegistry};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Connection identifier assigned by the relay
pub type PeerId = Uuid;

/// Room identifier chosen by the peers
pub type RoomId = String;

/// Role a peer holds inside its room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Display side; runs the simulation
    Host,
    /// Phone side; produces tilt and actions
    Controller,
}

/// Delivery scope for a relayed message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every member, sender included
    Room,
    /// The host only
    Host,
    /// Every controller
    Controllers,
}

/// Short room id in the join-link style (6 hex characters)
pub fn generate_room_id() -> RoomId {
    Uuid::new_v4().simple().to_string()[..6].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_room_ids() {
        let id = generate_room_id();
        assert_eq!(id.len(), 6);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(generate_room_id(), generate_room_id());
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&Role::Host).unwrap(), "\"host\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"controller\"").unwrap(),
            Role::Controller
        );
    }
}
