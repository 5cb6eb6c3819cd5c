//! Which role may send which message, and to whom it goes

use crate::room::{Membership, Role, Scope};
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Reasons a relayable message is dropped
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("{event} is not allowed from a {role:?}")]
    WrongRole { event: &'static str, role: Role },

    #[error("{event} names room {claimed} but sender is in {attached}")]
    RoomMismatch {
        event: &'static str,
        claimed: String,
        attached: String,
    },

    #[error("{0} is handled by the registry, not relayed")]
    NotRelayable(&'static str),
}

/// Map an inbound message to its outbound form and delivery scope.
///
/// | inbound | sender | scope | outbound |
/// |---|---|---|---|
/// | `gyro-data` | controller | host | `update-game-state` |
/// | `controller-action` | controller | host | `controller-action` |
/// | `select-game` | either | room | `game-changed` |
/// | `sync-game-status` | host | controllers | `sync-game-status` |
/// | `reset-position` | controller | host | `reset-game-position` |
pub fn route(sender: &Membership, msg: &ClientMsg) -> Result<(Scope, ServerMsg), RouteError> {
    let event = msg.event_name();

    if let Some(claimed) = msg.room_id() {
        if claimed != sender.room_id {
            return Err(RouteError::RoomMismatch {
                event,
                claimed: claimed.to_string(),
                attached: sender.room_id.clone(),
            });
        }
    }

    let require = |role: Role| {
        if sender.role == role {
            Ok(())
        } else {
            Err(RouteError::WrongRole {
                event,
                role: sender.role,
            })
        }
    };

    match msg {
        ClientMsg::JoinRoom(_) | ClientMsg::LeaveRoom => Err(RouteError::NotRelayable(event)),
        ClientMsg::GyroData { data, .. } => {
            require(Role::Controller)?;
            Ok((Scope::Host, ServerMsg::UpdateGameState(*data)))
        }
        ClientMsg::ControllerAction(payload) => {
            require(Role::Controller)?;
            Ok((Scope::Host, ServerMsg::ControllerAction(payload.action().to_string())))
        }
        ClientMsg::SelectGame { game_id, .. } => Ok((Scope::Room, ServerMsg::GameChanged(*game_id))),
        ClientMsg::SyncGameStatus { status, .. } => {
            require(Role::Host)?;
            Ok((Scope::Controllers, ServerMsg::SyncGameStatus(*status)))
        }
        ClientMsg::ResetPosition { .. } => {
            require(Role::Controller)?;
            Ok((Scope::Host, ServerMsg::ResetGamePosition))
        }
    }
}
