//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};

use crate::world::types::{EntityRow, Identity, MovementControllerRow, PlayerRow};

/// Tables the client subscribes to
pub const SUBSCRIBED_TABLES: [&str; 3] = ["entity", "movement_controller", "player"];

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Subscribe to every row of the listed tables
    Subscribe {
        tables: Vec<String>,
    },

    /// Join the arena under a display name
    EnterGame {
        name: String,
    },

    /// Latest sampled intent
    UpdatePlayerInput {
        /// Horizontal axis (-1.0 = full left, 1.0 = full right)
        horizontal: f32,
        /// Jump was freshly pressed since the previous transmission
        jump: bool,
    },
}

impl ClientMsg {
    pub fn subscribe_all() -> Self {
        Self::Subscribe {
            tables: SUBSCRIBED_TABLES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// First message after connecting
    IdentityToken {
        identity: Identity,
        /// Token to present on the next connection
        token: String,
    },

    /// Initial rows have all been delivered
    SubscriptionApplied,

    /// Row changes of one committed transaction, in commit order
    TransactionUpdate {
        events: Vec<RowEvent>,
    },

    /// Error message
    Error {
        code: String,
        message: String,
    },
}

/// A change to one row of a subscribed table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", content = "change", rename_all = "snake_case")]
pub enum RowEvent {
    Entity(RowChange<EntityRow>),
    MovementController(RowChange<MovementControllerRow>),
    Player(RowChange<PlayerRow>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RowChange<T> {
    Inserted { row: T },
    Updated { old: T, new: T },
    Deleted { row: T },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::types::EntityId;
    use glam::Vec2;

    #[test]
    fn decodes_transaction_update() {
        let json = r#"{
            "type": "transaction_update",
            "events": [
                {"table": "entity", "change": {"op": "updated",
                    "old": {"entity_id": 4, "position": [0.0, 0.0], "mass": 15},
                    "new": {"entity_id": 4, "position": [1.5, 2.0], "mass": 15}}}
            ]
        }"#;

        let msg: ServerMsg = serde_json::from_str(json).unwrap();
        let ServerMsg::TransactionUpdate { events } = msg else {
            panic!("unexpected message {msg:?}");
        };
        assert_eq!(
            events,
            vec![RowEvent::Entity(RowChange::Updated {
                old: EntityRow {
                    entity_id: EntityId(4),
                    position: Vec2::ZERO,
                    mass: 15,
                },
                new: EntityRow {
                    entity_id: EntityId(4),
                    position: Vec2::new(1.5, 2.0),
                    mass: 15,
                },
            })]
        );
    }

    #[test]
    fn input_call_is_tagged() {
        let json = serde_json::to_value(ClientMsg::UpdatePlayerInput {
            horizontal: -1.0,
            jump: true,
        })
        .unwrap();
        assert_eq!(json["type"], "update_player_input");
        assert_eq!(json["jump"], true);
    }
}
