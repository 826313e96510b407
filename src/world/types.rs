//! Identifiers and replicated row types
//! Rows mirror the authoritative tables; the client never mutates them.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-assigned entity identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

/// Server-assigned player identifier, unique per session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

/// Connection identity credential issued by the data store at connect time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(pub Uuid);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `entity` table row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityRow {
    pub entity_id: EntityId,
    pub position: Vec2,
    pub mass: u32,
}

/// `movement_controller` table row: joins an entity to its controlling player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementControllerRow {
    pub entity_id: EntityId,
    pub player_id: PlayerId,
    /// Horizontal movement speed
    pub move_speed: f32,
    /// Jump impulse strength
    pub jump_force: f32,
    /// Ground check result
    pub can_jump: bool,
}

/// `player` table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRow {
    pub identity: Identity,
    pub player_id: PlayerId,
    pub name: String,
}

/// Intent read from the input device for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawIntent {
    /// Horizontal axis (-1.0 = full left, 1.0 = full right)
    pub horizontal: f32,
    /// Jump button currently held
    pub jump_held: bool,
}
