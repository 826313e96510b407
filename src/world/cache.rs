//! Local mirror of the subscribed tables

use std::collections::HashMap;

use super::types::{EntityId, EntityRow, Identity, MovementControllerRow, PlayerId, PlayerRow};

/// Client-side copy of the `entity`, `movement_controller` and `player`
/// tables. A transaction's rows all land here before its handlers run.
#[derive(Debug, Default)]
pub struct ClientCache {
    entities: HashMap<EntityId, EntityRow>,
    controllers: HashMap<EntityId, MovementControllerRow>,
    players: HashMap<PlayerId, PlayerRow>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(&self, entity_id: EntityId) -> Option<&EntityRow> {
        self.entities.get(&entity_id)
    }

    pub fn controller(&self, entity_id: EntityId) -> Option<&MovementControllerRow> {
        self.controllers.get(&entity_id)
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&PlayerRow> {
        self.players.get(&player_id)
    }

    pub fn player_by_identity(&self, identity: Identity) -> Option<&PlayerRow> {
        self.players.values().find(|p| p.identity == identity)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub(crate) fn put_entity(&mut self, row: EntityRow) {
        self.entities.insert(row.entity_id, row);
    }

    pub(crate) fn delete_entity(&mut self, entity_id: EntityId) -> Option<EntityRow> {
        self.entities.remove(&entity_id)
    }

    pub(crate) fn put_controller(&mut self, row: MovementControllerRow) {
        self.controllers.insert(row.entity_id, row);
    }

    pub(crate) fn delete_controller(&mut self, entity_id: EntityId) -> Option<MovementControllerRow> {
        self.controllers.remove(&entity_id)
    }

    pub(crate) fn put_player(&mut self, row: PlayerRow) {
        self.players.insert(row.player_id, row);
    }

    pub(crate) fn delete_player(&mut self, player_id: PlayerId) -> Option<PlayerRow> {
        self.players.remove(&player_id)
    }
}
