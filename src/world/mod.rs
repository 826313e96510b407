//! Replicated world state owned by one connected session

pub mod cache;
pub mod camera;
pub mod ownership;
pub mod player;
pub mod registry;
pub mod types;
pub mod view;

pub use cache::ClientCache;
pub use camera::CameraFollow;
pub use ownership::{EntityResolver, OwnershipSet};
pub use player::{Player, PlayerRoster};
pub use registry::EntityRegistry;
pub use view::EntityView;

use glam::Vec2;

use types::EntityId;

/// Everything the replication stream mutates.
///
/// Only the replication bridge writes to it; the frame loop reads through
/// the accessors.
#[derive(Debug, Default)]
pub struct World {
    pub(crate) cache: ClientCache,
    pub(crate) registry: EntityRegistry,
    pub(crate) players: PlayerRoster,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &ClientCache {
        &self.cache
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn players(&self) -> &PlayerRoster {
        &self.players
    }

    /// Resolver reading mass from the row cache and position from views
    pub fn resolver(&self) -> WorldResolver<'_> {
        WorldResolver {
            cache: &self.cache,
            registry: &self.registry,
        }
    }

    /// Total mass of the local player's entities
    pub fn total_mass(&self) -> Option<u32> {
        self.players
            .local_ownership()
            .map(|set| set.aggregate_mass(&self.resolver()))
    }

    /// Mass-weighted centre of the local player's entities
    pub fn center_of_mass(&self) -> Option<Vec2> {
        self.players
            .local_ownership()
            .and_then(|set| set.aggregate_center(&self.resolver()))
    }

    pub(crate) fn clear(&mut self) {
        self.registry.clear();
        self.players.clear();
        self.cache = ClientCache::new();
    }
}

#[derive(Clone, Copy)]
pub struct WorldResolver<'a> {
    cache: &'a ClientCache,
    registry: &'a EntityRegistry,
}

impl EntityResolver for WorldResolver<'_> {
    fn mass(&self, entity_id: EntityId) -> Option<u32> {
        self.cache.entity(entity_id).map(|row| row.mass)
    }

    fn view_position(&self, entity_id: EntityId) -> Option<Vec2> {
        self.registry.get(entity_id).map(|view| view.position)
    }
}
