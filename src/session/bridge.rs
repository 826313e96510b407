//! Translates replicated row changes into registry and ownership mutations

use tracing::{debug, info, warn};

use crate::net::protocol::{RowChange, RowEvent};
use crate::world::types::{
    EntityId, EntityRow, Identity, MovementControllerRow, PlayerId, PlayerRow,
};
use crate::world::World;

use super::signals::{self, SessionSignal, SignalSender};

/// Outcome of materializing an entity from its movement controller row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnResolution {
    /// View created and attached to the local player's ownership set
    LocalOwned(EntityId),
    /// View created for rendering only (remote or unknown owner)
    RemoteOnly(EntityId),
    /// The entity row could not be found; nothing was created
    Unresolvable,
}

/// The only writer of a session's `World`.
#[derive(Debug, Clone)]
pub struct ReplicationBridge {
    identity: Identity,
    signals: SignalSender,
}

impl ReplicationBridge {
    pub fn new(identity: Identity, signals: SignalSender) -> Self {
        Self { identity, signals }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Row identity equals the session's own identity
    pub fn is_local(&self, identity: Identity) -> bool {
        identity == self.identity
    }

    /// Apply one transaction: every row change lands in the cache first, then
    /// handlers run in commit order against the post-transaction cache.
    pub fn apply_transaction(&self, world: &mut World, events: Vec<RowEvent>) -> Vec<SpawnResolution> {
        for event in &events {
            apply_to_cache(world, event);
        }

        let mut spawns = Vec::new();
        for event in events {
            match event {
                RowEvent::MovementController(RowChange::Inserted { row }) => {
                    spawns.push(self.on_controller_inserted(world, &row));
                }
                RowEvent::MovementController(RowChange::Updated { old, new }) => {
                    self.on_controller_updated(world, &old, &new);
                }
                RowEvent::MovementController(RowChange::Deleted { row }) => {
                    debug!(entity_id = %row.entity_id, "Movement controller removed");
                }
                RowEvent::Entity(RowChange::Inserted { .. }) => {}
                RowEvent::Entity(RowChange::Updated { new, .. }) => {
                    self.on_entity_updated(world, &new);
                }
                RowEvent::Entity(RowChange::Deleted { row }) => {
                    self.on_entity_deleted(world, row.entity_id);
                }
                RowEvent::Player(RowChange::Inserted { row }) => {
                    self.on_player_inserted(world, &row);
                }
                RowEvent::Player(RowChange::Updated { .. }) => {}
                RowEvent::Player(RowChange::Deleted { row }) => {
                    self.on_player_deleted(world, row.player_id);
                }
            }
        }
        spawns
    }

    fn on_controller_inserted(&self, world: &mut World, row: &MovementControllerRow) -> SpawnResolution {
        let Some(entity_row) = world.cache.entity(row.entity_id).copied() else {
            warn!(entity_id = %row.entity_id, "Entity not found for movement controller");
            return SpawnResolution::Unresolvable;
        };

        let owner = self.resolve_player(world, row.player_id);
        let view = world.registry.upsert_from_remote(&entity_row);
        view.set_owner(owner.map(|(player_id, _)| player_id));

        match owner {
            Some((player_id, true)) => {
                if world.players.assign(row.entity_id, player_id) {
                    info!(entity_id = %row.entity_id, player_id = %player_id, "Local entity spawned");
                    signals::emit(
                        &self.signals,
                        SessionSignal::Spawned {
                            entity_id: row.entity_id,
                        },
                    );
                }
                SpawnResolution::LocalOwned(row.entity_id)
            }
            Some((player_id, false)) => {
                // Drops it from any other set, e.g. one we owned before
                world.players.assign(row.entity_id, player_id);
                debug!(entity_id = %row.entity_id, player_id = %player_id, "Remote entity spawned");
                SpawnResolution::RemoteOnly(row.entity_id)
            }
            None => {
                world.players.release(row.entity_id);
                warn!(
                    entity_id = %row.entity_id,
                    player_id = %row.player_id,
                    "Controller references unknown player, tracking for rendering only"
                );
                SpawnResolution::RemoteOnly(row.entity_id)
            }
        }
    }

    /// Controller reassigned to another player (split/merge)
    fn on_controller_updated(&self, world: &mut World, old: &MovementControllerRow, new: &MovementControllerRow) {
        if old.player_id == new.player_id {
            return;
        }
        if !world.registry.contains(new.entity_id) {
            debug!(entity_id = %new.entity_id, "Ownership change for untracked entity, skipping");
            return;
        }

        let owner = self.resolve_player(world, new.player_id);
        if let Some(view) = world.registry.get_mut(new.entity_id) {
            view.set_owner(owner.map(|(player_id, _)| player_id));
        }
        match owner {
            Some((player_id, is_local)) => {
                let attached = world.players.assign(new.entity_id, player_id);
                info!(
                    entity_id = %new.entity_id,
                    from = %old.player_id,
                    to = %player_id,
                    "Entity ownership changed"
                );
                if is_local && attached {
                    signals::emit(
                        &self.signals,
                        SessionSignal::Spawned {
                            entity_id: new.entity_id,
                        },
                    );
                }
            }
            None => {
                world.players.release(new.entity_id);
            }
        }
    }

    fn on_entity_updated(&self, world: &mut World, row: &EntityRow) {
        if !world.registry.contains(row.entity_id) {
            return;
        }
        world.registry.upsert_from_remote(row);
    }

    fn on_entity_deleted(&self, world: &mut World, entity_id: EntityId) {
        if world.registry.remove(entity_id).is_none() {
            debug!(entity_id = %entity_id, "Delete for untracked entity");
        }
        if let Some(owner) = world.players.release(entity_id) {
            debug!(entity_id = %entity_id, player_id = %owner, "Owned entity deleted");
        }
    }

    fn on_player_inserted(&self, world: &mut World, row: &PlayerRow) {
        let is_local = self.is_local(row.identity);
        world
            .players
            .materialize(row.player_id, row.identity, is_local, &self.signals);
    }

    fn on_player_deleted(&self, world: &mut World, player_id: PlayerId) {
        let Some((player, _set)) = world.players.remove(player_id) else {
            debug!(player_id = %player_id, "Delete for untracked player");
            return;
        };

        let views = world.registry.remove_owned_by(player_id);
        for view in &views {
            world.players.release(view.entity_id());
        }
        info!(
            player_id = %player_id,
            local = player.is_local,
            released_views = views.len(),
            "Player removed"
        );
    }

    /// Find or lazily create the record for `player_id`. Returns the id and
    /// whether it is the local player, or `None` if no player row exists.
    fn resolve_player(&self, world: &mut World, player_id: PlayerId) -> Option<(PlayerId, bool)> {
        if let Some(player) = world.players.get(player_id) {
            return Some((player_id, player.is_local));
        }

        let identity = world.cache.player(player_id)?.identity;
        let is_local = self.is_local(identity);
        world
            .players
            .materialize(player_id, identity, is_local, &self.signals);
        Some((player_id, is_local))
    }
}

fn apply_to_cache(world: &mut World, event: &RowEvent) {
    let cache = &mut world.cache;
    match event {
        RowEvent::Entity(change) => match change {
            RowChange::Inserted { row } | RowChange::Updated { new: row, .. } => {
                cache.put_entity(*row);
            }
            RowChange::Deleted { row } => {
                cache.delete_entity(row.entity_id);
            }
        },
        RowEvent::MovementController(change) => match change {
            RowChange::Inserted { row } | RowChange::Updated { new: row, .. } => {
                cache.put_controller(*row);
            }
            RowChange::Deleted { row } => {
                cache.delete_controller(row.entity_id);
            }
        },
        RowEvent::Player(change) => match change {
            RowChange::Inserted { row } | RowChange::Updated { new: row, .. } => {
                cache.put_player(row.clone());
            }
            RowChange::Deleted { row } => {
                cache.delete_player(row.player_id);
            }
        },
    }
}
