//! Per-player ownership sets and the aggregates derived from them

use std::collections::BTreeSet;

use glam::Vec2;
use tracing::{debug, info};

use crate::session::signals::{self, SessionSignal, SignalSender};

use super::types::{EntityId, PlayerId};

/// Read-time lookup of the state an aggregate needs for one entity
pub trait EntityResolver {
    /// Authoritative mass, `None` if the row is gone
    fn mass(&self, entity_id: EntityId) -> Option<u32>;

    /// Current (interpolated) view position, `None` if the view is gone
    fn view_position(&self, entity_id: EntityId) -> Option<Vec2>;
}

/// Entities one player currently controls.
///
/// Aggregates are recomputed from the resolver on every call and never
/// cached, so they are at most one tick stale.
#[derive(Debug)]
pub struct OwnershipSet {
    owner: PlayerId,
    members: BTreeSet<EntityId>,
    /// Present only for the local player's set
    eliminated_tx: Option<SignalSender>,
}

impl OwnershipSet {
    /// Set for a remote player; never signals elimination
    pub fn new(owner: PlayerId) -> Self {
        Self {
            owner,
            members: BTreeSet::new(),
            eliminated_tx: None,
        }
    }

    /// Set for the local player, signalling elimination on `signals`
    pub fn local(owner: PlayerId, signals: SignalSender) -> Self {
        Self {
            owner,
            members: BTreeSet::new(),
            eliminated_tx: Some(signals),
        }
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    pub fn is_local(&self) -> bool {
        self.eliminated_tx.is_some()
    }

    /// Add an entity; idempotent. Returns whether it was newly added.
    pub fn attach(&mut self, entity_id: EntityId) -> bool {
        let added = self.members.insert(entity_id);
        if added {
            debug!(player_id = %self.owner, entity_id = %entity_id, "Entity attached");
        }
        added
    }

    /// Remove an entity, returning whether it was a member.
    pub fn detach(&mut self, entity_id: EntityId) -> bool {
        if !self.members.remove(&entity_id) {
            return false;
        }
        debug!(player_id = %self.owner, entity_id = %entity_id, "Entity detached");

        if self.members.is_empty() {
            if let Some(tx) = &self.eliminated_tx {
                info!(player_id = %self.owner, "Local player eliminated");
                signals::emit(tx, SessionSignal::Eliminated);
            }
        }
        true
    }

    pub fn contains(&self, entity_id: EntityId) -> bool {
        self.members.contains(&entity_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.members.iter().copied()
    }

    /// Sum of member masses. Members that no longer resolve (deleted this
    /// tick) contribute zero.
    pub fn aggregate_mass(&self, resolver: &impl EntityResolver) -> u32 {
        self.members
            .iter()
            .filter_map(|&id| resolver.mass(id))
            .fold(0u32, u32::saturating_add)
    }

    /// Mass-weighted centre of the members' view positions.
    ///
    /// `None` for an empty set, or when no member resolves to a positive
    /// mass. Summation order may perturb the last bits of the result.
    pub fn aggregate_center(&self, resolver: &impl EntityResolver) -> Option<Vec2> {
        if self.members.is_empty() {
            return None;
        }

        let mut weighted = Vec2::ZERO;
        let mut total_mass = 0.0f32;
        for &id in &self.members {
            let (Some(mass), Some(position)) = (resolver.mass(id), resolver.view_position(id))
            else {
                continue;
            };
            weighted += position * mass as f32;
            total_mass += mass as f32;
        }

        (total_mass > 0.0).then(|| weighted / total_mass)
    }

    /// Drop every member without signalling
    pub(crate) fn clear(&mut self) {
        self.members.clear();
    }
}
