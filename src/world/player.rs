//! Player records and the ownership sets keyed by them

use std::collections::HashMap;

use tracing::{debug, info};

use crate::session::signals::SignalSender;

use super::ownership::OwnershipSet;
use super::types::{EntityId, Identity, PlayerId};

/// Client-side record of a connected player
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub player_id: PlayerId,
    pub identity: Identity,
    /// True for exactly one player per process once connected
    pub is_local: bool,
}

/// Players known to the session, the local-player slot and the ownership
/// sets.
#[derive(Debug, Default)]
pub struct PlayerRoster {
    players: HashMap<PlayerId, Player>,
    local: Option<PlayerId>,
    ownership: HashMap<PlayerId, OwnershipSet>,
}

impl PlayerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.get(&player_id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn local_player(&self) -> Option<&Player> {
        self.local.and_then(|id| self.players.get(&id))
    }

    pub fn local_ownership(&self) -> Option<&OwnershipSet> {
        self.local.and_then(|id| self.ownership.get(&id))
    }

    pub fn ownership(&self, player_id: PlayerId) -> Option<&OwnershipSet> {
        self.ownership.get(&player_id)
    }

    /// Materialize a player record if unseen. A local record binds the
    /// local-player slot and gets an ownership set signalling on `signals`.
    /// Returns whether a record was created.
    pub(crate) fn materialize(
        &mut self,
        player_id: PlayerId,
        identity: Identity,
        is_local: bool,
        signals: &SignalSender,
    ) -> bool {
        if self.players.contains_key(&player_id) {
            return false;
        }

        self.players.insert(
            player_id,
            Player {
                player_id,
                identity,
                is_local,
            },
        );

        if is_local {
            self.local = Some(player_id);
            self.ownership
                .insert(player_id, OwnershipSet::local(player_id, signals.clone()));
            info!(player_id = %player_id, identity = %identity, "Local player bound");
        } else {
            debug!(player_id = %player_id, "Remote player tracked");
        }
        true
    }

    /// Give `entity_id` to `player_id`, taking it out of any other set first.
    /// Returns whether the entity was newly attached; false when the player
    /// already held it or has no ownership set.
    pub(crate) fn assign(&mut self, entity_id: EntityId, player_id: PlayerId) -> bool {
        for (owner, set) in self.ownership.iter_mut() {
            if *owner != player_id {
                set.detach(entity_id);
            }
        }

        match self.ownership.get_mut(&player_id) {
            Some(set) => set.attach(entity_id),
            None => false,
        }
    }

    /// Take `entity_id` out of whichever set holds it, returning that owner
    pub(crate) fn release(&mut self, entity_id: EntityId) -> Option<PlayerId> {
        self.ownership
            .iter_mut()
            .find_map(|(owner, set)| set.detach(entity_id).then_some(*owner))
    }

    /// Drop a player record along with its ownership set
    pub(crate) fn remove(&mut self, player_id: PlayerId) -> Option<(Player, Option<OwnershipSet>)> {
        let player = self.players.remove(&player_id)?;
        let set = self.ownership.remove(&player_id);
        if self.local == Some(player_id) {
            self.local = None;
            info!(player_id = %player_id, "Local player unbound");
        }
        Some((player, set))
    }

    pub(crate) fn clear(&mut self) {
        for set in self.ownership.values_mut() {
            set.clear();
        }
        self.ownership.clear();
        self.players.clear();
        self.local = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::signals;
    use uuid::Uuid;

    fn identity() -> Identity {
        Identity(Uuid::new_v4())
    }

    #[test]
    fn local_player_gets_ownership_set() {
        let tx = signals::channel();
        let mut roster = PlayerRoster::new();
        assert!(roster.materialize(PlayerId(1), identity(), true, &tx));
        assert!(roster.materialize(PlayerId(2), identity(), false, &tx));
        assert!(!roster.materialize(PlayerId(1), identity(), true, &tx));

        assert_eq!(roster.local_player().map(|p| p.player_id), Some(PlayerId(1)));
        assert!(roster.local_ownership().is_some());
        assert!(roster.ownership(PlayerId(2)).is_none());
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn assign_keeps_ownership_exclusive() {
        let tx = signals::channel();
        let mut roster = PlayerRoster::new();
        roster.materialize(PlayerId(1), identity(), true, &tx);
        roster.ownership.insert(PlayerId(2), OwnershipSet::new(PlayerId(2)));

        assert!(roster.assign(EntityId(10), PlayerId(1)));
        assert!(!roster.assign(EntityId(10), PlayerId(1)));
        assert!(roster.assign(EntityId(10), PlayerId(2)));

        assert!(!roster.ownership(PlayerId(1)).unwrap().contains(EntityId(10)));
        assert!(roster.ownership(PlayerId(2)).unwrap().contains(EntityId(10)));
        assert_eq!(roster.release(EntityId(10)), Some(PlayerId(2)));
        assert_eq!(roster.release(EntityId(10)), None);
    }

    #[test]
    fn assign_to_untracked_player_attaches_nowhere() {
        let mut roster = PlayerRoster::new();
        assert!(!roster.assign(EntityId(1), PlayerId(5)));
    }

    #[test]
    fn removing_local_player_clears_slot() {
        let tx = signals::channel();
        let mut roster = PlayerRoster::new();
        roster.materialize(PlayerId(1), identity(), true, &tx);

        let (player, set) = roster.remove(PlayerId(1)).unwrap();
        assert!(player.is_local);
        assert!(set.is_some());
        assert!(roster.local_player().is_none());
        assert!(roster.remove(PlayerId(1)).is_none());
    }
}
