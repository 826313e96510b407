//! Registry of live entity views keyed by entity id

use std::collections::HashMap;

use super::types::{EntityId, EntityRow, PlayerId};
use super::view::EntityView;

/// Exclusive owner of every `EntityView` in the session
#[derive(Debug, Default)]
pub struct EntityRegistry {
    views: HashMap<EntityId, EntityView>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the view for an unseen id, or refresh the existing one.
    pub fn upsert_from_remote(&mut self, row: &EntityRow) -> &mut EntityView {
        self.views
            .entry(row.entity_id)
            .and_modify(|view| view.apply_row(row))
            .or_insert_with(|| EntityView::from_row(row))
    }

    /// Remove and return the view. Absent ids are not an error: deletes can
    /// race with local cleanup.
    pub fn remove(&mut self, entity_id: EntityId) -> Option<EntityView> {
        self.views.remove(&entity_id)
    }

    pub fn get(&self, entity_id: EntityId) -> Option<&EntityView> {
        self.views.get(&entity_id)
    }

    pub(crate) fn get_mut(&mut self, entity_id: EntityId) -> Option<&mut EntityView> {
        self.views.get_mut(&entity_id)
    }

    pub fn contains(&self, entity_id: EntityId) -> bool {
        self.views.contains_key(&entity_id)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityView> {
        self.views.values()
    }

    /// Remove every view tagged with `owner`, returning them
    pub(crate) fn remove_owned_by(&mut self, owner: PlayerId) -> Vec<EntityView> {
        let ids: Vec<EntityId> = self
            .views
            .values()
            .filter(|view| view.owner() == Some(owner))
            .map(EntityView::entity_id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.views.remove(&id))
            .collect()
    }

    pub(crate) fn interpolate_all(&mut self, dt: f32) {
        for view in self.views.values_mut() {
            view.interpolate(dt);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.views.clear();
    }
}
