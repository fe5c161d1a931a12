//! Registry of tagged entities, kept in sync with `Tag` components.
//!
//! Replaces scene-wide "find by tag" scans: the player is looked up here
//! instead of searching every entity.

use bevy::prelude::*;
use std::collections::HashMap;

use super::layers::Tag;

/// Entities grouped by their current tag, in the order they were tagged.
#[derive(Resource, Default, Debug)]
pub struct TagIndex {
    by_tag: HashMap<Tag, Vec<Entity>>,
}

impl TagIndex {
    pub fn insert(&mut self, entity: Entity, tag: Tag) {
        self.remove(entity);
        self.by_tag.entry(tag).or_default().push(entity);
    }

    pub fn remove(&mut self, entity: Entity) {
        for entities in self.by_tag.values_mut() {
            entities.retain(|e| *e != entity);
        }
    }

    /// First entity carrying `tag`, if any.
    pub fn find_tagged(&self, tag: Tag) -> Option<Entity> {
        self.tagged(tag).first().copied()
    }

    pub fn tagged(&self, tag: Tag) -> &[Entity] {
        self.by_tag.get(&tag).map_or(&[], Vec::as_slice)
    }

    pub fn count(&self, tag: Tag) -> usize {
        self.tagged(tag).len()
    }
}

/// Keep the index in step with added, changed and removed tags.
pub fn sync_tag_index(
    mut index: ResMut<TagIndex>,
    changed: Query<(Entity, &Tag), Changed<Tag>>,
    mut removed: RemovedComponents<Tag>,
) {
    for entity in removed.read() {
        index.remove(entity);
    }

    for (entity, tag) in changed.iter() {
        index.insert(entity, *tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retagging_moves_entity() {
        let mut index = TagIndex::default();
        let enemy = Entity::from_raw(3);
        index.insert(enemy, Tag::Enemy);
        index.insert(enemy, Tag::Corpse);

        assert_eq!(index.count(Tag::Enemy), 0);
        assert_eq!(index.find_tagged(Tag::Corpse), Some(enemy));
    }

    #[test]
    fn keeps_tagging_order() {
        let mut index = TagIndex::default();
        index.insert(Entity::from_raw(2), Tag::Player);
        index.insert(Entity::from_raw(1), Tag::Player);
        assert_eq!(index.find_tagged(Tag::Player), Some(Entity::from_raw(2)));

        index.remove(Entity::from_raw(2));
        assert_eq!(index.find_tagged(Tag::Player), Some(Entity::from_raw(1)));
        assert_eq!(index.find_tagged(Tag::Obstacle), None);
    }

    #[test]
    fn system_tracks_tag_changes() {
        let mut app = App::new();
        app.init_resource::<TagIndex>()
            .add_systems(Update, sync_tag_index);

        let player = app.world_mut().spawn(Tag::Player).id();
        let enemy = app.world_mut().spawn(Tag::Enemy).id();
        app.update();
        assert_eq!(app.world().resource::<TagIndex>().find_tagged(Tag::Player), Some(player));

        app.world_mut().entity_mut(enemy).insert(Tag::Corpse);
        app.world_mut().despawn(player);
        app.update();

        let index = app.world().resource::<TagIndex>();
        assert_eq!(index.find_tagged(Tag::Player), None);
        assert_eq!(index.tagged(Tag::Corpse), &[enemy]);
        assert_eq!(index.count(Tag::Enemy), 0);
    }
}
