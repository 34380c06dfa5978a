// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Groups
//!
//! A [`Group`] is a live cache of the entities satisfying one [`Matcher`].
//! The pool feeds it one entity at a time, and only for component indices
//! the matcher references, so membership never needs a full rescan.
//!
//! Members are kept in a dense vector with a position map (the same
//! swap-remove layout as a sparse set), which makes insert, remove and
//! containment O(1) and lets [`Group::entities`] hand out a plain slice.

use crate::ecs::{
    Component, ComponentIndex, Entity, EntityRecord, ListenerId, Matcher, PoolError, PoolResult,
    Signal,
};
use std::collections::HashMap;

/// Handle to a group cached by a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(usize);

impl GroupId {
    pub(crate) fn new(index: usize) -> Self {
        GroupId(index)
    }

    /// Position of the group in the pool's group list
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Event channels a group exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupEventKind {
    /// An entity started matching
    Added,
    /// An entity stopped matching
    Removed,
    /// A member's component value was replaced
    Updated,
}

/// Notification emitted by a group
///
/// `members` is the group's membership after the change, so an observer
/// sees an added entity already listed and a removed one already gone.
#[derive(Debug, Clone, Copy)]
pub enum GroupEvent<'a> {
    /// `entity` joined the group
    EntityAdded {
        /// Group that changed
        group: GroupId,
        /// New member
        entity: Entity,
        /// Slot whose change caused the join; `None` when the entity was created
        index: Option<ComponentIndex>,
        /// Component involved in the change, if any
        component: Option<&'a dyn Component>,
        /// Members after the join
        members: &'a [Entity],
    },
    /// `entity` left the group
    EntityRemoved {
        /// Group that changed
        group: GroupId,
        /// Former member
        entity: Entity,
        /// Slot whose change caused the leave; `None` when the entity was destroyed
        index: Option<ComponentIndex>,
        /// Component involved in the change, if any
        component: Option<&'a dyn Component>,
        /// Members after the leave
        members: &'a [Entity],
    },
    /// A member's component at `index` was replaced; membership is unchanged
    EntityUpdated {
        /// Group of the member
        group: GroupId,
        /// Member whose value changed
        entity: Entity,
        /// Replaced slot
        index: ComponentIndex,
        /// Value before the replacement
        previous: &'a dyn Component,
        /// Value after the replacement
        current: &'a dyn Component,
        /// Current members
        members: &'a [Entity],
    },
}

impl GroupEvent<'_> {
    /// Channel this event is emitted on
    pub fn kind(&self) -> GroupEventKind {
        match self {
            GroupEvent::EntityAdded { .. } => GroupEventKind::Added,
            GroupEvent::EntityRemoved { .. } => GroupEventKind::Removed,
            GroupEvent::EntityUpdated { .. } => GroupEventKind::Updated,
        }
    }

    /// Entity the event is about
    pub fn entity(&self) -> Entity {
        match *self {
            GroupEvent::EntityAdded { entity, .. }
            | GroupEvent::EntityRemoved { entity, .. }
            | GroupEvent::EntityUpdated { entity, .. } => entity,
        }
    }

    /// Group membership as of this event
    pub fn members(&self) -> &[Entity] {
        match *self {
            GroupEvent::EntityAdded { members, .. }
            | GroupEvent::EntityRemoved { members, .. }
            | GroupEvent::EntityUpdated { members, .. } => members,
        }
    }
}

/// Observer list for group events
pub type GroupSignal = Signal<dyn FnMut(&GroupEvent<'_>)>;

/// Live set of entities satisfying a matcher
#[derive(Debug)]
pub struct Group {
    id: GroupId,
    matcher: Matcher,
    entities: Vec<Entity>,
    positions: HashMap<Entity, usize>,
    on_entity_added: GroupSignal,
    on_entity_removed: GroupSignal,
    on_entity_updated: GroupSignal,
}

impl Group {
    pub(crate) fn new(id: GroupId, matcher: Matcher) -> Self {
        Group {
            id,
            matcher,
            entities: Vec::new(),
            positions: HashMap::new(),
            on_entity_added: GroupSignal::new(),
            on_entity_removed: GroupSignal::new(),
            on_entity_updated: GroupSignal::new(),
        }
    }

    /// Handle of this group in its pool
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Predicate this group caches
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Current members
    ///
    /// Order is stable until the next membership change.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Check membership
    pub fn contains(&self, entity: Entity) -> bool {
        self.positions.contains_key(&entity)
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the group has no members
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The only member, if any
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::SingleEntity`] when more than one entity matches.
    pub fn single_entity(&self) -> PoolResult<Option<Entity>> {
        match self.entities.len() {
            0 => Ok(None),
            1 => Ok(Some(self.entities[0])),
            count => Err(PoolError::SingleEntity {
                matcher: self.matcher.id().clone(),
                count,
            }),
        }
    }

    /// Subscribe to one event channel
    pub fn subscribe<C>(&mut self, kind: GroupEventKind, callback: C) -> ListenerId
    where
        C: FnMut(&GroupEvent<'_>) + 'static,
    {
        self.signal_mut(kind).connect(Box::new(callback))
    }

    /// Drop a subscription; returns false if it was not connected
    pub fn unsubscribe(&mut self, kind: GroupEventKind, id: ListenerId) -> bool {
        self.signal_mut(kind).disconnect(id)
    }

    fn signal_mut(&mut self, kind: GroupEventKind) -> &mut GroupSignal {
        match kind {
            GroupEventKind::Added => &mut self.on_entity_added,
            GroupEventKind::Removed => &mut self.on_entity_removed,
            GroupEventKind::Updated => &mut self.on_entity_updated,
        }
    }

    /// Seed membership from the live entities without emitting events
    pub(crate) fn seed(&mut self, candidates: &[Entity], records: &[EntityRecord], parallel_threshold: usize) {
        if candidates.len() >= parallel_threshold {
            for entity in matching_entities(&self.matcher, candidates, records) {
                self.insert(entity);
            }
        } else {
            for &entity in candidates {
                self.handle_entity_silently(entity, &records[entity.slot()]);
            }
        }
    }

    /// Re-evaluate one entity without emitting events
    pub(crate) fn handle_entity_silently(&mut self, entity: Entity, record: &EntityRecord) {
        if self.matcher.matches(record) {
            self.insert(entity);
        } else {
            self.remove(entity);
        }
    }

    /// Re-evaluate one entity after a lifecycle or presence change
    ///
    /// `live` is false while the entity is being destroyed, which forces it
    /// out of the group. `change` is the slot and component that changed, or
    /// `None` for creation and destruction. Returns the membership
    /// transition, if there was one.
    pub(crate) fn handle_entity(
        &mut self,
        entity: Entity,
        record: &EntityRecord,
        live: bool,
        change: Option<(ComponentIndex, &dyn Component)>,
    ) -> Option<GroupEventKind> {
        let matches = live && self.matcher.matches(record);
        let (index, component) = match change {
            Some((index, component)) => (Some(index), Some(component)),
            None => (None, None),
        };
        if matches && self.insert(entity) {
            self.on_entity_added.emit(&GroupEvent::EntityAdded {
                group: self.id,
                entity,
                index,
                component,
                members: &self.entities,
            });
            Some(GroupEventKind::Added)
        } else if !matches && self.remove(entity) {
            self.on_entity_removed.emit(&GroupEvent::EntityRemoved {
                group: self.id,
                entity,
                index,
                component,
                members: &self.entities,
            });
            Some(GroupEventKind::Removed)
        } else {
            None
        }
    }

    /// Notify value observers of a replacement on a member
    ///
    /// Presence did not change, so membership is left alone. Returns true if
    /// the entity is a member and observers were notified.
    pub(crate) fn update_entity(
        &mut self,
        entity: Entity,
        index: ComponentIndex,
        previous: &dyn Component,
        current: &dyn Component,
    ) -> bool {
        if !self.contains(entity) {
            return false;
        }
        self.on_entity_updated.emit(&GroupEvent::EntityUpdated {
            group: self.id,
            entity,
            index,
            previous,
            current,
            members: &self.entities,
        });
        true
    }

    fn insert(&mut self, entity: Entity) -> bool {
        if self.positions.contains_key(&entity) {
            return false;
        }
        self.positions.insert(entity, self.entities.len());
        self.entities.push(entity);
        debug_assert_eq!(self.positions.len(), self.entities.len());
        true
    }

    fn remove(&mut self, entity: Entity) -> bool {
        let Some(position) = self.positions.remove(&entity) else {
            return false;
        };
        self.entities.swap_remove(position);
        if let Some(&moved) = self.entities.get(position) {
            self.positions.insert(moved, position);
        }
        debug_assert_eq!(self.positions.len(), self.entities.len());
        true
    }
}

#[cfg(feature = "parallel")]
fn matching_entities(matcher: &Matcher, candidates: &[Entity], records: &[EntityRecord]) -> Vec<Entity> {
    use rayon::prelude::*;

    candidates
        .par_iter()
        .copied()
        .filter(|entity| matcher.matches(&records[entity.slot()]))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn matching_entities(matcher: &Matcher, candidates: &[Entity], records: &[EntityRecord]) -> Vec<Entity> {
    candidates
        .iter()
        .copied()
        .filter(|entity| matcher.matches(&records[entity.slot()]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::EntityId;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, PartialEq)]
    struct Value(i32);
    impl Component for Value {}

    struct Fixture {
        records: Vec<EntityRecord>,
        entities: Vec<Entity>,
    }

    impl Fixture {
        fn new(count: usize, total: usize) -> Self {
            let mut records = Vec::new();
            let mut entities = Vec::new();
            for slot in 0..count {
                let mut record = EntityRecord::new(total);
                let id = EntityId::generate();
                record.revive(id, "e", slot as u64);
                records.push(record);
                entities.push(Entity::new(slot, id));
            }
            Fixture { records, entities }
        }

        fn add(&mut self, slot: usize, index: ComponentIndex) {
            self.records[slot].add(index, Box::new(Value(index as i32))).unwrap();
        }
    }

    fn recording(group: &mut Group, kind: GroupEventKind) -> Rc<RefCell<Vec<Entity>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        group.subscribe(kind, move |event: &GroupEvent<'_>| sink.borrow_mut().push(event.entity()));
        seen
    }

    #[test]
    fn test_handle_entity_transitions() {
        let mut fixture = Fixture::new(1, 2);
        let entity = fixture.entities[0];
        let mut group = Group::new(GroupId::new(0), Matcher::all_of([0, 1]));
        let added = recording(&mut group, GroupEventKind::Added);
        let removed = recording(&mut group, GroupEventKind::Removed);
        let marker: &dyn Component = &Value(0);

        fixture.add(0, 0);
        assert_eq!(group.handle_entity(entity, &fixture.records[0], true, Some((0, marker))), None);
        assert!(group.is_empty());

        fixture.add(0, 1);
        assert_eq!(
            group.handle_entity(entity, &fixture.records[0], true, Some((1, marker))),
            Some(GroupEventKind::Added)
        );
        assert_eq!(group.entities(), &[entity]);

        // Already a member: idempotent
        assert_eq!(group.handle_entity(entity, &fixture.records[0], true, Some((1, marker))), None);
        assert_eq!(added.borrow().len(), 1);

        fixture.records[0].remove(1).unwrap();
        assert_eq!(
            group.handle_entity(entity, &fixture.records[0], true, Some((1, marker))),
            Some(GroupEventKind::Removed)
        );
        assert!(!group.contains(entity));
        assert_eq!(*removed.borrow(), vec![entity]);
    }

    #[test]
    fn test_update_entity_only_for_members() {
        let mut fixture = Fixture::new(2, 1);
        fixture.add(0, 0);
        let mut group = Group::new(GroupId::new(0), Matcher::all_of([0]));
        let updated = recording(&mut group, GroupEventKind::Updated);
        group.handle_entity_silently(fixture.entities[0], &fixture.records[0]);

        let (previous, current) = (Value(1), Value(2));
        assert!(group.update_entity(fixture.entities[0], 0, &previous, &current));
        assert!(!group.update_entity(fixture.entities[1], 0, &previous, &current));
        assert_eq!(*updated.borrow(), vec![fixture.entities[0]]);
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_silent_seeding_emits_nothing() {
        let mut fixture = Fixture::new(4, 2);
        fixture.add(1, 0);
        fixture.add(3, 0);
        let mut group = Group::new(GroupId::new(0), Matcher::all_of([0]));
        let added = recording(&mut group, GroupEventKind::Added);

        group.seed(&fixture.entities, &fixture.records, usize::MAX);
        assert_eq!(group.entities(), &[fixture.entities[1], fixture.entities[3]]);
        assert!(added.borrow().is_empty());
    }

    #[test]
    fn test_parallel_and_sequential_seeding_agree() {
        let mut fixture = Fixture::new(64, 3);
        for slot in 0..64 {
            if slot % 3 == 0 {
                fixture.add(slot, 0);
            }
            if slot % 2 == 0 {
                fixture.add(slot, 1);
            }
        }
        let matcher = Matcher::all_of([0]).with_none_of([1]);

        let mut sequential = Group::new(GroupId::new(0), matcher.clone());
        sequential.seed(&fixture.entities, &fixture.records, usize::MAX);
        let mut parallel = Group::new(GroupId::new(1), matcher);
        parallel.seed(&fixture.entities, &fixture.records, 0);

        assert_eq!(sequential.entities(), parallel.entities());
        assert_eq!(sequential.len(), 11);
    }

    #[test]
    fn test_swap_remove_keeps_positions() {
        let mut fixture = Fixture::new(3, 1);
        for slot in 0..3 {
            fixture.add(slot, 0);
        }
        let mut group = Group::new(GroupId::new(0), Matcher::all_of([0]));
        group.seed(&fixture.entities, &fixture.records, usize::MAX);

        fixture.records[0].remove(0).unwrap();
        group.handle_entity_silently(fixture.entities[0], &fixture.records[0]);

        assert_eq!(group.len(), 2);
        assert!(group.contains(fixture.entities[1]));
        assert!(group.contains(fixture.entities[2]));

        fixture.records[2].remove(0).unwrap();
        group.handle_entity_silently(fixture.entities[2], &fixture.records[2]);
        assert_eq!(group.entities(), &[fixture.entities[1]]);
    }

    #[test]
    fn test_single_entity() {
        let mut fixture = Fixture::new(2, 1);
        let mut group = Group::new(GroupId::new(0), Matcher::all_of([0]));
        assert_eq!(group.single_entity(), Ok(None));

        fixture.add(0, 0);
        group.handle_entity_silently(fixture.entities[0], &fixture.records[0]);
        assert_eq!(group.single_entity(), Ok(Some(fixture.entities[0])));

        fixture.add(1, 0);
        group.handle_entity_silently(fixture.entities[1], &fixture.records[1]);
        assert!(matches!(group.single_entity(), Err(PoolError::SingleEntity { count: 2, .. })));
    }

    #[test]
    fn test_unsubscribe() {
        let mut fixture = Fixture::new(1, 1);
        let mut group = Group::new(GroupId::new(0), Matcher::all_of([0]));
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        let id = group.subscribe(GroupEventKind::Added, move |_: &GroupEvent<'_>| *counter.borrow_mut() += 1);

        assert!(group.unsubscribe(GroupEventKind::Added, id));
        assert!(!group.unsubscribe(GroupEventKind::Removed, id));

        fixture.add(0, 0);
        let marker: &dyn Component = &Value(0);
        group.handle_entity(fixture.entities[0], &fixture.records[0], true, Some((0, marker)));
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn test_events_carry_post_change_members() {
        let mut fixture = Fixture::new(2, 1);
        let mut group = Group::new(GroupId::new(0), Matcher::all_of([0]));
        let seen = Rc::new(RefCell::new(Vec::new()));
        for kind in [GroupEventKind::Added, GroupEventKind::Removed] {
            let sink = Rc::clone(&seen);
            group.subscribe(kind, move |event: &GroupEvent<'_>| {
                let listed = event.members().contains(&event.entity());
                sink.borrow_mut().push((event.kind(), listed, event.members().len()));
            });
        }
        let marker: &dyn Component = &Value(0);

        fixture.add(0, 0);
        fixture.add(1, 0);
        group.handle_entity(fixture.entities[0], &fixture.records[0], true, Some((0, marker)));
        group.handle_entity(fixture.entities[1], &fixture.records[1], true, Some((0, marker)));
        fixture.records[0].remove(0).unwrap();
        group.handle_entity(fixture.entities[0], &fixture.records[0], true, Some((0, marker)));

        assert_eq!(
            *seen.borrow(),
            vec![
                (GroupEventKind::Added, true, 1),
                (GroupEventKind::Added, true, 2),
                (GroupEventKind::Removed, false, 1),
            ]
        );
    }

    #[test]
    fn test_lifecycle_changes_without_component() {
        let fixture = Fixture::new(1, 2);
        let entity = fixture.entities[0];
        let mut group = Group::new(GroupId::new(0), Matcher::none_of([1]));
        let causes = Rc::new(RefCell::new(Vec::new()));
        for kind in [GroupEventKind::Added, GroupEventKind::Removed] {
            let sink = Rc::clone(&causes);
            group.subscribe(kind, move |event: &GroupEvent<'_>| {
                if let GroupEvent::EntityAdded { index, component, .. }
                | GroupEvent::EntityRemoved { index, component, .. } = event
                {
                    sink.borrow_mut().push((*index, component.is_none()));
                }
            });
        }

        // A fresh entity matches a purely negative matcher
        assert_eq!(
            group.handle_entity(entity, &fixture.records[0], true, None),
            Some(GroupEventKind::Added)
        );
        // A destroyed entity never stays a member
        assert_eq!(
            group.handle_entity(entity, &fixture.records[0], false, None),
            Some(GroupEventKind::Removed)
        );
        assert!(group.is_empty());
        assert_eq!(*causes.borrow(), vec![(None, true), (None, true)]);
    }
}
