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
//! Entity management
//!
//! An [`Entity`] is a lightweight handle: the storage slot it occupies in its
//! pool plus the [`EntityId`] of the current life of that slot. The pool owns
//! the [`EntityRecord`] behind the handle, i.e. the component slot array,
//! lifecycle flag and reference count. When a slot is recycled it gets a fresh
//! id, so handles from a previous life stop resolving.

use crate::ecs::{Component, ComponentIndex, ComponentSchema, PoolError, PoolResult, Signal};
use std::fmt;
use uuid::Uuid;

/// Process-unique identity of one entity life
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(Uuid);

impl EntityId {
    pub(crate) fn generate() -> Self {
        EntityId(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Entity handle
///
/// Cheap to copy and compare. Resolve it through the pool that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    slot: u32,
    id: EntityId,
}

impl Entity {
    pub(crate) fn new(slot: usize, id: EntityId) -> Self {
        Entity {
            slot: slot_to_u32(slot),
            id,
        }
    }

    /// Get the entity ID
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Storage slot inside the owning pool
    pub fn slot(&self) -> usize {
        self.slot as usize
    }
}

/// Narrow a record slot to the width stored in handles
///
/// # Panics
///
/// Panics if `slot` does not fit in a `u32`.
pub(crate) fn slot_to_u32(slot: usize) -> u32 {
    match u32::try_from(slot) {
        Ok(slot) => slot,
        Err(_) => panic!("Entity slot {} exceeds the u32 handle range", slot),
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}, slot: {})", self.id.0, self.slot)
    }
}

/// Change notification emitted by a single entity
#[derive(Debug, Clone, Copy)]
pub enum EntityEvent<'a> {
    /// A component was stored in an empty slot
    ComponentAdded {
        /// Mutated entity
        entity: Entity,
        /// Slot that changed
        index: ComponentIndex,
        /// The stored component
        component: &'a dyn Component,
    },
    /// A component was taken out of its slot
    ComponentRemoved {
        /// Mutated entity
        entity: Entity,
        /// Slot that changed
        index: ComponentIndex,
        /// The removed component
        component: &'a dyn Component,
    },
    /// An occupied slot received a new value
    ComponentReplaced {
        /// Mutated entity
        entity: Entity,
        /// Slot that changed
        index: ComponentIndex,
        /// Value before the replacement
        previous: &'a dyn Component,
        /// Value after the replacement
        current: &'a dyn Component,
    },
    /// The reference count dropped to zero
    Released {
        /// Released entity
        entity: Entity,
    },
}

impl EntityEvent<'_> {
    /// Entity the event is about
    pub fn entity(&self) -> Entity {
        match *self {
            EntityEvent::ComponentAdded { entity, .. }
            | EntityEvent::ComponentRemoved { entity, .. }
            | EntityEvent::ComponentReplaced { entity, .. }
            | EntityEvent::Released { entity } => entity,
        }
    }

    /// Slot the event is about, if it is a component change
    pub fn index(&self) -> Option<ComponentIndex> {
        match *self {
            EntityEvent::ComponentAdded { index, .. }
            | EntityEvent::ComponentRemoved { index, .. }
            | EntityEvent::ComponentReplaced { index, .. } => Some(index),
            EntityEvent::Released { .. } => None,
        }
    }
}

/// Observer list for entity events
pub type EntitySignal = Signal<dyn FnMut(&EntityEvent<'_>)>;

/// Per-entity subscribers, kept beside the record so records stay `Sync`
#[derive(Debug, Default)]
pub(crate) struct EntityObservers {
    /// Added, removed and replaced notifications; cleared on destroy
    pub(crate) components: EntitySignal,
    /// Final-release notifications
    pub(crate) released: EntitySignal,
}

impl EntityObservers {
    pub(crate) fn clear(&mut self) {
        self.components.clear();
        self.released.clear();
    }
}

/// Storage behind an [`Entity`] handle
///
/// Holds one nullable slot per component type of the schema. A destroyed
/// record has every slot empty; its storage is reused by a later creation
/// once nobody references it anymore.
pub struct EntityRecord {
    id: EntityId,
    name: String,
    creation_index: u64,
    enabled: bool,
    ref_count: u32,
    components: Vec<Option<Box<dyn Component>>>,
    component_count: usize,
}

impl EntityRecord {
    /// Allocate a disabled record with `total_components` empty slots
    pub(crate) fn new(total_components: usize) -> Self {
        let mut components = Vec::with_capacity(total_components);
        components.resize_with(total_components, || None);
        EntityRecord {
            id: EntityId::generate(),
            name: String::new(),
            creation_index: 0,
            enabled: false,
            ref_count: 0,
            components,
            component_count: 0,
        }
    }

    /// Start a new life in this record
    ///
    /// The pool holds the first reference.
    pub(crate) fn revive(&mut self, id: EntityId, name: &str, creation_index: u64) {
        debug_assert!(!self.enabled && self.ref_count == 0 && self.component_count == 0);
        self.id = id;
        self.name.clear();
        self.name.push_str(name);
        self.creation_index = creation_index;
        self.enabled = true;
        self.ref_count = 1;
    }

    /// Identity of the current life
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Debug label given at creation
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of the pool's creation counter when this life started
    pub fn creation_index(&self) -> u64 {
        self.creation_index
    }

    /// False once the entity is destroyed
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of outstanding references, including the pool's own
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    /// Size of the slot array
    pub fn total_components(&self) -> usize {
        self.components.len()
    }

    /// Number of occupied slots
    pub fn component_count(&self) -> usize {
        self.component_count
    }

    /// Check a single slot
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the schema.
    pub fn has_component(&self, index: ComponentIndex) -> bool {
        self.slot(index).is_some()
    }

    /// Check that every listed slot is occupied
    pub fn has_components(&self, indices: &[ComponentIndex]) -> bool {
        indices.iter().all(|&index| self.has_component(index))
    }

    /// Check that at least one listed slot is occupied
    pub fn has_any_component(&self, indices: &[ComponentIndex]) -> bool {
        indices.iter().any(|&index| self.has_component(index))
    }

    /// Read a slot
    pub fn get_component(&self, index: ComponentIndex) -> PoolResult<&dyn Component> {
        self.slot(index)
            .as_deref()
            .ok_or(PoolError::ComponentMissing { entity: self.id, index })
    }

    /// Occupied slots in ascending index order
    pub fn components(&self) -> impl Iterator<Item = (ComponentIndex, &dyn Component)> + '_ {
        self.components
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_deref().map(|component| (index, component)))
    }

    /// Indices of occupied slots in ascending order
    pub fn component_indices(&self) -> Vec<ComponentIndex> {
        self.components().map(|(index, _)| index).collect()
    }

    /// Render as `name(Position, Velocity)` using schema names
    pub fn describe(&self, schema: &ComponentSchema) -> String {
        let names: Vec<String> = self
            .components()
            .map(|(index, _)| schema.display_name(index))
            .collect();
        format!("{}({})", self.name, names.join(", "))
    }

    fn slot(&self, index: ComponentIndex) -> &Option<Box<dyn Component>> {
        assert!(
            index < self.components.len(),
            "Component index {} out of range (schema has {} component types)",
            index,
            self.components.len()
        );
        &self.components[index]
    }

    fn slot_mut(&mut self, index: ComponentIndex) -> &mut Option<Box<dyn Component>> {
        assert!(
            index < self.components.len(),
            "Component index {} out of range (schema has {} component types)",
            index,
            self.components.len()
        );
        &mut self.components[index]
    }

    fn ensure_enabled(&self) -> PoolResult<()> {
        if self.enabled {
            Ok(())
        } else {
            Err(PoolError::EntityIsNotEnabled { entity: self.id })
        }
    }

    /// Store a component in an empty slot
    pub(crate) fn add(&mut self, index: ComponentIndex, component: Box<dyn Component>) -> PoolResult<()> {
        self.ensure_enabled()?;
        let id = self.id;
        let slot = self.slot_mut(index);
        if slot.is_some() {
            return Err(PoolError::ComponentAlreadyPresent { entity: id, index });
        }
        *slot = Some(component);
        self.component_count += 1;
        Ok(())
    }

    /// Take a component out of its slot
    pub(crate) fn remove(&mut self, index: ComponentIndex) -> PoolResult<Box<dyn Component>> {
        self.ensure_enabled()?;
        let id = self.id;
        let removed = self
            .slot_mut(index)
            .take()
            .ok_or(PoolError::ComponentMissing { entity: id, index })?;
        self.component_count -= 1;
        Ok(removed)
    }

    /// Store a component, returning the value it displaced
    pub(crate) fn replace(
        &mut self,
        index: ComponentIndex,
        component: Box<dyn Component>,
    ) -> PoolResult<Option<Box<dyn Component>>> {
        self.ensure_enabled()?;
        let previous = self.slot_mut(index).replace(component);
        if previous.is_none() {
            self.component_count += 1;
        }
        Ok(previous)
    }

    /// Flip to destroyed; every slot must already be empty
    pub(crate) fn disable(&mut self) {
        debug_assert_eq!(self.component_count, 0);
        self.enabled = false;
    }

    pub(crate) fn retain(&mut self) {
        self.retain_by(1);
    }

    pub(crate) fn retain_by(&mut self, count: u32) {
        self.ref_count += count;
    }

    /// Drop one reference, returning how many remain
    pub(crate) fn release(&mut self) -> PoolResult<u32> {
        if self.ref_count == 0 {
            return Err(PoolError::RefCountUnderflow { entity: self.id });
        }
        self.ref_count -= 1;
        Ok(self.ref_count)
    }
}

impl fmt::Debug for EntityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("creation_index", &self.creation_index)
            .field("enabled", &self.enabled)
            .field("ref_count", &self.ref_count)
            .field("components", &self.component_indices())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position(f32, f32);
    impl Component for Position {}

    #[derive(Debug, PartialEq)]
    struct Velocity(f32, f32);
    impl Component for Velocity {}

    fn live_record(total: usize) -> EntityRecord {
        let mut record = EntityRecord::new(total);
        record.revive(EntityId::generate(), "test", 0);
        record
    }

    #[test]
    fn test_entity_handle_equality() {
        let id = EntityId::generate();
        let e1 = Entity::new(3, id);
        let e2 = Entity::new(3, id);
        let e3 = Entity::new(3, EntityId::generate());
        assert_eq!(e1, e2);
        assert_ne!(e1, e3);
        assert_eq!(e1.slot(), 3);
        assert_eq!(e1.id(), id);
    }

    #[test]
    fn test_new_record_is_disabled_and_empty() {
        let record = EntityRecord::new(3);
        assert!(!record.is_enabled());
        assert_eq!(record.ref_count(), 0);
        assert_eq!(record.total_components(), 3);
        assert_eq!(record.component_count(), 0);
    }

    #[test]
    fn test_revive_takes_first_reference() {
        let record = live_record(2);
        assert!(record.is_enabled());
        assert_eq!(record.ref_count(), 1);
        assert_eq!(record.name(), "test");
    }

    #[test]
    fn test_add_get_remove() {
        let mut record = live_record(2);
        record.add(0, Box::new(Position(1.0, 2.0))).unwrap();

        assert!(record.has_component(0));
        assert!(!record.has_component(1));
        assert_eq!(record.component_count(), 1);
        assert_eq!(
            record.get_component(0).unwrap().downcast_ref::<Position>(),
            Some(&Position(1.0, 2.0))
        );

        let removed = record.remove(0).unwrap();
        assert_eq!(removed.downcast_ref::<Position>(), Some(&Position(1.0, 2.0)));
        assert_eq!(record.component_count(), 0);
    }

    #[test]
    fn test_double_add_fails() {
        let mut record = live_record(2);
        record.add(0, Box::new(Position(0.0, 0.0))).unwrap();
        let err = record.add(0, Box::new(Position(1.0, 1.0))).unwrap_err();
        assert_eq!(err, PoolError::ComponentAlreadyPresent { entity: record.id(), index: 0 });
        // Original value is untouched
        assert_eq!(
            record.get_component(0).unwrap().downcast_ref::<Position>(),
            Some(&Position(0.0, 0.0))
        );
    }

    #[test]
    fn test_missing_component() {
        let mut record = live_record(2);
        assert!(matches!(record.remove(1), Err(PoolError::ComponentMissing { index: 1, .. })));
        assert!(matches!(record.get_component(1), Err(PoolError::ComponentMissing { index: 1, .. })));
    }

    #[test]
    fn test_replace_returns_previous() {
        let mut record = live_record(2);
        assert!(record.replace(1, Box::new(Velocity(1.0, 0.0))).unwrap().is_none());
        assert_eq!(record.component_count(), 1);

        let previous = record.replace(1, Box::new(Velocity(2.0, 0.0))).unwrap().unwrap();
        assert_eq!(previous.downcast_ref::<Velocity>(), Some(&Velocity(1.0, 0.0)));
        assert_eq!(record.component_count(), 1);
    }

    #[test]
    fn test_disabled_record_rejects_mutation() {
        let mut record = EntityRecord::new(2);
        let err = record.add(0, Box::new(Position(0.0, 0.0))).unwrap_err();
        assert_eq!(err, PoolError::EntityIsNotEnabled { entity: record.id() });
    }

    #[test]
    fn test_ref_count_underflow() {
        let mut record = live_record(1);
        record.retain();
        assert_eq!(record.ref_count(), 2);
        assert_eq!(record.release().unwrap(), 1);
        assert_eq!(record.release().unwrap(), 0);
        assert_eq!(
            record.release().unwrap_err(),
            PoolError::RefCountUnderflow { entity: record.id() }
        );
        assert_eq!(record.ref_count(), 0);
    }

    #[test]
    fn test_components_in_ascending_order() {
        let mut record = live_record(3);
        record.add(2, Box::new(Velocity(0.0, 0.0))).unwrap();
        record.add(0, Box::new(Position(0.0, 0.0))).unwrap();
        assert_eq!(record.component_indices(), vec![0, 2]);
        assert!(record.has_components(&[0, 2]));
        assert!(!record.has_components(&[0, 1]));
        assert!(record.has_any_component(&[1, 2]));
        assert!(!record.has_any_component(&[1]));
    }

    #[test]
    fn test_describe_uses_schema_names() {
        let schema = ComponentSchema::new(["Position", "Velocity"]);
        let mut record = live_record(2);
        record.add(1, Box::new(Velocity(0.0, 0.0))).unwrap();
        record.add(0, Box::new(Position(0.0, 0.0))).unwrap();
        assert_eq!(record.describe(&schema), "test(Position, Velocity)");
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_index_panics() {
        let record = live_record(2);
        record.has_component(5);
    }

    #[test]
    fn test_slot_to_u32_keeps_full_range() {
        assert_eq!(slot_to_u32(0), 0);
        assert_eq!(slot_to_u32(u32::MAX as usize), u32::MAX);
        assert_eq!(Entity::new(7, EntityId::generate()).slot(), 7);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    #[should_panic(expected = "exceeds the u32 handle range")]
    fn test_slot_beyond_u32_rejected() {
        slot_to_u32(u32::MAX as usize + 1);
    }
}
