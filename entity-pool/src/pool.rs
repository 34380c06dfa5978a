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
//! Entity pool
//!
//! The [`Pool`] owns every entity record, the recycling freelist, the set of
//! destroyed-but-referenced entities and the group cache. Component mutations
//! go through the pool, which routes each one only to the groups whose matcher
//! references the changed component index.
//!
//! Records are never deallocated while the pool lives. A destroyed record
//! whose reference count drops to zero goes on the freelist and is handed out
//! again by the next [`Pool::create_entity`], which avoids allocation churn in
//! per-frame spawn/despawn loops.

use crate::ecs::{
    Collector, CollectorId, CollectorTrigger, Component, ComponentIndex, ComponentSchema, Entity,
    EntityEvent, EntityId, EntityObservers, EntityRecord, Group, GroupEventKind, GroupId,
    ListenerId, Matcher, MatcherId, PoolError, PoolResult, Signal, slot_to_u32,
};
use std::collections::HashMap;

/// Configuration for pool behavior
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Debug label used in log output
    pub name: String,
    /// First value of the creation counter
    pub start_creation_index: u64,
    /// Initial capacity of the record and live-entity storage
    pub initial_capacity: usize,
    /// Number of disabled records allocated straight into the freelist
    pub prewarm_entities: usize,
    /// Live entity count from which group seeding evaluates matchers in parallel
    pub parallel_seed_threshold: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            name: "pool".to_string(),
            start_creation_index: 0,
            initial_capacity: 64,
            prewarm_entities: 0,
            parallel_seed_threshold: 1024,
        }
    }
}

impl PoolConfig {
    /// Create a configuration with default settings and a custom name
    pub fn new(name: impl Into<String>) -> Self {
        PoolConfig {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Start the creation counter at `index`
    pub fn with_start_creation_index(mut self, index: u64) -> Self {
        self.start_creation_index = index;
        self
    }

    /// Set the initial storage capacity
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Allocate `count` records into the freelist at construction
    pub fn with_prewarm(mut self, count: usize) -> Self {
        assert!(count <= u32::MAX as usize, "Prewarm count must fit in a u32 slot index");
        self.prewarm_entities = count;
        self
    }

    /// Set the live entity count from which seeding runs in parallel
    pub fn with_parallel_seed_threshold(mut self, threshold: usize) -> Self {
        assert!(threshold >= 1, "Parallel seed threshold must be >= 1");
        self.parallel_seed_threshold = threshold;
        self
    }
}

/// Statistics for monitoring recycling
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolStats {
    /// Number of records ever allocated, prewarmed ones included
    pub allocated: usize,
    /// Number of entities created
    pub created: usize,
    /// Number of creations served from the freelist
    pub recycled: usize,
    /// Number of entities destroyed
    pub destroyed: usize,
    /// Peak number of live entities
    pub peak_live: usize,
}

impl PoolStats {
    /// Calculate the share of creations served from the freelist, in percent
    pub fn reuse_rate(&self) -> f64 {
        if self.created == 0 {
            0.0
        } else {
            (self.recycled as f64 / self.created as f64) * 100.0
        }
    }
}

/// Event channels a pool exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolEventKind {
    /// An entity was created
    EntityCreated,
    /// An entity is about to lose its components
    EntityWillBeDestroyed,
    /// An entity was destroyed
    EntityDestroyed,
    /// A group was created
    GroupCreated,
}

/// Notification emitted by a pool
#[derive(Debug, Clone, Copy)]
pub enum PoolEvent<'a> {
    /// `entity` is live
    EntityCreated {
        /// New entity
        entity: Entity,
    },
    /// `entity` left the live set and still holds its components
    EntityWillBeDestroyed {
        /// Entity being destroyed
        entity: Entity,
    },
    /// `entity` holds no components and is disabled
    EntityDestroyed {
        /// Destroyed entity
        entity: Entity,
    },
    /// A group was created and seeded
    GroupCreated {
        /// New group
        group: GroupId,
        /// Matcher the group caches
        matcher: &'a Matcher,
    },
}

impl PoolEvent<'_> {
    /// Channel this event is emitted on
    pub fn kind(&self) -> PoolEventKind {
        match self {
            PoolEvent::EntityCreated { .. } => PoolEventKind::EntityCreated,
            PoolEvent::EntityWillBeDestroyed { .. } => PoolEventKind::EntityWillBeDestroyed,
            PoolEvent::EntityDestroyed { .. } => PoolEventKind::EntityDestroyed,
            PoolEvent::GroupCreated { .. } => PoolEventKind::GroupCreated,
        }
    }
}

/// Observer list for pool events
pub type PoolSignal = Signal<dyn FnMut(&PoolEvent<'_>)>;

/// Groups, the component-index fan-out table and collectors
#[derive(Debug)]
struct GroupRegistry {
    groups: Vec<Group>,
    by_matcher: HashMap<MatcherId, GroupId>,
    by_component: Vec<Vec<GroupId>>,
    // Matchers without allOf/anyOf also match component-less entities
    presence_free: Vec<GroupId>,
    collectors: Vec<Collector>,
    collectors_by_group: Vec<Vec<CollectorId>>,
}

impl GroupRegistry {
    fn new(total_components: usize) -> Self {
        GroupRegistry {
            groups: Vec::new(),
            by_matcher: HashMap::new(),
            by_component: vec![Vec::new(); total_components],
            presence_free: Vec::new(),
            collectors: Vec::new(),
            collectors_by_group: Vec::new(),
        }
    }

    /// Route a presence change at `index` to the interested groups
    ///
    /// Returns how many collectors newly collected the entity.
    fn handle_presence(
        &mut self,
        entity: Entity,
        record: &EntityRecord,
        live: bool,
        index: ComponentIndex,
        component: &dyn Component,
    ) -> u32 {
        let mut collected = 0;
        for &group_id in &self.by_component[index] {
            let group = &mut self.groups[group_id.index()];
            if let Some(kind) = group.handle_entity(entity, record, live, Some((index, component))) {
                collected += collect(&mut self.collectors, &self.collectors_by_group, group_id, entity, kind);
            }
        }
        collected
    }

    /// Re-check presence-free groups when an entity is created or destroyed
    fn handle_lifecycle(&mut self, entity: Entity, record: &EntityRecord, live: bool) -> u32 {
        let mut collected = 0;
        for &group_id in &self.presence_free {
            let group = &mut self.groups[group_id.index()];
            if let Some(kind) = group.handle_entity(entity, record, live, None) {
                collected += collect(&mut self.collectors, &self.collectors_by_group, group_id, entity, kind);
            }
        }
        collected
    }

    /// Route a value replacement at `index` to the interested groups
    fn handle_replace(
        &mut self,
        entity: Entity,
        index: ComponentIndex,
        previous: &dyn Component,
        current: &dyn Component,
    ) -> u32 {
        let mut collected = 0;
        for &group_id in &self.by_component[index] {
            let group = &mut self.groups[group_id.index()];
            if group.update_entity(entity, index, previous, current) {
                collected += collect(
                    &mut self.collectors,
                    &self.collectors_by_group,
                    group_id,
                    entity,
                    GroupEventKind::Updated,
                );
            }
        }
        collected
    }
}

fn collect(
    collectors: &mut [Collector],
    collectors_by_group: &[Vec<CollectorId>],
    group: GroupId,
    entity: Entity,
    kind: GroupEventKind,
) -> u32 {
    let mut collected = 0;
    for &collector in &collectors_by_group[group.index()] {
        if collectors[collector.index()].collect(group, entity, kind) {
            collected += 1;
        }
    }
    collected
}

/// Registry of entities, groups and recycling state
///
/// # Example
///
/// ```
/// use entity_pool::ecs::{Component, ComponentSchema, Matcher};
/// use entity_pool::pool::Pool;
///
/// #[derive(Debug)]
/// struct Position(f32, f32);
/// impl Component for Position {}
///
/// let mut pool = Pool::new(ComponentSchema::new(["Position"]));
/// let group = pool.get_group(&Matcher::all_of([0]));
///
/// let entity = pool.create_entity("player");
/// pool.add_component(entity, 0, Position(0.0, 0.0)).unwrap();
/// assert_eq!(pool.group(group).entities(), &[entity]);
///
/// pool.destroy_entity(entity).unwrap();
/// assert!(pool.group(group).is_empty());
/// assert_eq!(pool.reusable_entities_count(), 1);
/// ```
#[derive(Debug)]
pub struct Pool {
    schema: ComponentSchema,
    config: PoolConfig,
    records: Vec<EntityRecord>,
    observers: Vec<EntityObservers>,
    live: Vec<Entity>,
    live_positions: HashMap<EntityId, usize>,
    reusable: Vec<u32>,
    retained: HashMap<EntityId, Entity>,
    registry: GroupRegistry,
    creation_index: u64,
    on_entity_created: PoolSignal,
    on_entity_will_be_destroyed: PoolSignal,
    on_entity_destroyed: PoolSignal,
    on_group_created: PoolSignal,
    stats: PoolStats,
}

impl Pool {
    /// Create a pool with default configuration
    pub fn new(schema: ComponentSchema) -> Self {
        Self::with_config(schema, PoolConfig::default())
    }

    /// Create a pool with custom configuration
    pub fn with_config(schema: ComponentSchema, config: PoolConfig) -> Self {
        let total = schema.len();
        let mut pool = Pool {
            records: Vec::with_capacity(config.initial_capacity.max(config.prewarm_entities)),
            observers: Vec::with_capacity(config.initial_capacity.max(config.prewarm_entities)),
            live: Vec::with_capacity(config.initial_capacity),
            live_positions: HashMap::with_capacity(config.initial_capacity),
            reusable: Vec::with_capacity(config.prewarm_entities),
            retained: HashMap::new(),
            registry: GroupRegistry::new(total),
            creation_index: config.start_creation_index,
            on_entity_created: PoolSignal::new(),
            on_entity_will_be_destroyed: PoolSignal::new(),
            on_entity_destroyed: PoolSignal::new(),
            on_group_created: PoolSignal::new(),
            stats: PoolStats::default(),
            schema,
            config,
        };

        for _ in 0..pool.config.prewarm_entities {
            let slot = pool.allocate_record();
            pool.reusable.push(slot);
        }

        log::info!(
            "Pool '{}' created with {} component types ({} prewarmed entities)",
            pool.config.name,
            total,
            pool.config.prewarm_entities
        );
        pool
    }

    /// Grow the record storage by one slot
    ///
    /// # Panics
    ///
    /// Panics once the slot no longer fits an entity handle.
    fn allocate_record(&mut self) -> u32 {
        let slot = slot_to_u32(self.records.len());
        self.records.push(EntityRecord::new(self.schema.len()));
        self.observers.push(EntityObservers::default());
        self.stats.allocated += 1;
        slot
    }

    /// Debug label from the configuration
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Component schema the pool was built with
    pub fn schema(&self) -> &ComponentSchema {
        &self.schema
    }

    /// Number of component types
    pub fn total_components(&self) -> usize {
        self.schema.len()
    }

    /// Get current pool statistics
    pub fn stats(&self) -> &PoolStats {
        &self.stats
    }

    /// Create an entity, reusing a released record when one is available
    pub fn create_entity(&mut self, name: &str) -> Entity {
        let creation_index = self.creation_index;
        self.creation_index += 1;

        let slot = match self.reusable.pop() {
            Some(slot) => {
                self.stats.recycled += 1;
                log::trace!("Recycling slot {} for '{}'", slot, name);
                slot
            }
            None => self.allocate_record(),
        } as usize;

        let id = EntityId::generate();
        self.records[slot].revive(id, name, creation_index);
        self.observers[slot].clear();

        let entity = Entity::new(slot, id);
        self.live_positions.insert(id, self.live.len());
        self.live.push(entity);

        self.stats.created += 1;
        self.stats.peak_live = self.stats.peak_live.max(self.live.len());
        log::trace!("Created {} '{}' (creation index {})", entity, name, creation_index);

        let collected = self.registry.handle_lifecycle(entity, &self.records[slot], true);
        self.records[slot].retain_by(collected);

        self.on_entity_created.emit(&PoolEvent::EntityCreated { entity });
        entity
    }

    /// Destroy a live entity
    ///
    /// Removes every component in ascending index order, so groups see one
    /// removal per component before [`PoolEvent::EntityDestroyed`] fires. The
    /// record is recycled at once unless someone else still retains it.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::PoolDoesNotContainEntity`] if `entity` is not live.
    pub fn destroy_entity(&mut self, entity: Entity) -> PoolResult<()> {
        let Some(position) = self.live_positions.remove(&entity.id()) else {
            return Err(PoolError::PoolDoesNotContainEntity { entity });
        };
        self.live.swap_remove(position);
        if let Some(&moved) = self.live.get(position) {
            self.live_positions.insert(moved.id(), position);
        }

        self.on_entity_will_be_destroyed
            .emit(&PoolEvent::EntityWillBeDestroyed { entity });

        let slot = entity.slot();
        for index in self.records[slot].component_indices() {
            self.remove_component(entity, index)?;
        }
        let collected = self.registry.handle_lifecycle(entity, &self.records[slot], false);
        self.records[slot].retain_by(collected);
        self.observers[slot].components.clear();
        self.records[slot].disable();
        self.stats.destroyed += 1;

        self.on_entity_destroyed.emit(&PoolEvent::EntityDestroyed { entity });

        if self.records[slot].ref_count() == 1 {
            self.reusable.push(slot as u32);
        } else {
            log::trace!(
                "Retaining {} with {} outstanding references",
                entity,
                self.records[slot].ref_count() - 1
            );
            self.retained.insert(entity.id(), entity);
        }

        if self.records[slot].release()? == 0 {
            self.finish_release(entity, slot);
        }
        log::trace!("Destroyed {}", entity);
        Ok(())
    }

    /// Destroy every live entity
    ///
    /// Works on a snapshot taken up front, so callbacks cannot make the loop
    /// skip or revisit an entity.
    pub fn destroy_all_entities(&mut self) -> PoolResult<()> {
        let snapshot = self.live.clone();
        for entity in snapshot {
            self.destroy_entity(entity)?;
        }
        Ok(())
    }

    /// Check whether `entity` is live in this pool
    pub fn has_entity(&self, entity: Entity) -> bool {
        self.live_positions.contains_key(&entity.id())
    }

    /// All live entities
    ///
    /// The slice is maintained on create and destroy; order is stable until
    /// the next of either.
    pub fn entities(&self) -> &[Entity] {
        &self.live
    }

    /// Number of live entities
    pub fn count(&self) -> usize {
        self.live.len()
    }

    /// Number of records waiting on the freelist
    pub fn reusable_entities_count(&self) -> usize {
        self.reusable.len()
    }

    /// Number of destroyed entities still held by outside references
    pub fn retained_entities_count(&self) -> usize {
        self.retained.len()
    }

    /// Record behind a live or retained entity
    pub fn entity_record(&self, entity: Entity) -> Option<&EntityRecord> {
        let slot = self.resolve(entity).ok()?;
        let record = &self.records[slot];
        (record.ref_count() > 0).then_some(record)
    }

    fn resolve(&self, entity: Entity) -> PoolResult<usize> {
        match self.records.get(entity.slot()) {
            Some(record) if record.id() == entity.id() => Ok(entity.slot()),
            _ => Err(PoolError::PoolDoesNotContainEntity { entity }),
        }
    }

    /// Store a component in an empty slot
    ///
    /// # Errors
    ///
    /// Fails with [`PoolError::ComponentAlreadyPresent`] if the slot is
    /// occupied and [`PoolError::EntityIsNotEnabled`] if the entity was
    /// destroyed.
    ///
    /// # Panics
    ///
    /// Panics if `index` is outside the schema.
    pub fn add_component<C: Component>(&mut self, entity: Entity, index: ComponentIndex, component: C) -> PoolResult<()> {
        let slot = self.resolve(entity)?;
        self.records[slot].add(index, Box::new(component))?;
        self.notify_added(entity, slot, index)
    }

    fn notify_added(&mut self, entity: Entity, slot: usize, index: ComponentIndex) -> PoolResult<()> {
        let live = self.live_positions.contains_key(&entity.id());
        let record = &self.records[slot];
        let component = record.get_component(index)?;
        let collected = self.registry.handle_presence(entity, record, live, index, component);
        self.observers[slot].components.emit(&EntityEvent::ComponentAdded {
            entity,
            index,
            component,
        });
        self.records[slot].retain_by(collected);
        Ok(())
    }

    /// Take a component out of its slot
    ///
    /// While the entity is being destroyed it leaves each group on the first
    /// removal that group watches.
    ///
    /// # Errors
    ///
    /// Fails with [`PoolError::ComponentMissing`] if the slot is empty.
    pub fn remove_component(&mut self, entity: Entity, index: ComponentIndex) -> PoolResult<Box<dyn Component>> {
        let slot = self.resolve(entity)?;
        let removed = self.records[slot].remove(index)?;
        let live = self.live_positions.contains_key(&entity.id());
        let collected = self
            .registry
            .handle_presence(entity, &self.records[slot], live, index, &*removed);
        self.observers[slot].components.emit(&EntityEvent::ComponentRemoved {
            entity,
            index,
            component: &*removed,
        });
        self.records[slot].retain_by(collected);
        Ok(removed)
    }

    /// Store a component, returning the value it displaced
    ///
    /// On an empty slot this behaves exactly like [`Pool::add_component`].
    /// Otherwise membership is untouched and groups that contain the entity
    /// emit an update.
    pub fn replace_component<C: Component>(
        &mut self,
        entity: Entity,
        index: ComponentIndex,
        component: C,
    ) -> PoolResult<Option<Box<dyn Component>>> {
        let slot = self.resolve(entity)?;
        let Some(previous) = self.records[slot].replace(index, Box::new(component))? else {
            self.notify_added(entity, slot, index)?;
            return Ok(None);
        };

        let record = &self.records[slot];
        let current = record.get_component(index)?;
        let collected = self
            .registry
            .handle_replace(entity, index, &*previous, current);
        self.observers[slot].components.emit(&EntityEvent::ComponentReplaced {
            entity,
            index,
            previous: &*previous,
            current,
        });
        self.records[slot].retain_by(collected);
        Ok(Some(previous))
    }

    /// Remove every component of a live entity, ascending by index
    pub fn remove_all_components(&mut self, entity: Entity) -> PoolResult<()> {
        let slot = self.resolve(entity)?;
        for index in self.records[slot].component_indices() {
            self.remove_component(entity, index)?;
        }
        Ok(())
    }

    /// Check a component slot of a live entity
    pub fn has_component(&self, entity: Entity, index: ComponentIndex) -> bool {
        self.has_entity(entity) && self.records[entity.slot()].has_component(index)
    }

    /// Read a component
    pub fn get_component(&self, entity: Entity, index: ComponentIndex) -> PoolResult<&dyn Component> {
        let slot = self.resolve(entity)?;
        self.records[slot].get_component(index)
    }

    /// Add an outside reference, keeping the record from being recycled
    ///
    /// # Errors
    ///
    /// Fails with [`PoolError::PoolDoesNotContainEntity`] if the entity was
    /// already released back to the freelist.
    pub fn retain_entity(&mut self, entity: Entity) -> PoolResult<()> {
        let slot = self.resolve(entity)?;
        if self.records[slot].ref_count() == 0 {
            return Err(PoolError::PoolDoesNotContainEntity { entity });
        }
        self.records[slot].retain();
        Ok(())
    }

    /// Drop an outside reference
    ///
    /// When the last reference of a destroyed entity goes away its release
    /// listeners fire and the record moves to the freelist.
    ///
    /// # Errors
    ///
    /// Fails with [`PoolError::EntityIsNotDestroyed`] when this would drop the
    /// last reference of a live entity, and with
    /// [`PoolError::RefCountUnderflow`] when nothing is left to release.
    pub fn release_entity(&mut self, entity: Entity) -> PoolResult<()> {
        let slot = self.resolve(entity)?;
        let record = &self.records[slot];
        if record.ref_count() == 1 && record.is_enabled() {
            return Err(PoolError::EntityIsNotDestroyed { entity });
        }
        if self.records[slot].release()? == 0 {
            self.finish_release(entity, slot);
        }
        Ok(())
    }

    fn finish_release(&mut self, entity: Entity, slot: usize) {
        self.observers[slot].released.emit(&EntityEvent::Released { entity });
        self.observers[slot].clear();
        if self.retained.remove(&entity.id()).is_some() {
            log::trace!("Released retained {}", entity);
            self.reusable.push(slot as u32);
        }
    }

    /// Subscribe to component changes of a live entity
    ///
    /// The subscription ends when the entity is destroyed.
    pub fn subscribe_entity<C>(&mut self, entity: Entity, callback: C) -> PoolResult<ListenerId>
    where
        C: FnMut(&EntityEvent<'_>) + 'static,
    {
        if !self.has_entity(entity) {
            return Err(PoolError::PoolDoesNotContainEntity { entity });
        }
        Ok(self.observers[entity.slot()].components.connect(Box::new(callback)))
    }

    /// Subscribe to the final release of a live or retained entity
    pub fn subscribe_entity_released<C>(&mut self, entity: Entity, callback: C) -> PoolResult<ListenerId>
    where
        C: FnMut(&EntityEvent<'_>) + 'static,
    {
        if self.entity_record(entity).is_none() {
            return Err(PoolError::PoolDoesNotContainEntity { entity });
        }
        Ok(self.observers[entity.slot()].released.connect(Box::new(callback)))
    }

    /// Drop an entity subscription; returns false if it was not connected
    pub fn unsubscribe_entity(&mut self, entity: Entity, id: ListenerId) -> bool {
        if self.entity_record(entity).is_none() {
            return false;
        }
        let observers = &mut self.observers[entity.slot()];
        observers.components.disconnect(id) || observers.released.disconnect(id)
    }

    /// Subscribe to one pool event channel
    pub fn subscribe<C>(&mut self, kind: PoolEventKind, callback: C) -> ListenerId
    where
        C: FnMut(&PoolEvent<'_>) + 'static,
    {
        self.signal_mut(kind).connect(Box::new(callback))
    }

    /// Drop a pool subscription; returns false if it was not connected
    pub fn unsubscribe(&mut self, kind: PoolEventKind, id: ListenerId) -> bool {
        self.signal_mut(kind).disconnect(id)
    }

    fn signal_mut(&mut self, kind: PoolEventKind) -> &mut PoolSignal {
        match kind {
            PoolEventKind::EntityCreated => &mut self.on_entity_created,
            PoolEventKind::EntityWillBeDestroyed => &mut self.on_entity_will_be_destroyed,
            PoolEventKind::EntityDestroyed => &mut self.on_entity_destroyed,
            PoolEventKind::GroupCreated => &mut self.on_group_created,
        }
    }

    /// Get or create the group for `matcher`
    ///
    /// Structurally equal matchers share one group. A new group is seeded
    /// from the live entities without emitting membership events. Groups
    /// whose matcher has only noneOf indices are also re-checked on every
    /// create and destroy.
    ///
    /// # Panics
    ///
    /// Panics if the matcher references an index outside the schema.
    pub fn get_group(&mut self, matcher: &Matcher) -> GroupId {
        if let Some(&id) = self.registry.by_matcher.get(matcher.id()) {
            return id;
        }

        let total = self.schema.len();
        if let Some(&index) = matcher.indices().iter().find(|&&index| index >= total) {
            panic!(
                "Component index {} out of range (schema has {} component types)",
                index, total
            );
        }

        let id = GroupId::new(self.registry.groups.len());
        let mut group = Group::new(id, matcher.clone());
        group.seed(&self.live, &self.records, self.config.parallel_seed_threshold);
        log::debug!(
            "Pool '{}' created group {} with {} entities",
            self.config.name,
            matcher.describe(&self.schema),
            group.len()
        );

        for &index in matcher.indices() {
            self.registry.by_component[index].push(id);
        }
        if !matcher.requires_presence() {
            self.registry.presence_free.push(id);
        }
        self.registry.by_matcher.insert(matcher.id().clone(), id);
        self.registry.groups.push(group);
        self.registry.collectors_by_group.push(Vec::new());

        self.on_group_created.emit(&PoolEvent::GroupCreated {
            group: id,
            matcher: self.registry.groups[id.index()].matcher(),
        });
        id
    }

    /// Access a group
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this pool.
    pub fn group(&self, id: GroupId) -> &Group {
        &self.registry.groups[id.index()]
    }

    /// Access a group mutably, e.g. to subscribe to it
    pub fn group_mut(&mut self, id: GroupId) -> &mut Group {
        &mut self.registry.groups[id.index()]
    }

    /// Number of cached groups
    pub fn groups_count(&self) -> usize {
        self.registry.groups.len()
    }

    /// Live entities matching `matcher`, through its cached group
    pub fn entities_matching(&mut self, matcher: &Matcher) -> &[Entity] {
        let id = self.get_group(matcher);
        self.registry.groups[id.index()].entities()
    }

    /// Create a collector over one or more groups
    ///
    /// # Panics
    ///
    /// Panics if a group id was not issued by this pool.
    pub fn create_collector<I>(&mut self, triggers: I) -> CollectorId
    where
        I: IntoIterator<Item = (GroupId, CollectorTrigger)>,
    {
        let triggers: Vec<(GroupId, CollectorTrigger)> = triggers.into_iter().collect();
        let id = CollectorId::new(self.registry.collectors.len());
        for &(group, _) in &triggers {
            assert!(
                group.index() < self.registry.groups.len(),
                "Group {} does not belong to pool '{}'",
                group.index(),
                self.config.name
            );
            let watchers = &mut self.registry.collectors_by_group[group.index()];
            if !watchers.contains(&id) {
                watchers.push(id);
            }
        }
        log::debug!(
            "Pool '{}' created collector {} over {} groups",
            self.config.name,
            id.index(),
            triggers.len()
        );
        self.registry.collectors.push(Collector::new(id, triggers));
        id
    }

    /// Access a collector
    pub fn collector(&self, id: CollectorId) -> &Collector {
        &self.registry.collectors[id.index()]
    }

    /// Empty a collector and release its references
    ///
    /// Every collected entity is released even if one release fails; the
    /// first failure is returned.
    pub fn clear_collector(&mut self, id: CollectorId) -> PoolResult<()> {
        let collected = self.registry.collectors[id.index()].take();
        let mut result = Ok(());
        for entity in collected {
            if let Err(err) = self.release_entity(entity) {
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }

    /// Resume collecting
    pub fn activate_collector(&mut self, id: CollectorId) {
        self.registry.collectors[id.index()].set_active(true);
    }

    /// Stop collecting and clear what was collected
    pub fn deactivate_collector(&mut self, id: CollectorId) -> PoolResult<()> {
        self.registry.collectors[id.index()].set_active(false);
        self.clear_collector(id)
    }
}
