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
//! Collectors
//!
//! A [`Collector`] accumulates the entities that entered or left one or more
//! groups since it was last cleared, so a reactive consumer can process only
//! what changed. The pool retains every collected entity once; clearing the
//! collector releases those references again.

use crate::ecs::{Entity, GroupEventKind, GroupId};
use std::collections::HashSet;

/// Handle to a collector owned by a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectorId(usize);

impl CollectorId {
    pub(crate) fn new(index: usize) -> Self {
        CollectorId(index)
    }

    /// Position of the collector in the pool's collector list
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Which group transitions a collector reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectorTrigger {
    /// Entities joining the group, and members whose component was replaced
    Added,
    /// Entities leaving the group
    Removed,
    /// Both of the above
    AddedOrRemoved,
}

impl CollectorTrigger {
    fn accepts(self, kind: GroupEventKind) -> bool {
        match self {
            CollectorTrigger::Added => matches!(kind, GroupEventKind::Added | GroupEventKind::Updated),
            CollectorTrigger::Removed => kind == GroupEventKind::Removed,
            CollectorTrigger::AddedOrRemoved => true,
        }
    }
}

/// Accumulator of group changes
#[derive(Debug)]
pub struct Collector {
    id: CollectorId,
    triggers: Vec<(GroupId, CollectorTrigger)>,
    collected: Vec<Entity>,
    members: HashSet<Entity>,
    active: bool,
}

impl Collector {
    pub(crate) fn new(id: CollectorId, triggers: Vec<(GroupId, CollectorTrigger)>) -> Self {
        Collector {
            id,
            triggers,
            collected: Vec::new(),
            members: HashSet::new(),
            active: true,
        }
    }

    /// Handle of this collector in its pool
    pub fn id(&self) -> CollectorId {
        self.id
    }

    /// Groups watched and what each one triggers on
    pub fn triggers(&self) -> &[(GroupId, CollectorTrigger)] {
        &self.triggers
    }

    /// Entities collected since the last clear, in collection order
    ///
    /// Some of them may have been destroyed in the meantime; they stay
    /// retained until the collector is cleared.
    pub fn collected_entities(&self) -> &[Entity] {
        &self.collected
    }

    /// Number of collected entities
    pub fn len(&self) -> usize {
        self.collected.len()
    }

    /// Check if nothing was collected
    pub fn is_empty(&self) -> bool {
        self.collected.is_empty()
    }

    /// Whether the collector currently records changes
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Record a group transition
    ///
    /// Returns true when the entity was newly collected and the caller must
    /// retain it.
    pub(crate) fn collect(&mut self, group: GroupId, entity: Entity, kind: GroupEventKind) -> bool {
        if !self.active {
            return false;
        }
        let triggered = self
            .triggers
            .iter()
            .any(|&(watched, trigger)| watched == group && trigger.accepts(kind));
        if triggered && self.members.insert(entity) {
            self.collected.push(entity);
            true
        } else {
            false
        }
    }

    /// Empty the collector, handing back the entities the caller must release
    pub(crate) fn take(&mut self) -> Vec<Entity> {
        self.members.clear();
        std::mem::take(&mut self.collected)
    }
}
