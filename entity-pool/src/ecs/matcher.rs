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
//! Matchers
//!
//! A [`Matcher`] is an immutable predicate over which component slots of an
//! entity are occupied. Only presence is checked, never values.

use crate::ecs::{ComponentIndex, ComponentSchema, EntityRecord};
use std::fmt;

/// Canonical, order-independent key of a matcher
///
/// Two matchers built from the same sets always get the same id, which is
/// how the pool finds a cached group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MatcherId(String);

impl MatcherId {
    /// Get the canonical string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatcherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Predicate over component presence
///
/// # Example
///
/// ```
/// use entity_pool::ecs::Matcher;
///
/// const POSITION: usize = 0;
/// const VELOCITY: usize = 1;
/// const FROZEN: usize = 2;
///
/// let moving = Matcher::all_of([VELOCITY, POSITION]).with_none_of([FROZEN]);
/// assert_eq!(moving.id().as_str(), "AllOf(0,1).NoneOf(2)");
/// assert_eq!(moving.indices(), &[0, 1, 2]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Matcher {
    all_of: Vec<ComponentIndex>,
    any_of: Vec<ComponentIndex>,
    none_of: Vec<ComponentIndex>,
    indices: Vec<ComponentIndex>,
    id: MatcherId,
}

impl Matcher {
    /// Entities holding every listed component
    pub fn all_of<I: IntoIterator<Item = ComponentIndex>>(indices: I) -> Self {
        Self::from_sets(normalize(indices), Vec::new(), Vec::new())
    }

    /// Entities holding at least one listed component
    pub fn any_of<I: IntoIterator<Item = ComponentIndex>>(indices: I) -> Self {
        Self::from_sets(Vec::new(), normalize(indices), Vec::new())
    }

    /// Entities holding none of the listed components
    ///
    /// A group for a purely negative matcher also picks up entities with no
    /// components at all, so the pool re-checks it on create and destroy.
    pub fn none_of<I: IntoIterator<Item = ComponentIndex>>(indices: I) -> Self {
        Self::from_sets(Vec::new(), Vec::new(), normalize(indices))
    }

    /// Add required components
    pub fn with_all_of<I: IntoIterator<Item = ComponentIndex>>(self, indices: I) -> Self {
        let all_of = merge(self.all_of, indices);
        Self::from_sets(all_of, self.any_of, self.none_of)
    }

    /// Add alternatives, at least one of which must be present
    pub fn with_any_of<I: IntoIterator<Item = ComponentIndex>>(self, indices: I) -> Self {
        let any_of = merge(self.any_of, indices);
        Self::from_sets(self.all_of, any_of, self.none_of)
    }

    /// Add excluded components
    pub fn with_none_of<I: IntoIterator<Item = ComponentIndex>>(self, indices: I) -> Self {
        let none_of = merge(self.none_of, indices);
        Self::from_sets(self.all_of, self.any_of, none_of)
    }

    fn from_sets(
        all_of: Vec<ComponentIndex>,
        any_of: Vec<ComponentIndex>,
        none_of: Vec<ComponentIndex>,
    ) -> Self {
        let indices = normalize(
            all_of
                .iter()
                .chain(any_of.iter())
                .chain(none_of.iter())
                .copied(),
        );

        let mut key = String::new();
        for (tag, set) in [("AllOf", &all_of), ("AnyOf", &any_of), ("NoneOf", &none_of)] {
            if set.is_empty() {
                continue;
            }
            if !key.is_empty() {
                key.push('.');
            }
            let ids: Vec<String> = set.iter().map(ToString::to_string).collect();
            key.push_str(&format!("{}({})", tag, ids.join(",")));
        }

        Matcher {
            all_of,
            any_of,
            none_of,
            indices,
            id: MatcherId(key),
        }
    }

    /// Evaluate the predicate against an entity
    pub fn matches(&self, record: &EntityRecord) -> bool {
        record.has_components(&self.all_of)
            && (self.any_of.is_empty() || record.has_any_component(&self.any_of))
            && !record.has_any_component(&self.none_of)
    }

    /// Required components, sorted
    pub fn all_of_indices(&self) -> &[ComponentIndex] {
        &self.all_of
    }

    /// Alternative components, sorted
    pub fn any_of_indices(&self) -> &[ComponentIndex] {
        &self.any_of
    }

    /// Excluded components, sorted
    pub fn none_of_indices(&self) -> &[ComponentIndex] {
        &self.none_of
    }

    /// Union of every referenced index, sorted
    pub fn indices(&self) -> &[ComponentIndex] {
        &self.indices
    }

    /// Cache key
    pub fn id(&self) -> &MatcherId {
        &self.id
    }

    /// Whether some component must be present for a match
    ///
    /// Only such matchers are kept consistent by component events alone.
    pub fn requires_presence(&self) -> bool {
        !self.all_of.is_empty() || !self.any_of.is_empty()
    }

    /// Render with component names, e.g. `AllOf(Position, Velocity)`
    pub fn describe(&self, schema: &ComponentSchema) -> String {
        let mut parts = Vec::new();
        for (tag, set) in [("AllOf", &self.all_of), ("AnyOf", &self.any_of), ("NoneOf", &self.none_of)] {
            if !set.is_empty() {
                let names: Vec<String> = set.iter().map(|&index| schema.display_name(index)).collect();
                parts.push(format!("{}({})", tag, names.join(", ")));
            }
        }
        parts.join(".")
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.id, f)
    }
}

fn normalize<I: IntoIterator<Item = ComponentIndex>>(indices: I) -> Vec<ComponentIndex> {
    let mut indices: Vec<ComponentIndex> = indices.into_iter().collect();
    indices.sort_unstable();
    indices.dedup();
    indices
}

fn merge<I: IntoIterator<Item = ComponentIndex>>(existing: Vec<ComponentIndex>, extra: I) -> Vec<ComponentIndex> {
    normalize(existing.into_iter().chain(extra))
}
