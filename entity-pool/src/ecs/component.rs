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
//! Component values and the component schema
//!
//! Components are plain data records stored in an entity's slot array.
//! The slot a component occupies is its [`ComponentIndex`], a dense integer
//! handed out by the [`ComponentSchema`] the pool is built from.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Dense component type-id, in `0..schema.len()`
pub type ComponentIndex = usize;

/// Upcasting helper so boxed components can be downcast again
///
/// Implemented for every `'static` type; there is no need to implement it by hand.
pub trait AsAny {
    /// View as `&dyn Any`
    fn as_any(&self) -> &dyn Any;

    /// View as `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Trait that all components must implement
///
/// Components should be plain data structures without behavior.
/// A component only ever lives in one entity slot at a time.
pub trait Component: AsAny + fmt::Debug + Send + Sync + 'static {}

impl dyn Component {
    /// Check whether this component is a `T`
    pub fn is<T: Component>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcast to a concrete component type
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably downcast to a concrete component type
    ///
    /// Mutating in place does not notify groups or observers; use
    /// `Pool::replace_component` when value observers need to know.
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Ordered set of component names defining the dense index space
///
/// The i-th name gets [`ComponentIndex`] `i`. A pool sizes every entity's
/// slot array from [`ComponentSchema::len`] exactly once.
///
/// # Example
///
/// ```
/// use entity_pool::ecs::ComponentSchema;
///
/// let schema = ComponentSchema::new(["Position", "Velocity", "Health"]);
/// assert_eq!(schema.len(), 3);
/// assert_eq!(schema.index_of("Velocity"), Some(1));
/// assert_eq!(schema.name(2), Some("Health"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSchema {
    names: Vec<String>,
    lookup: HashMap<String, ComponentIndex>,
}

impl ComponentSchema {
    /// Build a schema from component names in index order
    ///
    /// # Panics
    ///
    /// Panics if a name appears twice.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut lookup = HashMap::with_capacity(names.len());
        for (index, name) in names.iter().enumerate() {
            let previous = lookup.insert(name.clone(), index);
            assert!(previous.is_none(), "Duplicate component name '{}' in schema", name);
        }
        ComponentSchema { names, lookup }
    }

    /// Total number of component types
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the schema declares no component types
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name of the component type at `index`
    pub fn name(&self, index: ComponentIndex) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Index of the component type called `name`
    pub fn index_of(&self, name: &str) -> Option<ComponentIndex> {
        self.lookup.get(name).copied()
    }

    /// All names in index order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }

    /// Name for display purposes, falling back to the raw index
    pub(crate) fn display_name(&self, index: ComponentIndex) -> String {
        match self.name(index) {
            Some(name) => name.to_string(),
            None => index.to_string(),
        }
    }
}
