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
//! System execution interface
//!
//! Systems hold the per-frame logic. They receive the pool explicitly; there
//! is no global pool instance. Ordering beyond insertion order is left to
//! whatever scheduler drives the executor.

use crate::pool::Pool;

/// Trait for systems that operate on a pool
///
/// A system typically resolves its groups once, keeps the [`GroupId`]s,
/// and reads `pool.group(id).entities()` every tick.
///
/// [`GroupId`]: crate::ecs::GroupId
pub trait System {
    /// Run one tick
    fn execute(&mut self, pool: &mut Pool);

    /// Get the name of this system for debugging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Runs systems in the order they were added
#[derive(Default)]
pub struct SystemExecutor {
    systems: Vec<Box<dyn System>>,
}

impl SystemExecutor {
    /// Create a new system executor
    pub fn new() -> Self {
        SystemExecutor {
            systems: Vec::new(),
        }
    }

    /// Add a system to the executor
    pub fn add_system<S: System + 'static>(&mut self, system: S) {
        self.systems.push(Box::new(system));
    }

    /// Run every system once, sequentially
    pub fn execute(&mut self, pool: &mut Pool) {
        for system in &mut self.systems {
            log::trace!("Executing system {}", system.name());
            system.execute(pool);
        }
    }

    /// Get the number of registered systems
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }
}
