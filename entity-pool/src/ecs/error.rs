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
//! Pool errors
//!
//! Every variant is a contract violation by the caller. There is no transient
//! failure in the pool: an operation either meets its precondition or returns
//! one of these without changing any state.

use crate::ecs::{ComponentIndex, Entity, EntityId, MatcherId};

/// Errors returned by pool, entity and group operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The slot is already occupied; use `replace_component` instead
    #[error("{entity} already has a component at index {index}")]
    ComponentAlreadyPresent {
        /// Entity that was mutated
        entity: EntityId,
        /// Occupied slot
        index: ComponentIndex,
    },

    /// The slot is empty
    #[error("{entity} has no component at index {index}")]
    ComponentMissing {
        /// Entity that was queried
        entity: EntityId,
        /// Empty slot
        index: ComponentIndex,
    },

    /// The handle is not live or retained in this pool
    #[error("pool does not contain {entity}")]
    PoolDoesNotContainEntity {
        /// Stale or foreign handle
        entity: Entity,
    },

    /// The last reference of an entity that was never destroyed was released
    #[error("cannot release {entity}: entity is not destroyed")]
    EntityIsNotDestroyed {
        /// Entity that is still enabled
        entity: Entity,
    },

    /// Components of a destroyed entity cannot change
    #[error("{entity} is destroyed and cannot be modified")]
    EntityIsNotEnabled {
        /// Retained, destroyed entity
        entity: EntityId,
    },

    /// `release` was called more often than `retain`
    #[error("{entity} was released more often than retained")]
    RefCountUnderflow {
        /// Entity whose ref count is already zero
        entity: EntityId,
    },

    /// `single_entity` was called on a group with several members
    #[error("group {matcher} holds {count} entities, expected at most one")]
    SingleEntity {
        /// Matcher of the offending group
        matcher: MatcherId,
        /// Actual member count
        count: usize,
    },
}

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;
