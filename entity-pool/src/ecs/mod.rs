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
//! Entity/component core
//!
//! This module provides the building blocks the [`Pool`](crate::pool::Pool)
//! ties together:
//! - Component values and the data-driven component schema
//! - Entity handles and records
//! - Matchers and the groups that cache their results
//! - Collectors over group changes
//! - Observer lists for change notification
//! - The system execution interface

mod collector;
mod component;
mod entity;
mod error;
mod group;
mod matcher;
mod signal;
mod system;

pub use collector::{Collector, CollectorId, CollectorTrigger};
pub use component::{AsAny, Component, ComponentIndex, ComponentSchema};
pub use entity::{Entity, EntityEvent, EntityId, EntityRecord, EntitySignal};
pub(crate) use entity::{slot_to_u32, EntityObservers};
pub use error::{PoolError, PoolResult};
pub use group::{Group, GroupEvent, GroupEventKind, GroupId, GroupSignal};
pub use matcher::{Matcher, MatcherId};
pub use signal::{ListenerId, Signal};
pub use system::{System, SystemExecutor};
