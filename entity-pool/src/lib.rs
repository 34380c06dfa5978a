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
//! # Entity Pool
//!
//! An in-memory entity/component registry for real-time simulations, with
//! cached queries that stay consistent under every component mutation.
//!
//! ## Features
//!
//! - **Recycling**: destroyed entities return to a freelist once nothing
//!   references them, so spawn/despawn loops stop allocating
//! - **Reference counting**: outside holders keep destroyed entities from
//!   being reused under them
//! - **Groups**: matcher results cached per matcher and updated
//!   incrementally, routed by component index
//! - **Signals**: synchronous, typed change notifications for entities,
//!   groups and the pool
//! - **Parallelization**: optional Rayon-backed group seeding
//!
//! ## Example
//!
//! ```rust
//! use entity_pool::ecs::{Component, ComponentSchema, Matcher};
//! use entity_pool::pool::Pool;
//!
//! #[derive(Debug)]
//! struct Position(f64, f64);
//! impl Component for Position {}
//!
//! #[derive(Debug)]
//! struct Velocity(f64, f64);
//! impl Component for Velocity {}
//!
//! let schema = ComponentSchema::new(["Position", "Velocity"]);
//! let (position, velocity) = (0, 1);
//!
//! let mut pool = Pool::new(schema);
//! let movers = pool.get_group(&Matcher::all_of([position, velocity]));
//!
//! let entity = pool.create_entity("ship");
//! pool.add_component(entity, position, Position(0.0, 0.0)).unwrap();
//! pool.add_component(entity, velocity, Velocity(1.0, 0.0)).unwrap();
//! assert!(pool.group(movers).contains(entity));
//! ```

#![warn(missing_docs)]

/// Entity/component core types
pub mod ecs;

/// The pool aggregate
pub mod pool;

pub use ecs::{Component, ComponentSchema, Entity, Matcher, PoolError, PoolResult};
pub use pool::{Pool, PoolConfig};
