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
//! Basic example demonstrating the entity pool
//!
//! This example shows how to build a pool from a schema, spawn entities,
//! query them through groups, react to changes and recycle storage.

use entity_pool::ecs::{
    Component, ComponentSchema, CollectorTrigger, GroupEvent, GroupEventKind, GroupId, Matcher,
    System, SystemExecutor,
};
use entity_pool::pool::{Pool, PoolConfig};

const POSITION: usize = 0;
const VELOCITY: usize = 1;
const HEALTH: usize = 2;

#[derive(Debug, Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}

impl Component for Position {}

#[derive(Debug, Clone, Copy)]
struct Velocity {
    dx: f32,
    dy: f32,
}

impl Component for Velocity {}

#[derive(Debug)]
struct Health(u32);

impl Component for Health {}

// Moves every entity that has both a position and a velocity
struct MovementSystem {
    movers: GroupId,
}

impl System for MovementSystem {
    fn execute(&mut self, pool: &mut Pool) {
        for entity in pool.group(self.movers).entities().to_vec() {
            let (Ok(position), Ok(velocity)) = (
                pool.get_component(entity, POSITION),
                pool.get_component(entity, VELOCITY),
            ) else {
                continue;
            };
            let (Some(position), Some(velocity)) = (
                position.downcast_ref::<Position>().copied(),
                velocity.downcast_ref::<Velocity>().copied(),
            ) else {
                continue;
            };
            let moved = Position {
                x: position.x + velocity.dx,
                y: position.y + velocity.dy,
            };
            if pool.replace_component(entity, POSITION, moved).is_ok() {
                println!("  {} moved to ({:.1}, {:.1})", entity, moved.x, moved.y);
            }
        }
    }

    fn name(&self) -> &str {
        "MovementSystem"
    }
}

fn main() {
    println!("Entity Pool - Basic Example");
    println!("===========================\n");

    let schema = ComponentSchema::new(["Position", "Velocity", "Health"]);
    let mut pool = Pool::with_config(schema, PoolConfig::new("demo").with_prewarm(2));
    println!("Created pool '{}' with {} component types", pool.name(), pool.total_components());

    let movers = pool.get_group(&Matcher::all_of([POSITION, VELOCITY]));
    pool.group_mut(movers).subscribe(GroupEventKind::Added, |event: &GroupEvent<'_>| {
        println!("  [movers] + {}", event.entity());
    });
    pool.group_mut(movers).subscribe(GroupEventKind::Removed, |event: &GroupEvent<'_>| {
        println!("  [movers] - {}", event.entity());
    });

    let alive = pool.get_group(&Matcher::all_of([HEALTH]));
    let wounded = pool.create_collector([(alive, CollectorTrigger::Added)]);

    println!("\nSpawning entities:");
    let ship = pool.create_entity("ship");
    pool.add_component(ship, POSITION, Position { x: 0.0, y: 0.0 }).unwrap();
    pool.add_component(ship, VELOCITY, Velocity { dx: 1.0, dy: 0.5 }).unwrap();
    pool.add_component(ship, HEALTH, Health(100)).unwrap();

    let rock = pool.create_entity("rock");
    pool.add_component(rock, POSITION, Position { x: 5.0, y: 5.0 }).unwrap();

    for &entity in pool.entities() {
        if let Some(record) = pool.entity_record(entity) {
            println!("  {}", record.describe(pool.schema()));
        }
    }

    println!("\nRunning systems:");
    let mut executor = SystemExecutor::new();
    executor.add_system(MovementSystem { movers });
    for _ in 0..2 {
        executor.execute(&mut pool);
    }

    println!("\nDamaging the ship:");
    pool.replace_component(ship, HEALTH, Health(60)).unwrap();
    for &entity in pool.collector(wounded).collected_entities() {
        let health = pool
            .get_component(entity, HEALTH)
            .ok()
            .and_then(|component| component.downcast_ref::<Health>())
            .map_or(0, |health| health.0);
        println!("  {} now has {} health", entity, health);
    }
    pool.clear_collector(wounded).unwrap();

    println!("\nStopping the ship:");
    pool.remove_component(ship, VELOCITY).unwrap();

    println!("\nDestroying everything:");
    pool.destroy_all_entities().unwrap();
    println!("  Live: {}, reusable: {}", pool.count(), pool.reusable_entities_count());

    let stats = pool.stats();
    println!(
        "\nStats: {} records allocated, {} created, reuse rate {:.1}%",
        stats.allocated,
        stats.created,
        stats.reuse_rate()
    );

    #[cfg(feature = "parallel")]
    println!("\n[Parallel group seeding enabled via Rayon]");

    #[cfg(not(feature = "parallel"))]
    println!("\n[Running in sequential mode]");
}
