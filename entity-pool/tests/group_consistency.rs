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
//! Group consistency tests
//!
//! Drives the pool with seeded random operation sequences and checks every
//! cached group against a brute-force scan of the live entities.

use entity_pool::ecs::{
    Component, ComponentIndex, ComponentSchema, Entity, GroupEvent, GroupEventKind, GroupId,
    Matcher,
};
use entity_pool::pool::{Pool, PoolConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

const TOTAL: usize = 6;

#[derive(Debug, Clone, PartialEq)]
struct Value(u64);
impl Component for Value {}

fn schema() -> ComponentSchema {
    ComponentSchema::new(["A", "B", "C", "D", "E", "F"])
}

fn matchers() -> Vec<Matcher> {
    vec![
        Matcher::all_of([0]),
        Matcher::all_of([0, 1]),
        Matcher::any_of([2, 3]),
        Matcher::all_of([1]).with_none_of([4]),
        Matcher::any_of([0, 5]).with_none_of([1, 2]),
        Matcher::all_of([3]).with_any_of([4, 5]).with_none_of([0]),
        Matcher::none_of([2, 4]),
    ]
}

fn brute_force(pool: &Pool, matcher: &Matcher) -> HashSet<Entity> {
    pool.entities()
        .iter()
        .copied()
        .filter(|&e| pool.entity_record(e).map_or(false, |record| matcher.matches(record)))
        .collect()
}

fn assert_groups_consistent(pool: &Pool, groups: &[GroupId]) {
    for &id in groups {
        let group = pool.group(id);
        let cached: HashSet<Entity> = group.entities().iter().copied().collect();
        assert_eq!(cached.len(), group.len(), "group {} holds duplicates", group.matcher());
        assert_eq!(cached, brute_force(pool, group.matcher()), "group {} drifted", group.matcher());
    }
}

/// Apply one random operation
fn step(pool: &mut Pool, rng: &mut StdRng) {
    let live = pool.entities().to_vec();
    let roll = rng.gen_range(0..100);
    if live.is_empty() || roll < 15 {
        pool.create_entity("random");
        return;
    }

    let entity = live[rng.gen_range(0..live.len())];
    let index: ComponentIndex = rng.gen_range(0..TOTAL);
    match roll {
        15..=24 => pool.destroy_entity(entity).unwrap(),
        25..=59 => {
            if !pool.has_component(entity, index) {
                pool.add_component(entity, index, Value(rng.gen())).unwrap();
            }
        }
        60..=84 => {
            if pool.has_component(entity, index) {
                pool.remove_component(entity, index).unwrap();
            }
        }
        _ => {
            pool.replace_component(entity, index, Value(rng.gen())).unwrap();
        }
    }
}

#[test]
fn test_groups_match_brute_force_after_random_operations() {
    for seed in [1_u64, 7, 42, 1234] {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pool = Pool::new(schema());
        let groups: Vec<GroupId> = matchers().iter().map(|m| pool.get_group(m)).collect();

        for _ in 0..2_000 {
            step(&mut pool, &mut rng);
        }
        assert_groups_consistent(&pool, &groups);
    }
}

#[test]
fn test_groups_consistent_after_every_operation() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut pool = Pool::new(schema());
    let groups: Vec<GroupId> = matchers().iter().map(|m| pool.get_group(m)).collect();

    for _ in 0..500 {
        step(&mut pool, &mut rng);
        assert_groups_consistent(&pool, &groups);
    }
}

#[test]
fn test_late_groups_seed_to_same_membership() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut early = Pool::new(schema());
    let early_groups: Vec<GroupId> = matchers().iter().map(|m| early.get_group(m)).collect();
    for _ in 0..1_000 {
        step(&mut early, &mut rng);
    }

    // Groups created after the fact are seeded from the live entities,
    // sequentially and with parallel matcher evaluation.
    for threshold in [usize::MAX, 1] {
        let mut rng = StdRng::seed_from_u64(5);
        let config = PoolConfig::default().with_parallel_seed_threshold(threshold);
        let mut late = Pool::with_config(schema(), config);
        for _ in 0..1_000 {
            step(&mut late, &mut rng);
        }
        let late_groups: Vec<GroupId> = matchers().iter().map(|m| late.get_group(m)).collect();

        for (&a, &b) in early_groups.iter().zip(&late_groups) {
            let sizes = (early.group(a).len(), late.group(b).len());
            assert_eq!(sizes.0, sizes.1, "group {} differs", early.group(a).matcher());
        }
        assert_groups_consistent(&late, &late_groups);
    }
}

#[test]
fn test_fan_out_only_reaches_referenced_indices() {
    let mut pool = Pool::new(schema());
    let group = pool.get_group(&Matcher::all_of([0]).with_none_of([1]));
    let events = Rc::new(RefCell::new(Vec::new()));
    for kind in [GroupEventKind::Added, GroupEventKind::Removed, GroupEventKind::Updated] {
        let sink = Rc::clone(&events);
        pool.group_mut(group).subscribe(kind, move |event: &GroupEvent<'_>| {
            sink.borrow_mut().push(event.kind());
        });
    }

    let e = pool.create_entity("e");
    // Unreferenced indices never reach the group
    for index in 2..TOTAL {
        pool.add_component(e, index, Value(0)).unwrap();
    }
    assert!(events.borrow().is_empty());

    pool.add_component(e, 0, Value(1)).unwrap();
    pool.add_component(e, 1, Value(2)).unwrap();
    pool.remove_component(e, 1).unwrap();
    pool.replace_component(e, 0, Value(3)).unwrap();
    pool.replace_component(e, 4, Value(4)).unwrap();
    assert_eq!(
        *events.borrow(),
        vec![
            GroupEventKind::Added,
            GroupEventKind::Removed,
            GroupEventKind::Added,
            GroupEventKind::Updated,
        ]
    );
}

#[test]
fn test_observer_reads_post_mutation_membership() {
    let mut pool = Pool::new(schema());
    let group = pool.get_group(&Matcher::any_of([0, 1]));
    let seen = Rc::new(RefCell::new(Vec::new()));
    for kind in [GroupEventKind::Added, GroupEventKind::Removed] {
        let sink = Rc::clone(&seen);
        pool.group_mut(group).subscribe(kind, move |event: &GroupEvent<'_>| {
            let listed = event.members().contains(&event.entity());
            match event {
                GroupEvent::EntityAdded { index, component, .. } => {
                    assert!(listed, "added entity missing from members");
                    let value = component.and_then(|c| c.downcast_ref::<Value>()).map(|v| v.0);
                    sink.borrow_mut().push((event.kind(), *index, value));
                }
                GroupEvent::EntityRemoved { index, component, .. } => {
                    assert!(!listed, "removed entity still in members");
                    let value = component.and_then(|c| c.downcast_ref::<Value>()).map(|v| v.0);
                    sink.borrow_mut().push((event.kind(), *index, value));
                }
                GroupEvent::EntityUpdated { .. } => {}
            }
        });
    }

    let e = pool.create_entity("e");
    pool.add_component(e, 1, Value(11)).unwrap();
    // Already a member through index 1
    pool.add_component(e, 0, Value(10)).unwrap();
    pool.remove_component(e, 1).unwrap();
    pool.remove_component(e, 0).unwrap();
    assert_eq!(
        *seen.borrow(),
        vec![
            (GroupEventKind::Added, Some(1), Some(11)),
            (GroupEventKind::Removed, Some(0), Some(10)),
        ]
    );
    assert_eq!(pool.group(group).single_entity(), Ok(None));
}

#[test]
fn test_negative_matcher_membership_events() {
    let mut pool = Pool::new(schema());
    let group = pool.get_group(&Matcher::none_of([0]));
    let sizes = Rc::new(RefCell::new(Vec::new()));
    for kind in [GroupEventKind::Added, GroupEventKind::Removed] {
        let sink = Rc::clone(&sizes);
        pool.group_mut(group).subscribe(kind, move |event: &GroupEvent<'_>| {
            sink.borrow_mut().push((event.kind(), event.members().len()));
        });
    }

    let a = pool.create_entity("a");
    let b = pool.create_entity("b");
    pool.add_component(a, 0, Value(0)).unwrap();
    pool.destroy_entity(b).unwrap();
    assert!(pool.group(group).is_empty());
    assert_eq!(
        *sizes.borrow(),
        vec![
            (GroupEventKind::Added, 1),
            (GroupEventKind::Added, 2),
            (GroupEventKind::Removed, 1),
            (GroupEventKind::Removed, 0),
        ]
    );
}
