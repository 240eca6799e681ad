// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Dispatcher-level scenarios for the run-queue core
//! OWNERS: @kernel-sched-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: 8 integration tests
//!
//! TEST_SCOPE:
//!   - Dispatch order across classes and within a class
//!   - Idle detection
//!   - Fatal paths for caller contract violations
//!   - Concurrent access through the IPL lock
//!
//! TEST_SCENARIOS:
//!   - four_class_dispatch_order(): classes [2, 0, 1, 0] dispatch as T2, T4, T3, T1, idle
//!   - fifo_within_class_before_later_arrivals(): A, B, C precede a later D of the same class
//!   - idle_after_everything_removed(): select/peek both report idle
//!   - preemption_check_tracks_ready_set(): should_preempt follows inserts and selects
//!   - concurrent_producers_and_dispatcher(): threads insert while one dispatches; each
//!     context is masked inside its critical sections and unmasked after them
//!   - *_is_fatal(): AlreadyQueued / NotMember / InvalidPriority take the panic path
//!
//! DEPENDENCIES:
//!   - nexus_runq::{ReadyState, RunqConfig, SoftIpl, InterruptMask}

use std::sync::Arc;
use std::thread;

use nexus_runq::{
    ClassIndex, InterruptMask, Ipl, Priority, ReadyState, RunqConfig, SoftIpl, ThreadId,
};

fn four_classes() -> RunqConfig {
    // 16 priorities, four per class.
    RunqConfig::new(4, 2).unwrap()
}

fn spawn(state: &mut ReadyState, prio: u16) -> ThreadId {
    state.spawn(Priority::from_raw(prio)).unwrap()
}

#[test]
fn four_class_dispatch_order() {
    let mut state = ReadyState::new(four_classes(), 4);
    assert_eq!(state.runq.num_classes(), 4);
    let t1 = spawn(&mut state, 8); // class 2
    let t2 = spawn(&mut state, 0); // class 0
    let t3 = spawn(&mut state, 4); // class 1
    let t4 = spawn(&mut state, 1); // class 0
    for t in [t1, t2, t3, t4] {
        state.insert(t);
    }

    assert_eq!(state.select_next(), Some(t2));
    assert_eq!(state.select_next(), Some(t4));
    assert_eq!(state.select_next(), Some(t3));
    assert_eq!(state.select_next(), Some(t1));
    assert_eq!(state.select_next(), None);
    state.check_invariants().unwrap();
}

#[test]
fn fifo_within_class_before_later_arrivals() {
    let mut state = ReadyState::new(four_classes(), 4);
    let a = spawn(&mut state, 5);
    let b = spawn(&mut state, 6);
    let c = spawn(&mut state, 7);
    let d = spawn(&mut state, 4);
    state.insert(a);
    state.insert(b);
    state.insert(c);
    assert_eq!(state.select_next(), Some(a));
    state.insert(d);
    assert_eq!(state.select_next(), Some(b));
    assert_eq!(state.select_next(), Some(c));
    assert_eq!(state.select_next(), Some(d));
}

#[test]
fn idle_after_everything_removed() {
    let mut state = ReadyState::new(RunqConfig::default(), 8);
    assert_eq!(state.select_next(), None);
    assert_eq!(state.peek_highest_priority_class(), None);

    let ids: Vec<_> = (0..8).map(|i| spawn(&mut state, i * 16)).collect();
    for &id in &ids {
        state.insert(id);
    }
    for &id in ids.iter().rev() {
        state.remove(id);
    }
    assert_eq!(state.select_next(), None);
    assert_eq!(state.peek_highest_priority_class(), None);
    assert!(state.runq.bitmap().is_empty());
    state.check_invariants().unwrap();
}

#[test]
fn preemption_check_tracks_ready_set() {
    let mut state = ReadyState::new(four_classes(), 2);
    let running = ClassIndex::from_raw(1);
    let low = spawn(&mut state, 12);
    let high = spawn(&mut state, 2);

    state.insert(low);
    assert!(!state.should_preempt(running));
    state.insert(high);
    assert!(state.should_preempt(running));
    assert_eq!(state.select_next(), Some(high));
    assert!(!state.should_preempt(running));
}

#[test]
fn concurrent_producers_and_dispatcher() {
    const PRODUCERS: u16 = 4;
    const PER_PRODUCER: u16 = 32;

    let total = usize::from(PRODUCERS * PER_PRODUCER);
    let mut state = ReadyState::new(RunqConfig::default(), total);
    let mut batches = Vec::new();
    for p in 0..PRODUCERS {
        let ids: Vec<_> =
            (0..PER_PRODUCER).map(|i| spawn(&mut state, (p * 31 + i) % 128)).collect();
        batches.push(ids);
    }
    let shared = Arc::new(state.into_shared());

    let producers: Vec<_> = batches
        .into_iter()
        .map(|ids| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let cpu = SoftIpl::new();
                for id in ids {
                    let mut guard = shared.lock(&cpu);
                    assert_eq!(cpu.current(), Ipl::Sched);
                    guard.insert(id);
                }
                cpu.current()
            })
        })
        .collect();

    let cpu = SoftIpl::new();
    let mut dispatched = 0usize;
    while dispatched < total {
        let mut guard = shared.lock(&cpu);
        assert_eq!(cpu.current(), Ipl::Sched);
        let picked = guard.select_next();
        drop(guard);
        assert_eq!(cpu.current(), Ipl::None);
        match picked {
            Some(_) => dispatched += 1,
            None => thread::yield_now(),
        }
    }
    for handle in producers {
        assert_eq!(handle.join().unwrap(), Ipl::None);
    }

    let guard = shared.lock(&cpu);
    assert!(guard.runq.is_empty());
    assert_eq!(guard.runq.len(), 0);
    guard.check_invariants().unwrap();
}

#[test]
#[should_panic(expected = "is already queued")]
fn double_insert_is_fatal() {
    let mut state = ReadyState::new(four_classes(), 1);
    let t = spawn(&mut state, 0);
    state.insert(t);
    state.insert(t);
}

#[test]
#[should_panic(expected = "is not a member")]
fn remove_of_dispatched_thread_is_fatal() {
    let mut state = ReadyState::new(four_classes(), 1);
    let t = spawn(&mut state, 3);
    state.insert(t);
    assert_eq!(state.select_next(), Some(t));
    state.remove(t);
}

#[test]
#[should_panic(expected = "invalid priority")]
fn out_of_domain_priority_is_fatal() {
    let mut state = ReadyState::new(four_classes(), 1);
    let t = spawn(&mut state, 99);
    state.insert(t);
}
