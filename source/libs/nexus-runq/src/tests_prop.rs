// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg(test)]
//! CONTEXT: Property-based tests for the run-queue table
//! OWNERS: @kernel-sched-team
//! NOTE: Tests only; no scheduler logic. Drives the table against a VecDeque-per-class model.
//!
//! TEST_SCOPE:
//!   - Bitmap/queue consistency after arbitrary operation sequences
//!   - Priority ordering and FIFO within a class
//!   - Arbitrary removal keeps rings intact and other classes untouched
//!   - Insert-then-remove of a lone thread restores the previous table state
//!
//! TEST_SCENARIOS:
//!   - table_matches_model(): random insert/remove/select/change_priority vs. reference model
//!   - drain_is_class_ordered_and_fifo(): draining yields non-decreasing classes, FIFO per class
//!   - lone_insert_remove_is_identity(): bitmap and queue shape restored
//!   - removal_leaves_other_classes_alone(): middle removal only touches its own class

use std::collections::VecDeque;

use proptest::prelude::*;

use crate::config::RunqConfig;
use crate::table::{CheckFlags, RunQueueTable};
use crate::thread::ThreadTable;
use crate::types::{ClassIndex, Priority, ThreadId};

const POOL: usize = 12;
// 6 priority bits, shift 3: 64 priorities over 8 classes.
const PRIORITY_BITS: u8 = 6;
const SHIFT: u8 = 3;

#[derive(Debug, Clone)]
enum Op {
    Insert(usize),
    Remove(usize),
    Select,
    Change(usize, u16),
}

fn arb_priority() -> impl Strategy<Value = u16> {
    0u16..(1 << PRIORITY_BITS)
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..POOL).prop_map(Op::Insert),
        2 => (0..POOL).prop_map(Op::Remove),
        2 => Just(Op::Select),
        1 => (0..POOL, arb_priority()).prop_map(|(idx, prio)| Op::Change(idx, prio)),
    ]
}

fn config() -> RunqConfig {
    RunqConfig::new(PRIORITY_BITS, SHIFT).unwrap()
}

fn class_of(prio: u16) -> usize {
    (prio >> SHIFT) as usize
}

struct Harness {
    threads: ThreadTable,
    table: RunQueueTable,
    ids: Vec<ThreadId>,
    prios: Vec<u16>,
    model: Vec<VecDeque<ThreadId>>,
}

impl Harness {
    fn new(prios: &[u16]) -> Self {
        let mut threads = ThreadTable::with_capacity(prios.len());
        let ids = prios.iter().map(|&p| threads.spawn(Priority::from_raw(p)).unwrap()).collect();
        let table = RunQueueTable::new(config());
        let model = (0..table.num_classes()).map(|_| VecDeque::new()).collect();
        Self { threads, table, ids, prios: prios.to_vec(), model }
    }

    fn queued(&self, idx: usize) -> bool {
        self.threads.thread(self.ids[idx]).is_queued()
    }

    fn insert(&mut self, idx: usize) {
        self.table.insert(&mut self.threads, self.ids[idx]);
        self.model[class_of(self.prios[idx])].push_back(self.ids[idx]);
    }

    fn remove(&mut self, idx: usize) {
        let id = self.ids[idx];
        self.table.remove(&mut self.threads, id);
        let queue = &mut self.model[class_of(self.prios[idx])];
        let pos = queue.iter().position(|&t| t == id).unwrap();
        queue.remove(pos);
    }

    fn apply(&mut self, op: &Op) -> Result<(), TestCaseError> {
        match *op {
            Op::Insert(idx) if !self.queued(idx) => self.insert(idx),
            Op::Remove(idx) if self.queued(idx) => self.remove(idx),
            Op::Insert(_) | Op::Remove(_) => {}
            Op::Select => {
                let expected = self.model.iter_mut().find_map(|q| q.pop_front());
                prop_assert_eq!(self.table.select_next(&mut self.threads), expected);
            }
            Op::Change(idx, prio) => {
                let id = self.ids[idx];
                let old = class_of(self.prios[idx]);
                let new = class_of(prio);
                self.table.change_priority(&mut self.threads, id, Priority::from_raw(prio));
                if self.queued(idx) && old != new {
                    let pos = self.model[old].iter().position(|&t| t == id).unwrap();
                    self.model[old].remove(pos);
                    self.model[new].push_back(id);
                }
                self.prios[idx] = prio;
            }
        }
        Ok(())
    }

    fn class_members(&self, class: usize) -> Vec<ThreadId> {
        let class = ClassIndex::from_raw(class as u8);
        self.table.queue(class).unwrap().iter(&self.threads).collect()
    }

    fn verify(&self) -> Result<(), TestCaseError> {
        prop_assert_eq!(self.table.check_invariants(&self.threads, CheckFlags::all()), Ok(()));
        for (class, queue) in self.model.iter().enumerate() {
            let index = ClassIndex::from_raw(class as u8);
            prop_assert_eq!(self.table.bitmap().get(index), !queue.is_empty());
            let actual = self.class_members(class);
            let expected: Vec<_> = queue.iter().copied().collect();
            prop_assert_eq!(actual, expected);
        }
        let first = self.model.iter().position(|q| !q.is_empty());
        prop_assert_eq!(
            self.table.peek_highest_priority_class(),
            first.map(|c| ClassIndex::from_raw(c as u8))
        );
        Ok(())
    }
}

proptest! {
    #[test]
    fn table_matches_model(
        prios in prop::collection::vec(arb_priority(), POOL),
        ops in prop::collection::vec(arb_op(), 1..64),
    ) {
        let mut h = Harness::new(&prios);
        for op in &ops {
            h.apply(op)?;
            h.verify()?;
        }
    }

    #[test]
    fn drain_is_class_ordered_and_fifo(prios in prop::collection::vec(arb_priority(), 1..POOL)) {
        let mut h = Harness::new(&prios);
        for idx in 0..prios.len() {
            h.insert(idx);
        }
        let mut drained = Vec::new();
        while let Some(id) = h.table.select_next(&mut h.threads) {
            drained.push(id);
        }
        prop_assert_eq!(drained.len(), prios.len());
        prop_assert!(h.table.is_empty());
        prop_assert_eq!(h.table.peek_highest_priority_class(), None);

        let classes: Vec<usize> = drained.iter().map(|id| class_of(prios[id.as_index()])).collect();
        prop_assert!(classes.windows(2).all(|w| w[0] <= w[1]));
        // Thread ids were spawned in insertion order, so FIFO means ascending ids per class.
        for pair in drained.windows(2) {
            if class_of(prios[pair[0].as_index()]) == class_of(prios[pair[1].as_index()]) {
                prop_assert!(pair[0] < pair[1]);
            }
        }
    }

    #[test]
    fn lone_insert_remove_is_identity(
        prios in prop::collection::vec(arb_priority(), 1..POOL),
        lone in arb_priority(),
    ) {
        let mut all = prios.clone();
        all.push(lone);
        let mut h = Harness::new(&all);
        let lone_idx = prios.len();
        for idx in 0..prios.len() {
            if class_of(prios[idx]) != class_of(lone) {
                h.insert(idx);
            }
        }
        let bitmap_before = *h.table.bitmap();
        let order_before: Vec<_> = h.table.iter(&h.threads).collect();

        h.insert(lone_idx);
        h.remove(lone_idx);

        prop_assert_eq!(*h.table.bitmap(), bitmap_before);
        prop_assert_eq!(h.table.iter(&h.threads).collect::<Vec<_>>(), order_before);
        prop_assert!(h.table.queue(ClassIndex::from_raw(class_of(lone) as u8)).unwrap().is_empty());
        h.verify()?;
    }

    #[test]
    fn removal_leaves_other_classes_alone(
        prios in prop::collection::vec(arb_priority(), 3..POOL),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut h = Harness::new(&prios);
        for idx in 0..prios.len() {
            h.insert(idx);
        }
        let victim = pick.index(prios.len());
        let victim_class = class_of(prios[victim]);
        let others: Vec<Vec<ThreadId>> = (0..h.table.num_classes())
            .filter(|&c| c != victim_class)
            .map(|c| h.class_members(c))
            .collect();

        h.remove(victim);
        h.verify()?;

        let after: Vec<Vec<ThreadId>> = (0..h.table.num_classes())
            .filter(|&c| c != victim_class)
            .map(|c| h.class_members(c))
            .collect();
        prop_assert_eq!(others, after);
    }
}
