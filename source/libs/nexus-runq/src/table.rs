// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Run-queue table (one ready queue per class + presence bitmap)
//! OWNERS: @kernel-sched-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests below + tests_prop.rs + tests/scenarios.rs
//! PUBLIC API: RunQueueTable::{new, insert, remove, select_next, peek_highest_priority_class,
//!             change_priority, should_preempt, check_invariants}, CheckFlags
//! DEPENDS_ON: classify, queue, bitmap, thread
//! INVARIANTS: bitmap bit i set iff queue i non-empty after every public operation;
//!             FIFO within a class; lowest class index dispatched first
//!
//! ## Dispatch
//!
//! `select_next` takes the lowest set bitmap bit and pops the head of that
//! queue. Ties inside a class are broken strictly by insertion order, which
//! bounds the wait of equal-priority threads.

extern crate alloc;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};

use bitflags::bitflags;

use crate::bitmap::ClassPresenceBitmap;
use crate::classify::PriorityClassifier;
use crate::config::{RunqConfig, MAX_CLASSES};
use crate::error::{invariant_violation, RunqError};
use crate::queue::ReadyQueue;
use crate::thread::ThreadTable;
use crate::types::{ClassIndex, Priority, ThreadId};

bitflags! {
    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    /// Invariant families verified by [`RunQueueTable::check_invariants`].
    pub struct CheckFlags: u8 {
        /// Bitmap bit set iff the matching queue is non-empty.
        const BITMAP = 1 << 0;
        /// Ring integrity and membership of every queue.
        const LINKS = 1 << 1;
        /// Per-queue lengths add up to the runnable count.
        const COUNT = 1 << 2;
    }
}

static NEXT_TABLE_ID: AtomicU32 = AtomicU32::new(1);

/// Ready threads of one scheduler instance (or one CPU), grouped by class.
#[derive(Debug)]
pub struct RunQueueTable {
    id: u32,
    config: RunqConfig,
    classifier: PriorityClassifier,
    queues: Box<[ReadyQueue]>,
    bitmap: ClassPresenceBitmap,
    runnable: usize,
}

static_assertions::assert_impl_all!(RunQueueTable: Send, Sync);

impl RunQueueTable {
    /// Builds an empty table. This is the only allocation the table performs.
    pub fn new(config: RunqConfig) -> Self {
        let id = NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed);
        let queues: Vec<ReadyQueue> = (0..config.num_classes())
            .map(|class| ReadyQueue::new(id, ClassIndex::from_raw(class as u8)))
            .collect();
        log::debug!(
            target: crate::LOG_TARGET,
            "runq {}: classes={} shift={} ipl={:?}",
            id,
            config.num_classes(),
            config.shift(),
            config.ipl()
        );
        Self {
            id,
            config,
            classifier: PriorityClassifier::new(&config),
            queues: queues.into_boxed_slice(),
            bitmap: ClassPresenceBitmap::new(),
            runnable: 0,
        }
    }

    /// Identity recorded in the links of every thread queued here.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn config(&self) -> &RunqConfig {
        &self.config
    }

    #[inline]
    pub fn classifier(&self) -> &PriorityClassifier {
        &self.classifier
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.queues.len()
    }

    /// Total number of queued threads.
    #[inline]
    pub fn len(&self) -> usize {
        self.runnable
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bitmap.is_empty()
    }

    #[inline]
    pub fn bitmap(&self) -> &ClassPresenceBitmap {
        &self.bitmap
    }

    pub fn queue(&self, class: ClassIndex) -> Option<&ReadyQueue> {
        self.queues.get(class.as_index())
    }

    pub fn queue_len(&self, class: ClassIndex) -> usize {
        self.queue(class).map_or(0, ReadyQueue::len)
    }

    /// Makes `id` runnable: classify, append to its class, publish the class bit.
    #[track_caller]
    pub fn insert(&mut self, threads: &mut ThreadTable, id: ThreadId) {
        let priority = threads.thread(id).priority();
        let class = self.classifier.classify(priority);
        let queue = &mut self.queues[class.as_index()];
        let was_empty = queue.is_empty();
        queue.push_back(threads, id);
        if was_empty {
            self.bitmap.set(class);
        }
        self.runnable += 1;
        log::trace!(
            target: crate::LOG_TARGET,
            "runq {}: insert {} prio={} class={}",
            self.id,
            id,
            priority,
            class
        );
        self.post_check(threads, class);
    }

    /// Takes a queued thread out of contention without dispatching it.
    #[track_caller]
    pub fn remove(&mut self, threads: &mut ThreadTable, id: ThreadId) {
        let class = self.member_class(threads, id);
        let queue = &mut self.queues[class.as_index()];
        queue.remove(threads, id);
        if queue.is_empty() {
            self.bitmap.clear(class);
        }
        self.runnable -= 1;
        log::trace!(target: crate::LOG_TARGET, "runq {}: remove {} class={}", self.id, id, class);
        self.post_check(threads, class);
    }

    /// Dequeues the next thread to run, or `None` when idle.
    pub fn select_next(&mut self, threads: &mut ThreadTable) -> Option<ThreadId> {
        let class = self.bitmap.lowest_set_bit()?;
        let queue = &mut self.queues[class.as_index()];
        let Some(id) = queue.pop_front(threads) else {
            invariant_violation(RunqError::BitmapMismatch { class, bit: true, queue_empty: true });
        };
        if queue.is_empty() {
            self.bitmap.clear(class);
        }
        self.runnable -= 1;
        log::trace!(target: crate::LOG_TARGET, "runq {}: select {} class={}", self.id, id, class);
        self.post_check(threads, class);
        Some(id)
    }

    /// Most urgent non-empty class, without dequeuing anything.
    #[inline]
    pub fn peek_highest_priority_class(&self) -> Option<ClassIndex> {
        self.bitmap.lowest_set_bit()
    }

    /// True if a ready thread outranks a running thread of class `current`.
    #[inline]
    pub fn should_preempt(&self, current: ClassIndex) -> bool {
        self.peek_highest_priority_class().is_some_and(|ready| ready.outranks(current))
    }

    /// Updates a thread's priority, re-queueing it when its class changes.
    ///
    /// A queued thread whose class changes moves to the tail of the new class
    /// inside this one call; a same-class change keeps its queue position.
    #[track_caller]
    pub fn change_priority(&mut self, threads: &mut ThreadTable, id: ThreadId, priority: Priority) {
        let new_class = self.classifier.classify(priority);
        let thread = threads.thread(id);
        if !thread.is_queued() {
            threads.thread_mut(id).set_priority(priority);
            return;
        }
        let old_class = self.member_class(threads, id);
        threads.thread_mut(id).set_priority(priority);
        if old_class == new_class {
            return;
        }
        log::trace!(
            target: crate::LOG_TARGET,
            "runq {}: requeue {} class {} -> {}",
            self.id,
            id,
            old_class,
            new_class
        );
        self.remove(threads, id);
        self.insert(threads, id);
    }

    /// Queued threads in dispatch order (class, then FIFO).
    pub fn iter<'a>(&'a self, threads: &'a ThreadTable) -> impl Iterator<Item = ThreadId> + 'a {
        self.queues.iter().flat_map(move |queue| queue.iter(threads))
    }

    /// Verifies the requested invariant families. O(classes + queued threads).
    pub fn check_invariants(
        &self,
        threads: &ThreadTable,
        flags: CheckFlags,
    ) -> Result<(), RunqError> {
        if flags.contains(CheckFlags::BITMAP) {
            for raw in 0..MAX_CLASSES {
                let class = ClassIndex::from_raw(raw as u8);
                let bit = self.bitmap.get(class);
                let queue_empty = self.queue(class).map_or(true, ReadyQueue::is_empty);
                if bit == queue_empty {
                    return Err(RunqError::BitmapMismatch { class, bit, queue_empty });
                }
            }
        }
        if flags.contains(CheckFlags::LINKS) {
            for queue in self.queues.iter() {
                queue.check_links(threads)?;
            }
        }
        if flags.contains(CheckFlags::COUNT) {
            let counted: usize = self.queues.iter().map(ReadyQueue::len).sum();
            if counted != self.runnable {
                return Err(RunqError::CountMismatch { counted, recorded: self.runnable });
            }
        }
        Ok(())
    }

    #[track_caller]
    fn member_class(&self, threads: &ThreadTable, id: ThreadId) -> ClassIndex {
        let thread = threads.thread(id);
        match thread.class_index() {
            Some(class) if thread.is_queued() && thread.owner() == Some(self.id) => class,
            // Queued elsewhere: its memoized class. Idle: the class it would occupy here.
            memoized => {
                let class = match self.classifier.try_classify(thread.priority()) {
                    Ok(class) if !thread.is_queued() => class,
                    _ => memoized.unwrap_or(ClassIndex::TOP),
                };
                invariant_violation(RunqError::NotMember { thread: id, class })
            }
        }
    }

    #[inline]
    fn post_check(&self, threads: &ThreadTable, class: ClassIndex) {
        debug_assert_eq!(
            self.bitmap.get(class),
            !self.queues[class.as_index()].is_empty(),
            "bitmap out of sync for class {class}"
        );
        if cfg!(feature = "strict-invariants") {
            if let Err(err) = self.check_invariants(threads, CheckFlags::all()) {
                invariant_violation(err);
            }
        }
    }
}
