// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Dispatcher-facing ready state and cross-table migration
//! OWNERS: @kernel-sched-team
//! PUBLIC API: ReadyState (insert/remove/select_next/peek...), SharedReadyState, migrate()
//! DEPENDS_ON: table::RunQueueTable, thread::ThreadTable, sync::IplLock
//! INVARIANTS: a thread is linked into at most one table at any time; migration never exposes
//!             a state where it is in neither or both
//!
//! ## Multiprocessor model
//!
//! One global table. [`SharedReadyState`] keeps the thread arena and the table
//! under a single [`IplLock`], and every CPU takes it with its own interrupt
//! mask. The arena is shared by every table that links its threads, so
//! per-CPU tables would still serialize on it and are not offered.

use crate::config::RunqConfig;
use crate::error::RunqError;
use crate::sync::IplLock;
use crate::table::{CheckFlags, RunQueueTable};
use crate::thread::{Thread, ThreadTable};
use crate::types::{ClassIndex, Priority, ThreadId};

/// Thread arena paired with the run-queue table that links its records.
#[derive(Debug)]
pub struct ReadyState {
    pub threads: ThreadTable,
    pub runq: RunQueueTable,
}

/// Ready state shared between CPUs and interrupt context.
pub type SharedReadyState = IplLock<ReadyState>;

static_assertions::assert_impl_all!(SharedReadyState: Send, Sync);

impl ReadyState {
    pub fn new(config: RunqConfig, max_threads: usize) -> Self {
        Self { threads: ThreadTable::with_capacity(max_threads), runq: RunQueueTable::new(config) }
    }

    /// Wraps the state in a lock masking up to the configured IPL.
    pub fn into_shared(self) -> SharedReadyState {
        IplLock::new(self.runq.config().ipl(), self)
    }

    pub fn spawn(&mut self, priority: Priority) -> Result<ThreadId, RunqError> {
        self.threads.spawn(priority)
    }

    #[track_caller]
    pub fn release(&mut self, id: ThreadId) -> Result<Thread, RunqError> {
        self.threads.release(id)
    }

    #[track_caller]
    pub fn insert(&mut self, id: ThreadId) {
        self.runq.insert(&mut self.threads, id);
    }

    #[track_caller]
    pub fn remove(&mut self, id: ThreadId) {
        self.runq.remove(&mut self.threads, id);
    }

    pub fn select_next(&mut self) -> Option<ThreadId> {
        self.runq.select_next(&mut self.threads)
    }

    pub fn peek_highest_priority_class(&self) -> Option<ClassIndex> {
        self.runq.peek_highest_priority_class()
    }

    pub fn should_preempt(&self, current: ClassIndex) -> bool {
        self.runq.should_preempt(current)
    }

    #[track_caller]
    pub fn change_priority(&mut self, id: ThreadId, priority: Priority) {
        self.runq.change_priority(&mut self.threads, id, priority);
    }

    pub fn check_invariants(&self) -> Result<(), RunqError> {
        self.runq.check_invariants(&self.threads, CheckFlags::all())
    }
}

/// Moves a queued thread from `src` to the tail of its class in `dst`.
///
/// Both tables link threads of `threads`; the exclusive borrows make the
/// remove and the insert one step. Returns the class it landed in.
#[track_caller]
pub fn migrate(
    threads: &mut ThreadTable,
    src: &mut RunQueueTable,
    dst: &mut RunQueueTable,
    id: ThreadId,
) -> ClassIndex {
    src.remove(threads, id);
    dst.insert(threads, id);
    log::debug!(target: crate::LOG_TARGET, "migrate {}: runq {} -> {}", id, src.id(), dst.id());
    dst.classifier().classify(threads.thread(id).priority())
}
