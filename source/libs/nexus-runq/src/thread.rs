// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Thread records and the arena that owns them
//! OWNERS: @kernel-sched-team
//! PUBLIC API: ThreadTable::{with_capacity, spawn, release, get, thread}, Thread, Links, Node,
//!             QueueState
//! DEPENDS_ON: types::{ThreadId, Priority, ClassIndex}
//! INVARIANTS: capacity fixed at construction; a queued thread cannot be released;
//!             Queued iff links are present
//!
//! Ready queues never own threads. They thread [`ThreadId`]s through the `links`
//! stored here, so removing an arbitrary member is O(1) without raw pointers.

extern crate alloc;

use alloc::vec::Vec;

use crate::error::{invariant_violation, RunqError};
use crate::types::{ClassIndex, Priority, ThreadId};

/// Link target inside a circular ready queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    /// The queue's sentinel head.
    Head,
    Thread(ThreadId),
}

/// Neighbour references of a queued thread (or of a queue's sentinel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Links {
    pub next: Node,
    pub prev: Node,
}

impl Links {
    /// Sentinel links of an empty queue: both point back at the head.
    pub const EMPTY: Self = Self { next: Node::Head, prev: Node::Head };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    NotQueued,
    Queued,
}

/// Scheduler-visible part of a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    priority: Priority,
    class_index: Option<ClassIndex>,
    links: Option<Links>,
    // Table that holds the links; guards removal through the wrong table.
    owner: Option<u32>,
}

impl Thread {
    const fn new(priority: Priority) -> Self {
        Self { priority, class_index: None, links: None, owner: None }
    }

    #[inline]
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Class memoized by the last insert. Only meaningful while queued.
    #[inline]
    pub fn class_index(&self) -> Option<ClassIndex> {
        self.class_index
    }

    #[inline]
    pub fn links(&self) -> Option<Links> {
        self.links
    }

    #[inline]
    pub fn queue_state(&self) -> QueueState {
        if self.links.is_some() {
            QueueState::Queued
        } else {
            QueueState::NotQueued
        }
    }

    #[inline]
    pub fn is_queued(&self) -> bool {
        self.links.is_some()
    }

    pub(crate) fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    /// Id of the run-queue table this thread is linked into.
    #[inline]
    pub fn owner(&self) -> Option<u32> {
        self.owner
    }

    pub(crate) fn link(&mut self, owner: u32, class: ClassIndex, links: Links) {
        self.owner = Some(owner);
        self.class_index = Some(class);
        self.links = Some(links);
    }

    pub(crate) fn unlink(&mut self) {
        self.owner = None;
        self.links = None;
    }

    pub(crate) fn links_mut(&mut self) -> Option<&mut Links> {
        self.links.as_mut()
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Free { next_free: Option<u32> },
    Live(Thread),
}

/// Fixed-capacity arena of thread records.
///
/// Stands in for the process/thread table: it owns every [`Thread`] and decides
/// when a slot may be reused. Storage is allocated once in `with_capacity`.
#[derive(Debug, Clone)]
pub struct ThreadTable {
    slots: Vec<Slot>,
    free_head: Option<u32>,
    live: usize,
}

impl ThreadTable {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(u32::MAX as usize);
        let mut slots = Vec::with_capacity(capacity);
        for idx in 0..capacity {
            let next = idx + 1;
            slots.push(Slot::Free { next_free: (next < capacity).then_some(next as u32) });
        }
        log::debug!(target: crate::LOG_TARGET, "thread table: capacity={}", capacity);
        Self { slots, free_head: (capacity > 0).then_some(0), live: 0 }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live thread records.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Creates a not-queued thread record.
    pub fn spawn(&mut self, priority: Priority) -> Result<ThreadId, RunqError> {
        let idx = self.free_head.ok_or(RunqError::TableFull { capacity: self.capacity() })?;
        let slot = &mut self.slots[idx as usize];
        let Slot::Free { next_free } = *slot else {
            invariant_violation(RunqError::UnknownThread { thread: ThreadId::from_raw(idx) });
        };
        *slot = Slot::Live(Thread::new(priority));
        self.free_head = next_free;
        self.live += 1;
        Ok(ThreadId::from_raw(idx))
    }

    /// Frees a thread record. Releasing a queued thread would leave dangling links.
    #[track_caller]
    pub fn release(&mut self, id: ThreadId) -> Result<Thread, RunqError> {
        let thread = self.get(id).ok_or(RunqError::UnknownThread { thread: id })?;
        if thread.is_queued() {
            invariant_violation(RunqError::AlreadyQueued { thread: id });
        }
        let slot = core::mem::replace(
            &mut self.slots[id.as_index()],
            Slot::Free { next_free: self.free_head },
        );
        self.free_head = Some(id.as_raw());
        self.live -= 1;
        match slot {
            Slot::Live(thread) => Ok(thread),
            Slot::Free { .. } => Err(RunqError::UnknownThread { thread: id }),
        }
    }

    pub fn get(&self, id: ThreadId) -> Option<&Thread> {
        match self.slots.get(id.as_index()) {
            Some(Slot::Live(thread)) => Some(thread),
            _ => None,
        }
    }

    /// Like [`Self::get`], but a dangling handle is fatal.
    #[track_caller]
    pub fn thread(&self, id: ThreadId) -> &Thread {
        match self.get(id) {
            Some(thread) => thread,
            None => invariant_violation(RunqError::UnknownThread { thread: id }),
        }
    }

    #[track_caller]
    pub(crate) fn thread_mut(&mut self, id: ThreadId) -> &mut Thread {
        match self.slots.get_mut(id.as_index()) {
            Some(Slot::Live(thread)) => thread,
            _ => invariant_violation(RunqError::UnknownThread { thread: id }),
        }
    }

    /// Live threads in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ThreadId, &Thread)> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| match slot {
            Slot::Live(thread) => Some((ThreadId::from_raw(idx as u32), thread)),
            Slot::Free { .. } => None,
        })
    }
}
