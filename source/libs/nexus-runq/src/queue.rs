// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Per-class ready queue (circular doubly-linked list with sentinel head)
//! OWNERS: @kernel-sched-team
//! PUBLIC API: ReadyQueue::{push_back, pop_front, remove, is_empty, len, front, iter, check_links}
//! DEPENDS_ON: thread::{ThreadTable, Links, Node}
//! INVARIANTS: head.next == head.prev == Head iff empty; every member carries this queue's
//!             class and owner; push/pop/remove are O(1) and allocation-free
//!
//! Links live in the thread records (see `thread.rs`); the queue itself only
//! stores the sentinel's two links and a length counter.

use crate::error::{invariant_violation, RunqError};
use crate::thread::{Links, Node, ThreadTable};
use crate::types::{ClassIndex, ThreadId};

/// FIFO of runnable threads belonging to one priority class.
///
/// Queues only exist inside a [`RunQueueTable`](crate::table::RunQueueTable) and carry its
/// id; outside code cannot build one that claims another table's threads:
///
/// ```compile_fail
/// let queue = nexus_runq::ReadyQueue::new(1, nexus_runq::ClassIndex::TOP);
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct ReadyQueue {
    owner: u32,
    class: ClassIndex,
    head: Links,
    len: usize,
}

impl ReadyQueue {
    /// Creates an empty queue for `class` inside the table identified by `owner`.
    pub(crate) const fn new(owner: u32, class: ClassIndex) -> Self {
        Self { owner, class, head: Links::EMPTY, len: 0 }
    }

    #[inline]
    pub const fn class(&self) -> ClassIndex {
        self.class
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        matches!(self.head.next, Node::Head)
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Thread that `pop_front` would return.
    #[inline]
    pub const fn front(&self) -> Option<ThreadId> {
        match self.head.next {
            Node::Head => None,
            Node::Thread(id) => Some(id),
        }
    }

    /// Appends `id` at the tail. The thread must not be queued anywhere.
    #[track_caller]
    pub fn push_back(&mut self, threads: &mut ThreadTable, id: ThreadId) {
        if threads.thread(id).is_queued() {
            invariant_violation(RunqError::AlreadyQueued { thread: id });
        }
        let tail = self.head.prev;
        threads.thread_mut(id).link(self.owner, self.class, Links { next: Node::Head, prev: tail });
        self.links_of(threads, tail).next = Node::Thread(id);
        self.head.prev = Node::Thread(id);
        self.len += 1;
    }

    /// Detaches and returns the head, or `None` when empty.
    pub fn pop_front(&mut self, threads: &mut ThreadTable) -> Option<ThreadId> {
        let id = self.front()?;
        self.unlink(threads, id);
        Some(id)
    }

    /// Detaches an arbitrary member using its own links.
    #[track_caller]
    pub fn remove(&mut self, threads: &mut ThreadTable, id: ThreadId) {
        let thread = threads.thread(id);
        let member = thread.is_queued()
            && thread.owner() == Some(self.owner)
            && thread.class_index() == Some(self.class);
        if !member {
            invariant_violation(RunqError::NotMember { thread: id, class: self.class });
        }
        self.unlink(threads, id);
    }

    /// Members in FIFO order.
    pub fn iter<'a>(&self, threads: &'a ThreadTable) -> Iter<'a> {
        Iter { threads, cursor: self.head.next, remaining: self.len }
    }

    /// Walks the ring and verifies both link directions, membership and `len`.
    ///
    /// Bounded by `len + 1` steps, so a corrupted ring cannot loop forever.
    pub fn check_links(&self, threads: &ThreadTable) -> Result<(), RunqError> {
        let corrupt = RunqError::CorruptLinks { class: self.class };
        let mut prev = Node::Head;
        let mut cursor = self.head.next;
        let mut seen = 0usize;
        while let Node::Thread(id) = cursor {
            if seen == self.len {
                return Err(corrupt);
            }
            let thread = threads.get(id).ok_or(corrupt)?;
            let links = thread.links().ok_or(corrupt)?;
            if links.prev != prev
                || thread.owner() != Some(self.owner)
                || thread.class_index() != Some(self.class)
            {
                return Err(corrupt);
            }
            prev = cursor;
            cursor = links.next;
            seen += 1;
        }
        if seen != self.len || self.head.prev != prev {
            return Err(corrupt);
        }
        Ok(())
    }

    fn unlink(&mut self, threads: &mut ThreadTable, id: ThreadId) {
        let Some(links) = threads.thread(id).links() else {
            invariant_violation(RunqError::NotMember { thread: id, class: self.class });
        };
        self.links_of(threads, links.prev).next = links.next;
        self.links_of(threads, links.next).prev = links.prev;
        threads.thread_mut(id).unlink();
        self.len -= 1;
    }

    fn links_of<'a>(&'a mut self, threads: &'a mut ThreadTable, node: Node) -> &'a mut Links {
        let class = self.class;
        match node {
            Node::Head => &mut self.head,
            Node::Thread(id) => match threads.thread_mut(id).links_mut() {
                Some(links) => links,
                None => invariant_violation(RunqError::CorruptLinks { class }),
            },
        }
    }
}

/// FIFO iterator over a [`ReadyQueue`].
pub struct Iter<'a> {
    threads: &'a ThreadTable,
    cursor: Node,
    remaining: usize,
}

impl Iterator for Iter<'_> {
    type Item = ThreadId;

    fn next(&mut self) -> Option<ThreadId> {
        if self.remaining == 0 {
            return None;
        }
        let Node::Thread(id) = self.cursor else {
            return None;
        };
        self.cursor = self.threads.get(id)?.links()?.next;
        self.remaining -= 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
