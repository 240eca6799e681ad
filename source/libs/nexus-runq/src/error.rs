// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Error taxonomy for the run-queue core and its fatal path
//! OWNERS: @kernel-sched-team
//! PUBLIC API: RunqError, ConfigError, invariant_violation()
//! DEPENDS_ON: thiserror (derives), log (fatal reporting)
//! INVARIANTS: scheduler-state violations never flow back as recoverable values on the hot path
//!
//! `AlreadyQueued`, `NotMember` and `InvalidPriority` describe bugs in the caller.
//! The hot-path API hands them to [`invariant_violation`], which halts before a
//! corrupted queue can produce another dispatch decision. The `try_*`/`check_*`
//! helpers return them as values so boundaries and tests can inspect them.

use thiserror::Error;

use crate::types::{ClassIndex, Priority, ThreadId};

/// Scheduler-internal invariant violations and arena failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RunqError {
    /// Priority lies outside the configured domain.
    #[error("invalid priority {priority} (max {max})")]
    InvalidPriority { priority: Priority, max: u16 },
    /// Insert on a thread that is already linked into a ready queue.
    #[error("thread {thread} is already queued")]
    AlreadyQueued { thread: ThreadId },
    /// Remove on a thread that is not linked into the indicated queue.
    #[error("thread {thread} is not a member of class {class}")]
    NotMember { thread: ThreadId, class: ClassIndex },
    /// Handle does not name a live arena slot.
    #[error("unknown thread {thread}")]
    UnknownThread { thread: ThreadId },
    /// Arena has no free slots.
    #[error("thread table full (capacity {capacity})")]
    TableFull { capacity: usize },
    /// Presence bitmap disagrees with the queue it summarises.
    #[error("bitmap bit {class} is {bit} but queue is {}", emptiness(.queue_empty))]
    BitmapMismatch { class: ClassIndex, bit: bool, queue_empty: bool },
    /// A queue's next/prev chain is broken or its length counter is wrong.
    #[error("ready queue {class} has corrupted links")]
    CorruptLinks { class: ClassIndex },
    /// Sum of queue lengths differs from the table-wide runnable count.
    #[error("runnable count {counted} differs from recorded {recorded}")]
    CountMismatch { counted: usize, recorded: usize },
}

fn emptiness(empty: &bool) -> &'static str {
    if *empty {
        "empty"
    } else {
        "non-empty"
    }
}

/// Rejected [`crate::RunqConfig`] shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("priority width {bits} out of range (1..=16)")]
    PriorityBits { bits: u8 },
    #[error("shift {shift} must be smaller than priority width {priority_bits}")]
    Shift { shift: u8, priority_bits: u8 },
    #[error("{classes} classes exceed the supported maximum {max}")]
    TooManyClasses { classes: usize, max: usize },
}

/// Halts on scheduler-state corruption.
///
/// Never returns; callers treat the violation as unreachable in correct code.
#[cold]
#[inline(never)]
#[track_caller]
pub fn invariant_violation(err: RunqError) -> ! {
    log::error!(target: crate::LOG_TARGET, "run-queue invariant violated: {}", err);
    panic!("run-queue invariant violated: {err}");
}
