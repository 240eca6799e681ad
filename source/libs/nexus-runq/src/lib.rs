// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Ready-queue scheduling core (priority classes, O(1) next-thread selection)
//! OWNERS: @kernel-sched-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests per module + proptest suite (tests_prop.rs) + tests/scenarios.rs
//!
//! PUBLIC API:
//!   - RunQueueTable: insert/remove/select_next/peek_highest_priority_class
//!   - ReadyQueue: intrusive FIFO of runnable threads for one class
//!   - ClassPresenceBitmap: non-empty class tracking
//!   - PriorityClassifier: priority -> class mapping
//!   - ThreadTable: arena owning thread records and their links
//!   - IplLock / InterruptMask: interrupt-masking critical sections
//!   - ReadyState / migrate: dispatcher-facing state and cross-table migration
//!
//! DEPENDS_ON: spin (locking), thiserror (error derives), log (tracing), bitflags (check flags)
//! INVARIANTS: bitmap bit i set iff queue i non-empty; FIFO within a class; a thread is linked
//!             into at most one queue; no allocation after construction

#![cfg_attr(not(test), no_std)]
#![cfg_attr(not(test), forbid(clippy::unwrap_used))]
#![deny(unsafe_code)]

extern crate alloc;

pub mod bitmap;
pub mod classify;
pub mod config;
pub mod error;
pub mod queue;
pub mod state;
pub mod sync;
pub mod table;
pub mod thread;
pub mod types;

#[cfg(test)]
mod tests_prop;

pub use bitmap::ClassPresenceBitmap;
pub use classify::PriorityClassifier;
pub use config::{PriorityOrder, RunqConfig, MAX_CLASSES, MAX_PRIORITY_BITS};
pub use error::{invariant_violation, ConfigError, RunqError};
pub use queue::ReadyQueue;
pub use state::{migrate, ReadyState, SharedReadyState};
pub use sync::{InterruptMask, Ipl, IplGuard, IplLock, SoftIpl};
pub use table::{CheckFlags, RunQueueTable};
pub use thread::{Links, Node, QueueState, Thread, ThreadTable};
pub use types::{ClassIndex, Priority, ThreadId};

/// Log target shared by every module in this crate.
pub(crate) const LOG_TARGET: &str = "nexus_runq";
