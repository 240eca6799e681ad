// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Newtypes for scheduler-facing identifiers (priority, class, thread handle)
//! OWNERS: @kernel-sched-team
//! PUBLIC API: Priority, ClassIndex, ThreadId
//! INVARIANTS: ClassIndex < MAX_CLASSES; ThreadId is an arena slot index, not a PID
//!
//! Keeping these distinct prevents passing a raw priority where a class index is
//! expected (both are small integers and the mistake would otherwise typecheck).

use core::fmt;

/// Numeric scheduling priority. Whether smaller or larger is more urgent is
/// decided by [`crate::PriorityOrder`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Priority(u16);

impl Priority {
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_raw(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for Priority {
    #[inline]
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

/// Index of a priority class (one ready queue per class).
///
/// **Ordering**: a numerically lower class is dispatched first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ClassIndex(u8);

impl ClassIndex {
    /// Highest-priority class.
    pub const TOP: Self = Self(0);

    #[inline]
    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_raw(self) -> u8 {
        self.0
    }

    /// Returns the class as an index into per-class arrays.
    #[inline]
    pub const fn as_index(self) -> usize {
        self.0 as usize
    }

    /// Returns true if `self` is dispatched strictly before `other`.
    #[inline]
    pub const fn outranks(self, other: Self) -> bool {
        self.0 < other.0
    }
}

impl fmt::Display for ClassIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a thread record stored in a [`crate::ThreadTable`].
///
/// **Ownership**: Only `ThreadTable` hands these out; a handle is valid until the
/// slot is released.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ThreadId(u32);

impl ThreadId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn as_index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

static_assertions::assert_eq_size!(ThreadId, u32);
static_assertions::assert_eq_size!(ClassIndex, u8);
