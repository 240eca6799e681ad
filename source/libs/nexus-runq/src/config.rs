// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Construction-time configuration for a run-queue table
//! OWNERS: @kernel-sched-team
//! PUBLIC API: RunqConfig, PriorityOrder, MAX_CLASSES, MAX_PRIORITY_BITS
//! INVARIANTS: shift < priority_bits <= MAX_PRIORITY_BITS; num_classes <= MAX_CLASSES;
//!             values are fixed once a table is built

use crate::error::ConfigError;
use crate::sync::Ipl;

/// Upper bound on the number of priority classes a table can hold.
///
/// Sizes the presence bitmap (`MAX_CLASSES / 64` words) and fits `ClassIndex`.
pub const MAX_CLASSES: usize = 256;

/// Widest priority domain accepted (`Priority` is a `u16`).
pub const MAX_PRIORITY_BITS: u8 = 16;

/// Which end of the priority range is more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityOrder {
    /// `0` is the most urgent priority (BSD convention).
    #[default]
    LowerIsUrgent,
    /// The largest priority value is the most urgent.
    HigherIsUrgent,
}

/// Parameters fixed when a [`crate::RunQueueTable`] is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunqConfig {
    priority_bits: u8,
    shift: u8,
    order: PriorityOrder,
    ipl: Ipl,
}

impl RunqConfig {
    /// 128 priorities folded into 32 classes, locked at `Ipl::Sched`.
    pub const BSD: Self = Self {
        priority_bits: 7,
        shift: 2,
        order: PriorityOrder::LowerIsUrgent,
        ipl: Ipl::Sched,
    };

    /// Validates and builds a configuration.
    pub const fn new(priority_bits: u8, shift: u8) -> Result<Self, ConfigError> {
        if priority_bits == 0 || priority_bits > MAX_PRIORITY_BITS {
            return Err(ConfigError::PriorityBits { bits: priority_bits });
        }
        if shift >= priority_bits {
            return Err(ConfigError::Shift { shift, priority_bits });
        }
        let classes = 1usize << (priority_bits - shift);
        if classes > MAX_CLASSES {
            return Err(ConfigError::TooManyClasses { classes, max: MAX_CLASSES });
        }
        Ok(Self { priority_bits, shift, order: PriorityOrder::LowerIsUrgent, ipl: Ipl::Sched })
    }

    /// Returns a copy using `order` for the priority direction.
    #[must_use]
    pub const fn with_order(mut self, order: PriorityOrder) -> Self {
        self.order = order;
        self
    }

    /// Returns a copy whose critical sections mask interrupts up to `ipl`.
    #[must_use]
    pub const fn with_ipl(mut self, ipl: Ipl) -> Self {
        self.ipl = ipl;
        self
    }

    #[inline]
    pub const fn priority_bits(&self) -> u8 {
        self.priority_bits
    }

    #[inline]
    pub const fn shift(&self) -> u8 {
        self.shift
    }

    #[inline]
    pub const fn order(&self) -> PriorityOrder {
        self.order
    }

    #[inline]
    pub const fn ipl(&self) -> Ipl {
        self.ipl
    }

    /// `1 << (priority_bits - shift)`.
    #[inline]
    pub const fn num_classes(&self) -> usize {
        1usize << (self.priority_bits - self.shift)
    }

    /// Largest priority value inside the configured domain.
    #[inline]
    pub const fn max_priority(&self) -> u16 {
        ((1u32 << self.priority_bits) - 1) as u16
    }
}

impl Default for RunqConfig {
    fn default() -> Self {
        Self::BSD
    }
}
