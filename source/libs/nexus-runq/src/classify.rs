// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Pure priority -> class mapping
//! OWNERS: @kernel-sched-team
//! PUBLIC API: PriorityClassifier::{new, classify, try_classify}
//! INVARIANTS: total on [0, max_priority]; monotonic (more urgent never maps to a later class)

use crate::config::{PriorityOrder, RunqConfig};
use crate::error::{invariant_violation, RunqError};
use crate::types::{ClassIndex, Priority};

/// Folds a wide priority range into `num_classes` buckets with a right shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityClassifier {
    shift: u8,
    max_priority: u16,
    num_classes: usize,
    order: PriorityOrder,
}

impl PriorityClassifier {
    pub const fn new(config: &RunqConfig) -> Self {
        Self {
            shift: config.shift(),
            max_priority: config.max_priority(),
            num_classes: config.num_classes(),
            order: config.order(),
        }
    }

    #[inline]
    pub const fn num_classes(&self) -> usize {
        self.num_classes
    }

    #[inline]
    pub const fn max_priority(&self) -> u16 {
        self.max_priority
    }

    /// Maps `priority` to its class, rejecting values outside the domain.
    #[inline]
    pub const fn try_classify(&self, priority: Priority) -> Result<ClassIndex, RunqError> {
        let raw = priority.as_raw();
        if raw > self.max_priority {
            return Err(RunqError::InvalidPriority { priority, max: self.max_priority });
        }
        let urgency = match self.order {
            PriorityOrder::LowerIsUrgent => raw,
            PriorityOrder::HigherIsUrgent => self.max_priority - raw,
        };
        // num_classes <= MAX_CLASSES, so the shifted value fits a u8.
        Ok(ClassIndex::from_raw((urgency >> self.shift) as u8))
    }

    /// Maps `priority` to its class. An out-of-domain priority is a caller bug.
    #[inline]
    #[track_caller]
    pub fn classify(&self, priority: Priority) -> ClassIndex {
        match self.try_classify(priority) {
            Ok(class) => class,
            Err(err) => invariant_violation(err),
        }
    }
}
