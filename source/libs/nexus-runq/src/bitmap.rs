// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Presence bitmap over priority classes
//! OWNERS: @kernel-sched-team
//! PUBLIC API: ClassPresenceBitmap::{set, clear, get, lowest_set_bit, is_empty, count}
//! INVARIANTS: bit i set iff ready queue i is non-empty (maintained by RunQueueTable)

use crate::config::MAX_CLASSES;
use crate::types::ClassIndex;

const WORD_BITS: usize = u64::BITS as usize;
const WORDS: usize = MAX_CLASSES / WORD_BITS;

/// One bit per class; the lowest set bit is the most urgent non-empty class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassPresenceBitmap {
    words: [u64; WORDS],
}

impl ClassPresenceBitmap {
    pub const fn new() -> Self {
        Self { words: [0; WORDS] }
    }

    #[inline]
    const fn split(class: ClassIndex) -> (usize, u64) {
        let idx = class.as_index();
        (idx / WORD_BITS, 1u64 << (idx % WORD_BITS))
    }

    #[inline]
    pub fn set(&mut self, class: ClassIndex) {
        let (word, mask) = Self::split(class);
        self.words[word] |= mask;
    }

    #[inline]
    pub fn clear(&mut self, class: ClassIndex) {
        let (word, mask) = Self::split(class);
        self.words[word] &= !mask;
    }

    #[inline]
    pub const fn get(&self, class: ClassIndex) -> bool {
        let (word, mask) = Self::split(class);
        self.words[word] & mask != 0
    }

    /// Most urgent non-empty class, or `None` when every queue is empty (idle).
    ///
    /// One `trailing_zeros` per word; the scan stops at the first non-zero word.
    #[inline]
    pub fn lowest_set_bit(&self) -> Option<ClassIndex> {
        self.words.iter().enumerate().find(|(_, w)| **w != 0).map(|(i, w)| {
            ClassIndex::from_raw((i * WORD_BITS + w.trailing_zeros() as usize) as u8)
        })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Number of non-empty classes.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }
}
