// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Interrupt-masking spin lock for run-queue critical sections
//! OWNERS: @kernel-sync-team
//! PUBLIC API: Ipl, InterruptMask, SoftIpl, IplLock::{new, lock, try_lock}, IplGuard
//! DEPENDS_ON: spin::Mutex
//! INVARIANTS: the caller's IPL is raised before the lock is taken and restored only after it
//!             is released; raise never lowers the current level
//!
//! The run-queue table is touched from thread context and from interrupt
//! handlers (timer preemption, I/O completion). Holding a plain spin lock while
//! an interrupt on the same CPU spins on it would deadlock, so every critical
//! section first masks interrupt sources up to the configured level.
//!
//! The lock only knows its level. Each caller passes the mask of the execution
//! context it runs on (its own CPU); the saved level lives in the guard.

use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicU8, Ordering};

/// Interrupt priority level. Raising to a level masks every source at or below it.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Ipl {
    None = 0,
    SoftClock = 1,
    Bio = 2,
    Net = 3,
    Tty = 4,
    Vm = 5,
    Clock = 6,
    Sched = 7,
    High = 8,
}

impl Ipl {
    /// Unknown encodings saturate to `High`.
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Ipl::None,
            1 => Ipl::SoftClock,
            2 => Ipl::Bio,
            3 => Ipl::Net,
            4 => Ipl::Tty,
            5 => Ipl::Vm,
            6 => Ipl::Clock,
            7 => Ipl::Sched,
            _ => Ipl::High,
        }
    }

    #[inline]
    pub const fn as_raw(self) -> u8 {
        self as u8
    }
}

/// Interrupt masking of one execution context (one CPU).
///
/// A kernel port implements this over the interrupt controller or the CPU's
/// interrupt-enable bits; [`SoftIpl`] is the portable software model.
pub trait InterruptMask {
    /// Raises the current level to at least `level` and returns the previous one.
    fn raise(&self, level: Ipl) -> Ipl;
    /// Returns to a level obtained from [`InterruptMask::raise`].
    fn restore(&self, previous: Ipl);
    fn current(&self) -> Ipl;
}

/// Software IPL register of one execution context.
#[derive(Debug, Default)]
pub struct SoftIpl {
    level: AtomicU8,
}

impl SoftIpl {
    pub const fn new() -> Self {
        Self { level: AtomicU8::new(Ipl::None as u8) }
    }
}

impl InterruptMask for SoftIpl {
    fn raise(&self, level: Ipl) -> Ipl {
        Ipl::from_raw(self.level.fetch_max(level.as_raw(), Ordering::AcqRel))
    }

    fn restore(&self, previous: Ipl) {
        self.level.store(previous.as_raw(), Ordering::Release);
    }

    fn current(&self) -> Ipl {
        Ipl::from_raw(self.level.load(Ordering::Acquire))
    }
}

/// Spin lock whose critical sections run with the caller's interrupts masked up to `level`.
pub struct IplLock<T> {
    level: Ipl,
    inner: spin::Mutex<T>,
}

impl<T> IplLock<T> {
    pub const fn new(level: Ipl, value: T) -> Self {
        Self { level, inner: spin::Mutex::new(value) }
    }

    #[inline]
    pub fn level(&self) -> Ipl {
        self.level
    }

    /// Raises `cpu` to the lock level, then spins for the lock.
    ///
    /// `cpu` must be the mask of the context making the call.
    pub fn lock<'a, M: InterruptMask>(&'a self, cpu: &'a M) -> IplGuard<'a, T, M> {
        let restore = IplRestore { mask: cpu, saved: cpu.raise(self.level) };
        let guard = self.inner.lock();
        IplGuard { guard, _restore: restore }
    }

    /// Single attempt; `cpu` is back at its previous level if the lock is busy.
    pub fn try_lock<'a, M: InterruptMask>(&'a self, cpu: &'a M) -> Option<IplGuard<'a, T, M>> {
        let restore = IplRestore { mask: cpu, saved: cpu.raise(self.level) };
        let guard = self.inner.try_lock()?;
        Some(IplGuard { guard, _restore: restore })
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

struct IplRestore<'a, M: InterruptMask> {
    mask: &'a M,
    saved: Ipl,
}

impl<M: InterruptMask> Drop for IplRestore<'_, M> {
    fn drop(&mut self) {
        self.mask.restore(self.saved);
    }
}

/// Access to the protected value. Dropping releases the lock, then restores IPL.
pub struct IplGuard<'a, T, M: InterruptMask> {
    // Field order is the release order.
    guard: spin::MutexGuard<'a, T>,
    _restore: IplRestore<'a, M>,
}

impl<T, M: InterruptMask> Deref for IplGuard<'_, T, M> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T, M: InterruptMask> DerefMut for IplGuard<'_, T, M> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}
