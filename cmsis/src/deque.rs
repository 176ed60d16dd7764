//! Double-ended queue over a power-of-two ring buffer.
//!
//! Not part of the CMSIS-RTOS v2 surface itself, but built the same way
//! the rest of this crate builds fixed-capacity containers: a
//! caller-sized backing array plus a pair of event flags (`not_empty`,
//! `not_full`) blocking pushers and poppers the way `Semaphore` blocks
//! on a count. The ring's head/length bookkeeping is small and mutated
//! from both ends, so unlike the single-word CAS loops elsewhere in this
//! crate it's simplest to just hold it behind one of the platform's
//! hardware spinlock cells (`rtos_core::atomic::HwMutex`) rather than
//! split it into independently-CASable fields.

use core::sync::atomic::{AtomicU32, Ordering};

use rtos_abi::KernelResult;
use rtos_core::atomic::HwMutex;

use crate::event_flags::{EventFlags, WaitPolicy};

const READY: u32 = 0x1;

struct Ring<const N: usize, const ITEM_BYTES: usize> {
    head: usize,
    len: usize,
    slots: [[u8; ITEM_BYTES]; N],
}

pub struct Deque<const N: usize, const ITEM_BYTES: usize> {
    state: HwMutex<Ring<N, ITEM_BYTES>>,
    not_empty: EventFlags,
    not_full: EventFlags,
}

impl<const N: usize, const ITEM_BYTES: usize> Deque<N, ITEM_BYTES> {
    /// `hw_index` selects this deque's dedicated hardware spinlock cell
    /// (never `rtos_abi::config::BIG_LOCK_HW_INDEX`). `not_empty_word`/
    /// `not_full_word` back the two gating event flags.
    pub fn new(
        hw_index: usize,
        not_empty_word: &'static AtomicU32,
        not_full_word: &'static AtomicU32,
    ) -> Self {
        const { assert!(N.is_power_of_two(), "Deque capacity must be a power of two") };
        not_empty_word.store(0, Ordering::Relaxed);
        not_full_word.store(READY, Ordering::Relaxed);
        Self {
            state: HwMutex::new(
                hw_index,
                Ring {
                    head: 0,
                    len: 0,
                    slots: [[0u8; ITEM_BYTES]; N],
                },
            ),
            not_empty: EventFlags::new(not_empty_word),
            not_full: EventFlags::new(not_full_word),
        }
    }

    pub fn len(&self) -> usize {
        self.state.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push_back(&mut self, item: &[u8; ITEM_BYTES], timeout: u32) -> KernelResult<()> {
        loop {
            self.not_full.wait(READY, WaitPolicy::Any, false, timeout)?;
            let mut guard = self.state.lock();
            if guard.len == N {
                continue;
            }
            let idx = (guard.head + guard.len) & (N - 1);
            guard.slots[idx] = *item;
            guard.len += 1;
            let (became_full, became_nonempty) = (guard.len == N, guard.len == 1);
            drop(guard);
            if became_full {
                self.not_full.clear(READY);
            }
            if became_nonempty {
                self.not_empty.set(READY)?;
            }
            return Ok(());
        }
    }

    pub fn push_front(&mut self, item: &[u8; ITEM_BYTES], timeout: u32) -> KernelResult<()> {
        loop {
            self.not_full.wait(READY, WaitPolicy::Any, false, timeout)?;
            let mut guard = self.state.lock();
            if guard.len == N {
                continue;
            }
            guard.head = (guard.head + N - 1) & (N - 1);
            guard.slots[guard.head] = *item;
            guard.len += 1;
            let (became_full, became_nonempty) = (guard.len == N, guard.len == 1);
            drop(guard);
            if became_full {
                self.not_full.clear(READY);
            }
            if became_nonempty {
                self.not_empty.set(READY)?;
            }
            return Ok(());
        }
    }

    pub fn pop_front(&mut self, out: &mut [u8; ITEM_BYTES], timeout: u32) -> KernelResult<()> {
        loop {
            self.not_empty.wait(READY, WaitPolicy::Any, false, timeout)?;
            let mut guard = self.state.lock();
            if guard.len == 0 {
                continue;
            }
            *out = guard.slots[guard.head];
            guard.head = (guard.head + 1) & (N - 1);
            guard.len -= 1;
            let (became_empty, became_avail) = (guard.len == 0, guard.len == N - 1);
            drop(guard);
            if became_empty {
                self.not_empty.clear(READY);
            }
            if became_avail {
                self.not_full.set(READY)?;
            }
            return Ok(());
        }
    }

    pub fn pop_back(&mut self, out: &mut [u8; ITEM_BYTES], timeout: u32) -> KernelResult<()> {
        loop {
            self.not_empty.wait(READY, WaitPolicy::Any, false, timeout)?;
            let mut guard = self.state.lock();
            if guard.len == 0 {
                continue;
            }
            let idx = (guard.head + guard.len - 1) & (N - 1);
            *out = guard.slots[idx];
            guard.len -= 1;
            let (became_empty, became_avail) = (guard.len == 0, guard.len == N - 1);
            drop(guard);
            if became_empty {
                self.not_empty.clear(READY);
            }
            if became_avail {
                self.not_full.set(READY)?;
            }
            return Ok(());
        }
    }
}
