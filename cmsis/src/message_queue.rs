//! Priority-ordered message queue over a fixed slot array.
//!
//! CMSIS mapping: `osMessageQueueNew`/`osMessageQueuePut`/
//! `osMessageQueueGet`/`osMessageQueueGetCount`/`osMessageQueueGetSpace`.
//! Readers block on a "data available" semaphore, writers on a
//! "space available" one, matching the behavior description; rather than
//! drawing messages from a separate [`crate::memory_pool::MemoryPool`],
//! slots are inlined in a fixed `[u8; MSG_BYTES]` array per queue (`N`
//! capped at 32, one occupancy bit per slot) — simpler for a fixed,
//! compile-time-sized queue and avoids a second allocator layer for what's
//! already a fixed-capacity structure.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use rtos_abi::{KernelError, KernelResult};

use crate::semaphore::Semaphore;

pub struct MessageQueue<const N: usize, const MSG_BYTES: usize> {
    occupied: AtomicU32,
    priorities: [AtomicU8; N],
    seqs: [AtomicU32; N],
    next_seq: AtomicU32,
    slots: [UnsafeCell<[u8; MSG_BYTES]>; N],
    space: Semaphore,
    data: Semaphore,
}

// SAFETY: every slot is claimed/released exactly once via an atomic
// compare-exchange on `occupied`; the semaphores bound concurrent
// claimants to the number of set/clear bits actually available.
unsafe impl<const N: usize, const MSG_BYTES: usize> Send for MessageQueue<N, MSG_BYTES> {}
unsafe impl<const N: usize, const MSG_BYTES: usize> Sync for MessageQueue<N, MSG_BYTES> {}

impl<const N: usize, const MSG_BYTES: usize> MessageQueue<N, MSG_BYTES> {
    pub fn new(space_word: &'static AtomicU32, data_word: &'static AtomicU32) -> Self {
        const { assert!(N > 0 && N <= 32, "MessageQueue supports 1..=32 slots") };
        space_word.store(N as u32, Ordering::Relaxed);
        data_word.store(0, Ordering::Relaxed);
        Self {
            occupied: AtomicU32::new(0),
            priorities: [const { AtomicU8::new(0) }; N],
            seqs: [const { AtomicU32::new(0) }; N],
            next_seq: AtomicU32::new(0),
            slots: [const { UnsafeCell::new([0u8; MSG_BYTES]) }; N],
            space: Semaphore::new(space_word, N as u32),
            data: Semaphore::new(data_word, N as u32),
        }
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn count(&self) -> u32 {
        self.occupied.load(Ordering::Relaxed).count_ones()
    }

    /// Enqueue `msg` at `priority`, blocking up to `timeout` ticks if the
    /// queue is momentarily full (0 = try-put).
    pub fn put(&mut self, msg: &[u8; MSG_BYTES], priority: u8, timeout: u32) -> KernelResult<()> {
        self.space.acquire(timeout)?;
        loop {
            let observed = self.occupied.load(Ordering::Acquire);
            let free_bit = (!observed).trailing_zeros() as usize;
            if free_bit >= N {
                return Err(KernelError::Corrupted);
            }
            let mask = 1u32 << free_bit;
            if rtos_core::atomic::compare_exchange_u32(&self.occupied, observed, observed | mask)
                .is_ok()
            {
                unsafe { (*self.slots[free_bit].get()).copy_from_slice(msg) };
                self.priorities[free_bit].store(priority, Ordering::Relaxed);
                self.seqs[free_bit].store(self.next_seq.fetch_add(1, Ordering::Relaxed), Ordering::Relaxed);
                break;
            }
        }
        self.data.release()?;
        Ok(())
    }

    /// Dequeue the highest-priority message (FIFO within a priority),
    /// blocking up to `timeout` ticks if the queue is momentarily empty.
    /// Returns that message's priority.
    pub fn get(&mut self, out: &mut [u8; MSG_BYTES], timeout: u32) -> KernelResult<u8> {
        self.data.acquire(timeout)?;
        loop {
            let observed = self.occupied.load(Ordering::Acquire);
            if observed == 0 {
                return Err(KernelError::Corrupted);
            }
            let mut best: Option<(usize, u8, u32)> = None;
            for i in 0..N {
                if observed & (1 << i) == 0 {
                    continue;
                }
                let priority = self.priorities[i].load(Ordering::Relaxed);
                let seq = self.seqs[i].load(Ordering::Relaxed);
                let better = match best {
                    None => true,
                    Some((_, bp, bs)) => priority > bp || (priority == bp && seq < bs),
                };
                if better {
                    best = Some((i, priority, seq));
                }
            }
            let (idx, priority, _) = best.expect("observed != 0 implies at least one bit set");
            let mask = 1u32 << idx;
            if rtos_core::atomic::compare_exchange_u32(&self.occupied, observed, observed & !mask)
                .is_ok()
            {
                unsafe { out.copy_from_slice(&*self.slots[idx].get()) };
                self.space.release()?;
                return Ok(priority);
            }
        }
    }
}
