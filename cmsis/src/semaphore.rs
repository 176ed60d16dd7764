//! Counting (and, via `max_count = 1`, binary) semaphores over
//! [`rtos_core::Futex`].
//!
//! CMSIS mapping: `osSemaphoreNew`/`osSemaphoreAcquire`/
//! `osSemaphoreRelease`/`osSemaphoreGetCount`. The count lives in the
//! caller-supplied word; `acquire` blocks while it's zero, `release`
//! increments (capped at `max_count`) and wakes one waiter.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use rtos_abi::futex::FutexFlags;
use rtos_abi::{KernelError, KernelResult};
use rtos_core::Futex;

pub struct Semaphore {
    word: &'static AtomicU32,
    futex: Futex,
    max_count: u32,
    registered: AtomicBool,
}

unsafe impl Send for Semaphore {}
unsafe impl Sync for Semaphore {}

impl Semaphore {
    /// `word` should already hold the desired initial count; `max_count`
    /// bounds `release`.
    pub const fn new(word: &'static AtomicU32, max_count: u32) -> Self {
        Self {
            word,
            futex: Futex::new(word, FutexFlags::CONTENTION_TRACKING),
            max_count,
            registered: AtomicBool::new(false),
        }
    }

    pub const fn new_binary(word: &'static AtomicU32) -> Self {
        Self::new(word, 1)
    }

    fn ensure_registered(&mut self) {
        if self
            .registered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            rtos_core::futex::register(&mut self.futex as *mut Futex);
        }
    }

    /// Block up to `timeout` ticks for a token (0 = try-acquire).
    pub fn acquire(&mut self, timeout: u32) -> KernelResult<()> {
        self.ensure_registered();
        loop {
            let observed = self.word.load(Ordering::Acquire);
            if observed > 0 {
                if rtos_core::atomic::compare_exchange_u32(self.word, observed, observed - 1)
                    .is_ok()
                {
                    return Ok(());
                }
                continue;
            }
            if timeout == 0 {
                return Err(KernelError::Busy);
            }
            match rtos_core::futex::wait(&mut self.futex, 0, timeout) {
                Ok(()) | Err(KernelError::Busy) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Return a token, waking one waiter. `NoSpace` if already at
    /// `max_count`.
    pub fn release(&mut self) -> KernelResult<usize> {
        self.ensure_registered();
        loop {
            let observed = self.word.load(Ordering::Acquire);
            if observed >= self.max_count {
                return Err(KernelError::NoSpace);
            }
            if rtos_core::atomic::compare_exchange_u32(self.word, observed, observed + 1).is_ok()
            {
                break;
            }
        }
        rtos_core::futex::wake(&mut self.futex, false)
    }

    pub fn count(&self) -> u32 {
        self.word.load(Ordering::Relaxed)
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        rtos_core::futex::unregister(&mut self.futex as *mut Futex);
    }
}
