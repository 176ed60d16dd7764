//! Event flags: a 32-bit word of set bits, waited on with an ANY/ALL mask.
//!
//! CMSIS mapping: `osEventFlagsNew`/`osEventFlagsSet`/`osEventFlagsWait`/
//! `osEventFlagsClear`/`osEventFlagsGet`. `rtos_core::futex` only knows
//! exact-value waits, not mask predicates, so `wait` re-checks its own
//! predicate in a loop after every wake rather than being targeted
//! directly — `set` wakes every waiter unconditionally (a plain
//! futex-backed condvar), which is the same adaptation `Mutex`'s retry
//! loop makes for the same underlying reason (see that module's doc
//! comment).

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use rtos_abi::futex::FutexFlags;
use rtos_abi::{KernelError, KernelResult};
use rtos_core::Futex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitPolicy {
    Any,
    All,
}

pub struct EventFlags {
    word: &'static AtomicU32,
    futex: Futex,
    registered: AtomicBool,
}

unsafe impl Send for EventFlags {}
unsafe impl Sync for EventFlags {}

impl EventFlags {
    pub const fn new(word: &'static AtomicU32) -> Self {
        Self {
            word,
            futex: Futex::new(word, FutexFlags::CONTENTION_TRACKING),
            registered: AtomicBool::new(false),
        }
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

    /// OR `mask` into the flags, waking every waiter so each can re-check
    /// its own predicate. Returns the flags word after the set.
    pub fn set(&mut self, mask: u32) -> KernelResult<u32> {
        self.ensure_registered();
        loop {
            let observed = self.word.load(Ordering::Acquire);
            let next = observed | mask;
            if next == observed {
                return Ok(observed);
            }
            if rtos_core::atomic::compare_exchange_u32(self.word, observed, next).is_ok() {
                break;
            }
        }
        rtos_core::futex::wake(&mut self.futex, true)?;
        Ok(self.word.load(Ordering::Relaxed))
    }

    /// AND `!mask` into the flags. Returns the flags word before clearing.
    pub fn clear(&mut self, mask: u32) -> u32 {
        loop {
            let observed = self.word.load(Ordering::Acquire);
            let next = observed & !mask;
            if next == observed || rtos_core::atomic::compare_exchange_u32(self.word, observed, next).is_ok() {
                return observed;
            }
        }
    }

    pub fn get(&self) -> u32 {
        self.word.load(Ordering::Relaxed)
    }

    /// Block up to `timeout` ticks until `mask` is satisfied per `policy`.
    /// On success, returns the matched bits; if `clear_on_wait`, those bits
    /// are consumed (cleared) first.
    pub fn wait(
        &mut self,
        mask: u32,
        policy: WaitPolicy,
        clear_on_wait: bool,
        timeout: u32,
    ) -> KernelResult<u32> {
        self.ensure_registered();
        loop {
            let observed = self.word.load(Ordering::Acquire);
            let matched = observed & mask;
            let satisfied = match policy {
                WaitPolicy::Any => matched != 0,
                WaitPolicy::All => mask != 0 && matched == mask,
            };
            if satisfied {
                if clear_on_wait && rtos_core::atomic::compare_exchange_u32(
                    self.word,
                    observed,
                    observed & !matched,
                )
                .is_err()
                {
                    continue;
                }
                return Ok(matched);
            }
            if timeout == 0 {
                return Err(KernelError::Busy);
            }
            match rtos_core::futex::wait(&mut self.futex, observed, timeout) {
                Ok(()) | Err(KernelError::Busy) => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

impl Drop for EventFlags {
    fn drop(&mut self) {
        rtos_core::futex::unregister(&mut self.futex as *mut Futex);
    }
}
