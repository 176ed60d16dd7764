//! One-time initialization gate, the `osKernelInitialize`-adjacent
//! "run this exactly once across both cores" primitive the adapter layer
//! needs for lazily-registered objects (see [`crate::mutex::Mutex`]'s own
//! `ensure_registered`, which is this same pattern inlined per type).
//!
//! Three states rather than two: a flag that only distinguished
//! uninitialized/initialized would let two cores both observe
//! "uninitialized" and both run the initializer. The middle state lets a
//! second caller spin (yielding, not busy-looping past the scheduler) until
//! the first one finishes.

use core::sync::atomic::{AtomicU32, Ordering};

const UNINIT: u32 = 0;
const RUNNING: u32 = 1;
const DONE: u32 = 2;

pub struct OnceFlag {
    state: AtomicU32,
}

impl OnceFlag {
    pub const fn new() -> Self {
        Self {
            state: AtomicU32::new(UNINIT),
        }
    }

    /// Run `f` exactly once across all callers, on either core. Callers
    /// that lose the race block (cooperatively) until the winner finishes.
    pub fn call_once(&self, f: impl FnOnce()) {
        loop {
            match rtos_core::atomic::compare_exchange_u32(&self.state, UNINIT, RUNNING) {
                Ok(_) => {
                    f();
                    self.state.store(DONE, Ordering::Release);
                    return;
                }
                Err(DONE) => return,
                Err(_) => rtos_core::scheduler::r#yield(),
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state.load(Ordering::Acquire) == DONE
    }
}

impl Default for OnceFlag {
    fn default() -> Self {
        Self::new()
    }
}
