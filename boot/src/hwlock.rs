//! [`PlatformHwLock`] against the RP2040 SIO hardware spinlock bank. Index
//! 0 (`rtos_abi::BIG_LOCK_HW_INDEX`) is reserved for the scheduler's shared
//! state; the rest are free for `rtos-cmsis` or application use.

use rtos_abi::sched_traits::PlatformHwLock;

use crate::sio;

pub struct SioHwLock;

pub static HW_LOCK: SioHwLock = SioHwLock;

impl PlatformHwLock for SioHwLock {
    fn try_acquire(&self, index: usize) -> bool {
        sio::spinlock_try_acquire(index)
    }

    fn release(&self, index: usize) {
        sio::spinlock_release(index);
    }
}
