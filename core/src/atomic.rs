//! Cross-core synchronization built on the platform's hardware
//! test-and-clear spinlock cells.
//!
//! ARMv6-M has no `LDREX`/`STREX`, so `rtos_lib::IrqMutex` (IRQ masking
//! alone) only excludes same-core preemption — it does nothing against the
//! other core. Anything genuinely shared between cores goes through one of
//! the platform's `HW_SPINLOCK_COUNT` hardware cells instead: index
//! [`rtos_abi::BIG_LOCK_HW_INDEX`] is reserved for the scheduler's own big
//! lock (see `scheduler::SCHEDULER`); the rest stripe across addresses for
//! ad hoc cross-core atomic read-modify-write.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicU32, Ordering};

use rtos_abi::HW_SPINLOCK_COUNT;
use rtos_lib::cpu;

use crate::platform;

/// One hardware test-and-clear cell, masking local interrupts while held.
pub struct HwSpinlock {
    index: usize,
}

impl HwSpinlock {
    pub const fn new(index: usize) -> Self {
        Self { index }
    }

    /// Disable local interrupts and spin until the hardware cell is ours.
    /// Returns the PRIMASK token the matching `unlock` call must pass back.
    #[inline]
    pub fn lock(&self) -> u32 {
        let saved = cpu::save_flags_cli();
        while !platform::hw_lock().try_acquire(self.index) {
            cpu::nop();
        }
        saved
    }

    #[inline]
    pub fn unlock(&self, saved: u32) {
        platform::hw_lock().release(self.index);
        cpu::restore_flags(saved);
    }
}

/// A `Mutex`-like wrapper over a single [`HwSpinlock`], genuinely safe
/// against both same-core preemption and the other core.
pub struct HwMutex<T> {
    lock: HwSpinlock,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for HwMutex<T> {}
unsafe impl<T: Send> Sync for HwMutex<T> {}

pub struct HwMutexGuard<'a, T> {
    mutex: &'a HwMutex<T>,
    saved: u32,
}

impl<T> HwMutex<T> {
    pub const fn new(hw_index: usize, data: T) -> Self {
        Self {
            lock: HwSpinlock::new(hw_index),
            data: UnsafeCell::new(data),
        }
    }

    #[inline]
    pub fn lock(&self) -> HwMutexGuard<'_, T> {
        let saved = self.lock.lock();
        HwMutexGuard { mutex: self, saved }
    }
}

impl<'a, T> Deref for HwMutexGuard<'a, T> {
    type Target = T;
    #[inline]
    fn deref(&self) -> &T {
        unsafe { &*self.mutex.data.get() }
    }
}

impl<'a, T> DerefMut for HwMutexGuard<'a, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.mutex.data.get() }
    }
}

impl<'a, T> Drop for HwMutexGuard<'a, T> {
    #[inline]
    fn drop(&mut self) {
        self.mutex.lock.unlock(self.saved);
    }
}

/// Indices `1..HW_SPINLOCK_COUNT` stripe across arbitrary addresses for
/// generic cross-core atomic emulation; index 0 is reserved for the
/// scheduler's big lock.
const NUM_STRIPES: usize = HW_SPINLOCK_COUNT - 1;

fn stripe_for(addr: usize) -> &'static HwSpinlock {
    static STRIPES: [HwSpinlock; NUM_STRIPES] = {
        let mut arr = [const { HwSpinlock::new(0) }; NUM_STRIPES];
        let mut i = 0;
        while i < NUM_STRIPES {
            arr[i] = HwSpinlock::new(i + 1);
            i += 1;
        }
        arr
    };
    &STRIPES[(addr >> 2) % NUM_STRIPES]
}

/// Compare-and-swap emulated over the striped hardware locks.
pub fn compare_exchange_u32(word: &AtomicU32, expected: u32, new: u32) -> Result<u32, u32> {
    let stripe = stripe_for(word as *const _ as usize);
    let saved = stripe.lock();
    let current = word.load(Ordering::Relaxed);
    let result = if current == expected {
        word.store(new, Ordering::Relaxed);
        Ok(current)
    } else {
        Err(current)
    };
    stripe.unlock(saved);
    result
}
