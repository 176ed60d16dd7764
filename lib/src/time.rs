//! Kernel tick counter.
//!
//! `rtos-boot`'s SysTick handler calls [`advance_tick`] once per tick;
//! everything else (timeout math, test-suite elapsed time) reads [`ticks`].
//! At `TICK_HZ = 1000` a tick and a millisecond are the same thing, which is
//! why nothing downstream needs a cycles-per-ms estimate.

use core::sync::atomic::{AtomicU64, Ordering};

static TICKS: AtomicU64 = AtomicU64::new(0);

#[inline]
pub fn ticks() -> u64 {
    TICKS.load(Ordering::Relaxed)
}

#[inline]
pub fn advance_tick() {
    TICKS.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub fn ticks_to_ms(ticks: u64) -> u64 {
    ticks * 1000 / rtos_abi::TICK_HZ as u64
}
