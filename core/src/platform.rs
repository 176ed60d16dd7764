//! Registration point for the host runtime services `rtos-core` requires
//! (external interfaces §6): IRQ control, the cross-core FIFO, the hardware
//! spinlock cells, and the secondary-core boot protocol.
//!
//! `rtos-boot` implements the traits in `rtos_abi::sched_traits` against the
//! concrete hardware and registers a `&'static dyn Trait` here at boot,
//! before the scheduler or SMP bring-up runs.

use spin::Once;

use rtos_abi::sched_traits::{PlatformFifo, PlatformHwLock, PlatformIrq, PlatformSecondaryCoreBoot};

static IRQ: Once<&'static dyn PlatformIrq> = Once::new();
static FIFO: Once<&'static dyn PlatformFifo> = Once::new();
static HW_LOCK: Once<&'static dyn PlatformHwLock> = Once::new();
static SECONDARY_BOOT: Once<&'static dyn PlatformSecondaryCoreBoot> = Once::new();

pub fn register_irq(irq: &'static dyn PlatformIrq) {
    IRQ.call_once(|| irq);
}

pub fn register_fifo(fifo: &'static dyn PlatformFifo) {
    FIFO.call_once(|| fifo);
}

pub fn register_hw_lock(hw_lock: &'static dyn PlatformHwLock) {
    HW_LOCK.call_once(|| hw_lock);
}

pub fn register_secondary_boot(boot: &'static dyn PlatformSecondaryCoreBoot) {
    SECONDARY_BOOT.call_once(|| boot);
}

#[inline]
pub fn irq() -> &'static dyn PlatformIrq {
    *IRQ.get().expect("platform_irq not registered")
}

#[inline]
pub fn fifo() -> &'static dyn PlatformFifo {
    *FIFO.get().expect("platform_fifo not registered")
}

#[inline]
pub fn hw_lock() -> &'static dyn PlatformHwLock {
    *HW_LOCK.get().expect("platform_hw_lock not registered")
}

#[inline]
pub fn secondary_boot() -> &'static dyn PlatformSecondaryCoreBoot {
    *SECONDARY_BOOT
        .get()
        .expect("platform_secondary_boot not registered")
}

#[inline]
pub fn is_irq_initialized() -> bool {
    IRQ.get().is_some()
}

#[inline]
pub fn is_fifo_initialized() -> bool {
    FIFO.get().is_some()
}
