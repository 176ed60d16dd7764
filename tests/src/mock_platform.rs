//! A single-core, no-hardware stand-in for the four `rtos_abi::sched_traits`
//! services, so `rtos-core`'s scheduler and futex logic can be exercised
//! without `rtos-boot` or real silicon. This is what `FixtureKind::Scheduler`/
//! `Futex`/`Smp` register before their suites run.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use rtos_abi::sched_traits::{PlatformFifo, PlatformHwLock, PlatformIrq, PlatformSecondaryCoreBoot};
use rtos_abi::HW_SPINLOCK_COUNT;

pub struct MockIrq {
    pending_switch: AtomicBool,
}

pub static MOCK_IRQ: MockIrq = MockIrq {
    pending_switch: AtomicBool::new(false),
};

impl MockIrq {
    /// Tests poll this instead of actually waiting for an interrupt.
    pub fn take_pending_switch(&self) -> bool {
        self.pending_switch.swap(false, Ordering::SeqCst)
    }
}

impl PlatformIrq for MockIrq {
    fn pend_context_switch_local(&self) {
        self.pending_switch.store(true, Ordering::SeqCst);
    }
    fn set_irq_enabled_local(&self, _irq: i32, _enabled: bool) {}
    fn set_irq_pending_local(&self, _irq: i32, _pending: bool) {}
    fn set_irq_priority_local(&self, _irq: i32, _priority: u8) {}
    fn current_core(&self) -> u8 {
        0
    }
    fn wait_for_event(&self) {}
    fn signal_event(&self) {}
}

const FIFO_CAPACITY: usize = 16;

/// A single-direction loopback queue: everything sent is immediately
/// available to receive. Good enough to drive `smp::handle_incoming`
/// without a second core.
pub struct LoopbackFifo {
    slots: [AtomicU32; FIFO_CAPACITY],
    head: AtomicU32,
    tail: AtomicU32,
}

pub static MOCK_FIFO: LoopbackFifo = LoopbackFifo {
    slots: [const { AtomicU32::new(0) }; FIFO_CAPACITY],
    head: AtomicU32::new(0),
    tail: AtomicU32::new(0),
};

impl PlatformFifo for LoopbackFifo {
    fn has_send_space(&self) -> bool {
        let next = (self.tail.load(Ordering::Relaxed) + 1) % FIFO_CAPACITY as u32;
        next != self.head.load(Ordering::Relaxed)
    }
    fn has_data_available(&self) -> bool {
        self.head.load(Ordering::Relaxed) != self.tail.load(Ordering::Relaxed)
    }
    fn send(&self, packet: u32) {
        let tail = self.tail.load(Ordering::Relaxed);
        self.slots[tail as usize].store(packet, Ordering::Relaxed);
        self.tail
            .store((tail + 1) % FIFO_CAPACITY as u32, Ordering::Relaxed);
    }
    fn recv(&self) -> u32 {
        let head = self.head.load(Ordering::Relaxed);
        let value = self.slots[head as usize].load(Ordering::Relaxed);
        self.head
            .store((head + 1) % FIFO_CAPACITY as u32, Ordering::Relaxed);
        value
    }
    fn clear_errors(&self) {}
}

pub struct MockHwLock {
    held: [AtomicBool; HW_SPINLOCK_COUNT],
}

pub static MOCK_HW_LOCK: MockHwLock = MockHwLock {
    held: [const { AtomicBool::new(false) }; HW_SPINLOCK_COUNT],
};

impl PlatformHwLock for MockHwLock {
    fn try_acquire(&self, index: usize) -> bool {
        self.held[index]
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }
    fn release(&self, index: usize) {
        self.held[index].store(false, Ordering::Release);
    }
}

pub struct MockSecondaryBoot;

pub static MOCK_SECONDARY_BOOT: MockSecondaryBoot = MockSecondaryBoot;

impl PlatformSecondaryCoreBoot for MockSecondaryBoot {
    fn reset_secondary_core(&self) {}
    fn bootstrap_secondary_core(&self, _vt: u32, _sp: u32, _entry: u32) -> bool {
        // No real core 1 to hand off to in tests; report success so
        // `boot_secondary_core`'s retry loop doesn't spin needlessly.
        true
    }
}

/// Idempotent: only the first call's registration sticks, matching
/// `rtos_core::platform`'s `Once`-backed registration.
pub fn install() {
    rtos_core::platform::register_irq(&MOCK_IRQ);
    rtos_core::platform::register_fifo(&MOCK_FIFO);
    rtos_core::platform::register_hw_lock(&MOCK_HW_LOCK);
    rtos_core::platform::register_secondary_boot(&MOCK_SECONDARY_BOOT);
}
