//! Software timers, driven by a dedicated low-priority service task rather
//! than directly riding the scheduler's own per-task timer list (that list
//! only knows how to wake a sleeping task, not invoke an arbitrary callback).
//!
//! CMSIS mapping: `osTimerNew`/`osTimerStart`/`osTimerStop`/`osTimerDelete`/
//! `osTimerIsRunning`. [`spawn_timer_service`] should be called once during
//! startup (grounded the same way `rtos-boot`'s `init.rs` spawns the idle
//! task: one fixed-priority system task, never torn down).

use core::cell::UnsafeCell;
use core::ffi::c_void;
use core::ptr;
use core::sync::atomic::{AtomicBool, AtomicPtr, AtomicU32, Ordering};

use rtos_abi::task::CoreAffinity;
use rtos_abi::{KernelError, KernelResult};

const MAX_TIMERS: usize = 16;

pub type TimerCallback = extern "C" fn(*mut c_void);

struct Slot {
    in_use: AtomicBool,
    armed: AtomicBool,
    periodic: AtomicBool,
    period_ticks: AtomicU32,
    remaining: AtomicU32,
    callback: UnsafeCell<Option<TimerCallback>>,
    arg: AtomicPtr<c_void>,
}

// SAFETY: `callback` is only written while `in_use` is being claimed (a
// single CAS winner) and only read from the one timer-service task.
unsafe impl Sync for Slot {}

static SLOTS: [Slot; MAX_TIMERS] = [const {
    Slot {
        in_use: AtomicBool::new(false),
        armed: AtomicBool::new(false),
        periodic: AtomicBool::new(false),
        period_ticks: AtomicU32::new(0),
        remaining: AtomicU32::new(0),
        callback: UnsafeCell::new(None),
        arg: AtomicPtr::new(ptr::null_mut()),
    }
}; MAX_TIMERS];

pub struct Timer {
    idx: usize,
}

impl Timer {
    /// Reserve a timer slot. `NoSpace` if all [`MAX_TIMERS`] are taken.
    pub fn new(callback: TimerCallback, arg: *mut c_void, periodic: bool) -> KernelResult<Self> {
        for (i, slot) in SLOTS.iter().enumerate() {
            if slot
                .in_use
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                unsafe { *slot.callback.get() = Some(callback) };
                slot.arg.store(arg, Ordering::Relaxed);
                slot.periodic.store(periodic, Ordering::Relaxed);
                slot.armed.store(false, Ordering::Relaxed);
                return Ok(Self { idx: i });
            }
        }
        Err(KernelError::NoSpace)
    }

    /// Arm the timer to fire `ticks` from now (and every `ticks` after, if
    /// periodic).
    pub fn start(&mut self, ticks: u32) -> KernelResult<()> {
        if ticks == 0 {
            return Err(KernelError::InvalidArgument);
        }
        let slot = &SLOTS[self.idx];
        slot.period_ticks.store(ticks, Ordering::Relaxed);
        slot.remaining.store(ticks, Ordering::Relaxed);
        slot.armed.store(true, Ordering::Release);
        Ok(())
    }

    pub fn stop(&mut self) {
        SLOTS[self.idx].armed.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        SLOTS[self.idx].armed.load(Ordering::Relaxed)
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let slot = &SLOTS[self.idx];
        slot.armed.store(false, Ordering::Release);
        unsafe { *slot.callback.get() = None };
        slot.in_use.store(false, Ordering::Release);
    }
}

extern "C" fn service_task_entry(_arg: *mut c_void) {
    loop {
        let _ = rtos_core::scheduler::sleep(1);
        for slot in SLOTS.iter() {
            if !slot.in_use.load(Ordering::Relaxed) || !slot.armed.load(Ordering::Relaxed) {
                continue;
            }
            if slot.remaining.fetch_sub(1, Ordering::AcqRel) != 1 {
                continue;
            }
            let callback = unsafe { *slot.callback.get() };
            let arg = slot.arg.load(Ordering::Relaxed);
            if let Some(callback) = callback {
                callback(arg);
            }
            if slot.periodic.load(Ordering::Relaxed) {
                let period = slot.period_ticks.load(Ordering::Relaxed);
                slot.remaining.store(period, Ordering::Relaxed);
            } else {
                slot.armed.store(false, Ordering::Relaxed);
            }
        }
    }
}

/// Spawn the one dedicated timer-service task. Call once, during startup.
pub fn spawn_timer_service(stack: &'static mut [u32], priority: u8) -> KernelResult<()> {
    rtos_core::task::task_create(
        "cmsis-timer-svc",
        service_task_entry,
        ptr::null_mut(),
        stack,
        priority,
        rtos_abi::task::TaskFlags::SYSTEM,
        CoreAffinity::Any,
    )?;
    Ok(())
}
