//! Kernel-wide state machine and tick accounting.
//!
//! CMSIS mapping: `osKernelInitialize`/`osKernelStart`/`osKernelGetState`/
//! `osKernelGetTickCount`/`osKernelGetTickFreq`/`osKernelLock`/
//! `osKernelUnlock`, grounded on `cmsis-rtos2-kernel.c`'s own state
//! machine (`osKernelInactive` -> `osKernelReady` -> `osKernelRunning` ->
//! `osKernelLocked`).
//!
//! `rtos_core` has no kernel-wide "lock scheduling" primitive exposed
//! (its own `HwMutex`/`IrqMutex` lock specific data, not the dispatcher
//! itself), so unlike the original, [`lock`]/[`unlock`] here only track
//! the state transition — they don't actually suspend preemption. A real
//! port would need `rtos_core::scheduler` to grow that hook.

use core::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use rtos_abi::config::TICK_HZ;
use rtos_abi::{KernelError, KernelResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum KernelState {
    Inactive = 0,
    Ready = 1,
    Running = 2,
    Locked = 3,
    Suspended = 4,
}

impl KernelState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => KernelState::Ready,
            2 => KernelState::Running,
            3 => KernelState::Locked,
            4 => KernelState::Suspended,
            _ => KernelState::Inactive,
        }
    }
}

static STATE: AtomicU8 = AtomicU8::new(KernelState::Inactive as u8);
static LOCKED: AtomicBool = AtomicBool::new(false);
static TICKS: AtomicU64 = AtomicU64::new(0);

fn state() -> KernelState {
    KernelState::from_u8(STATE.load(Ordering::Acquire))
}

/// Mark the kernel ready to start. Idempotent only once: calling this
/// twice without an intervening reset is an error, matching the
/// original's "already initialized" check.
pub fn initialize() -> KernelResult<()> {
    if state() != KernelState::Inactive {
        return Err(KernelError::InvalidArgument);
    }
    STATE.store(KernelState::Ready as u8, Ordering::Release);
    Ok(())
}

/// Transition to running. The caller is expected to have already handed
/// control to the scheduler (`rtos_core::scheduler` drives dispatch from
/// the architecture's own main loop / first context switch); this just
/// records that the transition happened.
pub fn start() -> KernelResult<()> {
    if state() != KernelState::Ready {
        return Err(KernelError::InvalidArgument);
    }
    STATE.store(KernelState::Running as u8, Ordering::Release);
    Ok(())
}

pub fn get_state() -> KernelState {
    state()
}

/// Suppress preemption bookkeeping-wise. Returns the previous lock state
/// (0 or 1), matching `osKernelLock`'s return convention.
pub fn lock() -> KernelResult<i32> {
    match state() {
        KernelState::Running | KernelState::Locked => {}
        _ => return Err(KernelError::InvalidArgument),
    }
    let prev = LOCKED.swap(true, Ordering::AcqRel);
    STATE.store(KernelState::Locked as u8, Ordering::Release);
    Ok(prev as i32)
}

pub fn unlock() -> KernelResult<i32> {
    match state() {
        KernelState::Running | KernelState::Locked => {}
        _ => return Err(KernelError::InvalidArgument),
    }
    let prev = LOCKED.swap(false, Ordering::AcqRel);
    STATE.store(KernelState::Running as u8, Ordering::Release);
    Ok(prev as i32)
}

pub fn is_locked() -> bool {
    LOCKED.load(Ordering::Relaxed)
}

/// Advance the tick counter. Call once per architectural tick, from the
/// same SysTick handler that calls `rtos_core::scheduler::on_tick` —
/// `rtos_core`'s own tick counter is private to the scheduler module, so
/// this crate keeps a parallel one for `osKernelGetTickCount`.
pub fn on_tick() {
    TICKS.fetch_add(1, Ordering::Relaxed);
}

pub fn get_tick_count() -> u64 {
    TICKS.load(Ordering::Relaxed)
}

pub fn get_tick_freq() -> u32 {
    TICK_HZ
}
