//! Thread wrapper over the scheduler's task lifecycle: joinable vs.
//! detached bookkeeping, and a dedicated reaper task that cleans up
//! detached threads after they exit.
//!
//! CMSIS mapping: `osThreadNew`/`osThreadJoin`/`osThreadDetach`/
//! `osThreadTerminate`/`osThreadExit`/`osThreadGetState`. Grounded on
//! `cmsis-rtos2-thread.c`'s `osSchedulerTaskEntryPoint` /
//! `osSchedulerTaskExitHandler` / `osThreadReaper` trio: there, the
//! scheduler itself calls an exit-handler callback when a task's entry
//! function returns; here, `rtos_core::task` has no such callback hook, so
//! the equivalent cleanup (releasing robust mutexes, signaling a joiner,
//! or flagging for reaping) runs as the tail of [`trampoline`] itself,
//! which the task's entry point *is* — it runs in-task, synchronously,
//! before falling through into `rtos_core`'s own post-entry termination
//! path, rather than as an asynchronous callback from the scheduler.
//!
//! A joinable thread's `osThreadJoin` caller owns the cleanup (matching
//! the original); a detached thread is cleaned up by [`spawn_reaper`]'s
//! task instead, which polls rather than waits on a signal — this crate
//! doesn't spend one of `rtos_core::futex`'s limited 64 registry slots on
//! a per-spawn join signal (see [`JOIN_INFO`]'s cooperative yield-spin in
//! [`Thread::join`] for the same reason).

use core::cell::UnsafeCell;
use core::ffi::c_void;
use core::ptr;
use core::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

use rtos_abi::task::{CoreAffinity, TaskFlags, MAX_TASKS};
use rtos_abi::{KernelError, KernelResult};

pub type ThreadFunc = extern "C" fn(*mut c_void);

struct SpawnSlot {
    in_use: AtomicBool,
    func: UnsafeCell<Option<ThreadFunc>>,
    arg: AtomicPtr<c_void>,
    joinable: AtomicBool,
}

// SAFETY: a slot is claimed by exactly one spawner (CAS on `in_use`) and
// read exactly once by the task it was claimed for, in `trampoline`,
// which frees it before doing anything else.
unsafe impl Sync for SpawnSlot {}

static SPAWN_SLOTS: [SpawnSlot; MAX_TASKS] = [const {
    SpawnSlot {
        in_use: AtomicBool::new(false),
        func: UnsafeCell::new(None),
        arg: AtomicPtr::new(ptr::null_mut()),
        joinable: AtomicBool::new(false),
    }
}; MAX_TASKS];

struct JoinInfo {
    joinable: AtomicBool,
    exited: AtomicBool,
    reaped: AtomicBool,
}

/// Per-`task_id` join bookkeeping. Reset by the spawner right after
/// `task_create` returns — `task_create` only enqueues onto the ready
/// queue, it doesn't force an immediate cross-core dispatch, so this
/// reset always lands before `trampoline` could plausibly run on the
/// other core. `trampoline` re-asserts the same values at its own start,
/// since it's the one source of truth once the thread is actually
/// running.
static JOIN_INFO: [JoinInfo; MAX_TASKS] = [const {
    JoinInfo {
        joinable: AtomicBool::new(false),
        exited: AtomicBool::new(false),
        reaped: AtomicBool::new(false),
    }
}; MAX_TASKS];

pub struct Thread {
    task_id: u32,
}

fn claim_spawn_slot(func: ThreadFunc, arg: *mut c_void, joinable: bool) -> KernelResult<usize> {
    for (i, slot) in SPAWN_SLOTS.iter().enumerate() {
        if slot
            .in_use
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            unsafe { *slot.func.get() = Some(func) };
            slot.arg.store(arg, Ordering::Relaxed);
            slot.joinable.store(joinable, Ordering::Relaxed);
            return Ok(i);
        }
    }
    Err(KernelError::NoSpace)
}

extern "C" fn trampoline(spawn_slot: *mut c_void) {
    let slot = unsafe { &*(spawn_slot as *const SpawnSlot) };
    let func = unsafe { (*slot.func.get()).take() };
    let arg = slot.arg.load(Ordering::Relaxed);
    let joinable = slot.joinable.load(Ordering::Relaxed);
    slot.in_use.store(false, Ordering::Release);

    let task = rtos_core::scheduler::current_task();
    let task_id = unsafe { (*task).task_id };
    let info = &JOIN_INFO[task_id as usize];
    info.joinable.store(joinable, Ordering::Relaxed);
    info.exited.store(false, Ordering::Relaxed);
    info.reaped.store(false, Ordering::Relaxed);

    if let Some(func) = func {
        func(arg);
    }

    crate::mutex::release_robust_mutexes_owned_by(task_id);
    info.exited.store(true, Ordering::Release);
    // Joinable threads are reaped by their joiner; detached ones by
    // spawn_reaper's poll. Either way `rtos_core::task::task_exit_trampoline`
    // (appended by `task_create` past this function's return) marks the
    // task TERMINATED — we just don't reap its slot ourselves here.
}

impl Thread {
    /// Spawn a thread running `func(arg)` on `stack`, at `priority`,
    /// pinned per `affinity`. `joinable` threads must eventually be
    /// joined with [`Thread::join`] or converted with [`Thread::detach`];
    /// detached ones are reaped automatically once they exit.
    pub fn spawn(
        name: &str,
        func: ThreadFunc,
        arg: *mut c_void,
        stack: &'static mut [u32],
        priority: u8,
        joinable: bool,
        affinity: CoreAffinity,
    ) -> KernelResult<Self> {
        let idx = claim_spawn_slot(func, arg, joinable)?;
        let flags = if joinable {
            TaskFlags::JOINABLE
        } else {
            TaskFlags::empty()
        };
        let spawn_arg = &SPAWN_SLOTS[idx] as *const SpawnSlot as *mut c_void;
        let task = match rtos_core::task::task_create(
            name, trampoline, spawn_arg, stack, priority, flags, affinity,
        ) {
            Ok(task) => task,
            Err(e) => {
                SPAWN_SLOTS[idx].in_use.store(false, Ordering::Release);
                return Err(e);
            }
        };
        let task_id = unsafe { (*task).task_id };
        let info = &JOIN_INFO[task_id as usize];
        info.joinable.store(joinable, Ordering::Relaxed);
        info.exited.store(false, Ordering::Relaxed);
        info.reaped.store(false, Ordering::Relaxed);
        Ok(Self { task_id })
    }

    pub fn task_id(&self) -> u32 {
        self.task_id
    }

    /// Block the caller until the thread exits, then reap it. Only valid
    /// for threads spawned `joinable`.
    pub fn join(self) -> KernelResult<()> {
        let info = &JOIN_INFO[self.task_id as usize];
        if !info.joinable.load(Ordering::Relaxed) {
            return Err(KernelError::InvalidArgument);
        }
        while !info.exited.load(Ordering::Acquire) {
            rtos_core::scheduler::r#yield();
        }
        rtos_core::task::task_reap(self.task_id);
        info.reaped.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Convert a joinable thread to detached; the reaper task will clean
    /// it up once it exits instead of a joiner.
    pub fn detach(self) -> KernelResult<()> {
        let info = &JOIN_INFO[self.task_id as usize];
        if !info.joinable.load(Ordering::Relaxed) {
            return Err(KernelError::InvalidArgument);
        }
        info.joinable.store(false, Ordering::Release);
        core::mem::forget(self);
        Ok(())
    }

    /// Force-terminate the thread: release any robust mutexes it holds,
    /// then evict it from the scheduler. Detached only — a joinable
    /// thread must be joined instead.
    pub fn terminate(self) -> KernelResult<()> {
        let info = &JOIN_INFO[self.task_id as usize];
        if info.joinable.load(Ordering::Relaxed) {
            return Err(KernelError::InvalidArgument);
        }
        crate::mutex::release_robust_mutexes_owned_by(self.task_id);
        let task = rtos_core::task::task_get(self.task_id)?;
        rtos_core::scheduler::terminate(Some(task))?;
        info.exited.store(true, Ordering::Release);
        core::mem::forget(self);
        Ok(())
    }
}

extern "C" fn reaper_entry(_arg: *mut c_void) {
    loop {
        let _ = rtos_core::scheduler::sleep(rtos_abi::config::TICK_HZ);
        for (task_id, info) in JOIN_INFO.iter().enumerate() {
            if info.joinable.load(Ordering::Relaxed)
                || info.reaped.load(Ordering::Relaxed)
                || !info.exited.load(Ordering::Acquire)
            {
                continue;
            }
            rtos_core::task::task_reap(task_id as u32);
            info.reaped.store(true, Ordering::Relaxed);
        }
    }
}

/// Spawn the one dedicated reaper task. Call once, during startup,
/// at the lowest application priority (it only ever does cheap, periodic
/// bookkeeping).
pub fn spawn_reaper(stack: &'static mut [u32], priority: u8) -> KernelResult<()> {
    rtos_core::task::task_create(
        "cmsis-reaper",
        reaper_entry,
        ptr::null_mut(),
        stack,
        priority,
        TaskFlags::SYSTEM | TaskFlags::IGNORE_FOR_VIABILITY,
        CoreAffinity::Any,
    )?;
    Ok(())
}
