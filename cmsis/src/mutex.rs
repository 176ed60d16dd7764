//! Recursive and robust mutexes over [`rtos_core::Futex`].
//!
//! CMSIS mapping: `osMutexNew`/`osMutexAcquire`/`osMutexRelease`/
//! `osMutexGetOwner`/`osMutexDelete`. The lock word encodes the owning
//! task's control-block pointer (`rtos_abi::futex::futex_word_with_owner`);
//! unlike the priority-inheritance handoff in the original C adapter, a
//! waiter woken here retries the compare-exchange rather than being handed
//! ownership directly — `rtos_core::futex` has no owner-aware wake, so this
//! is the plain futex-mutex retry loop instead (see DESIGN.md).
//!
//! Robust mutexes are *not* tracked on `rtos_core`'s own owned-futex list
//! (that one exists purely for priority-inheritance propagation and is
//! private to `rtos-core`). Instead this module keeps its own per-task
//! intrusive list, walked by [`release_robust_mutexes_owned_by`] when a
//! thread exits.
//!
//! The lock word's ownership transition is a compare-exchange, and ARMv6-M
//! has no `LDREX`/`STREX` to make a bare `AtomicU32::compare_exchange`
//! genuinely cross-core atomic — only plain loads are. So the transition
//! goes through `rtos_core::atomic::compare_exchange_u32`, which emulates
//! it over the platform's striped hardware spinlock cells, the same
//! primitive `rtos-core` itself reaches for whenever cross-core state needs
//! a real CAS rather than just a big-lock-protected read.

use core::ptr;
use core::sync::atomic::{AtomicPtr, AtomicU32, Ordering};

use rtos_abi::futex::{futex_word_owner, futex_word_with_owner, FutexFlags};
use rtos_abi::task::{Task, MAX_TASKS};
use rtos_abi::{KernelError, KernelResult};
use rtos_core::scheduler::current_task;
use rtos_core::Futex;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct MutexFlags: u8 {
        const RECURSIVE    = 0b001;
        const ROBUST       = 0b010;
        const PRIO_INHERIT = 0b100;
    }
}

static ROBUST_HEAD: [AtomicPtr<Mutex>; MAX_TASKS] =
    [const { AtomicPtr::new(ptr::null_mut()) }; MAX_TASKS];

fn robust_push(task_id: u32, m: *mut Mutex) {
    let head = &ROBUST_HEAD[task_id as usize];
    let first = head.load(Ordering::Relaxed);
    unsafe { (*m).next_robust.store(first, Ordering::Relaxed) };
    head.store(m, Ordering::Relaxed);
}

fn robust_remove(task_id: u32, m: *mut Mutex) {
    let head = &ROBUST_HEAD[task_id as usize];
    let mut cursor = head.load(Ordering::Relaxed);
    if cursor == m {
        head.store(unsafe { (*m).next_robust.load(Ordering::Relaxed) }, Ordering::Relaxed);
        return;
    }
    while !cursor.is_null() {
        let next = unsafe { (*cursor).next_robust.load(Ordering::Relaxed) };
        if next == m {
            let after = unsafe { (*m).next_robust.load(Ordering::Relaxed) };
            unsafe { (*cursor).next_robust.store(after, Ordering::Relaxed) };
            return;
        }
        cursor = next;
    }
}

/// Force-release every robust mutex `task_id` still holds, waking a waiter
/// on each. Called once from the thread wrapper's exit path, before the
/// task is handed to the scheduler's `terminate`.
pub fn release_robust_mutexes_owned_by(task_id: u32) {
    loop {
        let m = ROBUST_HEAD[task_id as usize].load(Ordering::Relaxed);
        if m.is_null() {
            break;
        }
        unsafe { (*m).force_release(task_id) };
    }
}

pub struct Mutex {
    word: &'static AtomicU32,
    futex: Futex,
    flags: MutexFlags,
    recursion: AtomicU32,
    owner_task_id: AtomicU32,
    next_robust: AtomicPtr<Mutex>,
    registered: core::sync::atomic::AtomicBool,
}

// SAFETY: `word` is 'static; `futex`'s raw pointers only ever point into
// the static task pool and are only chased under the scheduler's big lock.
unsafe impl Send for Mutex {}
unsafe impl Sync for Mutex {}

fn require_task() -> KernelResult<(*mut Task, u32)> {
    let task = current_task();
    if task.is_null() {
        return Err(KernelError::InvalidArgument);
    }
    Ok((task, unsafe { (*task).task_id }))
}

impl Mutex {
    /// Build a mutex over `word`. Const so this can sit in a `static`
    /// alongside the word it guards; registration with `rtos-core`'s futex
    /// lookup table happens lazily, on first use, once `self` is at its
    /// final address (doing it here would register a pointer into a value
    /// about to be moved out by the `Self` return).
    pub const fn new(word: &'static AtomicU32, flags: MutexFlags) -> Self {
        let want_pi = (flags.bits() & MutexFlags::PRIO_INHERIT.bits()) != 0;
        let mut futex_bits = FutexFlags::OWNER_TRACKING.bits() | FutexFlags::CONTENTION_TRACKING.bits();
        if want_pi {
            futex_bits |= FutexFlags::PI.bits();
        }
        Self {
            word,
            futex: Futex::new(word, FutexFlags::from_bits_retain(futex_bits)),
            flags,
            recursion: AtomicU32::new(0),
            owner_task_id: AtomicU32::new(u32::MAX),
            next_robust: AtomicPtr::new(ptr::null_mut()),
            registered: core::sync::atomic::AtomicBool::new(false),
        }
    }

    fn ensure_registered(&mut self) {
        if self
            .registered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.word.store(0, Ordering::Relaxed);
            rtos_core::futex::register(&mut self.futex as *mut Futex);
        }
    }

    /// Acquire the mutex, blocking up to `timeout` ticks (0 = try-lock,
    /// `WAIT_FOREVER` = block indefinitely).
    pub fn acquire(&mut self, timeout: u32) -> KernelResult<()> {
        self.ensure_registered();
        let (task, task_id) = require_task()?;
        let me = task as u32;

        if futex_word_owner(self.word.load(Ordering::Acquire)) == me {
            if !self.flags.contains(MutexFlags::RECURSIVE) {
                return Err(KernelError::InvalidArgument);
            }
            self.recursion.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }

        loop {
            let observed = self.word.load(Ordering::Acquire);
            if futex_word_owner(observed) == 0 {
                let target = futex_word_with_owner(me, false);
                if rtos_core::atomic::compare_exchange_u32(self.word, observed, target).is_ok() {
                    self.recursion.store(1, Ordering::Relaxed);
                    self.owner_task_id.store(task_id, Ordering::Relaxed);
                    rtos_core::futex::set_owner(&mut self.futex, task);
                    if self.flags.contains(MutexFlags::ROBUST) {
                        robust_push(task_id, self as *mut Mutex);
                    }
                    return Ok(());
                }
                continue;
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

    /// Release the mutex. `InvalidArgument` if the caller isn't the owner.
    pub fn release(&mut self) -> KernelResult<()> {
        let (task, task_id) = require_task()?;
        let me = task as u32;
        if futex_word_owner(self.word.load(Ordering::Acquire)) != me {
            return Err(KernelError::InvalidArgument);
        }
        if self.flags.contains(MutexFlags::RECURSIVE)
            && self.recursion.fetch_sub(1, Ordering::Relaxed) > 1
        {
            return Ok(());
        }
        if self.flags.contains(MutexFlags::ROBUST) {
            robust_remove(task_id, self as *mut Mutex);
        }
        self.owner_task_id.store(u32::MAX, Ordering::Relaxed);
        rtos_core::futex::clear_owner(&mut self.futex);
        self.word.store(0, Ordering::Release);
        rtos_core::futex::wake(&mut self.futex, false)?;
        Ok(())
    }

    /// Called only through [`release_robust_mutexes_owned_by`]: unlock
    /// unconditionally, discarding the recursion count, because the owner
    /// is exiting rather than releasing normally.
    unsafe fn force_release(&mut self, owner_task_id: u32) {
        robust_remove(owner_task_id, self as *mut Mutex);
        self.recursion.store(0, Ordering::Relaxed);
        self.owner_task_id.store(u32::MAX, Ordering::Relaxed);
        rtos_core::futex::clear_owner(&mut self.futex);
        self.word.store(0, Ordering::Release);
        let _ = rtos_core::futex::wake(&mut self.futex, false);
    }

    /// The task id currently holding the lock, if any.
    pub fn owner(&self) -> Option<u32> {
        let id = self.owner_task_id.load(Ordering::Relaxed);
        (id != u32::MAX).then_some(id)
    }
}

impl Drop for Mutex {
    fn drop(&mut self) {
        rtos_core::futex::unregister(&mut self.futex as *mut Futex);
    }
}
