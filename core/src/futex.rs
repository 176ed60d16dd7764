//! Futex control blocks and the wait/wake algorithm (component design §4.2).
//!
//! A futex's waiter queue is scheduler state in every sense that matters —
//! it's walked during priority-inheritance propagation alongside the ready
//! and timer queues — so it lives under the same big lock as the rest of
//! `crate::scheduler` rather than behind a lock of its own. This module
//! owns the `Futex` control block and the wait/wake/propagate algorithm;
//! `crate::scheduler` owns the queues it links into.

use core::ptr;
use core::sync::atomic::{AtomicI32, AtomicPtr, AtomicU32, Ordering};

use rtos_abi::futex::{FutexFlags, FUTEX_WORD_CONTENTION_BIT};
use rtos_abi::task::{Task, TaskState, MAX_TASKS};
use rtos_abi::{KernelError, KernelResult, MAX_FUTEX_PI_DEPTH, WAIT_FOREVER};

use crate::scheduler::{self, SchedulerInner};

const FUTEX_MARKER: u32 = 0x4655_5458; // "FUTX"

/// A futex control block. The word it guards lives in caller-owned memory
/// (typically alongside a CMSIS mutex/semaphore object); this struct only
/// holds the waiter queue and, when `OWNER_TRACKING` is set, the owning
/// task and this futex's link on that task's owned-futex list.
#[repr(C)]
pub struct Futex {
    word: *const AtomicU32,
    flags: FutexFlags,
    waiter_head: *mut Task,
    waiter_tail: *mut Task,
    owner: *mut Task,
    pub(crate) next_owned: *mut Futex,
    marker: u32,
}

// SAFETY: every pointer field is either null, into the static task pool, or
// a caller-supplied 'static word; all access happens under the scheduler's
// big lock.
unsafe impl Send for Futex {}
unsafe impl Sync for Futex {}

impl Futex {
    pub const fn new(word: &'static AtomicU32, flags: FutexFlags) -> Self {
        Self {
            word: word as *const AtomicU32,
            flags,
            waiter_head: ptr::null_mut(),
            waiter_tail: ptr::null_mut(),
            owner: ptr::null_mut(),
            next_owned: ptr::null_mut(),
            marker: FUTEX_MARKER,
        }
    }

    #[inline]
    fn word(&self) -> &AtomicU32 {
        unsafe { &*self.word }
    }

    pub(crate) fn waiter_head(&self) -> Option<*mut Task> {
        if self.waiter_head.is_null() {
            None
        } else {
            Some(self.waiter_head)
        }
    }

    fn insert_sorted(&mut self, task: *mut Task) {
        let priority = unsafe { (*task).current_priority };
        unsafe { (*task).next_waiter = ptr::null_mut() };
        let mut prev: *mut Task = ptr::null_mut();
        let mut cursor = self.waiter_head;
        while !cursor.is_null() && unsafe { (*cursor).current_priority } <= priority {
            prev = cursor;
            cursor = unsafe { (*cursor).next_waiter };
        }
        unsafe { (*task).next_waiter = cursor };
        if prev.is_null() {
            self.waiter_head = task;
        } else {
            unsafe { (*prev).next_waiter = task };
        }
        if cursor.is_null() {
            self.waiter_tail = task;
        }
    }

    fn remove(&mut self, task: *mut Task) -> bool {
        let mut prev: *mut Task = ptr::null_mut();
        let mut cursor = self.waiter_head;
        while !cursor.is_null() {
            if cursor == task {
                let next = unsafe { (*cursor).next_waiter };
                if prev.is_null() {
                    self.waiter_head = next;
                } else {
                    unsafe { (*prev).next_waiter = next };
                }
                if self.waiter_tail == cursor {
                    self.waiter_tail = prev;
                }
                unsafe { (*cursor).next_waiter = ptr::null_mut() };
                return true;
            }
            prev = cursor;
            cursor = unsafe { (*cursor).next_waiter };
        }
        false
    }

    fn pop_front(&mut self) -> *mut Task {
        let task = self.waiter_head;
        if !task.is_null() {
            self.remove(task);
        }
        task
    }

    fn update_contention_bit(&self) {
        if !self.flags.contains(FutexFlags::CONTENTION_TRACKING) {
            return;
        }
        let contended = !self.waiter_head.is_null();
        let mut current = self.word().load(Ordering::Relaxed);
        loop {
            let next = if contended {
                current | FUTEX_WORD_CONTENTION_BIT
            } else {
                current & !FUTEX_WORD_CONTENTION_BIT
            };
            if next == current {
                return;
            }
            match self
                .word()
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }
}

/// Capacity of the address-to-`Futex` registry below. Fixed, like the task
/// pool, because there is no heap to grow a dynamic map in.
const MAX_FUTEXES: usize = 64;

static FUTEX_REGISTRY: [AtomicPtr<Futex>; MAX_FUTEXES] =
    [const { AtomicPtr::new(ptr::null_mut()) }; MAX_FUTEXES];

/// Record `futex` so the supervisor-call surface can look it up by the
/// address of the word it guards. `rtos-cmsis` calls this once, at the
/// static mutex/semaphore object's initialization, since the SVC ABI only
/// has room to pass the bare word address, not a `Futex` pointer.
pub fn register(futex: *mut Futex) {
    for slot in FUTEX_REGISTRY.iter() {
        if slot
            .compare_exchange(ptr::null_mut(), futex, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            return;
        }
    }
}

pub fn unregister(futex: *mut Futex) {
    for slot in FUTEX_REGISTRY.iter() {
        if slot
            .compare_exchange(futex, ptr::null_mut(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            return;
        }
    }
}

/// Find the registered futex guarding `word`, if any.
pub fn lookup(word: *const u32) -> Option<*mut Futex> {
    for slot in FUTEX_REGISTRY.iter() {
        let candidate = slot.load(Ordering::Acquire);
        if candidate.is_null() {
            continue;
        }
        if unsafe { (*candidate).word } as *const u32 == word {
            return Some(candidate);
        }
    }
    None
}

/// Side table from task id to the futex it's currently blocked in, used by
/// the scheduler's timeout path to find and unlink a task whose wait timed
/// out without requiring a back-pointer on every `Task`.
static WAITING_ON: [AtomicPtr<Futex>; MAX_TASKS] =
    [const { AtomicPtr::new(ptr::null_mut()) }; MAX_TASKS];

/// Per-task result of the most recently completed wait, read back by
/// `wait` once its caller is dispatched again.
static WAIT_RESULT: [AtomicI32; MAX_TASKS] = [const { AtomicI32::new(0) }; MAX_TASKS];

fn set_waiting_on(task_id: u32, futex: *mut Futex) {
    WAITING_ON[task_id as usize].store(futex, Ordering::Relaxed);
}

fn clear_waiting_on(task_id: u32) {
    WAITING_ON[task_id as usize].store(ptr::null_mut(), Ordering::Relaxed);
}

fn set_result(task_id: u32, result: KernelError) {
    WAIT_RESULT[task_id as usize].store(result.as_c_int(), Ordering::Relaxed);
}

/// Recompute and (if changed) propagate a task's priority boost up through
/// at most `MAX_FUTEX_PI_DEPTH` owner hops: `task` is blocked on a futex
/// owned by someone, who may themselves be blocked on another owned futex.
/// Bounded so a cycle (user error — a futex loop) can't spin the kernel.
fn propagate_priority(sched: &mut SchedulerInner, start_owner: *mut Task) {
    let mut owner = start_owner;
    for _ in 0..MAX_FUTEX_PI_DEPTH {
        if owner.is_null() {
            return;
        }
        unsafe { scheduler::recompute_current_priority_locked(sched, owner) };

        let blocked_on = WAITING_ON[unsafe { (*owner).task_id } as usize].load(Ordering::Relaxed);
        if blocked_on.is_null() {
            return;
        }
        let futex = unsafe { &mut *blocked_on };
        if futex.waiter_head.is_null() {
            return;
        }
        // Owner's priority changed; its position in the futex it's waiting
        // on may no longer be sorted correctly.
        futex.remove(owner);
        futex.insert_sorted(owner);
        if futex.owner.is_null() {
            return;
        }
        owner = futex.owner;
    }
}

/// Block the caller on `futex` until woken or `ticks` elapse. Returns
/// `Busy` immediately, without blocking, if `*word != expected` by the time
/// the big lock is taken (the condition the caller was waiting on already
/// changed) or if `ticks == 0` (a poll: check the condition, never enqueue).
pub fn wait(futex: *mut Futex, expected: u32, ticks: u32) -> KernelResult<()> {
    if futex.is_null() {
        return Err(KernelError::InvalidArgument);
    }
    if ticks == 0 {
        return Err(KernelError::Busy);
    }
    let core = scheduler::this_core();

    let armed = {
        let mut sched = scheduler::lock();
        let f = unsafe { &mut *futex };
        if f.word().load(Ordering::Relaxed) != expected {
            return Err(KernelError::Busy);
        }
        let task = scheduler::current_of(&sched, core);
        if task.is_null() {
            return Err(KernelError::InvalidArgument);
        }

        unsafe { (*task).state = TaskState::Blocked };
        f.insert_sorted(task);
        f.update_contention_bit();
        set_waiting_on(unsafe { (*task).task_id }, futex);

        if f.flags.contains(FutexFlags::PI) && !f.owner.is_null() {
            propagate_priority(&mut sched, f.owner);
        }

        if ticks != WAIT_FOREVER {
            let expiry = scheduler::tick_now(&sched) + ticks as u64;
            unsafe { (*task).timer_expiry = expiry };
            sched.timer_insert(task);
        }
        scheduler::request_reschedule(&mut sched, core);
        task
    };

    scheduler::request_dispatch(core);
    loop {
        if unsafe { (*armed).state } != TaskState::Blocked {
            break;
        }
        platform_wait_for_event();
    }

    let task_id = unsafe { (*armed).task_id };
    let result = KernelError::from_c_int(WAIT_RESULT[task_id as usize].load(Ordering::Relaxed));
    clear_waiting_on(task_id);
    KernelError::decode(result.as_c_int())
}

#[inline]
fn platform_wait_for_event() {
    crate::platform::irq().wait_for_event();
}

/// Wake up to all (`all = true`) or one waiter. Returns the number woken.
/// Safe to call from task context; interrupt-context callers should use
/// [`crate::scheduler::defer_wake`] instead, which replays through here on
/// the next tick.
pub fn wake(futex: *mut Futex, all: bool) -> KernelResult<usize> {
    if futex.is_null() {
        return Err(KernelError::InvalidArgument);
    }
    let mut woken = 0usize;
    let mut sched = scheduler::lock();
    let f = unsafe { &mut *futex };

    loop {
        let task = f.pop_front();
        if task.is_null() {
            break;
        }
        let task_id = unsafe { (*task).task_id };
        if unsafe { (*task).timer_expiry } != u64::MAX {
            sched.timer_remove(task);
            unsafe { (*task).timer_expiry = u64::MAX };
        }
        clear_waiting_on(task_id);
        set_result(task_id, KernelError::Success);
        unsafe { (*task).state = TaskState::Ready };
        sched.push_ready(task);
        woken += 1;
        if !all {
            break;
        }
    }

    f.update_contention_bit();

    if woken > 0 {
        if f.flags.contains(FutexFlags::PI) && !f.owner.is_null() {
            unsafe { scheduler::recompute_current_priority_locked(&mut sched, f.owner) };
        }
        for core in 0..rtos_abi::MAX_CORES as u8 {
            scheduler::maybe_preempt_pub(&mut sched, core);
        }
    }
    drop(sched);

    if woken > 0 {
        crate::platform::irq().signal_event();
        for core in 0..rtos_abi::MAX_CORES as u8 {
            scheduler::request_dispatch(core);
        }
    }
    Ok(woken)
}

/// Called by `crate::scheduler::on_tick` when a task's sleep/wait timer
/// expires. If the task was blocked on a futex (rather than a plain
/// `sleep`), unlink it from that futex's waiter queue and record the
/// timeout so `wait` reports it.
pub(crate) fn note_timeout(task: *mut Task) {
    let task_id = unsafe { (*task).task_id };
    let futex = WAITING_ON[task_id as usize].swap(ptr::null_mut(), Ordering::Relaxed);
    if futex.is_null() {
        return;
    }
    let f = unsafe { &mut *futex };
    f.remove(task);
    f.update_contention_bit();
    set_result(task_id, KernelError::TimedOut);
}

/// Record `task` as the current owner of `futex` (OWNER_TRACKING futexes
/// only), threading it onto the task's owned-futex list for priority
/// inheritance and robust-release-on-termination bookkeeping.
pub fn set_owner(futex: *mut Futex, task: *mut Task) {
    let mut _sched = scheduler::lock();
    let f = unsafe { &mut *futex };
    f.owner = task;
    if !task.is_null() {
        f.next_owned = unsafe { (*task).owned_futexes } as *mut Futex;
        unsafe { (*task).owned_futexes = futex as *mut core::ffi::c_void };
    }
}

/// Clear ownership, unlinking `futex` from its former owner's owned-futex
/// list and recomputing that owner's priority (it may no longer be boosted
/// by this futex's waiters).
pub fn clear_owner(futex: *mut Futex) {
    let mut sched = scheduler::lock();
    let f = unsafe { &mut *futex };
    let former = f.owner;
    f.owner = ptr::null_mut();
    if former.is_null() {
        return;
    }
    let mut cursor = unsafe { (*former).owned_futexes } as *mut Futex;
    let mut prev: *mut Futex = ptr::null_mut();
    while !cursor.is_null() {
        if cursor == futex {
            let next = unsafe { (*cursor).next_owned };
            if prev.is_null() {
                unsafe { (*former).owned_futexes = next as *mut core::ffi::c_void };
            } else {
                unsafe { (*prev).next_owned = next };
            }
            break;
        }
        prev = cursor;
        cursor = unsafe { (*cursor).next_owned };
    }
    f.next_owned = ptr::null_mut();
    unsafe { scheduler::recompute_current_priority_locked(&mut sched, former) };
}
