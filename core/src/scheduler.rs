//! The scheduler: task lifecycle operations, dispatch, timer expiry, and
//! the futex wait/wake algorithms that share its big lock (component
//! design §4.1, §4.2).
//!
//! All mutable scheduler state lives behind one cross-core lock
//! (`SCHEDULER`, a [`crate::atomic::HwMutex`] striped onto hardware
//! spinlock cell 0 — see `rtos_abi::BIG_LOCK_HW_INDEX`). Actual register
//! save/restore on a context switch is `rtos-boot`'s job (it owns the
//! PendSV asm); this module only ever decides *which* task runs next and
//! hands back the two context pointers for the switch to use.

use core::ffi::c_void;
use core::ptr;

use rtos_abi::task::{CoreAffinity, Task, TaskContext, TaskExitReason, TaskFlags, TaskState};
use rtos_abi::{
    KernelError, KernelResult, MAX_CORES, MAX_DEFERRED_WAKE_SLOTS, NUM_PRIORITY_LEVELS,
    WAIT_FOREVER,
};
use rtos_lib::klog_info;

use crate::atomic::HwMutex;
use crate::futex::Futex;
use crate::platform;

#[derive(Default, Clone, Copy)]
struct Band {
    head: *mut Task,
    tail: *mut Task,
}

impl Band {
    const fn empty() -> Self {
        Self {
            head: ptr::null_mut(),
            tail: ptr::null_mut(),
        }
    }

    fn push_back(&mut self, task: *mut Task) {
        unsafe { (*task).next_ready = ptr::null_mut() };
        if self.head.is_null() {
            self.head = task;
            self.tail = task;
        } else {
            unsafe { (*self.tail).next_ready = task };
            self.tail = task;
        }
    }

    /// Remove the first task in FIFO order for which `pred` is true.
    fn take_where(&mut self, pred: impl Fn(*mut Task) -> bool) -> *mut Task {
        let mut prev: *mut Task = ptr::null_mut();
        let mut cursor = self.head;
        while !cursor.is_null() {
            if pred(cursor) {
                let next = unsafe { (*cursor).next_ready };
                if prev.is_null() {
                    self.head = next;
                } else {
                    unsafe { (*prev).next_ready = next };
                }
                if self.tail == cursor {
                    self.tail = prev;
                }
                unsafe { (*cursor).next_ready = ptr::null_mut() };
                return cursor;
            }
            prev = cursor;
            cursor = unsafe { (*cursor).next_ready };
        }
        ptr::null_mut()
    }

    fn remove(&mut self, task: *mut Task) -> bool {
        !self.take_where(|t| t == task).is_null()
    }
}

#[derive(Clone, Copy)]
struct DeferredWake {
    futex: *mut Futex,
    all: bool,
}

pub struct SchedulerInner {
    ready: [Band; NUM_PRIORITY_LEVELS],
    /// Singly linked via `Task::next_timer`, ascending by `timer_expiry`.
    timer_head: *mut Task,
    current_task: [*mut Task; MAX_CORES],
    idle_task: [*mut Task; MAX_CORES],
    /// Captured at scheduler entry (`init`), per core: where `select_next`
    /// switches to when [`crate::task::any_viable_task_exists`] goes false,
    /// unwinding scheduling back to a quiescent "caller of run()" state
    /// (data model §3, "Scheduler singleton").
    initial_frame: [*mut TaskContext; MAX_CORES],
    enabled: bool,
    tick: u64,
    reschedule_pending: [bool; MAX_CORES],
    deferred: [Option<DeferredWake>; MAX_DEFERRED_WAKE_SLOTS],
    deferred_head: usize,
    deferred_len: usize,
    total_switches: u64,
    total_preemptions: u64,
}

// SAFETY: every pointer inside is either into the static task pool or a
// caller-owned, 'static futex; all access is serialized by `SCHEDULER`'s
// hardware-backed mutex.
unsafe impl Send for SchedulerInner {}

impl SchedulerInner {
    const fn new() -> Self {
        Self {
            ready: [Band::empty(); NUM_PRIORITY_LEVELS],
            timer_head: ptr::null_mut(),
            current_task: [ptr::null_mut(); MAX_CORES],
            idle_task: [ptr::null_mut(); MAX_CORES],
            initial_frame: [ptr::null_mut(); MAX_CORES],
            enabled: false,
            tick: 0,
            reschedule_pending: [false; MAX_CORES],
            deferred: [None; MAX_DEFERRED_WAKE_SLOTS],
            deferred_head: 0,
            deferred_len: 0,
            total_switches: 0,
            total_preemptions: 0,
        }
    }

    fn band_index(priority: u8) -> usize {
        (priority as usize).min(NUM_PRIORITY_LEVELS - 1)
    }

    pub(crate) fn push_ready(&mut self, task: *mut Task) {
        let idx = Self::band_index(unsafe { (*task).current_priority });
        self.ready[idx].push_back(task);
    }

    pub(crate) fn remove_ready(&mut self, task: *mut Task) -> bool {
        let idx = Self::band_index(unsafe { (*task).current_priority });
        self.ready[idx].remove(task)
    }

    fn pop_ready_for_core(&mut self, core: u8) -> *mut Task {
        for band in self.ready.iter_mut() {
            let task = band.take_where(|t| unsafe { (*t).affinity }.matches(core));
            if !task.is_null() {
                return task;
            }
        }
        ptr::null_mut()
    }

    fn best_ready_priority_for_core(&self, core: u8) -> Option<u8> {
        for (priority, band) in self.ready.iter().enumerate() {
            let mut cursor = band.head;
            while !cursor.is_null() {
                if unsafe { (*cursor).affinity }.matches(core) {
                    return Some(priority as u8);
                }
                cursor = unsafe { (*cursor).next_ready };
            }
        }
        None
    }

    pub(crate) fn timer_insert(&mut self, task: *mut Task) {
        unsafe { (*task).next_timer = ptr::null_mut() };
        if self.timer_head.is_null()
            || unsafe { (*self.timer_head).timer_expiry > (*task).timer_expiry }
        {
            unsafe { (*task).next_timer = self.timer_head };
            self.timer_head = task;
            return;
        }
        let mut cursor = self.timer_head;
        while !unsafe { (*cursor).next_timer }.is_null()
            && unsafe { (*(*cursor).next_timer).timer_expiry <= (*task).timer_expiry }
        {
            cursor = unsafe { (*cursor).next_timer };
        }
        unsafe {
            (*task).next_timer = (*cursor).next_timer;
            (*cursor).next_timer = task;
        }
    }

    pub(crate) fn timer_remove(&mut self, task: *mut Task) {
        if self.timer_head == task {
            self.timer_head = unsafe { (*task).next_timer };
            unsafe { (*task).next_timer = ptr::null_mut() };
            return;
        }
        let mut cursor = self.timer_head;
        while !cursor.is_null() {
            if unsafe { (*cursor).next_timer } == task {
                unsafe { (*cursor).next_timer = (*task).next_timer };
                unsafe { (*task).next_timer = ptr::null_mut() };
                return;
            }
            cursor = unsafe { (*cursor).next_timer };
        }
    }
}

pub static SCHEDULER: HwMutex<SchedulerInner> =
    HwMutex::new(rtos_abi::BIG_LOCK_HW_INDEX, SchedulerInner::new());

#[inline]
fn with_scheduler<R>(f: impl FnOnce(&mut SchedulerInner) -> R) -> R {
    let mut guard = SCHEDULER.lock();
    f(&mut guard)
}

/// Hold the big lock across more than one scheduler operation. Used by
/// `crate::futex`, whose waiter-queue manipulation must be atomic with the
/// ready/timer queue changes it makes alongside it (the futex waiter queue
/// is "big lock" state too, per the shared-resources list).
pub(crate) fn lock() -> crate::atomic::HwMutexGuard<'static, SchedulerInner> {
    SCHEDULER.lock()
}

pub(crate) fn this_core() -> u8 {
    platform::irq().current_core()
}

pub(crate) fn current_of(sched: &SchedulerInner, core: u8) -> *mut Task {
    sched.current_task[core as usize]
}

pub(crate) fn request_reschedule(sched: &mut SchedulerInner, core: u8) {
    sched.reschedule_pending[core as usize] = true;
}

pub(crate) fn tick_now(sched: &SchedulerInner) -> u64 {
    sched.tick
}

/// Called once by `task::task_create` after stamping a new task's context.
/// Not itself the public `create` operation (task construction lives in
/// `crate::task`); this only threads it onto the ready queue and wakes an
/// idle core if one might take it.
pub fn enqueue_ready(task: *mut Task) {
    with_scheduler(|sched| {
        unsafe { (*task).state = TaskState::Ready };
        sched.push_ready(task);
    });
    platform::irq().signal_event();
}

/// Request a reschedule on `core` if the ready queue now holds something at
/// least as good as whatever `core` is running.
fn maybe_preempt(sched: &mut SchedulerInner, core: u8) {
    if !sched.enabled {
        return;
    }
    let current_priority = {
        let current = sched.current_task[core as usize];
        if current.is_null() {
            u8::MAX
        } else {
            unsafe { (*current).current_priority }
        }
    };
    if let Some(best) = sched.best_ready_priority_for_core(core) {
        if best <= current_priority {
            sched.reschedule_pending[core as usize] = true;
        }
    }
}

pub fn r#yield() {
    let core = this_core();
    with_scheduler(|sched| {
        sched.reschedule_pending[core as usize] = true;
    });
    request_dispatch(core);
}

/// Park the caller until its timer expires (ticks == 0 means no-op,
/// WAIT_FOREVER means block until explicitly woken by `resume`).
pub fn sleep(ticks: u32) -> KernelResult<()> {
    if ticks == 0 {
        r#yield();
        return Ok(());
    }
    let core = this_core();
    with_scheduler(|sched| {
        let current = sched.current_task[core as usize];
        if current.is_null() {
            return;
        }
        unsafe {
            (*current).state = TaskState::Sleeping;
            if ticks != WAIT_FOREVER {
                (*current).timer_expiry = sched.tick + ticks as u64;
                sched.timer_insert(current);
            } else {
                (*current).timer_expiry = u64::MAX;
            }
        }
        sched.reschedule_pending[core as usize] = true;
    });
    request_dispatch(core);
    Ok(())
}

pub fn suspend(task: Option<*mut Task>) -> KernelResult<()> {
    let core = this_core();
    let target = task.unwrap_or_else(|| with_scheduler(|s| s.current_task[core as usize]));
    if target.is_null() {
        return Err(KernelError::NotFound);
    }
    with_scheduler(|sched| {
        let state = unsafe { (*target).state };
        if state == TaskState::Suspended {
            return Ok(());
        }
        if state == TaskState::Ready {
            sched.remove_ready(target);
        } else if state == TaskState::Sleeping {
            sched.timer_remove(target);
        } else if state != TaskState::Running && state != TaskState::Blocked {
            return Err(KernelError::InvalidArgument);
        }
        unsafe { (*target).state = TaskState::Suspended };
        if target == sched.current_task[core as usize] {
            sched.reschedule_pending[core as usize] = true;
        }
        Ok(())
    })?;
    if task.is_none() {
        request_dispatch(core);
    }
    Ok(())
}

pub fn resume(task: *mut Task) -> KernelResult<()> {
    if task.is_null() {
        return Err(KernelError::NotFound);
    }
    with_scheduler(|sched| {
        let state = unsafe { (*task).state };
        if state != TaskState::Suspended && state != TaskState::Sleeping {
            return Err(KernelError::InvalidArgument);
        }
        if state == TaskState::Sleeping {
            sched.timer_remove(task);
        }
        unsafe {
            (*task).state = TaskState::Ready;
            (*task).timer_expiry = u64::MAX;
        }
        sched.push_ready(task);
        for core in 0..MAX_CORES as u8 {
            maybe_preempt(sched, core);
        }
        Ok(())
    })?;
    platform::irq().signal_event();
    request_all_cores();
    Ok(())
}

/// The scheduler's half of termination: remove from whichever queue the
/// task is on and mark it TERMINATED. Robust-mutex release and exit-handler
/// invocation are the CMSIS adapter's job, run by the caller before this.
pub fn terminate(task: Option<*mut Task>) -> KernelResult<()> {
    let core = this_core();
    let target = task.unwrap_or_else(|| with_scheduler(|s| s.current_task[core as usize]));
    if target.is_null() {
        return Err(KernelError::NotFound);
    }
    if unsafe { (*target).state } == TaskState::Terminated {
        return Err(KernelError::NotFound);
    }
    with_scheduler(|sched| {
        match unsafe { (*target).state } {
            TaskState::Ready => {
                sched.remove_ready(target);
            }
            TaskState::Sleeping | TaskState::Blocked => {
                sched.timer_remove(target);
            }
            _ => {}
        }
        unsafe { crate::task::mark_terminated(target, TaskExitReason::Normal, 0) };
        if sched.current_task[core as usize] == target {
            sched.current_task[core as usize] = ptr::null_mut();
            sched.reschedule_pending[core as usize] = true;
        }
    });
    if task.is_none() || core == this_core() {
        request_dispatch(core);
    }
    Ok(())
}

pub fn terminate_current() {
    let _ = terminate(None);
}

pub fn set_priority(task: *mut Task, new_priority: u8) -> KernelResult<()> {
    if task.is_null() {
        return Err(KernelError::NotFound);
    }
    let new_priority = new_priority.min((NUM_PRIORITY_LEVELS - 1) as u8);
    with_scheduler(|sched| {
        unsafe { (*task).base_priority = new_priority };
        let in_ready = unsafe { (*task).state } == TaskState::Ready;
        if in_ready {
            sched.remove_ready(task);
        }
        unsafe { (*task).current_priority = new_priority };
        if in_ready {
            sched.push_ready(task);
        }
        for core in 0..MAX_CORES as u8 {
            maybe_preempt(sched, core);
        }
    });
    request_all_cores();
    Ok(())
}

/// Recompute `task`'s current (possibly PI-boosted) priority as the
/// minimum of its base priority and the best waiter priority across every
/// futex it owns, per the invariant in the data model. Caller already
/// holds the big lock (used from `crate::futex`, which manipulates waiter
/// queues under the same lock).
///
/// # Safety
/// `task` must be live.
pub(crate) unsafe fn recompute_current_priority_locked(sched: &mut SchedulerInner, task: *mut Task) {
    let mut best = unsafe { (*task).base_priority };
    let mut futex = unsafe { (*task).owned_futexes } as *mut Futex;
    while !futex.is_null() {
        if let Some(head) = unsafe { (*futex).waiter_head() } {
            let waiter_priority = unsafe { (*head).current_priority };
            if waiter_priority < best {
                best = waiter_priority;
            }
        }
        futex = unsafe { (*futex).next_owned };
    }
    let was_ready = unsafe { (*task).state } == TaskState::Ready;
    if was_ready {
        sched.remove_ready(task);
    }
    unsafe { (*task).current_priority = best };
    if was_ready {
        sched.push_ready(task);
    }
    for core in 0..MAX_CORES as u8 {
        maybe_preempt(sched, core);
    }
}

/// Same as [`recompute_current_priority_locked`] but acquires the big lock
/// itself; for callers that don't already hold it.
///
/// # Safety
/// `task` must be live.
#[allow(dead_code)]
pub(crate) unsafe fn recompute_current_priority(task: *mut Task) {
    with_scheduler(|sched| unsafe { recompute_current_priority_locked(sched, task) });
}

pub(crate) fn maybe_preempt_pub(sched: &mut SchedulerInner, core: u8) {
    maybe_preempt(sched, core);
}

/// Result of [`select_next`]: what `rtos-boot`'s PendSV handler must do.
pub enum SwitchDecision {
    NoSwitch,
    Switch {
        old_ctx: *mut TaskContext,
        new_ctx: *const TaskContext,
    },
}

/// Decide the next task to run on `core` and update bookkeeping. Called
/// from PendSV; the caller (`rtos-boot`) performs the actual register
/// save/restore using the returned pointers.
pub fn select_next(core: u8) -> SwitchDecision {
    with_scheduler(|sched| {
        sched.reschedule_pending[core as usize] = false;
        if !sched.enabled {
            return SwitchDecision::NoSwitch;
        }

        let current = sched.current_task[core as usize];
        if !current.is_null() && unsafe { (*current).state } == TaskState::Running {
            unsafe {
                if !crate::task::check_stack_sentinel(current) {
                    crate::task::mark_terminated(current, TaskExitReason::StackOverflow, -8);
                    sched.current_task[core as usize] = ptr::null_mut();
                } else {
                    (*current).state = TaskState::Ready;
                    (*current).slice_remaining = rtos_abi::SCHEDULER_TIME_SLICE;
                    sched.push_ready(current);
                }
            }
        }

        let next = {
            let task = sched.pop_ready_for_core(core);
            if !task.is_null() {
                task
            } else if !sched.idle_task[core as usize].is_null() {
                // Nothing but idle left for this core; before parking in it,
                // check whether the whole system still has a reason to keep
                // scheduling at all.
                if !crate::task::any_viable_task_exists() && !sched.initial_frame[core as usize].is_null() {
                    sched.enabled = false;
                    let old = sched.current_task[core as usize];
                    sched.current_task[core as usize] = ptr::null_mut();
                    klog_info!(
                        "scheduler: no viable task remains, core {} unwinding to its entry frame",
                        core
                    );
                    let old_ctx = if old.is_null() {
                        ptr::null_mut()
                    } else {
                        unsafe { &raw mut (*old).context }
                    };
                    return SwitchDecision::Switch {
                        old_ctx,
                        new_ctx: sched.initial_frame[core as usize] as *const TaskContext,
                    };
                }
                sched.idle_task[core as usize]
            } else {
                ptr::null_mut()
            }
        };

        if next.is_null() {
            sched.current_task[core as usize] = ptr::null_mut();
            return SwitchDecision::NoSwitch;
        }

        let old = sched.current_task[core as usize];
        if old == next {
            unsafe { (*next).state = TaskState::Running };
            return SwitchDecision::NoSwitch;
        }

        unsafe { (*next).state = TaskState::Running };
        unsafe { (*next).last_core = core };
        sched.current_task[core as usize] = next;
        sched.total_switches += 1;
        crate::tls::install(core, unsafe { (*next).tls });

        let old_ctx = if old.is_null() {
            ptr::null_mut()
        } else {
            unsafe { &raw mut (*old).context }
        };
        let new_ctx = unsafe { &raw const (*next).context };
        SwitchDecision::Switch { old_ctx, new_ctx }
    })
}

/// Pend the context-switch interrupt for `core`: locally if it's the
/// calling core, over the cross-core channel otherwise.
pub fn request_dispatch(core: u8) {
    if core == this_core() {
        platform::irq().pend_context_switch_local();
    } else {
        crate::smp::request_remote_dispatch(core);
    }
}

fn request_all_cores() {
    for core in 0..MAX_CORES as u8 {
        request_dispatch(core);
    }
}

pub fn current_task() -> *mut Task {
    with_scheduler(|sched| sched.current_task[this_core() as usize])
}

/// The architectural tick entry (SysTick), called once per tick on core 0
/// only — per-core replication would double-count; both cores' dispatch
/// loops share the one tick counter and timer list.
pub fn on_tick() {
    with_scheduler(|sched| {
        sched.tick += 1;
        while !sched.timer_head.is_null()
            && unsafe { (*sched.timer_head).timer_expiry } <= sched.tick
        {
            let expired = sched.timer_head;
            sched.timer_head = unsafe { (*expired).next_timer };
            unsafe {
                (*expired).next_timer = ptr::null_mut();
                (*expired).state = TaskState::Ready;
                (*expired).timer_expiry = u64::MAX;
            }
            crate::futex::note_timeout(expired);
            sched.push_ready(expired);
        }

        for core in 0..MAX_CORES as u8 {
            let current = sched.current_task[core as usize];
            if current.is_null() || unsafe { (*current).flags }.contains(TaskFlags::IGNORE_FOR_VIABILITY)
            {
                continue;
            }
            if unsafe { (*current).flags }.contains(TaskFlags::SYSTEM)
                && sched.idle_task[core as usize] == current
            {
                continue;
            }
            unsafe {
                if (*current).slice_remaining > 0 {
                    (*current).slice_remaining -= 1;
                }
                if (*current).slice_remaining == 0 {
                    sched.total_preemptions += 1;
                    sched.reschedule_pending[core as usize] = true;
                }
            }
        }
    });
    drain_deferred_wakes();
    for core in 0..MAX_CORES as u8 {
        let pending = with_scheduler(|sched| sched.reschedule_pending[core as usize]);
        if pending {
            request_dispatch(core);
        }
    }
}

/// Queue a futex wake request for later draining; used when `wake` is
/// called from interrupt context and cannot run the wake algorithm
/// directly (it may need to touch the waiter queue under the big lock in
/// ways an interrupt shouldn't linger to do).
pub(crate) fn defer_wake(futex: *mut Futex, all: bool) -> KernelResult<()> {
    with_scheduler(|sched| {
        if sched.deferred_len == MAX_DEFERRED_WAKE_SLOTS {
            return Err(KernelError::NoSpace);
        }
        let idx = (sched.deferred_head + sched.deferred_len) % MAX_DEFERRED_WAKE_SLOTS;
        sched.deferred[idx] = Some(DeferredWake { futex, all });
        sched.deferred_len += 1;
        Ok(())
    })
}

fn drain_deferred_wakes() {
    loop {
        let next = with_scheduler(|sched| {
            if sched.deferred_len == 0 {
                return None;
            }
            let idx = sched.deferred_head;
            let entry = sched.deferred[idx].take();
            sched.deferred_head = (sched.deferred_head + 1) % MAX_DEFERRED_WAKE_SLOTS;
            sched.deferred_len -= 1;
            entry
        });
        match next {
            Some(DeferredWake { futex, all }) => {
                let _ = crate::futex::wake(futex, all);
            }
            None => break,
        }
    }
}

pub fn is_enabled() -> bool {
    with_scheduler(|sched| sched.enabled)
}

/// Whether any task besides the idle tasks (flagged
/// `TaskFlags::IGNORE_FOR_VIABILITY`) is still alive, in any queue. `false`
/// means the next `select_next` call that would otherwise park in idle
/// instead unwinds to the scheduler's captured entry frame.
pub fn is_viable() -> bool {
    crate::task::any_viable_task_exists()
}

/// Remove `task` from the ready band it's linked in. Used by the futex
/// algorithm when a wait races a wake.
pub(crate) fn remove_from_ready(task: *mut Task) -> bool {
    with_scheduler(|sched| sched.remove_ready(task))
}

pub(crate) fn push_to_ready(task: *mut Task) {
    with_scheduler(|sched| sched.push_ready(task));
}

pub(crate) fn timer_arm(task: *mut Task, ticks: u32) {
    with_scheduler(|sched| {
        unsafe {
            (*task).timer_expiry = sched.tick + ticks as u64;
        }
        sched.timer_insert(task);
    });
}

pub(crate) fn timer_disarm(task: *mut Task) {
    with_scheduler(|sched| sched.timer_remove(task));
}

pub(crate) fn set_blocked_and_dispatch(task: *mut Task) {
    let core = this_core();
    with_scheduler(|sched| {
        unsafe { (*task).state = TaskState::Blocked };
        sched.reschedule_pending[core as usize] = true;
    });
    request_dispatch(core);
}

pub fn init() {
    let idle_fn: extern "C" fn(*mut c_void) = idle_entry;
    for core in 0..MAX_CORES as u8 {
        static mut IDLE_STACKS: [[u32; 64]; MAX_CORES] = [[0; 64]; MAX_CORES];
        let stack: &'static mut [u32] =
            unsafe { &mut *(&raw mut IDLE_STACKS[core as usize]) };
        let name = if core == 0 { "idle0" } else { "idle1" };
        match crate::task::task_create(
            name,
            idle_fn,
            ptr::null_mut(),
            stack,
            (NUM_PRIORITY_LEVELS - 1) as u8,
            TaskFlags::SYSTEM | TaskFlags::IGNORE_FOR_VIABILITY,
            CoreAffinity::Core(core),
        ) {
            Ok(task) => with_scheduler(|sched| {
                sched.remove_ready(task);
                sched.idle_task[core as usize] = task;
            }),
            Err(_) => klog_info!("scheduler: failed to create idle task for core {}", core),
        }

        static mut ENTRY_FRAMES: [TaskContext; MAX_CORES] = [TaskContext::zero(); MAX_CORES];
        static mut ENTRY_STACKS: [[u32; 64]; MAX_CORES] = [[0; 64]; MAX_CORES];
        let entry_stack: &'static mut [u32] =
            unsafe { &mut *(&raw mut ENTRY_STACKS[core as usize]) };
        let ctx = crate::task::build_standalone_context(
            entry_stack,
            viability_lost_entry,
            ptr::null_mut(),
        );
        let slot: &'static mut TaskContext = unsafe { &mut *(&raw mut ENTRY_FRAMES[core as usize]) };
        *slot = ctx;
        with_scheduler(|sched| sched.initial_frame[core as usize] = slot as *mut TaskContext);
    }
    with_scheduler(|sched| sched.enabled = true);
}

extern "C" fn idle_entry(_: *mut c_void) {
    loop {
        platform::irq().wait_for_event();
    }
}

/// Where `select_next` switches a core to once
/// [`crate::task::any_viable_task_exists`] goes false. There is no literal
/// call-stack frame to unwind to on this architecture (boot runs on MSP,
/// never on PSP, before the first dispatch) — this is a synthesized
/// resumption point standing in for "the caller of `run()`", matching the
/// data model's intent (scheduling stops, the core parks) without claiming
/// to return execution to `rtos-boot`'s own stack.
extern "C" fn viability_lost_entry(_: *mut c_void) {
    loop {
        platform::irq().wait_for_event();
    }
}
