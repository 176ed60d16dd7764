//! The task pool: allocation, the synthetic initial stack frame, and the
//! stack-overflow / control-block corruption checks described in the task
//! lifecycle (data model §3).
//!
//! Tasks live in a fixed-size static pool (`MAX_TASKS`), never on a heap —
//! there isn't one. A task's index in the pool doubles as its id, and
//! `*mut Task` pointers handed out to the scheduler's intrusive queues stay
//! valid for the process lifetime because the pool itself never moves.

use core::ffi::c_void;
use core::ptr;

use rtos_abi::arch::{EXC_RETURN_THREAD_PSP, MIN_TASK_STACK_BYTES, STACK_SENTINEL, XPSR_THUMB_BIT};
use rtos_abi::task::{
    CoreAffinity, Task, TaskContext, TaskExitReason, TaskExitRecord, TaskFlags, TaskState,
    INVALID_TASK_ID, MAX_TASKS, TASK_MARKER, TASK_NAME_MAX_LEN,
};
use rtos_abi::{KernelError, KernelResult};
use rtos_lib::IrqMutex;

struct TaskPool {
    tasks: [Task; MAX_TASKS],
    used: [bool; MAX_TASKS],
}

// SAFETY: all access to pool contents is serialized through `POOL`'s
// IrqMutex; the raw pointers inside `Task` are only chased while the
// scheduler's own (cross-core) big lock is held.
unsafe impl Send for TaskPool {}

impl TaskPool {
    const fn new() -> Self {
        const INVALID: Task = Task::invalid();
        Self {
            tasks: [INVALID; MAX_TASKS],
            used: [false; MAX_TASKS],
        }
    }
}

static POOL: IrqMutex<TaskPool> = IrqMutex::new(TaskPool::new());

fn copy_name(dst: &mut [u8; TASK_NAME_MAX_LEN], src: &str) {
    let bytes = src.as_bytes();
    let n = bytes.len().min(TASK_NAME_MAX_LEN - 1);
    dst[..n].copy_from_slice(&bytes[..n]);
    dst[n] = 0;
}

/// Build the synthetic exception frame a brand-new task's stack needs so
/// that the first context switch onto it looks exactly like returning from
/// an interrupt taken in `entry`. Returns the initial `psp`.
///
/// `stack` is the task's stack region, low address first; stamps the
/// bottom two words with [`STACK_SENTINEL`] for the overflow check.
fn init_stack(
    stack: &mut [u32],
    entry: extern "C" fn(*mut c_void),
    arg: *mut c_void,
) -> u32 {
    stack[0] = STACK_SENTINEL;
    stack[1] = STACK_SENTINEL;

    let len = stack.len();
    let frame_base = len - 8;
    stack[frame_base] = arg as u32; // r0
    stack[frame_base + 1] = 0; // r1
    stack[frame_base + 2] = 0; // r2
    stack[frame_base + 3] = 0; // r3
    stack[frame_base + 4] = 0; // r12
    stack[frame_base + 5] = task_exit_trampoline as usize as u32; // lr
    stack[frame_base + 6] = (entry as usize as u32) | 1; // pc, thumb bit set
    stack[frame_base + 7] = XPSR_THUMB_BIT; // xpsr

    &stack[frame_base] as *const u32 as u32
}

/// Build a standalone [`TaskContext`] over `stack`, using the same synthetic
/// exception frame as a real task's initial context. Used by
/// `crate::scheduler::init` to give each core a captured "entry frame" to
/// unwind to when no viable task remains — not a task in the pool, just a
/// context a `switch_context` can resume.
pub(crate) fn build_standalone_context(
    stack: &'static mut [u32],
    entry: extern "C" fn(*mut c_void),
    arg: *mut c_void,
) -> TaskContext {
    let psp = init_stack(stack, entry, arg);
    TaskContext {
        psp,
        exc_return: EXC_RETURN_THREAD_PSP,
        ..TaskContext::zero()
    }
}

/// Whether any live task besides the ones flagged
/// [`TaskFlags::IGNORE_FOR_VIABILITY`] (the idle tasks) still exists,
/// regardless of which queue it's currently linked into. Mirrors
/// `scheduler_is_viable()`'s full-pool scan in the original C scheduler.
pub(crate) fn any_viable_task_exists() -> bool {
    let guard = POOL.lock();
    for idx in 0..MAX_TASKS {
        if !guard.used[idx] {
            continue;
        }
        let task = &guard.tasks[idx];
        if task.state == TaskState::Terminated || task.state == TaskState::Invalid {
            continue;
        }
        if task.flags.contains(TaskFlags::IGNORE_FOR_VIABILITY) {
            continue;
        }
        return true;
    }
    false
}

/// Where a task's entry function returns to if it ever returns normally,
/// instead of calling an explicit terminate. Defined here (not in
/// `rtos-boot`) so the address baked into the synthetic frame at creation
/// time is stable regardless of link order.
extern "C" fn task_exit_trampoline() {
    crate::scheduler::terminate_current();
    loop {
        rtos_lib::cpu::wfe();
    }
}

/// Create a new task, queued READY on return.
///
/// `stack` must be at least [`MIN_TASK_STACK_BYTES`]; the caller owns the
/// memory for the task's whole lifetime (reclamation is external, per the
/// lifecycle note in the data model).
pub fn task_create(
    name: &str,
    entry: extern "C" fn(*mut c_void),
    arg: *mut c_void,
    stack: &'static mut [u32],
    priority: u8,
    flags: TaskFlags,
    affinity: CoreAffinity,
) -> KernelResult<*mut Task> {
    if stack.len() * 4 < MIN_TASK_STACK_BYTES {
        return Err(KernelError::InvalidArgument);
    }

    let psp = init_stack(stack, entry, arg);

    let mut guard = POOL.lock();
    let slot = guard
        .used
        .iter()
        .position(|used| !used)
        .ok_or(KernelError::NoSpace)?;
    guard.used[slot] = true;

    let task = &mut guard.tasks[slot];
    *task = Task::invalid();
    task.task_id = slot as u32;
    copy_name(&mut task.name, name);
    task.state = TaskState::Ready;
    task.base_priority = priority;
    task.current_priority = priority;
    task.flags = flags;
    task.affinity = affinity;
    task.last_core = 0;
    task.context = TaskContext {
        psp,
        exc_return: EXC_RETURN_THREAD_PSP,
        ..TaskContext::zero()
    };
    task.stack_low = stack.as_mut_ptr();
    task.stack_size = stack.len() * 4;
    task.slice_remaining = rtos_abi::SCHEDULER_TIME_SLICE;
    task.timer_expiry = u64::MAX;
    task.marker = TASK_MARKER;
    task.tls = crate::tls::alloc_block();

    let ptr: *mut Task = task;
    drop(guard);

    crate::scheduler::enqueue_ready(ptr);
    Ok(ptr)
}

/// Look up a live task by id. Returns `NotFound` for a stale or
/// out-of-range id.
pub fn task_get(task_id: u32) -> KernelResult<*mut Task> {
    if task_id == INVALID_TASK_ID {
        return Err(KernelError::NotFound);
    }
    let idx = task_id as usize;
    let mut guard = POOL.lock();
    if idx >= MAX_TASKS || !guard.used[idx] {
        return Err(KernelError::NotFound);
    }
    let task = &mut guard.tasks[idx];
    if task.marker != TASK_MARKER {
        return Err(KernelError::Corrupted);
    }
    Ok(task as *mut Task)
}

/// Free a terminated task's pool slot for reuse. Only valid once nothing
/// else (join records, scheduler queues) still references it.
pub fn task_reap(task_id: u32) {
    let idx = task_id as usize;
    if idx >= MAX_TASKS {
        return;
    }
    let mut guard = POOL.lock();
    if guard.used[idx] {
        guard.tasks[idx] = Task::invalid();
        guard.used[idx] = false;
    }
}

/// Verify the two sentinel words at the low end of `task`'s stack are
/// intact. Called by the dispatcher on every switch away from a
/// stack-checked task.
///
/// # Safety
/// `task` must point at a live, properly initialized task.
pub unsafe fn check_stack_sentinel(task: *const Task) -> bool {
    if !unsafe { (*task).flags }.contains(TaskFlags::STACK_CHECK_ENABLED) {
        return true;
    }
    let low = unsafe { (*task).stack_low };
    if low.is_null() {
        return true;
    }
    unsafe { ptr::read_volatile(low) == STACK_SENTINEL && ptr::read_volatile(low.add(1)) == STACK_SENTINEL }
}

/// Mark `task`'s termination reason/exit code and flag it TERMINATED. Does
/// not itself remove the task from any scheduler queue — callers do that
/// under the scheduler's big lock before or after calling this.
///
/// # Safety
/// `task` must point at a live task.
pub unsafe fn mark_terminated(task: *mut Task, reason: TaskExitReason, exit_code: i32) {
    unsafe {
        (*task).state = TaskState::Terminated;
        (*task).exit_record = TaskExitRecord {
            task_id: (*task).task_id,
            exit_reason: reason,
            exit_code,
        };
    }
}
