//! Task data model shared between the scheduler, the CMSIS adapter, and the
//! boot glue.
//!
//! `TaskContext` and `Task` are `#[repr(C)]` so a context switch written in
//! assembly (see `rtos-boot`) can address their fields by a fixed offset.
//! This crate only describes the shape; `rtos-core` owns the storage pool
//! and all pointer traffic.

use core::ptr;

// =============================================================================
// Task Configuration Constants
// =============================================================================

pub const MAX_TASKS: usize = 32;
pub const TASK_NAME_MAX_LEN: usize = 16;
pub const INVALID_TASK_ID: u32 = 0xFFFF_FFFF;

// =============================================================================
// Task scheduling state
// =============================================================================

/// Scheduling state of a task, per the state machine in the component design.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TaskState {
    #[default]
    Invalid = 0,
    Ready = 1,
    Running = 2,
    /// Blocked on a futex wait.
    Blocked = 3,
    /// Blocked on `sleep(ticks)`, also linked into the timer list.
    Sleeping = 4,
    /// Blocked on `suspend`, not linked into the timer list.
    Suspended = 5,
    Terminated = 6,
}

impl TaskState {
    pub const fn is_queued(self) -> bool {
        matches!(
            self,
            TaskState::Ready | TaskState::Sleeping | TaskState::Suspended
        )
    }
}

bitflags::bitflags! {
    /// Monotonic per-task flags. `StackCheckEnabled` and `IgnoreForViability`
    /// are the two named in the data model; the mode bits distinguish the
    /// handful of task classes the kernel itself creates (idle, reaper).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct TaskFlags: u16 {
        const STACK_CHECK_ENABLED  = 0x0001;
        const IGNORE_FOR_VIABILITY = 0x0002;
        const SYSTEM               = 0x0004;
        const JOINABLE             = 0x0008;
    }
}

/// Either "any core" or a specific core index. Cortex-M0+ here means core 0
/// or core 1; `Any` lets the dispatcher place the task on whichever core
/// goes idle first.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoreAffinity {
    Any,
    Core(u8),
}

impl CoreAffinity {
    #[inline]
    pub const fn matches(self, core: u8) -> bool {
        match self {
            CoreAffinity::Any => true,
            CoreAffinity::Core(c) => c == core,
        }
    }
}

// =============================================================================
// TaskContext - CPU register state for context switching
// =============================================================================

/// Saved Cortex-M0+ register state for a task not currently running.
///
/// Hardware automatically stacks `{r0-r3, r12, lr, pc, xpsr}` on exception
/// entry/exit; the context-switch path in `rtos-boot` additionally saves
/// `{r4-r11}` by hand, which is all this struct needs to hold. `psp` is the
/// saved Process Stack Pointer: the single value a context switch has to
/// swap to resume a task.
#[repr(C)]
#[derive(Clone, Copy, Default)]
pub struct TaskContext {
    pub psp: u32,
    pub r4: u32,
    pub r5: u32,
    pub r6: u32,
    pub r7: u32,
    pub r8: u32,
    pub r9: u32,
    pub r10: u32,
    pub r11: u32,
    pub exc_return: u32,
}

impl TaskContext {
    pub const fn zero() -> Self {
        Self {
            psp: 0,
            r4: 0,
            r5: 0,
            r6: 0,
            r7: 0,
            r8: 0,
            r9: 0,
            r10: 0,
            r11: 0,
            exc_return: 0,
        }
    }
}

// =============================================================================
// Task exit/fault reasons
// =============================================================================

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TaskExitReason {
    #[default]
    None = 0,
    Normal = 1,
    StackOverflow = 2,
    Killed = 3,
}

/// Record of a terminated task, kept around for `join` until the task is
/// reaped (detached) or collected (joinable).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct TaskExitRecord {
    pub task_id: u32,
    pub exit_reason: TaskExitReason,
    pub exit_code: i32,
}

impl TaskExitRecord {
    pub const fn empty() -> Self {
        Self {
            task_id: INVALID_TASK_ID,
            exit_reason: TaskExitReason::None,
            exit_code: 0,
        }
    }
}

// =============================================================================
// Task control block
// =============================================================================

/// A task control block.
///
/// Addressed by stable handle: the control block's index in the fixed
/// `MAX_TASKS`-sized pool doubles as its task id (see the "cyclic
/// references" design note — there is no heap here to allocate one from).
/// `next_ready`, `next_timer`, and `next_waiter` are intrusive singly-linked
/// list pointers; a task is a member of at most one of {ready/sleep/
/// suspended queue} and at most one of {timer list, futex waiter queue} at
/// a time, matching the queue-disjointness invariant.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Task {
    pub task_id: u32,
    pub name: [u8; TASK_NAME_MAX_LEN],
    pub state: TaskState,
    pub base_priority: u8,
    pub current_priority: u8,
    pub flags: TaskFlags,
    pub affinity: CoreAffinity,
    pub last_core: u8,

    pub context: TaskContext,

    /// Low end of the task's stack, for the overflow sentinel check.
    pub stack_low: *mut u32,
    pub stack_size: usize,

    /// Per-task slice counter, decremented once per tick while RUNNING.
    pub slice_remaining: u32,

    /// Absolute jiffies at which a sleep/wait timeout expires. Meaningless
    /// unless the task is linked into the timer list.
    pub timer_expiry: u64,

    pub total_runtime: u64,
    pub yield_count: u32,
    pub context_switch_count: u64,

    /// TLS block for this task, installed by the scheduler switch hook.
    pub tls: *mut u8,

    pub exit_record: TaskExitRecord,

    /// Structural marker for corruption detection; must equal
    /// `TASK_MARKER` for the whole lifetime of a live task.
    pub marker: u32,

    pub next_ready: *mut Task,
    pub next_timer: *mut Task,
    pub next_waiter: *mut Task,

    /// Head of the list of futexes this task currently owns, threaded
    /// through `Futex::next_owned`. Used to unwind priority inheritance and
    /// to release robust mutexes on termination.
    pub owned_futexes: *mut core::ffi::c_void,
}

pub const TASK_MARKER: u32 = 0x5441_534B; // "TASK"

impl Task {
    pub const fn invalid() -> Self {
        Self {
            task_id: INVALID_TASK_ID,
            name: [0; TASK_NAME_MAX_LEN],
            state: TaskState::Invalid,
            base_priority: (NUM_PRIORITY_LEVELS_CONST - 1) as u8,
            current_priority: (NUM_PRIORITY_LEVELS_CONST - 1) as u8,
            flags: TaskFlags::empty(),
            affinity: CoreAffinity::Any,
            last_core: 0,
            context: TaskContext::zero(),
            stack_low: ptr::null_mut(),
            stack_size: 0,
            slice_remaining: 0,
            timer_expiry: u64::MAX,
            total_runtime: 0,
            yield_count: 0,
            context_switch_count: 0,
            tls: ptr::null_mut(),
            exit_record: TaskExitRecord::empty(),
            marker: 0,
            next_ready: ptr::null_mut(),
            next_timer: ptr::null_mut(),
            next_waiter: ptr::null_mut(),
            owned_futexes: ptr::null_mut(),
        }
    }
}

// Mirrors `crate::config::NUM_PRIORITY_LEVELS` without creating a module
// cycle at const-eval time inside this file's `const fn`.
const NUM_PRIORITY_LEVELS_CONST: usize = crate::config::NUM_PRIORITY_LEVELS;
