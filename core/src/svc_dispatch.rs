//! Server side of the supervisor-call surface: `rtos-boot`'s `SVCall`
//! handler unstacks `r7` (syscall number) and `r0-r2` (arguments) from the
//! exception frame and calls [`dispatch`]; this module is the only place
//! that knows how each `SVC_*` number maps onto a `rtos-core` operation.
//! The numbers themselves live in `rtos_lib::svc` so the Thread-mode
//! trampoline and this handler can't drift apart.

use core::ffi::c_void;

use rtos_abi::task::{CoreAffinity, TaskFlags, MAX_TASKS};
use rtos_abi::KernelError;
use rtos_lib::svc::*;

use crate::{scheduler, task};

/// Parameters for `SVC_CREATE_TASK`, too large to fit in three registers.
/// `arg0` of the syscall is a pointer to one of these living in the
/// caller's own (static) memory; it only needs to be valid for the
/// duration of the call.
#[repr(C)]
pub struct TaskCreateParams {
    pub name_ptr: *const u8,
    pub name_len: usize,
    pub entry: extern "C" fn(*mut c_void),
    pub arg: *mut c_void,
    pub stack_ptr: *mut u32,
    pub stack_len: usize,
    pub priority: u8,
    pub flags: u16,
    /// -1 means [`CoreAffinity::Any`]; 0 or 1 pins to that core.
    pub affinity: i16,
}

fn decode_affinity(raw: i16) -> CoreAffinity {
    if raw < 0 {
        CoreAffinity::Any
    } else {
        CoreAffinity::Core(raw as u8)
    }
}

/// Dispatch one supervisor call. Returns the raw `r0` value the SVC
/// trampoline hands back to its caller: `KernelError::as_c_int`-encoded,
/// or (for `SVC_CREATE_TASK` only) a non-negative task id on success.
pub fn dispatch(num: u32, arg0: u32, arg1: u32, arg2: u32) -> i32 {
    match num {
        SVC_CREATE_TASK => create_task(arg0 as *const TaskCreateParams),
        SVC_YIELD => {
            scheduler::r#yield();
            0
        }
        SVC_SLEEP => KernelError::encode(scheduler::sleep(arg0)),
        SVC_SUSPEND => KernelError::encode(suspend_by_id(arg0)),
        SVC_RESUME => KernelError::encode(resume_by_id(arg0)),
        SVC_TERMINATE => KernelError::encode(terminate_by_id(arg0)),
        SVC_SET_PRIORITY => KernelError::encode(set_priority_by_id(arg0, arg1 as u8)),
        SVC_FUTEX_WAIT => futex_wait(arg0, arg1, arg2),
        SVC_FUTEX_WAKE => futex_wake(arg0, arg1 != 0),
        _ => KernelError::InvalidArgument.as_c_int(),
    }
}

fn create_task(params: *const TaskCreateParams) -> i32 {
    if params.is_null() {
        return KernelError::InvalidArgument.as_c_int();
    }
    let p = unsafe { &*params };
    if p.name_len == 0 || p.stack_ptr.is_null() {
        return KernelError::InvalidArgument.as_c_int();
    }
    let name_bytes = unsafe { core::slice::from_raw_parts(p.name_ptr, p.name_len) };
    let Ok(name) = core::str::from_utf8(name_bytes) else {
        return KernelError::InvalidArgument.as_c_int();
    };
    // SAFETY: the caller (a task, never reclaimed once created) guarantees
    // the backing memory outlives the task; there is no heap to copy it
    // into, matching the task lifecycle's "caller owns the stack" note.
    let stack: &'static mut [u32] =
        unsafe { core::slice::from_raw_parts_mut(p.stack_ptr, p.stack_len) };
    let flags = TaskFlags::from_bits_truncate(p.flags);
    let affinity = decode_affinity(p.affinity);
    match task::task_create(name, p.entry, p.arg, stack, p.priority, flags, affinity) {
        Ok(t) => unsafe { (*t).task_id as i32 },
        Err(e) => e.as_c_int(),
    }
}

fn suspend_by_id(task_id: u32) -> Result<(), KernelError> {
    if task_id as usize >= MAX_TASKS {
        return scheduler::suspend(None);
    }
    scheduler::suspend(Some(task::task_get(task_id)?))
}

fn resume_by_id(task_id: u32) -> Result<(), KernelError> {
    scheduler::resume(task::task_get(task_id)?)
}

fn terminate_by_id(task_id: u32) -> Result<(), KernelError> {
    if task_id as usize >= MAX_TASKS {
        return scheduler::terminate(None);
    }
    scheduler::terminate(Some(task::task_get(task_id)?))
}

fn set_priority_by_id(task_id: u32, priority: u8) -> Result<(), KernelError> {
    scheduler::set_priority(task::task_get(task_id)?, priority)
}

/// `arg0` is the futex word's address, `arg1` the expected value, `arg2`
/// the timeout in ticks (0 = poll, don't block; `WAIT_FOREVER` = block
/// indefinitely). The futex control block itself is looked up through
/// `crate::futex`'s registry by address, since the SVC ABI only has room to
/// pass the word, not the `Futex` struct.
fn futex_wait(word_addr: u32, expected: u32, ticks: u32) -> i32 {
    if ticks == 0 {
        return KernelError::Busy.as_c_int();
    }
    match crate::futex::lookup(word_addr as *const u32) {
        Some(futex) => KernelError::encode(crate::futex::wait(futex, expected, ticks)),
        None => KernelError::NotFound.as_c_int(),
    }
}

fn futex_wake(word_addr: u32, all: bool) -> i32 {
    match crate::futex::lookup(word_addr as *const u32) {
        Some(futex) => match crate::futex::wake(futex, all) {
            Ok(n) => n as i32,
            Err(e) => e.as_c_int(),
        },
        None => KernelError::NotFound.as_c_int(),
    }
}
