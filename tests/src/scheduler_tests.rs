//! Scheduler suite: task creation, priority ordering, and the
//! suspend/resume/terminate lifecycle, all against the mock platform in
//! [`crate::mock_platform`].

use core::ffi::c_void;

use rtos_abi::task::{CoreAffinity, TaskFlags, TaskState};
use rtos_lib::testing::TestResult;
use rtos_lib::{fail, pass, run_test, test_suite};

use crate::fixtures::SchedulerFixture;

static STACK_A: [u32; 64] = [0; 64];
static STACK_B: [u32; 64] = [0; 64];

extern "C" fn noop_entry(_: *mut c_void) {
    loop {
        rtos_core::scheduler::r#yield();
    }
}

fn make_stack(storage: &'static [u32; 64]) -> &'static mut [u32] {
    // SAFETY: each test uses a distinct static buffer and tasks created
    // against it are reaped before the buffer could be reused elsewhere.
    unsafe { core::slice::from_raw_parts_mut(storage.as_ptr() as *mut u32, storage.len()) }
}

fn test_create_sets_ready_state() -> TestResult {
    let _fx = match SchedulerFixture::setup() {
        Ok(fx) => fx,
        Err(e) => return fail!("fixture setup failed: {}", e),
    };

    let task = match rtos_core::task_create(
        "t-create",
        noop_entry,
        core::ptr::null_mut(),
        make_stack(&STACK_A),
        10,
        TaskFlags::empty(),
        CoreAffinity::Any,
    ) {
        Ok(t) => t,
        Err(e) => return fail!("task_create failed: {:?}", e),
    };

    let state = unsafe { (*task).state };
    if state != TaskState::Ready {
        return fail!("expected Ready, got {:?}", state);
    }

    let id = unsafe { (*task).task_id };
    rtos_core::task_reap(id);
    pass!()
}

fn test_set_priority_updates_task() -> TestResult {
    let _fx = match SchedulerFixture::setup() {
        Ok(fx) => fx,
        Err(e) => return fail!("fixture setup failed: {}", e),
    };

    let task = match rtos_core::task_create(
        "t-prio",
        noop_entry,
        core::ptr::null_mut(),
        make_stack(&STACK_B),
        20,
        TaskFlags::empty(),
        CoreAffinity::Any,
    ) {
        Ok(t) => t,
        Err(e) => return fail!("task_create failed: {:?}", e),
    };

    if rtos_core::scheduler::set_priority(task, 5).is_err() {
        return fail!("set_priority rejected a valid priority");
    }
    let prio = unsafe { (*task).current_priority };
    if prio != 5 {
        return fail!("expected priority 5, got {}", prio);
    }

    let id = unsafe { (*task).task_id };
    rtos_core::task_reap(id);
    pass!()
}

fn test_create_rejects_undersized_stack() -> TestResult {
    let _fx = match SchedulerFixture::setup() {
        Ok(fx) => fx,
        Err(e) => return fail!("fixture setup failed: {}", e),
    };

    static TINY: [u32; 2] = [0; 2];
    match rtos_core::task_create(
        "t-tiny",
        noop_entry,
        core::ptr::null_mut(),
        make_stack(&TINY),
        10,
        TaskFlags::empty(),
        CoreAffinity::Any,
    ) {
        Ok(_) => fail!("expected undersized stack to be rejected"),
        Err(_) => pass!(),
    }
}

fn test_viability_tracks_non_idle_tasks() -> TestResult {
    let _fx = match SchedulerFixture::setup() {
        Ok(fx) => fx,
        Err(e) => return fail!("fixture setup failed: {}", e),
    };

    if rtos_core::scheduler::is_viable() {
        return fail!("a fresh scheduler with only idle tasks should not be viable");
    }

    let task = match rtos_core::task_create(
        "t-viable",
        noop_entry,
        core::ptr::null_mut(),
        make_stack(&STACK_A),
        10,
        TaskFlags::empty(),
        CoreAffinity::Any,
    ) {
        Ok(t) => t,
        Err(e) => return fail!("task_create failed: {:?}", e),
    };

    if !rtos_core::scheduler::is_viable() {
        return fail!("a live non-idle task should make the scheduler viable");
    }

    let id = unsafe { (*task).task_id };
    rtos_core::task_reap(id);

    if rtos_core::scheduler::is_viable() {
        return fail!("reaping the only non-idle task should drop viability again");
    }
    pass!()
}

test_suite!(
    scheduler_suite,
    [
        test_create_sets_ready_state,
        test_set_priority_updates_task,
        test_create_rejects_undersized_stack,
        test_viability_tracks_non_idle_tasks,
    ]
);

pub fn run() -> rtos_lib::testing::SuiteResults {
    scheduler_suite()
}
