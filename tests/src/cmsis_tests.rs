//! CMSIS adapter suite: the non-blocking edges of each primitive
//! (everything reachable with a single task against the mock platform,
//! same constraint [`crate::futex_tests`] documents for the bare futex).

use core::sync::atomic::AtomicU32;

use rtos_abi::KernelError;
use rtos_cmsis::event_flags::{EventFlags, WaitPolicy};
use rtos_cmsis::memory_pool::MemoryPool;
use rtos_cmsis::mutex::{Mutex, MutexFlags};
use rtos_cmsis::once_flag::OnceFlag;
use rtos_cmsis::semaphore::Semaphore;
use rtos_lib::testing::TestResult;
use rtos_lib::{fail, pass, test_suite};

use crate::fixtures::SchedulerFixture;

fn test_mutex_recursive_acquire_release() -> TestResult {
    let _fx = match SchedulerFixture::setup() {
        Ok(fx) => fx,
        Err(e) => return fail!("fixture setup failed: {}", e),
    };

    static WORD: AtomicU32 = AtomicU32::new(0);
    let mut m = Mutex::new(&WORD, MutexFlags::RECURSIVE);

    if m.acquire(0).is_err() {
        return fail!("first acquire should succeed uncontended");
    }
    if m.acquire(0).is_err() {
        return fail!("recursive acquire by the owner should succeed");
    }
    if m.release().is_err() {
        return fail!("first release should succeed");
    }
    if m.owner().is_none() {
        return fail!("mutex should still be held after one of two releases");
    }
    if m.release().is_err() {
        return fail!("second release should succeed");
    }
    if m.owner().is_some() {
        return fail!("mutex should be free after matching releases");
    }
    pass!()
}

fn test_mutex_non_recursive_rejects_reentry() -> TestResult {
    let _fx = match SchedulerFixture::setup() {
        Ok(fx) => fx,
        Err(e) => return fail!("fixture setup failed: {}", e),
    };

    static WORD: AtomicU32 = AtomicU32::new(0);
    let mut m = Mutex::new(&WORD, MutexFlags::empty());

    if m.acquire(0).is_err() {
        return fail!("first acquire should succeed uncontended");
    }
    match m.acquire(0) {
        Err(KernelError::InvalidArgument) => {}
        other => return fail!("expected InvalidArgument on reentry, got {:?}", other),
    }
    let _ = m.release();
    pass!()
}

fn test_semaphore_try_acquire_respects_count() -> TestResult {
    let _fx = match SchedulerFixture::setup() {
        Ok(fx) => fx,
        Err(e) => return fail!("fixture setup failed: {}", e),
    };

    static WORD: AtomicU32 = AtomicU32::new(1);
    let mut s = Semaphore::new_binary(&WORD);

    if s.acquire(0).is_err() {
        return fail!("binary semaphore should start with one token");
    }
    match s.acquire(0) {
        Err(KernelError::Busy) => {}
        other => return fail!("expected Busy once drained, got {:?}", other),
    }
    if s.release().is_err() {
        return fail!("release should return the token");
    }
    if s.count() != 1 {
        return fail!("expected count 1 after release, got {}", s.count());
    }
    pass!()
}

fn test_event_flags_any_and_all() -> TestResult {
    let _fx = match SchedulerFixture::setup() {
        Ok(fx) => fx,
        Err(e) => return fail!("fixture setup failed: {}", e),
    };

    static WORD: AtomicU32 = AtomicU32::new(0);
    let mut ef = EventFlags::new(&WORD);

    let _ = ef.set(0b001);
    match ef.wait(0b011, WaitPolicy::Any, false, 0) {
        Ok(matched) => {
            if matched != 0b001 {
                return fail!("expected matched bit 0b001, got {:#b}", matched);
            }
        }
        Err(e) => return fail!("ANY wait should satisfy on a partial match: {:?}", e),
    }

    match ef.wait(0b011, WaitPolicy::All, false, 0) {
        Err(KernelError::Busy) => {}
        other => return fail!("ALL wait should still be unsatisfied, got {:?}", other),
    }

    let _ = ef.set(0b010);
    match ef.wait(0b011, WaitPolicy::All, true, 0) {
        Ok(matched) if matched == 0b011 => {}
        other => return fail!("ALL wait should now match both bits, got {:?}", other),
    }
    if ef.get() != 0 {
        return fail!("clear_on_wait should have consumed the matched bits");
    }
    pass!()
}

fn test_once_flag_runs_initializer_exactly_once() -> TestResult {
    let _fx = match SchedulerFixture::setup() {
        Ok(fx) => fx,
        Err(e) => return fail!("fixture setup failed: {}", e),
    };

    static FLAG: OnceFlag = OnceFlag::new();
    static RUNS: AtomicU32 = AtomicU32::new(0);

    FLAG.call_once(|| {
        RUNS.fetch_add(1, core::sync::atomic::Ordering::Relaxed);
    });
    FLAG.call_once(|| {
        RUNS.fetch_add(1, core::sync::atomic::Ordering::Relaxed);
    });

    if RUNS.load(core::sync::atomic::Ordering::Relaxed) != 1 {
        return fail!("initializer should run exactly once");
    }
    if !FLAG.is_completed() {
        return fail!("flag should report completed");
    }
    pass!()
}

fn test_memory_pool_alloc_free_cycle() -> TestResult {
    let _fx = match SchedulerFixture::setup() {
        Ok(fx) => fx,
        Err(e) => return fail!("fixture setup failed: {}", e),
    };

    static mut STORAGE: [u8; 64] = [0; 64];
    static SEM_WORD: AtomicU32 = AtomicU32::new(0);

    let storage: &'static mut [u8] = unsafe { &mut *core::ptr::addr_of_mut!(STORAGE) };
    let mut pool = match MemoryPool::new(storage, 16, &SEM_WORD) {
        Ok(p) => p,
        Err(e) => return fail!("pool creation failed: {:?}", e),
    };
    if pool.block_count() != 4 {
        return fail!("expected 4 blocks, got {}", pool.block_count());
    }

    let a = match pool.alloc(0) {
        Ok(p) => p,
        Err(e) => return fail!("alloc should succeed with free blocks: {:?}", e),
    };
    let b = match pool.alloc(0) {
        Ok(p) => p,
        Err(e) => return fail!("second alloc should succeed: {:?}", e),
    };
    if pool.space_available() != 2 {
        return fail!("expected 2 blocks left, got {}", pool.space_available());
    }

    if pool.free(a).is_err() {
        return fail!("freeing a previously allocated block should succeed");
    }
    if pool.free(b).is_err() {
        return fail!("freeing the second block should succeed");
    }
    if pool.space_available() != 4 {
        return fail!("expected all 4 blocks back, got {}", pool.space_available());
    }
    pass!()
}

test_suite!(
    cmsis_suite,
    [
        test_mutex_recursive_acquire_release,
        test_mutex_non_recursive_rejects_reentry,
        test_semaphore_try_acquire_respects_count,
        test_event_flags_any_and_all,
        test_once_flag_runs_initializer_exactly_once,
        test_memory_pool_alloc_free_cycle,
    ]
);

pub fn run() -> rtos_lib::testing::SuiteResults {
    cmsis_suite()
}
