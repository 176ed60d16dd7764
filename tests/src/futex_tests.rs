//! Futex suite: the non-blocking edges of wait/wake and the address
//! registry. Actually blocking on a futex needs a second execution context
//! to wake it, which the mock platform doesn't provide — those paths are
//! exercised on target instead (see `rtos_core::futex`'s doc comments for
//! the full wait/wake contract).

use rtos_abi::futex::FutexFlags;
use rtos_abi::KernelError;
use rtos_core::Futex;
use rtos_lib::testing::TestResult;
use rtos_lib::{fail, pass, test_suite};

use crate::fixtures::FutexFixture;

fn test_wait_returns_busy_on_mismatch() -> TestResult {
    let fx = match FutexFixture::setup() {
        Ok(fx) => fx,
        Err(e) => return fail!("fixture setup failed: {}", e),
    };

    let mut futex = Futex::new(fx.word, FutexFlags::empty());
    rtos_core::futex::register(&mut futex);

    match rtos_core::futex::wait(&mut futex, 0xDEAD_BEEF, 1) {
        Err(KernelError::Busy) => {
            rtos_core::futex::unregister(&mut futex);
            pass!()
        }
        other => {
            rtos_core::futex::unregister(&mut futex);
            fail!("expected Busy, got {:?}", other)
        }
    }
}

fn test_wait_polls_without_blocking_on_zero_ticks() -> TestResult {
    let fx = match FutexFixture::setup() {
        Ok(fx) => fx,
        Err(e) => return fail!("fixture setup failed: {}", e),
    };

    let mut futex = Futex::new(fx.word, FutexFlags::empty());
    rtos_core::futex::register(&mut futex);

    // A ticks==0 wait must report Busy immediately, exactly like a
    // mismatched expected value, and never enqueue the caller.
    let result = rtos_core::futex::wait(&mut futex, fx.word.load(core::sync::atomic::Ordering::Relaxed), 0);
    rtos_core::futex::unregister(&mut futex);

    match result {
        Err(KernelError::Busy) => pass!(),
        other => fail!("expected Busy for ticks == 0, got {:?}", other),
    }
}

fn test_wake_with_no_waiters_is_zero() -> TestResult {
    let fx = match FutexFixture::setup() {
        Ok(fx) => fx,
        Err(e) => return fail!("fixture setup failed: {}", e),
    };

    let mut futex = Futex::new(fx.word, FutexFlags::empty());
    match rtos_core::futex::wake(&mut futex, true) {
        Ok(0) => pass!(),
        Ok(n) => fail!("expected 0 woken, got {}", n),
        Err(e) => fail!("wake failed: {:?}", e),
    }
}

fn test_register_lookup_roundtrip() -> TestResult {
    let fx = match FutexFixture::setup() {
        Ok(fx) => fx,
        Err(e) => return fail!("fixture setup failed: {}", e),
    };

    let mut futex = Futex::new(fx.word, FutexFlags::empty());
    let ptr: *mut Futex = &mut futex;
    rtos_core::futex::register(ptr);

    let word_addr = fx.word as *const core::sync::atomic::AtomicU32 as *const u32;
    let found = rtos_core::futex::lookup(word_addr);
    rtos_core::futex::unregister(ptr);

    match found {
        Some(f) if f == ptr => pass!(),
        Some(_) => fail!("lookup returned a different futex"),
        None => fail!("lookup found nothing"),
    }
}

test_suite!(
    futex_suite,
    [
        test_wait_returns_busy_on_mismatch,
        test_wait_polls_without_blocking_on_zero_ticks,
        test_wake_with_no_waiters_is_zero,
        test_register_lookup_roundtrip,
    ]
);

pub fn run() -> rtos_lib::testing::SuiteResults {
    futex_suite()
}
