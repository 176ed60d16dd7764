//! SMP suite: cross-core command round-trips through the loopback FIFO
//! pair, since there's no second core in a test build.

use core::sync::atomic::{AtomicBool, Ordering};

use rtos_lib::testing::TestResult;
use rtos_lib::{fail, pass, test_suite};

use crate::fixtures::SmpFixture;

static EVENT_FIRED: AtomicBool = AtomicBool::new(false);

fn mark_event_fired() {
    EVENT_FIRED.store(true, Ordering::SeqCst);
}

static REMOTE_RAN: AtomicBool = AtomicBool::new(false);

extern "C" fn remote_entry() {
    REMOTE_RAN.store(true, Ordering::SeqCst);
}

fn test_event_notify_round_trips_through_loopback() -> TestResult {
    let _fx = match SmpFixture::setup() {
        Ok(fx) => fx,
        Err(e) => return fail!("fixture setup failed: {}", e),
    };

    EVENT_FIRED.store(false, Ordering::SeqCst);
    rtos_core::smp::register_event_handler(0, mark_event_fired);
    rtos_core::smp::notify_event(0);
    rtos_core::smp::handle_incoming();

    if EVENT_FIRED.load(Ordering::SeqCst) {
        pass!()
    } else {
        fail!("event handler did not run after notify_event + handle_incoming")
    }
}

fn test_execute_remote_runs_function_via_loopback() -> TestResult {
    let _fx = match SmpFixture::setup() {
        Ok(fx) => fx,
        Err(e) => return fail!("fixture setup failed: {}", e),
    };

    // Can't go through `smp::execute_remote` (it asserts the target core
    // isn't our own, and the loopback fixture only has one core); push the
    // packet straight onto the FIFO the same way it would.
    REMOTE_RAN.store(false, Ordering::SeqCst);
    let packet = rtos_abi::ipc::encode_execute_command(remote_entry as usize as u32);
    rtos_core::platform::fifo().send(packet);
    rtos_core::smp::handle_incoming();

    if REMOTE_RAN.load(Ordering::SeqCst) {
        pass!()
    } else {
        fail!("remote function did not run after loopback dispatch")
    }
}

fn test_irq_enable_round_trips_locally() -> TestResult {
    let _fx = match SmpFixture::setup() {
        Ok(fx) => fx,
        Err(e) => return fail!("fixture setup failed: {}", e),
    };

    // Same core (0 == 0 on the mock platform), so this should apply
    // directly rather than going over the FIFO at all.
    rtos_core::smp::set_irq_enabled(0, 3, true);
    pass!()
}

test_suite!(
    smp_suite,
    [
        test_event_notify_round_trips_through_loopback,
        test_execute_remote_runs_function_via_loopback,
        test_irq_enable_round_trips_locally,
    ]
);

pub fn run() -> rtos_lib::testing::SuiteResults {
    smp_suite()
}
