//! `TestFixture` impls backing the `FixtureKind`s declared in
//! `rtos_lib::testing`.

use rtos_lib::testing::{FixtureKind, TestFixture};

use crate::mock_platform;

fn ensure_platform() {
    mock_platform::install();
}

/// Brings up the scheduler (task pool + ready queues + idle tasks) against
/// the mock platform. Cheap enough to redo per test since `scheduler::init`
/// is itself idempotent about idle-task creation only running once — tests
/// that need a clean ready queue should drain it themselves.
pub struct SchedulerFixture;

impl TestFixture for SchedulerFixture {
    const KIND: FixtureKind = FixtureKind::Scheduler;

    fn setup() -> Result<Self, &'static str> {
        ensure_platform();
        rtos_core::scheduler_init();
        Ok(Self)
    }

    fn teardown(&mut self) {}
}

impl Drop for SchedulerFixture {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Scheduler plus a scratch futex word tests can wait/wake on.
pub struct FutexFixture {
    pub word: &'static core::sync::atomic::AtomicU32,
}

static SCRATCH_WORD: core::sync::atomic::AtomicU32 = core::sync::atomic::AtomicU32::new(0);

impl TestFixture for FutexFixture {
    const KIND: FixtureKind = FixtureKind::Futex;

    fn setup() -> Result<Self, &'static str> {
        ensure_platform();
        rtos_core::scheduler_init();
        SCRATCH_WORD.store(0, core::sync::atomic::Ordering::SeqCst);
        Ok(Self {
            word: &SCRATCH_WORD,
        })
    }

    fn teardown(&mut self) {}
}

impl Drop for FutexFixture {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Scheduler plus the loopback FIFO pair, for exercising
/// `rtos_core::smp` without a second core.
pub struct SmpFixture;

impl TestFixture for SmpFixture {
    const KIND: FixtureKind = FixtureKind::Smp;

    fn setup() -> Result<Self, &'static str> {
        ensure_platform();
        rtos_core::scheduler_init();
        Ok(Self)
    }

    fn teardown(&mut self) {}
}

impl Drop for SmpFixture {
    fn drop(&mut self) {
        self.teardown();
    }
}
