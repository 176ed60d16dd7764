//! Built-in test suites for the kernel: scheduler, futex, and cross-core
//! messaging, run against the mock platform in [`mock_platform`] rather
//! than real hardware. Gated behind the `builtin-tests` feature so a
//! release build never links them in.
//!
//! `SUITE_CMSIS` runs `cmsis_tests`, exercising the CMSIS-RTOS v2 adapter
//! over this same mock platform.

#![no_std]

pub mod cmsis_tests;
pub mod fixtures;
pub mod futex_tests;
pub mod mock_platform;
pub mod scheduler_tests;
pub mod smp_tests;

use rtos_lib::klog_info;
use rtos_lib::testing::suite_masks::{SUITE_CMSIS, SUITE_FUTEX, SUITE_SCHEDULER, SUITE_SMP};
use rtos_lib::testing::SuiteResults;

#[derive(Clone, Copy, Default)]
pub struct TestRunSummary {
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
}

impl TestRunSummary {
    fn add(&mut self, r: &SuiteResults) {
        self.total += r.total;
        self.passed += r.passed;
        self.failed += r.failed + r.panicked;
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Run whichever suites are set in `mask` (an OR of `SUITE_*` constants
/// from `rtos_lib::testing::suite_masks`) and return the combined tally.
pub fn run_selected(mask: u32) -> TestRunSummary {
    let mut summary = TestRunSummary::default();

    if mask & SUITE_SCHEDULER != 0 {
        summary.add(&scheduler_tests::run());
    }
    if mask & SUITE_FUTEX != 0 {
        summary.add(&futex_tests::run());
    }
    if mask & SUITE_SMP != 0 {
        summary.add(&smp_tests::run());
    }
    if mask & SUITE_CMSIS != 0 {
        summary.add(&cmsis_tests::run());
    }

    klog_info!(
        "rtos-tests: {}/{} passed across selected suites",
        summary.passed,
        summary.total
    );
    summary
}

pub fn run_all() -> TestRunSummary {
    run_selected(SUITE_SCHEDULER | SUITE_FUTEX | SUITE_SMP | SUITE_CMSIS)
}
