//! Test execution and result collection.

use super::{FixtureKind, TestCase, TestResult};
use crate::klog_info;
use crate::time;

#[derive(Clone, Copy, Debug, Default)]
pub struct SuiteResults {
    pub name: &'static str,
    pub total: u32,
    pub passed: u32,
    pub failed: u32,
    pub panicked: u32,
    pub skipped: u32,
    pub elapsed_ms: u32,
}

impl SuiteResults {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.panicked == 0
    }

    pub fn to_tuple(&self) -> (u32, u32) {
        (self.passed, self.total)
    }
}

pub fn run_single_test(
    _name: &str,
    test_fn: fn() -> TestResult,
    _fixture: FixtureKind,
) -> TestResult {
    let result = crate::catch_panic!({ test_fn().to_c_int() });

    if result == 0 {
        TestResult::Pass
    } else {
        TestResult::Fail
    }
}

pub fn run_suite(name: &'static str, tests: &[TestCase]) -> SuiteResults {
    let start = time::ticks();
    let mut results = SuiteResults::new(name);
    results.total = tests.len() as u32;

    for test in tests {
        let result = run_single_test(test.name, test.func, test.fixture);
        match result {
            TestResult::Pass => results.passed += 1,
            TestResult::Fail => results.failed += 1,
            TestResult::Panic => results.panicked += 1,
            TestResult::Skipped => results.skipped += 1,
        }
    }

    let elapsed_ticks = time::ticks().saturating_sub(start);
    results.elapsed_ms = time::ticks_to_ms(elapsed_ticks).min(u32::MAX as u64) as u32;

    klog_info!(
        "SUITE {}: {}/{} passed ({}ms)",
        name,
        results.passed,
        results.total,
        results.elapsed_ms
    );

    results
}
