//! Compile-time configuration constants.
//!
//! A `no_std`/`no_main` kernel has no parsing step, so configuration is a
//! fixed set of constants rather than a runtime object. Per-subsystem
//! constants (task pool size, stack minimums) live next to the subsystem
//! that owns them; the constants here are the ones shared across crate
//! boundaries (core, cmsis, boot all need to agree on them).

/// Number of cores this kernel schedules across. Fixed at two for the
/// targeted dual-core Cortex-M0+ class device.
pub const MAX_CORES: usize = 2;

/// Number of distinct task priority levels, 0 (highest) through 31 (lowest).
pub const NUM_PRIORITY_LEVELS: usize = 32;

/// Default architectural tick frequency, in Hz.
pub const TICK_HZ: u32 = 1000;

/// Default per-task time slice, expressed in ticks.
pub const SCHEDULER_TIME_SLICE: u32 = 10;

/// Sentinel meaning "wait forever" for any tick-denominated timeout.
pub const WAIT_FOREVER: u32 = u32::MAX;

/// Number of hardware test-and-clear spinlock cells the platform exposes.
pub const HW_SPINLOCK_COUNT: usize = 32;

/// The hardware spinlock reserved for the kernel's own big lock.
pub const BIG_LOCK_HW_INDEX: usize = 0;

/// Capacity of the deferred-wake ring used by `futex_wake` called from
/// interrupt context. Exhaustion returns `NoSpace`.
pub const MAX_DEFERRED_WAKE_SLOTS: usize = 8;

/// Bound on priority-inheritance propagation depth: how many "waits on a
/// task that waits on a task that ..." hops a wake will walk before
/// stopping. See DESIGN.md for why this is bounded rather than unbounded.
pub const MAX_FUTEX_PI_DEPTH: usize = 4;

/// Size, in bytes, of one core's core-local-storage (CLS) region.
pub const CLS_REGION_SIZE: usize = 256;
