//! Architectural constants for the dual-core Cortex-M0+ target.
//!
//! Cortex-M0+ has no LDREX/STREX, no BASEPRI, and only two interrupt
//! priority bits; these constants capture the bits of the architecture
//! that the scheduler and SMP runtime need to agree on.

#![allow(dead_code)]

/// `EXC_RETURN` value that returns to Thread mode using the Process Stack
/// Pointer. Written as `lr` in the synthetic frame built for a new task,
/// and as the value a context switch hands back to hardware.
pub const EXC_RETURN_THREAD_PSP: u32 = 0xFFFF_FFFD;

/// Thumb-state bit in the saved `xPSR`. Cortex-M has no ARM state, so this
/// bit must always be set in any synthesized frame or the core will fault.
pub const XPSR_THUMB_BIT: u32 = 1 << 24;

/// `CONTROL.SPSEL` bit: when set, Thread mode uses the Process Stack Pointer
/// rather than the Main Stack Pointer.
pub const CONTROL_SPSEL_BIT: u32 = 1 << 1;

/// IRQ number of the SysTick exception (used as the architectural tick).
pub const IRQ_SYSTICK: i32 = -1;

/// IRQ number of the PendSV exception (the pendable service interrupt used
/// for context switches).
pub const IRQ_PENDSV: i32 = -2;

/// IRQ number of the SVCall exception (the supervisor-call entry point).
pub const IRQ_SVCALL: i32 = -5;

/// IRQ number of the NMI exception. Cross-core messages are delivered as
/// NMI on the receiving core so they cannot be masked by ordinary
/// `cpsid i` critical sections.
pub const IRQ_NMI: i32 = -14;

/// Offset applied to raw cross-core IRQ payloads: the low 16 bits of a
/// cross-core command encode `irq + IRQ_NUMBER_OFFSET` so that negative
/// (system-exception) IRQ numbers survive the unsigned wire format.
pub const IRQ_NUMBER_OFFSET: i32 = 16;

/// Lowest usable NVIC priority value on Cortex-M0+ (2 priority bits: 0, 64,
/// 128, 192). The pendable service interrupt runs at this (lowest) priority
/// so every other interrupt can preempt a context switch in progress.
pub const NVIC_LOWEST_PRIORITY: u8 = 0xC0;

/// Minimum stack, in bytes, a task control block needs beneath the caller's
/// high-water mark: one synthesized exception frame plus two sentinel
/// overflow-check words.
pub const MIN_TASK_STACK_BYTES: usize = 64 + 8;

/// Well-known sentinel value stamped at the low end of a stack-checked
/// task's stack, and re-verified on every dispatch.
pub const STACK_SENTINEL: u32 = 0xDEAD_BEEF;
