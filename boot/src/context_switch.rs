//! The only hand-written assembly in the whole workspace: the PendSV tail
//! that actually swaps `{r4-r11, psp}` between two [`TaskContext`]s. Every
//! other register (`r0-r3, r12, lr, pc, xpsr`) is stacked and unstacked by
//! hardware on exception entry/exit, exactly as the comment on
//! `TaskContext` describes.
//!
//! Cortex-M0+'s Thumb-1 instruction set can only `ldr`/`str` through low
//! registers (`r0-r7`), so `r8-r11` are shuttled through a scratch low
//! register one at a time rather than loaded/stored directly.

use core::arch::naked_asm;

use rtos_abi::task::TaskContext;

/// Save the running task's callee-saved registers into `*old_ctx` (skipped
/// if null, meaning there was no previous task) and load `*new_ctx` into
/// the CPU, including `psp` and the `EXC_RETURN` value used to return from
/// this exception. Called with `r0 = old_ctx`, `r1 = new_ctx` per the
/// `extern "C"` calling convention — never call this directly from Rust.
#[unsafe(naked)]
pub unsafe extern "C" fn switch_context(old_ctx: *mut TaskContext, new_ctx: *const TaskContext) {
    naked_asm!(
        "cmp r0, #0",
        "beq 1f",
        "mrs r3, psp",
        "str r3, [r0, #0]",
        "str r4, [r0, #4]",
        "str r5, [r0, #8]",
        "str r6, [r0, #12]",
        "str r7, [r0, #16]",
        "mov r3, r8",
        "str r3, [r0, #20]",
        "mov r3, r9",
        "str r3, [r0, #24]",
        "mov r3, r10",
        "str r3, [r0, #28]",
        "mov r3, r11",
        "str r3, [r0, #32]",
        "1:",
        "ldr r3, [r1, #20]",
        "mov r8, r3",
        "ldr r3, [r1, #24]",
        "mov r9, r3",
        "ldr r3, [r1, #28]",
        "mov r10, r3",
        "ldr r3, [r1, #32]",
        "mov r11, r3",
        "ldr r4, [r1, #4]",
        "ldr r5, [r1, #8]",
        "ldr r6, [r1, #12]",
        "ldr r7, [r1, #16]",
        "ldr r3, [r1, #0]",
        "msr psp, r3",
        "ldr r3, [r1, #36]",
        "mov lr, r3",
        "bx lr",
    );
}
