//! Cortex-M0+ core primitives: interrupt masking, wait/signal-event, register reads.
//!
//! `save_flags_cli`/`restore_flags` mirror the old RFLAGS save/cli/restore pattern
//! the lock types use, but over ARMv6-M's single `PRIMASK` bit rather than `IF`.

use core::arch::asm;

use cortex_m::asm as cm_asm;
use cortex_m::interrupt;
use cortex_m::register::primask;

#[inline(always)]
pub fn wfe() {
    cm_asm::wfe();
}

#[inline(always)]
pub fn sev() {
    cm_asm::sev();
}

#[inline(always)]
pub fn nop() {
    cm_asm::nop();
}

#[inline(always)]
pub fn halt_loop() -> ! {
    loop {
        wfe();
    }
}

#[inline(always)]
pub fn enable_interrupts() {
    unsafe {
        interrupt::enable();
    }
}

#[inline(always)]
pub fn disable_interrupts() {
    interrupt::disable();
}

/// Disable interrupts and return the prior `PRIMASK` state packed as the
/// save/restore token the lock guards carry across their critical section.
#[inline(always)]
pub fn save_flags_cli() -> u32 {
    let was_active = primask::read().is_active();
    interrupt::disable();
    was_active as u32
}

/// Restore interrupts to the state `save_flags_cli` observed.
#[inline(always)]
pub fn restore_flags(saved: u32) {
    if saved != 0 {
        unsafe {
            interrupt::enable();
        }
    }
}

#[inline(always)]
pub fn read_primask() -> u32 {
    primask::read().is_active() as u32
}

#[inline(always)]
pub fn read_control() -> u32 {
    let value: u32;
    unsafe {
        asm!("mrs {}, control", out(reg) value, options(nomem, nostack, preserves_flags));
    }
    value
}

#[inline(always)]
pub fn read_msp() -> u32 {
    let value: u32;
    unsafe {
        asm!("mrs {}, msp", out(reg) value, options(nomem, nostack, preserves_flags));
    }
    value
}

#[inline(always)]
pub fn read_psp() -> u32 {
    let value: u32;
    unsafe {
        asm!("mrs {}, psp", out(reg) value, options(nomem, nostack, preserves_flags));
    }
    value
}

/// Read `r7`, the frame-chain register this target's stack walker follows.
#[inline(always)]
pub fn read_frame_pointer() -> u32 {
    let fp: u32;
    unsafe {
        asm!("mov {}, r7", out(reg) fp, options(nomem, nostack, preserves_flags));
    }
    fp
}
