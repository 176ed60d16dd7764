//! Raw access to the RP2040 SIO (single-cycle I/O) block: the inter-core
//! FIFOs, the hardware spinlocks, and `CPUID`. No PAC crate in the pack
//! covers this block with a stable API, so it is addressed directly by
//! offset, the way the teacher's drivers address its own MMIO blocks.

use core::ptr::{read_volatile, write_volatile};

const SIO_BASE: u32 = 0xD000_0000;
const CPUID_OFFSET: u32 = 0x000;
const FIFO_ST_OFFSET: u32 = 0x050;
const FIFO_WR_OFFSET: u32 = 0x054;
const FIFO_RD_OFFSET: u32 = 0x058;
const SPINLOCK0_OFFSET: u32 = 0x100;

const FIFO_ST_VLD: u32 = 1 << 0;
const FIFO_ST_RDY: u32 = 1 << 1;
const FIFO_ST_WOF: u32 = 1 << 2;
const FIFO_ST_ROE: u32 = 1 << 3;

#[inline(always)]
fn reg(offset: u32) -> *mut u32 {
    (SIO_BASE + offset) as *mut u32
}

/// 0 or 1, whichever core is executing this call.
pub fn cpuid() -> u32 {
    unsafe { read_volatile(reg(CPUID_OFFSET)) }
}

pub fn fifo_has_send_space() -> bool {
    unsafe { read_volatile(reg(FIFO_ST_OFFSET)) & FIFO_ST_RDY != 0 }
}

pub fn fifo_has_data() -> bool {
    unsafe { read_volatile(reg(FIFO_ST_OFFSET)) & FIFO_ST_VLD != 0 }
}

pub fn fifo_write(value: u32) {
    unsafe { write_volatile(reg(FIFO_WR_OFFSET), value) };
    cortex_m::asm::sev();
}

pub fn fifo_read() -> u32 {
    unsafe { read_volatile(reg(FIFO_RD_OFFSET)) }
}

pub fn fifo_clear_errors() {
    unsafe { write_volatile(reg(FIFO_ST_OFFSET), FIFO_ST_WOF | FIFO_ST_ROE) };
}

fn spinlock_reg(index: usize) -> *mut u32 {
    reg(SPINLOCK0_OFFSET + 4 * index as u32)
}

/// Reading a spinlock register claims it if it was free (non-zero result);
/// writing any value to it releases it.
pub fn spinlock_try_acquire(index: usize) -> bool {
    unsafe { read_volatile(spinlock_reg(index)) != 0 }
}

pub fn spinlock_release(index: usize) {
    unsafe { write_volatile(spinlock_reg(index), 1) };
}
