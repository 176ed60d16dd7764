//! [`PlatformSecondaryCoreBoot`]: the six-word handshake that wakes core 1
//! out of its boot-ROM idle loop and hands it a vector table, stack
//! pointer, and entry point over the SIO FIFO. Core 1 echoes each word
//! back; a mismatch means it missed a step (usually because it was still
//! finishing a previous, aborted handshake) and the whole sequence must
//! restart from the first word. `rtos-core::smp::boot_secondary_core`
//! owns the retry loop around [`reset_secondary_core`]/
//! [`bootstrap_secondary_core`]; this only runs one attempt.

use rtos_abi::sched_traits::PlatformSecondaryCoreBoot;

use crate::sio;

pub struct SioSecondaryBoot;

pub static SECONDARY_BOOT: SioSecondaryBoot = SioSecondaryBoot;

fn push_blocking(word: u32) {
    while !sio::fifo_has_send_space() {
        cortex_m::asm::nop();
    }
    sio::fifo_write(word);
}

fn pop_blocking() -> u32 {
    while !sio::fifo_has_data() {
        cortex_m::asm::nop();
    }
    sio::fifo_read()
}

impl PlatformSecondaryCoreBoot for SioSecondaryBoot {
    fn reset_secondary_core(&self) {
        // Drain anything left over from a previous, aborted handshake and
        // kick core 1 out of a WFE it may be parked in waiting for the next
        // FIFO word.
        while sio::fifo_has_data() {
            sio::fifo_read();
        }
        sio::fifo_clear_errors();
        cortex_m::asm::sev();
    }

    fn bootstrap_secondary_core(
        &self,
        vector_table: u32,
        stack_pointer: u32,
        entry_point: u32,
    ) -> bool {
        let sequence = [0u32, 0, 1, vector_table, stack_pointer, entry_point];
        for word in sequence {
            push_blocking(word);
            if pop_blocking() != word {
                return false;
            }
        }
        true
    }
}
