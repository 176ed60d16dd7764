//! Board-specific glue for a dual-core Cortex-M0+ target: the vector
//! table's exception handlers, the concrete `rtos_abi::sched_traits`
//! implementations against SIO/NVIC/SCB, the one hand-written
//! context-switch routine, and primary/secondary-core bring-up.
//!
//! Everything here is the "HOW" half of the split described in
//! `rtos-core`'s crate docs: this crate touches real registers and
//! assembly so `rtos-core` never has to.

#![no_std]

pub mod context_switch;
pub mod fifo;
pub mod hwlock;
pub mod init;
pub mod irq;
pub mod panic;
pub mod secondary_boot;
pub mod shutdown;
pub mod sio;
pub mod vectors;

pub use init::{kernel_boot_primary, rtos_core1_main};
