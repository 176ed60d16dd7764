//! Kernel-wide ABI types for the RTOS micro-kernel.
//!
//! This crate provides the canonical definitions shared by every other
//! crate in the workspace: task/futex data shapes, the cross-core wire
//! format, error codes, and the trait seams that let `rtos-core` depend
//! only on abstract host services instead of on `rtos-boot` directly.
//!
//! All data types are `#[repr(C)]` so their layout is stable across the
//! supervisor-call and cross-core-message boundaries. This crate contains
//! no unsafe code: it only describes shapes and constants, it never
//! dereferences them.

#![no_std]
#![forbid(unsafe_code)]

pub mod arch;
pub mod config;
pub mod error;
pub mod futex;
pub mod ipc;
pub mod sched_traits;
pub mod task;

pub use config::*;
pub use error::*;
pub use futex::*;
pub use ipc::*;
pub use sched_traits::*;
pub use task::*;
