//! The platform-independent kernel: task pool, scheduler, futex layer, and
//! cross-core messaging.
//!
//! This crate owns no hardware registers and no assembly. Everything it
//! needs from the board — interrupt control, the cross-core FIFO, the
//! hardware spinlock cells, the secondary-core boot handshake, and the
//! actual context-switch register save/restore — is reached through the
//! trait seams in `rtos_abi::sched_traits` (registered via
//! [`platform`]) or handed back as plain data (`scheduler::SwitchDecision`)
//! for `rtos-boot` to act on. That split is what lets this crate be tested
//! off-target.

#![no_std]

pub mod atomic;
pub mod cls;
pub mod futex;
pub mod platform;
pub mod scheduler;
pub mod smp;
pub mod svc_dispatch;
pub mod task;
pub mod tls;

pub use futex::Futex;
pub use scheduler::{current_task, init as scheduler_init, on_tick, select_next, SwitchDecision};
pub use svc_dispatch::dispatch as svc_dispatch;
pub use task::{task_create, task_get, task_reap};
