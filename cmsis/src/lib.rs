//! CMSIS-RTOS v2 adapter over `rtos-core`'s scheduler, futex, and task
//! layers.
//!
//! Every primitive here is a thin, `'static`-object-oriented wrapper: the
//! caller owns the storage (a `static` lock word, a `static` stack slice,
//! a `static` backing array), construction just describes how to
//! interpret it, and the first mutating call lazily registers any futex
//! involved — mirroring the static, no-heap-by-default posture of
//! `rtos-core` and `rtos-lib` themselves. See `mutex.rs` for the fuller
//! rationale on the lazy-registration and cross-core-CAS patterns reused
//! throughout this crate.

#![no_std]

pub mod deque;
pub mod event_flags;
pub mod kernel;
pub mod memory_pool;
pub mod message_queue;
pub mod mutex;
pub mod once_flag;
pub mod semaphore;
pub mod thread;
pub mod timer;

pub use deque::Deque;
pub use event_flags::{EventFlags, WaitPolicy};
pub use memory_pool::MemoryPool;
pub use message_queue::MessageQueue;
pub use mutex::{Mutex, MutexFlags};
pub use once_flag::OnceFlag;
pub use semaphore::Semaphore;
pub use thread::{Thread, ThreadFunc};
pub use timer::{Timer, TimerCallback};
