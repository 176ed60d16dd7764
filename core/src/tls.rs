//! Thread-local storage (per-core-local storage and TLS, §4.5).
//!
//! TLS is per task. The linker script places `tdata`/`tbss` in a single
//! contiguous region whose size and initializer image are captured at link
//! time; task creation carves one block per task out of a static arena,
//! copies the `tdata` initializer, and zeros the rest. The scheduler's
//! switch hook (`scheduler::install_tls`) publishes the current task's
//! block into a per-core slot that an unwind-time accessor reads back to
//! resolve `__aeabi`-style thread-local accesses.

use core::ptr;
use core::sync::atomic::{AtomicUsize, Ordering};

use rtos_abi::MAX_CORES;
use rtos_abi::task::MAX_TASKS;

unsafe extern "C" {
    /// Linker symbols bracketing the `.tdata` initializer image.
    static __tdata_start: u8;
    static __tdata_end: u8;
    /// Linker symbol giving the total size (tdata + tbss) of one TLS block.
    static __tls_block_size: u8;
}

fn tdata_len() -> usize {
    unsafe { (&__tdata_end as *const u8 as usize) - (&__tdata_start as *const u8 as usize) }
}

fn block_size() -> usize {
    unsafe { &__tls_block_size as *const u8 as usize }
}

/// Static arena backing every task's TLS block; sized for the worst case
/// (every pool slot in use) at whatever the link-time block size is.
const ARENA_WORDS: usize = 64 * MAX_TASKS;
static mut ARENA: [u32; ARENA_WORDS] = [0; ARENA_WORDS];
static NEXT_BLOCK: AtomicUsize = AtomicUsize::new(0);

/// Carve the next TLS block out of the arena, copy `tdata`, zero `tbss`.
/// Returns a pointer valid for the lifetime of the owning task.
pub fn alloc_block() -> *mut u8 {
    let size = block_size().max(1);
    let words = size.div_ceil(4);
    let index = NEXT_BLOCK.fetch_add(words, Ordering::Relaxed);
    if index + words > ARENA_WORDS {
        return ptr::null_mut();
    }
    let base = unsafe { (&raw mut ARENA[index]) as *mut u8 };
    unsafe {
        ptr::write_bytes(base, 0, size);
        let copy_len = tdata_len().min(size);
        if copy_len > 0 {
            ptr::copy_nonoverlapping(&__tdata_start as *const u8, base, copy_len);
        }
    }
    base
}

/// Per-core slot the currently running task's TLS block lives in, read by
/// the unwind-time thread-pointer accessor.
static CURRENT_TLS: [AtomicUsize; MAX_CORES] = [const { AtomicUsize::new(0) }; MAX_CORES];

/// Publish `tls` as the active TLS block for `core`. Called by the
/// scheduler's switch hook on every context switch.
pub fn install(core: u8, tls: *mut u8) {
    CURRENT_TLS[core as usize].store(tls as usize, Ordering::Release);
}

/// The active TLS block for `core`, or null if none is installed (before
/// the first task runs).
pub fn current(core: u8) -> *mut u8 {
    CURRENT_TLS[core as usize].load(Ordering::Acquire) as *mut u8
}
