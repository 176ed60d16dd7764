//! Core-local storage (§4.5): a linker-provided region duplicated once per
//! core. Unlike TLS, CLS data is declared statically (the linker script
//! reserves `MAX_CORES` copies of the `.cls` section) rather than carved
//! out of an arena at creation time.

use rtos_abi::{CLS_REGION_SIZE, MAX_CORES};

unsafe extern "C" {
    /// Start of the CLS region for core 0; core `n`'s copy starts at
    /// `__cls_start + n * CLS_REGION_SIZE`.
    static __cls_start: u8;
}

/// Address of the CLS datum at `offset` within the calling core's region.
///
/// # Safety
/// `offset + size_of::<T>()` must be within [`CLS_REGION_SIZE`], and the
/// caller must not alias this with a different type at the same offset.
#[inline]
pub unsafe fn cls_ptr<T>(core: u8, offset: usize) -> *mut T {
    debug_assert!(offset + core::mem::size_of::<T>() <= CLS_REGION_SIZE);
    debug_assert!((core as usize) < MAX_CORES);
    let base = &__cls_start as *const u8 as usize;
    (base + core as usize * CLS_REGION_SIZE + offset) as *mut T
}

/// Convenience accessor for the calling core, reading the current core
/// index via the registered [`crate::platform::irq`] service.
///
/// # Safety
/// Same requirements as [`cls_ptr`].
#[inline]
pub unsafe fn cls_ptr_local<T>(offset: usize) -> *mut T {
    let core = crate::platform::irq().current_core();
    unsafe { cls_ptr(core, offset) }
}
