//! The kernel-wide error taxonomy.
//!
//! Every fallible operation in `rtos-core` and `rtos-cmsis` returns
//! `Result<T, KernelError>` at the Rust API layer. The supervisor-call
//! and CMSIS-facing surfaces translate this to the documented
//! negative-integer convention at the FFI boundary via `as_c_int`,
//! never earlier.

use core::ffi::c_int;

/// Implement common conversions for kernel error enums that follow the
/// "negative C errno, zero is success" convention.
macro_rules! impl_kernel_error {
    ($ty:ty, fallback: $fallback:ident, variants: { $($val:literal => $variant:ident),* $(,)? }) => {
        impl $ty {
            /// Convert to the C-style integer used at supervisor-call boundaries.
            #[inline]
            pub fn as_c_int(self) -> c_int {
                self as c_int
            }

            /// Convert from a C-style integer, e.g. a syscall return register.
            #[inline]
            pub fn from_c_int(val: c_int) -> Self {
                match val {
                    $($val => Self::$variant,)*
                    _ => Self::$fallback,
                }
            }

            /// True if this represents a successful result.
            #[inline]
            pub fn is_success(self) -> bool {
                matches!(self, Self::Success)
            }

            /// True if this represents a failure.
            #[inline]
            pub fn is_error(self) -> bool {
                !self.is_success()
            }
        }
    };
}

pub type KernelResult<T> = Result<T, KernelError>;

/// The abstract error kinds from the error handling design, plus `Success`
/// for the places that need a single type spanning both outcomes (e.g. the
/// supervisor-call return register).
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KernelError {
    #[default]
    Success = 0,
    /// Malformed parameters, or the target is in the wrong state for the request.
    InvalidArgument = -1,
    /// The referenced task or object no longer exists.
    NotFound = -2,
    /// Non-blocking attempt against a contended resource.
    Busy = -3,
    /// A finite wait expired.
    TimedOut = -4,
    /// The wait was aborted by a queue reset or the waiter's termination.
    Interrupted = -5,
    /// A fixed-capacity resource (deferred-wake ring, message pool) is exhausted.
    NoSpace = -6,
    /// A structural marker mismatch on a control block; escalates to fatal.
    Corrupted = -7,
    /// A stack sentinel mismatch; escalates to forced task termination.
    StackOverflow = -8,
}

impl_kernel_error!(KernelError, fallback: InvalidArgument, variants: {
    0 => Success,
    -1 => InvalidArgument,
    -2 => NotFound,
    -3 => Busy,
    -4 => TimedOut,
    -5 => Interrupted,
    -6 => NoSpace,
    -7 => Corrupted,
    -8 => StackOverflow,
});

impl KernelError {
    /// Encode a `KernelResult<()>`-shaped outcome as a single C return value:
    /// `0` for `Ok`, the negative error code otherwise. Mirrors the
    /// supervisor-call convention described in the error handling design.
    #[inline]
    pub fn encode(result: KernelResult<()>) -> c_int {
        match result {
            Ok(()) => 0,
            Err(e) => e.as_c_int(),
        }
    }

    /// Reconstruct a `KernelResult<()>` from a C return value.
    #[inline]
    pub fn decode(val: c_int) -> KernelResult<()> {
        if val >= 0 {
            Ok(())
        } else {
            Err(KernelError::from_c_int(val))
        }
    }
}
