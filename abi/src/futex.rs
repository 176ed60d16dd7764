//! Shapes for the futex layer's user-word encoding.
//!
//! The futex word itself lives in caller-owned memory; these are the bit
//! layouts `rtos-core::futex` imposes on it when the corresponding flag is
//! set, plus the flags word carried by the `Futex` control block.

bitflags::bitflags! {
    /// Flags a futex is configured with at `init` time.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FutexFlags: u8 {
        /// Low bit of the word is kept set while the waiter queue is non-empty.
        const CONTENTION_TRACKING = 0b001;
        /// High bits of the word encode the owning task's control-block address.
        const OWNER_TRACKING      = 0b010;
        /// Priority inheritance to the owner is active. Only meaningful
        /// together with `OWNER_TRACKING`.
        const PI                  = 0b100;
    }
}

/// Low bit of the futex word: set while the waiter queue is non-empty.
pub const FUTEX_WORD_CONTENTION_BIT: u32 = 0x1;

/// Mask of the bits reserved for flags in an owner-tracking word; task
/// control blocks are required to be at least 2-byte aligned so the low
/// bit is free for the contention flag.
pub const FUTEX_WORD_OWNER_MASK: u32 = !FUTEX_WORD_CONTENTION_BIT;

/// Extract the encoded owner address from an owner-tracking futex word.
#[inline]
pub const fn futex_word_owner(word: u32) -> u32 {
    word & FUTEX_WORD_OWNER_MASK
}

/// Build an owner-tracking futex word for `owner`, preserving (or not) the
/// contention bit.
#[inline]
pub const fn futex_word_with_owner(owner: u32, contended: bool) -> u32 {
    let base = owner & FUTEX_WORD_OWNER_MASK;
    if contended {
        base | FUTEX_WORD_CONTENTION_BIT
    } else {
        base
    }
}
