//! Fixed-size block allocator over caller-provided storage, gated by a
//! counting semaphore.
//!
//! CMSIS mapping: `osMemoryPoolNew`/`osMemoryPoolAlloc`/`osMemoryPoolFree`/
//! `osMemoryPoolGetSpace`. Free blocks form a singly linked list threaded
//! through the first four bytes of each free block (so `block_size` must
//! be at least 4); the head pointer is a plain index, swung with
//! [`rtos_core::atomic::compare_exchange_u32`] for the same cross-core
//! reason `Mutex`'s lock word is (see that module).

use core::sync::atomic::{AtomicU32, Ordering};

use rtos_abi::{KernelError, KernelResult};

use crate::semaphore::Semaphore;

const FREE_LIST_END: u32 = u32::MAX;

pub struct MemoryPool {
    base: *mut u8,
    block_size: usize,
    block_count: usize,
    free_head: AtomicU32,
    space: Semaphore,
}

// SAFETY: `storage` is 'static for the pool's lifetime; every mutation of
// the free list and every block handed out goes through the atomic
// free-list head and the gating semaphore, never bare pointer writes from
// two allocators at once.
unsafe impl Send for MemoryPool {}
unsafe impl Sync for MemoryPool {}

impl MemoryPool {
    /// Build a pool of fixed-size blocks over `storage`, gated by
    /// `sem_word` (a caller-supplied 'static word the pool's internal
    /// semaphore uses for its token count).
    pub fn new(
        storage: &'static mut [u8],
        block_size: usize,
        sem_word: &'static AtomicU32,
    ) -> KernelResult<Self> {
        if block_size < core::mem::size_of::<u32>() || storage.len() < block_size {
            return Err(KernelError::InvalidArgument);
        }
        let block_count = storage.len() / block_size;
        let base = storage.as_mut_ptr();
        for i in 0..block_count {
            let next = if i + 1 < block_count {
                (i + 1) as u32
            } else {
                FREE_LIST_END
            };
            unsafe {
                (base.add(i * block_size) as *mut u32).write_unaligned(next);
            }
        }
        sem_word.store(block_count as u32, Ordering::Relaxed);
        Ok(Self {
            base,
            block_size,
            block_count,
            free_head: AtomicU32::new(0),
            space: Semaphore::new(sem_word, block_count as u32),
        })
    }

    pub fn block_count(&self) -> usize {
        self.block_count
    }

    pub fn space_available(&self) -> u32 {
        self.space.count()
    }

    /// Claim a block, blocking up to `timeout` ticks if the pool is
    /// momentarily empty (0 = try-alloc).
    pub fn alloc(&mut self, timeout: u32) -> KernelResult<*mut u8> {
        self.space.acquire(timeout)?;
        loop {
            let head = self.free_head.load(Ordering::Acquire);
            if head == FREE_LIST_END {
                return Err(KernelError::Corrupted);
            }
            let slot = unsafe { self.base.add(head as usize * self.block_size) };
            let next = unsafe { (slot as *mut u32).read_unaligned() };
            if rtos_core::atomic::compare_exchange_u32(&self.free_head, head, next).is_ok() {
                return Ok(slot);
            }
        }
    }

    /// Return a block allocated from this pool. `InvalidArgument` if
    /// `block` doesn't point at one of this pool's slots.
    pub fn free(&mut self, block: *mut u8) -> KernelResult<()> {
        let offset = (block as usize).wrapping_sub(self.base as usize);
        if offset % self.block_size != 0 || offset / self.block_size >= self.block_count {
            return Err(KernelError::InvalidArgument);
        }
        let idx = (offset / self.block_size) as u32;
        loop {
            let head = self.free_head.load(Ordering::Acquire);
            unsafe { (block as *mut u32).write_unaligned(head) };
            if rtos_core::atomic::compare_exchange_u32(&self.free_head, head, idx).is_ok() {
                break;
            }
        }
        self.space.release()?;
        Ok(())
    }
}
