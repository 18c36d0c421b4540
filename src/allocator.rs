use std::ptr::NonNull;

use crate::{
    AllocError, DEFAULT_BATCH, Kernel, PlatformMemory, SizeClass, freelist::FreeLists,
    pool::PoolManager,
};

/// Allocator for small objects of known size.
///
/// Requests are rounded up to their [`SizeClass`] and served from that
/// class's free list. When the list is empty a batch of [`DEFAULT_BATCH`]
/// blocks is carved from the pool: the first one goes to the caller and the
/// rest are queued on the list for later requests.
///
/// ```text
///  allocate(60)
///      |
///      v
///  round up to 64 ---> free list 64 B non-empty? --yes--> pop head
///                               |
///                               no
///                               v
///                     pool carves up to 20 blocks
///                     first block -> caller
///                     rest        -> free list 64 B
/// ```
///
/// Nothing is ever returned to the platform while the allocator is alive.
/// Dropping it releases every chunk at once, which invalidates all pointers
/// it handed out.
pub struct SizeClassAlloc<M: PlatformMemory = Kernel> {
    free_lists: FreeLists,
    pool: PoolManager<M>,
}

impl SizeClassAlloc<Kernel> {
    /// Allocator backed by the operating system. No memory is requested
    /// until the first allocation.
    pub const fn new() -> Self {
        Self::with_memory(Kernel)
    }
}

impl Default for SizeClassAlloc<Kernel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: PlatformMemory> SizeClassAlloc<M> {
    /// Allocator that requests its chunks from `memory`.
    pub const fn with_memory(memory: M) -> Self {
        Self {
            free_lists: FreeLists::new(),
            pool: PoolManager::new(memory),
        }
    }

    /// Returns a block where at least `size` bytes can be written. The block
    /// is actually as big as the size class of `size` and is not zeroed.
    ///
    /// # Errors
    ///
    /// [`AllocError::UnsupportedSize`] if `size` is zero or bigger than
    /// [`crate::MAX_BYTES`], [`AllocError::OutOfMemory`] if neither the
    /// platform nor any free list can provide memory.
    pub fn allocate(&mut self, size: usize) -> Result<NonNull<u8>, AllocError> {
        let class = SizeClass::from_size(size)?;

        if let Some(block) = self.free_lists[class].pop_block() {
            log::trace!("reusing {block:?} for {size} bytes");
            return Ok(block);
        }

        self.fill(class)
    }

    /// Puts `address` back on the free list of the size class of `size`.
    /// The memory is not cleared nor returned to the platform.
    ///
    /// # Errors
    ///
    /// [`AllocError::UnsupportedSize`] if `size` is zero or bigger than
    /// [`crate::MAX_BYTES`]. Nothing is modified in that case.
    ///
    /// # Safety
    ///
    /// `address` must have been returned by [`SizeClassAlloc::allocate`] on
    /// this same allocator called with exactly the same `size`, and it must
    /// not have been deallocated already. The allocator has no way to check
    /// any of this: a mismatched size silently corrupts the free lists.
    pub unsafe fn deallocate(&mut self, address: NonNull<u8>, size: usize) -> Result<(), AllocError> {
        let class = SizeClass::from_size(size)?;

        log::trace!("freeing {address:?} of {size} bytes");

        unsafe { self.free_lists[class].push_block(address) };

        Ok(())
    }

    /// Batch fill. Called only when the free list of `class` is empty.
    fn fill(&mut self, class: SizeClass) -> Result<NonNull<u8>, AllocError> {
        let block_size = class.block_size();
        let mut count = DEFAULT_BATCH;

        let batch = self.pool.obtain(block_size, &mut count, &mut self.free_lists)?;

        log::trace!("filled {count} blocks of {block_size} bytes at {batch:?}");

        if count > 1 {
            debug_assert!(self.free_lists[class].is_empty());

            unsafe {
                self.free_lists[class].thread(batch.add(block_size), block_size, count - 1);
            }
        }

        Ok(batch)
    }

    /// Bytes requested from the platform so far, chunk headers excluded.
    pub fn heap_size(&self) -> usize {
        self.pool.heap_size()
    }

    /// Bytes left in the pool region that have not been carved yet.
    pub fn pool_remaining(&self) -> usize {
        self.pool.remaining()
    }

    /// Number of chunks obtained from the platform.
    pub fn chunks(&self) -> usize {
        self.pool.chunks()
    }

    /// Number of free blocks queued for requests of `size` bytes.
    pub fn free_blocks(&self, size: usize) -> Result<usize, AllocError> {
        Ok(self.free_lists[SizeClass::from_size(size)?].len())
    }
}
