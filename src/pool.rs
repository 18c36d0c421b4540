use std::ptr::NonNull;

use crate::{
    AllocError, CHUNK_HEADER_SIZE, PlatformMemory, SizeClass,
    freelist::FreeLists,
    list::List,
    region::{Chunk, Region},
    utils::round_up,
};

/// Carving is attempted at most this many times per request: once against
/// the current region and once more after it has been replenished.
const MAX_ATTEMPTS: usize = 2;

/// Owns the pool [`Region`] and every chunk obtained from the platform.
///
/// A request for `count` blocks is served, in this order, by:
///
/// 1. Carving all of them if the region is big enough.
/// 2. Carving as many whole blocks as fit, reducing `count`.
/// 3. Replenishing the region, then carving again. The leftover bytes are
///    donated to the free list of the matching size class and a new chunk
///    is requested. If the platform refuses, the first non-empty free list
///    of an equal or bigger class lends one of its blocks as the new region.
pub(crate) struct PoolManager<M: PlatformMemory> {
    /// Uncommitted bytes.
    region: Region,
    /// Bytes ever requested from the platform, headers excluded.
    heap_size: usize,
    /// Every chunk we own, so that we can return them on drop.
    chunks: List<Chunk>,
    memory: M,
}

impl<M: PlatformMemory> PoolManager<M> {
    pub const fn new(memory: M) -> Self {
        Self {
            region: Region::empty(),
            heap_size: 0,
            chunks: List::new(),
            memory,
        }
    }

    #[inline]
    pub fn heap_size(&self) -> usize {
        self.heap_size
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.region.remaining()
    }

    #[inline]
    pub fn chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Returns the address of `count` contiguous blocks of `block_size`
    /// bytes. `count` is only advisory: it might be reduced (never
    /// increased) and callers must use the updated value.
    pub fn obtain(
        &mut self,
        block_size: usize,
        count: &mut usize,
        free_lists: &mut FreeLists,
    ) -> Result<NonNull<u8>, AllocError> {
        for attempt in 1..=MAX_ATTEMPTS {
            if let Some(batch) = self.carve_batch(block_size, count) {
                return Ok(batch);
            }

            if attempt < MAX_ATTEMPTS {
                self.replenish(block_size, *count, free_lists)?;
            }
        }

        // A replenished region always holds at least one block.
        Err(AllocError::OutOfMemory {
            requested: block_size,
        })
    }

    /// Fast and partial paths. `None` if not even one block fits.
    fn carve_batch(&mut self, block_size: usize, count: &mut usize) -> Option<NonNull<u8>> {
        let remaining = self.region.remaining();
        let needed = block_size.checked_mul(*count)?;

        if remaining >= needed {
            log::trace!("carving {count} blocks of {block_size} bytes");
        } else if remaining >= block_size {
            *count = remaining / block_size;
            log::trace!("pool can only supply {count} blocks of {block_size} bytes");
        } else {
            return None;
        }

        Some(unsafe { self.region.carve(block_size * *count) })
    }

    /// Refill path: installs a fresh region able to hold at least one block
    /// of `block_size` bytes.
    fn replenish(
        &mut self,
        block_size: usize,
        count: usize,
        free_lists: &mut FreeLists,
    ) -> Result<(), AllocError> {
        let out_of_memory = AllocError::OutOfMemory {
            requested: block_size,
        };

        // Always twice what we need right now, plus a sixteenth of what we
        // already have, so chunks grow as the process keeps asking.
        let bytes_to_get = block_size
            .checked_mul(count)
            .and_then(|needed| needed.checked_mul(2))
            .and_then(|double| double.checked_add(round_up(self.heap_size >> 4)))
            .ok_or(out_of_memory)?;

        self.donate_remainder(free_lists);

        if self.request_chunk(bytes_to_get) {
            return Ok(());
        }

        self.borrow_from_larger(block_size, free_lists)
            .ok_or(out_of_memory)
    }

    /// Pushes the leftover bytes of the region onto the free list whose
    /// blocks have exactly that length. Leftovers that match no class are
    /// dropped.
    fn donate_remainder(&mut self, free_lists: &mut FreeLists) {
        let Some((start, len)) = self.region.take_remainder() else {
            return;
        };

        match SizeClass::from_block_size(len) {
            Some(class) => {
                log::trace!("donating {len} leftover bytes to its free list");
                unsafe { free_lists[class].push_block(start) };
            }
            None => log::warn!("dropping {len} leftover bytes at {start:?}"),
        }
    }

    /// Asks the platform for a new chunk and installs it as the region.
    /// Returns `false` if the platform could not provide it.
    fn request_chunk(&mut self, bytes_to_get: usize) -> bool {
        let Some(len) = bytes_to_get.checked_add(CHUNK_HEADER_SIZE) else {
            return false;
        };

        let Some(addr) = self.memory.request_memory(len) else {
            log::debug!("platform refused a chunk of {len} bytes");
            return false;
        };

        unsafe {
            self.chunks.push(Chunk { size: len }, addr);
            self.region.install(addr.add(CHUNK_HEADER_SIZE), bytes_to_get);
        }

        self.heap_size += bytes_to_get;

        log::debug!(
            "obtained chunk of {bytes_to_get} bytes at {addr:?}, heap size is now {}",
            self.heap_size
        );

        true
    }

    /// Fallback search: the first free block of `block_size` bytes or more
    /// becomes the new region.
    fn borrow_from_larger(&mut self, block_size: usize, free_lists: &mut FreeLists) -> Option<()> {
        let from = SizeClass::from_block_size(block_size)?;

        for class in from.and_larger() {
            if let Some(block) = free_lists[class].pop_block() {
                log::warn!(
                    "out of platform memory, borrowing a {} byte block for {block_size} byte blocks",
                    class.block_size()
                );

                unsafe { self.region.install(block, class.block_size()) };

                return Some(());
            }
        }

        None
    }
}

impl<M: PlatformMemory> Drop for PoolManager<M> {
    fn drop(&mut self) {
        while let Some((addr, chunk)) = self.chunks.pop() {
            unsafe { self.memory.return_memory(addr, chunk.size) };
        }
    }
}
