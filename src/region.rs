use std::ptr::{self, NonNull};

use crate::{BLOCK, list::List, utils::align};

/// Metadata written at the start of every chunk we get from the platform.
/// The header is represented as a [`crate::list::Node`] so all chunks form
/// a [`List`] that we walk on drop to give the memory back.
pub(crate) struct Chunk {
    /// Total length of the chunk, header included.
    pub size: usize,
}

/// Overhead of the header placed at the start of every chunk, rounded so
/// that the first block after it stays aligned.
pub const CHUNK_HEADER_SIZE: usize = align(List::<Chunk>::NODE_SIZE, BLOCK);

/// The pool region: bytes that have not been handed to any free list or
/// caller yet.
///
/// ```text
///          carved            uncommitted
/// +----------------------+-----------------------+
/// | blocks | blocks | .. |                       |
/// +----------------------+-----------------------+
///                        ^                       ^
///                      start                    end
/// ```
///
/// `start` only moves forwards, `end` is replaced together with `start`
/// when a new chunk or a donated block is installed.
pub(crate) struct Region {
    start: *mut u8,
    end: *mut u8,
}

impl Region {
    pub const fn empty() -> Self {
        Self {
            start: ptr::null_mut(),
            end: ptr::null_mut(),
        }
    }

    /// Uncommitted bytes left.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.end.addr() - self.start.addr()
    }

    /// Moves `start` forward by `bytes` and returns where it was.
    ///
    /// **SAFETY**: `bytes` must not exceed [`Region::remaining`] and the
    /// region must not be empty.
    pub unsafe fn carve(&mut self, bytes: usize) -> NonNull<u8> {
        debug_assert!(bytes <= self.remaining());

        unsafe {
            let carved = NonNull::new_unchecked(self.start);
            self.start = self.start.add(bytes);

            carved
        }
    }

    /// Hands the leftover bytes over to the caller and leaves the region
    /// empty.
    pub fn take_remainder(&mut self) -> Option<(NonNull<u8>, usize)> {
        let len = self.remaining();
        let start = NonNull::new(self.start)?;

        *self = Self::empty();

        (len > 0).then_some((start, len))
    }

    /// Replaces the current bounds with `[start, start + len)`.
    ///
    /// **SAFETY**: the range must be valid for reads and writes and owned by
    /// the pool from now on.
    pub unsafe fn install(&mut self, start: NonNull<u8>, len: usize) {
        self.start = start.as_ptr();
        self.end = unsafe { self.start.add(len) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(align(8))]
    struct Storage([u8; 64]);

    #[test]
    fn empty_region_has_nothing_left() {
        let mut region = Region::empty();

        assert_eq!(0, region.remaining());
        assert!(region.take_remainder().is_none());
    }

    #[test]
    fn carving_moves_start_forward() {
        let mut storage = Storage([0; 64]);
        let start = NonNull::new(storage.0.as_mut_ptr()).unwrap();
        let mut region = Region::empty();

        unsafe {
            region.install(start, 64);

            assert_eq!(start, region.carve(24));
            assert_eq!(start.add(24), region.carve(16));
        }

        assert_eq!(24, region.remaining());
        assert_eq!(Some((unsafe { start.add(40) }, 24)), region.take_remainder());
        assert_eq!(0, region.remaining());
    }

    #[test]
    fn header_keeps_blocks_aligned() {
        assert_eq!(0, CHUNK_HEADER_SIZE % BLOCK);
        assert!(CHUNK_HEADER_SIZE >= List::<Chunk>::NODE_SIZE);
    }
}
