use crate::{
    AllocError, BLOCK, MAX_BYTES, NUM_FREE_LISTS,
    utils::{class_index, round_up},
};

/// One of the [`NUM_FREE_LISTS`] buckets blocks are grouped in.
///
/// Class `i` serves every request in `(i * BLOCK + 1)..=((i + 1) * BLOCK)`
/// and all of its blocks are exactly `(i + 1) * BLOCK` bytes long:
///
/// ```text
///  index:      0       1       2            15
///          +-------+-------+-------+ ... +--------+
///  sizes:  | 1..=8 |9..=16 |17..=24|     |121..=128|
///          +-------+-------+-------+ ... +--------+
///  block:      8      16      24            128
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SizeClass(usize);

impl SizeClass {
    /// Class of the 8 byte blocks.
    pub const SMALLEST: Self = Self(0);

    /// Class of the [`MAX_BYTES`] blocks.
    pub const LARGEST: Self = Self(NUM_FREE_LISTS - 1);

    /// Size class serving requests of `size` bytes.
    pub fn from_size(size: usize) -> Result<Self, AllocError> {
        if size == 0 || size > MAX_BYTES {
            return Err(AllocError::UnsupportedSize { size });
        }

        Ok(Self(class_index(size)))
    }

    /// Size class whose blocks are exactly `bytes` long, if any.
    pub(crate) fn from_block_size(bytes: usize) -> Option<Self> {
        if bytes == 0 || bytes > MAX_BYTES || round_up(bytes) != bytes {
            return None;
        }

        Some(Self(class_index(bytes)))
    }

    /// Position of this class in the free list array.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Length of every block belonging to this class.
    #[inline]
    pub const fn block_size(self) -> usize {
        (self.0 + 1) * BLOCK
    }

    /// This class followed by every bigger one, smallest first.
    pub fn and_larger(self) -> impl Iterator<Item = SizeClass> {
        (self.0..NUM_FREE_LISTS).map(SizeClass)
    }
}
