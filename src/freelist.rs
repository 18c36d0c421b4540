use std::{
    ops::{Index, IndexMut},
    ptr::NonNull,
};

use crate::{BLOCK, NUM_FREE_LISTS, SizeClass, list::List};

// A free block must be able to hold the link to the next one.
const _: () = assert!(List::<()>::NODE_SIZE <= BLOCK);

/// Free blocks of a single size class.
///
/// We don't need to store anything about a free block except where the next
/// one is, and the block is free so its payload won't be used by the user.
/// Therefore the link lives in the first bytes of the block itself:
///
/// ```text
///    Free List
///
///  head --+       +--------------+       +--------------+
///         |       |              |       |              |
///     +---|---+---|---+      +---|---+---|---+      +---|-------+
///     | next  | unused |     | next  | unused |     | None | ...|
///     +-------+--------+     +-------+--------+     +-----------+
/// ```
pub(crate) struct FreeList {
    blocks: List<()>,
}

impl FreeList {
    /// Creates a new empty list.
    pub const fn new() -> Self {
        Self { blocks: List::new() }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Takes the most recently freed block, if any.
    #[inline]
    pub fn pop_block(&mut self) -> Option<NonNull<u8>> {
        self.blocks.pop().map(|(block, ())| block)
    }

    /// Puts `block` back on the list.
    ///
    /// **SAFETY**: `block` must be at least [`BLOCK`] bytes long, aligned to
    /// a word and not in use by anybody else.
    #[inline]
    pub unsafe fn push_block(&mut self, block: NonNull<u8>) {
        unsafe {
            self.blocks.push((), block);
        }
    }

    /// Threads `count` contiguous blocks of `block_size` bytes starting at
    /// `start` onto the list, so that they are handed out in ascending
    /// address order.
    ///
    /// **SAFETY**: the whole range must be owned by the caller and satisfy
    /// the requirements of [`FreeList::push_block`].
    pub unsafe fn thread(&mut self, start: NonNull<u8>, block_size: usize, count: usize) {
        for i in (0..count).rev() {
            unsafe {
                self.push_block(start.add(i * block_size));
            }
        }
    }
}

/// One [`FreeList`] per [`SizeClass`].
pub(crate) struct FreeLists {
    lists: [FreeList; NUM_FREE_LISTS],
}

impl FreeLists {
    pub const fn new() -> Self {
        Self {
            lists: [const { FreeList::new() }; NUM_FREE_LISTS],
        }
    }
}

impl Index<SizeClass> for FreeLists {
    type Output = FreeList;

    fn index(&self, class: SizeClass) -> &FreeList {
        &self.lists[class.index()]
    }
}

impl IndexMut<SizeClass> for FreeLists {
    fn index_mut(&mut self, class: SizeClass) -> &mut FreeList {
        &mut self.lists[class.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(align(8))]
    struct Storage([u8; 256]);

    #[test]
    fn new_lists_are_empty() {
        let lists = FreeLists::new();

        for class in SizeClass::SMALLEST.and_larger() {
            assert!(lists[class].is_empty());
            assert_eq!(0, lists[class].len());
        }
    }

    #[test]
    fn threaded_blocks_come_out_in_address_order() {
        let mut storage = Storage([0; 256]);
        let start = NonNull::new(storage.0.as_mut_ptr()).unwrap();
        let mut list = FreeList::new();

        unsafe {
            list.thread(start, 32, 8);
        }

        assert_eq!(8, list.len());

        for i in 0..8 {
            assert_eq!(Some(unsafe { start.add(i * 32) }), list.pop_block());
        }

        assert_eq!(None, list.pop_block());
    }

    #[test]
    fn freed_block_is_reused_first() {
        let mut storage = Storage([0; 256]);
        let start = NonNull::new(storage.0.as_mut_ptr()).unwrap();
        let mut lists = FreeLists::new();
        let class = SizeClass::from_size(16).unwrap();

        unsafe {
            lists[class].thread(start, 16, 4);
            let taken = lists[class].pop_block().unwrap();
            lists[class].push_block(taken);

            assert_eq!(Some(taken), lists[class].pop_block());
        }

        assert_eq!(3, lists[class].len());
        assert!(lists[SizeClass::SMALLEST].is_empty());
    }
}
