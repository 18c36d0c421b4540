//! Helper functions for the allocator. These are the index computations
//! that don't particularly belong to any concrete module of the program.

use crate::BLOCK;

/// It aligns `to_be_aligned` using `aligment`, which must be a power of two.
///
/// This is used to round request sizes up to a multiple of [`BLOCK`] and to
/// keep the chunk header a multiple of it so blocks stay aligned.
pub const fn align(to_be_aligned: usize, aligment: usize) -> usize {
    (to_be_aligned + aligment - 1) & !(aligment - 1)
}

/// Smallest multiple of [`BLOCK`] that can hold `bytes`.
#[inline]
pub const fn round_up(bytes: usize) -> usize {
    align(bytes, BLOCK)
}

/// Index of the free list serving `bytes`. Callers must make sure that
/// `bytes` is not zero.
#[inline]
pub const fn class_index(bytes: usize) -> usize {
    (bytes + BLOCK - 1) / BLOCK - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MAX_BYTES, NUM_FREE_LISTS};

    #[test]
    fn align_block_size() {
        let aligments = vec![(1..9, 8), (9..17, 16), (17..25, 24), (25..33, 32)];

        for (sizes, expected) in aligments {
            for size in sizes {
                assert_eq!(expected, round_up(size));
            }
        }
    }

    #[test]
    fn align_to_other_powers_of_two() {
        assert_eq!(4096, align(1, 4096));
        assert_eq!(8192, align(4097, 4096));
        assert_eq!(16, align(16, 16));
    }

    #[test]
    fn round_up_is_smallest_multiple() {
        for size in 1..=MAX_BYTES {
            let rounded = round_up(size);

            assert_eq!(0, rounded % BLOCK);
            assert!(rounded >= size);
            assert!(rounded - size < BLOCK);
        }
    }

    #[test]
    fn rounding_keeps_the_class() {
        for size in 1..=MAX_BYTES {
            assert_eq!(class_index(size), class_index(round_up(size)));
        }
    }

    #[test]
    fn class_boundaries() {
        assert_eq!(0, class_index(1));
        assert_eq!(0, class_index(8));
        assert_eq!(1, class_index(9));
        assert_eq!(class_index(57), class_index(64));
        assert_eq!(7, class_index(64));
        assert_eq!(NUM_FREE_LISTS - 1, class_index(MAX_BYTES));
    }
}
