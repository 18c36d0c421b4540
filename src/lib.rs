//! Fixed size class memory allocator.
//!
//! Small requests (`1..=MAX_BYTES` bytes) are rounded up to a multiple of
//! [`BLOCK`] and served from one of [`NUM_FREE_LISTS`] singly linked free
//! lists. When a list runs dry, a batch of blocks of that size is carved out
//! of a contiguous pool region which in turn is refilled with big chunks
//! requested from the underlying [`PlatformMemory`].
//!
//! ```text
//!          Free lists (one per size class)
//!
//!   8 B  -> [ ] -> [ ] -> [ ]
//!  16 B  -> (empty)
//!  24 B  -> [ ]
//!   ...
//! 128 B  -> [ ] -> [ ]
//!
//!                  Pool region
//! +----------+--------------------------------------+
//! |  carved  |            uncommitted               |
//! +----------+--------------------------------------+
//!            ^                                      ^
//!          start                                   end
//! ```
//!
//! Freed blocks go back to their free list and are never returned to the
//! platform while the allocator lives. The allocator is single threaded:
//! it holds raw pointers so it is neither `Send` nor `Sync`.

use std::ptr::NonNull;

mod allocator;
mod block;
mod error;
mod freelist;
mod kernel;
mod list;
mod pool;
mod region;
mod utils;

/// Granularity of size classes in bytes. Every block is a multiple of this.
pub const BLOCK: usize = 8;

/// Biggest request the allocator is able to serve.
pub const MAX_BYTES: usize = 128;

/// Number of size classes, and therefore of free lists.
pub const NUM_FREE_LISTS: usize = MAX_BYTES / BLOCK;

/// How many blocks we ask the pool for when a free list is empty. The pool
/// might hand out less than this.
pub const DEFAULT_BATCH: usize = 20;

/// Non-null pointer to `T`, `None` marks the end of a list.
pub(crate) type Link<T> = Option<NonNull<T>>;

pub use allocator::SizeClassAlloc;
pub use block::SizeClass;
pub use error::{AllocError, abort_on_error};
pub use kernel::{Kernel, PlatformMemory};
pub use region::CHUNK_HEADER_SIZE;
