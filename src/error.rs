use thiserror::Error;

use crate::MAX_BYTES;

/// The only two ways an allocation request can fail.
///
/// Misuse such as freeing with the wrong size or freeing twice is not
/// detected, see [`crate::SizeClassAlloc::deallocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
    /// Requested or declared size is zero or bigger than [`MAX_BYTES`].
    #[error("cannot deal with this size: {size} bytes (supported sizes are 1..={max})", max = MAX_BYTES)]
    UnsupportedSize { size: usize },
    /// The platform refused to give us another chunk and no bigger size
    /// class had a free block to spare.
    #[error("cannot get more memory for blocks of {requested} bytes")]
    OutOfMemory { requested: usize },
}

/// Terminates the process if `result` is an error, otherwise returns the
/// value.
///
/// This is the "report and abort" policy for callers that treat both error
/// kinds as fatal. The diagnostic goes to the logger and to stderr, since a
/// logger might not be installed.
pub fn abort_on_error<T>(result: Result<T, AllocError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            log::error!("{err}");
            eprintln!("{err}");
            std::process::abort()
        }
    }
}
