use std::ptr::NonNull;

/// This trait provides an abstraction over the underlying system allocator.
/// The pool only needs to request big chunks of memory and, when the
/// allocator is dropped, return them. It has nothing to do with the concrete
/// APIs offered by each kernel, and tests can plug in their own source.
pub trait PlatformMemory {
    /// Request a memory region where `len` bytes can be written safely. The
    /// address must be aligned to at least [`crate::BLOCK`] bytes. Returns
    /// `None` if the request can't be satisfied.
    fn request_memory(&mut self, len: usize) -> Option<NonNull<u8>>;

    /// Returns the memory of size `len` starting from `addr` back to the
    /// platform.
    ///
    /// **SAFETY**: `addr` and `len` must describe a region previously
    /// returned by [`PlatformMemory::request_memory`] on this same value,
    /// and nothing may use it afterwards.
    unsafe fn return_memory(&mut self, addr: NonNull<u8>, len: usize);
}

/// Lets a caller keep its memory source and inspect it once the allocator
/// borrowing it is gone.
impl<M: PlatformMemory + ?Sized> PlatformMemory for &mut M {
    fn request_memory(&mut self, len: usize) -> Option<NonNull<u8>> {
        (**self).request_memory(len)
    }

    unsafe fn return_memory(&mut self, addr: NonNull<u8>, len: usize) {
        unsafe { (**self).return_memory(addr, len) }
    }
}

/// Zero sized type that implements [`PlatformMemory`] for each OS. This is
/// the default memory source of [`crate::SizeClassAlloc`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Kernel;

#[cfg(unix)]
#[cfg(not(miri))]
mod unix {
    use super::{Kernel, PlatformMemory};

    use libc::{mmap, munmap, off_t, size_t};

    use std::{
        os::raw::{c_int, c_void},
        ptr::NonNull,
    };

    impl PlatformMemory for Kernel {
        fn request_memory(&mut self, len: usize) -> Option<NonNull<u8>> {
            // mmap parameters.
            const ADDR: *mut c_void = std::ptr::null_mut::<c_void>();
            // Read-Write only memory.
            const PROT: c_int = libc::PROT_READ | libc::PROT_WRITE;
            const FLAGS: c_int = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS;
            const FD: c_int = -1;
            const OFFSET: off_t = 0;

            unsafe {
                match mmap(ADDR, len as size_t, PROT, FLAGS, FD, OFFSET) {
                    libc::MAP_FAILED => None,
                    addr => NonNull::new(addr.cast::<u8>()),
                }
            }
        }

        unsafe fn return_memory(&mut self, addr: NonNull<u8>, len: usize) {
            if unsafe { munmap(addr.as_ptr().cast::<c_void>(), len as size_t) } != 0 {
                log::warn!("munmap failed for chunk {addr:?} of {len} bytes");
            }
        }
    }
}

#[cfg(windows)]
#[cfg(not(miri))]
mod windows {
    use std::{os::raw::c_void, ptr::NonNull};

    use super::{Kernel, PlatformMemory};

    use windows::Win32::System::Memory;

    impl PlatformMemory for Kernel {
        fn request_memory(&mut self, len: usize) -> Option<NonNull<u8>> {
            // Read-Write only.
            let protection = Memory::PAGE_READWRITE;

            let flags = Memory::MEM_RESERVE | Memory::MEM_COMMIT;

            unsafe {
                let addr = Memory::VirtualAlloc(None, len, flags, protection);

                NonNull::new(addr.cast())
            }
        }

        unsafe fn return_memory(&mut self, addr: NonNull<u8>, len: usize) {
            let released =
                unsafe { Memory::VirtualFree(addr.as_ptr().cast::<c_void>(), 0, Memory::MEM_RELEASE) };

            if released.is_err() {
                log::warn!("VirtualFree failed for chunk {addr:?} of {len} bytes");
            }
        }
    }
}

#[cfg(miri)]
mod miri {
    //! Miri can't run `mmap` or `VirtualAlloc`, so chunks come from the
    //! global allocator instead.

    use std::{alloc::Layout, ptr::NonNull};

    use super::{Kernel, PlatformMemory};
    use crate::BLOCK;

    fn to_layout(len: usize) -> Option<Layout> {
        Layout::from_size_align(len, BLOCK).ok()
    }

    impl PlatformMemory for Kernel {
        fn request_memory(&mut self, len: usize) -> Option<NonNull<u8>> {
            let layout = to_layout(len)?;

            NonNull::new(unsafe { std::alloc::alloc(layout) })
        }

        unsafe fn return_memory(&mut self, addr: NonNull<u8>, len: usize) {
            if let Some(layout) = to_layout(len) {
                unsafe { std::alloc::dealloc(addr.as_ptr(), layout) };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_memory_is_writable() {
        let mut kernel = Kernel;
        let len = 4096;

        let addr = kernel.request_memory(len).unwrap();
        assert_eq!(0, addr.as_ptr().addr() % crate::BLOCK);

        unsafe {
            addr.as_ptr().write_bytes(0xAB, len);
            assert_eq!(0xAB, *addr.as_ptr().add(len - 1));

            kernel.return_memory(addr, len);
        }
    }
}
