#![allow(dead_code)]

use std::{alloc::Layout, ptr::NonNull};

use sizeclass::{CHUNK_HEADER_SIZE, PlatformMemory};

/// Chunks come from the global allocator. Every request is recorded, and
/// once `budget` chunks have been handed out every further request fails.
pub struct Recorder {
    budget: Option<usize>,
    pub requests: Vec<usize>,
    pub returned: usize,
}

impl Recorder {
    pub fn unlimited() -> Self {
        Self {
            budget: None,
            requests: Vec::new(),
            returned: 0,
        }
    }

    pub fn with_budget(chunks: usize) -> Self {
        Self {
            budget: Some(chunks),
            ..Self::unlimited()
        }
    }

    /// Pool bytes of every chunk handed out, without the header.
    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.requests.iter().map(|len| len - CHUNK_HEADER_SIZE).collect()
    }
}

fn layout(len: usize) -> Layout {
    Layout::from_size_align(len, 16).unwrap()
}

impl PlatformMemory for Recorder {
    fn request_memory(&mut self, len: usize) -> Option<NonNull<u8>> {
        if self.budget == Some(self.requests.len()) {
            return None;
        }

        self.requests.push(len);

        NonNull::new(unsafe { std::alloc::alloc(layout(len)) })
    }

    unsafe fn return_memory(&mut self, addr: NonNull<u8>, len: usize) {
        self.returned += 1;

        unsafe { std::alloc::dealloc(addr.as_ptr(), layout(len)) };
    }
}
