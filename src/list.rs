//! Intrusive singly linked list. This is the only place where untyped
//! memory is reinterpreted as list nodes: a node is written straight into
//! the storage it describes, so the list itself never allocates.

use std::{marker::PhantomData, mem, ptr::NonNull};

use crate::Link;

pub(crate) struct Node<T> {
    /// Pointer to the next node of the list
    pub next: Link<Self>,
    /// Element of the node
    pub data: T,
}

/// LIFO list of nodes living inside memory owned by the allocator.
pub(crate) struct List<T> {
    head: Link<Node<T>>,
    len: usize,
    marker: PhantomData<T>,
}

impl<T> List<T> {
    /// Overhead of a node in bytes.
    pub const NODE_SIZE: usize = mem::size_of::<Node<T>>();

    pub const fn new() -> Self {
        Self {
            head: None,
            len: 0,
            marker: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Writes a new node holding `data` at `addr` and makes it the head of
    /// the list.
    ///
    /// Because we are the allocator this method can't allocate. The node is
    /// placed exactly at `addr`, overwriting whatever was there.
    ///
    /// **SAFETY**: `addr` must be valid for writes of [`Self::NODE_SIZE`]
    /// bytes, aligned for `Node<T>`, and nobody else may touch that memory
    /// until the node is popped again.
    pub unsafe fn push(&mut self, data: T, addr: NonNull<u8>) -> NonNull<Node<T>> {
        let node = addr.cast::<Node<T>>();

        unsafe {
            node.as_ptr().write(Node {
                next: self.head,
                data,
            });
        }

        self.head = Some(node);
        self.len += 1;

        node
    }

    /// Unlinks the head node and gives back the address it was written at
    /// together with its element. The memory is not touched any further.
    pub fn pop(&mut self) -> Option<(NonNull<u8>, T)> {
        let node = self.head?;

        // SAFETY: every node in the list was written by `push`, whose caller
        // guaranteed the memory stays ours while it is linked.
        let Node { next, data } = unsafe { node.as_ptr().read() };

        self.head = next;
        self.len -= 1;

        Some((node.cast(), data))
    }
}
