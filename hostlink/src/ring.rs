//! Fixed-capacity byte ring for bytes captured in interrupt context.

use core::mem::MaybeUninit;

pub mod error {
    /// Bytes that did not fit were dropped.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Overrun {
        pub dropped: usize,
    }
}

pub struct ByteRing<const N: usize> {
    buf: [MaybeUninit<u8>; N],
    start_cursor: usize,
    size: usize,
}

impl<const N: usize> Default for ByteRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteRing<N> {
    pub const fn new() -> Self {
        Self {
            buf: [MaybeUninit::uninit(); N],
            start_cursor: 0,
            size: 0,
        }
    }

    /// Append one byte.
    pub fn push(&mut self, byte: u8) -> Result<(), error::Overrun> {
        if self.len() >= N {
            Err(error::Overrun { dropped: 1 })?;
        }

        let write_cursor = self.end_cursor();
        // SAFETY: the end cursor is always wrapped into bounds
        unsafe { self.buf.get_unchecked_mut(write_cursor) }.write(byte);
        self.size += 1;

        Ok(())
    }

    /// Append as many bytes as fit, dropping the rest.
    pub fn ingest<'a>(
        &mut self,
        src: impl IntoIterator<Item = &'a u8>,
    ) -> Result<(), error::Overrun> {
        let mut dropped = 0;

        for &byte in src {
            if self.push(byte).is_err() {
                dropped += 1;
            }
        }

        if dropped > 0 {
            Err(error::Overrun { dropped })?;
        }

        Ok(())
    }

    /// Evict the provided number of bytes (oldest).
    ///
    /// # Safety
    ///
    /// A value of `count` greater than the number of
    /// values present in the buffer will result in UB.
    unsafe fn evict_unchecked(&mut self, count: usize) {
        self.start_cursor = Self::wrap(self.start_cursor + count);
        self.size -= count;
    }

    /// Drop every byte.
    #[inline]
    pub fn clear(&mut self) {
        self.start_cursor = 0;
        self.size = 0;
    }

    #[inline]
    fn wrap(cursor: usize) -> usize {
        cursor % N
    }

    #[inline]
    fn end_cursor(&self) -> usize {
        Self::wrap(self.start_cursor + self.len())
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over the held bytes, oldest first,
    /// without evicting them.
    #[inline]
    pub fn iter(&mut self) -> ByteRingIter<'_, N> {
        ByteRingIter::new(self)
    }

    /// Evict all bytes that have been visited by
    /// the memented iterator.
    #[inline]
    pub fn flush(&mut self, IterMemento(count): IterMemento) {
        // SAFETY: an iterator never visits more than `size` bytes
        unsafe {
            self.evict_unchecked(count);
        }
    }
}

/// The final state of a `ByteRingIter`,
/// telling the ring how many bytes were visited.
pub struct IterMemento(usize);

pub struct ByteRingIter<'a, const N: usize> {
    parent: &'a ByteRing<N>,
    visited: usize,
}

impl<'a, const N: usize> ByteRingIter<'a, N> {
    fn new(parent: &'a mut ByteRing<N>) -> Self {
        Self { parent, visited: 0 }
    }

    #[inline]
    fn cursor(&self) -> usize {
        ByteRing::<N>::wrap(self.parent.start_cursor + self.visited)
    }

    /// Capture the end state of this iterator
    /// so the ring can evict what was visited.
    #[inline]
    pub fn capture(self) -> IterMemento {
        IterMemento(self.visited)
    }
}

impl<'a, const N: usize> Iterator for ByteRingIter<'a, N> {
    type Item = &'a u8;

    fn next(&mut self) -> Option<Self::Item> {
        if self.visited >= self.parent.len() {
            return None;
        }

        // SAFETY: every position between the start cursor
        // and `size` bytes past it has been written
        let byte = unsafe {
            self.parent
                .buf
                .get_unchecked(self.cursor())
                .assume_init_ref()
        };

        self.visited += 1;

        Some(byte)
    }
}
