//! Frame integrity checks.

use cookie_cutter::{encoding::network::Network, SerializeIter};

pub(crate) use iter::Summing;

mod iter;

/// Describes types that accumulate a checksum
/// over a sequence of words.
pub trait ChecksumProvider {
    type Word;
    type Rep: SerializeIter<Network> + Eq + Copy;

    fn update(&mut self, word: &Self::Word);

    /// Yield the checksum and start over.
    fn finalize(&mut self) -> Self::Rep;

    fn compute<'a>(&mut self, words: impl IntoIterator<Item = &'a Self::Word>) -> Self::Rep
    where
        Self::Word: 'a,
    {
        for word in words {
            self.update(word);
        }

        self.finalize()
    }
}

/// The 8-bit wrapping sum of every byte.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Additive8 {
    sum: u8,
}

impl Additive8 {
    pub const fn new() -> Self {
        Self { sum: 0 }
    }
}

impl ChecksumProvider for Additive8 {
    type Word = u8;
    type Rep = u8;

    #[inline]
    fn update(&mut self, word: &u8) {
        self.sum = self.sum.wrapping_add(*word);
    }

    #[inline]
    fn finalize(&mut self) -> u8 {
        core::mem::take(&mut self.sum)
    }
}

/// Additive checksum of `bytes`.
pub fn checksum(bytes: &[u8]) -> u8 {
    Additive8::new().compute(bytes)
}
