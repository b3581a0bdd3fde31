use core::borrow::Borrow;

use super::ChecksumProvider;

/// Passes words through unchanged, adding each to a running checksum.
///
/// Owned or borrowed words both work, so it can sit in front of a
/// deserializer or tally a plain byte source.
pub(crate) struct Summing<'p, C, I> {
    provider: &'p mut C,
    words: I,
}

impl<'p, C, I> Summing<'p, C, I> {
    pub fn new(provider: &'p mut C, words: I) -> Self {
        Self { provider, words }
    }
}

impl<C, I> Iterator for Summing<'_, C, I>
where
    C: ChecksumProvider,
    I: Iterator,
    I::Item: Borrow<C::Word>,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        let word = self.words.next()?;
        self.provider.update(word.borrow());

        Some(word)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.words.size_hint()
    }
}
