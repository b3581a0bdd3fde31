use core::slice;

use crate::encoding::Encoding;

/// Fixed-length storage a value is serialized into.
///
/// Implementors name their own word iterators.
pub trait Medium<E: Encoding> {
    const SIZE: usize;

    type Iter<'a>: Iterator<Item = &'a E::Word>
    where
        Self: 'a,
        E::Word: 'a;

    type IterMut<'a>: Iterator<Item = &'a mut E::Word>
    where
        Self: 'a,
        E::Word: 'a;

    fn get_iter(&self) -> Self::Iter<'_>;

    fn get_iter_mut(&mut self) -> Self::IterMut<'_>;
}

// byte arrays serve every byte encoding
impl<E: Encoding<Word = u8>, const N: usize> Medium<E> for [u8; N] {
    const SIZE: usize = N;

    type Iter<'a> = slice::Iter<'a, u8>;
    type IterMut<'a> = slice::IterMut<'a, u8>;

    #[inline]
    fn get_iter(&self) -> Self::Iter<'_> {
        self.iter()
    }

    #[inline]
    fn get_iter_mut(&mut self) -> Self::IterMut<'_> {
        self.iter_mut()
    }
}
