//! A static, modular, and light-weight serialization framework.
//!
//! Every implementation is parameterized by an [`Encoding`](encoding::Encoding),
//! so one type can be laid out differently on different wires. Two byte
//! encodings are provided: [`Vanilla`](encoding::vanilla::Vanilla) (little-endian)
//! and [`Network`](encoding::network::Network) (big-endian).

#![no_std]

pub mod encoding;
pub mod medium;

use core::hint::unreachable_unchecked;

use encoding::{vanilla::Vanilla, Encoding};
use medium::Medium;

// export proc macro
pub use macros::SerializeIter;

pub mod error {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct EndOfInput;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Invalid;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum Error {
        EndOfInput,
        Invalid,
    }

    impl From<EndOfInput> for Error {
        fn from(_: EndOfInput) -> Self {
            Self::EndOfInput
        }
    }

    impl From<Invalid> for Error {
        fn from(_: Invalid) -> Self {
            Self::Invalid
        }
    }
}

/// Serialize to and deserialize from a medium
/// through iterators over its words.
///
/// The medium length is a constraint of the
/// destination, not of the type.
pub trait SerializeIter<E: Encoding = Vanilla>: Sized {
    fn serialize_iter<'a>(
        &self,
        dst: impl IntoIterator<Item = &'a mut E::Word>,
    ) -> Result<(), error::EndOfInput>
    where
        E::Word: 'a;

    fn deserialize_iter<'a>(
        src: impl IntoIterator<Item = &'a E::Word>,
    ) -> Result<Self, error::Error>
    where
        E::Word: 'a;
}

/// Serialization to and from a medium of exact length.
///
/// # Safety
///
/// `Serialized` must be long enough to hold any value
/// of the implementer type. An insufficient length
/// *will* result in UB.
pub unsafe trait SerializeBuf<E: Encoding = Vanilla>: SerializeIter<E> {
    type Serialized: Medium<E>;

    fn serialize_buf(&self, dest: &mut Self::Serialized) {
        // SAFETY: `Serialized` is of sufficient length
        unsafe {
            <Self as SerializeIter<E>>::serialize_iter(self, dest.get_iter_mut()).unwrap_unchecked()
        };
    }

    fn deserialize_buf(src: &Self::Serialized) -> Result<Self, error::Invalid> {
        <Self as SerializeIter<E>>::deserialize_iter(src.get_iter()).or_else(|err| match err {
            error::Error::Invalid => Err(error::Invalid),
            // SAFETY: `Serialized` is of sufficient length
            error::Error::EndOfInput => unsafe { unreachable_unchecked() },
        })
    }
}
