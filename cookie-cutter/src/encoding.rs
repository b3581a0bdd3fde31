use core::{marker::PhantomData, mem::MaybeUninit};

use crate::{error, SerializeBuf, SerializeIter};

/// Types implement this trait
/// to be used as indication of
/// a specific encoding scheme.
pub trait Encoding {
    /// The fundamental word of the
    /// encoding scheme.
    ///
    /// i.e. `u8` for `[u8; ...]` mediums.
    type Word;
}

/// Implements number serialization for a byte encoding
/// given the byte order conversions to use.
macro_rules! impl_numbers {
    ($ENCODING:ty, $TO:ident, $FROM:ident, $(($TYPE:ty, $SIZE:expr)),+ $(,)?) => {
        $(
            impl $crate::SerializeIter<$ENCODING> for $TYPE {
                fn serialize_iter<'a>(
                    &self,
                    dst: impl IntoIterator<Item = &'a mut <$ENCODING as $crate::encoding::Encoding>::Word>,
                ) -> Result<(), $crate::error::EndOfInput>
                where
                    <$ENCODING as $crate::encoding::Encoding>::Word: 'a,
                {
                    let mut dst = dst.into_iter();

                    for byte in self.$TO() {
                        *dst.next().ok_or($crate::error::EndOfInput)? = byte;
                    }

                    Ok(())
                }

                fn deserialize_iter<'a>(
                    src: impl IntoIterator<Item = &'a <$ENCODING as $crate::encoding::Encoding>::Word>,
                ) -> Result<Self, $crate::error::Error>
                where
                    <$ENCODING as $crate::encoding::Encoding>::Word: 'a,
                {
                    let mut src = src.into_iter();

                    // all byte values are valid
                    let bytes = ::fill_array::fill![*src.next().ok_or($crate::error::EndOfInput)?; $SIZE];

                    Ok(Self::$FROM(bytes))
                }
            }

            // SAFETY: a wrong $SIZE fails to compile against `$FROM`
            unsafe impl $crate::SerializeBuf<$ENCODING> for $TYPE {
                type Serialized = [u8; $SIZE];
            }
        )+
    };
}

pub mod network;
pub mod vanilla;

// bool impls

impl<E: Encoding<Word = u8>> SerializeIter<E> for bool {
    fn serialize_iter<'a>(
        &self,
        dst: impl IntoIterator<Item = &'a mut E::Word>,
    ) -> Result<(), error::EndOfInput>
    where
        E::Word: 'a,
    {
        *dst.into_iter().next().ok_or(error::EndOfInput)? = u8::from(*self);

        Ok(())
    }

    fn deserialize_iter<'a>(src: impl IntoIterator<Item = &'a E::Word>) -> Result<Self, error::Error>
    where
        E::Word: 'a,
    {
        match *src.into_iter().next().ok_or(error::EndOfInput)? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(error::Invalid)?,
        }
    }
}

unsafe impl<E: Encoding<Word = u8>> SerializeBuf<E> for bool {
    type Serialized = [u8; 1];
}

// array impls

impl<E: Encoding, T: SerializeIter<E>, const N: usize> SerializeIter<E> for [T; N] {
    fn serialize_iter<'a>(
        &self,
        dst: impl IntoIterator<Item = &'a mut E::Word>,
    ) -> Result<(), error::EndOfInput>
    where
        E::Word: 'a,
    {
        let mut dst = dst.into_iter();

        for item in self {
            item.serialize_iter(&mut dst)?;
        }

        Ok(())
    }

    fn deserialize_iter<'a>(src: impl IntoIterator<Item = &'a E::Word>) -> Result<Self, error::Error>
    where
        E::Word: 'a,
    {
        let mut src = src.into_iter();

        // `MaybeUninit` avoids a `Default` requirement
        let mut result: [MaybeUninit<T>; N] = [const { MaybeUninit::uninit() }; N];

        for value in result.iter_mut() {
            value.write(T::deserialize_iter(&mut src)?);
        }

        // SAFETY: by now all elements are initialized
        Ok(result.map(|e| unsafe { e.assume_init() }))
    }
}

// tuple impls

macro_rules! impl_tuple {
    ( $(($TYPE:ident, $NAME:ident)),+ ) => {
        impl<E: Encoding, $($TYPE: SerializeIter<E>),+> SerializeIter<E> for ($($TYPE,)+) {
            fn serialize_iter<'a>(
                &self,
                dst: impl IntoIterator<Item = &'a mut E::Word>,
            ) -> Result<(), error::EndOfInput>
            where
                E::Word: 'a,
            {
                let mut dst = dst.into_iter();

                let ($($NAME,)+) = self;

                $(
                    $NAME.serialize_iter(&mut dst)?;
                )+

                Ok(())
            }

            fn deserialize_iter<'a>(
                src: impl IntoIterator<Item = &'a E::Word>,
            ) -> Result<Self, error::Error>
            where
                E::Word: 'a,
            {
                let mut src = src.into_iter();

                $(
                    let $NAME = $TYPE::deserialize_iter(&mut src)?;
                )+

                Ok(($($NAME,)+))
            }
        }
    };
}

impl_tuple!((A, a));
impl_tuple!((A, a), (B, b));
impl_tuple!((A, a), (B, b), (C, c));
impl_tuple!((A, a), (B, b), (C, c), (D, d));

// PhantomData impl (no-op)

impl<E: Encoding, T> SerializeIter<E> for PhantomData<T> {
    fn serialize_iter<'a>(
        &self,
        _dst: impl IntoIterator<Item = &'a mut E::Word>,
    ) -> Result<(), error::EndOfInput>
    where
        E::Word: 'a,
    {
        Ok(())
    }

    fn deserialize_iter<'a>(_src: impl IntoIterator<Item = &'a E::Word>) -> Result<Self, error::Error>
    where
        E::Word: 'a,
    {
        Ok(PhantomData)
    }
}

#[cfg(test)]
mod tests {
    use super::{network::Network, vanilla::Vanilla};
    use crate::{error, SerializeBuf, SerializeIter};

    #[test]
    fn bool() {
        let mut buf = [0; 1];

        for val in [false, true] {
            SerializeIter::<Vanilla>::serialize_iter(&val, buf.iter_mut()).unwrap();

            assert_eq!(
                val,
                <bool as SerializeIter<Network>>::deserialize_iter(buf.iter()).unwrap()
            );
        }

        for num in 2..=u8::MAX {
            buf[0] = num;

            match <bool as SerializeIter<Vanilla>>::deserialize_iter(buf.iter()) {
                Err(error::Error::Invalid) => {}
                _ => panic!(),
            }

            assert!(<bool as SerializeBuf<Vanilla>>::deserialize_buf(&buf).is_err());
        }
    }

    #[test]
    fn array() {
        let mut buf = [0; 6];

        let words: [u16; 3] = [0x0102, 0x0304, 0x0506];
        SerializeIter::<Network>::serialize_iter(&words, buf.iter_mut()).unwrap();

        assert_eq!([1, 2, 3, 4, 5, 6], buf);
        assert_eq!(
            words,
            <[u16; 3] as SerializeIter<Network>>::deserialize_iter(buf.iter()).unwrap()
        );

        // one word short
        match <[u16; 4] as SerializeIter<Network>>::deserialize_iter(buf.iter()) {
            Err(error::Error::EndOfInput) => {}
            _ => panic!(),
        }
    }

    #[test]
    fn tuple() {
        let mut buf = [0; 4];

        let value = (0xeb_u8, true, 0x0203_u16);
        SerializeIter::<Vanilla>::serialize_iter(&value, buf.iter_mut()).unwrap();

        assert_eq!([0xeb, 1, 0x03, 0x02], buf);
        assert_eq!(
            value,
            <(u8, bool, u16) as SerializeIter<Vanilla>>::deserialize_iter(buf.iter()).unwrap()
        );

        // destination too small
        assert!(SerializeIter::<Vanilla>::serialize_iter(&value, buf[..3].iter_mut()).is_err());
    }
}
