//! Big-endian ("network order") byte encoding.

use super::Encoding;

pub struct Network;

impl Encoding for Network {
    type Word = u8;
}

impl_numbers!(
    Network,
    to_be_bytes,
    from_be_bytes,
    (u8, 1),
    (u16, 2),
    (u32, 4),
    (i8, 1),
    (i16, 2),
    (i32, 4),
);

#[cfg(test)]
mod tests {
    use super::Network;
    use crate::{SerializeBuf, SerializeIter};

    #[test]
    fn byte_order() {
        let mut buf = [0; 2];

        SerializeIter::<Network>::serialize_iter(&0x0003_u16, buf.iter_mut()).unwrap();
        assert_eq!([0x00, 0x03], buf);

        let mut buf = <u32 as SerializeBuf<Network>>::Serialized::default();
        SerializeBuf::<Network>::serialize_buf(&0x0102_0304_u32, &mut buf);
        assert_eq!([1, 2, 3, 4], buf);

        assert_eq!(
            Ok(-2),
            <i16 as SerializeBuf<Network>>::deserialize_buf(&[0xff, 0xfe])
        );
    }
}
