//! Variable bit-width result packing.
//!
//! Values are laid down back to back with no per-value padding. Each value
//! fills the free bits of the byte under the cursor, lowest free bit first,
//! and spills whatever does not fit into the following bytes. The wire
//! carries no alignment metadata, so the reader must know the width used
//! for every value.

#![no_std]

pub mod error {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct Overflow;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct InvalidWidth;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub struct EndOfInput;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum Error {
        Overflow,
        InvalidWidth,
        EndOfInput,
    }

    impl From<Overflow> for Error {
        fn from(_: Overflow) -> Self {
            Self::Overflow
        }
    }

    impl From<InvalidWidth> for Error {
        fn from(_: InvalidWidth) -> Self {
            Self::InvalidWidth
        }
    }

    impl From<EndOfInput> for Error {
        fn from(_: EndOfInput) -> Self {
            Self::EndOfInput
        }
    }
}

/// The widest value the codec can carry.
pub const MAX_WIDTH: u8 = 32;

#[inline]
const fn mask(width: u8) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1 << width) - 1
    }
}

#[inline]
fn check_width(width: u8) -> Result<(), error::InvalidWidth> {
    if (1..=MAX_WIDTH).contains(&width) {
        Ok(())
    } else {
        Err(error::InvalidWidth)
    }
}

/// Number of bytes a batch of `count` values of `width` bits occupies
/// on the wire.
///
/// The byte under the cursor is always counted, so a batch ending exactly
/// on a byte boundary still carries one trailing zero byte (and an empty
/// batch carries one zero byte). Hosts depend on this length.
pub const fn packed_len(count: usize, width: u8) -> usize {
    count * width as usize / 8 + 1
}

/// Packs values into a caller-provided byte buffer.
pub struct BitPacker<'a> {
    buf: &'a mut [u8],
    cursor: usize,
    free: u8,
}

impl<'a> BitPacker<'a> {
    /// Start packing at the beginning of `buf`.
    ///
    /// The first byte is cleared, later bytes are cleared as the
    /// cursor reaches them.
    pub fn new(buf: &'a mut [u8]) -> Result<Self, error::Overflow> {
        *buf.first_mut().ok_or(error::Overflow)? = 0;

        Ok(Self {
            buf,
            cursor: 0,
            free: 8,
        })
    }

    /// Append the low `width` bits of `value`.
    ///
    /// Bits of `value` above `width` are ignored. On error nothing
    /// is written.
    pub fn pack(&mut self, width: u8, value: u32) -> Result<(), error::Error> {
        check_width(width)?;

        let used = self.cursor * 8 + usize::from(8 - self.free);

        // the cursor must still land inside the buffer afterwards
        if (used + usize::from(width)) / 8 >= self.buf.len() {
            Err(error::Overflow)?;
        }

        let value = value & mask(width);
        let mut remaining = width;

        while remaining > 0 {
            let chunk = value >> (width - remaining);
            self.buf[self.cursor] |= (chunk << (8 - self.free)) as u8;

            if self.free > remaining {
                self.free -= remaining;
                remaining = 0;
            } else {
                remaining -= self.free;
                self.free = 8;
                self.cursor += 1;
                self.buf[self.cursor] = 0;
            }
        }

        Ok(())
    }

    /// Append every value of `values` with the same `width`.
    pub fn pack_all(
        &mut self,
        width: u8,
        values: impl IntoIterator<Item = u32>,
    ) -> Result<(), error::Error> {
        values
            .into_iter()
            .try_for_each(|value| self.pack(width, value))
    }

    /// Bytes occupied so far, see [`packed_len`].
    #[inline]
    pub fn len(&self) -> usize {
        self.cursor + 1
    }

    /// A packer always occupies at least the byte under its cursor.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Consume the packer, yielding the payload length.
    #[inline]
    pub fn finish(self) -> usize {
        self.len()
    }
}

/// Reads values back out of a packed buffer.
pub struct BitUnpacker<'a> {
    buf: &'a [u8],
    cursor: usize,
    free: u8,
}

impl<'a> BitUnpacker<'a> {
    pub const fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            cursor: 0,
            free: 8,
        }
    }

    /// Read the next `width` bits as a value.
    pub fn unpack(&mut self, width: u8) -> Result<u32, error::Error> {
        check_width(width)?;

        let used = self.cursor * 8 + usize::from(8 - self.free);

        if used + usize::from(width) > self.buf.len() * 8 {
            Err(error::EndOfInput)?;
        }

        let mut value = 0;
        let mut filled = 0;

        while filled < width {
            let take = self.free.min(width - filled);
            let bits = (u32::from(self.buf[self.cursor]) >> (8 - self.free)) & mask(take);

            value |= bits << filled;
            filled += take;
            self.free -= take;

            if self.free == 0 {
                self.free = 8;
                self.cursor += 1;
            }
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod packing {
        use super::*;

        #[test]
        fn spans_bytes() {
            let mut buf = [0xaa; 8];
            let mut packer = BitPacker::new(&mut buf).unwrap();

            packer.pack(12, 0xabc).unwrap();
            packer.pack(12, 0x123).unwrap();

            let len = packer.finish();

            // aligned tail still counts the byte under the cursor
            assert_eq!(4, len);
            assert_eq!([0xbc, 0x3a, 0x12, 0x00], buf[..len]);
        }

        #[test]
        fn single_bits() {
            let mut buf = [0; 4];
            let mut packer = BitPacker::new(&mut buf).unwrap();

            packer.pack_all(1, [1, 0, 1, 1]).unwrap();

            assert_eq!(1, packer.finish());
            assert_eq!(0b1101, buf[0]);
        }

        #[test]
        fn empty_batch() {
            let mut buf = [0xff; 2];
            let packer = BitPacker::new(&mut buf).unwrap();

            assert_eq!(1, packer.finish());
            assert_eq!(0, buf[0]);
        }

        #[test]
        fn excess_bits_ignored() {
            let mut buf = [0; 4];
            let mut packer = BitPacker::new(&mut buf).unwrap();

            packer.pack(4, 0xf5).unwrap();
            packer.pack(4, 0x0).unwrap();

            assert_eq!(0x05, buf[0]);
        }

        #[test]
        fn overflow() {
            let mut buf = [0; 2];
            let mut packer = BitPacker::new(&mut buf).unwrap();

            packer.pack(8, 0xde).unwrap();

            // would move the cursor past the end
            assert_eq!(Err(error::Error::Overflow), packer.pack(8, 0xad));
            assert_eq!(2, packer.len());

            // a smaller value still fits in the partial byte
            packer.pack(4, 0xf).unwrap();
            assert_eq!([0xde, 0x0f], buf);
        }

        #[test]
        fn no_buffer() {
            assert!(BitPacker::new(&mut []).is_err());
        }

        #[test]
        fn width() {
            let mut buf = [0; 8];
            let mut packer = BitPacker::new(&mut buf).unwrap();

            assert_eq!(Err(error::Error::InvalidWidth), packer.pack(0, 1));
            assert_eq!(Err(error::Error::InvalidWidth), packer.pack(33, 1));
            assert!(packer.pack(32, u32::MAX).is_ok());
        }
    }

    mod unpacking {
        use super::*;

        #[test]
        fn known_layout() {
            let buf = [0xbc, 0x3a, 0x12, 0x00];
            let mut unpacker = BitUnpacker::new(&buf);

            assert_eq!(Ok(0xabc), unpacker.unpack(12));
            assert_eq!(Ok(0x123), unpacker.unpack(12));
        }

        #[test]
        fn end_of_input() {
            let buf = [0xff];
            let mut unpacker = BitUnpacker::new(&buf);

            assert_eq!(Ok(0x3f), unpacker.unpack(6));
            assert_eq!(Err(error::Error::EndOfInput), unpacker.unpack(3));
            assert_eq!(Ok(0x3), unpacker.unpack(2));
        }
    }

    #[test]
    fn round_trip() {
        for width in [1, 8, 12, 16, 20, 24, 32] {
            for count in [0, 1, 8, 31] {
                let mut buf = [0; 128];

                let values = (0..count as u32).map(|i| i.wrapping_mul(0x9e37_79b9) & mask(width));

                let mut packer = BitPacker::new(&mut buf).unwrap();
                packer.pack_all(width, values.clone()).unwrap();

                assert_eq!(packed_len(count, width), packer.finish());

                let mut unpacker = BitUnpacker::new(&buf);

                for expected in values {
                    assert_eq!(Ok(expected), unpacker.unpack(width));
                }
            }
        }
    }
}
