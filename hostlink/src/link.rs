//! The checksummed, length-prefixed frame transport.
//!
//! ```text
//! [0xFF][length][seq hi][seq lo][cmd hi][cmd lo][operands..][checksum]
//! ```
//!
//! `length` counts every byte of the frame and the checksum is the
//! 8-bit sum of all bytes before it. Bad frames are dropped without
//! a reply, the host retries on its own timeout.

use cookie_cutter::{encoding::network::Network, SerializeIter};
use heapless::Vec;

use crate::{
    checksum::{Additive8, ChecksumProvider, Summing},
    config::COMMAND_CAPACITY,
};

pub mod command;

pub const START_OF_FRAME: u8 = 0xff;

/// Bytes before the operands.
pub const HEADER_LEN: usize = 6;

/// A header and its checksum.
pub const MIN_FRAME_LEN: usize = HEADER_LEN + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FramingError {
    Empty,
    StartOfFrame,
    Length,
    Checksum,
}

#[derive(SerializeIter)]
struct LinkHeader {
    start: u8,
    length: u8,
    sequence: u16,
    command: u16,
}

/// A validated command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub sequence: u16,
    pub command: u16,
    pub operands: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Validate `raw` as exactly one frame.
    ///
    /// Checks run in order: start of frame, length, checksum.
    pub fn parse(raw: &'a [u8]) -> Result<Self, FramingError> {
        let (&check, body) = raw.split_last().ok_or(FramingError::Empty)?;

        if raw[0] != START_OF_FRAME {
            Err(FramingError::StartOfFrame)?;
        }

        if raw.len() < MIN_FRAME_LEN || usize::from(raw[1]) != raw.len() {
            Err(FramingError::Length)?;
        }

        let mut provider = Additive8::new();
        let mut src = body.iter();

        let header = <LinkHeader as SerializeIter<Network>>::deserialize_iter(
            Summing::new(&mut provider, &mut src),
        )
        .map_err(|_| FramingError::Length)?;

        let operands = src.as_slice();

        if provider.compute(src) != check {
            Err(FramingError::Checksum)?;
        }

        Ok(Self {
            sequence: header.sequence,
            command: header.command,
            operands,
        })
    }
}

/// Collects frame bytes arriving in arbitrary chunks.
///
/// Bytes ahead of a start of frame are skipped and a declared length
/// that can never fit drops the partial frame.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buf: Vec<u8, COMMAND_CAPACITY>,
}

impl FrameAssembler {
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Take bytes from `src` until a frame is complete,
    /// yielding how many were taken.
    pub fn ingest(&mut self, src: &[u8]) -> usize {
        let mut taken = 0;

        for &byte in src {
            if self.is_complete() {
                break;
            }

            taken += 1;

            if self.buf.is_empty() && byte != START_OF_FRAME {
                trace!("skipping {=u8:#x}", byte);

                continue;
            }

            // the declared length always leaves room for this byte
            self.buf.push(byte).ok();

            if let Some(&declared) = self.buf.get(1) {
                if !(MIN_FRAME_LEN..=COMMAND_CAPACITY).contains(&usize::from(declared)) {
                    warn!("dropping frame declaring {=u8} bytes", declared);

                    self.buf.clear();
                }
            }
        }

        taken
    }

    fn is_complete(&self) -> bool {
        self.buf
            .get(1)
            .is_some_and(|&declared| usize::from(declared) == self.buf.len())
    }

    /// The collected frame, once complete.
    pub fn frame(&self) -> Option<&[u8]> {
        self.is_complete().then_some(self.buf.as_slice())
    }

    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::checksum;

    fn seal<const N: usize>(mut frame: [u8; N]) -> [u8; N] {
        frame[N - 1] = checksum(&frame[..N - 1]);

        frame
    }

    mod parse {
        use super::*;

        #[test]
        fn device_id() {
            let raw = [0xff, 0x07, 0x00, 0x01, 0x00, 0x03, 0x0a];

            assert_eq!(
                Ok(Frame {
                    sequence: 1,
                    command: 0x0003,
                    operands: &[],
                }),
                Frame::parse(&raw)
            );
        }

        #[test]
        fn operands() {
            let raw = seal([0xff, 0x0a, 0x12, 0x34, 0x00, 0x42, 20, 21, 47, 0]);
            let frame = Frame::parse(&raw).unwrap();

            assert_eq!(0x1234, frame.sequence);
            assert_eq!(0x0042, frame.command);
            assert_eq!(&[20, 21, 47], frame.operands);
        }

        #[test]
        fn rejects() {
            assert_eq!(Err(FramingError::Empty), Frame::parse(&[]));
            assert_eq!(
                Err(FramingError::StartOfFrame),
                Frame::parse(&seal([0xfe, 0x07, 0x00, 0x01, 0x00, 0x03, 0]))
            );
            assert_eq!(
                Err(FramingError::Length),
                Frame::parse(&seal([0xff, 0x08, 0x00, 0x01, 0x00, 0x03, 0]))
            );
            assert_eq!(
                Err(FramingError::Length),
                Frame::parse(&seal([0xff, 0x03, 0]))
            );
            assert_eq!(
                Err(FramingError::Checksum),
                Frame::parse(&[0xff, 0x07, 0x00, 0x01, 0x00, 0x03, 0x0b])
            );
        }

        #[test]
        fn any_single_corruption() {
            let raw = seal([0xff, 0x09, 0x00, 0x07, 0x00, 0x64, 1, 2, 0]);

            for index in 0..raw.len() {
                for flip in [0x01, 0x10, 0x80] {
                    let mut corrupted = raw;
                    corrupted[index] ^= flip;

                    assert!(Frame::parse(&corrupted).is_err());
                }
            }
        }
    }

    mod assembler {
        use super::*;

        #[test]
        fn chunks() {
            let raw = seal([0xff, 0x08, 0x00, 0x02, 0x00, 0x42, 20, 0]);
            let mut assembler = FrameAssembler::new();

            assert_eq!(3, assembler.ingest(&raw[..3]));
            assert_eq!(None, assembler.frame());

            assert_eq!(5, assembler.ingest(&raw[3..]));
            assert_eq!(Some(&raw[..]), assembler.frame());

            assembler.clear();
            assert!(assembler.is_empty());
        }

        #[test]
        fn stops_at_frame_end() {
            let first = seal([0xff, 0x07, 0x00, 0x01, 0x00, 0x00, 0]);
            let mut stream = [0; 14];
            stream[..7].copy_from_slice(&first);
            stream[7..].copy_from_slice(&first);

            let mut assembler = FrameAssembler::new();

            assert_eq!(7, assembler.ingest(&stream));
            assert_eq!(Some(&first[..]), assembler.frame());
            assert_eq!(0, assembler.ingest(&stream[7..]));
        }

        #[test]
        fn resynchronizes() {
            let raw = seal([0xff, 0x07, 0x00, 0x01, 0x00, 0x03, 0]);
            let mut assembler = FrameAssembler::new();

            // noise, then a header declaring an impossible length
            assembler.ingest(&[0x00, 0x12, 0xff, 0x02]);
            assert!(assembler.is_empty());

            assembler.ingest(&raw);
            assert_eq!(Some(&raw[..]), assembler.frame());
        }
    }
}
