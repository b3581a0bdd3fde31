//! Reply assembly for both transports.

use cookie_cutter::{
    encoding::{network::Network, vanilla::Vanilla},
    error::EndOfInput,
    SerializeBuf, SerializeIter,
};
use heapless::Vec;
use packit::{error::Overflow, BitPacker};

use crate::{checksum::checksum, config::RESPONSE_DATA_CAPACITY, link::START_OF_FRAME};

/// Bytes around the payload of a reply frame.
pub const REPLY_OVERHEAD: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum I2cStatus {
    SlaveAddress = 0x80,
    EndOfFile,
    WriteFail,
    ReadFail,
    CloseFail,
    OpenFail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum UartStatus {
    OpenFail = 0x80,
    SetBaudFail,
    AvailableFail,
    ReadFail,
    WriteFail,
    CloseFail,
}

/// Reply status.
///
/// Peripheral specific codes share one range, so the
/// meaning of a code depends on the command it answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    Ok,
    FunctionNotSupported,
    RequestResend,
    UnknownError,
    Disconnect,
    I2c(I2cStatus),
    Uart(UartStatus),
}

impl Status {
    pub const fn code(self) -> u8 {
        match self {
            Self::Ok => 0x00,
            Self::FunctionNotSupported => 0x01,
            Self::RequestResend => 0x02,
            Self::UnknownError => 0x03,
            Self::Disconnect => 0x04,
            Self::I2c(status) => status as u8,
            Self::Uart(status) => status as u8,
        }
    }
}

#[derive(SerializeIter)]
struct ReplyHeader {
    start: u8,
    length: u8,
    sequence: u16,
    status: u8,
}

/// A reply to one checksummed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: Status,
    payload: Vec<u8, RESPONSE_DATA_CAPACITY>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub const fn new() -> Self {
        Self {
            status: Status::Ok,
            payload: Vec::new(),
        }
    }

    /// An empty reply carrying only `status`.
    pub const fn with_status(status: Status) -> Self {
        Self {
            status,
            payload: Vec::new(),
        }
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn push(&mut self, byte: u8) -> Result<(), Overflow> {
        self.payload.push(byte).map_err(|_| Overflow)
    }

    pub fn extend(&mut self, bytes: &[u8]) -> Result<(), Overflow> {
        self.payload.extend_from_slice(bytes).map_err(|_| Overflow)
    }

    /// Append a big-endian word.
    pub fn push_word(&mut self, word: u32) -> Result<(), Overflow> {
        let mut buf = [0; 4];
        SerializeBuf::<Network>::serialize_buf(&word, &mut buf);

        self.extend(&buf)
    }

    /// Append `bits` eight to a byte, the first in the most significant bit.
    ///
    /// Only whole bytes are added, the last one zero padded.
    pub fn push_bits(&mut self, bits: impl IntoIterator<Item = bool>) -> Result<(), Overflow> {
        let start = self.payload.len();

        for (index, bit) in bits.into_iter().enumerate() {
            if index % 8 == 0 && self.payload.push(0).is_err() {
                self.payload.truncate(start);

                return Err(Overflow);
            }

            if !bit {
                continue;
            }

            if let Some(byte) = self.payload.last_mut() {
                *byte |= 0x80 >> (index % 8);
            }
        }

        Ok(())
    }

    /// Append `values` packed at `width` bits each.
    ///
    /// The payload is left untouched if the batch does not fit.
    pub fn pack(
        &mut self,
        width: u8,
        values: impl IntoIterator<Item = u32>,
    ) -> Result<(), packit::error::Error> {
        let start = self.payload.len();

        // lend the spare capacity to the packer
        self.payload
            .resize(self.payload.capacity(), 0)
            .map_err(|_| Overflow)?;

        let packed = BitPacker::new(&mut self.payload[start..])
            .map_err(packit::error::Error::from)
            .and_then(|mut packer| {
                packer.pack_all(width, values)?;

                Ok(packer.finish())
            });

        match packed {
            Ok(len) => {
                self.payload.truncate(start + len);

                Ok(())
            }
            Err(err) => {
                self.payload.truncate(start);

                Err(err)
            }
        }
    }

    /// Write the reply frame answering `sequence` into `dst`,
    /// yielding its length.
    pub fn render(&self, sequence: u16, dst: &mut [u8]) -> Result<usize, EndOfInput> {
        let len = REPLY_OVERHEAD + self.payload.len();

        if len > dst.len() {
            Err(EndOfInput)?;
        }

        let header = ReplyHeader {
            start: START_OF_FRAME,
            length: u8::try_from(len).map_err(|_| EndOfInput)?,
            sequence,
            status: self.status.code(),
        };

        SerializeIter::<Network>::serialize_iter(&header, dst.iter_mut())?;

        let body = REPLY_OVERHEAD - 1;
        dst[body..len - 1].copy_from_slice(&self.payload);
        dst[len - 1] = checksum(&dst[..len - 1]);

        Ok(len)
    }
}

/// The fixed-size reply word of the streaming transport.
pub fn stream_reply(word: u32) -> [u8; 4] {
    let mut buf = [0; 4];
    SerializeBuf::<Vanilla>::serialize_buf(&word, &mut buf);

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    mod frame {
        use super::*;

        #[test]
        fn device_id() {
            let mut response = Response::new();
            response.extend(&[0xff, 0x00]).unwrap();

            let mut buf = [0; 16];
            let len = response.render(0x0001, &mut buf).unwrap();

            let cs = checksum(&[0xff, 0x08, 0x00, 0x01, 0x00, 0xff, 0x00]);
            assert_eq!([0xff, 0x08, 0x00, 0x01, 0x00, 0xff, 0x00, cs], buf[..len]);
        }

        #[test]
        fn status_only() {
            let response = Response::with_status(Status::FunctionNotSupported);

            let mut buf = [0; 6];
            assert_eq!(Ok(6), response.render(0xbeef, &mut buf));

            assert_eq!([0xff, 0x06, 0xbe, 0xef, 0x01], buf[..5]);
            assert_eq!(checksum(&buf[..5]), buf[5]);
        }

        #[test]
        fn short_destination() {
            let response = Response::new();

            assert_eq!(Err(EndOfInput), response.render(0, &mut [0; 5]));
        }
    }

    mod payload {
        use super::*;

        #[test]
        fn word() {
            let mut response = Response::new();
            response.push_word(9600).unwrap();

            assert_eq!(&[0x00, 0x00, 0x25, 0x80], response.payload());
        }

        #[test]
        fn resolution_then_values() {
            let mut response = Response::new();

            response.push(12).unwrap();
            response.pack(12, [0xabc, 0x123]).unwrap();

            assert_eq!(&[12, 0xbc, 0x3a, 0x12, 0x00], response.payload());
        }

        #[test]
        fn bits() {
            let mut response = Response::new();

            response.push_bits([true, false, true]).unwrap();
            assert_eq!(&[0b1010_0000], response.payload());

            // a full byte gets no trailing padding byte
            let mut response = Response::new();
            response.push_bits([true; 8]).unwrap();
            assert_eq!(&[0xff], response.payload());

            let mut nine = [false; 9];
            nine[1] = true;
            nine[8] = true;
            response.push_bits(nine).unwrap();
            assert_eq!(&[0xff, 0b0100_0000, 0b1000_0000], response.payload());

            let mut response = Response::new();
            response.push_bits([]).unwrap();
            assert!(response.payload().is_empty());
        }

        #[test]
        fn bits_overflow() {
            let mut response = Response::new();
            response.extend(&[0; RESPONSE_DATA_CAPACITY - 1]).unwrap();

            assert_eq!(Err(Overflow), response.push_bits([true; 9]));
            assert_eq!(RESPONSE_DATA_CAPACITY - 1, response.payload().len());
        }

        #[test]
        fn pack_overflow() {
            let mut response = Response::new();
            response.extend(&[0; RESPONSE_DATA_CAPACITY - 2]).unwrap();

            assert_eq!(
                Err(packit::error::Error::Overflow),
                response.pack(16, [1, 2])
            );
            assert_eq!(RESPONSE_DATA_CAPACITY - 2, response.payload().len());

            assert!(response.push(0).is_ok());
            assert!(response.push(0).is_ok());
            assert!(response.push(0).is_err());
        }
    }

    #[test]
    fn status_codes() {
        assert_eq!(0x00, Status::Ok.code());
        assert_eq!(0x03, Status::UnknownError.code());
        assert_eq!(0x04, Status::Disconnect.code());
        assert_eq!(0x83, Status::I2c(I2cStatus::ReadFail).code());
        assert_eq!(0x85, Status::Uart(UartStatus::CloseFail).code());
    }

    #[test]
    fn stream_word() {
        assert_eq!([0x2c, 0x01, 0x00, 0x00], stream_reply(0x012c));
        assert_eq!([0xff; 4], stream_reply(crate::dispatch::Reply::SENTINEL));
    }
}
