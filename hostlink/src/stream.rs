//! The sync-byte delimited streaming transport of the peripheral bus.
//!
//! ```text
//! [0xEB][L][payload; L]
//! ```
//!
//! There is no checksum, integrity rests on the declared length.
//! Replies are bare 4-byte words.

use cookie_cutter::{encoding::vanilla::Vanilla, SerializeIter};
use heapless::Vec;

use crate::config::STREAM_PAYLOAD_CAPACITY;

pub const SYNC: u8 = 0xeb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Scanning for the sync byte.
    Waiting,
    /// The next byte is the payload length.
    LengthPending,
    Receiving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// A sync byte opened a transfer.
    Started,
    /// The declared number of bytes arrived.
    Complete,
    /// The transfer declared more bytes than can be held.
    Discarded,
}

/// The at most one transfer in flight.
pub struct StreamFramer<const N: usize = STREAM_PAYLOAD_CAPACITY> {
    state: State,
    declared: u8,
    received: u8,
    payload: Vec<u8, N>,
    complete: bool,
    last_activity: u32,
}

impl<const N: usize> Default for StreamFramer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> StreamFramer<N> {
    pub const fn new() -> Self {
        Self {
            state: State::Waiting,
            declared: 0,
            received: 0,
            payload: Vec::new(),
            complete: false,
            last_activity: 0,
        }
    }

    /// Advance by one received byte, `now` being the current tick.
    pub fn push(&mut self, byte: u8, now: u32) -> Option<Event> {
        self.last_activity = now;

        match self.state {
            State::Waiting => {
                if byte != SYNC {
                    trace!("skipping {=u8:#x}", byte);

                    return None;
                }

                self.payload.clear();
                self.complete = false;
                self.state = State::LengthPending;

                Some(Event::Started)
            }
            State::LengthPending => {
                self.declared = byte;
                self.received = 0;

                if byte == 0 {
                    return Some(self.finish());
                }

                self.state = State::Receiving;

                None
            }
            State::Receiving => {
                self.received += 1;

                // overlong transfers are still counted out
                self.payload.push(byte).ok();

                (self.received == self.declared).then(|| self.finish())
            }
        }
    }

    fn finish(&mut self) -> Event {
        self.state = State::Waiting;

        if usize::from(self.declared) > N {
            warn!("dropped {=u8} byte transfer", self.declared);
            self.payload.clear();

            return Event::Discarded;
        }

        self.complete = true;

        Event::Complete
    }

    /// The completed payload, handed out once.
    pub fn take(&mut self) -> Option<&[u8]> {
        if !core::mem::take(&mut self.complete) {
            return None;
        }

        Some(&self.payload)
    }

    /// Abandon any transfer in flight.
    pub fn reset(&mut self) {
        if self.state != State::Waiting {
            debug!("abandoning transfer in {}", self.state);
        }

        self.state = State::Waiting;
        self.declared = 0;
        self.received = 0;
        self.payload.clear();
        self.complete = false;
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    /// The tick of the last byte pushed.
    #[inline]
    pub fn last_activity(&self) -> u32 {
        self.last_activity
    }

    /// Whether a transfer has gone `limit` ticks without a byte.
    pub fn is_stalled(&self, now: u32, limit: u32) -> bool {
        self.state != State::Waiting && now.wrapping_sub(self.last_activity) >= limit
    }
}

/// The conventional streaming payload.
///
/// Bytes past the operand are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SerializeIter)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StreamCommand {
    pub resource: u8,
    pub opcode: u8,
    /// Little-endian on the wire.
    pub operand: u16,
}

impl StreamCommand {
    pub fn decode(payload: &[u8]) -> Option<Self> {
        <Self as SerializeIter<Vanilla>>::deserialize_iter(payload).ok()
    }
}
