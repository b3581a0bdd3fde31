//! The fixed catalogue of addressable resources.

use cookie_cutter::{encoding::vanilla::Vanilla, SerializeIter};
use heapless::Vec;

pub mod error {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum CatalogueError {
        Full,
        Duplicate,
    }
}

/// Asks the engine whether a resource is installed.
pub const CHECK_BUILD: u8 = 0xfe;
/// Stops every running resource.
pub const RESET: u8 = 0xff;

/// Resource addresses as they appear on the wire.
///
/// Address `0x00` is never assigned, SPI hosts clock
/// it out while reading replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, SerializeIter)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ResourceId {
    DelSigAdc = 0x01,
    SarAdc0,
    SarAdc1,
    Vdac0,
    Vdac1,
    Idac0,
    Idac1,
    WaveDac,
    Pwm0 = 0x09,
    Pwm1,
    Pwm2,
    Pwm3,
    Pwm4,
    Pwm5,
    Pwm6,
    Pwm7,
    Pwm8,
    Pwm9,
    Pwm10,
    Pwm11,
    Pwm12,
    Gpio = 0x16,
    AnalogIn,
    QuadDec = 0x19,
}

impl TryFrom<u8> for ResourceId {
    type Error = cookie_cutter::error::Invalid;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        <Self as SerializeIter<Vanilla>>::deserialize_iter(&[value])
            .map_err(|_| cookie_cutter::error::Invalid)
    }
}

impl ResourceId {
    #[inline]
    pub const fn address(self) -> u8 {
        self as u8
    }

    /// The PWM channel at `index`, counting from zero.
    pub fn pwm(index: u8) -> Option<Self> {
        if index > 12 {
            return None;
        }

        Self::try_from(Self::Pwm0.address() + index).ok()
    }

    /// The voltage DAC at `index`, counting from zero.
    pub fn vdac(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Vdac0),
            1 => Some(Self::Vdac1),
            _ => None,
        }
    }

    pub const fn kind(self) -> Kind {
        match self {
            Self::DelSigAdc => Kind::DelSigAdc,
            Self::SarAdc0 | Self::SarAdc1 => Kind::SarAdc,
            Self::Vdac0 | Self::Vdac1 => Kind::Vdac,
            Self::Idac0 | Self::Idac1 => Kind::Idac,
            Self::WaveDac => Kind::WaveDac,
            Self::Gpio => Kind::Gpio,
            Self::AnalogIn => Kind::AnalogIn,
            Self::QuadDec => Kind::QuadDec,
            _ => Kind::Pwm,
        }
    }
}

/// How the dispatcher treats an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    Start,
    Stop,
    Sleep,
    Wakeup,
    /// Yields a value.
    Read,
    /// Changes state, yields nothing.
    Write,
}

/// The capability set shared by resources of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Kind {
    DelSigAdc,
    SarAdc,
    Vdac,
    Idac,
    WaveDac,
    Pwm,
    Gpio,
    AnalogIn,
    QuadDec,
}

impl Kind {
    /// Classify `opcode`, `None` when this kind does not know it.
    pub const fn access(self, opcode: u8) -> Option<Access> {
        use Access::*;

        let access = match (self, opcode) {
            // GPIO and the sequenced input are always on
            (Self::Gpio, 0x00) => Read,
            (Self::Gpio, 0x01 | 0x03) => Write,
            (Self::AnalogIn, 0x00) => Read,
            (Self::Gpio | Self::AnalogIn, _) => return None,

            (_, 0x00) => Start,
            (_, 0x01) => Stop,

            // gain, convert start/stop, offset, gain, counts to mV
            (Self::DelSigAdc, 0x02..=0x04 | 0x0e | 0x0f) => Write,
            (Self::DelSigAdc, 0x07 | 0x0a | 0x0d | 0x11) => Read,
            (Self::DelSigAdc, 0x14) => Sleep,
            (Self::DelSigAdc, 0x15) => Wakeup,

            (Self::SarAdc, 0x03..=0x05 | 0x0b | 0x0c) => Write,
            (Self::SarAdc, 0x08 | 0x0a | 0x0e) => Read,
            (Self::SarAdc, 0x10) => Sleep,
            (Self::SarAdc, 0x11) => Wakeup,

            // speed, range, value
            (Self::Vdac, 0x02..=0x04) => Write,
            (Self::Vdac, 0x05) => Sleep,
            (Self::Vdac, 0x06) => Wakeup,

            // speed, polarity, range, value
            (Self::Idac, 0x02..=0x05) => Write,
            (Self::Idac, 0x06) => Sleep,
            (Self::Idac, 0x07) => Wakeup,

            // clock start, stop and divider live at the top
            (Self::WaveDac, 0x04 | 0x07 | 0x09 | 0xfd..=0xff) => Write,
            (Self::WaveDac, 0x0b) => Sleep,
            (Self::WaveDac, 0x0c) => Wakeup,

            (Self::Pwm, 0x0c | 0x0e | 0x18) => Write,
            (Self::Pwm, 0x0d | 0x0f) => Read,
            (Self::Pwm, 0x19) => Sleep,
            (Self::Pwm, 0x1a) => Wakeup,

            (Self::QuadDec, 0x02) => Read,
            (Self::QuadDec, 0x03) => Write,

            _ => return None,
        };

        Some(access)
    }
}

/// The operand was rejected by the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidOperand;

/// The uniform control interface every resource driver exposes.
pub trait Peripheral {
    fn start(&mut self);

    fn stop(&mut self);

    fn sleep(&mut self) {}

    fn wakeup(&mut self) {}

    /// Run a read or write opcode.
    ///
    /// Only opcodes the resource's [`Kind`] classifies as
    /// [`Access::Read`] or [`Access::Write`] reach this.
    fn handle(&mut self, opcode: u8, operand: u16) -> Result<Option<u32>, InvalidOperand>;
}

/// The GPIO operand word.
///
/// `bit0` value, `bits1..=3` pin, `bits4..=7` port, `bits8..=11` drive mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioOperand {
    pub port: u8,
    pub pin: u8,
    pub value: bool,
    pub drive: u8,
}

impl GpioOperand {
    pub const DRIVE_HIGH_Z: u8 = 0x02;
    pub const DRIVE_STRONG: u8 = 0x07;

    /// Split a `port * 10 + pin` channel number.
    pub fn from_channel(channel: u8) -> Option<Self> {
        let (port, pin) = (channel / 10, channel % 10);

        if port > 0x0f || pin > 7 {
            return None;
        }

        Some(Self {
            port,
            pin,
            value: false,
            drive: 0,
        })
    }

    pub const fn encode(&self) -> u16 {
        (self.value as u16)
            | ((self.pin as u16 & 0x07) << 1)
            | ((self.port as u16 & 0x0f) << 4)
            | ((self.drive as u16 & 0x0f) << 8)
    }

    pub const fn decode(operand: u16) -> Self {
        Self {
            port: ((operand >> 4) & 0x0f) as u8,
            pin: ((operand >> 1) & 0x07) as u8,
            value: operand & 1 != 0,
            drive: ((operand >> 8) & 0x0f) as u8,
        }
    }
}

pub(crate) struct Slot<D> {
    pub id: ResourceId,
    pub enabled: bool,
    pub driver: D,
}

/// The installed resources and their enabled flags.
///
/// `D` is a bundle of every driver type in the build.
pub struct Registry<D, const R: usize> {
    pub(crate) slots: Vec<Slot<D>, R>,
}

impl<D, const R: usize> Default for Registry<D, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D, const R: usize> Registry<D, R> {
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Add a resource, disabled until first use.
    pub fn install(
        &mut self,
        id: ResourceId,
        driver: impl Into<D>,
    ) -> Result<(), error::CatalogueError> {
        if self.contains(id) {
            Err(error::CatalogueError::Duplicate)?;
        }

        self.slots
            .push(Slot {
                id,
                enabled: false,
                driver: driver.into(),
            })
            .map_err(|_| error::CatalogueError::Full)
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.slots.iter().any(|slot| slot.id == id)
    }

    pub fn is_enabled(&self, id: ResourceId) -> bool {
        self.slots.iter().any(|slot| slot.id == id && slot.enabled)
    }

    /// Installed resources in installation order.
    pub fn ids(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.slots.iter().map(|slot| slot.id)
    }

    pub(crate) fn slot_mut(&mut self, id: ResourceId) -> Option<&mut Slot<D>> {
        self.slots.iter_mut().find(|slot| slot.id == id)
    }
}
