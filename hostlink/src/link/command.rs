//! Command codes of the checksummed transport and their operand layouts.

/// Channel families a host can enumerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Digital,
    AnalogIn,
    AnalogOut,
    Pwm,
    QuadEncoder,
    Uart,
    I2c,
    Spi,
    Can,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Sync,
    GetDeviceId,
    GetApiVersion,
    GetMaxBaud,
    SetBaud,
    GetChannels(Channel),
    SetUserId,
    GetUserId,
    GetDeviceName,
    DigitalWrite,
    DigitalRead,
    GetAiReference,
    AnalogRead,
    AnalogWrite,
    PwmSetDutyCycle,
    QeReset,
    QeRead,
}

impl Command {
    /// `None` for codes this device does not implement.
    pub const fn from_code(code: u16) -> Option<Self> {
        let command = match code {
            0x0000 => Self::Sync,
            0x0003 => Self::GetDeviceId,
            0x0004 => Self::GetApiVersion,
            0x0005 => Self::GetMaxBaud,
            0x0006 => Self::SetBaud,
            0x0008 => Self::GetChannels(Channel::Digital),
            0x0009 => Self::GetChannels(Channel::AnalogIn),
            0x000a => Self::GetChannels(Channel::AnalogOut),
            0x000b => Self::GetChannels(Channel::Pwm),
            0x000c => Self::GetChannels(Channel::QuadEncoder),
            0x000d => Self::GetChannels(Channel::Uart),
            0x000e => Self::GetChannels(Channel::I2c),
            0x000f => Self::GetChannels(Channel::Spi),
            0x0010 => Self::GetChannels(Channel::Can),
            0x0012 => Self::SetUserId,
            0x0013 => Self::GetUserId,
            0x0024 => Self::GetDeviceName,
            0x0041 => Self::DigitalWrite,
            0x0042 => Self::DigitalRead,
            0x0061 => Self::GetAiReference,
            0x0064 => Self::AnalogRead,
            0x0065 => Self::AnalogWrite,
            0x0083 => Self::PwmSetDutyCycle,
            0x00a0 => Self::QeReset,
            0x00a1 => Self::QeRead,
            _ => return None,
        };

        Some(command)
    }
}

/// Operands laid out as `[count][channel; count][data..]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a> {
    pub channels: &'a [u8],
    pub data: &'a [u8],
}

impl<'a> Batch<'a> {
    pub fn parse(operands: &'a [u8]) -> Option<Self> {
        let (&count, rest) = operands.split_first()?;
        let count = usize::from(count);

        if rest.len() < count {
            return None;
        }

        let (channels, data) = rest.split_at(count);

        Some(Self { channels, data })
    }

    /// The data bit of channel `index`, packed eight to a byte,
    /// lowest bit first.
    pub fn bit(&self, index: usize) -> Option<bool> {
        self.data
            .get(index / 8)
            .map(|byte| (byte >> (index % 8)) & 1 != 0)
    }

    /// The data byte of channel `index`.
    pub fn byte(&self, index: usize) -> Option<u8> {
        self.data.get(index).copied()
    }
}
