//! Everything the transports share: the resource registry, the device
//! configuration and the handful of values the host may change.

use dispatch_bundle::Bundle;
use heapless::Vec;

use crate::{
    config::{EngineConfig, COMMAND_CAPACITY},
    dispatch::Reply,
    link::{
        command::{Batch, Channel, Command},
        Frame,
    },
    resource::{GpioOperand, Peripheral, Registry, ResourceId},
    response::{stream_reply, Response, Status},
    stream::StreamCommand,
};

/// A command could not be carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct CommandFailed;

impl From<packit::error::Overflow> for CommandFailed {
    fn from(_: packit::error::Overflow) -> Self {
        Self
    }
}

impl From<packit::error::Error> for CommandFailed {
    fn from(_: packit::error::Error) -> Self {
        Self
    }
}

pub struct ProtocolEngine<D, const R: usize> {
    registry: Registry<D, R>,
    config: EngineConfig,
    /// Host-assigned, lost on reset.
    user_id: [u8; 2],
}

impl<D, const R: usize> ProtocolEngine<D, R> {
    pub const fn new(registry: Registry<D, R>, config: EngineConfig) -> Self {
        Self {
            registry,
            config,
            user_id: [0; 2],
        }
    }

    #[inline]
    pub fn registry(&self) -> &Registry<D, R> {
        &self.registry
    }

    #[inline]
    pub fn registry_mut(&mut self) -> &mut Registry<D, R> {
        &mut self.registry
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl<D: Bundle<dyn Peripheral>, const R: usize> ProtocolEngine<D, R> {
    /// Answer one checksummed frame, rendering the reply into `out`.
    ///
    /// Yields the reply length, or `None` when the frame is dropped.
    pub fn process_frame(&mut self, raw: &[u8], out: &mut [u8]) -> Option<usize> {
        let frame = match Frame::parse(raw) {
            Ok(frame) => frame,
            Err(err) => {
                warn!("dropping frame: {}", err);

                return None;
            }
        };

        let response = self.execute(&frame);

        match response.render(frame.sequence, out) {
            Ok(len) => Some(len),
            Err(_) => {
                error!("reply to {=u16:#x} does not fit", frame.command);

                None
            }
        }
    }

    /// Answer one streaming payload with the word owed to the host, if any.
    ///
    /// Payloads too short to hold a command are dropped.
    pub fn process_transfer(&mut self, payload: &[u8]) -> Option<[u8; 4]> {
        let Some(command) = StreamCommand::decode(payload) else {
            warn!("dropping {=usize} byte transfer", payload.len());

            return None;
        };

        trace!("streaming {}", command);

        self.registry
            .dispatch(command.resource, command.opcode, command.operand)
            .word()
            .map(stream_reply)
    }

    pub fn execute(&mut self, frame: &Frame) -> Response {
        let Some(command) = Command::from_code(frame.command) else {
            warn!("unsupported command {=u16:#x}", frame.command);

            return Response::with_status(Status::FunctionNotSupported);
        };

        debug!("executing {}", command);

        let mut response = Response::new();

        match self.run(command, frame.operands, &mut response) {
            Ok(()) => response,
            Err(CommandFailed) => {
                warn!("{} failed", command);

                Response::with_status(Status::UnknownError)
            }
        }
    }

    fn run(
        &mut self,
        command: Command,
        operands: &[u8],
        response: &mut Response,
    ) -> Result<(), CommandFailed> {
        let config = self.config;

        match command {
            // an empty OK is the whole answer
            Command::Sync => {}
            Command::GetDeviceId => response.extend(&[config.device_family, config.device_id])?,
            Command::GetApiVersion => response.extend(&config.firmware_version)?,
            // the link speed is fixed, so setting it reports the maximum
            Command::GetMaxBaud | Command::SetBaud => response.push_word(config.max_baud)?,
            Command::GetChannels(channel) => self.list_channels(channel, response)?,
            Command::SetUserId => {
                let id = operands.get(..2).ok_or(CommandFailed)?;
                self.user_id.copy_from_slice(id);
            }
            Command::GetUserId => response.extend(&self.user_id)?,
            Command::GetDeviceName => response.extend(config.device_name.as_bytes())?,
            Command::DigitalWrite => self.digital_write(operands)?,
            Command::DigitalRead => self.digital_read(operands, response)?,
            Command::GetAiReference => response.push_word(config.ai_reference_uv)?,
            Command::AnalogRead => self.analog_read(operands, response)?,
            Command::AnalogWrite => self.analog_write(operands)?,
            Command::PwmSetDutyCycle => self.pwm_duty_cycle(operands)?,
            Command::QeReset => self.qe_reset(operands)?,
            Command::QeRead => self.qe_read(operands, response)?,
        }

        Ok(())
    }

    fn call(
        &mut self,
        id: ResourceId,
        opcode: u8,
        operand: u16,
    ) -> Result<Option<u32>, CommandFailed> {
        match self.registry.dispatch(id.address(), opcode, operand) {
            Reply::Ack => Ok(None),
            Reply::Value(value) => Ok(Some(value)),
            Reply::Invalid => Err(CommandFailed),
        }
    }

    fn read(&mut self, id: ResourceId, opcode: u8, operand: u16) -> Result<u32, CommandFailed> {
        self.call(id, opcode, operand)?.ok_or(CommandFailed)
    }

    fn list_channels(
        &self,
        channel: Channel,
        response: &mut Response,
    ) -> Result<(), CommandFailed> {
        let installed = |id| self.registry.contains(id);

        match channel {
            Channel::Digital if installed(ResourceId::Gpio) => {
                response.extend(self.config.digital_channels)?
            }
            Channel::AnalogIn if installed(ResourceId::AnalogIn) => {
                for channel in 1..=self.config.ai_channels {
                    response.push(channel)?;
                }
            }
            Channel::AnalogOut => {
                for (number, id) in (1..).zip([ResourceId::Vdac0, ResourceId::Vdac1]) {
                    if installed(id) {
                        response.push(number)?;
                    }
                }
            }
            Channel::Pwm => {
                for index in 0..=12 {
                    if ResourceId::pwm(index).is_some_and(installed) {
                        response.push(index + 1)?;
                    }
                }
            }
            Channel::QuadEncoder if installed(ResourceId::QuadDec) => response.push(1)?,
            // no bus pass-through on this device
            _ => {}
        }

        Ok(())
    }

    fn digital_write(&mut self, operands: &[u8]) -> Result<(), CommandFailed> {
        let batch = Batch::parse(operands).ok_or(CommandFailed)?;

        for (index, &channel) in batch.channels.iter().enumerate() {
            let value = batch.bit(index).ok_or(CommandFailed)?;
            let pin = GpioOperand::from_channel(channel).ok_or(CommandFailed)?;

            let drive = GpioOperand {
                drive: GpioOperand::DRIVE_STRONG,
                ..pin
            };
            self.call(ResourceId::Gpio, 0x03, drive.encode())?;

            let write = GpioOperand { value, ..pin };
            self.call(ResourceId::Gpio, 0x01, write.encode())?;
        }

        Ok(())
    }

    fn digital_read(
        &mut self,
        channels: &[u8],
        response: &mut Response,
    ) -> Result<(), CommandFailed> {
        let mut bits = Vec::<bool, COMMAND_CAPACITY>::new();

        for &channel in channels {
            let pin = GpioOperand::from_channel(channel).ok_or(CommandFailed)?;

            let drive = GpioOperand {
                drive: GpioOperand::DRIVE_HIGH_Z,
                ..pin
            };
            self.call(ResourceId::Gpio, 0x03, drive.encode())?;

            let port = self.read(ResourceId::Gpio, 0x00, pin.encode())?;
            bits.push((port >> pin.pin) & 1 != 0).map_err(|_| CommandFailed)?;
        }

        // unlike the packed reads, first channel in the top bit
        response.push_bits(bits)?;

        Ok(())
    }

    fn analog_read(
        &mut self,
        channels: &[u8],
        response: &mut Response,
    ) -> Result<(), CommandFailed> {
        let resolution = self.config.ai_resolution;
        let mut values = Vec::<u32, COMMAND_CAPACITY>::new();

        for &channel in channels {
            // host channels count from one
            let index = channel
                .checked_sub(1)
                .filter(|&index| index < self.config.ai_channels)
                .ok_or(CommandFailed)?;

            let value = self.read(ResourceId::AnalogIn, 0x00, index.into())?;
            values.push(value).map_err(|_| CommandFailed)?;
        }

        response.push(resolution)?;
        response.pack(resolution, values)?;

        Ok(())
    }

    fn analog_write(&mut self, operands: &[u8]) -> Result<(), CommandFailed> {
        let batch = Batch::parse(operands).ok_or(CommandFailed)?;

        for (index, &channel) in batch.channels.iter().enumerate() {
            let value = batch.byte(index).ok_or(CommandFailed)?;
            let id = channel
                .checked_sub(1)
                .and_then(ResourceId::vdac)
                .ok_or(CommandFailed)?;

            self.call(id, 0x04, value.into())?;
        }

        Ok(())
    }

    fn pwm_duty_cycle(&mut self, operands: &[u8]) -> Result<(), CommandFailed> {
        let batch = Batch::parse(operands).ok_or(CommandFailed)?;

        for (index, &channel) in batch.channels.iter().enumerate() {
            let duty = batch.byte(index).ok_or(CommandFailed)?;
            let id = channel
                .checked_sub(1)
                .and_then(ResourceId::pwm)
                .ok_or(CommandFailed)?;

            // full duty maps onto the whole period
            let compare = u32::from(duty) * self.config.pwm_period / 255;
            let compare = u16::try_from(compare).map_err(|_| CommandFailed)?;

            self.call(id, 0x00, 0)?;
            self.call(id, 0x0e, compare)?;
        }

        Ok(())
    }

    fn qe_reset(&mut self, operands: &[u8]) -> Result<(), CommandFailed> {
        let batch = Batch::parse(operands).ok_or(CommandFailed)?;

        for &channel in batch.channels {
            if channel != 1 {
                Err(CommandFailed)?;
            }

            self.call(ResourceId::QuadDec, 0x03, 0)?;
        }

        Ok(())
    }

    fn qe_read(
        &mut self,
        channels: &[u8],
        response: &mut Response,
    ) -> Result<(), CommandFailed> {
        let resolution = self.config.qe_resolution;
        let mut values = Vec::<u32, COMMAND_CAPACITY>::new();

        for &channel in channels {
            if channel != 1 {
                Err(CommandFailed)?;
            }

            let count = self.read(ResourceId::QuadDec, 0x02, 0)?;
            values.push(count).map_err(|_| CommandFailed)?;
        }

        response.push(resolution)?;
        response.pack(resolution, values)?;

        Ok(())
    }
}
