//! Stand-in drivers and transports for host tests.

use core::{convert::Infallible, future::pending};

use dispatch_bundle::bundle;
use embedded_io_async::{ErrorType, Read, Write};
use heapless::Vec;

use crate::{
    mode::{BusPort, DebugPort},
    resource::{Access, GpioOperand, InvalidOperand, Kind, Peripheral, Registry, ResourceId},
};

/// Remembers the last written operand and reads it back,
/// offset by the read operand.
#[derive(Debug, Clone)]
pub struct MockDriver {
    kind: Kind,
    pub value: u32,
    pub starts: u8,
    pub stops: u8,
    pub sleeps: u8,
    pub wakeups: u8,
}

impl MockDriver {
    pub const fn new(kind: Kind) -> Self {
        Self {
            kind,
            value: 0,
            starts: 0,
            stops: 0,
            sleeps: 0,
            wakeups: 0,
        }
    }
}

impl Peripheral for MockDriver {
    fn start(&mut self) {
        self.starts += 1;
    }

    fn stop(&mut self) {
        self.stops += 1;
    }

    fn sleep(&mut self) {
        self.sleeps += 1;
    }

    fn wakeup(&mut self) {
        self.wakeups += 1;
    }

    fn handle(&mut self, opcode: u8, operand: u16) -> Result<Option<u32>, InvalidOperand> {
        if operand == 0xffff {
            Err(InvalidOperand)?;
        }

        match self.kind.access(opcode) {
            Some(Access::Write) => {
                self.value = operand.into();

                Ok(None)
            }
            Some(Access::Read) => Ok(Some(self.value + u32::from(operand))),
            _ => Err(InvalidOperand),
        }
    }
}

/// Sixteen 8-bit ports with per-pin drive modes.
#[derive(Debug, Clone, Default)]
pub struct MockGpio {
    pub ports: [u8; 16],
    pub drives: [[u8; 8]; 16],
}

impl Peripheral for MockGpio {
    fn start(&mut self) {}

    fn stop(&mut self) {}

    fn handle(&mut self, opcode: u8, operand: u16) -> Result<Option<u32>, InvalidOperand> {
        let operand = GpioOperand::decode(operand);
        let (port, pin) = (usize::from(operand.port), operand.pin);

        match opcode {
            0x00 => Ok(Some(self.ports[port].into())),
            0x01 => {
                if operand.value {
                    self.ports[port] |= 1 << pin;
                } else {
                    self.ports[port] &= !(1 << pin);
                }

                Ok(None)
            }
            0x03 => {
                self.drives[port][usize::from(pin)] = operand.drive;

                Ok(None)
            }
            _ => Err(InvalidOperand),
        }
    }
}

#[bundle(Peripheral)]
#[derive(Debug, Clone)]
pub enum Driver {
    MockDriver,
    MockGpio,
}

/// Peek at the mock behind `id`.
pub fn mock<const R: usize>(registry: &Registry<Driver, R>, id: ResourceId) -> &MockDriver {
    match registry.slots.iter().find(|slot| slot.id == id) {
        Some(slot) => match &slot.driver {
            Driver::MockDriver(driver) => driver,
            _ => panic!(),
        },
        None => panic!(),
    }
}

pub fn gpio<const R: usize>(registry: &Registry<Driver, R>) -> &MockGpio {
    match registry.slots.iter().find(|slot| slot.id == ResourceId::Gpio) {
        Some(slot) => match &slot.driver {
            Driver::MockGpio(driver) => driver,
            _ => panic!(),
        },
        None => panic!(),
    }
}

/// A registry with one of every kind the command set touches.
pub fn catalogue() -> Registry<Driver, 8> {
    let mut registry = Registry::new();

    registry.install(ResourceId::Gpio, MockGpio::default()).unwrap();

    for (id, kind) in [
        (ResourceId::AnalogIn, Kind::AnalogIn),
        (ResourceId::Vdac0, Kind::Vdac),
        (ResourceId::Vdac1, Kind::Vdac),
        (ResourceId::Pwm0, Kind::Pwm),
        (ResourceId::Pwm1, Kind::Pwm),
        (ResourceId::QuadDec, Kind::QuadDec),
        (ResourceId::SarAdc0, Kind::SarAdc),
    ] {
        registry.install(id, MockDriver::new(kind)).unwrap();
    }

    registry
}

/// The peripheral bus, recording what it sent.
#[derive(Debug, Default)]
pub struct MockBus {
    pub sent: Vec<u8, 64>,
    pub running: bool,
    pub rx_enabled: bool,
    pub busy: bool,
    pub busy_raised: u8,
    /// Refuse to accept bytes, as a bus whose master stopped clocking.
    pub stalled: bool,
}

impl ErrorType for MockBus {
    type Error = Infallible;
}

impl Write for MockBus {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.stalled {
            pending::<()>().await;
        }

        let count = buf.len().min(self.sent.capacity() - self.sent.len());
        self.sent.extend_from_slice(&buf[..count]).ok();

        Ok(count)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl BusPort for MockBus {
    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn set_rx_interrupt(&mut self, enabled: bool) {
        self.rx_enabled = enabled;
    }

    fn set_busy(&mut self, busy: bool) {
        if busy {
            self.busy_raised += 1;
        }

        self.busy = busy;
    }
}

/// The debug link, handing out queued frames one read at a time.
#[derive(Debug, Default)]
pub struct MockDebug {
    pub inbox: Vec<Vec<u8, 32>, 4>,
    pub sent: Vec<u8, 128>,
    pub running: bool,
    /// Whether the host configures the link once it is up.
    pub host_present: bool,
}

impl ErrorType for MockDebug {
    type Error = Infallible;
}

impl Read for MockDebug {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.inbox.is_empty() {
            pending::<()>().await;
        }

        let frame = self.inbox.remove(0);
        let count = frame.len().min(buf.len());
        buf[..count].copy_from_slice(&frame[..count]);

        Ok(count)
    }
}

impl Write for MockDebug {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let count = buf.len().min(self.sent.capacity() - self.sent.len());
        self.sent.extend_from_slice(&buf[..count]).ok();

        Ok(count)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl DebugPort for MockDebug {
    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    async fn configured(&mut self) {
        if !self.host_present {
            pending::<()>().await;
        }
    }
}
