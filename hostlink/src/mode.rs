//! Arbitration between the debug link and the peripheral bus.
//!
//! Only one transport is live at a time. The controller starts on the
//! peripheral bus and moves to the debug link whenever a host enumerates
//! it, abandoning whatever streaming transfer was in flight. A host
//! detaching, or never finishing enumeration, brings the bus back.

use core::future::{pending, Future};

use dispatch_bundle::Bundle;
use embassy_futures::select::{select, select3, Either, Either3};
use embassy_sync::{blocking_mutex::raw::RawMutex, signal::Signal};
use embedded_io_async::{ErrorType, Read, Write};

use crate::{
    config::{COMMAND_CAPACITY, RESPONSE_FRAME_CAPACITY},
    engine::ProtocolEngine,
    link::FrameAssembler,
    resource::Peripheral,
    rx::RxQueue,
    stream::{Event, State, StreamFramer},
    timeout::{Ticks, Timeout},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Tethered to a host over the debug link.
    HostDebug,
    /// Standalone, serving the streaming transport.
    PeripheralBus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<B, G> {
    Bus(B),
    Debug(G),
}

/// State written from interrupt context.
pub struct Shared<M: RawMutex, const N: usize> {
    pub rx: RxQueue<M, N>,
    pub ticks: Ticks<M>,
    enumerated: Signal<M, ()>,
    detached: Signal<M, ()>,
}

impl<M: RawMutex, const N: usize> Default for Shared<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, const N: usize> Shared<M, N> {
    pub const fn new() -> Self {
        Self {
            rx: RxQueue::new(),
            ticks: Ticks::new(),
            enumerated: Signal::new(),
            detached: Signal::new(),
        }
    }

    /// Bus receive interrupt.
    pub fn on_receive(&self, bytes: &[u8]) {
        if let Err(overrun) = self.rx.ingest(bytes) {
            warn!("receive overrun, dropped {=usize}", overrun.dropped);
        }
    }

    /// Periodic timer interrupt.
    #[inline]
    pub fn on_tick(&self) {
        self.ticks.tick();
    }

    /// A host started enumerating the debug link.
    pub fn host_enumerated(&self) {
        self.enumerated.signal(());
    }

    /// The debug link lost its host.
    pub fn host_detached(&self) {
        self.detached.signal(());
    }
}

/// The peripheral bus, as seen by the controller.
pub trait BusPort: Write {
    fn start(&mut self);

    fn stop(&mut self);

    fn set_rx_interrupt(&mut self, enabled: bool);

    /// Tell the bus master a transfer is being worked on,
    /// on buses that carry such a flag.
    fn set_busy(&mut self, _busy: bool) {}
}

/// The debug link, as seen by the controller.
pub trait DebugPort: Read + Write {
    fn start(&mut self);

    fn stop(&mut self);

    /// Resolves once the host has configured the link.
    fn configured(&mut self) -> impl Future<Output = ()>;
}

pub struct ModeController<'a, M, B, G, D, const R: usize, const N: usize>
where
    M: RawMutex,
    B: BusPort,
    G: DebugPort,
{
    mode: Mode,
    shared: &'a Shared<M, N>,
    bus: B,
    debug: G,
    engine: ProtocolEngine<D, R>,
    framer: StreamFramer,
    assembler: FrameAssembler,
    chunk: [u8; COMMAND_CAPACITY],
    reply: [u8; RESPONSE_FRAME_CAPACITY],
}

impl<'a, M, B, G, D, const R: usize, const N: usize> ModeController<'a, M, B, G, D, R, N>
where
    M: RawMutex,
    B: BusPort,
    G: DebugPort,
    D: Bundle<dyn Peripheral>,
{
    pub fn new(shared: &'a Shared<M, N>, bus: B, debug: G, engine: ProtocolEngine<D, R>) -> Self {
        Self {
            mode: Mode::PeripheralBus,
            shared,
            bus,
            debug,
            engine,
            framer: StreamFramer::new(),
            assembler: FrameAssembler::new(),
            chunk: [0; COMMAND_CAPACITY],
            reply: [0; RESPONSE_FRAME_CAPACITY],
        }
    }

    /// Bring up the peripheral bus.
    pub fn start(&mut self) {
        self.resume_bus();
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn framer_state(&self) -> State {
        self.framer.state()
    }

    #[inline]
    pub fn engine(&self) -> &ProtocolEngine<D, R> {
        &self.engine
    }

    #[inline]
    pub fn bus(&self) -> &B {
        &self.bus
    }

    #[inline]
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    #[inline]
    pub fn debug(&self) -> &G {
        &self.debug
    }

    #[inline]
    pub fn debug_mut(&mut self) -> &mut G {
        &mut self.debug
    }

    pub async fn run(&mut self) -> ! {
        self.start();

        loop {
            match self.step().await {
                Ok(()) => {}
                Err(Error::Bus(_)) => error!("bus write failed"),
                Err(Error::Debug(_)) => error!("debug link failed"),
            }
        }
    }

    /// One iteration of the main loop.
    pub async fn step(
        &mut self,
    ) -> Result<(), Error<<B as ErrorType>::Error, <G as ErrorType>::Error>> {
        match self.mode {
            Mode::PeripheralBus => self.step_bus().await.map_err(Error::Bus),
            Mode::HostDebug => self.step_debug().await.map_err(Error::Debug),
        }
    }

    async fn step_bus(&mut self) -> Result<(), <B as ErrorType>::Error> {
        let shared = self.shared;

        let in_flight = self.framer.state() != State::Waiting;
        let last_activity = self.framer.last_activity();
        let stall_ticks = self.engine.config().stall_ticks;

        let stall = async {
            if in_flight {
                shared.ticks.elapsed(last_activity, stall_ticks).await;
            } else {
                pending::<()>().await;
            }
        };

        // enumeration is polled first so it pre-empts a busy bus
        match select3(shared.enumerated.wait(), shared.rx.wait(), stall).await {
            Either3::First(()) => {
                info!("host enumerated");
                self.enter_host_debug().await;

                Ok(())
            }
            Either3::Second(()) => self.service_bus().await,
            Either3::Third(()) => {
                warn!("transfer stalled in {}", self.framer.state());
                self.framer.reset();
                self.bus.set_busy(false);

                Ok(())
            }
        }
    }

    /// Run queued bytes through the framer, answering a completed transfer.
    async fn service_bus(&mut self) -> Result<(), <B as ErrorType>::Error> {
        let now = self.shared.ticks.now();
        let framer = &mut self.framer;
        let bus = &mut self.bus;

        let complete = self.shared.rx.drain_until(|byte| match framer.push(byte, now) {
            Some(Event::Started) => {
                bus.set_busy(true);

                false
            }
            Some(Event::Complete) => true,
            Some(Event::Discarded) => {
                bus.set_busy(false);

                false
            }
            None => false,
        });

        if !complete {
            return Ok(());
        }

        let reply = self
            .framer
            .take()
            .and_then(|payload| self.engine.process_transfer(payload));

        let mut result = Ok(());

        if let Some(word) = reply {
            let limit = self.engine.config().reply_ticks;

            match self.shared.ticks.timeout(limit, self.bus.write_all(&word)).await {
                Ok(written) => result = written,
                Err(Timeout) => warn!("reply not collected"),
            }
        }

        self.bus.set_busy(false);

        result
    }

    async fn step_debug(&mut self) -> Result<(), <G as ErrorType>::Error> {
        let shared = self.shared;

        let event = select(shared.detached.wait(), self.debug.read(&mut self.chunk)).await;

        match event {
            Either::First(()) => {
                info!("host detached");
                self.enter_peripheral_bus();

                Ok(())
            }
            Either::Second(read) => {
                let count = read?;

                self.service_debug(count).await
            }
        }
    }

    /// Answer every frame completed by the first `count` bytes of the chunk.
    async fn service_debug(&mut self, count: usize) -> Result<(), <G as ErrorType>::Error> {
        let mut offset = 0;

        while offset < count {
            offset += self.assembler.ingest(&self.chunk[offset..count]);

            let Some(raw) = self.assembler.frame() else {
                continue;
            };

            let reply = self.engine.process_frame(raw, &mut self.reply);
            self.assembler.clear();

            if let Some(len) = reply {
                let limit = self.engine.config().reply_ticks;

                match self
                    .shared
                    .ticks
                    .timeout(limit, self.debug.write_all(&self.reply[..len]))
                    .await
                {
                    Ok(written) => written?,
                    Err(Timeout) => warn!("reply not collected"),
                }
            }
        }

        Ok(())
    }

    async fn enter_host_debug(&mut self) {
        // fence the receive interrupt before touching the transfer
        self.bus.set_rx_interrupt(false);
        self.bus.stop();
        self.bus.set_busy(false);
        self.shared.rx.clear();
        self.framer.reset();

        self.debug.start();
        self.shared.detached.reset();

        let limit = self.engine.config().enumeration_ticks;

        match self.shared.ticks.timeout(limit, self.debug.configured()).await {
            Ok(()) => {
                self.assembler.clear();
                self.mode = Mode::HostDebug;

                info!("entered {}", self.mode);
            }
            Err(Timeout) => {
                warn!("enumeration timed out");

                self.debug.stop();
                self.resume_bus();
            }
        }
    }

    fn enter_peripheral_bus(&mut self) {
        self.debug.stop();
        self.assembler.clear();
        self.resume_bus();
    }

    fn resume_bus(&mut self) {
        // enumerations seen while tethered are stale
        self.shared.enumerated.reset();
        self.framer.reset();
        self.shared.rx.clear();
        self.bus.start();
        self.bus.set_rx_interrupt(true);
        self.mode = Mode::PeripheralBus;

        info!("entered {}", self.mode);
    }
}
