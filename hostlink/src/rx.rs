//! Hand-off of received bytes from interrupt context to the main loop.
//!
//! The receive interrupt only appends raw bytes. Framing happens in the
//! main loop, which fences the interrupt out while it walks the ring.

use core::cell::RefCell;

use embassy_sync::{
    blocking_mutex::{raw::RawMutex, Mutex},
    signal::Signal,
};

use crate::ring::{error::Overrun, ByteRing};

pub struct RxQueue<M: RawMutex, const N: usize> {
    ring: Mutex<M, RefCell<ByteRing<N>>>,
    ready: Signal<M, ()>,
}

impl<M: RawMutex, const N: usize> Default for RxQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, const N: usize> RxQueue<M, N> {
    pub const fn new() -> Self {
        Self {
            ring: Mutex::new(RefCell::new(ByteRing::new())),
            ready: Signal::new(),
        }
    }

    /// Queue bytes from the receive interrupt.
    ///
    /// Bytes beyond the ring capacity are dropped.
    pub fn ingest(&self, bytes: &[u8]) -> Result<(), Overrun> {
        let result = self.ring.lock(|ring| ring.borrow_mut().ingest(bytes));

        self.ready.signal(());

        result
    }

    /// Feed queued bytes to `f`, oldest first, until it returns `true`.
    ///
    /// Only the bytes handed to `f` are removed. Returns whether
    /// `f` asked to stop.
    pub fn drain_until(&self, mut f: impl FnMut(u8) -> bool) -> bool {
        self.ring.lock(|ring| {
            let mut ring = ring.borrow_mut();
            let mut iter = ring.iter();

            let stopped = (&mut iter).any(|&byte| f(byte));

            let memento = iter.capture();
            ring.flush(memento);

            stopped
        })
    }

    /// Drop every queued byte.
    pub fn clear(&self) {
        self.ring.lock(|ring| ring.borrow_mut().clear());
        self.ready.reset();
    }

    pub fn len(&self) -> usize {
        self.ring.lock(|ring| ring.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves once bytes are queued.
    pub async fn wait(&self) {
        if self.is_empty() {
            self.ready.wait().await;
        } else {
            // the queued bytes are about to be drained
            self.ready.reset();
        }
    }
}
