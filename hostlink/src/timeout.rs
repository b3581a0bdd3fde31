//! Bounded waits driven by a periodic tick.
//!
//! Nothing here reads a clock. A timer interrupt calls [`Ticks::tick`]
//! and waits are measured in elapsed ticks.

use core::{cell::Cell, future::Future};

use embassy_futures::select::{select, Either};
use embassy_sync::{
    blocking_mutex::{raw::RawMutex, Mutex},
    signal::Signal,
};

/// A bounded wait expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timeout;

pub struct Ticks<M: RawMutex> {
    count: Mutex<M, Cell<u32>>,
    ticked: Signal<M, ()>,
}

impl<M: RawMutex> Default for Ticks<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> Ticks<M> {
    pub const fn new() -> Self {
        Self {
            count: Mutex::new(Cell::new(0)),
            ticked: Signal::new(),
        }
    }

    /// Advance the counter, called from the periodic interrupt.
    pub fn tick(&self) {
        self.count.lock(|count| count.set(count.get().wrapping_add(1)));
        self.ticked.signal(());
    }

    pub fn now(&self) -> u32 {
        self.count.lock(Cell::get)
    }

    /// Ticks elapsed since `start`, robust to wrap-around.
    pub fn since(&self, start: u32) -> u32 {
        self.now().wrapping_sub(start)
    }

    /// Resolves once `limit` ticks have passed since `start`.
    ///
    /// Only one task may wait on the ticks at a time.
    pub async fn elapsed(&self, start: u32, limit: u32) {
        while self.since(start) < limit {
            self.ticked.wait().await;
        }
    }

    /// Run `fut` for at most `limit` ticks.
    pub async fn timeout<F: Future>(&self, limit: u32, fut: F) -> Result<F::Output, Timeout> {
        let start = self.now();

        match select(fut, self.elapsed(start, limit)).await {
            Either::First(output) => Ok(output),
            Either::Second(()) => Err(Timeout),
        }
    }
}
