//! Host link protocol engine for a peripheral controller.
//!
//! A host drives a fixed catalogue of on-chip resources over one of two
//! transports: a checksummed, length-prefixed frame protocol on the debug
//! link, or a sync-byte delimited streaming protocol on the peripheral bus.
//! The [`ModeController`] owns both transports and decides which is live.

#![no_std]

// must stay first, later modules use its macros
#[macro_use]
mod fmt;

pub mod checksum;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod link;
pub mod mode;
pub mod resource;
pub mod response;
pub mod ring;
pub mod rx;
pub mod stream;
pub mod timeout;

#[cfg(test)]
mod testing;

pub use engine::ProtocolEngine;
pub use mode::{Mode, ModeController, Shared};
