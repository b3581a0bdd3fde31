//! Routing of `(resource, opcode, operand)` triples to drivers.
//!
//! Resources start lazily. Any opcode other than start reaching a
//! disabled resource starts it first, so hosts never need to sequence
//! start calls themselves.

use dispatch_bundle::Bundle;

use crate::resource::{Access, Peripheral, Registry, ResourceId, CHECK_BUILD, RESET};

/// The outcome of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    /// Done, nothing to report.
    Ack,
    Value(u32),
    /// Unknown resource, unknown opcode or rejected operand.
    Invalid,
}

impl Reply {
    /// Stands in for a value when the operation could not be carried out.
    pub const SENTINEL: u32 = 0xffff_ffff;

    /// The word owed to a streaming host, if any.
    pub const fn word(self) -> Option<u32> {
        match self {
            Self::Ack => None,
            Self::Value(value) => Some(value),
            Self::Invalid => Some(Self::SENTINEL),
        }
    }
}

impl<D: Bundle<dyn Peripheral>, const R: usize> Registry<D, R> {
    pub fn dispatch(&mut self, address: u8, opcode: u8, operand: u16) -> Reply {
        match (address, opcode) {
            (CHECK_BUILD, 0x00) => {
                let installed = ResourceId::try_from(operand as u8)
                    .map(|id| self.contains(id))
                    .unwrap_or(false);

                Reply::Value(installed.into())
            }
            (RESET, 0x00) => {
                self.reset();

                Reply::Ack
            }
            _ => match ResourceId::try_from(address) {
                Ok(id) => self.dispatch_to(id, opcode, operand),
                Err(_) => {
                    warn!("no resource at {=u8:#x}", address);

                    Reply::Invalid
                }
            },
        }
    }

    /// Stop every running resource.
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut().filter(|slot| slot.enabled) {
            slot.driver.inner().stop();
            slot.enabled = false;
        }

        info!("all resources stopped");
    }

    fn dispatch_to(&mut self, id: ResourceId, opcode: u8, operand: u16) -> Reply {
        let Some(access) = id.kind().access(opcode) else {
            warn!("{} has no opcode {=u8:#x}", id, opcode);

            return Reply::Invalid;
        };

        let Some(slot) = self.slot_mut(id) else {
            warn!("{} is not installed", id);

            return Reply::Invalid;
        };

        let driver = slot.driver.inner();

        // a repeated start must not re-run initialization
        if !core::mem::replace(&mut slot.enabled, true) {
            if access != Access::Start {
                debug!("implicit start of {}", id);
            }

            driver.start();
        }

        match access {
            Access::Start => Reply::Ack,
            Access::Stop => {
                driver.stop();
                slot.enabled = false;

                Reply::Ack
            }
            Access::Sleep => {
                driver.sleep();

                Reply::Ack
            }
            Access::Wakeup => {
                driver.wakeup();

                Reply::Ack
            }
            Access::Read | Access::Write => match driver.handle(opcode, operand) {
                Ok(Some(value)) => Reply::Value(value),
                Ok(None) => Reply::Ack,
                Err(_) => {
                    warn!("{} rejected {=u16:#x}", id, operand);

                    Reply::Invalid
                }
            },
        }
    }
}
