// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Register bus over a Linux `/dev/i2c-N` device node.
//!
//! The kernel owns start, stop and acknowledge handling, so polling is
//! replaced by `i2c-dev` transfers. A write that keeps the bus is held
//! back and sent together with the following read as one combined
//! transfer with a repeated start.

use crate::bus::RegisterBus;
use crate::error::{BusError, Outcome};
use i2cdev::core::*;
use i2cdev::linux::{LinuxI2CDevice, LinuxI2CError, LinuxI2CMessage};
use log::debug;
use std::io;
use std::path::Path;

const EAGAIN: i32 = 11;
const ENXIO: i32 = 6;
const ETIMEDOUT: i32 = 110;
const EREMOTEIO: i32 = 121;

/// Maps kernel errno values onto bus failures
fn classify(error: LinuxI2CError) -> BusError {
    let error: io::Error = error.into();
    match error.raw_os_error() {
        Some(ENXIO) | Some(EREMOTEIO) => BusError::AddressNotAcknowledged,
        Some(ETIMEDOUT) => BusError::ReadTimeout,
        Some(EAGAIN) => BusError::StartFailed,
        _ => BusError::Io(error.kind()),
    }
}

/// [`RegisterBus`] backed by `i2cdev`
///
/// A write with `release` unset sends nothing and returns `Ok(())`. The
/// payload is held until the next operation: a read to the same address
/// sends it as part of one combined transfer, anything else sends it on
/// its own first. A failure of that deferred write is reported by the
/// later call, not by the `write` that queued it.
pub struct LinuxBus {
    device: LinuxI2CDevice,
    address: u8,
    pending: Option<Vec<u8>>,
}

impl LinuxBus {
    /// Opens the bus node with `address` as the initial slave address
    pub fn open<P: AsRef<Path>>(path: P, address: u8) -> Result<LinuxBus, LinuxI2CError> {
        let device = LinuxI2CDevice::new(path, address as u16)?;
        Ok(LinuxBus {
            device,
            address,
            pending: None,
        })
    }

    fn select(&mut self, address: u8) -> Outcome {
        if address != self.address {
            self.device
                .set_slave_address(address as u16)
                .map_err(classify)?;
            self.address = address;
        }
        Ok(())
    }

    /// Sends a held write on its own
    fn flush(&mut self) -> Outcome {
        if let Some(pending) = self.pending.take() {
            self.device.write(&pending).map_err(classify)?;
        }
        Ok(())
    }
}

impl RegisterBus for LinuxBus {
    fn write(&mut self, address: u8, payload: &[u8], release: bool) -> Outcome {
        self.flush()?;
        self.select(address)?;
        if release {
            self.device.write(payload).map_err(classify)
        } else {
            self.pending = Some(payload.to_vec());
            Ok(())
        }
    }

    fn read(&mut self, address: u8, buffer: &mut [u8], release: bool) -> Outcome {
        if !release {
            debug!("i2c-dev always ends a read with a stop");
        }
        if address != self.address {
            self.flush()?;
            self.select(address)?;
        }
        match self.pending.take() {
            Some(pending) => {
                let mut messages = [LinuxI2CMessage::write(&pending), LinuxI2CMessage::read(buffer)];
                self.device.transfer(&mut messages).map_err(classify)?;
                Ok(())
            }
            None => self.device.read(buffer).map_err(classify),
        }
    }
}
