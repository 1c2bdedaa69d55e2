// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Freeing a bus held by a slave that lost a clock edge.
//!
//! A device interrupted mid-byte keeps SDA low until it has shifted out
//! the rest of its byte. Clocking SCL by hand until SDA goes high and
//! then issuing a stop puts it back into idle.

use crate::error::Bme280Error;
use log::{debug, warn};

/// Raw line access used only for recovery, outside the bus peripheral
pub trait LineControl {
    /// Peripheral reports the bus as busy
    fn bus_busy(&mut self) -> bool;
    fn data_line_high(&mut self) -> bool;
    /// One full low-high period on SCL
    fn pulse_clock(&mut self);
    /// Drives a stop condition by hand and hands the pins back
    fn issue_stop(&mut self);
}

/// Recovers the bus if it reports busy.
///
/// At most `max_pulses` clock pulses are sent. Does nothing on an idle bus.
pub fn recover<L: LineControl + ?Sized>(lines: &mut L, max_pulses: u8) -> Result<(), Bme280Error> {
    if !lines.bus_busy() {
        return Ok(());
    }

    warn!("i2c bus busy, clocking out stuck slave");
    let mut pulses = 0;
    while !lines.data_line_high() {
        if pulses == max_pulses {
            warn!("data line still low after {} pulses", pulses);
            return Err(Bme280Error::BusStuck);
        }
        lines.pulse_clock();
        pulses += 1;
    }
    debug!("data line released after {} pulses", pulses);
    lines.issue_stop();
    Ok(())
}
