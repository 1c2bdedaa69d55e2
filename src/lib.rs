// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! BME280 driver implementing pressure, temperature and humidity readout over I2C
//!
//! Register map and compensation formulas taken from the
//! [BME280 datasheet](https://www.bosch-sensortec.com/media/boschsensortec/downloads/datasheets/bst-bme280-ds002.pdf)
//!
//! The crate is split in layers:
//!
//! - [`bus`]: polled transaction engine over a [`bus::BusPeripheral`], with bounded
//!   flag polling and typed failures
//! - [`linux`]: the same register access over a Linux `/dev/i2c-N` node via i2cdev
//! - [`registers`]: one function per sensor operation on top of any [`bus::RegisterBus`]
//! - [`compensation`]: pure conversion of raw counts into calibrated values
//! - [`bme280`]: bring-up sequence and the single `measure` entry point
//!
//! ## Basic Example
//!
//! Obtaining measurements, temperature, pressure and humidity
//!
//!
//!```no_run
//!use bme280_i2c::bme280::Bme280;
//!use std::thread;
//!use std::time::Duration;
//!
//!fn main() {
//!    // Open the I2C device
//!    let mut bme = Bme280::new().unwrap();
//!
//!    loop {
//!        match bme.measure() {
//!            Ok(m) => {
//!                println!(
//!                    "P: {} mmHg T: {} C RH: {} %",
//!                    m.pressure_mmhg(),
//!                    m.temperature,
//!                    m.humidity
//!                );
//!                thread::sleep(Duration::from_secs(2));
//!            }
//!            Err(e) => {
//!                println!(
//!                    "Error obtaining measurements. More details: {}. Waiting 10 seconds for recovering",
//!                    e
//!                );
//!                thread::sleep(Duration::from_secs(10));
//!            }
//!        }
//!    }
//!}
//!```
//!

/// Device orchestrator: bring-up and measurements
pub mod bme280;
pub mod bus;
pub mod calibration;
pub mod compensation;
pub mod config;
pub mod error;
pub mod linux;
pub mod recovery;
pub mod registers;
pub mod settings;

#[cfg(test)]
mod testing;

pub use crate::bme280::{Bme280, State};
pub use crate::compensation::Measurement;
pub use crate::config::{Config, Filter, Mode, Oversampling, StandbyTime};
pub use crate::error::{Bme280Error, BusError, Outcome};
pub use crate::settings::Settings;
