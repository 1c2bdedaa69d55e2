// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use std::io;
use thiserror::Error;

/// Outcome of a bus transaction. `Ok` is a completed transaction.
pub type Outcome<T = ()> = Result<T, BusError>;

///
///Bus layer failures. Every transaction reports the first
///failure it met. The register layer passes them through
///unchanged.
///
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// The start condition was never acknowledged by the peripheral
    #[error("start condition was not acknowledged")]
    StartFailed,
    /// No device answered the address phase
    #[error("address was not acknowledged")]
    AddressNotAcknowledged,
    /// The device refused (or never finished) a data byte
    #[error("data byte was not acknowledged")]
    DataNotAcknowledged,
    /// A byte was never received while reading
    #[error("timed out waiting for a received byte")]
    ReadTimeout,
    /// Host adapter failure that is not one of the protocol failures above
    #[error("I2C adapter error: {0:?}")]
    Io(io::ErrorKind),
}

///
///BME280 error enum. Wraps the bus failures and adds
///the composite failures of the bring-up sequence.
///
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bme280Error {
    /// A register operation failed on the bus
    #[error(transparent)]
    Bus(#[from] BusError),
    /// The chip id register holds something other than 0x60
    #[error("device id {0:#04x} is not a BME280")]
    DeviceNotRecognized(u8),
    /// The NVM copy flag never cleared after reset
    #[error("NVM copy did not finish after reset")]
    MemoryNeverReady,
    /// A forced-mode conversion never finished
    #[error("forced measurement did not finish")]
    MeasurementTimeout,
    /// One of the two calibration blocks could not be read
    #[error("calibration data incomplete")]
    CalibrationIncomplete(#[source] BusError),
    /// The data line stayed low after the recovery clock pulses
    #[error("bus is stuck and could not be recovered")]
    BusStuck,
}
