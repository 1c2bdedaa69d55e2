// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Polled I2C transaction engine.
//!
//! Every wait is a bounded spin on a peripheral flag. The ceiling counts
//! polls, not time, so the real timeout depends on the CPU clock.
//!
//! Only one transaction may be in flight at a time. The engine holds
//! `&mut self` for the whole transaction; callers sharing it between
//! threads or interrupt handlers must lock around complete
//! write-then-read sequences, never per byte.

use crate::error::{BusError, Outcome};
use log::debug;

/// Default number of flag polls before a wait is abandoned
pub const DEFAULT_MAX_ATTEMPTS: u16 = 1000;

/// Direction bit sent with the address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Write,
    Read,
}

impl Direction {
    /// Address byte on the wire: 7-bit address followed by the R/W bit
    pub fn header(self, address: u8) -> u8 {
        match self {
            Direction::Write => address << 1,
            Direction::Read => address << 1 | 1,
        }
    }
}

/// Status flags latched by the peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// Start condition generated
    StartSent,
    /// Address matched and acknowledged
    AddressSent,
    /// Byte transfer finished while transmitting
    ByteTransmitted,
    /// Receive register holds a byte
    ByteReceived,
    /// Not-acknowledged latched
    AckFailed,
}

/// Minimal capability set of a two-wire bus peripheral.
///
/// Implemented over the real registers on a microcontroller and over a
/// simulated bus in tests.
pub trait BusPeripheral {
    fn send_start(&mut self);
    fn send_stop(&mut self);
    fn send_address(&mut self, address: u8, direction: Direction);
    fn write_byte(&mut self, byte: u8);
    fn read_byte(&mut self) -> u8;
    /// Selects ACK (`true`) or NACK (`false`) for the next received byte
    fn acknowledge_next(&mut self, ack: bool);
    fn poll_flag(&mut self, flag: Flag) -> bool;
    fn clear_flag(&mut self, flag: Flag);
}

/// Register-level bus access used by the sensor protocol.
///
/// `release` selects whether a stop condition ends the transfer, which
/// allows a register address write to be chained to the following read.
pub trait RegisterBus {
    fn write(&mut self, address: u8, payload: &[u8], release: bool) -> Outcome;
    fn read(&mut self, address: u8, buffer: &mut [u8], release: bool) -> Outcome;
}

/// Result of a bounded wait that may be cut short by a NACK
enum Wait {
    Done,
    Nacked,
    TimedOut,
}

/// Transaction engine driving a [`BusPeripheral`] by polling
pub struct TransactionEngine<P> {
    peripheral: P,
    max_attempts: u16,
}

impl<P: BusPeripheral> TransactionEngine<P> {
    pub fn new(peripheral: P) -> Self {
        Self::with_max_attempts(peripheral, DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_max_attempts(peripheral: P, max_attempts: u16) -> Self {
        TransactionEngine {
            peripheral,
            max_attempts,
        }
    }

    pub fn max_attempts(&self) -> u16 {
        self.max_attempts
    }

    pub fn peripheral(&self) -> &P {
        &self.peripheral
    }

    pub fn peripheral_mut(&mut self) -> &mut P {
        &mut self.peripheral
    }

    pub fn release(self) -> P {
        self.peripheral
    }

    fn wait_for(&mut self, flag: Flag) -> bool {
        let peripheral = &mut self.peripheral;
        (0..self.max_attempts).any(|_| peripheral.poll_flag(flag))
    }

    fn wait_for_ack(&mut self, flag: Flag) -> Wait {
        for _ in 0..self.max_attempts {
            if self.peripheral.poll_flag(flag) {
                return Wait::Done;
            }
            if self.peripheral.poll_flag(Flag::AckFailed) {
                return Wait::Nacked;
            }
        }
        Wait::TimedOut
    }

    /// Clears the latched NACK and gives the bus back
    fn abort(&mut self, error: BusError) -> Outcome {
        self.peripheral.clear_flag(Flag::AckFailed);
        self.peripheral.send_stop();
        Err(error)
    }

    /// Start (or repeated start) followed by the address phase
    fn begin(&mut self, address: u8, direction: Direction) -> Outcome {
        self.peripheral.send_start();
        if !self.wait_for(Flag::StartSent) {
            debug!("i2c start not acknowledged");
            self.peripheral.send_stop();
            return Err(BusError::StartFailed);
        }

        self.peripheral.send_address(address, direction);
        match self.wait_for_ack(Flag::AddressSent) {
            Wait::Done => {
                self.peripheral.clear_flag(Flag::AddressSent);
                Ok(())
            }
            Wait::Nacked => {
                debug!("i2c address {:#04x} nacked", address);
                self.abort(BusError::AddressNotAcknowledged)
            }
            Wait::TimedOut => {
                debug!("i2c address {:#04x} timed out", address);
                self.abort(BusError::AddressNotAcknowledged)
            }
        }
    }

    /// Writes `payload` to the device at `address`.
    ///
    /// Stops on the first refused byte. With `release` unset the bus is
    /// kept so a read can follow with a repeated start.
    pub fn write(&mut self, address: u8, payload: &[u8], release: bool) -> Outcome {
        self.begin(address, Direction::Write)?;

        for (index, &byte) in payload.iter().enumerate() {
            self.peripheral.write_byte(byte);
            match self.wait_for_ack(Flag::ByteTransmitted) {
                Wait::Done => {}
                Wait::Nacked | Wait::TimedOut => {
                    debug!("i2c data byte {} to {:#04x} failed", index, address);
                    return self.abort(BusError::DataNotAcknowledged);
                }
            }
        }

        if release {
            self.peripheral.send_stop();
        }
        Ok(())
    }

    /// Fills `buffer` from the device at `address`.
    ///
    /// Every byte but the last is acknowledged. The NACK and the stop for
    /// the last byte are requested before it is latched.
    pub fn read(&mut self, address: u8, buffer: &mut [u8], release: bool) -> Outcome {
        self.begin(address, Direction::Read)?;

        let last = buffer.len().saturating_sub(1);
        if buffer.is_empty() && release {
            self.peripheral.send_stop();
        }
        for (index, slot) in buffer.iter_mut().enumerate() {
            if index < last {
                self.peripheral.acknowledge_next(true);
            } else {
                self.peripheral.acknowledge_next(false);
                if release {
                    self.peripheral.send_stop();
                }
            }

            if !self.wait_for(Flag::ByteReceived) {
                debug!("i2c read byte {} from {:#04x} timed out", index, address);
                self.peripheral.send_stop();
                return Err(BusError::ReadTimeout);
            }
            *slot = self.peripheral.read_byte();
        }
        Ok(())
    }
}

impl<P: BusPeripheral> RegisterBus for TransactionEngine<P> {
    fn write(&mut self, address: u8, payload: &[u8], release: bool) -> Outcome {
        TransactionEngine::write(self, address, payload, release)
    }

    fn read(&mut self, address: u8, buffer: &mut [u8], release: bool) -> Outcome {
        TransactionEngine::read(self, address, buffer, release)
    }
}
