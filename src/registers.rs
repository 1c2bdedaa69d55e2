// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Register protocol of the BME280.
//!
//! Each operation maps onto one or two bus transactions and hands back the
//! first bus failure unchanged. Nothing is retried here, and buffers are
//! only decoded after every read of the operation succeeded.

use crate::bus::RegisterBus;
use crate::calibration::{Calibration, CALIB_00_LEN, CALIB_26_LEN, REG_CALIB_00, REG_CALIB_26};
use crate::config::{Config, REG_CTRL_HUM};
use crate::error::Outcome;

/// Primary I2C address (SDO tied to GND)
pub const PRIMARY_ADDRESS: u8 = 0x76;
/// Secondary I2C address (SDO tied to VDDIO)
pub const SECONDARY_ADDRESS: u8 = 0x77;

pub const REG_ID: u8 = 0xD0;
pub const REG_RESET: u8 = 0xE0;
pub const REG_STATUS: u8 = 0xF3;
pub const REG_DATA: u8 = 0xF7;

/// Value of the id register on a BME280
pub const CHIP_ID: u8 = 0x60;
/// Writing this to the reset register runs the power-on reset
pub const RESET_CODE: u8 = 0xB6;

const STATUS_MEASURING: u8 = 0x08;
const STATUS_IM_UPDATE: u8 = 0x01;

/// Point-in-time copy of the status register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Status {
    /// A conversion is running
    pub measuring: bool,
    /// NVM data is being copied to the image registers
    pub im_update: bool,
}

impl Status {
    pub fn from_byte(byte: u8) -> Self {
        Status {
            measuring: byte & STATUS_MEASURING != 0,
            im_update: byte & STATUS_IM_UPDATE != 0,
        }
    }
}

/// Uncompensated ADC counts of one burst read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSample {
    /// 20-bit pressure count
    pub pressure: u32,
    /// 20-bit temperature count
    pub temperature: u32,
    /// 16-bit humidity count
    pub humidity: u16,
}

impl RawSample {
    /// Extracts the counts from press_msb..hum_lsb (0xF7..=0xFE)
    pub fn from_bytes(data: &[u8; 8]) -> Self {
        let twenty = |msb: u8, lsb: u8, xlsb: u8| (msb as u32) << 12 | (lsb as u32) << 4 | (xlsb as u32) >> 4;
        RawSample {
            pressure: twenty(data[0], data[1], data[2]),
            temperature: twenty(data[3], data[4], data[5]),
            humidity: u16::from_be_bytes([data[6], data[7]]),
        }
    }
}

/// Points the register pointer at `register` and reads `buffer.len()` bytes
fn read_block<B: RegisterBus>(bus: &mut B, address: u8, register: u8, buffer: &mut [u8]) -> Outcome {
    bus.write(address, &[register], false)?;
    bus.read(address, buffer, true)
}

/// Reads the chip id register
pub fn read_chip_id<B: RegisterBus>(bus: &mut B, address: u8) -> Outcome<u8> {
    let mut id = [0u8; 1];
    read_block(bus, address, REG_ID, &mut id)?;
    Ok(id[0])
}

/// Triggers the power-on reset sequence
pub fn soft_reset<B: RegisterBus>(bus: &mut B, address: u8) -> Outcome {
    bus.write(address, &[REG_RESET, RESET_CODE], true)
}

/// Writes config, ctrl_hum and ctrl_meas in one transaction
pub fn write_config<B: RegisterBus>(bus: &mut B, address: u8, config: &Config) -> Outcome {
    bus.write(address, &config.encode(), true)
}

/// Reads ctrl_hum..config and decodes the configuration
pub fn read_config<B: RegisterBus>(bus: &mut B, address: u8) -> Outcome<Config> {
    let mut block = [0u8; 4];
    read_block(bus, address, REG_CTRL_HUM, &mut block)?;
    Ok(Config::decode(&block))
}

pub fn read_status<B: RegisterBus>(bus: &mut B, address: u8) -> Outcome<Status> {
    let mut status = [0u8; 1];
    read_block(bus, address, REG_STATUS, &mut status)?;
    Ok(Status::from_byte(status[0]))
}

/// Reads both calibration blocks. Either block failing fails the whole read.
pub fn read_calibration<B: RegisterBus>(bus: &mut B, address: u8) -> Outcome<Calibration> {
    let mut first = [0u8; CALIB_00_LEN];
    let mut second = [0u8; CALIB_26_LEN];
    read_block(bus, address, REG_CALIB_00, &mut first)?;
    read_block(bus, address, REG_CALIB_26, &mut second)?;
    Ok(Calibration::from_blocks(&first, &second))
}

/// Burst reads all three channels so they come from the same conversion
pub fn read_raw_sample<B: RegisterBus>(bus: &mut B, address: u8) -> Outcome<RawSample> {
    let mut data = [0u8; 8];
    read_block(bus, address, REG_DATA, &mut data)?;
    log::trace!("raw sample bytes {:02x?}", data);
    Ok(RawSample::from_bytes(&data))
}
