// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Device configuration and its register encoding.
//!
//! Fields are masked to their bit width when encoded. Out-of-range raw
//! values keep their low-order bits and are never rejected.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Register holding standby time, IIR filter and 3-wire SPI flag
pub const REG_CONFIG: u8 = 0xF5;
/// Register holding humidity oversampling
pub const REG_CTRL_HUM: u8 = 0xF2;
/// Register holding temperature/pressure oversampling and mode
pub const REG_CTRL_MEAS: u8 = 0xF4;

/// Oversampling factor of a single channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Oversampling {
    /// Channel is skipped (output set to 0x8000 / 0x80000)
    Skipped,
    #[default]
    X1,
    X2,
    X4,
    X8,
    X16,
}

impl Oversampling {
    /// Every legal level, in register order
    pub const ALL: [Oversampling; 6] = [
        Oversampling::Skipped,
        Oversampling::X1,
        Oversampling::X2,
        Oversampling::X4,
        Oversampling::X8,
        Oversampling::X16,
    ];

    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Decodes a 3-bit field. Codes above 5 all mean x16 on the device.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Oversampling::Skipped,
            1 => Oversampling::X1,
            2 => Oversampling::X2,
            3 => Oversampling::X4,
            4 => Oversampling::X8,
            _ => Oversampling::X16,
        }
    }
}

/// Power mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mode {
    #[default]
    Sleep,
    Forced,
    Normal,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Sleep, Mode::Forced, Mode::Normal];

    pub fn bits(self) -> u8 {
        match self {
            Mode::Sleep => 0x00,
            Mode::Forced => 0x01,
            Mode::Normal => 0x03,
        }
    }

    /// Decodes a 2-bit field. Both 01 and 10 select forced mode.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0x00 => Mode::Sleep,
            0x03 => Mode::Normal,
            _ => Mode::Forced,
        }
    }
}

/// IIR filter coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Filter {
    #[default]
    Off,
    X2,
    X4,
    X8,
    X16,
}

impl Filter {
    pub const ALL: [Filter; 5] = [Filter::Off, Filter::X2, Filter::X4, Filter::X8, Filter::X16];

    pub fn bits(self) -> u8 {
        self as u8
    }

    /// Decodes a 3-bit field. Codes above 4 all mean x16 on the device.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Filter::Off,
            1 => Filter::X2,
            2 => Filter::X4,
            3 => Filter::X8,
            _ => Filter::X16,
        }
    }
}

/// Inactive time between measurements in normal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StandbyTime {
    #[default]
    Ms0_5,
    Ms62_5,
    Ms125,
    Ms250,
    Ms500,
    Ms1000,
    Ms10,
    Ms20,
}

impl StandbyTime {
    pub const ALL: [StandbyTime; 8] = [
        StandbyTime::Ms0_5,
        StandbyTime::Ms62_5,
        StandbyTime::Ms125,
        StandbyTime::Ms250,
        StandbyTime::Ms500,
        StandbyTime::Ms1000,
        StandbyTime::Ms10,
        StandbyTime::Ms20,
    ];

    pub fn bits(self) -> u8 {
        self as u8
    }

    pub fn from_bits(bits: u8) -> Self {
        Self::ALL[(bits & 0x07) as usize]
    }

    /// Standby duration in microseconds
    pub fn micros(self) -> u32 {
        match self {
            StandbyTime::Ms0_5 => 500,
            StandbyTime::Ms62_5 => 62_500,
            StandbyTime::Ms125 => 125_000,
            StandbyTime::Ms250 => 250_000,
            StandbyTime::Ms500 => 500_000,
            StandbyTime::Ms1000 => 1_000_000,
            StandbyTime::Ms10 => 10_000,
            StandbyTime::Ms20 => 20_000,
        }
    }
}

/// Device configuration spread over ctrl_hum, ctrl_meas and config
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    pub temperature_oversampling: Oversampling,
    pub pressure_oversampling: Oversampling,
    pub humidity_oversampling: Oversampling,
    pub mode: Mode,
    pub filter: Filter,
    pub standby_time: StandbyTime,
    /// Enables the 3-wire SPI interface
    pub spi3w: bool,
}

impl Config {
    /// Encodes raw field codes, keeping only the low bits of each
    pub fn encode_raw(
        temperature_oversampling: u8,
        pressure_oversampling: u8,
        humidity_oversampling: u8,
        mode: u8,
        filter: u8,
        standby_time: u8,
        spi3w: bool,
    ) -> [u8; 6] {
        [
            REG_CONFIG,
            (standby_time & 0x07) << 5 | (filter & 0x07) << 2 | spi3w as u8,
            REG_CTRL_HUM,
            humidity_oversampling & 0x07,
            REG_CTRL_MEAS,
            (temperature_oversampling & 0x07) << 5 | (pressure_oversampling & 0x07) << 2 | (mode & 0x03),
        ]
    }

    /// Address/value pairs for config, ctrl_hum and ctrl_meas.
    ///
    /// ctrl_hum only takes effect after ctrl_meas is written, so the
    /// order of the pairs matters.
    pub fn encode(&self) -> [u8; 6] {
        Self::encode_raw(
            self.temperature_oversampling.bits(),
            self.pressure_oversampling.bits(),
            self.humidity_oversampling.bits(),
            self.mode.bits(),
            self.filter.bits(),
            self.standby_time.bits(),
            self.spi3w,
        )
    }

    /// Decodes the ctrl_hum..config block (0xF2..=0xF5)
    pub fn decode(block: &[u8; 4]) -> Self {
        let [ctrl_hum, _status, ctrl_meas, config] = *block;
        Config {
            humidity_oversampling: Oversampling::from_bits(ctrl_hum),
            temperature_oversampling: Oversampling::from_bits(ctrl_meas >> 5),
            pressure_oversampling: Oversampling::from_bits(ctrl_meas >> 2),
            mode: Mode::from_bits(ctrl_meas),
            standby_time: StandbyTime::from_bits(config >> 5),
            filter: Filter::from_bits(config >> 2),
            spi3w: config & 0x01 != 0,
        }
    }
}
