// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use crate::bus::DEFAULT_MAX_ATTEMPTS;
use crate::config::{Config, Filter, Mode, Oversampling, StandbyTime};
use crate::registers::PRIMARY_ADDRESS;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default I2C device node on a Raspberry Pi
pub const DEFAULT_BUS_PATH: &str = "/dev/i2c-1";

///
///Driver settings. Defaults match a BME280 on the
///primary address running continuously with x16
///oversampling on every channel.
///
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Settings {
    /// 7-bit device address
    pub address: u8,
    /// Flag polls per bus wait
    pub bus_poll_attempts: u16,
    /// Status reads while waiting for the NVM copy after reset
    pub memory_ready_attempts: u16,
    /// Pause between those status reads
    pub memory_poll_interval: Duration,
    /// Wait after configuring before the first sample is trusted
    pub settle_time: Duration,
    /// Clock pulses allowed when freeing a stuck data line
    pub recovery_pulses: u8,
    /// Configuration written during bring-up
    pub device: Config,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            address: PRIMARY_ADDRESS,
            bus_poll_attempts: DEFAULT_MAX_ATTEMPTS,
            memory_ready_attempts: 100,
            memory_poll_interval: Duration::from_millis(1),
            settle_time: Duration::from_millis(10),
            recovery_pulses: 9,
            device: Config {
                temperature_oversampling: Oversampling::X16,
                pressure_oversampling: Oversampling::X16,
                humidity_oversampling: Oversampling::X16,
                mode: Mode::Normal,
                filter: Filter::Off,
                standby_time: StandbyTime::Ms62_5,
                spi3w: false,
            },
        }
    }
}

impl Settings {
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    pub fn with_device_config(mut self, device: Config) -> Self {
        self.device = device;
        self
    }

    pub fn with_memory_ready_attempts(mut self, attempts: u16) -> Self {
        self.memory_ready_attempts = attempts;
        self
    }

    pub fn with_memory_poll_interval(mut self, interval: Duration) -> Self {
        self.memory_poll_interval = interval;
        self
    }

    pub fn with_settle_time(mut self, settle_time: Duration) -> Self {
        self.settle_time = settle_time;
        self
    }

    pub fn with_bus_poll_attempts(mut self, attempts: u16) -> Self {
        self.bus_poll_attempts = attempts;
        self
    }

    pub fn with_recovery_pulses(mut self, pulses: u8) -> Self {
        self.recovery_pulses = pulses;
        self
    }

    /// No waiting between polls or after configuration
    pub fn without_delays(self) -> Self {
        self.with_memory_poll_interval(Duration::ZERO)
            .with_settle_time(Duration::ZERO)
    }
}
