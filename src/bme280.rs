// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use crate::bus::{BusPeripheral, RegisterBus, TransactionEngine};
use crate::calibration::Calibration;
use crate::compensation::{compensate, Measurement};
use crate::config::{Config, Mode};
use crate::error::Bme280Error;
use crate::linux::LinuxBus;
use crate::recovery::{recover, LineControl};
use crate::registers::{self, Status, CHIP_ID};
use crate::settings::{Settings, DEFAULT_BUS_PATH};
use i2cdev::linux::LinuxI2CError;
use log::{debug, warn};
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Bring-up progress of the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Uninitialized,
    Identifying,
    Resetting,
    WaitingMemoryReady,
    LoadingCalibration,
    Configuring,
    Ready,
    Failed,
}

/// BME280 Struct, wraps a register bus and holds
/// the calibration read during bring-up
///
/// Every operation takes `&mut self`, so one transaction at a time is
/// guaranteed by the borrow. Share a driver between threads by putting the
/// whole `Bme280` behind a `Mutex`.
///
pub struct Bme280<B> {
    bus: B,
    settings: Settings,
    state: State,
    calibration: Option<Calibration>,
    recovery: Option<Box<dyn LineControl + Send>>,
}

impl Bme280<LinuxBus> {
    /// Create a new BME280 Struct
    ///
    /// Tries to open `/dev/i2c-1` with the device on address 0x76.
    /// If fails, return an LinuxI2CError from i2cdev
    ///
    pub fn new() -> Result<Bme280<LinuxBus>, LinuxI2CError> {
        Bme280::open(DEFAULT_BUS_PATH, Settings::default())
    }

    /// Opens the given bus node with custom settings
    pub fn open<P: AsRef<Path>>(path: P, settings: Settings) -> Result<Bme280<LinuxBus>, LinuxI2CError> {
        let bus = LinuxBus::open(path, settings.address)?;
        Ok(Bme280::with_bus(bus, settings))
    }
}

impl<P: BusPeripheral> Bme280<TransactionEngine<P>> {
    /// Drives the sensor through a polled bus peripheral
    pub fn with_peripheral(peripheral: P, settings: Settings) -> Self {
        let engine = TransactionEngine::with_max_attempts(peripheral, settings.bus_poll_attempts);
        Bme280::with_bus(engine, settings)
    }
}

impl<B: RegisterBus> Bme280<B> {
    pub fn with_bus(bus: B, settings: Settings) -> Self {
        Bme280 {
            bus,
            settings,
            state: State::Uninitialized,
            calibration: None,
            recovery: None,
        }
    }

    /// Attaches raw line control used to free a stuck bus before bring-up
    /// and before each measurement
    pub fn with_recovery<L: LineControl + Send + 'static>(mut self, lines: L) -> Self {
        self.recovery = Some(Box::new(lines));
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Coefficients of the last successful bring-up
    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    pub fn release(self) -> B {
        self.bus
    }

    fn enter(&mut self, state: State) {
        debug!("bme280 {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn recover_bus(&mut self) -> Result<(), Bme280Error> {
        match self.recovery.as_mut() {
            Some(lines) => recover(lines.as_mut(), self.settings.recovery_pulses),
            None => Ok(()),
        }
    }

    fn pause(duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }

    /// Checks the id register.
    /// If the device is not a BME280 returns DeviceNotRecognized,
    /// else returns the chip id.
    ///
    pub fn identify(&mut self) -> Result<u8, Bme280Error> {
        let id = registers::read_chip_id(&mut self.bus, self.settings.address)?;
        if id != CHIP_ID {
            warn!("unexpected chip id {:#04x}", id);
            return Err(Bme280Error::DeviceNotRecognized(id));
        }
        Ok(id)
    }

    /// Identifies, resets, loads calibration and writes `config`.
    ///
    /// Any failure leaves the driver in [`State::Failed`] without
    /// calibration. It may be called again at any time.
    pub fn bring_up(&mut self, config: Config) -> Result<(), Bme280Error> {
        self.reinitialize(config).map(|_| ())
    }

    fn reinitialize(&mut self, config: Config) -> Result<Calibration, Bme280Error> {
        self.calibration = None;
        self.run_bring_up(config).map_err(|e| self.fail(e))
    }

    /// Drops calibration and parks the driver in [`State::Failed`]
    fn fail(&mut self, error: Bme280Error) -> Bme280Error {
        warn!("bme280 failed in {:?}: {}", self.state, error);
        self.calibration = None;
        self.enter(State::Failed);
        error
    }

    fn run_bring_up(&mut self, config: Config) -> Result<Calibration, Bme280Error> {
        self.recover_bus()?;

        self.enter(State::Identifying);
        self.identify()?;

        self.enter(State::Resetting);
        registers::soft_reset(&mut self.bus, self.settings.address)?;

        self.enter(State::WaitingMemoryReady);
        self.wait_memory_ready()?;

        self.enter(State::LoadingCalibration);
        let calibration = registers::read_calibration(&mut self.bus, self.settings.address)
            .map_err(Bme280Error::CalibrationIncomplete)?;

        self.enter(State::Configuring);
        registers::write_config(&mut self.bus, self.settings.address, &config)?;
        self.settings.device = config;
        self.calibration = Some(calibration);
        Self::pause(self.settings.settle_time);

        self.enter(State::Ready);
        Ok(calibration)
    }

    fn wait_memory_ready(&mut self) -> Result<(), Bme280Error> {
        for _ in 0..self.settings.memory_ready_attempts {
            if !self.get_status()?.im_update {
                return Ok(());
            }
            Self::pause(self.settings.memory_poll_interval);
        }
        warn!("NVM copy still running after {} polls", self.settings.memory_ready_attempts);
        Err(Bme280Error::MemoryNeverReady)
    }

    /// Starts one conversion and waits until it finishes
    fn run_forced(&mut self) -> Result<(), Bme280Error> {
        registers::write_config(&mut self.bus, self.settings.address, &self.settings.device)?;
        for _ in 0..self.settings.memory_ready_attempts {
            if !self.get_status()?.measuring {
                return Ok(());
            }
            Self::pause(self.settings.memory_poll_interval);
        }
        Err(Bme280Error::MeasurementTimeout)
    }

    /// Reads the configuration currently held by the device
    pub fn get_configuration(&mut self) -> Result<Config, Bme280Error> {
        Ok(registers::read_config(&mut self.bus, self.settings.address)?)
    }

    pub fn get_status(&mut self) -> Result<Status, Bme280Error> {
        Ok(registers::read_status(&mut self.bus, self.settings.address)?)
    }

    /// Needs a new bring-up before a sample can be trusted
    fn needs_bring_up(&mut self) -> Result<bool, Bme280Error> {
        if self.state != State::Ready || self.calibration.is_none() {
            return Ok(true);
        }
        if self.settings.device.mode != Mode::Normal {
            return Ok(false);
        }
        let mode = self.get_configuration()?.mode;
        if mode != Mode::Normal {
            debug!("device dropped to {:?} mode, re-initializing", mode);
        }
        Ok(mode != Mode::Normal)
    }

    /// Get temperature, pressure and humidity from the device.
    ///
    /// Re-runs the bring-up once with the configured settings when the
    /// driver is not ready or the device left normal mode.
    /// In case of any problem, returns the error.
    pub fn measure(&mut self) -> Result<Measurement, Bme280Error> {
        if let Err(e) = self.recover_bus() {
            return Err(self.fail(e));
        }
        let current = if self.needs_bring_up()? { None } else { self.calibration };
        let calibration = match current {
            Some(calibration) => calibration,
            None => self.reinitialize(self.settings.device)?,
        };
        if self.settings.device.mode == Mode::Forced {
            self.run_forced()?;
        }

        let sample = registers::read_raw_sample(&mut self.bus, self.settings.address)?;
        Ok(compensate(&sample, &calibration))
    }
}
