// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Simulated hardware shared by the unit tests.

use crate::bus::{BusPeripheral, Direction, Flag, RegisterBus};
use crate::error::{BusError, Outcome};

/// Bus activity seen by [`SimulatedPeripheral`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Start,
    Stop,
    Address(u8),
    Write(u8),
    Read(u8),
    Ack(bool),
}

/// Flag-level model of a bus peripheral with one device attached
pub struct SimulatedPeripheral {
    pub device_address: u8,
    pub start_ack: bool,
    pub address_silent: bool,
    pub nack_byte: Option<usize>,
    pub rx_data: Vec<u8>,
    pub written: Vec<u8>,
    pub events: Vec<Event>,
    pub ack_failed: bool,
    pub start_polls: u32,
    rx_pos: usize,
    start_flag: bool,
    address_flag: bool,
    transmitted_flag: bool,
}

impl SimulatedPeripheral {
    pub fn new(device_address: u8) -> Self {
        SimulatedPeripheral {
            device_address,
            start_ack: true,
            address_silent: false,
            nack_byte: None,
            rx_data: Vec::new(),
            written: Vec::new(),
            events: Vec::new(),
            ack_failed: false,
            start_polls: 0,
            rx_pos: 0,
            start_flag: false,
            address_flag: false,
            transmitted_flag: false,
        }
    }
}

impl BusPeripheral for SimulatedPeripheral {
    fn send_start(&mut self) {
        self.events.push(Event::Start);
        self.start_flag = self.start_ack;
    }

    fn send_stop(&mut self) {
        self.events.push(Event::Stop);
        self.start_flag = false;
    }

    fn send_address(&mut self, address: u8, direction: Direction) {
        self.events.push(Event::Address(direction.header(address)));
        self.start_flag = false;
        if self.address_silent {
            return;
        }
        if address == self.device_address {
            self.address_flag = true;
        } else {
            self.ack_failed = true;
        }
    }

    fn write_byte(&mut self, byte: u8) {
        self.events.push(Event::Write(byte));
        let index = self.written.len();
        self.written.push(byte);
        if self.nack_byte == Some(index) {
            self.ack_failed = true;
            self.transmitted_flag = false;
        } else {
            self.transmitted_flag = true;
        }
    }

    fn read_byte(&mut self) -> u8 {
        let byte = self.rx_data.get(self.rx_pos).copied().unwrap_or(0xFF);
        self.rx_pos += 1;
        self.events.push(Event::Read(byte));
        byte
    }

    fn acknowledge_next(&mut self, ack: bool) {
        self.events.push(Event::Ack(ack));
    }

    fn poll_flag(&mut self, flag: Flag) -> bool {
        match flag {
            Flag::StartSent => {
                self.start_polls += 1;
                self.start_flag
            }
            Flag::AddressSent => self.address_flag,
            Flag::ByteTransmitted => self.transmitted_flag,
            Flag::ByteReceived => self.rx_pos < self.rx_data.len(),
            Flag::AckFailed => self.ack_failed,
        }
    }

    fn clear_flag(&mut self, flag: Flag) {
        match flag {
            Flag::AddressSent => self.address_flag = false,
            Flag::AckFailed => self.ack_failed = false,
            Flag::StartSent => self.start_flag = false,
            Flag::ByteTransmitted => self.transmitted_flag = false,
            Flag::ByteReceived => {}
        }
    }
}

/// Datasheet example temperature and pressure trimming values
pub const DATASHEET_T: (u16, i16, i16) = (27504, 26435, -1000);
pub const DATASHEET_P: (u16, [i16; 8]) = (36477, [-10685, 3024, 2855, 140, -7, 15500, -14600, 6000]);
/// Typical humidity trimming values: H1, H2, H3, H4, H5, H6
pub const SAMPLE_H: (u8, i16, u8, i16, i16, i8) = (75, 362, 0, 313, 50, 30);
pub const DATASHEET_ADC_T: u32 = 519888;
pub const DATASHEET_ADC_P: u32 = 415148;
pub const SAMPLE_ADC_H: u16 = 27000;

/// Register-file model of a BME280 behind a [`RegisterBus`]
pub struct FakeSensor {
    pub address: u8,
    pub registers: [u8; 256],
    pub busy_status_reads: usize,
    pub measuring_status_reads: usize,
    pub fail_read_at: Option<u8>,
    pub fail_write_at: Option<u8>,
    pub resets: usize,
    pub writes: Vec<Vec<u8>>,
    pub reads: Vec<(u8, usize)>,
    pointer: u8,
}

impl FakeSensor {
    pub fn new(address: u8) -> Self {
        let mut registers = [0u8; 256];
        registers[0xD0] = 0x60;
        FakeSensor {
            address,
            registers,
            busy_status_reads: 0,
            measuring_status_reads: 0,
            fail_read_at: None,
            fail_write_at: None,
            resets: 0,
            writes: Vec::new(),
            reads: Vec::new(),
            pointer: 0,
        }
    }

    /// Sensor loaded with the datasheet calibration and raw sample
    pub fn with_datasheet_values(address: u8) -> Self {
        let mut sensor = FakeSensor::new(address);
        let (t1, t2, t3) = DATASHEET_T;
        let (p1, p_rest) = DATASHEET_P;

        let mut words = vec![t1.to_le_bytes(), t2.to_le_bytes(), t3.to_le_bytes(), p1.to_le_bytes()];
        words.extend(p_rest.iter().map(|p| p.to_le_bytes()));
        for (index, word) in words.iter().enumerate() {
            sensor.registers[0x88 + index * 2] = word[0];
            sensor.registers[0x89 + index * 2] = word[1];
        }

        let (h1, h2, h3, h4, h5, h6) = SAMPLE_H;
        sensor.registers[0xA1] = h1;
        sensor.registers[0xE1..0xE3].copy_from_slice(&h2.to_le_bytes());
        sensor.registers[0xE3] = h3;
        sensor.registers[0xE4] = (h4 >> 4) as u8;
        sensor.registers[0xE5] = (h4 & 0x0F) as u8 | ((h5 & 0x0F) as u8) << 4;
        sensor.registers[0xE6] = (h5 >> 4) as u8;
        sensor.registers[0xE7] = h6 as u8;

        sensor.set_raw_sample(DATASHEET_ADC_P, DATASHEET_ADC_T, SAMPLE_ADC_H);
        sensor
    }

    pub fn set_raw_sample(&mut self, pressure: u32, temperature: u32, humidity: u16) {
        let split = |value: u32| [(value >> 12) as u8, (value >> 4) as u8, ((value & 0x0F) << 4) as u8];
        self.registers[0xF7..0xFA].copy_from_slice(&split(pressure));
        self.registers[0xFA..0xFD].copy_from_slice(&split(temperature));
        self.registers[0xFD..0xFF].copy_from_slice(&humidity.to_be_bytes());
    }
}

impl RegisterBus for FakeSensor {
    fn write(&mut self, address: u8, payload: &[u8], _release: bool) -> Outcome {
        if address != self.address {
            return Err(BusError::AddressNotAcknowledged);
        }
        if payload.first().is_some() && payload.first().copied() == self.fail_write_at {
            return Err(BusError::DataNotAcknowledged);
        }
        self.writes.push(payload.to_vec());

        if let [register] = payload {
            self.pointer = *register;
            return Ok(());
        }
        for pair in payload.chunks(2) {
            if let [register, value] = *pair {
                if register == 0xE0 && value == 0xB6 {
                    self.resets += 1;
                    self.registers[0xF2] = 0;
                    self.registers[0xF4] = 0;
                    self.registers[0xF5] = 0;
                } else {
                    self.registers[register as usize] = value;
                }
            }
        }
        Ok(())
    }

    fn read(&mut self, address: u8, buffer: &mut [u8], _release: bool) -> Outcome {
        if address != self.address {
            return Err(BusError::AddressNotAcknowledged);
        }
        if Some(self.pointer) == self.fail_read_at {
            return Err(BusError::ReadTimeout);
        }
        self.reads.push((self.pointer, buffer.len()));

        if self.pointer == 0xF3 {
            if self.busy_status_reads > 0 {
                self.busy_status_reads -= 1;
                self.registers[0xF3] |= 0x01;
            } else {
                self.registers[0xF3] &= !0x01;
            }
            if self.measuring_status_reads > 0 {
                self.measuring_status_reads -= 1;
                self.registers[0xF3] |= 0x08;
            } else {
                self.registers[0xF3] &= !0x08;
            }
        }
        for slot in buffer.iter_mut() {
            *slot = self.registers[self.pointer as usize];
            self.pointer = self.pointer.wrapping_add(1);
        }
        Ok(())
    }
}
