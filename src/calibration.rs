// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

/// First calibration block, calib00..calib25
pub const REG_CALIB_00: u8 = 0x88;
pub const CALIB_00_LEN: usize = 26;
/// Second calibration block, calib26..calib41
pub const REG_CALIB_26: u8 = 0xE1;
pub const CALIB_26_LEN: usize = 16;

///
///Factory trimming coefficients. Read once per bring-up
///from two register blocks and never modified afterwards.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Calibration {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,
    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,
    pub dig_h1: u8,
    pub dig_h2: i16,
    pub dig_h3: u8,
    pub dig_h4: i16,
    pub dig_h5: i16,
    pub dig_h6: i8,
}

impl Calibration {
    /// Builds the coefficients from both raw blocks.
    ///
    /// H4 and H5 are 12-bit signed values sharing the nibbles of 0xE5.
    pub fn from_blocks(first: &[u8; CALIB_00_LEN], second: &[u8; CALIB_26_LEN]) -> Self {
        let word = |i: usize| [first[i], first[i + 1]];
        Calibration {
            dig_t1: u16::from_le_bytes(word(0)),
            dig_t2: i16::from_le_bytes(word(2)),
            dig_t3: i16::from_le_bytes(word(4)),
            dig_p1: u16::from_le_bytes(word(6)),
            dig_p2: i16::from_le_bytes(word(8)),
            dig_p3: i16::from_le_bytes(word(10)),
            dig_p4: i16::from_le_bytes(word(12)),
            dig_p5: i16::from_le_bytes(word(14)),
            dig_p6: i16::from_le_bytes(word(16)),
            dig_p7: i16::from_le_bytes(word(18)),
            dig_p8: i16::from_le_bytes(word(20)),
            dig_p9: i16::from_le_bytes(word(22)),
            dig_h1: first[25],
            dig_h2: i16::from_le_bytes([second[0], second[1]]),
            dig_h3: second[2],
            dig_h4: (second[3] as i8 as i16) << 4 | (second[4] & 0x0F) as i16,
            dig_h5: (second[5] as i8 as i16) << 4 | (second[4] >> 4) as i16,
            dig_h6: second[6] as i8,
        }
    }
}
