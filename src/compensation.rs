// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Floating point compensation of raw ADC counts.
//!
//! Formulas follow the datasheet floating point reference. The order of
//! operations is kept as written there so results match reference output
//! bit for bit in `f32`.

use crate::calibration::Calibration;
use crate::registers::RawSample;

/// Pa to mmHg
const MMHG_PER_PA: f32 = 0.007500617;

/// One compensated reading
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measurement {
    /// Degrees Celsius
    pub temperature: f32,
    /// Pascal
    pub pressure: f32,
    /// Relative humidity in percent, within 0..=100
    pub humidity: f32,
}

impl Measurement {
    pub fn pressure_hpa(&self) -> f32 {
        self.pressure / 100.0
    }

    pub fn pressure_mmhg(&self) -> f32 {
        self.pressure * MMHG_PER_PA
    }
}

/// Fine temperature shared by the pressure and humidity stages
pub fn fine_temperature(adc_t: u32, calibration: &Calibration) -> f32 {
    let t = adc_t as f32;
    let t1 = calibration.dig_t1 as f32;
    let var1 = (t / 16384.0 - t1 / 1024.0) * calibration.dig_t2 as f32;
    let var2 = ((t / 131072.0 - t1 / 8192.0) * (t / 131072.0 - t1 / 8192.0)) * calibration.dig_t3 as f32;
    var1 + var2
}

/// Pressure in Pa. Returns exactly 0 when the first stage term is zero.
pub fn pressure(adc_p: u32, t_fine: f32, calibration: &Calibration) -> f32 {
    let c = calibration;
    let mut var1 = t_fine / 2.0 - 64000.0;
    let mut var2 = var1 * var1 * c.dig_p6 as f32 / 32768.0;
    var2 += var1 * c.dig_p5 as f32 * 2.0;
    var2 = var2 / 4.0 + c.dig_p4 as f32 * 65536.0;
    var1 = (c.dig_p3 as f32 * var1 * var1 / 524288.0 + c.dig_p2 as f32 * var1) / 524288.0;
    var1 = (1.0 + var1 / 32768.0) * c.dig_p1 as f32;
    if var1 == 0.0 {
        return 0.0;
    }

    let mut p = 1048576.0 - adc_p as f32;
    p = (p - var2 / 4096.0) * 6250.0 / var1;
    var1 = c.dig_p9 as f32 * p * p / 2147483648.0;
    var2 = p * c.dig_p8 as f32 / 32768.0;
    p + (var1 + var2 + c.dig_p7 as f32) / 16.0
}

/// Relative humidity in percent, clamped to 0..=100
pub fn humidity(adc_h: u16, t_fine: f32, calibration: &Calibration) -> f32 {
    let c = calibration;
    let mut h = t_fine - 76800.0;
    h = (adc_h as f32 - (c.dig_h4 as f32 * 64.0 + c.dig_h5 as f32 / 16384.0 * h))
        * (c.dig_h2 as f32 / 65536.0
            * (1.0 + c.dig_h6 as f32 / 67108864.0 * h * (1.0 + c.dig_h3 as f32 / 67108864.0 * h)));
    h *= 1.0 - c.dig_h1 as f32 * h / 524288.0;
    h.clamp(0.0, 100.0)
}

/// Compensates a raw sample into temperature, pressure and humidity
pub fn compensate(sample: &RawSample, calibration: &Calibration) -> Measurement {
    let t_fine = fine_temperature(sample.temperature, calibration);
    Measurement {
        temperature: t_fine / 5120.0,
        pressure: pressure(sample.pressure, t_fine, calibration),
        humidity: humidity(sample.humidity, t_fine, calibration),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{DATASHEET_ADC_P, DATASHEET_ADC_T, DATASHEET_P, DATASHEET_T, SAMPLE_ADC_H, SAMPLE_H};

    fn datasheet_calibration() -> Calibration {
        let (dig_t1, dig_t2, dig_t3) = DATASHEET_T;
        let (dig_p1, p) = DATASHEET_P;
        let (dig_h1, dig_h2, dig_h3, dig_h4, dig_h5, dig_h6) = SAMPLE_H;
        Calibration {
            dig_t1,
            dig_t2,
            dig_t3,
            dig_p1,
            dig_p2: p[0],
            dig_p3: p[1],
            dig_p4: p[2],
            dig_p5: p[3],
            dig_p6: p[4],
            dig_p7: p[5],
            dig_p8: p[6],
            dig_p9: p[7],
            dig_h1,
            dig_h2,
            dig_h3,
            dig_h4,
            dig_h5,
            dig_h6,
        }
    }

    fn sample(humidity: u16) -> RawSample {
        RawSample {
            pressure: DATASHEET_ADC_P,
            temperature: DATASHEET_ADC_T,
            humidity,
        }
    }

    #[test]
    fn datasheet_example() {
        let calibration = datasheet_calibration();
        let t_fine = fine_temperature(DATASHEET_ADC_T, &calibration);
        assert!((t_fine - 128422.29).abs() < 0.1);

        let m = compensate(&sample(SAMPLE_ADC_H), &calibration);
        assert!((m.temperature - 25.08).abs() < 1e-2, "{}", m.temperature);
        assert!((m.pressure - 100653.27).abs() < 0.1, "{}", m.pressure);
        assert!((m.humidity - 38.275).abs() < 1e-2, "{}", m.humidity);
    }

    #[test]
    fn zero_first_stage_reports_zero_pressure() {
        let calibration = Calibration {
            dig_p1: 0,
            ..datasheet_calibration()
        };
        let m = compensate(&sample(SAMPLE_ADC_H), &calibration);
        assert_eq!(m.pressure, 0.0);
        assert!(m.temperature.is_finite());
    }

    #[test]
    fn humidity_is_clamped() {
        let calibration = datasheet_calibration();
        assert_eq!(compensate(&sample(0), &calibration).humidity, 0.0);
        assert_eq!(compensate(&sample(u16::MAX), &calibration).humidity, 100.0);
    }

    #[test]
    fn unit_conversions() {
        let m = Measurement {
            temperature: 20.0,
            pressure: 101325.0,
            humidity: 50.0,
        };
        assert!((m.pressure_hpa() - 1013.25).abs() < 1e-3);
        assert!((m.pressure_mmhg() - 760.0).abs() < 0.01);
    }
}
