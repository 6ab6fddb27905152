//! Lumen Touch
//!
//! XPT2046 resistive touch pipeline for the ILI9486 panel:
//!
//! - [`sampler`] - raw, averaged and cross-checked ADC readings
//! - [`controller`] - pen state flags and the per-poll scan
//! - [`mapper`] - raw-to-screen affine mapping per orientation
//! - [`calibrator`] - interactive four-corner calibration
//! - [`store`] - calibration persistence in flash
//!
//! The touch controller shares the panel's SPI bus. Each reading runs in
//! its own touch session on [`Ili9486::bus_mut`](lumen_display::Ili9486::bus_mut),
//! so it can never split a panel window write.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod calibrator;
pub mod controller;
pub mod mapper;
pub mod sampler;
pub mod store;

pub use calibrator::{CalibrationStatus, Calibrator, CalibratorConfig, GeometryError};
pub use controller::TouchController;
pub use mapper::{map, Calibration, ScreenPoint};
pub use sampler::{RawSample, TouchConfig, TouchSampler};
pub use store::{load_calibration, save_calibration, StoreError};

#[cfg(test)]
pub(crate) mod test_support {
    use lumen_hal::mock::Bench;

    use crate::sampler::{RawSample, SAMPLE_COUNT};

    /// Queue replies for one `read_twice` at a steady `raw` position
    pub fn queue_press(bench: &Bench, raw: RawSample) {
        let (x, y) = (raw.x << 3, raw.y << 3);
        for _ in 0..2 * SAMPLE_COUNT {
            bench.queue_read(&[(x >> 8) as u8, x as u8, (y >> 8) as u8, y as u8]);
        }
    }
}
