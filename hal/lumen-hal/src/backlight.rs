//! Panel backlight control

use crate::gpio::{ActiveHigh, GpioLine, OutputPin};

/// Backlight brightness sink
///
/// `level` is a PWM duty from 0 (off) to 255 (full brightness).
pub trait Backlight {
    fn set_level(&mut self, level: u8);
}

/// For boards where the backlight is hard-wired on
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBacklight;

impl Backlight for NoBacklight {
    fn set_level(&mut self, _level: u8) {}
}

/// Backlight switched by a plain GPIO: any non-zero level turns it on
impl<P: OutputPin> Backlight for ActiveHigh<P> {
    fn set_level(&mut self, level: u8) {
        if level == 0 {
            self.deassert();
        } else {
            self.assert();
        }
    }
}
