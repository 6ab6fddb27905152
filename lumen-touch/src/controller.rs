//! Touch state
//!
//! [`TouchController`] owns the pen IRQ line and the press flags. Each
//! [`scan`](TouchController::scan) looks at the IRQ line and, while the pen
//! is down, takes a cross-checked sample on the panel's bus and maps it to
//! screen coordinates.

use embedded_hal::delay::DelayNs;
use lumen_display::{Canvas, Ili9486};
use lumen_hal::{Backlight, Bus, InputPin, OutputPin};

use crate::calibrator::{CalibrationStatus, Calibrator, CalibratorConfig};
use crate::mapper::{map, Calibration, ScreenPoint};
use crate::sampler::{RawSample, TouchConfig, TouchSampler};

/// Status flag bits
pub mod status {
    /// Pen is currently down
    pub const PRESS_DOWN: u8 = 0x80;
    /// A new press started and has not been acknowledged
    pub const PRESSED: u8 = 0x40;
}

/// Touch controller state machine
pub struct TouchController<IRQ> {
    irq: IRQ,
    sampler: TouchSampler,
    status: u8,
    raw: Option<RawSample>,
    initial: Option<RawSample>,
    point: Option<ScreenPoint>,
    calibration: Option<Calibration>,
}

impl<IRQ: InputPin> TouchController<IRQ> {
    /// Create a controller on the pen IRQ line (low while touched)
    pub fn new(irq: IRQ, config: TouchConfig) -> Self {
        Self {
            irq,
            sampler: TouchSampler::new(config),
            status: 0,
            raw: None,
            initial: None,
            point: None,
            calibration: None,
        }
    }

    /// Poll the pen once
    ///
    /// Returns `true` while the pen is down and a consistent sample was
    /// read. A sample whose two halves disagree is ignored for this poll.
    /// Releasing the pen clears the down flag first and the readings on
    /// the following idle scan.
    pub fn scan<B, RST, BL, D>(
        &mut self,
        panel: &mut Ili9486<B, RST, BL>,
        delay: &mut D,
    ) -> Result<bool, B::Error>
    where
        B: Bus,
        RST: OutputPin,
        BL: Backlight,
        D: DelayNs,
    {
        if self.irq.is_high() {
            if self.status & status::PRESS_DOWN != 0 {
                self.status &= !status::PRESS_DOWN;
            } else {
                self.raw = None;
                self.initial = None;
                self.point = None;
            }
            return Ok(false);
        }

        let Some(raw) = self.sampler.read_twice(panel.bus_mut(), delay)? else {
            return Ok(false);
        };

        let orientation = panel.orientation();
        self.raw = Some(raw);
        self.point = self
            .calibration
            .filter(|cal| cal.orientation == orientation)
            .or_else(|| Calibration::builtin(orientation))
            .and_then(|cal| map(raw, orientation, &cal, panel.width(), panel.height()));

        if self.status & status::PRESS_DOWN == 0 {
            self.status = status::PRESS_DOWN | status::PRESSED;
            self.initial = Some(raw);
            #[cfg(feature = "defmt")]
            defmt::debug!("Pen down at raw {}", raw);
        }
        Ok(true)
    }

    /// Pen is down as of the last scan
    pub fn is_pressed(&self) -> bool {
        self.status & status::PRESS_DOWN != 0
    }

    /// A new press started and has not been acknowledged yet
    pub fn was_just_pressed(&self) -> bool {
        self.status & status::PRESSED != 0
    }

    /// Acknowledge the current press
    pub fn clear_pressed_flag(&mut self) {
        self.status &= !status::PRESSED;
    }

    /// Last accepted raw sample
    pub fn raw(&self) -> Option<RawSample> {
        self.raw
    }

    /// Raw sample of the first contact of the current press
    pub fn initial_raw(&self) -> Option<RawSample> {
        self.initial
    }

    /// Last mapped screen point
    pub fn point(&self) -> Option<ScreenPoint> {
        self.point
    }

    pub fn x(&self) -> Option<i32> {
        self.point.map(|p| p.x)
    }

    pub fn y(&self) -> Option<i32> {
        self.point.map(|p| p.y)
    }

    /// Use `calibration` for subsequent scans in its orientation
    pub fn set_calibration(&mut self, calibration: Calibration) {
        self.calibration = Some(calibration);
    }

    /// Coefficients set by calibration or loaded from storage
    pub fn calibration(&self) -> Option<Calibration> {
        self.calibration
    }

    /// Run the interactive calibration to completion
    ///
    /// Blocks until the operator has tapped four consistent corners.
    /// Returns `None` when the panel orientation has no touch mapping.
    pub fn calibrate<B, RST, BL, D>(
        &mut self,
        panel: &mut Ili9486<B, RST, BL>,
        delay: &mut D,
    ) -> Result<Option<Calibration>, B::Error>
    where
        B: Bus,
        RST: OutputPin,
        BL: Backlight,
        D: DelayNs,
    {
        let mut calibrator = Calibrator::new(CalibratorConfig::default());
        if calibrator.start(self, panel)? == CalibrationStatus::Unsupported {
            return Ok(None);
        }
        loop {
            match calibrator.poll(self, panel, delay)? {
                CalibrationStatus::Complete(calibration) => return Ok(Some(calibration)),
                CalibrationStatus::Unsupported => return Ok(None),
                CalibrationStatus::Collecting { .. } => {}
            }
        }
    }

    pub fn release(self) -> IRQ {
        self.irq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::queue_press;
    use lumen_display::sim::{test_panel, TestPanel};
    use lumen_display::Orientation;
    use lumen_hal::mock::{Bench, MockIrq};
    use lumen_hal::transport::PANEL_CLOCK_HZ;

    fn rig() -> (Bench, TestPanel, TouchController<MockIrq>) {
        let bench = Bench::new();
        let panel = test_panel(&bench);
        let touch = TouchController::new(bench.irq(), TouchConfig::default());
        (bench, panel, touch)
    }

    #[test]
    fn test_idle_scan_reads_nothing() {
        let (bench, mut panel, mut touch) = rig();
        bench.take_events();

        assert!(!touch.scan(&mut panel, &mut bench.delay()).unwrap());
        assert!(bench.events().is_empty());
        assert!(!touch.is_pressed());
        assert_eq!(touch.raw(), None);
    }

    #[test]
    fn test_press_sets_flags_and_point() {
        let (bench, mut panel, mut touch) = rig();
        let raw = RawSample::new(2000, 1000);
        queue_press(&bench, raw);
        bench.set_pen_down(true);

        assert!(touch.scan(&mut panel, &mut bench.delay()).unwrap());
        assert!(touch.is_pressed());
        assert!(touch.was_just_pressed());
        assert_eq!(touch.raw(), Some(raw));
        assert_eq!(touch.initial_raw(), Some(raw));

        let cal = Calibration::builtin(Orientation::D2uL2r).unwrap();
        let expected = map(raw, Orientation::D2uL2r, &cal, 480, 320);
        assert_eq!(touch.point(), expected);
        assert_eq!(touch.x(), expected.map(|p| p.x));
        assert_eq!(touch.y(), expected.map(|p| p.y));
        assert_eq!(bench.pending_reads(), 0);
        assert_eq!(bench.frequency(), PANEL_CLOCK_HZ);
    }

    #[test]
    fn test_drag_keeps_initial_sample() {
        let (bench, mut panel, mut touch) = rig();
        bench.set_pen_down(true);
        queue_press(&bench, RawSample::new(2000, 1000));
        touch.scan(&mut panel, &mut bench.delay()).unwrap();
        touch.clear_pressed_flag();

        queue_press(&bench, RawSample::new(2100, 1100));
        assert!(touch.scan(&mut panel, &mut bench.delay()).unwrap());
        assert_eq!(touch.raw(), Some(RawSample::new(2100, 1100)));
        assert_eq!(touch.initial_raw(), Some(RawSample::new(2000, 1000)));
        assert!(!touch.was_just_pressed());
    }

    #[test]
    fn test_release_clears_in_two_steps() {
        let (bench, mut panel, mut touch) = rig();
        bench.set_pen_down(true);
        queue_press(&bench, RawSample::new(2000, 1000));
        touch.scan(&mut panel, &mut bench.delay()).unwrap();

        bench.set_pen_down(false);
        assert!(!touch.scan(&mut panel, &mut bench.delay()).unwrap());
        assert!(!touch.is_pressed());
        assert!(touch.was_just_pressed());
        assert!(touch.raw().is_some());

        assert!(!touch.scan(&mut panel, &mut bench.delay()).unwrap());
        assert_eq!(touch.raw(), None);
        assert_eq!(touch.initial_raw(), None);
        assert_eq!(touch.point(), None);
    }

    #[test]
    fn test_unstable_sample_is_ignored() {
        let (bench, mut panel, mut touch) = rig();
        bench.set_pen_down(true);
        let (a, b) = (1000u16 << 3, 1200u16 << 3);
        for _ in 0..5 {
            bench.queue_read(&[(a >> 8) as u8, a as u8, (a >> 8) as u8, a as u8]);
        }
        for _ in 0..5 {
            bench.queue_read(&[(b >> 8) as u8, b as u8, (a >> 8) as u8, a as u8]);
        }

        assert!(!touch.scan(&mut panel, &mut bench.delay()).unwrap());
        assert!(!touch.is_pressed());
        assert_eq!(touch.raw(), None);
    }

    #[test]
    fn test_calibration_for_other_orientation_is_ignored() {
        let (bench, mut panel, mut touch) = rig();
        let custom = Calibration {
            orientation: Orientation::R2lD2u,
            x_fac: 1.0,
            y_fac: 1.0,
            x_off: 0.0,
            y_off: 0.0,
        };
        touch.set_calibration(custom);
        assert_eq!(touch.calibration(), Some(custom));

        bench.set_pen_down(true);
        let raw = RawSample::new(2000, 1000);
        queue_press(&bench, raw);
        touch.scan(&mut panel, &mut bench.delay()).unwrap();

        let builtin = Calibration::builtin(Orientation::D2uL2r).unwrap();
        assert_eq!(touch.point(), map(raw, Orientation::D2uL2r, &builtin, 480, 320));
    }

    #[test]
    fn test_unsupported_orientation_has_no_point() {
        let (bench, mut panel, mut touch) = rig();
        panel
            .set_scan_direction(Orientation::U2dL2r, lumen_display::LCD_BACKGROUND)
            .unwrap();
        bench.set_pen_down(true);
        queue_press(&bench, RawSample::new(2000, 1000));

        assert!(touch.scan(&mut panel, &mut bench.delay()).unwrap());
        assert!(touch.raw().is_some());
        assert_eq!(touch.point(), None);
    }
}
