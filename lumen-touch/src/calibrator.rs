//! Four-corner touch calibration
//!
//! The operator taps a cross near each corner in turn (top-left,
//! top-right, bottom-left, bottom-right). The four raw samples must form
//! a plausible rectangle: both pairs of opposite edges and the two
//! diagonals have to agree in length within a ratio band. Any failure
//! restarts from the first corner with the collected values on screen.
//! On success the affine coefficients for the current orientation are
//! derived and handed to the [`TouchController`].

use embedded_hal::delay::DelayNs;
use heapless::Vec;
use lumen_display::{
    Canvas, DotSize, DotStyle, Fill, Ili9486, LineStyle, Orientation, Rasterizer, Rgb565,
    TextRenderer, FONT16, FONT_BACKGROUND, LCD_BACKGROUND,
};
use lumen_hal::{Backlight, Bus, InputPin, OutputPin};

use crate::controller::TouchController;
use crate::mapper::{screen_axes, Calibration};
use crate::sampler::RawSample;

const INTRO_TEXT: &str = "Please use the stylus click the cross on the screen. \
    The cross will always move until the screen adjustment is completed.";
const UNSUPPORTED_TEXT: &str = "Touch calibration not supported for this direction";
const SUCCESS_TEXT: &str = "Touch Screen Adjust OK!";
const RETRY_TEXT: &str = "TP Need readjust!";

/// Half length of the cross arms
const CROSS_ARM: u16 = 12;
const CROSS_RADIUS: u16 = 6;
const CROSS_DOT: DotSize = match DotSize::new(2) {
    Some(size) => size,
    None => DotSize::MIN,
};

const MARKER: Rgb565 = Rgb565::RED;
const TEXT: Rgb565 = Rgb565::RED;

/// Calibration configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibratorConfig {
    /// Inset of the targets from the panel edges (px)
    pub margin: u16,
    /// Lowest accepted edge/diagonal length ratio
    pub ratio_min: f32,
    /// Highest accepted edge/diagonal length ratio
    pub ratio_max: f32,
    /// Pause after each accepted tap (ms)
    pub tap_delay_ms: u32,
    /// How long result messages stay up (ms)
    pub message_ms: u32,
}

impl Default for CalibratorConfig {
    fn default() -> Self {
        Self {
            margin: 12,
            ratio_min: 0.95,
            ratio_max: 1.05,
            tap_delay_ms: 200,
            message_ms: 1000,
        }
    }
}

/// Which length comparison failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Top edge against bottom edge
    Horizontal,
    /// Left edge against right edge
    Vertical,
    /// One diagonal against the other
    Diagonal,
}

/// Raw corners do not form a rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GeometryError {
    pub edge: Edge,
    /// Length ratio, 0 when either length is 0
    pub ratio: f32,
}

/// Progress of a calibration run
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationStatus {
    /// Waiting for the tap on corner `step` (0-3)
    Collecting { step: u8 },
    /// Coefficients derived and installed
    Complete(Calibration),
    /// No touch mapping for the panel orientation
    Unsupported,
}

/// Polled calibration procedure
#[derive(Debug)]
pub struct Calibrator {
    config: CalibratorConfig,
    samples: Vec<RawSample, 4>,
    orientation: Orientation,
    width: u16,
    height: u16,
    supported: bool,
}

impl Calibrator {
    pub fn new(config: CalibratorConfig) -> Self {
        Self {
            config,
            samples: Vec::new(),
            orientation: Orientation::default(),
            width: 0,
            height: 0,
            supported: false,
        }
    }

    pub fn config(&self) -> &CalibratorConfig {
        &self.config
    }

    /// Clear the panel and show the instructions and the first target
    pub fn start<IRQ, B, RST, BL>(
        &mut self,
        touch: &mut TouchController<IRQ>,
        panel: &mut Ili9486<B, RST, BL>,
    ) -> Result<CalibrationStatus, B::Error>
    where
        IRQ: InputPin,
        B: Bus,
        RST: OutputPin,
        BL: Backlight,
    {
        // A press from before the run must not count as the first corner
        touch.clear_pressed_flag();
        self.samples.clear();
        self.orientation = panel.orientation();
        self.width = panel.width();
        self.height = panel.height();
        self.supported = self.orientation.touch_axes().is_some();

        panel.clear(LCD_BACKGROUND)?;
        if !self.supported {
            #[cfg(feature = "defmt")]
            defmt::warn!("No touch mapping for {}", self.orientation);
            panel.draw_string(0, 60, UNSUPPORTED_TEXT, &FONT16, FONT_BACKGROUND, TEXT)?;
            return Ok(CalibrationStatus::Unsupported);
        }

        #[cfg(feature = "defmt")]
        defmt::info!("Touch calibration started in {}", self.orientation);
        panel.draw_string(0, 60, INTRO_TEXT, &FONT16, FONT_BACKGROUND, TEXT)?;
        self.draw_target(panel, 0, MARKER)?;
        Ok(self.collecting())
    }

    /// Advance on one scan of the touch controller
    ///
    /// A corner is recorded when the pen lifts after a press.
    pub fn poll<IRQ, B, RST, BL, D>(
        &mut self,
        touch: &mut TouchController<IRQ>,
        panel: &mut Ili9486<B, RST, BL>,
        delay: &mut D,
    ) -> Result<CalibrationStatus, B::Error>
    where
        IRQ: InputPin,
        B: Bus,
        RST: OutputPin,
        BL: Backlight,
        D: DelayNs,
    {
        if !self.supported {
            return Ok(CalibrationStatus::Unsupported);
        }

        touch.scan(panel, delay)?;
        if !touch.was_just_pressed() || touch.is_pressed() {
            return Ok(self.collecting());
        }
        touch.clear_pressed_flag();
        let Some(raw) = touch.raw() else {
            return Ok(self.collecting());
        };
        if self.samples.push(raw).is_err() {
            self.samples.clear();
            return Ok(self.collecting());
        }
        delay.delay_ms(self.config.tap_delay_ms);

        let step = self.samples.len();
        #[cfg(feature = "defmt")]
        defmt::debug!("Calibration corner {} at raw {}", step, raw);

        if step < 4 {
            self.draw_target(panel, step - 1, LCD_BACKGROUND)?;
            self.draw_target(panel, step, MARKER)?;
            delay.delay_ms(self.config.tap_delay_ms);
            return Ok(self.collecting());
        }

        let mut corners = [RawSample::default(); 4];
        corners.copy_from_slice(&self.samples);
        self.samples.clear();

        if let Err(error) = check_geometry(&corners, &self.config) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Calibration rejected: {}", error);
            self.show_info(panel, &corners, error.ratio)?;
            delay.delay_ms(self.config.message_ms);
            self.draw_target(panel, 3, LCD_BACKGROUND)?;
            self.draw_target(panel, 0, MARKER)?;
            return Ok(self.collecting());
        }

        let Some(calibration) = derive(
            self.orientation,
            &corners,
            self.width,
            self.height,
            self.config.margin,
        ) else {
            self.draw_target(panel, 3, LCD_BACKGROUND)?;
            self.draw_target(panel, 0, MARKER)?;
            panel.draw_string(40, 26, RETRY_TEXT, &FONT16, FONT_BACKGROUND, TEXT)?;
            return Ok(self.collecting());
        };

        #[cfg(feature = "defmt")]
        defmt::info!("Touch calibration complete: {}", calibration);
        panel.clear(LCD_BACKGROUND)?;
        panel.draw_string(35, 110, SUCCESS_TEXT, &FONT16, FONT_BACKGROUND, TEXT)?;
        delay.delay_ms(self.config.message_ms);
        panel.clear(LCD_BACKGROUND)?;

        touch.set_calibration(calibration);
        Ok(CalibrationStatus::Complete(calibration))
    }

    /// Target centers in tap order
    pub fn targets(&self) -> [(u16, u16); 4] {
        targets(self.width, self.height, self.config.margin)
    }

    fn collecting(&self) -> CalibrationStatus {
        CalibrationStatus::Collecting {
            step: self.samples.len() as u8,
        }
    }

    fn draw_target<B, RST, BL>(
        &self,
        panel: &mut Ili9486<B, RST, BL>,
        index: usize,
        color: Rgb565,
    ) -> Result<(), B::Error>
    where
        B: Bus,
        RST: OutputPin,
        BL: Backlight,
    {
        let Some(&(x, y)) = self.targets().get(index) else {
            return Ok(());
        };
        draw_cross(panel, x, y, color)
    }

    /// Box with the rejected corners and the failing ratio in percent
    fn show_info<B, RST, BL>(
        &self,
        panel: &mut Ili9486<B, RST, BL>,
        corners: &[RawSample; 4],
        ratio: f32,
    ) -> Result<(), B::Error>
    where
        B: Bus,
        RST: OutputPin,
        BL: Backlight,
    {
        const LABELS: [(&str, &str); 4] = [("x1", "y1"), ("x2", "y2"), ("x3", "y3"), ("x4", "y4")];
        let font = &FONT16;
        let value_x = 40 + 3 * font.width;

        panel.draw_rectangle(40, 160, 250, 270, LCD_BACKGROUND, Fill::Filled, DotSize::MIN)?;
        for (i, (corner, (x_label, y_label))) in corners.iter().zip(LABELS).enumerate() {
            let y = 160 + 20 * i as u16;
            panel.draw_string(40, y, x_label, font, FONT_BACKGROUND, TEXT)?;
            panel.draw_string(140, y, y_label, font, FONT_BACKGROUND, TEXT)?;
            panel.draw_number(value_x, y, i32::from(corner.x), font, FONT_BACKGROUND, TEXT)?;
            panel.draw_number(value_x + 100, y, i32::from(corner.y), font, FONT_BACKGROUND, TEXT)?;
        }
        panel.draw_string(40, 240, "fac is : ", font, FONT_BACKGROUND, TEXT)?;
        panel.draw_number(
            40 + 10 * font.width,
            240,
            (ratio * 100.0) as i32,
            font,
            FONT_BACKGROUND,
            TEXT,
        )
    }
}

/// Target centers inset by `margin`: TL, TR, BL, BR
pub fn targets(width: u16, height: u16, margin: u16) -> [(u16, u16); 4] {
    let right = width.saturating_sub(margin);
    let bottom = height.saturating_sub(margin);
    [
        (margin, margin),
        (right, margin),
        (margin, bottom),
        (right, bottom),
    ]
}

/// Cross marker: two arms, a center dot and a ring
///
/// Arms are cut at the panel edge so targets near the border keep them.
pub fn draw_cross<C: Canvas + ?Sized>(
    canvas: &mut C,
    x: u16,
    y: u16,
    color: Rgb565,
) -> Result<(), C::Error> {
    let max_x = canvas.width().saturating_sub(1);
    let max_y = canvas.height().saturating_sub(1);
    let (left, right) = (x.saturating_sub(CROSS_ARM), x.saturating_add(CROSS_ARM).min(max_x));
    let (top, bottom) = (y.saturating_sub(CROSS_ARM), y.saturating_add(CROSS_ARM).min(max_y));

    canvas.draw_line(left, y, right, y, color, LineStyle::Solid, DotSize::MIN)?;
    canvas.draw_line(x, top, x, bottom, color, LineStyle::Solid, DotSize::MIN)?;
    canvas.draw_point(x, y, color, CROSS_DOT, DotStyle::FillAround)?;
    canvas.draw_circle(x, y, CROSS_RADIUS, color, Fill::Stroked, DotSize::MIN)
}

fn distance(a: RawSample, b: RawSample) -> f32 {
    let dx = f32::from(a.x) - f32::from(b.x);
    let dy = f32::from(a.y) - f32::from(b.y);
    libm::sqrtf(dx * dx + dy * dy)
}

/// Check that TL, TR, BL, BR raw corners form a rectangle
///
/// Compares top/bottom edges, then left/right edges, then the diagonals.
pub fn check_geometry(
    corners: &[RawSample; 4],
    config: &CalibratorConfig,
) -> Result<(), GeometryError> {
    let [tl, tr, bl, br] = *corners;
    let pairs = [
        (Edge::Horizontal, distance(tl, tr), distance(bl, br)),
        (Edge::Vertical, distance(tl, bl), distance(tr, br)),
        (Edge::Diagonal, distance(tr, bl), distance(tl, br)),
    ];
    for (edge, a, b) in pairs {
        if a == 0.0 || b == 0.0 {
            return Err(GeometryError { edge, ratio: 0.0 });
        }
        let ratio = a / b;
        if ratio < config.ratio_min || ratio > config.ratio_max {
            return Err(GeometryError { edge, ratio });
        }
    }
    Ok(())
}

/// Coefficients that map the raw corners onto their targets
///
/// The horizontal factor comes from the top edge (TL, TR), the vertical
/// one from the left edge (TL, BL); offsets center each span. `None` for
/// orientations without a touch mapping or a zero raw span.
pub fn derive(
    orientation: Orientation,
    corners: &[RawSample; 4],
    width: u16,
    height: u16,
    margin: u16,
) -> Option<Calibration> {
    let axes = orientation.touch_axes()?;
    let (h0, v0) = screen_axes(corners[0], axes);
    let (h1, _) = screen_axes(corners[1], axes);
    let (_, v2) = screen_axes(corners[2], axes);

    let (dh, dv) = if axes.mirrored {
        (h0 - h1, v0 - v2)
    } else {
        (h1 - h0, v2 - v0)
    };
    if dh == 0.0 || dv == 0.0 {
        return None;
    }

    let (w, h, m) = (f32::from(width), f32::from(height), f32::from(margin));
    let x_fac = (w - 2.0 * m) / dh;
    let y_fac = (h - 2.0 * m) / dv;
    Some(Calibration {
        orientation,
        x_fac,
        y_fac,
        x_off: (w - x_fac * (h0 + h1)) / 2.0,
        y_off: (h - y_fac * (v0 + v2)) / 2.0,
    })
}
