//! ILI9486 panel controller
//!
//! Driver for the Waveshare 3.5" 480x320 TFT. The panel sits behind a
//! 16-bit shift register, so register parameters go out as one word each
//! (`0x00, value`) while commands are single bytes. Pixels are streamed as
//! big-endian RGB565 words into an addressed window.

use embedded_hal::delay::DelayNs;
use lumen_hal::{ActiveLow, Backlight, Bus, Device, GpioLine, OutputPin};

use crate::canvas::{Canvas, Window};
use crate::color::Rgb565;
use crate::orientation::Orientation;

/// Native panel size, landscape
pub const NATIVE_WIDTH: u16 = 480;
pub const NATIVE_HEIGHT: u16 = 320;

/// ILI9486 commands
pub mod cmd {
    pub const SLEEP_OUT: u8 = 0x11;
    pub const DISPLAY_ON: u8 = 0x29;
    pub const COLUMN_ADDRESS_SET: u8 = 0x2A;
    pub const PAGE_ADDRESS_SET: u8 = 0x2B;
    pub const MEMORY_WRITE: u8 = 0x2C;
    pub const MEMORY_ACCESS_CONTROL: u8 = 0x36;
    pub const PIXEL_FORMAT: u8 = 0x3A;
    pub const FRAME_RATE: u8 = 0xB1;
    pub const INVERSION_CONTROL: u8 = 0xB4;
    pub const DISPLAY_FUNCTION: u8 = 0xB6;
    pub const ENTRY_MODE: u8 = 0xB7;
    pub const POWER_CONTROL_1: u8 = 0xC0;
    pub const POWER_CONTROL_2: u8 = 0xC1;
    pub const POWER_CONTROL_3: u8 = 0xC2;
    pub const VCOM_CONTROL: u8 = 0xC5;
    pub const POSITIVE_GAMMA: u8 = 0xE0;
    pub const NEGATIVE_GAMMA: u8 = 0xE1;
    pub const INTERFACE_CONTROL_F1: u8 = 0xF1;
    pub const INTERFACE_CONTROL_F2: u8 = 0xF2;
    pub const INTERFACE_CONTROL_F4: u8 = 0xF4;
    pub const INTERFACE_CONTROL_F8: u8 = 0xF8;
    pub const INTERFACE_CONTROL_F9: u8 = 0xF9;
}

/// Manufacturer power-on register table, applied in order
pub const INIT_SEQUENCE: &[(u8, &[u8])] = &[
    (cmd::INTERFACE_CONTROL_F9, &[0x00, 0x08]),
    (cmd::POWER_CONTROL_1, &[0x19, 0x1A]),
    (cmd::POWER_CONTROL_2, &[0x45, 0x00]),
    (cmd::POWER_CONTROL_3, &[0x33]),
    (cmd::VCOM_CONTROL, &[0x00, 0x28]),
    (cmd::FRAME_RATE, &[0xA0, 0x11]),
    (cmd::INVERSION_CONTROL, &[0x02]),
    (cmd::DISPLAY_FUNCTION, &[0x00, 0x42, 0x3B]),
    (cmd::ENTRY_MODE, &[0x07]),
    (
        cmd::POSITIVE_GAMMA,
        &[
            0x1F, 0x25, 0x22, 0x0B, 0x06, 0x0A, 0x4E, 0xC6, 0x39, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00,
        ],
    ),
    (
        cmd::NEGATIVE_GAMMA,
        &[
            0x1F, 0x3F, 0x3F, 0x0F, 0x1F, 0x0F, 0x46, 0x49, 0x31, 0x05, 0x09, 0x03, 0x1C, 0x1A,
            0x00,
        ],
    ),
    (
        cmd::INTERFACE_CONTROL_F1,
        &[0x36, 0x04, 0x00, 0x3C, 0x0F, 0x0F, 0xA4, 0x02],
    ),
    (
        cmd::INTERFACE_CONTROL_F2,
        &[0x18, 0xA3, 0x12, 0x02, 0x32, 0x12, 0xFF, 0x32, 0x00],
    ),
    (cmd::INTERFACE_CONTROL_F4, &[0x40, 0x00, 0x08, 0x91, 0x04]),
    (cmd::INTERFACE_CONTROL_F8, &[0x21, 0x04]),
    (cmd::PIXEL_FORMAT, &[0x55]),
];

/// Pixels per SPI write when streaming
const STREAM_CHUNK: usize = 32;

/// Panel timing and geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelConfig {
    /// Width of the native pixel grid
    pub native_width: u16,
    /// Height of the native pixel grid
    pub native_height: u16,
    /// Hold time of each reset phase in ms
    pub reset_hold_ms: u32,
    /// Wait after programming the scan direction, before sleep-out
    pub scan_settle_ms: u32,
    /// Wait between sleep-out and display-on
    pub sleep_out_ms: u32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            native_width: NATIVE_WIDTH,
            native_height: NATIVE_HEIGHT,
            reset_hold_ms: 500,
            scan_settle_ms: 200,
            sleep_out_ms: 120,
        }
    }
}

/// ILI9486 driver
pub struct Ili9486<B, RST, BL> {
    bus: B,
    reset: ActiveLow<RST>,
    backlight: BL,
    config: PanelConfig,
    orientation: Orientation,
    width: u16,
    height: u16,
}

impl<B, RST, BL> Ili9486<B, RST, BL>
where
    B: Bus,
    RST: OutputPin,
    BL: Backlight,
{
    /// Create a driver; nothing is sent until [`begin`](Self::begin)
    pub fn new(bus: B, reset: RST, backlight: BL, config: PanelConfig) -> Self {
        let orientation = Orientation::default();
        let (width, height) = orientation.dimensions(config.native_width, config.native_height);
        Self {
            bus,
            reset: ActiveLow::new(reset),
            backlight,
            config,
            orientation,
            width,
            height,
        }
    }

    /// Power-on sequence
    ///
    /// Reset pulse, backlight, manufacturer table, scan direction, then
    /// sleep-out and display-on with their mandated waits. A backlight
    /// level of 0 leaves the backlight as it is. Pixel memory is not
    /// cleared.
    pub fn begin<D: DelayNs>(
        &mut self,
        orientation: Orientation,
        backlight: u8,
        delay: &mut D,
    ) -> Result<(), B::Error> {
        let hold = self.config.reset_hold_ms;
        self.reset.deassert();
        delay.delay_ms(hold);
        self.reset.assert();
        delay.delay_ms(hold);
        self.reset.deassert();
        delay.delay_ms(hold);

        if backlight > 0 {
            self.backlight.set_level(backlight);
        }

        self.bus.transaction(Device::Panel, |bus| {
            for &(register, data) in INIT_SEQUENCE {
                write_register(bus, register, data)?;
            }
            Ok(())
        })?;

        self.write_scan_direction(orientation)?;
        delay.delay_ms(self.config.scan_settle_ms);

        self.bus
            .transaction(Device::Panel, |bus| bus.command(cmd::SLEEP_OUT))?;
        delay.delay_ms(self.config.sleep_out_ms);
        self.bus
            .transaction(Device::Panel, |bus| bus.command(cmd::DISPLAY_ON))?;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "ILI9486 ready: {}x{} {}",
            self.width,
            self.height,
            self.orientation
        );

        Ok(())
    }

    /// Change orientation and repaint the whole panel
    ///
    /// Old pixel memory is addressed inconsistently under the new
    /// direction, so the panel is cleared to `background`.
    pub fn set_scan_direction(
        &mut self,
        orientation: Orientation,
        background: Rgb565,
    ) -> Result<(), B::Error> {
        self.write_scan_direction(orientation)?;
        self.clear(background)
    }

    fn write_scan_direction(&mut self, orientation: Orientation) -> Result<(), B::Error> {
        let (width, height) =
            orientation.dimensions(self.config.native_width, self.config.native_height);
        self.orientation = orientation;
        self.width = width;
        self.height = height;

        self.bus.transaction(Device::Panel, |bus| {
            write_register(
                bus,
                cmd::DISPLAY_FUNCTION,
                &[0x00, orientation.display_function()],
            )?;
            write_register(bus, cmd::MEMORY_ACCESS_CONTROL, &[orientation.memory_access()])
        })?;

        #[cfg(feature = "defmt")]
        defmt::debug!("Scan direction {} ({}x{})", orientation, width, height);

        Ok(())
    }

    /// Backlight duty, 0-255
    pub fn set_backlight(&mut self, level: u8) {
        self.backlight.set_level(level);
    }

    /// Address a window and start a memory write
    ///
    /// Windows reaching past the panel are dropped.
    pub fn set_window(&mut self, window: Window) -> Result<(), B::Error> {
        if !window.fits(self.width, self.height) {
            return Ok(());
        }
        self.bus
            .transaction(Device::Panel, |bus| address_window(bus, window))
    }

    /// Raw register write for settings not covered by the driver
    pub fn write_register(&mut self, register: u8, data: &[u8]) -> Result<(), B::Error> {
        self.bus
            .transaction(Device::Panel, |bus| write_register(bus, register, data))
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    /// The shared transport, for the touch controller
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Release the hardware
    pub fn release(self) -> (B, RST, BL) {
        (self.bus, self.reset.into_inner(), self.backlight)
    }
}

impl<B, RST, BL> Canvas for Ili9486<B, RST, BL>
where
    B: Bus,
    RST: OutputPin,
    BL: Backlight,
{
    type Error = B::Error;

    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn set_pixel(&mut self, x: u16, y: u16, color: Rgb565) -> Result<(), Self::Error> {
        if !self.contains(x, y) {
            return Ok(());
        }
        self.bus.transaction(Device::Panel, |bus| {
            address_window(bus, Window::pixel(x, y))?;
            bus.data(&color.to_be_bytes())
        })
    }

    fn fill_area(&mut self, window: Window, color: Rgb565) -> Result<(), Self::Error> {
        if !window.fits(self.width, self.height) {
            return Ok(());
        }
        self.bus.transaction(Device::Panel, |bus| {
            address_window(bus, window)?;
            stream_color(bus, color, window.pixel_count())
        })
    }

    fn draw_pixels<I>(&mut self, window: Window, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Rgb565>,
    {
        if !window.fits(self.width, self.height) {
            return Ok(());
        }
        self.bus.transaction(Device::Panel, |bus| {
            address_window(bus, window)?;
            stream_pixels(bus, pixels.into_iter().take(window.pixel_count() as usize))
        })
    }
}

/// Command byte followed by one word per parameter byte
fn write_register<B: Bus>(bus: &mut B, register: u8, data: &[u8]) -> Result<(), B::Error> {
    bus.command(register)?;
    for &value in data {
        bus.data(&[0x00, value])?;
    }
    Ok(())
}

fn address_window<B: Bus>(bus: &mut B, window: Window) -> Result<(), B::Error> {
    let [xs_hi, xs_lo] = window.x_start().to_be_bytes();
    let [xe_hi, xe_lo] = window.x_end().to_be_bytes();
    let [ys_hi, ys_lo] = window.y_start().to_be_bytes();
    let [ye_hi, ye_lo] = window.y_end().to_be_bytes();
    write_register(bus, cmd::COLUMN_ADDRESS_SET, &[xs_hi, xs_lo, xe_hi, xe_lo])?;
    write_register(bus, cmd::PAGE_ADDRESS_SET, &[ys_hi, ys_lo, ye_hi, ye_lo])?;
    bus.command(cmd::MEMORY_WRITE)
}

fn stream_color<B: Bus>(bus: &mut B, color: Rgb565, count: u64) -> Result<(), B::Error> {
    let mut chunk = [0u8; STREAM_CHUNK * 2];
    for pair in chunk.chunks_exact_mut(2) {
        pair.copy_from_slice(&color.to_be_bytes());
    }

    let mut remaining = count as usize;
    while remaining > 0 {
        let n = remaining.min(STREAM_CHUNK);
        bus.data(&chunk[..n * 2])?;
        remaining -= n;
    }
    Ok(())
}

fn stream_pixels<B, I>(bus: &mut B, pixels: I) -> Result<(), B::Error>
where
    B: Bus,
    I: Iterator<Item = Rgb565>,
{
    let mut chunk = [0u8; STREAM_CHUNK * 2];
    let mut filled = 0;
    for color in pixels {
        chunk[filled..filled + 2].copy_from_slice(&color.to_be_bytes());
        filled += 2;
        if filled == chunk.len() {
            bus.data(&chunk)?;
            filled = 0;
        }
    }
    if filled > 0 {
        bus.data(&chunk[..filled])?;
    }
    Ok(())
}
