//! Host-side panel models for tests
//!
//! [`PanelSim`] decodes a [`lumen_hal::mock::Bench`] event log the way the
//! ILI9486 would: it tracks chip select and DC, collects register writes,
//! follows the column/page window and plots streamed pixels.
//! [`MemoryCanvas`] is a plain in-memory [`Canvas`] for algorithm tests.

use core::convert::Infallible;
use std::collections::HashMap;
use std::vec;
use std::vec::Vec;

use lumen_hal::mock::{Bench, Event, Line, MockBacklight, MockPin, MockSpi};
use lumen_hal::Transport;

use crate::canvas::{Canvas, Window};
use crate::color::Rgb565;
use crate::ili9486::{cmd, Ili9486, PanelConfig};

/// Panel driver wired to a [`Bench`]
pub type TestPanel = Ili9486<Transport<MockSpi, MockPin, MockPin, MockPin>, MockPin, MockBacklight>;

/// Build a panel on `bench` with the default configuration
pub fn test_panel(bench: &Bench) -> TestPanel {
    Ili9486::new(
        bench.transport(),
        bench.pin(Line::Reset),
        bench.backlight(),
        PanelConfig::default(),
    )
}

/// Framebuffer and register trace reconstructed from wire events
#[derive(Debug, Default)]
pub struct PanelSim {
    pixels: HashMap<(u16, u16), Rgb565>,
    pixel_writes: usize,
    registers: Vec<(u8, Vec<u8>)>,
}

impl PanelSim {
    pub fn replay(events: &[Event]) -> Self {
        let mut sim = PanelSim::default();
        let mut dc_high = false;
        let mut selected = false;
        let mut window = Window::pixel(0, 0);
        let mut cursor: Option<(u16, u16)> = None;
        let mut high_byte: Option<u8> = None;

        for event in events {
            match event {
                Event::Level { line: Line::Dc, high } => dc_high = *high,
                Event::Level { line: Line::PanelCs, high } => {
                    selected = !*high;
                    high_byte = None;
                }
                Event::Write(bytes) if selected && !dc_high => {
                    for &command in bytes {
                        sim.registers.push((command, Vec::new()));
                        cursor = (command == cmd::MEMORY_WRITE)
                            .then_some((window.x_start(), window.y_start()));
                        high_byte = None;
                    }
                }
                Event::Write(bytes) if selected => {
                    for &byte in bytes {
                        let Some(hi) = high_byte.take() else {
                            high_byte = Some(byte);
                            continue;
                        };
                        let word = u16::from_be_bytes([hi, byte]);
                        if let Some((x, y)) = cursor {
                            sim.pixels.insert((x, y), Rgb565(word));
                            sim.pixel_writes += 1;
                            cursor = advance(window, x, y);
                        } else if let Some((register, data)) = sim.registers.last_mut() {
                            data.push(byte);
                            if data.len() == 4 {
                                let start = u16::from_be_bytes([data[0], data[1]]);
                                let end = u16::from_be_bytes([data[2], data[3]]);
                                window = match *register {
                                    cmd::COLUMN_ADDRESS_SET => {
                                        Window::new(start, window.y_start(), end, window.y_end())
                                    }
                                    cmd::PAGE_ADDRESS_SET => {
                                        Window::new(window.x_start(), start, window.x_end(), end)
                                    }
                                    _ => window,
                                };
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        sim
    }

    /// Register writes in order, pixel data excluded
    pub fn registers(&self) -> &[(u8, Vec<u8>)] {
        &self.registers
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<Rgb565> {
        self.pixels.get(&(x, y)).copied()
    }

    /// Total pixel words streamed, overdraw included
    pub fn pixel_writes(&self) -> usize {
        self.pixel_writes
    }

    /// Pixels currently holding `color`
    pub fn count(&self, color: Rgb565) -> usize {
        self.pixels.values().filter(|&&c| c == color).count()
    }

    /// Coordinates currently holding `color`, sorted
    pub fn footprint(&self, color: Rgb565) -> Vec<(u16, u16)> {
        let mut points: Vec<(u16, u16)> = self
            .pixels
            .iter()
            .filter(|(_, &c)| c == color)
            .map(|(&p, _)| p)
            .collect();
        points.sort_unstable();
        points
    }
}

fn advance(window: Window, x: u16, y: u16) -> Option<(u16, u16)> {
    if x < window.x_end() {
        Some((x + 1, y))
    } else if y < window.y_end() {
        Some((window.x_start(), y + 1))
    } else {
        None
    }
}

/// In-memory canvas that also counts writes per pixel
pub struct MemoryCanvas {
    width: u16,
    height: u16,
    pixels: Vec<Option<Rgb565>>,
    writes: Vec<u32>,
}

impl MemoryCanvas {
    pub fn new(width: u16, height: u16) -> Self {
        let size = usize::from(width) * usize::from(height);
        Self {
            width,
            height,
            pixels: vec![None; size],
            writes: vec![0; size],
        }
    }

    fn index(&self, x: u16, y: u16) -> usize {
        usize::from(y) * usize::from(self.width) + usize::from(x)
    }

    pub fn pixel(&self, x: u16, y: u16) -> Option<Rgb565> {
        if x < self.width && y < self.height {
            self.pixels[self.index(x, y)]
        } else {
            None
        }
    }

    /// Pixels currently holding `color`
    pub fn count(&self, color: Rgb565) -> usize {
        self.pixels.iter().filter(|&&c| c == Some(color)).count()
    }

    /// Total pixel writes, overdraw included
    pub fn total_writes(&self) -> u64 {
        self.writes.iter().map(|&w| u64::from(w)).sum()
    }

    /// Coordinates holding `color`, row-major
    pub fn footprint(&self, color: Rgb565) -> Vec<(u16, u16)> {
        let mut points = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.pixel(x, y) == Some(color) {
                    points.push((x, y));
                }
            }
        }
        points
    }

    fn put(&mut self, x: u16, y: u16, color: Rgb565) {
        let i = self.index(x, y);
        self.pixels[i] = Some(color);
        self.writes[i] += 1;
    }
}

impl Canvas for MemoryCanvas {
    type Error = Infallible;

    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn set_pixel(&mut self, x: u16, y: u16, color: Rgb565) -> Result<(), Infallible> {
        if self.contains(x, y) {
            self.put(x, y, color);
        }
        Ok(())
    }

    fn fill_area(&mut self, window: Window, color: Rgb565) -> Result<(), Infallible> {
        if !window.fits(self.width, self.height) {
            return Ok(());
        }
        for y in window.y_start()..=window.y_end() {
            for x in window.x_start()..=window.x_end() {
                self.put(x, y, color);
            }
        }
        Ok(())
    }

    fn draw_pixels<I>(&mut self, window: Window, pixels: I) -> Result<(), Infallible>
    where
        I: IntoIterator<Item = Rgb565>,
    {
        if !window.fits(self.width, self.height) {
            return Ok(());
        }
        let mut cursor = Some((window.x_start(), window.y_start()));
        for color in pixels {
            let Some((x, y)) = cursor else { break };
            self.put(x, y, color);
            cursor = advance(window, x, y);
        }
        Ok(())
    }
}
