//! Pixel sink trait
//!
//! [`Canvas`] is the small surface the rasterizer and the font renderer
//! need from a panel: its current size, single pixels, solid windows and
//! streamed windows. The ILI9486 driver implements it over SPI; tests
//! implement it over memory.

use crate::color::Rgb565;

/// Inclusive rectangle addressed before a pixel stream
///
/// Only built through [`Window::new`], so the start corner never lies
/// past the end corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Window {
    x_start: u16,
    y_start: u16,
    x_end: u16,
    y_end: u16,
}

impl Window {
    /// Window spanning two corners given in any order
    pub const fn new(x0: u16, y0: u16, x1: u16, y1: u16) -> Self {
        let (x_start, x_end) = if x0 <= x1 { (x0, x1) } else { (x1, x0) };
        let (y_start, y_end) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        Self {
            x_start,
            y_start,
            x_end,
            y_end,
        }
    }

    /// Single pixel window
    pub const fn pixel(x: u16, y: u16) -> Self {
        Self::new(x, y, x, y)
    }

    pub const fn x_start(&self) -> u16 {
        self.x_start
    }

    pub const fn y_start(&self) -> u16 {
        self.y_start
    }

    pub const fn x_end(&self) -> u16 {
        self.x_end
    }

    pub const fn y_end(&self) -> u16 {
        self.y_end
    }

    pub fn width(&self) -> u32 {
        u32::from(self.x_end - self.x_start) + 1
    }

    pub fn height(&self) -> u32 {
        u32::from(self.y_end - self.y_start) + 1
    }

    /// Number of words a full stream into this window carries
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    /// Whether the window lies inside `[0, width) x [0, height)`
    pub fn fits(&self, width: u16, height: u16) -> bool {
        self.x_end < width && self.y_end < height
    }
}

/// Something pixels can be written to
///
/// Coordinates at or beyond [`width`](Canvas::width) / [`height`](Canvas::height)
/// are dropped without any write.
pub trait Canvas {
    /// Error type of the underlying transport
    type Error;

    /// Width in the current orientation
    fn width(&self) -> u16;

    /// Height in the current orientation
    fn height(&self) -> u16;

    /// Write one pixel
    fn set_pixel(&mut self, x: u16, y: u16, color: Rgb565) -> Result<(), Self::Error>;

    /// Fill a window with one color
    fn fill_area(&mut self, window: Window, color: Rgb565) -> Result<(), Self::Error>;

    /// Stream colors into a window, left-to-right then top-to-bottom
    ///
    /// Extra colors are ignored, missing ones leave the rest of the
    /// window untouched.
    fn draw_pixels<I>(&mut self, window: Window, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Rgb565>;

    /// Whether (x, y) is on the panel
    fn contains(&self, x: u16, y: u16) -> bool {
        x < self.width() && y < self.height()
    }

    /// Fill the whole panel
    fn clear(&mut self, color: Rgb565) -> Result<(), Self::Error> {
        if self.width() == 0 || self.height() == 0 {
            return Ok(());
        }
        self.fill_area(Window::new(0, 0, self.width() - 1, self.height() - 1), color)
    }
}

/// Fill a rectangle given in signed coordinates, clipped to the canvas
///
/// Used for stamp and band extents that may hang off the panel edge.
pub(crate) fn fill_clipped<C: Canvas + ?Sized>(
    canvas: &mut C,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    color: Rgb565,
) -> Result<(), C::Error> {
    let max_x = i32::from(canvas.width()) - 1;
    let max_y = i32::from(canvas.height()) - 1;
    let (xs, xe) = (x0.min(x1).max(0), x0.max(x1).min(max_x));
    let (ys, ye) = (y0.min(y1).max(0), y0.max(y1).min(max_y));
    if xs > xe || ys > ye {
        return Ok(());
    }
    // Bounded by the u16 canvas size above
    canvas.fill_area(Window::new(xs as u16, ys as u16, xe as u16, ye as u16), color)
}
