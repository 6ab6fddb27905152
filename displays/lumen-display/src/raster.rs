//! 2D primitives: points, lines, rectangles, circles, 1-bpp bitmaps
//!
//! Everything is integer-only and built on [`Canvas::fill_area`]. Shapes
//! whose anchor lies off the panel are dropped; stamp and band extents
//! hanging off the edge are clipped.

use crate::canvas::{fill_clipped, Canvas, Window};
use crate::color::Rgb565;

/// Point stamp size, 1 to 8
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DotSize(u8);

impl DotSize {
    pub const MIN: DotSize = DotSize(1);
    pub const MAX: DotSize = DotSize(8);

    /// `None` outside 1..=8
    pub const fn new(size: u8) -> Option<Self> {
        if size >= 1 && size <= 8 {
            Some(DotSize(size))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for DotSize {
    fn default() -> Self {
        DotSize::MIN
    }
}

/// How a point stamp sits around its anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DotStyle {
    /// (2·size−1)² square centered on the point
    #[default]
    FillAround,
    /// size² square with the point as its top-left corner
    FillRightUp,
}

/// Line pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineStyle {
    #[default]
    Solid,
    /// Every third stamp is painted in `gap` instead of the line color
    Dotted { gap: Rgb565 },
}

/// Shape interior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fill {
    #[default]
    Stroked,
    Filled,
}

/// Drawing primitives for any [`Canvas`]
pub trait Rasterizer: Canvas {
    /// Stamp a point
    fn draw_point(
        &mut self,
        x: u16,
        y: u16,
        color: Rgb565,
        size: DotSize,
        style: DotStyle,
    ) -> Result<(), Self::Error> {
        if !self.contains(x, y) {
            return Ok(());
        }
        let (x, y) = (i32::from(x), i32::from(y));
        match style {
            DotStyle::FillAround => stamp_around(self, x, y, size, color),
            DotStyle::FillRightUp => stamp(self, x, y, size, color),
        }
    }

    /// Line between two on-panel points
    ///
    /// Each step stamps a size×size square anchored at the step, so
    /// axis-aligned lines collapse to one band covering the same pixels.
    #[allow(clippy::too_many_arguments)]
    fn draw_line(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
        color: Rgb565,
        style: LineStyle,
        size: DotSize,
    ) -> Result<(), Self::Error> {
        if !self.contains(x0, y0) || !self.contains(x1, y1) {
            return Ok(());
        }
        let (mut x0, mut y0, mut x1, mut y1) =
            (i32::from(x0), i32::from(y0), i32::from(x1), i32::from(y1));
        if x0 > x1 {
            core::mem::swap(&mut x0, &mut x1);
            core::mem::swap(&mut y0, &mut y1);
        }

        if y0 == y1 {
            return band(self, x0, x1, y0, true, color, style, size);
        }
        if x0 == x1 {
            return band(self, y0.min(y1), y0.max(y1), x0, false, color, style, size);
        }
        bresenham(self, x0, y0, x1, y1, color, style, size)
    }

    /// Rectangle between two on-panel corners
    ///
    /// Stroked edges end in a full stamp, so the outline reaches
    /// `x1 + size - 1` / `y1 + size - 1` and the corners close.
    #[allow(clippy::too_many_arguments)]
    fn draw_rectangle(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
        color: Rgb565,
        fill: Fill,
        size: DotSize,
    ) -> Result<(), Self::Error> {
        if !self.contains(x0, y0) || !self.contains(x1, y1) {
            return Ok(());
        }
        let window = Window::new(x0, y0, x1, y1);
        match fill {
            Fill::Filled => self.fill_area(window, color),
            Fill::Stroked => {
                let (x_start, y_start) = (window.x_start(), window.y_start());
                let (x_end, y_end) = (window.x_end(), window.y_end());
                let solid = LineStyle::Solid;
                self.draw_line(x_start, y_start, x_end, y_start, color, solid, size)?;
                self.draw_line(x_start, y_start, x_start, y_end, color, solid, size)?;
                self.draw_line(x_end, y_start, x_end, y_end, color, solid, size)?;
                self.draw_line(x_start, y_end, x_end, y_end, color, solid, size)
            }
        }
    }

    /// Circle around an on-panel center
    ///
    /// Midpoint stepping from (0, r) with error `3 - 2r`. Stroked circles
    /// stamp the 8 symmetric points with centered stamps; filled circles
    /// fill the 8 symmetric spans of every step.
    fn draw_circle(
        &mut self,
        xc: u16,
        yc: u16,
        radius: u16,
        color: Rgb565,
        fill: Fill,
        size: DotSize,
    ) -> Result<(), Self::Error> {
        if !self.contains(xc, yc) {
            return Ok(());
        }
        let (xc, yc) = (i32::from(xc), i32::from(yc));
        let mut x = 0i32;
        let mut y = i32::from(radius);
        let mut esp = 3 - 2 * y;

        while x <= y {
            match fill {
                Fill::Filled => {
                    fill_clipped(self, xc + x, yc + x, xc + x, yc + y, color)?;
                    fill_clipped(self, xc - x, yc + x, xc - x, yc + y, color)?;
                    fill_clipped(self, xc + x, yc - y, xc + x, yc - x, color)?;
                    fill_clipped(self, xc - x, yc - y, xc - x, yc - x, color)?;
                    fill_clipped(self, xc + x, yc + x, xc + y, yc + x, color)?;
                    fill_clipped(self, xc - y, yc + x, xc - x, yc + x, color)?;
                    fill_clipped(self, xc + x, yc - x, xc + y, yc - x, color)?;
                    fill_clipped(self, xc - y, yc - x, xc - x, yc - x, color)?;
                }
                Fill::Stroked => {
                    for (dx, dy) in [
                        (x, y),
                        (y, x),
                        (y, -x),
                        (x, -y),
                        (-x, -y),
                        (-y, -x),
                        (-y, x),
                        (-x, y),
                    ] {
                        stamp_around(self, xc + dx, yc + dy, size, color)?;
                    }
                }
            }

            if esp < 0 {
                esp += 4 * x + 6;
            } else {
                esp += 10 + 4 * (x - y);
                y -= 1;
            }
            x += 1;
        }
        Ok(())
    }

    /// 1-bpp bitmap, rows packed MSB-first and padded to whole bytes
    ///
    /// Set bits are painted in `color`, clear bits are left alone.
    fn draw_bitmap(
        &mut self,
        x: u16,
        y: u16,
        bits: &[u8],
        width: u16,
        height: u16,
        color: Rgb565,
    ) -> Result<(), Self::Error> {
        if !self.contains(x, y) {
            return Ok(());
        }
        let stride = usize::from(width).div_ceil(8);
        for row in 0..height {
            for col in 0..width {
                let index = usize::from(row) * stride + usize::from(col / 8);
                let Some(&byte) = bits.get(index) else {
                    return Ok(());
                };
                if byte & (0x80 >> (col % 8)) != 0 {
                    let (px, py) = (u32::from(x) + u32::from(col), u32::from(y) + u32::from(row));
                    if px < u32::from(self.width()) && py < u32::from(self.height()) {
                        self.set_pixel(px as u16, py as u16, color)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// 4-bit grayscale image
    ///
    /// A 6-byte header (scan byte, depth, width and height as little-endian
    /// `u16`) precedes the pixels, two per byte with the high nibble first
    /// and every row padded to a whole byte. Level 0 is white, 15 black.
    /// Rows are clipped at the panel edge. Depths other than 4 and
    /// truncated data draw nothing.
    fn draw_gray_map(&mut self, x: u16, y: u16, data: &[u8]) -> Result<(), Self::Error> {
        if !self.contains(x, y) {
            return Ok(());
        }
        let Some((width, height, pixels)) = gray_map(data) else {
            return Ok(());
        };
        let visible = width.min(self.width() - x);
        if visible == 0 {
            return Ok(());
        }
        let stride = usize::from(width).div_ceil(2);
        for (row, line) in (0..height.min(self.height() - y)).zip(pixels.chunks_exact(stride)) {
            let window = Window::new(x, y + row, x + visible - 1, y + row);
            let levels = (0..usize::from(visible)).map(|col| {
                let byte = line[col / 2];
                gray(if col % 2 == 0 { byte >> 4 } else { byte & 0x0F })
            });
            self.draw_pixels(window, levels)?;
        }
        Ok(())
    }
}

impl<T: Canvas + ?Sized> Rasterizer for T {}

/// Split a gray map into width, height and pixel bytes
fn gray_map(data: &[u8]) -> Option<(u16, u16, &[u8])> {
    let (header, pixels) = data.split_at_checked(6)?;
    if header[1] != 4 {
        return None;
    }
    let width = u16::from_le_bytes([header[2], header[3]]);
    let height = u16::from_le_bytes([header[4], header[5]]);
    let len = usize::from(width).div_ceil(2) * usize::from(height);
    Some((width, height, pixels.get(..len)?))
}

/// 4-bit level to RGB565, 0 white
fn gray(level: u8) -> Rgb565 {
    let c = (15 - level) * 17;
    Rgb565::from_rgb888(c, c, c)
}

/// size×size square with (x, y) as top-left corner
fn stamp<C: Canvas + ?Sized>(
    canvas: &mut C,
    x: i32,
    y: i32,
    size: DotSize,
    color: Rgb565,
) -> Result<(), C::Error> {
    let s = i32::from(size.get());
    fill_clipped(canvas, x, y, x + s - 1, y + s - 1, color)
}

/// (2·size−1)² square centered on (x, y); skipped if the center is off-panel
fn stamp_around<C: Canvas + ?Sized>(
    canvas: &mut C,
    x: i32,
    y: i32,
    size: DotSize,
    color: Rgb565,
) -> Result<(), C::Error> {
    if x < 0 || y < 0 || x >= i32::from(canvas.width()) || y >= i32::from(canvas.height()) {
        return Ok(());
    }
    let r = i32::from(size.get()) - 1;
    fill_clipped(canvas, x - r, y - r, x + r, y + r, color)
}

/// Axis-aligned line from `start` to `end` along one axis at `across`
///
/// Solid lines are a single fill. Dotted lines are size-long dashes
/// separated by size-long gaps that are left untouched.
#[allow(clippy::too_many_arguments)]
fn band<C: Canvas + ?Sized>(
    canvas: &mut C,
    start: i32,
    end: i32,
    across: i32,
    horizontal: bool,
    color: Rgb565,
    style: LineStyle,
    size: DotSize,
) -> Result<(), C::Error> {
    let s = i32::from(size.get());
    let last = end + s - 1;
    let fill = |canvas: &mut C, a: i32, b: i32, color: Rgb565| {
        if horizontal {
            fill_clipped(canvas, a, across, b, across + s - 1, color)
        } else {
            fill_clipped(canvas, across, a, across + s - 1, b, color)
        }
    };

    match style {
        LineStyle::Solid => fill(canvas, start, last, color),
        LineStyle::Dotted { .. } => {
            let mut pos = start;
            while pos <= last {
                fill(canvas, pos, (pos + s - 1).min(last), color)?;
                pos += 2 * s;
            }
            Ok(())
        }
    }
}

/// General-case line, `x0 <= x1`
#[allow(clippy::too_many_arguments)]
fn bresenham<C: Canvas + ?Sized>(
    canvas: &mut C,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    color: Rgb565,
    style: LineStyle,
    size: DotSize,
) -> Result<(), C::Error> {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);
    // Position in the three-stamp dot pattern
    let mut phase = 0u8;

    loop {
        match style {
            LineStyle::Solid => stamp(canvas, x, y, size, color)?,
            LineStyle::Dotted { gap } => {
                phase = (phase + 1) % 3;
                let paint = if phase == 0 { gap } else { color };
                stamp(canvas, x, y, size, paint)?;
            }
        }

        if 2 * err >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }
        if 2 * err <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
    Ok(())
}
