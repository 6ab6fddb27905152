//! Bitmap text
//!
//! Glyphs are blitted from a [`Font`] table. A background equal to
//! [`FONT_BACKGROUND`] is treated as transparent: only set bits are
//! written and whatever is underneath stays. Any other background is
//! painted, streaming the whole cell in one window when it fits.

use crate::canvas::{Canvas, Window};
use crate::color::{Rgb565, FONT_BACKGROUND};
use crate::fonts::Font;

/// Text drawing for any [`Canvas`]
pub trait TextRenderer: Canvas {
    /// Draw one glyph with its top-left corner at (x, y)
    fn draw_char(
        &mut self,
        x: u16,
        y: u16,
        ch: char,
        font: &Font,
        foreground: Rgb565,
        background: Rgb565,
    ) -> Result<(), Self::Error> {
        if !self.contains(x, y) || font.width == 0 || font.height == 0 {
            return Ok(());
        }
        let glyph = font.glyph(ch);
        let stride = font.bytes_per_row();
        let bit = |row: u16, col: u16| {
            glyph
                .get(usize::from(row) * stride + usize::from(col / 8))
                .is_some_and(|byte| byte & (0x80 >> (col % 8)) != 0)
        };

        let x_end = u32::from(x) + u32::from(font.width) - 1;
        let y_end = u32::from(y) + u32::from(font.height) - 1;
        let fits = x_end < u32::from(self.width())
            && y_end < u32::from(self.height());

        if background != FONT_BACKGROUND && fits {
            let window = Window::new(x, y, x_end as u16, y_end as u16);
            let cells = (0..font.height)
                .flat_map(|row| (0..font.width).map(move |col| (row, col)))
                .map(|(row, col)| if bit(row, col) { foreground } else { background });
            return self.draw_pixels(window, cells);
        }

        for row in 0..font.height {
            for col in 0..font.width {
                let set = bit(row, col);
                if !set && background == FONT_BACKGROUND {
                    continue;
                }
                let (px, py) = (u32::from(x) + u32::from(col), u32::from(y) + u32::from(row));
                if px < u32::from(self.width()) && py < u32::from(self.height()) {
                    let color = if set { foreground } else { background };
                    self.set_pixel(px as u16, py as u16, color)?;
                }
            }
        }
        Ok(())
    }

    /// Draw a string starting at (x, y)
    ///
    /// A glyph that would cross the right edge moves to the next row at
    /// column `x`; a row that would cross the bottom edge restarts at
    /// (x, y) and overwrites what is there.
    fn draw_string(
        &mut self,
        x: u16,
        y: u16,
        text: &str,
        font: &Font,
        foreground: Rgb565,
        background: Rgb565,
    ) -> Result<(), Self::Error> {
        draw_chars(self, x, y, text.chars(), font, foreground, background)
    }

    /// Draw a signed decimal number
    fn draw_number(
        &mut self,
        x: u16,
        y: u16,
        number: i32,
        font: &Font,
        foreground: Rgb565,
        background: Rgb565,
    ) -> Result<(), Self::Error> {
        // i32::MIN is 11 characters
        let mut digits = [b'0'; 11];
        let mut start = digits.len();
        let mut rest = number.unsigned_abs();
        loop {
            start -= 1;
            digits[start] = b'0' + (rest % 10) as u8;
            rest /= 10;
            if rest == 0 {
                break;
            }
        }
        if number < 0 {
            start -= 1;
            digits[start] = b'-';
        }
        let chars = digits[start..].iter().map(|&b| char::from(b));
        draw_chars(self, x, y, chars, font, foreground, background)
    }
}

impl<T: Canvas + ?Sized> TextRenderer for T {}

/// Lay out glyphs from (x, y), wrapping as [`TextRenderer::draw_string`]
fn draw_chars<C, I>(
    canvas: &mut C,
    x: u16,
    y: u16,
    text: I,
    font: &Font,
    foreground: Rgb565,
    background: Rgb565,
) -> Result<(), C::Error>
where
    C: Canvas + ?Sized,
    I: IntoIterator<Item = char>,
{
    if !canvas.contains(x, y) || font.width == 0 || font.height == 0 {
        return Ok(());
    }
    let (w, h) = (u32::from(font.width), u32::from(font.height));
    let (width, height) = (u32::from(canvas.width()), u32::from(canvas.height()));
    let (mut cx, mut cy) = (u32::from(x), u32::from(y));

    for ch in text {
        if cx + w > width {
            cx = u32::from(x);
            cy += h;
        }
        if cy + h > height {
            cx = u32::from(x);
            cy = u32::from(y);
        }
        // Both cursors stay inside the u16 panel here
        canvas.draw_char(cx as u16, cy as u16, ch, font, foreground, background)?;
        cx += w;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::{FONT16, FONT8};
    use crate::sim::{test_panel, MemoryCanvas, PanelSim};
    use lumen_hal::mock::Bench;

    const FG: Rgb565 = Rgb565::RED;
    const BG: Rgb565 = Rgb565::BLACK;

    /// 10x2 glyphs, two bytes per row; only '!' has bits set
    const NARROW_TABLE: [u8; 95 * 4] = {
        let mut table = [0u8; 95 * 4];
        // '!' row 0: columns 0 and 9, row 1: column 8
        table[4] = 0b1000_0000;
        table[5] = 0b0100_0000;
        table[7] = 0b1000_0000;
        table
    };

    const NARROW: Font = Font {
        width: 10,
        height: 2,
        table: &NARROW_TABLE,
    };

    #[test]
    fn test_row_padding_for_odd_width() {
        let mut canvas = MemoryCanvas::new(32, 32);
        canvas.draw_char(3, 4, '!', &NARROW, FG, FONT_BACKGROUND).unwrap();
        assert_eq!(canvas.footprint(FG), [(3, 4), (12, 4), (11, 5)]);
    }

    #[test]
    fn test_transparent_background_keeps_underlay() {
        let mut canvas = MemoryCanvas::new(32, 32);
        canvas.clear(Rgb565::BLUE).unwrap();
        canvas.draw_char(0, 0, 'A', &FONT8, FG, FONT_BACKGROUND).unwrap();

        let set: usize = FONT8.glyph('A').iter().map(|b| b.count_ones() as usize).sum();
        assert_eq!(canvas.count(FG), set);
        assert_eq!(canvas.count(Rgb565::BLUE), 32 * 32 - set);
        assert_eq!(canvas.count(FONT_BACKGROUND), 0);
    }

    #[test]
    fn test_opaque_glyph_streams_one_window() {
        let bench = Bench::new();
        let mut panel = test_panel(&bench);
        bench.take_events();

        panel.draw_char(100, 50, 'A', &FONT16, FG, BG).unwrap();

        let sim = PanelSim::replay(&bench.events());
        assert_eq!(sim.pixel_writes(), 8 * 16);
        assert_eq!(sim.count(FG) + sim.count(BG), 8 * 16);
        let memory_writes = sim
            .registers()
            .iter()
            .filter(|(reg, _)| *reg == crate::ili9486::cmd::MEMORY_WRITE)
            .count();
        assert_eq!(memory_writes, 1);

        for row in 0..16u16 {
            let byte = FONT16.glyph('A')[usize::from(row)];
            for col in 0..8u16 {
                let expected = if byte & (0x80 >> col) != 0 { FG } else { BG };
                assert_eq!(sim.pixel(100 + col, 50 + row), Some(expected));
            }
        }
    }

    #[test]
    fn test_opaque_glyph_clipped_at_edge() {
        let mut canvas = MemoryCanvas::new(20, 20);
        canvas.draw_char(16, 16, 'A', &FONT8, FG, BG).unwrap();
        assert_eq!(canvas.count(FG) + canvas.count(BG), 16);
    }

    #[test]
    fn test_string_advances_by_width() {
        let mut a = MemoryCanvas::new(64, 16);
        a.draw_string(0, 0, "AB", &FONT8, FG, BG).unwrap();
        let mut b = MemoryCanvas::new(64, 16);
        b.draw_char(0, 0, 'A', &FONT8, FG, BG).unwrap();
        b.draw_char(8, 0, 'B', &FONT8, FG, BG).unwrap();
        assert_eq!(a.footprint(FG), b.footprint(FG));
    }

    #[test]
    fn test_string_wraps_to_start_column() {
        let mut canvas = MemoryCanvas::new(40, 40);
        // Room for three glyphs from x = 10
        canvas.draw_string(10, 4, "ABCD", &FONT8, FG, BG).unwrap();

        let mut expected = MemoryCanvas::new(40, 40);
        expected.draw_char(10, 4, 'A', &FONT8, FG, BG).unwrap();
        expected.draw_char(18, 4, 'B', &FONT8, FG, BG).unwrap();
        expected.draw_char(26, 4, 'C', &FONT8, FG, BG).unwrap();
        expected.draw_char(10, 12, 'D', &FONT8, FG, BG).unwrap();
        assert_eq!(canvas.footprint(FG), expected.footprint(FG));
    }

    #[test]
    fn test_string_restarts_at_origin_past_bottom() {
        let mut canvas = MemoryCanvas::new(16, 16);
        // Two glyphs per row, two rows, fifth glyph lands back on (0, 0)
        canvas.draw_string(0, 0, "AAAAB", &FONT8, FG, BG).unwrap();

        let mut expected = MemoryCanvas::new(16, 16);
        for (x, y) in [(8, 0), (0, 8), (8, 8)] {
            expected.draw_char(x, y, 'A', &FONT8, FG, BG).unwrap();
        }
        expected.draw_char(0, 0, 'B', &FONT8, FG, BG).unwrap();
        assert_eq!(canvas.footprint(FG), expected.footprint(FG));
    }

    #[test]
    fn test_draw_number() {
        for (number, text) in [
            (0, "0"),
            (42, "42"),
            (-305, "-305"),
            (i32::MAX, "2147483647"),
            (i32::MIN, "-2147483648"),
        ] {
            let mut a = MemoryCanvas::new(120, 16);
            a.draw_number(0, 0, number, &FONT8, FG, BG).unwrap();
            let mut b = MemoryCanvas::new(120, 16);
            b.draw_string(0, 0, text, &FONT8, FG, BG).unwrap();
            assert_eq!(a.footprint(FG), b.footprint(FG), "{}", number);
            assert!(a.count(FG) > 0);
        }
    }

    #[test]
    fn test_zero_sized_font_draws_nothing() {
        let empty = Font {
            width: 0,
            height: 8,
            table: &[],
        };
        let flat = Font {
            width: 8,
            height: 0,
            table: &[],
        };
        let mut canvas = MemoryCanvas::new(16, 16);
        for font in [&empty, &flat] {
            canvas.draw_char(0, 0, 'A', font, FG, BG).unwrap();
            canvas.draw_string(0, 0, "AB", font, FG, BG).unwrap();
            canvas.draw_number(0, 0, -7, font, FG, BG).unwrap();
        }
        assert_eq!(canvas.total_writes(), 0);
    }

    #[test]
    fn test_off_panel_origin_draws_nothing() {
        let mut canvas = MemoryCanvas::new(16, 16);
        canvas.draw_string(16, 0, "A", &FONT8, FG, BG).unwrap();
        canvas.draw_char(0, 16, 'A', &FONT8, FG, BG).unwrap();
        assert_eq!(canvas.total_writes(), 0);
    }
}
