//! Fixed-width bitmap fonts
//!
//! A [`Font`] is a descriptor over a byte table: glyphs for ' ' to '~' in
//! order, each `height` rows of `bytes_per_row` bytes, MSB-first.

mod font16;
mod font8;

/// First character in every table
pub const FIRST_CHAR: char = ' ';
/// Last character in every table
pub const LAST_CHAR: char = '~';

/// Glyph table descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Font {
    pub width: u16,
    pub height: u16,
    pub table: &'static [u8],
}

impl Font {
    /// Bytes per glyph row, `ceil(width / 8)`
    pub const fn bytes_per_row(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    /// Bytes per glyph
    pub const fn glyph_len(&self) -> usize {
        self.bytes_per_row() * self.height as usize
    }

    /// Bitmap for `ch`; characters outside the table map to space
    pub fn glyph(&self, ch: char) -> &'static [u8] {
        let index = if (FIRST_CHAR..=LAST_CHAR).contains(&ch) {
            ch as usize - FIRST_CHAR as usize
        } else {
            0
        };
        let len = self.glyph_len();
        let table = self.table;
        table
            .get(index * len..(index + 1) * len)
            .or_else(|| table.get(..len))
            .unwrap_or(&[])
    }
}

/// 8x8 font
pub const FONT8: Font = Font {
    width: 8,
    height: 8,
    table: &font8::GLYPHS_8X8,
};

/// 8x16 font
pub const FONT16: Font = Font {
    width: 8,
    height: 16,
    table: &font16::GLYPHS_8X16,
};

/// Largest built-in font whose cell fits in `dx` x `dy`
pub fn font_for_size(dx: u16, dy: u16) -> Option<Font> {
    [FONT16, FONT8]
        .into_iter()
        .find(|font| font.width <= dx && font.height <= dy)
}
