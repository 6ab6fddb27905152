//! RGB565 colors

/// 16-bit packed color: 5 bits red, 6 bits green, 5 bits blue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb565(pub u16);

impl Rgb565 {
    pub const WHITE: Rgb565 = Rgb565(0xFFFF);
    pub const BLACK: Rgb565 = Rgb565(0x0000);
    pub const BLUE: Rgb565 = Rgb565(0x001F);
    pub const BRED: Rgb565 = Rgb565(0xF81F);
    pub const GRED: Rgb565 = Rgb565(0xFFE0);
    pub const GBLUE: Rgb565 = Rgb565(0x07FF);
    pub const RED: Rgb565 = Rgb565(0xF800);
    pub const MAGENTA: Rgb565 = Rgb565(0xF81F);
    pub const GREEN: Rgb565 = Rgb565(0x07E0);
    pub const CYAN: Rgb565 = Rgb565(0x7FFF);
    pub const YELLOW: Rgb565 = Rgb565(0xFFE0);
    pub const BROWN: Rgb565 = Rgb565(0xBC40);
    pub const BRRED: Rgb565 = Rgb565(0xFC07);
    pub const GRAY: Rgb565 = Rgb565(0x8430);

    /// Pack 8-bit channels, dropping the low bits
    pub const fn from_rgb888(r: u8, g: u8, b: u8) -> Self {
        Rgb565(((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3))
    }

    pub const fn into_u16(self) -> u16 {
        self.0
    }

    /// Wire order for the pixel stream
    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl From<u16> for Rgb565 {
    fn from(raw: u16) -> Self {
        Rgb565(raw)
    }
}

/// Color the panel is cleared to
pub const LCD_BACKGROUND: Rgb565 = Rgb565::WHITE;

/// Text background that means "leave underlying pixels alone"
pub const FONT_BACKGROUND: Rgb565 = Rgb565::WHITE;
