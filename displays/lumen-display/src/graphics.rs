//! embedded-graphics interop
//!
//! [`Ili9486`] is a [`DrawTarget`] for embedded-graphics' `Rgb565`, so
//! fonts and primitives from that ecosystem go through the same window
//! writes as the native rasterizer. Solid fills and contiguous blocks
//! that lie on the panel become one window each; everything else falls
//! back to single pixels clipped at the edge.

use embedded_graphics_core::draw_target::DrawTarget;
use embedded_graphics_core::geometry::{OriginDimensions, Point, Size};
use embedded_graphics_core::pixelcolor::{Rgb565 as EgRgb565, RgbColor};
use embedded_graphics_core::primitives::Rectangle;
use embedded_graphics_core::Pixel;
use lumen_hal::{Backlight, Bus, OutputPin};

use crate::canvas::{Canvas, Window};
use crate::color::Rgb565;
use crate::ili9486::Ili9486;

impl From<EgRgb565> for Rgb565 {
    fn from(color: EgRgb565) -> Self {
        Rgb565(u16::from(color.r()) << 11 | u16::from(color.g()) << 5 | u16::from(color.b()))
    }
}

impl From<Rgb565> for EgRgb565 {
    fn from(color: Rgb565) -> Self {
        let raw = color.into_u16();
        EgRgb565::new((raw >> 11) as u8, ((raw >> 5) & 0x3F) as u8, (raw & 0x1F) as u8)
    }
}

impl<B, RST, BL> OriginDimensions for Ili9486<B, RST, BL>
where
    B: Bus,
    RST: OutputPin,
    BL: Backlight,
{
    fn size(&self) -> Size {
        Size::new(u32::from(self.width()), u32::from(self.height()))
    }
}

impl<B, RST, BL> DrawTarget for Ili9486<B, RST, BL>
where
    B: Bus,
    RST: OutputPin,
    BL: Backlight,
{
    type Color = EgRgb565;
    type Error = B::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            let (Ok(x), Ok(y)) = (u16::try_from(point.x), u16::try_from(point.y)) else {
                continue;
            };
            self.set_pixel(x, y, color.into())?;
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        if let Some(window) = on_panel(area, self.width(), self.height()) {
            return self.draw_pixels(window, colors.into_iter().map(Rgb565::from));
        }

        // Partly off the panel: walk the area row by row
        let origin = area.top_left;
        let columns = span(area.size.width);
        let points = (0..span(area.size.height))
            .flat_map(move |dy| (0..columns).map(move |dx| origin + Point::new(dx, dy)));
        self.draw_iter(points.zip(colors).map(|(point, color)| Pixel(point, color)))
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let x0 = area.top_left.x.max(0);
        let y0 = area.top_left.y.max(0);
        let x1 = area
            .top_left
            .x
            .saturating_add(span(area.size.width))
            .min(i32::from(self.width()))
            - 1;
        let y1 = area
            .top_left
            .y
            .saturating_add(span(area.size.height))
            .min(i32::from(self.height()))
            - 1;
        if x0 > x1 || y0 > y1 {
            return Ok(());
        }
        // Clipped to the u16 panel above
        let window = Window::new(x0 as u16, y0 as u16, x1 as u16, y1 as u16);
        self.fill_area(window, color.into())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        Canvas::clear(self, color.into())
    }
}

fn span(extent: u32) -> i32 {
    i32::try_from(extent).unwrap_or(i32::MAX)
}

/// Window for `area` when all of it lies on a `width` x `height` panel
fn on_panel(area: &Rectangle, width: u16, height: u16) -> Option<Window> {
    let end = area.bottom_right()?;
    let window = Window::new(
        u16::try_from(area.top_left.x).ok()?,
        u16::try_from(area.top_left.y).ok()?,
        u16::try_from(end.x).ok()?,
        u16::try_from(end.y).ok()?,
    );
    window.fits(width, height).then_some(window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ili9486::cmd;
    use crate::sim::{test_panel, PanelSim};
    use lumen_hal::mock::Bench;

    fn memory_writes(sim: &PanelSim) -> usize {
        sim.registers()
            .iter()
            .filter(|(reg, _)| *reg == cmd::MEMORY_WRITE)
            .count()
    }

    #[test]
    fn test_color_conversion() {
        assert_eq!(Rgb565::from(EgRgb565::RED), Rgb565::RED);
        assert_eq!(Rgb565::from(EgRgb565::GREEN), Rgb565::GREEN);
        assert_eq!(Rgb565::from(EgRgb565::BLUE), Rgb565::BLUE);
        assert_eq!(EgRgb565::from(Rgb565::WHITE), EgRgb565::WHITE);
        assert_eq!(EgRgb565::from(Rgb565::BROWN), EgRgb565::new(0x17, 0x22, 0x00));
        assert_eq!(Rgb565::from(EgRgb565::from(Rgb565::GRAY)), Rgb565::GRAY);
    }

    #[test]
    fn test_size_follows_orientation() {
        let bench = Bench::new();
        let mut panel = test_panel(&bench);
        assert_eq!(panel.size(), Size::new(480, 320));
        panel
            .set_scan_direction(crate::Orientation::L2rU2d, Rgb565::BLACK)
            .unwrap();
        assert_eq!(panel.size(), Size::new(320, 480));
    }

    #[test]
    fn test_draw_iter_skips_off_panel_pixels() {
        let bench = Bench::new();
        let mut panel = test_panel(&bench);
        bench.take_events();

        let pixels = [
            Pixel(Point::new(-1, 0), EgRgb565::RED),
            Pixel(Point::new(480, 0), EgRgb565::RED),
            Pixel(Point::new(3, 4), EgRgb565::RED),
        ];
        panel.draw_iter(pixels).unwrap();

        let sim = PanelSim::replay(&bench.events());
        assert_eq!(sim.pixel_writes(), 1);
        assert_eq!(sim.pixel(3, 4), Some(Rgb565::RED));
    }

    #[test]
    fn test_fill_solid_is_one_window() {
        let bench = Bench::new();
        let mut panel = test_panel(&bench);
        bench.take_events();

        let area = Rectangle::new(Point::new(10, 20), Size::new(5, 3));
        panel.fill_solid(&area, EgRgb565::BLUE).unwrap();

        let sim = PanelSim::replay(&bench.events());
        assert_eq!(memory_writes(&sim), 1);
        assert_eq!(sim.count(Rgb565::BLUE), 15);
        assert_eq!(sim.pixel(14, 22), Some(Rgb565::BLUE));
        assert_eq!(sim.pixel(15, 22), None);
    }

    #[test]
    fn test_fill_solid_clipped_at_edges() {
        let bench = Bench::new();
        let mut panel = test_panel(&bench);
        bench.take_events();

        panel
            .fill_solid(&Rectangle::new(Point::new(-5, -5), Size::new(10, 10)), EgRgb565::RED)
            .unwrap();
        panel
            .fill_solid(&Rectangle::new(Point::new(478, 318), Size::new(10, 10)), EgRgb565::GREEN)
            .unwrap();
        panel
            .fill_solid(&Rectangle::new(Point::new(500, 0), Size::new(10, 10)), EgRgb565::BLUE)
            .unwrap();
        panel
            .fill_solid(&Rectangle::new(Point::new(0, 0), Size::zero()), EgRgb565::BLUE)
            .unwrap();

        let sim = PanelSim::replay(&bench.events());
        assert_eq!(sim.count(Rgb565::RED), 25);
        assert_eq!(sim.count(Rgb565::GREEN), 4);
        assert_eq!(sim.count(Rgb565::BLUE), 0);
    }

    #[test]
    fn test_fill_contiguous_streams_in_order() {
        let bench = Bench::new();
        let mut panel = test_panel(&bench);
        bench.take_events();

        let area = Rectangle::new(Point::new(100, 50), Size::new(2, 2));
        let colors = [EgRgb565::RED, EgRgb565::GREEN, EgRgb565::BLUE, EgRgb565::BLACK];
        panel.fill_contiguous(&area, colors).unwrap();

        let sim = PanelSim::replay(&bench.events());
        assert_eq!(memory_writes(&sim), 1);
        assert_eq!(sim.pixel(100, 50), Some(Rgb565::RED));
        assert_eq!(sim.pixel(101, 50), Some(Rgb565::GREEN));
        assert_eq!(sim.pixel(100, 51), Some(Rgb565::BLUE));
        assert_eq!(sim.pixel(101, 51), Some(Rgb565::BLACK));
    }

    #[test]
    fn test_fill_contiguous_partly_off_panel() {
        let bench = Bench::new();
        let mut panel = test_panel(&bench);
        bench.take_events();

        let area = Rectangle::new(Point::new(478, 0), Size::new(4, 1));
        let colors = [EgRgb565::RED, EgRgb565::GREEN, EgRgb565::BLUE, EgRgb565::BLUE];
        panel.fill_contiguous(&area, colors).unwrap();

        let sim = PanelSim::replay(&bench.events());
        assert_eq!(sim.pixel_writes(), 2);
        assert_eq!(sim.pixel(478, 0), Some(Rgb565::RED));
        assert_eq!(sim.pixel(479, 0), Some(Rgb565::GREEN));
    }

    #[test]
    fn test_clear_covers_panel() {
        let bench = Bench::new();
        let mut panel = test_panel(&bench);
        bench.take_events();

        DrawTarget::clear(&mut panel, EgRgb565::CYAN).unwrap();

        let sim = PanelSim::replay(&bench.events());
        assert_eq!(sim.count(Rgb565::from(EgRgb565::CYAN)), 480 * 320);
    }
}
