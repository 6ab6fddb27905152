//! Lumen Display
//!
//! ILI9486 panel controller with an integer rasterizer and a fixed-width
//! bitmap font renderer.
//!
//! # Layers
//!
//! - [`ili9486::Ili9486`] - register protocol, init sequence, scan direction
//! - [`canvas::Canvas`] - windows, pixels and solid fills
//! - [`raster::Rasterizer`] - points, lines, rectangles, circles, bitmaps
//! - [`text::TextRenderer`] - glyphs, strings, numbers
//! - [`bmp::BmpRenderer`] - BMP files from slices or chunked uploads
//! - [`graphics`] - embedded-graphics `DrawTarget` for the panel
//!
//! Drawing is synchronous: every call finishes its wire transfer before
//! returning. Anything that starts at or beyond the panel edge is dropped
//! without a write.

#![no_std]
#![deny(unsafe_code)]

#[cfg(any(test, feature = "mock"))]
extern crate std;

pub mod bmp;
pub mod canvas;
pub mod color;
pub mod fonts;
pub mod graphics;
pub mod ili9486;
pub mod orientation;
pub mod raster;
#[cfg(any(test, feature = "mock"))]
pub mod sim;
pub mod text;

pub use bmp::{
    ArenaFull, BmpError, BmpHeader, BmpRenderer, ByteSource, ChunkFile, ChunkReader, DrawBmpError,
    SliceSource,
};
pub use canvas::{Canvas, Window};
pub use color::{Rgb565, FONT_BACKGROUND, LCD_BACKGROUND};
pub use fonts::{font_for_size, Font, FONT16, FONT8};
pub use ili9486::{Ili9486, PanelConfig};
pub use orientation::{Orientation, TouchAxes};
pub use raster::{DotSize, DotStyle, Fill, LineStyle, Rasterizer};
pub use text::TextRenderer;
