//! BMP images
//!
//! Uncompressed Windows bitmaps at 8 bits per pixel (palette or 256
//! grays), 16 (RGB555) or 24 (BGR). Images are read through a
//! [`ByteSource`]: a plain byte slice, or a [`ChunkFile`] that collects an
//! upload piece by piece. Each image row is streamed into one panel
//! window, repeated `zoom` times across and down.

use heapless::Vec;

use crate::canvas::{Canvas, Window};
use crate::color::Rgb565;

/// File header plus BITMAPINFOHEADER
pub const HEADER_LEN: usize = 54;

/// Offset of the info header
const INFO_OFFSET: usize = 14;

/// 'BM', little-endian
const SIGNATURE: u16 = 0x4D42;

/// Widest stored row that can be drawn: one native panel row at 24 bits
pub const MAX_ROW_BYTES: usize = 480 * 3;

/// Largest 8-bit palette
pub const MAX_PALETTE: usize = 256;

/// Image format problems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BmpError {
    /// First two bytes are not 'BM'
    Signature,
    /// Plane count other than 1
    Planes(u16),
    /// Bits per pixel other than 8, 16 or 24
    Depth(u16),
    /// Any compression method
    Compressed(u32),
    /// Zero width or height
    Empty,
    /// Stored row longer than [`MAX_ROW_BYTES`]
    TooWide(u32),
    /// More than [`MAX_PALETTE`] palette entries
    Palette(u32),
    /// Source ended early
    Truncated,
}

/// Failure while drawing an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DrawBmpError<E> {
    Format(BmpError),
    Transport(E),
}

impl<E> From<BmpError> for DrawBmpError<E> {
    fn from(error: BmpError) -> Self {
        DrawBmpError::Format(error)
    }
}

/// Parsed file and info headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BmpHeader {
    pub file_size: u32,
    /// Offset of the first pixel row
    pub data_offset: u32,
    /// Size of the info header, 40 for BITMAPINFOHEADER
    pub info_size: u32,
    pub width: u32,
    /// Positive for bottom-up row order, negative for top-down
    pub height: i32,
    pub bits_per_pixel: u16,
    /// Palette entries, 0 for none
    pub colors_used: u32,
}

impl BmpHeader {
    /// Parse and validate the first [`HEADER_LEN`] bytes of a file
    pub fn parse(bytes: &[u8; HEADER_LEN]) -> Result<Self, BmpError> {
        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        let u32_at = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };

        if u16_at(0) != SIGNATURE {
            return Err(BmpError::Signature);
        }
        let planes = u16_at(26);
        if planes != 1 {
            return Err(BmpError::Planes(planes));
        }
        let header = BmpHeader {
            file_size: u32_at(2),
            data_offset: u32_at(10),
            info_size: u32_at(14),
            width: u32_at(18),
            height: u32_at(22) as i32,
            bits_per_pixel: u16_at(28),
            colors_used: u32_at(46),
        };
        let compression = u32_at(30);

        if !matches!(header.bits_per_pixel, 8 | 16 | 24) {
            return Err(BmpError::Depth(header.bits_per_pixel));
        }
        if compression != 0 {
            return Err(BmpError::Compressed(compression));
        }
        if header.width == 0 || header.height == 0 {
            return Err(BmpError::Empty);
        }
        if header.row_bytes() > MAX_ROW_BYTES as u64 {
            return Err(BmpError::TooWide(header.width));
        }
        if header.colors_used as usize > MAX_PALETTE {
            return Err(BmpError::Palette(header.colors_used));
        }
        Ok(header)
    }

    /// Stored bytes per row, padded to four
    pub fn row_bytes(&self) -> u64 {
        (u64::from(self.width) * u64::from(self.bits_per_pixel / 8)).div_ceil(4) * 4
    }

    pub fn rows(&self) -> u32 {
        self.height.unsigned_abs()
    }

    /// Whether the first stored row is the bottom one
    pub fn bottom_up(&self) -> bool {
        self.height > 0
    }
}

/// Random-access byte input
pub trait ByteSource {
    /// Move the read position to `pos` bytes from the start
    fn seek(&mut self, pos: usize) -> Result<(), BmpError>;

    /// Fill all of `buf` from the read position
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BmpError>;
}

/// [`ByteSource`] over a byte slice
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl ByteSource for SliceSource<'_> {
    fn seek(&mut self, pos: usize) -> Result<(), BmpError> {
        if pos > self.data.len() {
            return Err(BmpError::Truncated);
        }
        self.pos = pos;
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BmpError> {
        let end = self.pos + buf.len();
        let bytes = self.data.get(self.pos..end).ok_or(BmpError::Truncated)?;
        buf.copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }
}

/// No room left for a chunk; the file has been emptied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArenaFull;

/// In-memory file assembled from chunks
///
/// Chunk bytes are appended to one arena of `CAP` bytes and the end of
/// each chunk is kept in an index of up to `CHUNKS` entries. A chunk that
/// does not fit empties the whole file, so a partial upload is never
/// drawn.
pub struct ChunkFile<const CAP: usize, const CHUNKS: usize> {
    arena: Vec<u8, CAP>,
    ends: Vec<usize, CHUNKS>,
}

impl<const CAP: usize, const CHUNKS: usize> ChunkFile<CAP, CHUNKS> {
    pub const fn new() -> Self {
        Self {
            arena: Vec::new(),
            ends: Vec::new(),
        }
    }

    /// Append one chunk
    pub fn write(&mut self, chunk: &[u8]) -> Result<(), ArenaFull> {
        if self.ends.is_full() || self.arena.extend_from_slice(chunk).is_err() {
            self.clear();
            return Err(ArenaFull);
        }
        self.ends
            .push(self.arena.len())
            .map_err(|_| ArenaFull)
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.ends.clear();
    }

    /// Total bytes written
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.ends.len()
    }

    /// Read cursor at the start of the file
    pub fn reader(&self) -> ChunkReader<'_> {
        ChunkReader {
            arena: &self.arena,
            ends: &self.ends,
            chunk: 0,
            pos: 0,
        }
    }
}

impl<const CAP: usize, const CHUNKS: usize> Default for ChunkFile<CAP, CHUNKS> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cursor over a [`ChunkFile`]: current chunk and absolute position
#[derive(Debug, Clone)]
pub struct ChunkReader<'a> {
    arena: &'a [u8],
    ends: &'a [usize],
    chunk: usize,
    pos: usize,
}

impl ByteSource for ChunkReader<'_> {
    fn seek(&mut self, pos: usize) -> Result<(), BmpError> {
        if pos > self.arena.len() {
            return Err(BmpError::Truncated);
        }
        self.chunk = self.ends.partition_point(|&end| end <= pos);
        self.pos = pos;
        Ok(())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BmpError> {
        let mut filled = 0;
        while filled < buf.len() {
            let end = *self.ends.get(self.chunk).ok_or(BmpError::Truncated)?;
            if self.pos >= end {
                self.chunk += 1;
                continue;
            }
            let n = (end - self.pos).min(buf.len() - filled);
            buf[filled..filled + n].copy_from_slice(&self.arena[self.pos..self.pos + n]);
            filled += n;
            self.pos += n;
        }
        Ok(())
    }
}

/// BMP drawing for any [`Canvas`]
pub trait BmpRenderer: Canvas {
    /// Draw an image with its top-left corner at (x, y), scaled by `zoom`
    ///
    /// Rows and columns past the panel edge are clipped. An off-panel
    /// origin or a zoom of 0 draws nothing. Returns the parsed header.
    fn draw_bmp<S: ByteSource>(
        &mut self,
        source: &mut S,
        x: u16,
        y: u16,
        zoom: u8,
    ) -> Result<BmpHeader, DrawBmpError<Self::Error>> {
        let mut raw = [0u8; HEADER_LEN];
        source.seek(0)?;
        source.read_exact(&mut raw)?;
        let header = BmpHeader::parse(&raw)?;
        if !self.contains(x, y) || zoom == 0 {
            return Ok(header);
        }

        let mut palette = [Rgb565::BLACK; MAX_PALETTE];
        let colors = header.colors_used as usize;
        if colors > 0 {
            let mut entries = [0u8; MAX_PALETTE * 4];
            source.seek(INFO_OFFSET + header.info_size as usize)?;
            source.read_exact(&mut entries[..colors * 4])?;
            decode_palette(&entries[..colors * 4], &mut palette[..colors]);
        }
        let palette = &palette[..colors];

        let zoom = u32::from(zoom);
        let (width, height) = (u32::from(self.width()), u32::from(self.height()));
        let x_end = (u32::from(x) + header.width * zoom - 1).min(width - 1);
        let rows = header.rows();
        let row_bytes = header.row_bytes() as usize;
        let mut row = [0u8; MAX_ROW_BYTES];

        source.seek(header.data_offset as usize)?;
        for stored in 0..rows {
            source.read_exact(&mut row[..row_bytes])?;
            let image_row = if header.bottom_up() {
                rows - 1 - stored
            } else {
                stored
            };
            for repeat in 0..zoom {
                let py = u32::from(y) + image_row * zoom + repeat;
                if py >= height {
                    continue;
                }
                // Both ends lie on the u16 panel
                let window = Window::new(x, py as u16, x_end as u16, py as u16);
                let line = &row[..row_bytes];
                let pixels = (0..header.width as usize).flat_map(|index| {
                    let color = pixel(line, index, header.bits_per_pixel, palette);
                    core::iter::repeat(color).take(zoom as usize)
                });
                self.draw_pixels(window, pixels)
                    .map_err(DrawBmpError::Transport)?;
            }
        }

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "BMP {}x{} at {} bpp drawn at ({}, {})",
            header.width,
            rows,
            header.bits_per_pixel,
            x,
            y
        );
        Ok(header)
    }
}

impl<T: Canvas + ?Sized> BmpRenderer for T {}

/// Palette entries as 32-bit words
///
/// When every entry has 0xFF in its top byte the words are ARGB;
/// otherwise they are read as B, G, R from the top byte down.
fn decode_palette(entries: &[u8], palette: &mut [Rgb565]) {
    let word = |chunk: &[u8]| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    let argb = entries.chunks_exact(4).all(|chunk| word(chunk) >> 24 == 0xFF);
    for (color, chunk) in palette.iter_mut().zip(entries.chunks_exact(4)) {
        let [b0, b1, b2, b3] = word(chunk).to_le_bytes();
        *color = if argb {
            Rgb565::from_rgb888(b2, b1, b0)
        } else {
            Rgb565::from_rgb888(b1, b2, b3)
        };
    }
}

fn pixel(row: &[u8], index: usize, bits: u16, palette: &[Rgb565]) -> Rgb565 {
    match bits {
        8 => {
            let value = row[index];
            if palette.is_empty() {
                Rgb565::from_rgb888(value, value, value)
            } else {
                palette
                    .get(usize::from(value))
                    .copied()
                    .unwrap_or(Rgb565::BLACK)
            }
        }
        16 => {
            let k = index * 2;
            let word = u16::from_le_bytes([row[k], row[k + 1]]);
            // RGB555 to RGB565, green gains a low zero bit
            Rgb565(((word << 1) & 0xFFC0) | (word & 0x1F))
        }
        _ => {
            let k = index * 3;
            Rgb565::from_rgb888(row[k + 2], row[k + 1], row[k])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ili9486::cmd;
    use crate::sim::{test_panel, MemoryCanvas, PanelSim};
    use lumen_hal::mock::Bench;
    use std::vec::Vec as StdVec;

    /// Build a file; `rows` are given in stored order, unpadded
    fn bmp(width: u32, height: i32, bits: u16, palette: &[u32], rows: &[&[u8]]) -> StdVec<u8> {
        let offset = (HEADER_LEN + palette.len() * 4) as u32;
        let stride = (width * u32::from(bits / 8)).div_ceil(4) * 4;
        let mut out = StdVec::new();
        out.extend(SIGNATURE.to_le_bytes());
        out.extend((offset + stride * height.unsigned_abs()).to_le_bytes());
        out.extend(0u32.to_le_bytes());
        out.extend(offset.to_le_bytes());
        out.extend(40u32.to_le_bytes());
        out.extend(width.to_le_bytes());
        out.extend(height.to_le_bytes());
        out.extend(1u16.to_le_bytes());
        out.extend(bits.to_le_bytes());
        out.extend(0u32.to_le_bytes());
        out.extend((stride * height.unsigned_abs()).to_le_bytes());
        out.extend(2835u32.to_le_bytes());
        out.extend(2835u32.to_le_bytes());
        out.extend((palette.len() as u32).to_le_bytes());
        out.extend(0u32.to_le_bytes());
        for entry in palette {
            out.extend(entry.to_le_bytes());
        }
        for row in rows {
            out.extend(*row);
            out.resize(out.len() + stride as usize - row.len(), 0);
        }
        out
    }

    fn header(file: &[u8]) -> Result<BmpHeader, BmpError> {
        let mut raw = [0u8; HEADER_LEN];
        raw.copy_from_slice(&file[..HEADER_LEN]);
        BmpHeader::parse(&raw)
    }

    // 2x2, 24 bit, stored bottom row first
    const BOTTOM: &[u8] = &[0x00, 0x00, 0xFF, 0x00, 0xFF, 0x00];
    const TOP: &[u8] = &[0xFF, 0x00, 0x00, 0xFF, 0xFF, 0xFF];

    #[test]
    fn test_parse_header() {
        let file = bmp(2, 2, 24, &[], &[BOTTOM, TOP]);
        let header = header(&file).unwrap();
        assert_eq!(header.width, 2);
        assert_eq!(header.height, 2);
        assert_eq!(header.bits_per_pixel, 24);
        assert_eq!(header.data_offset, 54);
        assert_eq!(header.info_size, 40);
        assert_eq!(header.file_size, 54 + 16);
        assert_eq!(header.row_bytes(), 8);
        assert!(header.bottom_up());
    }

    #[test]
    fn test_parse_rejects_unsupported_files() {
        let good = bmp(2, 2, 24, &[], &[BOTTOM, TOP]);

        let mut file = good.clone();
        file[0] = b'X';
        assert_eq!(header(&file), Err(BmpError::Signature));

        let mut file = good.clone();
        file[26] = 2;
        assert_eq!(header(&file), Err(BmpError::Planes(2)));

        let mut file = good.clone();
        file[28] = 32;
        assert_eq!(header(&file), Err(BmpError::Depth(32)));

        let mut file = good.clone();
        file[30] = 1;
        assert_eq!(header(&file), Err(BmpError::Compressed(1)));

        let file = bmp(481, 1, 24, &[], &[]);
        assert_eq!(header(&file), Err(BmpError::TooWide(481)));

        let file = bmp(0, 1, 24, &[], &[]);
        assert_eq!(header(&file), Err(BmpError::Empty));
    }

    #[test]
    fn test_24_bit_bottom_up() {
        let file = bmp(2, 2, 24, &[], &[BOTTOM, TOP]);
        let mut canvas = MemoryCanvas::new(32, 32);
        canvas
            .draw_bmp(&mut SliceSource::new(&file), 3, 4, 1)
            .unwrap();

        assert_eq!(canvas.pixel(3, 4), Some(Rgb565::BLUE));
        assert_eq!(canvas.pixel(4, 4), Some(Rgb565::WHITE));
        assert_eq!(canvas.pixel(3, 5), Some(Rgb565::RED));
        assert_eq!(canvas.pixel(4, 5), Some(Rgb565::GREEN));
        assert_eq!(canvas.total_writes(), 4);
    }

    #[test]
    fn test_negative_height_is_top_down() {
        let file = bmp(2, -2, 24, &[], &[TOP, BOTTOM]);
        let mut canvas = MemoryCanvas::new(32, 32);
        canvas
            .draw_bmp(&mut SliceSource::new(&file), 0, 0, 1)
            .unwrap();

        assert_eq!(canvas.pixel(0, 0), Some(Rgb565::BLUE));
        assert_eq!(canvas.pixel(1, 1), Some(Rgb565::GREEN));
    }

    #[test]
    fn test_16_bit_rgb555() {
        let row: StdVec<u8> = [0x7C00u16, 0x03E0, 0x001F, 0x7FFF]
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .collect();
        let file = bmp(4, 1, 16, &[], &[&row]);
        let mut canvas = MemoryCanvas::new(8, 8);
        canvas
            .draw_bmp(&mut SliceSource::new(&file), 0, 0, 1)
            .unwrap();

        assert_eq!(canvas.pixel(0, 0), Some(Rgb565::RED));
        assert_eq!(canvas.pixel(1, 0), Some(Rgb565(0x07C0)));
        assert_eq!(canvas.pixel(2, 0), Some(Rgb565::BLUE));
        assert_eq!(canvas.pixel(3, 0), Some(Rgb565(0xFFDF)));
    }

    #[test]
    fn test_8_bit_palettes_and_grays() {
        let mut canvas = MemoryCanvas::new(8, 8);

        // Every entry has a 0xFF top byte: ARGB
        let file = bmp(2, 1, 8, &[0xFFFF_0000, 0xFF00_00FF], &[&[1, 0]]);
        canvas
            .draw_bmp(&mut SliceSource::new(&file), 0, 0, 1)
            .unwrap();
        assert_eq!(canvas.pixel(0, 0), Some(Rgb565::BLUE));
        assert_eq!(canvas.pixel(1, 0), Some(Rgb565::RED));

        // Otherwise B, G, R from the top byte down
        let file = bmp(2, 1, 8, &[0x0000_FF00, 0xFF00_0000], &[&[0, 1]]);
        canvas
            .draw_bmp(&mut SliceSource::new(&file), 0, 1, 1)
            .unwrap();
        assert_eq!(canvas.pixel(0, 1), Some(Rgb565::RED));
        assert_eq!(canvas.pixel(1, 1), Some(Rgb565::BLUE));

        // No palette: 256 grays
        let file = bmp(2, 1, 8, &[], &[&[0x00, 0xFF]]);
        canvas
            .draw_bmp(&mut SliceSource::new(&file), 0, 2, 1)
            .unwrap();
        assert_eq!(canvas.pixel(0, 2), Some(Rgb565::BLACK));
        assert_eq!(canvas.pixel(1, 2), Some(Rgb565::WHITE));
    }

    #[test]
    fn test_zoom_streams_one_window_per_row() {
        let bench = Bench::new();
        let mut panel = test_panel(&bench);
        bench.take_events();

        let file = bmp(2, 2, 24, &[], &[BOTTOM, TOP]);
        panel
            .draw_bmp(&mut SliceSource::new(&file), 10, 20, 3)
            .unwrap();

        let sim = PanelSim::replay(&bench.events());
        let windows = sim
            .registers()
            .iter()
            .filter(|(reg, _)| *reg == cmd::MEMORY_WRITE)
            .count();
        assert_eq!(windows, 6);
        assert_eq!(sim.pixel_writes(), 36);
        assert_eq!(sim.count(Rgb565::BLUE), 9);
        assert_eq!(sim.pixel(12, 22), Some(Rgb565::BLUE));
        assert_eq!(sim.pixel(13, 22), Some(Rgb565::WHITE));
        assert_eq!(sim.pixel(15, 25), Some(Rgb565::GREEN));
    }

    #[test]
    fn test_clipped_at_panel_edge() {
        let file = bmp(2, 2, 24, &[], &[BOTTOM, TOP]);
        let mut canvas = MemoryCanvas::new(8, 8);
        canvas
            .draw_bmp(&mut SliceSource::new(&file), 5, 5, 2)
            .unwrap();

        assert_eq!(canvas.total_writes(), 9);
        assert_eq!(canvas.pixel(5, 5), Some(Rgb565::BLUE));
        assert_eq!(canvas.pixel(7, 5), Some(Rgb565::WHITE));
        assert_eq!(canvas.pixel(7, 7), Some(Rgb565::GREEN));

        let mut canvas = MemoryCanvas::new(8, 8);
        canvas
            .draw_bmp(&mut SliceSource::new(&file), 8, 0, 1)
            .unwrap();
        canvas
            .draw_bmp(&mut SliceSource::new(&file), 0, 0, 0)
            .unwrap();
        assert_eq!(canvas.total_writes(), 0);
    }

    #[test]
    fn test_truncated_pixels() {
        let mut file = bmp(2, 2, 24, &[], &[BOTTOM, TOP]);
        file.truncate(file.len() - 1);
        let mut canvas = MemoryCanvas::new(8, 8);
        assert_eq!(
            canvas.draw_bmp(&mut SliceSource::new(&file), 0, 0, 1),
            Err(DrawBmpError::Format(BmpError::Truncated))
        );
    }

    #[test]
    fn test_chunk_reads_cross_boundaries() {
        let mut file: ChunkFile<32, 4> = ChunkFile::new();
        file.write(&[0, 1, 2]).unwrap();
        file.write(&[]).unwrap();
        file.write(&[3, 4, 5, 6, 7]).unwrap();
        file.write(&[8, 9]).unwrap();
        assert_eq!((file.len(), file.chunk_count()), (10, 4));

        let mut reader = file.reader();
        let mut buf = [0u8; 7];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [0, 1, 2, 3, 4, 5, 6]);

        reader.seek(2).unwrap();
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(buf, [2, 3, 4, 5, 6, 7, 8, 9]);

        reader.seek(10).unwrap();
        assert_eq!(reader.read_exact(&mut [0u8; 1]), Err(BmpError::Truncated));
        assert_eq!(reader.seek(11), Err(BmpError::Truncated));
    }

    #[test]
    fn test_chunk_file_full_is_emptied() {
        let mut file: ChunkFile<8, 2> = ChunkFile::new();
        file.write(&[1, 2, 3]).unwrap();
        assert_eq!(file.write(&[0; 6]), Err(ArenaFull));
        assert!(file.is_empty());

        file.write(&[1]).unwrap();
        file.write(&[2]).unwrap();
        assert_eq!(file.write(&[3]), Err(ArenaFull));
        assert_eq!(file.chunk_count(), 0);
    }

    #[test]
    fn test_chunked_upload_matches_slice() {
        let file = bmp(3, 2, 24, &[], &[&[9; 9], &[200; 9]]);
        let mut upload: ChunkFile<256, 16> = ChunkFile::new();
        for piece in file.chunks(7) {
            upload.write(piece).unwrap();
        }

        let mut from_chunks = MemoryCanvas::new(16, 16);
        let header = from_chunks.draw_bmp(&mut upload.reader(), 1, 1, 2).unwrap();
        let mut from_slice = MemoryCanvas::new(16, 16);
        from_slice
            .draw_bmp(&mut SliceSource::new(&file), 1, 1, 2)
            .unwrap();

        assert_eq!(header.width, 3);
        let gray = Rgb565::from_rgb888(200, 200, 200);
        assert_eq!(from_chunks.footprint(gray), from_slice.footprint(gray));
        assert_eq!(from_chunks.count(gray), 12);
    }
}
