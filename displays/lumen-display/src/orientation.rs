//! Panel scan directions
//!
//! Each orientation is one row of [`SCAN_TABLE`]: the memory-access and
//! display-function register values, whether the reported width and height
//! are swapped against the native 480x320 grid, and how the touch ADC axes
//! relate to the screen axes (only four orientations have a known mapping).

/// Scan direction of the panel, named horizontal-then-vertical
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Orientation {
    /// Left to right, up to down
    L2rU2d = 0,
    /// Left to right, down to up
    L2rD2u = 1,
    /// Right to left, up to down
    R2lU2d = 2,
    /// Right to left, down to up
    R2lD2u = 3,
    /// Up to down, left to right
    U2dL2r = 4,
    /// Up to down, right to left
    U2dR2l = 5,
    /// Down to up, left to right
    #[default]
    D2uL2r = 6,
    /// Down to up, right to left
    D2uR2l = 7,
}

/// How raw touch axes map onto screen axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchAxes {
    /// Raw Y drives screen X (and raw X drives screen Y)
    pub swap_axes: bool,
    /// Screen coordinate is `dimension - fac * raw - off`
    pub mirrored: bool,
}

/// Per-orientation register values and geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanEntry {
    /// Memory access control (0x36) value
    pub memory_access: u8,
    /// Second parameter of display function control (0xB6)
    pub display_function: u8,
    /// Reported width/height are swapped against the native grid
    pub swap_dimensions: bool,
    /// Touch mapping, `None` where calibration is unsupported
    pub touch: Option<TouchAxes>,
}

const fn entry(
    memory_access: u8,
    display_function: u8,
    swap_dimensions: bool,
    touch: Option<TouchAxes>,
) -> ScanEntry {
    ScanEntry {
        memory_access,
        display_function,
        swap_dimensions,
        touch,
    }
}

const fn axes(swap_axes: bool, mirrored: bool) -> Option<TouchAxes> {
    Some(TouchAxes { swap_axes, mirrored })
}

/// Indexed by `Orientation as usize`
pub const SCAN_TABLE: [ScanEntry; 8] = [
    entry(0x08, 0x22, true, axes(false, true)),  // L2R_U2D
    entry(0x08, 0x62, true, None),               // L2R_D2U
    entry(0x08, 0x02, true, None),               // R2L_U2D
    entry(0x08, 0x42, true, axes(false, false)), // R2L_D2U
    entry(0x28, 0x22, false, None),              // U2D_L2R
    entry(0x28, 0x02, false, axes(true, false)), // U2D_R2L
    entry(0x28, 0x62, false, axes(true, true)),  // D2U_L2R
    entry(0x28, 0x42, false, None),              // D2U_R2L
];

impl Orientation {
    pub const ALL: [Orientation; 8] = [
        Orientation::L2rU2d,
        Orientation::L2rD2u,
        Orientation::R2lU2d,
        Orientation::R2lD2u,
        Orientation::U2dL2r,
        Orientation::U2dR2l,
        Orientation::D2uL2r,
        Orientation::D2uR2l,
    ];

    pub fn entry(self) -> &'static ScanEntry {
        &SCAN_TABLE[self as usize]
    }

    pub fn memory_access(self) -> u8 {
        self.entry().memory_access
    }

    pub fn display_function(self) -> u8 {
        self.entry().display_function
    }

    /// Width and height as seen in this orientation
    pub fn dimensions(self, native_width: u16, native_height: u16) -> (u16, u16) {
        if self.entry().swap_dimensions {
            (native_height, native_width)
        } else {
            (native_width, native_height)
        }
    }

    /// Touch axis mapping, `None` if touch calibration is unsupported
    pub fn touch_axes(self) -> Option<TouchAxes> {
        self.entry().touch
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions() {
        assert_eq!(Orientation::D2uL2r.dimensions(480, 320), (480, 320));
        assert_eq!(Orientation::U2dR2l.dimensions(480, 320), (480, 320));
        assert_eq!(Orientation::L2rU2d.dimensions(480, 320), (320, 480));
        assert_eq!(Orientation::R2lD2u.dimensions(480, 320), (320, 480));
    }

    #[test]
    fn test_exactly_four_touch_mappings() {
        let supported: usize = Orientation::ALL
            .iter()
            .filter(|o| o.touch_axes().is_some())
            .count();
        assert_eq!(supported, 4);
        assert!(Orientation::L2rD2u.touch_axes().is_none());
        assert!(Orientation::D2uR2l.touch_axes().is_none());
    }

    #[test]
    fn test_registers() {
        assert_eq!(Orientation::D2uL2r.memory_access(), 0x28);
        assert_eq!(Orientation::D2uL2r.display_function(), 0x62);
        assert_eq!(Orientation::R2lU2d.memory_access(), 0x08);
        assert_eq!(Orientation::R2lU2d.display_function(), 0x02);
    }

    #[test]
    fn test_index_matches_table() {
        for orientation in Orientation::ALL {
            assert_eq!(Orientation::from_u8(orientation.as_u8()), Some(orientation));
        }
        assert_eq!(Orientation::from_u8(8), None);
        assert_eq!(Orientation::default(), Orientation::D2uL2r);
    }
}
