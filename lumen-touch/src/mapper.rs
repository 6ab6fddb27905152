//! Raw-to-screen coordinate mapping
//!
//! Each axis is an affine map `fac * raw + off`. The orientation decides
//! which raw axis drives screen X and whether the result is measured from
//! the far edge (`dimension - fac * raw - off`). Results are not clamped.

use lumen_display::{Orientation, TouchAxes};
use serde::{Deserialize, Serialize};

use crate::sampler::RawSample;

/// Affine coefficients for one orientation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    #[serde(with = "orientation_serde")]
    pub orientation: Orientation,
    pub x_fac: f32,
    pub y_fac: f32,
    pub x_off: f32,
    pub y_off: f32,
}

impl Calibration {
    /// Factory coefficients, `None` for orientations without a touch mapping
    pub fn builtin(orientation: Orientation) -> Option<Self> {
        let (x_fac, y_fac, x_off, y_off) = match orientation {
            Orientation::D2uL2r => (-0.132443, 0.089997, 516.0, -22.0),
            Orientation::L2rU2d => (0.089697, 0.134792, -21.0, -39.0),
            Orientation::R2lD2u => (0.089915, 0.133178, -22.0, -38.0),
            Orientation::U2dR2l => (-0.132906, 0.087964, 517.0, -20.0),
            _ => return None,
        };
        Some(Self {
            orientation,
            x_fac,
            y_fac,
            x_off,
            y_off,
        })
    }
}

/// Calibrated panel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

/// Raw axes as (horizontal, vertical) for `axes`
pub(crate) fn screen_axes(raw: RawSample, axes: TouchAxes) -> (f32, f32) {
    if axes.swap_axes {
        (f32::from(raw.y), f32::from(raw.x))
    } else {
        (f32::from(raw.x), f32::from(raw.y))
    }
}

/// Map a raw sample to screen coordinates
///
/// `width` and `height` are the panel size in `orientation`. Returns
/// `None` when the orientation has no touch mapping or the coefficients
/// belong to another orientation.
pub fn map(
    raw: RawSample,
    orientation: Orientation,
    calibration: &Calibration,
    width: u16,
    height: u16,
) -> Option<ScreenPoint> {
    if calibration.orientation != orientation {
        return None;
    }
    let axes = orientation.touch_axes()?;
    let (h, v) = screen_axes(raw, axes);
    let fx = calibration.x_fac * h + calibration.x_off;
    let fy = calibration.y_fac * v + calibration.y_off;
    let (x, y) = if axes.mirrored {
        (f32::from(width) - fx, f32::from(height) - fy)
    } else {
        (fx, fy)
    };
    Some(ScreenPoint {
        x: libm::roundf(x) as i32,
        y: libm::roundf(y) as i32,
    })
}

/// Orientation stored by its table index
mod orientation_serde {
    use lumen_display::Orientation;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(orientation: &Orientation, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(orientation.as_u8())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Orientation, D::Error> {
        let index = u8::deserialize(d)?;
        Orientation::from_u8(index).ok_or_else(|| D::Error::custom("orientation out of range"))
    }
}
