//! Calibration persistence
//!
//! Coefficients are stored as a postcard-encoded [`CalibrationRecord`]
//! under [`StorageKey::TouchCalibration`]. A record is accepted only with
//! the right magic, version and CRC, and only for the orientation it was
//! taken in; otherwise the built-in coefficients are used.

use lumen_display::Orientation;
use lumen_hal::{FlashError, FlashStorage, StorageKey};
use serde::{Deserialize, Serialize};

use crate::mapper::Calibration;

/// Magic number to identify a touch calibration record
pub const RECORD_MAGIC: u32 = 0x5450_4341; // "TPCA"

/// Current record format version
pub const RECORD_VERSION: u8 = 1;

/// Maximum serialized record size
const MAX_RECORD_SIZE: usize = 64;

/// Stored form of a [`Calibration`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationRecord {
    pub magic: u32,
    pub version: u8,
    /// [`Orientation`] index
    pub orientation: u8,
    pub x_fac: f32,
    pub y_fac: f32,
    pub x_off: f32,
    pub y_off: f32,
    /// CRC32 over every field above
    pub crc: u32,
}

impl CalibrationRecord {
    /// Record for `calibration` with its CRC filled in
    pub fn new(calibration: &Calibration) -> Self {
        let mut record = Self {
            magic: RECORD_MAGIC,
            version: RECORD_VERSION,
            orientation: calibration.orientation.as_u8(),
            x_fac: calibration.x_fac,
            y_fac: calibration.y_fac,
            x_off: calibration.x_off,
            y_off: calibration.y_off,
            crc: 0,
        };
        record.update_crc();
        record
    }

    /// Magic and version match
    pub fn is_valid(&self) -> bool {
        self.magic == RECORD_MAGIC && self.version == RECORD_VERSION
    }

    pub fn calculate_crc(&self) -> u32 {
        let mut crc: u32 = 0xFFFF_FFFF;
        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version, self.orientation]);
        for value in [self.x_fac, self.y_fac, self.x_off, self.y_off] {
            crc = crc32_update(crc, &value.to_le_bytes());
        }
        !crc
    }

    pub fn update_crc(&mut self) {
        self.crc = self.calculate_crc();
    }

    pub fn verify_crc(&self) -> bool {
        self.crc == self.calculate_crc()
    }

    /// Coefficients, `None` if the orientation index is out of range
    pub fn calibration(&self) -> Option<Calibration> {
        Some(Calibration {
            orientation: Orientation::from_u8(self.orientation)?,
            x_fac: self.x_fac,
            y_fac: self.y_fac,
            x_off: self.x_off,
            y_off: self.y_off,
        })
    }
}

/// CRC32 update (IEEE 802.3 polynomial, reflected)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc = crc;

    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

/// Calibration persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Flash operation failed
    Flash(FlashError),
    /// Serialization failed
    Serialize,
    /// Deserialization failed
    Deserialize,
    /// CRC check failed
    CrcMismatch,
    /// Invalid magic, version or orientation index
    InvalidFormat,
    /// Record was taken in another orientation
    OrientationMismatch,
}

impl From<FlashError> for StoreError {
    fn from(e: FlashError) -> Self {
        StoreError::Flash(e)
    }
}

/// Load coefficients for `orientation`
///
/// Falls back to [`Calibration::builtin`] when nothing valid is stored.
/// `None` only for orientations without a touch mapping.
pub fn load_calibration<S: FlashStorage>(
    storage: &mut S,
    orientation: Orientation,
) -> Option<Calibration> {
    match read_calibration(storage, orientation) {
        Ok(calibration) => {
            #[cfg(feature = "defmt")]
            defmt::info!("Loaded touch calibration for {}", orientation);
            Some(calibration)
        }
        Err(StoreError::Flash(FlashError::NotFound)) => {
            #[cfg(feature = "defmt")]
            defmt::debug!("No touch calibration in flash, using built-in");
            Calibration::builtin(orientation)
        }
        Err(_e) => {
            #[cfg(feature = "defmt")]
            defmt::warn!("Failed to load touch calibration: {}, using built-in", _e);
            Calibration::builtin(orientation)
        }
    }
}

/// Read and validate the stored record
pub fn read_calibration<S: FlashStorage>(
    storage: &mut S,
    orientation: Orientation,
) -> Result<Calibration, StoreError> {
    let mut buffer = [0u8; MAX_RECORD_SIZE];
    let len = storage.read(StorageKey::TouchCalibration, &mut buffer)?;

    let record: CalibrationRecord =
        postcard::from_bytes(&buffer[..len]).map_err(|_| StoreError::Deserialize)?;

    if !record.is_valid() {
        return Err(StoreError::InvalidFormat);
    }
    if !record.verify_crc() {
        return Err(StoreError::CrcMismatch);
    }

    let calibration = record.calibration().ok_or(StoreError::InvalidFormat)?;
    if calibration.orientation != orientation {
        return Err(StoreError::OrientationMismatch);
    }
    Ok(calibration)
}

/// Save coefficients, replacing any stored record
pub fn save_calibration<S: FlashStorage>(
    storage: &mut S,
    calibration: &Calibration,
) -> Result<(), StoreError> {
    let record = CalibrationRecord::new(calibration);

    let mut buffer = [0u8; MAX_RECORD_SIZE];
    let bytes = postcard::to_slice(&record, &mut buffer).map_err(|_| StoreError::Serialize)?;

    storage.write(StorageKey::TouchCalibration, bytes)?;

    #[cfg(feature = "defmt")]
    defmt::info!("Saved touch calibration ({} bytes)", bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_hal::mock::MemoryFlash;

    fn sample() -> Calibration {
        Calibration {
            orientation: Orientation::D2uL2r,
            x_fac: -0.1303,
            y_fac: 0.0897,
            x_off: 507.1,
            y_off: -23.9,
        }
    }

    #[test]
    fn test_crc_consistency() {
        let mut record = CalibrationRecord::new(&sample());
        assert!(record.is_valid());
        assert!(record.verify_crc());

        record.x_off += 1.0;
        assert!(!record.verify_crc());
    }

    #[test]
    fn test_crc32_reference_value() {
        assert_eq!(!crc32_update(0xFFFF_FFFF, b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_save_then_load() {
        let mut flash = MemoryFlash::new();
        save_calibration(&mut flash, &sample()).unwrap();
        assert!(flash.exists(StorageKey::TouchCalibration));
        assert_eq!(read_calibration(&mut flash, Orientation::D2uL2r), Ok(sample()));
        assert_eq!(load_calibration(&mut flash, Orientation::D2uL2r), Some(sample()));
    }

    #[test]
    fn test_missing_falls_back_to_builtin() {
        let mut flash = MemoryFlash::new();
        assert_eq!(
            read_calibration(&mut flash, Orientation::D2uL2r),
            Err(StoreError::Flash(FlashError::NotFound))
        );
        assert_eq!(
            load_calibration(&mut flash, Orientation::D2uL2r),
            Calibration::builtin(Orientation::D2uL2r)
        );
        assert_eq!(load_calibration(&mut flash, Orientation::U2dL2r), None);
    }

    #[test]
    fn test_orientation_mismatch() {
        let mut flash = MemoryFlash::new();
        save_calibration(&mut flash, &sample()).unwrap();
        assert_eq!(
            read_calibration(&mut flash, Orientation::R2lD2u),
            Err(StoreError::OrientationMismatch)
        );
        assert_eq!(
            load_calibration(&mut flash, Orientation::R2lD2u),
            Calibration::builtin(Orientation::R2lD2u)
        );
    }

    #[test]
    fn test_corrupted_record_rejected() {
        let mut flash = MemoryFlash::new();
        save_calibration(&mut flash, &sample()).unwrap();

        // Flip a bit in the last coefficient byte, ahead of the CRC varint
        let slot = flash.slot_mut(StorageKey::TouchCalibration).unwrap();
        let crc_len = postcard::to_slice(&CalibrationRecord::new(&sample()).crc, &mut [0u8; 8])
            .unwrap()
            .len();
        let index = slot.len() - crc_len - 1;
        slot[index] ^= 0x01;

        assert_eq!(
            read_calibration(&mut flash, Orientation::D2uL2r),
            Err(StoreError::CrcMismatch)
        );
        assert_eq!(
            load_calibration(&mut flash, Orientation::D2uL2r),
            Calibration::builtin(Orientation::D2uL2r)
        );
    }

    #[test]
    fn test_wrong_magic_rejected() {
        let mut flash = MemoryFlash::new();
        let mut record = CalibrationRecord::new(&sample());
        record.magic = 0x5049_4443;
        record.update_crc();
        let mut buffer = [0u8; MAX_RECORD_SIZE];
        let bytes = postcard::to_slice(&record, &mut buffer).unwrap();
        flash.write(StorageKey::TouchCalibration, bytes).unwrap();

        assert_eq!(
            read_calibration(&mut flash, Orientation::D2uL2r),
            Err(StoreError::InvalidFormat)
        );
    }

    #[test]
    fn test_garbage_rejected() {
        let mut flash = MemoryFlash::new();
        flash.write(StorageKey::TouchCalibration, &[0xFF; 3]).unwrap();
        assert_eq!(
            read_calibration(&mut flash, Orientation::D2uL2r),
            Err(StoreError::Deserialize)
        );
    }
}
