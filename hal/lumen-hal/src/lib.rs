//! Lumen Hardware Abstraction Layer
//!
//! Hardware traits for the panel stack plus the SPI transport that the
//! ILI9486 panel and the XPT2046 touch controller share.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐   ┌──────────────────────┐
//! │    lumen-display     │   │     lumen-touch      │
//! └──────────────────────┘   └──────────────────────┘
//!            │                          │
//!            └────────────┬─────────────┘
//!                         ▼
//! ┌─────────────────────────────────────────────────┐
//! │  lumen-hal (traits + Transport)                 │
//! └─────────────────────────────────────────────────┘
//!                         │
//!                         ▼
//!              chip-specific SPI / GPIO
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`gpio::GpioLine`] - Polarity-aware control lines (chip select, reset)
//! - [`spi::SpiBus`] - SPI bus operations with runtime clock changes
//! - [`backlight::Backlight`] - Backlight brightness
//! - [`flash::FlashStorage`] - Persistent storage
//! - [`transport::Bus`] - Session-based access to the shared bus

#![no_std]
#![deny(unsafe_code)]

#[cfg(any(test, feature = "mock"))]
extern crate std;

pub mod backlight;
pub mod flash;
pub mod gpio;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod spi;
pub mod transport;

// Re-export key traits at crate root for convenience
pub use backlight::Backlight;
pub use flash::{FlashError, FlashStorage, StorageKey};
pub use gpio::{ActiveHigh, ActiveLow, GpioLine, InputPin, OutputPin};
pub use spi::{SpiBus, SpiConfig};
pub use transport::{Bus, Device, Transport, TransportConfig};
