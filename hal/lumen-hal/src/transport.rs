//! Shared SPI transport for the panel and the touch controller
//!
//! Both chips sit on one SPI bus behind separate chip selects. The panel
//! is clocked at 8 MHz, the touch ADC at 2 MHz. Every logical operation
//! runs inside a session: the session selects one device at its clock
//! rate, and closing a touch session hands the bus back at the panel rate.
//!
//! The command/data strobe (DC) is only meaningful to the panel; touch
//! traffic goes through [`Bus::write`] and [`Bus::read`] which leave it alone.

use crate::gpio::{ActiveLow, GpioLine, OutputPin};
use crate::spi::{Mode, SpiBus, SpiConfig};

/// Panel clock rate
pub const PANEL_CLOCK_HZ: u32 = 8_000_000;

/// Touch ADC clock rate
pub const TOUCH_CLOCK_HZ: u32 = 2_000_000;

/// Device addressed by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Device {
    /// ILI9486 display controller
    Panel,
    /// XPT2046 touch ADC
    Touch,
}

/// Clock settings for the two devices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransportConfig {
    pub panel: SpiConfig,
    pub touch: SpiConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            panel: SpiConfig::new(PANEL_CLOCK_HZ, Mode::Mode0),
            touch: SpiConfig::new(TOUCH_CLOCK_HZ, Mode::Mode0),
        }
    }
}

impl TransportConfig {
    fn for_device(&self, device: Device) -> SpiConfig {
        match device {
            Device::Panel => self.panel,
            Device::Touch => self.touch,
        }
    }
}

/// Exclusive, session-based access to the shared bus
///
/// Implemented by [`Transport`]; test code can substitute its own.
pub trait Bus {
    /// Error type of the underlying SPI bus
    type Error;

    /// Open a session: apply the device's clock and select it
    ///
    /// A session that is still open is closed first.
    fn begin(&mut self, device: Device) -> Result<(), Self::Error>;

    /// Close the current session, if any
    fn end(&mut self) -> Result<(), Self::Error>;

    /// Send a command byte (DC low)
    fn command(&mut self, command: u8) -> Result<(), Self::Error>;

    /// Send data bytes (DC high)
    fn data(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Send raw bytes, DC untouched
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Clock in raw bytes, DC untouched
    fn read(&mut self, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Run `f` as one complete logical operation on `device`
    ///
    /// The session is closed even when `f` fails; the first error wins.
    fn transaction<R, F>(&mut self, device: Device, f: F) -> Result<R, Self::Error>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<R, Self::Error>,
    {
        self.begin(device)?;
        let result = f(self);
        let closed = self.end();
        let value = result?;
        closed?;
        Ok(value)
    }
}

/// SPI bus plus the DC strobe and both chip selects
pub struct Transport<SPI, DC, LCS, TCS> {
    spi: SPI,
    dc: DC,
    panel_cs: ActiveLow<LCS>,
    touch_cs: ActiveLow<TCS>,
    config: TransportConfig,
    /// Clock currently programmed into the SPI peripheral
    clock: SpiConfig,
    active: Option<Device>,
}

impl<SPI, DC, LCS, TCS> Transport<SPI, DC, LCS, TCS>
where
    SPI: SpiBus,
    DC: OutputPin,
    LCS: OutputPin,
    TCS: OutputPin,
{
    /// Take ownership of the bus, deselect both chips and program the panel clock
    pub fn new(
        mut spi: SPI,
        dc: DC,
        panel_cs: LCS,
        touch_cs: TCS,
        config: TransportConfig,
    ) -> Result<Self, SPI::Error> {
        let mut panel_cs = ActiveLow::new(panel_cs);
        let mut touch_cs = ActiveLow::new(touch_cs);
        panel_cs.deassert();
        touch_cs.deassert();
        spi.configure(&config.panel)?;

        Ok(Self {
            spi,
            dc,
            panel_cs,
            touch_cs,
            config,
            clock: config.panel,
            active: None,
        })
    }

    /// Device of the open session
    pub fn active(&self) -> Option<Device> {
        self.active
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Release the hardware
    pub fn release(self) -> (SPI, DC, LCS, TCS) {
        (
            self.spi,
            self.dc,
            self.panel_cs.into_inner(),
            self.touch_cs.into_inner(),
        )
    }

    fn apply_clock(&mut self, config: SpiConfig) -> Result<(), SPI::Error> {
        if self.clock != config {
            self.spi.configure(&config)?;
            self.clock = config;
        }
        Ok(())
    }
}

impl<SPI, DC, LCS, TCS> Bus for Transport<SPI, DC, LCS, TCS>
where
    SPI: SpiBus,
    DC: OutputPin,
    LCS: OutputPin,
    TCS: OutputPin,
{
    type Error = SPI::Error;

    fn begin(&mut self, device: Device) -> Result<(), Self::Error> {
        if self.active.is_some() {
            self.end()?;
        }

        self.apply_clock(self.config.for_device(device))?;
        match device {
            Device::Panel => self.panel_cs.assert(),
            Device::Touch => self.touch_cs.assert(),
        }
        self.active = Some(device);
        Ok(())
    }

    fn end(&mut self) -> Result<(), Self::Error> {
        match self.active.take() {
            Some(Device::Panel) => self.panel_cs.deassert(),
            Some(Device::Touch) => {
                self.touch_cs.deassert();
                self.apply_clock(self.config.panel)?;
            }
            None => {}
        }
        Ok(())
    }

    fn command(&mut self, command: u8) -> Result<(), Self::Error> {
        self.dc.set_low();
        self.spi.write(&[command])
    }

    fn data(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.dc.set_high();
        self.spi.write(bytes)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.spi.write(bytes)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.spi.read(buf)
    }
}
