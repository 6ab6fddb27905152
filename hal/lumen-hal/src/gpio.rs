//! GPIO pin abstractions
//!
//! Raw pin traits implemented by chip-specific HALs, plus [`GpioLine`]
//! adapters that hide the electrical polarity of control lines.

/// Digital output pin
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;

    /// Check if the pin is currently set low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}

/// Digital input pin
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

/// A control line with a logical "active" state
///
/// Chip selects and the panel reset are active-low, a GPIO-driven
/// backlight is active-high. Drivers only ever talk about asserting a
/// line, the adapter decides which level that is.
pub trait GpioLine {
    /// Drive the line to its active level
    fn assert(&mut self);

    /// Drive the line to its inactive level
    fn deassert(&mut self);

    /// Whether the line is currently at its active level
    fn is_asserted(&self) -> bool;
}

/// Line that is active when the pin is low
#[derive(Debug)]
pub struct ActiveLow<P>(P);

impl<P> ActiveLow<P> {
    pub const fn new(pin: P) -> Self {
        Self(pin)
    }

    /// Give back the wrapped pin
    pub fn into_inner(self) -> P {
        self.0
    }
}

impl<P: OutputPin> GpioLine for ActiveLow<P> {
    fn assert(&mut self) {
        self.0.set_low();
    }

    fn deassert(&mut self) {
        self.0.set_high();
    }

    fn is_asserted(&self) -> bool {
        self.0.is_set_low()
    }
}

/// Line that is active when the pin is high
#[derive(Debug)]
pub struct ActiveHigh<P>(P);

impl<P> ActiveHigh<P> {
    pub const fn new(pin: P) -> Self {
        Self(pin)
    }

    /// Give back the wrapped pin
    pub fn into_inner(self) -> P {
        self.0
    }
}

impl<P: OutputPin> GpioLine for ActiveHigh<P> {
    fn assert(&mut self) {
        self.0.set_high();
    }

    fn deassert(&mut self) {
        self.0.set_low();
    }

    fn is_asserted(&self) -> bool {
        self.0.is_set_high()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestPin {
        high: bool,
    }

    impl OutputPin for TestPin {
        fn set_high(&mut self) {
            self.high = true;
        }

        fn set_low(&mut self) {
            self.high = false;
        }

        fn is_set_high(&self) -> bool {
            self.high
        }
    }

    #[test]
    fn test_active_low_polarity() {
        let mut cs = ActiveLow::new(TestPin { high: true });
        assert!(!cs.is_asserted());

        cs.assert();
        assert!(cs.is_asserted());
        assert!(cs.0.is_set_low());

        cs.deassert();
        assert!(cs.into_inner().is_set_high());
    }

    #[test]
    fn test_active_high_polarity() {
        let mut line = ActiveHigh::new(TestPin { high: false });
        line.assert();
        assert!(line.is_asserted());
        assert!(line.0.is_set_high());

        line.deassert();
        assert!(!line.is_asserted());
    }

    #[test]
    fn test_set_state() {
        let mut pin = TestPin { high: false };
        pin.set_state(true);
        assert!(pin.is_set_high());
        pin.set_state(false);
        assert!(pin.is_set_low());
    }
}
