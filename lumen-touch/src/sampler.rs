//! XPT2046 sampling
//!
//! One raw reading is a control byte per axis followed by a 16-bit
//! big-endian reply; the 12-bit code sits in the top bits, so the reply
//! is shifted right by 3. Readings are taken inside a touch session on the
//! shared bus, which runs at the lower touch clock.

use embedded_hal::delay::DelayNs;
use lumen_hal::{Bus, Device};

/// XPT2046 control bytes
pub mod cmd {
    /// Differential 12-bit X measurement, PENIRQ enabled
    pub const READ_X: u8 = 0xD0;
    /// Differential 12-bit Y measurement, PENIRQ enabled
    pub const READ_Y: u8 = 0x90;
}

/// Raw readings per axis for one averaged sample
pub const SAMPLE_COUNT: usize = 5;

/// Uncalibrated 12-bit ADC codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    pub x: u16,
    pub y: u16,
}

impl RawSample {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// Sampling configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchConfig {
    /// Wait after each control byte and after each raw reading (µs)
    pub settle_us: u32,
    /// Largest per-axis difference between the two averaged samples
    /// of [`TouchSampler::read_twice`]
    pub tolerance: u16,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            settle_us: 200,
            tolerance: 50,
        }
    }
}

/// Raw, averaged and cross-checked touch readings
#[derive(Debug, Clone, Copy, Default)]
pub struct TouchSampler {
    config: TouchConfig,
}

impl TouchSampler {
    pub fn new(config: TouchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TouchConfig {
        &self.config
    }

    /// One reading of both axes
    pub fn read_raw<B, D>(&self, bus: &mut B, delay: &mut D) -> Result<RawSample, B::Error>
    where
        B: Bus,
        D: DelayNs,
    {
        let settle_us = self.config.settle_us;
        bus.transaction(Device::Touch, |bus| {
            let x = read_channel(bus, delay, cmd::READ_X, settle_us)?;
            let y = read_channel(bus, delay, cmd::READ_Y, settle_us)?;
            Ok(RawSample { x, y })
        })
    }

    /// [`SAMPLE_COUNT`] readings per axis, extremes dropped, rest averaged
    pub fn read_averaged<B, D>(&self, bus: &mut B, delay: &mut D) -> Result<RawSample, B::Error>
    where
        B: Bus,
        D: DelayNs,
    {
        let mut xs = [0u16; SAMPLE_COUNT];
        let mut ys = [0u16; SAMPLE_COUNT];
        for (x, y) in xs.iter_mut().zip(ys.iter_mut()) {
            let raw = self.read_raw(bus, delay)?;
            *x = raw.x;
            *y = raw.y;
            delay.delay_us(self.config.settle_us);
        }
        Ok(RawSample {
            x: filtered_mean(&mut xs),
            y: filtered_mean(&mut ys),
        })
    }

    /// Two averaged samples that must agree within the tolerance
    ///
    /// Returns their mean, or `None` when either axis disagrees. A
    /// disagreement is not an error; the caller retries on its next poll.
    pub fn read_twice<B, D>(
        &self,
        bus: &mut B,
        delay: &mut D,
    ) -> Result<Option<RawSample>, B::Error>
    where
        B: Bus,
        D: DelayNs,
    {
        let first = self.read_averaged(bus, delay)?;
        let second = self.read_averaged(bus, delay)?;

        let tolerance = self.config.tolerance;
        if first.x.abs_diff(second.x) > tolerance || first.y.abs_diff(second.y) > tolerance {
            return Ok(None);
        }
        Ok(Some(RawSample {
            x: mean(first.x, second.x),
            y: mean(first.y, second.y),
        }))
    }
}

fn read_channel<B, D>(bus: &mut B, delay: &mut D, control: u8, settle_us: u32) -> Result<u16, B::Error>
where
    B: Bus,
    D: DelayNs,
{
    bus.write(&[control])?;
    delay.delay_us(settle_us);
    let mut reply = [0u8; 2];
    bus.read(&mut reply)?;
    Ok(u16::from_be_bytes(reply) >> 3)
}

fn mean(a: u16, b: u16) -> u16 {
    ((u32::from(a) + u32::from(b)) / 2) as u16
}

/// Mean of `values` without its smallest and largest entry
///
/// The minimum is swapped to the front and the maximum to the back, then
/// the middle is averaged. Fewer than three values are averaged as-is.
pub fn filtered_mean(values: &mut [u16]) -> u16 {
    let n = values.len();
    if n == 0 {
        return 0;
    }
    if n < 3 {
        let sum: u32 = values.iter().map(|&v| u32::from(v)).sum();
        return (sum / n as u32) as u16;
    }

    if let Some(min) = (0..n).min_by_key(|&i| values[i]) {
        values.swap(0, min);
    }
    if let Some(max) = (1..n).max_by_key(|&i| values[i]) {
        values.swap(n - 1, max);
    }

    let middle = &values[1..n - 1];
    let sum: u32 = middle.iter().map(|&v| u32::from(v)).sum();
    (sum / middle.len() as u32) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_hal::mock::{Bench, Event};
    use lumen_hal::transport::{PANEL_CLOCK_HZ, TOUCH_CLOCK_HZ};
    use proptest::prelude::*;

    /// Queue the two replies of one raw reading
    fn queue_raw(bench: &Bench, x: u16, y: u16) {
        let (x, y) = (x << 3, y << 3);
        bench.queue_read(&[(x >> 8) as u8, x as u8, (y >> 8) as u8, y as u8]);
    }

    fn queue_averaged(bench: &Bench, x: u16, y: u16) {
        for _ in 0..SAMPLE_COUNT {
            queue_raw(bench, x, y);
        }
    }

    #[test]
    fn test_read_raw_protocol() {
        let bench = Bench::new();
        let mut bus = bench.transport();
        bench.take_events();
        queue_raw(&bench, 1234, 3210);

        let sampler = TouchSampler::default();
        let raw = sampler.read_raw(&mut bus, &mut bench.delay()).unwrap();
        assert_eq!(raw, RawSample::new(1234, 3210));

        let events = bench.events();
        let writes: std::vec::Vec<&Event> = events
            .iter()
            .filter(|e| matches!(e, Event::Write(_) | Event::Read(_)))
            .collect();
        assert_eq!(
            writes,
            [
                &Event::Write(std::vec![cmd::READ_X]),
                &Event::Read(2),
                &Event::Write(std::vec![cmd::READ_Y]),
                &Event::Read(2),
            ]
        );
        assert!(events.contains(&Event::Configure { frequency: TOUCH_CLOCK_HZ }));
        assert_eq!(bench.frequency(), PANEL_CLOCK_HZ);
    }

    #[test]
    fn test_settle_after_each_control_byte() {
        let bench = Bench::new();
        let mut bus = bench.transport();
        bench.take_events();
        queue_raw(&bench, 1, 2);

        TouchSampler::default()
            .read_raw(&mut bus, &mut bench.delay())
            .unwrap();

        let events = bench.events();
        let delays: usize = events
            .windows(2)
            .filter(|w| {
                matches!(w[0], Event::Write(_)) && w[1] == Event::Delay { ns: 200_000 }
            })
            .count();
        assert_eq!(delays, 2);
    }

    #[test]
    fn test_filtered_mean_drops_extremes() {
        assert_eq!(filtered_mean(&mut [100, 102, 98, 101, 99]), 100);
        assert_eq!(filtered_mean(&mut [4095, 0, 10, 20, 30]), 20);
        assert_eq!(filtered_mean(&mut [9, 1, 5, 5, 5]), 5);
    }

    #[test]
    fn test_filtered_mean_short_inputs() {
        assert_eq!(filtered_mean(&mut []), 0);
        assert_eq!(filtered_mean(&mut [7]), 7);
        assert_eq!(filtered_mean(&mut [4, 8]), 6);
    }

    #[test]
    fn test_read_averaged() {
        let bench = Bench::new();
        let mut bus = bench.transport();
        for (x, y) in [(100, 2000), (102, 2004), (98, 1990), (101, 2001), (99, 2100)] {
            queue_raw(&bench, x, y);
        }

        let raw = TouchSampler::default()
            .read_averaged(&mut bus, &mut bench.delay())
            .unwrap();
        assert_eq!(raw, RawSample::new(100, 2001));
        assert_eq!(bench.pending_reads(), 0);
    }

    #[test]
    fn test_read_twice_accepts_within_tolerance() {
        let bench = Bench::new();
        let mut bus = bench.transport();
        queue_averaged(&bench, 1000, 2000);
        queue_averaged(&bench, 1050, 1960);

        let raw = TouchSampler::default()
            .read_twice(&mut bus, &mut bench.delay())
            .unwrap();
        assert_eq!(raw, Some(RawSample::new(1025, 1980)));
        assert_eq!(bench.pending_reads(), 0);
    }

    #[test]
    fn test_read_twice_rejects_disagreement() {
        let bench = Bench::new();
        let mut bus = bench.transport();
        queue_averaged(&bench, 1000, 2000);
        queue_averaged(&bench, 1000, 2051);

        let raw = TouchSampler::default()
            .read_twice(&mut bus, &mut bench.delay())
            .unwrap();
        assert_eq!(raw, None);
        assert_eq!(bench.frequency(), PANEL_CLOCK_HZ);
    }

    #[test]
    fn test_custom_tolerance() {
        let bench = Bench::new();
        let mut bus = bench.transport();
        queue_averaged(&bench, 1000, 2000);
        queue_averaged(&bench, 1010, 2000);

        let sampler = TouchSampler::new(TouchConfig {
            settle_us: 10,
            tolerance: 5,
        });
        assert_eq!(sampler.read_twice(&mut bus, &mut bench.delay()).unwrap(), None);
    }

    proptest! {
        #[test]
        fn prop_constant_input_averages_exactly(x in 0u16..4096, y in 0u16..4096) {
            let bench = Bench::new();
            let mut bus = bench.transport();
            queue_averaged(&bench, x, y);

            let raw = TouchSampler::default()
                .read_averaged(&mut bus, &mut bench.delay())
                .unwrap();
            prop_assert_eq!(raw, RawSample::new(x, y));
        }

        #[test]
        fn prop_filtered_mean_within_range(mut values in proptest::array::uniform5(0u16..4096)) {
            let lo = *values.iter().min().unwrap();
            let hi = *values.iter().max().unwrap();
            let mean = filtered_mean(&mut values);
            prop_assert!(lo <= mean && mean <= hi);
        }
    }
}
