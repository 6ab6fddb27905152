//! Recording fakes for host-side tests
//!
//! A [`Bench`] hands out SPI, pin, delay, backlight and flash fakes that
//! share one event log. Tests drive the real [`Transport`] and drivers over
//! these fakes, then decode the log. Reads are served from a scripted byte
//! queue (zeros once it runs dry).

use core::convert::Infallible;
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::vec::Vec;

use crate::backlight::Backlight;
use crate::flash::{FlashError, FlashStorage, StorageKey};
use crate::gpio::{InputPin, OutputPin};
use crate::spi::{SpiBus, SpiConfig};
use crate::transport::{Transport, TransportConfig};

/// Control lines tracked by the bench
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Dc,
    PanelCs,
    TouchCs,
    Reset,
}

impl Line {
    fn index(self) -> usize {
        self as usize
    }
}

/// One recorded hardware interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Output pin driven to a level
    Level { line: Line, high: bool },
    /// SPI clock reprogrammed
    Configure { frequency: u32 },
    /// Bytes written on MOSI
    Write(Vec<u8>),
    /// Number of bytes clocked in
    Read(usize),
    /// Busy-wait requested
    Delay { ns: u64 },
    /// Backlight duty set
    Backlight(u8),
}

#[derive(Default)]
struct State {
    events: Vec<Event>,
    levels: [bool; 4],
    reads: VecDeque<u8>,
    pen_down: bool,
    frequency: u32,
}

type Shared = Rc<RefCell<State>>;

/// Shared fake hardware
#[derive(Clone, Default)]
pub struct Bench {
    state: Shared,
}

impl Bench {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spi(&self) -> MockSpi {
        MockSpi { state: self.state.clone() }
    }

    pub fn pin(&self, line: Line) -> MockPin {
        MockPin { state: self.state.clone(), line }
    }

    /// Pen interrupt line of the touch controller (low while touched)
    pub fn irq(&self) -> MockIrq {
        MockIrq { state: self.state.clone() }
    }

    pub fn delay(&self) -> MockDelay {
        MockDelay { state: self.state.clone() }
    }

    pub fn backlight(&self) -> MockBacklight {
        MockBacklight { state: self.state.clone() }
    }

    /// Transport over this bench with the default clock rates
    pub fn transport(&self) -> Transport<MockSpi, MockPin, MockPin, MockPin> {
        Transport::new(
            self.spi(),
            self.pin(Line::Dc),
            self.pin(Line::PanelCs),
            self.pin(Line::TouchCs),
            TransportConfig::default(),
        )
        .unwrap_or_else(|never| match never {})
    }

    /// Copy of the event log
    pub fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    /// Drain the event log
    pub fn take_events(&self) -> Vec<Event> {
        core::mem::take(&mut self.state.borrow_mut().events)
    }

    /// Current level of an output line
    pub fn level(&self, line: Line) -> bool {
        self.state.borrow().levels[line.index()]
    }

    /// Clock rate last programmed into the SPI fake
    pub fn frequency(&self) -> u32 {
        self.state.borrow().frequency
    }

    /// Append bytes to be returned by subsequent SPI reads
    pub fn queue_read(&self, bytes: &[u8]) {
        self.state.borrow_mut().reads.extend(bytes.iter().copied());
    }

    /// Bytes still waiting in the read queue
    pub fn pending_reads(&self) -> usize {
        self.state.borrow().reads.len()
    }

    pub fn set_pen_down(&self, down: bool) {
        self.state.borrow_mut().pen_down = down;
    }

    /// All recorded delays in milliseconds (truncated)
    pub fn delays_ms(&self) -> Vec<u64> {
        self.state
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Delay { ns } => Some(ns / 1_000_000),
                _ => None,
            })
            .collect()
    }

    fn record(state: &Shared, event: Event) {
        state.borrow_mut().events.push(event);
    }
}

/// SPI master fake
pub struct MockSpi {
    state: Shared,
}

impl SpiBus for MockSpi {
    type Error = Infallible;

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        Bench::record(&self.state, Event::Write(data.to_vec()));
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        for byte in buf.iter_mut() {
            *byte = state.reads.pop_front().unwrap_or(0);
        }
        state.events.push(Event::Read(buf.len()));
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.write(write)?;
        self.read(read)
    }

    fn configure(&mut self, config: &SpiConfig) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        state.frequency = config.frequency;
        state.events.push(Event::Configure { frequency: config.frequency });
        Ok(())
    }
}

/// Output pin fake
pub struct MockPin {
    state: Shared,
    line: Line,
}

impl OutputPin for MockPin {
    fn set_high(&mut self) {
        self.set_state(true);
    }

    fn set_low(&mut self) {
        self.set_state(false);
    }

    fn set_state(&mut self, high: bool) {
        let mut state = self.state.borrow_mut();
        state.levels[self.line.index()] = high;
        state.events.push(Event::Level { line: self.line, high });
    }

    fn is_set_high(&self) -> bool {
        self.state.borrow().levels[self.line.index()]
    }
}

/// Pen IRQ fake, reads low while [`Bench::set_pen_down`] is true
pub struct MockIrq {
    state: Shared,
}

impl InputPin for MockIrq {
    fn is_high(&self) -> bool {
        !self.state.borrow().pen_down
    }
}

/// Delay fake that returns immediately and logs the requested time
pub struct MockDelay {
    state: Shared,
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        Bench::record(&self.state, Event::Delay { ns: u64::from(ns) });
    }

    fn delay_us(&mut self, us: u32) {
        Bench::record(&self.state, Event::Delay { ns: u64::from(us) * 1_000 });
    }

    fn delay_ms(&mut self, ms: u32) {
        Bench::record(&self.state, Event::Delay { ns: u64::from(ms) * 1_000_000 });
    }
}

/// Backlight fake
pub struct MockBacklight {
    state: Shared,
}

impl Backlight for MockBacklight {
    fn set_level(&mut self, level: u8) {
        Bench::record(&self.state, Event::Backlight(level));
    }
}

/// In-memory key-value flash
#[derive(Default)]
pub struct MemoryFlash {
    slots: BTreeMap<u8, Vec<u8>>,
}

impl MemoryFlash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutable access to a stored value, for corrupting it in tests
    pub fn slot_mut(&mut self, key: StorageKey) -> Option<&mut Vec<u8>> {
        self.slots.get_mut(&key.as_u8())
    }
}

impl FlashStorage for MemoryFlash {
    fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let data = self.slots.get(&key.as_u8()).ok_or(FlashError::NotFound)?;
        let target = buffer
            .get_mut(..data.len())
            .ok_or(FlashError::BufferTooSmall)?;
        target.copy_from_slice(data);
        Ok(data.len())
    }

    fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        self.slots.insert(key.as_u8(), data.to_vec());
        Ok(())
    }

    fn exists(&mut self, key: StorageKey) -> bool {
        self.slots.contains_key(&key.as_u8())
    }

    fn erase_all(&mut self) -> Result<(), FlashError> {
        self.slots.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::delay::DelayNs;

    #[test]
    fn test_reads_come_from_queue_then_zero() {
        let bench = Bench::new();
        let mut spi = bench.spi();
        bench.queue_read(&[1, 2]);

        let mut buf = [0xFFu8; 3];
        spi.read(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 0]);
        assert_eq!(bench.pending_reads(), 0);
    }

    #[test]
    fn test_delay_is_logged() {
        let bench = Bench::new();
        let mut delay = bench.delay();
        delay.delay_ms(500);
        delay.delay_us(200);
        assert_eq!(
            bench.events(),
            std::vec![Event::Delay { ns: 500_000_000 }, Event::Delay { ns: 200_000 }]
        );
        assert_eq!(bench.delays_ms(), std::vec![500, 0]);
    }

    #[test]
    fn test_memory_flash() {
        let mut flash = MemoryFlash::new();
        let mut buf = [0u8; 4];
        assert_eq!(
            flash.read(StorageKey::TouchCalibration, &mut buf),
            Err(FlashError::NotFound)
        );

        flash.write(StorageKey::TouchCalibration, &[9, 8, 7]).unwrap();
        assert!(flash.exists(StorageKey::TouchCalibration));
        assert_eq!(flash.read(StorageKey::TouchCalibration, &mut buf), Ok(3));
        assert_eq!(&buf[..3], &[9, 8, 7]);

        let mut small = [0u8; 2];
        assert_eq!(
            flash.read(StorageKey::TouchCalibration, &mut small),
            Err(FlashError::BufferTooSmall)
        );
    }
}
