//! Test doubles for delays and timers that drive a shared microsecond clock.
//!
//! Simulated devices in the driver tests read the same clock, so the
//! waveforms they produce line up with the delays the drivers insert.

use std::cell::Cell;
use std::rc::Rc;

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use embedded_hal::timer::{CountDown, Periodic};
use void::Void;

/// Elapsed microseconds since the test started
pub type Clock = Rc<Cell<u64>>;

pub fn clock() -> Clock {
    Rc::new(Cell::new(0))
}

/// Blocking delay that advances the clock instead of sleeping
pub struct MockDelay {
    pub clock: Clock,
    /// Every requested delay in microseconds, in call order
    pub log: Rc<std::cell::RefCell<Vec<u64>>>,
}

impl MockDelay {
    pub fn new(clock: &Clock) -> Self {
        MockDelay {
            clock: clock.clone(),
            log: Rc::new(std::cell::RefCell::new(Vec::new())),
        }
    }

    fn advance(&mut self, us: u64) {
        self.clock.set(self.clock.get() + us);
        self.log.borrow_mut().push(us);
    }
}

impl DelayUs<u16> for MockDelay {
    fn delay_us(&mut self, us: u16) {
        self.advance(u64::from(us));
    }
}

impl DelayMs<u16> for MockDelay {
    fn delay_ms(&mut self, ms: u16) {
        self.advance(u64::from(ms) * 1000);
    }
}

/// Periodic timer ticking once per microsecond
pub struct MockTimer {
    pub clock: Clock,
    pub ticks: u64,
}

impl MockTimer {
    pub fn new(clock: &Clock) -> Self {
        MockTimer {
            clock: clock.clone(),
            ticks: 0,
        }
    }
}

impl CountDown for MockTimer {
    type Time = u32;

    fn start<T>(&mut self, _count: T)
    where
        T: Into<Self::Time>,
    {
    }

    fn wait(&mut self) -> nb::Result<(), Void> {
        self.clock.set(self.clock.get() + 1);
        self.ticks += 1;
        Ok(())
    }
}

impl Periodic for MockTimer {}
