/*!
  # DS1302 real time clock over its 3-wire interface

  Every transaction starts with chip enable going high and a command byte:

  ```text
  bit    7   6        5 4 3 2 1   0
        [1] [RAM/CK] [ address ] [RD/W]
  ```

  Command and data bytes are shifted least significant bit first. The host
  presents a bit and raises the clock; the chip latches it on the rising edge.
  When reading, the chip presents the next bit on every falling edge,
  starting with the falling edge of the last command bit, so the host samples
  the line before each clock pulse.

  Time registers hold BCD. [`TimeReading`] always holds decoded decimal
  values and a 0-23 hour, whatever hour mode the chip is in.

  This implementation consumes the following hardware resources:
  - Two output pins for chip enable and the serial clock
  - One bidirectional line for data ([`IoLine`](crate::gpio::IoLine))
  - A periodic timer ticking once per clock half period (1 µs)

  ## Example

  ```no_run
    use bitbang_drivers::calendar;
    use bitbang_drivers::ds1302::Ds1302;
    # fn demo<P, L, T>(ce: P, io: L, clk: P, timer: T)
    # where
    #     P: embedded_hal::digital::v2::OutputPin,
    #     P::Error: core::fmt::Debug,
    #     L: bitbang_drivers::gpio::IoLine<Error = P::Error>,
    #     T: embedded_hal::timer::CountDown + embedded_hal::timer::Periodic,
    # {
    let mut rtc = Ds1302::new(ce, io, clk, timer).unwrap();

    let build = calendar::time_from_build_strings("Jun  5 2024", "13:30:45").unwrap();
    rtc.write_time(&build).unwrap();
    let now = rtc.read_time().unwrap();
    # }
  ```
*/

use core::convert::TryFrom;

use embedded_hal::digital::v2::OutputPin;
use embedded_hal::timer::{CountDown, Periodic};
use log::{debug, trace};
use nb::block;

use crate::bcd;
use crate::gpio::{Direction, IoLine};

/// Command bytes (write form) of the clock and RAM registers
pub mod register {
    /// Seconds and clock halt flag
    pub const SECOND: u8 = 0x80;
    /// Minutes
    pub const MINUTE: u8 = 0x82;
    /// Hours and 12/24 hour mode
    pub const HOUR: u8 = 0x84;
    /// Day of month
    pub const DATE: u8 = 0x86;
    /// Month
    pub const MONTH: u8 = 0x88;
    /// Day of week
    pub const DAY: u8 = 0x8A;
    /// Year within the century
    pub const YEAR: u8 = 0x8C;
    /// Write protect flag
    pub const WRITE_PROTECT: u8 = 0x8E;
    /// Burst access to all clock registers
    pub const CLOCK_BURST: u8 = 0xBE;
    /// First RAM byte
    pub const RAM: u8 = 0xC0;
    /// Burst access to the RAM
    pub const RAM_BURST: u8 = 0xFE;
    /// Set in the command byte for reads
    pub const READ: u8 = 0x01;
    /// Always set in the command byte
    pub const COMMAND: u8 = 0x80;
}

mod mask {
    pub const SECOND: u8 = 0x7F;
    pub const MINUTE: u8 = 0x7F;
    pub const HOUR_24: u8 = 0x3F;
    pub const HOUR_12: u8 = 0x1F;
    pub const DATE: u8 = 0x3F;
    pub const MONTH: u8 = 0x1F;
    pub const DAY_OF_WEEK: u8 = 0x07;
}

mod flag {
    pub const CLOCK_HALT: u8 = 1 << 7;
    pub const WRITE_PROTECT: u8 = 1 << 7;
    pub const HOUR_12: u8 = 1 << 7;
    pub const PM: u8 = 1 << 5;
}

/// Bytes of battery backed RAM
pub const RAM_SIZE: u8 = 31;

/// Timer ticks between chip enable and the first clock edge, and after the last
const CE_SETUP_TICKS: u8 = 4;

/// DS1302 error
#[derive(Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// GPIO error
    Bus(E),
    /// RAM index or burst length out of range, lengths above 255 read 255
    RamIndex(u8),
}

/// Hour format kept by the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HourMode {
    /// 0-23
    TwentyFour,
    /// 1-12 with AM/PM flag
    Twelve,
}

/// Date and time in decimal.
///
/// Fields must be within their calendar range; values above 99 cannot be
/// represented in BCD and are not checked at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeReading {
    /// 0-59
    pub second: u8,
    /// 0-59
    pub minute: u8,
    /// 0-23
    pub hour: u8,
    /// Day of month, 1-31
    pub day: u8,
    /// 1-12
    pub month: u8,
    /// Monday = 1 to Sunday = 7
    pub day_of_week: u8,
    /// Year within the century, 0-99
    pub year: u8,
}

impl TimeReading {
    fn from_registers(raw: &[u8; 7]) -> Self {
        TimeReading {
            second: bcd::decode(raw[0] & mask::SECOND),
            minute: bcd::decode(raw[1] & mask::MINUTE),
            hour: decode_hour(raw[2]),
            day: bcd::decode(raw[3] & mask::DATE),
            month: bcd::decode(raw[4] & mask::MONTH),
            day_of_week: raw[5] & mask::DAY_OF_WEEK,
            year: bcd::decode(raw[6]),
        }
    }

    /// Register images with the clock running (halt flag clear)
    fn to_registers(&self, mode: HourMode) -> [u8; 7] {
        [
            bcd::encode(self.second),
            bcd::encode(self.minute),
            encode_hour(self.hour, mode),
            bcd::encode(self.day),
            bcd::encode(self.month),
            self.day_of_week & mask::DAY_OF_WEEK,
            bcd::encode(self.year),
        ]
    }
}

fn burst_length(len: usize) -> u8 {
    u8::try_from(len).unwrap_or(u8::MAX)
}

fn hour_mode(raw: u8) -> HourMode {
    if raw & flag::HOUR_12 != 0 {
        HourMode::Twelve
    } else {
        HourMode::TwentyFour
    }
}

fn decode_hour(raw: u8) -> u8 {
    match hour_mode(raw) {
        HourMode::TwentyFour => bcd::decode(raw & mask::HOUR_24),
        HourMode::Twelve => {
            let hour = bcd::decode(raw & mask::HOUR_12) % 12;
            if raw & flag::PM != 0 {
                hour + 12
            } else {
                hour
            }
        }
    }
}

fn encode_hour(hour: u8, mode: HourMode) -> u8 {
    match mode {
        HourMode::TwentyFour => bcd::encode(hour),
        HourMode::Twelve => {
            let pm = if hour >= 12 { flag::PM } else { 0 };
            let hour = match hour % 12 {
                0 => 12,
                h => h,
            };
            flag::HOUR_12 | pm | bcd::encode(hour)
        }
    }
}

/// Bit banging DS1302 driver
pub struct Ds1302<CE, IO, CLK, T>
where
    CE: OutputPin,
    IO: IoLine,
    CLK: OutputPin,
    T: CountDown + Periodic,
{
    ce: CE,
    io: IO,
    clk: CLK,
    timer: T,
}

impl<CE, IO, CLK, T, E> Ds1302<CE, IO, CLK, T>
where
    CE: OutputPin<Error = E>,
    IO: IoLine<Error = E>,
    CLK: OutputPin<Error = E>,
    T: CountDown + Periodic,
{
    /// Create instance and put the interface in its idle state
    pub fn new(ce: CE, io: IO, clk: CLK, timer: T) -> Result<Self, Error<E>> {
        let mut rtc = Ds1302 { ce, io, clk, timer };
        rtc.init()?;
        Ok(rtc)
    }

    /// Give back the pins and the timer
    pub fn release(self) -> (CE, IO, CLK, T) {
        (self.ce, self.io, self.clk, self.timer)
    }

    /// Chip enable off, clock low, data line released
    pub fn init(&mut self) -> Result<(), Error<E>> {
        self.ce.set_low().map_err(Error::Bus)?;
        self.clk.set_low().map_err(Error::Bus)?;
        self.io.set_direction(Direction::Input).map_err(Error::Bus)
    }

    /// Read date and time in one burst
    pub fn read_time(&mut self) -> Result<TimeReading, Error<E>> {
        let mut raw = [0u8; 7];

        self.begin_communication(register::CLOCK_BURST, Direction::Input)?;
        for byte in raw.iter_mut() {
            *byte = self.read_byte()?;
        }
        self.end_communication()?;

        let time = TimeReading::from_registers(&raw);
        debug!("ds1302: read {:?}", time);
        Ok(time)
    }

    /// Set date and time in one burst and start the clock.
    ///
    /// The chip keeps its current hour mode. Write protection is lifted for
    /// the burst and restored by its eighth byte.
    pub fn write_time(&mut self, time: &TimeReading) -> Result<(), Error<E>> {
        let mode = self.clock_mode()?;
        let raw = time.to_registers(mode);
        debug!("ds1302: write {:?} ({:?})", time, mode);

        self.set_write_protect(false)?;

        self.begin_communication(register::CLOCK_BURST, Direction::Output)?;
        for byte in raw.iter() {
            self.write_byte(*byte)?;
        }
        self.write_byte(flag::WRITE_PROTECT)?;
        self.end_communication()
    }

    /// Hour mode the chip is currently in
    pub fn clock_mode(&mut self) -> Result<HourMode, Error<E>> {
        let raw = self.read_register(register::HOUR)?;
        Ok(hour_mode(raw))
    }

    /// Switch between 12 and 24 hour format, keeping the current hour
    pub fn set_clock_mode(&mut self, mode: HourMode) -> Result<(), Error<E>> {
        let raw = self.read_register(register::HOUR)?;
        let hour = encode_hour(decode_hour(raw), mode);
        self.write_protected_register(register::HOUR, hour)
    }

    /// Set the clock halt flag, freezing the time registers
    pub fn stop_clock(&mut self) -> Result<(), Error<E>> {
        let seconds = self.read_register(register::SECOND)?;
        self.write_protected_register(register::SECOND, seconds | flag::CLOCK_HALT)
    }

    /// Clear the clock halt flag
    pub fn start_clock(&mut self) -> Result<(), Error<E>> {
        let seconds = self.read_register(register::SECOND)?;
        self.write_protected_register(register::SECOND, seconds & !flag::CLOCK_HALT)
    }

    /// Whether the clock halt flag is set
    pub fn is_halted(&mut self) -> Result<bool, Error<E>> {
        Ok(self.read_register(register::SECOND)? & flag::CLOCK_HALT != 0)
    }

    /// Set or clear the write protect flag
    pub fn set_write_protect(&mut self, enabled: bool) -> Result<(), Error<E>> {
        let value = if enabled { flag::WRITE_PROTECT } else { 0 };
        self.write_register(register::WRITE_PROTECT, value)
    }

    /// Read one byte of RAM
    pub fn read_ram(&mut self, index: u8) -> Result<u8, Error<E>> {
        if index >= RAM_SIZE {
            return Err(Error::RamIndex(index));
        }
        self.read_register(register::RAM | (index << 1))
    }

    /// Write one byte of RAM
    pub fn write_ram(&mut self, index: u8, value: u8) -> Result<(), Error<E>> {
        if index >= RAM_SIZE {
            return Err(Error::RamIndex(index));
        }
        self.write_protected_register(register::RAM | (index << 1), value)
    }

    /// Read the first `buffer.len()` RAM bytes in one burst
    pub fn read_ram_burst(&mut self, buffer: &mut [u8]) -> Result<(), Error<E>> {
        if buffer.len() > usize::from(RAM_SIZE) {
            return Err(Error::RamIndex(burst_length(buffer.len())));
        }

        self.begin_communication(register::RAM_BURST, Direction::Input)?;
        for byte in buffer.iter_mut() {
            *byte = self.read_byte()?;
        }
        self.end_communication()
    }

    /// Write `data` to the start of RAM in one burst
    pub fn write_ram_burst(&mut self, data: &[u8]) -> Result<(), Error<E>> {
        if data.len() > usize::from(RAM_SIZE) {
            return Err(Error::RamIndex(burst_length(data.len())));
        }

        self.set_write_protect(false)?;
        self.begin_communication(register::RAM_BURST, Direction::Output)?;
        for byte in data {
            self.write_byte(*byte)?;
        }
        self.end_communication()?;
        self.set_write_protect(true)
    }

    /// Read a single register (command byte in write form)
    pub fn read_register(&mut self, register: u8) -> Result<u8, Error<E>> {
        self.begin_communication(register, Direction::Input)?;
        let value = self.read_byte()?;
        self.end_communication()?;
        Ok(value)
    }

    /// Write a single register (command byte in write form).
    ///
    /// Has no effect on the chip while write protection is on, except for the
    /// write protect register itself.
    pub fn write_register(&mut self, register: u8, value: u8) -> Result<(), Error<E>> {
        self.begin_communication(register, Direction::Output)?;
        self.write_byte(value)?;
        self.end_communication()
    }

    /// Open a transaction: chip enable, command byte, then turn the data line
    /// to `direction` (`Input` to read from the chip).
    pub fn begin_communication(&mut self, register: u8, direction: Direction) -> Result<(), Error<E>> {
        let command = match direction {
            Direction::Input => register::COMMAND | register | register::READ,
            Direction::Output => (register::COMMAND | register) & !register::READ,
        };
        trace!("ds1302: command {:#04x}", command);

        self.io.set_direction(Direction::Output).map_err(Error::Bus)?;
        self.ce.set_high().map_err(Error::Bus)?;
        self.wait_ticks(CE_SETUP_TICKS);

        self.write_byte(command)?;

        self.io.set_direction(direction).map_err(Error::Bus)
    }

    /// Close the transaction and release the data line
    pub fn end_communication(&mut self) -> Result<(), Error<E>> {
        self.ce.set_low().map_err(Error::Bus)?;
        self.wait_ticks(CE_SETUP_TICKS);
        self.io.set_direction(Direction::Input).map_err(Error::Bus)
    }

    /// Shift out one byte, least significant bit first
    pub fn write_byte(&mut self, byte: u8) -> Result<(), Error<E>> {
        for bit_offset in 0..8 {
            self.io.set_level((byte >> bit_offset) & 0b1 == 1).map_err(Error::Bus)?;
            self.clock_pulse()?;
        }
        Ok(())
    }

    /// Shift in one byte, least significant bit first
    pub fn read_byte(&mut self) -> Result<u8, Error<E>> {
        let mut byte: u8 = 0;
        for bit_offset in 0..8 {
            if self.io.is_high().map_err(Error::Bus)? {
                byte |= 1 << bit_offset;
            }
            self.clock_pulse()?;
        }
        Ok(byte)
    }

    fn write_protected_register(&mut self, register: u8, value: u8) -> Result<(), Error<E>> {
        self.set_write_protect(false)?;
        self.write_register(register, value)?;
        self.set_write_protect(true)
    }

    #[inline]
    fn clock_pulse(&mut self) -> Result<(), Error<E>> {
        self.clk.set_high().map_err(Error::Bus)?;
        self.wait_for_clk();

        self.clk.set_low().map_err(Error::Bus)?;
        self.wait_for_clk();

        Ok(())
    }

    #[inline]
    fn wait_ticks(&mut self, ticks: u8) {
        for _ in 0..ticks {
            self.wait_for_clk();
        }
    }

    #[inline]
    fn wait_for_clk(&mut self) {
        block!(self.timer.wait()).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{self, MockTimer};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec::Vec;

    /// Register file and shift logic of the chip, driven by the pin edges
    #[derive(Default)]
    struct ChipSim {
        clock: [u8; 8],
        ram: [u8; 31],
        ce: bool,
        clk: bool,
        host_io: bool,
        host_dir: Option<Direction>,
        chip_io: bool,
        shift: u8,
        bits: u8,
        command: Option<u8>,
        index: usize,
        read_bits: usize,
        commands: Vec<u8>,
    }

    impl ChipSim {
        fn new() -> Self {
            let mut sim = ChipSim::default();
            sim.clock[7] = flag::WRITE_PROTECT;
            sim
        }

        fn is_burst(command: u8) -> bool {
            (command >> 1) & 0x1F == 31
        }

        fn slot(&mut self, command: u8, index: usize) -> Option<&mut u8> {
            let address = usize::from((command >> 1) & 0x1F);
            let ram = command & 0x40 != 0;
            let position = if Self::is_burst(command) {
                index
            } else if index == 0 {
                address
            } else {
                return None;
            };
            if ram {
                self.ram.get_mut(position)
            } else {
                self.clock.get_mut(position)
            }
        }

        fn set_ce(&mut self, high: bool) {
            if high && !self.ce {
                assert!(!self.clk, "clock must be low when chip enable rises");
                self.shift = 0;
                self.bits = 0;
                self.command = None;
                self.index = 0;
                self.read_bits = 0;
            }
            self.ce = high;
        }

        fn set_clk(&mut self, high: bool) {
            let rising = high && !self.clk;
            let falling = !high && self.clk;
            self.clk = high;
            if !self.ce {
                return;
            }

            let reading = matches!(self.command, Some(c) if c & register::READ != 0);
            if rising && !reading {
                assert_eq!(self.host_dir, Some(Direction::Output), "host must drive the line");
                self.shift |= (self.host_io as u8) << self.bits;
                self.bits += 1;
                if self.bits == 8 {
                    let byte = self.shift;
                    self.shift = 0;
                    self.bits = 0;
                    match self.command {
                        None => {
                            self.commands.push(byte);
                            self.command = Some(byte);
                        }
                        Some(command) => {
                            self.store(command, byte);
                            self.index += 1;
                        }
                    }
                }
            }

            if falling && reading {
                let command = self.command.unwrap_or_default();
                let index = self.read_bits / 8;
                let bit = self.read_bits % 8;
                let byte = self.slot(command, index).map(|b| *b).unwrap_or(0);
                self.chip_io = (byte >> bit) & 1 == 1;
                self.read_bits += 1;
            }
        }

        fn store(&mut self, command: u8, byte: u8) {
            let ram = command & 0x40 != 0;
            let write_protect_register = !ram && (Self::is_burst(command) && self.index == 7
                || (command >> 1) & 0x1F == 7);
            if self.clock[7] & flag::WRITE_PROTECT != 0 && !write_protect_register {
                return;
            }
            let index = self.index;
            if let Some(slot) = self.slot(command, index) {
                *slot = byte;
            }
        }
    }

    type Shared = Rc<RefCell<ChipSim>>;

    struct SimCe(Shared);
    struct SimClk(Shared);
    struct SimIo(Shared, Direction);

    impl OutputPin for SimCe {
        type Error = ();
        fn set_low(&mut self) -> Result<(), ()> {
            self.0.borrow_mut().set_ce(false);
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), ()> {
            self.0.borrow_mut().set_ce(true);
            Ok(())
        }
    }

    impl OutputPin for SimClk {
        type Error = ();
        fn set_low(&mut self) -> Result<(), ()> {
            self.0.borrow_mut().set_clk(false);
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), ()> {
            self.0.borrow_mut().set_clk(true);
            Ok(())
        }
    }

    impl IoLine for SimIo {
        type Error = ();

        fn set_high(&mut self) -> Result<(), ()> {
            self.0.borrow_mut().host_io = true;
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), ()> {
            self.0.borrow_mut().host_io = false;
            Ok(())
        }

        fn is_high(&self) -> Result<bool, ()> {
            let sim = self.0.borrow();
            match self.1 {
                Direction::Input => Ok(sim.chip_io),
                Direction::Output => Ok(sim.host_io),
            }
        }

        fn set_direction(&mut self, direction: Direction) -> Result<(), ()> {
            self.1 = direction;
            self.0.borrow_mut().host_dir = Some(direction);
            Ok(())
        }

        fn direction(&self) -> Direction {
            self.1
        }
    }

    type Rtc = Ds1302<SimCe, SimIo, SimClk, MockTimer>;

    fn rtc() -> (Rtc, Shared) {
        let sim = Rc::new(RefCell::new(ChipSim::new()));
        let clock = mock::clock();
        let rtc = Ds1302::new(
            SimCe(sim.clone()),
            SimIo(sim.clone(), Direction::Output),
            SimClk(sim.clone()),
            MockTimer::new(&clock),
        )
        .unwrap();
        (rtc, sim)
    }

    fn sample_time() -> TimeReading {
        TimeReading {
            second: 45,
            minute: 30,
            hour: 13,
            day: 5,
            month: 6,
            day_of_week: 3,
            year: 24,
        }
    }

    #[test]
    fn test_write_then_read_time() {
        let (mut rtc, sim) = rtc();

        rtc.write_time(&sample_time()).unwrap();
        assert_eq!(rtc.read_time().unwrap(), sample_time());

        let sim = sim.borrow();
        assert_eq!(&sim.clock[..7], &[0x45, 0x30, 0x13, 0x05, 0x06, 0x03, 0x24]);
        assert_eq!(sim.clock[7], flag::WRITE_PROTECT);
        assert!(!sim.ce);
    }

    #[test]
    fn test_write_time_transactions() {
        let (mut rtc, sim) = rtc();

        rtc.write_time(&sample_time()).unwrap();
        rtc.read_time().unwrap();

        // hour mode lookup, write protect off, burst write, burst read
        assert_eq!(sim.borrow().commands, vec![0x85, 0x8E, 0xBE, 0xBF]);
    }

    #[test]
    fn test_bytes_are_lsb_first() {
        let (mut rtc, sim) = rtc();
        sim.borrow_mut().clock[1] = 0x01;

        assert_eq!(rtc.read_register(register::MINUTE).unwrap(), 0x01);
        assert_eq!(sim.borrow().commands, vec![0x83]);
    }

    #[test]
    fn test_read_masks_control_bits() {
        let (mut rtc, sim) = rtc();
        sim.borrow_mut().clock[..7].copy_from_slice(&[0x80 | 0x59, 0x07, 0x23, 0x31, 0x12, 0xF7, 0x99]);

        let time = rtc.read_time().unwrap();
        assert_eq!(
            time,
            TimeReading {
                second: 59,
                minute: 7,
                hour: 23,
                day: 31,
                month: 12,
                day_of_week: 7,
                year: 99,
            }
        );
    }

    #[test]
    fn test_read_unset_registers() {
        let (mut rtc, sim) = rtc();
        sim.borrow_mut().clock[..7].copy_from_slice(&[0xFF; 7]);

        // nibbles above 9 read as 9
        let time = rtc.read_time().unwrap();
        assert_eq!(
            time,
            TimeReading {
                second: 79,
                minute: 79,
                hour: 19,
                day: 39,
                month: 19,
                day_of_week: 7,
                year: 99,
            }
        );
    }

    #[test]
    fn test_twelve_hour_mode() {
        let (mut rtc, sim) = rtc();
        rtc.write_time(&sample_time()).unwrap();

        rtc.set_clock_mode(HourMode::Twelve).unwrap();
        assert_eq!(sim.borrow().clock[2], flag::HOUR_12 | flag::PM | 0x01);
        assert_eq!(rtc.clock_mode().unwrap(), HourMode::Twelve);
        assert_eq!(rtc.read_time().unwrap().hour, 13);

        // writes keep the chip's mode
        let midnight = TimeReading {
            hour: 0,
            ..sample_time()
        };
        rtc.write_time(&midnight).unwrap();
        assert_eq!(sim.borrow().clock[2], flag::HOUR_12 | 0x12);
        assert_eq!(rtc.read_time().unwrap().hour, 0);

        rtc.set_clock_mode(HourMode::TwentyFour).unwrap();
        assert_eq!(sim.borrow().clock[2], 0x00);
        assert_eq!(sim.borrow().clock[7], flag::WRITE_PROTECT);
    }

    #[test]
    fn test_hour_conversion() {
        for hour in 0..24 {
            for mode in [HourMode::TwentyFour, HourMode::Twelve].iter() {
                assert_eq!(decode_hour(encode_hour(hour, *mode)), hour);
            }
        }
        assert_eq!(encode_hour(12, HourMode::Twelve), flag::HOUR_12 | flag::PM | 0x12);
    }

    #[test]
    fn test_stop_and_start_clock() {
        let (mut rtc, sim) = rtc();
        rtc.write_time(&sample_time()).unwrap();
        assert!(!rtc.is_halted().unwrap());

        rtc.stop_clock().unwrap();
        assert!(rtc.is_halted().unwrap());
        assert_eq!(sim.borrow().clock[0], flag::CLOCK_HALT | 0x45);
        assert_eq!(rtc.read_time().unwrap().second, 45);

        rtc.start_clock().unwrap();
        assert!(!rtc.is_halted().unwrap());
        assert_eq!(sim.borrow().clock[0], 0x45);
        assert_eq!(sim.borrow().clock[7], flag::WRITE_PROTECT);
    }

    #[test]
    fn test_write_protect_gates_writes() {
        let (mut rtc, sim) = rtc();

        rtc.write_register(register::MINUTE, 0x12).unwrap();
        assert_eq!(sim.borrow().clock[1], 0x00);

        rtc.set_write_protect(false).unwrap();
        rtc.write_register(register::MINUTE, 0x12).unwrap();
        assert_eq!(sim.borrow().clock[1], 0x12);
    }

    #[test]
    fn test_ram() {
        let (mut rtc, sim) = rtc();

        rtc.write_ram(3, 0xA5).unwrap();
        assert_eq!(sim.borrow().ram[3], 0xA5);
        assert_eq!(rtc.read_ram(3).unwrap(), 0xA5);
        assert_eq!(rtc.read_ram(RAM_SIZE), Err(Error::RamIndex(RAM_SIZE)));
        assert_eq!(rtc.write_ram(40, 0), Err(Error::RamIndex(40)));

        rtc.write_ram_burst(&[1, 2, 3, 4]).unwrap();
        let mut buffer = [0u8; 4];
        rtc.read_ram_burst(&mut buffer).unwrap();
        assert_eq!(buffer, [1, 2, 3, 4]);
        assert_eq!(sim.borrow().clock[7], flag::WRITE_PROTECT);
    }

    #[test]
    fn test_ram_burst_length() {
        let (mut rtc, sim) = rtc();

        let mut buffer = [0u8; 32];
        assert_eq!(rtc.read_ram_burst(&mut buffer), Err(Error::RamIndex(32)));
        assert_eq!(rtc.write_ram_burst(&[0u8; 256]), Err(Error::RamIndex(255)));
        assert_eq!(rtc.write_ram_burst(&[0u8; 300]), Err(Error::RamIndex(255)));
        assert!(sim.borrow().commands.is_empty());
    }

    #[test]
    fn test_clock_pulses_use_timer() {
        let (mut rtc, _sim) = rtc();

        rtc.read_register(register::SECOND).unwrap();
        let (_, io, _, timer) = rtc.release();
        // 16 bits at two ticks each, plus setup and hold
        assert_eq!(timer.ticks, 16 * 2 + 2 * u64::from(CE_SETUP_TICKS));
        assert_eq!(io.direction(), Direction::Input);
    }
}
