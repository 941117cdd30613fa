/*!
  # HD44780 character display over a parallel bus

  The display latches the bus on the falling edge of the enable line. Register
  select chooses between instructions (low) and character data (high); the
  read/write line is held low since the driver never reads back.

  With a [`FourBitBus`] each byte is sent as two strobes, high nibble first.
  With an [`EightBitBus`] each byte is one strobe.

  Entry mode and display control are kept in a cache and rewritten whole on
  every change, so setting one flag preserves the others.

  ## Example

  ```no_run
    use bitbang_drivers::hd44780::{Config, FourBitBus, Hd44780};
    # fn demo<P, D>(rs: P, rw: P, en: P, d4: P, d5: P, d6: P, d7: P, delay: D)
    # where
    #     P: embedded_hal::digital::v2::OutputPin,
    #     P::Error: core::fmt::Debug,
    #     D: embedded_hal::blocking::delay::DelayUs<u16> + embedded_hal::blocking::delay::DelayMs<u16>,
    # {
    let bus = FourBitBus::new(d4, d5, d6, d7);
    let mut lcd = Hd44780::new(rs, rw, en, bus, delay, Config::default()).unwrap();

    lcd.set_cursor_position(1, 0).unwrap();
    lcd.print("Hello, World!").unwrap();
    # }
  ```
*/

pub mod bus;
pub mod command;
mod state;

use core::fmt;

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use embedded_hal::digital::v2::OutputPin;
use log::{debug, trace};

pub use self::bus::{BusWidth, DataBus, EightBitBus, FourBitBus};
use self::state::{Cached, CommandState};

/// Bus timing in microseconds (milliseconds where noted)
pub mod timing {
    /// Wait after power up in milliseconds (datasheet: at least 40 ms)
    pub const POWER_ON_MS: u16 = 50;
    /// Wait after the first wake up instruction in milliseconds (at least 4.1 ms)
    pub const RESYNC_FIRST_MS: u16 = 5;
    /// Wait after the following wake up instructions (at least 100 µs)
    pub const RESYNC_US: u16 = 100;
    /// Enable high time (at least 450 ns)
    pub const ENABLE_PULSE_US: u16 = 1;
    /// Wait after each strobe for the instruction to execute (at least 37 µs)
    pub const SETTLE_US: u16 = 40;
    /// Execution time of clear display and return home in milliseconds (1.52 ms)
    pub const CLEAR_MS: u16 = 2;
}

/// HD44780 error
#[derive(Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// GPIO error
    Bus(E),
    /// Custom character slot above 7
    CharLocation(u8),
}

/// Character font
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Font {
    /// 5x8 dots
    Dots5x8,
    /// 5x10 dots, single line displays only
    Dots5x10,
}

/// Display geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Visible rows, 1-4
    pub rows: u8,
    /// Visible columns, 1-40, or 1-20 with more than two rows
    pub cols: u8,
    /// Character font
    pub font: Font,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            rows: 2,
            cols: 16,
            font: Font::Dots5x8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Command,
    Data,
}

/// Bit banging HD44780 driver
pub struct Hd44780<RS, RW, EN, B, D>
where
    RS: OutputPin,
    RW: OutputPin,
    EN: OutputPin,
    B: DataBus,
    D: DelayUs<u16> + DelayMs<u16>,
{
    rs: RS,
    rw: RW,
    en: EN,
    bus: B,
    delay: D,
    state: CommandState,
}

impl<RS, RW, EN, B, D, E> Hd44780<RS, RW, EN, B, D>
where
    RS: OutputPin<Error = E>,
    RW: OutputPin<Error = E>,
    EN: OutputPin<Error = E>,
    B: DataBus<Error = E>,
    D: DelayUs<u16> + DelayMs<u16>,
{
    /// Create instance and run the power-on initialization.
    ///
    /// Afterwards the display is on and cleared, cursor and blink off, text
    /// runs left to right without display shift.
    pub fn new(rs: RS, rw: RW, en: EN, bus: B, delay: D, config: Config) -> Result<Self, Error<E>> {
        let mut lcd = Hd44780 {
            rs,
            rw,
            en,
            bus,
            delay,
            state: CommandState::new(&config, B::WIDTH),
        };
        lcd.init()?;
        Ok(lcd)
    }

    /// Give back the pins, the bus and the delay
    pub fn release(self) -> (RS, RW, EN, B, D) {
        (self.rs, self.rw, self.en, self.bus, self.delay)
    }

    fn init(&mut self) -> Result<(), Error<E>> {
        debug!(
            "hd44780: init {:?} bus, {}x{}",
            B::WIDTH,
            self.state.rows(),
            self.state.cols()
        );
        self.delay.delay_ms(timing::POWER_ON_MS);

        self.rs.set_low().map_err(Error::Bus)?;
        self.rw.set_low().map_err(Error::Bus)?;
        self.en.set_low().map_err(Error::Bus)?;

        // The interface width is unknown at power up. Three 8-bit function
        // sets put the display in 8-bit mode from any state.
        let wake = match B::WIDTH {
            BusWidth::Four => (command::FUNCTION_SET | command::function::EIGHT_BIT_BUS) >> 4,
            BusWidth::Eight => command::FUNCTION_SET | command::function::EIGHT_BIT_BUS,
        };
        self.write_bus(wake)?;
        self.delay.delay_ms(timing::RESYNC_FIRST_MS);
        self.write_bus(wake)?;
        self.delay.delay_us(timing::RESYNC_US);
        self.write_bus(wake)?;
        self.delay.delay_us(timing::RESYNC_US);

        if B::WIDTH == BusWidth::Four {
            self.write_bus(command::FUNCTION_SET >> 4)?;
            self.delay.delay_us(timing::RESYNC_US);
        }

        self.command(self.state.function_set())?;
        self.command(self.state.get(Cached::DisplayControl))?;
        self.command(command::CLEAR_DISPLAY)?;
        self.delay.delay_ms(timing::CLEAR_MS);
        self.command(self.state.get(Cached::EntryMode))
    }

    /// Clear the display and move the cursor home.
    ///
    /// The display resets its text direction on clear, so the cached entry
    /// mode is sent again afterwards.
    pub fn clear_display(&mut self) -> Result<(), Error<E>> {
        self.command(command::CLEAR_DISPLAY)?;
        self.delay.delay_ms(timing::CLEAR_MS);
        self.command(self.state.get(Cached::EntryMode))
    }

    /// Move the cursor home and undo any display shift
    pub fn return_home(&mut self) -> Result<(), Error<E>> {
        self.command(command::RETURN_HOME)?;
        self.delay.delay_ms(timing::CLEAR_MS);
        Ok(())
    }

    /// Text runs left to right
    pub fn text_left_to_right(&mut self) -> Result<(), Error<E>> {
        self.update(Cached::EntryMode, command::entry::INCREMENT, true)
    }

    /// Text runs right to left
    pub fn text_right_to_left(&mut self) -> Result<(), Error<E>> {
        self.update(Cached::EntryMode, command::entry::INCREMENT, false)
    }

    /// Shift the whole display on each character written, in the text direction
    pub fn auto_shift_on(&mut self) -> Result<(), Error<E>> {
        self.update(Cached::EntryMode, command::entry::AUTO_SHIFT, true)
    }

    /// Keep the display still while writing
    pub fn auto_shift_off(&mut self) -> Result<(), Error<E>> {
        self.update(Cached::EntryMode, command::entry::AUTO_SHIFT, false)
    }

    /// Turn the display on
    pub fn display_on(&mut self) -> Result<(), Error<E>> {
        self.update(Cached::DisplayControl, command::display::DISPLAY_ON, true)
    }

    /// Turn the display off, keeping its contents
    pub fn display_off(&mut self) -> Result<(), Error<E>> {
        self.update(Cached::DisplayControl, command::display::DISPLAY_ON, false)
    }

    /// Show the underline cursor
    pub fn cursor_on(&mut self) -> Result<(), Error<E>> {
        self.update(Cached::DisplayControl, command::display::CURSOR_ON, true)
    }

    /// Hide the underline cursor
    pub fn cursor_off(&mut self) -> Result<(), Error<E>> {
        self.update(Cached::DisplayControl, command::display::CURSOR_ON, false)
    }

    /// Blink the character at the cursor
    pub fn blink_on(&mut self) -> Result<(), Error<E>> {
        self.update(Cached::DisplayControl, command::display::BLINK_ON, true)
    }

    /// Stop blinking
    pub fn blink_off(&mut self) -> Result<(), Error<E>> {
        self.update(Cached::DisplayControl, command::display::BLINK_ON, false)
    }

    /// Move the cursor one position left
    pub fn shift_cursor_left(&mut self) -> Result<(), Error<E>> {
        self.command(command::CURSOR_SHIFT)
    }

    /// Move the cursor one position right
    pub fn shift_cursor_right(&mut self) -> Result<(), Error<E>> {
        self.command(command::CURSOR_SHIFT | command::shift::RIGHT)
    }

    /// Shift the display contents left, the cursor follows
    pub fn shift_display_left(&mut self) -> Result<(), Error<E>> {
        self.command(command::CURSOR_SHIFT | command::shift::DISPLAY)
    }

    /// Shift the display contents right, the cursor follows
    pub fn shift_display_right(&mut self) -> Result<(), Error<E>> {
        self.command(command::CURSOR_SHIFT | command::shift::DISPLAY | command::shift::RIGHT)
    }

    /// Move the cursor to `row`, `col`.
    ///
    /// Positions past the last row or column saturate to it.
    pub fn set_cursor_position(&mut self, row: u8, col: u8) -> Result<(), Error<E>> {
        let address = self.state.ddram_address(row, col);
        self.command(command::SET_DDRAM_ADDR | address)
    }

    /// Define custom character `location` (0-7) from eight rows of five dots.
    ///
    /// The cursor moves to the first position afterwards.
    pub fn create_char(&mut self, location: u8, bitmap: &[u8; 8]) -> Result<(), Error<E>> {
        if location > 7 {
            return Err(Error::CharLocation(location));
        }

        self.command(command::SET_CGRAM_ADDR | (location << 3))?;
        for row in bitmap.iter() {
            self.character(row & 0x1F)?;
        }
        self.set_cursor_position(0, 0)
    }

    /// Write text at the cursor, one byte per character cell
    pub fn print(&mut self, text: &str) -> Result<(), Error<E>> {
        for byte in text.bytes() {
            self.character(byte)?;
        }
        Ok(())
    }

    /// Send a raw instruction byte
    pub fn command(&mut self, byte: u8) -> Result<(), Error<E>> {
        self.send(byte, Mode::Command)
    }

    /// Send a raw character byte
    pub fn character(&mut self, byte: u8) -> Result<(), Error<E>> {
        self.send(byte, Mode::Data)
    }

    /// Entry mode byte last sent
    pub fn entry_mode(&self) -> u8 {
        self.state.get(Cached::EntryMode)
    }

    /// Display control byte last sent
    pub fn display_control(&self) -> u8 {
        self.state.get(Cached::DisplayControl)
    }

    /// Function set byte sent during initialization
    pub fn function_set(&self) -> u8 {
        self.state.function_set()
    }

    /// Visible rows
    pub fn rows(&self) -> u8 {
        self.state.rows()
    }

    /// Visible columns
    pub fn cols(&self) -> u8 {
        self.state.cols()
    }

    fn update(&mut self, register: Cached, flag: u8, on: bool) -> Result<(), Error<E>> {
        let value = self.state.with_flag(register, flag, on);
        self.command(value)?;
        self.state.store(register, value);
        Ok(())
    }

    fn send(&mut self, byte: u8, mode: Mode) -> Result<(), Error<E>> {
        trace!("hd44780: {:?} {:#04x}", mode, byte);
        match mode {
            Mode::Command => self.rs.set_low().map_err(Error::Bus)?,
            Mode::Data => self.rs.set_high().map_err(Error::Bus)?,
        }

        match B::WIDTH {
            BusWidth::Four => {
                self.write_bus(byte >> 4)?;
                self.write_bus(byte & 0x0F)
            }
            BusWidth::Eight => self.write_bus(byte),
        }
    }

    #[inline]
    fn write_bus(&mut self, value: u8) -> Result<(), Error<E>> {
        self.bus.write(value).map_err(Error::Bus)?;
        self.enable_pulse()
    }

    #[inline]
    fn enable_pulse(&mut self) -> Result<(), Error<E>> {
        self.en.set_low().map_err(Error::Bus)?;
        self.delay.delay_us(timing::ENABLE_PULSE_US);

        self.en.set_high().map_err(Error::Bus)?;
        self.delay.delay_us(timing::ENABLE_PULSE_US);

        self.en.set_low().map_err(Error::Bus)?;
        self.delay.delay_us(timing::SETTLE_US);

        Ok(())
    }
}

impl<RS, RW, EN, B, D, E> fmt::Write for Hd44780<RS, RW, EN, B, D>
where
    RS: OutputPin<Error = E>,
    RW: OutputPin<Error = E>,
    EN: OutputPin<Error = E>,
    B: DataBus<Error = E>,
    D: DelayUs<u16> + DelayMs<u16>,
{
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.print(s).map_err(|_| fmt::Error)
    }
}
