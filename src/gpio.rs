/*!
  # Single line control with explicit direction

  The drivers in this crate need lines that change direction in the middle of
  a transaction (the DHT11 data line, the DS1302 I/O line). Those lines are
  handed to the drivers as an [`IoLine`]. Output-only lines (chip enable,
  clocks, display control and data bus) are plain
  [`embedded_hal::digital::v2::OutputPin`]s.

  Two handles are provided:
  - [`PortPin`]: one bit of an AVR-style port with direction (DDR), output
    (PORT) and input (PIN) registers, reached through [`PortRegisters`].
  - [`OpenDrainLine`]: any HAL pin configured as open-drain output with a
    pull-up. Input direction releases the line.
*/

use core::convert::Infallible;
use embedded_hal::digital::v2::{InputPin, OutputPin, StatefulOutputPin, ToggleableOutputPin};

/// Line direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// The line is sampled
    Input,
    /// The line is driven
    Output,
}

/// A digital line whose direction can be switched at runtime.
///
/// Implementations must apply a direction change before returning from
/// [`IoLine::set_direction`], and [`IoLine::direction`] must always report the
/// direction last applied to the hardware.
pub trait IoLine {
    /// Error raised by the underlying pin
    type Error;

    /// Drive the line high
    fn set_high(&mut self) -> Result<(), Self::Error>;

    /// Drive the line low
    fn set_low(&mut self) -> Result<(), Self::Error>;

    /// Sample the line
    fn is_high(&self) -> Result<bool, Self::Error>;

    /// Switch the line direction
    fn set_direction(&mut self, direction: Direction) -> Result<(), Self::Error>;

    /// Direction currently applied to the line
    fn direction(&self) -> Direction;

    /// Drive the line to `high`
    fn set_level(&mut self, high: bool) -> Result<(), Self::Error> {
        if high {
            self.set_high()
        } else {
            self.set_low()
        }
    }

    /// Sample the line, inverted
    fn is_low(&self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

/// Register of an 8-bit I/O port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// Data direction register, bit set = output
    Direction,
    /// Output latch
    Output,
    /// Input sampling register
    Input,
}

/// Access to the registers of one 8-bit port.
///
/// On a real target this is a zero sized type doing volatile accesses to the
/// port's memory mapped registers. Several [`PortPin`]s may share one port;
/// each of them only ever touches its own bit.
pub trait PortRegisters {
    /// Read a whole register
    fn read(&self, register: Register) -> u8;

    /// Write a whole register
    fn write(&self, register: Register, value: u8);

    /// Read-modify-write a register: set the bits in `mask` if `set`, clear them otherwise
    fn modify(&self, register: Register, mask: u8, set: bool) {
        let value = self.read(register);
        if set {
            self.write(register, value | mask);
        } else {
            self.write(register, value & !mask);
        }
    }
}

impl<T: PortRegisters + ?Sized> PortRegisters for &T {
    fn read(&self, register: Register) -> u8 {
        (**self).read(register)
    }

    fn write(&self, register: Register, value: u8) {
        (**self).write(register, value)
    }
}

/// One bit of an I/O port, with its direction tracked alongside the DDR bit
pub struct PortPin<R>
where
    R: PortRegisters,
{
    port: R,
    bit: u8,
    direction: Direction,
}

impl<R> PortPin<R>
where
    R: PortRegisters,
{
    /// Take bit `bit` (0-7) of `port`.
    ///
    /// The cached direction is loaded from the DDR bit so the two start out
    /// equal.
    pub fn new(port: R, bit: u8) -> Self {
        debug_assert!(bit < 8, "port bit index out of range");
        let bit = bit & 0x07;
        let direction = if port.read(Register::Direction) & (1 << bit) != 0 {
            Direction::Output
        } else {
            Direction::Input
        };
        PortPin {
            port,
            bit,
            direction,
        }
    }

    /// Bit index of this pin within its port
    pub fn bit(&self) -> u8 {
        self.bit
    }

    /// Give the port back
    pub fn release(self) -> R {
        self.port
    }

    #[inline]
    fn mask(&self) -> u8 {
        1 << self.bit
    }
}

impl<R> IoLine for PortPin<R>
where
    R: PortRegisters,
{
    type Error = Infallible;

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.port.modify(Register::Output, self.mask(), true);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.port.modify(Register::Output, self.mask(), false);
        Ok(())
    }

    fn is_high(&self) -> Result<bool, Infallible> {
        Ok(self.port.read(Register::Input) & self.mask() != 0)
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), Infallible> {
        self.port
            .modify(Register::Direction, self.mask(), direction == Direction::Output);
        self.direction = direction;
        Ok(())
    }

    fn direction(&self) -> Direction {
        self.direction
    }
}

impl<R> OutputPin for PortPin<R>
where
    R: PortRegisters,
{
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        IoLine::set_low(self)
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        IoLine::set_high(self)
    }
}

impl<R> StatefulOutputPin for PortPin<R>
where
    R: PortRegisters,
{
    fn is_set_high(&self) -> Result<bool, Infallible> {
        Ok(self.port.read(Register::Output) & self.mask() != 0)
    }

    fn is_set_low(&self) -> Result<bool, Infallible> {
        self.is_set_high().map(|high| !high)
    }
}

impl<R> ToggleableOutputPin for PortPin<R>
where
    R: PortRegisters,
{
    type Error = Infallible;

    fn toggle(&mut self) -> Result<(), Infallible> {
        let value = self.port.read(Register::Output);
        self.port.write(Register::Output, value ^ self.mask());
        Ok(())
    }
}

impl<R> InputPin for PortPin<R>
where
    R: PortRegisters,
{
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Infallible> {
        IoLine::is_high(self)
    }

    fn is_low(&self) -> Result<bool, Infallible> {
        IoLine::is_low(self)
    }
}

/// Open-drain pin used as a bidirectional line.
///
/// The line needs a pull-up. Switching to [`Direction::Input`] releases the
/// line (output latch high) so the remote device can pull it low.
pub struct OpenDrainLine<P> {
    pin: P,
    direction: Direction,
}

impl<P, E> OpenDrainLine<P>
where
    P: OutputPin<Error = E> + InputPin<Error = E>,
{
    /// Wrap `pin`, releasing the line
    pub fn new(mut pin: P) -> Result<Self, E> {
        pin.set_high()?;
        Ok(OpenDrainLine {
            pin,
            direction: Direction::Input,
        })
    }

    /// Give the pin back
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P, E> IoLine for OpenDrainLine<P>
where
    P: OutputPin<Error = E> + InputPin<Error = E>,
{
    type Error = E;

    fn set_high(&mut self) -> Result<(), E> {
        self.pin.set_high()
    }

    fn set_low(&mut self) -> Result<(), E> {
        self.pin.set_low()
    }

    fn is_high(&self) -> Result<bool, E> {
        self.pin.is_high()
    }

    fn set_direction(&mut self, direction: Direction) -> Result<(), E> {
        if direction == Direction::Input {
            self.pin.set_high()?;
        }
        self.direction = direction;
        Ok(())
    }

    fn direction(&self) -> Direction {
        self.direction
    }
}
