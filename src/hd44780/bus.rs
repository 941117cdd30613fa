//! Parallel data buses
//!
//! A bus only places a value on its lines; strobing is done by the driver.
//! Line `i` of a bus carries bit `i` of the value written to it.

use embedded_hal::digital::v2::OutputPin;

/// Interface width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusWidth {
    /// DB4-DB7 wired, bytes go out as two nibbles
    Four,
    /// DB0-DB7 wired
    Eight,
}

/// Output lines of the display data bus
pub trait DataBus {
    /// GPIO error
    type Error;

    /// Number of wired data lines
    const WIDTH: BusWidth;

    /// Drive the lines; only the low `WIDTH` bits of `value` are used
    fn write(&mut self, value: u8) -> Result<(), Self::Error>;
}

#[inline]
fn set_line<P: OutputPin>(pin: &mut P, value: u8, bit: u8) -> Result<(), P::Error> {
    if (value >> bit) & 0b1 == 1 {
        pin.set_high()
    } else {
        pin.set_low()
    }
}

/// Bus on display lines DB4-DB7
pub struct FourBitBus<D4, D5, D6, D7> {
    d4: D4,
    d5: D5,
    d6: D6,
    d7: D7,
}

impl<D4, D5, D6, D7, E> FourBitBus<D4, D5, D6, D7>
where
    D4: OutputPin<Error = E>,
    D5: OutputPin<Error = E>,
    D6: OutputPin<Error = E>,
    D7: OutputPin<Error = E>,
{
    /// Create instance
    pub fn new(d4: D4, d5: D5, d6: D6, d7: D7) -> Self {
        FourBitBus { d4, d5, d6, d7 }
    }

    /// Give the pins back
    pub fn release(self) -> (D4, D5, D6, D7) {
        (self.d4, self.d5, self.d6, self.d7)
    }
}

impl<D4, D5, D6, D7, E> DataBus for FourBitBus<D4, D5, D6, D7>
where
    D4: OutputPin<Error = E>,
    D5: OutputPin<Error = E>,
    D6: OutputPin<Error = E>,
    D7: OutputPin<Error = E>,
{
    type Error = E;

    const WIDTH: BusWidth = BusWidth::Four;

    fn write(&mut self, value: u8) -> Result<(), E> {
        set_line(&mut self.d4, value, 0)?;
        set_line(&mut self.d5, value, 1)?;
        set_line(&mut self.d6, value, 2)?;
        set_line(&mut self.d7, value, 3)
    }
}

/// Bus on display lines DB0-DB7
pub struct EightBitBus<D0, D1, D2, D3, D4, D5, D6, D7> {
    d0: D0,
    d1: D1,
    d2: D2,
    d3: D3,
    d4: D4,
    d5: D5,
    d6: D6,
    d7: D7,
}

impl<D0, D1, D2, D3, D4, D5, D6, D7, E> EightBitBus<D0, D1, D2, D3, D4, D5, D6, D7>
where
    D0: OutputPin<Error = E>,
    D1: OutputPin<Error = E>,
    D2: OutputPin<Error = E>,
    D3: OutputPin<Error = E>,
    D4: OutputPin<Error = E>,
    D5: OutputPin<Error = E>,
    D6: OutputPin<Error = E>,
    D7: OutputPin<Error = E>,
{
    /// Create instance
    #[allow(clippy::too_many_arguments)]
    pub fn new(d0: D0, d1: D1, d2: D2, d3: D3, d4: D4, d5: D5, d6: D6, d7: D7) -> Self {
        EightBitBus {
            d0,
            d1,
            d2,
            d3,
            d4,
            d5,
            d6,
            d7,
        }
    }

    /// Give the pins back
    #[allow(clippy::type_complexity)]
    pub fn release(self) -> (D0, D1, D2, D3, D4, D5, D6, D7) {
        (
            self.d0, self.d1, self.d2, self.d3, self.d4, self.d5, self.d6, self.d7,
        )
    }
}

impl<D0, D1, D2, D3, D4, D5, D6, D7, E> DataBus for EightBitBus<D0, D1, D2, D3, D4, D5, D6, D7>
where
    D0: OutputPin<Error = E>,
    D1: OutputPin<Error = E>,
    D2: OutputPin<Error = E>,
    D3: OutputPin<Error = E>,
    D4: OutputPin<Error = E>,
    D5: OutputPin<Error = E>,
    D6: OutputPin<Error = E>,
    D7: OutputPin<Error = E>,
{
    type Error = E;

    const WIDTH: BusWidth = BusWidth::Eight;

    fn write(&mut self, value: u8) -> Result<(), E> {
        set_line(&mut self.d0, value, 0)?;
        set_line(&mut self.d1, value, 1)?;
        set_line(&mut self.d2, value, 2)?;
        set_line(&mut self.d3, value, 3)?;
        set_line(&mut self.d4, value, 4)?;
        set_line(&mut self.d5, value, 5)?;
        set_line(&mut self.d6, value, 6)?;
        set_line(&mut self.d7, value, 7)
    }
}
