/*!
  # DHT11 humidity and temperature sensor

  The sensor talks over a single data line with a pull-up. The host starts a
  transaction by holding the line low, then releases it and listens:

  ```text
  host:   ‾‾‾\______ 20 ms ______/‾‾ 40 µs ‾‾ (switch to input)
  sensor:                                     \__ 80 µs __/‾‾ 80 µs ‾‾\
  bit:    \__ 50 µs __/‾‾ 26-28 µs ‾‾\   = 0
          \__ 50 µs __/‾‾‾‾‾‾ 70 µs ‾‾‾‾‾‾\   = 1
  ```

  Forty bits follow, most significant bit first: humidity integral and
  decimal part, temperature integral and decimal part, checksum. A bit is
  discriminated by sampling the line 30 µs after its rising edge.

  Every wait on the sensor is bounded. A sensor that stops answering results
  in [`Error::Timeout`] instead of a hang.

  This implementation consumes the following hardware resources:
  - One bidirectional line ([`IoLine`](crate::gpio::IoLine))
  - A blocking delay with microsecond resolution

  ## Example

  ```no_run
    use bitbang_drivers::dht11::Dht11;
    # fn demo<L, D>(line: L, delay: D)
    # where
    #     L: bitbang_drivers::gpio::IoLine,
    #     L::Error: core::fmt::Debug,
    #     D: embedded_hal::blocking::delay::DelayUs<u16> + embedded_hal::blocking::delay::DelayMs<u16>,
    # {
    let mut sensor = Dht11::new(line, delay);

    let reading = sensor.read_data().unwrap();
    if reading.is_valid() {
        let (humidity, temperature) = (reading.humidity(), reading.temperature());
    }
    # }
  ```
*/

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use log::{debug, trace, warn};

use crate::gpio::{Direction, IoLine};

/// Protocol timing in microseconds (milliseconds where noted)
pub mod timing {
    /// Start signal low time in milliseconds (datasheet: at least 18 ms)
    pub const START_LOW_MS: u16 = 20;
    /// Start signal high time before releasing the line
    pub const START_HIGH_US: u16 = 40;
    /// Delay after a bit's rising edge before sampling it
    pub const BIT_SAMPLE_US: u16 = 30;
    /// Budget for each of the three response transitions
    pub const RESPONSE_TIMEOUT_US: u32 = 100;
    /// Budget for the low phase preceding each bit
    pub const BIT_START_TIMEOUT_US: u32 = 100;
    /// Budget for the remainder of a bit's high phase
    pub const BIT_END_TIMEOUT_US: u32 = 100;
    /// Polling interval of the bounded waits
    pub const POLL_US: u16 = 1;
}

/// Wait that can time out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// Sensor response after the start signal
    Response,
    /// Rising edge at the start of a bit
    BitStart,
    /// Falling edge at the end of a bit
    BitEnd,
}

/// DHT11 error
#[derive(Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// GPIO error
    Bus(E),
    /// The line did not change level in time
    Timeout(Stage),
}

/// One complete sensor frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReading {
    humidity_integral: u8,
    humidity_decimal: u8,
    temperature_integral: u8,
    temperature_decimal: u8,
    checksum: u8,
    valid: bool,
}

impl SensorReading {
    /// Build a reading from the five bytes of a frame, in wire order
    pub fn from_bytes(bytes: [u8; 5]) -> Self {
        let sum = bytes[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        SensorReading {
            humidity_integral: bytes[0],
            humidity_decimal: bytes[1],
            temperature_integral: bytes[2],
            temperature_decimal: bytes[3],
            checksum: bytes[4],
            valid: sum == bytes[4],
        }
    }

    /// Relative humidity in percent, integral part
    pub fn humidity(&self) -> u8 {
        self.humidity_integral
    }

    /// Relative humidity, decimal part
    pub fn humidity_decimal(&self) -> u8 {
        self.humidity_decimal
    }

    /// Temperature in degrees Celsius, integral part
    pub fn temperature(&self) -> u8 {
        self.temperature_integral
    }

    /// Temperature, decimal part
    pub fn temperature_decimal(&self) -> u8 {
        self.temperature_decimal
    }

    /// Relative humidity in tenths of a percent
    pub fn humidity_tenths(&self) -> u16 {
        u16::from(self.humidity_integral) * 10 + u16::from(self.humidity_decimal % 10)
    }

    /// Temperature in tenths of a degree Celsius
    pub fn temperature_tenths(&self) -> u16 {
        u16::from(self.temperature_integral) * 10 + u16::from(self.temperature_decimal % 10)
    }

    /// Checksum byte as received
    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Whether the checksum matches the sum of the four data bytes (mod 256).
    ///
    /// An invalid reading is still returned by [`Dht11::read_data`]; it is up
    /// to the caller to discard it.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// The raw frame in wire order
    pub fn bytes(&self) -> [u8; 5] {
        [
            self.humidity_integral,
            self.humidity_decimal,
            self.temperature_integral,
            self.temperature_decimal,
            self.checksum,
        ]
    }
}

/// Bit banging DHT11 driver
pub struct Dht11<P, D>
where
    P: IoLine,
    D: DelayUs<u16> + DelayMs<u16>,
{
    line: P,
    delay: D,
}

impl<P, D, E> Dht11<P, D>
where
    P: IoLine<Error = E>,
    D: DelayUs<u16> + DelayMs<u16>,
{
    /// Create instance
    pub fn new(line: P, delay: D) -> Self {
        Dht11 { line, delay }
    }

    /// Give back the line and the delay
    pub fn release(self) -> (P, D) {
        (self.line, self.delay)
    }

    /// Run one transaction and return the decoded frame.
    ///
    /// The checksum is always evaluated; see [`SensorReading::is_valid`].
    pub fn read_data(&mut self) -> Result<SensorReading, Error<E>> {
        self.begin_transfer()?;

        let mut bytes = [0u8; 5];
        for byte in bytes.iter_mut() {
            *byte = self.read_byte()?;
        }

        let reading = SensorReading::from_bytes(bytes);
        if reading.is_valid() {
            debug!("dht11: frame {:02x?}", bytes);
        } else {
            warn!("dht11: checksum mismatch in frame {:02x?}", bytes);
        }
        Ok(reading)
    }

    /// Send the start signal and wait for the sensor to answer.
    ///
    /// Leaves the line as input, right before the first bit.
    pub fn begin_transfer(&mut self) -> Result<(), Error<E>> {
        trace!("dht11: start signal");

        self.line.set_direction(Direction::Output).map_err(Error::Bus)?;
        self.line.set_low().map_err(Error::Bus)?;
        self.delay.delay_ms(timing::START_LOW_MS);

        self.line.set_high().map_err(Error::Bus)?;
        self.delay.delay_us(timing::START_HIGH_US);

        self.line.set_direction(Direction::Input).map_err(Error::Bus)?;

        // Sensor pulls low, releases, then pulls low again for the first bit
        self.wait_for_level(false, timing::RESPONSE_TIMEOUT_US, Stage::Response)?;
        self.wait_for_level(true, timing::RESPONSE_TIMEOUT_US, Stage::Response)?;
        self.wait_for_level(false, timing::RESPONSE_TIMEOUT_US, Stage::Response)?;

        Ok(())
    }

    /// Read one byte, most significant bit first
    pub fn read_byte(&mut self) -> Result<u8, Error<E>> {
        let mut byte: u8 = 0;

        for bit_offset in 0..8 {
            self.wait_for_level(true, timing::BIT_START_TIMEOUT_US, Stage::BitStart)?;
            self.delay.delay_us(timing::BIT_SAMPLE_US);

            if self.line.is_high().map_err(Error::Bus)? {
                byte |= 1 << (7 - bit_offset);
            }

            self.wait_for_level(false, timing::BIT_END_TIMEOUT_US, Stage::BitEnd)?;
        }

        Ok(byte)
    }

    #[inline]
    fn poll_level(&self, high: bool) -> nb::Result<(), Error<E>> {
        if self.line.is_high().map_err(Error::Bus)? == high {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    fn wait_for_level(&mut self, high: bool, budget_us: u32, stage: Stage) -> Result<(), Error<E>> {
        let mut waited: u32 = 0;
        loop {
            match self.poll_level(high) {
                Ok(()) => return Ok(()),
                Err(nb::Error::Other(e)) => return Err(e),
                Err(nb::Error::WouldBlock) => {}
            }

            if waited >= budget_us {
                warn!("dht11: timeout waiting for {} level ({:?})", if high { "high" } else { "low" }, stage);
                return Err(Error::Timeout(stage));
            }

            self.delay.delay_us(timing::POLL_US);
            waited += u32::from(timing::POLL_US);
        }
    }
}
