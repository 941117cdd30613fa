//! [Bit banging] drivers for three classic hobbyist devices, built on the
//! [`embedded-hal`] traits:
//!
//! - [`dht11`]: DHT11 humidity and temperature sensor (single wire, half duplex)
//! - [`ds1302`]: DS1302 real time clock (3-wire synchronous serial)
//! - [`hd44780`]: HD44780 character display (4- or 8-bit parallel bus)
//!
//! Each driver owns its pins and is independent of the others. Lines that
//! change direction during a transaction are passed as a [`gpio::IoLine`].
//! All operations block until the transaction is complete.
//!
//! Drivers log through the [`log`] facade; enable the `defmt` feature to
//! derive `defmt::Format` for the public data and error types.
//!
//! ## Usage examples
//!
//! Each driver module opens with an example wiring it to generic
//! `embedded-hal` pins and delays or timers. Any HAL implementing those traits
//! plugs in directly; [`gpio::PortPin`] covers bare AVR-style port registers.
//!
//! [Bit banging]: https://en.wikipedia.org/wiki/Bit_banging
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal
//! [`log`]: https://docs.rs/log

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

pub mod bcd;
pub mod calendar;
pub mod dht11;
pub mod ds1302;
pub mod gpio;
pub mod hd44780;

#[cfg(test)]
mod mock;
