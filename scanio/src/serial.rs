//! This module provides the implementation for an instrument controlled via a serial port.
//!
//! It includes a blocking implementation of the [`crate::InstrumentInterface`] trait using the
//! `serialport` crate.

use std::time::Duration;

use serialport::{SerialPort, SerialPortBuilder};

use crate::{Instrument, InstrumentError};

/// A blocking serial port implementation using the `serialport` crate.
#[derive(Debug)]
pub struct SerialInstrument {}

impl SerialInstrument {
    /// Try to create a new instance of `SerialInstrument`.
    ///
    /// The terminator is by default set to `"\n"`, but can be changed using the `set_terminator`
    /// function. Note that the terminator is automatically appended to commands and reading
    /// responses will read until the terminator is found.
    ///
    /// The timeout of the serial port builder is taken over as the response timeout of the
    /// interface.
    ///
    /// # Arguments
    /// * `spb` - A `SerialPortBuilder` to configure the serial port. See
    ///   [`serialport::SerialPortBuilder`] and the [`serialport::new`] function for more details.
    pub fn try_new(
        spb: SerialPortBuilder,
    ) -> Result<Instrument<Box<dyn SerialPort>>, InstrumentError> {
        let port = spb.open()?;
        let timeout = port.timeout();
        Ok(Instrument::new(port, timeout))
    }

    /// Create a serial instrument from a port name and baud rate with a three second timeout.
    ///
    /// # Arguments
    /// * `port` - Name of the serial port, e.g., `/dev/ttyACM0`.
    /// * `baud_rate` - Baud rate of the serial connection.
    pub fn simple(
        port: &str,
        baud_rate: u32,
    ) -> Result<Instrument<Box<dyn SerialPort>>, InstrumentError> {
        Self::try_new(serialport::new(port, baud_rate).timeout(Duration::from_secs(3)))
    }
}
