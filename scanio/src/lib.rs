//! ScanIo: Talk to your line-oriented test equipment from Rust
//!
//! The ScanIo library provides standardized blocking interfaces to talk to test and measurement
//! equipment that speaks newline-terminated ASCII, e.g., SCPI instruments. To do so, it provides
//! an [`InstrumentInterface`] trait along with implementations for the common transports.
//! Furthermore, we also provide an [`InstrumentError`] error type that instrument drivers should
//! return.
//!
//! # Currently implemented interfaces are:
//! - TCP/IP (blocking) using [`std::net::TcpStream`], see [`TcpIpInstrument`].
//! - Serial (blocking) using the [`serialport`] crate, see `SerialInstrument` (requires the
//!   `serial` feature).
//! - A [`LoopbackInterface`] that simulates an instrument for testing of drivers.
//!
//! # Goals and non-goals of this project
//!
//! ScanIo shall provide a simple framework that allows you to write an instrument driver without
//! worrying about the transport. A driver written against the [`InstrumentInterface`] trait works
//! unchanged whether the device hangs off a TCP socket, a serial port, or an ethernet-to-serial
//! converter. All functionality of a driver should be tested with hardware, but also with tests
//! using the provided [`LoopbackInterface`].

#![warn(missing_docs)]

mod instrument;
mod loopback;
#[cfg(feature = "serial")]
mod serial;
mod tcp_ip;

pub use instrument::Instrument;
pub use loopback::LoopbackInterface;
#[cfg(feature = "serial")]
pub use serial::SerialInstrument;
pub use tcp_ip::TcpIpInstrument;

use std::time::{Duration, Instant};

use thiserror::Error;

/// The error enum for all instruments.
///
/// For any command sending or querying, your instrument driver should return either an empty
/// result or a result with the query where this Error is the alternative. [`InstrumentError`]
/// makes it easy to propagate all the sending commands, querying errors forward with the `?`
/// operator such that errors propagate nicely. If this is not possible, it is considered a bug
/// and should be reported.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstrumentError {
    /// The channel index requested is out of range. The error contains the index requested and
    /// the number of channels that are currently configured.
    #[error(
        "Channel with index {idx} is out of range. Number of channels available: {nof_channels}"
    )]
    ChannelIndexOutOfRange {
        /// Index of the channel that is out of range.
        idx: usize,
        /// Total number of channels.
        nof_channels: usize,
    },
    /// Instrument status is not okay, e.g., a check against the instrument identity did not
    /// succeed. This error contains a string with the error message that is intended to be
    /// displayed for the user. Note that the string is directly displayed without any further
    /// formatting, so you need to ensure that it is descriptive enough for the user.
    #[error("{0}")]
    InstrumentStatus(String),
    /// Error when reading from/writing to an interface. See [`std::io::Error`] for more details.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Instrument response could not be parsed because it was unexpected by the driver. This
    /// error contains the response that was received from the instrument.
    #[error("Response from instrument could not be parsed. Response was: {0}")]
    ResponseParseError(String),
    #[cfg(feature = "serial")]
    /// Serial port errors can occur when opening a serial interface. See the [`serialport::Error`]
    /// documentation for more information.
    #[error(transparent)]
    Serialport(#[from] serialport::Error),
    /// Timeout occurred while waiting for a response from the instrument. The error contains the
    /// timeout that was exceeded.
    #[error(
        "Timeout occured while waiting for a response from the instrument. Timeout was set to {0:?}."
    )]
    Timeout(Duration),
    /// Timeout occurred while waiting for a response to a query. The error contains the query
    /// that was sent and the timeout that was exceeded.
    #[error(
        "Timeout occured while waiting for a response to query: {query}. Timeout was set to {timeout:?}."
    )]
    TimeoutQuery {
        /// The query that timed out.
        query: String,
        /// The timeout that was set.
        timeout: Duration,
    },
}

/// The `InstrumentInterface` trait defines the interface for controlling instruments.
///
/// Implementors only need to provide raw byte reading and writing; command sending and querying
/// with terminator handling are provided on top of these.
pub trait InstrumentInterface {
    /// Read exactly `buf.len()` bytes from the instrument into the given buffer.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError>;

    /// Write raw bytes to the instrument and ensure they are sent out immediately.
    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError>;

    /// Get the terminator of the interface. Defaults to `"\n"`.
    fn get_terminator(&self) -> &str {
        "\n"
    }

    /// Set the terminator of an interface from a `&str`.
    ///
    /// # Arguments:
    /// - `_terminator` - A string slice that will be used as the terminator for commands.
    fn set_terminator(&mut self, _terminator: &str) {}

    /// Get the timeout for a full response to arrive. Defaults to three seconds.
    fn get_timeout(&self) -> Duration {
        Duration::from_secs(3)
    }

    /// Send a command to the instrument.
    ///
    /// This function takes the command, appends the terminator, and writes it to the instrument.
    /// The interface is flushed to ensure that the command is sent immediately.
    ///
    /// # Arguments:
    /// - `cmd` - A string slice that will be sent to the instrument.
    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        let full_cmd = format!("{cmd}{}", self.get_terminator());
        self.write_raw(full_cmd.as_bytes())
    }

    /// Read from the instrument byte by byte until the terminator is found.
    ///
    /// The response is decoded as it comes in and returned with the terminator and any
    /// surrounding whitespace trimmed. If a non-UTF-8 byte is received, an error is printed to
    /// stderr and the byte is skipped. If no terminator is encountered within the timeout of the
    /// interface, an [`InstrumentError::Timeout`] is returned.
    fn read_until_terminator(&mut self) -> Result<String, InstrumentError> {
        let mut response = String::new();
        let mut single_buf = [0u8];

        let tic = Instant::now();
        loop {
            if tic.elapsed() >= self.get_timeout() {
                return Err(InstrumentError::Timeout(self.get_timeout()));
            }
            self.read_exact(&mut single_buf)?;
            if let Ok(val) = str::from_utf8(&single_buf) {
                response.push_str(val);
            } else {
                eprintln!("Received invalid UTF-8 data: {single_buf:?}");
            }
            if response.ends_with(self.get_terminator()) {
                break;
            }
        }
        Ok(response.trim().to_string())
    }

    /// Query the instrument with a command and return the response as a String.
    ///
    /// This function uses `sendcmd` to send the command and then reads the response until the
    /// terminator is found. A timeout while waiting for the response is reported as an
    /// [`InstrumentError::TimeoutQuery`] containing the query that was sent.
    ///
    /// # Arguments
    /// * `cmd` - The command to send to the instrument for which we expect a response.
    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        self.sendcmd(cmd)?;
        match self.read_until_terminator() {
            Err(InstrumentError::Timeout(timeout)) => Err(InstrumentError::TimeoutQuery {
                query: cmd.to_string(),
                timeout,
            }),
            other => other,
        }
    }
}
