//! This module provides the implementation for an instrument controlled via TCP/IP.
//!
//! It includes a blocking implementation of the [`crate::InstrumentInterface`] trait using the
//! [`std::net::TcpStream`] struct.

use std::{
    io,
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use crate::{Instrument, InstrumentError};

/// A blocking TCP/IP implementation using the [`std::net::TcpStream`] struct.
#[derive(Debug)]
pub struct TcpIpInstrument {}

impl TcpIpInstrument {
    /// Try to create a new instance of `TcpIpInstrument`.
    ///
    /// The terminator is by default set to `"\n"`, but can be changed using the `set_terminator`
    /// function. Note that the terminator is automatically appended to commands and reading
    /// responses will read until the terminator is found.
    ///
    /// The given timeout bounds the connection attempt as well as every subsequent read and
    /// write on the stream. We never leave the stream without a timeout, as infinite blocking is
    /// not wanted for instrument communications.
    ///
    /// # Arguments
    /// * `sock_addr` - Socket address.
    /// * `timeout` - Timeout for connecting, reading, and writing.
    pub fn try_new<A: ToSocketAddrs>(
        sock_addr: A,
        timeout: Duration,
    ) -> Result<Instrument<TcpStream>, InstrumentError> {
        let addr = sock_addr.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "no socket address could be resolved",
            )
        })?;
        let stream = TcpStream::connect_timeout(&addr, timeout)?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_read_timeout(Some(timeout))?;
        Ok(Instrument::new(stream, timeout))
    }
}
