//! A rust driver for a serial relay box.
//!
//! The box exposes a number of mechanical relays that are switched individually with simple
//! ASCII commands. Each relay is represented as a [`Channel`] that can be handed out and moved
//! across threads independently, while all channels share one underlying interface.
//!
//! # Example
//!
//! ```no_run
//! use scanio::SerialInstrument;
//! use relaybox::RelayBox;
//!
//! let interface = SerialInstrument::simple("/dev/ttyACM0", 9600).unwrap();
//! let mut relay_box = RelayBox::new(interface);
//!
//! println!("Instrument name: {}", relay_box.get_name().unwrap());
//!
//! let mut ch0 = relay_box.get_channel(0).unwrap();
//! ch0.set_state(true).unwrap();
//! ```

#![warn(missing_docs)]

use std::sync::{Arc, Mutex};

use scanio::{InstrumentError, InstrumentInterface};

/// A rust driver for the relay box.
///
/// To talk to the relay box, you have to first define what interface you want to use. For
/// example, you can use a blocking serial interface via `scanio::SerialInstrument`. Individual
/// relays are addressed through [`Channel`] structs that are created with
/// [`RelayBox::get_channel`].
pub struct RelayBox<T: InstrumentInterface> {
    interface: Arc<Mutex<T>>,
    num_channels: usize,
}

impl<T: InstrumentInterface> RelayBox<T> {
    /// Create a new relay box instance with the given instrument interface.
    pub fn new(interface: T) -> Self {
        RelayBox {
            interface: Arc::new(Mutex::new(interface)),
            num_channels: 4, // Default for the four relay box
        }
    }

    /// Get a new channel with a given index for the Channel.
    ///
    /// Please note that channels are zero-indexed.
    pub fn get_channel(&mut self, idx: usize) -> Result<Channel<T>, InstrumentError> {
        if idx >= self.num_channels {
            return Err(InstrumentError::ChannelIndexOutOfRange {
                idx,
                nof_channels: self.num_channels,
            });
        }
        Ok(Channel::new(idx, Arc::clone(&self.interface)))
    }

    /// Turn all relays off.
    pub fn all_off(&mut self) -> Result<(), InstrumentError> {
        self.sendcmd("ALLOFF")?;
        Ok(())
    }

    /// Get the state of all relays as a vector of booleans.
    ///
    /// The vector will contain `true` for relays that are closed and `false` for relays that are
    /// open. Channels are zero-indexed and returned in order.
    pub fn get_all_states(&mut self) -> Result<Vec<bool>, InstrumentError> {
        let resp = self.query("ALLREL?")?;
        let states: Vec<bool> = resp.split(',').map(|s| s.trim() == "1").collect();
        Ok(states)
    }

    /// Query the name, hardware, and firmware version of the device as a string.
    pub fn get_name(&mut self) -> Result<String, InstrumentError> {
        Ok(self.query("*IDN?")?.trim().to_string())
    }

    /// Check the identity reply of the box against an expected serial tag.
    ///
    /// With more than one box on the host, this ensures that commands go to the intended
    /// physical unit before any relay is switched.
    ///
    /// # Arguments
    /// - `expected`: Substring that must appear in the `*IDN?` reply.
    pub fn verify_serial(&mut self, expected: &str) -> Result<(), InstrumentError> {
        let name = self.get_name()?;
        if name.contains(expected) {
            Ok(())
        } else {
            Err(InstrumentError::InstrumentStatus(format!(
                "Relay box identity '{name}' does not match expected serial '{expected}'."
            )))
        }
    }

    /// Set the number of channels for the relay box.
    pub fn set_num_channels(&mut self, num: usize) {
        self.num_channels = num;
    }

    /// Send a command to the instrument.
    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        self.interface
            .lock()
            .expect("Mutex should not be poisoned")
            .sendcmd(cmd)
    }

    /// Query the instrument with a command and return the response as a String.
    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        self.interface
            .lock()
            .expect("Mutex should not be poisoned")
            .query(cmd)
    }
}

/// Channel structure representing a single relay of the relay box.
///
/// All commands to the relay must be sent through this structure. However, the channel itself
/// can only be created through the [`RelayBox`] struct. This is to ensure that the channel is
/// always initialized with a valid interface. Cloning a channel is cheap, it only increases the
/// reference count on the shared interface.
pub struct Channel<T: InstrumentInterface> {
    idx: usize,
    interface: Arc<Mutex<T>>,
}

impl<T: InstrumentInterface> Channel<T> {
    /// Get the state of this relay as a boolean.
    ///
    /// Returns `true` if the relay is closed, otherwise `false`.
    pub fn get_state(&mut self) -> Result<bool, InstrumentError> {
        let val = self.query("REL")?;
        Ok(val == "1")
    }

    /// Set the state of this relay.
    ///
    /// # Arguments
    /// * `state` - The boolean value to set the relay to (true for closed, false for open).
    pub fn set_state(&mut self, state: bool) -> Result<(), InstrumentError> {
        let state_send = if state { "1" } else { "0" };
        self.sendcmd("REL", state_send)
    }

    /// Get a new channel for the given instrument interface.
    ///
    /// This function can only be called from inside of the [`RelayBox`] struct.
    fn new(idx: usize, interface: Arc<Mutex<T>>) -> Self {
        Channel { idx, interface }
    }

    /// Send a command to this channel of the instrument.
    ///
    /// All channel commands require the following formatting: `{CMD}{IDX} {ARG}`, where {CMD} is
    /// the command, {IDX} the channel number, and {ARG} the argument to send to the channel.
    ///
    /// # Arguments:
    /// - `cmd`: Command to send to the channel
    /// - `value`: Argument to send along with this command.
    fn sendcmd(&mut self, cmd: &str, value: &str) -> Result<(), InstrumentError> {
        self.interface
            .lock()
            .expect("Mutex should not be poisoned")
            .sendcmd(&format!("{cmd}{0} {value}", self.idx))
    }

    /// Send a query to this channel of the instrument.
    ///
    /// Only the command to query must be provided as the channel number and question mark are
    /// automatically appended.
    ///
    /// # Arguments:
    /// - `cmd`: Command to send to the channel
    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        self.interface
            .lock()
            .expect("Mutex should not be poisoned")
            .query(&format!("{cmd}{0}?", self.idx))
    }
}

impl<T: InstrumentInterface> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Channel {
            idx: self.idx,
            interface: Arc::clone(&self.interface),
        }
    }
}
