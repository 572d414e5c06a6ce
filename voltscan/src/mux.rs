//! The channel selector: three relay-driven address lines into an SN74LS138 decoder.
//!
//! The decoder selects output `Y[index]` (active low) from the three address bits, with
//! `index = A + 2*B + 4*C`. Line 0 carries A (least significant), line 1 carries B, line 2
//! carries C.

use std::{thread, time::Duration};

use log::{debug, info, warn};
use thiserror::Error;

use relaybox::RelayBox;
use scanio::{InstrumentError, InstrumentInterface, SerialInstrument};

use crate::config::NUM_CHANNELS;

/// Settle time after switching the address lines.
///
/// Mechanical relays switch in roughly 10 ms; 20 ms leaves headroom before the selected channel
/// is considered stable enough to measure.
pub const SETTLE_DELAY: Duration = Duration::from_millis(20);

/// Number of address lines.
pub const NUM_LINES: usize = 3;

/// Errors of the channel selector.
#[derive(Debug, Error)]
pub enum MuxError {
    /// The requested channel index cannot be expressed on three address lines.
    #[error("Channel index {0} is out of range, must be in [0, 7].")]
    IndexOutOfRange(usize),
    /// The underlying output device reported a fault while setting a line.
    #[error(transparent)]
    Line(#[from] InstrumentError),
}

/// Capability of one physical boolean output line.
pub trait OutputLine: Send {
    /// Drive the line to the given state.
    fn set_state(&mut self, state: bool) -> Result<(), InstrumentError>;
}

impl<T: InstrumentInterface + Send> OutputLine for relaybox::Channel<T> {
    fn set_state(&mut self, state: bool) -> Result<(), InstrumentError> {
        relaybox::Channel::set_state(self, state)
    }
}

/// An output line that goes nowhere, for running without hardware.
pub struct SimulatedLine;

impl OutputLine for SimulatedLine {
    fn set_state(&mut self, _state: bool) -> Result<(), InstrumentError> {
        Ok(())
    }
}

/// Decompose a channel index into the three address bits `(A, B, C)`, A being the LSB.
pub fn decompose(index: usize) -> (bool, bool, bool) {
    (
        index & 0b001 != 0,
        index & 0b010 != 0,
        index & 0b100 != 0,
    )
}

/// Drives the three address lines of the decoder.
///
/// A selector without lines runs in simulation mode: selections are validated and the settle
/// delay is observed, but no physical line is touched.
pub struct MuxSelector {
    lines: Option<[Box<dyn OutputLine>; NUM_LINES]>,
}

impl MuxSelector {
    /// Create a selector over three already attached output lines, ordered A, B, C.
    pub fn new(lines: [Box<dyn OutputLine>; NUM_LINES]) -> Self {
        MuxSelector { lines: Some(lines) }
    }

    /// Create a selector in simulation mode.
    pub fn simulated() -> Self {
        MuxSelector { lines: None }
    }

    /// Whether this selector runs without physical lines.
    pub fn is_simulated(&self) -> bool {
        self.lines.is_none()
    }

    /// Open the relay box and bind its first three channels as the A/B/C lines.
    ///
    /// Any failure on this path (port cannot be opened, identity mismatch, missing channel)
    /// falls back to a simulated selector with a logged warning, so that a sweep can still run
    /// against fabricated data.
    ///
    /// # Arguments
    /// - `port`: Serial port of the relay box, e.g., `/dev/ttyACM0`.
    /// - `baud_rate`: Baud rate of the serial connection.
    /// - `expected_serial`: When given, the box identity is checked against this tag before any
    ///   relay is switched.
    pub fn open_lines(port: &str, baud_rate: u32, expected_serial: Option<&str>) -> Self {
        match Self::try_open_lines(port, baud_rate, expected_serial) {
            Ok(selector) => selector,
            Err(err) => {
                warn!(
                    "Could not open relay box on {port}: {err}. Falling back to simulated selector."
                );
                Self::simulated()
            }
        }
    }

    fn try_open_lines(
        port: &str,
        baud_rate: u32,
        expected_serial: Option<&str>,
    ) -> Result<Self, InstrumentError> {
        let interface = SerialInstrument::simple(port, baud_rate)?;
        let mut relay_box = RelayBox::new(interface);
        if let Some(serial) = expected_serial {
            relay_box.verify_serial(serial)?;
        }
        let line_a = relay_box.get_channel(0)?;
        let line_b = relay_box.get_channel(1)?;
        let line_c = relay_box.get_channel(2)?;
        info!("Relay box lines A/B/C attached on {port}.");
        Ok(Self::new([
            Box::new(line_a),
            Box::new(line_b),
            Box::new(line_c),
        ]))
    }

    /// Select a channel by driving the address lines, then wait out the settle delay.
    ///
    /// # Arguments
    /// - `index`: Channel to select, 0..=7.
    pub fn select_index(&mut self, index: usize) -> Result<(), MuxError> {
        if index >= NUM_CHANNELS {
            return Err(MuxError::IndexOutOfRange(index));
        }
        let (a, b, c) = decompose(index);
        debug!(
            "select_index({index}) -> A={} B={} C={}",
            a as u8, b as u8, c as u8
        );
        if let Some(lines) = self.lines.as_mut() {
            lines[0].set_state(a)?;
            lines[1].set_state(b)?;
            lines[2].set_state(c)?;
        }
        thread::sleep(SETTLE_DELAY);
        Ok(())
    }

    /// Release the lines. Idempotent, never fails.
    pub fn close(&mut self) {
        if self.lines.take().is_some() {
            debug!("Selector lines released.");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// A line that remembers every state it was driven to.
    struct RecordingLine {
        states: Arc<Mutex<Vec<bool>>>,
    }

    impl OutputLine for RecordingLine {
        fn set_state(&mut self, state: bool) -> Result<(), InstrumentError> {
            self.states
                .lock()
                .expect("Mutex should not be poisoned")
                .push(state);
            Ok(())
        }
    }

    /// A line whose device always reports a fault.
    struct BrokenLine;

    impl OutputLine for BrokenLine {
        fn set_state(&mut self, _state: bool) -> Result<(), InstrumentError> {
            Err(InstrumentError::InstrumentStatus(
                "relay coil stuck".to_string(),
            ))
        }
    }

    fn recording_selector() -> (MuxSelector, [Arc<Mutex<Vec<bool>>>; NUM_LINES]) {
        let states: [Arc<Mutex<Vec<bool>>>; NUM_LINES] = Default::default();
        let lines: [Box<dyn OutputLine>; NUM_LINES] = [
            Box::new(RecordingLine {
                states: Arc::clone(&states[0]),
            }),
            Box::new(RecordingLine {
                states: Arc::clone(&states[1]),
            }),
            Box::new(RecordingLine {
                states: Arc::clone(&states[2]),
            }),
        ];
        (MuxSelector::new(lines), states)
    }

    #[test]
    fn test_decompose_reconstructs_index() {
        for index in 0..NUM_CHANNELS {
            let (a, b, c) = decompose(index);
            assert_eq!(a as usize + 2 * b as usize + 4 * c as usize, index);
        }
    }

    #[test]
    fn test_select_drives_expected_bits() {
        let (mut selector, states) = recording_selector();
        for index in 0..NUM_CHANNELS {
            selector.select_index(index).unwrap();
            let (a, b, c) = decompose(index);
            let last =
                |line: &Arc<Mutex<Vec<bool>>>| *line.lock().unwrap().last().unwrap();
            assert_eq!(last(&states[0]), a);
            assert_eq!(last(&states[1]), b);
            assert_eq!(last(&states[2]), c);
        }
    }

    #[test]
    fn test_select_out_of_range() {
        let mut selector = MuxSelector::simulated();
        assert!(matches!(
            selector.select_index(8),
            Err(MuxError::IndexOutOfRange(8))
        ));
    }

    #[test]
    fn test_simulated_select_succeeds() {
        let mut selector = MuxSelector::simulated();
        assert!(selector.is_simulated());
        for index in 0..NUM_CHANNELS {
            selector.select_index(index).unwrap();
        }
    }

    #[test]
    fn test_line_fault_is_surfaced() {
        let mut selector =
            MuxSelector::new([Box::new(BrokenLine), Box::new(BrokenLine), Box::new(BrokenLine)]);
        assert!(matches!(selector.select_index(0), Err(MuxError::Line(_))));
    }

    #[test]
    fn test_close_is_idempotent() {
        let (mut selector, _) = recording_selector();
        selector.close();
        assert!(selector.is_simulated());
        selector.close();
        // After close, selections behave like in simulation mode.
        selector.select_index(3).unwrap();
    }
}
