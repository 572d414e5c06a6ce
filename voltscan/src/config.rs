//! Sweep configuration: pass/fail windows, measurement strategy, and connection parameters.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of channels the decoder can select.
pub const NUM_CHANNELS: usize = 8;

/// The pass/fail window for one channel.
///
/// The window is never validated: an inverted window (lower above upper) simply makes every
/// reading fail, which is occasionally useful to force attention to a channel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelBound {
    /// Lower limit in volts, inclusive.
    pub lower: f64,
    /// Upper limit in volts, inclusive.
    pub upper: f64,
}

impl ChannelBound {
    /// Create a new pass/fail window.
    pub fn new(lower: f64, upper: f64) -> Self {
        ChannelBound { lower, upper }
    }

    /// Check whether a reading lies within the window, boundaries included.
    ///
    /// A not-a-number reading never passes, regardless of the window.
    pub fn contains(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        self.lower <= value && value <= self.upper
    }
}

impl Default for ChannelBound {
    fn default() -> Self {
        ChannelBound::new(-10.0, 10.0)
    }
}

/// How a reading is taken per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MeasureStrategy {
    /// Configure the meter once up front, then trigger with `READ?` per channel.
    #[default]
    Configured,
    /// One-shot `MEAS:VOLT:DC?` per channel, configuring and reading in a single request.
    OneShot,
}

/// All parameters of one sweep.
///
/// The configuration is supplied once at sweep start and is immutable for the sweep's duration.
#[derive(Clone, Debug)]
pub struct SweepConfig {
    /// Host address of the multimeter.
    pub host: String,
    /// SCPI socket port of the multimeter.
    pub port: u16,
    /// Per-operation timeout for connecting, reading, and writing.
    pub timeout: Duration,
    /// Fixed measurement range in volts, autorange when `None`.
    pub range: Option<f64>,
    /// Integration time in power-line cycles.
    pub nplc: Option<f64>,
    /// Pause between channels, on top of the selector settle delay.
    pub interval: Duration,
    /// Measurement strategy, see [`MeasureStrategy`].
    pub strategy: MeasureStrategy,
    /// Also program the pass/fail window into the meter's own comparator. Advisory only, the
    /// program-side verdict is always computed regardless.
    pub use_inst_limits: bool,
    /// Pass/fail window per channel.
    pub bounds: [ChannelBound; NUM_CHANNELS],
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            host: "192.168.0.61".to_string(),
            port: 5025,
            timeout: Duration::from_secs(1),
            range: None,
            nplc: Some(1.0),
            interval: Duration::from_millis(500),
            strategy: MeasureStrategy::default(),
            use_inst_limits: false,
            bounds: [ChannelBound::default(); NUM_CHANNELS],
        }
    }
}

impl SweepConfig {
    /// The meter's socket address as a `host:port` string.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Errors for malformed sweep parameters supplied from the outside.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A bound did not parse as `lower:upper` with numeric values.
    #[error("Bound '{0}' is malformed, expected 'lower:upper' with numeric values")]
    MalformedBound(String),
    /// The wrong number of bounds was supplied.
    #[error("Expected one bound or one per channel ({NUM_CHANNELS}), got {0}")]
    WrongBoundCount(usize),
    /// A settings file could not be read.
    #[error("Could not read settings file: {0}")]
    Io(#[from] std::io::Error),
    /// A settings file could not be parsed.
    #[error("Could not parse settings file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Parse a bounds specification from the command line.
///
/// The specification is either a single `lower:upper` pair that applies to all channels, or
/// eight comma-separated pairs, one per channel.
pub fn parse_bounds(input: &str) -> Result<[ChannelBound; NUM_CHANNELS], ConfigError> {
    let parsed = input
        .split(',')
        .map(parse_bound)
        .collect::<Result<Vec<_>, _>>()?;
    match parsed.as_slice() {
        [single] => Ok([*single; NUM_CHANNELS]),
        s if s.len() == NUM_CHANNELS => {
            let mut bounds = [ChannelBound::default(); NUM_CHANNELS];
            bounds.copy_from_slice(s);
            Ok(bounds)
        }
        s => Err(ConfigError::WrongBoundCount(s.len())),
    }
}

fn parse_bound(pair: &str) -> Result<ChannelBound, ConfigError> {
    let malformed = || ConfigError::MalformedBound(pair.to_string());
    let (lower, upper) = pair.split_once(':').ok_or_else(&malformed)?;
    let lower = lower.trim().parse::<f64>().map_err(|_| malformed())?;
    let upper = upper.trim().parse::<f64>().map_err(|_| malformed())?;
    Ok(ChannelBound::new(lower, upper))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_inclusive() {
        let bound = ChannelBound::new(-1.0, 1.0);
        assert!(bound.contains(-1.0));
        assert!(bound.contains(0.0));
        assert!(bound.contains(1.0));
        assert!(!bound.contains(1.0001));
        assert!(!bound.contains(-1.0001));
    }

    #[test]
    fn test_contains_rejects_nan_even_for_infinite_window() {
        let bound = ChannelBound::new(f64::NEG_INFINITY, f64::INFINITY);
        assert!(bound.contains(1e300));
        assert!(!bound.contains(f64::NAN));
    }

    #[test]
    fn test_inverted_window_fails_everything() {
        let bound = ChannelBound::new(1.0, -1.0);
        assert!(!bound.contains(0.0));
        assert!(!bound.contains(1.0));
    }

    #[test]
    fn test_parse_bounds_single_pair() {
        let bounds = parse_bounds("-5:5").unwrap();
        assert_eq!(bounds.len(), NUM_CHANNELS);
        for bound in bounds {
            assert_eq!(bound, ChannelBound::new(-5.0, 5.0));
        }
    }

    #[test]
    fn test_parse_bounds_per_channel() {
        let bounds = parse_bounds("0:1,1:2,2:3,3:4,4:5,5:6,6:7,7:8").unwrap();
        assert_eq!(bounds[0], ChannelBound::new(0.0, 1.0));
        assert_eq!(bounds[7], ChannelBound::new(7.0, 8.0));
    }

    #[test]
    fn test_parse_bounds_wrong_count() {
        assert!(matches!(
            parse_bounds("0:1,1:2"),
            Err(ConfigError::WrongBoundCount(2))
        ));
    }

    #[test]
    fn test_parse_bounds_malformed() {
        assert!(matches!(
            parse_bounds("low:high"),
            Err(ConfigError::MalformedBound(_))
        ));
        assert!(matches!(
            parse_bounds("1.0"),
            Err(ConfigError::MalformedBound(_))
        ));
    }
}
