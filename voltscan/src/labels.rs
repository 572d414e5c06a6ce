//! Operator-supplied display names for the eight channels.

use std::{collections::BTreeMap, fs, path::Path};

use log::warn;
use serde::Deserialize;

use crate::config::{ConfigError, NUM_CHANNELS};

/// Display names for the eight channels.
///
/// Names come from a TOML settings file with a `[pins]` table mapping `y0`..`y7` to free-form
/// strings. Channels without a name fall back to the positional default `Y<i>`.
///
/// ```toml
/// [pins]
/// y0 = "VCC rail"
/// y3 = "Sense line"
/// ```
#[derive(Clone, Debug, Default)]
pub struct ChannelLabels {
    names: [String; NUM_CHANNELS],
}

#[derive(Debug, Default, Deserialize)]
struct LabelsFile {
    #[serde(default)]
    pins: BTreeMap<String, String>,
}

impl ChannelLabels {
    /// Create labels from explicit names. Empty strings fall back to the default label.
    pub fn new(names: [String; NUM_CHANNELS]) -> Self {
        ChannelLabels { names }
    }

    /// Read labels from a TOML settings file.
    ///
    /// Keys that do not look like `y0`..`y7` are ignored with a warning.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let parsed: LabelsFile = toml::from_str(&raw)?;

        let mut names: [String; NUM_CHANNELS] = Default::default();
        for (key, name) in parsed.pins {
            match pin_index(&key) {
                Some(idx) => names[idx] = name.trim().to_string(),
                None => warn!("Ignoring unknown pin key '{key}' in {}", path.display()),
            }
        }
        Ok(ChannelLabels { names })
    }

    /// Read labels from a TOML settings file, falling back to defaults when that fails.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(labels) => labels,
            Err(err) => {
                warn!(
                    "Could not load channel labels from {}: {err}. Using default Y0..Y7.",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Resolve the display name for a channel index.
    pub fn name(&self, index: usize) -> String {
        match self.names.get(index) {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("Y{index}"),
        }
    }
}

fn pin_index(key: &str) -> Option<usize> {
    key.strip_prefix('y')
        .or_else(|| key.strip_prefix('Y'))
        .and_then(|rest| rest.parse::<usize>().ok())
        .filter(|idx| *idx < NUM_CHANNELS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let labels = ChannelLabels::default();
        assert_eq!(labels.name(0), "Y0");
        assert_eq!(labels.name(7), "Y7");
        // Out of range indices also resolve to something printable.
        assert_eq!(labels.name(12), "Y12");
    }

    #[test]
    fn test_parse_partial_table() {
        let parsed: LabelsFile =
            toml::from_str("[pins]\ny0 = \"VCC rail\"\ny3 = \"  Sense line \"\n").unwrap();
        let mut names: [String; NUM_CHANNELS] = Default::default();
        for (key, name) in parsed.pins {
            if let Some(idx) = pin_index(&key) {
                names[idx] = name.trim().to_string();
            }
        }
        let labels = ChannelLabels::new(names);

        assert_eq!(labels.name(0), "VCC rail");
        assert_eq!(labels.name(1), "Y1");
        assert_eq!(labels.name(3), "Sense line");
    }

    #[test]
    fn test_pin_index() {
        assert_eq!(pin_index("y0"), Some(0));
        assert_eq!(pin_index("Y7"), Some(7));
        assert_eq!(pin_index("y8"), None);
        assert_eq!(pin_index("pin0"), None);
    }

    #[test]
    fn test_load_or_default_on_missing_file() {
        let labels = ChannelLabels::load_or_default(Path::new("/nonexistent/channels.toml"));
        assert_eq!(labels.name(5), "Y5");
    }
}
