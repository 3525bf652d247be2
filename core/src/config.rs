// Decoder configuration
// Loaded from JSON by front ends, defaults match the permissive on-disk behaviour

use crate::error::{MftError, MftResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Knobs controlling how tolerant the attribute decoder is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Replace undecodable UTF-16 names with an empty string instead of failing.
    pub substitute_malformed_names: bool,
    /// End a run list early at a run with a zero-width or zero-valued length field.
    pub stop_on_empty_run: bool,
    /// Records claiming more than this many bytes are skipped by the stream walker.
    pub max_attribute_length: u32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            substitute_malformed_names: true,
            stop_on_empty_run: false,
            max_attribute_length: 0x10000,
        }
    }
}

impl DecoderConfig {
    /// Strict profile: every anomaly is surfaced to the caller.
    pub fn strict() -> Self {
        Self {
            substitute_malformed_names: false,
            stop_on_empty_run: true,
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> MftResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> MftResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> MftResult<()> {
        // Smallest possible record is a resident unnamed header
        if self.max_attribute_length < 0x18 {
            return Err(MftError::Configuration(format!(
                "max_attribute_length {} is smaller than a resident attribute header",
                self.max_attribute_length
            )));
        }
        Ok(())
    }
}
