use std::path::Path;

use serde::{Deserialize, Serialize};

use bindable_chain::{CHAIN_SEPARATOR, MODEL_PREFIX};

use crate::error::{ModelError, Result};

/// Per-model configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// First component of every channel name (`prefix.index.chain`).
    pub prefix: String,
    /// Whether `slice` notifies the array's own chain.
    ///
    /// `slice` never mutates the array, so this is off by default. Turning it
    /// on reproduces the behavior of treating `slice` like the in-place
    /// mutators.
    pub notify_on_slice: bool,
    /// Largest length an array may reach through an index or `length` write.
    ///
    /// Writing past the end of an array pads it with nulls, so an unbounded
    /// index would mean an unbounded allocation.
    pub max_array_length: usize,
}

/// Default for [`ModelConfig::max_array_length`].
pub const DEFAULT_MAX_ARRAY_LENGTH: usize = 1 << 20;

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            prefix: MODEL_PREFIX.to_string(),
            notify_on_slice: false,
            max_array_length: DEFAULT_MAX_ARRAY_LENGTH,
        }
    }
}

impl ModelConfig {
    /// Parse a configuration from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ModelError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// The prefix must be non-empty and free of the chain separator, otherwise
    /// channel names of different models could collide.
    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(ModelError::Config("prefix must not be empty".into()));
        }
        if self.prefix.contains(CHAIN_SEPARATOR) {
            return Err(ModelError::Config(format!(
                "prefix must not contain {CHAIN_SEPARATOR:?}: {:?}",
                self.prefix
            )));
        }
        if self.max_array_length == 0 {
            return Err(ModelError::Config("max_array_length must be positive".into()));
        }
        Ok(())
    }
}
