//! # Codec Configuration
//!
//! Buffer sizing and pool sizing, loaded once at startup from TOML.
//!
//! ```toml
//! [buffer]
//! initial_capacity = 64
//! growth_factor = 2.0
//! min_growth = 256
//!
//! [pool]
//! max_retained = 32
//! creation_warning_threshold = 512
//! ```

use std::path::Path;

use netbits_core::PoolConfig;
use serde::{Deserialize, Serialize};

use crate::buffer::MAX_CAPACITY;
use crate::error::{CodecError, CodecResult};

/// Default initial capacity of a new buffer, in bytes.
pub const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// Smallest growth factor a buffer will use.
pub const MIN_GROWTH_FACTOR: f32 = 2.0;

/// Default minimum growth step, in bytes.
pub const DEFAULT_MIN_GROWTH: usize = 256;

/// Sizing of growable buffers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Bytes allocated up front.
    pub initial_capacity: usize,
    /// Capacity multiplier applied on growth. Raised to 2.0 if lower.
    pub growth_factor: f32,
    /// Smallest capacity a growth step will produce.
    pub min_growth: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            growth_factor: MIN_GROWTH_FACTOR,
            min_growth: DEFAULT_MIN_GROWTH,
        }
    }
}

impl BufferConfig {
    /// Growth factor actually applied: at least 2.0, and never NaN.
    #[inline]
    #[must_use]
    pub fn effective_growth_factor(&self) -> f32 {
        if self.growth_factor.is_finite() && self.growth_factor > MIN_GROWTH_FACTOR {
            self.growth_factor
        } else {
            MIN_GROWTH_FACTOR
        }
    }

    /// Checks the sizes against the addressable limit.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidConfig`] if a size is too large.
    pub fn validate(&self) -> CodecResult<()> {
        if self.initial_capacity > MAX_CAPACITY {
            return Err(CodecError::InvalidConfig(format!(
                "buffer.initial_capacity {} exceeds {MAX_CAPACITY}",
                self.initial_capacity
            )));
        }
        if self.min_growth > MAX_CAPACITY {
            return Err(CodecError::InvalidConfig(format!(
                "buffer.min_growth {} exceeds {MAX_CAPACITY}",
                self.min_growth
            )));
        }
        Ok(())
    }
}

/// Complete codec configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Buffer sizing.
    pub buffer: BufferConfig,
    /// Buffer pool sizing.
    pub pool: PoolConfig,
}

impl CodecConfig {
    /// Parses and validates a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidConfig`] on a parse or validation failure.
    pub fn from_toml_str(text: &str) -> CodecResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| CodecError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Io`] if the file cannot be read, otherwise as
    /// [`CodecConfig::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> CodecResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading codec configuration");
        Self::from_toml_str(&text)
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidConfig`] if serialization fails.
    pub fn to_toml_string(&self) -> CodecResult<String> {
        toml::to_string(self).map_err(|e| CodecError::InvalidConfig(e.to_string()))
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidConfig`] on the first invalid value.
    pub fn validate(&self) -> CodecResult<()> {
        self.buffer.validate()
    }
}
