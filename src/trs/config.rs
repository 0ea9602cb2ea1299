//! Configuration loading for trsconvert.
//!
//! `defaults/trsconvert.default.toml` is embedded into the binary so that docs and runtime
//! behavior stay in sync. Callers layer user-specific files on top of those defaults via
//! [`Loader`] before deserializing into [`ConvertConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../../defaults/trsconvert.default.toml");

/// Top-level configuration consumed by the converter.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertConfig {
    pub logging: LoggingConfig,
    pub layout: LayoutConfig,
    pub transcript: TranscriptConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    pub skip_marker: String,
}

/// How entries are pulled out of the transcript markup.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptConfig {
    pub entry_tag: String,
    pub time_attribute: String,
    pub end_markers: Vec<String>,
}

/// Mirrors the knobs exposed by [`DelimitedWriter`](crate::trs::output::DelimitedWriter).
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub delimiter: char,
    pub quote_char: char,
    pub line_terminator: String,
    pub missing_value: String,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<ConvertConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<ConvertConfig, ConfigError> {
    Loader::new().build()
}
