//! Tool configuration module.
//!
//! Handles loading, validating, and merging `simple-thumb.toml`. Values are
//! layered: stock defaults, then the config file, then command-line flags.
//!
//! ## Config File Location
//!
//! `simple-thumb.toml` in the working directory is picked up automatically.
//! `--config <FILE>` points at any other file (which must then exist).
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! backend = "rust"              # rust | fast
//!
//! [options]
//! resize_up = false             # Allow resizes to enlarge
//! quality = 100                 # JPEG quality (0-100)
//! preserve_alpha = true         # Keep PNG alpha channel
//! preserve_transparency = true  # Keep GIF transparency
//!
//! [processing]
//! max_processes = 4             # Max parallel workers (omit for auto = CPU cores)
//!
//! [batch]
//! recipe = ["adaptive=300x300"] # Default operation chain for `batch`
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [options]
//! quality = 85
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::Options;
use crate::recipe::parse_recipe;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "simple-thumb.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Which pixel backend handles the image work.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// `image` crate resampling; rotates by right angles only
    #[default]
    Rust,
    /// `fast_image_resize` resampling; rotates by any angle
    Fast,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Rust => f.write_str("rust"),
            BackendKind::Fast => f.write_str("fast"),
        }
    }
}

/// Tool configuration loaded from `simple-thumb.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbConfig {
    pub backend: BackendKind,
    /// Per-image handle options.
    pub options: Options,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Defaults for the `batch` command.
    pub batch: BatchConfig,
}

impl ThumbConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.options
            .validate()
            .map_err(|e| ConfigError::Validation(format!("options.{e}")))?;
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        parse_recipe(&self.batch.recipe)
            .map_err(|e| ConfigError::Validation(format!("batch.recipe: {e}")))?;
        Ok(())
    }

    /// Apply command-line overrides on top of loaded values and re-validate.
    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        if let Some(backend) = overrides.backend {
            self.backend = backend;
        }
        if let Some(quality) = overrides.quality {
            self.options.quality = quality;
        }
        if overrides.resize_up {
            self.options.resize_up = true;
        }
        self.validate()?;
        Ok(self)
    }
}

/// Values given on the command line; `None`/`false` keeps the config value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backend: Option<BackendKind>,
    pub quality: Option<u32>,
    pub resize_up: bool,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image processing workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Batch command defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Operations applied to every image when `--op` is not given.
    pub recipe: Vec<String>,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ThumbConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ThumbConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ThumbConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `simple-thumb.toml` from `dir`, falling back to stock defaults.
pub fn load_config(dir: &Path) -> Result<ThumbConfig, ConfigError> {
    let overlay = load_raw_config(&dir.join(CONFIG_FILE_NAME))?;
    resolve_config(stock_defaults_value()?, overlay)
}

/// Load an explicitly named config file. Missing files are an error.
pub fn load_config_file(path: &Path) -> Result<ThumbConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay: toml::Value = toml::from_str(&content)?;
    resolve_config(stock_defaults_value()?, Some(overlay))
}

/// Returns a fully-commented stock `simple-thumb.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Thumb Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags (--backend, --quality, --resize-up) override this file.
# Unknown keys will cause an error.

# Pixel backend: "rust" (image crate, right-angle rotation only)
# or "fast" (fast_image_resize, any rotation angle).
backend = "rust"

# ---------------------------------------------------------------------------
# Image handle options
# ---------------------------------------------------------------------------
[options]
# Allow resize operations to enlarge an image past its current size.
resize_up = false

# JPEG encoding quality (0 = worst, 100 = best).
quality = 100

# Keep the alpha channel when writing PNG. When false, PNGs are written opaque.
preserve_alpha = true

# Keep transparency when writing GIF. When false, GIFs are written opaque.
preserve_transparency = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image-processing workers for `batch`.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Batch
# ---------------------------------------------------------------------------
[batch]
# Operations applied to every image when no --op flag is given, e.g.
#   recipe = ["resize=1200x0", "adaptive=300x300"]
recipe = []
"##
}
