//! Picker configuration module.
//!
//! Handles loading, validating, and merging `photo-picker.toml`. Stock
//! defaults are the base layer; a user file overrides any subset of keys.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [cache]
//! dir_name = "photo_picker_images"  # Sub-directory of the cache root
//! file_prefix = "image_"            # Artifact filename prefix
//!
//! [selection]
//! modern_default_max = 15   # maximumImagesCount default on the system picker
//! legacy_default_max = 20   # maximumImagesCount default on the legacy picker
//! modern_ceiling = 100      # Hard cap of the system multi-select flow
//!
//! [decode]
//! max_decoded_pixels = 250000000  # Largest raster ever materialized
//! resize_filter = "triangle"     # nearest | triangle | catmull_rom | lanczos3
//!
//! [failures]
//! policy = "log"            # log | silent: per-image drops
//!
//! [processing]
//! max_threads = 4           # Max parallel transforms (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::cache::{DEFAULT_DIR_NAME, DEFAULT_FILE_PREFIX};
use crate::imaging::{DEFAULT_MAX_DECODED_PIXELS, RustBackend};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE_NAME: &str = "photo-picker.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Picker configuration loaded from `photo-picker.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PickerConfig {
    pub cache: CacheConfig,
    pub selection: SelectionConfig,
    pub decode: DecodeConfig,
    pub failures: FailuresConfig,
    pub processing: ProcessingConfig,
}

impl PickerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.dir_name.is_empty() || self.cache.dir_name.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "cache.dir_name must be a single non-empty path segment".into(),
            ));
        }
        if self.cache.file_prefix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "cache.file_prefix must not contain path separators".into(),
            ));
        }
        if self.selection.modern_ceiling == 0 {
            return Err(ConfigError::Validation(
                "selection.modern_ceiling must be non-zero".into(),
            ));
        }
        if self.selection.modern_default_max == 0 || self.selection.legacy_default_max == 0 {
            return Err(ConfigError::Validation(
                "selection defaults must be non-zero".into(),
            ));
        }
        if self.decode.max_decoded_pixels == 0 {
            return Err(ConfigError::Validation(
                "decode.max_decoded_pixels must be non-zero".into(),
            ));
        }
        if self.processing.max_threads == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_threads must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Image backend honoring the `[decode]` section.
    pub fn backend(&self) -> RustBackend {
        RustBackend::with_limits(
            self.decode.max_decoded_pixels,
            self.decode.resize_filter.filter_type(),
        )
    }
}

/// Private cache layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub dir_name: String,
    pub file_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir_name: DEFAULT_DIR_NAME.to_string(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
        }
    }
}

/// Selection caps and per-source defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectionConfig {
    pub modern_default_max: u32,
    pub legacy_default_max: u32,
    pub modern_ceiling: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            modern_default_max: 15,
            legacy_default_max: 20,
            modern_ceiling: 100,
        }
    }
}

/// Decoder limits and scaling filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeConfig {
    pub max_decoded_pixels: u64,
    pub resize_filter: ResizeFilter,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_decoded_pixels: DEFAULT_MAX_DECODED_PIXELS,
            resize_filter: ResizeFilter::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Lanczos3,
}

impl ResizeFilter {
    pub fn filter_type(self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// What happens to a per-image failure besides dropping the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Emit a `warn` entry naming the reference, stage and error.
    #[default]
    Log,
    /// Drop without logging.
    Silent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FailuresConfig {
    pub policy: FailurePolicy,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel transforms.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_threads: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_threads.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(PickerConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {}", e)))
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

/// Read a config file as a raw TOML value. `Ok(None)` when it does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<PickerConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PickerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `photo-picker.toml` from the given directory.
pub fn load_config(dir: &Path) -> Result<PickerConfig, ConfigError> {
    load_config_file(&dir.join(CONFIG_FILE_NAME))
}

/// Load an explicit config file. A missing file yields the defaults.
pub fn load_config_file(path: &Path) -> Result<PickerConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `photo-picker.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Photo Picker Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Private artifact cache
# ---------------------------------------------------------------------------
[cache]
# Sub-directory of the cache root that receives file-reference artifacts.
dir_name = "photo_picker_images"

# Artifact names are <file_prefix><uuid>.jpg
file_prefix = "image_"

# ---------------------------------------------------------------------------
# Selection
# ---------------------------------------------------------------------------
[selection]
# maximumImagesCount when the caller omits it.
modern_default_max = 15
legacy_default_max = 20

# The system picker's multi-select flow never offers more than this.
modern_ceiling = 100

# ---------------------------------------------------------------------------
# Decoding
# ---------------------------------------------------------------------------
[decode]
# Largest raster ever decoded, in pixels. JPEGs count at their reduced
# (1/2, 1/4, 1/8) decode size, other formats at native size. Larger
# images are dropped.
max_decoded_pixels = 250000000

# Scaling filter: "nearest", "triangle", "catmull_rom" or "lanczos3".
resize_filter = "triangle"

# ---------------------------------------------------------------------------
# Per-image failures
# ---------------------------------------------------------------------------
[failures]
# Failed images are always dropped from the result.
# "log" emits a warning per drop, "silent" does not.
policy = "log"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel transforms.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_threads = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = PickerConfig::default();
        assert_eq!(config.cache.dir_name, "photo_picker_images");
        assert_eq!(config.cache.file_prefix, "image_");
        assert_eq!(config.selection.modern_default_max, 15);
        assert_eq!(config.selection.legacy_default_max, 20);
        assert_eq!(config.selection.modern_ceiling, 100);
        assert_eq!(config.decode.max_decoded_pixels, 250_000_000);
        assert_eq!(config.decode.resize_filter, ResizeFilter::Triangle);
        assert_eq!(config.failures.policy, FailurePolicy::Log);
        assert_eq!(config.processing.max_threads, None);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[selection]
legacy_default_max = 5
"#;
        let config: PickerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.selection.legacy_default_max, 5);
        assert_eq!(config.selection.modern_default_max, 15);
        assert_eq!(config.cache.dir_name, "photo_picker_images");
    }

    #[test]
    fn parse_enums() {
        let toml = r#"
[decode]
resize_filter = "lanczos3"

[failures]
policy = "silent"
"#;
        let config: PickerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.decode.resize_filter, ResizeFilter::Lanczos3);
        assert_eq!(config.failures.policy, FailurePolicy::Silent);
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<PickerConfig, _> = toml::from_str("[cache]\ndirname = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_filter_rejected() {
        let result: Result<PickerConfig, _> = toml::from_str("[decode]\nresize_filter = \"bicubic\"\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, PickerConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            r#"
[cache]
file_prefix = "pick_"

[processing]
max_threads = 2
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.cache.file_prefix, "pick_");
        assert_eq!(config.processing.max_threads, Some(2));
        // Unspecified values should be defaults
        assert_eq!(config.cache.dir_name, "photo_picker_images");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "this is not valid toml [[[").unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            "[selection]\nmodern_ceiling = 0\n",
        )
        .unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_nested_dir_name() {
        let mut config = PickerConfig::default();
        config.cache.dir_name = "a/b".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_zero_threads() {
        let mut config = PickerConfig::default();
        config.processing.max_threads = Some(0);
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("a").unwrap().as_integer(), Some(1));
        assert_eq!(merged.get("b").unwrap().as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str("[t]\nx = 1\ny = 2").unwrap();
        let overlay: toml::Value = toml::from_str("[t]\ny = 9").unwrap();
        let merged = merge_toml(base, overlay);
        let t = merged.get("t").unwrap();
        assert_eq!(t.get("x").unwrap().as_integer(), Some(1));
        assert_eq!(t.get("y").unwrap().as_integer(), Some(9));
    }

    // =========================================================================
    // stock config / threads
    // =========================================================================

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: PickerConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, PickerConfig::default());
    }

    #[test]
    fn stock_defaults_value_is_table() {
        assert!(stock_defaults_value().unwrap().is_table());
    }

    #[test]
    fn effective_threads_clamps_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_threads: Some(cores + 64),
        };
        assert_eq!(effective_threads(&config), cores);
        assert_eq!(effective_threads(&ProcessingConfig { max_threads: Some(1) }), 1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn backend_uses_decode_limits() {
        let mut config = PickerConfig::default();
        config.decode.max_decoded_pixels = 10;
        let backend = config.backend();
        let result = crate::imaging::ImageBackend::decode(
            &backend,
            &crate::test_helpers::jpeg_bytes(8, 8),
            &crate::imaging::DecodeParams::default(),
        );
        assert!(matches!(result, Err(crate::imaging::BackendError::ResourceLimit(_))));
    }
}
