//! Pick requests: the normalized, immutable form of caller options.
//!
//! The host bridge hands over `getPictures` arguments as loose JSON. This
//! module turns them into a [`PickRequest`] once, up front; anything
//! structurally wrong fails here, before any selection UI is shown.
//!
//! ## Recognized options
//!
//! | field | type | default |
//! |---|---|---|
//! | `maximumImagesCount` | integer | 20 legacy / 15 modern (see [`PickerConfig`](crate::config::PickerConfig)) |
//! | `width`, `height` | integer ≥ 0 | 0 (unconstrained) |
//! | `quality` | integer, clamped to 1–100 | 100 |
//! | `outputType` | 0 = file reference, 1 = inline base64 | 0 |
//! | `includeThumbnail` | boolean | true |
//! | `thumbnailWidth`, `thumbnailHeight` | integer ≥ 0 | 200 |
//!
//! Other keys (`title`, `message`, `allow_video`, ...) belong to other
//! platforms and are ignored. Integers may arrive as JSON numbers
//! (fractions truncated) or numeric strings, and booleans as `"true"`/`"false"`,
//! matching what hybrid-app bridges typically pass through.

use crate::imaging::{BoundingBox, Quality};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const DEFAULT_THUMBNAIL_SIZE: u32 = 200;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RequestError {
    #[error("Malformed options: {0}")]
    Malformed(String),
    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// How artifacts are handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputMode {
    /// JPEG written to the private cache, returned as a `file://` URI.
    #[default]
    FileReference,
    /// JPEG bytes returned inline as standard base64.
    InlineEncoded,
}

impl OutputMode {
    pub fn from_wire(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::FileReference),
            1 => Some(Self::InlineEncoded),
            _ => None,
        }
    }
}

/// One invocation's worth of options. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickRequest {
    /// Selection cap as requested. `None` means "use the active source's default".
    pub max_count: Option<u32>,
    pub bounds: BoundingBox,
    pub quality: Quality,
    pub output_mode: OutputMode,
    pub include_thumbnail: bool,
    pub thumbnail_bounds: BoundingBox,
}

impl Default for PickRequest {
    fn default() -> Self {
        Self {
            max_count: None,
            bounds: BoundingBox::default(),
            quality: Quality::default(),
            output_mode: OutputMode::default(),
            include_thumbnail: true,
            thumbnail_bounds: BoundingBox::new(DEFAULT_THUMBNAIL_SIZE, DEFAULT_THUMBNAIL_SIZE),
        }
    }
}

impl PickRequest {
    /// Parse the bridge's argument array: the first element must be the options object.
    pub fn from_args(args: &Value) -> Result<Self, RequestError> {
        let first = args
            .as_array()
            .ok_or_else(|| RequestError::Malformed("arguments must be an array".into()))?
            .first()
            .ok_or_else(|| RequestError::Malformed("missing options object".into()))?;
        Self::from_options(first)
    }

    /// Parse an options object.
    pub fn from_options(options: &Value) -> Result<Self, RequestError> {
        let map = options
            .as_object()
            .ok_or_else(|| RequestError::Malformed("options must be an object".into()))?;

        let defaults = Self::default();
        let max_count = opt_u32(map, "maximumImagesCount")?.map(|n| n.max(1));
        let width = opt_u32(map, "width")?.unwrap_or(defaults.bounds.width);
        let height = opt_u32(map, "height")?.unwrap_or(defaults.bounds.height);
        let quality = opt_int(map, "quality")?
            .map(|q| Quality::new(q.clamp(0, 100) as u32))
            .unwrap_or(defaults.quality);
        let output_mode = match opt_int(map, "outputType")? {
            None => defaults.output_mode,
            Some(v) => OutputMode::from_wire(v).ok_or_else(|| RequestError::InvalidField {
                field: "outputType",
                reason: format!("expected 0 or 1, got {}", v),
            })?,
        };
        let include_thumbnail =
            opt_bool(map, "includeThumbnail")?.unwrap_or(defaults.include_thumbnail);
        let thumbnail_width =
            opt_u32(map, "thumbnailWidth")?.unwrap_or(defaults.thumbnail_bounds.width);
        let thumbnail_height =
            opt_u32(map, "thumbnailHeight")?.unwrap_or(defaults.thumbnail_bounds.height);

        Ok(Self {
            max_count,
            bounds: BoundingBox::new(width, height),
            quality,
            output_mode,
            include_thumbnail,
            thumbnail_bounds: BoundingBox::new(thumbnail_width, thumbnail_height),
        })
    }

    /// Requested cap, or the given source default.
    pub fn max_count_or(&self, default: u32) -> u32 {
        self.max_count.unwrap_or(default)
    }
}

fn field_name(key: &str) -> &'static str {
    match key {
        "maximumImagesCount" => "maximumImagesCount",
        "width" => "width",
        "height" => "height",
        "quality" => "quality",
        "outputType" => "outputType",
        "includeThumbnail" => "includeThumbnail",
        "thumbnailWidth" => "thumbnailWidth",
        "thumbnailHeight" => "thumbnailHeight",
        _ => "option",
    }
}

fn opt_int(map: &Map<String, Value>, key: &str) -> Result<Option<i64>, RequestError> {
    let invalid = |reason: String| RequestError::InvalidField {
        field: field_name(key),
        reason,
    };
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .map(Some)
            .ok_or_else(|| invalid(format!("{} is not an integer", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid(format!("{:?} is not an integer", s))),
        Some(other) => Err(invalid(format!("expected integer, got {}", other))),
    }
}

fn opt_u32(map: &Map<String, Value>, key: &str) -> Result<Option<u32>, RequestError> {
    match opt_int(map, key)? {
        None => Ok(None),
        Some(v) => u32::try_from(v).map(Some).map_err(|_| RequestError::InvalidField {
            field: field_name(key),
            reason: format!("{} is out of range", v),
        }),
    }
}

fn opt_bool(map: &Map<String, Value>, key: &str) -> Result<Option<bool>, RequestError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(other) => Err(RequestError::InvalidField {
            field: field_name(key),
            reason: format!("expected boolean, got {}", other),
        }),
    }
}
