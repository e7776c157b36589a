//! Per-batch parameters: target box, background color and runner settings

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::config::{OutputFormat, ProcessingConfig};
use crate::error::{Result, PadResizeError};
use crate::processing::FilterType;

/// Largest accepted width or height of a target box
pub const MAX_DIMENSION: u32 = 32768;

/// Fixed output size requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetBox {
    width: u32,
    height: u32,
}

impl TargetBox {
    /// Create a target box, rejecting zero or oversized dimensions
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PadResizeError::config(
                format!("Width and height must be greater than 0, got {}x{}", width, height)
            ));
        }

        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(PadResizeError::config(
                format!("Dimensions must be between 1-{}, got {}x{}", MAX_DIMENSION, width, height)
            ));
        }

        Ok(Self { width, height })
    }

    /// Parse user-typed width and height strings (prompt answers, form fields)
    pub fn parse(width: &str, height: &str) -> Result<Self> {
        let width = parse_dimension("Width", width)?;
        let height = parse_dimension("Height", height)?;
        Self::new(width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl fmt::Display for TargetBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

fn parse_dimension(name: &str, value: &str) -> Result<u32> {
    let value = value.trim();
    let parsed: i64 = value.parse().map_err(|_| {
        PadResizeError::config(format!("{} must be an integer, got '{}'", name, value))
    })?;

    if parsed <= 0 {
        return Err(PadResizeError::config(
            format!("{} must be greater than 0, got {}", name, parsed)
        ));
    }

    u32::try_from(parsed)
        .ok()
        .filter(|v| *v <= MAX_DIMENSION)
        .ok_or_else(|| PadResizeError::config(
            format!("{} must be at most {}, got {}", name, MAX_DIMENSION, parsed)
        ))
}

/// Solid RGB color used for the padding bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BackgroundColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl BackgroundColor {
    pub const WHITE: Self = Self::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` string
    pub fn parse_hex(value: &str) -> Result<Self> {
        let invalid = || PadResizeError::config(
            format!("Background color must look like #rrggbb, got '{}'", value)
        );

        let hex = value.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid())
        };

        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Opaque RGBA pixel of this color
    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, 255])
    }

    pub fn to_rgb(self) -> image::Rgb<u8> {
        image::Rgb([self.r, self.g, self.b])
    }
}

impl Default for BackgroundColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for BackgroundColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for BackgroundColor {
    type Err = PadResizeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_hex(s)
    }
}

impl TryFrom<String> for BackgroundColor {
    type Error = PadResizeError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse_hex(&value)
    }
}

impl From<BackgroundColor> for String {
    fn from(color: BackgroundColor) -> Self {
        color.to_string()
    }
}

/// Everything a batch runner needs, fixed at construction
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub target: TargetBox,
    pub background: BackgroundColor,
    pub format: OutputFormat,
    pub quality: u8,
    pub filter: FilterType,
    pub workers: usize,
    pub queue_capacity: usize,
}

impl BatchSettings {
    /// Settings for `target` with everything else taken from the processing config
    pub fn new(target: TargetBox, processing: &ProcessingConfig) -> Self {
        Self {
            target,
            background: processing.background_color,
            format: processing.output_format,
            quality: processing.quality,
            filter: processing.filter,
            workers: processing.workers,
            queue_capacity: processing.queue_capacity,
        }
    }

    /// Override the background color
    pub fn background(mut self, background: BackgroundColor) -> Self {
        self.background = background;
        self
    }

    /// Override the worker count
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Override the output format
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Check the settings before any item is dispatched
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PadResizeError::config("Worker count must be greater than 0"));
        }

        if self.queue_capacity == 0 {
            return Err(PadResizeError::config("Queue capacity must be greater than 0"));
        }

        if self.quality == 0 || self.quality > 100 {
            return Err(PadResizeError::config(
                format!("Quality must be between 1-100, got {}", self.quality)
            ));
        }

        Ok(())
    }
}
