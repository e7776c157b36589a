//! Configuration management for PadResize

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use crate::error::{Result, PadResizeError};
use crate::processing::FilterType;

pub mod params;
pub use params::*;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings shared by every batch
    pub processing: ProcessingConfig,

    /// Web form settings
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Settings applied to every item of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Padding color around the resized image
    pub background_color: BackgroundColor,

    /// Format every output is encoded in, regardless of the source format
    pub output_format: OutputFormat,

    /// Encoder quality (1-100), used by lossy formats
    pub quality: u8,

    /// Number of worker threads
    pub workers: usize,

    /// Capacity of the bounded job queue feeding the workers
    pub queue_capacity: usize,

    /// Resampling filter
    pub filter: FilterType,

    /// Output folder created inside the input folder by the CLI
    pub output_subdir: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            background_color: BackgroundColor::WHITE,
            output_format: OutputFormat::Jpeg,
            quality: 75,
            workers: 4,
            queue_capacity: 16,
            filter: FilterType::Lanczos3,
            output_subdir: "Processed".to_string(),
        }
    }
}

/// Web form configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    pub bind: SocketAddr,

    /// Directory uploaded images are written to
    pub output_dir: PathBuf,

    /// Maximum accepted request body size in bytes
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            output_dir: PathBuf::from("processed"),
            max_upload_bytes: 50 * 1024 * 1024, // 50MB
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Raster format written for every output
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    /// Get file extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    /// Get MIME type for this format
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| PadResizeError::config(
                format!("Failed to read config file {:?}: {}", path.as_ref(), e)
            ))?;

        let config: Config = match config_extension(path.as_ref())?.as_str() {
            "toml" => toml::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = match config_extension(path.as_ref())?.as_str() {
            "toml" => toml::to_string_pretty(self)
                .map_err(|e| PadResizeError::Serialization(format!("TOML serialization failed: {}", e)))?,
            _ => serde_yaml::to_string(self)
                .map_err(|e| PadResizeError::Serialization(format!("YAML serialization failed: {}", e)))?,
        };

        std::fs::write(&path, content)
            .map_err(|e| PadResizeError::config(
                format!("Failed to write config file {:?}: {}", path.as_ref(), e)
            ))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let processing = &self.processing;

        if processing.quality == 0 || processing.quality > 100 {
            return Err(PadResizeError::config(
                format!("Quality must be between 1 and 100, got {}", processing.quality)
            ));
        }

        if processing.workers == 0 {
            return Err(PadResizeError::config("Worker count must be greater than 0"));
        }

        if processing.queue_capacity == 0 {
            return Err(PadResizeError::config("Queue capacity must be greater than 0"));
        }

        if processing.output_subdir.trim().is_empty() {
            return Err(PadResizeError::config("Output folder name must not be empty"));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(PadResizeError::config("Maximum upload size must be greater than 0"));
        }

        Ok(())
    }
}

/// Lower-cased extension of a config file, restricted to the supported ones
fn config_extension(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "toml" | "yaml" | "yml" => Ok(extension),
        _ => Err(PadResizeError::config(
            "Unsupported config file format. Use .toml or .yaml"
        )),
    }
}
