//! Error types and handling for PadResize

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for PadResize operations
pub type Result<T> = std::result::Result<T, PadResizeError>;

/// Main error type for PadResize operations
#[derive(Debug, Error)]
pub enum PadResizeError {
    /// Bad dimensions, bad color string, missing or empty input set
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Unreadable or corrupt source image
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// Degenerate source dimensions or a failed resample step
    #[error("Transform failed: {message}")]
    Transform { message: String },

    /// Encoder rejected the padded image
    #[error("Failed to encode image: {message}")]
    Encode { message: String },

    /// Output path not writable
    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O errors outside of output writing (reading inputs, listing folders)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Thread pool or runtime errors
    #[error("System error: {message}")]
    System { message: String },
}

impl PadResizeError {
    /// Create a new invalid configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(message: S) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a new transform error
    pub fn transform<S: Into<String>>(message: S) -> Self {
        Self::Transform {
            message: message.into(),
        }
    }

    /// Create a new encode error
    pub fn encode<S: Into<String>>(message: S) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }

    /// Create a new write error
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Create a new system error
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    /// Whether this error belongs to a single item (the batch keeps going)
    /// rather than to the whole operation.
    pub fn is_item_error(&self) -> bool {
        match self {
            Self::Decode { .. }
            | Self::Transform { .. }
            | Self::Encode { .. }
            | Self::Write { .. }
            | Self::Io(_) => true,

            Self::InvalidConfiguration { .. } | Self::Serialization(_) | Self::System { .. } => {
                false
            }
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidConfiguration { message } => message.clone(),
            Self::Decode { .. } => {
                "The file could not be read as an image. Supported inputs: PNG, JPEG".to_string()
            }
            Self::Write { path, source } => {
                format!("Could not write {}: {}", path.display(), source)
            }
            other => other.to_string(),
        }
    }
}

// Convert serde errors to our error type
impl From<toml::de::Error> for PadResizeError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(format!("TOML parsing error: {}", err))
    }
}

impl From<serde_yaml::Error> for PadResizeError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(format!("YAML parsing error: {}", err))
    }
}
