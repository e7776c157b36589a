//! PadResize - Batch Resize-and-Pad for Images
//!
//! Fits every image of a batch inside a fixed width x height box, keeping its
//! aspect ratio, and fills the remaining space with a solid background color.
//! Every output has exactly the requested dimensions.
//!
//! # Features
//!
//! - **Exact output size**: letterbox or pillarbox bands, image centered
//! - **Bounded parallelism**: fixed worker pool fed by a bounded queue
//! - **Failure isolation**: a bad file is reported, the batch keeps going
//! - **Two front ends**: folder-based CLI and a web upload form
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use padresize::{BatchRunner, BatchSettings, Config, ProcessingItem, TargetBox};
//! use std::path::Path;
//!
//! let config = Config::default();
//! let target = TargetBox::new(800, 600)?;
//! let runner = BatchRunner::new(BatchSettings::new(target, &config.processing))?;
//!
//! let item = ProcessingItem::from_path(
//!     Path::new("photos/cat.png"),
//!     Path::new("photos/Processed"),
//!     config.processing.output_format,
//! );
//! let result = runner.run(vec![item])?;
//! println!("{} written, {} failed", result.succeeded, result.failed);
//! # Ok::<(), padresize::PadResizeError>(())
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod input;
pub mod processing;
pub mod parallel;
pub mod web;

// Re-export commonly used types
pub use config::{BackgroundColor, BatchSettings, Config, LoggingConfig, OutputFormat, TargetBox};
pub use error::{Result, PadResizeError};
pub use parallel::{BatchResult, BatchRunner};
pub use processing::{resize_and_pad, ProcessingEngine, ProcessingItem};

use tracing::info;
use tracing_subscriber::EnvFilter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging from the logging configuration.
///
/// `RUST_LOG` takes precedence over the configured level. Calling this more
/// than once keeps the first subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            PadResizeError::config(format!("Invalid log level '{}': {}", config.level, e))
        })?,
    };

    let installed = if config.json_format {
        tracing::subscriber::set_global_default(
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish(),
        )
        .is_ok()
    } else {
        tracing::subscriber::set_global_default(
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish(),
        )
        .is_ok()
    };

    if installed {
        info!("PadResize v{} initialized", VERSION);
    }

    Ok(())
}
