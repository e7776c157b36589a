//! Core image processing functionality

use std::fmt;
use std::path::{Path, PathBuf};
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage, GenericImageView, ImageEncoder};
use serde::Serialize;
use tracing::debug;

use crate::config::{BackgroundColor, BatchSettings, OutputFormat, TargetBox};
use crate::error::{Result, PadResizeError};

pub mod pad;
pub mod formats;

pub use pad::*;
pub use formats::*;

/// Where an item's encoded source image comes from
#[derive(Debug, Clone)]
pub enum ItemSource {
    /// A file on disk, read by the worker
    Path(PathBuf),
    /// Bytes already in memory (uploads)
    Bytes(Bytes),
}

/// One unit of work for the batch runner
#[derive(Debug, Clone)]
pub struct ProcessingItem {
    /// Name used in logs and reports
    pub identifier: String,
    pub source: ItemSource,
    pub output_path: PathBuf,
}

impl ProcessingItem {
    /// Item for a file on disk, written to `output_dir` under its base name
    pub fn from_path(path: &Path, output_dir: &Path, format: OutputFormat) -> Self {
        let identifier = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let output_path = output_path_for(&identifier, output_dir, format);

        Self {
            identifier,
            source: ItemSource::Path(path.to_path_buf()),
            output_path,
        }
    }

    /// Item for in-memory bytes named `file_name`
    pub fn from_bytes(file_name: &str, data: Bytes, output_dir: &Path, format: OutputFormat) -> Self {
        Self {
            identifier: file_name.to_string(),
            source: ItemSource::Bytes(data),
            output_path: output_path_for(file_name, output_dir, format),
        }
    }
}

/// Lifecycle of a single item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStage {
    Pending,
    Decoding,
    Transforming,
    Encoding,
    Written,
    Failed,
}

impl fmt::Display for ItemStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Decoding => "decoding",
            Self::Transforming => "transforming",
            Self::Encoding => "encoding",
            Self::Written => "written",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A successfully written output
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedImage {
    pub source_width: u32,
    pub source_height: u32,
    pub output_path: PathBuf,
    pub bytes_written: u64,
}

/// The first error an item hit, and the stage it was in
#[derive(Debug)]
pub struct ItemFailure {
    pub stage: ItemStage,
    pub error: PadResizeError,
}

impl ItemFailure {
    fn at(stage: ItemStage) -> impl FnOnce(PadResizeError) -> Self {
        move |error| Self { stage, error }
    }
}

/// Runs decode, resize-and-pad, encode and write for one item
#[derive(Debug, Clone)]
pub struct ProcessingEngine {
    target: TargetBox,
    background: BackgroundColor,
    format: OutputFormat,
    quality: u8,
    filter: FilterType,
}

impl ProcessingEngine {
    /// Create a new processing engine
    pub fn new(settings: &BatchSettings) -> Self {
        Self {
            target: settings.target,
            background: settings.background,
            format: settings.format,
            quality: settings.quality,
            filter: settings.filter,
        }
    }

    /// Process one item through every stage, stopping at the first error
    pub fn process(&self, item: &ProcessingItem) -> std::result::Result<ProcessedImage, ItemFailure> {
        debug!("Processing item: {} -> {:?}", item.identifier, item.output_path);

        let image = load_source(&item.source).map_err(ItemFailure::at(ItemStage::Decoding))?;
        let (source_width, source_height) = image.dimensions();

        let padded = resize_and_pad(&image, self.target, self.background, self.filter)
            .map_err(ItemFailure::at(ItemStage::Transforming))?;
        drop(image);

        let encoded = encode_image(&padded, self.format, self.quality)
            .map_err(ItemFailure::at(ItemStage::Encoding))?;

        if item.output_path.exists() {
            debug!("Overwriting existing output: {:?}", item.output_path);
        }

        std::fs::write(&item.output_path, &encoded)
            .map_err(|e| PadResizeError::write(&item.output_path, e))
            .map_err(ItemFailure::at(ItemStage::Encoding))?;

        Ok(ProcessedImage {
            source_width,
            source_height,
            output_path: item.output_path.clone(),
            bytes_written: encoded.len() as u64,
        })
    }
}

/// Read and decode an item's source
fn load_source(source: &ItemSource) -> Result<DynamicImage> {
    match source {
        ItemSource::Path(path) => {
            let data = std::fs::read(path)
                .map_err(|e| PadResizeError::decode(format!("cannot read {:?}: {}", path, e)))?;
            decode_image(&data)
        }
        ItemSource::Bytes(data) => decode_image(data),
    }
}

/// Decode an image from memory, guessing the format from its content
pub fn decode_image(data: &[u8]) -> Result<DynamicImage> {
    if data.is_empty() {
        return Err(PadResizeError::decode("file is empty"));
    }

    image::load_from_memory(data).map_err(|e| PadResizeError::decode(e.to_string()))
}

/// Encode an image in the output format
pub fn encode_image(image: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut buf = Vec::new();

    match format {
        OutputFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut buf, quality)
                .encode(rgb.as_raw(), width, height, ColorType::Rgb8)
                .map_err(|e| PadResizeError::encode(format!("JPEG: {}", e)))?;
        }
        OutputFormat::Png => {
            PngEncoder::new(&mut buf)
                .write_image(rgb.as_raw(), width, height, ColorType::Rgb8)
                .map_err(|e| PadResizeError::encode(format!("PNG: {}", e)))?;
        }
    }

    Ok(buf)
}
