//! Resize-and-pad: fit an image inside a fixed box and fill the rest with a solid color

use image::{imageops, DynamicImage, GenericImageView, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{BackgroundColor, TargetBox};
use crate::error::{Result, PadResizeError};

/// Available resampling filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Nearest neighbor (fastest, lowest quality)
    Nearest,
    /// Triangle (linear interpolation)
    Triangle,
    /// Catmull-Rom cubic spline
    CatmullRom,
    /// Gaussian blur
    Gaussian,
    /// Lanczos with radius 3 (high quality, recommended)
    #[default]
    Lanczos3,
}

impl From<FilterType> for imageops::FilterType {
    fn from(filter: FilterType) -> Self {
        match filter {
            FilterType::Nearest => imageops::FilterType::Nearest,
            FilterType::Triangle => imageops::FilterType::Triangle,
            FilterType::CatmullRom => imageops::FilterType::CatmullRom,
            FilterType::Gaussian => imageops::FilterType::Gaussian,
            FilterType::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

/// Size of the scaled source and where it sits on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

/// Largest aspect-preserving size of `source_width x source_height` that fits
/// inside `target`, centered.
///
/// Equivalent to `floor(side * min(tw / sw, th / sh))` on each side, computed
/// in integers so the limiting side always lands exactly on the target.
pub fn fit_within(source_width: u32, source_height: u32, target: TargetBox) -> Result<Placement> {
    if source_width == 0 || source_height == 0 {
        return Err(PadResizeError::transform(format!(
            "invalid image: source has zero width or height ({}x{})",
            source_width, source_height
        )));
    }

    let (sw, sh) = (u64::from(source_width), u64::from(source_height));
    let (tw, th) = (u64::from(target.width()), u64::from(target.height()));

    let (width, height) = if tw * sh <= th * sw {
        (tw, sh * tw / sw)
    } else {
        (sw * th / sh, th)
    };

    // A 1-pixel strip rather than an empty paste for extreme aspect ratios
    let width = width.max(1) as u32;
    let height = height.max(1) as u32;

    Ok(Placement {
        width,
        height,
        x: (target.width() - width) / 2,
        y: (target.height() - height) / 2,
    })
}

/// Resize `source` to fit inside `target` without distortion and center it on
/// a canvas of exactly `target` filled with `background`.
///
/// Any color mode is accepted. Transparent areas are composited over the
/// background; the result is always RGB8.
pub fn resize_and_pad(
    source: &DynamicImage,
    target: TargetBox,
    background: BackgroundColor,
    filter: FilterType,
) -> Result<DynamicImage> {
    let (source_width, source_height) = source.dimensions();
    let placement = fit_within(source_width, source_height, target)?;

    debug!(
        "Resizing {}x{} -> {}x{} at ({}, {}) on {} canvas using {:?}",
        source_width, source_height,
        placement.width, placement.height,
        placement.x, placement.y,
        target, filter
    );

    let rgba = source.to_rgba8();
    let resized = if placement.width == source_width && placement.height == source_height {
        rgba
    } else {
        imageops::resize(&rgba, placement.width, placement.height, filter.into())
    };

    let mut canvas = RgbaImage::from_pixel(target.width(), target.height(), background.to_rgba());
    imageops::overlay(&mut canvas, &resized, i64::from(placement.x), i64::from(placement.y));

    Ok(DynamicImage::ImageRgba8(canvas).into_rgb8().into())
}
