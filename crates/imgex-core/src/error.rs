//! Error types for the transform core.

use std::path::PathBuf;

use thiserror::Error;

use crate::transform::TransformKind;

/// Errors raised while loading or transforming an image.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// The raster could not be loaded; the entity is never constructed.
    #[error("Image source not found: {path}: {reason}")]
    SourceNotFound { path: PathBuf, reason: String },

    /// Two transforms of different kinds were merged.
    #[error("Cannot merge {found} transform into {expected} transform")]
    MismatchedTransformKind {
        expected: TransformKind,
        found: TransformKind,
    },

    /// Zoom factors must be finite and strictly positive.
    #[error("Invalid zoom factor: {0}")]
    InvalidZoomFactor(f64),

    /// A persisted transform list is not in canonical replay order.
    #[error("Transform list is not in canonical order: {0}")]
    NonCanonicalOrder(String),

    /// A resample target is beyond what a raster may hold.
    #[error("Raster too large: {width}x{height}")]
    RasterTooLarge { width: u64, height: u64 },

    /// Pixel buffer length does not match the raster dimensions.
    #[error("Corrupted raster: {0}")]
    CorruptRaster(String),
}

/// Result alias for the transform core.
pub type Result<T> = std::result::Result<T, TransformError>;
