//! Working pixel buffers.
//!
//! A [`Raster`] is the RGB pixel buffer an entity displays. Transforms
//! replace it wholesale (crop, resample) and never edit pixels in place,
//! so every operation here returns a new raster and leaves its input
//! untouched.
//!
//! Loading goes through the `image` crate and accepts any format it was
//! built with. Resampling uses `image::imageops::resize`.

use std::io::Cursor;
use std::path::Path;

use image::ImageReader;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TransformError};
use crate::geometry::{ImageLocal, Rect, Size};

/// Largest raster a resample may produce, in pixels (768 MiB of RGB).
pub const MAX_RASTER_PIXELS: u64 = 1 << 28;

/// Check a resample target against [`MAX_RASTER_PIXELS`] before anything
/// is allocated.
///
/// # Errors
///
/// Returns `TransformError::RasterTooLarge` if either side does not fit a
/// `u32` or the pixel count is over the limit.
pub fn checked_size(width: u64, height: u64) -> Result<Size> {
    let too_large = || TransformError::RasterTooLarge { width, height };
    let w = u32::try_from(width).map_err(|_| too_large())?;
    let h = u32::try_from(height).map_err(|_| too_large())?;
    if width.saturating_mul(height) > MAX_RASTER_PIXELS {
        return Err(too_large());
    }
    Ok(Size::new(w, h))
}

/// Filter type for resampling a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    #[default]
    Bilinear,
    /// Lanczos3 interpolation (slower, highest quality).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// An RGB raster.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Raster {
    /// Raster width in pixels.
    pub width: u32,
    /// Raster height in pixels.
    pub height: u32,
    /// RGB pixel data in row-major order (3 bytes per pixel).
    /// Length should be width * height * 3.
    pub pixels: Vec<u8>,
}

impl Raster {
    /// Create a new Raster with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width * height * 3) as usize,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A raster with no pixels; what an entity holds after an empty crop.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load and decode an image file.
    ///
    /// # Errors
    ///
    /// Any failure to open or decode the file is reported as
    /// `TransformError::SourceNotFound`: the caller cannot build an entity
    /// either way.
    pub fn open(path: &Path) -> Result<Self> {
        let not_found = |reason: String| TransformError::SourceNotFound {
            path: path.to_path_buf(),
            reason,
        };

        let img = ImageReader::open(path)
            .map_err(|e| not_found(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| not_found(e.to_string()))?
            .decode()
            .map_err(|e| not_found(e.to_string()))?;

        let raster = Self::from_rgb_image(img.into_rgb8());
        log::debug!(
            "Loaded {}x{} raster from {}",
            raster.width,
            raster.height,
            path.display()
        );
        Ok(raster)
    }

    /// Decode an in-memory encoded image (PNG, JPEG).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let not_found = |reason: String| TransformError::SourceNotFound {
            path: "<memory>".into(),
            reason,
        };

        let img = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| not_found(e.to_string()))?
            .decode()
            .map_err(|e| not_found(e.to_string()))?;

        Ok(Self::from_rgb_image(img.into_rgb8()))
    }

    /// Create a Raster from an image::RgbImage.
    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        let pixels = img.into_raw();
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Convert to an image::RgbImage for resampling or encoding.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::CorruptRaster` if the pixel buffer does not
    /// match the dimensions.
    pub fn to_rgb_image(&self) -> Result<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels.clone()).ok_or_else(|| {
            TransformError::CorruptRaster(format!(
                "{} bytes for {}x{} pixels",
                self.pixels.len(),
                self.width,
                self.height
            ))
        })
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// The raster's own extent, anchored at the local origin.
    pub fn extent(&self) -> Rect<ImageLocal> {
        Rect::new(0, 0, self.width, self.height)
    }

    /// Check if this raster has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    /// Copy out the part of the raster covered by `rect`.
    ///
    /// The rect is clipped to the raster's extent first. An empty
    /// intersection gives an empty raster.
    pub fn crop(&self, rect: Rect<ImageLocal>) -> Raster {
        let clip = rect.intersection(&self.extent());
        if clip.is_null() {
            return Raster::empty();
        }

        // Fast path: full crop returns a clone
        if clip == self.extent() {
            return self.clone();
        }

        let (left, top) = (clip.x() as u32, clip.y() as u32);
        let (out_width, out_height) = (clip.width(), clip.height());
        let row_bytes = (out_width * 3) as usize;
        let mut output = Vec::with_capacity(row_bytes * out_height as usize);

        // Copy pixel data row by row
        for y in 0..out_height {
            let src_start = (((top + y) * self.width + left) * 3) as usize;
            output.extend_from_slice(&self.pixels[src_start..src_start + row_bytes]);
        }

        Raster {
            width: out_width,
            height: out_height,
            pixels: output,
        }
    }

    /// Resample to exact dimensions.
    ///
    /// A zero target dimension, or an empty source, gives an empty raster.
    ///
    /// # Errors
    ///
    /// - `TransformError::RasterTooLarge` if the target is over
    ///   [`MAX_RASTER_PIXELS`]
    /// - `TransformError::CorruptRaster` if the source buffer cannot be
    ///   converted
    pub fn resize(&self, width: u32, height: u32, filter: FilterType) -> Result<Raster> {
        if width == 0 || height == 0 || self.is_empty() {
            return Ok(Raster::empty());
        }
        checked_size(width.into(), height.into())?;

        // Fast path: if dimensions match, just clone
        if self.width == width && self.height == height {
            return Ok(self.clone());
        }

        let rgb_image = self.to_rgb_image()?;
        let resized = image::imageops::resize(&rgb_image, width, height, filter.to_image_filter());

        Ok(Raster::from_rgb_image(resized))
    }
}
