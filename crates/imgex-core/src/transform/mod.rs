//! Image transforms and the pipeline that orders them.
//!
//! A [`Transform`] is one geometric operation on an image's raster and
//! bounding box. The set of kinds is closed:
//!
//! - `Nop` - identity, the placeholder a gesture produces when it has
//!   nothing to say
//! - `Crop` - keep a sub-rectangle of the image
//! - `ZoomTo` - absolute scale factor, anchored at the box centre
//! - `MoveTo` - absolute top-left position in the panel
//!
//! # Replay Order
//!
//! However the user issued them, a [`Pipeline`] keeps its transforms in
//! this order:
//! 1. Zoom (at most one)
//! 2. Crops, in the order they were made
//! 3. Move (at most one)
//!
//! # Coordinate System
//!
//! - Crop rectangles are stored in the image's pre-zoom frame, so that a
//!   persisted crop selects the same region at any zoom level
//! - Move targets are panel coordinates
//! - Zoom factors are relative to the untransformed source image

mod pipeline;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransformError};
use crate::frame::ImagePlacement;
use crate::geometry::{ImageLocal, Panel, Point, Rect, Size};
use crate::raster::{self, FilterType, Raster};

pub use pipeline::Pipeline;

/// Slack subtracted before rounding a zoomed length up, so that products
/// like `10 * 1.1 = 11.000000000000002` stay at 11.
const ZOOM_ROUNDING_SLACK: f64 = 1e-6;

/// Stable identifier of a transform's kind.
///
/// Ordered by precedence; `Nop` is the lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    Nop,
    Crop,
    ZoomTo,
    MoveTo,
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransformKind::Nop => "nop",
            TransformKind::Crop => "crop",
            TransformKind::ZoomTo => "zoom",
            TransformKind::MoveTo => "move",
        })
    }
}

/// One geometric operation, carrying exactly the fields needed to replay it.
///
/// Persisted as an internally tagged record, e.g.
/// `{"kind":"crop","x":0,"y":0,"w":50,"h":50}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    /// Identity.
    Nop,
    /// Keep `{x, y, w, h}`, given in the pre-zoom image frame.
    Crop { x: i32, y: i32, w: u32, h: u32 },
    /// Scale the source image by `factor`.
    ZoomTo { factor: f64 },
    /// Place the image's top-left at `(x, y)` in the panel.
    MoveTo { x: i32, y: i32 },
}

/// Settings shared by every transform during one replay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApplyContext {
    /// Filter used when resampling.
    pub filter: FilterType,
    /// Factor of the zoom in effect; crops scale their rectangle by it.
    pub zoom: f64,
}

impl Default for ApplyContext {
    fn default() -> Self {
        Self {
            filter: FilterType::default(),
            zoom: 1.0,
        }
    }
}

impl Transform {
    pub fn crop(rect: Rect<ImageLocal>) -> Self {
        Transform::Crop {
            x: rect.x(),
            y: rect.y(),
            w: rect.width(),
            h: rect.height(),
        }
    }

    pub fn zoom_to(factor: f64) -> Self {
        Transform::ZoomTo { factor }
    }

    pub fn move_to(p: Point<Panel>) -> Self {
        Transform::MoveTo { x: p.x, y: p.y }
    }

    pub fn kind(&self) -> TransformKind {
        match self {
            Transform::Nop => TransformKind::Nop,
            Transform::Crop { .. } => TransformKind::Crop,
            Transform::ZoomTo { .. } => TransformKind::ZoomTo,
            Transform::MoveTo { .. } => TransformKind::MoveTo,
        }
    }

    /// Pipeline bookkeeping compares kinds only, never field values.
    pub fn same_kind(&self, other: &Transform) -> bool {
        self.kind() == other.kind()
    }

    /// Check the transform's fields.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidZoomFactor` for a zoom factor that is
    /// not finite and strictly positive.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Transform::ZoomTo { factor } if !(factor.is_finite() && factor > 0.0) => {
                Err(TransformError::InvalidZoomFactor(factor))
            }
            _ => Ok(()),
        }
    }

    /// Combine a later transform of the same kind into this one.
    ///
    /// The later transform wins: its fields replace the receiver's.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::MismatchedTransformKind` when the kinds
    /// differ; the receiver is left unchanged.
    pub fn merge(&mut self, other: Transform) -> Result<()> {
        if !self.same_kind(&other) {
            return Err(TransformError::MismatchedTransformKind {
                expected: self.kind(),
                found: other.kind(),
            });
        }
        *self = other;
        Ok(())
    }

    /// Apply this transform to a raster and its bounding box.
    ///
    /// `raster` is replaced in place (scaled, cropped or left alone) and the
    /// new bounding box in panel coordinates is returned. Nothing outside
    /// the raster and the returned box is touched.
    ///
    /// # Arguments
    ///
    /// * `owner` - The raster's current bounding box in the panel
    /// * `raster` - The raster to transform
    /// * `ctx` - Resampling filter and the zoom factor in effect
    ///
    /// # Behavior
    ///
    /// - An empty raster is inert: every kind returns a null box and leaves
    ///   the raster empty
    /// - A crop missing the raster entirely empties it and returns a null box
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidZoomFactor` for a non-positive zoom
    /// and `TransformError::RasterTooLarge` for a zoom past the raster size
    /// limit, both before the raster is touched.
    pub fn apply(
        &self,
        owner: Rect<Panel>,
        raster: &mut Raster,
        ctx: &ApplyContext,
    ) -> Result<Rect<Panel>> {
        self.validate()?;

        let inert = Rect::from_origin_size(owner.origin(), Size::ZERO);
        if raster.is_empty() {
            return Ok(inert);
        }

        match *self {
            Transform::Nop => Ok(owner),
            Transform::Crop { x, y, w, h } => {
                let placement = ImagePlacement::new(owner.origin(), ctx.zoom);
                let wanted = placement.to_displayed_rect(Rect::new(x, y, w, h));
                let clip = wanted.intersection(&raster.extent());
                *raster = raster.crop(clip);
                if clip.is_null() {
                    log::debug!("Crop {self} misses the {}x{} raster", owner.width(), owner.height());
                    return Ok(inert);
                }
                Ok(Rect::from_origin_size(
                    owner.origin().offset(clip.x(), clip.y()),
                    clip.size(),
                ))
            }
            Transform::ZoomTo { factor } => {
                let target = zoomed_size(raster.size(), factor)?;
                let resized = raster.resize(target.width, target.height, ctx.filter)?;
                *raster = resized;
                let (half_w, half_h) = target.half();
                let center = owner.center();
                Ok(Rect::from_origin_size(
                    center.offset(-half_w, -half_h),
                    target,
                ))
            }
            Transform::MoveTo { x, y } => Ok(owner.with_origin(Point::new(x, y))),
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Nop => f.write_str("N"),
            Transform::Crop { x, y, w, h } => write!(f, "C({x},{y};{w},{h})"),
            Transform::ZoomTo { factor } => write!(f, "Z({factor})"),
            Transform::MoveTo { x, y } => write!(f, "M({x},{y})"),
        }
    }
}

/// Size of a raster zoomed by `factor`: `ceil(len * factor)` per axis.
///
/// Rounding up means repeated zooms never lose a row or column to
/// truncation. A non-empty axis never collapses to zero.
///
/// # Errors
///
/// Returns `TransformError::RasterTooLarge` when the result would exceed
/// [`raster::MAX_RASTER_PIXELS`].
pub fn zoomed_size(size: Size, factor: f64) -> Result<Size> {
    let scale = |len: u32| -> u64 {
        if len == 0 {
            return 0;
        }
        let scaled = (f64::from(len) * factor - ZOOM_ROUNDING_SLACK).ceil();
        (scaled as u64).max(1)
    };
    raster::checked_size(scale(size.width), scale(size.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_raster(width: u32, height: u32) -> Raster {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((y * width + x) % 256) as u8;
                pixels.extend_from_slice(&[v, v, v]);
            }
        }
        Raster::new(width, height, pixels)
    }

    #[test]
    fn test_kind_precedence() {
        assert!(TransformKind::Nop < TransformKind::Crop);
        assert!(TransformKind::Nop < TransformKind::ZoomTo);
        assert!(TransformKind::Nop < TransformKind::MoveTo);
    }

    #[test]
    fn test_merge_later_wins() {
        let mut t = Transform::zoom_to(2.0);
        t.merge(Transform::zoom_to(3.0)).unwrap();
        assert_eq!(t, Transform::zoom_to(3.0));
    }

    #[test]
    fn test_merge_mismatched_kind() {
        let mut t = Transform::move_to(Point::new(1, 1));
        let err = t.merge(Transform::zoom_to(2.0)).unwrap_err();
        assert_eq!(
            err,
            TransformError::MismatchedTransformKind {
                expected: TransformKind::MoveTo,
                found: TransformKind::ZoomTo,
            }
        );
        assert_eq!(t, Transform::move_to(Point::new(1, 1)));
    }

    #[test]
    fn test_zoomed_size_rounds_up() {
        assert_eq!(zoomed_size(Size::new(10, 10), 1.05).unwrap(), Size::new(11, 11));
        assert_eq!(zoomed_size(Size::new(10, 10), 1.1).unwrap(), Size::new(11, 11));
        assert_eq!(zoomed_size(Size::new(10, 7), 2.0).unwrap(), Size::new(20, 14));
        assert_eq!(zoomed_size(Size::new(3, 3), 0.001).unwrap(), Size::new(1, 1));
        assert_eq!(zoomed_size(Size::ZERO, 2.0).unwrap(), Size::ZERO);
    }

    #[test]
    fn test_zoomed_size_rejects_huge_targets() {
        assert_eq!(
            zoomed_size(Size::new(10, 10), 1e9),
            Err(TransformError::RasterTooLarge {
                width: 10_000_000_000,
                height: 10_000_000_000,
            })
        );
        assert!(zoomed_size(Size::new(10, 10), f64::MAX).is_err());
    }

    #[test]
    fn test_huge_zoom_apply_leaves_raster() {
        let mut raster = test_raster(10, 10);
        let err = Transform::zoom_to(1e9)
            .apply(Rect::new(0, 0, 10, 10), &mut raster, &ApplyContext::default())
            .unwrap_err();
        assert!(matches!(err, TransformError::RasterTooLarge { .. }));
        assert_eq!(raster, test_raster(10, 10));
    }

    #[test]
    fn test_zoom_apply_keeps_center() {
        let mut raster = test_raster(10, 10);
        let owner = Rect::<Panel>::new(100, 100, 10, 10);
        let out = Transform::zoom_to(2.0)
            .apply(owner, &mut raster, &ApplyContext::default())
            .unwrap();

        assert_eq!(out, Rect::new(95, 95, 20, 20));
        assert_eq!(out.center(), owner.center());
        assert_eq!((raster.width, raster.height), (20, 20));
    }

    #[test]
    fn test_zoom_apply_rounding() {
        let mut raster = test_raster(10, 10);
        let out = Transform::zoom_to(1.05)
            .apply(Rect::new(0, 0, 10, 10), &mut raster, &ApplyContext::default())
            .unwrap();
        assert_eq!(out.size(), Size::new(11, 11));
        assert_eq!((raster.width, raster.height), (11, 11));
    }

    #[test]
    fn test_invalid_zoom_leaves_raster_untouched() {
        let mut raster = test_raster(10, 10);
        let before = raster.clone();
        for factor in [0.0, -1.5, f64::NAN, f64::INFINITY] {
            let err = Transform::zoom_to(factor)
                .apply(Rect::new(0, 0, 10, 10), &mut raster, &ApplyContext::default())
                .unwrap_err();
            assert!(matches!(err, TransformError::InvalidZoomFactor(_)));
        }
        assert_eq!(raster, before);
    }

    #[test]
    fn test_crop_apply_shifts_origin() {
        let mut raster = test_raster(10, 10);
        let out = Transform::crop(Rect::new(2, 3, 4, 5))
            .apply(Rect::new(50, 60, 10, 10), &mut raster, &ApplyContext::default())
            .unwrap();

        assert_eq!(out, Rect::new(52, 63, 4, 5));
        assert_eq!((raster.width, raster.height), (4, 5));
        assert_eq!(raster.pixels[0], 32);
    }

    #[test]
    fn test_crop_apply_scales_by_zoom_in_effect() {
        let mut raster = test_raster(40, 40);
        let ctx = ApplyContext {
            zoom: 2.0,
            ..ApplyContext::default()
        };
        let out = Transform::crop(Rect::new(5, 5, 10, 10))
            .apply(Rect::new(0, 0, 40, 40), &mut raster, &ctx)
            .unwrap();
        assert_eq!(out, Rect::new(10, 10, 20, 20));
    }

    #[test]
    fn test_crop_apply_clips() {
        let mut raster = test_raster(10, 10);
        let out = Transform::crop(Rect::new(6, 6, 10, 10))
            .apply(Rect::new(0, 0, 10, 10), &mut raster, &ApplyContext::default())
            .unwrap();
        assert_eq!(out, Rect::new(6, 6, 4, 4));
    }

    #[test]
    fn test_empty_crop_makes_raster_inert() {
        let mut raster = test_raster(10, 10);
        let ctx = ApplyContext::default();
        let out = Transform::crop(Rect::new(30, 30, 5, 5))
            .apply(Rect::new(0, 0, 10, 10), &mut raster, &ctx)
            .unwrap();
        assert!(out.is_null());
        assert!(raster.is_empty());

        // Subsequent transforms are no-ops returning null boxes
        for t in [
            Transform::zoom_to(2.0),
            Transform::move_to(Point::new(4, 4)),
            Transform::crop(Rect::new(0, 0, 1, 1)),
            Transform::Nop,
        ] {
            let out = t.apply(out, &mut raster, &ctx).unwrap();
            assert!(out.is_null());
            assert!(raster.is_empty());
        }
    }

    #[test]
    fn test_move_apply() {
        let mut raster = test_raster(10, 10);
        let before = raster.clone();
        let out = Transform::move_to(Point::new(-5, 7))
            .apply(Rect::new(0, 0, 10, 10), &mut raster, &ApplyContext::default())
            .unwrap();
        assert_eq!(out, Rect::new(-5, 7, 10, 10));
        assert_eq!(raster, before);
    }

    #[test]
    fn test_display() {
        assert_eq!(Transform::Nop.to_string(), "N");
        assert_eq!(Transform::crop(Rect::new(1, 2, 3, 4)).to_string(), "C(1,2;3,4)");
        assert_eq!(Transform::zoom_to(1.5).to_string(), "Z(1.5)");
        assert_eq!(Transform::zoom_to(2.0).to_string(), "Z(2)");
        assert_eq!(Transform::move_to(Point::new(-3, 4)).to_string(), "M(-3,4)");
    }

    #[test]
    fn test_serde_tagged_records() {
        let json = serde_json::to_string(&Transform::crop(Rect::new(0, 0, 50, 50))).unwrap();
        assert_eq!(json, r#"{"kind":"crop","x":0,"y":0,"w":50,"h":50}"#);

        let json = serde_json::to_string(&Transform::zoom_to(1.5)).unwrap();
        assert_eq!(json, r#"{"kind":"zoom_to","factor":1.5}"#);

        let t: Transform = serde_json::from_str(r#"{"kind":"move_to","x":5,"y":5}"#).unwrap();
        assert_eq!(t, Transform::move_to(Point::new(5, 5)));

        let t: Transform = serde_json::from_str(r#"{"kind":"nop"}"#).unwrap();
        assert_eq!(t, Transform::Nop);
    }
}
