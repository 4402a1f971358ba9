//! WASM bindings for transformable images.
//!
//! Every mutating call returns the redraw region as `[x, y, width, height]`
//! in panel coordinates. The canvas front-end repaints that region and
//! nothing else.

use imgex_core::{Pipeline, Point, Rect, Transformable};
use wasm_bindgen::prelude::*;

use crate::gesture::JsCropGesture;
use crate::types::{console_debug, filter_from_u8, rect_to_vec, to_js_error, JsRaster};

/// An image with a replayable transform pipeline.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const image = new JsTransformable(JsRaster.decode(bytes), 1);
/// repaint(image.zoom_to(2.0));
/// repaint(image.move_to(40, 40));
/// localStorage.setItem('pipeline', JSON.stringify(image.pipeline()));
/// ```
#[wasm_bindgen]
pub struct JsTransformable {
    inner: Transformable,
}

#[wasm_bindgen]
impl JsTransformable {
    /// Wrap a raster, placing it at the panel origin.
    ///
    /// # Arguments
    /// * `image` - Source raster
    /// * `filter` - Resampling filter (0=Nearest, 1=Bilinear, 2=Lanczos3)
    #[wasm_bindgen(constructor)]
    pub fn new(image: &JsRaster, filter: u8) -> JsTransformable {
        JsTransformable {
            inner: Transformable::from_raster(image.to_raster()).with_filter(filter_from_u8(filter)),
        }
    }

    pub fn move_to(&mut self, x: i32, y: i32) -> Vec<i32> {
        rect_to_vec(self.inner.move_to(Point::new(x, y)))
    }

    pub fn zoom_to(&mut self, factor: f64) -> Result<Vec<i32>, JsValue> {
        self.inner
            .zoom_to(factor)
            .map(rect_to_vec)
            .map_err(to_js_error)
    }

    /// Crop to a rect in displayed image coordinates.
    pub fn crop(&mut self, x: i32, y: i32, width: u32, height: u32) -> Result<Vec<i32>, JsValue> {
        self.inner
            .crop(Rect::new(x, y, width, height))
            .map(rect_to_vec)
            .map_err(to_js_error)
    }

    /// Apply the selection of a finished crop gesture.
    pub fn commit_gesture(&mut self, gesture: &JsCropGesture) -> Result<Vec<i32>, JsValue> {
        self.inner
            .commit(gesture.to_transform())
            .map(rect_to_vec)
            .map_err(to_js_error)
    }

    /// Replay the pipeline from the source raster.
    pub fn run(&mut self) -> Result<Vec<i32>, JsValue> {
        self.inner.run().map(rect_to_vec).map_err(to_js_error)
    }

    /// Become a deep copy of `other`.
    pub fn copy_from(&mut self, other: &JsTransformable) -> Vec<i32> {
        rect_to_vec(self.inner.copy_from(&other.inner))
    }

    /// Human-readable pipeline, e.g. `[Z(1.5),C(0,0;34,34),M(5,5)]`.
    pub fn dump(&self) -> String {
        let dump = self.inner.pipeline().to_string();
        console_debug(&format!("{} at {}", dump, self.inner.bounds()));
        dump
    }

    /// The pipeline as an array of tagged records.
    pub fn pipeline(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.pipeline()).map_err(to_js_error)
    }

    /// Replace the pipeline with persisted records and run it.
    pub fn set_pipeline(&mut self, records: JsValue) -> Result<Vec<i32>, JsValue> {
        let pipeline: Pipeline = serde_wasm_bindgen::from_value(records).map_err(to_js_error)?;
        self.inner.restore(pipeline).map(rect_to_vec).map_err(to_js_error)
    }

    /// `[x, y, width, height]` of the displayed raster in the panel.
    pub fn bounds(&self) -> Vec<i32> {
        rect_to_vec(self.inner.bounds())
    }

    /// The displayed raster (a copy).
    pub fn raster(&self) -> JsRaster {
        JsRaster::from_raster(self.inner.raster().clone())
    }

    #[wasm_bindgen(getter)]
    pub fn zoom(&self) -> f64 {
        self.inner.zoom()
    }

    #[wasm_bindgen(getter)]
    pub fn is_inert(&self) -> bool {
        self.inner.is_inert()
    }

    /// Whether the panel point `(x, y)` falls on the image.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.inner.bounds().contains(Point::new(x, y))
    }
}
