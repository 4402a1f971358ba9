//! WASM bindings for the crop overlay.

use imgex_core::{CropGesture, EventStatus, Point, Rect, Transform};
use wasm_bindgen::prelude::*;

use crate::types::rect_to_vec;

/// Pointer-driven crop selection over a displayed image.
///
/// Coordinates are in the displayed image's own pixels. Each event returns
/// a status code: 0 = ignored, 1 = done, 2 = repaint overlay, 3 = finished.
#[wasm_bindgen]
pub struct JsCropGesture {
    inner: CropGesture,
}

#[wasm_bindgen]
impl JsCropGesture {
    /// Start with the selection covering the whole `width` x `height` image.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32) -> JsCropGesture {
        JsCropGesture {
            inner: CropGesture::new(Rect::new(0, 0, width, height)),
        }
    }

    pub fn press(&mut self, x: i32, y: i32) -> u8 {
        status_code(self.inner.press(Point::new(x, y)))
    }

    pub fn drag(&mut self, x: i32, y: i32) -> u8 {
        status_code(self.inner.drag(Point::new(x, y)))
    }

    pub fn release(&mut self) -> u8 {
        status_code(self.inner.release())
    }

    /// `[x, y, width, height]` of the current selection.
    pub fn selection(&self) -> Vec<i32> {
        rect_to_vec(self.inner.selection())
    }
}

impl JsCropGesture {
    pub(crate) fn to_transform(&self) -> Transform {
        self.inner.to_transform()
    }
}

fn status_code(status: EventStatus) -> u8 {
    match status {
        EventStatus::Ignored => 0,
        EventStatus::Done => 1,
        EventStatus::Redraw => 2,
        EventStatus::Finished => 3,
    }
}
