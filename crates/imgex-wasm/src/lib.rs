//! imgex WASM - WebAssembly bindings for imgex
//!
//! This crate exposes the imgex-core transform pipeline to a browser-hosted
//! canvas front-end.
//!
//! # Module Structure
//!
//! - `types` - WASM-compatible wrapper types for raster data
//! - `entity` - Transformable image bindings (move, zoom, crop, replay)
//! - `gesture` - Crop overlay bindings
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsRaster, JsTransformable } from '@imgex/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const image = new JsTransformable(JsRaster.decode(bytes), 1);
//! const [x, y, w, h] = image.zoom_to(1.5);
//! ```

use wasm_bindgen::prelude::*;

mod entity;
mod gesture;
mod types;

// Re-export public types
pub use entity::JsTransformable;
pub use gesture::JsCropGesture;
pub use types::JsRaster;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    types::console_debug(&format!("imgex {} ready", version()));
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
