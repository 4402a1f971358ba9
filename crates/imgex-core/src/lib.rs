//! imgex Core - Image viewer transform library
//!
//! This crate provides the geometric core of the imgex image viewer:
//! typed coordinate frames, the transform pipeline (crop, zoom, move),
//! transformable image entities, hosting panels and session persistence.
//!
//! Rendering and windowing live outside this crate. They drive it through
//! [`Panel`] and read back redraw regions.

pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod gesture;
pub mod image_file;
pub mod panel;
pub mod raster;
pub mod session;
pub mod transform;
pub mod transformable;

pub use config::{ConfigError, ViewerConfig};
pub use error::{Result, TransformError};
pub use frame::{Convert, FrameContext, ImagePlacement, PanelGeometry, ScreenGeometry};
pub use geometry::{Point, Rect, Size};
pub use gesture::{CropGesture, EventStatus};
pub use image_file::ImageFile;
pub use panel::{EntityId, Panel, PanelSet, ScreenLayout};
pub use raster::{FilterType, Raster};
pub use session::{Session, SessionEntry, SessionError};
pub use transform::{ApplyContext, Pipeline, Transform, TransformKind};
pub use transformable::{Phase, Transformable};
