//! The transformable image entity.
//!
//! A [`Transformable`] owns everything one displayed image needs: the
//! untransformed source raster, the raster currently on screen, its
//! bounding box in the panel and the [`Pipeline`] that turns one into the
//! other.
//!
//! Every raster-changing operation (zoom, crop, run) rebuilds the displayed
//! raster by replaying the pipeline from the source. Resampling always
//! starts from the original pixels, so repeated zooms never compound
//! their error, and a pipeline restored from disk renders exactly the
//! raster the user saw, in the place the user saw it: whenever a zoom or
//! crop leaves the image somewhere a replay would not put it, the position
//! is recorded as the pipeline's `MoveTo`.
//!
//! Lifecycle: an entity exists only once its raster has loaded
//! ([`Transformable::load`] fails with `SourceNotFound` otherwise). It is
//! [`Phase::Loaded`] until the first mutation and [`Phase::Transforming`]
//! from then on. Closing a panel drops it.

use crate::config::ViewerConfig;
use crate::error::{Result, TransformError};
use crate::frame::ImagePlacement;
use crate::geometry::{ImageLocal, Panel, Point, Rect};
use crate::image_file::ImageFile;
use crate::raster::{FilterType, Raster};
use crate::transform::{Pipeline, Transform};

/// Where an entity is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Raster loaded, nothing applied yet.
    #[default]
    Loaded,
    /// At least one transform has been recorded.
    Transforming,
}

/// An image with a recorded, replayable transform history.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformable {
    /// Untransformed pixels, the starting point of every replay.
    source: Raster,
    /// Pixels as currently displayed.
    raster: Raster,
    /// Box the source occupied when loaded.
    home: Rect<Panel>,
    bounds: Rect<Panel>,
    pipeline: Pipeline,
    filter: FilterType,
    phase: Phase,
}

impl Transformable {
    /// Load an image file, placing it at the panel origin.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::SourceNotFound` if the file cannot be read
    /// or decoded.
    pub fn load(file: &ImageFile) -> Result<Self> {
        let raster = Raster::open(file.path())?;
        log::info!(
            "Loaded {} ({}x{})",
            file.name(),
            raster.width,
            raster.height
        );
        Ok(Self::from_raster(raster))
    }

    /// Wrap an already decoded raster, placing it at the panel origin.
    pub fn from_raster(raster: Raster) -> Self {
        let home = Rect::from_origin_size(Point::origin(), raster.size());
        Self {
            raster: raster.clone(),
            source: raster,
            home,
            bounds: home,
            pipeline: Pipeline::new(),
            filter: FilterType::default(),
            phase: Phase::Loaded,
        }
    }

    /// Use `filter` for every later resample.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn bounds(&self) -> Rect<Panel> {
        self.bounds
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn source(&self) -> &Raster {
        &self.source
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn filter(&self) -> FilterType {
        self.filter
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Zoom factor currently applied to the source.
    pub fn zoom(&self) -> f64 {
        self.pipeline.zoom()
    }

    /// True once a crop has emptied the raster. Further transforms are
    /// recorded but change nothing on screen.
    pub fn is_inert(&self) -> bool {
        self.raster.is_empty()
    }

    /// Where the displayed raster sits and how far it is zoomed, for
    /// converting gestures into image coordinates.
    pub fn placement(&self) -> ImagePlacement {
        ImagePlacement::new(self.bounds.origin(), self.zoom())
    }

    /// Move the image's top-left to `p`.
    ///
    /// Returns the redraw region: the union of the old and new boxes.
    pub fn move_to(&mut self, p: Point<Panel>) -> Rect<Panel> {
        let old = self.bounds;
        self.record(Transform::move_to(p));
        if !self.bounds.is_null() {
            self.bounds = self.bounds.with_origin(p);
        }
        log::debug!("Moved to {p}: {old} -> {}", self.bounds);
        old | self.bounds
    }

    /// Zoom the source image to `factor`, keeping the box centre fixed.
    ///
    /// Returns the redraw region: the union of the old and new boxes.
    ///
    /// # Errors
    ///
    /// - `TransformError::InvalidZoomFactor` if `factor` is not finite and
    ///   strictly positive
    /// - `TransformError::RasterTooLarge` if the zoomed raster would be
    ///   over the size limit
    ///
    /// Nothing is changed in either case.
    pub fn zoom_to(&mut self, factor: f64) -> Result<Rect<Panel>> {
        let mut pipeline = self.pipeline.clone();
        pipeline.add(Transform::zoom_to(factor))?;

        let (raster, replayed) = self.render(&pipeline)?;
        let old = self.bounds;
        let (half_w, half_h) = raster.size().half();
        let new = pin(&mut pipeline, replayed, old.center().offset(-half_w, -half_h))?;

        self.pipeline = pipeline;
        self.raster = raster;
        self.bounds = new;
        self.phase = Phase::Transforming;
        log::debug!("Zoomed to {factor}: {old} -> {new}");
        Ok(old | new)
    }

    /// Crop to `rect`, given in displayed (zoomed) image coordinates.
    ///
    /// The rect is clipped to the displayed raster and stored in the
    /// pre-zoom frame. A rect missing the raster entirely empties it and
    /// leaves the entity inert.
    ///
    /// Returns the box from before the crop, which covers the new one.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::CorruptRaster` if the source pixel buffer
    /// does not match its dimensions. Nothing is changed in that case.
    pub fn crop(&mut self, rect: Rect<ImageLocal>) -> Result<Rect<Panel>> {
        let old = self.bounds;
        let clip = rect.intersection(&self.raster.extent());
        let placement = self.placement();

        let stored = if clip.is_null() {
            Rect::null()
        } else {
            placement.to_source_rect(clip)
        };

        let mut pipeline = self.pipeline.clone();
        pipeline.add(Transform::crop(stored))?;
        let (raster, replayed) = self.render(&pipeline)?;

        let new = if raster.is_empty() {
            log::warn!("Crop {rect} misses the displayed raster; image is now inert");
            replayed
        } else {
            let shown = placement
                .to_displayed_rect(stored)
                .intersection(&self.raster.extent());
            pin(&mut pipeline, replayed, old.origin().offset(shown.x(), shown.y()))?
        };

        self.pipeline = pipeline;
        self.raster = raster;
        self.bounds = new;
        self.phase = Phase::Transforming;
        log::debug!("Cropped to {stored} (pre-zoom): {old} -> {new}");
        Ok(old)
    }

    /// Step the zoom one notch in or out, clamped by `config`.
    pub fn step_zoom(&mut self, forward: bool, config: &ViewerConfig) -> Result<Rect<Panel>> {
        self.zoom_to(config.step_zoom(self.zoom(), forward))
    }

    /// Apply a transform produced by a gesture through the matching
    /// operation.
    ///
    /// A crop's rect is taken in displayed coordinates, as for
    /// [`Transformable::crop`]. A `Nop` is recorded and redraws nothing.
    pub fn commit(&mut self, transform: Transform) -> Result<Rect<Panel>> {
        match transform {
            Transform::Nop => {
                self.pipeline.add(Transform::Nop)?;
                Ok(Rect::null())
            }
            Transform::Crop { x, y, w, h } => self.crop(Rect::new(x, y, w, h)),
            Transform::ZoomTo { factor } => self.zoom_to(factor),
            Transform::MoveTo { x, y } => Ok(self.move_to(Point::new(x, y))),
        }
    }

    /// Replay the whole pipeline from the source, as if every recorded
    /// transform were issued again from scratch.
    ///
    /// Returns the redraw region: the union of the old and new boxes.
    ///
    /// # Errors
    ///
    /// Fails if the pipeline holds an invalid zoom or the source is
    /// corrupt. Nothing is changed in that case.
    pub fn run(&mut self) -> Result<Rect<Panel>> {
        let mut raster = self.source.clone();
        let new = self.pipeline.replay(self.home, &mut raster, self.filter)?;

        let old = self.bounds;
        self.raster = raster;
        self.bounds = new;
        if !self.pipeline.is_empty() {
            self.phase = Phase::Transforming;
        }
        Ok(old | new)
    }

    /// Replace the pipeline with a restored one and run it.
    ///
    /// # Errors
    ///
    /// As [`Transformable::run`]; the previous pipeline is kept on failure.
    pub fn restore(&mut self, pipeline: Pipeline) -> Result<Rect<Panel>> {
        let previous = std::mem::replace(&mut self.pipeline, pipeline);
        match self.run() {
            Ok(region) => Ok(region),
            Err(e) => {
                self.pipeline = previous;
                Err(e)
            }
        }
    }

    /// Become a deep copy of `other`.
    ///
    /// Returns the redraw region: the union of the old and new boxes.
    pub fn copy_from(&mut self, other: &Transformable) -> Rect<Panel> {
        let old = self.bounds;
        self.clone_from(other);
        old | self.bounds
    }

    /// Record a transform whose validity is already known.
    fn record(&mut self, transform: Transform) {
        if let Err(e) = self.pipeline.add(transform) {
            log::warn!("Dropped {transform}: {e}");
            return;
        }
        self.phase = Phase::Transforming;
    }

    /// Replay `pipeline` onto a copy of the source.
    fn render(&self, pipeline: &Pipeline) -> Result<(Raster, Rect<Panel>)> {
        let mut raster = self.source.clone();
        let bounds = pipeline.replay(self.home, &mut raster, self.filter)?;
        Ok((raster, bounds))
    }
}

/// Make `pipeline` replay to a box at `origin`.
///
/// `replayed` is where the pipeline puts the image now. If that is not
/// `origin`, the move is recorded; a move only ever changes the position,
/// so the replayed size stands. An inert (null) box is left where it is.
fn pin(pipeline: &mut Pipeline, replayed: Rect<Panel>, origin: Point<Panel>) -> Result<Rect<Panel>> {
    if replayed.is_null() || replayed.origin() == origin {
        return Ok(replayed);
    }
    pipeline.add(Transform::move_to(origin))?;
    Ok(replayed.with_origin(origin))
}

impl TryFrom<&ImageFile> for Transformable {
    type Error = TransformError;

    fn try_from(file: &ImageFile) -> Result<Self> {
        Self::load(file)
    }
}
