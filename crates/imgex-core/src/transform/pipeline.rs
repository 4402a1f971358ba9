//! Ordered, canonicalised list of transforms.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ApplyContext, Transform, TransformKind};
use crate::error::{Result, TransformError};
use crate::frame::ImagePlacement;
use crate::geometry::{Panel, Point, Rect};
use crate::raster::{FilterType, Raster};

/// The transforms of one image, kept in replay order.
///
/// Layout is always one of:
/// - `[]`
/// - `[Nop]`, a placeholder the first real transform replaces
/// - `[ZoomTo?] [Crop*] [MoveTo?]`
///
/// Serialises as a plain list of transform records. Deserialising checks
/// the layout and rejects anything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Transform>", into = "Vec<Transform>")]
pub struct Pipeline {
    entries: Vec<Transform>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a transform at its canonical position.
    ///
    /// - `Nop` only lands in an empty pipeline; otherwise it is dropped
    /// - A zoom merges into the existing zoom at the head, or becomes the head
    /// - A crop goes after the last crop, before any move
    /// - A move merges into the existing move at the tail, or becomes the tail
    ///
    /// # Errors
    ///
    /// Returns `TransformError::InvalidZoomFactor` for a bad zoom; the
    /// pipeline is left unchanged.
    pub fn add(&mut self, transform: Transform) -> Result<()> {
        transform.validate()?;

        let kind = transform.kind();
        match kind {
            TransformKind::Nop if self.entries.is_empty() => self.entries.push(Transform::Nop),
            TransformKind::Nop => log::trace!("Dropping nop, pipeline already holds {}", self),
            TransformKind::ZoomTo => {
                self.drop_placeholder();
                match self.find_mut(kind) {
                    Some(existing) => existing.merge(transform)?,
                    None => self.entries.insert(0, transform),
                }
            }
            TransformKind::MoveTo => {
                self.drop_placeholder();
                match self.find_mut(kind) {
                    Some(existing) => existing.merge(transform)?,
                    None => self.entries.push(transform),
                }
            }
            TransformKind::Crop => {
                self.drop_placeholder();
                let at = self.move_index().unwrap_or(self.entries.len());
                self.entries.insert(at, transform);
            }
        }
        Ok(())
    }

    /// Rebuild a pipeline from persisted records, in the order given.
    ///
    /// # Errors
    ///
    /// - `TransformError::NonCanonicalOrder` if the records break the layout
    /// - `TransformError::InvalidZoomFactor` for a bad zoom record
    pub fn from_records(records: Vec<Transform>) -> Result<Self> {
        validate_layout(&records)?;
        Ok(Self { entries: records })
    }

    pub fn into_records(self) -> Vec<Transform> {
        self.entries
    }

    /// Replay every transform onto `raster`, starting from the box `base`.
    ///
    /// Pure with respect to its inputs: replaying twice from the same raster
    /// snapshot produces the same raster and the same box. All transforms
    /// are validated before the raster is touched.
    pub fn replay(
        &self,
        base: Rect<Panel>,
        raster: &mut Raster,
        filter: FilterType,
    ) -> Result<Rect<Panel>> {
        for t in &self.entries {
            t.validate()?;
        }

        let ctx = ApplyContext {
            filter,
            zoom: self.zoom(),
        };
        let mut bounds = base;
        for t in &self.entries {
            bounds = t.apply(bounds, raster, &ctx)?;
        }
        log::debug!("Replayed {} onto {} -> {}", self, base, bounds);
        Ok(bounds)
    }

    /// Factor of the zoom entry, 1.0 when there is none.
    pub fn zoom(&self) -> f64 {
        match self.entries.first() {
            Some(Transform::ZoomTo { factor }) => *factor,
            _ => 1.0,
        }
    }

    /// The recorded move target and the zoom in effect.
    ///
    /// `None` until the image has been moved.
    pub fn placement(&self) -> Option<ImagePlacement> {
        match self.entries.last() {
            Some(&Transform::MoveTo { x, y }) => {
                Some(ImagePlacement::new(Point::new(x, y), self.zoom()))
            }
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Transform> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transform> {
        self.entries.iter()
    }

    fn drop_placeholder(&mut self) {
        if matches!(self.entries.as_slice(), [Transform::Nop]) {
            self.entries.clear();
        }
    }

    fn find_mut(&mut self, kind: TransformKind) -> Option<&mut Transform> {
        self.entries.iter_mut().find(|t| t.kind() == kind)
    }

    fn move_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .position(|t| t.kind() == TransformKind::MoveTo)
    }
}

/// Position of a kind within the canonical layout.
fn stage(kind: TransformKind) -> u8 {
    match kind {
        TransformKind::Nop => 0,
        TransformKind::ZoomTo => 1,
        TransformKind::Crop => 2,
        TransformKind::MoveTo => 3,
    }
}

fn validate_layout(records: &[Transform]) -> Result<()> {
    if let [Transform::Nop] = records {
        return Ok(());
    }

    let mut last_stage = 0;
    let mut zooms = 0;
    let mut moves = 0;
    for (i, t) in records.iter().enumerate() {
        t.validate()?;
        let kind = t.kind();
        match kind {
            TransformKind::Nop => {
                return Err(TransformError::NonCanonicalOrder(format!(
                    "nop at position {i} of a non-empty list"
                )))
            }
            TransformKind::ZoomTo => zooms += 1,
            TransformKind::MoveTo => moves += 1,
            TransformKind::Crop => {}
        }
        if zooms > 1 || moves > 1 {
            return Err(TransformError::NonCanonicalOrder(format!(
                "second {kind} at position {i}"
            )));
        }
        let s = stage(kind);
        if s < last_stage {
            return Err(TransformError::NonCanonicalOrder(format!(
                "{kind} at position {i} after a later stage"
            )));
        }
        last_stage = s;
    }
    Ok(())
}

impl TryFrom<Vec<Transform>> for Pipeline {
    type Error = TransformError;

    fn try_from(records: Vec<Transform>) -> Result<Self> {
        Self::from_records(records)
    }
}

impl From<Pipeline> for Vec<Transform> {
    fn from(pipeline: Pipeline) -> Self {
        pipeline.into_records()
    }
}

impl<'a> IntoIterator for &'a Pipeline {
    type Item = &'a Transform;
    type IntoIter = std::slice::Iter<'a, Transform>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, t) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{t}")?;
        }
        f.write_str("]")
    }
}
