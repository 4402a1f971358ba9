//! Interactive crop selection.
//!
//! [`CropGesture`] is the state behind a crop overlay: the user grabs the
//! corner of the selection nearest the pointer and drags it. When the
//! gesture is done, [`CropGesture::to_transform`] turns the selection into
//! a transform for [`Transformable::commit`](crate::Transformable::commit).
//!
//! All points are in the displayed image's local frame.

use crate::geometry::{ImageLocal, Point, Rect};
use crate::transform::Transform;

/// What a pointer event asks of the host.
///
/// Ordered so that combining two statuses keeps the stronger one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum EventStatus {
    /// Event not handled.
    #[default]
    Ignored,
    /// Handled, nothing to repaint.
    Done,
    /// Handled, the overlay must be repainted.
    Redraw,
    /// Handled, the overlay should be removed.
    Finished,
}

impl EventStatus {
    /// Combine the statuses of two handlers of the same event.
    pub fn or(self, other: EventStatus) -> EventStatus {
        self.max(other)
    }
}

/// Corner of the selection being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
}

impl Corner {
    /// The corner of `extent` nearest to `p`, deciding by halves.
    fn nearest(extent: Rect<ImageLocal>, p: Point<ImageLocal>) -> Corner {
        let p = p - extent.origin();
        let west = i64::from(p.x) * 2 <= i64::from(extent.width());
        let north = i64::from(p.y) * 2 < i64::from(extent.height());
        match (north, west) {
            (true, true) => Corner::NorthWest,
            (true, false) => Corner::NorthEast,
            (false, true) => Corner::SouthWest,
            (false, false) => Corner::SouthEast,
        }
    }

    /// The opposite corner's position in `rect`.
    fn opposite_in(self, rect: Rect<ImageLocal>) -> Point<ImageLocal> {
        match self {
            Corner::NorthWest => Point::new(rect.right(), rect.bottom()),
            Corner::NorthEast => Point::new(rect.x(), rect.bottom()),
            Corner::SouthWest => Point::new(rect.right(), rect.y()),
            Corner::SouthEast => Point::new(rect.x(), rect.y()),
        }
    }
}

/// A crop selection being adjusted with the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct CropGesture {
    extent: Rect<ImageLocal>,
    selection: Rect<ImageLocal>,
    /// Fixed corner while a drag is in progress.
    anchor: Option<Point<ImageLocal>>,
    corner: Option<Corner>,
}

impl CropGesture {
    /// Start with the selection covering all of `extent`.
    pub fn new(extent: Rect<ImageLocal>) -> Self {
        Self {
            extent,
            selection: extent,
            anchor: None,
            corner: None,
        }
    }

    pub fn selection(&self) -> Rect<ImageLocal> {
        self.selection
    }

    /// Corner being dragged, if any.
    pub fn corner(&self) -> Option<Corner> {
        self.corner
    }

    pub fn is_tracking(&self) -> bool {
        self.anchor.is_some()
    }

    /// Grab the corner nearest to `p`.
    pub fn press(&mut self, p: Point<ImageLocal>) -> EventStatus {
        let corner = Corner::nearest(self.extent, p);
        self.anchor = Some(corner.opposite_in(self.selection));
        self.corner = Some(corner);
        EventStatus::Redraw
    }

    /// Move the grabbed corner to `p`. The selection is normalised, so
    /// dragging past the opposite corner flips it.
    pub fn drag(&mut self, p: Point<ImageLocal>) -> EventStatus {
        match self.anchor {
            Some(anchor) => {
                self.selection = Rect::from_corners(anchor, p);
                EventStatus::Redraw
            }
            None => EventStatus::Ignored,
        }
    }

    /// Let go of the corner.
    pub fn release(&mut self) -> EventStatus {
        if self.anchor.take().is_none() {
            return EventStatus::Ignored;
        }
        self.corner = None;
        EventStatus::Done
    }

    /// The crop the selection describes, or `Nop` for a null selection.
    pub fn to_transform(&self) -> Transform {
        if self.selection.is_null() {
            return Transform::Nop;
        }
        Transform::crop(self.selection)
    }
}
