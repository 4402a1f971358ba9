//! Frame-tagged points and boxes.
//!
//! There are four nested coordinate frames in the viewer:
//!
//! 1. [`ImageLocal`] - pixel coordinates inside a single image raster
//! 2. [`Panel`] - coordinates inside the full-screen window hosting the image
//! 3. [`Screen`] - coordinates on one physical display
//! 4. [`Desktop`] - the virtual desktop spanning every display
//!
//! Every [`Point`] and [`Rect`] carries its frame as a zero-sized type
//! parameter. Arithmetic is only implemented between values of the same
//! frame; moving a value into another frame goes through the converters in
//! [`crate::frame`].
//!
//! # Conventions
//!
//! - Origin is the top-left corner, y grows downwards
//! - A rect's right/bottom edges are exclusive
//! - A rect with zero area is "null" and means "unset"

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, BitOr, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Marker trait for the coordinate frames.
pub trait Frame: Copy + Eq + fmt::Debug + Default + 'static {
    /// Short name used in diagnostics.
    const NAME: &'static str;
}

/// Pixel coordinates local to one image raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ImageLocal;

/// Coordinates relative to the panel (window) hosting an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Panel;

/// Coordinates relative to one physical display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Screen;

/// Coordinates in the virtual desktop spanning all displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Desktop;

impl Frame for ImageLocal {
    const NAME: &'static str = "image";
}

impl Frame for Panel {
    const NAME: &'static str = "panel";
}

impl Frame for Screen {
    const NAME: &'static str = "screen";
}

impl Frame for Desktop {
    const NAME: &'static str = "desktop";
}

/// A 2D integer coordinate in frame `F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Point<F: Frame> {
    pub x: i32,
    pub y: i32,
    #[serde(skip)]
    frame: PhantomData<F>,
}

impl<F: Frame> Point<F> {
    pub const fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            frame: PhantomData,
        }
    }

    pub const fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Translate by a raw delta within the same frame.
    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Re-tag the coordinates with another frame.
    ///
    /// Only the converters may do this: anywhere else it would defeat the
    /// purpose of tagging.
    #[inline]
    pub(crate) fn reframe<G: Frame>(self) -> Point<G> {
        Point::new(self.x, self.y)
    }
}

impl<F: Frame> Add for Point<F> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.offset(rhs.x, rhs.y)
    }
}

impl<F: Frame> Sub for Point<F> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x.saturating_sub(rhs.x), self.y.saturating_sub(rhs.y))
    }
}

impl<F: Frame> Neg for Point<F> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(self.x.saturating_neg(), self.y.saturating_neg())
    }
}

impl<F: Frame> fmt::Display for Point<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Non-negative extent of a rect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const ZERO: Size = Size::new(0, 0);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when the size covers no pixels.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Half extents, rounded down.
    #[inline]
    pub fn half(&self) -> (i32, i32) {
        ((self.width / 2) as i32, (self.height / 2) as i32)
    }
}

/// An axis-aligned box in frame `F`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Rect<F: Frame> {
    origin: Point<F>,
    size: Size,
}

impl<F: Frame> Rect<F> {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub const fn from_origin_size(origin: Point<F>, size: Size) -> Self {
        Self { origin, size }
    }

    /// Build a rect from two corners, normalising so the size is
    /// non-negative whatever order the corners come in.
    pub fn from_corners(a: Point<F>, b: Point<F>) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        let right = a.x.max(b.x);
        let bottom = a.y.max(b.y);
        Self::new(left, top, right.abs_diff(left), bottom.abs_diff(top))
    }

    /// The null rect at the frame origin.
    pub const fn null() -> Self {
        Self::new(0, 0, 0, 0)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.size.is_empty()
    }

    #[inline]
    pub fn origin(&self) -> Point<F> {
        self.origin
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    #[inline]
    pub fn x(&self) -> i32 {
        self.origin.x
    }

    #[inline]
    pub fn y(&self) -> i32 {
        self.origin.y
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.size.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Exclusive right edge, saturating at `i32::MAX`.
    #[inline]
    pub fn right(&self) -> i32 {
        self.origin.x.saturating_add(span(self.size.width))
    }

    /// Exclusive bottom edge, saturating at `i32::MAX`.
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.origin.y.saturating_add(span(self.size.height))
    }

    /// Geometric centre, rounded towards the origin.
    pub fn center(&self) -> Point<F> {
        let (hw, hh) = self.size.half();
        self.origin.offset(hw, hh)
    }

    pub fn with_origin(self, origin: Point<F>) -> Self {
        Self { origin, ..self }
    }

    pub fn with_size(self, size: Size) -> Self {
        Self { size, ..self }
    }

    pub fn translate(self, dx: i32, dy: i32) -> Self {
        self.with_origin(self.origin.offset(dx, dy))
    }

    pub fn contains(&self, p: Point<F>) -> bool {
        !self.is_null()
            && p.x >= self.x()
            && p.x < self.right()
            && p.y >= self.y()
            && p.y < self.bottom()
    }

    /// True when `other` lies wholly inside this rect.
    pub fn contains_rect(&self, other: &Rect<F>) -> bool {
        other.is_null()
            || (!self.is_null()
                && other.x() >= self.x()
                && other.y() >= self.y()
                && other.right() <= self.right()
                && other.bottom() <= self.bottom())
    }

    pub fn intersects(&self, other: &Rect<F>) -> bool {
        !self.intersection(other).is_null()
    }

    /// Overlap of two rects. Disjoint rects give a null rect anchored at
    /// the clipped origin.
    pub fn intersection(&self, other: &Rect<F>) -> Rect<F> {
        let left = self.x().max(other.x());
        let top = self.y().max(other.y());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= left || bottom <= top {
            return Rect::new(left, top, 0, 0);
        }
        Rect::new(left, top, right.abs_diff(left), bottom.abs_diff(top))
    }

    /// Smallest rect containing both. Null rects are ignored.
    pub fn union(&self, other: &Rect<F>) -> Rect<F> {
        if self.is_null() {
            return *other;
        }
        if other.is_null() {
            return *self;
        }
        let left = self.x().min(other.x());
        let top = self.y().min(other.y());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right.abs_diff(left), bottom.abs_diff(top))
    }

    /// Re-tag with another frame; reserved for the converters.
    #[inline]
    pub(crate) fn reframe<G: Frame>(self) -> Rect<G> {
        Rect::from_origin_size(self.origin.reframe(), self.size)
    }
}

/// A length as a coordinate delta, clamped to `i32::MAX`.
#[inline]
fn span(len: u32) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

impl<F: Frame> BitOr for Rect<F> {
    type Output = Rect<F>;

    fn bitor(self, rhs: Self) -> Rect<F> {
        self.union(&rhs)
    }
}

impl<F: Frame> fmt::Display for Rect<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width(),
            self.height(),
            self.x(),
            self.y()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_arithmetic_same_frame() {
        let a = Point::<Panel>::new(3, 4);
        let b = Point::<Panel>::new(-1, 10);
        assert_eq!(a + b, Point::new(2, 14));
        assert_eq!(a - b, Point::new(4, -6));
        assert_eq!(-a, Point::new(-3, -4));
    }

    #[test]
    fn test_null_rect() {
        assert!(Rect::<Panel>::null().is_null());
        assert!(Rect::<Panel>::new(5, 5, 0, 10).is_null());
        assert!(!Rect::<Panel>::new(5, 5, 1, 1).is_null());
    }

    #[test]
    fn test_from_corners_normalises() {
        let r = Rect::<ImageLocal>::from_corners(Point::new(10, 2), Point::new(4, 8));
        assert_eq!(r, Rect::new(4, 2, 6, 6));
    }

    #[test]
    fn test_center() {
        let r = Rect::<Panel>::new(10, 20, 10, 6);
        assert_eq!(r.center(), Point::new(15, 23));
    }

    #[test]
    fn test_contains_excludes_far_edges() {
        let r = Rect::<Panel>::new(0, 0, 10, 10);
        assert!(r.contains(Point::new(0, 0)));
        assert!(r.contains(Point::new(9, 9)));
        assert!(!r.contains(Point::new(10, 9)));
        assert!(!Rect::<Panel>::null().contains(Point::origin()));
    }

    #[test]
    fn test_intersection() {
        let a = Rect::<Panel>::new(0, 0, 10, 10);
        let b = Rect::<Panel>::new(5, 5, 10, 10);
        assert_eq!(a.intersection(&b), Rect::new(5, 5, 5, 5));
        assert!(a.intersects(&b));

        let c = Rect::<Panel>::new(20, 20, 5, 5);
        assert!(a.intersection(&c).is_null());
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_union_ignores_null() {
        let a = Rect::<Panel>::new(2, 3, 4, 5);
        assert_eq!(a | Rect::null(), a);
        assert_eq!(Rect::null() | a, a);
    }

    #[test]
    fn test_union_with_negative_origin() {
        let a = Rect::<Desktop>::new(-1920, 0, 1920, 1080);
        let b = Rect::<Desktop>::new(0, 0, 2560, 1440);
        assert_eq!(a | b, Rect::new(-1920, 0, 4480, 1440));
    }

    #[test]
    fn test_edges_saturate_at_extremes() {
        let r = Rect::<ImageLocal>::new(i32::MAX - 5, 0, 10, 10);
        assert_eq!(r.right(), i32::MAX);
        assert!(r.intersection(&Rect::new(0, 0, 10, 10)).is_null());

        let huge = Rect::<Panel>::new(-10, i32::MIN, u32::MAX, u32::MAX);
        assert_eq!(huge.right(), i32::MAX);
        assert_eq!(huge.bottom(), i32::MIN + i32::MAX);

        let far = Rect::<Panel>::new(i32::MAX, 0, 10, 10);
        let union = far | Rect::new(i32::MIN, 0, 1, 1);
        assert_eq!((union.x(), union.width()), (i32::MIN, u32::MAX));

        let p = Point::<Panel>::new(i32::MAX, i32::MIN);
        assert_eq!(p.offset(1, -1), p);
        assert_eq!(-p, Point::new(-i32::MAX, i32::MAX));
    }

    #[test]
    fn test_display() {
        assert_eq!(Rect::<Panel>::new(1, 2, 30, 40).to_string(), "30x40+1+2");
        assert_eq!(Point::<Panel>::new(-1, 2).to_string(), "(-1,2)");
    }

    #[test]
    fn test_rect_serde_has_no_frame_field() {
        let r = Rect::<Panel>::new(1, 2, 3, 4);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(
            json,
            r#"{"origin":{"x":1,"y":2},"size":{"width":3,"height":4}}"#
        );
        let back: Rect<Panel> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
