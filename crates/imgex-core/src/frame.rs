//! Conversions between the four coordinate frames.
//!
//! Each context type knows one geometric relationship and converts across
//! exactly one frame boundary:
//!
//! | context | boundary |
//! |---|---|
//! | [`ImagePlacement`] | image-local <-> panel |
//! | [`PanelGeometry`] | panel <-> screen |
//! | [`ScreenGeometry`] | screen <-> desktop |
//!
//! [`FrameContext`] bundles all three and converts between frames that are
//! further apart by chaining the single-step conversions, never by a
//! shortcut formula. When a panel moves to another screen only its
//! [`ScreenGeometry`] changes and every chained conversion follows.
//!
//! All conversions are pure translations. The one scaled mapping is
//! [`ImagePlacement::to_source_rect`], which undoes the image's zoom when a
//! gesture in displayed pixels has to be stored in the pre-zoom frame.

use crate::geometry::{Desktop, Frame, ImageLocal, Panel, Point, Rect, Screen, Size};

/// Tolerance for edges that land on a whole pixel up to float error.
const EDGE_SLACK: f64 = 1e-9;

/// Conversion of a point from frame `From` to frame `To`.
pub trait Convert<From: Frame, To: Frame> {
    fn convert(&self, p: Point<From>) -> Point<To>;

    /// Convert a rect. Frames differ by translation only, so the size is
    /// kept as-is.
    fn convert_rect(&self, r: Rect<From>) -> Rect<To> {
        Rect::from_origin_size(self.convert(r.origin()), r.size())
    }
}

/// Where an image sits inside its panel, and how far it is zoomed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    /// Top-left of the displayed raster in panel coordinates.
    pub origin: Point<Panel>,
    /// Zoom factor of the displayed raster relative to its source.
    pub zoom: f64,
}

impl ImagePlacement {
    pub fn new(origin: Point<Panel>, zoom: f64) -> Self {
        Self { origin, zoom }
    }

    /// Map a rect in displayed (zoomed) image pixels back to the pre-zoom
    /// frame by dividing by the zoom factor.
    ///
    /// Edges round outward, so the result always covers the selection.
    pub fn to_source_rect(&self, displayed: Rect<ImageLocal>) -> Rect<ImageLocal> {
        let down = |v: i32| (v as f64 / self.zoom + EDGE_SLACK).floor() as i32;
        let up = |v: i32| (v as f64 / self.zoom - EDGE_SLACK).ceil() as i32;
        Rect::from_corners(
            Point::new(down(displayed.x()), down(displayed.y())),
            Point::new(up(displayed.right()), up(displayed.bottom())),
        )
    }

    /// Map a pre-zoom rect onto the displayed raster.
    pub fn to_displayed_rect(&self, source: Rect<ImageLocal>) -> Rect<ImageLocal> {
        scale_rect(source, self.zoom)
    }
}

impl Convert<ImageLocal, Panel> for ImagePlacement {
    fn convert(&self, p: Point<ImageLocal>) -> Point<Panel> {
        p.reframe::<Panel>() + self.origin
    }
}

impl Convert<Panel, ImageLocal> for ImagePlacement {
    fn convert(&self, p: Point<Panel>) -> Point<ImageLocal> {
        (p - self.origin).reframe()
    }
}

/// Position of a panel (window) on its screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanelGeometry {
    pub origin: Point<Screen>,
}

impl PanelGeometry {
    pub fn new(origin: Point<Screen>) -> Self {
        Self { origin }
    }
}

impl Convert<Panel, Screen> for PanelGeometry {
    fn convert(&self, p: Point<Panel>) -> Point<Screen> {
        p.reframe::<Screen>() + self.origin
    }
}

impl Convert<Screen, Panel> for PanelGeometry {
    fn convert(&self, p: Point<Screen>) -> Point<Panel> {
        (p - self.origin).reframe()
    }
}

/// A physical display's area within the virtual desktop.
///
/// Screens to the left of or above the primary one have negative origins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenGeometry {
    pub bounds: Rect<Desktop>,
}

impl ScreenGeometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            bounds: Rect::new(x, y, width, height),
        }
    }

    pub fn origin(&self) -> Point<Desktop> {
        self.bounds.origin()
    }

    pub fn size(&self) -> Size {
        self.bounds.size()
    }
}

impl Convert<Screen, Desktop> for ScreenGeometry {
    fn convert(&self, p: Point<Screen>) -> Point<Desktop> {
        p.reframe::<Desktop>() + self.origin()
    }
}

impl Convert<Desktop, Screen> for ScreenGeometry {
    fn convert(&self, p: Point<Desktop>) -> Point<Screen> {
        (p - self.origin()).reframe()
    }
}

/// Every relationship between the frames of one hosted image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub image: ImagePlacement,
    pub panel: PanelGeometry,
    pub screen: ScreenGeometry,
}

impl FrameContext {
    pub fn new(image: ImagePlacement, panel: PanelGeometry, screen: ScreenGeometry) -> Self {
        Self {
            image,
            panel,
            screen,
        }
    }
}

impl Convert<ImageLocal, Panel> for FrameContext {
    fn convert(&self, p: Point<ImageLocal>) -> Point<Panel> {
        self.image.convert(p)
    }
}

impl Convert<Panel, ImageLocal> for FrameContext {
    fn convert(&self, p: Point<Panel>) -> Point<ImageLocal> {
        self.image.convert(p)
    }
}

impl Convert<Panel, Screen> for FrameContext {
    fn convert(&self, p: Point<Panel>) -> Point<Screen> {
        self.panel.convert(p)
    }
}

impl Convert<Screen, Panel> for FrameContext {
    fn convert(&self, p: Point<Screen>) -> Point<Panel> {
        self.panel.convert(p)
    }
}

impl Convert<Screen, Desktop> for FrameContext {
    fn convert(&self, p: Point<Screen>) -> Point<Desktop> {
        self.screen.convert(p)
    }
}

impl Convert<Desktop, Screen> for FrameContext {
    fn convert(&self, p: Point<Desktop>) -> Point<Screen> {
        self.screen.convert(p)
    }
}

impl Convert<ImageLocal, Screen> for FrameContext {
    fn convert(&self, p: Point<ImageLocal>) -> Point<Screen> {
        let panel: Point<Panel> = self.image.convert(p);
        self.panel.convert(panel)
    }
}

impl Convert<Panel, Desktop> for FrameContext {
    fn convert(&self, p: Point<Panel>) -> Point<Desktop> {
        let screen: Point<Screen> = self.panel.convert(p);
        self.screen.convert(screen)
    }
}

impl Convert<ImageLocal, Desktop> for FrameContext {
    fn convert(&self, p: Point<ImageLocal>) -> Point<Desktop> {
        let panel: Point<Panel> = self.image.convert(p);
        let screen: Point<Screen> = self.panel.convert(panel);
        let desktop: Point<Desktop> = self.screen.convert(screen);
        log::trace!("image {p} -> panel {panel} -> screen {screen} -> desktop {desktop}");
        desktop
    }
}

impl Convert<Desktop, Panel> for FrameContext {
    fn convert(&self, p: Point<Desktop>) -> Point<Panel> {
        let screen: Point<Screen> = self.screen.convert(p);
        self.panel.convert(screen)
    }
}

impl Convert<Screen, ImageLocal> for FrameContext {
    fn convert(&self, p: Point<Screen>) -> Point<ImageLocal> {
        let panel: Point<Panel> = self.panel.convert(p);
        self.image.convert(panel)
    }
}

impl Convert<Desktop, ImageLocal> for FrameContext {
    fn convert(&self, p: Point<Desktop>) -> Point<ImageLocal> {
        let screen: Point<Screen> = self.screen.convert(p);
        let panel: Point<Panel> = self.panel.convert(screen);
        self.image.convert(panel)
    }
}

/// Scale every component of a rect, rounding to the nearest pixel.
fn scale_rect<F: Frame>(r: Rect<F>, factor: f64) -> Rect<F> {
    let scale = |v: f64| (v * factor).round();
    Rect::new(
        scale(r.x() as f64) as i32,
        scale(r.y() as f64) as i32,
        scale(r.width() as f64).max(0.0) as u32,
        scale(r.height() as f64).max(0.0) as u32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> FrameContext {
        FrameContext::new(
            ImagePlacement::new(Point::new(100, 50), 1.0),
            PanelGeometry::new(Point::new(0, 0)),
            ScreenGeometry::new(1920, 0, 2560, 1440),
        )
    }

    #[test]
    fn test_image_to_panel_and_back() {
        let placement = ImagePlacement::new(Point::new(100, 50), 1.0);
        let p: Point<Panel> = placement.convert(Point::<ImageLocal>::new(5, 6));
        assert_eq!(p, Point::new(105, 56));
        let back: Point<ImageLocal> = placement.convert(p);
        assert_eq!(back, Point::new(5, 6));
    }

    #[test]
    fn test_screen_to_desktop_on_secondary_screen() {
        let screen = ScreenGeometry::new(1920, 0, 2560, 1440);
        let d: Point<Desktop> = screen.convert(Point::<Screen>::new(10, 10));
        assert_eq!(d, Point::new(1930, 10));
    }

    #[test]
    fn test_screen_left_of_primary() {
        let screen = ScreenGeometry::new(-1280, -200, 1280, 1024);
        let d: Point<Desktop> = screen.convert(Point::<Screen>::new(0, 0));
        assert_eq!(d, Point::new(-1280, -200));
        let s: Point<Screen> = screen.convert(Point::<Desktop>::new(-1, 0));
        assert_eq!(s, Point::new(1279, 200));
    }

    #[test]
    fn test_image_to_desktop_chained() {
        let ctx = context();
        let d: Point<Desktop> = ctx.convert(Point::<ImageLocal>::new(1, 2));
        assert_eq!(d, Point::new(2021, 52));
        let back: Point<ImageLocal> = ctx.convert(d);
        assert_eq!(back, Point::new(1, 2));
    }

    #[test]
    fn test_moving_panel_to_other_screen_only_changes_last_step() {
        let mut ctx = context();
        let p = Point::<ImageLocal>::new(0, 0);
        let on_panel_before: Point<Panel> = ctx.convert(p);

        ctx.screen = ScreenGeometry::new(0, 0, 1920, 1080);
        let on_panel_after: Point<Panel> = ctx.convert(p);
        let d: Point<Desktop> = ctx.convert(p);

        assert_eq!(on_panel_before, on_panel_after);
        assert_eq!(d, Point::new(100, 50));
    }

    #[test]
    fn test_convert_rect_keeps_size() {
        let ctx = context();
        let r = Convert::<Panel, Desktop>::convert_rect(&ctx, Rect::new(0, 0, 30, 40));
        assert_eq!(r, Rect::new(1920, 0, 30, 40));
    }

    #[test]
    fn test_source_rect_divides_by_zoom() {
        let placement = ImagePlacement::new(Point::origin(), 2.0);
        let stored = placement.to_source_rect(Rect::new(20, 20, 40, 40));
        assert_eq!(stored, Rect::new(10, 10, 20, 20));
        assert_eq!(placement.to_displayed_rect(stored), Rect::new(20, 20, 40, 40));
    }

    #[test]
    fn test_source_rect_identity_at_unit_zoom() {
        let placement = ImagePlacement::new(Point::origin(), 1.0);
        let r = Rect::new(3, 7, 11, 13);
        assert_eq!(placement.to_source_rect(r), r);
    }

    #[test]
    fn test_source_rect_rounds_outward() {
        let placement = ImagePlacement::new(Point::origin(), 3.0);
        // Pixel 299 of a 3x zoom lives in source pixel 99
        assert_eq!(placement.to_source_rect(Rect::new(299, 0, 1, 1)), Rect::new(99, 0, 1, 1));

        let placement = ImagePlacement::new(Point::origin(), 1.5);
        assert_eq!(placement.to_source_rect(Rect::new(0, 0, 50, 50)), Rect::new(0, 0, 34, 34));
    }
}
