//! Hosting panels and the screens they sit on.
//!
//! A [`Panel`] is a full-screen region on one screen that owns a stack of
//! images. It is the narrow interface a windowing layer talks to: it can
//! hit-test, apply transforms through [`Panel::commit`] and drain the
//! accumulated redraw region with [`Panel::take_damage`], but never reach
//! into an entity's rasters behind the panel's back.
//!
//! Images move between panels by ownership transfer ([`Panel::handover`]),
//! so an entity is owned by exactly one panel at any time.

use std::fmt;

use crate::error::Result;
use crate::frame::{Convert, FrameContext, PanelGeometry, ScreenGeometry};
use crate::geometry::{Desktop, Panel as PanelFrame, Point, Rect, Size};
use crate::transform::Transform;
use crate::transformable::Transformable;

/// Handle to an entity within one panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The screens making up the virtual desktop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenLayout {
    screens: Vec<ScreenGeometry>,
}

impl ScreenLayout {
    pub fn new(screens: Vec<ScreenGeometry>) -> Self {
        Self { screens }
    }

    pub fn screens(&self) -> &[ScreenGeometry] {
        &self.screens
    }

    /// Bounding box of every screen.
    pub fn virtual_geometry(&self) -> Rect<Desktop> {
        self.screens
            .iter()
            .fold(Rect::null(), |acc, s| acc | s.bounds)
    }

    /// Index of the screen showing desktop point `p`.
    pub fn screen_at(&self, p: Point<Desktop>) -> Option<usize> {
        self.screens.iter().position(|s| s.bounds.contains(p))
    }
}

/// A full-screen hosting region owning a stack of images, lowest first.
#[derive(Debug, Clone)]
pub struct Panel {
    screen: ScreenGeometry,
    geometry: PanelGeometry,
    size: Size,
    entities: Vec<(EntityId, Transformable)>,
    next_id: u64,
    damage: Rect<PanelFrame>,
}

impl Panel {
    pub fn new(screen: ScreenGeometry, geometry: PanelGeometry, size: Size) -> Self {
        Self {
            screen,
            geometry,
            size,
            entities: Vec::new(),
            next_id: 0,
            damage: Rect::null(),
        }
    }

    /// A panel covering all of `screen`.
    pub fn fullscreen(screen: ScreenGeometry) -> Self {
        Self::new(screen, PanelGeometry::default(), screen.size())
    }

    pub fn screen(&self) -> ScreenGeometry {
        self.screen
    }

    /// Move the panel to another screen. Every image keeps its
    /// panel-relative position.
    pub fn set_screen(&mut self, screen: ScreenGeometry) {
        self.screen = screen;
        self.invalidate(self.extent());
    }

    /// The panel's own area, in its own frame.
    pub fn extent(&self) -> Rect<PanelFrame> {
        Rect::from_origin_size(Point::origin(), self.size)
    }

    /// The panel's area on the desktop.
    pub fn desktop_area(&self) -> Rect<Desktop> {
        Rect::from_origin_size(self.to_desktop(Point::origin()), self.size)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entity handles, lowest first.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().map(|(id, _)| *id)
    }

    /// Put an entity on top of the stack.
    pub fn insert(&mut self, entity: Transformable) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.invalidate(entity.bounds());
        log::debug!("Panel took {id} at {}", entity.bounds());
        self.entities.push((id, entity));
        id
    }

    /// Topmost entity whose box contains `p`.
    pub fn image_at(&self, p: Point<PanelFrame>) -> Option<EntityId> {
        self.entities
            .iter()
            .rev()
            .find(|(_, e)| e.bounds().contains(p))
            .map(|(id, _)| *id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Transformable> {
        self.entities
            .iter()
            .find(|(eid, _)| *eid == id)
            .map(|(_, e)| e)
    }

    /// Direct access to an entity. Changes made this way are not tracked
    /// as damage; call [`Panel::invalidate`] with the returned region.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Transformable> {
        self.entities
            .iter_mut()
            .find(|(eid, _)| *eid == id)
            .map(|(_, e)| e)
    }

    /// Apply `transform` to an entity and record its redraw region.
    ///
    /// Returns `Ok(None)` if there is no such entity.
    pub fn commit(&mut self, id: EntityId, transform: Transform) -> Result<Option<Rect<PanelFrame>>> {
        let Some(entity) = self.get_mut(id) else {
            return Ok(None);
        };
        let region = entity.commit(transform)?;
        self.invalidate(region);
        Ok(Some(region))
    }

    /// Take an entity out of the panel.
    pub fn remove(&mut self, id: EntityId) -> Option<Transformable> {
        let index = self.entities.iter().position(|(eid, _)| *eid == id)?;
        let (_, entity) = self.entities.remove(index);
        self.invalidate(entity.bounds());
        Some(entity)
    }

    /// Move an entity into `recipient` in one step.
    ///
    /// Returns the entity's handle in the recipient.
    pub fn handover(&mut self, id: EntityId, recipient: &mut Panel) -> Option<EntityId> {
        let Some(entity) = self.remove(id) else {
            log::warn!("Handover of {id} failed: no such image");
            return None;
        };
        Some(recipient.insert(entity))
    }

    /// Add `region` to the area needing a repaint.
    pub fn invalidate(&mut self, region: Rect<PanelFrame>) {
        let clipped = region.intersection(&self.extent());
        self.damage = self.damage | clipped;
    }

    /// Drain the accumulated redraw region.
    pub fn take_damage(&mut self) -> Option<Rect<PanelFrame>> {
        let damage = std::mem::take(&mut self.damage);
        (!damage.is_null()).then_some(damage)
    }

    /// Frame conversions for one hosted entity.
    pub fn context_for(&self, id: EntityId) -> Option<FrameContext> {
        let entity = self.get(id)?;
        Some(FrameContext::new(entity.placement(), self.geometry, self.screen))
    }

    fn to_desktop(&self, p: Point<PanelFrame>) -> Point<Desktop> {
        self.screen.convert(self.geometry.convert(p))
    }

    fn from_desktop(&self, p: Point<Desktop>) -> Point<PanelFrame> {
        self.geometry.convert(self.screen.convert(p))
    }
}

/// One panel per screen of a layout.
#[derive(Debug, Clone)]
pub struct PanelSet {
    layout: ScreenLayout,
    panels: Vec<Panel>,
}

impl PanelSet {
    pub fn new(layout: ScreenLayout) -> Self {
        let panels = layout.screens().iter().copied().map(Panel::fullscreen).collect();
        Self { layout, panels }
    }

    pub fn layout(&self) -> &ScreenLayout {
        &self.layout
    }

    pub fn panel(&self, index: usize) -> Option<&Panel> {
        self.panels.get(index)
    }

    pub fn panel_mut(&mut self, index: usize) -> Option<&mut Panel> {
        self.panels.get_mut(index)
    }

    /// Index of the panel showing desktop point `p`.
    pub fn panel_at(&self, p: Point<Desktop>) -> Option<usize> {
        self.panels.iter().position(|panel| panel.desktop_area().contains(p))
    }

    /// After an image moved, hand it to the panel now showing its centre.
    ///
    /// The image keeps its place on the desktop. Returns the new panel
    /// index and handle, or `None` if the image stays where it is.
    pub fn rehome(&mut self, from: usize, id: EntityId) -> Option<(usize, EntityId)> {
        let source = self.panels.get(from)?;
        let bounds = source.get(id)?.bounds();
        let ctx = source.context_for(id)?;

        let center: Point<Desktop> = ctx.convert(bounds.center());
        let to = self.panel_at(center).filter(|&to| to != from)?;
        let origin: Point<Desktop> = ctx.convert(bounds.origin());

        let (giver, taker) = if from < to {
            let (low, high) = self.panels.split_at_mut(to);
            (&mut low[from], &mut high[0])
        } else {
            let (low, high) = self.panels.split_at_mut(from);
            (&mut high[0], &mut low[to])
        };

        let new_id = giver.handover(id, taker)?;
        let target = taker.from_desktop(origin);
        if let Some(entity) = taker.get_mut(new_id) {
            let region = entity.move_to(target);
            taker.invalidate(region);
        }
        log::debug!("Rehomed {id} from panel {from} to panel {to} as {new_id}");
        Some((to, new_id))
    }
}
