use log::warn;

use crate::geometry::{Point, Size};
use crate::glyph::GlyphCatalog;
use crate::placement::OverlaySeed;

/// Smallest overlay size in image-space units. Operations that would shrink
/// an overlay past this clamp to it instead.
const MIN_OVERLAY_SIZE: f64 = 1.0;

/// Fraction of the smaller image dimension used for overlays added manually.
const ADD_SIZE_FRACTION: f64 = 0.25;

/// Stable identifier of one overlay, independent of collection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(u64);

/// One placed emoji: position, size, and glyph selection.
///
/// `center` and `size` are always expressed in image space. Display-space
/// values are transient and converted by the caller via
/// [`crate::FitTransform`] before they reach the model.
#[derive(Debug, Clone)]
pub struct Overlay {
    id: OverlayId,
    center: Point,
    size: f64,
    glyph_index: usize,
}

impl Overlay {
    /// The overlay's stable identifier.
    pub fn id(&self) -> OverlayId {
        self.id
    }

    /// Center position in image-space pixels.
    pub fn center(&self) -> Point {
        self.center
    }

    /// Rendered glyph size in image-space units. Always positive.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Index into the glyph catalog.
    pub fn glyph_index(&self) -> usize {
        self.glyph_index
    }
}

/// The mutable, insertion-ordered set of overlays for one image.
///
/// All mutations are expected to run serially on a single interactive
/// context; the set has no internal synchronization.
#[derive(Debug, Default)]
pub struct OverlaySet {
    items: Vec<Overlay>,
    next_id: u64,
}

impl OverlaySet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of overlays.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the set holds no overlays.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate overlays in stable insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Overlay> {
        self.items.iter()
    }

    /// Look up an overlay by id.
    pub fn get(&self, id: OverlayId) -> Option<&Overlay> {
        self.items.iter().find(|o| o.id == id)
    }

    /// Discard every overlay, e.g. when a new image is loaded.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replace the whole set with freshly seeded overlays, one per seed.
    ///
    /// Each overlay gets a new id and starts at glyph index 0.
    pub fn reseed(&mut self, seeds: Vec<OverlaySeed>) {
        self.items.clear();
        for seed in seeds {
            self.insert(seed.center, seed.size);
        }
    }

    /// Add one overlay centered at an image-space point.
    ///
    /// The default size is a quarter of the smaller image dimension, clamped
    /// to the minimum positive size for tiny images.
    pub fn add_at(&mut self, point: Point, image: Size) -> OverlayId {
        let size = (image.min_dimension() * ADD_SIZE_FRACTION).max(MIN_OVERLAY_SIZE);
        self.insert(point, size)
    }

    /// Move an overlay by an image-space delta.
    ///
    /// The delta must already be converted from display space by the caller
    /// (scale only — translation deltas are relative). Returns false if the
    /// id is unknown.
    pub fn translate(&mut self, id: OverlayId, dx: f64, dy: f64) -> bool {
        match self.get_mut(id) {
            Some(overlay) => {
                overlay.center.x += dx;
                overlay.center.y += dy;
                true
            }
            None => false,
        }
    }

    /// Scale an overlay's size by a multiplicative factor.
    ///
    /// Non-positive or non-finite factors are rejected as no-ops; the result
    /// is clamped so the size stays positive. Returns false if the id is
    /// unknown or the factor was rejected.
    pub fn resize(&mut self, id: OverlayId, factor: f64) -> bool {
        if factor <= 0.0 || !factor.is_finite() {
            warn!("rejecting overlay resize with factor {factor}");
            return false;
        }
        match self.get_mut(id) {
            Some(overlay) => {
                overlay.size = (overlay.size * factor).max(MIN_OVERLAY_SIZE);
                true
            }
            None => false,
        }
    }

    /// Advance an overlay to the next glyph, wrapping at the catalog end.
    pub fn cycle_glyph(&mut self, id: OverlayId, catalog: &GlyphCatalog) -> bool {
        let len = catalog.len();
        match self.get_mut(id) {
            Some(overlay) => {
                overlay.glyph_index = (overlay.glyph_index + 1) % len;
                true
            }
            None => false,
        }
    }

    /// Remove the overlay with the given id. Idempotent: removing an absent
    /// id leaves the set unchanged and returns false.
    pub fn remove(&mut self, id: OverlayId) -> bool {
        let before = self.items.len();
        self.items.retain(|o| o.id != id);
        self.items.len() != before
    }

    fn insert(&mut self, center: Point, size: f64) -> OverlayId {
        let id = OverlayId(self.next_id);
        self.next_id += 1;
        self.items.push(Overlay {
            id,
            center,
            size: size.max(MIN_OVERLAY_SIZE),
            glyph_index: 0,
        });
        id
    }

    fn get_mut(&mut self, id: OverlayId) -> Option<&mut Overlay> {
        self.items.iter_mut().find(|o| o.id == id)
    }
}
