use crate::face_detector::FaceBounds;
use crate::geometry::{Point, Size};

/// Floor for the derived overlay size, as a fraction of the smaller image
/// dimension (0.5%).
const ABSOLUTE_MIN_FRACTION: f64 = 0.005;

/// Ceiling for the derived overlay size, as a fraction of the smaller image
/// dimension (8%).
const ABSOLUTE_MAX_FRACTION: f64 = 0.08;

/// Fixed dampening applied after clamping.
const POST_CLAMP_DAMPENING: f64 = 0.5;

/// Step function from face-to-image area ratio to emoji size fraction.
///
/// Larger (closer) faces get a smaller emoji-to-face fraction so glyphs do
/// not dominate close-up shots; the table must be non-increasing in ratio.
/// Each entry pairs a ratio threshold (exclusive lower bound) with the
/// fraction used above it; ratios at or below every threshold fall through
/// to `distant_fraction`.
#[derive(Debug, Clone)]
pub struct SizingPolicy {
    buckets: [(f64, f64); 3],
    distant_fraction: f64,
}

impl Default for SizingPolicy {
    fn default() -> Self {
        Self {
            // very close selfie, close selfie, medium shot
            buckets: [(0.20, 0.05), (0.10, 0.10), (0.05, 0.18)],
            distant_fraction: 0.25,
        }
    }
}

impl SizingPolicy {
    /// The size fraction for a given face-to-image area ratio.
    pub fn fraction_for(&self, ratio: f64) -> f64 {
        for (threshold, fraction) in self.buckets {
            if ratio > threshold {
                return fraction;
            }
        }
        self.distant_fraction
    }

    /// The initial overlay size for one face inside an image of the given
    /// size, or `None` when the face rectangle is degenerate.
    ///
    /// `clamp(min(w, h) * fraction, minDim * 0.005, minDim * 0.08) * 0.5`.
    pub fn initial_size(&self, face: &FaceBounds, image: Size) -> Option<f64> {
        if face.is_degenerate() || !image.is_valid() {
            return None;
        }

        let ratio = (face.width * face.height) / image.area();
        let raw = face.width.min(face.height) * self.fraction_for(ratio);

        let min_dim = image.min_dimension();
        let absolute_min = min_dim * ABSOLUTE_MIN_FRACTION;
        let absolute_max = min_dim * ABSOLUTE_MAX_FRACTION;

        Some(raw.clamp(absolute_min, absolute_max) * POST_CLAMP_DAMPENING)
    }
}

/// Initial geometry for one overlay, before it is given an id.
#[derive(Debug, Clone)]
pub struct OverlaySeed {
    /// Center position in image-space pixels.
    pub center: Point,
    /// Glyph size in image-space units.
    pub size: f64,
}

/// Derive one overlay seed per detected face.
///
/// Zero faces produce an empty vector (not an error); degenerate face
/// rectangles are skipped. Seeds keep the detector's face order, which
/// becomes the overlay set's stable insertion order.
pub fn derive_seeds(faces: &[FaceBounds], image: Size, policy: &SizingPolicy) -> Vec<OverlaySeed> {
    faces
        .iter()
        .filter_map(|face| {
            let size = policy.initial_size(face, image)?;
            Some(OverlaySeed {
                center: face.center(),
                size,
            })
        })
        .collect()
}
