//! Face-emoji overlay core: detect faces in a photo, place emoji overlays on
//! them, let an interactive layer adjust each overlay, and flatten the result
//! into a single full-resolution image.
//!
//! Positions and sizes live in image space end-to-end; the [`FitTransform`]
//! converts to and from the display viewport's letterboxed coordinates, so
//! the flattened output is identical no matter what scale the user edited at.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use emomask::{
//!     EmomaskError, FaceBounds, FaceDetector, GlyphRaster, GlyphRasterizer, MaskSession,
//!     OutputFormat, Size,
//! };
//!
//! struct MyDetector;
//! impl FaceDetector for MyDetector {
//!     fn detect(&self, gray: &[u8], width: u32, height: u32)
//!         -> Result<Vec<FaceBounds>, EmomaskError> {
//!         // Your detection engine here
//!         Ok(vec![])
//!     }
//! }
//!
//! struct MyRasterizer;
//! impl GlyphRasterizer for MyRasterizer {
//!     fn rasterize(&self, glyph: &str, px_size: f32) -> Option<GlyphRaster> {
//!         // Your glyph rendering here
//!         None
//!     }
//! }
//!
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! let mut session = MaskSession::new(bytes).unwrap();
//! session.set_viewport(Size::new(390.0, 520.0));
//!
//! let pending = session.begin_detection(Arc::new(MyDetector));
//! let outcome = pending.wait();
//! session.apply_detection(outcome);
//!
//! let photo = session.export(&MyRasterizer, OutputFormat::Png, 1.0).unwrap();
//! std::fs::write("masked.png", photo.data).unwrap();
//! ```
#![warn(missing_docs)]

mod compose;
mod detection;
mod error;
/// Face detection traits and data types.
pub mod face_detector;
#[cfg(feature = "fontdue")]
/// Built-in fontdue-based glyph rasterizer backend.
pub mod fontdue_backend;
mod geometry;
mod glyph;
mod overlay;
mod placement;
#[cfg(feature = "rustface")]
/// Built-in SeetaFace-based face detector backend.
pub mod rustface_backend;

use std::sync::Arc;

use image::{DynamicImage, RgbaImage};
use log::{debug, warn};

/// Flattening, encoding, and their result type.
pub use compose::{compose, encode_image, ComposedPhoto, OutputFormat};
/// Asynchronous detection request handle and its outcome.
pub use detection::{DetectionOutcome, DetectionToken, PendingDetection};
/// Error type returned by emomask operations.
pub use error::EmomaskError;
/// Face detection trait and face bounding-box type.
pub use face_detector::{FaceBounds, FaceDetector};
#[cfg(feature = "fontdue")]
/// Built-in rasterizer that renders glyphs from a caller-supplied font.
pub use fontdue_backend::FontdueRasterizer;
/// Aspect-fit coordinate mapping and its point/size types.
pub use geometry::{FitTransform, Point, Size};
/// Glyph catalog and rasterization contract.
pub use glyph::{GlyphCatalog, GlyphRaster, GlyphRasterizer};
/// Overlay model: one placed emoji and the mutable set of them.
pub use overlay::{Overlay, OverlayId, OverlaySet};
/// Face-to-overlay size derivation.
pub use placement::{derive_seeds, OverlaySeed, SizingPolicy};
#[cfg(feature = "rustface")]
/// Built-in detector that loads a SeetaFace model from a path.
pub use rustface_backend::RustfaceDetector;

use detection::spawn_detection;

/// One editing session: a base image, its overlay set, and the shared
/// configuration the interactive layer works against.
///
/// The session is the explicit command/query API an interactive surface
/// drives: it owns the overlay set, issues detection requests with staleness
/// tokens, and flattens on demand. The caller converts display coordinates
/// through [`MaskSession::mapper`] before invoking mutations. All methods
/// are expected to run serially on a single interactive context; only
/// detection runs in the background.
pub struct MaskSession {
    image: DynamicImage,
    image_id: u64,
    overlays: OverlaySet,
    catalog: GlyphCatalog,
    policy: SizingPolicy,
    viewport: Option<Size>,
}

impl MaskSession {
    /// Create a session from raw image bytes (JPEG, PNG, or WebP).
    pub fn new(input: Vec<u8>) -> Result<Self, EmomaskError> {
        let image = Self::decode_valid(&input)?;
        Ok(Self {
            image,
            image_id: 1,
            overlays: OverlaySet::new(),
            catalog: GlyphCatalog::default(),
            policy: SizingPolicy::default(),
            viewport: None,
        })
    }

    /// Replace the default glyph catalog.
    pub fn glyph_catalog(mut self, catalog: GlyphCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replace the default sizing policy.
    pub fn sizing_policy(mut self, policy: SizingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Pixel dimensions of the current base image.
    pub fn image_size(&self) -> Size {
        Size::from((self.image.width(), self.image.height()))
    }

    /// The current overlay set, in stable insertion order.
    pub fn overlays(&self) -> &OverlaySet {
        &self.overlays
    }

    /// The shared glyph catalog.
    pub fn catalog(&self) -> &GlyphCatalog {
        &self.catalog
    }

    /// Record the display viewport size.
    ///
    /// A degenerate size clears the viewport: `(0, 0)` occurs transiently
    /// before the surface is laid out, and mapping stays unavailable until a
    /// real size arrives.
    pub fn set_viewport(&mut self, size: Size) {
        if size.is_valid() {
            self.viewport = Some(size);
        } else {
            debug!("viewport {}x{} not ready", size.width, size.height);
            self.viewport = None;
        }
    }

    /// The recorded viewport, if laid out.
    pub fn viewport(&self) -> Option<Size> {
        self.viewport
    }

    /// The aspect-fit transform between the current image and viewport.
    ///
    /// Fails with `ViewportNotReady` until the surface reports a usable size.
    pub fn mapper(&self) -> Result<FitTransform, EmomaskError> {
        let viewport = self.viewport.ok_or(EmomaskError::ViewportNotReady)?;
        FitTransform::new(self.image_size(), viewport)
    }

    /// Start a background detection pass over the current image.
    ///
    /// The returned handle delivers exactly one [`DetectionOutcome`], stamped
    /// with the current image identity. Feed it to
    /// [`MaskSession::apply_detection`]; if the image has been replaced in
    /// the meantime the outcome is discarded there.
    pub fn begin_detection(&self, detector: Arc<dyn FaceDetector>) -> PendingDetection {
        spawn_detection(detector, self.image.clone(), DetectionToken(self.image_id))
    }

    /// Replace the overlay set from a detection outcome, one overlay per
    /// detected face.
    ///
    /// Returns false and leaves the set untouched when the outcome is stale,
    /// i.e. it answers a request issued for a previously loaded image.
    pub fn apply_detection(&mut self, outcome: DetectionOutcome) -> bool {
        if outcome.token() != DetectionToken(self.image_id) {
            warn!(
                "discarding stale detection result {:?} (current image {})",
                outcome.token(),
                self.image_id
            );
            return false;
        }
        let seeds = derive_seeds(&outcome.faces, self.image_size(), &self.policy);
        self.overlays.reseed(seeds);
        true
    }

    /// Swap in a new base image, discarding every overlay.
    ///
    /// Bumps the image identity so detection results still in flight for the
    /// old image become stale. The viewport is kept — the surface has not
    /// changed, only its content.
    pub fn replace_image(&mut self, input: Vec<u8>) -> Result<(), EmomaskError> {
        let image = Self::decode_valid(&input)?;
        self.image = image;
        self.image_id += 1;
        self.overlays.clear();
        Ok(())
    }

    /// Add an overlay at an image-space point with the default size.
    pub fn add_overlay_at(&mut self, point: Point) -> OverlayId {
        let image = self.image_size();
        self.overlays.add_at(point, image)
    }

    /// Move an overlay by an image-space delta.
    pub fn translate_overlay(&mut self, id: OverlayId, dx: f64, dy: f64) -> bool {
        self.overlays.translate(id, dx, dy)
    }

    /// Scale an overlay's size by a multiplicative factor.
    pub fn resize_overlay(&mut self, id: OverlayId, factor: f64) -> bool {
        self.overlays.resize(id, factor)
    }

    /// Advance an overlay to the next catalog glyph.
    pub fn cycle_overlay_glyph(&mut self, id: OverlayId) -> bool {
        self.overlays.cycle_glyph(id, &self.catalog)
    }

    /// Remove an overlay; no-op for an unknown id.
    pub fn remove_overlay(&mut self, id: OverlayId) -> bool {
        self.overlays.remove(id)
    }

    /// Flatten the base image and overlays into one full-resolution raster.
    ///
    /// Requires a laid-out viewport: the save path runs against what the
    /// user currently sees. Overlay sizes are image-space, so the viewport
    /// only gates the call — it never changes output pixels.
    pub fn compose(&self, rasterizer: &dyn GlyphRasterizer) -> Result<RgbaImage, EmomaskError> {
        let mapper = self.mapper()?;
        debug!(
            "composing {} overlay(s) at display scale {:.4}",
            self.overlays.len(),
            mapper.scale()
        );
        compose::compose(&self.image, &self.overlays, &self.catalog, rasterizer)
    }

    /// Flatten and encode in one step for hand-off to a save/share facility.
    pub fn export(
        &self,
        rasterizer: &dyn GlyphRasterizer,
        format: OutputFormat,
        quality: f32,
    ) -> Result<ComposedPhoto, EmomaskError> {
        let raster = self.compose(rasterizer)?;
        let data = encode_image(&raster, &format, quality)?;
        Ok(ComposedPhoto {
            data,
            format,
            width: raster.width(),
            height: raster.height(),
        })
    }

    fn decode_valid(input: &[u8]) -> Result<DynamicImage, EmomaskError> {
        let image = compose::decode_image(input)?;
        if image.width() == 0 || image.height() == 0 {
            return Err(EmomaskError::InvalidGeometry {
                width: f64::from(image.width()),
                height: f64::from(image.height()),
            });
        }
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_png(width: u32, height: u32) -> Vec<u8> {
        use image::codecs::png::PngEncoder;
        use image::ImageEncoder;
        use image::RgbImage;

        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
            ]);
        }
        let mut buffer = Vec::new();
        let encoder = PngEncoder::new(&mut buffer);
        encoder
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
        buffer
    }

    struct MockDetector {
        faces: Vec<FaceBounds>,
    }

    impl MockDetector {
        fn with_face(x: f64, y: f64, width: f64, height: f64) -> Self {
            Self {
                faces: vec![FaceBounds {
                    x,
                    y,
                    width,
                    height,
                    confidence: 10.0,
                }],
            }
        }
    }

    impl FaceDetector for MockDetector {
        fn detect(
            &self,
            _gray: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Vec<FaceBounds>, EmomaskError> {
            Ok(self.faces.clone())
        }
    }

    struct SquareRasterizer;

    impl GlyphRasterizer for SquareRasterizer {
        fn rasterize(&self, _glyph: &str, px_size: f32) -> Option<GlyphRaster> {
            let side = px_size.round().max(1.0) as u32;
            Some(GlyphRaster {
                width: side,
                height: side,
                data: [0, 0, 0, 255].repeat((side * side) as usize),
            })
        }
    }

    #[test]
    fn session_defaults() {
        let session = MaskSession::new(make_test_png(200, 300)).unwrap();
        assert_eq!(session.image_size(), Size::new(200.0, 300.0));
        assert!(session.overlays().is_empty());
        assert_eq!(session.catalog().len(), 5);
        assert!(session.viewport().is_none());
    }

    #[test]
    fn invalid_input_is_rejected() {
        assert!(matches!(
            MaskSession::new(b"not an image".to_vec()),
            Err(EmomaskError::DecodeError(_))
        ));
    }

    #[test]
    fn mapper_requires_laid_out_viewport() {
        let mut session = MaskSession::new(make_test_png(100, 100)).unwrap();
        assert!(matches!(
            session.mapper(),
            Err(EmomaskError::ViewportNotReady)
        ));

        session.set_viewport(Size::new(0.0, 0.0));
        assert!(matches!(
            session.mapper(),
            Err(EmomaskError::ViewportNotReady)
        ));

        session.set_viewport(Size::new(400.0, 400.0));
        assert!(session.mapper().is_ok());
    }

    #[test]
    fn detection_seeds_one_overlay_per_face() {
        // Reference scenario: 1000x1000 image, face at (400, 400, 200, 200)
        // → overlay centered at (500, 500) with size 25, glyph 0.
        let mut session = MaskSession::new(make_test_png(1000, 1000)).unwrap();
        let pending = session
            .begin_detection(Arc::new(MockDetector::with_face(400.0, 400.0, 200.0, 200.0)));
        let outcome = pending.wait();
        assert!(session.apply_detection(outcome));

        assert_eq!(session.overlays().len(), 1);
        let overlay = session.overlays().iter().next().unwrap();
        assert_eq!(overlay.center(), Point::new(500.0, 500.0));
        assert!((overlay.size() - 25.0).abs() < 1e-9);
        assert_eq!(overlay.glyph_index(), 0);
    }

    #[test]
    fn stale_detection_result_is_discarded() {
        let mut session = MaskSession::new(make_test_png(100, 100)).unwrap();
        let pending = session
            .begin_detection(Arc::new(MockDetector::with_face(10.0, 10.0, 50.0, 50.0)));

        // Image replaced while detection is in flight.
        session.replace_image(make_test_png(80, 80)).unwrap();

        let outcome = pending.wait();
        assert!(!session.apply_detection(outcome));
        assert!(session.overlays().is_empty());
    }

    #[test]
    fn replace_image_discards_overlays_and_keeps_viewport() {
        let mut session = MaskSession::new(make_test_png(100, 100)).unwrap();
        session.set_viewport(Size::new(400.0, 400.0));
        session.add_overlay_at(Point::new(50.0, 50.0));
        assert_eq!(session.overlays().len(), 1);

        session.replace_image(make_test_png(60, 60)).unwrap();
        assert!(session.overlays().is_empty());
        assert_eq!(session.image_size(), Size::new(60.0, 60.0));
        assert!(session.viewport().is_some());
    }

    #[test]
    fn failed_replace_keeps_current_image() {
        let mut session = MaskSession::new(make_test_png(100, 100)).unwrap();
        session.add_overlay_at(Point::new(50.0, 50.0));
        assert!(session.replace_image(b"garbage".to_vec()).is_err());
        assert_eq!(session.image_size(), Size::new(100.0, 100.0));
        assert_eq!(session.overlays().len(), 1);
    }

    #[test]
    fn drag_via_mapper_delta_lands_in_image_space() {
        let mut session = MaskSession::new(make_test_png(800, 600)).unwrap();
        session.set_viewport(Size::new(400.0, 400.0));
        let id = session.add_overlay_at(Point::new(400.0, 300.0));

        // A 10px rightward drag on screen at scale 0.5 moves 20 image px.
        let mapper = session.mapper().unwrap();
        let (dx, dy) = mapper.display_delta_to_image(10.0, 0.0);
        assert!(session.translate_overlay(id, dx, dy));
        let overlay = session.overlays().get(id).unwrap();
        assert_eq!(overlay.center(), Point::new(420.0, 300.0));
    }

    #[test]
    fn compose_requires_viewport() {
        let session = MaskSession::new(make_test_png(50, 50)).unwrap();
        assert!(matches!(
            session.compose(&SquareRasterizer),
            Err(EmomaskError::ViewportNotReady)
        ));
    }

    #[test]
    fn compose_output_matches_image_dimensions() {
        let mut session = MaskSession::new(make_test_png(120, 90)).unwrap();
        session.set_viewport(Size::new(400.0, 400.0));
        session.add_overlay_at(Point::new(60.0, 45.0));
        let raster = session.compose(&SquareRasterizer).unwrap();
        assert_eq!(raster.dimensions(), (120, 90));
    }

    #[test]
    fn export_produces_png_bytes() {
        let mut session = MaskSession::new(make_test_png(64, 64)).unwrap();
        session.set_viewport(Size::new(256.0, 256.0));
        session.add_overlay_at(Point::new(32.0, 32.0));
        let photo = session
            .export(&SquareRasterizer, OutputFormat::Png, 1.0)
            .unwrap();
        assert_eq!(photo.width, 64);
        assert_eq!(photo.height, 64);
        assert_eq!(&photo.data[1..4], b"PNG");
    }

    #[test]
    fn export_failure_leaves_session_intact() {
        let mut session = MaskSession::new(make_test_png(64, 64)).unwrap();
        session.set_viewport(Size::new(256.0, 256.0));
        let id = session.add_overlay_at(Point::new(32.0, 32.0));

        let result = session.export(&SquareRasterizer, OutputFormat::Jpeg, 2.0);
        assert!(matches!(result, Err(EmomaskError::InvalidQuality(_))));
        assert!(session.overlays().get(id).is_some());
    }
}
