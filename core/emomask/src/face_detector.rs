use crate::error::EmomaskError;
use crate::geometry::{Point, Size};

/// Bounding box of a detected face, in image-space pixel coordinates.
///
/// Produced once per detection pass and never mutated afterward — it only
/// seeds initial overlay geometry.
#[derive(Debug, Clone)]
pub struct FaceBounds {
    /// X coordinate of the top-left corner (pixels).
    pub x: f64,
    /// Y coordinate of the top-left corner (pixels).
    pub y: f64,
    /// Width of the bounding box (pixels).
    pub width: f64,
    /// Height of the bounding box (pixels).
    pub height: f64,
    /// Detection confidence score.
    pub confidence: f64,
}

impl FaceBounds {
    /// The center of the bounding box.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Convert a detector-normalized rectangle to image-space pixels.
    ///
    /// Some detection engines report boxes normalized to `[0, 1]` with a
    /// bottom-left origin (the Apple Vision convention). This scales the
    /// rectangle by the image size and flips the Y axis so the result uses
    /// the image's own top-left-origin pixel grid.
    pub fn from_normalized(
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        confidence: f64,
        image: Size,
    ) -> Self {
        Self {
            x: x * image.width,
            y: (1.0 - y - height) * image.height,
            width: width * image.width,
            height: height * image.height,
            confidence,
        }
    }

    /// Whether the rectangle has a non-positive width or height.
    ///
    /// Degenerate boxes are skipped by overlay placement rather than
    /// propagated.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Pluggable face detection backend.
///
/// Implement this trait to provide a custom face detector (ONNX, dlib, etc.)
/// and pass it to [`crate::MaskSession::begin_detection`]. A detector error
/// is recovered by the detection worker as zero faces — it degrades the
/// session, it never fails it.
pub trait FaceDetector: Send + Sync {
    /// Detect faces in a row-major grayscale buffer of `width` × `height` bytes.
    fn detect(&self, gray: &[u8], width: u32, height: u32)
        -> Result<Vec<FaceBounds>, EmomaskError>;
}
