use std::path::Path;

use crate::error::EmomaskError;
use crate::face_detector::{FaceBounds, FaceDetector};

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// Loads a SeetaFace model from a caller-supplied path on construction; the
/// model file is not bundled with this crate.
pub struct RustfaceDetector {
    model: rustface::Model,
}

impl RustfaceDetector {
    /// Load a SeetaFace model from the given path.
    pub fn from_model_path<P: AsRef<Path>>(path: P) -> Result<Self, EmomaskError> {
        let data = std::fs::read(path.as_ref()).map_err(|e| {
            EmomaskError::DetectionFailure(format!(
                "failed to read model {}: {e}",
                path.as_ref().display()
            ))
        })?;
        let model = rustface::read_model(std::io::Cursor::new(data)).map_err(|e| {
            EmomaskError::DetectionFailure(format!(
                "failed to parse model {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Ok(Self { model })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(
        &self,
        gray: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<FaceBounds>, EmomaskError> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray, width, height));

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceBounds {
                    x: f64::from(bbox.x()),
                    y: f64::from(bbox.y()),
                    width: f64::from(bbox.width()),
                    height: f64::from(bbox.height()),
                    confidence: face.score(),
                }
            })
            .collect())
    }
}
