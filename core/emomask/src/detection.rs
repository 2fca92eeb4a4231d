use std::sync::{mpsc, Arc};
use std::thread;

use image::DynamicImage;
use log::{info, warn};

use crate::face_detector::{FaceBounds, FaceDetector};

/// Identity token tying a detection request to the image it was issued for.
///
/// The session mints a new token every time the image is replaced; a result
/// whose token no longer matches is stale and gets discarded on delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionToken(pub(crate) u64);

/// The single result of one detection request.
#[derive(Debug)]
pub struct DetectionOutcome {
    pub(crate) token: DetectionToken,
    /// Detected faces, in detector order. Empty when the detector found
    /// nothing or failed (failure degrades to zero faces).
    pub faces: Vec<FaceBounds>,
}

impl DetectionOutcome {
    /// The token of the request this outcome answers.
    pub fn token(&self) -> DetectionToken {
        self.token
    }
}

/// Handle to one in-flight background detection request.
///
/// Exactly one outcome is delivered per request. There is no cancellation:
/// a request superseded by a new image simply goes stale, and
/// [`crate::MaskSession::apply_detection`] discards it by token.
pub struct PendingDetection {
    token: DetectionToken,
    rx: mpsc::Receiver<DetectionOutcome>,
}

impl PendingDetection {
    /// The request token, minted from the image identity at spawn time.
    pub fn token(&self) -> DetectionToken {
        self.token
    }

    /// Non-blocking poll for the outcome. Returns `None` while the worker
    /// is still running.
    pub fn try_outcome(&self) -> Option<DetectionOutcome> {
        self.rx.try_recv().ok()
    }

    /// Block until the worker delivers. A worker that died without sending
    /// degrades to an empty outcome.
    pub fn wait(self) -> DetectionOutcome {
        match self.rx.recv() {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!("detection worker disconnected without a result");
                DetectionOutcome {
                    token: self.token,
                    faces: Vec::new(),
                }
            }
        }
    }
}

/// Run the detector against a snapshot of the image on a background thread.
///
/// The image is converted to the detector's grayscale input inside the
/// worker so the interactive context never blocks on it. Detector errors
/// are logged and delivered as zero faces.
pub(crate) fn spawn_detection(
    detector: Arc<dyn FaceDetector>,
    image: DynamicImage,
    token: DetectionToken,
) -> PendingDetection {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();
        let faces = match detector.detect(gray.as_raw(), width, height) {
            Ok(faces) => {
                info!("detection request {token:?} found {} face(s)", faces.len());
                faces
            }
            Err(err) => {
                warn!("detection request {token:?} failed, treating as zero faces: {err}");
                Vec::new()
            }
        };

        if tx.send(DetectionOutcome { token, faces }).is_err() {
            warn!("detection result for {token:?} dropped: receiver went away");
        }
    });

    PendingDetection { token, rx }
}
