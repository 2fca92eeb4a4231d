use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmomaskError {
    #[error("failed to decode image: {0}")]
    DecodeError(String),

    #[error("invalid geometry: {width}x{height}")]
    InvalidGeometry { width: f64, height: f64 },

    #[error("display viewport has not been laid out yet")]
    ViewportNotReady,

    #[error("glyph catalog must contain at least one glyph")]
    EmptyCatalog,

    #[error("face detection failed: {0}")]
    DetectionFailure(String),

    #[error("failed to allocate output raster: {0}")]
    CompositionFailure(String),

    #[error("failed to encode image: {0}")]
    EncodeError(String),

    #[error("quality must be between 0.0 and 1.0, got {0}")]
    InvalidQuality(f32),
}
