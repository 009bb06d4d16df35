//! Crate-wide error type.
//!
//! Every variant states *where* things went wrong.

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Window init error: {0}")]
    WindowInit(String), // Creating the window failed

    #[error("Window update error: {0}")]
    WindowUpdate(String), // Updating the window buffer failed

    #[error("Camera init error: {0}")]
    CameraInit(String), // Opening/starting the camera failed

    #[error("Camera frame error: {0}")]
    CameraFrame(String), // Grabbing/decoding a frame failed

    #[error("Landmark provider error: {0}")]
    Provider(String), // Spawning or reading the landmark helper failed

    #[error("Configuration error: {0}")]
    Config(String), // A tunable is out of range or the file is malformed

    #[error("Export error: {0}")]
    Export(String), // Encoding the canvas or a still frame failed

    #[error("Vision service error: {0}")]
    Vision(String), // The captioning request failed or returned nothing

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Export(e.to_string())
    }
}
