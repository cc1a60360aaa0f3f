use thiserror::Error;

/// Failures at the camera device boundary.
///
/// `Read` is transient: the periodic drivers skip the tick and retry on the
/// next one. `Open` is fatal to session start and is not retried.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("failed to open camera device: {0}")]
    Open(String),

    #[error("failed to read frame: {0}")]
    Read(String),

    #[error("camera produced an unsupported frame format: {0}")]
    Unsupported(String),
}

/// Errors surfaced by the session controller.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no package selected")]
    PackageNotSelected,

    #[error("camera unavailable: {0}")]
    CameraUnavailable(#[from] CameraError),

    #[error("a capture session is already running")]
    SessionActive,

    #[error("no photos have been captured")]
    NoPhotos,

    #[error("photo storage error: {0}")]
    Storage(String),
}
