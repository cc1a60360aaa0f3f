use anyhow::{Context, Result};
use chrono::Local;
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Writes captured photos to disk. Each session gets its own timestamped
/// folder under the configured root; photos inside are named
/// `photo_<n>.jpg`, 1-indexed in capture order.
pub struct PhotoStore {
    root: PathBuf,
    session_dir: Option<PathBuf>,
}

impl PhotoStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            session_dir: None,
        }
    }

    /// Create the directory for a new session. Nothing touches the
    /// filesystem before this call, so a failed session start leaves no
    /// files behind.
    pub fn begin_session(&mut self) -> Result<PathBuf> {
        let folder = format!("session_{}", Local::now().format("%Y%m%d_%H%M%S"));
        let session_dir = self.root.join(folder);

        std::fs::create_dir_all(&session_dir)
            .with_context(|| format!("Failed to create session directory: {}", session_dir.display()))?;

        log::info!("Session directory: {}", session_dir.display());
        self.session_dir = Some(session_dir.clone());
        Ok(session_dir)
    }

    /// Persist one captured photo under its 1-based index.
    pub fn save_photo(&self, index: u32, frame: &RgbImage) -> Result<PathBuf> {
        let session_dir = self
            .session_dir
            .as_ref()
            .context("No session directory; begin_session was not called")?;

        let photo_path = session_dir.join(format!("photo_{}.jpg", index));
        frame
            .save(&photo_path)
            .with_context(|| format!("Failed to save photo to {}", photo_path.display()))?;

        log::info!("Photo {} saved as {}", index, photo_path.display());
        Ok(photo_path)
    }

    pub fn session_dir(&self) -> Option<&Path> {
        self.session_dir.as_deref()
    }
}
