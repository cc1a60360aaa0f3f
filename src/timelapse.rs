use anyhow::{Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Append-only video sink fed a sampled subset of preview frames. Finalized
/// exactly once at session end; a second finalize is a no-op.
pub trait TimelapseSink: Send {
    fn append(&mut self, frame: &RgbImage) -> Result<()>;

    /// Close the sink and produce the video file. Returns the output path
    /// the first time a video is written, `None` otherwise.
    fn finalize(&mut self) -> Result<Option<PathBuf>>;

    fn frame_count(&self) -> u64;
}

/// Timelapse sink that spools frames as JPEGs and muxes them into an mp4
/// (mp4v fourcc) by invoking the external `ffmpeg` binary at finalize.
pub struct FfmpegTimelapse {
    output: PathBuf,
    fps: u32,
    spool_dir: PathBuf,
    frames_written: u64,
    finalized: bool,
}

impl FfmpegTimelapse {
    /// Open a sink writing to `output`, overwriting any previous recording.
    pub fn open<P: Into<PathBuf>>(output: P, fps: u32) -> Result<Self> {
        let spool_dir =
            std::env::temp_dir().join(format!("photobox_timelapse_{}", std::process::id()));
        Self::open_with_spool(output, fps, spool_dir)
    }

    pub fn open_with_spool<P: Into<PathBuf>>(output: P, fps: u32, spool_dir: PathBuf) -> Result<Self> {
        let output = output.into();

        std::fs::create_dir_all(&spool_dir)
            .with_context(|| format!("Failed to create spool directory: {}", spool_dir.display()))?;

        // Previous run's video is replaced
        if output.exists() {
            std::fs::remove_file(&output)
                .with_context(|| format!("Failed to remove stale recording: {}", output.display()))?;
        }

        log::info!(
            "Timelapse sink open: {} ({} fps, spool {})",
            output.display(),
            fps,
            spool_dir.display()
        );

        Ok(Self {
            output,
            fps,
            spool_dir,
            frames_written: 0,
            finalized: false,
        })
    }

    pub fn spool_dir(&self) -> &Path {
        &self.spool_dir
    }

    fn spool_frame_path(&self, index: u64) -> PathBuf {
        self.spool_dir.join(format!("frame_{:06}.jpg", index))
    }

    fn cleanup_spool(&self) {
        if let Err(e) = std::fs::remove_dir_all(&self.spool_dir) {
            log::warn!("Failed to remove spool directory {}: {}", self.spool_dir.display(), e);
        }
    }

    fn run_ffmpeg(&self) -> Result<()> {
        let pattern = self.spool_dir.join("frame_%06d.jpg");
        let pattern = pattern.to_string_lossy();
        let fps = self.fps.to_string();

        let result = Command::new("ffmpeg")
            .args([
                "-y",
                "-framerate", fps.as_str(),
                "-i", pattern.as_ref(),
                "-c:v", "mpeg4",
                "-vtag", "mp4v",
                "-pix_fmt", "yuv420p",
                "-r", fps.as_str(),
            ])
            .arg(&self.output)
            .output()
            .context("Failed to run ffmpeg")?;

        if !result.status.success() {
            log::error!("ffmpeg stderr: {}", String::from_utf8_lossy(&result.stderr));
            return Err(anyhow::anyhow!("ffmpeg exited with {}", result.status));
        }

        Ok(())
    }
}

impl TimelapseSink for FfmpegTimelapse {
    fn append(&mut self, frame: &RgbImage) -> Result<()> {
        if self.finalized {
            return Err(anyhow::anyhow!("Timelapse sink already finalized"));
        }

        let path = self.spool_frame_path(self.frames_written + 1);
        frame
            .save(&path)
            .with_context(|| format!("Failed to spool timelapse frame to {}", path.display()))?;

        self.frames_written += 1;
        Ok(())
    }

    fn finalize(&mut self) -> Result<Option<PathBuf>> {
        if self.finalized {
            return Ok(None);
        }
        self.finalized = true;

        if self.frames_written == 0 {
            log::info!("Timelapse finalized with no frames, skipping video");
            self.cleanup_spool();
            return Ok(None);
        }

        if which::which("ffmpeg").is_err() {
            log::warn!("ffmpeg not found, leaving timelapse unwritten");
            self.cleanup_spool();
            return Ok(None);
        }

        log::info!(
            "Muxing {} timelapse frames into {}",
            self.frames_written,
            self.output.display()
        );
        let result = self.run_ffmpeg();
        self.cleanup_spool();
        result?;

        Ok(Some(self.output.clone()))
    }

    fn frame_count(&self) -> u64 {
        self.frames_written
    }
}

impl Drop for FfmpegTimelapse {
    fn drop(&mut self) {
        if !self.finalized && self.spool_dir.exists() {
            self.cleanup_spool();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};
    use tempfile::TempDir;

    fn test_frame() -> RgbImage {
        ImageBuffer::from_pixel(64, 48, Rgb([10, 20, 30]))
    }

    #[test]
    fn test_spool_naming() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("recording.mp4");
        let spool = temp_dir.path().join("spool");

        let mut sink = FfmpegTimelapse::open_with_spool(&output, 30, spool.clone()).unwrap();
        let frame = test_frame();
        sink.append(&frame).unwrap();
        sink.append(&frame).unwrap();
        sink.append(&frame).unwrap();

        assert_eq!(sink.frame_count(), 3);
        assert!(spool.join("frame_000001.jpg").exists());
        assert!(spool.join("frame_000003.jpg").exists());
    }

    #[test]
    fn test_finalize_without_frames_is_quiet() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("recording.mp4");
        let spool = temp_dir.path().join("spool");

        let mut sink = FfmpegTimelapse::open_with_spool(&output, 30, spool.clone()).unwrap();
        assert!(sink.finalize().unwrap().is_none());
        assert!(!output.exists());
        assert!(!spool.exists());
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("recording.mp4");
        let spool = temp_dir.path().join("spool");

        let mut sink = FfmpegTimelapse::open_with_spool(&output, 30, spool).unwrap();
        let _ = sink.finalize().unwrap();

        // Second finalize must not rerun the muxer or touch the spool
        assert!(sink.finalize().unwrap().is_none());
        assert!(sink.append(&test_frame()).is_err());
    }

    #[test]
    fn test_open_overwrites_stale_recording() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("recording.mp4");
        std::fs::write(&output, b"stale").unwrap();

        let spool = temp_dir.path().join("spool");
        let _sink = FfmpegTimelapse::open_with_spool(&output, 30, spool).unwrap();
        assert!(!output.exists());
    }
}
