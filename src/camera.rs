use image::{ImageBuffer, Rgb, RgbImage};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;

use crate::errors::CameraError;

/// Produces raw frames on demand. Implementations own the device lifecycle;
/// dropping the source releases the device.
pub trait FrameSource: Send {
    /// Reported frame dimensions (width, height).
    fn dimensions(&self) -> (u32, u32);

    /// Read one frame. Failures are transient; callers skip the tick and
    /// retry on the next one.
    fn read_frame(&mut self) -> Result<RgbImage, CameraError>;
}

/// Webcam frame source backed by nokhwa's native capture backend.
pub struct Webcam {
    camera: Camera,
}

impl Webcam {
    /// Open the device and start streaming. Fails if the device is missing
    /// or busy; the caller decides whether to retry.
    pub fn open(device_index: u32, width: u32, height: u32) -> Result<Self, CameraError> {
        log::info!("Opening camera device {}", device_index);

        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(device_index), requested)
            .map_err(|e| CameraError::Open(e.to_string()))?;

        if let Err(e) = camera.set_resolution(Resolution::new(width, height)) {
            log::warn!("Camera rejected resolution {}x{}: {}", width, height, e);
        }

        camera
            .open_stream()
            .map_err(|e| CameraError::Open(e.to_string()))?;

        let resolution = camera.resolution();
        log::info!(
            "Camera streaming at {}x{}",
            resolution.width(),
            resolution.height()
        );

        Ok(Self { camera })
    }
}

impl FrameSource for Webcam {
    fn dimensions(&self) -> (u32, u32) {
        let resolution = self.camera.resolution();
        (resolution.width(), resolution.height())
    }

    fn read_frame(&mut self) -> Result<RgbImage, CameraError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CameraError::Read(e.to_string()))?;

        buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::Unsupported(e.to_string()))
    }
}

impl Drop for Webcam {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            log::debug!("Failed to stop camera stream on release: {}", e);
        }
        log::info!("Camera released");
    }
}

/// Animated gradient source for development and tests when no device exists.
pub struct TestPattern {
    width: u32,
    height: u32,
    frame_index: u64,
}

impl TestPattern {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_index: 0,
        }
    }
}

impl FrameSource for TestPattern {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_frame(&mut self) -> Result<RgbImage, CameraError> {
        let phase = (self.frame_index % 256) as u32;
        self.frame_index += 1;

        let (w, h) = (self.width, self.height);
        let img = ImageBuffer::from_fn(w, h, |x, y| {
            let r = ((x * 255 / w) + phase) % 256;
            let g = (y * 255 / h) % 256;
            let b = ((x + y) * 255 / (w + h)) % 256;
            Rgb([r as u8, g as u8, b as u8])
        });

        Ok(img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_dimensions() {
        let mut source = TestPattern::new(320, 240);
        assert_eq!(source.dimensions(), (320, 240));

        let frame = source.read_frame().unwrap();
        assert_eq!(frame.dimensions(), (320, 240));
    }

    #[test]
    fn test_pattern_animates() {
        let mut source = TestPattern::new(64, 64);
        let first = source.read_frame().unwrap();
        let second = source.read_frame().unwrap();
        assert_ne!(first.get_pixel(32, 0), second.get_pixel(32, 0));
    }
}
