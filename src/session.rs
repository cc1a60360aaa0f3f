use std::path::{Path, PathBuf};

use crate::camera::FrameSource;
use crate::errors::{CameraError, SessionError};
use crate::notify::{Notifier, Severity};
use crate::overlay::{self, DisplayFrame};
use crate::printer::{self, PrintAction};
use crate::storage::PhotoStore;
use crate::timelapse::TimelapseSink;

/// Opens the camera for a session; injected so tests run without a device.
pub type CameraFactory = Box<dyn Fn() -> Result<Box<dyn FrameSource>, CameraError> + Send>;

/// Builds the timelapse sink for a session, given the camera's reported
/// frame dimensions. Absent when timelapse recording is disabled.
pub type SinkFactory = Box<dyn Fn(u32, u32) -> anyhow::Result<Box<dyn TimelapseSink>> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Package {
    Single,
    Double,
}

impl Package {
    pub fn multiplier(&self) -> u32 {
        match self {
            Package::Single => 1,
            Package::Double => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Package::Single => "Single (1 Print)",
            Package::Double => "Double (2 Prints)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    PackageSelected,
    InSession,
    Review,
}

/// Mutable state of one capture run. Reset when the next session starts.
#[derive(Debug, Clone)]
pub struct Session {
    pub photos: Vec<PathBuf>,
    pub photo_count: u32,
    pub countdown_remaining: u32,
    pub quota: u32,
}

impl Session {
    fn new(quota: u32, countdown_start: u32) -> Self {
        Self {
            photos: Vec::new(),
            photo_count: 0,
            countdown_remaining: countdown_start,
            quota,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub quota: u32,
    pub countdown_start: u32,
    /// Every Nth successfully read preview frame goes to the timelapse.
    pub frame_skip: u64,
}

/// Orchestrates the capture session: owns the camera handle, the timelapse
/// sink and the accumulated photo list, and exposes the countdown/preview
/// drivers as explicit tick functions so the whole flow runs under test
/// without a timer or a device.
pub struct SessionController {
    settings: SessionSettings,
    phase: SessionPhase,
    selected_package: Option<Package>,
    session: Session,
    camera: Option<Box<dyn FrameSource>>,
    sink: Option<Box<dyn TimelapseSink>>,
    store: PhotoStore,
    notifier: Box<dyn Notifier>,
    open_camera: CameraFactory,
    open_sink: Option<SinkFactory>,
    frame_counter: u64,
}

impl SessionController {
    pub fn new(
        settings: SessionSettings,
        store: PhotoStore,
        open_camera: CameraFactory,
        open_sink: Option<SinkFactory>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let session = Session::new(settings.quota, settings.countdown_start);
        Self {
            settings,
            phase: SessionPhase::Idle,
            selected_package: None,
            session,
            camera: None,
            sink: None,
            store,
            notifier,
            open_camera,
            open_sink,
            frame_counter: 0,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn selected_package(&self) -> Option<Package> {
        self.selected_package
    }

    pub fn countdown_remaining(&self) -> u32 {
        self.session.countdown_remaining
    }

    pub fn photo_count(&self) -> u32 {
        self.session.photo_count
    }

    pub fn quota(&self) -> u32 {
        self.session.quota
    }

    pub fn photos(&self) -> &[PathBuf] {
        &self.session.photos
    }

    pub fn session_dir(&self) -> Option<&Path> {
        self.store.session_dir()
    }

    /// Choose the print package. Rejected while a session is running;
    /// choosing from `Review` arms the next run.
    pub fn select_package(&mut self, package: Package) -> Result<(), SessionError> {
        if self.phase == SessionPhase::InSession {
            return Err(SessionError::SessionActive);
        }

        self.selected_package = Some(package);
        self.phase = SessionPhase::PackageSelected;
        self.notifier.notify(
            "Package Selected",
            &format!("Selected Package: {}", package.label()),
            Severity::Info,
        );
        Ok(())
    }

    /// Start a capture run: open the camera, create the photo directory,
    /// open the timelapse sink, reset counters. On any failure the
    /// controller stays in its previous phase with no files written.
    pub fn start_session(&mut self) -> Result<(), SessionError> {
        if self.phase == SessionPhase::InSession {
            return Err(SessionError::SessionActive);
        }

        let Some(_package) = self.selected_package else {
            self.notifier.notify(
                "No Package Selected",
                "Please select a package first.",
                Severity::Warning,
            );
            return Err(SessionError::PackageNotSelected);
        };

        let camera = (self.open_camera)().map_err(|e| {
            self.notifier
                .notify("Error", "Camera not detected.", Severity::Error);
            SessionError::CameraUnavailable(e)
        })?;

        self.store.begin_session().map_err(|e| {
            self.notifier.notify(
                "Error",
                "Could not create the photo directory.",
                Severity::Error,
            );
            SessionError::Storage(e.to_string())
        })?;

        self.session = Session::new(self.settings.quota, self.settings.countdown_start);
        self.frame_counter = 0;

        if let Some(factory) = &self.open_sink {
            let (width, height) = camera.dimensions();
            match factory(width, height) {
                Ok(sink) => self.sink = Some(sink),
                Err(e) => {
                    // Recording is a bonus; the session proceeds without it
                    log::warn!("Timelapse sink unavailable: {}", e);
                    self.notifier.notify(
                        "Timelapse",
                        "Video recording is unavailable for this session.",
                        Severity::Warning,
                    );
                }
            }
        }

        self.camera = Some(camera);
        self.phase = SessionPhase::InSession;
        self.notifier.notify(
            "Photo Session",
            &format!(
                "Starting photo session. {} photos will be taken automatically.",
                self.session.quota
            ),
            Severity::Info,
        );
        Ok(())
    }

    /// One tick of the countdown driver. Decrements the countdown; at zero,
    /// attempts a capture. A failed frame read leaves both the countdown and
    /// the photo count untouched so the next tick retries the same capture.
    pub fn countdown_tick(&mut self) {
        if self.phase != SessionPhase::InSession {
            return;
        }

        if self.session.countdown_remaining > 0 {
            self.session.countdown_remaining -= 1;
            return;
        }

        let Some(camera) = self.camera.as_mut() else {
            return;
        };

        let frame = match camera.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("Capture frame read failed, retrying next tick: {}", e);
                return;
            }
        };

        let index = self.session.photo_count + 1;
        let path = match self.store.save_photo(index, &frame) {
            Ok(path) => path,
            Err(e) => {
                log::error!("Failed to persist photo {}, retrying next tick: {}", index, e);
                return;
            }
        };

        self.session.photos.push(path);
        self.session.photo_count = index;
        self.session.countdown_remaining = self.settings.countdown_start;

        if self.session.photo_count == self.session.quota {
            self.on_quota_reached();
        }
    }

    /// One tick of the live preview driver. Reads a frame, feeds the
    /// timelapse sink on the frame-skip cadence, and returns the
    /// display-ready frame with the countdown overlay. A failed read skips
    /// the tick so the last displayed frame stays in place.
    pub fn preview_tick(&mut self) -> Option<DisplayFrame> {
        if self.phase != SessionPhase::InSession {
            return None;
        }

        let camera = self.camera.as_mut()?;
        let frame = match camera.read_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::debug!("Preview frame read failed: {}", e);
                return None;
            }
        };

        if let Some(sink) = self.sink.as_mut() {
            if self.frame_counter % self.settings.frame_skip == 0 {
                if let Err(e) = sink.append(&frame) {
                    log::warn!("Timelapse append failed: {}", e);
                }
            }
        }
        self.frame_counter += 1;

        Some(overlay::render_display_frame(
            frame,
            self.session.countdown_remaining,
        ))
    }

    /// End of the capture run: finalize the timelapse once, release the
    /// camera once, move to review. Safe to call more than once.
    pub fn on_quota_reached(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            match sink.finalize() {
                Ok(Some(path)) => {
                    self.notifier.notify(
                        "Video Saved",
                        &format!("Session video saved as {}.", path.display()),
                        Severity::Info,
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    log::error!("Timelapse finalize failed: {}", e);
                    self.notifier.notify(
                        "Timelapse",
                        "The session video could not be saved.",
                        Severity::Warning,
                    );
                }
            }
        }

        if self.camera.take().is_some() {
            log::info!("Session camera released");
        }

        if self.phase == SessionPhase::InSession {
            self.phase = SessionPhase::Review;
            self.notifier.notify(
                "Session Complete",
                "Photo session completed. Showing captured photos.",
                Severity::Info,
            );
        }
    }

    /// Simulate printing the captured photos for the selected package.
    pub fn print_session(&mut self) -> Result<Vec<PrintAction>, SessionError> {
        if self.session.photo_count == 0 {
            self.notifier.notify(
                "Nothing to Print",
                "No photos have been captured yet.",
                Severity::Warning,
            );
            return Err(SessionError::NoPhotos);
        }

        if self.phase != SessionPhase::Review {
            return Err(SessionError::SessionActive);
        }

        let package = self
            .selected_package
            .ok_or(SessionError::PackageNotSelected)?;

        self.notifier
            .notify("Printing", "Printing photos...", Severity::Info);

        let actions = printer::print_actions(package, self.session.photos.len());

        self.notifier.notify(
            "Print Complete",
            "Photos printed successfully.",
            Severity::Info,
        );
        Ok(actions)
    }
}
