use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::Receiver;
use eframe::egui;
use tokio::sync::RwLock;

use crate::camera::{FrameSource, TestPattern, Webcam};
use crate::config::Config;
use crate::gallery;
use crate::notify::{ChannelNotifier, Notice, Severity};
use crate::overlay::{self, DisplayFrame};
use crate::session::{
    CameraFactory, Package, SessionController, SessionPhase, SessionSettings, SinkFactory,
};
use crate::storage::PhotoStore;
use crate::timelapse::{FfmpegTimelapse, TimelapseSink};

// ============================================================================
// CONSTANTS FOR UI STYLING
// ============================================================================
const UI_PADDING: f32 = 20.0;
const PREVIEW_INTERVAL: Duration = Duration::from_millis(33);
const TOAST_SECS: u64 = 3;

// ============================================================================
// MAIN APP STRUCT
// ============================================================================

pub struct PhotoboxApp {
    // Core logic
    pub controller: Arc<RwLock<SessionController>>,
    pub notices: Receiver<Notice>,

    // Timer state for the two periodic drivers
    pub last_preview_update: Option<Instant>,
    pub last_countdown_tick: Option<Instant>,
    pub tick_period: Duration,

    // Display state
    pub preview_texture: Option<egui::TextureHandle>,
    pub preview_caption: Option<String>,
    pub gallery_textures: Vec<egui::TextureHandle>,
    pub toasts: Vec<(Notice, Instant)>,

    pub thumbnail_size: (u32, u32),
}

// ============================================================================
// INITIALIZATION
// ============================================================================

impl PhotoboxApp {
    pub fn new(config: Config) -> Self {
        let camera_config = config.camera.clone();
        let open_camera: CameraFactory = if camera_config.simulate {
            log::warn!("Camera simulation enabled - using test pattern");
            Box::new(move || {
                let pattern = TestPattern::new(camera_config.width, camera_config.height);
                Ok(Box::new(pattern) as Box<dyn FrameSource>)
            })
        } else {
            Box::new(move || {
                let webcam = Webcam::open(
                    camera_config.device_index,
                    camera_config.width,
                    camera_config.height,
                )?;
                Ok(Box::new(webcam) as Box<dyn FrameSource>)
            })
        };

        let open_sink: Option<SinkFactory> = if config.timelapse.enabled {
            let timelapse_config = config.timelapse.clone();
            Some(Box::new(move |_width, _height| {
                let sink =
                    FfmpegTimelapse::open(&timelapse_config.output_file, timelapse_config.fps)?;
                Ok(Box::new(sink) as Box<dyn TimelapseSink>)
            }))
        } else {
            None
        };

        let settings = SessionSettings {
            quota: config.session.quota,
            countdown_start: config.session.countdown_start,
            frame_skip: config.timelapse.frame_skip,
        };

        let (notifier, notices) = ChannelNotifier::new();
        let controller = SessionController::new(
            settings,
            PhotoStore::new(config.paths.photo_dir.clone()),
            open_camera,
            open_sink,
            Box::new(notifier),
        );

        Self {
            controller: Arc::new(RwLock::new(controller)),
            notices,
            last_preview_update: None,
            last_countdown_tick: None,
            tick_period: Duration::from_secs(config.session.tick_secs),
            preview_texture: None,
            preview_caption: None,
            gallery_textures: Vec::new(),
            toasts: Vec::new(),
            thumbnail_size: (
                config.display.thumbnail_width,
                config.display.thumbnail_height,
            ),
        }
    }
}

// ============================================================================
// MAIN UPDATE LOOP
// ============================================================================

impl eframe::App for PhotoboxApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ESC key to exit (for debugging in kiosk mode with keyboard)
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        self.drive_timers(ctx);
        self.collect_notices();
        self.render_ui(ctx);
        self.render_toasts(ctx);

        let in_session = self
            .controller
            .try_read()
            .map(|c| c.phase() == SessionPhase::InSession)
            .unwrap_or(false);
        if in_session {
            // Keep repainting for a smooth preview
            ctx.request_repaint();
        } else if !self.toasts.is_empty() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}

impl PhotoboxApp {
    /// Fire the countdown and preview drivers when their intervals elapse.
    /// The event loop serializes the callbacks, so each tick completes
    /// before the next can run.
    fn drive_timers(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        let countdown_due = self
            .last_countdown_tick
            .map_or(true, |last| now.duration_since(last) >= self.tick_period);
        let preview_due = self
            .last_preview_update
            .map_or(true, |last| now.duration_since(last) >= PREVIEW_INTERVAL);

        let mut display: Option<DisplayFrame> = None;
        let controller_handle = self.controller.clone();
        if let Ok(mut controller) = controller_handle.try_write() {
            if controller.phase() == SessionPhase::InSession {
                if countdown_due {
                    controller.countdown_tick();
                    self.last_countdown_tick = Some(now);
                }
                if preview_due {
                    display = controller.preview_tick();
                    self.last_preview_update = Some(now);
                }
            }
        }

        if let Some(frame) = display {
            self.update_preview_texture(ctx, frame);
        }
    }

    fn collect_notices(&mut self) {
        let now = Instant::now();
        for notice in self.notices.try_iter() {
            self.toasts.push((notice, now));
        }
        self.toasts
            .retain(|(_, shown)| shown.elapsed().as_secs() < TOAST_SECS);
    }

    fn update_preview_texture(&mut self, ctx: &egui::Context, frame: DisplayFrame) {
        // Validate before updating to prevent white flash
        if frame.image.size[0] == 0 || frame.image.size[1] == 0 {
            return;
        }

        self.preview_caption = Some(frame.caption);

        match &mut self.preview_texture {
            Some(texture) if texture.size() == frame.image.size => {
                texture.set(frame.image, egui::TextureOptions::NEAREST);
            }
            _ => {
                self.preview_texture = Some(ctx.load_texture(
                    "camera_preview",
                    frame.image,
                    egui::TextureOptions::NEAREST,
                ));
            }
        }
    }
}

// ============================================================================
// PHASE RENDERING
// ============================================================================

impl PhotoboxApp {
    fn render_ui(&mut self, ctx: &egui::Context) {
        let controller_handle = self.controller.clone();
        let Ok(mut controller) = controller_handle.try_write() else {
            return;
        };

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(UI_PADDING);
                ui.heading("Welcome to the Photobox");
                ui.add_space(UI_PADDING / 2.0);
            });

            self.render_package_selector(ui, &mut controller);
            ui.add_space(UI_PADDING / 2.0);

            match controller.phase() {
                SessionPhase::Idle | SessionPhase::PackageSelected => {
                    self.render_start_controls(ui, &mut controller);
                }
                SessionPhase::InSession => {
                    self.render_preview(ui, &controller);
                }
                SessionPhase::Review => {
                    self.render_start_controls(ui, &mut controller);
                    ui.add_space(UI_PADDING / 2.0);
                    self.render_gallery(ui, ctx, &mut controller);
                }
            }
        });
    }

    fn render_package_selector(&mut self, ui: &mut egui::Ui, controller: &mut SessionController) {
        let in_session = controller.phase() == SessionPhase::InSession;

        ui.vertical_centered(|ui| {
            ui.label("Select a Package:");
            ui.add_enabled_ui(!in_session, |ui| {
                let selected_label = controller
                    .selected_package()
                    .map(|p| p.label())
                    .unwrap_or("Select Package");

                egui::ComboBox::from_id_source("package_selector")
                    .selected_text(selected_label)
                    .show_ui(ui, |ui| {
                        for package in [Package::Single, Package::Double] {
                            let selected = controller.selected_package() == Some(package);
                            if ui.selectable_label(selected, package.label()).clicked() {
                                let _ = controller.select_package(package);
                            }
                        }
                    });
            });
        });
    }

    fn render_start_controls(&mut self, ui: &mut egui::Ui, controller: &mut SessionController) {
        let can_start = matches!(
            controller.phase(),
            SessionPhase::PackageSelected | SessionPhase::Review
        );

        ui.vertical_centered(|ui| {
            let start = ui.add_enabled(can_start, egui::Button::new("Start Photo Session"));
            if start.clicked() && controller.start_session().is_ok() {
                let now = Instant::now();
                self.last_countdown_tick = Some(now);
                self.last_preview_update = Some(now);
                self.preview_texture = None;
                self.preview_caption = None;
                self.gallery_textures.clear();
            }
        });
    }

    fn render_preview(&mut self, ui: &mut egui::Ui, controller: &SessionController) {
        ui.vertical_centered(|ui| {
            if let Some(texture) = &self.preview_texture {
                let available = ui.available_size() - egui::vec2(0.0, UI_PADDING * 3.0);
                let display_size = fit_image_in_rect(texture.size_vec2(), available);
                ui.add(egui::Image::new(texture).fit_to_exact_size(display_size));
            } else {
                ui.spinner();
                ui.label("Warming up the camera...");
            }

            if let Some(caption) = &self.preview_caption {
                ui.label(
                    egui::RichText::new(caption)
                        .size(22.0)
                        .color(egui::Color32::from_rgb(220, 60, 60)),
                );
            }

            let next_photo = (controller.photo_count() + 1).min(controller.quota());
            ui.label(format!("Photo {} of {}", next_photo, controller.quota()));
        });
    }

    fn render_gallery(
        &mut self,
        ui: &mut egui::Ui,
        ctx: &egui::Context,
        controller: &mut SessionController,
    ) {
        self.load_missing_thumbnails(ctx, controller);

        ui.vertical_centered(|ui| {
            egui::Grid::new("photo_gallery")
                .spacing(egui::vec2(12.0, 12.0))
                .show(ui, |ui| {
                    for (i, texture) in self.gallery_textures.iter().enumerate() {
                        ui.add(egui::Image::new(texture));
                        let (_, col) = gallery::grid_position(i);
                        if col == gallery::GRID_COLUMNS - 1 {
                            ui.end_row();
                        }
                    }
                });

            ui.add_space(UI_PADDING / 2.0);
            let can_print = controller.photo_count() > 0;
            let print = ui.add_enabled(can_print, egui::Button::new("Print Photos"));
            if print.clicked() {
                // Outcome is surfaced through the notifier toasts
                let _ = controller.print_session();
            }
        });
    }

    fn load_missing_thumbnails(&mut self, ctx: &egui::Context, controller: &SessionController) {
        let photos = controller.photos();
        while self.gallery_textures.len() < photos.len() {
            let index = self.gallery_textures.len();
            let path = &photos[index];

            match gallery::load_thumbnail(path, self.thumbnail_size.0, self.thumbnail_size.1) {
                Ok(thumb) => {
                    let texture = ctx.load_texture(
                        format!("gallery_photo_{}", index + 1),
                        overlay::to_color_image(&thumb),
                        egui::TextureOptions::LINEAR,
                    );
                    self.gallery_textures.push(texture);
                }
                Err(e) => {
                    log::error!("Failed to load thumbnail {}: {}", path.display(), e);
                    return;
                }
            }
        }
    }
}

// ============================================================================
// TOAST OVERLAY
// ============================================================================

impl PhotoboxApp {
    fn render_toasts(&mut self, ctx: &egui::Context) {
        for (i, (notice, _)) in self.toasts.iter().enumerate() {
            let fill = match notice.severity {
                Severity::Info => egui::Color32::from_rgb(40, 120, 40),
                Severity::Warning => egui::Color32::from_rgb(160, 110, 30),
                Severity::Error => egui::Color32::from_rgb(180, 40, 40),
            };

            egui::Area::new(egui::Id::new(format!("toast_{}", i)))
                .anchor(
                    egui::Align2::CENTER_TOP,
                    egui::vec2(0.0, UI_PADDING + i as f32 * 64.0),
                )
                .order(egui::Order::Tooltip)
                .show(ctx, |ui| {
                    egui::Frame::none()
                        .fill(fill)
                        .rounding(8.0)
                        .inner_margin(egui::Margin::symmetric(20.0, 12.0))
                        .show(ui, |ui| {
                            ui.label(
                                egui::RichText::new(&notice.title)
                                    .strong()
                                    .color(egui::Color32::WHITE)
                                    .size(18.0),
                            );
                            ui.label(
                                egui::RichText::new(&notice.message)
                                    .color(egui::Color32::WHITE)
                                    .size(15.0),
                            );
                        });
                });
        }
    }
}

fn fit_image_in_rect(image_size: egui::Vec2, available: egui::Vec2) -> egui::Vec2 {
    if image_size.x <= 0.0 || image_size.y <= 0.0 {
        return image_size;
    }

    let scale = (available.x / image_size.x)
        .min(available.y / image_size.y)
        .min(1.0)
        .max(0.05);
    image_size * scale
}
