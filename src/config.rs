use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub display: DisplayConfig,
    pub camera: CameraConfig,
    pub session: SessionConfig,
    pub timelapse: TimelapseConfig,
    pub paths: PathConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    pub device_index: u32,
    pub width: u32,
    pub height: u32,
    /// Use a generated test pattern instead of a real device.
    pub simulate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Photos captured per session.
    pub quota: u32,
    /// Seconds shown on the countdown before each capture.
    pub countdown_start: u32,
    /// Interval between countdown ticks.
    pub tick_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelapseConfig {
    pub enabled: bool,
    /// Every Nth preview frame is appended to the timelapse.
    pub frame_skip: u64,
    pub fps: u32,
    /// Output video path, overwritten on every run.
    pub output_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    pub photo_dir: PathBuf,
    pub config_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display: DisplayConfig {
                width: 1280,
                height: 800,
                fullscreen: true,
                thumbnail_width: 200,
                thumbnail_height: 150,
            },
            camera: CameraConfig {
                device_index: 0,
                width: 1280,
                height: 720,
                simulate: false,
            },
            session: SessionConfig {
                quota: 6,
                countdown_start: 5,
                tick_secs: 1,
            },
            timelapse: TimelapseConfig {
                enabled: true,
                frame_skip: 10,
                fps: 30,
                output_file: PathBuf::from("recording.mp4"),
            },
            paths: PathConfig {
                photo_dir: PathBuf::from("photos"),
                config_file: PathBuf::from("photobox.toml"),
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = PathBuf::from("photobox.toml");

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            log::info!("Config file not found, creating default configuration");
            let default_config = Self::default();
            default_config.save()?;
            Ok(default_config)
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| "Failed to parse configuration file")?;

        log::info!("Configuration loaded from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to_file(&self.paths.config_file)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
            }
        }

        std::fs::write(path.as_ref(), contents)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        log::info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.display.width == 0 || self.display.height == 0 {
            return Err(anyhow::anyhow!("Invalid display dimensions"));
        }

        if self.display.thumbnail_width == 0 || self.display.thumbnail_height == 0 {
            return Err(anyhow::anyhow!("Invalid thumbnail dimensions"));
        }

        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow::anyhow!("Invalid camera resolution"));
        }

        if self.session.quota == 0 {
            return Err(anyhow::anyhow!("Session quota must be at least 1"));
        }

        if self.session.tick_secs == 0 {
            return Err(anyhow::anyhow!("Countdown tick interval must be at least 1 second"));
        }

        if self.timelapse.frame_skip == 0 {
            return Err(anyhow::anyhow!("Timelapse frame skip must be at least 1"));
        }

        if self.timelapse.fps == 0 || self.timelapse.fps > 120 {
            return Err(anyhow::anyhow!("Invalid timelapse frame rate: {}", self.timelapse.fps));
        }

        Ok(())
    }

    pub fn create_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.paths.photo_dir)
            .with_context(|| format!("Failed to create photo directory: {}",
                self.paths.photo_dir.display()))?;

        log::info!("Created necessary directories");
        Ok(())
    }

    /// Total session duration implied by the configured cadence, in seconds.
    pub fn session_duration_secs(&self) -> u64 {
        let ticks_per_photo = u64::from(self.session.countdown_start) + 1;
        ticks_per_photo * self.session.tick_secs * u64::from(self.session.quota)
    }
}

// Environment-specific configuration presets
impl Config {
    pub fn kiosk() -> Self {
        Config::default()
    }

    /// Desktop setup for development: windowed, simulated camera.
    pub fn development_desktop() -> Self {
        Config {
            display: DisplayConfig {
                width: 1024,
                height: 768,
                fullscreen: false,
                thumbnail_width: 200,
                thumbnail_height: 150,
            },
            camera: CameraConfig {
                simulate: true,
                ..Config::default().camera
            },
            ..Default::default()
        }
    }

    /// Fast cadence without an on-screen countdown: every tick captures
    /// directly, one photo per 5 seconds.
    pub fn direct_capture() -> Self {
        Config {
            session: SessionConfig {
                quota: 6,
                countdown_start: 0,
                tick_secs: 5,
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.quota, 6);
        assert_eq!(config.timelapse.fps, 30);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.session.quota = 0;
        assert!(config.validate().is_err());

        config.session.quota = 6;
        config.timelapse.frame_skip = 0;
        assert!(config.validate().is_err());

        config.timelapse.frame_skip = 10;
        config.camera.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test_config.toml");

        let original_config = Config::development_desktop();
        original_config.save_to_file(&config_path).unwrap();

        let loaded_config = Config::load_from_file(&config_path).unwrap();

        assert_eq!(original_config.display.width, loaded_config.display.width);
        assert_eq!(original_config.camera.simulate, loaded_config.camera.simulate);
        assert_eq!(original_config.session.countdown_start, loaded_config.session.countdown_start);
    }

    #[test]
    fn test_preset_configs() {
        assert!(Config::kiosk().validate().is_ok());
        assert!(Config::development_desktop().validate().is_ok());
        assert!(Config::direct_capture().validate().is_ok());
    }

    #[test]
    fn test_session_duration() {
        // 5-second countdown at 1s ticks: 6 ticks per photo, 6 photos
        assert_eq!(Config::default().session_duration_secs(), 36);
        // direct capture: one photo every 5 seconds, 30s total
        assert_eq!(Config::direct_capture().session_duration_secs(), 30);
    }
}
