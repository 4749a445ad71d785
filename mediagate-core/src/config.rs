use crate::error::{CoreError, Result};
use crate::media::Rating;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Root URL of the gallery server, e.g. `http://192.168.1.20:1111/`
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

const fn default_timeout_secs() -> u64 {
    30
}

const fn default_connect_timeout_secs() -> u64 {
    5
}

impl ServerConfig {
    /// Parse `base_url`, normalising it so relative joins stay under it.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse or is not http(s).
    pub fn base_url(&self) -> Result<Url> {
        let mut raw = self.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::ConfigInvalid {
                message: format!("server.base_url must be http or https, got {}", url.scheme()),
            });
        }
        Ok(url)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// How long an image stays on screen during autoplay
    #[serde(default = "default_image_delay_ms")]
    pub image_delay_ms: u64,
}

const fn default_image_delay_ms() -> u64 {
    5000
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            image_delay_ms: default_image_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersConfig {
    /// Fixed rating values offered by the rating facet
    #[serde(default = "default_ratings")]
    pub ratings: Vec<Rating>,
}

fn default_ratings() -> Vec<Rating> {
    (1..=5).map(Rating).collect()
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            ratings: default_ratings(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UiConfig {
    #[serde(default)]
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: u32,
    #[serde(default = "default_window_height")]
    pub height: u32,
}

const fn default_window_width() -> u32 {
    1280
}

const fn default_window_height() -> u32 {
    800
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Also write logs to the file returned by [`crate::paths::log_file_path`]
    #[serde(default)]
    pub enabled: bool,
}

impl GalleryConfig {
    /// Get the configuration directory path (~/.config/mediagate/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/mediagate/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from file or create template on first run
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read, parsed, or if required fields are missing.
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(&config_path, CONFIG_TEMPLATE)?;

            return Err(CoreError::ConfigNotFound { path: config_path });
        }

        let content = fs::read_to_string(&config_path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config document.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a field fails validation.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the fields serde cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.server.base_url.trim().is_empty() {
            return Err(CoreError::ConfigMissingField {
                field: "server.base_url".to_string(),
            });
        }
        self.server.base_url()?;

        if self.playback.image_delay_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "playback.image_delay_ms must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Runtime settings for the playback controller.
    #[must_use]
    pub fn controller_settings(&self) -> crate::controller::ControllerSettings {
        crate::controller::ControllerSettings {
            image_delay: Duration::from_millis(self.playback.image_delay_ms),
            ratings: self.filters.ratings.clone(),
        }
    }
}

/// Template written on first run.
pub const CONFIG_TEMPLATE: &str = r#"# Mediagate Configuration
# ~/.config/mediagate/config.toml

[server]
# Required: address of the gallery server
base_url = ""
timeout_secs = 30
connect_timeout_secs = 5

[playback]
# How long each image is shown while the slideshow is playing
image_delay_ms = 5000

[filters]
# Rating values offered in the rating filter
ratings = [1, 2, 3, 4, 5]

[ui.window]
width = 1280
height = 800

[logging]
# Write logs to the cache directory in addition to the console
enabled = false
"#;
