pub mod catalog;
pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod filter;
pub mod media;
pub mod paths;
pub mod playlist;
pub mod range;
pub mod schedule;

pub use catalog::{AuthGate, InMemoryCatalog, MediaCatalog, StaticAuthGate};
pub use config::{
    FiltersConfig, GalleryConfig, LoggingConfig, PlaybackConfig, ServerConfig, UiConfig,
    WindowConfig, CONFIG_TEMPLATE,
};
pub use controller::{
    ControllerEvent, ControllerSettings, LoginOutcome, PlaybackController, PlaybackMode,
};
pub use display::{
    GalleryView, LoginView, PlayAffordance, StatusLine, Surface, SurfaceId, VideoAttributes, View,
};
pub use error::{CoreError, FailureKind};
pub use filter::{Facet, FacetOptions, FilterSelection};
pub use media::{Catalog, MediaId, MediaItem, MediaKind, MediaRecord, Rating};
pub use paths::{config_dir, config_path, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use playlist::PlaylistState;
pub use range::{ByteRange, MediaChunk, PartialContent};

/// Re-export toml error type for config parsing error handling
pub use toml::de::Error as TomlParseError;
