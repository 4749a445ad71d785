#![cfg_attr(feature = "bundle", windows_subsystem = "windows")]
mod app;
mod bridge;
mod components;
mod media;
mod state;
mod theme;

use crate::app::App;
use crate::bridge::use_controller_bridge;
use crate::media::MEDIA_ROUTE;
use crate::state::{GalleryHandle, GalleryState};
use crate::theme::APP_CSS;
use dioxus::desktop::wry::http::header;
use dioxus::desktop::{use_asset_handler, LogicalSize, WindowBuilder};
use dioxus::prelude::*;
use mediagate_core::{ControllerEvent, CoreError, GalleryConfig, PlaybackController};
use mediagate_http::HttpGalleryClient;
use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const APP_NAME: &str = "Mediagate";

fn main() {
    // Check config for logging.enabled before full config load
    let file_logging_enabled = check_file_logging_enabled();
    init_tracing(file_logging_enabled);

    // Load config or create template on first run
    let config = match GalleryConfig::load_or_create() {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            show_new_config_dialog(&path);
            std::process::exit(0);
        }
        Err(e) => {
            error!("{e}");
            show_config_error_dialog(&e, &GalleryConfig::config_path());
            std::process::exit(1);
        }
    };

    // Create tokio runtime for background tasks
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    let client = match HttpGalleryClient::new(&config.server) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create gallery client: {e}");
            show_config_error_dialog(&e, &GalleryConfig::config_path());
            std::process::exit(1);
        }
    };

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    // Set up Ctrl+C handler to trigger graceful shutdown
    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    let controller = PlaybackController::new(
        client.clone(),
        client.clone(),
        config.controller_settings(),
        Some(cancel_token.clone()),
    );
    info!(
        "Gallery at {} (image delay {}ms)",
        client.base_url(),
        config.playback.image_delay_ms
    );

    // Spawn background tasks
    runtime.spawn(log_controller_events(controller.clone()));
    runtime.spawn(shutdown_on_cancel(controller.clone(), cancel_token));

    let handle = GalleryHandle::new(controller, runtime.handle().clone());

    let window = WindowBuilder::new()
        .with_title(APP_NAME)
        .with_resizable(true)
        .with_inner_size(LogicalSize::new(
            f64::from(config.ui.window.width),
            f64::from(config.ui.window.height),
        ));

    let dioxus_config = dioxus::desktop::Config::default()
        .with_window(window)
        .with_disable_context_menu(true);

    // Launch Dioxus application
    // Use with_context to inject the gallery handle before launch
    dioxus::LaunchBuilder::desktop()
        .with_cfg(dioxus_config)
        .with_context(handle)
        .launch(app);
}

/// Root component that sets up context and renders the app
fn app() -> Element {
    let handle: GalleryHandle = use_context();
    let controller = handle.controller();

    let gallery = use_context_provider(|| GalleryState::new(controller.view()));

    // Bridge controller view updates to Dioxus signals
    use_controller_bridge(&controller, gallery);

    // Item bytes go through the controller's session, one request per range
    use_asset_handler(MEDIA_ROUTE, move |request, responder| {
        let path = request.uri().path().to_string();
        let range = request
            .headers()
            .get(header::RANGE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        handle.dispatch(move |controller| async move {
            responder.respond(media::respond(&controller, &path, range.as_deref()).await);
        });
    });

    rsx! {
        document::Title { "{APP_NAME}" },
        style { "{APP_CSS}" },
        App {}
    }
}

/// Show a native OS dialog for an invalid configuration and handle user response
fn show_config_error_dialog(error: &CoreError, config_path: &Path) {
    let message = format!(
        "The configuration file cannot be used:\n\n  \u{2022} {error}\n\n\
        Please edit the configuration file and restart."
    );

    let result = MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title("Mediagate - Configuration Required")
        .set_description(&message)
        .set_buttons(MessageButtons::OkCancelCustom(
            "Open Config".into(),
            "Exit".into(),
        ))
        .show();

    if matches!(result, MessageDialogResult::Custom(ref s) if s == "Open Config") {
        open_config(config_path);
    }
}

/// Show dialog when config is newly created
fn show_new_config_dialog(config_path: &Path) {
    let message = "A configuration file has been created.\n\n\
        Please edit it with the address of your gallery server:\n\
        \u{2022} server.base_url";

    let result = MessageDialog::new()
        .set_level(MessageLevel::Info)
        .set_title("Mediagate - Configuration Created")
        .set_description(message)
        .set_buttons(MessageButtons::OkCancelCustom(
            "Open Config".into(),
            "Exit".into(),
        ))
        .show();

    if matches!(result, MessageDialogResult::Custom(ref s) if s == "Open Config") {
        open_config(config_path);
    }
}

fn open_config(config_path: &Path) {
    if let Err(e) = open::that(config_path) {
        error!("Failed to open config file: {e}");
    }
}

/// Stop autoplay timers and exit once shutdown is requested
async fn shutdown_on_cancel(controller: Arc<PlaybackController>, cancel_token: CancellationToken) {
    cancel_token.cancelled().await;
    controller.shutdown().await;
    info!("Shutdown complete");
    std::process::exit(0);
}

/// Log controller events; the view already shows them to the user
async fn log_controller_events(controller: Arc<PlaybackController>) {
    let mut rx = controller.subscribe();

    loop {
        match rx.recv().await {
            Ok(ControllerEvent::SessionExpired) => warn!("Session expired, please log in again"),
            Ok(ControllerEvent::Error { message }) => error!("Gallery error: {}", message),
            Ok(event) => debug!("{:?}", event),
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                debug!("Missed {} controller events", n);
            }
        }
    }
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled() -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let Ok(content) = std::fs::read_to_string(GalleryConfig::config_path()) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with console output and optional file logging
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper_util=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer();

    if file_logging_enabled {
        let log_path = mediagate_core::log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
