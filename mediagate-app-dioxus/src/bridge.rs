use crate::state::GalleryState;
use dioxus::prelude::*;
use mediagate_core::{PlaybackController, View};
use std::sync::Arc;
use tracing::{debug, info};

const LOG_TARGET: &str = "mediagate::bridge";

/// Bridge the controller's render model to Dioxus signals.
/// This function spawns an async task that waits for view changes and
/// mirrors every new `View` into the gallery state.
pub fn use_controller_bridge(controller: &Arc<PlaybackController>, gallery: GalleryState) {
    let controller = controller.clone();
    use_future(move || {
        let controller = controller.clone();
        async move {
            let mut rx = controller.subscribe_view();
            apply_view(rx.borrow_and_update().clone(), gallery);

            while rx.changed().await.is_ok() {
                let view = rx.borrow_and_update().clone();
                apply_view(view, gallery);
            }

            info!(target: LOG_TARGET, "View channel closed");
        }
    });
}

fn apply_view(view: View, mut gallery: GalleryState) {
    debug!(
        target: LOG_TARGET,
        "View update ({})",
        if view.is_login() { "login" } else { "gallery" }
    );
    gallery.view.set(view);
}
