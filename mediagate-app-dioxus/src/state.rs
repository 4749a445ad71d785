use dioxus::prelude::*;
use mediagate_core::{PlaybackController, View};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::warn;

const LOG_TARGET: &str = "mediagate::app";

/// Render model mirrored from the controller.
#[derive(Clone, Copy)]
pub struct GalleryState {
    pub view: Signal<View>,
}

impl GalleryState {
    #[must_use]
    pub fn new(initial: View) -> Self {
        Self {
            view: Signal::new(initial),
        }
    }
}

/// Access to the controller from UI event handlers.
///
/// Controller operations arm tokio timers, so they always run on the
/// background runtime rather than on the webview's executor.
#[derive(Clone)]
pub struct GalleryHandle {
    controller: Arc<PlaybackController>,
    runtime: Handle,
}

impl GalleryHandle {
    pub const fn new(controller: Arc<PlaybackController>, runtime: Handle) -> Self {
        Self {
            controller,
            runtime,
        }
    }

    #[must_use]
    pub fn controller(&self) -> Arc<PlaybackController> {
        self.controller.clone()
    }

    /// Run a controller operation in the background.
    pub fn dispatch<F, Fut>(&self, op: F)
    where
        F: FnOnce(Arc<PlaybackController>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(op(self.controller.clone()));
    }

    /// Run a controller operation in the background and wait for its result.
    pub async fn call<F, Fut, T>(&self, op: F) -> Option<T>
    where
        F: FnOnce(Arc<PlaybackController>) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        match self.runtime.spawn(op(self.controller.clone())).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(target: LOG_TARGET, "Controller task failed: {}", e);
                None
            }
        }
    }
}
