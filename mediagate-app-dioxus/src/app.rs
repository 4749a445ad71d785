use crate::components::{Controls, FilterPanel, LoginOverlay, MediaStage, VIDEO_ELEMENT_ID};
use crate::state::{GalleryHandle, GalleryState};
use dioxus::prelude::*;
use mediagate_core::View;
use tracing::warn;

const LOG_TARGET: &str = "mediagate::app";

/// Root application component.
/// Renders the login overlay or the gallery, never both.
#[component]
pub fn App() -> Element {
    let gallery = use_context::<GalleryState>();
    let handle = use_context::<GalleryHandle>();

    let view = gallery.view.read().clone();

    match view {
        View::Login(login) => rsx! {
            div {
                class: "app",
                LoginOverlay { login }
            }
        },
        View::Gallery(main) => {
            let on_key_down = move |evt: KeyboardEvent| handle_key(&handle, &evt);
            let error = main.error.map(|message| {
                rsx! {
                    div { class: "error-banner", "{message}" }
                }
            });

            rsx! {
                div {
                    class: "app",
                    tabindex: "0",
                    onmounted: move |evt| focus_on_mount(evt),
                    onkeydown: on_key_down,

                    FilterPanel { facets: main.facets, selection: main.selection }
                    {error}
                    MediaStage { surface: main.surface }
                    Controls { status: main.status, affordance: main.affordance }
                }
            }
        }
    }
}

/// Take keyboard focus so arrow keys work without clicking the gallery first.
async fn focus_on_mount(evt: MountedEvent) {
    if let Err(e) = evt.set_focus(true).await {
        warn!(target: LOG_TARGET, "Failed to focus gallery: {:?}", e);
    }
}

/// Keyboard map: arrows navigate, space toggles the mounted video.
fn handle_key(handle: &GalleryHandle, evt: &KeyboardEvent) {
    match evt.key() {
        Key::ArrowLeft => {
            evt.prevent_default();
            handle.dispatch(|controller| async move { controller.prev().await });
        }
        Key::ArrowRight => {
            evt.prevent_default();
            handle.dispatch(|controller| async move { controller.next().await });
        }
        Key::Character(c) if c == " " => {
            evt.prevent_default();
            toggle_video(handle.clone());
        }
        _ => {}
    }
}

/// Flip the controller's paused flag, then make the element follow it.
fn toggle_video(handle: GalleryHandle) {
    spawn(async move {
        let toggled = handle
            .call(|controller| async move { controller.toggle_video().await })
            .await
            .flatten();

        if let Some(paused) = toggled {
            let action = if paused { "pause" } else { "play" };
            let script = format!("document.getElementById('{VIDEO_ELEMENT_ID}')?.{action}();");
            if let Err(e) = document::eval(&script).await {
                warn!(target: LOG_TARGET, "Failed to {} video: {:?}", action, e);
            }
        }
    });
}
