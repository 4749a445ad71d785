use crate::state::GalleryHandle;
use dioxus::prelude::*;
use mediagate_core::{PlayAffordance, StatusLine};

/// Previous / play-pause / next buttons and the status line.
#[component]
pub fn Controls(status: StatusLine, affordance: PlayAffordance) -> Element {
    let handle = use_context::<GalleryHandle>();
    let (prev, toggle, next) = (handle.clone(), handle.clone(), handle);

    let play_class = if affordance.is_active() {
        "control play active"
    } else {
        "control play"
    };
    let label = affordance.label();
    let status_lines: Vec<String> = status.to_string().lines().map(str::to_string).collect();

    rsx! {
        div {
            class: "controls",

            button {
                class: "control",
                onclick: move |_| prev.dispatch(|controller| async move { controller.prev().await }),
                "Prev"
            }
            button {
                class: "{play_class}",
                onclick: move |_| toggle.dispatch(|controller| async move { controller.toggle_playback().await }),
                "{label}"
            }
            button {
                class: "control",
                onclick: move |_| next.dispatch(|controller| async move { controller.next().await }),
                "Next"
            }
        }
        div {
            class: "status",
            for (index, line) in status_lines.iter().enumerate() {
                div { key: "{index}", "{line}" }
            }
        }
    }
}
