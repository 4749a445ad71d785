use crate::media::asset_path;
use crate::state::GalleryHandle;
use dioxus::prelude::*;
use mediagate_core::{MediaItem, Surface, SurfaceId, VideoAttributes};

/// DOM id of the mounted video element, used for scripted play/pause.
pub const VIDEO_ELEMENT_ID: &str = "stage-video";

/// The single display surface. Each surface id mounts a fresh element, so
/// events from an outgoing video never reach the controller under the new id.
#[component]
pub fn MediaStage(surface: Surface) -> Element {
    match surface {
        Surface::Blank => rsx! {
            div { class: "stage" }
        },
        Surface::Empty { message } => rsx! {
            div { class: "stage empty", "{message}" }
        },
        Surface::Image { id, item, .. } => rsx! {
            div {
                class: "stage",
                ImageSurface { key: "{id}", item }
            }
        },
        Surface::Video {
            id,
            item,
            attributes,
            ..
        } => rsx! {
            div {
                class: "stage",
                VideoSurface { key: "{id}", surface: id, item, attributes }
            }
        },
    }
}

#[component]
fn ImageSurface(item: MediaItem) -> Element {
    let src = asset_path(&item.id);

    rsx! {
        img { class: "surface", src: "{src}", alt: "{item.id}" }
    }
}

/// Streams from the asset route, so the player seeks with range requests.
#[component]
fn VideoSurface(surface: SurfaceId, item: MediaItem, attributes: VideoAttributes) -> Element {
    let handle = use_context::<GalleryHandle>();
    let src = asset_path(&item.id);

    let (ended, played, paused) = (handle.clone(), handle.clone(), handle);

    rsx! {
        video {
            id: VIDEO_ELEMENT_ID,
            class: "surface",
            src: "{src}",
            controls: attributes.controls,
            autoplay: attributes.autoplay,
            "loop": attributes.looped.then_some("true"),
            "playsinline": attributes.plays_inline.then_some("true"),
            "webkit-playsinline": attributes.plays_inline.then_some("true"),
            onended: move |_| {
                ended.dispatch(move |controller| async move {
                    controller.media_ended(surface).await;
                });
            },
            onplay: move |_| {
                played.dispatch(move |controller| async move {
                    controller.video_paused_changed(surface, false).await;
                });
            },
            onpause: move |_| {
                paused.dispatch(move |controller| async move {
                    controller.video_paused_changed(surface, true).await;
                });
            },
        }
    }
}
