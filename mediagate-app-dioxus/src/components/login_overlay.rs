use crate::state::GalleryHandle;
use dioxus::prelude::*;
use mediagate_core::LoginView;
use tracing::debug;

const LOG_TARGET: &str = "mediagate::app";

/// Password prompt shown until the gallery grants a session.
#[component]
pub fn LoginOverlay(login: LoginView) -> Element {
    let handle = use_context::<GalleryHandle>();
    let mut password = use_signal(String::new);

    let key_handle = handle.clone();
    let on_key = move |evt: KeyboardEvent| {
        if evt.key() == Key::Enter {
            submit(&key_handle, password);
        }
    };
    let on_click = move |_: MouseEvent| submit(&handle, password);

    rsx! {
        div {
            class: "login-overlay",

            input {
                r#type: "password",
                placeholder: "Password",
                autofocus: true,
                value: "{password}",
                oninput: move |evt: FormEvent| password.set(evt.value()),
                onkeydown: on_key,
            }
            button { onclick: on_click, "Enter" }

            if login.error_visible {
                p { class: "login-error", "Incorrect password" }
            }
        }
    }
}

/// Send the typed credential and clear the field.
fn submit(handle: &GalleryHandle, mut password: Signal<String>) {
    let credential = password.peek().clone();
    password.set(String::new());

    handle.dispatch(move |controller| async move {
        let outcome = controller.login(&credential).await;
        debug!(target: LOG_TARGET, "Login granted: {}", outcome.granted);
    });
}
