use super::PageHandle;
use crate::location::CaptureResult;
use dioxus::prelude::*;
use std::sync::Arc;

#[component]
pub fn LocationPromptView(page: PageHandle) -> Element {
    let dialog = Arc::clone(page.0.location_dialog());
    let mut address = use_signal(|| dialog.manual_address());
    let mut locating = use_signal(|| false);

    let on_share = {
        let dialog = Arc::clone(&dialog);
        move |_| {
            if locating() {
                return;
            }
            let dialog = Arc::clone(&dialog);
            locating.set(true);
            spawn(async move {
                if let CaptureResult::Failed = dialog.share_current_location().await {
                    tracing::debug!("device location unavailable, manual entry remains");
                }
                locating.set(false);
            });
        }
    };
    let on_address = {
        let dialog = Arc::clone(&dialog);
        move |ev: FormEvent| {
            let value = ev.value();
            dialog.set_manual_address(value.clone());
            address.set(value);
        }
    };
    let on_confirm = {
        let dialog = Arc::clone(&dialog);
        move |ev: FormEvent| {
            ev.prevent_default();
            dialog.submit_manual();
        }
    };
    let on_close = {
        let page = page.clone();
        move |_| page.0.close_location_prompt()
    };

    rsx! {
        div { class: "dialog-overlay",
            div { class: "dialog", role: "dialog",
                div { class: "dialog-header",
                    h2 { "Share your location" }
                    p { class: "text-muted", "We need your location to process your order." }
                    button { class: "btn btn-ghost dialog-close", r#type: "button", onclick: on_close, "Close" }
                }
                button {
                    class: "btn btn-wide",
                    r#type: "button",
                    disabled: locating(),
                    onclick: on_share,
                    if locating() { "Getting location..." } else { "Share my current location" }
                }
                div { class: "divider", span { "OR" } }
                form { onsubmit: on_confirm,
                    input {
                        class: "dialog-input",
                        r#type: "text",
                        placeholder: "Enter your address manually",
                        value: "{address}",
                        oninput: on_address,
                    }
                    button { class: "btn btn-wide btn-primary", r#type: "submit", "Confirm address" }
                }
            }
        }
    }
}
