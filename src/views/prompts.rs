use crate::capability::{KeyRequest, Notice, NoticeLevel};
use dioxus::prelude::*;

fn answer(mut pending: Signal<Option<KeyRequest>>, key: Option<String>) {
    if let Some(request) = pending.write().take() {
        if request.reply.send(key).is_err() {
            tracing::debug!("key request abandoned before it was answered");
        }
    }
}

#[component]
pub fn KeyPromptView(message: String, pending: Signal<Option<KeyRequest>>) -> Element {
    let mut key = use_signal(String::new);

    rsx! {
        div { class: "dialog-overlay",
            form {
                class: "dialog",
                onsubmit: move |ev: FormEvent| {
                    ev.prevent_default();
                    answer(pending, Some(key()));
                    key.set(String::new());
                },
                h2 { "API key" }
                p { "{message}" }
                input {
                    class: "dialog-input",
                    r#type: "password",
                    value: "{key}",
                    oninput: move |ev| key.set(ev.value()),
                    autofocus: true,
                }
                div { class: "dialog-actions",
                    button {
                        class: "btn btn-ghost",
                        r#type: "button",
                        onclick: move |_| answer(pending, None),
                        "Cancel"
                    }
                    button { class: "btn btn-primary", r#type: "submit", "Save" }
                }
            }
        }
    }
}

#[component]
pub fn NoticeToast(notice: Notice, slot: Signal<Option<Notice>>) -> Element {
    let class = match notice.level {
        NoticeLevel::Success => "toast success",
        NoticeLevel::Error => "toast error",
    };
    let mut slot = slot;
    rsx! {
        div { class: class, role: "status",
            span { "{notice.text}" }
            button { class: "btn btn-ghost", r#type: "button", onclick: move |_| slot.set(None), "Dismiss" }
        }
    }
}
