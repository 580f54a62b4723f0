use super::PageHandle;
use crate::conversation::Conversation;
use crate::render::reply_to_html;
use crate::types::{Message, format_message_timestamp};
use dioxus::events::Key;
use dioxus::prelude::*;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

fn side(msg: &Message) -> &'static str {
    if msg.is_user() { "user" } else { "assistant" }
}

fn bubble_style(msg: &Message, accent: &str) -> String {
    if msg.is_user() {
        String::new()
    } else {
        format!("background-color: {accent}20;")
    }
}

fn send_message(conversation: &Arc<Conversation>, text: String) {
    let conversation = Arc::clone(conversation);
    spawn(async move {
        if let Err(err) = conversation.submit(&text).await {
            tracing::debug!("submit refused: {}", err);
        }
    });
}

#[component]
pub fn ChatView(page: PageHandle) -> Element {
    let conversation = Arc::clone(page.0.conversation());
    let mut state = use_signal(|| conversation.snapshot());

    let watched = Arc::clone(&conversation);
    use_future(move || {
        let conversation = Arc::clone(&watched);
        async move {
            let mut events = conversation.subscribe();
            state.set(conversation.snapshot());
            loop {
                match events.recv().await {
                    Ok(_) | Err(RecvError::Lagged(_)) => state.set(conversation.snapshot()),
                    Err(RecvError::Closed) => break,
                }
            }
        }
    });

    let accent = page.0.mode().accent_color;
    let snapshot = state();

    let on_input = {
        let conversation = Arc::clone(&conversation);
        move |ev: FormEvent| conversation.set_input(ev.value())
    };
    let on_keydown = {
        let conversation = Arc::clone(&conversation);
        move |ev: KeyboardEvent| {
            if ev.key() == Key::Enter && !ev.modifiers().shift() {
                ev.prevent_default();
                let text = conversation.snapshot().input;
                send_message(&conversation, text);
            }
        }
    };
    let on_send = {
        let conversation = Arc::clone(&conversation);
        move |_| {
            let text = conversation.snapshot().input;
            send_message(&conversation, text);
        }
    };
    let on_mic = {
        let conversation = Arc::clone(&conversation);
        move |_| conversation.toggle_listening()
    };
    let on_speech = {
        let conversation = Arc::clone(&conversation);
        move |_| conversation.toggle_speech()
    };

    rsx! {
        div { class: "chat",
            div { class: "chat-list",
                for (i, msg) in snapshot.messages.iter().enumerate() {
                    div { key: "{i}", class: format_args!("message-row {}", side(msg)),
                        div {
                            class: format_args!("bubble {}", side(msg)),
                            style: bubble_style(msg, accent),
                            if msg.is_user() {
                                p { "{msg.text}" }
                            } else {
                                div { class: "md", dangerous_inner_html: reply_to_html(&msg.text) }
                            }
                            if let Some(ts) = format_message_timestamp(msg.timestamp) {
                                div { class: "message-timestamp", "{ts}" }
                            }
                        }
                    }
                }
                if snapshot.is_loading {
                    div { class: "message-row assistant",
                        div { class: "bubble assistant typing",
                            span { class: "dot" }
                            span { class: "dot" }
                            span { class: "dot" }
                        }
                    }
                }
            }

            if snapshot.speech_toggle_visible {
                div { class: "speech-toggle",
                    button { class: "btn", r#type: "button", onclick: on_speech,
                        if snapshot.use_speech { "Stop reading aloud" } else { "Read replies aloud" }
                    }
                }
            }

            form { class: "composer", onsubmit: move |ev: FormEvent| ev.prevent_default(),
                button {
                    class: format_args!("btn btn-round {}", if snapshot.is_listening { "listening" } else { "" }),
                    r#type: "button",
                    onclick: on_mic,
                    if snapshot.is_listening { "Stop" } else { "Speak" }
                }
                input {
                    class: "composer-input",
                    r#type: "text",
                    placeholder: "Type your message...",
                    value: "{snapshot.input}",
                    oninput: on_input,
                    onkeydown: on_keydown,
                    autofocus: true,
                }
                button {
                    class: "btn btn-round btn-primary",
                    style: "background-color: {accent};",
                    r#type: "button",
                    disabled: snapshot.is_loading || snapshot.input.trim().is_empty(),
                    onclick: on_send,
                    "Send"
                }
            }
        }
    }
}
