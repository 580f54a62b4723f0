use crate::capability::{ChannelNotifier, ChannelPrompt, KeyRequest, Notice};
use crate::config::AppConfig;
use crate::page::{ChatPage, PageServices};
use crate::views::{ChatView, KeyPromptView, LocationPromptView, NoticeToast, PageHandle};
use dioxus::prelude::*;
use once_cell::sync::OnceCell;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::UnboundedReceiver;

const SAHAYAK_CSS: Asset = asset!("/assets/sahayak.css");

static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// Starts the app with an already-loaded configuration.
pub fn launch(config: AppConfig) {
    if CONFIG.set(config).is_err() {
        tracing::warn!("launch called twice, keeping the first configuration");
    }
    dioxus::launch(App);
}

/// Receivers handed from the page wiring to the components that drain them.
#[derive(Clone)]
struct Inbox {
    key_requests: Arc<Mutex<Option<UnboundedReceiver<KeyRequest>>>>,
    notices: Arc<Mutex<Option<UnboundedReceiver<Notice>>>>,
}

fn take<T>(slot: &Mutex<Option<T>>) -> Option<T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

fn build_page() -> (PageHandle, Inbox) {
    let config = CONFIG.get().cloned().unwrap_or_default();
    let (prompt, key_requests) = ChannelPrompt::new();
    let (notifier, notices) = ChannelNotifier::new();
    let services = PageServices::from_config(&config, Arc::new(prompt), Arc::new(notifier));
    let page = ChatPage::new(config.mode.as_deref(), services);
    (
        PageHandle(Arc::new(page)),
        Inbox {
            key_requests: Arc::new(Mutex::new(Some(key_requests))),
            notices: Arc::new(Mutex::new(Some(notices))),
        },
    )
}

#[component]
pub fn App() -> Element {
    let (page, inbox) = use_hook(build_page);
    let mut page_state = use_signal(|| page.0.state());
    let mut pending_key = use_signal(|| Option::<KeyRequest>::None);
    let mut notice = use_signal(|| Option::<Notice>::None);

    let watched = page.clone();
    use_future(move || {
        let mut changes = watched.0.subscribe();
        async move {
            while changes.changed().await.is_ok() {
                let latest = changes.borrow_and_update().clone();
                page_state.set(latest);
            }
        }
    });

    let key_inbox = inbox.clone();
    use_future(move || {
        let requests = take(&key_inbox.key_requests);
        async move {
            let Some(mut requests) = requests else { return };
            while let Some(request) = requests.recv().await {
                pending_key.set(Some(request));
            }
        }
    });

    let notice_inbox = inbox.clone();
    use_future(move || {
        let notices = take(&notice_inbox.notices);
        async move {
            let Some(mut notices) = notices else { return };
            while let Some(next) = notices.recv().await {
                notice.set(Some(next));
            }
        }
    });

    let mode = page.0.mode();
    let state = page_state();
    let badge = mode.name.chars().next().unwrap_or('S');
    let key_message = pending_key.read().as_ref().map(|request| request.message.clone());

    rsx! {
        document::Link { rel: "stylesheet", href: SAHAYAK_CSS }
        div { class: "page",
            header { class: "header", style: "background-color: {mode.accent_color}10;",
                div { class: "mode-badge", style: "background-color: {mode.accent_color};",
                    "{badge}"
                }
                div { class: "header-text",
                    h1 { "{mode.name}" }
                    p { class: "text-muted", "{mode.description}" }
                }
                if let Some(location) = state.location.as_ref() {
                    div { class: "header-location", "Location: {location.address}" }
                }
            }
            main { class: "main", ChatView { page: page.clone() } }
        }
        if state.location_prompt_open {
            LocationPromptView { page: page.clone() }
        }
        if let Some(message) = key_message {
            KeyPromptView { message, pending: pending_key }
        }
        if let Some(current) = notice() {
            NoticeToast { notice: current, slot: notice }
        }
    }
}
