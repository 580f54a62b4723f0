//! The chat page: a conversation plus the location dialog it can open.

use std::sync::Arc;
use tokio::sync::watch;

use crate::ai::{AssistantBackend, GeminiClient};
use crate::capability::{
    Capability, CredentialPrompt, FixedLocator, GeoLocator, Notifier, RecognitionConfig,
    SpeechRecognizer, SpeechSynthesizer, SystemVoice,
};
use crate::config::AppConfig;
use crate::conversation::Conversation;
use crate::location::LocationDialog;
use crate::modes::{Mode, ModeKey, resolve_mode};
use crate::storage::{self, KeyValueStore};
use crate::types::Location;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageState {
    pub location_prompt_open: bool,
    pub location: Option<Location>,
}

/// Everything a page needs from the outside world.
pub struct PageServices {
    pub backend: Arc<dyn AssistantBackend>,
    pub store: Arc<dyn KeyValueStore>,
    pub synthesizer: Capability<dyn SpeechSynthesizer>,
    pub recognizer: Capability<dyn SpeechRecognizer>,
    pub locator: Capability<dyn GeoLocator>,
    pub prompt: Arc<dyn CredentialPrompt>,
    pub notifier: Arc<dyn Notifier>,
    pub recognition: RecognitionConfig,
    pub fallback_api_key: Option<String>,
}

impl PageServices {
    /// Platform services: the hosted endpoint, the on-disk store, the system
    /// voice and a configured position. Speech recognition has no native
    /// backend and is reported unavailable.
    pub fn from_config(
        config: &AppConfig,
        prompt: Arc<dyn CredentialPrompt>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let store: Arc<dyn KeyValueStore> = match &config.storage_dir {
            #[cfg(not(target_arch = "wasm32"))]
            Some(dir) => Arc::new(storage::FileStore::new(dir)),
            _ => storage::default_store(),
        };
        Self {
            backend: Arc::new(GeminiClient::from_config(config)),
            store,
            synthesizer: SystemVoice::detect(),
            recognizer: Capability::Unavailable,
            locator: FixedLocator::from_config(config),
            prompt,
            notifier,
            recognition: RecognitionConfig {
                locale: config.recognition_locale.clone(),
                ..RecognitionConfig::default()
            },
            fallback_api_key: config.gemini_api_key.clone(),
        }
    }
}

pub struct ChatPage {
    mode: &'static Mode,
    conversation: Arc<Conversation>,
    dialog: Arc<LocationDialog>,
    state: Arc<watch::Sender<PageState>>,
}

impl ChatPage {
    /// Resolves `mode_param` (unknown values fall back to the information
    /// assistant) and wires the conversation to the location dialog.
    pub fn new(mode_param: Option<&str>, services: PageServices) -> Self {
        let mode = resolve_mode(mode_param);
        let (state, _) = watch::channel(PageState::default());
        let state = Arc::new(state);

        let mut builder = Conversation::builder(mode, services.backend, services.store)
            .synthesizer(services.synthesizer)
            .recognizer(services.recognizer)
            .recognition_config(services.recognition)
            .credential_prompt(services.prompt)
            .notifier(Arc::clone(&services.notifier))
            .fallback_api_key(services.fallback_api_key);
        if mode.key == ModeKey::Shopping {
            let opener = Arc::clone(&state);
            builder = builder.on_location_request(move || {
                opener.send_modify(|page| page.location_prompt_open = true);
            });
        }

        let confirmer = Arc::clone(&state);
        let dialog = LocationDialog::new(services.locator, services.notifier, move |location| {
            tracing::info!(address = %location.address, "delivery location set");
            confirmer.send_modify(|page| {
                page.location = Some(location);
                page.location_prompt_open = false;
            });
        });

        Self {
            mode,
            conversation: Arc::new(builder.build()),
            dialog: Arc::new(dialog),
            state,
        }
    }

    pub fn mode(&self) -> &'static Mode {
        self.mode
    }

    pub fn conversation(&self) -> &Arc<Conversation> {
        &self.conversation
    }

    pub fn location_dialog(&self) -> &Arc<LocationDialog> {
        &self.dialog
    }

    pub fn state(&self) -> PageState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PageState> {
        self.state.subscribe()
    }

    pub fn is_location_prompt_open(&self) -> bool {
        self.state.borrow().location_prompt_open
    }

    pub fn location(&self) -> Option<Location> {
        self.state.borrow().location.clone()
    }

    /// Dismisses the dialog without a location.
    pub fn close_location_prompt(&self) {
        self.state
            .send_modify(|page| page.location_prompt_open = false);
    }
}
