//! The conversation controller.
//!
//! Owns the transcript and the input box, sends each submission to the
//! assistant backend, and drives the speech side effects. A single
//! [`Conversation`] is meant to be shared (`Arc`) between the UI and the
//! tasks it spawns; all state sits behind one mutex and every change is
//! broadcast as a [`ConversationEvent`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::ai::gemini::compose_prompt;
use crate::ai::{AssistantBackend, Generation};
use crate::capability::{
    Capability, CredentialPrompt, DeclinePrompt, Notice, Notifier, RecognitionConfig,
    RecognitionEvent, SpeechRecognizer, SpeechSynthesizer, TracingNotifier, Utterance,
};
use crate::modes::{Mode, ModeKey, has_order_intent};
use crate::reveal::{REVEAL_WINDOW, RevealTimer};
use crate::storage::{self, KeyValueStore};
use crate::types::{Message, Role};

pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again later.";
pub const API_KEY_PROMPT: &str = "Please enter your Gemini API Key:";
pub const API_KEY_REQUIRED: &str = "API key is required to continue";

const EVENT_CAPACITY: usize = 64;

pub fn greeting(mode: &Mode) -> String {
    format!(
        "Hello! I'm your {} assistant. How can I help you today?",
        mode.name
    )
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub input: String,
    pub is_listening: bool,
    pub is_loading: bool,
    pub use_speech: bool,
    pub api_key: Option<String>,
    pub speech_toggle_visible: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConversationEvent {
    MessageAppended(Message),
    InputChanged(String),
    LoadingChanged(bool),
    ListeningChanged(bool),
    SpeechChanged(bool),
    SpeechToggleVisible(bool),
    LocationRequested,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input; nothing happened.
    Ignored,
    /// No API key and the user declined to give one; nothing was appended.
    MissingCredential,
    /// A user message and an assistant message were appended.
    Answered,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("still waiting for the previous reply")]
    Busy,
}

type LocationCallback = Arc<dyn Fn() + Send + Sync>;

struct Shared {
    state: Mutex<ConversationState>,
    events: broadcast::Sender<ConversationEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ConversationEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn set_input(&self, text: String) {
        self.lock().input = text.clone();
        self.emit(ConversationEvent::InputChanged(text));
    }

    fn set_listening(&self, listening: bool) {
        self.lock().is_listening = listening;
        self.emit(ConversationEvent::ListeningChanged(listening));
    }

    fn set_loading(&self, loading: bool) {
        self.lock().is_loading = loading;
        self.emit(ConversationEvent::LoadingChanged(loading));
    }
}

/// A running speech-to-text session. Dropping it releases the microphone
/// unless the recognizer already ended on its own.
struct CaptureSession {
    recognizer: Arc<dyn SpeechRecognizer>,
    forward: JoinHandle<()>,
    ended: Arc<AtomicBool>,
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.forward.abort();
        if !self.ended.load(Ordering::SeqCst) {
            self.recognizer.stop();
        }
    }
}

/// Clears the in-flight slot, and the loading flag once it was raised, on
/// every exit path of `submit`.
struct InFlight<'a> {
    conversation: &'a Conversation,
    loading: bool,
}

impl InFlight<'_> {
    fn start_loading(&mut self) {
        self.loading = true;
        self.conversation.shared.set_loading(true);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.loading {
            self.conversation.shared.set_loading(false);
        }
        self.conversation.in_flight.store(false, Ordering::SeqCst);
    }
}

pub struct ConversationBuilder {
    mode: &'static Mode,
    backend: Arc<dyn AssistantBackend>,
    store: Arc<dyn KeyValueStore>,
    synthesizer: Capability<dyn SpeechSynthesizer>,
    recognizer: Capability<dyn SpeechRecognizer>,
    recognition: RecognitionConfig,
    prompt: Arc<dyn CredentialPrompt>,
    notifier: Arc<dyn Notifier>,
    on_location_request: Option<LocationCallback>,
    fallback_api_key: Option<String>,
}

impl ConversationBuilder {
    pub fn synthesizer(mut self, synthesizer: Capability<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }

    pub fn recognizer(mut self, recognizer: Capability<dyn SpeechRecognizer>) -> Self {
        self.recognizer = recognizer;
        self
    }

    pub fn recognition_config(mut self, config: RecognitionConfig) -> Self {
        self.recognition = config;
        self
    }

    pub fn credential_prompt(mut self, prompt: Arc<dyn CredentialPrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Called when a shopping-mode message shows order intent.
    pub fn on_location_request(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_location_request = Some(Arc::new(callback));
        self
    }

    /// Key to use when the store holds none, e.g. from configuration.
    pub fn fallback_api_key(mut self, key: Option<String>) -> Self {
        self.fallback_api_key = key;
        self
    }

    /// Seeds the greeting and loads the persisted settings.
    pub fn build(self) -> Conversation {
        let api_key = storage::load_api_key(self.store.as_ref()).or(self.fallback_api_key);
        let use_speech = storage::load_use_speech(self.store.as_ref());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let shared = Arc::new(Shared {
            state: Mutex::new(ConversationState {
                messages: vec![Message::assistant(greeting(self.mode))],
                input: String::new(),
                is_listening: false,
                is_loading: false,
                use_speech,
                api_key,
                speech_toggle_visible: false,
            }),
            events,
        });

        let reveal_target = Arc::clone(&shared);
        let reveal = RevealTimer::new(REVEAL_WINDOW, move |visible| {
            reveal_target.lock().speech_toggle_visible = visible;
            reveal_target.emit(ConversationEvent::SpeechToggleVisible(visible));
        });

        tracing::debug!(
            mode = self.mode.key.as_str(),
            use_speech,
            synthesizer = self.synthesizer.label(),
            recognizer = self.recognizer.label(),
            "conversation ready"
        );

        Conversation {
            mode: self.mode,
            shared,
            backend: self.backend,
            store: self.store,
            synthesizer: self.synthesizer,
            recognizer: self.recognizer,
            recognition: self.recognition,
            prompt: self.prompt,
            notifier: self.notifier,
            on_location_request: self.on_location_request,
            in_flight: AtomicBool::new(false),
            capture: Mutex::new(None),
            reveal,
        }
    }
}

pub struct Conversation {
    mode: &'static Mode,
    shared: Arc<Shared>,
    backend: Arc<dyn AssistantBackend>,
    store: Arc<dyn KeyValueStore>,
    synthesizer: Capability<dyn SpeechSynthesizer>,
    recognizer: Capability<dyn SpeechRecognizer>,
    recognition: RecognitionConfig,
    prompt: Arc<dyn CredentialPrompt>,
    notifier: Arc<dyn Notifier>,
    on_location_request: Option<LocationCallback>,
    in_flight: AtomicBool,
    capture: Mutex<Option<CaptureSession>>,
    reveal: RevealTimer,
}

impl Conversation {
    pub fn builder(
        mode: &'static Mode,
        backend: Arc<dyn AssistantBackend>,
        store: Arc<dyn KeyValueStore>,
    ) -> ConversationBuilder {
        ConversationBuilder {
            mode,
            backend,
            store,
            synthesizer: Capability::Unavailable,
            recognizer: Capability::Unavailable,
            recognition: RecognitionConfig::default(),
            prompt: Arc::new(DeclinePrompt),
            notifier: Arc::new(TracingNotifier),
            on_location_request: None,
            fallback_api_key: None,
        }
    }

    pub fn mode(&self) -> &'static Mode {
        self.mode
    }

    pub fn snapshot(&self) -> ConversationState {
        self.shared.lock().clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.shared.lock().messages.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.shared.events.subscribe()
    }

    pub fn set_input(&self, text: impl Into<String>) {
        self.shared.set_input(text.into());
    }

    /// Sends `text` to the assistant and appends both sides of the exchange.
    ///
    /// Only one submission may be outstanding; a second one is refused with
    /// [`SubmitError::Busy`]. Backend failures never surface here, they
    /// become assistant messages.
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome, SubmitError> {
        if text.trim().is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("submission refused, a reply is pending");
            return Err(SubmitError::Busy);
        }
        let mut guard = InFlight {
            conversation: self,
            loading: false,
        };

        let current_key = self.shared.lock().api_key.clone();
        let api_key = match current_key {
            Some(key) => key,
            None => match self.ask_for_api_key().await {
                Some(key) => key,
                None => {
                    self.notifier.notify(Notice::error(API_KEY_REQUIRED));
                    return Ok(SubmitOutcome::MissingCredential);
                }
            },
        };

        self.append(Message::user(text));
        self.shared.set_input(String::new());
        guard.start_loading();

        if self.mode.key == ModeKey::Shopping && has_order_intent(text) {
            tracing::info!("order intent detected, requesting location");
            self.shared.emit(ConversationEvent::LocationRequested);
            if let Some(callback) = &self.on_location_request {
                callback();
            }
        }

        let prompt = compose_prompt(self.mode.system_prompt, text);
        let mut credential_refused = false;
        let reply = match self.backend.generate(&api_key, &prompt).await {
            Ok(Generation::Reply(reply)) => reply,
            Ok(Generation::Rejected(rejection)) => {
                credential_refused = rejection.is_credential_error();
                rejection.display_text()
            }
            Err(err) => {
                tracing::error!("assistant request failed: {}", err);
                APOLOGY.to_string()
            }
        };
        self.receive_assistant_message(Message::assistant(reply));

        if credential_refused {
            tracing::warn!("API key refused, asking for a replacement");
            if self.ask_for_api_key().await.is_none() {
                self.notifier.notify(Notice::error(API_KEY_REQUIRED));
            }
        }

        drop(guard);
        Ok(SubmitOutcome::Answered)
    }

    /// Flips the microphone on or off.
    pub fn toggle_listening(&self) {
        let listening = !self.shared.lock().is_listening;
        self.shared.set_listening(listening);
        if listening {
            self.start_capture();
        } else {
            self.stop_capture();
        }
    }

    /// Flips read-aloud. Turning it off silences the current utterance;
    /// turning it on reads the latest assistant message again.
    pub fn toggle_speech(&self) {
        let (enabled, last_reply) = {
            let mut state = self.shared.lock();
            state.use_speech = !state.use_speech;
            let last_reply = state
                .messages
                .iter()
                .rev()
                .find(|message| message.role == Role::Assistant)
                .map(|message| message.text.clone());
            (state.use_speech, last_reply)
        };

        if let Err(err) = storage::save_use_speech(self.store.as_ref(), enabled) {
            tracing::warn!("failed to persist speech preference: {}", err);
        }
        self.shared.emit(ConversationEvent::SpeechChanged(enabled));

        if !enabled {
            if let Some(synthesizer) = self.synthesizer.get() {
                synthesizer.cancel();
            }
        } else if let Some(text) = last_reply {
            self.speak(&text);
        }
    }

    fn append(&self, message: Message) {
        self.shared.lock().messages.push(message.clone());
        self.shared.emit(ConversationEvent::MessageAppended(message));
    }

    fn receive_assistant_message(&self, message: Message) {
        let text = message.text.clone();
        self.append(message);
        self.reveal.reveal();
        if self.shared.lock().use_speech {
            self.speak(&text);
        }
    }

    fn speak(&self, text: &str) {
        let Some(synthesizer) = self.synthesizer.get() else {
            return;
        };
        let voices = synthesizer.voices();
        if let Err(err) = synthesizer.speak(Utterance::for_reading(text, &voices)) {
            tracing::warn!("failed to speak reply: {}", err);
        }
    }

    async fn ask_for_api_key(&self) -> Option<String> {
        let key = self.prompt.request_api_key(API_KEY_PROMPT).await?;
        if let Err(err) = storage::save_api_key(self.store.as_ref(), &key) {
            tracing::warn!("failed to persist API key: {}", err);
        }
        self.shared.lock().api_key = Some(key.clone());
        Some(key)
    }

    fn capture_slot(&self) -> MutexGuard<'_, Option<CaptureSession>> {
        self.capture.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_capture(&self) {
        let mut slot = self.capture_slot();
        slot.take();

        let Some(recognizer) = self.recognizer.get() else {
            tracing::info!(
                "speech recognition {} on this device",
                self.recognizer.label()
            );
            return;
        };

        let mut events = match recognizer.start(self.recognition.clone()) {
            Ok(events) => events,
            Err(err) => {
                tracing::warn!("failed to start speech recognition: {}", err);
                drop(slot);
                self.shared.set_listening(false);
                return;
            }
        };

        let shared = Arc::clone(&self.shared);
        let ended = Arc::new(AtomicBool::new(false));
        let finished = Arc::clone(&ended);
        let forward = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    RecognitionEvent::Results(results) => {
                        shared.set_input(RecognitionEvent::transcript(&results));
                    }
                    RecognitionEvent::Ended => break,
                }
            }
            finished.store(true, Ordering::SeqCst);
            shared.set_listening(false);
        });

        *slot = Some(CaptureSession {
            recognizer: Arc::clone(recognizer),
            forward,
            ended,
        });
    }

    fn stop_capture(&self) {
        self.capture_slot().take();
    }
}

impl Drop for Conversation {
    fn drop(&mut self) {
        let slot = self.capture.get_mut().unwrap_or_else(PoisonError::into_inner);
        slot.take();
        self.reveal.cancel();
    }
}
