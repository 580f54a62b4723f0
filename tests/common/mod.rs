//! Substitutable backends and devices shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use sahayak::ai::{AiError, AiResult, ApiRejection, AssistantBackend, Generation};
use sahayak::capability::{
    Capability, CredentialPrompt, GeoError, GeoLocator, Notice, Notifier, RecognitionConfig,
    RecognitionEvent, SpeechError, SpeechRecognizer, SpeechSynthesizer, Utterance,
};
use sahayak::conversation::ConversationEvent;
use sahayak::types::Coordinates;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc};

// ============================================
// Assistant backend
// ============================================

pub enum Scripted {
    Reply(&'static str),
    Rejected {
        status: &'static str,
        message: &'static str,
    },
    Fail,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BackendCall {
    pub api_key: String,
    pub prompt: String,
}

#[derive(Default)]
pub struct FakeBackend {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<BackendCall>>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl FakeBackend {
    pub fn scripted(replies: impl IntoIterator<Item = Scripted>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        })
    }

    /// Every call signals `entered` and then waits for `release`.
    pub fn gated(reply: Scripted) -> (Arc<Self>, Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let backend = Arc::new(Self {
            script: Mutex::new(VecDeque::from([reply])),
            calls: Mutex::new(Vec::new()),
            gate: Some((Arc::clone(&entered), Arc::clone(&release))),
        });
        (backend, entered, release)
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssistantBackend for FakeBackend {
    async fn generate(&self, api_key: &str, prompt: &str) -> AiResult<Generation> {
        self.calls.lock().unwrap().push(BackendCall {
            api_key: api_key.to_string(),
            prompt: prompt.to_string(),
        });
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(text)) => Ok(Generation::Reply(text.to_string())),
            Some(Scripted::Rejected { status, message }) => {
                Ok(Generation::Rejected(ApiRejection {
                    http_status: Some(403),
                    code: None,
                    status: Some(status.to_string()),
                    message: message.to_string(),
                }))
            }
            Some(Scripted::Fail) | None => Err(AiError::EmptyResponse),
        }
    }
}

// ============================================
// Speech
// ============================================

#[derive(Default)]
pub struct FakeSynthesizer {
    pub spoken: Mutex<Vec<Utterance>>,
    pub cancels: Mutex<usize>,
}

impl FakeSynthesizer {
    pub fn spoken_texts(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.text.clone())
            .collect()
    }

    pub fn cancel_count(&self) -> usize {
        *self.cancels.lock().unwrap()
    }
}

impl SpeechSynthesizer for FakeSynthesizer {
    fn voices(&self) -> Vec<String> {
        vec!["Basic".to_string(), "Google UK English Female".to_string()]
    }

    fn speak(&self, utterance: Utterance) -> Result<(), SpeechError> {
        self.spoken.lock().unwrap().push(utterance);
        Ok(())
    }

    fn cancel(&self) {
        *self.cancels.lock().unwrap() += 1;
    }
}

pub fn synthesizer_capability(synth: &Arc<FakeSynthesizer>) -> Capability<dyn SpeechSynthesizer> {
    let synth: Arc<dyn SpeechSynthesizer> = synth.clone();
    Capability::Available(synth)
}

#[derive(Default)]
pub struct FakeRecognizer {
    pub configs: Mutex<Vec<RecognitionConfig>>,
    pub stops: Mutex<usize>,
    sender: Mutex<Option<mpsc::UnboundedSender<RecognitionEvent>>>,
}

impl FakeRecognizer {
    pub fn emit(&self, event: RecognitionEvent) {
        let sender = self.sender.lock().unwrap();
        sender
            .as_ref()
            .expect("no capture session running")
            .send(event)
            .expect("capture session closed");
    }

    pub fn start_count(&self) -> usize {
        self.configs.lock().unwrap().len()
    }

    pub fn stop_count(&self) -> usize {
        *self.stops.lock().unwrap()
    }
}

impl SpeechRecognizer for FakeRecognizer {
    fn start(
        &self,
        config: RecognitionConfig,
    ) -> Result<mpsc::UnboundedReceiver<RecognitionEvent>, SpeechError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.configs.lock().unwrap().push(config);
        *self.sender.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        *self.stops.lock().unwrap() += 1;
    }
}

pub fn recognizer_capability(recognizer: &Arc<FakeRecognizer>) -> Capability<dyn SpeechRecognizer> {
    let recognizer: Arc<dyn SpeechRecognizer> = recognizer.clone();
    Capability::Available(recognizer)
}

// ============================================
// Prompts, notices, location
// ============================================

#[derive(Default)]
pub struct FakePrompt {
    answers: Mutex<VecDeque<Option<String>>>,
    pub asked: Mutex<Vec<String>>,
}

impl FakePrompt {
    pub fn answering(answers: impl IntoIterator<Item = Option<&'static str>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(
                answers
                    .into_iter()
                    .map(|answer| answer.map(str::to_string))
                    .collect(),
            ),
            asked: Mutex::new(Vec::new()),
        })
    }

    pub fn times_asked(&self) -> usize {
        self.asked.lock().unwrap().len()
    }
}

#[async_trait]
impl CredentialPrompt for FakePrompt {
    async fn request_api_key(&self, message: &str) -> Option<String> {
        self.asked.lock().unwrap().push(message.to_string());
        self.answers.lock().unwrap().pop_front().flatten()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

pub enum FakeLocator {
    At(Coordinates),
    Refused,
}

#[async_trait]
impl GeoLocator for FakeLocator {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        match self {
            FakeLocator::At(coordinates) => Ok(*coordinates),
            FakeLocator::Refused => Err(GeoError::PermissionDenied),
        }
    }
}

pub fn locator_capability(locator: FakeLocator) -> Capability<dyn GeoLocator> {
    let locator: Arc<dyn GeoLocator> = Arc::new(locator);
    Capability::Available(locator)
}

// ============================================
// Event helpers
// ============================================

/// Waits for the first event matching `predicate`, failing after a while.
pub async fn wait_for_event(
    events: &mut broadcast::Receiver<ConversationEvent>,
    predicate: impl Fn(&ConversationEvent) -> bool,
) -> ConversationEvent {
    tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            let event = events.recv().await.expect("event stream closed");
            if predicate(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for conversation event")
}
