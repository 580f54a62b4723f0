use tokio::sync::mpsc;

use super::SpeechError;
use crate::config::DEFAULT_RECOGNITION_LOCALE;

#[derive(Clone, Debug, PartialEq)]
pub struct RecognitionConfig {
    pub locale: String,
    pub continuous: bool,
    pub interim_results: bool,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            locale: DEFAULT_RECOGNITION_LOCALE.to_string(),
            continuous: true,
            interim_results: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RecognitionEvent {
    /// Best alternative of every result recognized so far in the session,
    /// interim ones included.
    Results(Vec<String>),
    /// The recognizer stopped on its own.
    Ended,
}

impl RecognitionEvent {
    pub fn transcript(results: &[String]) -> String {
        results.concat()
    }
}

/// Continuous speech-to-text capture.
pub trait SpeechRecognizer: Send + Sync {
    /// Begins a capture session. Events arrive on the returned channel until
    /// [`SpeechRecognizer::stop`] is called or the recognizer ends.
    fn start(
        &self,
        config: RecognitionConfig,
    ) -> Result<mpsc::UnboundedReceiver<RecognitionEvent>, SpeechError>;

    fn stop(&self);
}
