//! Device capabilities the conversation and location dialog depend on
//!
//! Every capability is injected rather than looked up globally, so the
//! controller can be driven by real devices, by the UI shell, or by fakes.
pub mod geolocation;
pub mod prompt;
pub mod recognition;
pub mod speech;

use std::sync::Arc;

pub use geolocation::{FixedLocator, GeoError, GeoLocator};
pub use prompt::{
    ChannelNotifier, ChannelPrompt, CredentialPrompt, DeclinePrompt, KeyRequest, Notice,
    NoticeLevel, Notifier, TracingNotifier,
};
pub use recognition::{RecognitionConfig, RecognitionEvent, SpeechRecognizer};
pub use speech::{SpeechError, SpeechSynthesizer, SystemVoice, Utterance};

/// A platform service that may be missing or refused by the user.
pub enum Capability<T: ?Sized> {
    Available(Arc<T>),
    Unavailable,
    Denied,
}

impl<T: ?Sized> Capability<T> {
    pub fn get(&self) -> Option<&Arc<T>> {
        match self {
            Capability::Available(inner) => Some(inner),
            Capability::Unavailable | Capability::Denied => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Capability::Available(_) => "available",
            Capability::Unavailable => "unavailable",
            Capability::Denied => "denied",
        }
    }
}

impl<T: ?Sized> Clone for Capability<T> {
    fn clone(&self) -> Self {
        match self {
            Capability::Available(inner) => Capability::Available(Arc::clone(inner)),
            Capability::Unavailable => Capability::Unavailable,
            Capability::Denied => Capability::Denied,
        }
    }
}

impl<T: ?Sized> From<Option<Arc<T>>> for Capability<T> {
    fn from(value: Option<Arc<T>>) -> Self {
        value.map_or(Capability::Unavailable, Capability::Available)
    }
}
