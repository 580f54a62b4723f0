use std::collections::VecDeque;
use std::env;
use std::io;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::thread;
use std::time::Duration;

use super::Capability;

pub const SPEECH_RATE: f32 = 0.9;
pub const SPEECH_PITCH: f32 = 1.0;

const PREFERRED_VOICE_HINTS: &[&str] = &["Google", "Natural", "Female"];

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("speech output is not available on this device")]
    Unavailable,

    #[error("speech engine failed: {0}")]
    Engine(#[from] io::Error),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub voice: Option<String>,
    pub rate: f32,
    pub pitch: f32,
}

impl Utterance {
    /// Slightly slowed speech in the most natural-sounding voice on offer.
    pub fn for_reading(text: impl Into<String>, voices: &[String]) -> Self {
        Self {
            text: text.into(),
            voice: pick_preferred_voice(voices).map(str::to_string),
            rate: SPEECH_RATE,
            pitch: SPEECH_PITCH,
        }
    }
}

pub fn pick_preferred_voice(voices: &[String]) -> Option<&str> {
    voices
        .iter()
        .find(|voice| PREFERRED_VOICE_HINTS.iter().any(|hint| voice.contains(hint)))
        .map(String::as_str)
}

pub trait SpeechSynthesizer: Send + Sync {
    fn voices(&self) -> Vec<String>;

    /// Queues an utterance behind whatever is already speaking and returns
    /// immediately.
    fn speak(&self, utterance: Utterance) -> Result<(), SpeechError>;

    /// Stops everything that is speaking or queued.
    fn cancel(&self);
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

type Launcher = Box<dyn Fn(&Utterance) -> io::Result<Child> + Send + Sync>;

#[derive(Default)]
struct QueueState {
    pending: VecDeque<Utterance>,
    current: Option<Child>,
    draining: bool,
}

/// Plays utterances one process at a time on a background thread.
struct SpeechQueue {
    launch: Launcher,
    state: Mutex<QueueState>,
}

impl SpeechQueue {
    fn new(launch: Launcher) -> Arc<Self> {
        Arc::new(Self {
            launch,
            state: Mutex::new(QueueState::default()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(self: &Arc<Self>, utterance: Utterance) -> Result<(), SpeechError> {
        let mut state = self.lock();
        state.pending.push_back(utterance);
        if state.draining {
            return Ok(());
        }
        let queue = Arc::clone(self);
        thread::Builder::new()
            .name("sahayak-speech".to_string())
            .spawn(move || queue.drain())?;
        state.draining = true;
        Ok(())
    }

    fn drain(&self) {
        loop {
            let mut state = self.lock();
            if let Some(child) = state.current.as_mut() {
                if let Ok(None) = child.try_wait() {
                    drop(state);
                    thread::sleep(POLL_INTERVAL);
                    continue;
                }
                state.current = None;
            }

            let Some(next) = state.pending.pop_front() else {
                state.draining = false;
                return;
            };
            match (self.launch)(&next) {
                Ok(child) => state.current = Some(child),
                Err(err) => tracing::warn!("failed to start speech: {}", err),
            }
        }
    }

    fn clear(&self) {
        let mut state = self.lock();
        state.pending.clear();
        if let Some(mut child) = state.current.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    #[cfg(test)]
    fn is_idle(&self) -> bool {
        let state = self.lock();
        !state.draining && state.pending.is_empty() && state.current.is_none()
    }
}

/// Reads text aloud with the platform's command line speech tool (`say` on
/// macOS, `espeak-ng` or `espeak` elsewhere).
pub struct SystemVoice {
    program: &'static str,
    voices: OnceLock<Vec<String>>,
    queue: Arc<SpeechQueue>,
}

impl SystemVoice {
    #[cfg(target_os = "macos")]
    const PROGRAMS: &'static [&'static str] = &["say"];
    #[cfg(not(target_os = "macos"))]
    const PROGRAMS: &'static [&'static str] = &["espeak-ng", "espeak"];

    pub fn detect() -> Capability<dyn SpeechSynthesizer> {
        match Self::PROGRAMS.iter().copied().find(|program| program_on_path(program)) {
            Some(program) => {
                let voice: Arc<dyn SpeechSynthesizer> = Arc::new(Self::new(program));
                Capability::Available(voice)
            }
            None => {
                tracing::info!(programs = ?Self::PROGRAMS, "speech synthesis not supported");
                Capability::Unavailable
            }
        }
    }

    fn new(program: &'static str) -> Self {
        Self {
            program,
            voices: OnceLock::new(),
            queue: SpeechQueue::new(Box::new(move |utterance| {
                command_for(program, utterance).spawn()
            })),
        }
    }

    fn list_voices(&self) -> Vec<String> {
        let mut command = Command::new(self.program);
        if self.program == "say" {
            command.arg("-v").arg("?");
        } else {
            command.arg("--voices");
        }
        match command.stderr(Stdio::null()).output() {
            Ok(output) => parse_voice_listing(self.program, &String::from_utf8_lossy(&output.stdout)),
            Err(err) => {
                tracing::warn!("failed to list voices: {}", err);
                Vec::new()
            }
        }
    }
}

impl SpeechSynthesizer for SystemVoice {
    fn voices(&self) -> Vec<String> {
        self.voices.get_or_init(|| self.list_voices()).clone()
    }

    fn speak(&self, utterance: Utterance) -> Result<(), SpeechError> {
        self.queue.push(utterance)
    }

    fn cancel(&self) {
        self.queue.clear();
    }
}

impl Drop for SystemVoice {
    fn drop(&mut self) {
        self.queue.clear();
    }
}

/// `espeak` and `espeak-ng` share flags; `say` has its own.
fn command_for(program: &str, utterance: &Utterance) -> Command {
    let mut command = Command::new(program);
    let words_per_minute = (175.0 * utterance.rate).round() as u32;
    if program == "say" {
        command.arg("-r").arg(words_per_minute.to_string());
    } else {
        let pitch = (50.0 * utterance.pitch).clamp(0.0, 99.0).round() as u32;
        command
            .arg("-s")
            .arg(words_per_minute.to_string())
            .arg("-p")
            .arg(pitch.to_string());
    }
    if let Some(voice) = &utterance.voice {
        command.arg("-v").arg(voice);
    }
    command
        .arg(&utterance.text)
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    command
}

fn program_on_path(program: &str) -> bool {
    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| is_file(&dir.join(program))))
        .unwrap_or(false)
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|meta| meta.is_file()).unwrap_or(false)
}

/// `say -v ?` prints `Name  locale  # sample`; `espeak-ng --voices` prints a
/// header row and then `Pty Language Age/Gender VoiceName File ...`.
fn parse_voice_listing(program: &str, listing: &str) -> Vec<String> {
    if program == "say" {
        listing
            .lines()
            .filter_map(|line| line.split("  ").next())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        listing
            .lines()
            .skip(1)
            .filter_map(|line| line.split_whitespace().nth(3))
            .map(str::to_string)
            .collect()
    }
}
