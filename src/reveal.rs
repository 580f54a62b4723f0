use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// How long the speech toggle stays on screen after an assistant reply.
pub const REVEAL_WINDOW: Duration = Duration::from_secs(5);

type VisibilityCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Shows something for a fixed window after the latest trigger.
///
/// Each [`RevealTimer::reveal`] replaces the pending hide, so a burst of
/// triggers yields a single hide one window after the last of them. Dropping
/// the timer cancels the pending hide.
pub struct RevealTimer {
    window: Duration,
    visible: Arc<AtomicBool>,
    pending: Mutex<Option<JoinHandle<()>>>,
    on_change: VisibilityCallback,
}

impl RevealTimer {
    pub fn new(window: Duration, on_change: impl Fn(bool) + Send + Sync + 'static) -> Self {
        Self {
            window,
            visible: Arc::new(AtomicBool::new(false)),
            pending: Mutex::new(None),
            on_change: Arc::new(on_change),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    /// Must be called from within a tokio runtime.
    pub fn reveal(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        if !self.visible.swap(true, Ordering::SeqCst) {
            (self.on_change)(true);
        }

        let window = self.window;
        let visible = Arc::clone(&self.visible);
        let on_change = Arc::clone(&self.on_change);
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            if visible.swap(false, Ordering::SeqCst) {
                on_change(false);
            }
        }));
    }

    /// Hides immediately and drops the pending hide.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        if self.visible.swap(false, Ordering::SeqCst) {
            (self.on_change)(false);
        }
    }
}

impl Drop for RevealTimer {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = pending.take() {
            task.abort();
        }
    }
}
