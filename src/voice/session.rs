//! Voice session controller
//!
//! Owns the capture lifecycle and the wake-word protocol. A session is an
//! explicit object owned by its caller; each activation runs on one spawned
//! task and hands back exactly one finalized command or one error.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::AbortHandle;

use super::capture::{CaptureBackend, CaptureSettings, Utterance};
use super::synthesis::Speaker;
use super::wake_word::{WakeDecision, WakeWord};
use crate::{Error, Result};

/// Spoken when the wake word is heard on its own
pub const ACKNOWLEDGEMENT: &str = "Yes, how can I help you?";

/// Spoken when the wake word is followed by nothing
pub const REPROMPT: &str = "I'm listening. Please give me a command.";

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Listening,
    AwaitingCommand,
    Processing,
    /// Speaking a reply with no capture active
    Speaking,
}

impl SessionState {
    /// Whether capture or command processing is underway
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Listening | Self::AwaitingCommand | Self::Processing)
    }

    /// Display name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
            Self::AwaitingCommand => "awaiting_command",
            Self::Processing => "processing",
            Self::Speaking => "speaking",
        }
    }
}

/// Session tuning
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Settings passed to every capture
    pub capture: CaptureSettings,
    /// Delay before capture is re-armed after a spoken prompt
    pub settle_delay: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            capture: CaptureSettings::default(),
            settle_delay: Duration::from_millis(crate::config::DEFAULT_SETTLE_DELAY_MS),
        }
    }
}

type ResultCallback = Box<dyn FnOnce(String) + Send>;
type ErrorCallback = Box<dyn FnOnce(Error) + Send>;

/// One activation's callbacks; exactly one is consumed
struct Callbacks {
    on_result: ResultCallback,
    on_error: ErrorCallback,
}

/// Guarded by the control lock
struct Control {
    generation: u64,
    task: Option<AbortHandle>,
}

struct Inner {
    capture: Arc<dyn CaptureBackend>,
    speaker: Speaker,
    wake_word: WakeWord,
    options: SessionOptions,
    state: watch::Sender<SessionState>,
    control: Mutex<Control>,
}

impl Inner {
    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Move to `next` if `generation` is still the live activation
    fn transition(&self, generation: u64, next: SessionState) -> bool {
        let control = self.control();
        if control.generation != generation {
            return false;
        }
        self.set_state(next);
        true
    }

    fn set_state(&self, next: SessionState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::debug!(from = previous.as_str(), to = next.as_str(), "session state");
        }
    }

    /// Finish an activation with an error
    fn fail(&self, generation: u64, error: Error, callbacks: Callbacks) {
        {
            let mut control = self.control();
            if control.generation != generation {
                return;
            }
            control.task = None;
            self.set_state(SessionState::Idle);
        }

        tracing::warn!(error = %error, "voice session ended with error");
        (callbacks.on_error)(error);
    }

    /// Hand a command to the caller, then return to idle
    ///
    /// The generation check and the move to `Processing` happen under one
    /// lock, so a `stop` either lands first and suppresses the callback or
    /// finds delivery already committed.
    fn deliver(&self, generation: u64, command: String, callbacks: Callbacks) {
        tracing::info!(command = %command, "command captured");
        if !self.transition(generation, SessionState::Processing) {
            return;
        }
        (callbacks.on_result)(command);

        let mut control = self.control();
        if control.generation == generation {
            control.task = None;
            self.set_state(SessionState::Idle);
        }
    }

    /// Speak a prompt and wait for the speaker to settle before re-arming
    async fn prompt(&self, generation: u64, text: &str) -> bool {
        if !self.transition(generation, SessionState::AwaitingCommand) {
            return false;
        }
        self.speaker.speak(text).await;
        tokio::time::sleep(self.options.settle_delay).await;
        true
    }

    async fn run(self: Arc<Self>, generation: u64, callbacks: Callbacks) {
        loop {
            let awaiting = self.current_state() == SessionState::AwaitingCommand;

            let utterance = match self.capture.capture(&self.options.capture).await {
                Ok(Some(text)) => Utterance::new(&text),
                Ok(None) => {
                    let error = Error::Capture("no speech detected".to_string());
                    self.fail(generation, error, callbacks);
                    return;
                }
                Err(e) => {
                    let error = match e {
                        Error::Capture(_) | Error::UnsupportedCapability(_) => e,
                        other => Error::Capture(other.to_string()),
                    };
                    self.fail(generation, error, callbacks);
                    return;
                }
            };

            tracing::debug!(transcript = utterance.text(), awaiting, "utterance received");

            if awaiting {
                self.deliver(generation, utterance.text().to_string(), callbacks);
                return;
            }

            let reply = match self.wake_word.decide(utterance.text()) {
                WakeDecision::Acknowledge => ACKNOWLEDGEMENT,
                WakeDecision::Reprompt => REPROMPT,
                WakeDecision::Command(command) | WakeDecision::Passthrough(command) => {
                    self.deliver(generation, command, callbacks);
                    return;
                }
            };

            if !self.prompt(generation, reply).await {
                return;
            }
        }
    }
}

/// Voice session controller
#[derive(Clone)]
pub struct VoiceSession {
    inner: Arc<Inner>,
}

impl VoiceSession {
    /// Create an idle session
    #[must_use]
    pub fn new(
        capture: Arc<dyn CaptureBackend>,
        speaker: Speaker,
        wake_word: WakeWord,
        options: SessionOptions,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            inner: Arc::new(Inner {
                capture,
                speaker,
                wake_word,
                options,
                state,
                control: Mutex::new(Control {
                    generation: 0,
                    task: None,
                }),
            }),
        }
    }

    /// Start listening
    ///
    /// Returns `true` if capture is running, including when it already was
    /// (the callbacks are then dropped unused). Returns `false` after
    /// calling `on_error` if the host cannot capture speech. Must be called
    /// within a Tokio runtime.
    pub fn start<R, E>(&self, on_result: R, on_error: E) -> bool
    where
        R: FnOnce(String) + Send + 'static,
        E: FnOnce(Error) + Send + 'static,
    {
        let mut control = self.inner.control();

        if self.inner.current_state().is_active() {
            tracing::debug!("voice session already active");
            return true;
        }

        if !self.inner.capture.is_available() {
            drop(control);
            tracing::warn!("speech capture unavailable");
            on_error(Error::UnsupportedCapability("speech recognition"));
            return false;
        }

        control.generation += 1;
        let generation = control.generation;
        self.inner.set_state(SessionState::Listening);

        let callbacks = Callbacks {
            on_result: Box::new(on_result),
            on_error: Box::new(on_error),
        };
        let task = tokio::spawn(Arc::clone(&self.inner).run(generation, callbacks));
        control.task = Some(task.abort_handle());

        tracing::info!(
            wake_word = self.inner.wake_word.word(),
            locale = %self.inner.options.capture.locale,
            "voice session listening"
        );
        true
    }

    /// Stop listening and release capture
    ///
    /// Returns `false` if the session was already idle. A stopped
    /// activation calls no callback unless delivery was already committed
    /// when `stop` took the control lock.
    pub fn stop(&self) -> bool {
        let mut control = self.inner.control();

        if self.inner.current_state() == SessionState::Idle {
            return false;
        }

        control.generation += 1;
        if let Some(task) = control.task.take() {
            task.abort();
        }
        self.inner.speaker.cancel();
        self.inner.set_state(SessionState::Idle);

        tracing::info!("voice session stopped");
        true
    }

    /// Whether capture or processing is underway
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.current_state().is_active()
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.current_state()
    }

    /// Subscribe to state changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// The wake word this session answers to
    #[must_use]
    pub fn wake_word(&self) -> &str {
        self.inner.wake_word.word()
    }

    /// Speak a reply
    ///
    /// Enters `Speaking` when no capture is active and returns to idle when
    /// playback ends, unless the session was started or stopped meanwhile.
    pub async fn speak(&self, text: &str) {
        let generation = {
            let mut control = self.inner.control();
            if self.inner.current_state() == SessionState::Idle {
                control.generation += 1;
                self.inner.set_state(SessionState::Speaking);
                Some(control.generation)
            } else {
                None
            }
        };

        self.inner.speaker.speak(text).await;

        if let Some(generation) = generation {
            let control = self.inner.control();
            if control.generation == generation
                && self.inner.current_state() == SessionState::Speaking
            {
                self.inner.set_state(SessionState::Idle);
            }
        }
    }

    /// Capture one command
    ///
    /// # Errors
    ///
    /// Returns the activation's capture error, `Error::SessionStopped` if the
    /// session is stopped first, or `Error::Capture` if it is already active
    pub async fn listen(&self) -> Result<String> {
        if self.is_active() {
            return Err(Error::Capture("voice session already active".to_string()));
        }

        let (tx, rx) = oneshot::channel();
        let result_tx = Arc::new(Mutex::new(Some(tx)));
        let error_tx = Arc::clone(&result_tx);

        let send = |slot: &Mutex<Option<oneshot::Sender<Result<String>>>>, value: Result<String>| {
            if let Some(tx) = slot.lock().unwrap_or_else(PoisonError::into_inner).take() {
                let _ = tx.send(value);
            }
        };

        let mut states = self.subscribe();
        self.start(
            move |command| send(&result_tx, Ok(command)),
            move |error| send(&error_tx, Err(error)),
        );

        let outcome = rx.await.unwrap_or(Err(Error::SessionStopped));

        // `on_result` runs while still `Processing`
        let _ = states.wait_for(|state| !state.is_active()).await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;

    use super::*;
    use crate::voice::synthesis::ConsoleSynthesizer;

    struct Scripted(Mutex<VecDeque<Result<Option<String>>>>);

    #[async_trait]
    impl CaptureBackend for Scripted {
        async fn capture(&self, _settings: &CaptureSettings) -> Result<Option<String>> {
            let next = self.0.lock().unwrap().pop_front();
            match next {
                Some(result) => result,
                None => std::future::pending().await,
            }
        }
    }

    fn session(script: Vec<Result<Option<String>>>) -> VoiceSession {
        VoiceSession::new(
            Arc::new(Scripted(Mutex::new(script.into()))),
            Speaker::new(Arc::new(ConsoleSynthesizer), Vec::new()),
            WakeWord::new("nova").unwrap(),
            SessionOptions {
                capture: CaptureSettings::default(),
                settle_delay: Duration::from_millis(1),
            },
        )
    }

    #[tokio::test]
    async fn test_listen_strips_wake_word() {
        let session = session(vec![Ok(Some("Nova, what time is it".to_string()))]);
        assert_eq!(session.listen().await.unwrap(), "what time is it");
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let session = session(Vec::new());
        assert!(!session.stop());
        assert!(!session.is_active());
    }

    #[test]
    fn test_active_states() {
        assert!(SessionState::Listening.is_active());
        assert!(SessionState::AwaitingCommand.is_active());
        assert!(SessionState::Processing.is_active());
        assert!(!SessionState::Idle.is_active());
        assert!(!SessionState::Speaking.is_active());
    }
}
