//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use nova_assistant::voice::{
    CaptureBackend, CaptureSettings, SessionOptions, Speaker, SynthesisBackend, VoiceInfo,
    VoiceOutputRequest, VoiceSession, WakeWord,
};
use nova_assistant::{DbPool, Result, db};

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// One scripted capture outcome
pub enum Step {
    Heard(&'static str),
    Silence,
    Fail(&'static str),
    /// Never completes, like a stalled device
    Hang,
}

/// Capture backend that replays a script
pub struct ScriptedCapture {
    steps: Mutex<VecDeque<Step>>,
    available: bool,
    calls: Mutex<Vec<CaptureSettings>>,
}

impl ScriptedCapture {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            available: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(VecDeque::new()),
            available: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Settings passed to each capture call so far
    pub fn calls(&self) -> Vec<CaptureSettings> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CaptureBackend for ScriptedCapture {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn capture(&self, settings: &CaptureSettings) -> Result<Option<String>> {
        self.calls.lock().unwrap().push(settings.clone());
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Heard(text)) => Ok(Some(text.to_string())),
            Some(Step::Silence) => Ok(None),
            Some(Step::Fail(msg)) => Err(nova_assistant::Error::Capture(msg.to_string())),
            Some(Step::Hang) | None => std::future::pending().await,
        }
    }
}

/// Synthesis backend that records what it was asked to say
#[derive(Default)]
pub struct RecordingSynthesizer {
    spoken: Mutex<Vec<String>>,
    cancels: Mutex<usize>,
}

impl RecordingSynthesizer {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn cancels(&self) -> usize {
        *self.cancels.lock().unwrap()
    }
}

#[async_trait]
impl SynthesisBackend for RecordingSynthesizer {
    fn voices(&self) -> Vec<VoiceInfo> {
        vec![VoiceInfo::new("Samantha", "en-US")]
    }

    fn cancel(&self) {
        *self.cancels.lock().unwrap() += 1;
    }

    async fn speak(&self, request: &VoiceOutputRequest) -> Result<()> {
        self.spoken.lock().unwrap().push(request.text.clone());
        Ok(())
    }
}

/// Build a session over scripted resources with a short settle delay
pub fn scripted_session(
    capture: Arc<ScriptedCapture>,
    synth: Arc<RecordingSynthesizer>,
) -> VoiceSession {
    VoiceSession::new(
        capture,
        Speaker::new(synth, vec!["Samantha".to_string()]),
        WakeWord::new("nova").expect("valid wake word"),
        SessionOptions {
            capture: CaptureSettings::default(),
            settle_delay: Duration::from_millis(5),
        },
    )
}
