//! Voice module
//!
//! The session controller plus the host resources it drives: speech
//! capture (console or microphone with Whisper), wake word handling and
//! speech synthesis (console or `OpenAI` TTS through the speakers).

mod capture;
mod playback;
mod segment;
mod session;
mod stt;
mod synthesis;
mod tts;
mod wake_word;

pub use capture::{
    CaptureBackend, CaptureSettings, ConsoleCapture, InputLevel, LineCapture, MicrophoneCapture,
    SAMPLE_RATE, Utterance, monitor_input, samples_to_wav,
};
pub use playback::{AudioPlayback, PLAYBACK_SAMPLE_RATE, decode_mp3};
pub use segment::{SegmenterState, SpeechSegmenter, calculate_energy};
pub use session::{ACKNOWLEDGEMENT, REPROMPT, SessionOptions, SessionState, VoiceSession};
pub use stt::SpeechToText;
pub use synthesis::{
    ConsoleSynthesizer, Speaker, SynthesisBackend, VoiceInfo, VoiceOutputRequest,
    select_voice,
};
pub use tts::{CloudSynthesizer, TextToSpeech};
pub use wake_word::{WakeDecision, WakeWord};
