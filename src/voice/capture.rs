//! Speech capture resources
//!
//! A capture backend produces one finalized transcript per call
//! (single-shot). The session re-arms it by calling again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

use super::segment::SpeechSegmenter;
use super::stt::SpeechToText;
use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// How often the microphone buffer is drained
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Capture configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Recognition locale
    pub locale: String,
    /// Keep capturing after the first utterance
    pub continuous: bool,
    /// Report partial transcripts
    pub interim_results: bool,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self::single_shot("en-US")
    }
}

impl CaptureSettings {
    /// Single-shot, final-results-only capture
    pub fn single_shot(locale: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            continuous: false,
            interim_results: false,
        }
    }
}

/// A finalized transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    text: String,
    received_at: DateTime<Utc>,
}

impl Utterance {
    /// Normalize a raw transcript (trim, lowercase)
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self {
            text: raw.trim().to_lowercase(),
            received_at: Utc::now(),
        }
    }

    /// Normalized text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// When the transcript arrived
    #[must_use]
    pub const fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

/// Host speech-capture capability
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Whether the host can capture speech at all
    fn is_available(&self) -> bool {
        true
    }

    /// Capture one utterance
    ///
    /// Returns `Ok(None)` when the stream ends without speech. Dropping the
    /// future releases the device.
    async fn capture(&self, settings: &CaptureSettings) -> Result<Option<String>>;
}

/// Reads typed utterances, one per line
pub struct LineCapture<R> {
    lines: tokio::sync::Mutex<Lines<R>>,
    closed: AtomicBool,
}

/// Line capture over the process's stdin
pub type ConsoleCapture = LineCapture<BufReader<Stdin>>;

impl ConsoleCapture {
    /// Capture from stdin
    #[must_use]
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> LineCapture<R> {
    /// Capture from any line-oriented reader
    pub fn new(reader: R) -> Self {
        Self {
            lines: tokio::sync::Mutex::new(reader.lines()),
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> CaptureBackend for LineCapture<R> {
    fn is_available(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    async fn capture(&self, _settings: &CaptureSettings) -> Result<Option<String>> {
        let mut lines = self.lines.lock().await;
        match lines.next_line().await? {
            Some(line) if line.trim().is_empty() => Ok(None),
            Some(line) => Ok(Some(line)),
            None => {
                self.closed.store(true, Ordering::SeqCst);
                Err(Error::Capture("input closed".to_string()))
            }
        }
    }
}

/// Sets a flag when dropped, stopping a blocking recorder
struct StopOnDrop(Arc<AtomicBool>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// First error reported by an audio stream's error callback
#[derive(Clone, Default)]
struct StreamFault(Arc<Mutex<Option<String>>>);

impl StreamFault {
    /// Keep the first error; later ones are only logged
    fn record(&self, message: String) {
        tracing::error!(error = %message, "audio capture error");
        if let Ok(mut slot) = self.0.lock() {
            slot.get_or_insert(message);
        }
    }

    fn check(&self) -> Result<()> {
        match self.0.lock().ok().and_then(|slot| slot.clone()) {
            Some(message) => Err(Error::Capture(message)),
            None => Ok(()),
        }
    }
}

/// Microphone capture with Whisper transcription
pub struct MicrophoneCapture {
    stt: Arc<SpeechToText>,
}

impl MicrophoneCapture {
    /// Create a microphone capture
    ///
    /// # Errors
    ///
    /// Returns error if no input device is available
    pub fn new(stt: SpeechToText) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = SAMPLE_RATE,
            "microphone capture initialized"
        );

        Ok(Self { stt: Arc::new(stt) })
    }
}

#[async_trait]
impl CaptureBackend for MicrophoneCapture {
    fn is_available(&self) -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    async fn capture(&self, settings: &CaptureSettings) -> Result<Option<String>> {
        let stop = Arc::new(AtomicBool::new(false));
        let _guard = StopOnDrop(Arc::clone(&stop));

        tracing::debug!(locale = %settings.locale, "microphone listening");
        let samples = tokio::task::spawn_blocking(move || record_utterance(&stop))
            .await
            .map_err(|e| Error::Capture(e.to_string()))??;

        let Some(samples) = samples else {
            return Ok(None);
        };

        let wav = samples_to_wav(&samples, SAMPLE_RATE)?;
        let text = self
            .stt
            .transcribe(&wav)
            .await
            .map_err(|e| Error::Capture(e.to_string()))?;

        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(text))
    }
}

/// Record from the default input device until one utterance is complete
///
/// Returns `Ok(None)` if `stop` is raised first.
fn record_utterance(stop: &AtomicBool) -> Result<Option<Vec<f32>>> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| Error::Capture("no input device".to_string()))?;

    let config: StreamConfig = device
        .supported_input_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .find(|c| {
            c.channels() == 1
                && c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
        })
        .ok_or_else(|| Error::Audio("no suitable audio config found".to_string()))?
        .with_sample_rate(SampleRate(SAMPLE_RATE))
        .config();

    let buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
    let writer = Arc::clone(&buffer);
    let fault = StreamFault::default();

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = writer.lock() {
                    buf.extend_from_slice(data);
                }
            },
            {
                let fault = fault.clone();
                move |err| fault.record(err.to_string())
            },
            None,
        )
        .map_err(|e| Error::Capture(e.to_string()))?;

    stream.play().map_err(|e| Error::Capture(e.to_string()))?;

    let mut segmenter = SpeechSegmenter::new();
    while !stop.load(Ordering::SeqCst) {
        std::thread::sleep(POLL_INTERVAL);
        fault.check()?;

        let chunk = buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default();
        if chunk.is_empty() {
            continue;
        }

        if let Some(utterance) = segmenter.push(&chunk) {
            drop(stream);
            return Ok(Some(utterance));
        }
    }

    drop(stream);
    tracing::debug!("microphone capture stopped");
    Ok(None)
}

/// Input level over one second of microphone audio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputLevel {
    /// Seconds since monitoring started
    pub second: u64,
    /// RMS energy
    pub rms: f32,
    /// Peak absolute sample
    pub peak: f32,
}

/// Report microphone levels once per second for `seconds` seconds
///
/// Blocks the calling thread.
///
/// # Errors
///
/// Returns error if the input device cannot be opened
pub fn monitor_input(seconds: u64, mut report: impl FnMut(InputLevel)) -> Result<()> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| Error::Audio("no input device available".to_string()))?;
    let config: StreamConfig = device
        .default_input_config()
        .map_err(|e| Error::Audio(e.to_string()))?
        .config();

    let buffer = Arc::new(Mutex::new(Vec::<f32>::new()));
    let writer = Arc::clone(&buffer);
    let fault = StreamFault::default();

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if let Ok(mut buf) = writer.lock() {
                    buf.extend_from_slice(data);
                }
            },
            {
                let fault = fault.clone();
                move |err| fault.record(err.to_string())
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;
    stream.play().map_err(|e| Error::Audio(e.to_string()))?;

    for second in 1..=seconds {
        std::thread::sleep(Duration::from_secs(1));
        fault.check()?;
        let samples = buffer
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default();

        report(InputLevel {
            second,
            rms: super::segment::calculate_energy(&samples),
            peak: samples.iter().map(|s| s.abs()).fold(0.0, f32::max),
        });
    }

    drop(stream);
    Ok(())
}

/// Convert f32 samples to WAV bytes for STT APIs
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| Error::Audio(e.to_string()))?;

        for &sample in samples {
            // Convert f32 [-1.0, 1.0] to i16
            #[allow(clippy::cast_possible_truncation)]
            let sample_i16 = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer
                .write_sample(sample_i16)
                .map_err(|e| Error::Audio(e.to_string()))?;
        }

        writer.finalize().map_err(|e| Error::Audio(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utterance_normalized() {
        let utterance = Utterance::new("  Nova Open GOOGLE ");
        assert_eq!(utterance.text(), "nova open google");
        assert!(utterance.received_at() <= Utc::now());
    }

    #[test]
    fn test_default_settings_single_shot() {
        let settings = CaptureSettings::default();
        assert_eq!(settings.locale, "en-US");
        assert!(!settings.continuous);
        assert!(!settings.interim_results);
    }

    #[tokio::test]
    async fn test_line_capture() {
        let capture = LineCapture::new(BufReader::new(&b"nova\n\nopen google\n"[..]));
        let settings = CaptureSettings::default();

        assert_eq!(capture.capture(&settings).await.unwrap().as_deref(), Some("nova"));
        assert_eq!(capture.capture(&settings).await.unwrap(), None);
        assert_eq!(
            capture.capture(&settings).await.unwrap().as_deref(),
            Some("open google")
        );
        assert!(capture.is_available());

        assert!(matches!(capture.capture(&settings).await, Err(Error::Capture(_))));
        assert!(!capture.is_available());
    }

    #[test]
    fn test_stream_fault_keeps_first_error() {
        let fault = StreamFault::default();
        assert!(fault.check().is_ok());

        let callback = fault.clone();
        callback.record("device disconnected".to_string());
        callback.record("buffer overrun".to_string());

        match fault.check() {
            Err(Error::Capture(msg)) => assert_eq!(msg, "device disconnected"),
            other => panic!("expected capture error, got {other:?}"),
        }
    }

    #[test]
    fn test_samples_to_wav_header() {
        let wav = samples_to_wav(&[0.0, 0.5, -0.5], SAMPLE_RATE).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
    }
}
