//! Energy-based speech segmentation
//!
//! Splits a microphone stream into utterances: speech starts when RMS
//! energy crosses a threshold and ends after a run of silence.

/// Minimum audio energy threshold to consider speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum duration of speech to count as an utterance (in samples at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800; // 0.3 seconds

/// Silence duration that ends an utterance (in samples)
const SILENCE_SAMPLES: usize = 8000; // 0.5 seconds

/// Longest utterance kept before it is flushed (in samples)
const MAX_UTTERANCE_SAMPLES: usize = 480_000; // 30 seconds

/// State of the segmenter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// Waiting for speech
    Idle,
    /// Speech detected, accumulating
    Speaking,
}

/// Accumulates samples until a complete utterance is heard
#[derive(Debug)]
pub struct SpeechSegmenter {
    state: SegmenterState,
    speech_buffer: Vec<f32>,
    speech_samples: usize,
    silence_counter: usize,
}

impl Default for SpeechSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeechSegmenter {
    /// Create an idle segmenter
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SegmenterState::Idle,
            speech_buffer: Vec::new(),
            speech_samples: 0,
            silence_counter: 0,
        }
    }

    /// Feed a chunk of samples
    ///
    /// Returns the utterance once enough speech has been followed by silence.
    pub fn push(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        let energy = calculate_energy(samples);
        let is_speech = energy > ENERGY_THRESHOLD;

        match self.state {
            SegmenterState::Idle => {
                if is_speech {
                    self.state = SegmenterState::Speaking;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.speech_samples = samples.len();
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech detected");
                }
                None
            }
            SegmenterState::Speaking => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.speech_samples += samples.len();
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.speech_buffer.len() >= MAX_UTTERANCE_SAMPLES {
                    tracing::debug!(samples = self.speech_buffer.len(), "utterance at maximum length");
                    let utterance = std::mem::take(&mut self.speech_buffer);
                    self.reset();
                    return Some(utterance);
                }

                if self.silence_counter > SILENCE_SAMPLES
                    && self.speech_samples > MIN_SPEECH_SAMPLES
                {
                    tracing::debug!(samples = self.speech_buffer.len(), "utterance complete");
                    let utterance = std::mem::take(&mut self.speech_buffer);
                    self.reset();
                    return Some(utterance);
                }

                // Too much silence without enough speech: a click or a cough
                if self.silence_counter > SILENCE_SAMPLES * 2 {
                    tracing::trace!("speech too short, resetting");
                    self.reset();
                }
                None
            }
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SegmenterState {
        self.state
    }

    /// Drop any partial utterance
    pub fn reset(&mut self) {
        self.state = SegmenterState::Idle;
        self.speech_buffer.clear();
        self.speech_samples = 0;
        self.silence_counter = 0;
    }
}

/// Calculate RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voice::SAMPLE_RATE;

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn sine(duration_secs: f32, amplitude: f32) -> Vec<f32> {
        let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
        (0..num_samples)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                amplitude * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
            })
            .collect()
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn silence(duration_secs: f32) -> Vec<f32> {
        vec![0.0; (SAMPLE_RATE as f32 * duration_secs) as usize]
    }

    #[test]
    fn test_energy_calculation() {
        assert!(calculate_energy(&[0.0; 100]) < 0.001);
        assert!(calculate_energy(&[0.5; 100]) > 0.4);
        assert!(calculate_energy(&[]) < f32::EPSILON);
    }

    #[test]
    fn test_silence_stays_idle() {
        let mut segmenter = SpeechSegmenter::new();
        assert!(segmenter.push(&silence(0.5)).is_none());
        assert_eq!(segmenter.state(), SegmenterState::Idle);
    }

    #[test]
    fn test_speech_then_silence_completes() {
        let mut segmenter = SpeechSegmenter::new();
        assert!(segmenter.push(&sine(0.5, 0.3)).is_none());
        assert_eq!(segmenter.state(), SegmenterState::Speaking);

        let utterance = segmenter.push(&silence(0.6)).expect("utterance");
        assert!(utterance.len() > MIN_SPEECH_SAMPLES);
        assert_eq!(segmenter.state(), SegmenterState::Idle);
    }

    #[test]
    fn test_short_blip_is_discarded() {
        let mut segmenter = SpeechSegmenter::new();
        segmenter.push(&sine(0.05, 0.3));
        for _ in 0..12 {
            assert!(segmenter.push(&silence(0.1)).is_none());
        }
        assert_eq!(segmenter.state(), SegmenterState::Idle);
    }

    #[test]
    fn test_continuous_noise_is_flushed_at_maximum_length() {
        let mut segmenter = SpeechSegmenter::new();
        let second = sine(1.0, 0.3);

        let mut flushed = None;
        for pushed in 1..=31 {
            if let Some(utterance) = segmenter.push(&second) {
                flushed = Some((pushed, utterance));
                break;
            }
        }

        let (pushed, utterance) = flushed.expect("utterance flushed");
        assert_eq!(pushed, 30);
        assert_eq!(utterance.len(), MAX_UTTERANCE_SAMPLES);
        assert_eq!(segmenter.state(), SegmenterState::Idle);
    }
}
