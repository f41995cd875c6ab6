//! Energy-based voice activity detection

use crate::domain::agent::{VadEvent, VadOptions, VoiceActivityDetector};
use crate::domain::room::AudioFrame;
use std::time::Duration;

pub struct EnergyVad {
    options: VadOptions,
    speaking: bool,
    started: bool,
    speech: Duration,
    silence: Duration,
    buffer: Vec<i16>,
    sample_rate: u32,
    channels: u16,
}

impl EnergyVad {
    pub fn new(options: VadOptions) -> Self {
        Self {
            options,
            speaking: false,
            started: false,
            speech: Duration::ZERO,
            silence: Duration::ZERO,
            buffer: Vec::new(),
            sample_rate: 0,
            channels: 1,
        }
    }

    fn reset(&mut self) {
        self.speaking = false;
        self.started = false;
        self.speech = Duration::ZERO;
        self.silence = Duration::ZERO;
        self.buffer.clear();
    }

    fn finish(&mut self) -> Option<VadEvent> {
        let event = if self.speech >= self.options.min_speech {
            let samples = std::mem::take(&mut self.buffer);
            Some(VadEvent::SpeechEnded(AudioFrame::new(
                samples,
                self.sample_rate,
                self.channels,
            )))
        } else {
            None
        };
        self.reset();
        event
    }

    fn buffered(&self) -> Duration {
        sample_duration(self.buffer.len(), self.sample_rate, self.channels)
    }
}

fn sample_duration(samples: usize, sample_rate: u32, channels: u16) -> Duration {
    if sample_rate == 0 || channels == 0 {
        return Duration::ZERO;
    }
    let per_channel = samples as u64 / channels as u64;
    Duration::from_micros(per_channel * 1_000_000 / sample_rate as u64)
}

/// Root mean square level in `0.0..=1.0` of full scale
pub fn rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|&s| {
            let v = s as f64 / i16::MAX as f64;
            v * v
        })
        .sum();
    (sum / samples.len() as f64).sqrt() as f32
}

impl VoiceActivityDetector for EnergyVad {
    fn push(&mut self, frame: &AudioFrame) -> Option<VadEvent> {
        let duration = frame.duration();
        let loud = rms(&frame.samples) >= self.options.activation_threshold;

        if loud {
            if !self.speaking {
                self.reset();
                self.speaking = true;
                self.sample_rate = frame.sample_rate;
                self.channels = frame.channels;
            }
            self.speech += duration;
            self.silence = Duration::ZERO;
            self.buffer.extend_from_slice(&frame.samples);

            if self.buffered() >= self.options.max_utterance {
                return self.finish();
            }
            if !self.started && self.speech >= self.options.min_speech {
                self.started = true;
                return Some(VadEvent::SpeechStarted);
            }
            return None;
        }

        if !self.speaking {
            return None;
        }

        self.buffer.extend_from_slice(&frame.samples);
        self.silence += duration;
        if self.silence >= self.options.min_silence || self.buffered() >= self.options.max_utterance {
            return self.finish();
        }
        None
    }
}
