//! Oscillator source for tone playback.
//!
//! A `ToneSource` is a finite rodio `Source` that holds one amplitude for one
//! duration, with a short raised-cosine attack/release so keying does not
//! click. Gap tones use amplitude 0.0 and produce pure silence of the right
//! length.

use rodio::Source;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44_100;
/// ~5ms keying ramp.
const RAMP_SECS: f32 = 0.005;

/// Oscillator waveform shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl Waveform {
    /// Parse a waveform from a string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "sine" => Ok(Waveform::Sine),
            "square" => Ok(Waveform::Square),
            "triangle" => Ok(Waveform::Triangle),
            "sawtooth" | "saw" => Ok(Waveform::Sawtooth),
            _ => Err(format!(
                "Unknown waveform '{}'. Expected: sine, square, triangle, sawtooth",
                s
            )),
        }
    }

    /// Sample the waveform at a normalized phase in [0, 1).
    fn sample(&self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (2.0 * PI * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => 2.0 * (2.0 * phase - 1.0).abs() - 1.0,
            Waveform::Sawtooth => 2.0 * phase - 1.0,
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Waveform::Sine => write!(f, "sine"),
            Waveform::Square => write!(f, "square"),
            Waveform::Triangle => write!(f, "triangle"),
            Waveform::Sawtooth => write!(f, "sawtooth"),
        }
    }
}

/// A finite mono source: `amplitude` at `frequency_hz` for `duration`.
pub struct ToneSource {
    waveform: Waveform,
    frequency_hz: f32,
    amplitude: f32,
    phase: f32,
    total_samples: usize,
    ramp_samples: usize,
    pos: usize,
}

impl ToneSource {
    pub fn new(waveform: Waveform, frequency_hz: f32, amplitude: f32, duration: Duration) -> Self {
        let total_samples = (duration.as_secs_f64() * SAMPLE_RATE as f64) as usize;
        let ramp = (SAMPLE_RATE as f32 * RAMP_SECS) as usize;
        ToneSource {
            waveform,
            frequency_hz,
            amplitude,
            phase: 0.0,
            total_samples,
            // The ramp can never cover more than half the tone.
            ramp_samples: ramp.min(total_samples / 2),
            pos: 0,
        }
    }

    /// Raised-cosine attack/release envelope at the current position.
    fn envelope(&self) -> f32 {
        if self.ramp_samples == 0 {
            return 1.0;
        }
        if self.pos < self.ramp_samples {
            0.5 * (1.0 - (PI * self.pos as f32 / self.ramp_samples as f32).cos())
        } else if self.pos >= self.total_samples - self.ramp_samples {
            let release = self.pos - (self.total_samples - self.ramp_samples);
            0.5 * (1.0 + (PI * release as f32 / self.ramp_samples as f32).cos())
        } else {
            1.0
        }
    }
}

impl Iterator for ToneSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.pos >= self.total_samples {
            return None;
        }
        let sample = self.waveform.sample(self.phase) * self.amplitude * self.envelope();
        self.pos += 1;
        self.phase += self.frequency_hz / SAMPLE_RATE as f32;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        Some(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total_samples - self.pos;
        (remaining, Some(remaining))
    }
}

impl Source for ToneSource {
    fn current_frame_len(&self) -> Option<usize> {
        Some(self.total_samples - self.pos)
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f64(
            self.total_samples as f64 / SAMPLE_RATE as f64,
        ))
    }
}
