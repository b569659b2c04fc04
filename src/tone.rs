use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Kind of a single Morse tone unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToneKind {
    /// Short signal element (1 unit).
    Dit,
    /// Long signal element (3 units).
    Dah,
    /// Silence between elements of the same letter (1 unit).
    IntraGap,
    /// Silence between letters (3 units).
    LetterGap,
    /// Silence between words (7 units).
    WordGap,
}

impl ToneKind {
    /// Duration of this kind in dit units.
    pub fn units(&self) -> u32 {
        match self {
            ToneKind::Dit | ToneKind::IntraGap => 1,
            ToneKind::Dah | ToneKind::LetterGap => 3,
            ToneKind::WordGap => 7,
        }
    }

    /// True for kinds that key the oscillator on.
    pub fn is_signal(&self) -> bool {
        matches!(self, ToneKind::Dit | ToneKind::Dah)
    }
}

impl fmt::Display for ToneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToneKind::Dit => write!(f, "dit"),
            ToneKind::Dah => write!(f, "dah"),
            ToneKind::IntraGap => write!(f, "intra-gap"),
            ToneKind::LetterGap => write!(f, "letter-gap"),
            ToneKind::WordGap => write!(f, "word-gap"),
        }
    }
}

/// Base-unit timing all tone durations derive from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    pub dit: Duration,
}

impl Timing {
    pub const DEFAULT_DIT_SECS: f32 = 0.2;

    /// Timing from an explicit dit duration in seconds, quantized to whole
    /// milliseconds so derived durations stay exact.
    pub fn from_secs(dit_secs: f32) -> Self {
        let millis = (dit_secs.max(0.0) * 1000.0).round() as u64;
        Timing {
            dit: Duration::from_millis(millis),
        }
    }

    /// Timing from a words-per-minute speed.
    /// PARIS is 50 dit units, so dit = 1.2 / wpm seconds.
    pub fn from_wpm(wpm: f32) -> Self {
        Timing::from_secs(1.2 / wpm.max(1.0))
    }

    /// Duration of a tone kind under this timing.
    pub fn duration_of(&self, kind: ToneKind) -> Duration {
        self.dit * kind.units()
    }
}

impl Default for Timing {
    fn default() -> Self {
        Timing::from_secs(Self::DEFAULT_DIT_SECS)
    }
}

/// A single immutable tone unit. Amplitude and duration are fully determined
/// by the kind and the base dit time; a tone is never mutated after creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub kind: ToneKind,
    /// 0.0 for silence, 1.0 for a keyed signal.
    pub amplitude: f32,
    pub duration: Duration,
}

impl Tone {
    pub fn new(kind: ToneKind, timing: &Timing) -> Self {
        Tone {
            kind,
            amplitude: if kind.is_signal() { 1.0 } else { 0.0 },
            duration: timing.duration_of(kind),
        }
    }

    /// True when this tone is audible.
    pub fn is_signal(&self) -> bool {
        self.amplitude > 0.0
    }
}

/// Sum of all tone durations. Zero for an empty list.
pub fn total_duration(tones: &[Tone]) -> Duration {
    tones.iter().map(|t| t.duration).sum()
}
