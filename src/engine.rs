use crate::oscillator::Waveform;
use crate::tone::Timing;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

const STATE_FILE: &str = "morseflow_state.json";
const MAX_HISTORY: usize = 50;

fn default_dit_secs() -> f32 {
    Timing::DEFAULT_DIT_SECS
}

fn default_frequency_hz() -> f32 {
    440.0
}

/// One completed transmission, kept in the engine history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transmission {
    /// Timestamp in "MM-DD-YY HH:MM" format.
    pub sent_at: String,
    /// Original text, when the transmission was entered as text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub code: String,
    pub tones: usize,
    pub duration_secs: f32,
}

/// Persisted engine configuration and transmission history.
#[derive(Debug, Serialize, Deserialize)]
pub struct Engine {
    /// Base dit duration in seconds; every other timing derives from it.
    #[serde(default = "default_dit_secs")]
    pub dit_secs: f32,
    /// Oscillator frequency in Hz.
    #[serde(default = "default_frequency_hz")]
    pub frequency_hz: f32,
    #[serde(default)]
    pub waveform: Waveform,
    #[serde(default)]
    pub history: Vec<Transmission>,
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            dit_secs: default_dit_secs(),
            frequency_hz: default_frequency_hz(),
            waveform: Waveform::Sine,
            history: Vec::new(),
        }
    }

    /// Load engine state from JSON, or create a new instance if not found.
    pub fn load() -> Self {
        Self::load_from(Path::new(STATE_FILE))
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str(&data) {
                    Ok(engine) => return engine,
                    Err(e) => eprintln!("Warning: corrupt state file, starting fresh: {}", e),
                },
                Err(e) => eprintln!("Warning: could not read state file: {}", e),
            }
        }
        Engine::new()
    }

    /// Persist current state to JSON.
    pub fn save(&self) -> Result<(), String> {
        self.save_to(Path::new(STATE_FILE))
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| format!("Serialize error: {}", e))?;
        fs::write(path, json).map_err(|e| format!("Write error: {}", e))?;
        Ok(())
    }

    /// Timing derived from the configured dit time.
    pub fn timing(&self) -> Timing {
        Timing::from_secs(self.dit_secs)
    }

    /// Append a history entry stamped with the current local time.
    /// Trims to MAX_HISTORY (oldest discarded).
    pub fn record_transmission(
        &mut self,
        text: Option<String>,
        code: &str,
        tones: usize,
        duration: Duration,
    ) {
        self.history.push(Transmission {
            sent_at: Local::now().format("%m-%d-%y %H:%M").to_string(),
            text,
            code: code.to_string(),
            tones,
            duration_secs: duration.as_secs_f32(),
        });
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(..excess);
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
