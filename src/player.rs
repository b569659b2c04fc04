use crate::oscillator::{ToneSource, Waveform};
use crate::tone::Tone;
use rodio::{OutputStream, Sink};
use std::sync::{Arc, Mutex};

/// Audio-output contract the conductor drives.
///
/// `start` acquires the output device, `play` holds for the tone's duration
/// at the tone's amplitude and then silences, `stop` releases the device.
/// This is the only I/O boundary of the playback core.
pub trait ToneOutput {
    fn start(&mut self) -> Result<(), String>;
    fn play(&mut self, tone: &Tone);
    fn stop(&mut self);
}

struct ActiveOutput {
    _stream: OutputStream,
    sink: Sink,
}

/// Runtime audio player wrapping rodio. Not serializable — created fresh per
/// session, on the conductor thread (rodio streams are not `Send`).
pub struct Player {
    frequency_hz: f32,
    waveform: Waveform,
    active: Option<ActiveOutput>,
}

impl Player {
    pub fn new(frequency_hz: f32, waveform: Waveform) -> Self {
        Player {
            frequency_hz,
            waveform,
            active: None,
        }
    }
}

impl ToneOutput for Player {
    /// Initialize audio output and create a playback sink.
    fn start(&mut self) -> Result<(), String> {
        if self.active.is_some() {
            return Ok(());
        }
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| format!("Failed to open audio output: {}", e))?;
        let sink = Sink::try_new(&handle)
            .map_err(|e| format!("Failed to create audio sink: {}", e))?;
        self.active = Some(ActiveOutput {
            _stream: stream,
            sink,
        });
        Ok(())
    }

    /// Sound one tone, blocking until it has fully played.
    fn play(&mut self, tone: &Tone) {
        let Some(active) = &self.active else {
            return;
        };
        let source = ToneSource::new(
            self.waveform,
            self.frequency_hz,
            tone.amplitude,
            tone.duration,
        );
        active.sink.append(source);
        active.sink.sleep_until_end();
    }

    /// Release the audio device.
    fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.sink.stop();
        }
    }
}

/// Shared record of the tones a `NullOutput` has played. Cloneable observer
/// handle; written on the conductor thread, read from anywhere.
#[derive(Clone, Default)]
pub struct PlayedLog {
    tones: Arc<Mutex<Vec<Tone>>>,
}

impl PlayedLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tones(&self) -> Vec<Tone> {
        self.tones.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.tones.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, tone: Tone) {
        self.tones.lock().unwrap().push(tone);
    }
}

/// Silent output that sleeps through each tone instead of sounding it.
/// Used by `--silent` playback and by headless tests, which shrink the
/// sleeps through `time_scale`.
pub struct NullOutput {
    time_scale: f32,
    log: PlayedLog,
}

impl NullOutput {
    pub fn new(log: PlayedLog) -> Self {
        Self::with_time_scale(log, 1.0)
    }

    pub fn with_time_scale(log: PlayedLog, time_scale: f32) -> Self {
        NullOutput {
            time_scale: time_scale.max(0.0),
            log,
        }
    }
}

impl ToneOutput for NullOutput {
    fn start(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn play(&mut self, tone: &Tone) {
        std::thread::sleep(tone.duration.mul_f32(self.time_scale));
        self.log.record(*tone);
    }

    fn stop(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tone::{Timing, ToneKind};

    #[test]
    fn player_start_succeeds_or_fails_gracefully() {
        let mut player = Player::new(440.0, Waveform::Sine);
        match player.start() {
            Ok(()) => player.stop(),
            Err(e) => assert!(e.contains("Failed to")),
        }
    }

    #[test]
    fn player_play_without_start_is_a_noop() {
        let mut player = Player::new(440.0, Waveform::Sine);
        let tone = Tone::new(ToneKind::Dit, &Timing::from_secs(0.01));
        // Must not panic or block.
        player.play(&tone);
    }

    #[test]
    fn null_output_records_played_tones() {
        let log = PlayedLog::new();
        let mut output = NullOutput::with_time_scale(log.clone(), 0.0);
        let timing = Timing::from_secs(0.01);

        output.start().unwrap();
        output.play(&Tone::new(ToneKind::Dit, &timing));
        output.play(&Tone::new(ToneKind::LetterGap, &timing));
        output.stop();

        let played = log.tones();
        assert_eq!(played.len(), 2);
        assert_eq!(played[0].kind, ToneKind::Dit);
        assert_eq!(played[1].kind, ToneKind::LetterGap);
    }

    #[test]
    fn played_log_starts_empty() {
        let log = PlayedLog::new();
        assert!(log.is_empty());
    }
}
