//! Conductor — dedicated playback thread with channel-based command dispatch.
//!
//! Owns the `ToneOutput` on a single thread (rodio streams are not Send, so
//! the output is built inside the thread from a factory). External code
//! communicates via `ConductorHandle` (wraps `mpsc::Sender<ConductorCmd>`),
//! which also exposes a shared `ProgressMonitor` for consistent snapshots.
//! Cancellation is cooperative: pending commands are observed between tones,
//! never mid-tone.

use crate::assembler::{assemble, normalize};
use crate::player::ToneOutput;
use crate::sequence::{SequencedTone, ToneSequence};
use crate::tone::{total_duration, Timing};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

// ── State & snapshots ────────────────────────────────────────────────────────

/// Lifecycle of one playback run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConductorState {
    #[default]
    Idle,
    /// Compiling the sequence and acquiring the audio output.
    Starting,
    Playing,
    /// Releasing the audio output after the last tone.
    Draining,
}

impl fmt::Display for ConductorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConductorState::Idle => write!(f, "idle"),
            ConductorState::Starting => write!(f, "starting"),
            ConductorState::Playing => write!(f, "playing"),
            ConductorState::Draining => write!(f, "draining"),
        }
    }
}

/// Snapshot of playback progress.
///
/// During a run every tone id is in exactly one of `played`, `unplayed` or
/// `current`; the tone in `current` is in flight — neither played nor
/// unplayed. Once the run drains, `played` holds every id.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    pub state: ConductorState,
    pub is_playing: bool,
    /// True while the current tone is audible (amplitude above zero).
    pub is_sounding: bool,
    pub current: Option<SequencedTone>,
    pub played: BTreeSet<usize>,
    pub unplayed: BTreeSet<usize>,
    pub total: usize,
    pub estimated: Duration,
    /// Wall-clock length of the run, set when it completes.
    pub measured: Option<Duration>,
    /// Input characters the assembler skipped as unrecognized.
    pub skipped: usize,
}

/// Shared handle for reading progress snapshots. Written only by the
/// conductor thread; any number of observers may read.
#[derive(Clone, Default)]
pub struct ProgressMonitor {
    inner: Arc<Mutex<Progress>>,
}

impl ProgressMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// A consistent snapshot of the current progress.
    pub fn snapshot(&self) -> Progress {
        self.inner.lock().unwrap().clone()
    }

    fn update(&self, f: impl FnOnce(&mut Progress)) {
        f(&mut self.inner.lock().unwrap());
    }
}

// ── Commands & events ────────────────────────────────────────────────────────

/// Commands sent to the conductor thread.
pub enum ConductorCmd {
    /// Compile and play a dot/dash string. Supersedes any run in progress at
    /// the next tone boundary.
    Sound { code: String, timing: Timing },
    /// End the current run at the next tone boundary.
    Stop,
    /// Stop playback and exit the conductor thread.
    Shutdown,
}

/// Events emitted by the conductor thread back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ConductorEvent {
    /// A sequence was compiled and is about to play.
    Started {
        tones: usize,
        skipped: usize,
        estimated: Duration,
    },
    /// The audio output could not be acquired; the run was abandoned.
    EngineError(String),
    /// One tone finished playing.
    ToneFinished(usize),
    /// The run played to completion.
    Finished { measured: Duration },
    /// The run was ended early by `Stop`.
    Stopped,
}

// ── Handle ───────────────────────────────────────────────────────────────────

/// Thread-safe handle for sending commands to the conductor.
#[derive(Clone)]
pub struct ConductorHandle {
    tx: mpsc::Sender<ConductorCmd>,
    monitor: ProgressMonitor,
}

impl ConductorHandle {
    /// Queue a dot/dash string for playback.
    pub fn sound(&self, code: impl Into<String>, timing: Timing) {
        let _ = self.tx.send(ConductorCmd::Sound {
            code: code.into(),
            timing,
        });
    }

    pub fn stop(&self) {
        let _ = self.tx.send(ConductorCmd::Stop);
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(ConductorCmd::Shutdown);
    }

    /// Consistent snapshot of the current playback progress.
    pub fn progress(&self) -> Progress {
        self.monitor.snapshot()
    }
}

// ── Runtime ──────────────────────────────────────────────────────────────────

/// Spawn the conductor on a dedicated thread.
///
/// `make_output` builds the `ToneOutput` inside the thread. `on_event` is
/// called from the conductor thread whenever the run changes state.
///
/// Returns a `ConductorHandle` for sending commands and reading progress.
pub fn spawn_conductor<O, F>(make_output: O, on_event: F) -> ConductorHandle
where
    O: FnOnce() -> Box<dyn ToneOutput> + Send + 'static,
    F: Fn(ConductorEvent) + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<ConductorCmd>();
    let monitor = ProgressMonitor::new();
    let thread_monitor = monitor.clone();

    std::thread::Builder::new()
        .name("conductor".into())
        .spawn(move || {
            let mut output = make_output();
            conductor_loop(rx, output.as_mut(), &thread_monitor, &on_event);
        })
        .expect("failed to spawn conductor thread");

    ConductorHandle { tx, monitor }
}

/// Main loop for the conductor thread. Owns the output.
fn conductor_loop<F>(
    rx: mpsc::Receiver<ConductorCmd>,
    output: &mut dyn ToneOutput,
    monitor: &ProgressMonitor,
    on_event: &F,
) where
    F: Fn(ConductorEvent),
{
    // A command observed at a tone boundary that supersedes the current run.
    let mut next_cmd: Option<ConductorCmd> = None;

    loop {
        let cmd = match next_cmd.take() {
            Some(cmd) => cmd,
            None => match rx.recv() {
                Ok(cmd) => cmd,
                // All senders dropped — shut down.
                Err(_) => break,
            },
        };

        match cmd {
            ConductorCmd::Sound { code, timing } => {
                next_cmd = run_sequence(&code, timing, &rx, output, monitor, on_event);
            }
            // Nothing is playing; Stop between runs is a no-op.
            ConductorCmd::Stop => {}
            ConductorCmd::Shutdown => break,
        }
    }
}

/// Compile and play one sequence.
///
/// Returns a superseding command observed at a tone boundary (a new `Sound`
/// or a `Shutdown`) for the outer loop to handle.
fn run_sequence<F>(
    code: &str,
    timing: Timing,
    rx: &mpsc::Receiver<ConductorCmd>,
    output: &mut dyn ToneOutput,
    monitor: &ProgressMonitor,
    on_event: &F,
) -> Option<ConductorCmd>
where
    F: Fn(ConductorEvent),
{
    let assembly = assemble(code, &timing);
    let skipped = assembly.skipped;
    let cleaned = normalize(assembly.tones);
    let estimated = total_duration(&cleaned);
    let sequence = ToneSequence::new(cleaned);
    let total = sequence.len();

    // Publish the estimate and the full unplayed partition before any tone
    // plays, replacing (never merging with) the previous run's state.
    monitor.update(|p| {
        *p = Progress {
            state: ConductorState::Starting,
            total,
            estimated,
            skipped,
            unplayed: (0..total).collect(),
            ..Progress::default()
        };
    });
    on_event(ConductorEvent::Started {
        tones: total,
        skipped,
        estimated,
    });

    // Nothing assembled: complete without touching the audio device.
    if sequence.is_empty() {
        monitor.update(|p| {
            p.state = ConductorState::Idle;
            p.measured = Some(Duration::ZERO);
        });
        on_event(ConductorEvent::Finished {
            measured: Duration::ZERO,
        });
        return None;
    }

    let run_start = Instant::now();

    if let Err(e) = output.start() {
        monitor.update(|p| {
            p.state = ConductorState::Idle;
            p.is_playing = false;
        });
        on_event(ConductorEvent::EngineError(e));
        return None;
    }

    monitor.update(|p| {
        p.state = ConductorState::Playing;
        p.is_playing = true;
    });

    let mut superseded = None;
    let mut stopped = false;

    for seq in sequence.iter() {
        // Cooperative cancellation point: commands are only observed between
        // tones, never mid-tone.
        match rx.try_recv() {
            Ok(ConductorCmd::Stop) => {
                stopped = true;
                break;
            }
            Ok(cmd) => {
                superseded = Some(cmd);
                break;
            }
            Err(_) => {}
        }

        monitor.update(|p| {
            p.unplayed.remove(&seq.id);
            p.current = Some(*seq);
            p.is_sounding = seq.tone.is_signal();
        });

        output.play(&seq.tone);

        monitor.update(|p| {
            p.current = None;
            p.is_sounding = false;
            p.played.insert(seq.id);
        });
        on_event(ConductorEvent::ToneFinished(seq.id));
    }

    monitor.update(|p| p.state = ConductorState::Draining);
    output.stop();
    let measured = run_start.elapsed();

    monitor.update(|p| {
        p.state = ConductorState::Idle;
        p.is_playing = false;
        p.measured = Some(measured);
    });

    if superseded.is_some() {
        return superseded;
    }
    if stopped {
        on_event(ConductorEvent::Stopped);
    } else {
        on_event(ConductorEvent::Finished { measured });
    }
    None
}

// ── Tests ────────────────────────────────────────────────────────────────────
