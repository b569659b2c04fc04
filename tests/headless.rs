//! Headless integration tests for morseflow.
//!
//! These exercise the full compile/playback pipeline end-to-end without audio
//! hardware: the conductor runs against the silent output with scaled-down
//! sleeps. They verify that every feature is testable via `cargo test` alone.

use morseflow::assembler::{assemble, normalize};
use morseflow::conductor::{spawn_conductor, ConductorEvent, ConductorHandle, ConductorState};
use morseflow::morse;
use morseflow::player::{NullOutput, PlayedLog, ToneOutput};
use morseflow::sequence::ToneSequence;
use morseflow::tone::{total_duration, Timing, ToneKind};
use std::sync::mpsc;
use std::time::Duration;

fn spawn_silent(time_scale: f32) -> (ConductorHandle, PlayedLog, mpsc::Receiver<ConductorEvent>) {
    let log = PlayedLog::new();
    let thread_log = log.clone();
    let (event_tx, event_rx) = mpsc::channel();
    let handle = spawn_conductor(
        move || Box::new(NullOutput::with_time_scale(thread_log, time_scale)) as Box<dyn ToneOutput>,
        move |event| {
            let _ = event_tx.send(event);
        },
    );
    (handle, log, event_rx)
}

fn drain_until_terminal(event_rx: &mpsc::Receiver<ConductorEvent>) -> Vec<ConductorEvent> {
    let mut events = Vec::new();
    loop {
        let event = event_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("conductor never finished");
        let terminal = matches!(
            event,
            ConductorEvent::Finished { .. }
                | ConductorEvent::Stopped
                | ConductorEvent::EngineError(_)
        );
        events.push(event);
        if terminal {
            return events;
        }
    }
}

// ── Compile pipeline ──────────────────────────────────────────────────────

#[test]
fn sos_compiles_to_the_canonical_sequence() {
    use ToneKind::*;

    let code = morse::text_to_code("SOS");
    assert_eq!(code, "... --- ...");

    let assembly = assemble(&code, &Timing::default());
    let cleaned = normalize(assembly.tones);
    let kinds: Vec<ToneKind> = cleaned.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            Dit, IntraGap, Dit, IntraGap, Dit, LetterGap, Dah, IntraGap, Dah, IntraGap, Dah,
            LetterGap, Dit, IntraGap, Dit, IntraGap, Dit,
        ]
    );
}

#[test]
fn sos_duration_scales_linearly_with_dit_time() {
    let code = morse::text_to_code("SOS");

    let at_200ms = normalize(assemble(&code, &Timing::from_secs(0.2)).tones);
    let at_100ms = normalize(assemble(&code, &Timing::from_secs(0.1)).tones);

    // 27 dit units in total.
    assert_eq!(total_duration(&at_200ms), Duration::from_millis(5400));
    assert_eq!(total_duration(&at_100ms), Duration::from_millis(2700));
}

#[test]
fn pipeline_never_leaves_intra_gap_before_larger_gap() {
    for input in [
        "... --- ...",
        ".- / -...",
        "-.-. --.- / -.-. --.- -.-",
        ". . . / . . .",
        "....  ....",
    ] {
        let cleaned = normalize(assemble(input, &Timing::default()).tones);
        for pair in cleaned.windows(2) {
            let bad = pair[0].kind == ToneKind::IntraGap
                && matches!(pair[1].kind, ToneKind::LetterGap | ToneKind::WordGap);
            assert!(!bad, "redundant gap pair in cleaned output of {:?}", input);
        }
        // Clean input is already normalized: a second pass changes nothing.
        assert_eq!(normalize(cleaned.clone()), cleaned);
    }
}

#[test]
fn sequencing_links_survive_the_full_pipeline() {
    let code = morse::text_to_code("PARIS");
    let cleaned = normalize(assemble(&code, &Timing::default()).tones);
    let sequence = ToneSequence::new(cleaned);

    for seq in sequence.iter() {
        match seq.previous {
            Some(prev) => assert_eq!(prev, seq.id - 1),
            None => assert_eq!(seq.id, 0),
        }
        match seq.next {
            Some(next) => assert_eq!(next, seq.id + 1),
            None => assert_eq!(seq.id, sequence.len() - 1),
        }
    }
}

#[test]
fn paris_is_fifty_dit_units_with_its_word_gap() {
    // The WPM convention: PARIS plus the trailing word gap is 50 units.
    let code = morse::text_to_code("PARIS");
    let timing = Timing::from_secs(1.0);
    let mut cleaned = normalize(assemble(&code, &timing).tones);
    assert_eq!(total_duration(&cleaned), Duration::from_secs(43));
    cleaned.push(morseflow::tone::Tone::new(ToneKind::WordGap, &timing));
    assert_eq!(total_duration(&cleaned), Duration::from_secs(50));
}

// ── Playback workflow ─────────────────────────────────────────────────────

#[test]
fn send_workflow_plays_the_whole_message() {
    let (handle, log, event_rx) = spawn_silent(0.0);

    let code = morse::text_to_code("HELLO WORLD");
    handle.sound(code.clone(), Timing::from_secs(0.001));
    let events = drain_until_terminal(&event_rx);

    let expected = normalize(assemble(&code, &Timing::from_secs(0.001)).tones);
    assert!(matches!(events.last(), Some(ConductorEvent::Finished { .. })));

    // The output saw exactly the cleaned sequence, in order.
    let played = log.tones();
    assert_eq!(played, expected);

    let progress = handle.progress();
    assert_eq!(progress.total, expected.len());
    assert_eq!(progress.played.len(), expected.len());
    assert!(progress.unplayed.is_empty());
    assert_eq!(progress.state, ConductorState::Idle);

    handle.shutdown();
}

#[test]
fn estimate_is_available_while_the_run_is_still_playing() {
    let (handle, _log, event_rx) = spawn_silent(1.0);

    let code = morse::text_to_code("SOS");
    handle.sound(code, Timing::from_secs(0.02));

    // Started arrives before any tone completes.
    let first = event_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    match first {
        ConductorEvent::Started { tones, estimated, .. } => {
            assert_eq!(tones, 17);
            assert_eq!(estimated, Duration::from_millis(27 * 20));
        }
        other => panic!("expected Started first, got {:?}", other),
    }

    let progress = handle.progress();
    assert_eq!(progress.estimated, Duration::from_millis(540));
    assert!(progress.measured.is_none());

    drain_until_terminal(&event_rx);
    handle.shutdown();
}

#[test]
fn measured_duration_tracks_wall_clock() {
    let (handle, _log, event_rx) = spawn_silent(1.0);

    // 27 units at 10ms = 270ms estimated.
    handle.sound("... --- ...", Timing::from_secs(0.01));
    let events = drain_until_terminal(&event_rx);

    let measured = match events.last() {
        Some(ConductorEvent::Finished { measured }) => *measured,
        other => panic!("expected Finished, got {:?}", other),
    };
    assert!(measured >= Duration::from_millis(270));
    // Generous upper bound; the null output only sleeps.
    assert!(measured < Duration::from_secs(3));

    let progress = handle.progress();
    assert_eq!(progress.measured, Some(measured));

    handle.shutdown();
}

#[test]
fn superseding_run_owns_the_final_state() {
    let (handle, _log, event_rx) = spawn_silent(1.0);

    // Long first message.
    handle.sound(morse::text_to_code("0000000000"), Timing::from_secs(0.02));
    std::thread::sleep(Duration::from_millis(100));
    // Supersede it mid-run with SOS.
    let code = morse::text_to_code("SOS");
    handle.sound(code, Timing::from_secs(0.001));

    let events = drain_until_terminal(&event_rx);
    let started: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            ConductorEvent::Started { tones, .. } => Some(*tones),
            _ => None,
        })
        .collect();
    assert_eq!(started.len(), 2);
    assert_eq!(started[1], 17);

    // The final partitions belong entirely to the 17-tone second run;
    // no ids from the first run leak through.
    let progress = handle.progress();
    assert_eq!(progress.total, 17);
    assert_eq!(progress.played, (0..17).collect());
    assert!(progress.unplayed.is_empty());
    assert!(progress.played.iter().all(|id| *id < 17));

    handle.shutdown();
}

#[test]
fn consecutive_runs_reuse_the_conductor() {
    let (handle, log, event_rx) = spawn_silent(0.0);

    handle.sound("...", Timing::from_secs(0.001));
    drain_until_terminal(&event_rx);
    handle.sound("---", Timing::from_secs(0.001));
    drain_until_terminal(&event_rx);

    // 5 tones per run.
    assert_eq!(log.len(), 10);
    let progress = handle.progress();
    assert_eq!(progress.total, 5);
    assert_eq!(progress.played.len(), 5);

    handle.shutdown();
}

#[test]
fn unknown_text_characters_never_reach_the_output() {
    let (handle, log, event_rx) = spawn_silent(0.0);

    // morse::text_to_code drops unmapped characters entirely.
    let code = morse::text_to_code("S#S");
    handle.sound(code, Timing::from_secs(0.001));
    let events = drain_until_terminal(&event_rx);

    assert!(matches!(
        events.first(),
        Some(ConductorEvent::Started { skipped: 0, .. })
    ));
    // Two letters of three dits each, one letter gap.
    assert_eq!(log.len(), 11);

    handle.shutdown();
}
