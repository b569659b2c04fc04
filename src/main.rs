use clap::{Parser, Subcommand};
use morseflow::conductor::{spawn_conductor, ConductorEvent};
use morseflow::engine::Engine;
use morseflow::morse;
use morseflow::oscillator::Waveform;
use morseflow::player::{NullOutput, Player, PlayedLog, ToneOutput};
use morseflow::tone::Timing;
use std::sync::mpsc;

#[derive(Parser)]
#[command(name = "morseflow", about = "Morse Tone Compiler and Playback CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show engine status
    Status,
    /// Encode text and play it as Morse tones
    Send {
        /// Text to transmit
        text: String,
        /// Dit duration in seconds (overrides config)
        #[arg(long)]
        dit: Option<f32>,
        /// Speed in words per minute (PARIS convention; overrides --dit)
        #[arg(long)]
        wpm: Option<f32>,
        /// Oscillator frequency in Hz (overrides config)
        #[arg(long)]
        freq: Option<f32>,
        /// Compile and schedule without sounding the oscillator
        #[arg(long)]
        silent: bool,
    },
    /// Play a dot/dash string directly
    Code {
        /// Dot/dash string; single space between letters, `/` between words
        code: String,
        /// Dit duration in seconds (overrides config)
        #[arg(long)]
        dit: Option<f32>,
        /// Speed in words per minute (PARIS convention; overrides --dit)
        #[arg(long)]
        wpm: Option<f32>,
        /// Oscillator frequency in Hz (overrides config)
        #[arg(long)]
        freq: Option<f32>,
        /// Compile and schedule without sounding the oscillator
        #[arg(long)]
        silent: bool,
    },
    /// Convert text to a dot/dash string
    Encode {
        text: String,
    },
    /// Convert a dot/dash string back to text
    Decode {
        code: String,
    },
    /// Play random code groups for copy practice
    Practice {
        /// Number of groups to send
        #[arg(short, long, default_value = "5")]
        groups: usize,
        /// Characters per group
        #[arg(long, default_value = "5")]
        group_len: usize,
        /// Speed in words per minute (PARIS convention)
        #[arg(long)]
        wpm: Option<f32>,
        /// Oscillator frequency in Hz (overrides config)
        #[arg(long)]
        freq: Option<f32>,
    },
    /// Engine configuration
    Config {
        #[command(subcommand)]
        action: ConfigCmd,
    },
    /// Transmission history
    History {
        #[command(subcommand)]
        action: HistoryCmd,
    },
}

#[derive(Subcommand)]
enum ConfigCmd {
    /// Set the base dit duration in seconds
    Dit {
        /// Duration in seconds
        secs: f32,
    },
    /// Set the oscillator frequency in Hz
    Frequency {
        /// Frequency in Hz
        hz: f32,
    },
    /// Set the oscillator waveform
    Waveform {
        /// One of: sine, square, triangle, sawtooth
        name: String,
    },
    /// Show current configuration
    Show,
}

#[derive(Subcommand)]
enum HistoryCmd {
    /// List recorded transmissions
    List,
    /// Clear the transmission history
    Clear,
}

fn main() {
    let cli = Cli::parse();
    let mut engine = Engine::load();

    match cli.command {
        Commands::Status => {
            println!("morseflow engine v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "Dit: {}s ({:.0} WPM) | Frequency: {} Hz | Waveform: {} | History: {} transmission(s)",
                engine.dit_secs,
                1.2 / engine.dit_secs,
                engine.frequency_hz,
                engine.waveform,
                engine.history.len()
            );
        }
        Commands::Send {
            text,
            dit,
            wpm,
            freq,
            silent,
        } => {
            let code = morse::text_to_code(&text);
            if code.is_empty() {
                eprintln!("Error: '{}' contains no encodable characters.", text);
                std::process::exit(1);
            }
            println!("{}  =>  {}", text, code);
            let timing = resolve_timing(&engine, dit, wpm);
            play_code(&mut engine, Some(text), code, timing, freq, silent);
        }
        Commands::Code {
            code,
            dit,
            wpm,
            freq,
            silent,
        } => {
            let timing = resolve_timing(&engine, dit, wpm);
            play_code(&mut engine, None, code, timing, freq, silent);
        }
        Commands::Encode { text } => {
            println!("{}", morse::text_to_code(&text));
        }
        Commands::Decode { code } => {
            println!("{}", morse::code_to_text(&code));
        }
        Commands::Practice {
            groups,
            group_len,
            wpm,
            freq,
        } => {
            if groups == 0 || group_len == 0 {
                eprintln!("Error: group count and length must be >= 1");
                std::process::exit(1);
            }
            let sent: Vec<String> = (0..groups).map(|_| morse::random_group(group_len)).collect();
            let text = sent.join(" ");
            let code = morse::text_to_code(&text);
            let timing = resolve_timing(&engine, None, wpm);

            println!("Sending {} group(s) of {}...", groups, group_len);
            play_code(&mut engine, None, code, timing, freq, false);
            // Reveal after playback so the operator can check their copy.
            println!("Copy check: {}", text);
        }
        Commands::Config { action } => match action {
            ConfigCmd::Dit { secs } => {
                if secs <= 0.0 {
                    eprintln!("Error: dit duration must be > 0");
                    std::process::exit(1);
                }
                engine.dit_secs = secs;
                engine.save().expect("Failed to save state");
                println!("Dit time set to {}s.", secs);
            }
            ConfigCmd::Frequency { hz } => {
                if hz <= 0.0 {
                    eprintln!("Error: frequency must be > 0");
                    std::process::exit(1);
                }
                engine.frequency_hz = hz;
                engine.save().expect("Failed to save state");
                println!("Frequency set to {} Hz.", hz);
            }
            ConfigCmd::Waveform { name } => match Waveform::from_str_loose(&name) {
                Ok(waveform) => {
                    engine.waveform = waveform;
                    engine.save().expect("Failed to save state");
                    println!("Waveform set to {}.", waveform);
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            },
            ConfigCmd::Show => {
                println!("dit_secs = {}", engine.dit_secs);
                println!("frequency_hz = {}", engine.frequency_hz);
                println!("waveform = {}", engine.waveform);
            }
        },
        Commands::History { action } => match action {
            HistoryCmd::List => {
                if engine.history.is_empty() {
                    println!("No transmissions recorded.");
                    return;
                }
                for t in &engine.history {
                    match &t.text {
                        Some(text) => println!(
                            "{}  {} => {}  ({} tones, {:.1}s)",
                            t.sent_at, text, t.code, t.tones, t.duration_secs
                        ),
                        None => println!(
                            "{}  {}  ({} tones, {:.1}s)",
                            t.sent_at, t.code, t.tones, t.duration_secs
                        ),
                    }
                }
            }
            HistoryCmd::Clear => {
                let count = engine.history.len();
                engine.history.clear();
                engine.save().expect("Failed to save state");
                println!("Cleared {} transmission(s).", count);
            }
        },
    }
}

/// Pick the timing for a playback command: --wpm wins over --dit, which wins
/// over the configured dit time.
fn resolve_timing(engine: &Engine, dit: Option<f32>, wpm: Option<f32>) -> Timing {
    match (wpm, dit) {
        (Some(wpm), _) => Timing::from_wpm(wpm),
        (None, Some(secs)) => Timing::from_secs(secs),
        (None, None) => engine.timing(),
    }
}

/// Run one playback to completion, printing progress and recording the
/// transmission in the engine history.
fn play_code(
    engine: &mut Engine,
    text: Option<String>,
    code: String,
    timing: Timing,
    freq: Option<f32>,
    silent: bool,
) {
    let frequency_hz = freq.unwrap_or(engine.frequency_hz);
    let waveform = engine.waveform;

    let (event_tx, event_rx) = mpsc::channel();
    let handle = spawn_conductor(
        move || -> Box<dyn ToneOutput> {
            if silent {
                Box::new(NullOutput::new(PlayedLog::new()))
            } else {
                Box::new(Player::new(frequency_hz, waveform))
            }
        },
        move |event| {
            let _ = event_tx.send(event);
        },
    );

    handle.sound(code.clone(), timing);

    let mut tones = 0;
    loop {
        match event_rx.recv() {
            Ok(ConductorEvent::Started {
                tones: total,
                skipped,
                estimated,
            }) => {
                tones = total;
                if skipped > 0 {
                    println!("Skipped {} unrecognized character(s).", skipped);
                }
                println!(
                    "Playing {} tones (estimated {:.1}s)...",
                    total,
                    estimated.as_secs_f32()
                );
            }
            Ok(ConductorEvent::ToneFinished(_)) => {}
            Ok(ConductorEvent::Finished { measured }) => {
                println!("Done in {:.1}s.", measured.as_secs_f32());
                engine.record_transmission(text, &code, tones, measured);
                engine.save().expect("Failed to save state");
                break;
            }
            Ok(ConductorEvent::Stopped) => {
                println!("Playback stopped.");
                break;
            }
            Ok(ConductorEvent::EngineError(e)) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            Err(_) => break,
        }
    }

    handle.shutdown();
}
