//! Symbol assembler and tone normalizer.
//!
//! `assemble` compiles a dot/dash string into timed tone units; `normalize`
//! drops the redundant intra-character gaps that appear when a symbol gap
//! coincides with a letter or word boundary.

use crate::tone::{Timing, Tone, ToneKind};

/// Result of assembling a dot/dash string.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub tones: Vec<Tone>,
    /// Count of input characters that were not recognized.
    pub skipped: usize,
}

fn is_separator(ch: char) -> bool {
    ch == ' ' || ch == '/'
}

/// Compile a dot/dash string into an ordered list of tone units.
///
/// A single space between letters becomes a letter gap; `/` or a run of two
/// or more spaces becomes a word gap. Consecutive separator characters
/// collapse into one gap, word boundary winning over letter boundary.
/// Unrecognized characters are skipped and counted, never an error. No gap
/// is emitted before the first unit or after the last.
pub fn assemble(code: &str, timing: &Timing) -> Assembly {
    let mut tones = Vec::new();
    let mut skipped = 0usize;

    // Separator run being scanned, and the gap it resolved to once a
    // following symbol is known to exist.
    let mut sep_spaces = 0u32;
    let mut sep_word = false;
    let mut pending_gap: Option<ToneKind> = None;
    // True while the previous emitted unit belongs to the current letter.
    let mut in_letter = false;

    for ch in code.trim().chars() {
        if is_separator(ch) {
            if ch == '/' {
                sep_word = true;
            } else {
                sep_spaces += 1;
            }
            continue;
        }

        // Any non-separator closes the run. Runs merged across skipped
        // characters keep the stronger classification.
        if sep_spaces > 0 || sep_word {
            if !tones.is_empty() {
                let gap = if sep_word || sep_spaces > 1 {
                    ToneKind::WordGap
                } else {
                    ToneKind::LetterGap
                };
                pending_gap = match pending_gap {
                    Some(ToneKind::WordGap) => Some(ToneKind::WordGap),
                    _ => Some(gap),
                };
            }
            sep_spaces = 0;
            sep_word = false;
            in_letter = false;
        }

        let kind = match ch {
            '.' => ToneKind::Dit,
            '-' => ToneKind::Dah,
            _ => {
                skipped += 1;
                continue;
            }
        };

        if let Some(gap) = pending_gap.take() {
            tones.push(Tone::new(gap, timing));
        } else if in_letter {
            tones.push(Tone::new(ToneKind::IntraGap, timing));
        }
        tones.push(Tone::new(kind, timing));
        in_letter = true;
    }

    Assembly { tones, skipped }
}

/// Drop intra-character gaps that are immediately followed by a letter or
/// word gap; everything else passes through in order. Idempotent.
pub fn normalize(tones: Vec<Tone>) -> Vec<Tone> {
    let mut cleaned = Vec::with_capacity(tones.len());
    let mut previous: Option<Tone> = None;

    for tone in tones {
        if let Some(p) = previous {
            let superseded = p.kind == ToneKind::IntraGap
                && matches!(tone.kind, ToneKind::LetterGap | ToneKind::WordGap);
            if !superseded {
                cleaned.push(p);
            }
        }
        previous = Some(tone);
    }
    // Flush the last pending unit.
    if let Some(p) = previous {
        cleaned.push(p);
    }
    cleaned
}
