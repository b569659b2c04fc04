//! Identity-addressable tone sequences.
//!
//! A `ToneSequence` is built wholesale from a cleaned tone list and is
//! immutable afterwards; a new play request builds a new sequence. Consumers
//! address tones by id and reach neighbors through the stored links.

use crate::tone::Tone;

/// A tone wrapped with its stable position in the sequence and links to its
/// neighbors for lookahead consumers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequencedTone {
    /// 0-based position in the cleaned sequence, contiguous and unique.
    pub id: usize,
    pub tone: Tone,
    /// Id of the preceding tone, none at the start.
    pub previous: Option<usize>,
    /// Id of the following tone, none at the end.
    pub next: Option<usize>,
}

/// An ordered, immutable sequence of tones addressable by id.
#[derive(Debug, Clone, Default)]
pub struct ToneSequence {
    tones: Vec<SequencedTone>,
}

impl ToneSequence {
    pub fn new(tones: Vec<Tone>) -> Self {
        let count = tones.len();
        let sequenced = tones
            .into_iter()
            .enumerate()
            .map(|(id, tone)| SequencedTone {
                id,
                tone,
                previous: id.checked_sub(1),
                next: if id + 1 < count { Some(id + 1) } else { None },
            })
            .collect();
        ToneSequence { tones: sequenced }
    }

    pub fn get(&self, id: usize) -> Option<&SequencedTone> {
        self.tones.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SequencedTone> {
        self.tones.iter()
    }

    /// Payload view, e.g. for duration calculation.
    pub fn tones(&self) -> impl Iterator<Item = Tone> + '_ {
        self.tones.iter().map(|s| s.tone)
    }

    pub fn len(&self) -> usize {
        self.tones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tones.is_empty()
    }
}
