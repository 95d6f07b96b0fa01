//! Songs: tempo plus parallel note sequences.

pub mod pattern;
pub mod player;

pub use pattern::{PatternError, TokenError, parse_pattern};
pub use player::Player;

use std::sync::Arc;

use crate::instruments::Instrument;
use crate::music::Bpm;

/// One scheduled note: where it starts, how long it sounds, what pitch.
///
/// Times are in beats; `semitone` is the integer pitch offset passed to the
/// scale when the note is triggered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    pub start_beat: f64,
    pub length_beat: f64,
    pub semitone: i32,
}

impl NoteEvent {
    pub fn new(start_beat: f64, length_beat: f64, semitone: i32) -> Self {
        Self {
            start_beat,
            length_beat,
            semitone,
        }
    }

    pub fn end_beat(&self) -> f64 {
        self.start_beat + self.length_beat
    }
}

/// A named sequence of note events played on one instrument.
///
/// Events are not required to be sorted by start beat; the player scans the
/// whole list each step.
pub struct Track {
    pub name: String,
    pub instrument: Arc<dyn Instrument>,
    pub events: Vec<NoteEvent>,
}

impl Track {
    pub fn new(
        name: impl Into<String>,
        instrument: Arc<dyn Instrument>,
        events: Vec<NoteEvent>,
    ) -> Self {
        Self {
            name: name.into(),
            instrument,
            events,
        }
    }
}

/// A tempo and one or more parallel tracks.
pub struct Song {
    pub bpm: Bpm,
    pub tracks: Vec<Track>,
}

impl Song {
    pub fn new(bpm: Bpm, tracks: Vec<Track>) -> Self {
        Self { bpm, tracks }
    }

    /// Total length in seconds: the moment the last note's post-release fade
    /// completes. 0.0 for a song with no events.
    pub fn length(&self) -> f64 {
        let mut end = 0.0f64;
        for track in &self.tracks {
            let envelope = track.instrument.envelope();
            for event in &track.events {
                let note_end = self.bpm.seconds_from_beats(event.end_beat());
                end = end.max(envelope.fade_end(note_end));
            }
        }
        end
    }
}
