//! The render cursor: steps a song forward and drives the synth.

use rand::RngCore;

use crate::music::Scale;
use crate::song::Song;
use crate::synth::{NoteId, Synth};

/// Steps a [`Song`] forward in wall-clock time, triggering synth note-on and
/// note-off calls for the events that fall in the elapsed window, and
/// evaluating the mixed amplitude at the new time.
///
/// The player is an explicit value, not ambient state: independent renders
/// each own their player. One player renders one song; it is not reusable
/// across songs without being recreated.
///
/// Within one step, every note-on for the window is applied before any
/// note-off, so an event whose start and end both fall in the window is
/// opened and then immediately closed. The trigger test is half-open —
/// strictly after the last rendered time, up to and including the current
/// time — which prevents both double triggers and missed ones; the cursor
/// starts below zero so an event at beat 0 is caught by the first step.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use klang::{Adsr, Bpm, NoteEvent, Player, Scale, SimpleInstrument, Song, Synth, Track, Waveform};
/// use rand::SeedableRng;
///
/// let lead = Arc::new(SimpleInstrument::new(
///     "lead",
///     Adsr::new(0.01, 0.05, 0.8, 0.2),
///     Waveform::Square,
/// ));
/// let track = Track::new("melody", lead, vec![NoteEvent::new(0.0, 1.0, 0)]);
/// let song = Song::new(Bpm::new(120.0), vec![track]);
///
/// let mut player = Player::new();
/// let mut synth = Synth::new();
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let scale = Scale::default();
///
/// let sample_rate = 44100.0;
/// for i in 0..4410 {
///     let t = i as f64 / sample_rate;
///     let _amp = player.step(&song, &mut synth, &scale, t, &mut rng);
/// }
/// ```
pub struct Player {
    last_rendered_time: f64,
    /// Notes opened but not yet closed, with the beat at which each ends.
    open_notes: Vec<(NoteId, f64)>,
}

impl Player {
    pub fn new() -> Self {
        Self {
            // Below any renderable time, so events at t=0 trigger on the
            // first step.
            last_rendered_time: f64::NEG_INFINITY,
            open_notes: Vec::new(),
        }
    }

    /// Advances to `time` and returns the mixed amplitude there.
    ///
    /// `time` must not decrease across calls on one player.
    pub fn step(
        &mut self,
        song: &Song,
        synth: &mut Synth,
        scale: &Scale,
        time: f64,
        rng: &mut dyn RngCore,
    ) -> f64 {
        let window_start = song.bpm.beats_from_seconds(self.last_rendered_time);
        let window_end = song.bpm.beats_from_seconds(time);
        let in_window = |beat: f64| beat > window_start && beat <= window_end;

        // Open every starting event across all tracks first
        for track in &song.tracks {
            for event in &track.events {
                if in_window(event.start_beat) {
                    let pressed_at = song.bpm.seconds_from_beats(event.start_beat);
                    let id = synth.note_on(
                        pressed_at,
                        f64::from(event.semitone),
                        track.instrument.clone(),
                    );
                    self.open_notes.push((id, event.end_beat()));
                }
            }
        }

        // Then close the ones whose end falls in the window
        self.open_notes.retain(|&(id, end_beat)| {
            if in_window(end_beat) {
                synth.note_off(id, song.bpm.seconds_from_beats(end_beat));
                false
            } else {
                true
            }
        });

        synth.remove_inactive(time);
        let amplitude = synth.evaluate(scale, time, rng);
        self.last_rendered_time = time;
        amplitude
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}
