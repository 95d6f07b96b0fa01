//! The voice mixer: active notes and their lifetimes.

use std::sync::Arc;

use rand::RngCore;

use crate::instruments::Instrument;
use crate::music::Scale;

/// Opaque handle to a note registered with a [`Synth`].
///
/// Returned by [`Synth::note_on`] so the caller can release the note later
/// without holding a reference into the synth's note collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteId(u64);

/// One sounding note: the lifetime unit of the synthesizer.
///
/// Combines its instrument's tone output with the instrument's envelope.
/// Created by [`Synth::note_on`]; evicted by [`Synth::remove_inactive`] once
/// the envelope reports it inaudible.
#[derive(Clone)]
pub struct ActiveNote {
    id: NoteId,
    instrument: Arc<dyn Instrument>,
    semitone: f64,
    pressed_at: f64,
    released_at: Option<f64>,
}

impl ActiveNote {
    pub fn id(&self) -> NoteId {
        self.id
    }

    pub fn instrument(&self) -> &Arc<dyn Instrument> {
        &self.instrument
    }

    pub fn semitone(&self) -> f64 {
        self.semitone
    }

    pub fn pressed_at(&self) -> f64 {
        self.pressed_at
    }

    pub fn released_at(&self) -> Option<f64> {
        self.released_at
    }

    /// Marks the note released at `time`.
    ///
    /// Calling this twice moves the release point: the later call wins. This
    /// supports re-triggered releases; the envelope always ramps from the ADS
    /// value at the final release time.
    pub fn note_off(&mut self, time: f64) {
        self.released_at = Some(time);
    }

    /// Whether the note still contributes sound at `time`. Unreleased notes
    /// are always alive.
    pub fn is_alive(&self, time: f64) -> bool {
        match self.released_at {
            None => true,
            Some(released_at) => self.instrument.envelope().is_alive(time, released_at),
        }
    }

    /// Tone times envelope amplitude at `time`. Pure: evaluating twice at the
    /// same time yields the same amplitude (noise layers excepted, which
    /// advance the caller's RNG).
    pub fn evaluate(&self, time: f64, scale: &Scale, rng: &mut dyn RngCore) -> f64 {
        let tone = self.instrument.tone(time, scale, self, rng);
        let amplitude = self
            .instrument
            .envelope()
            .amplitude_at(time, self.pressed_at, self.released_at);
        tone * amplitude
    }
}

/// Polyphonic voice mixer.
///
/// Owns the set of currently sounding notes and sums their output. Notes are
/// independent voices: triggering the same pitch twice yields two voices, with
/// no de-duplication. Summation order is irrelevant to the mix.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use klang::{Adsr, Scale, SimpleInstrument, Synth, Waveform};
/// use rand::SeedableRng;
///
/// let lead = Arc::new(SimpleInstrument::new(
///     "lead",
///     Adsr::new(0.01, 0.05, 0.8, 0.2),
///     Waveform::Triangle,
/// ));
///
/// let mut synth = Synth::new();
/// let mut rng = rand::rngs::StdRng::seed_from_u64(0);
/// let scale = Scale::default();
///
/// let id = synth.note_on(0.0, 12.0, lead);
/// let amp = synth.evaluate(&scale, 0.5, &mut rng);
/// synth.note_off(id, 1.0);
/// synth.remove_inactive(2.0);
/// assert_eq!(synth.evaluate(&scale, 2.0, &mut rng), 0.0);
/// ```
#[derive(Default)]
pub struct Synth {
    notes: Vec<ActiveNote>,
    next_id: u64,
}

impl Synth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new unreleased note and returns its handle. Always
    /// succeeds.
    pub fn note_on(&mut self, time: f64, semitone: f64, instrument: Arc<dyn Instrument>) -> NoteId {
        let id = NoteId(self.next_id);
        self.next_id += 1;
        self.notes.push(ActiveNote {
            id,
            instrument,
            semitone,
            pressed_at: time,
            released_at: None,
        });
        id
    }

    /// Releases the note with handle `id` at `time`. Unknown or already
    /// evicted handles are ignored.
    pub fn note_off(&mut self, id: NoteId, time: f64) {
        if let Some(note) = self.notes.iter_mut().find(|n| n.id == id) {
            note.note_off(time);
        }
    }

    /// Evicts every note whose envelope has fully decayed at `time`. Call once
    /// per render step to bound memory.
    pub fn remove_inactive(&mut self, time: f64) {
        self.notes.retain(|note| note.is_alive(time));
    }

    /// Sums the output of all sounding notes at `time`. Exactly 0.0 when no
    /// notes are registered.
    pub fn evaluate(&self, scale: &Scale, time: f64, rng: &mut dyn RngCore) -> f64 {
        let mut amp = 0.0;
        for note in &self.notes {
            amp += note.evaluate(time, scale, rng);
        }
        amp
    }

    /// The currently registered notes, in no meaningful order.
    pub fn active_notes(&self) -> &[ActiveNote] {
        &self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelopes::Adsr;
    use crate::instruments::SimpleInstrument;
    use crate::oscillators::Waveform;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn instrument() -> Arc<dyn Instrument> {
        // attack 0.25, decay 0.25, sustain 0.5, release 0.5
        Arc::new(SimpleInstrument::new(
            "test",
            Adsr::new(0.25, 0.25, 0.5, 0.5),
            Waveform::Sine,
        ))
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_empty_synth_is_silent() {
        let synth = Synth::new();
        let scale = Scale::default();
        for t in [0.0, 0.5, 100.0] {
            assert_eq!(synth.evaluate(&scale, t, &mut rng()), 0.0);
        }
    }

    #[test]
    fn test_note_on_registers_independent_voices() {
        let mut synth = Synth::new();
        let a = synth.note_on(0.0, 0.0, instrument());
        let b = synth.note_on(0.0, 0.0, instrument());
        assert_ne!(a, b);
        assert_eq!(synth.active_notes().len(), 2);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let mut synth = Synth::new();
        synth.note_on(0.0, 7.0, instrument());
        let scale = Scale::default();
        let first = synth.evaluate(&scale, 0.3, &mut rng());
        let second = synth.evaluate(&scale, 0.3, &mut rng());
        assert_eq!(first, second);
    }

    #[test]
    fn test_two_equal_notes_double_amplitude() {
        let scale = Scale::default();
        let mut one = Synth::new();
        one.note_on(0.0, 0.0, instrument());
        let mut two = Synth::new();
        two.note_on(0.0, 0.0, instrument());
        two.note_on(0.0, 0.0, instrument());

        let single = one.evaluate(&scale, 0.3, &mut rng());
        let double = two.evaluate(&scale, 0.3, &mut rng());
        assert!((double - 2.0 * single).abs() < 1e-12);
    }

    #[test]
    fn test_note_off_starts_release() {
        let mut synth = Synth::new();
        let id = synth.note_on(0.0, 0.0, instrument());
        synth.note_off(id, 1.0);
        let note = &synth.active_notes()[0];
        assert_eq!(note.released_at(), Some(1.0));
        assert!(note.is_alive(1.4));
        assert!(!note.is_alive(1.5));
    }

    #[test]
    fn test_note_off_twice_moves_release_point() {
        let mut synth = Synth::new();
        let id = synth.note_on(0.0, 0.0, instrument());
        synth.note_off(id, 1.0);
        synth.note_off(id, 2.0);
        // Overwrite semantics: the later release wins.
        assert_eq!(synth.active_notes()[0].released_at(), Some(2.0));
        assert!(synth.active_notes()[0].is_alive(1.6));
    }

    #[test]
    fn test_remove_inactive_evicts_faded_notes() {
        let mut synth = Synth::new();
        let id = synth.note_on(0.0, 0.0, instrument());
        synth.note_on(0.0, 5.0, instrument());
        synth.note_off(id, 1.0);

        synth.remove_inactive(1.2);
        assert_eq!(synth.active_notes().len(), 2); // still in release window

        synth.remove_inactive(1.5);
        assert_eq!(synth.active_notes().len(), 1); // release over, evicted
    }

    #[test]
    fn test_unreleased_note_is_always_alive() {
        let mut synth = Synth::new();
        synth.note_on(0.0, 0.0, instrument());
        synth.remove_inactive(1e9);
        assert_eq!(synth.active_notes().len(), 1);
    }

    #[test]
    fn test_note_off_unknown_id_is_ignored() {
        let mut synth = Synth::new();
        let id = synth.note_on(0.0, 0.0, instrument());
        synth.remove_inactive(0.0);
        synth.note_off(id, 1.0); // still present, fine
        let mut other = Synth::new();
        other.note_off(id, 1.0); // foreign id, no-op
        assert!(other.active_notes().is_empty());
    }
}
