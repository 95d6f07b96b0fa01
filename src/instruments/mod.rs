//! Instruments: an envelope paired with a tone-generation function.
//!
//! The synthesis core only ever sees the [`Instrument`] trait; how an
//! instrument was authored (hard-coded or loaded from a description file) is
//! invisible to it. Instruments are immutable and shared: many sounding notes
//! may reference one instrument concurrently.

pub mod config;

use rand::RngCore;

use crate::envelopes::{Adsr, Envelope};
use crate::music::Scale;
use crate::oscillators::{OscillatorSettings, Waveform};
use crate::synth::ActiveNote;

/// Which clock an oscillator layer runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBasis {
    /// The song's wall clock. Concurrent notes of the same pitch are
    /// phase-aligned.
    Absolute,
    /// Seconds since the note was pressed. Every note starts at phase zero.
    SincePress,
    /// Press time minus the current time; a reversed clock.
    PressMinus,
}

impl TimeBasis {
    /// Maps song time to the layer's local time for a note pressed at
    /// `pressed_at`.
    pub fn local_time(self, time: f64, pressed_at: f64) -> f64 {
        match self {
            TimeBasis::Absolute => time,
            TimeBasis::SincePress => time - pressed_at,
            TimeBasis::PressMinus => pressed_at - time,
        }
    }
}

/// A named envelope plus tone-generation function.
///
/// `tone` receives the note so composite instruments can read its semitone
/// and press time, and the render RNG so noise layers stay reproducible under
/// a fixed seed.
pub trait Instrument {
    fn name(&self) -> &str;

    /// The amplitude envelope applied over this instrument's tone.
    fn envelope(&self) -> &dyn Envelope;

    /// Raw tone sample (pre-envelope) at `time` for `note`.
    fn tone(&self, time: f64, scale: &Scale, note: &ActiveNote, rng: &mut dyn RngCore) -> f64;
}

/// A fixed single-oscillator instrument.
///
/// # Examples
///
/// ```
/// use klang::{Adsr, SimpleInstrument, Waveform};
///
/// let lead = SimpleInstrument::new("lead", Adsr::new(0.1, 0.1, 0.8, 0.2), Waveform::SawHard);
/// ```
pub struct SimpleInstrument {
    name: String,
    envelope: Adsr,
    waveform: Waveform,
    settings: OscillatorSettings,
}

impl SimpleInstrument {
    pub fn new(name: impl Into<String>, envelope: Adsr, waveform: Waveform) -> Self {
        Self {
            name: name.into(),
            envelope,
            waveform,
            settings: OscillatorSettings::default(),
        }
    }

    /// Overrides the oscillator settings (LFO, additive step count).
    pub fn with_settings(mut self, settings: OscillatorSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl Instrument for SimpleInstrument {
    fn name(&self) -> &str {
        &self.name
    }

    fn envelope(&self) -> &dyn Envelope {
        &self.envelope
    }

    fn tone(&self, time: f64, scale: &Scale, note: &ActiveNote, rng: &mut dyn RngCore) -> f64 {
        let hz = scale.frequency_from_semitone(note.semitone());
        self.waveform.generate(time, hz, &self.settings, rng)
    }
}

/// One oscillator layer of a [`LayeredInstrument`].
#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorLayer {
    pub waveform: Waveform,
    /// Layer gain.
    pub volume: f64,
    /// Pitch offset in semitones relative to the note's pitch.
    pub steps: i32,
    pub time_basis: TimeBasis,
    pub settings: OscillatorSettings,
}

/// A multi-oscillator instrument, typically loaded from a description file.
///
/// The tone is the master volume times the sum of all layers; each layer
/// evaluates its waveform at the note's pitch shifted by the layer's semitone
/// offset, on the layer's own time basis.
#[derive(Debug)]
pub struct LayeredInstrument {
    name: String,
    envelope: Adsr,
    volume: f64,
    layers: Vec<OscillatorLayer>,
}

impl LayeredInstrument {
    pub fn new(
        name: impl Into<String>,
        envelope: Adsr,
        volume: f64,
        layers: Vec<OscillatorLayer>,
    ) -> Self {
        Self {
            name: name.into(),
            envelope,
            volume,
            layers,
        }
    }

    pub fn layers(&self) -> &[OscillatorLayer] {
        &self.layers
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }
}

impl Instrument for LayeredInstrument {
    fn name(&self) -> &str {
        &self.name
    }

    fn envelope(&self) -> &dyn Envelope {
        &self.envelope
    }

    fn tone(&self, time: f64, scale: &Scale, note: &ActiveNote, rng: &mut dyn RngCore) -> f64 {
        let mut sum = 0.0;
        for layer in &self.layers {
            let hz = scale.frequency_from_semitone(note.semitone() + f64::from(layer.steps));
            let local = layer.time_basis.local_time(time, note.pressed_at());
            sum += layer.volume * layer.waveform.generate(local, hz, &layer.settings, rng);
        }
        self.volume * sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::Synth;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Arc;

    fn note_at(semitone: f64, pressed_at: f64) -> ActiveNote {
        let mut synth = Synth::new();
        let instrument: Arc<dyn Instrument> = Arc::new(SimpleInstrument::new(
            "probe",
            Adsr::new(0.0, 0.0, 1.0, 0.1),
            Waveform::Sine,
        ));
        let id = synth.note_on(pressed_at, semitone, instrument);
        synth.active_notes().iter().find(|n| n.id() == id).unwrap().clone()
    }

    #[test]
    fn test_time_basis() {
        assert_eq!(TimeBasis::Absolute.local_time(5.0, 2.0), 5.0);
        assert_eq!(TimeBasis::SincePress.local_time(5.0, 2.0), 3.0);
        assert_eq!(TimeBasis::PressMinus.local_time(5.0, 2.0), -3.0);
    }

    #[test]
    fn test_simple_instrument_tone_is_oscillator_output() {
        let instrument = SimpleInstrument::new("s", Adsr::new(0.0, 0.0, 1.0, 0.1), Waveform::Sine);
        let scale = Scale::default();
        let note = note_at(0.0, 0.0);
        let mut rng = StdRng::seed_from_u64(7);
        let tone = instrument.tone(0.25 / 110.0, &scale, &note, &mut rng);
        // Quarter period of the 110 Hz base pitch
        assert!((tone - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_layered_instrument_sums_layers() {
        let layer = |steps| OscillatorLayer {
            waveform: Waveform::Sine,
            volume: 0.5,
            steps,
            time_basis: TimeBasis::Absolute,
            settings: OscillatorSettings::default(),
        };
        let instrument = LayeredInstrument::new(
            "pair",
            Adsr::new(0.0, 0.0, 1.0, 0.1),
            1.0,
            vec![layer(0), layer(0)],
        );
        let simple = SimpleInstrument::new("one", Adsr::new(0.0, 0.0, 1.0, 0.1), Waveform::Sine);

        let scale = Scale::default();
        let note = note_at(0.0, 0.0);
        let mut rng = StdRng::seed_from_u64(7);
        let layered = instrument.tone(0.003, &scale, &note, &mut rng);
        let single = simple.tone(0.003, &scale, &note, &mut rng);
        // Two half-volume identical layers equal one full-volume oscillator
        assert!((layered - single).abs() < 1e-12);
    }

    #[test]
    fn test_layered_instrument_debug_formatting() {
        let instrument =
            LayeredInstrument::new("warm pad", Adsr::new(0.0, 0.0, 1.0, 0.1), 1.0, vec![]);
        assert!(format!("{:?}", instrument).contains("warm pad"));
    }

    #[test]
    fn test_layer_pitch_offset() {
        let mk = |steps| {
            LayeredInstrument::new(
                "o",
                Adsr::new(0.0, 0.0, 1.0, 0.1),
                1.0,
                vec![OscillatorLayer {
                    waveform: Waveform::Sine,
                    volume: 1.0,
                    steps,
                    time_basis: TimeBasis::Absolute,
                    settings: OscillatorSettings::default(),
                }],
            )
        };
        let scale = Scale::default();
        let note = note_at(0.0, 0.0);
        let mut rng = StdRng::seed_from_u64(7);
        // An octave-up layer at time t matches the base layer at 2t
        let up = mk(12).tone(0.001, &scale, &note, &mut rng);
        let base = mk(0).tone(0.002, &scale, &note, &mut rng);
        assert!((up - base).abs() < 1e-9);
    }
}
