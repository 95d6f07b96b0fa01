//! Klang - a polyphonic software synthesizer.
//!
//! This library turns a symbolic description of notes over time into a stream
//! of floating-point audio samples and serializes that stream to a 24-bit PCM
//! WAV file. The pipeline: a [`Player`] steps a [`Song`] forward in wall-clock
//! time, triggering notes on a [`Synth`], whose active notes combine
//! [`Instrument`] tone output with an [`Adsr`] envelope; the mixed amplitude
//! is collected by [`render_mono`]/[`render_stereo`] and written by [`Wav`].

pub mod envelopes;
pub mod instruments;
pub mod music;
pub mod oscillators;
pub mod song;
pub mod synth;
pub mod wav;

// Re-export commonly used types at the crate root
pub use envelopes::{Adsr, Envelope};
pub use instruments::{Instrument, LayeredInstrument, SimpleInstrument, TimeBasis};
pub use music::{Bpm, Scale};
pub use oscillators::{OscillatorSettings, Waveform};
pub use song::{NoteEvent, Player, Song, Track};
pub use synth::{ActiveNote, NoteId, Synth};
pub use wav::{Wav, render_mono, render_stereo};
