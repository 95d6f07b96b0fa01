//! Amplitude envelopes.

mod adsr;

pub use adsr::Adsr;

/// An amplitude envelope as a pure function of time.
///
/// Envelopes hold no mutable state; the note that references one carries the
/// press and release timestamps, and every query recomputes the amplitude
/// from those. This keeps evaluation idempotent and lets one envelope be
/// shared by any number of sounding notes.
pub trait Envelope {
    /// Amplitude multiplier in [0, 1] at `time` for a note pressed at
    /// `pressed_at` and (optionally) released at `released_at`.
    fn amplitude_at(&self, time: f64, pressed_at: f64, released_at: Option<f64>) -> f64;

    /// Whether a note released at `released_at` is still audible at `time`.
    fn is_alive(&self, time: f64, released_at: f64) -> bool;

    /// The latest moment a note that ends at `time` can still contribute
    /// sound. Used to compute total song length.
    fn fade_end(&self, time: f64) -> f64;
}
