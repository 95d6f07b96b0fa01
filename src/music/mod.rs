//! Musical fundamentals: pitch and tempo.

pub mod scale;
pub mod tempo;

pub use scale::Scale;
pub use tempo::Bpm;
