//! Tempo: conversion between beats and wall-clock seconds.

/// A tempo in beats per minute.
///
/// # Examples
///
/// ```
/// use klang::Bpm;
///
/// let bpm = Bpm::new(120.0);
/// assert_eq!(bpm.seconds_from_beats(1.0), 0.5);
/// assert_eq!(bpm.beats_from_seconds(0.5), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bpm(f64);

impl Bpm {
    pub fn new(beats_per_minute: f64) -> Self {
        Self(beats_per_minute)
    }

    pub fn beats_per_minute(&self) -> f64 {
        self.0
    }

    /// Wall-clock duration of `beats` beats.
    pub fn seconds_from_beats(&self, beats: f64) -> f64 {
        beats * 60.0 / self.0
    }

    /// Number of beats elapsed after `seconds` seconds.
    pub fn beats_from_seconds(&self, seconds: f64) -> f64 {
        seconds * self.0 / 60.0
    }
}
