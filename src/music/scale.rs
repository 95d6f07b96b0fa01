//! Equal-tempered pitch scale.

/// An equal-tempered 12-tone scale anchored on a tuning reference.
///
/// Semitone 0 is the A two octaves below the tuning pitch (A2 for the default
/// A4 = 440 Hz tuning), so the base frequency is `tuning / 4`. Semitones are
/// signed reals: negative values reach below the reference, and fractional
/// values are valid (e.g. for an LFO-perturbed pitch).
///
/// # Examples
///
/// ```
/// use klang::Scale;
///
/// let scale = Scale::default();
/// assert_eq!(scale.base_frequency(), 110.0);
///
/// // 24 semitones above A2 is A4, the tuning pitch itself.
/// assert!((scale.frequency_from_semitone(24.0) - 440.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    tuning_hz: f64,
}

impl Scale {
    /// Creates a scale with the given tuning reference in Hz.
    pub fn new(tuning_hz: f64) -> Self {
        Self { tuning_hz }
    }

    /// The frequency of semitone 0, two octaves below the tuning pitch.
    pub fn base_frequency(&self) -> f64 {
        self.tuning_hz / 4.0
    }

    /// Converts a signed (possibly fractional) semitone offset to Hz.
    ///
    /// Pure and defined for all real inputs.
    ///
    /// # Examples
    ///
    /// ```
    /// use klang::Scale;
    ///
    /// let scale = Scale::new(440.0);
    /// let a2 = scale.frequency_from_semitone(0.0);
    /// let a3 = scale.frequency_from_semitone(12.0);
    /// assert!((a3 - 2.0 * a2).abs() < 1e-9);
    /// ```
    pub fn frequency_from_semitone(&self, semitone: f64) -> f64 {
        self.base_frequency() * (semitone / 12.0).exp2()
    }
}

impl Default for Scale {
    /// Concert pitch, A4 = 440 Hz.
    fn default() -> Self {
        Self::new(440.0)
    }
}
