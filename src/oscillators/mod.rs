//! Periodic waveform generators.
//!
//! Every oscillator is a pure function of time: no phase accumulator state is
//! kept between samples. All waveforms share one phase argument,
//! `t·ω(f) + lfo_amplitude·sin(t·ω(lfo_hz))`, i.e. an optional frequency
//! modulation by a secondary sine LFO. `Noise` is the exception: it draws
//! from the random generator passed by the caller and ignores time and
//! frequency entirely, which keeps renders reproducible under a seeded RNG.

use std::f64::consts::{PI, TAU};

use rand::Rng;

/// Optional modulation parameters consumed by the oscillator evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorSettings {
    /// LFO rate in Hz. Zero disables modulation.
    pub lfo_hz: f64,
    /// LFO depth added to the phase argument.
    pub lfo_amplitude: f64,
    /// Number of additive harmonics for [`Waveform::SawSoft`]. More steps
    /// trade cost for harmonic richness.
    pub saw_soft_steps: u32,
}

impl Default for OscillatorSettings {
    fn default() -> Self {
        Self {
            lfo_hz: 0.0,
            lfo_amplitude: 0.0,
            saw_soft_steps: 50,
        }
    }
}

/// The available waveform shapes.
///
/// # Examples
///
/// ```
/// use klang::{OscillatorSettings, Waveform};
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(1);
/// let settings = OscillatorSettings::default();
///
/// // A sine wave peaks a quarter period in.
/// let peak = Waveform::Sine.generate(0.25, 1.0, &settings, &mut rng);
/// assert!((peak - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    /// Additive (Fourier) sawtooth approximation; warm, band-limited-ish.
    SawSoft,
    /// Closed-form sawtooth; bright, full-spectrum.
    SawHard,
    /// Uniform random samples in [-1, 1], drawn from the caller's RNG.
    Noise,
}

/// Angular velocity (rad/s) for a frequency in Hz.
fn angular(hz: f64) -> f64 {
    hz * TAU
}

impl Waveform {
    /// Evaluates the waveform at `time` seconds for a tone of `hz` Hz.
    ///
    /// Output is approximately in [-1, 1]; `SawSoft` overshoots slightly near
    /// its discontinuities (Gibbs ringing).
    pub fn generate<R: Rng + ?Sized>(
        self,
        time: f64,
        hz: f64,
        settings: &OscillatorSettings,
        rng: &mut R,
    ) -> f64 {
        let arg = time * angular(hz)
            + settings.lfo_amplitude * (time * angular(settings.lfo_hz)).sin();
        match self {
            Waveform::Sine => arg.sin(),
            Waveform::Square => {
                if arg.sin() > 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Triangle => arg.sin().asin() * (2.0 / PI),
            Waveform::SawSoft => {
                let mut r = 0.0;
                for k in 1..=settings.saw_soft_steps {
                    let k = f64::from(k);
                    r += (k * arg).sin() / k;
                }
                r
            }
            // Same modulated phase argument as the other shapes; ramps from
            // -1 to 1 once per period.
            Waveform::SawHard => arg.rem_euclid(TAU) / PI - 1.0,
            Waveform::Noise => rng.gen_range(-1.0..=1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0x5eed)
    }

    fn gen_at(wave: Waveform, time: f64, hz: f64) -> f64 {
        wave.generate(time, hz, &OscillatorSettings::default(), &mut rng())
    }

    #[test]
    fn test_sine_quarter_points() {
        assert!(gen_at(Waveform::Sine, 0.0, 1.0).abs() < 1e-9);
        assert!((gen_at(Waveform::Sine, 0.25, 1.0) - 1.0).abs() < 1e-9);
        assert!((gen_at(Waveform::Sine, 0.75, 1.0) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_square_is_sign_of_sine() {
        assert_eq!(gen_at(Waveform::Square, 0.1, 1.0), 1.0);
        assert_eq!(gen_at(Waveform::Square, 0.6, 1.0), -1.0);
        // sin(0) == 0 is not strictly positive, so it lands on -1
        assert_eq!(gen_at(Waveform::Square, 0.0, 1.0), -1.0);
    }

    #[test]
    fn test_triangle_bounds_and_peak() {
        for i in 0..100 {
            let t = i as f64 / 100.0;
            let v = gen_at(Waveform::Triangle, t, 3.0);
            assert!((-1.0..=1.0).contains(&v));
        }
        assert!((gen_at(Waveform::Triangle, 0.25, 1.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_saw_hard_ramp() {
        // One period of a 1 Hz saw ramps -1 -> 1
        assert!((gen_at(Waveform::SawHard, 0.0, 1.0) + 1.0).abs() < 1e-9);
        assert!(gen_at(Waveform::SawHard, 0.5, 1.0).abs() < 1e-9);
        assert!((gen_at(Waveform::SawHard, 0.999, 1.0) - 0.998).abs() < 1e-3);
        // Periodicity
        let a = gen_at(Waveform::SawHard, 0.3, 5.0);
        let b = gen_at(Waveform::SawHard, 0.3 + 1.0 / 5.0, 5.0);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_saw_hard_zero_frequency_is_defined() {
        assert_eq!(gen_at(Waveform::SawHard, 123.4, 0.0), -1.0);
    }

    #[test]
    fn test_saw_soft_tracks_saw_hard() {
        // With many harmonics the additive saw approaches the closed form
        // away from the discontinuity. The Fourier series converges to half
        // the peak-to-peak of the closed form times pi/2... just check shape:
        // monotonically decreasing sawtooth flank mid-period.
        let settings = OscillatorSettings {
            saw_soft_steps: 200,
            ..Default::default()
        };
        let mut r = rng();
        let a = Waveform::SawSoft.generate(0.3, 1.0, &settings, &mut r);
        let b = Waveform::SawSoft.generate(0.6, 1.0, &settings, &mut r);
        assert!(a > b, "saw flank should fall across the period");
    }

    #[test]
    fn test_noise_bounds_and_seeding() {
        let settings = OscillatorSettings::default();
        let mut a = rng();
        let mut b = rng();
        for _ in 0..1000 {
            let x = Waveform::Noise.generate(0.0, 440.0, &settings, &mut a);
            let y = Waveform::Noise.generate(9.9, 220.0, &settings, &mut b);
            assert!((-1.0..=1.0).contains(&x));
            // Same seed, same stream: time and frequency are ignored.
            assert_eq!(x, y);
        }
    }

    #[test]
    fn test_lfo_perturbs_phase() {
        let settings = OscillatorSettings {
            lfo_hz: 2.0,
            lfo_amplitude: 0.5,
            ..Default::default()
        };
        let plain = gen_at(Waveform::Sine, 0.1, 440.0);
        let modded = Waveform::Sine.generate(0.1, 440.0, &settings, &mut rng());
        assert!((plain - modded).abs() > 1e-6);
    }
}
