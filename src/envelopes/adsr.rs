//! ADSR (Attack, Decay, Sustain, Release) envelope.

use super::Envelope;

/// Amplitudes below this are snapped to exactly zero. Suppresses denormals
/// and inaudible tails, and makes liveness checks exact.
const AMPLITUDE_FLOOR: f64 = 0.01;

/// A linear ADSR envelope.
///
/// The four logical phases, relative to the press time:
/// - **Attack** `[0, A)`: linear ramp 0 → 1
/// - **Decay** `[A, A+D)`: linear ramp 1 → sustain level
/// - **Sustain** `[A+D, ∞)` while unreleased: constant sustain level
/// - **Release**: from the moment of release, the ADS value *at release time*
///   ramps linearly to 0 over the release duration. The attack/decay history
///   is not re-entered; a note released mid-attack fades from its mid-attack
///   level.
///
/// # Examples
///
/// ```
/// use klang::{Adsr, Envelope};
///
/// let env = Adsr::new(0.25, 0.25, 0.5, 0.5);
/// assert_eq!(env.amplitude_at(0.25, 0.0, None), 1.0);   // attack peak
/// assert_eq!(env.amplitude_at(0.5, 0.0, None), 0.5);    // sustain
/// assert!(env.is_alive(0.9, 0.5));                      // releasing
/// assert!(!env.is_alive(1.0, 0.5));                     // faded out
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    attack_time: f64,
    decay_time: f64,
    sustain_level: f64,
    release_time: f64,
}

impl Adsr {
    /// Creates an envelope from times in seconds and a sustain level in [0, 1].
    pub fn new(attack_time: f64, decay_time: f64, sustain_level: f64, release_time: f64) -> Self {
        Self {
            attack_time: attack_time.max(0.0),
            decay_time: decay_time.max(0.0),
            sustain_level: sustain_level.clamp(0.0, 1.0),
            release_time: release_time.max(0.0),
        }
    }

    pub fn attack_time(&self) -> f64 {
        self.attack_time
    }

    pub fn decay_time(&self) -> f64 {
        self.decay_time
    }

    pub fn sustain_level(&self) -> f64 {
        self.sustain_level
    }

    pub fn release_time(&self) -> f64 {
        self.release_time
    }

    /// The attack-decay-sustain amplitude for a note alive `life` seconds.
    fn ads(&self, life: f64) -> f64 {
        if life <= 0.0 {
            return 0.0;
        }
        let after_attack = life - self.attack_time;
        if after_attack < 0.0 {
            return floor_clamp(life / self.attack_time);
        }
        if after_attack < self.decay_time {
            let progress = after_attack / self.decay_time;
            return floor_clamp(1.0 - progress * (1.0 - self.sustain_level));
        }
        floor_clamp(self.sustain_level)
    }
}

fn floor_clamp(amplitude: f64) -> f64 {
    if amplitude < AMPLITUDE_FLOOR { 0.0 } else { amplitude }
}

impl Envelope for Adsr {
    fn amplitude_at(&self, time: f64, pressed_at: f64, released_at: Option<f64>) -> f64 {
        let Some(released_at) = released_at else {
            return self.ads(time - pressed_at);
        };

        let life = time - released_at;
        if life < 0.0 {
            // Re-evaluating history before the release point
            return self.ads(time - pressed_at);
        }
        if life >= self.release_time {
            return 0.0;
        }
        let from = self.ads(released_at - pressed_at);
        from * (1.0 - life / self.release_time)
    }

    fn is_alive(&self, time: f64, released_at: f64) -> bool {
        (time - released_at) < self.release_time
    }

    fn fade_end(&self, time: f64) -> f64 {
        time + self.release_time
    }
}
