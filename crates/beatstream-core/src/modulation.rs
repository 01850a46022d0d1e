//! Focus presets: per-tick modulation strategies.
//!
//! A focus preset overrides `beat`, `phase_shift` and `amplitude` for a single
//! tick. The stored session parameters are never touched; the modulator takes
//! a [`BeatParams`] snapshot and returns a modified copy.
//!
//! | Tag | Preset | Effect |
//! |-----|--------|--------|
//! | `10` | [`Steady`](FocusLevel::Steady) | beat fixed at 7 Hz |
//! | `12` | [`Swirl`](FocusLevel::Swirl) | beat 8.5 Hz, phase shift swings ±45° at 0.05 Hz |
//! | `15` | [`Delta`](FocusLevel::Delta) | beat 7 Hz, amplitude swings ±30% at 0.75 Hz |
//! | `21` | [`Jitter`](FocusLevel::Jitter) | beat ±0.5 Hz and phase shift ±1° of noise each tick |
//!
//! Swirl and Delta each own a slow phase accumulator that advances by one block
//! duration per tick. Accumulators persist across preset switches, so returning
//! to a preset resumes its sweep where it left off.

use core::f64::consts::TAU;
use core::fmt;
use core::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::math::wrap_phase;
use crate::params::BeatParams;

/// Beat frequency forced by the Steady and Delta presets.
pub const STEADY_BEAT_HZ: f64 = 7.0;
/// Beat frequency forced by the Swirl preset.
pub const SWIRL_BEAT_HZ: f64 = 8.5;
/// Swirl accumulator rate.
pub const SWIRL_RATE_HZ: f64 = 0.05;
/// Swirl phase-shift swing in degrees.
pub const SWIRL_DEPTH_DEG: f64 = 45.0;
/// Delta accumulator rate.
pub const DELTA_RATE_HZ: f64 = 0.75;
/// Delta relative amplitude swing.
pub const DELTA_DEPTH: f64 = 0.3;
/// Peak-to-peak beat noise of the Jitter preset, in Hz.
pub const JITTER_BEAT_SPAN_HZ: f64 = 1.0;
/// Peak-to-peak phase-shift noise of the Jitter preset, in degrees.
pub const JITTER_PHASE_SPAN_DEG: f64 = 2.0;

/// Closed set of focus presets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FocusLevel {
    /// Tag `10`: fixed 7 Hz beat.
    Steady,
    /// Tag `12`: slow phase-shift sweep.
    Swirl,
    /// Tag `15`: amplitude pulsing.
    Delta,
    /// Tag `21`: bounded random beat and phase noise.
    Jitter,
}

impl FocusLevel {
    /// All presets, in tag order.
    pub const ALL: [FocusLevel; 4] = [
        FocusLevel::Steady,
        FocusLevel::Swirl,
        FocusLevel::Delta,
        FocusLevel::Jitter,
    ];

    /// Tag sent on the control channel.
    pub const fn tag(&self) -> &'static str {
        match self {
            FocusLevel::Steady => "10",
            FocusLevel::Swirl => "12",
            FocusLevel::Delta => "15",
            FocusLevel::Jitter => "21",
        }
    }

    /// Lowercase preset name.
    pub const fn name(&self) -> &'static str {
        match self {
            FocusLevel::Steady => "steady",
            FocusLevel::Swirl => "swirl",
            FocusLevel::Delta => "delta",
            FocusLevel::Jitter => "jitter",
        }
    }

    /// One-line description of what the preset does.
    pub const fn description(&self) -> &'static str {
        match self {
            FocusLevel::Steady => "beat fixed at 7 Hz",
            FocusLevel::Swirl => "beat 8.5 Hz, phase shift sweeps ±45° at 0.05 Hz",
            FocusLevel::Delta => "beat 7 Hz, amplitude pulses ±30% at 0.75 Hz",
            FocusLevel::Jitter => "beat ±0.5 Hz and phase shift ±1° of noise per block",
        }
    }

    /// Parse a control-channel tag. The empty string means "no preset".
    ///
    /// ```rust
    /// use beatstream_core::FocusLevel;
    ///
    /// assert_eq!(FocusLevel::parse_tag("12").unwrap(), Some(FocusLevel::Swirl));
    /// assert_eq!(FocusLevel::parse_tag("").unwrap(), None);
    /// assert!(FocusLevel::parse_tag("99").is_err());
    /// ```
    pub fn parse_tag(tag: &str) -> Result<Option<FocusLevel>, UnknownFocusLevel> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(None);
        }
        tag.parse().map(Some)
    }
}

impl fmt::Display for FocusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error for an unrecognised focus tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown focus level '{0}'")]
pub struct UnknownFocusLevel(pub String);

impl FromStr for FocusLevel {
    type Err = UnknownFocusLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        FocusLevel::ALL
            .into_iter()
            .find(|level| level.tag() == s || level.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownFocusLevel(s.to_string()))
    }
}

/// Stateful applier of focus presets.
///
/// Holds the Swirl and Delta accumulators and the Jitter noise source.
#[derive(Debug, Clone)]
pub struct FocusModulator {
    swirl_phase: f64,
    delta_phase: f64,
    rng: StdRng,
}

impl Default for FocusModulator {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusModulator {
    /// Create a modulator with zeroed accumulators and an entropy-seeded RNG.
    pub fn new() -> Self {
        Self {
            swirl_phase: 0.0,
            delta_phase: 0.0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a modulator with a fixed RNG seed (reproducible Jitter).
    pub fn with_seed(seed: u64) -> Self {
        Self {
            swirl_phase: 0.0,
            delta_phase: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Swirl accumulator in radians, `[0, 2π)`.
    pub fn swirl_phase(&self) -> f64 {
        self.swirl_phase
    }

    /// Delta accumulator in radians, `[0, 2π)`.
    pub fn delta_phase(&self) -> f64 {
        self.delta_phase
    }

    /// Zero both accumulators.
    pub fn reset(&mut self) {
        self.swirl_phase = 0.0;
        self.delta_phase = 0.0;
    }

    /// Apply `focus` to a copy of `params` for one tick lasting `dt` seconds.
    ///
    /// With `focus == None` the snapshot is returned unchanged and no
    /// accumulator moves.
    pub fn apply(&mut self, params: &BeatParams, focus: Option<FocusLevel>, dt: f64) -> BeatParams {
        let mut out = *params;
        let Some(level) = focus else {
            return out;
        };

        match level {
            FocusLevel::Steady => {
                out.beat = STEADY_BEAT_HZ;
            }
            FocusLevel::Swirl => {
                self.swirl_phase = wrap_phase(self.swirl_phase + TAU * SWIRL_RATE_HZ * dt);
                out.beat = SWIRL_BEAT_HZ;
                out.phase_shift = params.phase_shift + SWIRL_DEPTH_DEG * self.swirl_phase.sin();
            }
            FocusLevel::Delta => {
                self.delta_phase = wrap_phase(self.delta_phase + TAU * DELTA_RATE_HZ * dt);
                out.beat = STEADY_BEAT_HZ;
                out.amplitude = params.amplitude * (1.0 + DELTA_DEPTH * self.delta_phase.sin());
            }
            FocusLevel::Jitter => {
                let beat_noise = self.rng.r#gen::<f64>() - 0.5;
                let phase_noise = self.rng.r#gen::<f64>() - 0.5;
                out.beat = params.beat + beat_noise * JITTER_BEAT_SPAN_HZ;
                out.phase_shift = params.phase_shift + phase_noise * JITTER_PHASE_SPAN_DEG;
            }
        }
        out
    }
}
