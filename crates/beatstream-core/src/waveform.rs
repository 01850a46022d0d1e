//! Oscillator waveform shaping.
//!
//! Shapes are computed directly from the running phase in radians, through
//! the [`ComputeBackend`] capability set, so one formula serves both backends.
//!
//! | Waveform | Formula | Range |
//! |----------|---------|-------|
//! | Sine | `sin(φ)` | `[-1, 1]` |
//! | Square | `sign(sin(φ))` | `{-1, 0, 1}` |
//! | Triangle | `(2/π)·asin(sin(φ))` | `[-1, 1]` |
//! | Sawtooth | `(φ/π mod 2) - 1` | `[-1, 1)` |
//!
//! None of these are band-limited; the engine targets low carriers where
//! aliasing of the harmonics is not a concern.

use core::f64::consts::{FRAC_2_PI, PI};
use core::fmt;
use core::str::FromStr;
use ndarray::Array1;

use crate::backend::{ComputeBackend, UnaryOp};

/// Oscillator waveform type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Waveform {
    /// Pure sine.
    #[default]
    Sine,
    /// Sign of the sine, hard edges.
    Square,
    /// Linear ramps up and down.
    Triangle,
    /// Rising ramp with an abrupt reset.
    Sawtooth,
}

impl Waveform {
    /// All waveforms, in declaration order.
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Triangle,
        Waveform::Sawtooth,
    ];

    /// Lowercase tag used on the control channel.
    pub const fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Triangle => "triangle",
            Waveform::Sawtooth => "sawtooth",
        }
    }

    /// Shape a phase vector in place.
    ///
    /// `phases` holds absolute phases in radians; on return it holds samples.
    pub fn shape(self, backend: &dyn ComputeBackend, phases: &mut Array1<f64>) {
        match self {
            Waveform::Sine => backend.map(phases, UnaryOp::Sin),
            Waveform::Square => {
                backend.map(phases, UnaryOp::Sin);
                backend.map(phases, UnaryOp::Sign);
            }
            Waveform::Triangle => {
                backend.map(phases, UnaryOp::Sin);
                backend.map(phases, UnaryOp::Arcsin);
                backend.map(phases, UnaryOp::Scale(FRAC_2_PI));
            }
            Waveform::Sawtooth => {
                backend.map(phases, UnaryOp::Scale(1.0 / PI));
                backend.map(phases, UnaryOp::RemEuclid(2.0));
                backend.map(phases, UnaryOp::Offset(-1.0));
            }
        }
    }

    /// Scalar version of [`shape`](Self::shape), for a single phase value.
    pub fn sample(self, phase: f64) -> f64 {
        match self {
            Waveform::Sine => UnaryOp::Sin.apply(phase),
            Waveform::Square => UnaryOp::Sign.apply(phase.sin()),
            Waveform::Triangle => FRAC_2_PI * UnaryOp::Arcsin.apply(phase.sin()),
            Waveform::Sawtooth => (phase * (1.0 / PI)).rem_euclid(2.0) - 1.0,
        }
    }
}

impl fmt::Display for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unrecognised waveform tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown waveform '{0}'")]
pub struct UnknownWaveform(pub String);

impl FromStr for Waveform {
    type Err = UnknownWaveform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sine" => Ok(Waveform::Sine),
            "square" => Ok(Waveform::Square),
            "triangle" => Ok(Waveform::Triangle),
            "sawtooth" | "saw" => Ok(Waveform::Sawtooth),
            other => Err(UnknownWaveform(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;

    fn ramp(n: usize) -> Array1<f64> {
        // a few turns, including negative phases
        Array1::from_shape_fn(n, |i| -10.0 + 20.0 * i as f64 / n as f64)
    }

    #[test]
    fn vector_shape_matches_scalar_sample() {
        let cpu = CpuBackend::new();
        for wf in Waveform::ALL {
            let src = ramp(257);
            let mut shaped = src.clone();
            wf.shape(&cpu, &mut shaped);
            for (p, s) in src.iter().zip(shaped.iter()) {
                assert!(
                    (wf.sample(*p) - s).abs() < 1e-12,
                    "{wf} mismatch at phase {p}"
                );
            }
        }
    }

    #[test]
    fn square_only_emits_three_levels() {
        let cpu = CpuBackend::new();
        let mut x = ramp(1000);
        x[0] = 0.0;
        Waveform::Square.shape(&cpu, &mut x);
        assert!(x.iter().all(|&v| v == -1.0 || v == 0.0 || v == 1.0));
        assert_eq!(x[0], 0.0);
    }

    #[test]
    fn triangle_and_sawtooth_are_bounded() {
        let cpu = CpuBackend::new();
        for wf in [Waveform::Triangle, Waveform::Sawtooth] {
            let mut x = ramp(1000);
            wf.shape(&cpu, &mut x);
            assert!(x.iter().all(|&v| (-1.0..=1.0).contains(&v)), "{wf} out of range");
        }
    }

    #[test]
    fn sawtooth_rises_from_minus_one() {
        assert!((Waveform::Sawtooth.sample(0.0) + 1.0).abs() < 1e-12);
        assert!(Waveform::Sawtooth.sample(PI).abs() < 1e-12);
    }

    #[test]
    fn parses_tags() {
        assert_eq!("Sine".parse::<Waveform>().unwrap(), Waveform::Sine);
        assert_eq!("saw".parse::<Waveform>().unwrap(), Waveform::Sawtooth);
        assert!("noise".parse::<Waveform>().is_err());
        for wf in Waveform::ALL {
            assert_eq!(wf.name().parse::<Waveform>().unwrap(), wf);
        }
    }
}
