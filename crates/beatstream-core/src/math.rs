//! Mathematical utility functions for the signal engine.
//!
//! Scalar helpers shared by the oscillator, the filter and the focus
//! modulators. Everything here works on `f64`; the engine only narrows to
//! `f32` when a block leaves the backend.
//!
//! # Utilities
//!
//! - [`wrap_phase`] - Fold an angle into `[0, 2π)`
//! - [`deg_to_rad`] - Degrees to radians
//! - [`phase_increment`] - Radians advanced per sample for a frequency
//! - [`signum_zero`] - Sign function with `sign(0) == 0`
//! - [`flush_denormal`] - Zero out values in the subnormal range

use core::f64::consts::TAU;

/// Fold an angle in radians into `[0, 2π)`.
///
/// Uses the Euclidean remainder, so negative angles (negative frequencies
/// reach the oscillator unvalidated) wrap forward instead of staying negative.
///
/// # Example
/// ```rust
/// use beatstream_core::wrap_phase;
/// use core::f64::consts::{PI, TAU};
///
/// assert!((wrap_phase(TAU + 0.5) - 0.5).abs() < 1e-12);
/// assert!((wrap_phase(-PI) - PI).abs() < 1e-12);
/// ```
#[inline]
pub fn wrap_phase(phase: f64) -> f64 {
    let wrapped = phase.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Convert degrees to radians.
#[inline]
pub fn deg_to_rad(degrees: f64) -> f64 {
    degrees.to_radians()
}

/// Phase increment in radians per sample for `freq_hz` at `sample_rate`.
///
/// `2π · freq / sample_rate`. Zero or negative frequencies are passed through
/// unchanged: zero yields a constant phase, negative runs the phase backwards.
#[inline]
pub fn phase_increment(freq_hz: f64, sample_rate: f64) -> f64 {
    TAU * freq_hz / sample_rate
}

/// Sign function returning `-1`, `0` or `1`.
///
/// Unlike [`f64::signum`], exact zero maps to zero, so a square wave built
/// from `sign(sin(phase))` is silent on the zero crossings it lands on.
#[inline]
pub fn signum_zero(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Flush subnormal values to zero.
///
/// The filter memory decays toward zero forever once the input goes silent;
/// values below 1e-30 are replaced with zero before they reach the subnormal
/// range.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f64) -> f64 {
    if x.abs() < 1e-30 { 0.0 } else { x }
}
