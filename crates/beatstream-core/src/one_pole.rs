//! One-pole lowpass filter for the optional output smoothing stage.
//!
//! A single-pole IIR lowpass written as an RC smoother:
//!
//! ```text
//! dt    = 1 / sample_rate
//! rc    = 1 / (2π · cutoff)
//! α     = dt / (rc + dt)
//! y[n]  = y[n-1] + α · (x[n] - y[n-1])
//! ```
//!
//! 6 dB/octave rolloff, zero latency, one multiply per sample. The recursion
//! is inherently sequential, so it always runs on host memory.
//!
//! # Usage
//!
//! ```rust
//! use beatstream_core::OnePole;
//!
//! let mut lp = OnePole::new(48000.0, 4000.0);
//! let filtered = lp.process(1.0);
//! assert!(filtered < 1.0); // first step only moves part of the way
//! ```

use core::f64::consts::TAU;

use crate::math::flush_denormal;

/// One-pole (6 dB/oct) lowpass filter.
///
/// # Invariants
///
/// - `alpha` is in (0, 1] for any positive cutoff
/// - `state` survives cutoff changes; only [`reset`](Self::reset) clears it
#[derive(Debug, Clone)]
pub struct OnePole {
    state: f64,
    alpha: f64,
    sample_rate: f64,
    cutoff: f64,
}

impl OnePole {
    /// Create a new one-pole lowpass filter.
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Sample rate in Hz
    /// * `cutoff_hz` - Cutoff frequency in Hz (10.0 to sample_rate/2)
    pub fn new(sample_rate: f64, cutoff_hz: f64) -> Self {
        Self {
            state: 0.0,
            alpha: smoothing_factor(sample_rate, cutoff_hz),
            sample_rate,
            cutoff: cutoff_hz,
        }
    }

    /// Set the cutoff frequency. Filter memory is kept.
    pub fn set_cutoff(&mut self, cutoff_hz: f64) {
        if cutoff_hz != self.cutoff {
            self.cutoff = cutoff_hz;
            self.alpha = smoothing_factor(self.sample_rate, cutoff_hz);
        }
    }

    /// Current cutoff in Hz.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Current smoothing factor α.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Current filter memory.
    pub fn state(&self) -> f64 {
        self.state
    }

    /// Process one sample through the lowpass filter.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        self.state = flush_denormal(self.state + self.alpha * (input - self.state));
        self.state
    }

    /// Filter a block of host samples in place.
    pub fn process_block(&mut self, buffer: &mut [f64]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Reset filter memory to zero.
    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

/// `α = dt / (rc + dt)` for the given sample rate and cutoff.
fn smoothing_factor(sample_rate: f64, cutoff_hz: f64) -> f64 {
    let dt = 1.0 / sample_rate;
    let rc = 1.0 / (TAU * cutoff_hz);
    dt / (rc + dt)
}
