//! Block-based beat synthesis.
//!
//! [`SignalEngine`] turns a [`BeatParams`] snapshot into one stereo
//! [`AudioBlock`] per call, carrying oscillator phase and filter memory from
//! block to block so consecutive blocks splice without discontinuities.
//!
//! # Pipeline
//!
//! ```text
//!   index[0..N] ──► affine(inc_L, φL) ──► shape ─┐
//!                                                ├─► lowpass ─► gain ─► mono? ─► f32
//!   index[0..N] ──► affine(inc_R, φR) ─► +shift ─► shape ─┘
//! ```
//!
//! Everything except the lowpass runs on the selected [`ComputeBackend`].
//! The lowpass is a sequential recursion, so its input is downloaded to host
//! memory, filtered and uploaded again.
//!
//! The phase shift is added after the carried right-channel phase is captured:
//! it offsets the output without ever accumulating into the oscillator.

use std::sync::Arc;
use std::time::Duration;

use ndarray::Array1;

use crate::backend::{BackendKind, ComputeBackend, UnaryOp};
use crate::block::AudioBlock;
use crate::math::{deg_to_rad, phase_increment, wrap_phase};
use crate::modulation::{FocusLevel, FocusModulator};
use crate::one_pole::OnePole;
use crate::params::{BeatParams, ChannelMode};

/// Default output sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;
/// Default frames per block.
pub const DEFAULT_BLOCK_SIZE: usize = 2048;

/// Fixed engine configuration, chosen once per session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Output sample rate in Hz.
    pub sample_rate: f64,
    /// Frames per generated block.
    pub block_size: usize,
    /// Lowpass cutoff used when a block's parameters carry none.
    pub filter_cutoff: Option<f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: f64::from(DEFAULT_SAMPLE_RATE),
            block_size: DEFAULT_BLOCK_SIZE,
            filter_cutoff: None,
        }
    }
}

impl EngineConfig {
    /// Wall-clock length of one block.
    pub fn block_duration(&self) -> Duration {
        Duration::from_secs_f64(self.block_seconds())
    }

    /// Block length in seconds, the `dt` used by focus modulation.
    pub fn block_seconds(&self) -> f64 {
        self.block_size as f64 / self.sample_rate
    }
}

/// Errors from engine construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// Sample rate must be finite and positive.
    #[error("invalid sample rate {0} Hz")]
    InvalidSampleRate(f64),
    /// Block size must be at least one frame.
    #[error("block size must be at least 1 frame")]
    InvalidBlockSize,
    /// Configured cutoff must be finite and positive.
    #[error("invalid filter cutoff {0} Hz")]
    InvalidCutoff(f64),
}

/// Read-only snapshot of the engine's carried state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EngineState {
    /// Left oscillator phase in radians, `[0, 2π)`.
    pub phase_left: f64,
    /// Right oscillator phase in radians, `[0, 2π)`, excluding the phase shift.
    pub phase_right: f64,
    /// Left lowpass memory.
    pub filter_left: f64,
    /// Right lowpass memory.
    pub filter_right: f64,
    /// Swirl focus accumulator.
    pub swirl_phase: f64,
    /// Delta focus accumulator.
    pub delta_phase: f64,
    /// Blocks generated since construction or the last reset.
    pub blocks: u64,
}

/// Phase-continuous stereo beat generator.
///
/// # Example
///
/// ```rust
/// use beatstream_core::{BeatParams, CpuBackend, EngineConfig, SignalEngine};
/// use std::sync::Arc;
///
/// let mut engine = SignalEngine::new(EngineConfig::default(), Arc::new(CpuBackend::new())).unwrap();
/// let block = engine.generate(&BeatParams::default());
/// assert_eq!(block.len(), 2048);
/// assert!(block.peak() <= 1.0);
/// ```
#[derive(Debug)]
pub struct SignalEngine {
    config: EngineConfig,
    backend: Arc<dyn ComputeBackend>,
    index: Array1<f64>,
    phase_left: f64,
    phase_right: f64,
    filter_left: OnePole,
    filter_right: OnePole,
    modulator: FocusModulator,
    blocks: u64,
}

impl SignalEngine {
    /// Create an engine on the given backend.
    pub fn new(config: EngineConfig, backend: Arc<dyn ComputeBackend>) -> Result<Self, EngineError> {
        if !(config.sample_rate.is_finite() && config.sample_rate > 0.0) {
            return Err(EngineError::InvalidSampleRate(config.sample_rate));
        }
        if config.block_size == 0 {
            return Err(EngineError::InvalidBlockSize);
        }
        if let Some(cutoff) = config.filter_cutoff
            && !usable_cutoff(cutoff)
        {
            return Err(EngineError::InvalidCutoff(cutoff));
        }

        let initial_cutoff = config.filter_cutoff.unwrap_or(config.sample_rate / 4.0);
        let index = backend.arange(config.block_size);

        tracing::debug!(
            backend = %backend.kind(),
            sample_rate = config.sample_rate,
            block_size = config.block_size,
            "signal engine created"
        );

        Ok(Self {
            config,
            backend,
            index,
            phase_left: 0.0,
            phase_right: 0.0,
            filter_left: OnePole::new(config.sample_rate, initial_cutoff),
            filter_right: OnePole::new(config.sample_rate, initial_cutoff),
            modulator: FocusModulator::new(),
            blocks: 0,
        })
    }

    /// Replace the focus noise source with a seeded one.
    pub fn with_modulation_seed(mut self, seed: u64) -> Self {
        self.modulator = FocusModulator::with_seed(seed);
        self
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Which backend this engine computes on.
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Apply a focus preset to a parameter snapshot for the next block.
    ///
    /// Advances the preset's accumulator by one block duration.
    pub fn modulate(&mut self, params: &BeatParams, focus: Option<FocusLevel>) -> BeatParams {
        let dt = self.config.block_seconds();
        self.modulator.apply(params, focus, dt)
    }

    /// Produce the next block.
    ///
    /// Never fails: degenerate parameters yield degenerate but well-formed
    /// blocks, and non-finite phases restart from zero.
    pub fn generate(&mut self, params: &BeatParams) -> AudioBlock {
        let backend = self.backend.as_ref();
        let sample_rate = self.config.sample_rate;
        let last = self.config.block_size - 1;

        let (freq_left, freq_right) = params.channel_frequencies();
        let inc_left = phase_increment(freq_left, sample_rate);
        let inc_right = phase_increment(freq_right, sample_rate);

        let mut left = self.index.clone();
        let mut right = self.index.clone();
        backend.affine(&mut left, inc_left, self.phase_left);
        backend.affine(&mut right, inc_right, self.phase_right);

        self.phase_left = carry(left[last] + inc_left);
        self.phase_right = carry(right[last] + inc_right);

        let shift = deg_to_rad(params.phase_shift);
        if shift != 0.0 {
            backend.map(&mut right, UnaryOp::Offset(shift));
        }

        params.waveform.shape(backend, &mut left);
        params.waveform.shape(backend, &mut right);

        let cutoff = params
            .filter_cutoff
            .or(self.config.filter_cutoff)
            .filter(|&c| usable_cutoff(c));
        if let Some(cutoff) = cutoff {
            left = lowpass(backend, &mut self.filter_left, cutoff, &left);
            right = lowpass(backend, &mut self.filter_right, cutoff, &right);
        }

        if params.amplitude != 1.0 {
            backend.map(&mut left, UnaryOp::Scale(params.amplitude));
            backend.map(&mut right, UnaryOp::Scale(params.amplitude));
        }

        if params.mode == ChannelMode::Monaural {
            backend.mean_into(&mut left, &right);
            right.assign(&left);
        }

        self.blocks += 1;
        AudioBlock::new(backend.to_f32(&left), backend.to_f32(&right))
    }

    /// Snapshot of carried state.
    pub fn state(&self) -> EngineState {
        EngineState {
            phase_left: self.phase_left,
            phase_right: self.phase_right,
            filter_left: self.filter_left.state(),
            filter_right: self.filter_right.state(),
            swirl_phase: self.modulator.swirl_phase(),
            delta_phase: self.modulator.delta_phase(),
            blocks: self.blocks,
        }
    }

    /// Zero phases, filter memory and focus accumulators.
    pub fn reset(&mut self) {
        self.phase_left = 0.0;
        self.phase_right = 0.0;
        self.filter_left.reset();
        self.filter_right.reset();
        self.modulator.reset();
        self.blocks = 0;
    }
}

fn usable_cutoff(cutoff: f64) -> bool {
    cutoff.is_finite() && cutoff > 0.0
}

fn carry(phase: f64) -> f64 {
    if phase.is_finite() { wrap_phase(phase) } else { 0.0 }
}

fn lowpass(
    backend: &dyn ComputeBackend,
    filter: &mut OnePole,
    cutoff: f64,
    signal: &Array1<f64>,
) -> Array1<f64> {
    filter.set_cutoff(cutoff);
    let mut host = backend.download(signal);
    filter.process_block(&mut host);
    backend.upload(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AcceleratedBackend, CpuBackend};
    use crate::waveform::Waveform;
    use core::f64::consts::TAU;

    fn engine(block_size: usize) -> SignalEngine {
        let config = EngineConfig {
            block_size,
            ..EngineConfig::default()
        };
        SignalEngine::new(config, Arc::new(CpuBackend::new())).unwrap()
    }

    #[test]
    fn rejects_bad_config() {
        let cpu: Arc<dyn ComputeBackend> = Arc::new(CpuBackend::new());
        let zero = EngineConfig {
            block_size: 0,
            ..EngineConfig::default()
        };
        assert_eq!(
            SignalEngine::new(zero, cpu.clone()).unwrap_err(),
            EngineError::InvalidBlockSize
        );
        let nan_rate = EngineConfig {
            sample_rate: f64::NAN,
            ..EngineConfig::default()
        };
        assert!(matches!(
            SignalEngine::new(nan_rate, cpu.clone()),
            Err(EngineError::InvalidSampleRate(_))
        ));
        let bad_cutoff = EngineConfig {
            filter_cutoff: Some(-5.0),
            ..EngineConfig::default()
        };
        assert!(matches!(
            SignalEngine::new(bad_cutoff, cpu),
            Err(EngineError::InvalidCutoff(_))
        ));
    }

    #[test]
    fn phase_carries_across_blocks() {
        let mut e = engine(256);
        let p = BeatParams::default();
        e.generate(&p);
        let (fl, fr) = p.channel_frequencies();
        let expected_l = wrap_phase(256.0 * TAU * fl / 48000.0);
        let expected_r = wrap_phase(256.0 * TAU * fr / 48000.0);
        let s = e.state();
        assert!((s.phase_left - expected_l).abs() < 1e-9);
        assert!((s.phase_right - expected_r).abs() < 1e-9);
        assert_eq!(s.blocks, 1);
    }

    #[test]
    fn block_boundary_is_continuous() {
        let mut e = engine(100);
        let p = BeatParams::default();
        let a = e.generate(&p);
        let b = e.generate(&p);
        let mut whole = engine(200);
        let joined = whole.generate(&p);
        for i in 0..100 {
            assert!((a.left()[i] - joined.left()[i]).abs() < 1e-5);
            assert!((b.left()[i] - joined.left()[i + 100]).abs() < 1e-5);
            assert!((b.right()[i] - joined.right()[i + 100]).abs() < 1e-5);
        }
    }

    #[test]
    fn phase_shift_does_not_accumulate() {
        let mut plain = engine(128);
        let mut shifted = engine(128);
        let p = BeatParams::default();
        let q = BeatParams {
            phase_shift: 90.0,
            ..p
        };
        for _ in 0..5 {
            plain.generate(&p);
            shifted.generate(&q);
        }
        assert_eq!(plain.state().phase_right, shifted.state().phase_right);
    }

    #[test]
    fn monaural_channels_are_identical() {
        let mut e = engine(512);
        let p = BeatParams {
            mode: ChannelMode::Monaural,
            phase_shift: 30.0,
            ..BeatParams::default()
        };
        let block = e.generate(&p);
        assert_eq!(block.left(), block.right());
    }

    #[test]
    fn amplitude_scales_output() {
        let mut e = engine(2048);
        let block = e.generate(&BeatParams {
            amplitude: 0.25,
            ..BeatParams::default()
        });
        assert!(block.peak() <= 0.25 + 1e-6);
        assert!(block.peak() > 0.2);
    }

    #[test]
    fn zero_amplitude_is_silent() {
        let mut e = engine(64);
        let block = e.generate(&BeatParams {
            amplitude: 0.0,
            ..BeatParams::default()
        });
        assert_eq!(block.peak(), 0.0);
    }

    #[test]
    fn filter_state_moves_only_when_enabled() {
        let mut e = engine(64);
        e.generate(&BeatParams::default());
        assert_eq!(e.state().filter_left, 0.0);
        e.generate(&BeatParams {
            filter_cutoff: Some(1000.0),
            ..BeatParams::default()
        });
        assert_ne!(e.state().filter_left, 0.0);
    }

    #[test]
    fn configured_cutoff_applies_without_override() {
        let config = EngineConfig {
            block_size: 64,
            filter_cutoff: Some(200.0),
            ..EngineConfig::default()
        };
        let mut e = SignalEngine::new(config, Arc::new(CpuBackend::new())).unwrap();
        e.generate(&BeatParams::default());
        assert_ne!(e.state().filter_left, 0.0);
    }

    #[test]
    fn zero_frequency_keeps_phase_constant() {
        let mut e = engine(32);
        let block = e.generate(&BeatParams {
            carrier: 0.0,
            beat: 0.0,
            ..BeatParams::default()
        });
        assert!(block.left().iter().all(|&s| s == 0.0));
        assert_eq!(e.state().phase_left, 0.0);
    }

    #[test]
    fn non_finite_frequency_does_not_poison_phase() {
        let mut e = engine(32);
        e.generate(&BeatParams {
            carrier: f64::INFINITY,
            ..BeatParams::default()
        });
        assert_eq!(e.state().phase_left, 0.0);
        let block = e.generate(&BeatParams::default());
        assert!(block.left().iter().all(|s| s.is_finite()));
    }

    #[test]
    fn reset_restarts_from_zero() {
        let mut e = engine(128);
        let p = BeatParams {
            filter_cutoff: Some(500.0),
            ..BeatParams::default()
        };
        let first = e.generate(&p);
        e.modulate(&p, Some(FocusLevel::Swirl));
        e.generate(&p);
        e.reset();
        assert_eq!(e.state(), EngineState::default());
        assert_eq!(e.generate(&p), first);
    }

    #[test]
    fn backends_agree() {
        let Ok(accel) = AcceleratedBackend::new() else {
            return;
        };
        let config = EngineConfig {
            block_size: 1024,
            filter_cutoff: Some(3000.0),
            ..EngineConfig::default()
        };
        let mut cpu = SignalEngine::new(config, Arc::new(CpuBackend::new())).unwrap();
        let mut acc = SignalEngine::new(config, Arc::new(accel)).unwrap();
        for wf in Waveform::ALL {
            let p = BeatParams {
                waveform: wf,
                phase_shift: 45.0,
                amplitude: 0.8,
                ..BeatParams::default()
            };
            let a = cpu.generate(&p);
            let b = acc.generate(&p);
            for (x, y) in a.left().iter().zip(b.left()) {
                assert!((x - y).abs() < 1e-5, "{wf}: {x} vs {y}");
            }
        }
    }

    #[test]
    fn modulate_uses_block_duration() {
        let mut e = engine(2048);
        e.modulate(&BeatParams::default(), Some(FocusLevel::Delta));
        let expected = TAU * 0.75 * 2048.0 / 48000.0;
        assert!((e.state().delta_phase - expected).abs() < 1e-12);
    }
}
