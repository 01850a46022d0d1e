//! Beatstream Core - signal engine for binaural and monaural beats
//!
//! This crate turns a small set of tone parameters into continuous stereo
//! audio, one fixed-size block at a time. Phase and filter memory carry from
//! block to block, so a stream of blocks splices without clicks.
//!
//! # Core Abstractions
//!
//! ## Compute Backends
//!
//! - [`ComputeBackend`] - Object-safe trait over the vector operations the engine needs
//! - [`CpuBackend`] - Single-threaded host implementation
//! - [`AcceleratedBackend`] - Data-parallel implementation on a dedicated thread pool
//! - [`select`] - Pick a backend by preference, falling back to CPU on failure
//!
//! ## Synthesis
//!
//! - [`SignalEngine`] - Phase-continuous block generator
//! - [`BeatParams`] - Per-block parameter snapshot
//! - [`Waveform`] - Sine, square, triangle, sawtooth
//! - [`OnePole`] - Optional output lowpass
//!
//! ## Focus Presets
//!
//! - [`FocusLevel`] - Tagged modulation presets (`10`, `12`, `15`, `21`)
//! - [`FocusModulator`] - Stateful applier, owned by the engine
//!
//! ## Utilities
//!
//! - Math functions: [`wrap_phase`], [`deg_to_rad`], [`phase_increment`], etc.
//!
//! # Example
//!
//! ```rust
//! use beatstream_core::{select, BackendPreference, BeatParams, EngineConfig, SignalEngine};
//!
//! let backend = select(BackendPreference::Accelerated);
//! let mut engine = SignalEngine::new(EngineConfig::default(), backend).unwrap();
//!
//! let params = BeatParams { carrier: 300.0, beat: 6.0, ..BeatParams::default() };
//! let block = engine.generate(&params);
//! assert_eq!(block.left().len(), block.right().len());
//! ```

pub mod backend;
pub mod block;
pub mod engine;
pub mod math;
pub mod modulation;
pub mod one_pole;
pub mod params;
pub mod waveform;

pub use backend::{
    AcceleratedBackend, BackendCapabilities, BackendError, BackendKind, BackendPreference,
    ComputeBackend, CpuBackend, UnaryOp, detect_capabilities, select, select_with,
};
pub use block::AudioBlock;
pub use engine::{
    DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE, EngineConfig, EngineError, EngineState, SignalEngine,
};
pub use math::{deg_to_rad, flush_denormal, phase_increment, signum_zero, wrap_phase};
pub use modulation::{FocusLevel, FocusModulator, UnknownFocusLevel};
pub use one_pole::OnePole;
pub use params::{
    BeatParams, ChannelMode, DEFAULT_AMPLITUDE, DEFAULT_BEAT_HZ, DEFAULT_CARRIER_HZ,
    DEFAULT_PHASE_SHIFT_DEG, UnknownMode,
};
pub use waveform::{UnknownWaveform, Waveform};
