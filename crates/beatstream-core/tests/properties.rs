//! Property-based tests for beatstream-core synthesis.
//!
//! Tests output bounds, phase continuity and monaural collapse using
//! proptest for randomized parameter generation.

use std::sync::Arc;

use beatstream_core::{
    BeatParams, ChannelMode, CpuBackend, EngineConfig, FocusLevel, FocusModulator, SignalEngine,
    Waveform, wrap_phase,
};
use core::f64::consts::TAU;
use proptest::prelude::*;

fn engine(block_size: usize) -> SignalEngine {
    let config = EngineConfig {
        block_size,
        ..EngineConfig::default()
    };
    SignalEngine::new(config, Arc::new(CpuBackend::new())).unwrap()
}

fn waveform() -> impl Strategy<Value = Waveform> {
    prop::sample::select(Waveform::ALL.to_vec())
}

fn mode() -> impl Strategy<Value = ChannelMode> {
    prop::sample::select(vec![ChannelMode::Binaural, ChannelMode::Monaural])
}

fn focus() -> impl Strategy<Value = Option<FocusLevel>> {
    prop::option::of(prop::sample::select(FocusLevel::ALL.to_vec()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// With amplitude at most 1 and any filter setting, every sample stays in [-1, 1].
    #[test]
    fn output_is_bounded(
        carrier in 20.0f64..20000.0,
        beat in 0.1f64..30.0,
        phase_shift in -360.0f64..360.0,
        amplitude in 0.0f64..=1.0,
        cutoff in prop::option::of(20.0f64..20000.0),
        wf in waveform(),
        m in mode(),
    ) {
        let mut e = engine(512);
        let p = BeatParams { carrier, beat, mode: m, phase_shift, amplitude, filter_cutoff: cutoff, waveform: wf };
        for _ in 0..3 {
            let block = e.generate(&p);
            prop_assert!(block.peak() <= amplitude as f32 + 1e-6, "peak {} for {:?}", block.peak(), p);
        }
    }

    /// Carried phases advance by N·2πf/sr (mod 2π) and stay in [0, 2π).
    #[test]
    fn carried_phase_advances_by_block(
        carrier in 20.0f64..20000.0,
        beat in 0.1f64..30.0,
        block_size in 1usize..4096,
    ) {
        let mut e = engine(block_size);
        let p = BeatParams { carrier, beat, ..BeatParams::default() };
        let before = e.state();
        e.generate(&p);
        let after = e.state();
        let (fl, fr) = p.channel_frequencies();
        let n = block_size as f64;

        let expect_l = wrap_phase(before.phase_left + n * TAU * fl / 48000.0);
        let expect_r = wrap_phase(before.phase_right + n * TAU * fr / 48000.0);
        let diff = |a: f64, b: f64| {
            let d = (a - b).abs();
            d.min(TAU - d)
        };
        prop_assert!(diff(after.phase_left, expect_l) < 1e-6);
        prop_assert!(diff(after.phase_right, expect_r) < 1e-6);
        prop_assert!((0.0..TAU).contains(&after.phase_left));
        prop_assert!((0.0..TAU).contains(&after.phase_right));
    }

    /// Monaural blocks carry the same samples on both channels.
    #[test]
    fn monaural_is_identical(
        carrier in 20.0f64..20000.0,
        phase_shift in -180.0f64..180.0,
        wf in waveform(),
    ) {
        let mut e = engine(256);
        let p = BeatParams { carrier, phase_shift, waveform: wf, mode: ChannelMode::Monaural, ..BeatParams::default() };
        let block = e.generate(&p);
        prop_assert_eq!(block.left(), block.right());
    }

    /// Focus accumulators stay in [0, 2π) over long runs.
    #[test]
    fn focus_accumulators_stay_wrapped(
        levels in prop::collection::vec(focus(), 1..400),
        seed in any::<u64>(),
    ) {
        let mut m = FocusModulator::with_seed(seed);
        let p = BeatParams::default();
        for level in levels {
            let out = m.apply(&p, level, 2048.0 / 48000.0);
            prop_assert!(out.amplitude >= 0.0);
            prop_assert!((0.0..TAU).contains(&m.swirl_phase()));
            prop_assert!((0.0..TAU).contains(&m.delta_phase()));
        }
    }
}
