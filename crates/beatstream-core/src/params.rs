//! Per-tick synthesis parameters.
//!
//! [`BeatParams`] is the plain snapshot the engine synthesizes from. It is
//! `Copy`, so a session can take a consistent copy of its parameter store,
//! modulate the copy for one tick and throw it away.

use core::fmt;
use core::str::FromStr;

use crate::waveform::Waveform;

/// Default carrier frequency in Hz.
pub const DEFAULT_CARRIER_HZ: f64 = 400.0;
/// Default beat frequency in Hz.
pub const DEFAULT_BEAT_HZ: f64 = 10.0;
/// Default right-channel phase offset in degrees.
pub const DEFAULT_PHASE_SHIFT_DEG: f64 = 0.0;
/// Default output gain.
pub const DEFAULT_AMPLITUDE: f64 = 1.0;

/// How the beat is presented across the two output channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum ChannelMode {
    /// Left and right run at `carrier ∓ beat/2`; the beat forms in the listener.
    #[default]
    Binaural,
    /// Both channels run at the carrier and are collapsed to one signal.
    Monaural,
}

impl ChannelMode {
    /// Lowercase tag used on the control channel.
    pub const fn name(&self) -> &'static str {
        match self {
            ChannelMode::Binaural => "binaural",
            ChannelMode::Monaural => "monaural",
        }
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for an unrecognised channel mode tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for ChannelMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "binaural" => Ok(ChannelMode::Binaural),
            "monaural" => Ok(ChannelMode::Monaural),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

/// Snapshot of everything [`SignalEngine::generate`](crate::SignalEngine::generate)
/// reads for one block.
///
/// The engine does not validate these values; zero or negative frequencies
/// produce degenerate but finite output.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeatParams {
    /// Carrier frequency in Hz.
    pub carrier: f64,
    /// Beat frequency in Hz.
    pub beat: f64,
    /// Binaural or monaural presentation.
    pub mode: ChannelMode,
    /// Right-channel phase offset in degrees.
    pub phase_shift: f64,
    /// Linear output gain.
    pub amplitude: f64,
    /// Lowpass cutoff in Hz; `None` falls back to the engine's configured cutoff.
    pub filter_cutoff: Option<f64>,
    /// Oscillator shape.
    pub waveform: Waveform,
}

impl Default for BeatParams {
    fn default() -> Self {
        Self {
            carrier: DEFAULT_CARRIER_HZ,
            beat: DEFAULT_BEAT_HZ,
            mode: ChannelMode::Binaural,
            phase_shift: DEFAULT_PHASE_SHIFT_DEG,
            amplitude: DEFAULT_AMPLITUDE,
            filter_cutoff: None,
            waveform: Waveform::Sine,
        }
    }
}

impl BeatParams {
    /// Instantaneous `(left, right)` oscillator frequencies in Hz.
    ///
    /// # Example
    ///
    /// ```rust
    /// use beatstream_core::BeatParams;
    ///
    /// let p = BeatParams { carrier: 300.0, beat: 6.0, ..BeatParams::default() };
    /// assert_eq!(p.channel_frequencies(), (297.0, 303.0));
    /// ```
    pub fn channel_frequencies(&self) -> (f64, f64) {
        match self.mode {
            ChannelMode::Binaural => {
                let half = self.beat / 2.0;
                (self.carrier - half, self.carrier + half)
            }
            ChannelMode::Monaural => (self.carrier, self.carrier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = BeatParams::default();
        assert_eq!(p.carrier, 400.0);
        assert_eq!(p.beat, 10.0);
        assert_eq!(p.mode, ChannelMode::Binaural);
        assert_eq!(p.phase_shift, 0.0);
        assert_eq!(p.amplitude, 1.0);
        assert_eq!(p.filter_cutoff, None);
        assert_eq!(p.waveform, Waveform::Sine);
    }

    #[test]
    fn monaural_runs_both_channels_at_carrier() {
        let p = BeatParams {
            carrier: 440.0,
            mode: ChannelMode::Monaural,
            ..BeatParams::default()
        };
        assert_eq!(p.channel_frequencies(), (440.0, 440.0));
    }

    #[test]
    fn mode_parses() {
        assert_eq!("Monaural".parse::<ChannelMode>().unwrap(), ChannelMode::Monaural);
        assert!("stereo".parse::<ChannelMode>().is_err());
    }
}
