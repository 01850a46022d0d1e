//! The per-session parameter store.
//!
//! [`ParameterStore`] merges partial updates and then clamps every field back
//! into range. Bad input never fails: each offending field falls back to its
//! default and the substitution is reported as a [`Correction`] and logged.

use core::fmt;

use beatstream_core::{ChannelMode, FocusLevel, Waveform};

use crate::error::ConfigError;
use crate::params::{
    AMPLITUDE, BEAT, CARRIER, FieldValue, PHASE_SHIFT, ParamRange, ParamUpdate, SessionParams,
    filter_cutoff_range,
};

/// Why a field was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionReason {
    /// Value was finite but outside its range.
    OutOfRange,
    /// Value was NaN or infinite.
    NotFinite,
    /// Value had the wrong JSON type or an unknown tag.
    WrongType,
}

impl fmt::Display for CorrectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CorrectionReason::OutOfRange => "out of range",
            CorrectionReason::NotFinite => "not finite",
            CorrectionReason::WrongType => "wrong type",
        })
    }
}

/// One field replaced by its default.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    /// Control-message key.
    pub field: &'static str,
    /// Rejected value, rendered.
    pub rejected: String,
    /// Value now stored, rendered.
    pub replacement: String,
    /// Why the value was rejected.
    pub reason: CorrectionReason,
}

impl fmt::Display for Correction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}), set to {}",
            self.field, self.rejected, self.reason, self.replacement
        )
    }
}

/// Mutable parameters of one session.
///
/// # Example
///
/// ```rust
/// use beatstream_config::{ParamUpdate, ParameterStore};
///
/// let mut store = ParameterStore::new(48000.0);
/// let update = ParamUpdate::from_json(r#"{"carrier": 25000, "beat": 6}"#).unwrap();
/// let corrections = store.apply(&update);
///
/// assert_eq!(corrections.len(), 1);
/// assert_eq!(store.current().tone.carrier, 400.0);
/// assert_eq!(store.current().tone.beat, 6.0);
/// ```
#[derive(Debug, Clone)]
pub struct ParameterStore {
    params: SessionParams,
    sample_rate: f64,
}

impl ParameterStore {
    /// Create a store holding the defaults.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            params: SessionParams::default(),
            sample_rate,
        }
    }

    /// Create a store from explicit parameters, validating them first.
    pub fn with_params(sample_rate: f64, params: SessionParams) -> Self {
        let mut store = Self {
            params,
            sample_rate,
        };
        store.validate();
        store
    }

    /// Sample rate the cutoff bound is derived from.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Current validated parameters.
    pub fn current(&self) -> &SessionParams {
        &self.params
    }

    /// Owned copy of the current parameters.
    pub fn snapshot(&self) -> SessionParams {
        self.params
    }

    /// Decode a control message and apply it.
    ///
    /// On a decode error the store is left untouched.
    pub fn apply_json(&mut self, text: &str) -> Result<Vec<Correction>, ConfigError> {
        let update = ParamUpdate::from_json(text)?;
        Ok(self.apply(&update))
    }

    /// Merge a partial update, then validate.
    pub fn apply(&mut self, update: &ParamUpdate) -> Vec<Correction> {
        let mut corrections = Vec::new();
        let defaults = SessionParams::default();
        let tone = &mut self.params.tone;

        merge(
            &mut corrections,
            "carrier",
            &mut tone.carrier,
            defaults.tone.carrier,
            update.carrier.as_ref(),
        );
        merge(
            &mut corrections,
            "beat",
            &mut tone.beat,
            defaults.tone.beat,
            update.beat.as_ref(),
        );
        merge(
            &mut corrections,
            "mode",
            &mut tone.mode,
            defaults.tone.mode,
            update.mode.as_ref(),
        );
        merge(
            &mut corrections,
            "phase_shift",
            &mut tone.phase_shift,
            defaults.tone.phase_shift,
            update.phase_shift.as_ref(),
        );
        merge(
            &mut corrections,
            "amplitude",
            &mut tone.amplitude,
            defaults.tone.amplitude,
            update.amplitude.as_ref(),
        );
        merge(
            &mut corrections,
            "filter_cutoff",
            &mut tone.filter_cutoff,
            defaults.tone.filter_cutoff,
            update.filter_cutoff.as_ref(),
        );
        merge(
            &mut corrections,
            "waveform",
            &mut tone.waveform,
            defaults.tone.waveform,
            update.waveform.as_ref(),
        );
        merge(
            &mut corrections,
            "focus_level",
            &mut self.params.focus_level,
            defaults.focus_level,
            update.focus_level.as_ref(),
        );

        for c in &corrections {
            log_correction(c);
        }
        corrections.extend(self.validate());
        corrections
    }

    /// Clamp every field back into range. Idempotent.
    pub fn validate(&mut self) -> Vec<Correction> {
        let mut corrections = Vec::new();
        let tone = &mut self.params.tone;

        clamp(&mut corrections, &CARRIER, &mut tone.carrier);
        clamp(&mut corrections, &BEAT, &mut tone.beat);
        clamp(&mut corrections, &PHASE_SHIFT, &mut tone.phase_shift);
        clamp(&mut corrections, &AMPLITUDE, &mut tone.amplitude);

        if let Some(cutoff) = tone.filter_cutoff {
            let range = filter_cutoff_range(self.sample_rate);
            if !range.contains(cutoff) {
                tone.filter_cutoff = None;
                corrections.push(Correction {
                    field: range.name,
                    rejected: cutoff.to_string(),
                    replacement: "none".to_string(),
                    reason: reason_for(cutoff),
                });
            }
        }

        for c in &corrections {
            log_correction(c);
        }
        corrections
    }

    /// Restore the defaults.
    pub fn reset(&mut self) {
        self.params = SessionParams::default();
    }
}

fn reason_for(value: f64) -> CorrectionReason {
    if value.is_finite() {
        CorrectionReason::OutOfRange
    } else {
        CorrectionReason::NotFinite
    }
}

fn clamp(corrections: &mut Vec<Correction>, range: &ParamRange, value: &mut f64) {
    if range.contains(*value) {
        return;
    }
    let replacement = range.default.unwrap_or(range.min);
    corrections.push(Correction {
        field: range.name,
        rejected: value.to_string(),
        replacement: replacement.to_string(),
        reason: reason_for(*value),
    });
    *value = replacement;
}

fn merge<T: Copy + Render>(
    corrections: &mut Vec<Correction>,
    field: &'static str,
    slot: &mut T,
    default: T,
    update: Option<&FieldValue<T>>,
) {
    match update {
        None => {}
        Some(FieldValue::Set(value)) => *slot = *value,
        Some(FieldValue::Invalid(raw)) => {
            *slot = default;
            corrections.push(Correction {
                field,
                rejected: raw.clone(),
                replacement: default.render(),
                reason: CorrectionReason::WrongType,
            });
        }
    }
}

fn log_correction(c: &Correction) {
    tracing::warn!(
        field = c.field,
        rejected = %c.rejected,
        replacement = %c.replacement,
        reason = %c.reason,
        "parameter corrected"
    );
}

/// Rendering used in correction reports.
trait Render {
    fn render(&self) -> String;
}

impl Render for f64 {
    fn render(&self) -> String {
        self.to_string()
    }
}

impl Render for ChannelMode {
    fn render(&self) -> String {
        self.name().to_string()
    }
}

impl Render for Waveform {
    fn render(&self) -> String {
        self.name().to_string()
    }
}

impl Render for Option<f64> {
    fn render(&self) -> String {
        self.map_or_else(|| "none".to_string(), |v| v.to_string())
    }
}

impl Render for Option<FocusLevel> {
    fn render(&self) -> String {
        self.map_or_else(|| "none".to_string(), |f| f.tag().to_string())
    }
}
