//! Session parameters and partial updates decoded from control messages.
//!
//! A control message is a JSON object holding any subset of the keys below.
//! Keys that are absent leave the stored value alone; unknown keys are ignored.
//!
//! | Key | Type | Range | Default |
//! |-----|------|-------|---------|
//! | `carrier` | number | 20 - 20000 Hz | 400 |
//! | `beat` | number | 0.1 - 30 Hz | 10 |
//! | `mode` | `"binaural"` / `"monaural"` | | binaural |
//! | `phase_shift` | number | 0 - 360° | 0 |
//! | `amplitude` | number | 0 - 2 | 1 |
//! | `filter_cutoff` | number or `null` | 10 Hz - sample_rate/2 | `null` (off) |
//! | `waveform` | `"sine"` / `"square"` / `"triangle"` / `"sawtooth"` | | sine |
//! | `focus_level` | `"10"` / `"12"` / `"15"` / `"21"` / `""` | | `""` (none) |

use beatstream_core::{
    BeatParams, ChannelMode, DEFAULT_AMPLITUDE, DEFAULT_BEAT_HZ, DEFAULT_CARRIER_HZ,
    DEFAULT_PHASE_SHIFT_DEG, FocusLevel, Waveform,
};
use serde_json::{Map, Value};

use crate::error::ConfigError;

/// Valid range and default of one numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    /// Control-message key.
    pub name: &'static str,
    /// Inclusive lower bound.
    pub min: f64,
    /// Inclusive upper bound.
    pub max: f64,
    /// Value substituted on correction; `None` means "disabled".
    pub default: Option<f64>,
    /// Display unit.
    pub unit: &'static str,
}

impl ParamRange {
    /// True when `value` is finite and inside `[min, max]`.
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

/// Carrier frequency range.
pub const CARRIER: ParamRange = ParamRange {
    name: "carrier",
    min: 20.0,
    max: 20000.0,
    default: Some(DEFAULT_CARRIER_HZ),
    unit: "Hz",
};

/// Beat frequency range.
pub const BEAT: ParamRange = ParamRange {
    name: "beat",
    min: 0.1,
    max: 30.0,
    default: Some(DEFAULT_BEAT_HZ),
    unit: "Hz",
};

/// Phase shift range.
pub const PHASE_SHIFT: ParamRange = ParamRange {
    name: "phase_shift",
    min: 0.0,
    max: 360.0,
    default: Some(DEFAULT_PHASE_SHIFT_DEG),
    unit: "°",
};

/// Amplitude range.
pub const AMPLITUDE: ParamRange = ParamRange {
    name: "amplitude",
    min: 0.0,
    max: 2.0,
    default: Some(DEFAULT_AMPLITUDE),
    unit: "",
};

/// Lowest accepted filter cutoff in Hz.
pub const FILTER_CUTOFF_MIN_HZ: f64 = 10.0;

/// Filter cutoff range; the upper bound is the Nyquist frequency.
pub fn filter_cutoff_range(sample_rate: f64) -> ParamRange {
    ParamRange {
        name: "filter_cutoff",
        min: FILTER_CUTOFF_MIN_HZ,
        max: sample_rate / 2.0,
        default: None,
        unit: "Hz",
    }
}

/// All numeric ranges for a given sample rate.
pub fn param_ranges(sample_rate: f64) -> [ParamRange; 5] {
    [
        CARRIER,
        BEAT,
        PHASE_SHIFT,
        AMPLITUDE,
        filter_cutoff_range(sample_rate),
    ]
}

/// Everything one session can be told to change.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionParams {
    /// Tone parameters handed to the engine.
    pub tone: BeatParams,
    /// Active focus preset, if any.
    pub focus_level: Option<FocusLevel>,
}

/// One field of a partial update.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<T> {
    /// Well-typed value (possibly still out of range).
    Set(T),
    /// Wrong JSON type or unknown tag; carries the raw JSON text.
    Invalid(String),
}

/// Partial update decoded from one control message.
///
/// `None` means the key was absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamUpdate {
    /// `carrier` key.
    pub carrier: Option<FieldValue<f64>>,
    /// `beat` key.
    pub beat: Option<FieldValue<f64>>,
    /// `mode` key.
    pub mode: Option<FieldValue<ChannelMode>>,
    /// `phase_shift` key.
    pub phase_shift: Option<FieldValue<f64>>,
    /// `amplitude` key.
    pub amplitude: Option<FieldValue<f64>>,
    /// `filter_cutoff` key; `Set(None)` disables the filter.
    pub filter_cutoff: Option<FieldValue<Option<f64>>>,
    /// `waveform` key.
    pub waveform: Option<FieldValue<Waveform>>,
    /// `focus_level` key; `Set(None)` clears the preset.
    pub focus_level: Option<FieldValue<Option<FocusLevel>>>,
}

impl ParamUpdate {
    /// Decode a control message.
    ///
    /// Fails only when the text is not JSON or not a JSON object. Fields with
    /// the wrong type decode as [`FieldValue::Invalid`] so the store can
    /// substitute defaults.
    ///
    /// ```rust
    /// use beatstream_config::{FieldValue, ParamUpdate};
    ///
    /// let update = ParamUpdate::from_json(r#"{"carrier": 300, "beat": "fast"}"#).unwrap();
    /// assert_eq!(update.carrier, Some(FieldValue::Set(300.0)));
    /// assert!(matches!(update.beat, Some(FieldValue::Invalid(_))));
    /// assert!(update.mode.is_none());
    /// ```
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(map) => Ok(Self::from_map(&map)),
            other => Err(ConfigError::NotAnObject(json_kind(&other))),
        }
    }

    fn from_map(map: &Map<String, Value>) -> Self {
        let mut update = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "carrier" => update.carrier = Some(number(value)),
                "beat" => update.beat = Some(number(value)),
                "phase_shift" => update.phase_shift = Some(number(value)),
                "amplitude" => update.amplitude = Some(number(value)),
                "mode" => update.mode = Some(tag(value)),
                "waveform" => update.waveform = Some(tag(value)),
                "filter_cutoff" => update.filter_cutoff = Some(optional_number(value)),
                "focus_level" => update.focus_level = Some(focus(value)),
                other => tracing::debug!(key = other, "ignoring unknown control key"),
            }
        }
        update
    }

    /// True when the message named no known key.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn number(value: &Value) -> FieldValue<f64> {
    value
        .as_f64()
        .map_or_else(|| FieldValue::Invalid(value.to_string()), FieldValue::Set)
}

fn optional_number(value: &Value) -> FieldValue<Option<f64>> {
    match value {
        Value::Null => FieldValue::Set(None),
        Value::Number(n) => n
            .as_f64()
            .map_or_else(|| FieldValue::Invalid(value.to_string()), |x| FieldValue::Set(Some(x))),
        other => FieldValue::Invalid(other.to_string()),
    }
}

fn tag<T: std::str::FromStr>(value: &Value) -> FieldValue<T> {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .map_or_else(|| FieldValue::Invalid(value.to_string()), FieldValue::Set)
}

fn focus(value: &Value) -> FieldValue<Option<FocusLevel>> {
    let parsed = match value {
        Value::Null => Ok(None),
        Value::String(s) => FocusLevel::parse_tag(s),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x.is_finite() && x.fract() == 0.0 => {
                FocusLevel::parse_tag(&format!("{x:.0}"))
            }
            _ => FocusLevel::parse_tag(&n.to_string()),
        },
        _ => return FieldValue::Invalid(value.to_string()),
    };
    parsed.map_or_else(|_| FieldValue::Invalid(value.to_string()), FieldValue::Set)
}
