//! Integration tests for beatstream-config.
//!
//! These tests verify end-to-end functionality across modules.

use beatstream_config::{ConfigError, ParameterStore, ServerConfig, SessionParams};
use beatstream_core::{BackendPreference, ChannelMode, FocusLevel, Waveform};
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_load_config_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "host = \"127.0.0.1\"\nport = 9100\nblock_size = 1024\nbackend = \"cpu\"\nfilter_cutoff = 6000.0"
    )
    .unwrap();

    let config = ServerConfig::load(file.path()).unwrap();
    config.validate().unwrap();
    assert_eq!(config.addr(), "127.0.0.1:9100");
    assert_eq!(config.block_size, 1024);
    assert_eq!(config.backend, BackendPreference::Cpu);

    let engine = config.engine_config();
    assert_eq!(engine.filter_cutoff, Some(6000.0));
    assert_eq!(engine.sample_rate, 48000.0);
}

#[test]
fn test_missing_config_file() {
    let dir = TempDir::new().unwrap();
    let err = ServerConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
}

#[test]
fn test_malformed_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "port = \"not a number\"").unwrap();
    assert!(matches!(
        ServerConfig::load(file.path()),
        Err(ConfigError::TomlParse(_))
    ));
}

#[test]
fn test_control_message_sequence() {
    let mut store = ParameterStore::new(48000.0);

    store
        .apply_json(r#"{"carrier": 300, "beat": 6, "waveform": "sawtooth"}"#)
        .unwrap();
    store.apply_json(r#"{"mode": "monaural", "focus_level": "10"}"#).unwrap();
    assert!(store.apply_json("{not json").is_err());
    let corrections = store
        .apply_json(r#"{"amplitude": 5, "unknown": true}"#)
        .unwrap();

    let p = store.snapshot();
    assert_eq!(p.tone.carrier, 300.0);
    assert_eq!(p.tone.beat, 6.0);
    assert_eq!(p.tone.waveform, Waveform::Sawtooth);
    assert_eq!(p.tone.mode, ChannelMode::Monaural);
    assert_eq!(p.tone.amplitude, 1.0);
    assert_eq!(p.focus_level, Some(FocusLevel::Steady));
    assert_eq!(corrections.len(), 1);
}

#[test]
fn test_store_defaults_match_session_defaults() {
    let store = ParameterStore::new(44100.0);
    assert_eq!(*store.current(), SessionParams::default());
    assert_eq!(store.sample_rate(), 44100.0);
}
