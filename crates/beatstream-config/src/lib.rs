//! Session parameters and server configuration for beatstream.
//!
//! # Features
//!
//! - **Control messages**: decode JSON partial updates into [`ParamUpdate`]
//! - **Validation**: [`ParameterStore`] clamps bad values to defaults and
//!   reports each [`Correction`]
//! - **Server config**: [`ServerConfig`] loads from TOML and checks bind
//!   address, port and audio settings
//!
//! # Example
//!
//! ```rust
//! use beatstream_config::{ParameterStore, ServerConfig};
//!
//! let config = ServerConfig::from_toml("port = 9000").unwrap();
//! config.validate().unwrap();
//!
//! let mut store = ParameterStore::new(f64::from(config.sample_rate));
//! store.apply_json(r#"{"carrier": 300, "beat": 6}"#).unwrap();
//! assert_eq!(store.current().tone.channel_frequencies(), (297.0, 303.0));
//! ```

mod error;
mod server;
mod store;

/// Parameter ranges and control-message decoding.
pub mod params;

pub use error::ConfigError;
pub use params::{FieldValue, ParamRange, ParamUpdate, SessionParams, param_ranges};
pub use server::{ALLOWED_HOSTS, DEFAULT_PORT, MIN_PORT, ServerConfig};
pub use store::{Correction, CorrectionReason, ParameterStore};
