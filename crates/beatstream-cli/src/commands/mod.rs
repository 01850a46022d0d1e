//! CLI command implementations.

pub mod backends;
pub mod params;
pub mod presets;
pub mod serve;
