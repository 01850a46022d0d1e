//! Streaming layer for beatstream.
//!
//! This crate provides:
//!
//! - **Frame codec**: [`encode_block`] and [`decode_frame`] for the binary data channel
//! - **Sessions**: [`StreamingSession`] runs control ingest and paced block generation
//!   for one connection
//! - **Server**: [`serve`] and [`serve_listener`] accept WebSocket clients and spawn
//!   one session per connection
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use beatstream_config::ServerConfig;
//!
//! # async fn run() -> beatstream_io::Result<()> {
//! let config = ServerConfig::from_toml("host = \"127.0.0.1\"")?;
//! beatstream_io::serve(config).await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod server;
pub mod session;

pub use codec::{decode_frame, encode_block, frame_len};
pub use server::{serve, serve_listener};
pub use session::{EndReason, SessionSummary, StreamingSession};

/// Error types for streaming operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Socket or bind failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket handshake or protocol failure.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Binary frame with an impossible length.
    #[error("invalid frame: {len} bytes is not a whole number of stereo f32 frames")]
    Frame {
        /// Length of the rejected payload in bytes.
        len: usize,
    },

    /// Invalid server configuration.
    #[error("configuration error: {0}")]
    Config(#[from] beatstream_config::ConfigError),

    /// Engine could not be built.
    #[error("engine error: {0}")]
    Engine(#[from] beatstream_core::EngineError),
}

/// Convenience result type for streaming operations.
pub type Result<T> = std::result::Result<T, Error>;
