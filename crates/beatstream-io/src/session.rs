//! One streaming session per connection.
//!
//! A session runs two activities inside a single task:
//!
//! ```text
//!   inbound text ──► ParameterStore::apply_json ──► watch::Sender
//!                                                        │
//!                        interval tick ──► snapshot ◄────┘
//!                                            │
//!                           modulate ─► generate ─► encode ─► sink
//! ```
//!
//! Control ingest owns the [`ParameterStore`] and publishes every validated
//! snapshot through a `watch` channel. The merge, validation and publish step
//! has no await point, so the generator never sees a half-applied update.
//! The generator reads the latest snapshot on each tick; the session ends
//! when a send fails, dropping the ingest future with it.

use std::fmt;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use beatstream_config::{ParameterStore, ServerConfig, SessionParams};
use beatstream_core::{BeatParams, ComputeBackend, EngineConfig, SignalEngine};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::Result;
use crate::codec::encode_block;

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// The outbound channel refused a frame.
    Disconnected(String),
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::Disconnected(e) => write!(f, "disconnected: {e}"),
        }
    }
}

/// Counters reported when a session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Session identifier.
    pub id: u64,
    /// Frames delivered to the sink.
    pub blocks_sent: u64,
    /// Control messages decoded and merged.
    pub messages_applied: u64,
    /// Control messages dropped as undecodable.
    pub messages_rejected: u64,
    /// Fields replaced by defaults across all messages.
    pub corrections: u64,
    /// Why the session stopped.
    pub reason: EndReason,
}

/// Per-connection orchestrator.
#[derive(Debug)]
pub struct StreamingSession {
    id: u64,
    engine: SignalEngine,
    store: ParameterStore,
    block_duration: Duration,
    params_tx: watch::Sender<SessionParams>,
}

impl StreamingSession {
    /// Create a session with default parameters.
    ///
    /// The server's `filter_cutoff` becomes the session's initial cutoff, so a
    /// client can still switch filtering off with `"filter_cutoff": null`.
    pub fn new(id: u64, config: &ServerConfig, backend: Arc<dyn ComputeBackend>) -> Result<Self> {
        let engine_config = EngineConfig {
            filter_cutoff: None,
            ..config.engine_config()
        };
        let engine = SignalEngine::new(engine_config, backend)?;
        let initial = SessionParams {
            tone: BeatParams {
                filter_cutoff: config.filter_cutoff,
                ..BeatParams::default()
            },
            focus_level: None,
        };
        let store = ParameterStore::with_params(engine_config.sample_rate, initial);
        let (params_tx, _) = watch::channel(store.snapshot());
        Ok(Self {
            id,
            engine,
            store,
            block_duration: engine_config.block_duration(),
            params_tx,
        })
    }

    /// Seed the focus noise source.
    pub fn with_modulation_seed(mut self, seed: u64) -> Self {
        self.engine = self.engine.with_modulation_seed(seed);
        self
    }

    /// Session identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Receiver that tracks the validated parameters.
    pub fn watch_parameters(&self) -> watch::Receiver<SessionParams> {
        self.params_tx.subscribe()
    }

    /// Stream blocks into `sink` while applying control messages from `inbound`.
    ///
    /// Returns when the sink fails. The end of `inbound` only stops control
    /// ingest; generation continues with the last parameters.
    pub async fn run<S, I>(self, sink: S, inbound: I) -> SessionSummary
    where
        S: Sink<Vec<u8>>,
        S::Error: fmt::Display,
        I: Stream<Item = String>,
    {
        let Self {
            id,
            mut engine,
            mut store,
            block_duration,
            params_tx,
        } = self;
        let mut params_rx = params_tx.subscribe();

        tracing::info!(
            session = id,
            backend = %engine.backend_kind(),
            block_size = engine.config().block_size,
            sample_rate = engine.config().sample_rate,
            "session started"
        );

        let mut applied = 0u64;
        let mut rejected = 0u64;
        let mut corrections = 0u64;
        let mut blocks_sent = 0u64;

        // futures borrow the counters; drop them before the summary reads them
        let reason = {
            let ingest = async {
                let mut inbound = pin!(inbound);
                while let Some(text) = inbound.next().await {
                    match store.apply_json(&text) {
                        Ok(fixed) => {
                            applied += 1;
                            corrections += fixed.len() as u64;
                            params_tx.send_replace(store.snapshot());
                            tracing::debug!(
                                session = id,
                                corrections = fixed.len(),
                                "control message applied"
                            );
                        }
                        Err(e) => {
                            rejected += 1;
                            tracing::warn!(session = id, error = %e, "dropping control message");
                        }
                    }
                }
                tracing::debug!(session = id, "control channel closed");
            };

            let generate = async {
                let mut sink = pin!(sink);
                let mut ticker = tokio::time::interval(block_duration);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    let snapshot = *params_rx.borrow_and_update();
                    let tone = engine.modulate(&snapshot.tone, snapshot.focus_level);
                    let frame = encode_block(&engine.generate(&tone));
                    if let Err(e) = sink.send(frame).await {
                        return EndReason::Disconnected(e.to_string());
                    }
                    blocks_sent += 1;
                }
            };

            let mut ingest = pin!(ingest);
            let mut generate = pin!(generate);
            let mut ingest_done = false;
            loop {
                tokio::select! {
                    () = &mut ingest, if !ingest_done => ingest_done = true,
                    reason = &mut generate => break reason,
                }
            }
        };

        let summary = SessionSummary {
            id,
            blocks_sent,
            messages_applied: applied,
            messages_rejected: rejected,
            corrections,
            reason,
        };
        tracing::info!(
            session = id,
            blocks_sent = summary.blocks_sent,
            messages_applied = summary.messages_applied,
            messages_rejected = summary.messages_rejected,
            reason = %summary.reason,
            "session ended"
        );
        summary
    }
}
