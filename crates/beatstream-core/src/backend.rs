//! Pluggable compute backend abstraction.
//!
//! The signal engine never touches sample arrays directly. Every vector
//! operation it needs (index ramps, trig, elementwise arithmetic, host
//! transfer) goes through the [`ComputeBackend`] trait, so the sequential and
//! the accelerated paths are interchangeable without conditional logic in the
//! engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │          SignalEngine            │
//! └──────────────┬───────────────────┘
//!                │ uses Arc<dyn ComputeBackend>
//!                ▼
//! ┌──────────────────────────────────┐
//! │       ComputeBackend trait       │
//! │  arange / affine / map / mean    │
//! └──────────────┬───────────────────┘
//!                │ implemented by
//!        ┌───────┴────────────┐
//!        ▼                    ▼
//! ┌─────────────┐  ┌────────────────────┐
//! │ CpuBackend  │  │ AcceleratedBackend │
//! │ (ndarray)   │  │ (ndarray + rayon)  │
//! └─────────────┘  └────────────────────┘
//! ```
//!
//! ## Selection
//!
//! [`select`] tries the accelerated path only when asked to. Initialization
//! builds a dedicated worker pool and runs one trivial verification operation
//! inside it; any failure is logged once and the CPU backend is returned
//! instead. The returned handle is fixed for the lifetime of every engine that
//! holds it.

use core::fmt;
use core::str::FromStr;
use ndarray::{Array1, Zip};
use std::sync::{Arc, OnceLock};

use crate::math::signum_zero;

/// Which execution path a backend runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Sequential vectorised CPU path.
    Cpu,
    /// Data-parallel path on a dedicated worker pool.
    Accelerated,
}

impl BackendKind {
    /// Returns a short lowercase name for logs and reports.
    pub const fn name(&self) -> &'static str {
        match self {
            BackendKind::Cpu => "cpu",
            BackendKind::Accelerated => "accelerated",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Requested backend, as read from configuration or the command line.
///
/// Accepts `"cpu"`, `"accelerated"` and `"gpu"` (alias of accelerated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum BackendPreference {
    /// Always use the CPU backend.
    Cpu,
    /// Try the accelerated backend, fall back to CPU if it cannot start.
    #[default]
    #[cfg_attr(feature = "serde", serde(alias = "gpu"))]
    Accelerated,
}

impl FromStr for BackendPreference {
    type Err = BackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(BackendPreference::Cpu),
            "accelerated" | "gpu" => Ok(BackendPreference::Accelerated),
            other => Err(BackendError::UnknownPreference(other.to_string())),
        }
    }
}

/// Errors raised while bringing up a backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The worker pool could not be created.
    #[error("failed to build accelerated worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),

    /// The pool started but the verification operation returned garbage.
    #[error("accelerated backend failed its verification operation")]
    Verification,

    /// Unrecognised backend name.
    #[error("unknown backend '{0}' (expected cpu or accelerated)")]
    UnknownPreference(String),
}

/// Elementwise unary operation understood by every backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    /// `sin(x)`
    Sin,
    /// `asin(x)`, input clamped to `[-1, 1]`
    Arcsin,
    /// `sign(x)` with `sign(0) == 0`
    Sign,
    /// `x * k`
    Scale(f64),
    /// `x + k`
    Offset(f64),
    /// Floored remainder `x mod m`, always in `[0, m)`
    RemEuclid(f64),
}

impl UnaryOp {
    /// Apply the operation to one value.
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            UnaryOp::Sin => x.sin(),
            UnaryOp::Arcsin => x.clamp(-1.0, 1.0).asin(),
            UnaryOp::Sign => signum_zero(x),
            UnaryOp::Scale(k) => x * k,
            UnaryOp::Offset(k) => x + k,
            UnaryOp::RemEuclid(m) => x.rem_euclid(m),
        }
    }
}

/// Numeric-array capability set used by the signal engine.
///
/// Arrays live in the backend's representation (`Array1<f64>`). The filter
/// stage needs plain host memory, which is what [`download`](Self::download)
/// and [`upload`](Self::upload) are for.
///
/// ## Object Safety
///
/// This trait is object-safe; engines hold an `Arc<dyn ComputeBackend>` chosen
/// once at construction.
pub trait ComputeBackend: Send + Sync + fmt::Debug {
    /// The execution path this backend runs on.
    fn kind(&self) -> BackendKind;

    /// Ascending index vector `[0, 1, ..., len - 1]`.
    fn arange(&self, len: usize) -> Array1<f64>;

    /// In place `x = offset + scale * x`.
    fn affine(&self, x: &mut Array1<f64>, scale: f64, offset: f64);

    /// In place elementwise `x = op(x)`.
    fn map(&self, x: &mut Array1<f64>, op: UnaryOp);

    /// In place `a = (a + b) / 2`. Both arrays must have the same length.
    fn mean_into(&self, a: &mut Array1<f64>, b: &Array1<f64>);

    /// Copy an array out to host memory.
    fn download(&self, x: &Array1<f64>) -> Vec<f64> {
        x.to_vec()
    }

    /// Move host memory into the backend's representation.
    fn upload(&self, host: Vec<f64>) -> Array1<f64> {
        Array1::from_vec(host)
    }

    /// Narrow to `f32` host samples.
    fn to_f32(&self, x: &Array1<f64>) -> Vec<f32> {
        x.iter().map(|&v| v as f32).collect()
    }
}

/// Sequential backend built on `ndarray`'s vectorised loops.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl CpuBackend {
    /// Create the CPU backend. Never fails.
    pub fn new() -> Self {
        Self
    }
}

impl ComputeBackend for CpuBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Cpu
    }

    fn arange(&self, len: usize) -> Array1<f64> {
        Array1::from_shape_fn(len, |i| i as f64)
    }

    fn affine(&self, x: &mut Array1<f64>, scale: f64, offset: f64) {
        x.mapv_inplace(|v| offset + scale * v);
    }

    fn map(&self, x: &mut Array1<f64>, op: UnaryOp) {
        x.mapv_inplace(|v| op.apply(v));
    }

    fn mean_into(&self, a: &mut Array1<f64>, b: &Array1<f64>) {
        Zip::from(a).and(b).for_each(|a, &b| *a = (*a + b) * 0.5);
    }
}

/// Data-parallel backend running every operation on a dedicated rayon pool.
pub struct AcceleratedBackend {
    pool: rayon::ThreadPool,
}

impl AcceleratedBackend {
    /// Build the worker pool and verify it with one trivial operation.
    pub fn new() -> Result<Self, BackendError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("beatstream-accel-{i}"))
            .build()?;

        let verified = pool.install(|| {
            let mut probe = Array1::<f64>::ones(1);
            probe.par_mapv_inplace(|_| 0.0);
            probe[0] == 0.0
        });
        if !verified {
            return Err(BackendError::Verification);
        }

        Ok(Self { pool })
    }

    /// Number of worker threads in the pool.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl fmt::Debug for AcceleratedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcceleratedBackend")
            .field("threads", &self.threads())
            .finish()
    }
}

impl ComputeBackend for AcceleratedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Accelerated
    }

    fn arange(&self, len: usize) -> Array1<f64> {
        let mut out = Array1::<f64>::zeros(len);
        self.pool.install(|| {
            Zip::indexed(&mut out).par_for_each(|i, v| *v = i as f64);
        });
        out
    }

    fn affine(&self, x: &mut Array1<f64>, scale: f64, offset: f64) {
        self.pool
            .install(|| x.par_mapv_inplace(move |v| offset + scale * v));
    }

    fn map(&self, x: &mut Array1<f64>, op: UnaryOp) {
        self.pool.install(|| x.par_mapv_inplace(move |v| op.apply(v)));
    }

    fn mean_into(&self, a: &mut Array1<f64>, b: &Array1<f64>) {
        self.pool.install(|| {
            Zip::from(a)
                .and(b)
                .par_for_each(|a, &b| *a = (*a + b) * 0.5);
        });
    }
}

/// Select a backend for `preferred`, falling back to CPU on any failure.
///
/// The fallback is logged once per call with `tracing::warn!`.
pub fn select(preferred: BackendPreference) -> Arc<dyn ComputeBackend> {
    select_with(preferred, || {
        AcceleratedBackend::new().map(|b| Arc::new(b) as Arc<dyn ComputeBackend>)
    })
}

/// Like [`select`], with a caller-supplied accelerated initializer.
///
/// The initializer runs only when `preferred` is
/// [`BackendPreference::Accelerated`].
pub fn select_with<F>(preferred: BackendPreference, init_accelerated: F) -> Arc<dyn ComputeBackend>
where
    F: FnOnce() -> Result<Arc<dyn ComputeBackend>, BackendError>,
{
    match preferred {
        BackendPreference::Cpu => {
            tracing::info!(backend = "cpu", "compute backend selected");
            Arc::new(CpuBackend::new())
        }
        BackendPreference::Accelerated => match init_accelerated() {
            Ok(backend) => {
                tracing::info!(backend = %backend.kind(), "compute backend selected");
                backend
            }
            Err(e) => {
                tracing::warn!(error = %e, "accelerated backend unavailable, falling back to cpu");
                Arc::new(CpuBackend::new())
            }
        },
    }
}

/// Process-wide backend capability report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCapabilities {
    /// Hardware threads reported by the operating system.
    pub available_threads: usize,
    /// Worker threads in the accelerated pool, `None` if it failed to start.
    pub accelerated_threads: Option<usize>,
    /// Why the accelerated backend is unavailable, if it is.
    pub accelerated_error: Option<String>,
}

impl BackendCapabilities {
    /// Whether the accelerated backend initialized successfully.
    pub fn accelerated_available(&self) -> bool {
        self.accelerated_threads.is_some()
    }
}

/// Detect backend capabilities once per process.
///
/// The first call probes the accelerated path; later calls return the cached
/// report.
pub fn detect_capabilities() -> &'static BackendCapabilities {
    static CAPABILITIES: OnceLock<BackendCapabilities> = OnceLock::new();
    CAPABILITIES.get_or_init(|| {
        let available_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let (accelerated_threads, accelerated_error) = match AcceleratedBackend::new() {
            Ok(backend) => (Some(backend.threads()), None),
            Err(e) => (None, Some(e.to_string())),
        };
        tracing::debug!(
            available_threads,
            accelerated = accelerated_threads.is_some(),
            "backend capabilities detected"
        );
        BackendCapabilities {
            available_threads,
            accelerated_threads,
            accelerated_error,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backends() -> Vec<Arc<dyn ComputeBackend>> {
        vec![
            Arc::new(CpuBackend::new()),
            Arc::new(AcceleratedBackend::new().unwrap()),
        ]
    }

    #[test]
    fn arange_is_ascending() {
        for b in backends() {
            let idx = b.arange(5);
            assert_eq!(idx.to_vec(), vec![0.0, 1.0, 2.0, 3.0, 4.0], "{:?}", b.kind());
        }
    }

    #[test]
    fn affine_and_map_agree_across_backends() {
        let cpu = CpuBackend::new();
        let accel = AcceleratedBackend::new().unwrap();

        let mut a = cpu.arange(4096);
        let mut b = accel.arange(4096);
        cpu.affine(&mut a, 0.01, 0.5);
        accel.affine(&mut b, 0.01, 0.5);
        cpu.map(&mut a, UnaryOp::Sin);
        accel.map(&mut b, UnaryOp::Sin);

        assert_eq!(a, b);
    }

    #[test]
    fn mean_into_averages() {
        for be in backends() {
            let mut a = Array1::from_vec(vec![1.0, 2.0, -1.0]);
            let b = Array1::from_vec(vec![3.0, 0.0, 1.0]);
            be.mean_into(&mut a, &b);
            assert_eq!(a.to_vec(), vec![2.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn sign_op_maps_zero_to_zero() {
        assert_eq!(UnaryOp::Sign.apply(0.0), 0.0);
        assert_eq!(UnaryOp::Sign.apply(2.0), 1.0);
        assert_eq!(UnaryOp::Sign.apply(-2.0), -1.0);
    }

    #[test]
    fn rem_euclid_op_is_floored() {
        assert!((UnaryOp::RemEuclid(2.0).apply(-0.5) - 1.5).abs() < 1e-12);
        assert!((UnaryOp::RemEuclid(2.0).apply(5.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn host_transfer_preserves_values() {
        for be in backends() {
            let x = be.arange(3);
            let host = be.download(&x);
            assert_eq!(host, vec![0.0, 1.0, 2.0]);
            assert_eq!(be.upload(host), x);
            assert_eq!(be.to_f32(&x), vec![0.0f32, 1.0, 2.0]);
        }
    }

    #[test]
    fn cpu_preference_never_calls_initializer() {
        let backend = select_with(BackendPreference::Cpu, || {
            panic!("initializer must not run for cpu preference")
        });
        assert_eq!(backend.kind(), BackendKind::Cpu);
    }

    #[test]
    fn failed_initialization_falls_back_to_cpu() {
        let backend = select_with(BackendPreference::Accelerated, || {
            Err(BackendError::Verification)
        });
        assert_eq!(backend.kind(), BackendKind::Cpu);
    }

    #[test]
    fn accelerated_selection_succeeds_on_host() {
        let backend = select(BackendPreference::Accelerated);
        assert_eq!(backend.kind(), BackendKind::Accelerated);
    }

    #[test]
    fn preference_parses_aliases() {
        assert_eq!("cpu".parse::<BackendPreference>().unwrap(), BackendPreference::Cpu);
        assert_eq!("GPU".parse::<BackendPreference>().unwrap(), BackendPreference::Accelerated);
        assert_eq!(
            "accelerated".parse::<BackendPreference>().unwrap(),
            BackendPreference::Accelerated
        );
        assert!("tpu".parse::<BackendPreference>().is_err());
    }

    #[test]
    fn capabilities_are_cached() {
        let a = detect_capabilities();
        let b = detect_capabilities();
        assert!(std::ptr::eq(a, b));
        assert!(a.available_threads >= 1);
        assert_eq!(a.accelerated_available(), a.accelerated_error.is_none());
    }
}
