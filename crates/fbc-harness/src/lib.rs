//! Differential random-expression testing harness for FrankenBC.
//!
//! This crate provides the infrastructure for:
//! - **Workload generation**: deterministic, seeded random expression synthesis
//! - **Dual execution**: running each expression against a reference and a
//!   candidate build of the calculator
//! - **Oracle comparison**: match/mismatch classification with a
//!   precision-tolerance retry for transcendental functions
//! - **Regression checklist**: a crash-safe, run-scoped log of failing inputs
//!   with an interactive triage pass
//!
//! The harness is fully sequential: one trial's reference run, candidate run,
//! and comparison complete before the next trial's generation begins.

pub mod checklist;
pub mod comparison;
pub mod driver;
pub mod executor;
pub mod ops;
pub mod workload;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ─── Deterministic seed constants ───────────────────────────────────────

/// Canonical default seed for harness sessions.
///
/// The value is "RANDMATH" as ASCII bytes: a memorable, project-specific
/// default that is unlikely to collide with common test seeds like 0, 1,
/// or 42.
///
/// ## Reproducibility contract
///
/// Given an identical seed, RNG algorithm (StdRng/ChaCha12), and rand crate
/// version (0.8.x), a session MUST produce the identical sequence of
/// generated tests, and therefore discover regressions in the same order.
pub const RANDMATH_SEED: u64 = 0x5241_4E44_4D41_5448; // "RANDMATH" as ASCII bytes

// ─── Configuration ──────────────────────────────────────────────────────

/// Harness-wide configuration shared by the executor, the checklist, and the
/// workload generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Directory holding the candidate `bc` and `dc` builds under test.
    pub candidate_dir: PathBuf,
    /// Directory holding the reference builds.  `None` resolves bare
    /// program names through `PATH`.
    pub reference_dir: Option<PathBuf>,
    /// Directory holding the two checklist backing stores.
    pub checklist_dir: PathBuf,
    /// Master seed for the workload generator.
    pub seed: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            candidate_dir: PathBuf::from("."),
            reference_dir: None,
            checklist_dir: PathBuf::from("."),
            seed: RANDMATH_SEED,
        }
    }
}

/// Result type alias used throughout the harness.
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors that can arise during a harness run.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// An I/O error from the filesystem.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// An evaluator process could not be spawned.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The two checklist backing stores have desynchronized line counts.
    /// Pairing misaligned entries would silently mis-record regressions,
    /// so this aborts the run.
    #[error("corrupted checklist: {text_lines} test lines vs {op_lines} operator lines")]
    ChecklistCorrupted { text_lines: usize, op_lines: usize },

    /// An operator ordinal read back from the checklist store does not name
    /// a known operator.
    #[error("invalid operator ordinal in checklist: {raw:?}")]
    InvalidOperator { raw: String },
}
