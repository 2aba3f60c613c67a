//! Dual execution adapter — runs a generated snippet against the reference
//! and candidate evaluator builds.
//!
//! # Architecture
//!
//! One synchronous child process per execution.  The snippet plus the
//! dialect's halt command is fed on stdin; stdout carries the single
//! evaluation result and stderr is captured for observability only.  No
//! timeout is imposed: an evaluator that never returns wedges the whole
//! harness (documented failure mode, not mitigated).

use std::io::Write as _;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ops::OperatorId;
use crate::{HarnessError, HarnessResult};

// ── Build identity ─────────────────────────────────────────────────────

/// Which of the two evaluator builds to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildKind {
    /// The trusted oracle build.
    Reference,
    /// The build under test.
    Candidate,
}

impl BuildKind {
    /// Diagnostic label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::Candidate => "candidate",
        }
    }
}

// ── Execution output ───────────────────────────────────────────────────

/// Raw captured result of one evaluator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Decoded standard output.
    pub stdout: String,
    /// Decoded standard error.  Captured but never inspected for control
    /// flow.
    pub stderr: String,
    /// Process exit code (-1 when terminated by signal).
    pub exit_code: i32,
}

impl ExecOutput {
    /// Whether the process exited zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

// ── DualExecutor trait ─────────────────────────────────────────────────

/// Trait abstracting over evaluator execution, so the comparator can be
/// driven by a scripted double in tests.
pub trait DualExecutor {
    /// Run `text` (plus the dialect halt command) against the given build,
    /// blocking until it exits.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Spawn` if the evaluator cannot be started and
    /// `HarnessError::Io` on pipe failures.
    fn execute(&self, build: BuildKind, op: OperatorId, text: &str) -> HarnessResult<ExecOutput>;
}

// ── Process-backed implementation ──────────────────────────────────────

/// Configuration for the process-backed executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Directory holding the candidate `bc` and `dc` builds.
    pub candidate_dir: PathBuf,
    /// Directory holding the reference builds; `None` resolves bare program
    /// names through `PATH`.
    pub reference_dir: Option<PathBuf>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            candidate_dir: PathBuf::from("."),
            reference_dir: None,
        }
    }
}

/// Executes snippets against real evaluator processes.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    config: ExecutorConfig,
}

impl ProcessExecutor {
    /// Create an executor with the given configuration.
    #[must_use]
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    /// Resolve the program path for one build of the operator's dialect.
    fn program_path(&self, build: BuildKind, op: OperatorId) -> PathBuf {
        let program = op.descriptor().dialect.program();
        match build {
            BuildKind::Candidate => self.config.candidate_dir.join(program),
            BuildKind::Reference => self
                .config
                .reference_dir
                .as_ref()
                .map_or_else(|| PathBuf::from(program), |dir| dir.join(program)),
        }
    }
}

impl DualExecutor for ProcessExecutor {
    fn execute(&self, build: BuildKind, op: OperatorId, text: &str) -> HarnessResult<ExecOutput> {
        let dialect = op.descriptor().dialect;
        let program = self.program_path(build, op);

        let mut child = Command::new(&program)
            .args(dialect.options())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HarnessError::Spawn {
                program: program.to_string_lossy().into_owned(),
                source,
            })?;

        let input = format!("{text}\n{}\n", dialect.halt());
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        let result = ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        };

        debug!(
            build = build.label(),
            program = %program.display(),
            exit_code = result.exit_code,
            "evaluator run complete"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_resolves_into_candidate_dir() {
        let exec = ProcessExecutor::new(ExecutorConfig {
            candidate_dir: PathBuf::from("/builds/new"),
            reference_dir: None,
        });
        assert_eq!(
            exec.program_path(BuildKind::Candidate, OperatorId::Add),
            PathBuf::from("/builds/new/bc")
        );
        assert_eq!(
            exec.program_path(BuildKind::Candidate, OperatorId::Modexp),
            PathBuf::from("/builds/new/dc")
        );
    }

    #[test]
    fn reference_defaults_to_bare_program_name() {
        let exec = ProcessExecutor::new(ExecutorConfig::default());
        assert_eq!(
            exec.program_path(BuildKind::Reference, OperatorId::Sine),
            PathBuf::from("bc")
        );

        let exec = ProcessExecutor::new(ExecutorConfig {
            candidate_dir: PathBuf::from("."),
            reference_dir: Some(PathBuf::from("/builds/old")),
        });
        assert_eq!(
            exec.program_path(BuildKind::Reference, OperatorId::Modexp),
            PathBuf::from("/builds/old/dc")
        );
    }

    #[cfg(unix)]
    mod unix {
        use std::fs;
        use std::os::unix::fs::PermissionsExt as _;
        use std::path::Path;

        use super::*;

        fn write_script(dir: &Path, name: &str, body: &str) {
            let path = dir.join(name);
            fs::write(&path, body).unwrap();
            let mut perms = fs::metadata(&path).unwrap().permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&path, perms).unwrap();
        }

        #[test]
        fn execute_feeds_text_and_halt_on_stdin() {
            let dir = tempfile::tempdir().unwrap();
            // A stand-in evaluator that echoes its stdin back.
            write_script(dir.path(), "bc", "#!/bin/sh\ncat\n");

            let exec = ProcessExecutor::new(ExecutorConfig {
                candidate_dir: dir.path().to_path_buf(),
                reference_dir: None,
            });
            let out = exec
                .execute(BuildKind::Candidate, OperatorId::Add, "scale = 5; 2 + 2")
                .unwrap();
            assert_eq!(out.exit_code, 0);
            assert_eq!(out.stdout, "scale = 5; 2 + 2\nhalt\n");
        }

        #[test]
        fn execute_captures_nonzero_exit_and_stderr() {
            let dir = tempfile::tempdir().unwrap();
            write_script(dir.path(), "dc", "#!/bin/sh\necho boom >&2\nexit 3\n");

            let exec = ProcessExecutor::new(ExecutorConfig {
                candidate_dir: dir.path().to_path_buf(),
                reference_dir: None,
            });
            let out = exec
                .execute(BuildKind::Candidate, OperatorId::Modexp, "5k 2 8 7|pR")
                .unwrap();
            assert_eq!(out.exit_code, 3);
            assert!(out.stdout.is_empty());
            assert_eq!(out.stderr, "boom\n");
        }

        #[test]
        fn missing_program_reports_spawn_error() {
            let dir = tempfile::tempdir().unwrap();
            let exec = ProcessExecutor::new(ExecutorConfig {
                candidate_dir: dir.path().to_path_buf(),
                reference_dir: None,
            });
            let err = exec
                .execute(BuildKind::Candidate, OperatorId::Add, "1 + 1")
                .unwrap_err();
            assert!(matches!(err, HarnessError::Spawn { .. }), "{err}");
        }
    }
}
