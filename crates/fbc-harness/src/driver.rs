//! Driver loop — generation phase, then interactive triage.
//!
//! The driver is the only stateful coordinator: it owns the workload
//! generator, the execution adapter, and the checklist lifecycle
//! (create-empty, append via the comparator, delete).  Generation runs until
//! an external stop flag is raised, observed only at the trial boundary so no
//! trial is ever left half-recorded.  Triage then replays every checklist
//! entry with recording disabled and prompts for a keep/discard decision.

use std::io::{self, BufRead, Write as _};
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tracing::info;

use crate::checklist::Checklist;
use crate::comparison::{OracleComparator, TrialOutcome};
use crate::executor::DualExecutor;
use crate::workload::{GeneratedTest, WorkloadGenerator};
use crate::{HarnessConfig, HarnessResult};

// ── Run summary ────────────────────────────────────────────────────────

/// Per-outcome counters for one generation phase.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunSummary {
    /// Trials completed.
    pub trials: u64,
    /// Byte-identical outputs.
    pub matches: u64,
    /// Disagreements that survived the tolerance retry.
    pub confirmed_mismatches: u64,
    /// Disagreements explained by reference-side precision limits.
    pub tolerable_rounding: u64,
    /// Trials discarded because the reference gave no ground truth.
    pub oracle_unavailable: u64,
    /// Candidate crashes where the reference succeeded.
    pub candidate_failures: u64,
}

impl RunSummary {
    fn record(&mut self, outcome: TrialOutcome) {
        self.trials += 1;
        match outcome {
            TrialOutcome::Match => self.matches += 1,
            TrialOutcome::ConfirmedMismatch => self.confirmed_mismatches += 1,
            TrialOutcome::TolerableRoundingDifference => self.tolerable_rounding += 1,
            TrialOutcome::OracleUnavailable => self.oracle_unavailable += 1,
            TrialOutcome::CandidateFailed => self.candidate_failures += 1,
        }
    }

    /// Regressions recorded to the checklist this run.
    #[must_use]
    pub const fn recorded(&self) -> u64 {
        self.confirmed_mismatches + self.candidate_failures
    }
}

// ── Driver ─────────────────────────────────────────────────────────────

/// Orchestrates the two sequential phases over one execution adapter.
pub struct Driver<E: DualExecutor> {
    executor: E,
    workload: WorkloadGenerator,
    checklist: Checklist,
}

impl<E: DualExecutor> Driver<E> {
    /// Build a driver from harness configuration and an execution adapter.
    #[must_use]
    pub fn new(config: &HarnessConfig, executor: E) -> Self {
        Self {
            executor,
            workload: WorkloadGenerator::new(config.seed),
            checklist: Checklist::new(&config.checklist_dir),
        }
    }

    /// Run a complete session: reset the checklist, generate until `stop`
    /// is raised, triage interactively over stdin, reset again.
    ///
    /// # Errors
    ///
    /// Propagates executor failures, checklist I/O failures, and checklist
    /// corruption (the latter is fatal by design).
    pub fn run(&mut self, stop: &AtomicBool) -> HarnessResult<RunSummary> {
        self.checklist.reset()?;
        let summary = self.generate_until_stopped(stop)?;
        let stdin = io::stdin();
        self.triage(&mut stdin.lock())?;
        self.checklist.reset()?;
        Ok(summary)
    }

    /// Generation phase: synthesize, execute, and judge trials until the
    /// stop flag is observed at a trial boundary.
    ///
    /// # Errors
    ///
    /// Propagates executor and checklist failures.
    pub fn generate_until_stopped(&mut self, stop: &AtomicBool) -> HarnessResult<RunSummary> {
        let comparator = OracleComparator::new(&self.executor);
        let mut summary = RunSummary::default();

        while !stop.load(Ordering::SeqCst) {
            let test = self.workload.next_trial();
            println!("Test {}: {}", summary.trials, test.text);
            let outcome = comparator.run_trial(&test, &self.checklist, true)?;
            summary.record(outcome);
        }

        info!(
            trials = summary.trials,
            recorded = summary.recorded(),
            "generation phase stopped"
        );
        Ok(summary)
    }

    /// Triage phase: replay every checklist entry with recording disabled
    /// and prompt for a keep/discard decision on `input`.
    ///
    /// Display-only: a "keep" answer acknowledges the reproduction but
    /// persists nothing beyond the run-scoped stores; accepted regressions
    /// are copied into a permanent suite by hand.
    ///
    /// # Errors
    ///
    /// Propagates executor failures, prompt I/O failures, and checklist
    /// corruption.
    pub fn triage(&mut self, input: &mut dyn BufRead) -> HarnessResult<()> {
        let entries = self.checklist.load_all()?;
        if entries.is_empty() {
            println!("\nNo items in checklist.");
            return Ok(());
        }

        println!("\nGoing through the checklist...");
        let comparator = OracleComparator::new(&self.executor);

        for entry in entries {
            println!("\n{}", entry.text);
            let test = GeneratedTest {
                text: entry.text,
                op: entry.op,
            };
            comparator.run_trial(&test, &self.checklist, false)?;

            print!("\nAdd test to test suite? [y/N]: ");
            io::stdout().flush()?;
            let mut answer = String::new();
            input.read_line(&mut answer)?;
            if answer.contains(['y', 'Y']) {
                println!("Yes");
            } else {
                println!("No");
            }
        }

        Ok(())
    }
}
