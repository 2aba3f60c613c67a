//! Oracle comparator — classifies one trial by differential comparison.
//!
//! The reference build is the oracle: if it fails or prints nothing there is
//! no ground truth and the trial is discarded without judgement.  Otherwise
//! the candidate's output is compared byte-for-byte, with one raised-scale
//! retry for transcendental operators whose mismatch may stem from precision
//! limits in the reference rather than a defect in the candidate.
//!
//! Every non-match outcome prints a human-readable diagnostic; the prints
//! are observability only and never drive control flow.

use tracing::debug;

use crate::checklist::Checklist;
use crate::executor::{BuildKind, DualExecutor, ExecOutput};
use crate::workload::GeneratedTest;
use crate::HarnessResult;

/// Extra decimal digits requested from the reference during the
/// precision-tolerance retry, and the number of trailing characters dropped
/// from its output afterwards.
const EXTRA_PRECISION_DIGITS: usize = 10;

// ── Trial outcome ──────────────────────────────────────────────────────

/// Classification of a single trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialOutcome {
    /// Outputs agreed byte-for-byte.
    Match,
    /// Both builds succeeded but disagree, after the tolerance retry where
    /// eligible.  Recordable regression.
    ConfirmedMismatch,
    /// The disagreement is fully explained by the reference's precision
    /// limits at the original scale.  Reported but not recorded.
    TolerableRoundingDifference,
    /// The reference crashed or produced no output: no ground truth, trial
    /// discarded without judgement.
    OracleUnavailable,
    /// The candidate returned nonzero where the reference succeeded.
    /// Recordable regression.
    CandidateFailed,
}

// ── Comparator ─────────────────────────────────────────────────────────

/// Runs one trial through both builds and classifies the result.
pub struct OracleComparator<'a, E: DualExecutor> {
    executor: &'a E,
}

impl<'a, E: DualExecutor> OracleComparator<'a, E> {
    /// Create a comparator over the given execution adapter.
    #[must_use]
    pub fn new(executor: &'a E) -> Self {
        Self { executor }
    }

    /// Execute `test` against both builds and classify the outcome.
    ///
    /// When `record` is set, `ConfirmedMismatch` and `CandidateFailed`
    /// append the test to the checklist before returning.
    ///
    /// # Errors
    ///
    /// Propagates executor and checklist I/O failures; classification
    /// itself never errors.
    pub fn run_trial(
        &self,
        test: &GeneratedTest,
        checklist: &Checklist,
        record: bool,
    ) -> HarnessResult<TrialOutcome> {
        let program = test.op.descriptor().dialect.program();

        let reference = self
            .executor
            .execute(BuildKind::Reference, test.op, &test.text)?;
        if !reference.success() || reference.stdout.is_empty() {
            if reference.success() {
                println!("    reference {program} produced no output; continuing...");
            } else {
                println!(
                    "    reference {program} returned an error ({}); continuing...",
                    reference.exit_code
                );
            }
            return Ok(TrialOutcome::OracleUnavailable);
        }

        let candidate = self
            .executor
            .execute(BuildKind::Candidate, test.op, &test.text)?;
        if !candidate.success() {
            println!(
                "    candidate {program} returned an error ({})",
                candidate.exit_code
            );
            if record {
                println!("    adding {} to checklist...", test.text);
                checklist.append(&test.text, test.op)?;
            }
            return Ok(TrialOutcome::CandidateFailed);
        }

        if candidate.stdout == reference.stdout {
            return Ok(TrialOutcome::Match);
        }

        let mut expected = reference.stdout.clone();
        if test.op.descriptor().is_tolerance_eligible() {
            let adjusted = self.rerun_at_raised_scale(test)?;
            if candidate.stdout == adjusted {
                println!("    failed because of a rounding bug in the reference {program}");
                println!("    continuing...");
                return Ok(TrialOutcome::TolerableRoundingDifference);
            }
            expected = adjusted;
        }

        report_mismatch(test, &expected, &candidate);
        if record {
            println!("    adding to checklist...");
            checklist.append(&test.text, test.op)?;
        }
        Ok(TrialOutcome::ConfirmedMismatch)
    }

    /// Re-run both builds with ten extra digits of scale and return the
    /// reference's output with the extra precision characters dropped.
    fn rerun_at_raised_scale(&self, test: &GeneratedTest) -> HarnessResult<String> {
        let retry_text = format!("scale += 10; {}", test.text);
        let reference = self
            .executor
            .execute(BuildKind::Reference, test.op, &retry_text)?;
        let candidate = self
            .executor
            .execute(BuildKind::Candidate, test.op, &retry_text)?;
        debug!(
            reference = %reference.stdout,
            candidate = %candidate.stdout,
            "raised-scale retry outputs"
        );
        Ok(drop_trailing_chars(&reference.stdout, EXTRA_PRECISION_DIGITS).to_owned())
    }
}

/// Print the expected/actual diagnostic for a confirmed mismatch.
fn report_mismatch(test: &GeneratedTest, expected: &str, candidate: &ExecOutput) {
    println!("    failed {} ({})", test.text, test.op.descriptor().name);
    println!("    expected:");
    println!("        {}", expected.trim_end_matches('\n'));
    println!("    actual:");
    println!("        {}", candidate.stdout.trim_end_matches('\n'));
}

/// Drop the last `n` characters; shorter inputs collapse to the empty
/// string.
fn drop_trailing_chars(s: &str, n: usize) -> &str {
    let keep = s.chars().count().saturating_sub(n);
    match s.char_indices().nth(keep) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
