//! Run-scoped, crash-safe regression checklist.
//!
//! Two parallel append-only line stores in a fixed directory: `.math.txt`
//! holds raw expression text, `.ops.txt` holds the matching operator ordinal.
//! Line `i` of one pairs with line `i` of the other; a length mismatch means
//! the stores desynchronized and is fatal.
//!
//! Every append opens, writes one line, and closes before returning, so an
//! entry is durable before the next trial begins.  The driver deletes both
//! stores at process start and at clean process end, which makes the
//! checklist run-scoped: it never accumulates across invocations.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::ops::OperatorId;
use crate::{HarnessError, HarnessResult};

/// File name of the expression-text store.
pub const MATH_STORE: &str = ".math.txt";
/// File name of the operator-ordinal store.
pub const OPS_STORE: &str = ".ops.txt";

/// One persisted regression: the failing input and the operator that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecklistEntry {
    /// The expression text, exactly as generated (single line).
    pub text: String,
    /// The operator whose trial failed.
    pub op: OperatorId,
}

/// Handle to the two backing stores.
#[derive(Debug, Clone)]
pub struct Checklist {
    math_path: PathBuf,
    ops_path: PathBuf,
}

impl Checklist {
    /// Address the checklist stores inside `dir`.
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self {
            math_path: dir.join(MATH_STORE),
            ops_path: dir.join(OPS_STORE),
        }
    }

    /// Delete both backing stores.  Idempotent; missing files are not
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Io` for any failure other than the file being
    /// absent.
    pub fn reset(&self) -> HarnessResult<()> {
        for path in [&self.math_path, &self.ops_path] {
            match fs::remove_file(path) {
                Ok(()) => debug!(path = %path.display(), "checklist store removed"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Append one entry, one line per store, durable before returning.
    ///
    /// `text` must be a single line; generated tests always are.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::Io` if either store cannot be written.
    pub fn append(&self, text: &str, op: OperatorId) -> HarnessResult<()> {
        append_line(&self.math_path, text)?;
        append_line(&self.ops_path, &op.ordinal().to_string())?;
        debug!(op = op.descriptor().name, "checklist entry appended");
        Ok(())
    }

    /// Read back every entry in append order.
    ///
    /// # Errors
    ///
    /// Returns `HarnessError::ChecklistCorrupted` when the two stores have
    /// differing line counts, `HarnessError::InvalidOperator` when an
    /// ordinal line does not name a known operator, and `HarnessError::Io`
    /// on read failures.
    pub fn load_all(&self) -> HarnessResult<Vec<ChecklistEntry>> {
        let texts = read_lines(&self.math_path)?;
        let ordinals = read_lines(&self.ops_path)?;

        if texts.len() != ordinals.len() {
            return Err(HarnessError::ChecklistCorrupted {
                text_lines: texts.len(),
                op_lines: ordinals.len(),
            });
        }

        texts
            .into_iter()
            .zip(ordinals)
            .map(|(text, raw)| {
                let op = raw
                    .trim()
                    .parse::<u8>()
                    .ok()
                    .and_then(OperatorId::from_ordinal)
                    .ok_or(HarnessError::InvalidOperator { raw })?;
                Ok(ChecklistEntry { text, op })
            })
            .collect()
    }
}

/// Open in append mode, write one line, close.
fn append_line(path: &Path, line: &str) -> HarnessResult<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Read all lines; a missing store reads as empty.
fn read_lines(path: &Path) -> HarnessResult<Vec<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content.lines().map(str::to_owned).collect()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}
