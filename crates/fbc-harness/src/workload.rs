//! Deterministic random-expression generation with seeded RNG.
//!
//! This module is deliberately **pure computation** (no I/O, no subprocesses)
//! so it can be exercised in unit tests without the evaluator builds.  All
//! randomness flows through one explicit `StdRng` owned by the generator; a
//! whole session replays from a single `u64` seed.

use num_bigint::{BigUint, RandBigInt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ops::{OperandFlags, OperatorId, SCALE_FLAGS};

/// Bit width of the fractional-suffix magnitude draw (25 bytes, roughly 60
/// decimal digits before zero-padding).
const FRACTION_MAGNITUDE_BITS: u64 = 200;

/// A synthesized trial input: the assembled expression text plus the operator
/// that produced it.  Consumed immediately by execution; only retained when
/// it becomes a checklist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTest {
    /// Complete expression-language snippet, e.g. `"scale = 12; 3.14 ^ 9"`.
    pub text: String,
    /// The operator the snippet exercises.
    pub op: OperatorId,
}

/// Seeded random-expression generator.
#[derive(Debug)]
pub struct WorkloadGenerator {
    rng: StdRng,
}

impl WorkloadGenerator {
    /// Create a generator from a master seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Pick a uniformly random operator and synthesize a trial for it.
    pub fn next_trial(&mut self) -> GeneratedTest {
        let idx = self.rng.gen_range(0..OperatorId::ALL.len());
        self.synthesize(OperatorId::ALL[idx])
    }

    /// Assemble a complete snippet for `op`: a randomized scale directive
    /// plus operands drawn under the operator's domain flags, substituted
    /// into its template.
    pub fn synthesize(&mut self, op: OperatorId) -> GeneratedTest {
        let desc = op.descriptor();
        let marker = desc.dialect.negation_marker();

        let scale = self.literal(SCALE_FLAGS, marker);
        let mut text = desc.template.replacen("{s}", &scale, 1);

        for (slot, flags) in ["{a}", "{b}", "{c}"].iter().zip(desc.operands) {
            let operand = if op == OperatorId::Sqrt {
                // sqrt(1) is a fixed point that tests nothing; redraw.
                loop {
                    let candidate = self.literal(*flags, marker);
                    if candidate != "1" {
                        break candidate;
                    }
                }
            } else {
                self.literal(*flags, marker)
            };
            text = text.replacen(slot, &operand, 1);
        }

        GeneratedTest { text, op }
    }

    /// Build one numeric literal under the given domain flags.
    ///
    /// Never malformed: no leading dot, no double sign, never empty, and a
    /// forced zero is always the bare `"0"`.
    fn literal(&mut self, flags: OperandFlags, marker: &str) -> String {
        if flags.allow_force_zero && self.rare_zero() {
            return "0".to_owned();
        }

        let negative = flags.allow_negative && self.coin_flip();

        let mut text = self
            .magnitude(flags.magnitude_bits, !flags.allow_force_zero)
            .to_string();

        if flags.allow_fraction && self.coin_flip() {
            let mut digits = self.magnitude(FRACTION_MAGNITUDE_BITS, false).to_string();
            let min_len = self.rng.gen_range(0..256);
            if digits.len() < min_len {
                digits = "0".repeat(min_len - digits.len()) + &digits;
            }
            if digits != "0" {
                text.push('.');
                text.push_str(&digits);
            }
        }

        if negative && text != "0" {
            text.insert_str(0, marker);
        }

        text
    }

    /// Uniform integer in `[0, 2^bits)`; when `forbid_zero` is set, redraws
    /// until nonzero.
    fn magnitude(&mut self, bits: u64, forbid_zero: bool) -> BigUint {
        loop {
            let n = self.rng.gen_biguint(bits);
            if !forbid_zero || n.bits() != 0 {
                return n;
            }
        }
    }

    /// 50/50 draw, shared by the sign and fraction gates.
    fn coin_flip(&mut self) -> bool {
        self.rng.gen_range(0..2) == 1
    }

    /// True with probability 1/256; gates the forced-zero path.
    fn rare_zero(&mut self) -> bool {
        self.rng.gen_range(0..256) == 0
    }
}
