//! Operator descriptor registry.
//!
//! One static table maps every supported operator to its expression template,
//! per-operand domain flags, dialect, and tolerance class.  The registry is
//! the contract surface for the whole harness: the synthesizer reads the
//! templates and flags, the execution adapter reads the dialect, the
//! comparator reads the tolerance class, and the checklist persists the
//! stable ordinal.
//!
//! Ordinals are stable: they index the table, and they are the on-disk form
//! of an operator in the checklist's `.ops.txt` store.

// ─── Operator identity ──────────────────────────────────────────────────

/// Stable identifier for a supported operator.
///
/// The discriminant is the persisted ordinal; it never changes once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OperatorId {
    Add = 0,
    Subtract = 1,
    Multiply = 2,
    Divide = 3,
    Modulus = 4,
    Power = 5,
    Modexp = 6,
    Sqrt = 7,
    Exponent = 8,
    Log = 9,
    Arctangent = 10,
    Sine = 11,
    Cosine = 12,
    Bessel = 13,
}

impl OperatorId {
    /// Every supported operator, in ordinal order.
    pub const ALL: [Self; 14] = [
        Self::Add,
        Self::Subtract,
        Self::Multiply,
        Self::Divide,
        Self::Modulus,
        Self::Power,
        Self::Modexp,
        Self::Sqrt,
        Self::Exponent,
        Self::Log,
        Self::Arctangent,
        Self::Sine,
        Self::Cosine,
        Self::Bessel,
    ];

    /// The persisted ordinal of this operator.
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Look up an operator by its persisted ordinal.
    #[must_use]
    pub const fn from_ordinal(ordinal: u8) -> Option<Self> {
        if (ordinal as usize) < Self::ALL.len() {
            Some(Self::ALL[ordinal as usize])
        } else {
            None
        }
    }

    /// The registry entry for this operator.
    #[must_use]
    pub fn descriptor(self) -> &'static OperatorDescriptor {
        &REGISTRY[self as usize]
    }
}

// ─── Dialect ────────────────────────────────────────────────────────────

/// One of the two surface syntaxes of the calculator language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// The `bc` infix expression dialect.
    Infix,
    /// The `dc` postfix/stack dialect, used only for modular exponentiation.
    Stack,
}

impl Dialect {
    /// Program name of the evaluator for this dialect.
    #[must_use]
    pub const fn program(self) -> &'static str {
        match self {
            Self::Infix => "bc",
            Self::Stack => "dc",
        }
    }

    /// Command-line options passed to the evaluator.
    #[must_use]
    pub const fn options(self) -> &'static [&'static str] {
        match self {
            // -l loads the math library, -q suppresses the banner.
            Self::Infix => &["-lq"],
            Self::Stack => &[],
        }
    }

    /// Halt command appended after the generated text on stdin.
    #[must_use]
    pub const fn halt(self) -> &'static str {
        match self {
            Self::Infix => "halt",
            Self::Stack => "q",
        }
    }

    /// Token prefixed to a negative numeric literal.
    ///
    /// The stack dialect's parser reads `_` as the unary-negative marker;
    /// `-` there is the subtraction operator.
    #[must_use]
    pub const fn negation_marker(self) -> &'static str {
        match self {
            Self::Infix => "-",
            Self::Stack => "_",
        }
    }
}

// ─── Tolerance class ────────────────────────────────────────────────────

/// Whether a mismatch for this operator may be explained by a
/// precision-rounding difference in the reference implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToleranceClass {
    /// Outputs must agree byte-for-byte at the generated scale.
    Exact,
    /// Transcendental math-library functions: a mismatch triggers the
    /// raised-scale retry before being confirmed.
    TranscendentalRounding,
}

// ─── Operand flags ──────────────────────────────────────────────────────

/// Domain constraints for a single generated operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandFlags {
    /// May carry a fractional suffix.
    pub allow_fraction: bool,
    /// May be prefixed with the dialect's negation marker.
    pub allow_negative: bool,
    /// May be forced to exactly `"0"` (with probability 1/256).  When
    /// disabled the magnitude also redraws until nonzero, so divisors and
    /// moduli never come out as a literal zero.
    pub allow_force_zero: bool,
    /// Bit width of the magnitude draw: uniform in `[0, 2^bits)`.
    pub magnitude_bits: u64,
}

impl OperandFlags {
    const fn new(
        allow_fraction: bool,
        allow_negative: bool,
        allow_force_zero: bool,
        magnitude_bits: u64,
    ) -> Self {
        Self {
            allow_fraction,
            allow_negative,
            allow_force_zero,
            magnitude_bits,
        }
    }
}

/// Default operand magnitude: four bytes.
pub const DEFAULT_MAGNITUDE_BITS: u64 = 32;

/// Flags for the scale (decimal precision) literal emitted before every
/// expression: a small non-negative integer in `[0, 32)`, occasionally
/// forced to zero.
pub const SCALE_FLAGS: OperandFlags = OperandFlags::new(false, false, true, 5);

// ─── Descriptor ─────────────────────────────────────────────────────────

/// A single entry in the operator registry.
#[derive(Debug, Clone, Copy)]
pub struct OperatorDescriptor {
    /// The operator's stable identifier.
    pub id: OperatorId,
    /// Diagnostic name.
    pub name: &'static str,
    /// Expression template.  `{s}` is the scale slot; `{a}`, `{b}`, `{c}`
    /// are operand slots, substituted in order.
    pub template: &'static str,
    /// Domain flags for each operand slot, in `{a}`, `{b}`, `{c}` order.
    pub operands: &'static [OperandFlags],
    /// Which evaluator dialect runs this operator.
    pub dialect: Dialect,
    /// Whether mismatches are eligible for the precision-rounding retry.
    pub tolerance: ToleranceClass,
}

impl OperatorDescriptor {
    /// Whether a mismatch for this operator triggers the raised-scale retry.
    #[must_use]
    pub const fn is_tolerance_eligible(&self) -> bool {
        matches!(self.tolerance, ToleranceClass::TranscendentalRounding)
    }
}

// Shorthand for the flag combinations the table actually uses.
const SIGNED_REAL: OperandFlags = OperandFlags::new(true, true, true, DEFAULT_MAGNITUDE_BITS);
const SIGNED_REAL_NONZERO: OperandFlags =
    OperandFlags::new(true, true, false, DEFAULT_MAGNITUDE_BITS);
const SIGNED_INT: OperandFlags = OperandFlags::new(false, true, true, DEFAULT_MAGNITUDE_BITS);
const SIGNED_INT_NONZERO: OperandFlags =
    OperandFlags::new(false, true, false, DEFAULT_MAGNITUDE_BITS);

static REGISTRY: [OperatorDescriptor; 14] = [
    OperatorDescriptor {
        id: OperatorId::Add,
        name: "add",
        template: "scale = {s}; {a} + {b}",
        operands: &[SIGNED_REAL, SIGNED_REAL],
        dialect: Dialect::Infix,
        tolerance: ToleranceClass::Exact,
    },
    OperatorDescriptor {
        id: OperatorId::Subtract,
        name: "subtract",
        template: "scale = {s}; {a} - {b}",
        operands: &[SIGNED_REAL, SIGNED_REAL],
        dialect: Dialect::Infix,
        tolerance: ToleranceClass::Exact,
    },
    OperatorDescriptor {
        id: OperatorId::Multiply,
        name: "multiply",
        template: "scale = {s}; {a} * {b}",
        operands: &[SIGNED_REAL, SIGNED_REAL],
        dialect: Dialect::Infix,
        tolerance: ToleranceClass::Exact,
    },
    OperatorDescriptor {
        id: OperatorId::Divide,
        name: "divide",
        template: "scale = {s}; {a} / {b}",
        operands: &[SIGNED_REAL, SIGNED_REAL_NONZERO],
        dialect: Dialect::Infix,
        tolerance: ToleranceClass::Exact,
    },
    OperatorDescriptor {
        id: OperatorId::Modulus,
        name: "modulus",
        template: "scale = {s}; {a} % {b}",
        operands: &[SIGNED_REAL, SIGNED_REAL_NONZERO],
        dialect: Dialect::Infix,
        tolerance: ToleranceClass::Exact,
    },
    OperatorDescriptor {
        id: OperatorId::Power,
        name: "power",
        template: "scale = {s}; {a} ^ {b}",
        operands: &[
            // Base biased larger than the integer exponent.
            OperandFlags::new(true, true, true, 7),
            OperandFlags::new(false, true, true, 6),
        ],
        dialect: Dialect::Infix,
        tolerance: ToleranceClass::Exact,
    },
    OperatorDescriptor {
        id: OperatorId::Modexp,
        name: "modexp",
        template: "{s}k {a} {b} {c}|pR",
        operands: &[SIGNED_INT, SIGNED_INT, SIGNED_INT_NONZERO],
        dialect: Dialect::Stack,
        tolerance: ToleranceClass::Exact,
    },
    OperatorDescriptor {
        id: OperatorId::Sqrt,
        name: "sqrt",
        template: "scale = {s}; sqrt({a})",
        operands: &[OperandFlags::new(true, false, true, 8)],
        dialect: Dialect::Infix,
        tolerance: ToleranceClass::Exact,
    },
    OperatorDescriptor {
        id: OperatorId::Exponent,
        name: "exponent",
        template: "scale = {s}; e({a})",
        operands: &[OperandFlags::new(true, true, true, 6)],
        dialect: Dialect::Infix,
        tolerance: ToleranceClass::TranscendentalRounding,
    },
    OperatorDescriptor {
        id: OperatorId::Log,
        name: "log",
        template: "scale = {s}; l({a})",
        operands: &[SIGNED_REAL],
        dialect: Dialect::Infix,
        tolerance: ToleranceClass::TranscendentalRounding,
    },
    OperatorDescriptor {
        id: OperatorId::Arctangent,
        name: "arctangent",
        template: "scale = {s}; a({a})",
        operands: &[SIGNED_REAL],
        dialect: Dialect::Infix,
        tolerance: ToleranceClass::TranscendentalRounding,
    },
    OperatorDescriptor {
        id: OperatorId::Sine,
        name: "sine",
        template: "scale = {s}; s({a})",
        operands: &[SIGNED_REAL],
        dialect: Dialect::Infix,
        tolerance: ToleranceClass::TranscendentalRounding,
    },
    OperatorDescriptor {
        id: OperatorId::Cosine,
        name: "cosine",
        template: "scale = {s}; c({a})",
        operands: &[SIGNED_REAL],
        dialect: Dialect::Infix,
        tolerance: ToleranceClass::TranscendentalRounding,
    },
    OperatorDescriptor {
        id: OperatorId::Bessel,
        name: "bessel",
        template: "scale = {s}; j({a}, {b})",
        operands: &[
            // Value, then an integer order biased small.
            OperandFlags::new(true, true, false, DEFAULT_MAGNITUDE_BITS),
            OperandFlags::new(false, false, true, 6),
        ],
        dialect: Dialect::Infix,
        tolerance: ToleranceClass::TranscendentalRounding,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_has_one_entry_per_operator_in_ordinal_order() {
        assert_eq!(REGISTRY.len(), OperatorId::ALL.len());
        for (i, op) in OperatorId::ALL.iter().enumerate() {
            assert_eq!(op.ordinal() as usize, i);
            assert_eq!(op.descriptor().id, *op);
        }
    }

    #[test]
    fn ordinal_roundtrip() {
        for op in OperatorId::ALL {
            assert_eq!(OperatorId::from_ordinal(op.ordinal()), Some(op));
        }
        assert_eq!(OperatorId::from_ordinal(14), None);
        assert_eq!(OperatorId::from_ordinal(255), None);
    }

    #[test]
    fn only_modexp_uses_the_stack_dialect() {
        for op in OperatorId::ALL {
            let expected = if op == OperatorId::Modexp {
                Dialect::Stack
            } else {
                Dialect::Infix
            };
            assert_eq!(op.descriptor().dialect, expected, "{:?}", op);
        }
    }

    #[test]
    fn tolerance_class_starts_at_exponent() {
        for op in OperatorId::ALL {
            let eligible = op.ordinal() >= OperatorId::Exponent.ordinal();
            assert_eq!(op.descriptor().is_tolerance_eligible(), eligible, "{:?}", op);
        }
    }

    #[test]
    fn division_and_modulus_divisors_never_allow_zero() {
        for op in [OperatorId::Divide, OperatorId::Modulus] {
            let flags = op.descriptor().operands[1];
            assert!(!flags.allow_force_zero);
        }
        // Same for the modexp modulus.
        let modexp = OperatorId::Modexp.descriptor();
        assert!(!modexp.operands[2].allow_force_zero);
    }

    #[test]
    fn operand_slots_match_template_slots() {
        for op in OperatorId::ALL {
            let desc = op.descriptor();
            let slots = ["{a}", "{b}", "{c}"];
            for (i, slot) in slots.iter().enumerate() {
                assert_eq!(
                    desc.template.contains(slot),
                    i < desc.operands.len(),
                    "{:?} template/operand arity disagree on {slot}",
                    op
                );
            }
            assert!(desc.template.contains("{s}"), "{:?} missing scale slot", op);
            assert!(!desc.operands.is_empty());
            assert!(desc.operands.len() <= 3);
        }
    }

    #[test]
    fn dialect_surface() {
        assert_eq!(Dialect::Infix.program(), "bc");
        assert_eq!(Dialect::Infix.options(), &["-lq"]);
        assert_eq!(Dialect::Infix.halt(), "halt");
        assert_eq!(Dialect::Infix.negation_marker(), "-");

        assert_eq!(Dialect::Stack.program(), "dc");
        assert!(Dialect::Stack.options().is_empty());
        assert_eq!(Dialect::Stack.halt(), "q");
        assert_eq!(Dialect::Stack.negation_marker(), "_");
    }
}
