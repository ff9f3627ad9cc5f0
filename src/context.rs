//! Contextual status evaluation: map a (signal, value) pair to a qualitative
//! label via the per-signal rule attached in the registry.
//!
//! Rules are an explicit tagged variant resolved once at registry load — a
//! cutoff, a comparison kind, and the two labels either side of it. Signals
//! without a rule (or without a numeric value) get the generic no-context
//! label. Pure lookup + apply, no side effects.

use serde::Deserialize;

/// Label returned when no rule applies or the value is non-numeric.
pub const NO_CONTEXT: &str = "no-context";

/// How a rule's cutoff is compared against the reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOp {
    /// Rule holds when value > cutoff.
    Above,
    /// Rule holds when value < cutoff.
    Below,
    /// Rule holds when value >= cutoff.
    AtLeast,
}

/// One signal's contextual evaluation rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextRule {
    pub op: RuleOp,
    pub cutoff: f64,
    /// Label when the comparison holds.
    pub when_true: String,
    /// Label otherwise.
    pub when_false: String,
}

impl ContextRule {
    pub fn new(op: RuleOp, cutoff: f64, when_true: &str, when_false: &str) -> Self {
        Self {
            op,
            cutoff,
            when_true: when_true.to_string(),
            when_false: when_false.to_string(),
        }
    }

    /// Apply the rule to a numeric reading.
    pub fn evaluate(&self, value: f64) -> &str {
        let holds = match self.op {
            RuleOp::Above => value > self.cutoff,
            RuleOp::Below => value < self.cutoff,
            RuleOp::AtLeast => value >= self.cutoff,
        };
        if holds {
            &self.when_true
        } else {
            &self.when_false
        }
    }
}

/// Evaluate a signal's contextual status.
///
/// `rule` is the registry lookup result for the signal id; `value` the
/// normalized reading. Either being absent yields [`NO_CONTEXT`].
pub fn evaluate_status<'a>(rule: Option<&'a ContextRule>, value: Option<f64>) -> &'a str {
    match (rule, value) {
        (Some(rule), Some(value)) => rule.evaluate(value),
        _ => NO_CONTEXT,
    }
}
