//! Threshold comparison: classify a numeric reading against the registry's
//! declared threshold expression (`"<20"`, `">100k"`, `"3.5M"`).
//!
//! Operator patterns are tried in order `>`, `<`, bare; the unit multiplier
//! (k/K, M, B, T) scales the threshold constant, never the reading. A
//! malformed expression or a non-numeric reading is `Indeterminate` — the
//! comparator never errors and never silently reports `Ok`.

use std::sync::OnceLock;

use regex::Regex;

/// Outcome of comparing a reading against its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdVerdict {
    /// The reading crossed the declared threshold.
    Alert,
    /// The reading is on the safe side of the threshold.
    Ok,
    /// No numeric reading, or no parseable threshold.
    Indeterminate,
}

impl ThresholdVerdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Ok => "ok",
            Self::Indeterminate => "indeterminate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Above,
    Below,
    AtLeast,
}

fn re_above() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r">\s*(\d+\.?\d*)\s*(k|K|M|B|T)?").unwrap())
}

fn re_below() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<\s*(\d+\.?\d*)\s*(k|K|M|B|T)?").unwrap())
}

fn re_bare() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+\.?\d*)\s*(k|K|M|B|T)?").unwrap())
}

fn multiplier(unit: Option<&str>) -> f64 {
    match unit {
        Some("k") | Some("K") => 1e3,
        Some("M") => 1e6,
        Some("B") => 1e9,
        Some("T") => 1e12,
        _ => 1.0,
    }
}

/// Parse a threshold expression into (operator, scaled constant).
fn parse_threshold(expr: &str) -> Option<(Op, f64)> {
    let expr = expr.trim();
    if expr.is_empty() {
        return None;
    }
    let attempts = [
        (re_above(), Op::Above),
        (re_below(), Op::Below),
        (re_bare(), Op::AtLeast),
    ];
    for (re, op) in attempts {
        if let Some(caps) = re.captures(expr) {
            let base: f64 = caps.get(1)?.as_str().parse().ok()?;
            let unit = caps.get(2).map(|m| m.as_str());
            return Some((op, base * multiplier(unit)));
        }
    }
    None
}

/// Compare a (possibly absent) reading against a threshold expression.
pub fn compare(value: Option<f64>, expr: &str) -> ThresholdVerdict {
    let Some(value) = value else {
        return ThresholdVerdict::Indeterminate;
    };
    let Some((op, cutoff)) = parse_threshold(expr) else {
        return ThresholdVerdict::Indeterminate;
    };
    let crossed = match op {
        Op::Above => value > cutoff,
        Op::Below => value < cutoff,
        Op::AtLeast => value >= cutoff,
    };
    if crossed {
        ThresholdVerdict::Alert
    } else {
        ThresholdVerdict::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn above_with_unit_multipliers() {
        // `>100k` must alert iff value > 100_000, for every unit.
        assert_eq!(compare(Some(100_001.0), ">100k"), ThresholdVerdict::Alert);
        assert_eq!(compare(Some(100_000.0), ">100k"), ThresholdVerdict::Ok);
        assert_eq!(compare(Some(100_001.0), ">100K"), ThresholdVerdict::Alert);
        assert_eq!(compare(Some(2e6), ">1M"), ThresholdVerdict::Alert);
        assert_eq!(compare(Some(0.5e9), ">1B"), ThresholdVerdict::Ok);
        assert_eq!(compare(Some(2e12), ">1T"), ThresholdVerdict::Alert);
    }

    #[test]
    fn below_alerts_under_cutoff() {
        assert_eq!(compare(Some(15.0), "<20"), ThresholdVerdict::Alert);
        assert_eq!(compare(Some(42.0), "<20"), ThresholdVerdict::Ok);
        assert_eq!(compare(Some(20.0), "<20"), ThresholdVerdict::Ok);
    }

    #[test]
    fn bare_expression_is_meets_or_exceeds() {
        assert_eq!(compare(Some(500.0), "500"), ThresholdVerdict::Alert);
        assert_eq!(compare(Some(499.9), "500"), ThresholdVerdict::Ok);
        assert_eq!(compare(Some(6000.0), "5k"), ThresholdVerdict::Alert);
    }

    #[test]
    fn operator_precedence_prefers_above() {
        // A malformed compound like ">10<20" resolves via the first pattern.
        assert_eq!(compare(Some(15.0), ">10<20"), ThresholdVerdict::Alert);
    }

    #[test]
    fn indeterminate_cases() {
        assert_eq!(compare(None, ">100"), ThresholdVerdict::Indeterminate);
        assert_eq!(compare(Some(5.0), ""), ThresholdVerdict::Indeterminate);
        assert_eq!(compare(Some(5.0), "   "), ThresholdVerdict::Indeterminate);
        assert_eq!(compare(Some(5.0), "n/a"), ThresholdVerdict::Indeterminate);
        assert_eq!(compare(None, ""), ThresholdVerdict::Indeterminate);
    }
}
