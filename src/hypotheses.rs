//! Hypothesis engine: tests the eight standing hypotheses against the
//! current round's normalized values, plus the battery-metals cycle matrix
//! that two of them depend on.
//!
//! Each hypothesis is a pure verdict predicate paired with a separate
//! explanation template; the predicate never touches strings, the template
//! never decides outcomes. `evaluate_all` runs the battery in a stable
//! order so stored rows and reports line up across rounds. A signal missing
//! from the round reads as `0.0`, which fails every bullish comparison.

use std::collections::HashMap;

/// Normalized values for one round, keyed by signal id.
pub type SignalValues = HashMap<String, f64>;

fn val(values: &SignalValues, id: &str) -> f64 {
    values.get(id).copied().unwrap_or(0.0)
}

/// Outcome grade of one hypothesis test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// All conditions met.
    Full,
    /// Evidence present but incomplete.
    StrongPartial,
    /// Faint signal only.
    WeakPartial,
    /// Conditions not met.
    Fail,
}

impl Verdict {
    /// Contribution to the composite decision index.
    pub fn weight(self) -> f64 {
        match self {
            Self::Full => 1.0,
            Self::StrongPartial => 0.5,
            Self::WeakPartial => 0.25,
            Self::Fail => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full-pass",
            Self::StrongPartial => "partial-pass",
            Self::WeakPartial => "weak-pass",
            Self::Fail => "fail",
        }
    }
}

/// Result of testing one hypothesis.
#[derive(Debug, Clone)]
pub struct HypothesisOutcome {
    pub id: &'static str,
    pub verdict: Verdict,
    /// What the inputs looked like, for the stored row and report.
    pub explanation: String,
    /// Human-readable statement of the condition under test.
    pub condition: &'static str,
}

/// One row of the battery-metals matrix.
#[derive(Debug, Clone)]
pub struct BatteryMetal {
    pub signal_id: &'static str,
    pub metal: &'static str,
    pub value: f64,
    pub cutoff: f64,
    pub unit: &'static str,
    pub bullish: bool,
}

/// Cycle reading from the bull count across the six metals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleTier {
    Supercycle,
    Bubble,
    Weak,
}

impl CycleTier {
    pub fn label(self) -> &'static str {
        match self {
            Self::Supercycle => "supercycle",
            Self::Bubble => "bubble",
            Self::Weak => "weak",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            Self::Supercycle => "aggressive accumulation",
            Self::Bubble => "aggressive monitoring",
            Self::Weak => "hold",
        }
    }
}

/// The battery-metals matrix for one round.
#[derive(Debug, Clone)]
pub struct BatteryMatrix {
    pub metals: Vec<BatteryMetal>,
    pub bull_count: usize,
    pub tier: CycleTier,
}

const BATTERY_CUTOFFS: [(&str, &str, f64, &str); 6] = [
    ("R65", "Silver", 80.0, "$/oz"),
    ("R66", "Lithium", 100_000.0, "CNY/t"),
    ("R67", "Nickel", 15_000.0, "$/t"),
    ("R68", "Cobalt", 40_000.0, "$/lb"),
    ("R69", "Graphite", 450.0, "$/t"),
    ("R70", "Rare earths", 50.0, "$/kg"),
];

/// Grade each metal against its bull cutoff and read the cycle tier:
/// 4+ bulls is a supercycle, 3 a bubble, fewer a weak cycle.
pub fn battery_matrix(values: &SignalValues) -> BatteryMatrix {
    let metals: Vec<BatteryMetal> = BATTERY_CUTOFFS
        .iter()
        .map(|&(signal_id, metal, cutoff, unit)| {
            let value = val(values, signal_id);
            BatteryMetal {
                signal_id,
                metal,
                value,
                cutoff,
                unit,
                bullish: value > cutoff,
            }
        })
        .collect();

    let bull_count = metals.iter().filter(|m| m.bullish).count();
    let tier = if bull_count >= 4 {
        CycleTier::Supercycle
    } else if bull_count >= 3 {
        CycleTier::Bubble
    } else {
        CycleTier::Weak
    };

    BatteryMatrix {
        metals,
        bull_count,
        tier,
    }
}

/// A hypothesis definition: a pure predicate over the signal map plus its
/// presentation template, kept apart so neither leaks into the other.
struct HypothesisDef {
    id: &'static str,
    condition: &'static str,
    verdict: fn(&SignalValues, &BatteryMatrix) -> Verdict,
    explain: fn(&SignalValues, &BatteryMatrix) -> String,
}

// H1_P4 — gas squeeze: storage and front-month price both inside the
// stress band.
fn h1_verdict(values: &SignalValues, _: &BatteryMatrix) -> Verdict {
    let r11 = val(values, "R11");
    let r24 = val(values, "R24");
    if (40.0..=60.0).contains(&r11) && (25.0..=50.0).contains(&r24) {
        Verdict::Full
    } else {
        Verdict::Fail
    }
}

fn h1_explain(values: &SignalValues, _: &BatteryMatrix) -> String {
    format!(
        "R11={}% (40-60%) | R24=€{} (25-50€)",
        val(values, "R11"),
        val(values, "R24")
    )
}

// H2_NATO — rearmament: SIPRI trend-indicator volume above baseline.
fn h2_verdict(values: &SignalValues, _: &BatteryMatrix) -> Verdict {
    if val(values, "R02") > 4000.0 {
        Verdict::Full
    } else {
        Verdict::Fail
    }
}

fn h2_explain(values: &SignalValues, _: &BatteryMatrix) -> String {
    format!("R02={} (>4000)", val(values, "R02"))
}

// H3_CYBER_SUPPLY — cyber pressure coinciding with a metals supercycle.
// Absent the full conjunction the verdict stays weak-partial rather than
// fail: either leg alone is still a faint signal.
fn h3_verdict(values: &SignalValues, battery: &BatteryMatrix) -> Verdict {
    let cyber = val(values, "R00") > 15.0 || val(values, "R81") > 500.0;
    if cyber && battery.bull_count >= 4 {
        Verdict::Full
    } else {
        Verdict::WeakPartial
    }
}

fn h3_explain(values: &SignalValues, battery: &BatteryMatrix) -> String {
    format!(
        "R00={} (>15) R81={} (>500) | battery {}/6",
        val(values, "R00"),
        val(values, "R81"),
        battery.bull_count
    )
}

// H5_GDELT — event feed coverage: any conflict events is a full pass; an
// empty feed still reads as strong-partial, not a failure.
fn h5_verdict(values: &SignalValues, _: &BatteryMatrix) -> Verdict {
    if val(values, "R32") > 0.0 {
        Verdict::Full
    } else {
        Verdict::StrongPartial
    }
}

fn h5_explain(values: &SignalValues, _: &BatteryMatrix) -> String {
    format!("R32={} events", val(values, "R32"))
}

// H6_CN_AFRICA — monetary expansion plus a metals supercycle; expansion
// alone still reads as strong-partial.
fn h6_verdict(values: &SignalValues, battery: &BatteryMatrix) -> Verdict {
    if val(values, "R01") > 45.0 && battery.bull_count >= 4 {
        Verdict::Full
    } else {
        Verdict::StrongPartial
    }
}

fn h6_explain(values: &SignalValues, battery: &BatteryMatrix) -> String {
    format!(
        "R01={}T (>45T) | battery {}/6",
        val(values, "R01"),
        battery.bull_count
    )
}

// H8_CRYPTO — froth band: sentiment and price both inside the window.
// Feeds reporting the price in thousands are rescaled first.
fn h8_price(values: &SignalValues) -> f64 {
    let raw = val(values, "R15");
    if raw < 1000.0 {
        raw * 1000.0
    } else {
        raw
    }
}

fn h8_verdict(values: &SignalValues, _: &BatteryMatrix) -> Verdict {
    let r12 = val(values, "R12");
    if (20.0..=50.0).contains(&r12) && (85_000.0..=100_000.0).contains(&h8_price(values)) {
        Verdict::Full
    } else {
        Verdict::Fail
    }
}

fn h8_explain(values: &SignalValues, _: &BatteryMatrix) -> String {
    format!(
        "R12={} (20-50) | R15={} (85k-100k)",
        val(values, "R12"),
        h8_price(values)
    )
}

// H9_TECH_WAR — stablecoin expansion concurrent with fresh adversary
// tradecraft.
fn h9_verdict(values: &SignalValues, _: &BatteryMatrix) -> Verdict {
    let stablecoin = val(values, "R71") > 1.0 || val(values, "R72") > 75.0;
    if stablecoin && val(values, "R95") > 5.0 {
        Verdict::Full
    } else {
        Verdict::Fail
    }
}

fn h9_explain(values: &SignalValues, _: &BatteryMatrix) -> String {
    format!(
        "R71={}B (>1) R72={}% (>75) | R95={} (>5)",
        val(values, "R71"),
        val(values, "R72"),
        val(values, "R95")
    )
}

// H11_SCW — stablecoin capitalization floor.
fn h11_verdict(values: &SignalValues, _: &BatteryMatrix) -> Verdict {
    if val(values, "R71") >= 0.9 {
        Verdict::Full
    } else {
        Verdict::Fail
    }
}

fn h11_explain(values: &SignalValues, _: &BatteryMatrix) -> String {
    format!("R71={}B (>=0.9B)", val(values, "R71"))
}

const HYPOTHESES: [HypothesisDef; 8] = [
    HypothesisDef {
        id: "H1_P4",
        condition: "40% <= R11 <= 60% AND 25 <= R24 <= 50",
        verdict: h1_verdict,
        explain: h1_explain,
    },
    HypothesisDef {
        id: "H2_NATO",
        condition: "R02 (SIPRI TIV) > 4000",
        verdict: h2_verdict,
        explain: h2_explain,
    },
    HypothesisDef {
        id: "H3_CYBER_SUPPLY",
        condition: "(R00 > 15 OR R81 > 500) AND battery bulls >= 4/6",
        verdict: h3_verdict,
        explain: h3_explain,
    },
    HypothesisDef {
        id: "H5_GDELT",
        condition: "conflict root codes observed (R32 > 0)",
        verdict: h5_verdict,
        explain: h5_explain,
    },
    HypothesisDef {
        id: "H6_CN_AFRICA",
        condition: "R01 (PBOC) > 45T AND battery bulls >= 4/6",
        verdict: h6_verdict,
        explain: h6_explain,
    },
    HypothesisDef {
        id: "H8_CRYPTO",
        condition: "20 <= R12 <= 50 AND 85000 <= R15 <= 100000",
        verdict: h8_verdict,
        explain: h8_explain,
    },
    HypothesisDef {
        id: "H9_TECH_WAR",
        condition: "(R71 > 1B OR R72 > 75%) AND R95 > 5",
        verdict: h9_verdict,
        explain: h9_explain,
    },
    HypothesisDef {
        id: "H11_SCW",
        condition: "R71 (USD1) >= 0.9B",
        verdict: h11_verdict,
        explain: h11_explain,
    },
];

/// Test all eight hypotheses against the round's values, in stable order.
/// Returns the outcomes and the battery matrix they were graded against.
pub fn evaluate_all(values: &SignalValues) -> (Vec<HypothesisOutcome>, BatteryMatrix) {
    let battery = battery_matrix(values);
    let outcomes = HYPOTHESES
        .iter()
        .map(|def| HypothesisOutcome {
            id: def.id,
            verdict: (def.verdict)(values, &battery),
            explanation: (def.explain)(values, &battery),
            condition: def.condition,
        })
        .collect();
    (outcomes, battery)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, f64)]) -> SignalValues {
        pairs
            .iter()
            .map(|&(id, v)| (id.to_string(), v))
            .collect()
    }

    fn outcome<'a>(outcomes: &'a [HypothesisOutcome], id: &str) -> &'a HypothesisOutcome {
        outcomes.iter().find(|o| o.id == id).expect("hypothesis id")
    }

    #[test]
    fn h1_passes_only_inside_both_bands() {
        let (outcomes, _) = evaluate_all(&values(&[("R11", 45.0), ("R24", 30.0)]));
        assert_eq!(outcome(&outcomes, "H1_P4").verdict, Verdict::Full);

        let (outcomes, _) = evaluate_all(&values(&[("R11", 45.0), ("R24", 60.0)]));
        assert_eq!(outcome(&outcomes, "H1_P4").verdict, Verdict::Fail);

        // Band edges are inclusive.
        let (outcomes, _) = evaluate_all(&values(&[("R11", 40.0), ("R24", 50.0)]));
        assert_eq!(outcome(&outcomes, "H1_P4").verdict, Verdict::Full);
    }

    #[test]
    fn h3_falls_back_to_weak_partial() {
        // Cyber leg true but only one metal bullish.
        let (outcomes, battery) = evaluate_all(&values(&[("R00", 20.0), ("R65", 90.0)]));
        assert_eq!(battery.bull_count, 1);
        assert_eq!(
            outcome(&outcomes, "H3_CYBER_SUPPLY").verdict,
            Verdict::WeakPartial
        );

        // Full conjunction.
        let (outcomes, battery) = evaluate_all(&values(&[
            ("R81", 600.0),
            ("R65", 90.0),
            ("R66", 120_000.0),
            ("R67", 16_000.0),
            ("R70", 60.0),
        ]));
        assert_eq!(battery.bull_count, 4);
        assert_eq!(outcome(&outcomes, "H3_CYBER_SUPPLY").verdict, Verdict::Full);
    }

    #[test]
    fn h5_full_on_events_strong_partial_on_empty_feed() {
        let (outcomes, _) = evaluate_all(&values(&[("R32", 12.0)]));
        assert_eq!(outcome(&outcomes, "H5_GDELT").verdict, Verdict::Full);

        let (outcomes, _) = evaluate_all(&values(&[]));
        assert_eq!(outcome(&outcomes, "H5_GDELT").verdict, Verdict::StrongPartial);
    }

    #[test]
    fn h8_rescales_price_reported_in_thousands() {
        // 92.5 means 92,500 from a feed quoting k$.
        let (outcomes, _) = evaluate_all(&values(&[("R12", 30.0), ("R15", 92.5)]));
        assert_eq!(outcome(&outcomes, "H8_CRYPTO").verdict, Verdict::Full);

        let (outcomes, _) = evaluate_all(&values(&[("R12", 30.0), ("R15", 92_500.0)]));
        assert_eq!(outcome(&outcomes, "H8_CRYPTO").verdict, Verdict::Full);

        let (outcomes, _) = evaluate_all(&values(&[("R12", 30.0), ("R15", 120_000.0)]));
        assert_eq!(outcome(&outcomes, "H8_CRYPTO").verdict, Verdict::Fail);
    }

    #[test]
    fn h11_boundary_is_inclusive() {
        let (outcomes, _) = evaluate_all(&values(&[("R71", 0.9)]));
        assert_eq!(outcome(&outcomes, "H11_SCW").verdict, Verdict::Full);

        let (outcomes, _) = evaluate_all(&values(&[("R71", 0.89)]));
        assert_eq!(outcome(&outcomes, "H11_SCW").verdict, Verdict::Fail);
    }

    #[test]
    fn battery_tiers() {
        let bull4 = values(&[
            ("R65", 90.0),
            ("R66", 120_000.0),
            ("R67", 16_000.0),
            ("R68", 45_000.0),
        ]);
        assert_eq!(battery_matrix(&bull4).tier, CycleTier::Supercycle);

        let bull3 = values(&[("R65", 90.0), ("R66", 120_000.0), ("R67", 16_000.0)]);
        assert_eq!(battery_matrix(&bull3).tier, CycleTier::Bubble);

        let empty = values(&[]);
        let matrix = battery_matrix(&empty);
        assert_eq!(matrix.tier, CycleTier::Weak);
        assert_eq!(matrix.bull_count, 0);
        assert_eq!(matrix.metals.len(), 6);
    }

    #[test]
    fn missing_signals_read_as_zero() {
        let (outcomes, _) = evaluate_all(&SignalValues::new());
        assert_eq!(outcomes.len(), 8);
        assert_eq!(outcome(&outcomes, "H2_NATO").verdict, Verdict::Fail);
        // Fallback verdicts still apply with no data at all.
        assert_eq!(
            outcome(&outcomes, "H6_CN_AFRICA").verdict,
            Verdict::StrongPartial
        );
    }

    #[test]
    fn explanations_carry_the_observed_inputs() {
        let (outcomes, _) = evaluate_all(&values(&[("R11", 45.0), ("R24", 30.0)]));
        let h1 = outcome(&outcomes, "H1_P4");
        assert!(h1.explanation.contains("45"));
        assert!(h1.explanation.contains("30"));
        assert!(!h1.condition.is_empty());
    }
}
