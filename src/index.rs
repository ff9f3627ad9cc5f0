//! Composite decision index: collapses the hypothesis verdicts into a
//! single 0-100 score and a recommended posture.

use crate::hypotheses::HypothesisOutcome;

/// Posture recommended by the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionTier {
    /// Score >= 75: routine monitoring suffices.
    Optimal,
    /// Score >= 50: mixed conditions, heightened vigilance.
    Watch,
    /// Score < 50: unfavorable conditions, intervention required.
    Act,
}

impl DecisionTier {
    pub fn label(self) -> &'static str {
        match self {
            Self::Optimal => "optimal",
            Self::Watch => "watch",
            Self::Act => "act",
        }
    }

    pub fn rationale(self) -> &'static str {
        match self {
            Self::Optimal => "all conditions favorable",
            Self::Watch => "mixed conditions, vigilance required",
            Self::Act => "unfavorable conditions, action required",
        }
    }
}

/// The aggregated decision index for one round.
#[derive(Debug, Clone, Copy)]
pub struct CompositeIndex {
    /// 0-100, rounded to one decimal.
    pub score: f64,
    pub tier: DecisionTier,
    pub hypotheses_evaluated: usize,
}

/// Average the verdict weights across all evaluated hypotheses and scale to
/// 0-100. No hypotheses at all scores zero, which lands in the act tier.
pub fn aggregate(outcomes: &[HypothesisOutcome]) -> CompositeIndex {
    let score = if outcomes.is_empty() {
        0.0
    } else {
        let total: f64 = outcomes.iter().map(|o| o.verdict.weight()).sum();
        let raw = total / outcomes.len() as f64 * 100.0;
        (raw * 10.0).round() / 10.0
    };

    let tier = if score >= 75.0 {
        DecisionTier::Optimal
    } else if score >= 50.0 {
        DecisionTier::Watch
    } else {
        DecisionTier::Act
    };

    CompositeIndex {
        score,
        tier,
        hypotheses_evaluated: outcomes.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypotheses::Verdict;

    fn outcomes(verdicts: &[Verdict]) -> Vec<HypothesisOutcome> {
        verdicts
            .iter()
            .map(|&verdict| HypothesisOutcome {
                id: "H_TEST",
                verdict,
                explanation: String::new(),
                condition: "",
            })
            .collect()
    }

    #[test]
    fn five_full_three_fail_lands_in_watch() {
        let mut v = vec![Verdict::Full; 5];
        v.extend([Verdict::Fail; 3]);
        let idx = aggregate(&outcomes(&v));
        assert_eq!(idx.score, 62.5);
        assert_eq!(idx.tier, DecisionTier::Watch);
        assert_eq!(idx.hypotheses_evaluated, 8);
    }

    #[test]
    fn all_full_is_optimal_all_fail_is_act() {
        let idx = aggregate(&outcomes(&[Verdict::Full; 8]));
        assert_eq!(idx.score, 100.0);
        assert_eq!(idx.tier, DecisionTier::Optimal);

        let idx = aggregate(&outcomes(&[Verdict::Fail; 8]));
        assert_eq!(idx.score, 0.0);
        assert_eq!(idx.tier, DecisionTier::Act);
    }

    #[test]
    fn partial_weights_round_to_one_decimal() {
        // 1 + 0.5 + 0.25 over 3 = 58.333... -> 58.3
        let idx = aggregate(&outcomes(&[
            Verdict::Full,
            Verdict::StrongPartial,
            Verdict::WeakPartial,
        ]));
        assert_eq!(idx.score, 58.3);
        assert_eq!(idx.tier, DecisionTier::Watch);
    }

    #[test]
    fn tier_boundaries_are_inclusive() {
        // 6 full + 2 fail = 75.0 exactly.
        let mut v = vec![Verdict::Full; 6];
        v.extend([Verdict::Fail; 2]);
        assert_eq!(aggregate(&outcomes(&v)).tier, DecisionTier::Optimal);

        // 4 full + 4 fail = 50.0 exactly.
        let mut v = vec![Verdict::Full; 4];
        v.extend([Verdict::Fail; 4]);
        assert_eq!(aggregate(&outcomes(&v)).tier, DecisionTier::Watch);
    }

    #[test]
    fn empty_input_scores_zero() {
        let idx = aggregate(&[]);
        assert_eq!(idx.score, 0.0);
        assert_eq!(idx.tier, DecisionTier::Act);
        assert_eq!(idx.hypotheses_evaluated, 0);
    }
}
