use crate::domain::verdict::Criterion;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct StrategyCriterion {
    pub criterion: Criterion,
    pub name: &'static str,
    /// Product copy. Only the rule-checked subset is enforced by the evaluator; MACD and
    /// the absolute volume floor are informational.
    pub rules: &'static [&'static str],
    /// What the evaluator actually checks.
    pub enforced: &'static str,
}

pub static STRATEGY_CRITERIA: [StrategyCriterion; 4] = [
    StrategyCriterion {
        criterion: Criterion::Trend,
        name: "Trend",
        rules: &[
            "50-day MA > 200-day MA (Golden Cross)",
            "Price is above both MAs",
        ],
        enforced: "Price > 50MA > 200MA",
    },
    StrategyCriterion {
        criterion: Criterion::Momentum,
        name: "Momentum",
        rules: &["RSI (14) > 50", "MACD line > Signal line"],
        enforced: "RSI > 50",
    },
    StrategyCriterion {
        criterion: Criterion::Volume,
        name: "Volume",
        rules: &[
            "Average volume > 1M shares",
            "Relative Volume (RelVol) > 1.5",
        ],
        enforced: "Relative Volume > 1.5",
    },
    StrategyCriterion {
        criterion: Criterion::PriceAction,
        name: "Price Action",
        rules: &[
            "Price near recent highs or breaking out",
            "Avoid low-volume chop",
        ],
        enforced: "Price is within 5% of recent high",
    },
];

/// Numbered criteria block embedded in model prompts.
pub fn prompt_block() -> String {
    STRATEGY_CRITERIA
        .iter()
        .enumerate()
        .map(|(idx, c)| format!("{}. **{}:** {}", idx + 1, c.name, c.rules.join("; ")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_follow_evaluation_order() {
        let order: Vec<_> = STRATEGY_CRITERIA.iter().map(|c| c.criterion).collect();
        assert_eq!(order, Criterion::ALL.to_vec());
    }

    #[test]
    fn prompt_block_numbers_every_criterion() {
        let block = prompt_block();
        assert!(block.starts_with("1. **Trend:**"));
        assert!(block.contains("4. **Price Action:**"));
        assert!(block.contains("MACD line > Signal line"));
    }
}
