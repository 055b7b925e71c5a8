use crate::domain::metrics::RawMetrics;
use crate::domain::stock::AiStock;
use crate::domain::verdict::EvaluationVerdict;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A rule-evaluated ticker. `rank` is `None` until the collection has been sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub ticker: String,
    #[serde(flatten)]
    pub metrics: RawMetrics,
    #[serde(flatten)]
    pub verdict: EvaluationVerdict,
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStock {
    #[serde(flatten)]
    pub stock: AiStock,
    pub rank: Option<u32>,
}

/// Which score orders a collection: the 0..=4 rule score computed locally, or the
/// model's own 1..=100 match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBasis {
    #[default]
    Rules,
    Model,
}

impl fmt::Display for ScoreBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreBasis::Rules => f.write_str("rules"),
            ScoreBasis::Model => f.write_str("model"),
        }
    }
}

impl FromStr for ScoreBasis {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rules" | "rule" => Ok(ScoreBasis::Rules),
            "model" | "ai" => Ok(ScoreBasis::Model),
            other => anyhow::bail!("unknown score basis: {other} (expected rules or model)"),
        }
    }
}

/// The working collection. Exactly one basis is active at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "basis", content = "picks", rename_all = "lowercase")]
pub enum Picks {
    Rules(Vec<RankedEntry>),
    Model(Vec<RankedStock>),
}

impl Default for Picks {
    fn default() -> Self {
        Picks::Rules(Vec::new())
    }
}

impl Picks {
    pub fn basis(&self) -> ScoreBasis {
        match self {
            Picks::Rules(_) => ScoreBasis::Rules,
            Picks::Model(_) => ScoreBasis::Model,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Picks::Rules(entries) => entries.len(),
            Picks::Model(stocks) => stocks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tickers(&self) -> Vec<&str> {
        match self {
            Picks::Rules(entries) => entries.iter().map(|e| e.ticker.as_str()).collect(),
            Picks::Model(stocks) => stocks.iter().map(|s| s.stock.ticker.as_str()).collect(),
        }
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.tickers().iter().any(|t| t.eq_ignore_ascii_case(ticker))
    }
}
