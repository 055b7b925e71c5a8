use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Criterion {
    Trend,
    Momentum,
    Volume,
    PriceAction,
}

impl Criterion {
    /// Evaluation order; also the order of `EvaluationVerdict::fails`.
    pub const ALL: [Criterion; 4] = [
        Criterion::Trend,
        Criterion::Momentum,
        Criterion::Volume,
        Criterion::PriceAction,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Criterion::Trend => "Trend",
            Criterion::Momentum => "Momentum",
            Criterion::Volume => "Volume",
            Criterion::PriceAction => "PriceAction",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationVerdict {
    pub trend: bool,
    pub momentum: bool,
    pub volume_sufficient: bool,
    pub price_action: bool,
    pub score: u8,
    pub fails: Vec<Criterion>,
}

impl EvaluationVerdict {
    pub fn passed(&self, criterion: Criterion) -> bool {
        match criterion {
            Criterion::Trend => self.trend,
            Criterion::Momentum => self.momentum,
            Criterion::Volume => self.volume_sufficient,
            Criterion::PriceAction => self.price_action,
        }
    }
}
