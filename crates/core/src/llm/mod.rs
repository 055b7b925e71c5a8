use crate::domain::metrics::RawMetrics;
use crate::domain::stock::AiStock;
use std::fmt;

pub mod anthropic;
pub mod error;
pub mod json;

#[cfg(test)]
pub(crate) mod testing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
}

/// The three request shapes sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    BatchIdeas,
    RawMetrics,
    FullEvaluation,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::BatchIdeas => f.write_str("batch_ideas"),
            Operation::RawMetrics => f.write_str("raw_metrics"),
            Operation::FullEvaluation => f.write_str("full_evaluation"),
        }
    }
}

/// Source of simulated market data. Every call is a single attempt: no retries, no
/// cancellation; callers decide whether to try again.
#[async_trait::async_trait]
pub trait MarketDataGateway: Send + Sync {
    fn provider(&self) -> Provider;

    /// 5..=10 model-scored stock ideas from one aggregated request.
    async fn fetch_batch_ideas(&self) -> anyhow::Result<Vec<AiStock>>;

    /// `Ok(None)` when the payload parses but fails the price check; the caller should
    /// report the ticker as having no data and carry on with its siblings.
    async fn fetch_raw_metrics(&self, ticker: &str) -> anyhow::Result<Option<RawMetrics>>;

    async fn fetch_full_evaluation(&self, ticker: &str) -> anyhow::Result<AiStock>;
}
