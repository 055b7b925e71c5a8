use crate::domain::metrics::RawMetrics;
use crate::domain::stock::{AiStock, MacdStatus};
use crate::llm::{MarketDataGateway, Provider};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Canned gateway. Tickers missing from `metrics` fail with a transport-style error;
/// tickers mapped to `None` come back as "no data".
#[derive(Default)]
pub struct FakeGateway {
    pub metrics: HashMap<String, Option<RawMetrics>>,
    pub ideas: Option<Vec<AiStock>>,
    pub calls: AtomicUsize,
    pub requested: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn with_metrics(pairs: &[(&str, Option<RawMetrics>)]) -> Self {
        Self {
            metrics: pairs
                .iter()
                .map(|(t, m)| (t.to_string(), *m))
                .collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn metrics(score: u8) -> RawMetrics {
    RawMetrics {
        price: 100.0,
        fifty_day_ma: if score >= 4 { 90.0 } else { 110.0 },
        two_hundred_day_ma: 80.0,
        rsi: if score >= 1 { 60.0 } else { 40.0 },
        volume: if score >= 2 { 3_000_000.0 } else { 1_000_000.0 },
        avg_volume: 1_000_000.0,
        recent_high: if score >= 3 { 101.0 } else { 150.0 },
        recent_low: 70.0,
    }
}

pub fn stock(ticker: &str, match_score: u8) -> AiStock {
    AiStock {
        ticker: ticker.to_string(),
        company_name: format!("{ticker} Inc."),
        current_price: 42.0,
        price_change: 0.5,
        price_change_percent: 1.2,
        average_volume: "1.8M".to_string(),
        rsi: 58.0,
        macd_status: MacdStatus::Bullish,
        match_score,
        rationale: "Trending.".to_string(),
        sparkline_data: vec![42.0; 24],
    }
}

#[async_trait::async_trait]
impl MarketDataGateway for FakeGateway {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn fetch_batch_ideas(&self) -> anyhow::Result<Vec<AiStock>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.ideas
            .clone()
            .ok_or_else(|| anyhow::anyhow!("AI batch response was not a list of stocks"))
    }

    async fn fetch_raw_metrics(&self, ticker: &str) -> anyhow::Result<Option<RawMetrics>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(ticker.to_string());
        }
        match self.metrics.get(ticker) {
            Some(m) => Ok(*m),
            None => anyhow::bail!("failed to fetch raw metrics for {ticker}: connection reset"),
        }
    }

    async fn fetch_full_evaluation(&self, ticker: &str) -> anyhow::Result<AiStock> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.metrics.get(ticker) {
            Some(_) => Ok(stock(ticker, 75)),
            None => anyhow::bail!("Failed to get a valid AI evaluation for {ticker}. Please try again."),
        }
    }
}
