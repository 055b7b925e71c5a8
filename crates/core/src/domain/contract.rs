use crate::domain::metrics::RawMetrics;
use crate::domain::stock::{AiStock, MacdStatus, SPARKLINE_POINTS};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MIN_IDEAS: usize = 5;
pub const MAX_IDEAS: usize = 10;

pub const MISSING_TICKER: &str = "AI response was missing required field `ticker`";
pub const NOT_A_LIST: &str = "AI batch response was not a list of stocks";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmRawMetrics {
    pub price: f64,
    #[serde(rename = "fiftyDayMA")]
    pub fifty_day_ma: f64,
    #[serde(rename = "twoHundredDayMA")]
    pub two_hundred_day_ma: f64,
    pub rsi: f64,
    pub volume: f64,
    pub avg_volume: f64,
    pub recent_high: f64,
    pub recent_low: f64,
}

impl LlmRawMetrics {
    /// `None` when the price is not a positive number ("no data available").
    pub fn validate_and_into_metrics(self, ticker: &str) -> Option<RawMetrics> {
        if !self.price.is_finite() || self.price <= 0.0 {
            tracing::warn!(ticker, price = self.price, "model returned a non-positive price");
            return None;
        }

        Some(RawMetrics {
            price: self.price,
            fifty_day_ma: self.fifty_day_ma,
            two_hundred_day_ma: self.two_hundred_day_ma,
            rsi: self.rsi,
            volume: self.volume,
            avg_volume: self.avg_volume,
            recent_high: self.recent_high,
            recent_low: self.recent_low,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmStock {
    #[serde(default)]
    pub ticker: Option<String>,
    pub company_name: String,
    pub current_price: f64,
    pub price_change: f64,
    pub price_change_percent: f64,
    /// Usually a formatted string ("2.1M"); some models emit a bare number.
    pub average_volume: Value,
    pub rsi: f64,
    pub macd_status: MacdStatus,
    pub match_score: f64,
    pub rationale: String,
    pub sparkline_data: Vec<f64>,
}

impl LlmStock {
    pub fn validate_and_into_stock(self) -> anyhow::Result<AiStock> {
        let ticker = self
            .ticker
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty())
            .context(MISSING_TICKER)?;

        let company_name = match self.company_name.trim() {
            "" => ticker.clone(),
            name => name.to_string(),
        };

        if !self.match_score.is_finite() {
            bail!("matchScore for {ticker} is not a number");
        }
        let raw_score = self.match_score.round();
        let match_score = raw_score.clamp(1.0, 100.0) as u8;
        if raw_score != f64::from(match_score) {
            tracing::warn!(%ticker, raw = self.match_score, clamped = match_score, "matchScore out of range; clamped");
        }

        let average_volume = match self.average_volume {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.as_f64().map(format_volume).unwrap_or_default(),
            _ => "N/A".to_string(),
        };

        if self.sparkline_data.len() != SPARKLINE_POINTS {
            tracing::debug!(
                %ticker,
                points = self.sparkline_data.len(),
                "sparkline length differs from the nominal 24 points"
            );
        }

        Ok(AiStock {
            ticker,
            company_name,
            current_price: self.current_price,
            price_change: self.price_change,
            price_change_percent: self.price_change_percent,
            average_volume,
            rsi: self.rsi,
            macd_status: self.macd_status,
            match_score,
            rationale: self.rationale.trim().to_string(),
            sparkline_data: self.sparkline_data,
        })
    }
}

/// Accepts either a bare JSON array of stocks or an object wrapping it under `stocks`.
pub fn validate_stock_ideas(payload: Value) -> anyhow::Result<Vec<AiStock>> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("stocks") {
            Some(Value::Array(items)) => items,
            _ => bail!(NOT_A_LIST),
        },
        _ => bail!(NOT_A_LIST),
    };

    let mut stocks = Vec::with_capacity(items.len().min(MAX_IDEAS));
    for (idx, item) in items.into_iter().enumerate() {
        let parsed = serde_json::from_value::<LlmStock>(item)
            .with_context(|| format!("stock idea #{} does not match the stock schema", idx + 1))?;
        stocks.push(parsed.validate_and_into_stock()?);
    }

    if stocks.len() > MAX_IDEAS {
        tracing::warn!(got = stocks.len(), max = MAX_IDEAS, "too many stock ideas; truncating");
        stocks.truncate(MAX_IDEAS);
    } else if !stocks.is_empty() && stocks.len() < MIN_IDEAS {
        tracing::warn!(got = stocks.len(), min = MIN_IDEAS, "fewer stock ideas than requested");
    }

    Ok(stocks)
}

pub fn format_volume(v: f64) -> String {
    if v >= 1_000_000_000.0 {
        format!("{:.1}B", v / 1_000_000_000.0)
    } else if v >= 1_000_000.0 {
        format!("{:.1}M", v / 1_000_000.0)
    } else if v >= 1_000.0 {
        format!("{:.1}K", v / 1_000.0)
    } else {
        format!("{:.0}", v)
    }
}
