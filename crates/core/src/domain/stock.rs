use serde::{Deserialize, Serialize};
use std::fmt;

/// Nominal length of `AiStock::sparkline_data` (one point per hour of the session).
pub const SPARKLINE_POINTS: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacdStatus {
    Bullish,
    Bearish,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl MacdStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MacdStatus::Bullish => "Bullish",
            MacdStatus::Bearish => "Bearish",
            MacdStatus::NotAvailable => "N/A",
        }
    }
}

impl fmt::Display for MacdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation-ready stock, scored by the model itself (`match_score` is 1..=100,
/// unrelated to the 0..=4 rule score).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiStock {
    pub ticker: String,
    pub company_name: String,
    pub current_price: f64,
    pub price_change: f64,
    pub price_change_percent: f64,
    pub average_volume: String,
    pub rsi: f64,
    pub macd_status: MacdStatus,
    pub match_score: u8,
    pub rationale: String,
    pub sparkline_data: Vec<f64>,
}

impl AiStock {
    pub fn is_up(&self) -> bool {
        self.price_change >= 0.0
    }

    /// `+1.23 (+0.45%)` / `-1.23 (-0.45%)`.
    pub fn day_change_label(&self) -> String {
        let sign = if self.is_up() { "+" } else { "" };
        format!(
            "{sign}{:.2} ({sign}{:.2}%)",
            self.price_change, self.price_change_percent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stock(change: f64, pct: f64) -> AiStock {
        AiStock {
            ticker: "AAPL".to_string(),
            company_name: "Apple Inc.".to_string(),
            current_price: 190.0,
            price_change: change,
            price_change_percent: pct,
            average_volume: "55.2M".to_string(),
            rsi: 61.0,
            macd_status: MacdStatus::Bullish,
            match_score: 80,
            rationale: "Clean uptrend.".to_string(),
            sparkline_data: vec![1.0; SPARKLINE_POINTS],
        }
    }

    #[test]
    fn day_change_label_signs() {
        assert_eq!(stock(1.5, 0.79).day_change_label(), "+1.50 (+0.79%)");
        assert_eq!(stock(-2.0, -1.05).day_change_label(), "-2.00 (-1.05%)");
        assert_eq!(stock(0.0, 0.0).day_change_label(), "+0.00 (+0.00%)");
    }

    #[test]
    fn macd_not_available_uses_wire_value() {
        let v = serde_json::to_value(MacdStatus::NotAvailable).unwrap();
        assert_eq!(v, serde_json::json!("N/A"));
        let back: MacdStatus = serde_json::from_str("\"N/A\"").unwrap();
        assert_eq!(back, MacdStatus::NotAvailable);
    }
}
