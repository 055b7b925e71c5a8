use crate::domain::contract::{LlmRawMetrics, LlmStock, MISSING_TICKER};
use crate::domain::metrics::RawMetrics;
use crate::domain::stock::AiStock;
use anyhow::{bail, Context};
use serde_json::Value;

pub fn extract_json(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        // Remove Markdown fences (```json ... ``` or ``` ... ```), with or without a newline.
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        let mut inner = &rest[tag_len..];
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
        return Some(inner.trim().to_string());
    }

    // Best-effort extraction: first opening bracket to the last matching closer.
    let start = trimmed.find(|c| c == '{' || c == '[')?;
    let close = if trimmed[start..].starts_with('{') { '}' } else { ']' };
    let end = trimmed.rfind(close)?;
    if end <= start {
        return None;
    }
    Some(trimmed[start..=end].trim().to_string())
}

pub fn parse_value(text: &str) -> anyhow::Result<Value> {
    let json_str = extract_json(text).unwrap_or_else(|| text.trim().to_string());
    serde_json::from_str::<Value>(&json_str)
        .with_context(|| format!("model output is not valid JSON: {json_str}"))
}

pub fn raw_metrics_from_value(value: Value, ticker: &str) -> anyhow::Result<Option<RawMetrics>> {
    let parsed = serde_json::from_value::<LlmRawMetrics>(value)
        .with_context(|| format!("model output for {ticker} does not match the raw metrics schema"))?;
    Ok(parsed.validate_and_into_metrics(ticker))
}

pub fn stock_from_value(value: Value) -> anyhow::Result<AiStock> {
    let Some(obj) = value.as_object() else {
        bail!("AI evaluation response was not a JSON object");
    };
    // Checked up front so a missing ticker is what gets reported, whatever else is missing.
    if !obj.get("ticker").is_some_and(Value::is_string) {
        bail!(MISSING_TICKER);
    }

    let parsed = serde_json::from_value::<LlmStock>(value)
        .context("AI evaluation response does not match the stock schema")?;
    parsed.validate_and_into_stock()
}
