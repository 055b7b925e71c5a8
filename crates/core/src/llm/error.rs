use crate::llm::{Operation, Provider};
use serde_json::Value;
use std::fmt;

/// Transport-level or provider-level failure, carrying whatever the provider sent back
/// so callers can log it.
#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Provider,
    pub operation: Operation,
    pub ticker: Option<String>,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LLM error (provider={:?}, operation={}",
            self.provider, self.operation
        )?;
        if let Some(ticker) = &self.ticker {
            write!(f, ", ticker={ticker}")?;
        }
        write!(f, ", stage={}): {}", self.stage, self.detail)
    }
}

impl std::error::Error for LlmDiagnosticsError {}
