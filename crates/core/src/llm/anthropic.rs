use crate::config::Settings;
use crate::criteria;
use crate::domain::contract::{self, MAX_IDEAS, MIN_IDEAS};
use crate::domain::metrics::RawMetrics;
use crate::domain::stock::{AiStock, SPARKLINE_POINTS};
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::json;
use crate::llm::{MarketDataGateway, Operation, Provider};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-latest";
const DEFAULT_MAX_TOKENS: u32 = 2048;
// Ten stocks with 24-point sparklines do not fit in the single-ticker budget.
const BATCH_MAX_TOKENS: u32 = 8192;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const EVALUATION_TEMPERATURE: f32 = 0.2;

const TOOL_EMIT_RAW_METRICS: &str = "emit_raw_metrics";
const TOOL_EMIT_EVALUATION: &str = "emit_evaluation";
const TOOL_EMIT_STOCK_IDEAS: &str = "emit_stock_ideas";

const STOCK_REQUIRED: [&str; 11] = [
    "ticker",
    "companyName",
    "currentPrice",
    "priceChange",
    "priceChangePercent",
    "averageVolume",
    "rsi",
    "macdStatus",
    "matchScore",
    "rationale",
    "sparklineData",
];

const RAW_METRICS_REQUIRED: [&str; 8] = [
    "price",
    "fiftyDayMA",
    "twoHundredDayMA",
    "rsi",
    "volume",
    "avgVolume",
    "recentHigh",
    "recentLow",
];

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_anthropic_api_key()?.to_string();
        let base_url =
            std::env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let max_tokens = std::env::var("ANTHROPIC_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let timeout_secs = std::env::var("ANTHROPIC_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
            max_tokens,
        })
    }

    async fn create_message(
        &self,
        operation: Operation,
        ticker: Option<&str>,
        req: CreateMessageRequest,
    ) -> anyhow::Result<CreateMessageResponse> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        let started = std::time::Instant::now();
        let res = self
            .http
            .post(url)
            .headers(headers)
            .json(&req)
            .send()
            .await
            .context("Anthropic request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Anthropic response body")?;
        tracing::debug!(
            %operation,
            ticker,
            %status,
            elapsed_ms = started.elapsed().as_millis(),
            "Anthropic response received"
        );

        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<Value>(&text).ok();
            return Err(LlmDiagnosticsError {
                provider: Provider::Anthropic,
                operation,
                ticker: ticker.map(str::to_string),
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
                raw_response_json,
            }
            .into());
        }

        let parsed = serde_json::from_str::<CreateMessageResponse>(&text)
            .with_context(|| format!("failed to decode Anthropic response: {text}"))?;

        if matches!(parsed.stop_reason.as_deref(), Some("max_tokens")) {
            tracing::warn!(%operation, ticker, max_tokens = req.max_tokens, "Anthropic stop_reason=max_tokens; output may be truncated");
        }

        Ok(parsed)
    }

    fn request(
        &self,
        tool: Tool,
        prompt: String,
        max_tokens: u32,
        temperature: Option<f32>,
    ) -> CreateMessageRequest {
        CreateMessageRequest {
            model: self.model.clone(),
            max_tokens,
            system: Some(Self::system_prompt()),
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature,
            tool_choice: Some(ToolChoice::Tool { name: tool.name }),
            tools: Some(vec![tool]),
        }
    }

    fn stock_schema() -> Value {
        json!({
            "type": "object",
            "required": STOCK_REQUIRED,
            "properties": {
                "ticker": {"type": "string", "description": "The stock ticker symbol, e.g., AAPL."},
                "companyName": {"type": "string", "description": "The full name of the company."},
                "currentPrice": {"type": "number", "description": "The current or last closing stock price."},
                "priceChange": {"type": "number", "description": "The dollar change in price for the day."},
                "priceChangePercent": {"type": "number", "description": "The percentage change in price for the day."},
                "averageVolume": {"type": "string", "description": "The 30-day average trading volume, formatted as a string (e.g., '1.5M', '10.2M')."},
                "rsi": {"type": "number", "description": "The current 14-day Relative Strength Index (RSI) value."},
                "macdStatus": {"type": "string", "enum": ["Bullish", "Bearish", "N/A"], "description": "'Bullish' if the MACD line is above the signal line, otherwise 'Bearish'."},
                "matchScore": {"type": "integer", "minimum": 1, "maximum": 100, "description": "A score from 1 to 100 indicating how well the stock fits all criteria."},
                "rationale": {"type": "string", "description": "A brief, 1-2 sentence explanation of the stock's strengths and weaknesses against the strategy."},
                "sparklineData": {
                    "type": "array",
                    "minItems": SPARKLINE_POINTS,
                    "maxItems": SPARKLINE_POINTS,
                    "items": {"type": "number"},
                    "description": "Price points for a 1-day sparkline chart."
                }
            }
        })
    }

    fn raw_metrics_tool() -> Tool {
        Tool {
            name: TOOL_EMIT_RAW_METRICS,
            description: "Emit the market metrics for one ticker as structured JSON",
            input_schema: json!({
                "type": "object",
                "required": RAW_METRICS_REQUIRED,
                "properties": {
                    "price": {"type": "number", "description": "Current trading price of the stock."},
                    "fiftyDayMA": {"type": "number", "description": "50-day moving average."},
                    "twoHundredDayMA": {"type": "number", "description": "200-day moving average."},
                    "rsi": {"type": "number", "description": "14-day Relative Strength Index (RSI)."},
                    "volume": {"type": "number", "description": "Current day's trading volume."},
                    "avgVolume": {"type": "number", "description": "Average daily trading volume over the last 30 days."},
                    "recentHigh": {"type": "number", "description": "The highest price in the last 20 trading days."},
                    "recentLow": {"type": "number", "description": "The lowest price in the last 20 trading days."}
                }
            }),
        }
    }

    fn evaluation_tool() -> Tool {
        Tool {
            name: TOOL_EMIT_EVALUATION,
            description: "Emit the swing-trading evaluation of one ticker as structured JSON",
            input_schema: Self::stock_schema(),
        }
    }

    fn stock_ideas_tool() -> Tool {
        Tool {
            name: TOOL_EMIT_STOCK_IDEAS,
            description: "Emit the ranked list of stock ideas as structured JSON",
            input_schema: json!({
                "type": "object",
                "required": ["stocks"],
                "properties": {
                    "stocks": {
                        "type": "array",
                        "minItems": MIN_IDEAS,
                        "maxItems": MAX_IDEAS,
                        "items": Self::stock_schema()
                    }
                }
            }),
        }
    }

    fn system_prompt() -> String {
        [
            "You are a market data and swing-trading analysis engine for US-listed equities.",
            "Respond ONLY through the provided tool. Do not add prose.",
            "All numbers must be plausible for today's market conditions and internally consistent.",
        ]
        .join("\n")
    }

    fn raw_metrics_prompt(ticker: &str) -> String {
        format!(
            "Generate realistic, current financial market data for the stock ticker \"{ticker}\". \
The data should be plausible for today's market conditions. Ensure the moving averages are \
logically consistent with the current price. For example, in a strong uptrend, price > 50d MA > 200d MA."
        )
    }

    fn evaluation_prompt(ticker: &str) -> String {
        format!(
            "Perform a detailed analysis of the stock with the ticker symbol \"{ticker}\" based on the \
swing trading strategy below. Evaluate how well this specific stock meets each criterion. Even if \
the stock is a poor match, you must still provide the analysis and all requested data points.\n\n\
Swing Trading Strategy Criteria:\n{criteria}\n\n\
Based on your analysis, provide a matchScore from 1-100 and a rationale explaining its strengths and \
weaknesses against the strategy. sparklineData must contain exactly {SPARKLINE_POINTS} price points \
for a 1-day chart.",
            criteria = criteria::prompt_block(),
        )
    }

    fn ideas_prompt() -> String {
        format!(
            "Scan US-listed stocks and return between {MIN_IDEAS} and {MAX_IDEAS} that currently best \
match the swing trading strategy below, ordered from best to worst match.\n\n\
Swing Trading Strategy Criteria:\n{criteria}\n\n\
For each stock provide every requested data point, a matchScore from 1-100, a short rationale, and \
exactly {SPARKLINE_POINTS} sparkline price points for a 1-day chart. Return an empty list if nothing \
qualifies.",
            criteria = criteria::prompt_block(),
        )
    }

    fn response_text(res: &CreateMessageResponse) -> String {
        let mut out = String::new();
        for block in &res.content {
            if let ContentBlock::Text { text } = block {
                if !out.is_empty() {
                    out.push('\n');
                }
                out.push_str(text);
            }
        }
        out
    }

    fn response_tool_input(res: &CreateMessageResponse, tool_name: &str) -> Option<Value> {
        res.content.iter().find_map(|block| match block {
            ContentBlock::ToolUse { name, input, .. } if name == tool_name => Some(input.clone()),
            _ => None,
        })
    }

    /// Prefer the forced tool call; fall back to JSON in the text (possibly fenced).
    fn payload(res: &CreateMessageResponse, tool_name: &str) -> anyhow::Result<Value> {
        if let Some(input) = Self::response_tool_input(res, tool_name) {
            return Ok(input);
        }
        tracing::debug!(tool_name, "no tool_use block; falling back to text output");
        json::parse_value(&Self::response_text(res))
    }
}

#[async_trait::async_trait]
impl MarketDataGateway for AnthropicClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn fetch_batch_ideas(&self) -> anyhow::Result<Vec<AiStock>> {
        let req = self.request(
            Self::stock_ideas_tool(),
            Self::ideas_prompt(),
            self.max_tokens.max(BATCH_MAX_TOKENS),
            Some(EVALUATION_TEMPERATURE),
        );
        let res = self
            .create_message(Operation::BatchIdeas, None, req)
            .await
            .context("stock idea scan request failed")?;
        let ideas = contract::validate_stock_ideas(Self::payload(&res, TOOL_EMIT_STOCK_IDEAS)?)?;
        tracing::info!(count = ideas.len(), "received stock ideas");
        Ok(ideas)
    }

    async fn fetch_raw_metrics(&self, ticker: &str) -> anyhow::Result<Option<RawMetrics>> {
        let req = self.request(
            Self::raw_metrics_tool(),
            Self::raw_metrics_prompt(ticker),
            self.max_tokens,
            None,
        );
        let res = self
            .create_message(Operation::RawMetrics, Some(ticker), req)
            .await
            .with_context(|| format!("failed to fetch raw metrics for {ticker}"))?;
        let payload = Self::payload(&res, TOOL_EMIT_RAW_METRICS)
            .with_context(|| format!("malformed raw metrics for {ticker}"))?;
        json::raw_metrics_from_value(payload, ticker)
    }

    async fn fetch_full_evaluation(&self, ticker: &str) -> anyhow::Result<AiStock> {
        let result = async {
            let req = self.request(
                Self::evaluation_tool(),
                Self::evaluation_prompt(ticker),
                self.max_tokens,
                Some(EVALUATION_TEMPERATURE),
            );
            let res = self
                .create_message(Operation::FullEvaluation, Some(ticker), req)
                .await?;
            json::stock_from_value(Self::payload(&res, TOOL_EMIT_EVALUATION)?)
        }
        .await;

        match result {
            Ok(stock) => {
                if !stock.ticker.eq_ignore_ascii_case(ticker) {
                    tracing::warn!(requested = ticker, returned = %stock.ticker, "model evaluated a different ticker");
                }
                Ok(stock)
            }
            Err(err) => {
                tracing::error!(ticker, error = %format!("{err:#}"), "full evaluation failed");
                Err(err.context(format!(
                    "Failed to get a valid AI evaluation for {ticker}. Please try again."
                )))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct CreateMessageRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Clone, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Clone, Deserialize)]
struct CreateMessageResponse {
    content: Vec<ContentBlock>,

    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct Tool {
    name: &'static str,
    description: &'static str,
    input_schema: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
enum ToolChoice {
    #[serde(rename = "tool")]
    Tool { name: &'static str },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(default)]
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: Value,
    },

    #[serde(other)]
    Unknown,
}
