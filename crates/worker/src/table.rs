use std::fmt::Write;

use swingscan_core::criteria::STRATEGY_CRITERIA;
use swingscan_core::dashboard::TickerFailure;
use swingscan_core::domain::ranked::{Picks, RankedEntry, RankedStock};
use swingscan_core::domain::stock::AiStock;
use swingscan_core::screener::STRONG_MATCH_SCORE;

const SPARK_BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub fn render_picks(picks: &Picks) -> String {
    match picks {
        Picks::Rules(entries) => render_rules(entries),
        Picks::Model(stocks) => render_model(stocks),
    }
}

pub fn render_rules(entries: &[RankedEntry]) -> String {
    if entries.is_empty() {
        return "No tickers evaluated.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:<6} {:>6} {:<5} {:<5} {:<5} {:<5} {:>9} {:>9} {:>9} {:>6} {:>6} {:>9}  {}",
        "#", "TICKER", "SCORE", "TREND", "MOM", "VOL", "PA", "PRICE", "50MA", "200MA", "RSI", "RELVOL", "HIGH", "FAILS"
    );
    for e in entries {
        let rank = e.rank.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());
        let flag = if e.verdict.score < STRONG_MATCH_SCORE { "!" } else { " " };
        let fails = e
            .verdict
            .fails
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let _ = writeln!(
            out,
            "{:>3}  {:<6} {:>3}/4{} {:<5} {:<5} {:<5} {:<5} {:>9.2} {:>9.2} {:>9.2} {:>6.1} {:>6.2} {:>9.2}  {}",
            rank,
            e.ticker,
            e.verdict.score,
            flag,
            yes_no(e.verdict.trend),
            yes_no(e.verdict.momentum),
            yes_no(e.verdict.volume_sufficient),
            yes_no(e.verdict.price_action),
            e.metrics.price,
            e.metrics.fifty_day_ma,
            e.metrics.two_hundred_day_ma,
            e.metrics.rsi,
            e.metrics.relative_volume(),
            e.metrics.recent_high,
            if fails.is_empty() { "-" } else { fails.as_str() },
        );
    }
    let _ = writeln!(out, "! score below {STRONG_MATCH_SCORE}/4");
    out
}

pub fn render_model(stocks: &[RankedStock]) -> String {
    if stocks.is_empty() {
        return "No matching stocks found. Market conditions may be unfavorable.\n".to_string();
    }
    stocks
        .iter()
        .map(|s| render_card(&s.stock, s.rank))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_card(stock: &AiStock, rank: Option<u32>) -> String {
    let mut out = String::new();
    let prefix = rank.map(|r| format!("#{r} ")).unwrap_or_default();
    let _ = writeln!(
        out,
        "{prefix}{} ({})  match {}%",
        stock.company_name, stock.ticker, stock.match_score
    );
    let _ = writeln!(
        out,
        "    ${:.2}  {}  RSI {:.1}  MACD {}  avg vol {}",
        stock.current_price,
        stock.day_change_label(),
        stock.rsi,
        stock.macd_status,
        stock.average_volume
    );
    if !stock.sparkline_data.is_empty() {
        let _ = writeln!(out, "    {}", sparkline(&stock.sparkline_data));
    }
    if !stock.rationale.is_empty() {
        let _ = writeln!(out, "    {}", stock.rationale);
    }
    out
}

pub fn render_failures(failures: &[TickerFailure]) -> String {
    let mut out = String::new();
    for f in failures {
        let _ = writeln!(out, "  {:<6} {}", f.ticker, f.reason);
    }
    out
}

pub fn render_criteria() -> String {
    let mut out = String::new();
    for c in &STRATEGY_CRITERIA {
        let _ = writeln!(out, "{}", c.name);
        for rule in c.rules {
            let _ = writeln!(out, "  - {rule}");
        }
        let _ = writeln!(out, "  checked: {}", c.enforced);
    }
    out
}

/// Scales the series into eight bar heights. A flat series renders at the lowest bar.
pub fn sparkline(points: &[f64]) -> String {
    let finite: Vec<f64> = points.iter().copied().filter(|p| p.is_finite()).collect();
    let Some(min) = finite.iter().copied().reduce(f64::min) else {
        return String::new();
    };
    let max = finite.iter().copied().fold(min, f64::max);
    let span = max - min;
    finite
        .iter()
        .map(|p| {
            if span <= 0.0 {
                return SPARK_BARS[0];
            }
            let idx = ((p - min) / span * (SPARK_BARS.len() - 1) as f64).round() as usize;
            SPARK_BARS[idx.min(SPARK_BARS.len() - 1)]
        })
        .collect()
}

fn yes_no(passed: bool) -> &'static str {
    if passed {
        "yes"
    } else {
        "no"
    }
}
