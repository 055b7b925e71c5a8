use crate::domain::metrics::RawMetrics;
use crate::domain::ranked::{RankedEntry, RankedStock};
use crate::domain::stock::AiStock;
use crate::screener::evaluate;

/// Rule score at or above which a ticker counts as a strong match.
pub const STRONG_MATCH_SCORE: u8 = 3;
const TOP_PERFORMERS: usize = 5;

/// Anything that can be ordered by a single integer score.
pub trait Scored {
    fn score(&self) -> u32;
    fn set_rank(&mut self, rank: Option<u32>);
}

impl Scored for RankedEntry {
    fn score(&self) -> u32 {
        u32::from(self.verdict.score)
    }

    fn set_rank(&mut self, rank: Option<u32>) {
        self.rank = rank;
    }
}

impl Scored for RankedStock {
    fn score(&self) -> u32 {
        u32::from(self.stock.match_score)
    }

    fn set_rank(&mut self, rank: Option<u32>) {
        self.rank = rank;
    }
}

/// Stable sort by score descending (ties keep input order), then `rank = index + 1`.
/// Ranks are dense and never shared.
fn assign_ranks<T: Scored>(mut items: Vec<T>) -> Vec<T> {
    items.sort_by(|a, b| b.score().cmp(&a.score()));
    for (idx, item) in items.iter_mut().enumerate() {
        item.set_rank(Some(idx as u32 + 1));
    }
    items
}

pub fn rank(entries: Vec<(String, RawMetrics)>) -> Vec<RankedEntry> {
    let evaluated = entries
        .into_iter()
        .map(|(ticker, metrics)| RankedEntry {
            verdict: evaluate(&metrics),
            ticker,
            metrics,
            rank: None,
        })
        .collect();
    assign_ranks(evaluated)
}

/// Re-evaluates and re-ranks an existing collection. Verdicts are recomputed from the
/// metrics and previous rank values are ignored.
pub fn rerank(entries: Vec<RankedEntry>) -> Vec<RankedEntry> {
    rank(
        entries
            .into_iter()
            .map(|entry| (entry.ticker, entry.metrics))
            .collect(),
    )
}

pub fn rank_stocks(stocks: Vec<AiStock>) -> Vec<RankedStock> {
    assign_ranks(
        stocks
            .into_iter()
            .map(|stock| RankedStock { stock, rank: None })
            .collect(),
    )
}

/// Strong matches only, best five, in ranked order.
pub fn top_performers(entries: &[RankedEntry]) -> Vec<RankedEntry> {
    entries
        .iter()
        .filter(|e| e.verdict.score >= STRONG_MATCH_SCORE)
        .take(TOP_PERFORMERS)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stock::MacdStatus;

    // Passes `score` criteria: momentum, then volume, then price action, then trend.
    fn metrics_with_score(score: u8) -> RawMetrics {
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

    fn input(pairs: &[(&str, u8)]) -> Vec<(String, RawMetrics)> {
        pairs
            .iter()
            .map(|(t, s)| (t.to_string(), metrics_with_score(*s)))
            .collect()
    }

    fn order(entries: &[RankedEntry]) -> Vec<(&str, Option<u32>)> {
        entries.iter().map(|e| (e.ticker.as_str(), e.rank)).collect()
    }

    #[test]
    fn fixture_scores_are_what_they_claim() {
        for s in 0..=4 {
            assert_eq!(evaluate(&metrics_with_score(s)).score, s);
        }
    }

    #[test]
    fn ties_keep_input_order() {
        let ranked = rank(input(&[("A", 2), ("B", 3), ("C", 2)]));
        assert_eq!(
            order(&ranked),
            vec![("B", Some(1)), ("A", Some(2)), ("C", Some(3))]
        );
    }

    #[test]
    fn ranks_are_dense_even_for_equal_scores() {
        let ranked = rank(input(&[("A", 3), ("B", 3), ("C", 4)]));
        let ranks: Vec<_> = ranked.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(ranked[0].ticker, "C");
    }

    #[test]
    fn appended_ticker_loses_ties_to_earlier_ones() {
        let mut ranked = rank(input(&[("A", 2), ("B", 3)]));
        let mut added = rank(input(&[("C", 3)]));
        ranked.append(&mut added);
        let reranked = rerank(ranked);
        assert_eq!(
            order(&reranked),
            vec![("B", Some(1)), ("C", Some(2)), ("A", Some(3))]
        );
    }

    #[test]
    fn rerank_ignores_stale_ranks_and_verdicts() {
        let mut ranked = rank(input(&[("A", 1), ("B", 2)]));
        // Metrics changed underneath: A becomes the stronger ticker.
        ranked[1].metrics = metrics_with_score(4);
        ranked[1].rank = Some(99);
        let reranked = rerank(ranked);
        assert_eq!(reranked[0].ticker, "A");
        assert_eq!(reranked[0].verdict.score, 4);
        assert_eq!(reranked[0].rank, Some(1));
    }

    #[test]
    fn top_performers_filters_before_truncating() {
        let ranked = rank(input(&[
            ("A", 4),
            ("B", 2),
            ("C", 3),
            ("D", 3),
            ("E", 4),
            ("F", 3),
            ("G", 3),
            ("H", 1),
        ]));
        let top = top_performers(&ranked);
        let tickers: Vec<_> = top.iter().map(|e| e.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["A", "E", "C", "D", "F"]);
    }

    #[test]
    fn top_performers_can_be_short_or_empty() {
        let ranked = rank(input(&[("A", 2), ("B", 3)]));
        assert_eq!(top_performers(&ranked).len(), 1);
        assert!(top_performers(&rank(input(&[("A", 0)]))).is_empty());
    }

    #[test]
    fn model_picks_rank_by_match_score() {
        let stock = |t: &str, score: u8| AiStock {
            ticker: t.to_string(),
            company_name: t.to_string(),
            current_price: 10.0,
            price_change: 0.1,
            price_change_percent: 1.0,
            average_volume: "1.0M".to_string(),
            rsi: 55.0,
            macd_status: MacdStatus::Bullish,
            match_score: score,
            rationale: String::new(),
            sparkline_data: vec![],
        };
        let ranked = rank_stocks(vec![stock("X", 70), stock("Y", 92), stock("Z", 70)]);
        let got: Vec<_> = ranked
            .iter()
            .map(|r| (r.stock.ticker.as_str(), r.rank))
            .collect();
        assert_eq!(got, vec![("Y", Some(1)), ("X", Some(2)), ("Z", Some(3))]);
    }
}
