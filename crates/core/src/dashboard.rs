use crate::domain::metrics::RawMetrics;
use crate::domain::ranked::{Picks, RankedEntry, ScoreBasis};
use crate::domain::stock::AiStock;
use crate::llm::MarketDataGateway;
use crate::screener;
use crate::sink::PickSink;
use crate::storage::snapshots::{ExportOutcome, SnapshotExporter};
use crate::storage::watchlist::{self, WatchlistStore};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickerFailure {
    pub ticker: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub scan_id: Uuid,
    #[serde(flatten)]
    pub picks: Picks,
    pub failures: Vec<TickerFailure>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddReport {
    pub added: Vec<String>,
    pub skipped: Vec<String>,
    pub failures: Vec<TickerFailure>,
    #[serde(flatten)]
    pub picks: Picks,
}

/// Owns the working collection and the collaborators that fill it.
pub struct Dashboard {
    gateway: Arc<dyn MarketDataGateway>,
    watchlist: WatchlistStore,
    exporter: SnapshotExporter,
    picks: Mutex<Picks>,
}

impl Dashboard {
    pub fn new(
        gateway: Arc<dyn MarketDataGateway>,
        watchlist: WatchlistStore,
        exporter: SnapshotExporter,
    ) -> Self {
        Self {
            gateway,
            watchlist,
            exporter,
            picks: Mutex::new(Picks::default()),
        }
    }

    pub fn watchlist(&self) -> &WatchlistStore {
        &self.watchlist
    }

    pub fn exporter(&self) -> &SnapshotExporter {
        &self.exporter
    }

    pub async fn picks(&self) -> Picks {
        self.picks.lock().await.clone()
    }

    /// Strong rule matches from the current collection; empty when the collection is model-scored.
    pub async fn top_performers(&self) -> Vec<RankedEntry> {
        match &*self.picks.lock().await {
            Picks::Rules(entries) => screener::top_performers(entries),
            Picks::Model(_) => Vec::new(),
        }
    }

    /// Replaces the working collection. On a pipeline-level failure the collection is cleared.
    pub async fn run_scan(&self, basis: ScoreBasis) -> anyhow::Result<ScanReport> {
        let scan_id = Uuid::new_v4();
        tracing::info!(%scan_id, %basis, provider = ?self.gateway.provider(), "scan started");

        let result = match basis {
            ScoreBasis::Model => self
                .gateway
                .fetch_batch_ideas()
                .await
                .map(|ideas| (Picks::Model(screener::rank_stocks(ideas)), Vec::new())),
            ScoreBasis::Rules => {
                let tickers = self.watchlist.load().await;
                let (fetched, failures) = self.fetch_metrics(&tickers).await;
                Ok((Picks::Rules(screener::rank(fetched)), failures))
            }
        };

        let mut current = self.picks.lock().await;
        match result {
            Ok((picks, failures)) => {
                *current = picks.clone();
                tracing::info!(
                    %scan_id,
                    %basis,
                    count = picks.len(),
                    failed = failures.len(),
                    "scan finished"
                );
                Ok(ScanReport {
                    scan_id,
                    picks,
                    failures,
                })
            }
            Err(err) => {
                *current = match basis {
                    ScoreBasis::Rules => Picks::Rules(Vec::new()),
                    ScoreBasis::Model => Picks::Model(Vec::new()),
                };
                tracing::error!(%scan_id, %basis, error = %format!("{err:#}"), "scan failed");
                Err(err)
            }
        }
    }

    /// Evaluates new symbols and merges them into the rule-scored collection. Symbols already
    /// in that collection or on the watch-list are skipped.
    pub async fn add_tickers(&self, symbols: &[String]) -> anyhow::Result<AddReport> {
        let tracked = self.picks.lock().await.clone();
        let watched = self.watchlist.load().await;
        let mut requested: Vec<String> = Vec::new();
        let mut skipped = Vec::new();
        for symbol in symbols {
            let ticker = symbol.trim().to_uppercase();
            if ticker.is_empty() {
                continue;
            }
            let already = requested.contains(&ticker)
                || watched.contains(&ticker)
                || (tracked.basis() == ScoreBasis::Rules && tracked.contains(&ticker));
            if already {
                skipped.push(ticker);
            } else {
                requested.push(ticker);
            }
        }

        let (fetched, failures) = self.fetch_metrics(&requested).await;

        let mut added = Vec::new();
        let picks = {
            let mut current = self.picks.lock().await;
            if fetched.is_empty() {
                return Ok(AddReport {
                    added,
                    skipped,
                    failures,
                    picks: current.clone(),
                });
            }
            let mut entries = match std::mem::take(&mut *current) {
                Picks::Rules(entries) => entries,
                Picks::Model(_) => {
                    tracing::info!("adding to a model-scored collection; starting a rule-scored one");
                    Vec::new()
                }
            };
            for (ticker, metrics) in fetched {
                // Another add may have landed the same ticker while we were fetching.
                if entries.iter().any(|e| e.ticker == ticker) {
                    skipped.push(ticker);
                    continue;
                }
                added.push(ticker.clone());
                entries.push(RankedEntry {
                    verdict: screener::evaluate(&metrics),
                    ticker,
                    metrics,
                    rank: None,
                });
            }
            *current = Picks::Rules(screener::rerank(entries));
            current.clone()
        };

        for ticker in &added {
            if !self.watchlist.add(ticker).await? {
                tracing::debug!(ticker = %ticker, "already on the watch-list");
            }
        }

        tracing::info!(
            added = added.len(),
            skipped = skipped.len(),
            failed = failures.len(),
            "tickers added"
        );
        Ok(AddReport {
            added,
            skipped,
            failures,
            picks,
        })
    }

    pub async fn import_watchlist_csv(&self, raw: &str) -> anyhow::Result<AddReport> {
        let tickers = watchlist::import_from_delimited_text(raw);
        tracing::info!(count = tickers.len(), "importing tickers from CSV");
        self.add_tickers(&tickers).await
    }

    /// Model-scored card for one ticker. Does not touch the working collection.
    pub async fn evaluate_ticker(&self, ticker: &str) -> anyhow::Result<AiStock> {
        let ticker = ticker.trim().to_uppercase();
        anyhow::ensure!(!ticker.is_empty(), "ticker is required");
        self.gateway.fetch_full_evaluation(&ticker).await
    }

    pub async fn export_snapshot(&self) -> ExportOutcome {
        let picks = self.picks().await;
        self.exporter.export(&picks).await
    }

    pub async fn publish(&self, sink: &dyn PickSink) -> anyhow::Result<()> {
        let picks = self.picks().await;
        tracing::debug!(sink = sink.name(), count = picks.len(), "publishing picks");
        sink.publish(&picks).await
    }

    /// One call at a time; a failed ticker never aborts its siblings.
    async fn fetch_metrics(
        &self,
        tickers: &[String],
    ) -> (Vec<(String, RawMetrics)>, Vec<TickerFailure>) {
        let mut fetched = Vec::with_capacity(tickers.len());
        let mut failures = Vec::new();
        for ticker in tickers {
            match self.gateway.fetch_raw_metrics(ticker).await {
                Ok(Some(metrics)) => fetched.push((ticker.clone(), metrics)),
                Ok(None) => {
                    tracing::warn!(ticker = %ticker, "no data available");
                    failures.push(TickerFailure {
                        ticker: ticker.clone(),
                        reason: "no data available".to_string(),
                    });
                }
                Err(err) => {
                    let reason = format!("{err:#}");
                    tracing::warn!(ticker = %ticker, error = %reason, "raw metrics fetch failed");
                    failures.push(TickerFailure {
                        ticker: ticker.clone(),
                        reason,
                    });
                }
            }
        }
        (fetched, failures)
    }
}
