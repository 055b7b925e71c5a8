use crate::domain::ranked::Picks;
use crate::storage::snapshots::{ExportOutcome, SnapshotExporter};

/// A delivery surface for the ranked working collection.
#[async_trait::async_trait]
pub trait PickSink: Send + Sync {
    fn name(&self) -> &'static str;
    async fn publish(&self, picks: &Picks) -> anyhow::Result<()>;
}

impl SnapshotExporter {
    pub async fn export(&self, picks: &Picks) -> ExportOutcome {
        match picks {
            Picks::Rules(entries) => self.save(entries).await,
            Picks::Model(stocks) => self.save(stocks).await,
        }
    }
}

#[async_trait::async_trait]
impl PickSink for SnapshotExporter {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn publish(&self, picks: &Picks) -> anyhow::Result<()> {
        let outcome = self.export(picks).await;
        if !outcome.success {
            anyhow::bail!(
                "snapshot export failed: {}",
                outcome.error.unwrap_or_default()
            );
        }
        Ok(())
    }
}

/// Logs one line per pick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[async_trait::async_trait]
impl PickSink for TracingSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    async fn publish(&self, picks: &Picks) -> anyhow::Result<()> {
        match picks {
            Picks::Rules(entries) => {
                for e in entries {
                    tracing::info!(
                        rank = e.rank,
                        ticker = %e.ticker,
                        score = e.verdict.score,
                        fails = ?e.verdict.fails,
                        "pick"
                    );
                }
            }
            Picks::Model(stocks) => {
                for s in stocks {
                    tracing::info!(
                        rank = s.rank,
                        ticker = %s.stock.ticker,
                        match_score = s.stock.match_score,
                        macd = %s.stock.macd_status,
                        "pick"
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::metrics;
    use crate::screener::rank;

    #[tokio::test]
    async fn snapshot_sink_writes_inner_array() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = SnapshotExporter::new(dir.path());
        let picks = Picks::Rules(rank(vec![("AAPL".to_string(), metrics(4))]));

        exporter.publish(&picks).await.unwrap();

        let file = std::fs::read_dir(dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        let v: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(file).unwrap()).unwrap();
        assert_eq!(v[0]["ticker"], "AAPL");
        assert_eq!(v[0]["score"], 4);
        assert_eq!(v[0]["rank"], 1);
        assert_eq!(v[0]["fiftyDayMA"], 90.0);
    }

    #[tokio::test]
    async fn snapshot_sink_surfaces_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let exporter = SnapshotExporter::new(blocker.join("sub"));
        assert!(exporter.publish(&Picks::default()).await.is_err());
    }

    #[tokio::test]
    async fn tracing_sink_accepts_both_bases() {
        let sink = TracingSink;
        sink.publish(&Picks::default()).await.unwrap();
        sink.publish(&Picks::Model(vec![])).await.unwrap();
    }
}
