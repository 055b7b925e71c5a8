use anyhow::Context;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub const WATCHLIST_KEY: &str = "swingscan.watchlist";

pub const DEFAULT_WATCHLIST: [&str; 8] = ["AAPL", "MSFT", "NVDA", "AMZN", "GOOGL", "META", "TSLA", "AMD"];

/// Key/value persistence for client-side state.
#[async_trait::async_trait]
pub trait WatchlistPersistence: Send + Sync {
    async fn read(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn write(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// One `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait::async_trait]
impl WatchlistPersistence for JsonFileStore {
    async fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(s) => Ok(Some(s)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    async fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let path = self.path_for(key);
        // Readers see either the old file or the new one, never a truncated write.
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        tokio::fs::write(&tmp, value)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("failed to replace {}", path.display()))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

#[async_trait::async_trait]
impl WatchlistPersistence for MemoryStore {
    async fn read(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

pub struct WatchlistStore {
    port: Box<dyn WatchlistPersistence>,
    /// Held across load, modify and save so concurrent edits cannot drop each other.
    edit: Mutex<()>,
}

impl WatchlistStore {
    pub fn new(port: impl WatchlistPersistence + 'static) -> Self {
        Self {
            port: Box::new(port),
            edit: Mutex::new(()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::default())
    }

    /// Persisted list, or the built-in default when nothing usable is stored.
    pub async fn load(&self) -> Vec<String> {
        let raw = match self.port.read(WATCHLIST_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return default_watchlist(),
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "watch-list unreadable; using default");
                return default_watchlist();
            }
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(list) => normalize(list),
            Err(err) => {
                tracing::warn!(error = %err, "watch-list corrupt; using default");
                default_watchlist()
            }
        }
    }

    /// Overwrites the persisted list. Returns what was actually stored.
    pub async fn replace(&self, list: Vec<String>) -> anyhow::Result<Vec<String>> {
        let _edit = self.edit.lock().await;
        self.save(list).await
    }

    /// `false` when the ticker was already present or blank.
    pub async fn add(&self, ticker: &str) -> anyhow::Result<bool> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Ok(false);
        }
        let _edit = self.edit.lock().await;
        let mut list = self.load().await;
        if list.contains(&ticker) {
            return Ok(false);
        }
        list.push(ticker);
        self.save(list).await?;
        Ok(true)
    }

    pub async fn remove(&self, ticker: &str) -> anyhow::Result<bool> {
        let ticker = ticker.trim().to_uppercase();
        let _edit = self.edit.lock().await;
        let mut list = self.load().await;
        let before = list.len();
        list.retain(|t| *t != ticker);
        if list.len() == before {
            return Ok(false);
        }
        self.save(list).await?;
        Ok(true)
    }

    async fn save(&self, list: Vec<String>) -> anyhow::Result<Vec<String>> {
        let list = normalize(list);
        let encoded = serde_json::to_string(&list).context("failed to encode watch-list")?;
        self.port.write(WATCHLIST_KEY, &encoded).await?;
        tracing::debug!(count = list.len(), "watch-list saved");
        Ok(list)
    }
}

fn default_watchlist() -> Vec<String> {
    DEFAULT_WATCHLIST.iter().map(|t| t.to_string()).collect()
}

/// Trim, upper-case, drop blanks, keep the first occurrence of each symbol.
fn normalize(list: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    list.into_iter()
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// First column of every row; no header row. Duplicates are kept.
pub fn import_from_delimited_text(raw: &str) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let mut tickers = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(row = idx + 1, error = %err, "skipping unreadable CSV row");
                continue;
            }
        };
        let ticker = record.get(0).unwrap_or("").trim().to_uppercase();
        if !ticker.is_empty() {
            tickers.push(ticker);
        }
    }
    tickers
}
