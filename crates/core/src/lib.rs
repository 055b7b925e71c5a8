pub mod criteria;
pub mod dashboard;
pub mod domain;
pub mod llm;
pub mod screener;
pub mod sink;
pub mod storage;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;
    use std::time::Duration;

    const DEFAULT_BROADCAST_CHANNEL: &str = "general";
    const DEFAULT_BROADCAST_COMMAND: &str = "!quip";
    const DEFAULT_BROADCAST_INTERVAL_SECS: u64 = 60 * 60;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub anthropic_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub discord_bot_token: Option<String>,
        pub state_dir: Option<String>,
        pub snapshot_dir: Option<String>,
        pub broadcast_channel: Option<String>,
        pub broadcast_interval_secs: Option<String>,
        pub broadcast_mention: Option<String>,
        pub broadcast_messages: Option<String>,
        pub broadcast_command: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                discord_bot_token: std::env::var("DISCORD_BOT_TOKEN").ok(),
                state_dir: std::env::var("SWINGSCAN_STATE_DIR").ok(),
                snapshot_dir: std::env::var("SNAPSHOT_DIR").ok(),
                broadcast_channel: std::env::var("BROADCAST_CHANNEL").ok(),
                broadcast_interval_secs: std::env::var("BROADCAST_INTERVAL_SECS").ok(),
                broadcast_mention: std::env::var("BROADCAST_MENTION").ok(),
                broadcast_messages: std::env::var("BROADCAST_MESSAGES").ok(),
                broadcast_command: std::env::var("BROADCAST_COMMAND").ok(),
            })
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }

        pub fn require_discord_bot_token(&self) -> anyhow::Result<&str> {
            self.discord_bot_token
                .as_deref()
                .context("DISCORD_BOT_TOKEN is required")
        }

        /// Directory holding the persisted watch-list.
        pub fn state_dir(&self) -> PathBuf {
            match non_blank(self.state_dir.as_deref()) {
                Some(dir) => PathBuf::from(dir),
                None => dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("swingscan"),
            }
        }

        pub fn snapshot_dir(&self) -> PathBuf {
            match non_blank(self.snapshot_dir.as_deref()) {
                Some(dir) => PathBuf::from(dir),
                None => crate::storage::snapshots::SnapshotExporter::default_dir(),
            }
        }

        pub fn broadcast_channel(&self) -> String {
            non_blank(self.broadcast_channel.as_deref())
                .unwrap_or(DEFAULT_BROADCAST_CHANNEL)
                .to_string()
        }

        pub fn broadcast_command(&self) -> String {
            non_blank(self.broadcast_command.as_deref())
                .unwrap_or(DEFAULT_BROADCAST_COMMAND)
                .to_lowercase()
        }

        pub fn broadcast_interval(&self) -> Duration {
            let secs = self
                .broadcast_interval_secs
                .as_deref()
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_BROADCAST_INTERVAL_SECS);
            Duration::from_secs(secs)
        }

        pub fn broadcast_mention(&self) -> Option<String> {
            non_blank(self.broadcast_mention.as_deref()).map(str::to_string)
        }

        /// `|`-separated messages; `None` when unset so callers use their built-in list.
        pub fn broadcast_messages(&self) -> Option<Vec<String>> {
            let raw = non_blank(self.broadcast_messages.as_deref())?;
            let messages: Vec<String> = raw
                .split('|')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages)
            }
        }
    }

    fn non_blank(s: Option<&str>) -> Option<&str> {
        s.map(str::trim).filter(|s| !s.is_empty())
    }

}
