use rand::seq::SliceRandom;
use serenity::http::Http;
use serenity::model::channel::ChannelType;
use serenity::model::id::GuildId;
use std::sync::Arc;
use std::time::Duration;
use swingscan_core::config::Settings;

const DEFAULT_MESSAGES: [&str; 7] = [
    "your RSI called. It needs therapy. 🫵📉",
    "remember: the trend is your friend until it bends.",
    "a MACD cross is late, confusing, and wrong half the time. Trade accordingly.",
    "volume confirms the move. Hope does not.",
    "nobody ever went broke waiting for the golden cross.",
    "FOMO into red candles is not a strategy.",
    "cut losers early. Let winners breathe.",
];

/// Periodic message posted to a named text channel in every guild. Shares no state with
/// the evaluation pipeline.
#[derive(Debug, Clone)]
pub struct Broadcast {
    channel: String,
    mention: Option<String>,
    messages: Vec<String>,
    interval: Duration,
}

impl Broadcast {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            channel: settings.broadcast_channel(),
            mention: settings.broadcast_mention(),
            messages: settings
                .broadcast_messages()
                .unwrap_or_else(|| DEFAULT_MESSAGES.iter().map(|m| m.to_string()).collect()),
            interval: settings.broadcast_interval(),
        }
    }

    /// A random message, prefixed with the mention when one is configured.
    pub fn compose(&self) -> String {
        let message = self
            .messages
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_MESSAGES[0]);
        match &self.mention {
            Some(mention) => format!("{mention}, {message}"),
            None => capitalize_first(message),
        }
    }

    /// Posts once immediately, then every `interval`, until the runtime shuts down.
    pub fn spawn(self: Arc<Self>, http: Arc<Http>, guilds: Vec<GuildId>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(
                channel = %self.channel,
                interval_secs = self.interval.as_secs(),
                guilds = guilds.len(),
                "scheduled broadcast started"
            );
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                ticker.tick().await;
                self.post(&http, &guilds).await;
            }
        })
    }

    async fn post(&self, http: &Http, guilds: &[GuildId]) {
        for guild_id in guilds {
            let channels = match guild_id.channels(http).await {
                Ok(channels) => channels,
                Err(err) => {
                    tracing::warn!(guild_id = %guild_id, error = %err, "failed to list channels");
                    continue;
                }
            };

            let Some(channel) = channels.values().find(|c| {
                c.kind == ChannelType::Text && c.name.eq_ignore_ascii_case(&self.channel)
            }) else {
                tracing::warn!(guild_id = %guild_id, channel = %self.channel, "broadcast channel not found");
                continue;
            };

            let text = self.compose();
            if let Err(err) = channel.id.say(http, text).await {
                tracing::error!(guild_id = %guild_id, error = %err, "failed to send broadcast");
            }
        }
    }
}

fn capitalize_first(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}
