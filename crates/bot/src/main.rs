mod broadcast;
mod commands;
mod embeds;

use serenity::{
    async_trait,
    builder::CreateMessage,
    model::{channel::Message, gateway::Ready},
    prelude::*,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use swingscan_core::llm::anthropic::AnthropicClient;
use swingscan_core::llm::MarketDataGateway;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use broadcast::Broadcast;
use commands::{failure_reply, ChatCommand, USAGE_REPLY};

struct Handler {
    gateway: Arc<dyn MarketDataGateway>,
    broadcast: Arc<Broadcast>,
    broadcast_command: String,
    broadcast_started: AtomicBool,
}

impl Handler {
    async fn handle_eval(&self, ctx: &Context, msg: &Message, ticker: &str) {
        let _ = msg.channel_id.broadcast_typing(&ctx.http).await;

        match self.gateway.fetch_full_evaluation(ticker).await {
            Ok(stock) => {
                tracing::info!(ticker, match_score = stock.match_score, "evaluation sent");
                let builder = CreateMessage::new()
                    .embed(embeds::stock_embed(&stock))
                    .reference_message(msg);
                if let Err(err) = msg.channel_id.send_message(&ctx.http, builder).await {
                    tracing::error!(ticker, error = %err, "failed to send evaluation");
                }
            }
            Err(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(ticker, error = %format!("{err:#}"), "evaluation failed");
                let _ = msg.reply(&ctx.http, failure_reply(ticker)).await;
            }
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let Some(command) = ChatCommand::parse(&msg.content, &self.broadcast_command) else {
            return;
        };

        match command {
            ChatCommand::Eval { ticker } => {
                if msg.guild_id.is_none() {
                    return;
                }
                self.handle_eval(&ctx, &msg, &ticker).await;
            }
            ChatCommand::Usage => {
                if msg.guild_id.is_none() {
                    return;
                }
                let _ = msg.reply(&ctx.http, USAGE_REPLY).await;
            }
            ChatCommand::Broadcast => {
                let _ = msg.reply(&ctx.http, self.broadcast.compose()).await;
            }
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!(user = %ready.user.name, guilds = ready.guilds.len(), "bot is connected and ready");

        // `ready` fires again on reconnect; the schedule must only start once.
        if self.broadcast_started.swap(true, Ordering::SeqCst) {
            return;
        }
        let guilds = ready.guilds.iter().map(|g| g.id).collect();
        self.broadcast.clone().spawn(ctx.http.clone(), guilds);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = swingscan_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let token = settings.require_discord_bot_token()?.to_string();
    let gateway = AnthropicClient::from_settings(&settings)?;

    let handler = Handler {
        gateway: Arc::new(gateway),
        broadcast: Arc::new(Broadcast::from_settings(&settings)),
        broadcast_command: settings.broadcast_command(),
        broadcast_started: AtomicBool::new(false),
    };

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&token, intents)
        .event_handler(handler)
        .await?;

    tracing::info!("discord bot starting");

    let shard_manager = client.shard_manager.clone();
    tokio::select! {
        result = client.start() => {
            if let Err(err) = result {
                let err = anyhow::Error::new(err);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "discord client error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received ctrl-c; shutting down");
        }
    }

    shard_manager.shutdown_all().await;
    tracing::info!("discord bot shut down");

    Ok(())
}

fn init_sentry(settings: &swingscan_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
