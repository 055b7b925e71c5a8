use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use swingscan_core::dashboard::Dashboard;
use swingscan_core::domain::ranked::ScoreBasis;
use swingscan_core::llm::anthropic::AnthropicClient;
use swingscan_core::storage::snapshots::SnapshotExporter;
use swingscan_core::storage::watchlist::{JsonFileStore, WatchlistStore, DEFAULT_WATCHLIST};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod table;

#[derive(Debug, Parser)]
#[command(name = "swingscan_worker", about = "Swing-trading screener")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Evaluate the watch-list against the rules, or ask the model for a ranked idea list.
    Scan {
        #[arg(long, default_value_t = ScoreBasis::Rules)]
        basis: ScoreBasis,

        /// Write the ranked result to the snapshot directory.
        #[arg(long)]
        export: bool,
    },
    /// Evaluate new tickers and add them to the watch-list.
    Add {
        #[arg(required = true)]
        tickers: Vec<String>,
    },
    /// Add every ticker in the first column of a CSV file.
    Import { csv_path: PathBuf },
    /// Ask the model for a full, self-scored evaluation of one ticker.
    Evaluate { ticker: String },
    Watchlist {
        #[command(subcommand)]
        action: Option<WatchlistAction>,
    },
    /// Print the strategy criteria.
    Criteria,
}

#[derive(Debug, Subcommand)]
enum WatchlistAction {
    Show,
    Set {
        #[arg(required = true)]
        tickers: Vec<String>,
    },
    Remove {
        #[arg(required = true)]
        tickers: Vec<String>,
    },
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = swingscan_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let watchlist = WatchlistStore::new(JsonFileStore::new(settings.state_dir()));

    // Commands that never reach the model.
    match &args.command {
        Command::Criteria => {
            print!("{}", table::render_criteria());
            return Ok(());
        }
        Command::Watchlist { action } => {
            let list = match action {
                None | Some(WatchlistAction::Show) => watchlist.load().await,
                Some(WatchlistAction::Set { tickers }) => watchlist.replace(tickers.clone()).await?,
                Some(WatchlistAction::Remove { tickers }) => {
                    for ticker in tickers {
                        if !watchlist.remove(ticker).await? {
                            tracing::warn!(ticker = %ticker, "not on the watch-list");
                        }
                    }
                    watchlist.load().await
                }
                Some(WatchlistAction::Reset) => {
                    watchlist
                        .replace(DEFAULT_WATCHLIST.iter().map(|t| t.to_string()).collect())
                        .await?
                }
            };
            println!("{}", list.join(" "));
            return Ok(());
        }
        _ => {}
    }

    let gateway = AnthropicClient::from_settings(&settings)?;
    let dashboard = Dashboard::new(
        Arc::new(gateway),
        watchlist,
        SnapshotExporter::new(settings.snapshot_dir()),
    );

    let result = run(&dashboard, args.command).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        if let Some(diag) = err.downcast_ref::<swingscan_core::llm::error::LlmDiagnosticsError>() {
            tracing::error!(
                operation = %diag.operation,
                ticker = diag.ticker.as_deref(),
                raw_output = diag.raw_output.as_deref(),
                "model request failed"
            );
        }
    }
    result
}

async fn run(dashboard: &Dashboard, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Scan { basis, export } => {
            let report = dashboard.run_scan(basis).await?;
            print!("{}", table::render_picks(&report.picks));
            if !report.failures.is_empty() {
                println!("\nNo data for {} ticker(s):", report.failures.len());
                print!("{}", table::render_failures(&report.failures));
            }
            if export {
                let outcome = dashboard.export_snapshot().await;
                match (outcome.success, outcome.path, outcome.error) {
                    (true, Some(path), _) => println!("\nSnapshot saved to {}", path.display()),
                    (_, _, error) => anyhow::bail!(
                        "Error saving snapshot: {}",
                        error.unwrap_or_else(|| "unknown error".to_string())
                    ),
                }
            }
        }
        Command::Add { tickers } => {
            let report = dashboard.add_tickers(&tickers).await?;
            print_add_report(&report);
        }
        Command::Import { csv_path } => {
            let raw = tokio::fs::read_to_string(&csv_path)
                .await
                .with_context(|| format!("failed to read {}", csv_path.display()))?;
            let report = dashboard.import_watchlist_csv(&raw).await?;
            print_add_report(&report);
        }
        Command::Evaluate { ticker } => {
            let stock = dashboard.evaluate_ticker(&ticker).await?;
            print!("{}", table::render_card(&stock, None));
        }
        Command::Watchlist { .. } | Command::Criteria => {}
    }
    Ok(())
}

fn print_add_report(report: &swingscan_core::dashboard::AddReport) {
    print!("{}", table::render_picks(&report.picks));
    if !report.skipped.is_empty() {
        println!("\nAlready tracked: {}", report.skipped.join(" "));
    }
    if !report.failures.is_empty() {
        println!("\nNot added:");
        print!("{}", table::render_failures(&report.failures));
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scan_flags() {
        let args = Args::try_parse_from(["swingscan_worker", "scan", "--basis", "model", "--export"]).unwrap();
        match args.command {
            Command::Scan { basis, export } => {
                assert_eq!(basis, ScoreBasis::Model);
                assert!(export);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn scan_defaults_to_rules() {
        let args = Args::try_parse_from(["swingscan_worker", "scan"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Scan {
                basis: ScoreBasis::Rules,
                export: false
            }
        ));
    }

    #[test]
    fn rejects_unknown_basis_and_empty_add() {
        assert!(Args::try_parse_from(["swingscan_worker", "scan", "--basis", "vibes"]).is_err());
        assert!(Args::try_parse_from(["swingscan_worker", "add"]).is_err());
    }

    #[test]
    fn watchlist_action_is_optional() {
        let args = Args::try_parse_from(["swingscan_worker", "watchlist"]).unwrap();
        assert!(matches!(args.command, Command::Watchlist { action: None }));

        let args = Args::try_parse_from(["swingscan_worker", "watchlist", "set", "aapl", "msft"]).unwrap();
        match args.command {
            Command::Watchlist {
                action: Some(WatchlistAction::Set { tickers }),
            } => assert_eq!(tickers, vec!["aapl", "msft"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
