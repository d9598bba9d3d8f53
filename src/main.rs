use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use configuration::{init_logging, load_config, Config, LogFormat};
use engine::{RunSummary, StrategyEngine, StrategyRunner};
use events::EngineEvent;
use executor::PaperGateway;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Range-trading strategy engine.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Overrides `logging.format` from the configuration file.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file and show what it would run.
    Check {
        #[arg(long, default_value = "config.toml")]
        config: PathBuf,
    },
    /// Replay a recorded JSON-lines event stream against the paper gateway.
    Replay {
        #[arg(long, default_value = "config.toml")]
        config: PathBuf,

        /// One `EngineEvent` per line.
        #[arg(long)]
        events: PathBuf,

        /// Reject the first submission with this reason.
        #[arg(long)]
        reject_first: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; it only supplies RANGEBOT__ overrides.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => {
            let (config, _guard) = setup(&config, cli.log_format)?;
            let engine = StrategyEngine::new(&config)?;
            println!("{}", config_table(&config, &engine));
        }
        Commands::Replay { config, events, reject_first } => {
            let (config, _guard) = setup(&config, cli.log_format)?;
            let summary = replay(&config, &events, reject_first).await?;
            println!("{}", summary_table(&summary));
        }
    }

    Ok(())
}

fn setup(
    path: &Path,
    log_format: Option<LogFormat>,
) -> Result<(Config, Option<tracing_appender::non_blocking::WorkerGuard>)> {
    let mut config =
        load_config(path).with_context(|| format!("failed to load configuration from {}", path.display()))?;
    if let Some(format) = log_format {
        config.logging.format = format;
    }
    let guard = init_logging(&config.logging)?;
    Ok((config, guard))
}

async fn replay(config: &Config, path: &Path, reject_first: Option<String>) -> Result<RunSummary> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read events from {}", path.display()))?;

    let gateway = Arc::new(PaperGateway::new());
    if let Some(reason) = reject_first {
        gateway.reject_next(reason).await;
    }

    let engine = StrategyEngine::new(config)?;
    let (tx, rx) = mpsc::channel(1024);
    let runner = tokio::spawn(StrategyRunner::new(engine, gateway.clone()).run(rx));

    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let event = EngineEvent::from_json_line(index + 1, line)?;
        if tx.send(event).await.is_err() {
            tracing::info!(line = index + 1, "runner stopped, remaining events not delivered");
            break;
        }
    }
    drop(tx);

    let summary = runner.await.context("runner task panicked")??;
    let working = gateway.working().await;
    tracing::info!(working = working.len(), "replay finished");
    Ok(summary)
}

fn config_table(config: &Config, engine: &StrategyEngine) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec!["Strategy".to_string(), engine.strategy_id().to_string()]);
    table.add_row(vec!["Symbol".to_string(), config.instance.symbol.clone()]);
    table.add_row(vec!["Account".to_string(), config.instance.account.clone()]);
    table.add_row(vec!["Connection".to_string(), config.instance.account_connection().to_string()]);
    table.add_row(vec!["Quantity".to_string(), config.instance.quantity.to_string()]);
    table.add_row(vec!["Tick size".to_string(), config.instance.tick_size.to_string()]);
    table.add_row(vec!["Max trades".to_string(), optional(config.risk.max_trades)]);
    table.add_row(vec!["Max profit".to_string(), optional(config.risk.max_profit)]);
    table.add_row(vec!["Max loss".to_string(), optional(config.risk.max_loss)]);
    table.add_row(vec!["Require flat".to_string(), config.risk_limits().requires_flat().to_string()]);
    table
}

fn summary_table(summary: &RunSummary) -> Table {
    let guard = &summary.guard;
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Strategy".to_string(), summary.strategy.to_string()]);
    table.add_row(vec!["Events processed".to_string(), summary.events_processed.to_string()]);
    table.add_row(vec!["Orders submitted".to_string(), summary.orders_submitted.to_string()]);
    table.add_row(vec![
        "Stopped".to_string(),
        summary.stop_reason.clone().unwrap_or_else(|| "no".to_string()),
    ]);
    table.add_row(vec!["Trades".to_string(), guard.trade_count.to_string()]);
    table.add_row(vec!["Gross P&L".to_string(), guard.gross_pnl.to_string()]);
    table.add_row(vec!["Net P&L".to_string(), guard.net_pnl.to_string()]);
    table.add_row(vec!["Fees".to_string(), guard.total_fee.to_string()]);
    table.add_row(vec!["Buy side".to_string(), format!("{:?}", guard.buy)]);
    table.add_row(vec!["Sell side".to_string(), format!("{:?}", guard.sell)]);
    table
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
