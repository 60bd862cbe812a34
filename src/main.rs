use analytics::{AnalyticsEngine, InsightsReport};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{Table, presets::UTF8_FULL};
use configuration::{LogFormat, load_config, load_config_from};
use core_types::TradeRecord;
use std::path::PathBuf;

/// The main entry point for the TradeLens journal analyser.
fn main() -> Result<()> {
    // Load TRADELENS__* overrides from a .env file if one is present.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config_from(path, true)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => load_config().context("Failed to load config.toml")?,
    };
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    let _log_guard = configuration::init_tracing(&config.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Analyze(args) => handle_analyze(args, config.analytics),
        Commands::ShowConfig => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Performance, behaviour and coaching insights from a trade journal.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./config.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the log format from the configuration file.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a JSON array of trade records and print the insights report.
    Analyze(AnalyzeArgs),
    /// Print the effective configuration as TOML.
    ShowConfig,
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// JSON file containing an array of trade records.
    #[arg(long)]
    trades: PathBuf,

    /// Snapshot instant (RFC 3339). Defaults to the current time.
    #[arg(long)]
    as_of: Option<DateTime<Utc>>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Compact JSON, one line.
    Json,
    /// Indented JSON.
    Pretty,
    /// A summary table of the headline metrics.
    Table,
}

// ==============================================================================
// Analyze Command Logic
// ==============================================================================

fn handle_analyze(args: AnalyzeArgs, analytics: configuration::AnalyticsConfig) -> Result<()> {
    let raw = std::fs::read_to_string(&args.trades)
        .with_context(|| format!("Failed to read {}", args.trades.display()))?;
    let records: Vec<TradeRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of trade records", args.trades.display()))?;

    let as_of = args.as_of.unwrap_or_else(Utc::now);
    tracing::info!(records = records.len(), %as_of, "Analysing trade journal.");

    let engine = AnalyticsEngine::new(analytics)?;
    let report = engine.analyze(&records, as_of);

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
        OutputFormat::Pretty => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_summary(&report),
    }
    Ok(())
}

fn print_summary(report: &InsightsReport) {
    let quality = &report.data_quality;
    println!(
        "As of {}: {} records, {} closed, {} open, {} excluded",
        report.as_of.format("%Y-%m-%d %H:%M UTC"),
        quality.total_records,
        quality.closed_trades,
        quality.open_positions,
        quality.issues.len()
    );

    let performance = match report.performance.as_result() {
        Ok(performance) => performance,
        Err(e) => {
            println!("{e}");
            return;
        }
    };

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Metric", "Value"]);
    table.add_row(vec!["Win rate %".to_string(), performance.win_rate_pct.to_string()]);
    table.add_row(vec!["Total P&L".to_string(), performance.total_pnl.to_string()]);
    table.add_row(vec![
        "Profit factor".to_string(),
        performance
            .profit_factor
            .finite()
            .map_or_else(|| "unbounded".to_string(), |pf| pf.to_string()),
    ]);
    table.add_row(vec!["Expectancy".to_string(), performance.expectancy.to_string()]);
    table.add_row(vec!["Sharpe ratio".to_string(), performance.sharpe_ratio.to_string()]);
    table.add_row(vec!["Max drawdown %".to_string(), performance.max_drawdown_pct.to_string()]);

    if let Some(behavior) = report.behavior.available() {
        table.add_row(vec!["Discipline".to_string(), behavior.discipline_score.to_string()]);
        table.add_row(vec!["Risk tolerance".to_string(), format!("{:?}", behavior.risk_tolerance)]);
    }
    if let Some(predictions) = report.predictions.available() {
        table.add_row(vec![
            "Next trade success %".to_string(),
            predictions.next_trade_success_pct.to_string(),
        ]);
        table.add_row(vec![
            "Position size %".to_string(),
            predictions.optimal_position_size_pct.to_string(),
        ]);
    }
    println!("{table}");

    let notes = &report.coaching;
    for (title, lines) in [
        ("Strengths", &notes.strengths),
        ("Weaknesses", &notes.weaknesses),
        ("Improve", &notes.improvement_areas),
        ("Tips", &notes.personalized_tips),
        ("Mental game", &notes.mental_game_advice),
    ] {
        if lines.is_empty() {
            continue;
        }
        println!("\n{title}:");
        for line in lines {
            println!("  - {line}");
        }
    }
}
