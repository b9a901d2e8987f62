//! CLI definition and dispatch.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::jsonl_trade_log::JsonlTradeLog;
use crate::domain::bar::MarketData;
use crate::domain::config_validation::load_engine_config;
use crate::domain::cycle::TradingCycle;
use crate::domain::error::TraderError;
use crate::domain::indicator::{compute_indicators, IndicatorSnapshot};
use crate::domain::params::{EngineConfig, SymbolParameters};
use crate::domain::scanner::ScanOutcome;
use crate::domain::signal::Opportunity;
use crate::domain::stats::{StatisticsSummary, TradeStatistics};
use crate::domain::universe::load_market;
use crate::obs::{init_tracing, LogFormat};
use crate::ports::data_port::DataPort;
use crate::ports::trade_log_port::TradeLogPort;

#[derive(Parser, Debug)]
#[command(
    name = "trailtrader",
    about = "Entry scanner and trailing-stop position manager"
)]
pub struct Cli {
    /// Log filter used when TRAILTRADER_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load and validate a configuration, printing resolved parameters
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Scan configured symbols for an entry opportunity
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory holding <SYMBOL>.csv files
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Print computed indicators for the most recent bars of one symbol
    Indicators {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(long, default_value_t = 5)]
        last: usize,
        #[arg(long)]
        json: bool,
    },
    /// Summarise a JSONL trade log
    Stats {
        #[arg(short, long)]
        trades: PathBuf,
        #[arg(long)]
        json: bool,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    if let Err(e) = init_tracing(&cli.log_level, cli.log_format) {
        eprintln!("error: {e}");
        return ExitCode::from(2);
    }

    let result = match cli.command {
        Command::Validate { config } => run_validate(&config),
        Command::Scan { config, data, json } => run_scan(&config, &data, json),
        Command::Indicators {
            config,
            data,
            symbol,
            last,
            json,
        } => run_indicators(&config, &data, &symbol, last, json),
        Command::Stats { trades, json } => run_stats(&trades, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load and validate the engine configuration at `path`.
pub fn load_config(path: &Path) -> Result<EngineConfig, TraderError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    let config = load_engine_config(&adapter)?;
    tracing::info!(
        file = %path.display(),
        symbols = config.symbols.len(),
        max_positions = config.max_positions,
        entry_mode = %config.entry_mode,
        "configuration valid"
    );
    Ok(config)
}

fn run_validate(config_path: &Path) -> Result<(), TraderError> {
    let config = load_config(config_path)?;

    println!("Engine");
    println!("  symbols:       {}", config.symbols.join(", "));
    println!("  max_positions: {}", config.max_positions);
    println!("  entry_mode:    {}", config.entry_mode);
    println!("  allow_short:   {}", config.allow_short);
    println!(
        "  weights:       rsi={} macd={} volume={}",
        config.weights.rsi, config.weights.macd, config.weights.volume
    );
    for symbol in &config.symbols {
        println!();
        println!("{symbol}");
        print_params(config.params_for(symbol));
    }
    Ok(())
}

fn print_params(p: &SymbolParameters) {
    println!(
        "  rsi:    window={} oversold={} overbought={}",
        p.rsi_window, p.rsi_oversold, p.rsi_overbought
    );
    println!(
        "  macd:   fast={} slow={} signal={}",
        p.macd_fast, p.macd_slow, p.macd_signal
    );
    println!(
        "  volume: ma={} obv={} threshold={}",
        p.volume_ma_period, p.obv_period, p.volume_threshold
    );
    println!(
        "  atr:    period={} ma={} multiplier={}",
        p.atr_period, p.atr_ma_period, p.atr_multiplier
    );
    println!(
        "  exits:  stop={}% early={}%/{}% peak={}%/{}% rsi_exit={} (min {}%)",
        p.stop_loss_percent,
        p.early_trail_start,
        p.early_trail_minus,
        p.peak_trail_start,
        p.peak_trail_minus,
        p.use_rsi_exit,
        p.rsi_exit_min_profit
    );
    println!("  min bars: {}", p.min_bars());
}

fn run_scan(config_path: &Path, data_dir: &Path, json: bool) -> Result<(), TraderError> {
    let config = load_config(config_path)?;
    let data = CsvAdapter::new(data_dir.to_path_buf());
    let loaded = load_market(&data, &config.symbols)?;

    let now = latest_timestamp(&loaded.market).unwrap_or_else(Utc::now);
    let report = TradingCycle::new(config).run(&loaded.market, now);
    let mut outcome = report.scan.unwrap_or_default();
    let mut skipped = loaded.skipped;
    skipped.append(&mut outcome.skipped);
    outcome.skipped = skipped;

    if json {
        print_json(&scan_json(&outcome))?;
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn latest_timestamp(market: &MarketData) -> Option<DateTime<Utc>> {
    market
        .values()
        .filter_map(|bars| bars.last().map(|b| b.timestamp))
        .max()
}

fn scan_json(outcome: &ScanOutcome) -> serde_json::Value {
    serde_json::json!({
        "best": outcome.best,
        "candidates": outcome.candidates,
        "skipped": outcome.skipped,
    })
}

fn print_outcome(outcome: &ScanOutcome) {
    if outcome.candidates.is_empty() {
        println!("no opportunity");
    } else {
        println!("{:<8} {:<5} {:>7} {:>10} {:>7}", "SYMBOL", "DIR", "SCORE", "PRICE", "RSI");
        for c in &outcome.candidates {
            print_candidate(c);
        }
    }
    if let Some(best) = &outcome.best {
        println!();
        println!(
            "selected: {} {} @ {:.4} (score {:.2})",
            best.direction, best.symbol, best.entry_price, best.score
        );
    }
    for s in &outcome.skipped {
        eprintln!("skipped {}: {}", s.symbol, s.reason);
    }
}

fn print_candidate(c: &Opportunity) {
    println!(
        "{:<8} {:<5} {:>7.2} {:>10.4} {:>7.2}",
        c.symbol,
        c.direction.to_string(),
        c.score,
        c.entry_price,
        c.indicators.rsi_real
    );
}

fn run_indicators(
    config_path: &Path,
    data_dir: &Path,
    symbol: &str,
    last: usize,
    json: bool,
) -> Result<(), TraderError> {
    let config = load_config(config_path)?;
    let symbol = symbol.trim().to_uppercase();
    let data = CsvAdapter::new(data_dir.to_path_buf());
    let bars = data.fetch_bars(&symbol)?;
    let snapshots = compute_indicators(&symbol, &bars, config.params_for(&symbol))?;
    let start = snapshots.len().saturating_sub(last);
    let tail = &snapshots[start..];

    if json {
        for s in tail {
            print_json(s)?;
        }
    } else {
        print_snapshots(tail);
    }
    Ok(())
}

fn print_snapshots(snapshots: &[IndicatorSnapshot]) {
    println!(
        "{:<25} {:>10} {:>7} {:>9} {:>9} {:>6} {:>6} {:>5} {:>6} {:>6}",
        "TIMESTAMP", "CLOSE", "RSI", "MACD", "HIST", "CROSS", "VOLR", "OBV", "VCONF", "ATRR"
    );
    for s in snapshots {
        let cross = if s.macd_cross_up {
            "up"
        } else if s.macd_cross_down {
            "down"
        } else {
            "-"
        };
        let confirms = if s.volume_confirms_buy {
            "buy"
        } else if s.volume_confirms_sell {
            "sell"
        } else {
            "-"
        };
        println!(
            "{:<25} {:>10.4} {:>7.2} {:>9.4} {:>9.4} {:>6} {:>6.2} {:>5} {:>6} {:>6.2}",
            s.timestamp.to_rfc3339(),
            s.close,
            s.rsi_real,
            s.macd,
            s.macd_histogram,
            cross,
            s.volume_ratio,
            s.obv_trend,
            confirms,
            s.atr_ratio
        );
    }
}

fn run_stats(trades_path: &Path, json: bool) -> Result<(), TraderError> {
    let log = JsonlTradeLog::new(trades_path);
    let records = log.read_all()?;
    tracing::debug!(file = %trades_path.display(), records = records.len(), "trade log read");
    let summary = TradeStatistics::from_records(&records).summary();

    if json {
        print_json(&summary)?;
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(s: &StatisticsSummary) {
    println!("Trades:          {}", s.total_trades);
    println!("Winning:         {}", s.winning_trades);
    println!("Losing:          {}", s.losing_trades);
    println!("Win rate:        {:.2}%", s.win_rate);
    println!("Total P&L:       {:.2}", s.total_pnl);
    println!("Average P&L:     {:.2}", s.avg_pnl);
    println!("Largest win:     {:.2}", s.largest_win);
    println!("Largest loss:    {:.2}", s.largest_loss);
    match s.profit_factor {
        Some(pf) => println!("Profit factor:   {:.2}", pf),
        None => println!("Profit factor:   n/a"),
    }
    println!("Avg hold (min):  {:.1}", s.avg_hold_minutes);
    println!(
        "Exits:           S={} E={} P={} R={}",
        s.exits.stop, s.exits.early, s.exits.peak, s.exits.rsi
    );
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), TraderError> {
    let line = serde_json::to_string(value).map_err(|e| TraderError::Data {
        reason: format!("failed to encode output: {e}"),
    })?;
    println!("{line}");
    Ok(())
}
