//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_notifier::TextNotifier;
use crate::adapters::text_report;
use crate::domain::analysis::analyze_watchlist;
use crate::domain::batch::run_batch;
use crate::domain::config::FinbotConfig;
use crate::domain::strategy::Strategy;
use crate::domain::watchlist::Watchlist;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::notifier_port::NotifierPort;

const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "finbot", about = "Signal-ensemble trading analysis and backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest every enabled strategy over the watchlist
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Run a single instrument instead of the configured watchlist
        #[arg(long)]
        instrument: Option<String>,
        /// Run a single strategy (a member name or `composite`)
        #[arg(short, long)]
        strategy: Option<String>,
    },
    /// Report the ensemble's current signal for each watchlist instrument
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        /// Also report HOLD decisions
        #[arg(long)]
        include_hold: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            instrument,
            strategy,
        } => run_backtest(&config, instrument.as_deref(), strategy.as_deref()),
        Command::Analyze {
            config,
            include_hold,
        } => run_analyze(&config, include_hold),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Loads, parses and validates the whole configuration.
fn load_finbot_config(path: &PathBuf) -> Result<(FileConfigAdapter, FinbotConfig), ExitCode> {
    eprintln!("Loading config from {}", path.display());
    let adapter = load_config(path)?;
    match FinbotConfig::from_port(&adapter) {
        Ok(config) => Ok((adapter, config)),
        Err(e) => {
            eprintln!("error: {e}");
            Err((&e).into())
        }
    }
}

fn data_dir(adapter: &dyn ConfigPort) -> PathBuf {
    adapter
        .get_string("data", "dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Strategies to backtest: the named one, or every member plus the composite.
pub fn select_strategies(
    config: &FinbotConfig,
    name: Option<&str>,
) -> Result<Vec<Strategy>, ExitCode> {
    let selected = match name {
        Some(n) => config
            .build_strategy(&n.trim().to_lowercase())
            .map(|s| vec![s]),
        None => config.all_strategies(),
    };
    selected.map_err(|e| {
        eprintln!("error: {e}");
        (&e).into()
    })
}

fn run_backtest(
    config_path: &PathBuf,
    instrument: Option<&str>,
    strategy: Option<&str>,
) -> ExitCode {
    let (adapter, mut config) = match load_finbot_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Some(inst) = instrument {
        config.data.watchlist = Watchlist::single(inst);
    }
    let strategies = match select_strategies(&config, strategy) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let dir = data_dir(&adapter);
    eprintln!("Reading market data from {}", dir.display());
    let data = CsvAdapter::new(dir);
    let notifier = TextNotifier::new(io::stdout());

    run_backtest_pipeline(&data, &config, &strategies, &mut io::stdout(), &notifier)
}

/// Runs the batch, writes the full report to `out` and sends the summary
/// through the notifier.
pub fn run_backtest_pipeline(
    data: &dyn DataPort,
    config: &FinbotConfig,
    strategies: &[Strategy],
    out: &mut dyn Write,
    notifier: &dyn NotifierPort,
) -> ExitCode {
    eprintln!(
        "Running backtest: {} instruments x {} strategies, {} to {}",
        config.data.watchlist.len(),
        strategies.len(),
        config.data.start,
        config.data.end,
    );

    let report = run_batch(
        data,
        strategies,
        &config.data,
        &config.backtest,
        &config.evaluation,
    );

    for failure in &report.failures {
        eprintln!("warning: skipping {} ({})", failure.instrument, failure.error);
    }
    if report.outcomes.is_empty() {
        eprintln!("error: no instruments with data to backtest");
        return ExitCode::from(5);
    }

    let text = text_report::format_report(&report, &config.backtest);
    if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
        eprintln!("error: failed to write report: {e}");
        return ExitCode::from(1);
    }

    if let Err(e) = notifier.notify_report(&report) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    ExitCode::SUCCESS
}

fn run_analyze(config_path: &PathBuf, include_hold: bool) -> ExitCode {
    let (adapter, config) = match load_finbot_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data = CsvAdapter::new(data_dir(&adapter));
    let notifier = TextNotifier::new(io::stdout());
    run_analyze_pipeline(&data, &config, include_hold, &notifier)
}

pub fn run_analyze_pipeline(
    data: &dyn DataPort,
    config: &FinbotConfig,
    include_hold: bool,
    notifier: &dyn NotifierPort,
) -> ExitCode {
    let composite = match config.composite() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Analyzing {} instruments with {} strategies",
        config.data.watchlist.len(),
        composite.members().len()
    );
    let analysis = analyze_watchlist(data, &composite, &config.data);

    for failure in &analysis.failures {
        eprintln!("warning: skipping {} ({})", failure.instrument, failure.error);
    }
    if analysis.alerts.is_empty() {
        eprintln!("error: no instruments with data to analyze");
        return ExitCode::from(5);
    }

    let mut sent = 0;
    for alert in &analysis.alerts {
        if !include_hold && !alert.is_actionable() {
            eprintln!("  {}: HOLD", alert.instrument);
            continue;
        }
        if let Err(e) = notifier.notify_signal(alert) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        sent += 1;
    }
    eprintln!("{sent} signal(s) sent");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let (_, config) = match load_finbot_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    eprintln!("\nWatchlist: {}", config.data.watchlist.instruments().join(", "));
    eprintln!(
        "Period:    {} to {} ({} bars)",
        config.data.start, config.data.end, config.data.bar_size
    );
    eprintln!("Initial capital: {:.2}", config.backtest.initial_capital);
    eprintln!("\nEnsemble members:");
    for name in &config.members {
        eprintln!("  {:<14} weight {:.2}", name, config.ensemble.weight_for(name));
    }
    eprintln!(
        "Consensus threshold: {:.2}",
        config.ensemble.consensus_threshold
    );

    eprintln!("\nConfiguration is valid");
    ExitCode::SUCCESS
}
