//! CLI integration tests.
//!
//! Tests cover:
//! - Config loading and validation through the `validate` command
//! - Strategy selection for `backtest --strategy`
//! - The backtest and analyze pipelines against a MockDataPort
//! - End-to-end `backtest` with INI and CSV files on disk

mod common;

use clap::Parser;
use common::*;
use finbot::adapters::file_config_adapter::FileConfigAdapter;
use finbot::adapters::text_notifier::TextNotifier;
use finbot::cli::{self, Cli};
use finbot::domain::config::FinbotConfig;
use finbot::domain::error::DataError;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ExitCode has no PartialEq; compare the Debug form instead.
fn same_code(actual: ExitCode, expected: ExitCode) -> bool {
    format!("{actual:?}") == format!("{expected:?}")
}

fn run_cli(args: &[&str]) -> ExitCode {
    let mut argv = vec!["finbot"];
    argv.extend_from_slice(args);
    cli::run(Cli::parse_from(argv))
}

const VALID_INI: &str = r#"
[engine]
initial_capital = 10000.0
commission_rate = 0.001
position_fraction = 0.5
stop_loss_pct = 0.02
warmup_bars = 50
strategies = rsi, macd, bollinger

[data]
watchlist = AAPL, MSFT
start_date = 2024-01-01
end_date = 2024-12-31

[rsi]
period = 14
oversold_threshold = 30
overbought_threshold = 70

[ensemble]
consensus_threshold = 0.6
rsi = 0.4
macd = 0.3
bollinger = 0.3
"#;

fn valid_config() -> FinbotConfig {
    let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
    FinbotConfig::from_port(&adapter).unwrap()
}

fn market() -> MockDataPort {
    MockDataPort::new()
        .with_bars("AAPL", bars_from_closes(&wave_closes(200, 0.0)))
        .with_bars("MSFT", bars_from_closes(&wave_closes(200, 2.1)))
}

mod validate {
    use super::*;

    #[test]
    fn valid_config_succeeds() {
        let file = write_temp_ini(VALID_INI);
        let code = run_cli(&["validate", "-c", file.path().to_str().unwrap()]);
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let code = run_cli(&["validate", "-c", "/nonexistent/path/finbot.ini"]);
        assert!(same_code(code, ExitCode::from(2)));
    }

    #[test]
    fn inverted_rsi_thresholds_are_rejected() {
        let ini = VALID_INI.replace("oversold_threshold = 30", "oversold_threshold = 80");
        let file = write_temp_ini(&ini);
        let code = run_cli(&["validate", "-c", file.path().to_str().unwrap()]);
        assert!(same_code(code, ExitCode::from(2)));
    }

    #[test]
    fn missing_watchlist_is_rejected() {
        let file = write_temp_ini("[data]\nstart_date = 2024-01-01\nend_date = 2024-02-01\n");
        let code = run_cli(&["validate", "-c", file.path().to_str().unwrap()]);
        assert!(same_code(code, ExitCode::from(2)));
    }
}

mod strategy_selection {
    use super::*;

    #[test]
    fn default_is_members_then_composite() {
        let names: Vec<&str> = cli::select_strategies(&valid_config(), None)
            .unwrap()
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(names, vec!["rsi", "macd", "bollinger", "composite"]);
    }

    #[test]
    fn named_strategy_is_case_insensitive() {
        let selected = cli::select_strategies(&valid_config(), Some("MACD")).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name(), "macd");
    }

    #[test]
    fn unknown_strategy_fails() {
        let err = cli::select_strategies(&valid_config(), Some("astrology")).unwrap_err();
        assert!(same_code(err, ExitCode::from(2)));
    }
}

mod pipeline_mock {
    use super::*;

    #[test]
    fn backtest_writes_report_and_summary() {
        let config = valid_config();
        let strategies = cli::select_strategies(&config, None).unwrap();
        let notifier = TextNotifier::new(Vec::new());
        let mut out = Vec::new();

        let code = cli::run_backtest_pipeline(&market(), &config, &strategies, &mut out, &notifier);
        assert!(same_code(code, ExitCode::SUCCESS));

        let report = String::from_utf8(out).unwrap();
        assert!(report.contains("BACKTESTING REPORT FOR AAPL"));
        assert!(report.contains("BACKTESTING REPORT FOR MSFT"));
        assert!(report.contains("BEST PERFORMING STRATEGY"));

        let summary = String::from_utf8(notifier.into_inner().unwrap()).unwrap();
        assert!(summary.contains("BACKTEST RESULTS"));
        assert!(summary.contains("Symbol: AAPL"));
        assert!(summary.contains("Best Strategy:"));
    }

    #[test]
    fn backtest_reports_partial_failures() {
        let config = valid_config();
        let strategies = cli::select_strategies(&config, Some("rsi")).unwrap();
        let data = MockDataPort::new()
            .with_bars("AAPL", bars_from_closes(&wave_closes(200, 0.0)))
            .with_error("MSFT", DataError::Malformed("bad row".into()));
        let notifier = TextNotifier::new(Vec::new());
        let mut out = Vec::new();

        let code = cli::run_backtest_pipeline(&data, &config, &strategies, &mut out, &notifier);
        assert!(same_code(code, ExitCode::SUCCESS));

        let summary = String::from_utf8(notifier.into_inner().unwrap()).unwrap();
        assert!(summary.contains("Symbol: MSFT\nNo data:"));
    }

    #[test]
    fn backtest_without_any_data_fails() {
        let config = valid_config();
        let strategies = cli::select_strategies(&config, None).unwrap();
        let notifier = TextNotifier::new(Vec::new());
        let mut out = Vec::new();

        let code =
            cli::run_backtest_pipeline(&MockDataPort::new(), &config, &strategies, &mut out, &notifier);
        assert!(same_code(code, ExitCode::from(5)));
        assert!(out.is_empty());
    }

    #[test]
    fn analyze_with_hold_alerts_every_instrument() {
        let config = valid_config();
        let notifier = TextNotifier::new(Vec::new());

        let code = cli::run_analyze_pipeline(&market(), &config, true, &notifier);
        assert!(same_code(code, ExitCode::SUCCESS));

        let sent = String::from_utf8(notifier.into_inner().unwrap()).unwrap();
        assert_eq!(sent.matches("TRADING SIGNAL").count(), 2);
        assert!(sent.contains("Symbol: AAPL"));
        assert!(sent.contains("Symbol: MSFT"));
        assert!(sent.contains("Strategy: composite"));
    }
}

mod end_to_end {
    use super::*;

    fn write_csv(dir: &Path, instrument: &str, closes: &[f64]) {
        let mut csv = String::from("timestamp,open,high,low,close,volume\n");
        for bar in bars_from_closes(closes) {
            csv.push_str(&format!(
                "{},{},{},{},{},{}\n",
                bar.timestamp.date(),
                bar.open,
                bar.high,
                bar.low,
                bar.close,
                bar.volume
            ));
        }
        std::fs::write(dir.join(format!("{instrument}.csv")), csv).unwrap();
    }

    fn ini_for(dir: &Path) -> String {
        format!(
            "[engine]\nwarmup_bars = 30\nstrategies = rsi, bollinger\n\n\
             [data]\nwatchlist = AAPL\nstart_date = 2024-01-01\nend_date = 2024-12-31\ndir = {}\n",
            dir.display()
        )
    }

    #[test]
    fn backtest_single_instrument_from_csv() {
        let data_dir = tempfile::TempDir::new().unwrap();
        write_csv(data_dir.path(), "AAPL", &wave_closes(150, 0.0));
        let file = write_temp_ini(&ini_for(data_dir.path()));

        let code = run_cli(&[
            "backtest",
            "-c",
            file.path().to_str().unwrap(),
            "--strategy",
            "composite",
        ]);
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn analyze_from_csv() {
        let data_dir = tempfile::TempDir::new().unwrap();
        write_csv(data_dir.path(), "AAPL", &wave_closes(120, 0.5));
        let file = write_temp_ini(&ini_for(data_dir.path()));

        let code = run_cli(&["analyze", "-c", file.path().to_str().unwrap(), "--include-hold"]);
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn instrument_override_without_file_fails() {
        let data_dir = tempfile::TempDir::new().unwrap();
        write_csv(data_dir.path(), "AAPL", &wave_closes(80, 0.0));
        let file = write_temp_ini(&ini_for(data_dir.path()));

        let code = run_cli(&[
            "backtest",
            "-c",
            file.path().to_str().unwrap(),
            "--instrument",
            "tsla",
        ]);
        assert!(same_code(code, ExitCode::from(5)));
    }
}
