//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::cell::RefCell;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::adapters::replay_oracle::ReplayOracle;
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestReport, ModelConfig};
use crate::domain::calendar::{parse_date, trading_days};
use crate::domain::config_validation::{validate_backtest_config, validate_data_config};
use crate::domain::error::SignaltraderError;
use crate::domain::metrics::DEFAULT_RISK_FREE_RATE;
use crate::domain::progress::{ProgressEvent, COMPLETE_EVENT, ERROR_EVENT};
use crate::ports::config_port::ConfigPort;
use crate::ports::decision_port::DecisionOracle;
use crate::ports::progress_port::{NoProgress, ProgressSink};
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "signaltrader", about = "Decision-driven portfolio backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay recorded decisions over the configured window
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,
        /// Also write one CSV row per simulated day
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Echo progress events to stderr as JSON lines
        #[arg(long)]
        progress: bool,
    },
    /// Validate a configuration file without running
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            csv,
            progress,
        } => run_backtest_command(&config, &output, csv.as_deref(), progress),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, SignaltraderError> {
    let date = |key: &str| {
        adapter
            .get_string("backtest", key)
            .ok_or_else(|| SignaltraderError::ConfigMissing {
                section: "backtest".into(),
                key: key.into(),
            })
            .and_then(|s| parse_date(&s))
    };
    let start_date = date("start_date")?;
    let end_date = date("end_date")?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: adapter.get_double("backtest", "initial_capital", 100_000.0)?,
        margin_requirement: adapter.get_double("backtest", "margin_requirement", 0.0)?,
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", DEFAULT_RISK_FREE_RATE)?,
        tickers: adapter.get_list("backtest", "tickers").unwrap_or_default(),
        model: ModelConfig {
            name: adapter.get_string("model", "name").unwrap_or_default(),
            provider: adapter.get_string("model", "provider").unwrap_or_default(),
        },
    })
}

fn load_and_validate(config_path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)
        .and_then(|()| validate_data_config(&adapter))
        .map_err(|e| {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        })?;
    Ok(adapter)
}

fn build_oracle(
    adapter: &dyn ConfigPort,
    tickers: &[String],
) -> Result<ReplayOracle<CsvAdapter>, SignaltraderError> {
    let prices_dir = adapter.get_string("data", "prices_dir").unwrap_or_default();
    let decisions = adapter.get_string("data", "decisions").unwrap_or_default();
    let prices = CsvAdapter::load(prices_dir.trim(), tickers)?;
    ReplayOracle::from_file(decisions.trim(), prices)
}

#[derive(Serialize)]
struct Frame<'a, T> {
    event: &'a str,
    data: &'a T,
}

/// Write one `{"event": ..., "data": ...}` line and flush it.
fn write_frame<W: Write, T: Serialize>(out: &mut W, event: &str, data: &T) {
    let written = serde_json::to_writer(&mut *out, &Frame { event, data })
        .map_err(io::Error::from)
        .and_then(|()| writeln!(out))
        .and_then(|()| out.flush());
    if let Err(e) = written {
        tracing::warn!(error = %e, event, "failed to write progress frame");
    }
}

fn emit<T: Serialize>(event: &str, data: &T) {
    write_frame(&mut io::stderr().lock(), event, data);
}

/// Progress sink that writes every event as a JSON line the moment it is sent.
struct JsonLines<W: Write>(RefCell<W>);

impl<W: Write> ProgressSink for JsonLines<W> {
    fn send(&self, event: ProgressEvent) {
        write_frame(&mut *self.0.borrow_mut(), event.event_name(), &event);
    }
}

async fn replay<O: DecisionOracle>(
    config: BacktestConfig,
    oracle: &O,
    progress: bool,
) -> BacktestReport {
    if !progress {
        return run_backtest(config, oracle, &NoProgress).await;
    }

    let sink = JsonLines(RefCell::new(io::stderr()));
    let report = run_backtest(config, oracle, &sink).await;
    emit(COMPLETE_EVENT, &report.performance_metrics);
    report
}

fn fail(err: SignaltraderError, progress: bool) -> ExitCode {
    if progress {
        emit(ERROR_EVENT, &serde_json::json!({ "message": err.to_string() }));
    }
    eprintln!("error: {err}");
    (&err).into()
}

fn run_backtest_command(
    config_path: &Path,
    output_path: &Path,
    csv_path: Option<&Path>,
    progress: bool,
) -> ExitCode {
    // Stage 1: Load and validate config
    let adapter = match load_and_validate(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Build BacktestConfig
    let bt_config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e, progress),
    };

    // Stage 3: Load prices and recorded decisions
    let oracle = match build_oracle(&adapter, &bt_config.tickers) {
        Ok(o) => o,
        Err(e) => return fail(e, progress),
    };

    let dates = trading_days(bt_config.start_date, bt_config.end_date);
    eprintln!(
        "Backtesting {} tickers over {} trading days ({} to {})",
        bt_config.tickers.len(),
        dates.len(),
        bt_config.start_date,
        bt_config.end_date
    );
    if oracle.is_empty() {
        eprintln!("warning: no recorded decisions loaded; every day will be skipped");
    }

    // Stage 4: Run
    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(rt) => rt,
        Err(e) => return fail(e.into(), progress),
    };
    let report = runtime.block_on(replay(bt_config, &oracle, progress));

    print_summary(&report);

    // Stage 5: Reports
    if let Err(e) = JsonReportAdapter::new().write(&report, output_path) {
        return fail(e, progress);
    }
    eprintln!("\nReport written to: {}", output_path.display());

    if let Some(csv_path) = csv_path {
        if let Err(e) = CsvReportAdapter::new().write(&report, csv_path) {
            return fail(e, progress);
        }
        eprintln!("Daily CSV written to: {}", csv_path.display());
    }

    ExitCode::SUCCESS
}

fn print_summary(report: &BacktestReport) {
    let metrics = &report.performance_metrics;
    eprintln!("\n=== Backtest Results ===");
    eprintln!("Initial Capital:   {:.2}", metrics.initial_capital);
    eprintln!("Final Value:       {:.2}", report.final_portfolio.value);
    eprintln!("Total Return:      {:.2}%", metrics.total_return * 100.0);
    eprintln!("Annualized Return: {:.2}%", metrics.annualized_return * 100.0);
    eprintln!("Volatility:        {:.2}%", metrics.volatility * 100.0);
    eprintln!("Sharpe Ratio:      {:.2}", metrics.sharpe_ratio);
    eprintln!("Max Drawdown:      -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("Days Run:          {}", report.results.len());
    eprintln!("Days Skipped:      {}", report.skipped_days.len());
    for skip in &report.skipped_days {
        eprintln!("  {}: {}", skip.date, skip.reason);
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_and_validate(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let config = match build_backtest_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let dates = trading_days(config.start_date, config.end_date);
    eprintln!("Config validated successfully: {}", adapter.source());
    eprintln!("  Window:          {} to {}", config.start_date, config.end_date);
    eprintln!("  Trading days:    {}", dates.len());
    eprintln!("  Tickers:         {}", config.tickers.join(", "));
    eprintln!("  Initial capital: {:.2}", config.initial_capital);
    if !config.model.name.is_empty() {
        eprintln!("  Model:           {} ({})", config.model.name, config.model.provider);
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{Backtest, BacktestState};
    use crate::ports::decision_port::{DecisionRequest, OracleData, OracleMessage, OracleResponse};

    const CONFIG: &str = "[backtest]\n\
        start_date = 2024-01-08\n\
        end_date = 2024-01-12\n\
        tickers = aapl, msft\n\
        [model]\n\
        name = gpt-4o\n\
        provider = OpenAI\n";

    #[test]
    fn builds_config_with_defaults() {
        let adapter = FileConfigAdapter::from_string(CONFIG).unwrap();
        let config = build_backtest_config(&adapter).unwrap();

        assert_eq!(config.start_date.to_string(), "2024-01-08");
        assert_eq!(config.initial_capital, 100_000.0);
        assert_eq!(config.margin_requirement, 0.0);
        assert_eq!(config.risk_free_rate, DEFAULT_RISK_FREE_RATE);
        assert_eq!(config.tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(config.model.name, "gpt-4o");
    }

    #[test]
    fn missing_end_date_is_reported() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nstart_date = 2024-01-08\n").unwrap();
        let err = build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, SignaltraderError::ConfigMissing { key, .. } if key == "end_date"));
    }

    #[test]
    fn mistyped_capital_is_an_error_not_the_default() {
        let adapter = FileConfigAdapter::from_string(
            "[backtest]\nstart_date = 2024-01-08\nend_date = 2024-01-12\ninitial_capital = 10k\n",
        )
        .unwrap();
        let err = build_backtest_config(&adapter).unwrap_err();
        assert!(matches!(err, SignaltraderError::ConfigInvalid { key, .. } if key == "initial_capital"));
    }

    struct NoTrades;

    impl DecisionOracle for NoTrades {
        async fn decide(
            &self,
            _request: DecisionRequest<'_>,
        ) -> Result<OracleResponse, SignaltraderError> {
            Ok(OracleResponse {
                messages: vec![OracleMessage::new("{}")],
                data: OracleData::default(),
            })
        }
    }

    #[tokio::test]
    async fn progress_lines_are_written_as_each_day_runs() {
        let start = parse_date("2024-01-08").unwrap();
        let end = parse_date("2024-01-10").unwrap();
        let mut backtest = Backtest::new(BacktestConfig::new(start, end, 1_000.0));
        let sink = JsonLines(RefCell::new(Vec::new()));

        backtest.step(&NoTrades, &sink).await;
        assert_eq!(backtest.state(), BacktestState::Running);

        let text = String::from_utf8(sink.0.borrow().clone()).unwrap();
        let frames: Vec<serde_json::Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0]["event"], "progress");
        assert_eq!(frames[0]["data"]["type"], "progress");
        assert_eq!(frames[0]["data"]["current_step"], 1);
        assert_eq!(frames[1]["data"]["type"], "backtest_result");
        assert_eq!(frames[1]["data"]["data"]["date"], "2024-01-08");
    }

    #[test]
    fn cli_parses_backtest_flags() {
        let cli = Cli::try_parse_from([
            "signaltrader",
            "backtest",
            "-c",
            "bt.ini",
            "--csv",
            "days.csv",
            "--progress",
        ])
        .unwrap();
        match cli.command {
            Command::Backtest {
                config,
                output,
                csv,
                progress,
            } => {
                assert_eq!(config, PathBuf::from("bt.ini"));
                assert_eq!(output, PathBuf::from("report.json"));
                assert_eq!(csv, Some(PathBuf::from("days.csv")));
                assert!(progress);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
