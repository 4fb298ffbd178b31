use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eventbt::logging::init_logging;
use eventbt::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "eventbt")]
#[command(about = "Event-study backtesting of simple equity trading rules", long_about = None)]
struct Cli {
    //emit logs as json lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    //run every sweep rule around every cataloged event
    Study {
        //event catalog csv (Company, Date, Expected Sign, Phase)
        #[arg(long)]
        catalog: PathBuf,

        //directory holding per-ticker bar csv files
        #[arg(long)]
        data: PathBuf,

        //keep a csv copy of every fetched window here
        #[arg(long)]
        cache: Option<PathBuf>,

        //study configuration json (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        //output result table
        #[arg(long, default_value = "results.csv")]
        output: PathBuf,

        //write per-run chart data here (overrides the config)
        #[arg(long)]
        plot_dir: Option<PathBuf>,

        //run events one after another
        #[arg(long)]
        sequential: bool,

        //bar interval (1d, 1wk, 1h)
        #[arg(long)]
        interval: Option<String>,
    },

    //run a single rule over one bar csv
    Run {
        //path to bar csv file
        #[arg(long)]
        data: PathBuf,

        //ticker label for the series
        #[arg(long, default_value = "TICKER")]
        ticker: String,

        //rule (bollinger, inverse_bollinger, sma, hodl_long, hodl_short)
        #[arg(long)]
        strategy: String,

        //indicator lookback
        #[arg(long)]
        period: Option<usize>,

        //inner band deviation factor
        #[arg(long)]
        devfactor: Option<f64>,

        //signal mode (level, cross)
        #[arg(long)]
        mode: Option<String>,

        #[arg(long, default_value = "10000000")]
        initial_cash: f64,

        //fraction of portfolio value per order
        #[arg(long, default_value = "0.1")]
        order_ratio: f64,

        //output path for equity curve csv
        #[arg(long)]
        output_equity_csv: Option<PathBuf>,

        //output path for trades csv
        #[arg(long)]
        output_trades_csv: Option<PathBuf>,
    },

    //write the default study configuration
    InitConfig {
        #[arg(long, default_value = "study.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    match cli.command {
        Commands::Study {
            catalog,
            data,
            cache,
            config,
            output,
            plot_dir,
            sequential,
            interval,
        } => {
            let mut study_config = match &config {
                Some(path) => StudyConfig::from_json_file(path)
                    .context(format!("Failed to load configuration from {:?}", path))?,
                None => StudyConfig::default(),
            };
            if plot_dir.is_some() {
                study_config.plot_dir = plot_dir;
            }
            if sequential {
                study_config.parallel = false;
            }
            if let Some(raw) = interval {
                study_config.interval = Interval::parse(&raw)
                    .ok_or_else(|| anyhow::anyhow!("Unknown interval: {}", raw))?;
            }
            run_study(catalog, data, cache, study_config, output)
        }
        Commands::Run {
            data,
            ticker,
            strategy,
            period,
            devfactor,
            mode,
            initial_cash,
            order_ratio,
            output_equity_csv,
            output_trades_csv,
        } => {
            let rule = build_rule(&strategy, period, devfactor, mode.as_deref())?;
            let order_ratio = SizingPolicy::Fixed { ratio: order_ratio }.order_ratio()?;
            run_single(
                data,
                ticker,
                rule,
                BacktestConfig {
                    initial_cash,
                    order_ratio,
                },
                output_equity_csv,
                output_trades_csv,
            )
        }
        Commands::InitConfig { output } => {
            StudyConfig::default().to_json_file(&output)?;
            info!(file = ?output, "wrote default configuration");
            Ok(())
        }
    }
}

fn run_study(
    catalog: PathBuf,
    data: PathBuf,
    cache: Option<PathBuf>,
    config: StudyConfig,
    output: PathBuf,
) -> Result<()> {
    let events = load_catalog(&catalog)?;

    let source = CsvDirectoryProvider::new(data);
    let cached;
    let provider: &dyn MarketDataProvider = match cache {
        Some(dir) => {
            cached = CachingProvider::new(source, dir);
            &cached
        }
        None => &source,
    };

    let plot: Box<dyn PlotSink> = match &config.plot_dir {
        Some(dir) => Box::new(CsvChartSink::new(dir)),
        None => Box::new(NullPlotSink),
    };

    let study = EventStudy::new(config, provider)?.with_plot_sink(plot);
    let table = study.run(&events);

    table.write_csv(&output)?;
    info!(file = ?output, rows = table.len(), "wrote results");
    table.pretty_print_summary();

    Ok(())
}

fn build_rule(
    name: &str,
    period: Option<usize>,
    devfactor: Option<f64>,
    mode: Option<&str>,
) -> Result<RuleConfig> {
    let mut rule =
        RuleConfig::parse(name).ok_or_else(|| anyhow::anyhow!("Unknown strategy: {}", name))?;

    let mode = match mode.map(str::to_lowercase).as_deref() {
        None => None,
        Some("level") => Some(SignalMode::Level),
        Some("cross") => Some(SignalMode::Cross),
        Some(other) => anyhow::bail!("Unknown signal mode: {}", other),
    };

    match &mut rule {
        RuleConfig::Bollinger {
            period: p,
            inner_devfactor: k,
            mode: m,
            ..
        }
        | RuleConfig::InverseBollinger {
            period: p,
            inner_devfactor: k,
            mode: m,
            ..
        } => {
            *p = period.unwrap_or(*p);
            *k = devfactor.unwrap_or(*k);
            *m = mode.unwrap_or(*m);
        }
        RuleConfig::SmaCrossover { period: p, mode: m } => {
            *p = period.unwrap_or(*p);
            *m = mode.unwrap_or(*m);
        }
        RuleConfig::BuyAndHoldLong | RuleConfig::BuyAndHoldShort => {}
    }

    //reuse sweep validation for a single rule
    let check = StudyConfig {
        sweep: vec![SweepEntry::new(rule.clone())],
        ..StudyConfig::default()
    };
    check.validate()?;

    Ok(rule)
}

fn run_single(
    data_path: PathBuf,
    ticker: String,
    rule: RuleConfig,
    config: BacktestConfig,
    output_equity_csv: Option<PathBuf>,
    output_trades_csv: Option<PathBuf>,
) -> Result<()> {
    let series =
        load_csv(&data_path, &ticker).context(format!("Failed to load data from {:?}", data_path))?;

    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        anyhow::bail!("No bars found in {:?}", data_path);
    };
    info!(
        ticker = %ticker,
        bars = series.len(),
        from = %first.date,
        to = %last.date,
        rule = %rule.default_tag(),
        "running backtest"
    );

    let mut engine = BacktestEngine::new(config, &series, rule);
    let result = engine.run()?;

    result.summary.pretty_print_table();

    if let Some(path) = output_equity_csv {
        write_rows(&result.equity_curve, &path)?;
        info!(file = ?path, "equity curve saved");
    }

    if let Some(path) = output_trades_csv {
        write_rows(&result.fills, &path)?;
        info!(file = ?path, "trades saved");
    }

    Ok(())
}

fn write_rows<T: Serialize>(rows: &[T], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
