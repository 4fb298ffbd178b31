use crate::config::{StudyConfig, SweepEntry};
use crate::data::{BarSeries, EventRecord, MarketDataProvider};
use crate::engine::{BacktestConfig, BacktestEngine};
use crate::plot::{NullPlotSink, PlotSink, RunChart};
use crate::study::results::{ResultRow, ResultTable};
use crate::study::window::{baseline_returns, EventWindow};
use anyhow::Result;
use rayon::prelude::*;
use tracing::{debug, info, warn};

//an event whose bars were fetched
struct LoadedEvent<'e> {
    event: &'e EventRecord,
    window: EventWindow,
    series: BarSeries,
}

//runs every sweep rule over a window around every cataloged event
pub struct EventStudy<'p> {
    config: StudyConfig,
    columns: Vec<String>,
    backtest: BacktestConfig,
    provider: &'p dyn MarketDataProvider,
    plot: Box<dyn PlotSink>,
}

impl<'p> EventStudy<'p> {
    pub fn new(config: StudyConfig, provider: &'p dyn MarketDataProvider) -> Result<Self> {
        config.validate()?;
        let backtest = BacktestConfig {
            initial_cash: config.initial_cash,
            order_ratio: config.sizing.order_ratio()?,
        };

        Ok(EventStudy {
            columns: config.columns(),
            config,
            backtest,
            provider,
            plot: Box::new(NullPlotSink),
        })
    }

    pub fn with_plot_sink(mut self, sink: Box<dyn PlotSink>) -> Self {
        self.plot = sink;
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn run(&self, events: &[EventRecord]) -> ResultTable {
        info!(
            events = events.len(),
            rules = self.columns.len(),
            provider = self.provider.name(),
            "starting event study"
        );

        //all i/o happens here, before any simulation
        let loaded: Vec<LoadedEvent<'_>> = events.iter().filter_map(|e| self.load(e)).collect();

        let rows: Vec<ResultRow> = if self.config.parallel {
            loaded.par_iter().map(|e| self.study_event(e)).collect()
        } else {
            loaded.iter().map(|e| self.study_event(e)).collect()
        };

        let mut table = ResultTable::new(self.columns.clone());
        for row in rows {
            table.push(row);
        }

        info!(
            rows = table.len(),
            skipped = events.len() - table.len(),
            "event study finished"
        );
        table
    }

    fn load<'e>(&self, event: &'e EventRecord) -> Option<LoadedEvent<'e>> {
        let Some(window) = EventWindow::around(event.event_date, self.config.duration_days) else {
            warn!(
                ticker = %event.ticker,
                date = %event.event_date,
                duration = self.config.duration_days,
                "skipping event, window out of calendar range"
            );
            return None;
        };

        match self
            .provider
            .fetch(&event.ticker, window.start, window.end, self.config.interval)
        {
            Ok(series) => Some(LoadedEvent {
                event,
                window,
                //providers may hand back more than was asked for
                series: series.slice(window.start, window.end),
            }),
            Err(err) => {
                warn!(
                    ticker = %event.ticker,
                    date = %event.event_date,
                    error = %err,
                    "skipping event"
                );
                None
            }
        }
    }

    fn study_event(&self, loaded: &LoadedEvent<'_>) -> ResultRow {
        let mut row = ResultRow::for_event(loaded.event);

        match baseline_returns(&loaded.series, &loaded.window) {
            Some(baseline) => {
                row.long = Some(baseline.long);
                row.short = Some(baseline.short);
            }
            None => warn!(ticker = %loaded.event.ticker, "no baseline for window"),
        }

        for (entry, column) in self.config.sweep.iter().zip(&self.columns) {
            let value = self.run_rule(loaded, entry, column);
            row.returns.insert(column.clone(), value);
        }

        row
    }

    //one isolated run, failures become a missing cell
    fn run_rule(&self, loaded: &LoadedEvent<'_>, entry: &SweepEntry, column: &str) -> Option<f64> {
        let mut engine = BacktestEngine::new(self.backtest, &loaded.series, entry.rule.clone());

        let result = match engine.run() {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    ticker = %loaded.event.ticker,
                    rule = column,
                    error = %err,
                    "rule run failed"
                );
                return None;
            }
        };

        debug!(
            ticker = %loaded.event.ticker,
            rule = column,
            fills = result.fills.len(),
            value = result.terminal_value,
            "rule run finished"
        );

        let label = loaded.event.label();
        let chart = RunChart {
            label: &label,
            tag: column,
            series: &loaded.series,
            levels: engine.strategy().levels(),
            bands: engine.strategy().display_bands(),
            fills: &result.fills,
        };
        if let Err(err) = self.plot.render(&chart) {
            warn!(error = %err, "chart skipped");
        }

        Some(result.total_return)
    }
}
