use crate::data::loader::DATE_FORMAT;
use crate::data::BarSeries;
use crate::engine::{Fill, OrderSide};
use crate::indicators::{Band, BandPair, IndicatorSeries};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("could not render {file:?}: {reason}")]
    Render { file: PathBuf, reason: String },
}

//everything needed to draw one rule run
#[derive(Debug, Clone, Copy)]
pub struct RunChart<'a> {
    //simplified event id, e.g. MRNA_2023-05-01
    pub label: &'a str,
    pub tag: &'a str,
    pub series: &'a BarSeries,
    pub levels: &'a IndicatorSeries<Band>,
    pub bands: Option<&'a BandPair>,
    pub fills: &'a [Fill],
}

pub trait PlotSink: Send + Sync {
    fn render(&self, chart: &RunChart<'_>) -> Result<(), PlotError>;
}

//discards charts
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPlotSink;

impl PlotSink for NullPlotSink {
    fn render(&self, _chart: &RunChart<'_>) -> Result<(), PlotError> {
        Ok(())
    }
}

//writes chart data as csv, one file per event and rule
#[derive(Debug, Clone)]
pub struct CsvChartSink {
    dir: PathBuf,
}

impl CsvChartSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CsvChartSink { dir: dir.into() }
    }

    pub fn file_for(&self, label: &str, tag: &str) -> PathBuf {
        let name: String = format!("{}_{}", label, tag)
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.csv", name))
    }

    fn write(&self, path: &Path, chart: &RunChart<'_>) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::create_dir_all(&self.dir)?;
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "date",
            "close",
            "level",
            "inner_upper",
            "inner_lower",
            "outer_upper",
            "outer_lower",
            "buy",
            "sell",
        ])?;

        let mut fills_by_date: HashMap<_, Vec<&Fill>> = HashMap::new();
        for fill in chart.fills {
            fills_by_date.entry(fill.date).or_default().push(fill);
        }

        let cell = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
        let band_at = |bands: &IndicatorSeries<Band>, i: usize| bands.get(i).copied().flatten();

        for (i, bar) in chart.series.bars().iter().enumerate() {
            let level = band_at(chart.levels, i);
            let inner = chart.bands.and_then(|b| band_at(&b.inner, i));
            let outer = chart.bands.and_then(|b| band_at(&b.outer, i));

            let fill_price = |side: OrderSide| {
                fills_by_date
                    .get(&bar.date)
                    .and_then(|fills| fills.iter().find(|f| f.side == side))
                    .map(|f| f.fill_price)
            };

            writer.write_record([
                bar.date.format(DATE_FORMAT).to_string(),
                bar.close.to_string(),
                cell(level.map(|b| b.mid)),
                cell(inner.map(|b| b.upper)),
                cell(inner.map(|b| b.lower)),
                cell(outer.map(|b| b.upper)),
                cell(outer.map(|b| b.lower)),
                cell(fill_price(OrderSide::Buy)),
                cell(fill_price(OrderSide::Sell)),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl PlotSink for CsvChartSink {
    fn render(&self, chart: &RunChart<'_>) -> Result<(), PlotError> {
        let path = self.file_for(chart.label, chart.tag);
        self.write(&path, chart).map_err(|e| PlotError::Render {
            file: path.clone(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;
    use crate::data::Bar;
    use crate::engine::{BacktestConfig, BacktestEngine};
    use chrono::NaiveDate;

    #[test]
    fn writes_one_row_per_bar() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let bars = (0..30)
            .map(|i| {
                let close = 50.0 + ((i as f64) * 0.8).sin() * 5.0;
                Bar::from_close(start + chrono::Duration::days(i), close)
            })
            .collect();
        let series = BarSeries::new("MRNA", bars).unwrap();
        let mut engine =
            BacktestEngine::new(BacktestConfig::default(), &series, RuleConfig::bollinger(5, 0.5));
        let result = engine.run().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let sink = CsvChartSink::new(dir.path().join("charts"));
        let chart = RunChart {
            label: "MRNA_2023-01-16",
            tag: "bollinger/5",
            series: &series,
            levels: engine.strategy().levels(),
            bands: engine.strategy().display_bands(),
            fills: &result.fills,
        };
        sink.render(&chart).unwrap();

        let path = sink.file_for(chart.label, chart.tag);
        assert!(path.ends_with("MRNA_2023-01-16_bollinger_5.csv"));
        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents.lines().count(), 31);
    }

    #[test]
    fn unwritable_dir_is_a_plot_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        let series = BarSeries::new("X", vec![]).unwrap();
        let levels = Vec::new();
        let sink = CsvChartSink::new(blocker.join("charts"));
        let chart = RunChart {
            label: "X",
            tag: "t",
            series: &series,
            levels: &levels,
            bands: None,
            fills: &[],
        };
        assert!(matches!(sink.render(&chart), Err(PlotError::Render { .. })));
    }
}
