use crate::data::bar::BarSeries;
use crate::data::loader::{load_csv, save_csv, DATE_FORMAT};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum DataError {
    #[error("no bars for {ticker} between {start} and {end}")]
    DataUnavailable {
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("interval {0} is not supported by this provider")]
    UnsupportedInterval(Interval),

    #[error("malformed bar data: {0}")]
    Malformed(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

//bar interval requested from a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Interval {
    #[default]
    #[serde(rename = "1d")]
    Daily,
    #[serde(rename = "1wk")]
    Weekly,
    #[serde(rename = "1h")]
    Hourly,
}

impl Interval {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "1d" | "d" | "daily" => Some(Interval::Daily),
            "1wk" | "w" | "weekly" => Some(Interval::Weekly),
            "1h" | "h" | "hourly" => Some(Interval::Hourly),
            _ => None,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
            Interval::Hourly => "1h",
        };
        f.write_str(s)
    }
}

//source of ohlcv bars for a ticker and inclusive date range
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &str;

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<BarSeries, DataError>;
}

//cache file name for a ticker window, e.g. MSFT_2020-01-01_2023-06-30.csv
pub fn window_file_name(ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "{}_{}_{}.csv",
        ticker,
        start.format(DATE_FORMAT),
        end.format(DATE_FORMAT)
    )
}

fn non_empty(
    series: BarSeries,
    ticker: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BarSeries, DataError> {
    if series.is_empty() {
        return Err(DataError::DataUnavailable {
            ticker: ticker.to_string(),
            start,
            end,
        });
    }
    Ok(series)
}

//serves bars from a directory of csv files
//looks for TICKER_start_end.csv first, then TICKER.csv
#[derive(Debug, Clone)]
pub struct CsvDirectoryProvider {
    dir: PathBuf,
}

impl CsvDirectoryProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CsvDirectoryProvider { dir: dir.into() }
    }

    fn candidates(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> [PathBuf; 2] {
        [
            self.dir.join(window_file_name(ticker, start, end)),
            self.dir.join(format!("{}.csv", ticker)),
        ]
    }
}

impl MarketDataProvider for CsvDirectoryProvider {
    fn name(&self) -> &str {
        "csv-directory"
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<BarSeries, DataError> {
        if interval != Interval::Daily {
            return Err(DataError::UnsupportedInterval(interval));
        }

        let Some(path) = self
            .candidates(ticker, start, end)
            .into_iter()
            .find(|p| p.is_file())
        else {
            return Err(DataError::DataUnavailable {
                ticker: ticker.to_string(),
                start,
                end,
            });
        };

        debug!(ticker, file = ?path, "reading bars");
        let series = load_csv(&path, ticker)?.slice(start, end);
        non_empty(series, ticker, start, end)
    }
}

//wraps another provider and keeps a csv copy of every window it fetches
pub struct CachingProvider<P> {
    inner: P,
    cache_dir: PathBuf,
}

impl<P: MarketDataProvider> CachingProvider<P> {
    pub fn new(inner: P, cache_dir: impl Into<PathBuf>) -> Self {
        CachingProvider {
            inner,
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}

impl<P: MarketDataProvider> MarketDataProvider for CachingProvider<P> {
    fn name(&self) -> &str {
        "csv-cache"
    }

    fn fetch(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: Interval,
    ) -> Result<BarSeries, DataError> {
        let path = self.cache_dir.join(window_file_name(ticker, start, end));

        if interval == Interval::Daily && path.is_file() {
            debug!(ticker, file = ?path, "cache hit");
            let series = load_csv(&path, ticker)?;
            return non_empty(series, ticker, start, end);
        }

        let series = self.inner.fetch(ticker, start, end, interval)?;

        //a failed cache write only costs a refetch next time
        if interval == Interval::Daily {
            let written = std::fs::create_dir_all(&self.cache_dir)
                .map_err(DataError::from)
                .and_then(|_| save_csv(&series, &path));
            match written {
                Ok(()) => info!(ticker, file = ?path, bars = series.len(), "cached window"),
                Err(err) => warn!(ticker, file = ?path, error = %err, "could not write cache"),
            }
        }

        Ok(series)
    }
}
