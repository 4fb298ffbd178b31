use crate::data::bar::{Bar, BarSeries};
use crate::data::provider::DataError;
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Adj Close", default)]
    adj_close: Option<f64>,
    #[serde(rename = "Volume")]
    volume: f64,
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Date")]
    date: &'a str,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Adj Close")]
    adj_close: f64,
    #[serde(rename = "Volume")]
    volume: f64,
}

//parses the leading yyyy-mm-dd of a date cell, tolerating a trailing time component
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let head = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(head, DATE_FORMAT).ok()
}

//loads a bar series csv (Date, Open, High, Low, Close, Adj Close, Volume)
//rows that do not parse are skipped, duplicates keep the first occurrence
pub fn load_csv<P: AsRef<Path>>(path: P, ticker: &str) -> Result<BarSeries, DataError> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut bars = Vec::new();

    for (index, result) in reader.deserialize::<CsvRecord>().enumerate() {
        //header is line 1
        let line = index + 2;
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                warn!(file = ?path, line, error = %err, "skipping unparseable bar row");
                continue;
            }
        };

        let Some(date) = parse_date(&record.date) else {
            warn!(file = ?path, line, date = %record.date, "skipping bar row with bad date");
            continue;
        };

        let adj_close = record.adj_close.unwrap_or(record.close);
        match Bar::new(
            date,
            record.open,
            record.high,
            record.low,
            record.close,
            adj_close,
            record.volume,
        ) {
            Ok(bar) => bars.push(bar),
            Err(err) => warn!(file = ?path, line, error = %err, "skipping invalid bar"),
        }
    }

    //sort by date to ensure chronological order
    bars.sort_by(|a, b| a.date.cmp(&b.date));
    let before = bars.len();
    bars.dedup_by(|later, earlier| later.date == earlier.date);
    if bars.len() != before {
        debug!(file = ?path, dropped = before - bars.len(), "dropped duplicate dates");
    }

    BarSeries::new(ticker, bars).map_err(|e| DataError::Malformed(e.to_string()))
}

//writes a bar series in the same layout load_csv reads
pub fn save_csv<P: AsRef<Path>>(series: &BarSeries, path: P) -> Result<(), DataError> {
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;

    for bar in series.bars() {
        let date = bar.date.format(DATE_FORMAT).to_string();
        writer.serialize(CsvRow {
            date: &date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            adj_close: bar.adj_close,
            volume: bar.volume,
        })?;
    }

    writer.flush()?;
    Ok(())
}
