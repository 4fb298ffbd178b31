use crate::data::loader::{parse_date, DATE_FORMAT};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("malformed catalog row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
}

//direction the event was expected to move the price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedSign {
    Positive,
    Negative,
    Neutral,
}

impl ExpectedSign {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "+" | "1" | "+1" | "1.0" | "positive" | "pos" | "up" => Some(ExpectedSign::Positive),
            "-" | "-1" | "-1.0" | "negative" | "neg" | "down" => Some(ExpectedSign::Negative),
            "0" | "0.0" | "neutral" | "none" => Some(ExpectedSign::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for ExpectedSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExpectedSign::Positive => "+",
            ExpectedSign::Negative => "-",
            ExpectedSign::Neutral => "0",
        };
        f.write_str(s)
    }
}

//one cataloged event, e.g. a trial readout for a ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub ticker: String,
    pub event_date: NaiveDate,
    pub expected_sign: ExpectedSign,
    pub phase: String,
}

impl EventRecord {
    //short human-readable id used for chart file names
    pub fn label(&self) -> String {
        format!("{}_{}", self.ticker, self.event_date.format(DATE_FORMAT))
    }
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "Company")]
    company: String,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Expected Sign")]
    expected_sign: String,
    #[serde(rename = "Phase", default)]
    phase: String,
}

fn parse_row(row: CatalogRow, line: usize) -> Result<EventRecord, CatalogError> {
    let malformed = |reason: String| CatalogError::MalformedRow { line, reason };

    let ticker = row.company.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(malformed("empty company".to_string()));
    }

    let event_date =
        parse_date(&row.date).ok_or_else(|| malformed(format!("bad date '{}'", row.date)))?;

    let expected_sign = ExpectedSign::parse(&row.expected_sign)
        .ok_or_else(|| malformed(format!("bad expected sign '{}'", row.expected_sign)))?;

    Ok(EventRecord {
        ticker,
        event_date,
        expected_sign,
        phase: row.phase.trim().to_string(),
    })
}

//loads the event catalog (Company, Date, Expected Sign, Phase)
//malformed rows are logged and skipped
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<EventRecord>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .context(format!("Failed to open catalog: {:?}", path))?;

    let mut events = Vec::new();
    let mut skipped = 0usize;

    for (index, result) in reader.deserialize::<CatalogRow>().enumerate() {
        let line = index + 2;
        let parsed = result
            .map_err(|e| CatalogError::MalformedRow {
                line,
                reason: e.to_string(),
            })
            .and_then(|row| parse_row(row, line));

        match parsed {
            Ok(event) => events.push(event),
            Err(err) => {
                skipped += 1;
                warn!(file = ?path, error = %err, "skipping catalog row");
            }
        }
    }

    info!(file = ?path, events = events.len(), skipped, "loaded event catalog");
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_rows_and_skips_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        std::fs::write(
            &path,
            "Company,Date,Expected Sign,Phase\n\
             mrna,2023-05-01,+,Phase 3\n\
             PFE,05/01/2023,-,Phase 2\n\
             BNTX,2023-06-12,maybe,Phase 1\n\
             NVAX,2023-07-20,-1,Phase 3\n",
        )
        .unwrap();

        let events = load_catalog(&path).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].ticker, "MRNA");
        assert_eq!(events[0].expected_sign, ExpectedSign::Positive);
        assert_eq!(events[1].expected_sign, ExpectedSign::Negative);
        assert_eq!(events[1].phase, "Phase 3");
    }

    #[test]
    fn bad_date_reports_line() {
        let row = CatalogRow {
            company: "PFE".into(),
            date: "yesterday".into(),
            expected_sign: "+".into(),
            phase: String::new(),
        };
        let err = parse_row(row, 7).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedRow { line: 7, .. }));
    }

    #[test]
    fn label_joins_ticker_and_date() {
        let event = EventRecord {
            ticker: "MRNA".into(),
            event_date: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
            expected_sign: ExpectedSign::Neutral,
            phase: "Phase 3".into(),
        };
        assert_eq!(event.label(), "MRNA_2023-05-01");
    }
}
