use crate::data::loader::{parse_date, DATE_FORMAT};
use crate::data::{EventRecord, ExpectedSign};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use indexmap::IndexMap;
use prettytable::{Cell, Row, Table};
use std::path::Path;

const FIXED_COLUMNS: [&str; 6] = ["name", "release_date", "result", "stage", "long", "short"];

//one event's outcome across the sweep
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub name: String,
    pub release_date: NaiveDate,
    pub result: ExpectedSign,
    pub stage: String,
    pub long: Option<f64>,
    pub short: Option<f64>,
    //rule column -> return, none where the run failed
    pub returns: IndexMap<String, Option<f64>>,
}

impl ResultRow {
    pub fn for_event(event: &EventRecord) -> Self {
        ResultRow {
            name: event.ticker.clone(),
            release_date: event.event_date,
            result: event.expected_sign,
            stage: event.phase.clone(),
            long: None,
            short: None,
            returns: IndexMap::new(),
        }
    }
}

fn format_cell(value: Option<f64>) -> String {
    //shortest representation that parses back to the same f64
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_cell(raw: &str) -> Result<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let value: f64 = raw
        .parse()
        .with_context(|| format!("bad numeric cell '{}'", raw))?;
    Ok(Some(value))
}

//accumulated study output, columns in sweep declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn new(columns: Vec<String>) -> Self {
        ResultTable {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header(&self) -> Vec<String> {
        FIXED_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.columns.iter().cloned())
            .collect()
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = WriterBuilder::new()
            .from_path(path)
            .context(format!("Failed to create result file: {:?}", path))?;

        writer.write_record(self.header())?;

        for row in &self.rows {
            let mut record = vec![
                row.name.clone(),
                row.release_date.format(DATE_FORMAT).to_string(),
                row.result.to_string(),
                row.stage.clone(),
                format_cell(row.long),
                format_cell(row.short),
            ];
            for column in &self.columns {
                record.push(format_cell(row.returns.get(column).copied().flatten()));
            }
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .context(format!("Failed to open result file: {:?}", path))?;

        let headers = reader.headers()?.clone();
        let fixed: Vec<&str> = headers.iter().take(FIXED_COLUMNS.len()).collect();
        if fixed != FIXED_COLUMNS {
            bail!("unexpected result header {:?}", fixed);
        }

        let columns: Vec<String> = headers
            .iter()
            .skip(FIXED_COLUMNS.len())
            .map(str::to_string)
            .collect();
        let mut table = ResultTable::new(columns);

        for (index, record) in reader.records().enumerate() {
            let line = index + 2;
            let record = record.context(format!("line {}", line))?;
            let field = |i: usize| record.get(i).unwrap_or("");

            let release_date = parse_date(field(1))
                .with_context(|| format!("line {}: bad release_date '{}'", line, field(1)))?;
            let result = ExpectedSign::parse(field(2))
                .with_context(|| format!("line {}: bad result '{}'", line, field(2)))?;

            let mut returns = IndexMap::new();
            for (offset, column) in table.columns.iter().enumerate() {
                let value = parse_cell(field(FIXED_COLUMNS.len() + offset))
                    .context(format!("line {}, column {}", line, column))?;
                returns.insert(column.clone(), value);
            }

            table.rows.push(ResultRow {
                name: field(0).to_string(),
                release_date,
                result,
                stage: field(3).to_string(),
                long: parse_cell(field(4)).context(format!("line {}, column long", line))?,
                short: parse_cell(field(5)).context(format!("line {}, column short", line))?,
                returns,
            });
        }

        Ok(table)
    }

    //mean return per rule column over the events where it is defined
    pub fn column_means(&self) -> IndexMap<String, Option<f64>> {
        let mean = |values: Vec<f64>| {
            (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
        };

        let mut means = IndexMap::new();
        means.insert(
            "long".to_string(),
            mean(self.rows.iter().filter_map(|r| r.long).collect()),
        );
        means.insert(
            "short".to_string(),
            mean(self.rows.iter().filter_map(|r| r.short).collect()),
        );
        for column in &self.columns {
            let values = self
                .rows
                .iter()
                .filter_map(|r| r.returns.get(column).copied().flatten())
                .collect();
            means.insert(column.clone(), mean(values));
        }
        means
    }

    //prints the per-column mean returns
    pub fn pretty_print_summary(&self) {
        let mut table = Table::new();
        table.add_row(Row::new(vec![Cell::new("Column"), Cell::new("Mean Return")]));

        for (column, mean) in self.column_means() {
            let value = mean
                .map(|m| format!("{:.2}%", m * 100.0))
                .unwrap_or_else(|| "n/a".to_string());
            table.add_row(Row::new(vec![Cell::new(&column), Cell::new(&value)]));
        }

        table.printstd();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(returns: &[(&str, Option<f64>)]) -> ResultRow {
        ResultRow {
            name: "MRNA".into(),
            release_date: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
            result: ExpectedSign::Positive,
            stage: "Phase 3".into(),
            long: Some(0.125),
            short: Some(-1.0 / 9.0),
            returns: returns
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    #[test]
    fn header_follows_sweep_order() {
        let table = ResultTable::new(vec!["b".into(), "a".into()]);
        assert_eq!(
            table.header(),
            vec!["name", "release_date", "result", "stage", "long", "short", "b", "a"]
        );
    }

    #[test]
    fn missing_values_survive_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let mut table = ResultTable::new(vec!["x".into(), "y".into()]);
        table.push(row(&[("x", None), ("y", Some(0.3))]));

        table.write_csv(&path).unwrap();
        let loaded = ResultTable::read_csv(&path).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn column_means_skip_missing() {
        let mut table = ResultTable::new(vec!["x".into()]);
        table.push(row(&[("x", Some(0.1))]));
        table.push(row(&[("x", None)]));
        table.push(row(&[("x", Some(0.3))]));

        let means = table.column_means();
        assert!((means["x"].unwrap() - 0.2).abs() < 1e-12);
        assert!((means["long"].unwrap() - 0.125).abs() < 1e-12);
    }

    #[test]
    fn rejects_foreign_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.csv");
        std::fs::write(&path, "a,b,c\n1,2,3\n").unwrap();
        assert!(ResultTable::read_csv(&path).is_err());
    }
}
