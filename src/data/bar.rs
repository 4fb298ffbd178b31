use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum BarError {
    #[error("Invalid OHLC values: high ({high}) < low ({low})")]
    InvalidHighLow { high: f64, low: f64 },
    #[error("Invalid close price: {0}")]
    InvalidClose(f64),
    #[error("Negative volume: {0}")]
    NegativeVolume(f64),
    #[error("Bars out of order: {current} does not follow {previous}")]
    OutOfOrder {
        previous: NaiveDate,
        current: NaiveDate,
    },
}

//represents a single daily ohlcv bar of market data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: f64,
}

impl Bar {
    //creates a new Bar with validation
    pub fn new(
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        adj_close: f64,
        volume: f64,
    ) -> Result<Self, BarError> {
        if high < low {
            return Err(BarError::InvalidHighLow { high, low });
        }

        //close drives every indicator, so it must be a usable price
        if !close.is_finite() || close <= 0.0 {
            return Err(BarError::InvalidClose(close));
        }

        if volume < 0.0 {
            return Err(BarError::NegativeVolume(volume));
        }

        Ok(Bar {
            date,
            open,
            high,
            low,
            close,
            adj_close,
            volume,
        })
    }

    //creates a bar where every price equals close, handy for synthetic series
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Bar {
            date,
            open: close,
            high: close,
            low: close,
            close,
            adj_close: close,
            volume: 0.0,
        }
    }
}

//ordered bars for a single ticker, strictly increasing by date
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarSeries {
    ticker: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    //builds a series, rejecting duplicate or descending dates
    pub fn new(ticker: impl Into<String>, bars: Vec<Bar>) -> Result<Self, BarError> {
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(BarError::OutOfOrder {
                    previous: pair[0].date,
                    current: pair[1].date,
                });
            }
        }

        Ok(BarSeries {
            ticker: ticker.into(),
            bars,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    //relative lookback from a given position: 0 = current, negative = past
    pub fn lookback(&self, index: usize, offset: isize) -> Option<&Bar> {
        let target = index as isize + offset;
        if target < 0 || offset > 0 {
            return None;
        }
        self.bars.get(target as usize)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    //returns the bars whose dates fall inside [start, end]
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> BarSeries {
        let bars = self
            .bars
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect();

        BarSeries {
            ticker: self.ticker.clone(),
            bars,
        }
    }

    //first bar at or after the given date
    pub fn first_on_or_after(&self, date: NaiveDate) -> Option<&Bar> {
        self.bars.iter().find(|b| b.date >= date)
    }

    //last bar at or before the given date
    pub fn last_on_or_before(&self, date: NaiveDate) -> Option<&Bar> {
        self.bars.iter().rev().find(|b| b.date <= date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn rejects_high_below_low() {
        let err = Bar::new(day(1), 10.0, 9.0, 11.0, 10.0, 10.0, 100.0).unwrap_err();
        assert_eq!(err, BarError::InvalidHighLow { high: 9.0, low: 11.0 });
    }

    #[test]
    fn rejects_duplicate_dates() {
        let bars = vec![Bar::from_close(day(2), 1.0), Bar::from_close(day(2), 2.0)];
        assert!(matches!(
            BarSeries::new("AAPL", bars),
            Err(BarError::OutOfOrder { .. })
        ));
    }

    #[test]
    fn lookback_by_relative_offset() {
        let bars = (1..=5).map(|d| Bar::from_close(day(d), d as f64)).collect();
        let series = BarSeries::new("AAPL", bars).unwrap();

        assert_eq!(series.lookback(3, 0).unwrap().close, 4.0);
        assert_eq!(series.lookback(3, -2).unwrap().close, 2.0);
        assert!(series.lookback(1, -2).is_none());
        assert!(series.lookback(1, 1).is_none());
    }

    #[test]
    fn window_edges_snap_to_trading_days() {
        let bars = vec![
            Bar::from_close(day(2), 1.0),
            Bar::from_close(day(4), 2.0),
            Bar::from_close(day(8), 3.0),
        ];
        let series = BarSeries::new("AAPL", bars).unwrap();

        assert_eq!(series.first_on_or_after(day(3)).unwrap().close, 2.0);
        assert_eq!(series.last_on_or_before(day(7)).unwrap().close, 2.0);
        assert_eq!(series.slice(day(3), day(8)).len(), 2);
    }
}
