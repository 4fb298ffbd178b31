use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

//a point in the equity curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
    pub drawdown: f64,
    pub returns: f64,
}

impl EquityPoint {
    pub fn new(date: NaiveDate, equity: f64, drawdown: f64, returns: f64) -> Self {
        EquityPoint {
            date,
            equity,
            drawdown,
            returns,
        }
    }
}

//calculates the equity curve with drawdowns
pub fn calculate_equity_curve(
    dates: &[NaiveDate],
    equity_values: &[f64],
    initial_balance: f64,
) -> Vec<EquityPoint> {
    let mut curve = Vec::with_capacity(dates.len());
    let mut peak = initial_balance;
    let mut prev_equity = initial_balance;

    for (&date, &equity) in dates.iter().zip(equity_values.iter()) {
        if equity > peak {
            peak = equity;
        }

        let drawdown = if peak > 0.0 {
            (peak - equity) / peak
        } else {
            0.0
        };

        //first bar is measured against the starting balance
        let returns = if prev_equity != 0.0 {
            (equity - prev_equity) / prev_equity
        } else {
            0.0
        };

        curve.push(EquityPoint::new(date, equity, drawdown, returns));
        prev_equity = equity;
    }

    curve
}

//calculates maximum drawdown from equity curve
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    equity_curve
        .iter()
        .map(|point| point.drawdown)
        .fold(0.0, f64::max)
}

//calculates returns from equity values
pub fn calculate_returns(equity_values: &[f64]) -> Vec<f64> {
    equity_values
        .windows(2)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .collect()
}
