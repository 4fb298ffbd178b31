use crate::engine::execution::{Fill, Order, OrderStatus};
use crate::metrics::timeseries::{calculate_returns, max_drawdown, EquityPoint};
use crate::portfolio::ClosedTrade;
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

//summary metrics for a single rule run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub initial_value: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub num_fills: usize,
    pub num_rejected: usize,
    pub num_closed_trades: usize,
    pub win_rate: f64,
    pub gross_pnl: f64,
    pub net_pnl: f64,
}

impl RunSummary {
    pub fn from_run(
        equity_curve: &[EquityPoint],
        fills: &[Fill],
        closed_trades: &[ClosedTrade],
        orders: &[Order],
        initial_value: f64,
        final_value: f64,
    ) -> Self {
        let equity_values: Vec<f64> = equity_curve.iter().map(|p| p.equity).collect();
        let returns = calculate_returns(&equity_values);

        let winners = closed_trades.iter().filter(|t| t.net_pnl > 0.0).count();
        let win_rate = if closed_trades.is_empty() {
            0.0
        } else {
            winners as f64 / closed_trades.len() as f64
        };

        RunSummary {
            initial_value,
            final_value,
            total_return: final_value / initial_value - 1.0,
            max_drawdown: max_drawdown(equity_curve),
            sharpe_ratio: calculate_sharpe_ratio(&returns),
            num_fills: fills.len(),
            num_rejected: orders
                .iter()
                .filter(|o| o.status == OrderStatus::Rejected)
                .count(),
            num_closed_trades: closed_trades.len(),
            win_rate,
            gross_pnl: closed_trades.iter().map(|t| t.gross_pnl).sum(),
            net_pnl: closed_trades.iter().map(|t| t.net_pnl).sum(),
        }
    }

    //prints metrics in a formatted table
    pub fn pretty_print_table(&self) {
        let mut table = Table::new();

        let rows = [
            ("Initial Value", format!("${:.2}", self.initial_value)),
            ("Final Value", format!("${:.2}", self.final_value)),
            ("Total Return", format!("{:.2}%", self.total_return * 100.0)),
            ("Max Drawdown", format!("{:.2}%", self.max_drawdown * 100.0)),
            ("Sharpe Ratio", format!("{:.3}", self.sharpe_ratio)),
            ("Fills", self.num_fills.to_string()),
            ("Rejected Orders", self.num_rejected.to_string()),
            ("Closed Trades", self.num_closed_trades.to_string()),
            ("Win Rate", format!("{:.2}%", self.win_rate * 100.0)),
            ("Gross P&L", format!("${:.2}", self.gross_pnl)),
            ("Net P&L", format!("${:.2}", self.net_pnl)),
        ];

        table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));
        for (label, value) in rows {
            table.add_row(Row::new(vec![Cell::new(label), Cell::new(&value)]));
        }

        table.printstd();
    }
}

fn calculate_sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.mean();
    let std_dev = returns.std_dev();

    if std_dev == 0.0 || !std_dev.is_finite() {
        return 0.0;
    }

    //annualize assuming daily returns
    (mean / std_dev) * (252.0_f64).sqrt()
}
