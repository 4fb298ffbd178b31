use crate::engine::execution::Fill;
use crate::portfolio::position::Position;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

//a fill that closed or reduced the position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub date: NaiveDate,
    pub qty: u64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub gross_pnl: f64,
    //no commission model, so net equals gross
    pub net_pnl: f64,
}

//cash plus one position in one asset
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub initial_cash: f64,
    pub cash: f64,
    pub position: Position,

    //last close the position is marked at
    pub mark_price: f64,

    //complete trade log
    pub trade_log: Vec<Fill>,

    pub closed_trades: Vec<ClosedTrade>,
}

impl Portfolio {
    pub fn new(initial_cash: f64) -> Self {
        Portfolio {
            initial_cash,
            cash: initial_cash,
            position: Position::new(),
            mark_price: 0.0,
            trade_log: Vec::new(),
            closed_trades: Vec::new(),
        }
    }

    //moves cash and position by a fill, returns the closed trade if it reduced the position
    pub fn apply_fill(&mut self, fill: Fill) -> Option<ClosedTrade> {
        //buys spend cash, sells (including short sales) receive it
        self.cash -= fill.qty as f64 * fill.fill_price;

        let closed = self
            .position
            .update_with_fill(fill.qty, fill.fill_price)
            .map(|reduction| ClosedTrade {
                date: fill.date,
                qty: reduction.qty,
                entry_price: reduction.entry_price,
                exit_price: fill.fill_price,
                gross_pnl: reduction.pnl,
                net_pnl: reduction.pnl,
            });

        if let Some(trade) = &closed {
            self.closed_trades.push(trade.clone());
        }
        self.trade_log.push(fill);
        closed
    }

    pub fn mark(&mut self, price: f64) {
        self.mark_price = price;
    }

    //cash + position marked at the last close
    pub fn value(&self) -> f64 {
        self.cash + self.position.market_value(self.mark_price)
    }

    //returns the total return as a fraction
    pub fn total_return(&self) -> f64 {
        self.value() / self.initial_cash - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::execution::OrderSide;

    fn fill(qty: i64, price: f64) -> Fill {
        Fill {
            id: 1,
            order_id: 1,
            date: NaiveDate::from_ymd_opt(2023, 1, 3).unwrap(),
            qty,
            side: if qty > 0 { OrderSide::Buy } else { OrderSide::Sell },
            fill_price: price,
        }
    }

    #[test]
    fn round_trip_books_profit() {
        let mut portfolio = Portfolio::new(1_000.0);
        assert!(portfolio.apply_fill(fill(10, 50.0)).is_none());
        portfolio.mark(55.0);
        assert_eq!(portfolio.value(), 1_050.0);

        let trade = portfolio.apply_fill(fill(-10, 60.0)).unwrap();
        assert_eq!(trade.gross_pnl, 100.0);
        assert_eq!(trade.net_pnl, trade.gross_pnl);
        assert_eq!(portfolio.cash, 1_100.0);
        assert!((portfolio.total_return() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn short_value_moves_against_price() {
        let mut portfolio = Portfolio::new(1_000.0);
        portfolio.apply_fill(fill(-10, 100.0));
        portfolio.mark(110.0);
        assert_eq!(portfolio.cash, 2_000.0);
        assert_eq!(portfolio.value(), 900.0);
    }
}
