use crate::config::RuleConfig;
use crate::data::BarSeries;
use crate::engine::execution::{Broker, Fill, Order, OrderSide};
use crate::engine::sizing::Sizer;
use crate::metrics::{calculate_equity_curve, EquityPoint, RunSummary};
use crate::portfolio::{ClosedTrade, Portfolio};
use crate::strategy::Strategy;
use chrono::NaiveDate;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    #[error("no bars to simulate for {0}")]
    EmptySeries(String),
    #[error("invalid price {price} on {date}")]
    InvalidPrice { date: NaiveDate, price: f64 },
    #[error("initial cash must be positive, got {0}")]
    InvalidCash(f64),
}

//configuration for a single run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestConfig {
    pub initial_cash: f64,
    pub order_ratio: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_cash: 10_000_000.0,
            order_ratio: 0.10,
        }
    }
}

//result of a run
#[derive(Debug, Clone)]
pub struct RunResult {
    pub terminal_value: f64,
    pub total_return: f64,
    pub summary: RunSummary,
    pub equity_curve: Vec<EquityPoint>,
    pub fills: Vec<Fill>,
    pub closed_trades: Vec<ClosedTrade>,
    pub orders: Vec<Order>,
    //orders outstanding at the end of each bar
    pub outstanding: Vec<usize>,
}

impl RunResult {
    pub fn max_outstanding(&self) -> usize {
        self.outstanding.iter().copied().max().unwrap_or(0)
    }
}

//runs one rule bar by bar over one series
pub struct BacktestEngine<'a> {
    config: BacktestConfig,
    series: &'a BarSeries,
    strategy: Strategy,
    broker: Broker,
    portfolio: Portfolio,
    sizer: Sizer,
}

impl<'a> BacktestEngine<'a> {
    pub fn new(config: BacktestConfig, series: &'a BarSeries, rule: RuleConfig) -> Self {
        let broker = Broker::new(rule.permits_short());
        let strategy = Strategy::new(rule, series);

        BacktestEngine {
            config,
            series,
            strategy,
            broker,
            portfolio: Portfolio::new(config.initial_cash),
            sizer: Sizer::new(config.order_ratio),
        }
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn run(&mut self) -> Result<RunResult, SimulationError> {
        if !(self.config.initial_cash > 0.0) {
            return Err(SimulationError::InvalidCash(self.config.initial_cash));
        }
        let last_bar = self
            .series
            .last()
            .ok_or_else(|| SimulationError::EmptySeries(self.series.ticker().to_string()))?;

        let bars = self.series.bars();
        let mut dates = Vec::with_capacity(bars.len());
        let mut values = Vec::with_capacity(bars.len());
        let mut outstanding = Vec::with_capacity(bars.len());

        for (i, bar) in bars.iter().enumerate() {
            if !bar.close.is_finite() {
                return Err(SimulationError::InvalidPrice {
                    date: bar.date,
                    price: bar.close,
                });
            }

            self.broker.begin_bar();

            //orders placed on the previous bar resolve before this bar is evaluated
            self.broker.resolve(bar.date, &mut self.portfolio);

            self.portfolio.mark(bar.close);

            if self.broker.accepts_orders() {
                self.decide(i, bar.date);
            }

            dates.push(bar.date);
            values.push(self.portfolio.value());
            outstanding.push(self.broker.outstanding());
        }

        //an order placed on the final bar never reaches a fill
        self.broker.cancel_pending(last_bar.date);

        self.portfolio.mark(last_bar.close);
        let terminal_value = self.portfolio.value();
        let total_return = terminal_value / self.config.initial_cash - 1.0;

        let equity_curve = calculate_equity_curve(&dates, &values, self.config.initial_cash);
        let orders = self.broker.history().to_vec();
        let summary = RunSummary::from_run(
            &equity_curve,
            &self.portfolio.trade_log,
            &self.portfolio.closed_trades,
            &orders,
            self.config.initial_cash,
            terminal_value,
        );

        Ok(RunResult {
            terminal_value,
            total_return,
            summary,
            equity_curve,
            fills: self.portfolio.trade_log.clone(),
            closed_trades: self.portfolio.closed_trades.clone(),
            orders,
            outstanding,
        })
    }

    //signal -> size -> order, only called while no order is outstanding
    fn decide(&mut self, index: usize, date: NaiveDate) {
        let Some(side) = self.strategy.signals(index).decision() else {
            return;
        };
        let Some(price) = self.strategy.reference_price(side, index) else {
            return;
        };

        let size = self.sizer.size(
            self.strategy.sizing_basis(),
            side,
            price,
            self.portfolio.cash,
            self.portfolio.value(),
            self.portfolio.position.size,
        );

        match side {
            OrderSide::Buy => debug!(%date, price, size, "BUY CREATE"),
            OrderSide::Sell => debug!(%date, price, size, "SELL CREATE"),
        }

        self.broker.submit(date, side, price, size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalMode;
    use crate::data::Bar;
    use crate::engine::execution::OrderStatus;

    fn series(closes: &[f64]) -> BarSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, c)| Bar::from_close(start + chrono::Duration::days(i as i64), *c))
            .collect();
        BarSeries::new("TEST", bars).unwrap()
    }

    fn s_dates(closes: &[f64]) -> Vec<NaiveDate> {
        series(closes).bars().iter().map(|b| b.date).collect()
    }

    fn run(closes: &[f64], rule: RuleConfig) -> RunResult {
        let s = series(closes);
        BacktestEngine::new(BacktestConfig::default(), &s, rule)
            .run()
            .unwrap()
    }

    #[test]
    fn hodl_long_captures_the_move() {
        let closes: Vec<f64> = (0..=50).map(|i| 100.0 + i as f64).collect();
        let result = run(&closes, RuleConfig::BuyAndHoldLong);

        assert!((result.total_return - 0.5).abs() < 1e-9);
        assert_eq!(result.fills.len(), 1);
        assert_eq!(result.fills[0].fill_price, 100.0);
    }

    #[test]
    fn hodl_short_loses_on_rally() {
        let closes: Vec<f64> = (0..=50).map(|i| 100.0 + i as f64).collect();
        let result = run(&closes, RuleConfig::BuyAndHoldShort);

        assert!((result.total_return + 0.5).abs() < 1e-9);
        assert_eq!(result.fills[0].qty, -100_000);
    }

    #[test]
    fn short_series_never_trades() {
        let result = run(&[10.0, 12.0, 8.0], RuleConfig::bollinger(20, 0.5));
        assert!(result.fills.is_empty());
        assert!(result.orders.is_empty());
        assert_eq!(result.terminal_value, BacktestConfig::default().initial_cash);
    }

    #[test]
    fn sma_buys_then_sells() {
        let closes = [10.0, 10.0, 10.0, 5.0, 5.0, 5.0, 15.0, 15.0, 15.0];
        let result = run(&closes, RuleConfig::sma(3, SignalMode::Level));

        //level mode keeps buying while under the average and selling while over it
        let sides: Vec<OrderSide> = result.fills.iter().map(|f| f.side).collect();
        assert_eq!(
            sides,
            vec![OrderSide::Buy, OrderSide::Buy, OrderSide::Sell, OrderSide::Sell]
        );

        //first buy is created at index 3 at the sma (25/3), filled on index 4
        let dates: Vec<NaiveDate> = s_dates(&closes);
        assert_eq!(result.orders[0].created, dates[3]);
        assert_eq!(result.fills[0].date, dates[4]);
        assert!((result.fills[0].fill_price - 25.0 / 3.0).abs() < 1e-12);

        //the rebound at index 6 is a sell
        assert_eq!(result.orders[2].created, dates[6]);
        assert_eq!(result.orders[2].side, OrderSide::Sell);

        assert_eq!(result.closed_trades.len(), 2);
        assert!(result.closed_trades[0].gross_pnl > 0.0);
    }

    #[test]
    fn order_on_last_bar_is_canceled() {
        let result = run(&[100.0], RuleConfig::BuyAndHoldLong);
        assert!(result.fills.is_empty());
        assert_eq!(result.orders.len(), 1);
        assert_eq!(result.orders[0].status, OrderStatus::Canceled);
        assert_eq!(result.total_return, 0.0);
    }

    #[test]
    fn never_more_than_one_order() {
        let closes: Vec<f64> = (0..200)
            .map(|i| 100.0 + 10.0 * ((i as f64) * 0.37).sin() + (i % 7) as f64)
            .collect();
        for rule in [
            RuleConfig::bollinger(10, 0.5),
            RuleConfig::inverse_bollinger(10, 0.5),
            RuleConfig::sma(5, SignalMode::Level),
            RuleConfig::sma(5, SignalMode::Cross),
        ] {
            let result = run(&closes, rule);
            assert!(result.max_outstanding() <= 1);
            assert!(!result.fills.is_empty());
        }
    }

    #[test]
    fn flat_run_off_the_band_places_no_order() {
        let result = run(
            &[10.0, 10.0, 10.0, 10.0, 11.0, 11.0],
            RuleConfig::inverse_bollinger(3, 0.5),
        );
        assert!(result.orders.is_empty());

        let result = run(
            &[12.0, 12.0, 12.0, 12.0, 11.0, 11.0],
            RuleConfig::sma(3, SignalMode::Cross),
        );
        assert!(result.orders.is_empty());
    }

    #[test]
    fn empty_series_is_an_error() {
        let s = BarSeries::new("NONE", vec![]).unwrap();
        let err = BacktestEngine::new(BacktestConfig::default(), &s, RuleConfig::BuyAndHoldLong)
            .run()
            .unwrap_err();
        assert_eq!(err, SimulationError::EmptySeries("NONE".to_string()));
    }
}
