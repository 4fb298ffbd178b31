use crate::portfolio::Portfolio;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

//order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    //converts to quantity sign (Buy = +1, Sell = -1)
    pub fn to_qty_sign(&self) -> i64 {
        match self {
            OrderSide::Buy => 1,
            OrderSide::Sell => -1,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => f.write_str("BUY"),
            OrderSide::Sell => f.write_str("SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Filled,
    Rejected,
    Canceled,
}

//a priced order, filled at exactly its price on the bar after it was created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub created: NaiveDate,
    pub side: OrderSide,
    pub price: f64,
    pub size: u64,
    pub status: OrderStatus,
}

impl Order {
    //returns the signed quantity (positive for buy, negative for sell)
    pub fn signed_qty(&self) -> i64 {
        self.size as i64 * self.side.to_qty_sign()
    }

    pub fn notional(&self) -> f64 {
        self.price * self.size as f64
    }
}

//represents a filled order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub id: u64,
    pub order_id: u64,
    pub date: NaiveDate,
    pub qty: i64, //signed: positive for buy, negative for sell
    pub side: OrderSide,
    pub fill_price: f64,
}

impl Fill {
    pub fn from_order(fill_id: u64, order: &Order, date: NaiveDate) -> Self {
        Fill {
            id: fill_id,
            order_id: order.id,
            date,
            qty: order.signed_qty(),
            side: order.side,
            fill_price: order.price,
        }
    }
}

//per-run broker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerState {
    Idle,
    OrderPending,
    //an order filled on the current bar; accepts new orders like idle
    Filled,
}

//simulated broker holding at most one outstanding order
#[derive(Debug, Clone)]
pub struct Broker {
    next_order_id: u64,
    next_fill_id: u64,
    pending: Option<Order>,
    state: BrokerState,
    allow_short: bool,
    history: Vec<Order>,
}

impl Broker {
    pub fn new(allow_short: bool) -> Self {
        Broker {
            next_order_id: 1,
            next_fill_id: 1,
            pending: None,
            state: BrokerState::Idle,
            allow_short,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> BrokerState {
        self.state
    }

    pub fn accepts_orders(&self) -> bool {
        self.pending.is_none()
    }

    pub fn outstanding(&self) -> usize {
        usize::from(self.pending.is_some())
    }

    //every order that reached a final status, in resolution order
    pub fn history(&self) -> &[Order] {
        &self.history
    }

    //called at the top of each bar
    pub fn begin_bar(&mut self) {
        if self.state == BrokerState::Filled {
            self.state = BrokerState::Idle;
        }
    }

    //places an order, refused (returns none) while another is outstanding
    pub fn submit(
        &mut self,
        created: NaiveDate,
        side: OrderSide,
        price: f64,
        size: u64,
    ) -> Option<u64> {
        if self.pending.is_some() || size == 0 {
            return None;
        }

        let id = self.next_order_id;
        self.next_order_id += 1;
        self.pending = Some(Order {
            id,
            created,
            side,
            price,
            size,
            status: OrderStatus::Pending,
        });
        self.state = BrokerState::OrderPending;
        Some(id)
    }

    //fills or rejects the outstanding order against the portfolio
    pub fn resolve(&mut self, date: NaiveDate, portfolio: &mut Portfolio) -> Option<Order> {
        let mut order = self.pending.take()?;

        if self.can_fill(&order, portfolio) {
            let fill = Fill::from_order(self.next_fill_id, &order, date);
            self.next_fill_id += 1;
            order.status = OrderStatus::Filled;
            self.state = BrokerState::Filled;

            debug!(
                %date,
                price = fill.fill_price,
                size = fill.qty.unsigned_abs(),
                "{} EXECUTED",
                order.side
            );

            if let Some(trade) = portfolio.apply_fill(fill) {
                debug!(
                    %date,
                    gross = trade.gross_pnl,
                    net = trade.net_pnl,
                    "OPERATION PROFIT"
                );
            }
        } else {
            order.status = OrderStatus::Rejected;
            self.state = BrokerState::Idle;
            debug!(%date, side = %order.side, size = order.size, "Order Canceled/Rejected");
        }

        self.history.push(order.clone());
        Some(order)
    }

    //drops the outstanding order, used when the series runs out
    pub fn cancel_pending(&mut self, date: NaiveDate) -> Option<Order> {
        let mut order = self.pending.take()?;
        order.status = OrderStatus::Canceled;
        self.state = BrokerState::Idle;
        debug!(%date, side = %order.side, size = order.size, "Order Canceled/Rejected");
        self.history.push(order.clone());
        Some(order)
    }

    fn can_fill(&self, order: &Order, portfolio: &Portfolio) -> bool {
        match order.side {
            //floor(cash / price) * price may overshoot cash by a rounding error
            OrderSide::Buy => order.notional() <= portfolio.cash * (1.0 + 1e-12) + 1e-9,
            OrderSide::Sell => {
                self.allow_short || order.size as i64 <= portfolio.position.size
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 4, d).unwrap()
    }

    #[test]
    fn second_order_is_refused_while_pending() {
        let mut broker = Broker::new(false);
        assert_eq!(broker.submit(day(3), OrderSide::Buy, 10.0, 5), Some(1));
        assert_eq!(broker.state(), BrokerState::OrderPending);
        assert_eq!(broker.submit(day(3), OrderSide::Buy, 10.0, 5), None);
        assert_eq!(broker.outstanding(), 1);
    }

    #[test]
    fn zero_size_is_a_noop() {
        let mut broker = Broker::new(false);
        assert_eq!(broker.submit(day(3), OrderSide::Buy, 10.0, 0), None);
        assert_eq!(broker.state(), BrokerState::Idle);
    }

    #[test]
    fn fills_at_order_price() {
        let mut broker = Broker::new(false);
        let mut portfolio = Portfolio::new(1_000.0);
        broker.submit(day(3), OrderSide::Buy, 10.0, 50);

        let order = broker.resolve(day(4), &mut portfolio).unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(broker.state(), BrokerState::Filled);
        assert_eq!(portfolio.cash, 500.0);
        assert_eq!(portfolio.position.size, 50);
        assert_eq!(portfolio.trade_log[0].date, day(4));

        broker.begin_bar();
        assert_eq!(broker.state(), BrokerState::Idle);
    }

    #[test]
    fn rejects_buy_beyond_cash() {
        let mut broker = Broker::new(false);
        let mut portfolio = Portfolio::new(100.0);
        broker.submit(day(3), OrderSide::Buy, 10.0, 11);

        let order = broker.resolve(day(4), &mut portfolio).unwrap();
        assert_eq!(order.status, OrderStatus::Rejected);
        assert_eq!(portfolio.cash, 100.0);
        assert!(broker.accepts_orders());
    }

    #[test]
    fn rejects_naked_sell_unless_shorting() {
        let mut portfolio = Portfolio::new(100.0);

        let mut long_only = Broker::new(false);
        long_only.submit(day(3), OrderSide::Sell, 10.0, 1);
        let order = long_only.resolve(day(4), &mut portfolio).unwrap();
        assert_eq!(order.status, OrderStatus::Rejected);

        let mut shorting = Broker::new(true);
        shorting.submit(day(3), OrderSide::Sell, 10.0, 1);
        let order = shorting.resolve(day(4), &mut portfolio).unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(portfolio.position.size, -1);
        assert_eq!(portfolio.cash, 110.0);
    }

    #[test]
    fn cancel_records_history() {
        let mut broker = Broker::new(false);
        broker.submit(day(3), OrderSide::Buy, 10.0, 1);
        let order = broker.cancel_pending(day(3)).unwrap();
        assert_eq!(order.status, OrderStatus::Canceled);
        assert_eq!(broker.history().len(), 1);
        assert!(broker.cancel_pending(day(3)).is_none());
    }
}
