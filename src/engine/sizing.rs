use crate::engine::execution::OrderSide;
use crate::strategy::SizingBasis;

//whole shares affordable for an amount at a price, zero for unusable prices
fn whole_shares(amount: f64, price: f64) -> u64 {
    if !(price > 0.0) || !price.is_finite() || !(amount > 0.0) {
        return 0;
    }
    (amount / price).floor() as u64
}

//turns a signal into an integer order size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sizer {
    order_ratio: f64,
}

impl Sizer {
    pub fn new(order_ratio: f64) -> Self {
        Sizer { order_ratio }
    }

    //buy: min(cash / price, value * ratio / price)
    pub fn buy_size(&self, price: f64, cash: f64, value: f64) -> u64 {
        whole_shares(cash, price).min(whole_shares(value * self.order_ratio, price))
    }

    //sell: min(held shares, value * ratio / price), never more than is held
    pub fn sell_size(&self, price: f64, value: f64, position_size: i64) -> u64 {
        let held = position_size.max(0) as u64;
        held.min(whole_shares(value * self.order_ratio, price))
    }

    pub fn size(
        &self,
        basis: SizingBasis,
        side: OrderSide,
        price: f64,
        cash: f64,
        value: f64,
        position_size: i64,
    ) -> u64 {
        match (basis, side) {
            (SizingBasis::Ratio, OrderSide::Buy) => self.buy_size(price, cash, value),
            (SizingBasis::Ratio, OrderSide::Sell) => self.sell_size(price, value, position_size),
            (SizingBasis::AllCash, _) => whole_shares(cash, price),
            (SizingBasis::AllValue, _) => whole_shares(value, price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn buy_is_capped_by_ratio() {
        let sizer = Sizer::new(0.10);
        //ratio allows 100 shares, cash allows 1000
        assert_eq!(sizer.buy_size(10.0, 10_000.0, 10_000.0), 100);
        //cash is the tighter bound
        assert_eq!(sizer.buy_size(10.0, 50.0, 10_000.0), 5);
    }

    #[test]
    fn sell_never_exceeds_holding() {
        let sizer = Sizer::new(0.5);
        assert_eq!(sizer.sell_size(10.0, 10_000.0, 30), 30);
        assert_eq!(sizer.sell_size(10.0, 10_000.0, 0), 0);
        assert_eq!(sizer.sell_size(10.0, 10_000.0, -20), 0);
    }

    #[test]
    fn bad_price_sizes_to_zero() {
        let sizer = Sizer::new(1.0);
        assert_eq!(sizer.buy_size(0.0, 100.0, 100.0), 0);
        assert_eq!(sizer.buy_size(f64::NAN, 100.0, 100.0), 0);
        assert_eq!(sizer.buy_size(-1.0, 100.0, 100.0), 0);
    }

    #[test]
    fn all_in_bases() {
        let sizer = Sizer::new(0.1);
        assert_eq!(
            sizer.size(SizingBasis::AllCash, OrderSide::Buy, 100.0, 10_050.0, 20_000.0, 0),
            100
        );
        assert_eq!(
            sizer.size(SizingBasis::AllValue, OrderSide::Sell, 100.0, 0.0, 20_000.0, 0),
            200
        );
    }

    proptest! {
        #[test]
        fn buy_size_respects_both_bounds(
            cash in 1.0..1e8_f64,
            value in 1.0..1e8_f64,
            ratio in 0.001..1.0_f64,
            price in 0.01..5_000.0_f64,
        ) {
            let size = Sizer::new(ratio).buy_size(price, cash, value);
            prop_assert!(size <= (cash / price).floor() as u64);
            prop_assert!(size <= (value * ratio / price).floor() as u64);
            prop_assert!(size as f64 * price <= cash + 1e-6);
        }

        #[test]
        fn sell_size_within_position(
            value in 1.0..1e8_f64,
            ratio in 0.001..1.0_f64,
            price in 0.01..5_000.0_f64,
            held in -1_000i64..100_000,
        ) {
            let size = Sizer::new(ratio).sell_size(price, value, held);
            prop_assert!(size as i64 <= held.max(0));
        }
    }
}
