use serde::{Deserialize, Serialize};

//portion of a position closed by a fill
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reduction {
    pub qty: u64,
    pub entry_price: f64,
    pub pnl: f64,
}

//single-asset position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    //net quantity (positive for long, negative for short, 0 for flat)
    pub size: i64,

    //average entry price
    pub avg_cost: f64,

    //realized pnl from closed trades
    pub realized_pnl: f64,
}

impl Position {
    pub fn new() -> Self {
        Position::default()
    }

    //calculates unrealized pnl at a given price
    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        if self.size == 0 {
            return 0.0;
        }
        (current_price - self.avg_cost) * self.size as f64
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.size as f64 * price
    }

    pub fn is_flat(&self) -> bool {
        self.size == 0
    }

    pub fn is_short(&self) -> bool {
        self.size < 0
    }

    //updates position with a new fill
    //returns the closed portion when the fill reduces or reverses the position
    pub fn update_with_fill(&mut self, fill_qty: i64, fill_price: f64) -> Option<Reduction> {
        if fill_qty == 0 {
            return None;
        }

        //if position is flat, just establish new position
        if self.size == 0 {
            self.size = fill_qty;
            self.avg_cost = fill_price;
            return None;
        }

        let same_direction = (self.size > 0) == (fill_qty > 0);

        if same_direction {
            //adding to position - update average entry price
            let total_qty = self.size + fill_qty;
            let total_cost = self.avg_cost * self.size as f64 + fill_price * fill_qty as f64;
            self.avg_cost = total_cost / total_qty as f64;
            self.size = total_qty;
            return None;
        }

        //reducing or reversing position
        let close_qty = fill_qty.unsigned_abs().min(self.size.unsigned_abs());
        let price_diff = if self.size > 0 {
            fill_price - self.avg_cost
        } else {
            self.avg_cost - fill_price
        };
        let reduction = Reduction {
            qty: close_qty,
            entry_price: self.avg_cost,
            pnl: price_diff * close_qty as f64,
        };
        self.realized_pnl += reduction.pnl;

        let previous = self.size;
        self.size += fill_qty;

        if self.size == 0 {
            self.avg_cost = 0.0;
        } else if (self.size > 0) != (previous > 0) {
            //reversed through flat, remainder opens at the fill price
            self.avg_cost = fill_price;
        }

        Some(reduction)
    }
}
