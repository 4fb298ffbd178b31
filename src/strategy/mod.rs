pub mod bollinger;
pub mod buy_and_hold;
pub mod sma_crossover;

use crate::config::{RuleConfig, SignalMode};
use crate::data::BarSeries;
use crate::engine::execution::OrderSide;
use crate::indicators::{sma, warmup_bars, Band, BandPair, IndicatorSeries};

//buy/sell flags for one bar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    pub buy: bool,
    pub sell: bool,
}

impl Signals {
    pub const NONE: Signals = Signals {
        buy: false,
        sell: false,
    };

    //buy wins when both fire
    pub fn decision(&self) -> Option<OrderSide> {
        if self.buy {
            Some(OrderSide::Buy)
        } else if self.sell {
            Some(OrderSide::Sell)
        } else {
            None
        }
    }
}

//what a rule sees at bar i: the close and indicator reading, plus where the close last sat
//relative to each line up to bar i-1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalInput {
    pub close: f64,
    pub band: Option<Band>,
    pub prev_sides: Option<BandSides>,
    //first bar on which the rule may act
    pub first_eligible: bool,
}

//position of a close relative to one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Below,
    On,
    Above,
}

impl Side {
    pub fn of(close: f64, level: f64) -> Self {
        if close > level {
            Side::Above
        } else if close < level {
            Side::Below
        } else {
            Side::On
        }
    }

    //a close sitting on the line keeps the side it was last strictly on
    pub fn or(self, prev: Side) -> Side {
        match self {
            Side::On => prev,
            side => side,
        }
    }
}

//sides of the close against the lower, middle and upper lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandSides {
    pub lower: Side,
    pub mid: Side,
    pub upper: Side,
}

impl BandSides {
    pub fn of(close: f64, band: &Band) -> Self {
        BandSides {
            lower: Side::of(close, band.lower),
            mid: Side::of(close, band.mid),
            upper: Side::of(close, band.upper),
        }
    }

    pub fn or(self, prev: BandSides) -> Self {
        BandSides {
            lower: self.lower.or(prev.lower),
            mid: self.mid.or(prev.mid),
            upper: self.upper.or(prev.upper),
        }
    }
}

//carried sides per bar, none where the band is undefined
pub fn carried_sides(closes: &[f64], levels: &IndicatorSeries<Band>) -> Vec<Option<BandSides>> {
    let mut carried: Option<BandSides> = None;
    closes
        .iter()
        .zip(levels)
        .map(|(close, band)| {
            carried = band.map(|b| {
                let now = BandSides::of(*close, &b);
                match carried {
                    Some(prev) => now.or(prev),
                    None => now,
                }
            });
            carried
        })
        .collect()
}

//how an order's size is bounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingBasis {
    //min of cash and order_ratio of value (sells: of the held position)
    Ratio,
    //everything the cash buys
    AllCash,
    //total portfolio value, used to open a short
    AllValue,
}

//close was last strictly below the line and is now strictly above it
pub fn crossed_above(prev: Side, close: f64, level: f64) -> bool {
    prev == Side::Below && close > level
}

//close was last strictly above the line and is now strictly below it
pub fn crossed_below(prev: Side, close: f64, level: f64) -> bool {
    prev == Side::Above && close < level
}

//evaluates a rule at one bar, no state beyond the input is consulted
pub fn evaluate(rule: &RuleConfig, input: &SignalInput) -> Signals {
    match rule {
        RuleConfig::Bollinger { mode, .. } => bollinger::reversion_signals(*mode, input),
        RuleConfig::InverseBollinger { mode, .. } => bollinger::breakout_signals(*mode, input),
        RuleConfig::SmaCrossover { mode, .. } => sma_crossover::signals(*mode, input),
        RuleConfig::BuyAndHoldLong => buy_and_hold::long_signals(input),
        RuleConfig::BuyAndHoldShort => buy_and_hold::short_signals(input),
    }
}

//a rule bound to the indicator state of one bar series
#[derive(Debug, Clone)]
pub struct Strategy {
    rule: RuleConfig,
    closes: Vec<f64>,
    levels: IndicatorSeries<Band>,
    sides: Vec<Option<BandSides>>,
    display: Option<BandPair>,
}

impl Strategy {
    pub fn new(rule: RuleConfig, series: &BarSeries) -> Self {
        let closes = series.closes();

        let (levels, display) = match &rule {
            RuleConfig::Bollinger {
                period,
                inner_devfactor,
                outer_devfactor,
                ..
            }
            | RuleConfig::InverseBollinger {
                period,
                inner_devfactor,
                outer_devfactor,
                ..
            } => {
                let pair = BandPair::new(&closes, *period, *inner_devfactor, *outer_devfactor);
                (pair.inner.clone(), Some(pair))
            }
            RuleConfig::SmaCrossover { period, .. } => {
                let levels = sma(&closes, *period)
                    .into_iter()
                    .map(|v| v.map(Band::flat))
                    .collect();
                (levels, None)
            }
            RuleConfig::BuyAndHoldLong | RuleConfig::BuyAndHoldShort => {
                (vec![None; closes.len()], None)
            }
        };

        let sides = carried_sides(&closes, &levels);

        Strategy {
            rule,
            closes,
            levels,
            sides,
            display,
        }
    }

    //index of the first bar with enough history to act on
    pub fn first_eligible(&self) -> usize {
        let period = self.rule.period();
        match (&self.rule, self.rule.mode()) {
            (RuleConfig::BuyAndHoldLong | RuleConfig::BuyAndHoldShort, _) => 0,
            (_, SignalMode::Level) => warmup_bars(period),
            (_, SignalMode::Cross) => period,
        }
    }

    fn input(&self, index: usize) -> SignalInput {
        let prev = index.checked_sub(1);
        SignalInput {
            close: self.closes[index],
            band: self.levels.get(index).copied().flatten(),
            prev_sides: prev.and_then(|p| self.sides.get(p).copied().flatten()),
            first_eligible: index == self.first_eligible(),
        }
    }

    pub fn signals(&self, index: usize) -> Signals {
        if index >= self.closes.len() {
            return Signals::NONE;
        }
        evaluate(&self.rule, &self.input(index))
    }

    //price the order is placed at: the triggering band line, the sma, or the close
    pub fn reference_price(&self, side: OrderSide, index: usize) -> Option<f64> {
        let close = *self.closes.get(index)?;
        let band = self.levels.get(index).copied().flatten();

        match (&self.rule, side) {
            (RuleConfig::Bollinger { .. }, OrderSide::Buy) => band.map(|b| b.lower),
            (RuleConfig::Bollinger { .. }, OrderSide::Sell) => band.map(|b| b.upper),
            (RuleConfig::InverseBollinger { .. }, OrderSide::Buy) => band.map(|b| b.upper),
            (RuleConfig::InverseBollinger { .. }, OrderSide::Sell) => band.map(|b| b.lower),
            (RuleConfig::SmaCrossover { .. }, _) => band.map(|b| b.mid),
            (RuleConfig::BuyAndHoldLong | RuleConfig::BuyAndHoldShort, _) => Some(close),
        }
    }

    pub fn sizing_basis(&self) -> SizingBasis {
        match self.rule {
            RuleConfig::BuyAndHoldLong => SizingBasis::AllCash,
            RuleConfig::BuyAndHoldShort => SizingBasis::AllValue,
            _ => SizingBasis::Ratio,
        }
    }

    //inner and outer bands for charts, bollinger rules only
    pub fn display_bands(&self) -> Option<&BandPair> {
        self.display.as_ref()
    }

    //level lines the rule trades against, aligned to the series
    pub fn levels(&self) -> &IndicatorSeries<Band> {
        &self.levels
    }
}
