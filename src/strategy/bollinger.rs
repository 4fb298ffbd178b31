use crate::config::SignalMode;
use crate::strategy::{crossed_above, crossed_below, SignalInput, Signals};

//mean reversion: buy when close drops under the lower band, sell when it rises over the upper
pub fn reversion_signals(mode: SignalMode, input: &SignalInput) -> Signals {
    let Some(band) = input.band else {
        return Signals::NONE;
    };

    match mode {
        SignalMode::Level => Signals {
            buy: input.close < band.lower,
            sell: input.close > band.upper,
        },
        SignalMode::Cross => {
            let Some(prev) = input.prev_sides else {
                return Signals::NONE;
            };
            Signals {
                buy: crossed_below(prev.lower, input.close, band.lower),
                sell: crossed_above(prev.upper, input.close, band.upper),
            }
        }
    }
}

//inverse: ride the breakout, buying over the upper band and selling under the lower
pub fn breakout_signals(mode: SignalMode, input: &SignalInput) -> Signals {
    let Some(band) = input.band else {
        return Signals::NONE;
    };

    match mode {
        SignalMode::Level => Signals {
            buy: input.close > band.upper,
            sell: input.close < band.lower,
        },
        SignalMode::Cross => {
            let Some(prev) = input.prev_sides else {
                return Signals::NONE;
            };
            Signals {
                buy: crossed_above(prev.upper, input.close, band.upper),
                sell: crossed_below(prev.lower, input.close, band.lower),
            }
        }
    }
}
