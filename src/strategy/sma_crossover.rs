use crate::config::SignalMode;
use crate::strategy::{crossed_above, crossed_below, SignalInput, Signals};

//close against its simple moving average
//level: buy while below, sell while above
//cross: buy on the bar close falls through the average, sell on the bar it climbs through
pub fn signals(mode: SignalMode, input: &SignalInput) -> Signals {
    let Some(average) = input.band.map(|b| b.mid) else {
        return Signals::NONE;
    };

    match mode {
        SignalMode::Level => Signals {
            buy: input.close < average,
            sell: input.close > average,
        },
        SignalMode::Cross => {
            let Some(prev) = input.prev_sides.map(|s| s.mid) else {
                return Signals::NONE;
            };
            Signals {
                buy: crossed_below(prev, input.close, average),
                sell: crossed_above(prev, input.close, average),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::Band;
    use crate::strategy::BandSides;

    #[test]
    fn cross_mode_only_on_transition() {
        let mut input = SignalInput {
            close: 9.0,
            band: Some(Band::flat(10.0)),
            prev_sides: Some(BandSides::of(11.0, &Band::flat(10.0))),
            first_eligible: false,
        };
        assert!(signals(SignalMode::Cross, &input).buy);

        input.prev_sides = Some(BandSides::of(9.5, &Band::flat(10.0)));
        assert_eq!(signals(SignalMode::Cross, &input), Signals::NONE);
        assert!(signals(SignalMode::Level, &input).buy);
    }

    #[test]
    fn undefined_average_is_silent() {
        let input = SignalInput {
            close: 9.0,
            band: None,
            prev_sides: None,
            first_eligible: true,
        };
        assert_eq!(signals(SignalMode::Level, &input), Signals::NONE);
    }
}
