use crate::strategy::{SignalInput, Signals};

//single buy on the first eligible bar, never again
pub fn long_signals(input: &SignalInput) -> Signals {
    Signals {
        buy: input.first_eligible,
        sell: false,
    }
}

//single sell on the first eligible bar, opening a short
pub fn short_signals(input: &SignalInput) -> Signals {
    Signals {
        buy: false,
        sell: input.first_eligible,
    }
}
