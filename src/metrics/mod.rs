pub mod summary;
pub mod timeseries;

pub use summary::RunSummary;
pub use timeseries::{calculate_equity_curve, EquityPoint};
