pub mod backtest;
pub mod execution;
pub mod sizing;

pub use backtest::{BacktestConfig, BacktestEngine, RunResult, SimulationError};
pub use execution::{Broker, BrokerState, Fill, Order, OrderSide, OrderStatus};
pub use sizing::Sizer;
