//an event-study backtester for simple equity trading rules

pub mod config;
pub mod data;
pub mod engine;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod plot;
pub mod portfolio;
pub mod strategy;
pub mod study;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{RuleConfig, SignalMode, SizingPolicy, StudyConfig, SweepEntry};
    pub use crate::data::{
        load_catalog, load_csv, save_csv, Bar, BarSeries, CachingProvider, CsvDirectoryProvider,
        DataError, EventRecord, ExpectedSign, Interval, MarketDataProvider,
    };
    pub use crate::engine::{
        BacktestConfig, BacktestEngine, Fill, Order, OrderSide, OrderStatus, RunResult,
        SimulationError,
    };
    pub use crate::indicators::{bollinger_bands, sma, Band};
    pub use crate::metrics::{EquityPoint, RunSummary};
    pub use crate::plot::{CsvChartSink, NullPlotSink, PlotSink};
    pub use crate::portfolio::{Portfolio, Position};
    pub use crate::strategy::{Signals, Strategy};
    pub use crate::study::{EventStudy, ResultRow, ResultTable};
}
