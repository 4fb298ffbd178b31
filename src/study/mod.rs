pub mod driver;
pub mod results;
pub mod window;

pub use driver::EventStudy;
pub use results::{ResultRow, ResultTable};
pub use window::{baseline_returns, Baseline, EventWindow};
