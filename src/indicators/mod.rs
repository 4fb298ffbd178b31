pub mod bollinger;
pub mod moving_average;

pub use bollinger::{bollinger_bands, Band, BandPair};
pub use moving_average::{rolling_std, sma};

//a value per bar, aligned 1:1 with the bar series
//none until the warm-up period is satisfied
pub type IndicatorSeries<T> = Vec<Option<T>>;

//number of leading bars with no defined value
pub fn warmup_bars(period: usize) -> usize {
    period.saturating_sub(1)
}
