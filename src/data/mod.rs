pub mod bar;
pub mod catalog;
pub mod loader;
pub mod provider;

pub use bar::{Bar, BarError, BarSeries};
pub use catalog::{load_catalog, CatalogError, EventRecord, ExpectedSign};
pub use loader::{load_csv, save_csv};
pub use provider::{
    window_file_name, CachingProvider, CsvDirectoryProvider, DataError, Interval,
    MarketDataProvider,
};
