pub mod account;
pub mod position;

pub use account::{ClosedTrade, Portfolio};
pub use position::Position;
