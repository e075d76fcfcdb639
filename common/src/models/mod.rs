mod coin;
mod price;

pub use coin::{CoinDetail, CoinImage, CoinSummary, MarketData, UsdAmount};
pub use price::{ChartPoint, ChartRange, PricePoint};
