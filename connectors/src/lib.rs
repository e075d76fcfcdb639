pub mod coingecko;
mod config;

use async_trait::async_trait;
use common::{
    models::{ChartRange, CoinDetail, CoinSummary, PricePoint},
    Result,
};

pub use coingecko::CoinGeckoConnector;
pub use config::CoinGeckoConfig;

/// Number of rows per market page
pub const PAGE_SIZE: u32 = 50;

/// Trait defining the read-only market data calls the dashboard needs
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Get one page of the market list, ordered by market cap descending
    async fn fetch_markets(&self, page: u32) -> Result<Vec<CoinSummary>>;

    /// Get the full record for a coin
    async fn fetch_coin(&self, id: &str) -> Result<CoinDetail>;

    /// Get the historical USD price series over the trailing range
    async fn fetch_chart(&self, id: &str, range: ChartRange) -> Result<Vec<PricePoint>>;
}
