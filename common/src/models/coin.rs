use serde::{Deserialize, Deserializer, Serialize};

/// One row of the market list, as returned by `/coins/markets`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoinSummary {
    /// Unique identifier for the coin (e.g., "bitcoin", "ethereum")
    pub id: String,
    /// Human-readable name (e.g., "Bitcoin", "Ethereum")
    pub name: String,
    /// Ticker symbol, lower case upstream (e.g., "btc", "eth")
    pub symbol: String,
    /// Logo URL
    #[serde(default)]
    pub image: String,
    /// Price in USD
    #[serde(default, deserialize_with = "null_as_zero")]
    pub current_price: f64,
    /// Absent for coins without enough trading history
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub market_cap: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub total_volume: f64,
    /// 1 = largest market cap
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
}

/// Full record for one coin, as returned by `/coins/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoinDetail {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub image: CoinImage,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub market_data: MarketData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CoinImage {
    #[serde(default)]
    pub large: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MarketData {
    #[serde(default)]
    pub current_price: UsdAmount,
    #[serde(default)]
    pub market_cap: UsdAmount,
    #[serde(default)]
    pub total_volume: UsdAmount,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub circulating_supply: f64,
}

/// Per-currency amount block; only the USD entry is kept
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UsdAmount {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub usd: f64,
}

impl CoinDetail {
    /// Symbol as shown in headings (e.g., "BTC")
    pub fn display_symbol(&self) -> String {
        self.symbol.to_uppercase()
    }

    pub fn rank_label(&self) -> Option<String> {
        self.market_cap_rank.map(|rank| format!("Rank #{}", rank))
    }
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}
