const DEFAULT_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Configuration for the CoinGecko connector
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    /// API base URL, without trailing slash
    pub base_url: String,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl CoinGeckoConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("COINGECKO_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Self { base_url }
    }
}
