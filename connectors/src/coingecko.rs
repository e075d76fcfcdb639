use crate::{CoinGeckoConfig, MarketDataSource, PAGE_SIZE};
use async_trait::async_trait;
use common::{
    models::{ChartRange, CoinDetail, CoinSummary, PricePoint},
    Error, Result,
};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error};

const VS_CURRENCY: &str = "usd";

pub struct CoinGeckoConnector {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoConnector {
    pub fn new(config: CoinGeckoConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url,
        }
    }

    /// Base URL with `segments` appended, each percent-encoded as one path segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| Error::ConfigError(format!("Invalid CoinGecko URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| {
                Error::ConfigError(format!("CoinGecko URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
        what: &str,
    ) -> Result<T> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(Error::HttpError)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("CoinGecko API error: {} - {}", status, error_text);
            return Err(status_error(status, what, &error_text));
        }

        let body = response.text().await.map_err(Error::HttpError)?;
        decode(&body, what)
    }
}

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Vec<(i64, f64)>,
}

fn markets_params(page: u32) -> Vec<(&'static str, String)> {
    vec![
        ("vs_currency", VS_CURRENCY.to_string()),
        ("order", "market_cap_desc".to_string()),
        ("per_page", PAGE_SIZE.to_string()),
        ("page", page.to_string()),
    ]
}

fn chart_params(range: ChartRange) -> Vec<(&'static str, String)> {
    vec![
        ("vs_currency", VS_CURRENCY.to_string()),
        ("days", range.days().to_string()),
    ]
}

fn status_error(status: StatusCode, what: &str, body: &str) -> Error {
    if status == StatusCode::NOT_FOUND {
        Error::NotFound(format!("{} not found upstream", what))
    } else {
        Error::NetworkError(format!("{} request failed: {} - {}", what, status, body))
    }
}

fn decode<T: DeserializeOwned>(body: &str, what: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| Error::ParseError(format!("Failed to parse CoinGecko {}: {}", what, e)))
}

fn validate_id(id: &str) -> Result<&str> {
    let reserved = |c: char| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace();
    if id.is_empty() || id == "." || id == ".." || id.contains(reserved) {
        return Err(Error::ParseError(format!("Invalid coin id: {:?}", id)));
    }
    Ok(id)
}

#[async_trait]
impl MarketDataSource for CoinGeckoConnector {
    async fn fetch_markets(&self, page: u32) -> Result<Vec<CoinSummary>> {
        if page == 0 {
            return Err(Error::ParseError("Page numbers start at 1".to_string()));
        }

        let url = self.endpoint(&["coins", "markets"])?;
        debug!("Fetching market page {} from CoinGecko: {}", page, url);

        self.get(url, &markets_params(page), "market list").await
    }

    async fn fetch_coin(&self, id: &str) -> Result<CoinDetail> {
        let id = validate_id(id)?;
        let url = self.endpoint(&["coins", id])?;
        debug!("Fetching coin detail from CoinGecko: {}", url);

        self.get(url, &[], &format!("coin '{}'", id)).await
    }

    async fn fetch_chart(&self, id: &str, range: ChartRange) -> Result<Vec<PricePoint>> {
        let id = validate_id(id)?;
        let url = self.endpoint(&["coins", id, "market_chart"])?;
        debug!(
            "Fetching {}-day chart from CoinGecko: {}",
            range.days(),
            url
        );

        let chart: MarketChartResponse = self
            .get(url, &chart_params(range), &format!("chart for '{}'", id))
            .await?;

        Ok(chart.prices.into_iter().map(PricePoint::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markets_params() {
        let params = markets_params(3);
        assert_eq!(
            params,
            vec![
                ("vs_currency", "usd".to_string()),
                ("order", "market_cap_desc".to_string()),
                ("per_page", "50".to_string()),
                ("page", "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_chart_params() {
        let params = chart_params(ChartRange::NinetyDays);
        assert_eq!(params[1], ("days", "90".to_string()));
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND, "coin 'nope'", ""),
            Error::NotFound(_)
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "market list", "slow down"),
            Error::NetworkError(_)
        ));
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR, "market list", ""),
            Error::NetworkError(_)
        ));
    }

    #[test]
    fn test_decode_market_chart() {
        let body = r#"{
            "prices": [[1700000000000, 50000], [1700086400000, 51000.5]],
            "market_caps": [[1700000000000, 1]],
            "total_volumes": [[1700000000000, 2]]
        }"#;
        let chart: MarketChartResponse = decode(body, "chart").unwrap();
        let points: Vec<PricePoint> = chart.prices.into_iter().map(PricePoint::from).collect();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].timestamp, 1_700_000_000_000);
        assert_eq!(points[1].price, 51000.5);
    }

    #[test]
    fn test_decode_failure_is_parse_error() {
        let result: Result<Vec<CoinSummary>> = decode("<html>oops</html>", "market list");
        assert!(matches!(result, Err(Error::ParseError(_))));
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("bitcoin").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("../admin").is_err());
        assert!(validate_id("..").is_err());
        assert!(validate_id("bitcoin?vs_currency=eur").is_err());
        assert!(validate_id("bitcoin#top").is_err());
        assert!(validate_id("bit%2Fcoin").is_err());
        assert!(validate_id("bit coin").is_err());
        assert!(validate_id("usd-coin").is_ok());
    }

    fn connector(base_url: &str) -> CoinGeckoConnector {
        CoinGeckoConnector::new(CoinGeckoConfig {
            base_url: base_url.to_string(),
        })
    }

    #[test]
    fn test_endpoint_paths() {
        let url = connector("https://api.coingecko.com/api/v3")
            .endpoint(&["coins", "bitcoin", "market_chart"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.coingecko.com/api/v3/coins/bitcoin/market_chart"
        );

        let url = connector("http://127.0.0.1:9/").endpoint(&["coins", "markets"]).unwrap();
        assert_eq!(url.path(), "/coins/markets");
    }

    #[test]
    fn test_endpoint_keeps_reserved_characters_in_segment() {
        let url = connector("http://127.0.0.1:9")
            .endpoint(&["coins", "bitcoin?x=1#y"])
            .unwrap();
        assert_eq!(url.path(), "/coins/bitcoin%3Fx=1%23y");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_endpoint_rejects_bad_base_url() {
        assert!(matches!(
            connector("not a url").endpoint(&["coins"]),
            Err(Error::ConfigError(_))
        ));
        assert!(matches!(
            connector("mailto:someone@example.com").endpoint(&["coins"]),
            Err(Error::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_page_zero_rejected_without_request() {
        let connector = CoinGeckoConnector::new(CoinGeckoConfig {
            base_url: "http://127.0.0.1:9".to_string(),
        });
        let result = connector.fetch_markets(0).await;
        assert!(matches!(result, Err(Error::ParseError(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_failure() {
        // Nothing listens on the discard port; a proxy may answer with a 5xx instead
        let connector = CoinGeckoConnector::new(CoinGeckoConfig {
            base_url: "http://127.0.0.1:9".to_string(),
        });
        let result = connector.fetch_markets(1).await;
        assert!(matches!(
            result,
            Err(Error::HttpError(_)) | Err(Error::NetworkError(_))
        ));
    }
}
