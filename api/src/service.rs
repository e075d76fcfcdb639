use common::{
    chart::{axis_label, format_series},
    filter::{filter_coins, FilterCriteria},
    models::{ChartPoint, ChartRange, CoinDetail, CoinSummary},
    Error, Result,
};
use connectors::MarketDataSource;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use store::WatchlistStore;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::screen::{Screen, ViewState};

/// Page the watchlist view is resolved against
const WATCHLIST_PAGE: u32 = 1;

/// Market page as fetched, before any filtering
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub page: u32,
    pub coins: Vec<CoinSummary>,
}

#[derive(Debug, Clone)]
pub struct ChartSeries {
    pub id: String,
    pub range: ChartRange,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarketRow {
    #[serde(flatten)]
    pub coin: CoinSummary,
    pub watched: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarketPageView {
    pub page: u32,
    pub previous_page: u32,
    /// None on the last representable page
    pub next_page: Option<u32>,
    /// Rows on the page before filtering
    pub total: usize,
    pub coins: Vec<MarketRow>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CoinView {
    #[serde(flatten)]
    pub coin: CoinDetail,
    pub display_symbol: String,
    pub rank_label: Option<String>,
    pub watched: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartPointView {
    pub time: String,
    pub label: Option<String>,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartView {
    pub id: String,
    pub days: ChartRange,
    pub range_label: &'static str,
    pub points: Vec<ChartPointView>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WatchlistView {
    pub ids: Vec<String>,
    pub coins: Vec<CoinSummary>,
    pub empty: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToggleView {
    pub id: String,
    pub watched: bool,
    pub ids: Vec<String>,
}

/// Dashboard backend: one screen per view, all sharing the same watchlist
pub struct DashboardService {
    source: Arc<dyn MarketDataSource>,
    watchlist: Arc<WatchlistStore>,
    market_screen: Screen<MarketSnapshot>,
    coin_screen: Screen<CoinDetail>,
    chart_screen: Screen<ChartSeries>,
    watchlist_screen: Screen<Vec<CoinSummary>>,
}

impl DashboardService {
    pub fn new(source: Arc<dyn MarketDataSource>, watchlist: Arc<WatchlistStore>) -> Self {
        Self {
            source,
            watchlist,
            market_screen: Screen::new("market list"),
            coin_screen: Screen::new("coin detail"),
            chart_screen: Screen::new("price chart"),
            watchlist_screen: Screen::new("watchlist"),
        }
    }

    /// Fetch a market page and return its filtered rows
    pub async fn load_markets(
        &self,
        page: u32,
        criteria: &FilterCriteria,
    ) -> Result<ViewState<MarketPageView>> {
        if page == 0 {
            return Err(Error::ParseError("Page numbers start at 1".to_string()));
        }

        let ticket = self.market_screen.begin().await;
        debug!("Loading market page {}", page);

        let result = self
            .source
            .fetch_markets(page)
            .await
            .map(|coins| MarketSnapshot { page, coins });
        if let Err(e) = &result {
            error!("Failed to load market page {}: {}", page, e);
        }

        let state = self
            .market_screen
            .settle(ticket, result, |snapshot| snapshot.page == page)
            .await;
        Ok(self.page_view(state, criteria).await)
    }

    /// Re-derive the visible market rows from the current screen state
    pub async fn market_view(&self, criteria: &FilterCriteria) -> ViewState<MarketPageView> {
        let state = self.market_screen.snapshot().await;
        self.page_view(state, criteria).await
    }

    async fn page_view(
        &self,
        state: ViewState<MarketSnapshot>,
        criteria: &FilterCriteria,
    ) -> ViewState<MarketPageView> {
        let watched: HashSet<String> = self.watchlist.list().await.into_iter().collect();

        state.map(|snapshot| {
            let coins = filter_coins(&snapshot.coins, criteria)
                .into_iter()
                .map(|coin| MarketRow {
                    watched: watched.contains(&coin.id),
                    coin,
                })
                .collect();

            MarketPageView {
                page: snapshot.page,
                previous_page: snapshot.page.saturating_sub(1).max(1),
                next_page: snapshot.page.checked_add(1),
                total: snapshot.coins.len(),
                coins,
            }
        })
    }

    pub async fn load_coin(&self, id: &str) -> ViewState<CoinView> {
        let ticket = self.coin_screen.begin().await;
        debug!("Loading coin detail for {}", id);

        let result = self.source.fetch_coin(id).await;
        if let Err(e) = &result {
            error!("Failed to load coin {}: {}", id, e);
        }

        let state = self
            .coin_screen
            .settle(ticket, result, |coin| coin.id == id)
            .await;
        let watched = self.watchlist.contains(id).await;

        state.map(|coin| CoinView {
            display_symbol: coin.display_symbol(),
            rank_label: coin.rank_label(),
            watched,
            coin,
        })
    }

    /// Every range switch issues a fresh request
    pub async fn load_chart(&self, id: &str, range: ChartRange) -> ViewState<ChartView> {
        let ticket = self.chart_screen.begin().await;
        debug!("Loading {} chart for {}", range.label(), id);

        let result = self
            .source
            .fetch_chart(id, range)
            .await
            .map(|points| ChartSeries {
                id: id.to_string(),
                range,
                points: format_series(&points),
            });
        if let Err(e) = &result {
            error!("Failed to load chart for {}: {}", id, e);
        }

        let state = self
            .chart_screen
            .settle(ticket, result, |series| series.id == id && series.range == range)
            .await;

        state.map(|series| ChartView {
            id: series.id,
            days: series.range,
            range_label: series.range.label(),
            points: series
                .points
                .into_iter()
                .map(|point| ChartPointView {
                    label: axis_label(&point.time),
                    time: point.time,
                    price: point.price,
                })
                .collect(),
        })
    }

    /// Watched coins found on the first market page, in market order
    pub async fn load_watchlist(&self) -> ViewState<WatchlistView> {
        let ticket = self.watchlist_screen.begin().await;

        let ids = self.watchlist.list().await;
        let result = self
            .source
            .fetch_markets(WATCHLIST_PAGE)
            .await
            .map(|coins| {
                coins
                    .into_iter()
                    .filter(|coin| ids.contains(&coin.id))
                    .collect::<Vec<_>>()
            });
        if let Err(e) = &result {
            error!("Failed to load watchlist coins: {}", e);
        }

        // every load resolves the same page, a newer result is as good as ours
        let state = self.watchlist_screen.settle(ticket, result, |_| true).await;

        let ids = self.watchlist.list().await;
        state.map(|coins| {
            // drop rows toggled off while the page was loading
            let coins: Vec<CoinSummary> =
                coins.into_iter().filter(|coin| ids.contains(&coin.id)).collect();
            WatchlistView {
                empty: ids.is_empty() || coins.is_empty(),
                ids,
                coins,
            }
        })
    }

    pub async fn watched_ids(&self) -> Vec<String> {
        self.watchlist.list().await
    }

    pub async fn toggle_watch(&self, id: &str) -> Result<ToggleView> {
        if id.trim().is_empty() {
            return Err(Error::ParseError("Coin id must not be empty".to_string()));
        }

        let ids = self.watchlist.toggle(id).await?;
        let watched = ids.iter().any(|watched| watched == id);
        info!(
            "{} {} watchlist",
            id,
            if watched { "added to" } else { "removed from" }
        );

        Ok(ToggleView {
            id: id.to_string(),
            watched,
            ids,
        })
    }

    pub fn subscribe_watchlist(&self) -> watch::Receiver<Vec<String>> {
        self.watchlist.subscribe()
    }
}
