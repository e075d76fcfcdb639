use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use common::{
    filter::{ChangeFilter, FilterCriteria, RankFilter, VolumeSort},
    models::ChartRange,
    Error as CommonError,
};
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::error;

use crate::screen::{FailureKind, ViewState};
use crate::service::{DashboardService, ToggleView};

pub type SharedService = Arc<DashboardService>;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// Create a wrapper for our common::Error type
pub struct ApiError(CommonError);

impl From<CommonError> for ApiError {
    fn from(err: CommonError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CommonError::NotFound(_) => StatusCode::NOT_FOUND,
            CommonError::HttpError(_) | CommonError::NetworkError(_) => StatusCode::BAD_GATEWAY,
            CommonError::ParseError(_) => StatusCode::BAD_REQUEST,
            CommonError::StorageError(_)
            | CommonError::ConfigError(_)
            | CommonError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}

/// Render a screen state: ready is 200, loading is 202, failures map by kind
fn render<T: Serialize>(state: ViewState<T>) -> Response {
    match state {
        ViewState::Ready(_) => (StatusCode::OK, Json(state)).into_response(),
        ViewState::Loading => (StatusCode::ACCEPTED, Json(state)).into_response(),
        ViewState::Failed(failure) => {
            let status = match failure.kind {
                FailureKind::NotFound => StatusCode::NOT_FOUND,
                FailureKind::Network => StatusCode::BAD_GATEWAY,
                FailureKind::Invalid => StatusCode::BAD_REQUEST,
                FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(ErrorResponse { error: failure.message })).into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MarketQuery {
    pub page: Option<u32>,
    pub search: Option<String>,
    pub rank: Option<RankFilter>,
    pub change: Option<ChangeFilter>,
    pub volume: Option<VolumeSort>,
}

impl MarketQuery {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            search: self.search.clone().unwrap_or_default(),
            rank: self.rank.unwrap_or_default(),
            change: self.change.unwrap_or_default(),
            volume: self.volume.unwrap_or_default(),
        }
    }
}

// Load a market page and return its filtered rows
pub async fn list_markets(
    State(service): State<SharedService>,
    Query(query): Query<MarketQuery>,
) -> Result<Response, ApiError> {
    let state = service
        .load_markets(query.page.unwrap_or(1), &query.criteria())
        .await?;
    Ok(render(state))
}

// Re-filter the current market page without fetching
pub async fn current_markets(
    State(service): State<SharedService>,
    Query(query): Query<MarketQuery>,
) -> Response {
    render(service.market_view(&query.criteria()).await)
}

pub async fn get_coin(
    State(service): State<SharedService>,
    Path(coin_id): Path<String>,
) -> Response {
    render(service.load_coin(&coin_id).await)
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub days: Option<String>,
}

pub async fn get_chart(
    State(service): State<SharedService>,
    Path(coin_id): Path<String>,
    Query(query): Query<ChartQuery>,
) -> Result<Response, ApiError> {
    // Default to a week if no range specified
    let range = match query.days.as_deref() {
        Some(days) => days.parse::<ChartRange>()?,
        None => ChartRange::default(),
    };

    Ok(render(service.load_chart(&coin_id, range).await))
}

pub async fn get_watchlist(State(service): State<SharedService>) -> Response {
    render(service.load_watchlist().await)
}

pub async fn watchlist_ids(State(service): State<SharedService>) -> Json<Vec<String>> {
    Json(service.watched_ids().await)
}

pub async fn toggle_watchlist(
    State(service): State<SharedService>,
    Path(coin_id): Path<String>,
) -> Result<Json<ToggleView>, ApiError> {
    Ok(Json(service.toggle_watch(&coin_id).await?))
}

// Stream the watchlist after every change, starting with the current one
pub async fn watchlist_events(
    State(service): State<SharedService>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let updates = service.subscribe_watchlist();

    let events = stream::unfold((updates, true), |(mut updates, first)| async move {
        if !first && updates.changed().await.is_err() {
            return None;
        }
        let ids = updates.borrow_and_update().clone();
        let event = Event::default()
            .event("watchlist")
            .json_data(&ids)
            .unwrap_or_else(|_| Event::default().event("watchlist"));
        Some((Ok(event), (updates, false)))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::Failure;
    use async_trait::async_trait;
    use axum::body::{Bytes, HttpBody};
    use common::models::{CoinDetail, CoinSummary, PricePoint};
    use connectors::MarketDataSource;
    use std::time::Duration;
    use store::{MemoryStore, WatchlistStore};

    /// Upstream that is never reached by the watchlist routes
    struct OfflineSource;

    #[async_trait]
    impl MarketDataSource for OfflineSource {
        async fn fetch_markets(&self, _page: u32) -> common::Result<Vec<CoinSummary>> {
            Err(CommonError::NetworkError("offline".to_string()))
        }

        async fn fetch_coin(&self, _id: &str) -> common::Result<CoinDetail> {
            Err(CommonError::NetworkError("offline".to_string()))
        }

        async fn fetch_chart(
            &self,
            _id: &str,
            _range: ChartRange,
        ) -> common::Result<Vec<PricePoint>> {
            Err(CommonError::NetworkError("offline".to_string()))
        }
    }

    async fn offline_service() -> SharedService {
        let watchlist = WatchlistStore::open(Arc::new(MemoryStore::new()))
            .await
            .unwrap();
        Arc::new(DashboardService::new(
            Arc::new(OfflineSource),
            Arc::new(watchlist),
        ))
    }

    /// Read body chunks until one whole event has arrived
    async fn next_event<B>(body: &mut B) -> String
    where
        B: HttpBody<Data = Bytes> + Unpin,
        B::Error: std::fmt::Debug,
    {
        let mut text = String::new();
        while !text.ends_with("\n\n") {
            let chunk = tokio::time::timeout(Duration::from_secs(2), body.data())
                .await
                .expect("timed out waiting for an event")
                .expect("stream ended")
                .unwrap();
            text.push_str(std::str::from_utf8(&chunk).unwrap());
        }
        text
    }

    #[test]
    fn test_market_query_criteria() {
        let query = MarketQuery {
            page: Some(2),
            search: Some("sol".to_string()),
            rank: Some(RankFilter::Top10),
            change: None,
            volume: Some(VolumeSort::HighToLow),
        };
        let criteria = query.criteria();
        assert_eq!(criteria.search, "sol");
        assert_eq!(criteria.rank, RankFilter::Top10);
        assert_eq!(criteria.change, ChangeFilter::All);
        assert_eq!(criteria.volume, VolumeSort::HighToLow);

        assert_eq!(MarketQuery::default().criteria(), FilterCriteria::default());
    }

    #[test]
    fn test_render_status_codes() {
        assert_eq!(render(ViewState::Ready(1)).status(), StatusCode::OK);
        assert_eq!(render(ViewState::<u32>::Loading).status(), StatusCode::ACCEPTED);

        let failed = |kind| {
            ViewState::<u32>::Failed(Failure {
                kind,
                message: "boom".to_string(),
            })
        };
        assert_eq!(render(failed(FailureKind::Network)).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(render(failed(FailureKind::NotFound)).status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_watchlist_events_follow_toggles() {
        let service = offline_service().await;
        let mut body = watchlist_events(State(service.clone()))
            .await
            .into_response()
            .into_body();

        let first = next_event(&mut body).await;
        assert!(first.contains("event: watchlist"));
        assert!(first.contains("data: []"));

        service.toggle_watch("bitcoin").await.unwrap();
        let second = next_event(&mut body).await;
        assert!(second.contains(r#"data: ["bitcoin"]"#));

        service.toggle_watch("ethereum").await.unwrap();
        let third = next_event(&mut body).await;
        assert!(third.contains(r#"data: ["bitcoin","ethereum"]"#));
    }

    #[test]
    fn test_api_error_status() {
        let response = ApiError::from(CommonError::ParseError("bad range".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response =
            ApiError::from(CommonError::StorageError("disk full".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
