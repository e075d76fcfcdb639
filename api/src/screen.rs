//! Per-screen view state guarded by a request generation.
//!
//! Every load bumps the generation; a result is applied only if no newer
//! load was issued meanwhile, so a slow response never overwrites a newer one.

use common::Error;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ViewState<T> {
    Loading,
    Ready(T),
    Failed(Failure),
}

impl<T> ViewState<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ViewState<U> {
        match self {
            ViewState::Loading => ViewState::Loading,
            ViewState::Ready(value) => ViewState::Ready(f(value)),
            ViewState::Failed(failure) => ViewState::Failed(failure),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    Network,
    Invalid,
    Internal,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&Error> for Failure {
    fn from(err: &Error) -> Self {
        let kind = match err {
            Error::NotFound(_) => FailureKind::NotFound,
            Error::HttpError(_) | Error::NetworkError(_) => FailureKind::Network,
            Error::ParseError(_) => FailureKind::Invalid,
            Error::StorageError(_) | Error::ConfigError(_) | Error::InternalError(_) => {
                FailureKind::Internal
            }
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// Proof of a started load, redeemed by [`Screen::settle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

struct Inner<T> {
    generation: u64,
    state: ViewState<T>,
}

pub struct Screen<T> {
    name: &'static str,
    inner: RwLock<Inner<T>>,
}

impl<T: Clone> Screen<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: RwLock::new(Inner {
                generation: 0,
                state: ViewState::Loading,
            }),
        }
    }

    /// Start a load: the screen shows `Loading` until the latest load completes
    pub async fn begin(&self) -> Ticket {
        let mut inner = self.inner.write().await;
        inner.generation += 1;
        inner.state = ViewState::Loading;
        Ticket(inner.generation)
    }

    /// Apply a load result and return the state to answer that load with.
    ///
    /// A superseded load only sees a ready state that `owns` accepts as the
    /// resource it asked for; anything else reads as `Loading`.
    pub async fn settle(
        &self,
        ticket: Ticket,
        result: Result<T, Error>,
        owns: impl Fn(&T) -> bool,
    ) -> ViewState<T> {
        if let Some(state) = self.apply(ticket, result).await {
            return state;
        }

        match self.snapshot().await {
            ViewState::Ready(value) if owns(&value) => ViewState::Ready(value),
            _ => ViewState::Loading,
        }
    }

    async fn apply(&self, ticket: Ticket, result: Result<T, Error>) -> Option<ViewState<T>> {
        let mut inner = self.inner.write().await;
        if inner.generation != ticket.0 {
            debug!(
                "Discarding stale {} result (generation {}, latest {})",
                self.name, ticket.0, inner.generation
            );
            return None;
        }

        inner.state = match result {
            Ok(value) => ViewState::Ready(value),
            Err(e) => ViewState::Failed(Failure::from(&e)),
        };
        Some(inner.state.clone())
    }

    pub async fn snapshot(&self) -> ViewState<T> {
        self.inner.read().await.state.clone()
    }
}
