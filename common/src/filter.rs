//! Filtering and sorting of a market page.
//!
//! The view is always derived from the full page and the current criteria;
//! nothing is patched incrementally.

use crate::models::CoinSummary;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RankFilter {
    #[default]
    All,
    Top5,
    Top10,
}

impl RankFilter {
    fn max_rank(&self) -> Option<u32> {
        match self {
            RankFilter::All => None,
            RankFilter::Top5 => Some(5),
            RankFilter::Top10 => Some(10),
        }
    }
}

/// Filter on the sign of the 24h price change
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeFilter {
    #[default]
    All,
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VolumeSort {
    #[default]
    None,
    #[serde(alias = "high")]
    HighToLow,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterCriteria {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub rank: RankFilter,
    #[serde(default)]
    pub change: ChangeFilter,
    #[serde(default)]
    pub volume: VolumeSort,
}

/// Apply text, rank and change filters, then the volume sort.
pub fn filter_coins(rows: &[CoinSummary], criteria: &FilterCriteria) -> Vec<CoinSummary> {
    let needle = criteria.search.to_lowercase();

    let mut result: Vec<CoinSummary> = rows
        .iter()
        .filter(|coin| matches_search(coin, &needle))
        .filter(|coin| matches_rank(coin, criteria.rank))
        .filter(|coin| matches_change(coin, criteria.change))
        .cloned()
        .collect();

    if criteria.volume == VolumeSort::HighToLow {
        // sort_by is stable, equal volumes keep market cap order
        result.sort_by(|a, b| b.total_volume.total_cmp(&a.total_volume));
    }

    result
}

fn matches_search(coin: &CoinSummary, needle: &str) -> bool {
    needle.is_empty()
        || coin.name.to_lowercase().contains(needle)
        || coin.symbol.to_lowercase().contains(needle)
}

fn matches_rank(coin: &CoinSummary, filter: RankFilter) -> bool {
    match filter.max_rank() {
        None => true,
        Some(max) => coin.market_cap_rank.is_some_and(|rank| rank <= max),
    }
}

fn matches_change(coin: &CoinSummary, filter: ChangeFilter) -> bool {
    match (filter, coin.price_change_percentage_24h) {
        (ChangeFilter::All, _) => true,
        (ChangeFilter::Positive, Some(change)) => change > 0.0,
        (ChangeFilter::Negative, Some(change)) => change < 0.0,
        (_, None) => false,
    }
}
