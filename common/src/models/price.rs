use crate::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Raw point of a historical price series
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    /// Epoch milliseconds
    pub timestamp: i64,
    /// Price in USD
    pub price: f64,
}

impl From<(i64, f64)> for PricePoint {
    fn from((timestamp, price): (i64, f64)) -> Self {
        Self { timestamp, price }
    }
}

/// Display-ready chart point keyed by a formatted date
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    pub time: String,
    pub price: f64,
}

/// Trailing window, in days, for historical chart data
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ChartRange {
    #[serde(rename = "1")]
    OneDay,
    #[default]
    #[serde(rename = "7")]
    SevenDays,
    #[serde(rename = "30")]
    ThirtyDays,
    #[serde(rename = "90")]
    NinetyDays,
}

impl ChartRange {
    pub const ALL: [ChartRange; 4] = [
        ChartRange::OneDay,
        ChartRange::SevenDays,
        ChartRange::ThirtyDays,
        ChartRange::NinetyDays,
    ];

    /// Value of the `days` query parameter
    pub fn days(&self) -> &'static str {
        match self {
            ChartRange::OneDay => "1",
            ChartRange::SevenDays => "7",
            ChartRange::ThirtyDays => "30",
            ChartRange::NinetyDays => "90",
        }
    }

    /// Button label
    pub fn label(&self) -> &'static str {
        match self {
            ChartRange::OneDay => "24h",
            ChartRange::SevenDays => "7d",
            ChartRange::ThirtyDays => "30d",
            ChartRange::NinetyDays => "90d",
        }
    }
}

impl std::fmt::Display for ChartRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.days())
    }
}

impl FromStr for ChartRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|range| range.days() == s)
            .ok_or_else(|| {
                Error::ParseError(format!(
                    "Unknown range: {}. Supported ranges: 1, 7, 30, 90",
                    s
                ))
            })
    }
}
