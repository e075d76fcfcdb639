use crate::models::{ChartPoint, PricePoint};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Date format used for chart point keys (e.g., "11/14/2023")
const TIME_FORMAT: &str = "%m/%d/%Y";

/// Convert raw price points into date-keyed chart points.
///
/// Order and length are preserved: no resampling, bucketing or gap filling.
pub fn format_series(points: &[PricePoint]) -> Vec<ChartPoint> {
    points
        .iter()
        .map(|point| ChartPoint {
            time: format_time(point.timestamp),
            price: point.price,
        })
        .collect()
}

fn format_time(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|ts| ts.format(TIME_FORMAT).to_string())
        .unwrap_or_default()
}

/// Short "day month" label for axis ticks and tooltips (e.g., "14 Nov").
///
/// Accepts any `time` that parses back into a date.
pub fn axis_label(time: &str) -> Option<String> {
    parse_date(time).map(|date| date.format("%-d %b").to_string())
}

fn parse_date(time: &str) -> Option<NaiveDate> {
    let time = time.trim();
    NaiveDate::parse_from_str(time, TIME_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(time, "%Y-%m-%d"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(time)
                .ok()
                .map(|ts| ts.with_timezone(&Utc).date_naive())
        })
}
