//! Pure derivation helpers shared by the sensor presenters.
//!
//! All functions take the calendar date explicitly so the "today" boundary is
//! testable; the presenter passes the current local date.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone};
use serde_json::{json, Value};

use crate::client::{DeviceRecord, Trip, WeightEntry};

/// Parse a trip's end timestamp. RFC 3339 with a literal "Z" UTC marker or an
/// explicit offset; anything else reads as unparseable and the trip is skipped.
pub fn parse_trip_end(time_end: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(time_end).ok()
}

/// Trips whose end falls on `today` in local time. Trips with an unparseable
/// `time_end` are skipped, not fatal.
pub fn trips_on(record: &DeviceRecord, today: NaiveDate) -> Vec<&Trip> {
    record
        .trips
        .iter()
        .filter(|trip| {
            parse_trip_end(&trip.time_end)
                .map(|end| end.with_timezone(&Local).date_naive() == today)
                .unwrap_or(false)
        })
        .collect()
}

/// Metres covered by trips that ended on `today`.
pub fn today_distance(record: &DeviceRecord, today: NaiveDate) -> f64 {
    trips_on(record, today)
        .iter()
        .map(|trip| trip.distance as f64)
        .sum()
}

/// Seconds moved in trips that ended on `today`.
pub fn today_duration(record: &DeviceRecord, today: NaiveDate) -> f64 {
    trips_on(record, today)
        .iter()
        .map(|trip| trip.duration_s as f64)
        .sum()
}

/// The filtered same-day trip list as structured attributes.
pub fn today_trips_json(record: &DeviceRecord, today: NaiveDate) -> Value {
    Value::Array(
        trips_on(record, today)
            .into_iter()
            .map(|trip| {
                json!({
                    "id": trip.id,
                    "distance": trip.distance,
                    "duration_s": trip.duration_s,
                    "start": trip.trip_start,
                    "end": trip.trip_end,
                })
            })
            .collect(),
    )
}

/// Most recent weight in kilograms, if the history's newest entry parses.
pub fn latest_weight(record: &DeviceRecord) -> Option<f64> {
    record.weight_history.last().and_then(WeightEntry::kilograms)
}

/// Human-readable local time for an epoch-milliseconds stamp, falling back to
/// the raw number when it is out of range.
pub fn format_weight_date(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        _ => timestamp_ms.to_string(),
    }
}

/// The `depth` most recent history entries as `weight_history_{i}` attributes
/// (`0` keeps all of them). Entries with an unparseable weight are skipped.
pub fn weight_history_attrs(record: &DeviceRecord, depth: usize) -> serde_json::Map<String, Value> {
    let entries = &record.weight_history;
    let start = if depth == 0 {
        0
    } else {
        entries.len().saturating_sub(depth)
    };

    let mut attrs = serde_json::Map::new();
    for (i, entry) in entries[start..].iter().enumerate() {
        let Some(weight) = entry.kilograms() else {
            continue;
        };
        attrs.insert(
            format!("weight_history_{}", i + 1),
            json!({
                "weight": weight,
                "date": format_weight_date(entry.date),
                "timestamp": entry.date,
            }),
        );
    }
    attrs
}
