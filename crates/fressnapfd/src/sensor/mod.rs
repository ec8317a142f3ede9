//! Derived-value presenters for the tracker's sensor entities.
//!
//! Each sensor is a static description plus derivation over the shared
//! per-poll [`DeviceRecord`]; no entity hierarchy. A sensor as a whole is
//! unavailable when the last poll produced no record at all, independent of
//! individual field presence.

pub mod derive;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::{json, Value};

use crate::client::DeviceRecord;

/// Device class of a sensor, matching Home Assistant's sensor device classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorDeviceClass {
    Battery,
    Weight,
    Distance,
    Duration,
}

/// What a sensor derives its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// Direct numeric passthrough of a flattened record key
    Field,
    /// Most recent entry of the weight history
    WeightHistory,
    /// Metres covered by trips that ended today
    TodayDistance,
    /// Seconds moved in trips that ended today
    TodayDuration,
}

/// Static description of one sensor entity.
#[derive(Debug)]
pub struct SensorDescription {
    pub key: &'static str,
    pub name: &'static str,
    pub unit: &'static str,
    pub device_class: SensorDeviceClass,
    pub kind: SensorKind,
}

pub const SENSOR_DESCRIPTIONS: &[SensorDescription] = &[
    SensorDescription {
        key: "battery",
        name: "Battery",
        unit: "%",
        device_class: SensorDeviceClass::Battery,
        kind: SensorKind::Field,
    },
    SensorDescription {
        key: "weight_history",
        name: "Weight",
        unit: "kg",
        device_class: SensorDeviceClass::Weight,
        kind: SensorKind::WeightHistory,
    },
    SensorDescription {
        key: "today_distance",
        name: "Today Distance",
        unit: "m",
        device_class: SensorDeviceClass::Distance,
        kind: SensorKind::TodayDistance,
    },
    SensorDescription {
        key: "today_duration",
        name: "Today Duration",
        unit: "s",
        device_class: SensorDeviceClass::Duration,
        kind: SensorKind::TodayDuration,
    },
];

/// Look up a sensor description by key.
pub fn description(key: &str) -> Option<&'static SensorDescription> {
    SENSOR_DESCRIPTIONS.iter().find(|d| d.key == key)
}

/// A sensor is available only when the last poll produced a record at all.
pub fn available(record: Option<&DeviceRecord>) -> bool {
    record.is_some()
}

impl SensorDescription {
    /// Current value, or `None` when the record doesn't carry enough data.
    pub fn value(&self, record: &DeviceRecord) -> Option<f64> {
        self.value_on(record, Local::now().date_naive())
    }

    fn value_on(&self, record: &DeviceRecord, today: NaiveDate) -> Option<f64> {
        match self.kind {
            SensorKind::Field => record.numeric(self.key),
            SensorKind::WeightHistory => derive::latest_weight(record),
            SensorKind::TodayDistance => Some(derive::today_distance(record, today)),
            SensorKind::TodayDuration => Some(derive::today_duration(record, today)),
        }
    }

    /// Structured attributes for this sensor, or `None` when it has none.
    ///
    /// `weight_history_depth` limits how many history entries the weight
    /// sensor exposes (`0` keeps all of them).
    pub fn attributes(&self, record: &DeviceRecord, weight_history_depth: usize) -> Option<Value> {
        self.attributes_on(record, Local::now().date_naive(), weight_history_depth)
    }

    fn attributes_on(
        &self,
        record: &DeviceRecord,
        today: NaiveDate,
        weight_history_depth: usize,
    ) -> Option<Value> {
        match self.kind {
            SensorKind::Field => None,
            SensorKind::WeightHistory => {
                let attrs = derive::weight_history_attrs(record, weight_history_depth);
                (!attrs.is_empty()).then(|| Value::Object(attrs))
            }
            SensorKind::TodayDistance | SensorKind::TodayDuration => Some(json!({
                "today_trips": derive::today_trips_json(record, today),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::client::{Trip, WeightEntry};

    fn sample_record() -> DeviceRecord {
        let mut record = DeviceRecord {
            weight_history: vec![
                WeightEntry {
                    weight: "4.2 kg".to_string(),
                    date: 1700000000000,
                },
                WeightEntry {
                    weight: "4.5 kg".to_string(),
                    date: 1700003600000,
                },
            ],
            trips: vec![Trip {
                id: 1,
                distance: 100,
                duration_s: 60,
                time_end: "2024-01-01T10:00:00Z".to_string(),
                trip_start: "10:00".to_string(),
                trip_end: "10:01".to_string(),
            }],
            ..Default::default()
        };
        record.fields.insert("battery".to_string(), json!(87));
        record
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_description_lookup() {
        assert_eq!(description("battery").unwrap().unit, "%");
        assert_eq!(description("weight_history").unwrap().unit, "kg");
        assert!(description("nope").is_none());
    }

    #[test]
    fn test_battery_passthrough() {
        let record = sample_record();
        let battery = description("battery").unwrap();
        assert_eq!(battery.value_on(&record, today()), Some(87.0));
        assert!(battery.attributes_on(&record, today(), 5).is_none());
    }

    #[test]
    fn test_battery_absent_is_unavailable_not_error() {
        let battery = description("battery").unwrap();
        assert_eq!(battery.value_on(&DeviceRecord::default(), today()), None);
    }

    #[test]
    fn test_weight_sensor_reports_latest() {
        let record = sample_record();
        let weight = description("weight_history").unwrap();
        assert_eq!(weight.value_on(&record, today()), Some(4.5));

        let attrs = weight.attributes_on(&record, today(), 5).unwrap();
        assert_eq!(attrs["weight_history_2"]["weight"], 4.5);
        assert_eq!(attrs["weight_history_2"]["timestamp"], 1700003600000i64);
    }

    #[test]
    fn test_weight_sensor_empty_history() {
        let weight = description("weight_history").unwrap();
        let record = DeviceRecord::default();
        assert_eq!(weight.value_on(&record, today()), None);
        assert!(weight.attributes_on(&record, today(), 5).is_none());
    }

    #[test]
    fn test_trip_sensors_aggregate_today() {
        let record = sample_record();
        let distance = description("today_distance").unwrap();
        let duration = description("today_duration").unwrap();

        assert_eq!(distance.value_on(&record, today()), Some(100.0));
        assert_eq!(duration.value_on(&record, today()), Some(60.0));

        let attrs = distance.attributes_on(&record, today(), 5).unwrap();
        let trips = attrs["today_trips"].as_array().unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0]["id"], 1);
    }

    #[test]
    fn test_trip_sensors_zero_on_other_days() {
        let record = sample_record();
        let other_day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let distance = description("today_distance").unwrap();
        let duration = description("today_duration").unwrap();

        assert_eq!(distance.value_on(&record, other_day), Some(0.0));
        assert_eq!(duration.value_on(&record, other_day), Some(0.0));

        let attrs = distance.attributes_on(&record, other_day, 5).unwrap();
        assert!(attrs["today_trips"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_availability_tracks_record_presence() {
        let record = sample_record();
        assert!(available(Some(&record)));
        assert!(!available(None));
    }
}
