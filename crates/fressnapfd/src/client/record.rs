//! Flattened per-poll snapshot of a tracker's state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One weight measurement from the tracker's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    /// Weight as reported by the API, e.g. "4.5 kg"
    pub weight: String,

    /// Measurement time in epoch milliseconds
    pub date: i64,
}

impl WeightEntry {
    /// Numeric portion of the weight, with the " kg" suffix stripped.
    pub fn kilograms(&self) -> Option<f64> {
        self.weight.replace(" kg", "").trim().parse().ok()
    }
}

/// One recorded movement segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: i64,

    /// Distance covered in metres
    pub distance: i64,

    /// Duration in seconds
    pub duration_s: i64,

    /// ISO-8601 end timestamp; may carry a literal "Z" UTC marker
    pub time_end: String,

    /// Display string for the trip start
    #[serde(default)]
    pub trip_start: String,

    /// Display string for the trip end
    #[serde(default)]
    pub trip_end: String,
}

/// Flattened device snapshot, rebuilt fresh on every poll.
///
/// Conditional flattened keys (`led_brightness_value`, `led_brightness_status`,
/// `led_activatable_overall`, `deep_sleep_value`, `deep_sleep_status`,
/// `weight_current`) live in [`DeviceRecord::fields`] and are absent, not
/// null, when the gating feature flag is false. Consumers must not assume
/// their presence.
#[derive(Debug, Clone, Default)]
pub struct DeviceRecord {
    /// Serial number the record was fetched for
    pub serial_number: u64,

    /// `tracker_settings.features.flash_light`
    pub flash_light: bool,

    /// `tracker_settings.features.sleep_mode`
    pub sleep_mode: bool,

    /// Weight measurements from `additional_parameters.weightList`,
    /// oldest first
    pub weight_history: Vec<WeightEntry>,

    /// Current weight from `additional_parameters.weight`, " kg" stripped
    pub weight_current: Option<String>,

    /// Trip history for the last 30 days, possibly empty
    pub trips: Vec<Trip>,

    /// Raw top-level device object plus the flattened conditional keys
    pub fields: serde_json::Map<String, Value>,
}

impl DeviceRecord {
    /// Look up a flattened key.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Direct numeric passthrough of a flattened key (e.g. "battery").
    /// Absent or non-numeric values read as unavailable.
    pub fn numeric(&self, key: &str) -> Option<f64> {
        match self.fields.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_entry_kilograms() {
        let entry = WeightEntry {
            weight: "4.5 kg".to_string(),
            date: 1700000000000,
        };
        assert_eq!(entry.kilograms(), Some(4.5));
    }

    #[test]
    fn test_weight_entry_malformed() {
        let entry = WeightEntry {
            weight: "heavy".to_string(),
            date: 1700000000000,
        };
        assert_eq!(entry.kilograms(), None);
    }

    #[test]
    fn test_numeric_from_number_and_string() {
        let mut record = DeviceRecord::default();
        record
            .fields
            .insert("battery".to_string(), serde_json::json!(87));
        record
            .fields
            .insert("weight_current".to_string(), serde_json::json!("4.5"));
        record
            .fields
            .insert("name".to_string(), serde_json::json!("Milo"));

        assert_eq!(record.numeric("battery"), Some(87.0));
        assert_eq!(record.numeric("weight_current"), Some(4.5));
        assert_eq!(record.numeric("name"), None);
        assert_eq!(record.numeric("missing"), None);
    }
}
